use crate::bdd_ite;
use biodivine_lib_bdd::{Bdd, BddValuation, BddVariable, BddVariableSet};
use std::sync::Arc;

/// A fixed-width unsigned integer encoded as a vector of BDD bit formulas,
/// most-significant bit first.
///
/// Arithmetic wraps at the fixed width, mirroring the behaviour of the route
/// attributes being modelled (all of which have a fixed wire width).
#[derive(Clone, Debug)]
pub struct SymbolicInteger {
    vars: Arc<BddVariableSet>,
    bits: Vec<Bdd>,
}

impl SymbolicInteger {
    /// Create an integer whose bit formulas are exactly the given variables.
    pub fn new(vars: &Arc<BddVariableSet>, bit_vars: &[BddVariable]) -> SymbolicInteger {
        SymbolicInteger {
            vars: Arc::clone(vars),
            bits: bit_vars.iter().map(|v| vars.mk_var(*v)).collect(),
        }
    }

    /// Create an integer whose every bit formula is constant.
    pub fn constant(vars: &Arc<BddVariableSet>, width: u16, value: u64) -> SymbolicInteger {
        assert!(width <= 64, "unsupported integer width: {width}");
        let bits = (0..width)
            .map(|i| {
                let bit = (value >> (width - 1 - i)) & 1 == 1;
                if bit { vars.mk_true() } else { vars.mk_false() }
            })
            .collect();
        SymbolicInteger {
            vars: Arc::clone(vars),
            bits,
        }
    }

    pub fn width(&self) -> usize {
        self.bits.len()
    }

    pub fn bits(&self) -> &[Bdd] {
        &self.bits
    }

    pub fn variable_set(&self) -> &Arc<BddVariableSet> {
        &self.vars
    }

    fn const_bit(&self, value: u64, lsb_index: usize) -> bool {
        (value >> lsb_index) & 1 == 1
    }

    /// A predicate for "this integer equals `value`".
    pub fn value(&self, value: u64) -> Bdd {
        if self.bits.len() < 64 && value >= (1u64 << self.bits.len()) {
            return self.vars.mk_false();
        }
        let mut acc = self.vars.mk_true();
        for (i, bit) in self.bits.iter().enumerate() {
            let expected = self.const_bit(value, self.bits.len() - 1 - i);
            acc = acc.and(&if expected { bit.clone() } else { bit.not() });
        }
        acc
    }

    /// A predicate for "this integer is less than or equal to `value`".
    pub fn leq(&self, value: u64) -> Bdd {
        if self.bits.len() < 64 && value >= (1u64 << self.bits.len()) {
            return self.vars.mk_true();
        }
        // Standard lsb-to-msb comparison fold.
        let mut acc = self.vars.mk_true();
        for (i, bit) in self.bits.iter().rev().enumerate() {
            if self.const_bit(value, i) {
                acc = bit.not().or(&acc);
            } else {
                acc = bit.not().and(&acc);
            }
        }
        acc
    }

    /// A predicate for "this integer is greater than or equal to `value`".
    pub fn geq(&self, value: u64) -> Bdd {
        if self.bits.len() < 64 && value >= (1u64 << self.bits.len()) {
            return self.vars.mk_false();
        }
        let mut acc = self.vars.mk_true();
        for (i, bit) in self.bits.iter().rev().enumerate() {
            if self.const_bit(value, i) {
                acc = bit.and(&acc);
            } else {
                acc = bit.or(&acc);
            }
        }
        acc
    }

    /// A predicate for the inclusive range `low <= value <= high`.
    pub fn range(&self, low: u64, high: u64) -> Bdd {
        assert!(low <= high, "malformed range [{low}, {high}]");
        self.geq(low).and(&self.leq(high))
    }

    /// Bitwise sum of two integers of the same width, wrapping on overflow.
    pub fn add(&self, other: &SymbolicInteger) -> SymbolicInteger {
        assert_eq!(self.width(), other.width(), "width mismatch in add");
        let mut carry = self.vars.mk_false();
        let mut result = vec![self.vars.mk_false(); self.width()];
        for i in (0..self.width()).rev() {
            let a = &self.bits[i];
            let b = &other.bits[i];
            result[i] = a.xor(b).xor(&carry);
            carry = a.and(b).or(&carry.and(&a.or(b)));
        }
        SymbolicInteger {
            vars: Arc::clone(&self.vars),
            bits: result,
        }
    }

    /// Bitwise difference of two integers of the same width, wrapping on
    /// underflow.
    pub fn sub(&self, other: &SymbolicInteger) -> SymbolicInteger {
        assert_eq!(self.width(), other.width(), "width mismatch in sub");
        let mut borrow = self.vars.mk_false();
        let mut result = vec![self.vars.mk_false(); self.width()];
        for i in (0..self.width()).rev() {
            let a = &self.bits[i];
            let b = &other.bits[i];
            result[i] = a.xor(b).xor(&borrow);
            borrow = a.not().and(b).or(&a.iff(b).and(&borrow));
        }
        SymbolicInteger {
            vars: Arc::clone(&self.vars),
            bits: result,
        }
    }

    /// A predicate for "the top `length` bits equal the top `length` bits of
    /// `address`". Requires a 32-bit integer; this is how route prefixes are
    /// matched.
    pub fn matches_prefix(&self, address: u32, length: u8) -> Bdd {
        assert_eq!(self.width(), 32, "prefix matching requires 32 bits");
        assert!(length <= 32, "invalid prefix length {length}");
        let mut acc = self.vars.mk_true();
        for i in 0..length as usize {
            let expected = (address >> (31 - i)) & 1 == 1;
            let bit = &self.bits[i];
            acc = acc.and(&if expected { bit.clone() } else { bit.not() });
        }
        acc
    }

    /// Merge two integers with if-then-else, bit by bit.
    pub fn ite(&self, guard: &Bdd, other: &SymbolicInteger) -> SymbolicInteger {
        assert_eq!(self.width(), other.width(), "width mismatch in ite");
        let bits = self
            .bits
            .iter()
            .zip(other.bits.iter())
            .map(|(t, e)| bdd_ite(guard, t, e))
            .collect();
        SymbolicInteger {
            vars: Arc::clone(&self.vars),
            bits,
        }
    }

    /// Restrict every bit formula to the given predicate.
    pub fn and(&self, pred: &Bdd) -> SymbolicInteger {
        SymbolicInteger {
            vars: Arc::clone(&self.vars),
            bits: self.bits.iter().map(|b| b.and(pred)).collect(),
        }
    }

    /// Evaluate each bit formula under a total valuation and reassemble the
    /// concrete integer.
    pub fn sat_assignment_to_value(&self, valuation: &BddValuation) -> u64 {
        let mut acc = 0u64;
        for bit in &self.bits {
            acc = (acc << 1) | (bit.eval_in(valuation) as u64);
        }
        acc
    }
}
