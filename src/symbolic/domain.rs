use std::fmt::Debug;
use std::sync::Arc;

use biodivine_lib_bdd::{Bdd, BddValuation, BddVariable, BddVariableSet};

use crate::symbolic::SymbolicInteger;

/// A symbolic variable ranging over a small finite set of values.
///
/// The values are indexed by their position in the value list and the index is
/// held as a [`SymbolicInteger`] of `ceil(log2(n))` bits. A domain with a single
/// value needs zero bits. Bit patterns `>= n` encode nothing; constraints built
/// through this type never produce them, and [`SymbolicDomain::is_valid_constraint`]
/// can rule them out explicitly when a formula must be restricted to real values.
#[derive(Clone, Debug)]
pub struct SymbolicDomain<T> {
    values: Arc<Vec<T>>,
    index: SymbolicInteger,
}

/// Number of bits needed to index `n` distinct values.
pub fn bits_for(n: usize) -> u16 {
    let mut bits = 0u16;
    while (1usize << bits) < n {
        bits += 1;
    }
    bits
}

impl<T: Clone + Eq + Debug> SymbolicDomain<T> {
    /// Creates a domain over `values`, consuming `bits_for(values.len())`
    /// variables from `bit_vars`.
    pub fn new(vars: &Arc<BddVariableSet>, values: Vec<T>, bit_vars: &[BddVariable]) -> Self {
        assert!(!values.is_empty(), "a symbolic domain needs at least one value");
        assert_eq!(bit_vars.len(), bits_for(values.len()) as usize);
        SymbolicDomain {
            values: Arc::new(values),
            index: SymbolicInteger::new(vars, bit_vars),
        }
    }

    /// A domain pinned to a single concrete value, using no variables.
    pub fn constant(vars: &Arc<BddVariableSet>, values: Vec<T>, value: &T) -> Self {
        let position = values
            .iter()
            .position(|v| v == value)
            .unwrap_or_else(|| panic!("value {value:?} is not part of the domain"));
        let bits = bits_for(values.len());
        SymbolicDomain {
            values: Arc::new(values),
            index: SymbolicInteger::constant(vars, bits, position as u64),
        }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn index(&self) -> &SymbolicInteger {
        &self.index
    }

    /// The predicate under which this domain holds `value`.
    ///
    /// Panics if `value` is not part of the domain; callers are expected to
    /// only ask about values the domain was built from.
    pub fn value(&self, value: &T) -> Bdd {
        let position = self
            .values
            .iter()
            .position(|v| v == value)
            .unwrap_or_else(|| panic!("value {value:?} is not part of the domain"));
        self.index.value(position as u64)
    }

    /// The predicate under which this domain holds any of `values`.
    pub fn any_of(&self, values: &[T]) -> Bdd {
        let vars = self.index.variable_set();
        values
            .iter()
            .fold(vars.mk_false(), |acc, v| acc.or(&self.value(v)))
    }

    /// Rules out the unused bit patterns above the last value index.
    pub fn is_valid_constraint(&self) -> Bdd {
        self.index.leq((self.values.len() - 1) as u64)
    }

    /// Per-bit if-then-else merge of two domains over the same value list.
    pub fn ite(&self, condition: &Bdd, other: &Self) -> Self {
        assert_eq!(self.values, other.values);
        SymbolicDomain {
            values: self.values.clone(),
            index: self.index.ite(condition, &other.index),
        }
    }

    /// Conjoins `constraint` onto every index bit.
    pub fn and(&self, constraint: &Bdd) -> Self {
        SymbolicDomain {
            values: self.values.clone(),
            index: self.index.and(constraint),
        }
    }

    /// Reads the concrete value off a total satisfying assignment.
    ///
    /// Panics if the assignment encodes an index past the end of the value
    /// list, which means the model was produced without the validity
    /// constraint and is malformed.
    pub fn sat_assignment_to_value(&self, valuation: &BddValuation) -> &T {
        let index = self.index.sat_assignment_to_value(valuation) as usize;
        assert!(
            index < self.values.len(),
            "satisfying assignment encodes index {index} outside a domain of {} values",
            self.values.len()
        );
        &self.values[index]
    }
}
