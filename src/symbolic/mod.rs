//! Symbolic encodings of route attributes as vectors of BDD bit formulas.
//!
//! Every attribute of a route announcement is represented by BDDs over a
//! fixed set of variables allocated once per analysis. For each bit `i` there
//! is both a BDD *variable* `v_i` (the i-th bit of the input announcement)
//! and a bit *formula* `f_i` giving the conditions under which the output bit
//! is set; initially `f_i` is just `v_i`, and the transfer-function
//! interpreter rewrites the formulas as it walks the policy.

mod domain;
mod integer;

pub use domain::{SymbolicDomain, bits_for};
pub use integer::SymbolicInteger;
