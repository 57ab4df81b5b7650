use biodivine_lib_bdd::Bdd;

#[cfg(test)]
mod test_utils;

pub mod aps;
pub mod error;
pub mod model;
pub mod policy;
pub mod route;
pub mod symbolic;
pub mod transfer;

/// If-then-else over three BDDs: `condition ? then_value : else_value`.
///
/// The route analysis merges diverging execution branches with this operation,
/// so it is used pervasively across the crate.
pub(crate) fn bdd_ite(condition: &Bdd, then_value: &Bdd, else_value: &Bdd) -> Bdd {
    condition
        .and(then_value)
        .or(&condition.not().and(else_value))
}

/// A utility method for printing useful metadata of a BDD predicate.
fn log_bdd(bdd: &Bdd) -> String {
    format!("nodes={}; cardinality={}", bdd.size(), bdd.cardinality())
}
