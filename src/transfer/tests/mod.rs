use biodivine_lib_bdd::Bdd;

use crate::aps::AtomicPredicateCatalogue;
use crate::policy::{
    BooleanExpr, Community, CommunityMatchExpr, CommunitySetMatchExpr, PolicyConfig, Statement,
};
use crate::route::BddRoute;
use crate::symbolic::SymbolicInteger;
use crate::test_utils::{single_policy_config, test_catalogue};
use crate::transfer::{TransferBdd, TransferResult};

mod statements;

/// Runs the named policy and returns the input route with the final result.
fn run(
    catalogue: &AtomicPredicateCatalogue,
    config: &PolicyConfig,
    name: &str,
) -> (BddRoute, TransferResult) {
    let mut transfer = TransferBdd::new(catalogue, config, name);
    let route = transfer.original_route().clone();
    let result = transfer.compute().unwrap();
    (route, result)
}

/// Runs a single policy `main` built from `statements` under the shared
/// test catalogue.
fn run_statements(statements: Vec<Statement>) -> (BddRoute, TransferResult) {
    let catalogue = test_catalogue();
    let config = single_policy_config("main", statements);
    run(&catalogue, &config, "main")
}

fn equivalent(a: &Bdd, b: &Bdd) -> bool {
    a.iff(b).is_true()
}

fn same_integer(a: &SymbolicInteger, b: &SymbolicInteger) -> bool {
    a.width() == b.width() && a.bits().iter().zip(b.bits()).all(|(x, y)| x.iff(y).is_true())
}

fn if_else(
    guard: BooleanExpr,
    then_branch: Vec<Statement>,
    else_branch: Vec<Statement>,
) -> Statement {
    Statement::If {
        guard,
        then_branch,
        else_branch,
    }
}

/// A one-statement policy accepting exactly where `guard` holds.
fn accept_if(guard: BooleanExpr) -> Vec<Statement> {
    vec![if_else(
        guard,
        vec![Statement::ExitAccept],
        vec![Statement::ExitReject],
    )]
}

fn has_community(high: u16, low: u16) -> BooleanExpr {
    BooleanExpr::MatchCommunities(CommunitySetMatchExpr::HasCommunity(
        CommunityMatchExpr::Literal(Community::new(high, low)),
    ))
}
