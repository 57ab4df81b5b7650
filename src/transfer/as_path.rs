//! AS-path matching over the path's atomic-predicate domain.
//!
//! Unlike communities, a route has exactly one AS path, so the encoding is
//! a single finite domain over the partition blocks rather than one bit
//! per block.

use biodivine_lib_bdd::Bdd;
use log::warn;

use crate::aps::AtomicPredicateCatalogue;
use crate::bdd_ite;
use crate::policy::{AsPathMatchExpr, LineAction, PolicyConfig};
use crate::route::BddRoute;

/// Whether the route's AS path satisfies `expr`, evaluated against the
/// route's AS-path domain. `HasLength` has no encoding and evaluates to
/// false with `unsupported` raised.
pub fn as_path_match(
    catalogue: &AtomicPredicateCatalogue,
    config: &PolicyConfig,
    route: &BddRoute,
    expr: &AsPathMatchExpr,
    unsupported: &mut bool,
) -> Bdd {
    match expr {
        AsPathMatchExpr::Regex(regex) => regex_match(catalogue, route, regex),
        AsPathMatchExpr::Any(exprs) => exprs.iter().fold(route.mk_false(), |acc, e| {
            acc.or(&as_path_match(catalogue, config, route, e, unsupported))
        }),
        AsPathMatchExpr::AccessList(name) => match config.as_path_access_list(name) {
            Some(list) => list.lines.iter().rev().fold(route.mk_false(), |acc, line| {
                let matched = regex_match(catalogue, route, &line.regex);
                let verdict = match line.action {
                    LineAction::Permit => route.mk_true(),
                    LineAction::Deny => route.mk_false(),
                };
                bdd_ite(&matched, &verdict, &acc)
            }),
            None => {
                warn!("AS-path access list `{name}` is not defined; it matches nothing");
                route.mk_false()
            }
        },
        AsPathMatchExpr::HasLength(cmp, value) => {
            warn!("AS-path length comparison {cmp:?} {value} cannot be encoded");
            *unsupported = true;
            route.mk_false()
        }
    }
}

fn regex_match(catalogue: &AtomicPredicateCatalogue, route: &BddRoute, regex: &str) -> Bdd {
    match catalogue.as_path_aps_for(regex) {
        Some(aps) => {
            let blocks: Vec<usize> = aps.iter().copied().collect();
            route.as_path_aps.any_of(&blocks)
        }
        None => {
            warn!("AS-path regex `{regex}` has no atomic predicates; it matches nothing");
            route.mk_false()
        }
    }
}
