//! Community matching and rewriting over atomic-predicate bits.
//!
//! The atomic predicates partition the community space, so a single
//! community lies in exactly one block. That disjointness is what makes
//! the complement of a single-community match expressible: a community
//! fails to match `e` exactly when it lies in a block `e` does not cover.

use std::collections::{BTreeSet, HashMap};

use biodivine_lib_bdd::Bdd;
use log::warn;

use crate::aps::{AtomicPredicateCatalogue, CommunityVar};
use crate::bdd_ite;
use crate::policy::{
    CommunityMatchExpr, CommunitySetExpr, CommunitySetMatchExpr, IntComparator, LineAction,
    PolicyConfig,
};
use crate::route::BddRoute;

/// Bound above which size comparisons on a community set are vacuous.
pub const MAX_COMMUNITY_SET_SIZE: u64 = 64;

/// For each atomic predicate, whether the communities in its block must be
/// present, must be absent, or are unconstrained after a set-producing
/// expression executes. `must_exist` and `must_not_exist` stay disjoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommunityApDispositions {
    num_aps: usize,
    must_exist: BTreeSet<usize>,
    must_not_exist: BTreeSet<usize>,
}

impl CommunityApDispositions {
    pub fn new(
        num_aps: usize,
        must_exist: BTreeSet<usize>,
        must_not_exist: BTreeSet<usize>,
    ) -> CommunityApDispositions {
        assert!(
            must_exist.is_disjoint(&must_not_exist),
            "a community block cannot be both required and forbidden"
        );
        CommunityApDispositions {
            num_aps,
            must_exist,
            must_not_exist,
        }
    }

    /// The empty community set: every block is forbidden.
    pub fn empty(num_aps: usize) -> CommunityApDispositions {
        CommunityApDispositions::exactly(num_aps, BTreeSet::new())
    }

    /// Exactly the given blocks are present, every other block is absent.
    pub fn exactly(num_aps: usize, aps: BTreeSet<usize>) -> CommunityApDispositions {
        let complement = (0..num_aps).filter(|ap| !aps.contains(ap)).collect();
        CommunityApDispositions::new(num_aps, aps, complement)
    }

    /// No block is constrained; the input set passes through untouched.
    pub fn unconstrained(num_aps: usize) -> CommunityApDispositions {
        CommunityApDispositions::new(num_aps, BTreeSet::new(), BTreeSet::new())
    }

    /// Whether every block has a known disposition.
    pub fn is_exact(&self) -> bool {
        self.must_exist.len() + self.must_not_exist.len() == self.num_aps
    }

    pub fn must_exist(&self) -> &BTreeSet<usize> {
        &self.must_exist
    }

    pub fn must_not_exist(&self) -> &BTreeSet<usize> {
        &self.must_not_exist
    }

    /// Dispositions of the union of two community sets.
    pub fn union(&self, other: &CommunityApDispositions) -> CommunityApDispositions {
        assert_eq!(self.num_aps, other.num_aps);
        let must_exist = self.must_exist.union(&other.must_exist).copied().collect();
        let must_not_exist = self
            .must_not_exist
            .intersection(&other.must_not_exist)
            .copied()
            .collect();
        CommunityApDispositions::new(self.num_aps, must_exist, must_not_exist)
    }

    /// Dispositions of the set difference `self \ other`. The subtrahend
    /// must be exact, otherwise surviving blocks cannot be determined.
    pub fn diff(&self, other: &CommunityApDispositions) -> CommunityApDispositions {
        assert_eq!(self.num_aps, other.num_aps);
        assert!(
            other.is_exact(),
            "can only subtract a community set with exact dispositions"
        );
        let must_exist = self
            .must_exist
            .intersection(&other.must_not_exist)
            .copied()
            .collect();
        let must_not_exist = self
            .must_not_exist
            .union(&other.must_exist)
            .copied()
            .collect();
        CommunityApDispositions::new(self.num_aps, must_exist, must_not_exist)
    }
}

/// Translates community match and set expressions to predicates and
/// dispositions over a route's atomic-predicate bits.
pub struct CommunityMatcher<'a> {
    catalogue: &'a AtomicPredicateCatalogue,
    config: &'a PolicyConfig,
    entailed_cache: HashMap<CommunityMatchExpr, BTreeSet<usize>>,
}

impl<'a> CommunityMatcher<'a> {
    pub fn new(catalogue: &'a AtomicPredicateCatalogue, config: &'a PolicyConfig) -> Self {
        CommunityMatcher {
            catalogue,
            config,
            entailed_cache: HashMap::new(),
        }
    }

    fn all_aps(&self) -> BTreeSet<usize> {
        (0..self.catalogue.num_community_aps()).collect()
    }

    fn aps_of_var(&self, var: &CommunityVar) -> BTreeSet<usize> {
        match self.catalogue.community_aps_for(var) {
            Some(aps) => aps.clone(),
            None => {
                warn!("community expression {var:?} has no atomic predicates; it matches nothing");
                BTreeSet::new()
            }
        }
    }

    /// The blocks whose communities satisfy `expr`.
    pub fn entailed_aps(&mut self, expr: &CommunityMatchExpr) -> BTreeSet<usize> {
        if let Some(cached) = self.entailed_cache.get(expr) {
            return cached.clone();
        }
        let aps = match expr {
            CommunityMatchExpr::Literal(c) => self.aps_of_var(&CommunityVar::Literal(*c)),
            CommunityMatchExpr::Regex(r) => self.aps_of_var(&CommunityVar::Regex(r.clone())),
            CommunityMatchExpr::Not(inner) => {
                let inner_aps = self.entailed_aps(inner);
                self.all_aps().difference(&inner_aps).copied().collect()
            }
            CommunityMatchExpr::AnyOf(exprs) => {
                let mut aps = BTreeSet::new();
                for e in exprs {
                    aps.extend(self.entailed_aps(e));
                }
                aps
            }
            CommunityMatchExpr::AllOf(exprs) => {
                let mut aps = self.all_aps();
                for e in exprs {
                    let entailed = self.entailed_aps(e);
                    aps = aps.intersection(&entailed).copied().collect();
                }
                aps
            }
        };
        self.entailed_cache.insert(expr.clone(), aps.clone());
        aps
    }

    /// Whether some community on the route satisfies `expr`.
    pub fn has_community(&mut self, route: &BddRoute, expr: &CommunityMatchExpr) -> Bdd {
        let aps = self.entailed_aps(expr);
        aps.iter()
            .fold(route.mk_false(), |acc, ap| acc.or(&route.community_aps[*ap]))
    }

    /// Whether the route's community set satisfies `expr`. Constructs with
    /// no exact encoding evaluate to false and raise `unsupported`.
    pub fn set_match(
        &mut self,
        route: &BddRoute,
        expr: &CommunitySetMatchExpr,
        unsupported: &mut bool,
    ) -> Bdd {
        match expr {
            CommunitySetMatchExpr::HasCommunity(inner) => self.has_community(route, inner),
            CommunitySetMatchExpr::MatchAll(exprs) => exprs.iter().fold(route.mk_true(), |acc, e| {
                acc.and(&self.set_match(route, e, unsupported))
            }),
            CommunitySetMatchExpr::MatchAny(exprs) => exprs.iter().fold(route.mk_false(), |acc, e| {
                acc.or(&self.set_match(route, e, unsupported))
            }),
            CommunitySetMatchExpr::Not(inner) => self.set_match(route, inner, unsupported).not(),
            CommunitySetMatchExpr::Reference(name) => match self.config.community_set_match(name) {
                Some(resolved) => {
                    let resolved = resolved.clone();
                    self.set_match(route, &resolved, unsupported)
                }
                None => {
                    warn!("community set match `{name}` is not defined; it matches nothing");
                    route.mk_false()
                }
            },
            CommunitySetMatchExpr::HasSize(cmp, value) => {
                self.has_size(route, *cmp, *value, unsupported)
            }
            CommunitySetMatchExpr::Lines(lines) => {
                lines.iter().rev().fold(route.mk_false(), |acc, line| {
                    let matched = self.set_match(route, &line.expr, unsupported);
                    let verdict = match line.action {
                        LineAction::Permit => route.mk_true(),
                        LineAction::Deny => route.mk_false(),
                    };
                    bdd_ite(&matched, &verdict, &acc)
                })
            }
        }
    }

    /// Size comparisons only have exact encodings at the extremes; the
    /// bit encoding does not count communities.
    fn has_size(
        &mut self,
        route: &BddRoute,
        cmp: IntComparator,
        value: u64,
        unsupported: &mut bool,
    ) -> Bdd {
        match cmp {
            IntComparator::Ge if value == 0 => route.mk_true(),
            IntComparator::Ge if value == 1 => route.any_community(),
            IntComparator::Gt if value == 0 => route.any_community(),
            IntComparator::Le if value >= MAX_COMMUNITY_SET_SIZE => route.mk_true(),
            IntComparator::Lt if value > MAX_COMMUNITY_SET_SIZE => route.mk_true(),
            _ => {
                warn!("community set size comparison {cmp:?} {value} cannot be encoded");
                *unsupported = true;
                route.mk_false()
            }
        }
    }

    /// Dispositions of a set-producing expression, evaluated against the
    /// communities currently on the route.
    pub fn dispositions(&mut self, expr: &CommunitySetExpr) -> CommunityApDispositions {
        let num = self.catalogue.num_community_aps();
        match expr {
            CommunitySetExpr::InputCommunities => CommunityApDispositions::unconstrained(num),
            CommunitySetExpr::Literal(communities) => {
                let mut aps = BTreeSet::new();
                for c in communities {
                    aps.extend(self.aps_of_var(&CommunityVar::Literal(*c)));
                }
                CommunityApDispositions::exactly(num, aps)
            }
            CommunitySetExpr::Union(exprs) => exprs
                .iter()
                .fold(CommunityApDispositions::empty(num), |acc, e| {
                    acc.union(&self.dispositions(e))
                }),
            CommunitySetExpr::Difference { initial, remove } => {
                let removed = CommunityApDispositions::exactly(num, self.entailed_aps(remove));
                self.dispositions(initial).diff(&removed)
            }
            CommunitySetExpr::Reference(name) => match self.config.community_set(name) {
                Some(communities) => {
                    let communities = communities.to_vec();
                    self.dispositions(&CommunitySetExpr::Literal(communities))
                }
                None => {
                    warn!("community set `{name}` is not defined; treating as the empty set");
                    CommunityApDispositions::empty(num)
                }
            },
        }
    }
}

/// New community bits after committing `dispositions` on inputs where
/// `reach` holds; elsewhere the old bits survive.
pub fn updated_community_bits(
    route: &BddRoute,
    dispositions: &CommunityApDispositions,
    reach: &Bdd,
) -> Vec<Bdd> {
    route
        .community_aps
        .iter()
        .enumerate()
        .map(|(ap, old)| {
            if dispositions.must_exist().contains(&ap) {
                bdd_ite(reach, &route.mk_true(), old)
            } else if dispositions.must_not_exist().contains(&ap) {
                bdd_ite(reach, &route.mk_false(), old)
            } else {
                old.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{CommunityApDispositions, CommunityMatcher};
    use crate::aps::{AtomicPredicateCatalogue, CommunityVar};
    use crate::policy::{
        Community, CommunityMatchExpr, CommunitySetExpr, CommunitySetMatchExpr, IntComparator,
        PolicyConfig,
    };
    use crate::route::BddRoute;

    fn aps(ids: &[usize]) -> BTreeSet<usize> {
        ids.iter().copied().collect()
    }

    fn catalogue() -> AtomicPredicateCatalogue {
        let mut c = AtomicPredicateCatalogue::new(3, 1);
        c.assign_community(CommunityVar::Literal(Community::new(1, 1)), [0]);
        c.assign_community(CommunityVar::Literal(Community::new(2, 2)), [1]);
        c.assign_community(CommunityVar::Regex("^3:".to_string()), [1, 2]);
        c
    }

    #[test]
    fn exactly_and_empty_are_exact() {
        let d = CommunityApDispositions::exactly(4, aps(&[1, 3]));
        assert!(d.is_exact());
        assert_eq!(*d.must_exist(), aps(&[1, 3]));
        assert_eq!(*d.must_not_exist(), aps(&[0, 2]));
        assert!(CommunityApDispositions::empty(4).is_exact());
        assert!(!CommunityApDispositions::unconstrained(4).is_exact());
    }

    #[test]
    fn union_requires_either_and_forbids_both() {
        let a = CommunityApDispositions::exactly(4, aps(&[0]));
        let b = CommunityApDispositions::exactly(4, aps(&[1]));
        let u = a.union(&b);
        assert_eq!(*u.must_exist(), aps(&[0, 1]));
        assert_eq!(*u.must_not_exist(), aps(&[2, 3]));
    }

    #[test]
    fn diff_removes_subtrahend_blocks() {
        let initial = CommunityApDispositions::exactly(4, aps(&[0, 1, 2]));
        let removed = CommunityApDispositions::exactly(4, aps(&[1, 3]));
        let d = initial.diff(&removed);
        assert_eq!(*d.must_exist(), aps(&[0, 2]));
        assert_eq!(*d.must_not_exist(), aps(&[1, 3]));
    }

    #[test]
    #[should_panic]
    fn diff_rejects_inexact_subtrahend() {
        let initial = CommunityApDispositions::exactly(4, aps(&[0]));
        let inexact = CommunityApDispositions::unconstrained(4);
        let _ = initial.diff(&inexact);
    }

    #[test]
    fn entailed_aps_handle_negation_and_combinators() {
        let catalogue = catalogue();
        let config = PolicyConfig::new();
        let mut matcher = CommunityMatcher::new(&catalogue, &config);
        let regex = CommunityMatchExpr::Regex("^3:".to_string());
        assert_eq!(matcher.entailed_aps(&regex), aps(&[1, 2]));
        let not = CommunityMatchExpr::Not(Box::new(regex.clone()));
        assert_eq!(matcher.entailed_aps(&not), aps(&[0]));
        let lit = CommunityMatchExpr::Literal(Community::new(1, 1));
        let any = CommunityMatchExpr::AnyOf(vec![lit.clone(), regex.clone()]);
        assert_eq!(matcher.entailed_aps(&any), aps(&[0, 1, 2]));
        let all = CommunityMatchExpr::AllOf(vec![
            regex,
            CommunityMatchExpr::Literal(Community::new(2, 2)),
        ]);
        assert_eq!(matcher.entailed_aps(&all), aps(&[1]));
    }

    #[test]
    fn not_has_community_is_satisfied_by_empty_set() {
        let catalogue = catalogue();
        let config = PolicyConfig::new();
        let mut matcher = CommunityMatcher::new(&catalogue, &config);
        let route = BddRoute::new(&catalogue);
        let mut unsupported = false;
        let expr = CommunitySetMatchExpr::Not(Box::new(CommunitySetMatchExpr::HasCommunity(
            CommunityMatchExpr::Regex("^3:".to_string()),
        )));
        let pred = matcher.set_match(&route, &expr, &mut unsupported);
        assert!(!unsupported);
        // No community at all satisfies the negation.
        let no_community = route.any_community().not();
        assert!(no_community.imp(&pred).is_true());
        // A community in a covered block violates it.
        assert!(route.community_aps[2].and(&pred).is_false());
    }

    #[test]
    fn has_size_approximations() {
        let catalogue = catalogue();
        let config = PolicyConfig::new();
        let mut matcher = CommunityMatcher::new(&catalogue, &config);
        let route = BddRoute::new(&catalogue);
        let mut unsupported = false;

        let ge0 = CommunitySetMatchExpr::HasSize(IntComparator::Ge, 0);
        assert!(matcher.set_match(&route, &ge0, &mut unsupported).is_true());
        let ge1 = CommunitySetMatchExpr::HasSize(IntComparator::Ge, 1);
        assert_eq!(
            matcher.set_match(&route, &ge1, &mut unsupported),
            route.any_community()
        );
        let le100 = CommunitySetMatchExpr::HasSize(IntComparator::Le, 100);
        assert!(matcher.set_match(&route, &le100, &mut unsupported).is_true());
        assert!(!unsupported);

        let eq2 = CommunitySetMatchExpr::HasSize(IntComparator::Eq, 2);
        assert!(matcher.set_match(&route, &eq2, &mut unsupported).is_false());
        assert!(unsupported);
    }

    #[test]
    fn difference_dispositions() {
        let catalogue = catalogue();
        let config = PolicyConfig::new();
        let mut matcher = CommunityMatcher::new(&catalogue, &config);
        let expr = CommunitySetExpr::Difference {
            initial: Box::new(CommunitySetExpr::Literal(vec![
                Community::new(1, 1),
                Community::new(2, 2),
            ])),
            remove: CommunityMatchExpr::Literal(Community::new(2, 2)),
        };
        let d = matcher.dispositions(&expr);
        assert_eq!(*d.must_exist(), aps(&[0]));
        assert_eq!(*d.must_not_exist(), aps(&[1, 2]));
    }

    #[test]
    fn undefined_reference_matches_nothing() {
        let catalogue = catalogue();
        let config = PolicyConfig::new();
        let mut matcher = CommunityMatcher::new(&catalogue, &config);
        let route = BddRoute::new(&catalogue);
        let mut unsupported = false;
        let expr = CommunitySetMatchExpr::Reference("no-such-set".to_string());
        assert!(matcher.set_match(&route, &expr, &mut unsupported).is_false());
        assert!(!unsupported);
    }
}
