use std::collections::HashMap;

use crate::policy::ast::{
    Community, CommunitySetMatchExpr, LineAction, PrefixRange, Statement,
};

/// A named routing policy: a sequence of statements.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoutingPolicy {
    pub name: String,
    pub statements: Vec<Statement>,
}

impl RoutingPolicy {
    pub fn new(name: impl Into<String>, statements: Vec<Statement>) -> RoutingPolicy {
        RoutingPolicy {
            name: name.into(),
            statements,
        }
    }
}

/// One line of a route-filter list.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteFilterLine {
    pub action: LineAction,
    pub range: PrefixRange,
}

/// A named, ordered list of prefix-match lines with first-match semantics.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteFilterList {
    pub lines: Vec<RouteFilterLine>,
}

/// One line of an AS-path access list: an action and a path regex.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AsPathAccessListLine {
    pub action: LineAction,
    pub regex: String,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AsPathAccessList {
    pub lines: Vec<AsPathAccessListLine>,
}

/// Everything named that a policy can refer to: other policies, filter
/// lists, community definitions, and AS-path access lists.
///
/// Lookups return `Option`; an undefined reference is recoverable and the
/// engine treats it as a never-matching construct.
#[derive(Clone, Debug, Default)]
pub struct PolicyConfig {
    policies: HashMap<String, RoutingPolicy>,
    route_filter_lists: HashMap<String, RouteFilterList>,
    community_set_matches: HashMap<String, CommunitySetMatchExpr>,
    community_sets: HashMap<String, Vec<Community>>,
    as_path_access_lists: HashMap<String, AsPathAccessList>,
}

impl PolicyConfig {
    pub fn new() -> PolicyConfig {
        PolicyConfig::default()
    }

    pub fn add_policy(&mut self, policy: RoutingPolicy) {
        self.policies.insert(policy.name.clone(), policy);
    }

    pub fn add_route_filter_list(&mut self, name: impl Into<String>, list: RouteFilterList) {
        self.route_filter_lists.insert(name.into(), list);
    }

    pub fn add_community_set_match(
        &mut self,
        name: impl Into<String>,
        expr: CommunitySetMatchExpr,
    ) {
        self.community_set_matches.insert(name.into(), expr);
    }

    pub fn add_community_set(&mut self, name: impl Into<String>, communities: Vec<Community>) {
        self.community_sets.insert(name.into(), communities);
    }

    pub fn add_as_path_access_list(&mut self, name: impl Into<String>, list: AsPathAccessList) {
        self.as_path_access_lists.insert(name.into(), list);
    }

    pub fn policy(&self, name: &str) -> Option<&RoutingPolicy> {
        self.policies.get(name)
    }

    pub fn route_filter_list(&self, name: &str) -> Option<&RouteFilterList> {
        self.route_filter_lists.get(name)
    }

    pub fn community_set_match(&self, name: &str) -> Option<&CommunitySetMatchExpr> {
        self.community_set_matches.get(name)
    }

    pub fn community_set(&self, name: &str) -> Option<&[Community]> {
        self.community_sets.get(name).map(Vec::as_slice)
    }

    pub fn as_path_access_list(&self, name: &str) -> Option<&AsPathAccessList> {
        self.as_path_access_lists.get(name)
    }
}
