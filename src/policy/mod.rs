//! The routing-policy abstract syntax analysed by the transfer engine,
//! plus the configuration context (named policies, filter lists, community
//! and AS-path definitions) those policies refer to.

mod ast;
mod config;

pub use ast::{
    AsPathMatchExpr, BooleanExpr, Community, CommunityMatchExpr, CommunitySetExpr,
    CommunitySetMatchExpr, CommunitySetMatchLine, IntComparator, LineAction, LongExpr, NextHopExpr,
    Prefix, PrefixExpr, PrefixRange, PrefixSetExpr, Statement,
};
pub use config::{
    AsPathAccessList, AsPathAccessListLine, PolicyConfig, RouteFilterLine, RouteFilterList,
    RoutingPolicy,
};
