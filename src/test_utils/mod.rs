use crate::aps::{AtomicPredicateCatalogue, CommunityApExample, CommunityVar, Dfa};
use crate::policy::{Community, PolicyConfig, RoutingPolicy, Statement};

/// Initialize env_logger for tests. Safe to call multiple times.
pub fn init_logger() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

/// Three community blocks backed by literals `1:1`, `2:2`, `3:3`, one
/// AS-path partition split on paths starting with 65000, a track, a source
/// VRF, a next-hop interface, and a tunnel attribute.
pub fn test_catalogue() -> AtomicPredicateCatalogue {
    let mut catalogue = AtomicPredicateCatalogue::new(3, 2);
    for (ap, community) in [(0, Community::new(1, 1)), (1, Community::new(2, 2)), (2, Community::new(3, 3))] {
        catalogue.assign_community(CommunityVar::Literal(community), [ap]);
        catalogue.set_community_example(ap, CommunityApExample::Literal(community));
    }
    catalogue.assign_as_path("^65000", [1]);
    catalogue.set_as_path_example(0, Dfa::literal(&["64512"]));
    catalogue.set_as_path_example(1, Dfa::literal(&["65000"]));
    catalogue.set_tracks(vec!["uplink".to_string()]);
    catalogue.set_source_vrfs(vec!["vrf-a".to_string()]);
    catalogue.set_next_hop_interfaces(vec!["ge-0/0/0".to_string()]);
    catalogue.set_tunnel_attributes(vec!["tun-1".to_string()]);
    catalogue
}

/// A configuration holding a single policy under the given name.
pub fn single_policy_config(name: &str, statements: Vec<Statement>) -> PolicyConfig {
    let mut config = PolicyConfig::new();
    config.add_policy(RoutingPolicy::new(name, statements));
    config
}
