//! Turning satisfying assignments into concrete example routes.
//!
//! A satisfying assignment of the route variables is a "model": one
//! concrete input route (plus environment) on which the analysed predicate
//! holds. Before extracting a witness the constraint is tightened towards
//! reader-friendly defaults, keeping each candidate constraint only if the
//! predicate stays satisfiable.

use biodivine_lib_bdd::{Bdd, BddValuation};
use log::{debug, warn};

use crate::aps::AtomicPredicateCatalogue;
use crate::policy::{Community, Prefix};
use crate::route::{BddRoute, NextHopKind, OriginType, Protocol};

/// RFC 5737 documentation blocks, preferred for example prefixes.
const DOCUMENTATION_BLOCKS: [u32; 3] = [
    0xC000_0200, // 192.0.2.0
    0xC633_6400, // 198.51.100.0
    0xCB00_7100, // 203.0.113.0
];

const PRIVATE_10_SLASH_8: u32 = 0x0A00_0000;

/// The next hop of a concrete route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConcreteNextHop {
    Ip(u32),
    Discarded,
    SelfIp,
    BgpPeerAddress,
}

/// A fully concrete route read off a model.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConcreteRoute {
    pub prefix: Prefix,
    pub protocol: Protocol,
    pub origin_type: OriginType,
    pub admin_distance: u64,
    pub local_pref: u64,
    pub med: u64,
    pub tag: u64,
    pub weight: u64,
    pub cluster_list_length: u64,
    pub next_hop: ConcreteNextHop,
    pub next_hop_interface: Option<String>,
    pub communities: Vec<Community>,
    pub as_path: Vec<u64>,
    pub tunnel_attribute: Option<String>,
}

/// The non-route inputs a policy run depends on.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicyEnvironment {
    pub successful_tracks: Vec<String>,
    pub source_vrf: Option<String>,
}

/// Picks one total satisfying assignment of `constraints`, after tightening
/// towards default-friendly attribute values in priority order. Panics on an
/// unsatisfiable input; callers are expected to check satisfiability first.
pub fn constraints_to_model(constraints: &Bdd, route: &BddRoute) -> BddValuation {
    assert!(
        !constraints.is_false(),
        "cannot derive a model from an unsatisfiable predicate"
    );
    let mut current = constraints.clone();
    current = try_tighten(current, route.protocol.value(&Protocol::Bgp));
    current = try_tighten(current, route.local_pref.value(100));

    let mut prefix_chosen = false;
    for block in DOCUMENTATION_BLOCKS {
        let candidate = route
            .prefix
            .matches_prefix(block, 24)
            .and(&route.prefix_length.geq(24))
            .and(&route.prefix_length.leq(32));
        if !current.and(&candidate).is_false() {
            current = current.and(&candidate);
            prefix_chosen = true;
            break;
        }
    }
    if !prefix_chosen {
        let candidate = route
            .prefix
            .geq(PRIVATE_10_SLASH_8 as u64)
            .and(&route.prefix_length.geq(16));
        current = try_tighten(current, candidate);
    }

    debug!("model constraint after tightening: {}", crate::log_bdd(&current));
    match current.sat_witness() {
        Some(valuation) => valuation,
        // Every tightening step preserved satisfiability.
        None => unreachable!("tightened constraint lost satisfiability"),
    }
}

fn try_tighten(current: Bdd, candidate: Bdd) -> Bdd {
    let tightened = current.and(&candidate);
    if tightened.is_false() { current } else { tightened }
}

/// Rebuilds the concrete input route encoded by a model.
pub fn sat_assignment_to_input_route(
    valuation: &BddValuation,
    route: &BddRoute,
    catalogue: &AtomicPredicateCatalogue,
) -> ConcreteRoute {
    let next_hop = ConcreteNextHop::Ip(route.next_hop.sat_assignment_to_value(valuation) as u32);
    ConcreteRoute {
        next_hop,
        as_path: as_path_from(valuation, route, catalogue),
        ..concrete_attributes(valuation, route, catalogue)
    }
}

/// Rebuilds the concrete output route: formulas are evaluated under the
/// model, the concrete next-hop kind is applied, and prepended ASNs are
/// put back in front of the example path.
pub fn sat_assignment_to_output_route(
    valuation: &BddValuation,
    output: &BddRoute,
    catalogue: &AtomicPredicateCatalogue,
) -> ConcreteRoute {
    let next_hop = match output.next_hop_kind {
        NextHopKind::Ip => {
            ConcreteNextHop::Ip(output.next_hop.sat_assignment_to_value(valuation) as u32)
        }
        NextHopKind::Discarded => ConcreteNextHop::Discarded,
        NextHopKind::SelfIp => ConcreteNextHop::SelfIp,
        NextHopKind::BgpPeerAddress => ConcreteNextHop::BgpPeerAddress,
    };
    let mut as_path = output.prepended_ases.clone();
    as_path.extend(as_path_from(valuation, output, catalogue));
    ConcreteRoute {
        next_hop,
        as_path,
        ..concrete_attributes(valuation, output, catalogue)
    }
}

/// Reads the environment values off a model.
pub fn sat_assignment_to_environment(
    valuation: &BddValuation,
    route: &BddRoute,
    catalogue: &AtomicPredicateCatalogue,
) -> PolicyEnvironment {
    let successful_tracks = catalogue
        .tracks()
        .iter()
        .zip(&route.tracks)
        .filter(|(_, bit)| bit.eval_in(valuation))
        .map(|(name, _)| name.clone())
        .collect();
    PolicyEnvironment {
        successful_tracks,
        source_vrf: route.source_vrf.sat_assignment_to_value(valuation).clone(),
    }
}

/// Checks the symbolic prediction against an independently simulated run.
/// Output routes are only compared when both sides accept.
pub fn validate_model(
    predicted_accept: bool,
    predicted_route: &ConcreteRoute,
    simulated_accept: bool,
    simulated_route: Option<&ConcreteRoute>,
) -> bool {
    if predicted_accept != simulated_accept {
        warn!(
            "action mismatch: symbolic analysis predicts {}, simulation produced {}",
            verdict(predicted_accept),
            verdict(simulated_accept)
        );
        return false;
    }
    if !predicted_accept {
        return true;
    }
    match simulated_route {
        Some(simulated) if simulated == predicted_route => true,
        Some(simulated) => {
            warn!("output route mismatch: predicted {predicted_route:?}, simulated {simulated:?}");
            false
        }
        None => {
            warn!("simulation accepted but produced no output route");
            false
        }
    }
}

fn verdict(accept: bool) -> &'static str {
    if accept { "accept" } else { "deny" }
}

fn concrete_attributes(
    valuation: &BddValuation,
    route: &BddRoute,
    catalogue: &AtomicPredicateCatalogue,
) -> ConcreteRoute {
    let mut communities = Vec::new();
    for (ap, bit) in route.community_aps.iter().enumerate() {
        if bit.eval_in(valuation) {
            match catalogue.community_example(ap) {
                Some(community) => communities.push(community),
                None => warn!("community block {ap} has no example; omitting it from the model"),
            }
        }
    }
    ConcreteRoute {
        prefix: Prefix::new(
            route.prefix.sat_assignment_to_value(valuation) as u32,
            route.prefix_length.sat_assignment_to_value(valuation) as u8,
        ),
        protocol: *route.protocol.sat_assignment_to_value(valuation),
        origin_type: *route.origin_type.sat_assignment_to_value(valuation),
        admin_distance: route.admin_distance.sat_assignment_to_value(valuation),
        local_pref: route.local_pref.sat_assignment_to_value(valuation),
        med: route.med.sat_assignment_to_value(valuation),
        tag: route.tag.sat_assignment_to_value(valuation),
        weight: route.weight.sat_assignment_to_value(valuation),
        cluster_list_length: route.cluster_list_length.sat_assignment_to_value(valuation),
        next_hop: ConcreteNextHop::Ip(0),
        next_hop_interface: route
            .next_hop_interface
            .sat_assignment_to_value(valuation)
            .clone(),
        communities,
        as_path: Vec::new(),
        tunnel_attribute: route.tunnel_attribute.sat_assignment_to_value(valuation).clone(),
    }
}

fn as_path_from(
    valuation: &BddValuation,
    route: &BddRoute,
    catalogue: &AtomicPredicateCatalogue,
) -> Vec<u64> {
    let ap = *route.as_path_aps.sat_assignment_to_value(valuation);
    match catalogue.as_path_example(ap) {
        Some(path) => path,
        None => {
            warn!("AS-path block {ap} has no example; using the empty path");
            Vec::new()
        }
    }
}
