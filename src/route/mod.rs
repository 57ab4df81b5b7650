//! The symbolic route record.
//!
//! A [`BddRoute`] assigns every route attribute a symbolic representation
//! over one shared variable set: numeric attributes become bit-formula
//! vectors, enumerated attributes become finite symbolic domains, and the
//! community and AS-path spaces become atomic-predicate bits. A freshly
//! constructed route is the identity map (each attribute equals its own
//! input variables); the transfer engine then rewrites attributes in place
//! so that, at the end, each formula gives the output attribute as a
//! function of the input route.

use std::sync::Arc;

use biodivine_lib_bdd::{Bdd, BddVariableSet};
use log::debug;

use crate::aps::AtomicPredicateCatalogue;
use crate::symbolic::{SymbolicDomain, SymbolicInteger, bits_for};

/// Routing protocols a route can carry. Only the BGP-family protocols can
/// appear on a route entering a BGP export policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Protocol {
    Bgp,
    Ibgp,
    Aggregate,
    Ospf,
    Static,
    Connected,
}

pub const ALL_PROTOCOLS: [Protocol; 6] = [
    Protocol::Bgp,
    Protocol::Ibgp,
    Protocol::Aggregate,
    Protocol::Ospf,
    Protocol::Static,
    Protocol::Connected,
];

pub const ALL_BGP_PROTOCOLS: [Protocol; 3] =
    [Protocol::Bgp, Protocol::Ibgp, Protocol::Aggregate];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OriginType {
    Igp,
    Egp,
    Incomplete,
}

pub const ALL_ORIGIN_TYPES: [OriginType; 3] =
    [OriginType::Igp, OriginType::Egp, OriginType::Incomplete];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OspfMetricType {
    Ospf,
    OspfInterArea,
    External1,
    External2,
}

pub const ALL_OSPF_METRIC_TYPES: [OspfMetricType; 4] = [
    OspfMetricType::Ospf,
    OspfMetricType::OspfInterArea,
    OspfMetricType::External1,
    OspfMetricType::External2,
];

/// What kind of next hop the route leaves the policy with. Tracked
/// concretely because a policy installs at most a handful of distinct
/// kinds and the value never feeds back into a guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NextHopKind {
    Ip,
    SelfIp,
    BgpPeerAddress,
    Discarded,
}

pub const ADMIN_DISTANCE_WIDTH: u16 = 8;
pub const LOCAL_PREF_WIDTH: u16 = 32;
pub const MED_WIDTH: u16 = 32;
pub const TAG_WIDTH: u16 = 32;
pub const WEIGHT_WIDTH: u16 = 16;
pub const CLUSTER_LIST_LENGTH_WIDTH: u16 = 32;
pub const PREFIX_WIDTH: u16 = 32;
pub const PREFIX_LENGTH_WIDTH: u16 = 6;
pub const NEXT_HOP_WIDTH: u16 = 32;

/// A symbolic route over a shared variable set.
#[derive(Clone, Debug)]
pub struct BddRoute {
    vars: Arc<BddVariableSet>,

    pub prefix: SymbolicInteger,
    pub prefix_length: SymbolicInteger,
    pub admin_distance: SymbolicInteger,
    pub local_pref: SymbolicInteger,
    pub med: SymbolicInteger,
    pub tag: SymbolicInteger,
    pub weight: SymbolicInteger,
    pub cluster_list_length: SymbolicInteger,
    pub next_hop: SymbolicInteger,

    pub protocol: SymbolicDomain<Protocol>,
    pub origin_type: SymbolicDomain<OriginType>,
    pub ospf_metric_type: SymbolicDomain<OspfMetricType>,
    /// Which block of the AS-path partition the route's path lies in.
    pub as_path_aps: SymbolicDomain<usize>,
    /// Index 0 stands for "no interface"; likewise for VRFs and tunnels.
    pub next_hop_interface: SymbolicDomain<Option<String>>,
    pub source_vrf: SymbolicDomain<Option<String>>,
    pub tunnel_attribute: SymbolicDomain<Option<String>>,

    /// One bit per community atomic predicate: whether some community on
    /// the route lies in that block.
    pub community_aps: Vec<Bdd>,
    /// One bit per track: whether the named track succeeded.
    pub tracks: Vec<Bdd>,

    pub next_hop_set: bool,
    pub next_hop_kind: NextHopKind,
    pub prepended_ases: Vec<u64>,
    /// Set when the policy used a construct whose effect on the route could
    /// not be modelled exactly.
    pub unsupported: bool,
}

fn optional_values(names: &[String]) -> Vec<Option<String>> {
    let mut values = vec![None];
    values.extend(names.iter().cloned().map(Some));
    values
}

impl BddRoute {
    /// Builds the identity route for the given catalogue: one fresh
    /// variable per attribute bit, in a fixed layout.
    pub fn new(catalogue: &AtomicPredicateCatalogue) -> BddRoute {
        let as_path_values: Vec<usize> = (0..catalogue.num_as_path_aps()).collect();
        let interface_values = optional_values(catalogue.next_hop_interfaces());
        let vrf_values = optional_values(catalogue.source_vrfs());
        let tunnel_values = optional_values(catalogue.tunnel_attributes());

        let total = PREFIX_WIDTH
            + PREFIX_LENGTH_WIDTH
            + ADMIN_DISTANCE_WIDTH
            + LOCAL_PREF_WIDTH
            + MED_WIDTH
            + TAG_WIDTH
            + WEIGHT_WIDTH
            + CLUSTER_LIST_LENGTH_WIDTH
            + NEXT_HOP_WIDTH
            + bits_for(ALL_PROTOCOLS.len())
            + bits_for(ALL_ORIGIN_TYPES.len())
            + bits_for(ALL_OSPF_METRIC_TYPES.len())
            + bits_for(as_path_values.len().max(1))
            + bits_for(interface_values.len())
            + bits_for(vrf_values.len())
            + bits_for(tunnel_values.len())
            + catalogue.num_community_aps() as u16
            + catalogue.tracks().len() as u16;
        let vars = Arc::new(BddVariableSet::new_anonymous(total));
        let all = vars.variables();
        debug!("allocated {total} route variables");

        let mut cursor = 0usize;
        let mut take = |width: u16| {
            let slice = all[cursor..cursor + width as usize].to_vec();
            cursor += width as usize;
            slice
        };

        let prefix = SymbolicInteger::new(&vars, &take(PREFIX_WIDTH));
        let prefix_length = SymbolicInteger::new(&vars, &take(PREFIX_LENGTH_WIDTH));
        let admin_distance = SymbolicInteger::new(&vars, &take(ADMIN_DISTANCE_WIDTH));
        let local_pref = SymbolicInteger::new(&vars, &take(LOCAL_PREF_WIDTH));
        let med = SymbolicInteger::new(&vars, &take(MED_WIDTH));
        let tag = SymbolicInteger::new(&vars, &take(TAG_WIDTH));
        let weight = SymbolicInteger::new(&vars, &take(WEIGHT_WIDTH));
        let cluster_list_length = SymbolicInteger::new(&vars, &take(CLUSTER_LIST_LENGTH_WIDTH));
        let next_hop = SymbolicInteger::new(&vars, &take(NEXT_HOP_WIDTH));

        let protocol = SymbolicDomain::new(
            &vars,
            ALL_PROTOCOLS.to_vec(),
            &take(bits_for(ALL_PROTOCOLS.len())),
        );
        let origin_type = SymbolicDomain::new(
            &vars,
            ALL_ORIGIN_TYPES.to_vec(),
            &take(bits_for(ALL_ORIGIN_TYPES.len())),
        );
        let ospf_metric_type = SymbolicDomain::new(
            &vars,
            ALL_OSPF_METRIC_TYPES.to_vec(),
            &take(bits_for(ALL_OSPF_METRIC_TYPES.len())),
        );
        let as_path_aps = SymbolicDomain::new(
            &vars,
            as_path_values,
            &take(bits_for(catalogue.num_as_path_aps().max(1))),
        );
        let next_hop_interface = SymbolicDomain::new(
            &vars,
            interface_values.clone(),
            &take(bits_for(interface_values.len())),
        );
        let source_vrf =
            SymbolicDomain::new(&vars, vrf_values.clone(), &take(bits_for(vrf_values.len())));
        let tunnel_attribute = SymbolicDomain::new(
            &vars,
            tunnel_values.clone(),
            &take(bits_for(tunnel_values.len())),
        );

        let community_aps: Vec<Bdd> = take(catalogue.num_community_aps() as u16)
            .iter()
            .map(|v| vars.mk_var(*v))
            .collect();
        let tracks: Vec<Bdd> = take(catalogue.tracks().len() as u16)
            .iter()
            .map(|v| vars.mk_var(*v))
            .collect();

        BddRoute {
            vars,
            prefix,
            prefix_length,
            admin_distance,
            local_pref,
            med,
            tag,
            weight,
            cluster_list_length,
            next_hop,
            protocol,
            origin_type,
            ospf_metric_type,
            as_path_aps,
            next_hop_interface,
            source_vrf,
            tunnel_attribute,
            community_aps,
            tracks,
            next_hop_set: false,
            next_hop_kind: NextHopKind::Ip,
            prepended_ases: Vec::new(),
            unsupported: false,
        }
    }

    pub fn variable_set(&self) -> &Arc<BddVariableSet> {
        &self.vars
    }

    pub fn mk_true(&self) -> Bdd {
        self.vars.mk_true()
    }

    pub fn mk_false(&self) -> Bdd {
        self.vars.mk_false()
    }

    /// Whether the route carries at least one community.
    pub fn any_community(&self) -> Bdd {
        self.community_aps
            .iter()
            .fold(self.vars.mk_false(), |acc, ap| acc.or(ap))
    }

    /// Constraints any well-formed BGP input route satisfies: a BGP-family
    /// protocol, a prefix length of at most 32, in-range domain indices,
    /// and a next hop that is neither 0.0.0.0 nor 255.255.255.255.
    pub fn well_formedness_constraints(&self) -> Bdd {
        let mut constraint = self.protocol.any_of(&ALL_BGP_PROTOCOLS);
        constraint = constraint.and(&self.prefix_length.leq(32));
        constraint = constraint.and(&self.origin_type.is_valid_constraint());
        constraint = constraint.and(&self.ospf_metric_type.is_valid_constraint());
        constraint = constraint.and(&self.as_path_aps.is_valid_constraint());
        constraint = constraint.and(&self.next_hop_interface.is_valid_constraint());
        constraint = constraint.and(&self.source_vrf.is_valid_constraint());
        constraint = constraint.and(&self.tunnel_attribute.is_valid_constraint());
        constraint = constraint.and(&self.next_hop.geq(1));
        constraint.and(&self.next_hop.leq(u32::MAX as u64 - 1))
    }

    /// Conjoins `constraint` onto every attribute formula. Concrete fields
    /// are untouched.
    pub fn restrict(&self, constraint: &Bdd) -> BddRoute {
        let mut copy = self.clone();
        copy.prefix = self.prefix.and(constraint);
        copy.prefix_length = self.prefix_length.and(constraint);
        copy.admin_distance = self.admin_distance.and(constraint);
        copy.local_pref = self.local_pref.and(constraint);
        copy.med = self.med.and(constraint);
        copy.tag = self.tag.and(constraint);
        copy.weight = self.weight.and(constraint);
        copy.cluster_list_length = self.cluster_list_length.and(constraint);
        copy.next_hop = self.next_hop.and(constraint);
        copy.protocol = self.protocol.and(constraint);
        copy.origin_type = self.origin_type.and(constraint);
        copy.ospf_metric_type = self.ospf_metric_type.and(constraint);
        copy.as_path_aps = self.as_path_aps.and(constraint);
        copy.next_hop_interface = self.next_hop_interface.and(constraint);
        copy.source_vrf = self.source_vrf.and(constraint);
        copy.tunnel_attribute = self.tunnel_attribute.and(constraint);
        copy.community_aps = self.community_aps.iter().map(|b| b.and(constraint)).collect();
        copy.tracks = self.tracks.iter().map(|b| b.and(constraint)).collect();
        copy
    }

    /// Per-attribute if-then-else merge. Symbolic attributes merge bit by
    /// bit; concrete attributes merge only when equal and otherwise fall
    /// back to their defaults with the unsupported flag raised.
    pub fn ite(&self, condition: &Bdd, other: &BddRoute) -> BddRoute {
        // A branch only taints the merge if the guard can actually reach it.
        let mut unsupported = (self.unsupported && !condition.is_false())
            || (other.unsupported && !condition.is_true());

        let next_hop_set;
        let next_hop_kind;
        if self.next_hop_set == other.next_hop_set && self.next_hop_kind == other.next_hop_kind {
            next_hop_set = self.next_hop_set;
            next_hop_kind = self.next_hop_kind;
        } else {
            next_hop_set = false;
            next_hop_kind = NextHopKind::Ip;
            unsupported = true;
        }

        let prepended_ases = if self.prepended_ases == other.prepended_ases {
            self.prepended_ases.clone()
        } else {
            unsupported = true;
            Vec::new()
        };

        BddRoute {
            vars: self.vars.clone(),
            prefix: self.prefix.ite(condition, &other.prefix),
            prefix_length: self.prefix_length.ite(condition, &other.prefix_length),
            admin_distance: self.admin_distance.ite(condition, &other.admin_distance),
            local_pref: self.local_pref.ite(condition, &other.local_pref),
            med: self.med.ite(condition, &other.med),
            tag: self.tag.ite(condition, &other.tag),
            weight: self.weight.ite(condition, &other.weight),
            cluster_list_length: self
                .cluster_list_length
                .ite(condition, &other.cluster_list_length),
            next_hop: self.next_hop.ite(condition, &other.next_hop),
            protocol: self.protocol.ite(condition, &other.protocol),
            origin_type: self.origin_type.ite(condition, &other.origin_type),
            ospf_metric_type: self
                .ospf_metric_type
                .ite(condition, &other.ospf_metric_type),
            as_path_aps: self.as_path_aps.ite(condition, &other.as_path_aps),
            next_hop_interface: self
                .next_hop_interface
                .ite(condition, &other.next_hop_interface),
            source_vrf: self.source_vrf.ite(condition, &other.source_vrf),
            tunnel_attribute: self
                .tunnel_attribute
                .ite(condition, &other.tunnel_attribute),
            community_aps: self
                .community_aps
                .iter()
                .zip(&other.community_aps)
                .map(|(t, e)| crate::bdd_ite(condition, t, e))
                .collect(),
            tracks: self
                .tracks
                .iter()
                .zip(&other.tracks)
                .map(|(t, e)| crate::bdd_ite(condition, t, e))
                .collect(),
            next_hop_set,
            next_hop_kind,
            prepended_ases,
            unsupported,
        }
    }

    /// Structural equality of every attribute formula and concrete field.
    pub fn equal_attributes(&self, other: &BddRoute) -> bool {
        self.prefix.bits() == other.prefix.bits()
            && self.prefix_length.bits() == other.prefix_length.bits()
            && self.admin_distance.bits() == other.admin_distance.bits()
            && self.local_pref.bits() == other.local_pref.bits()
            && self.med.bits() == other.med.bits()
            && self.tag.bits() == other.tag.bits()
            && self.weight.bits() == other.weight.bits()
            && self.cluster_list_length.bits() == other.cluster_list_length.bits()
            && self.next_hop.bits() == other.next_hop.bits()
            && self.protocol.index().bits() == other.protocol.index().bits()
            && self.origin_type.index().bits() == other.origin_type.index().bits()
            && self.ospf_metric_type.index().bits() == other.ospf_metric_type.index().bits()
            && self.as_path_aps.index().bits() == other.as_path_aps.index().bits()
            && self.next_hop_interface.index().bits() == other.next_hop_interface.index().bits()
            && self.source_vrf.index().bits() == other.source_vrf.index().bits()
            && self.tunnel_attribute.index().bits() == other.tunnel_attribute.index().bits()
            && self.community_aps == other.community_aps
            && self.tracks == other.tracks
            && self.next_hop_set == other.next_hop_set
            && self.next_hop_kind == other.next_hop_kind
            && self.prepended_ases == other.prepended_ases
            && self.unsupported == other.unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::{ALL_BGP_PROTOCOLS, BddRoute, NextHopKind, Protocol};
    use crate::aps::AtomicPredicateCatalogue;

    fn small_catalogue() -> AtomicPredicateCatalogue {
        let mut catalogue = AtomicPredicateCatalogue::new(3, 2);
        catalogue.set_tracks(vec!["t0".to_string()]);
        catalogue.set_source_vrfs(vec!["vrf-a".to_string()]);
        catalogue
    }

    #[test]
    fn fresh_route_is_identity() {
        let route = BddRoute::new(&small_catalogue());
        // Each community bit is a distinct variable.
        for (i, a) in route.community_aps.iter().enumerate() {
            for b in route.community_aps.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
        assert!(!route.next_hop_set);
        assert_eq!(route.next_hop_kind, NextHopKind::Ip);
        assert!(route.prepended_ases.is_empty());
        assert!(!route.unsupported);
    }

    #[test]
    fn any_community_is_union_of_bits() {
        let route = BddRoute::new(&small_catalogue());
        let any = route.any_community();
        for ap in &route.community_aps {
            assert!(ap.imp(&any).is_true());
        }
        let none = route
            .community_aps
            .iter()
            .fold(route.mk_true(), |acc, ap| acc.and(&ap.not()));
        assert!(any.and(&none).is_false());
    }

    #[test]
    fn well_formedness_excludes_non_bgp_protocols() {
        let route = BddRoute::new(&small_catalogue());
        let wf = route.well_formedness_constraints();
        assert!(wf.and(&route.protocol.value(&Protocol::Ospf)).is_false());
        for p in ALL_BGP_PROTOCOLS {
            assert!(
                wf.and(&route.protocol.value(&p)).sat_witness().is_some(),
                "{p:?} should be allowed"
            );
        }
        assert!(wf.and(&route.prefix_length.geq(33)).is_false());
    }

    #[test]
    fn restrict_conjoins_every_attribute() {
        let route = BddRoute::new(&small_catalogue());
        let constraint = route.protocol.value(&Protocol::Bgp);
        let restricted = route.restrict(&constraint);
        for (original, new) in route.local_pref.bits().iter().zip(restricted.local_pref.bits()) {
            assert_eq!(*new, original.and(&constraint));
        }
        for (original, new) in route.community_aps.iter().zip(&restricted.community_aps) {
            assert_eq!(*new, original.and(&constraint));
        }
        // Concrete fields are untouched.
        assert_eq!(restricted.next_hop_kind, route.next_hop_kind);
        assert_eq!(restricted.unsupported, route.unsupported);
    }

    #[test]
    fn ite_totality_per_attribute() {
        let route = BddRoute::new(&small_catalogue());
        let guard = route.community_aps[0].clone();
        let mut changed = route.clone();
        changed.local_pref =
            crate::symbolic::SymbolicInteger::constant(route.variable_set(), super::LOCAL_PREF_WIDTH, 7);
        changed.community_aps[1] = route.mk_true();
        let merged = changed.ite(&guard, &route);
        // Where the guard holds, the merge reproduces the changed route.
        assert!(
            guard
                .imp(&merged.local_pref.bits().iter().zip(changed.local_pref.bits()).fold(
                    route.mk_true(),
                    |acc, (m, c)| acc.and(&m.iff(c))
                ))
                .is_true()
        );
        // Where it does not, the original survives on every attribute.
        let not_guard = guard.not();
        assert!(
            not_guard
                .imp(&merged.community_aps[1].iff(&route.community_aps[1]))
                .is_true()
        );
        assert!(
            not_guard
                .imp(&merged.local_pref.bits().iter().zip(route.local_pref.bits()).fold(
                    route.mk_true(),
                    |acc, (m, o)| acc.and(&m.iff(o))
                ))
                .is_true()
        );
    }

    #[test]
    fn ite_merges_concrete_fields() {
        let route = BddRoute::new(&small_catalogue());
        let guard = route.community_aps[0].clone();

        let mut then_route = route.clone();
        then_route.local_pref = crate::symbolic::SymbolicInteger::constant(
            route.variable_set(),
            super::LOCAL_PREF_WIDTH,
            200,
        );
        let merged = route.ite(&guard.not(), &then_route);
        assert!(!merged.unsupported);

        let mut prepended = route.clone();
        prepended.prepended_ases = vec![65000];
        let merged = prepended.ite(&guard, &route);
        assert!(merged.unsupported);
        assert!(merged.prepended_ases.is_empty());
    }

    #[test]
    fn equal_attributes_detects_differences() {
        let route = BddRoute::new(&small_catalogue());
        let copy = route.clone();
        assert!(route.equal_attributes(&copy));
        let mut changed = route.clone();
        changed.next_hop_set = true;
        assert!(!route.equal_attributes(&changed));
    }
}
