//! Atomic predicates for community and AS-path regex spaces.
//!
//! The engine does not compute atomic predicates itself. A finite partition
//! of each regex space is supplied up front, together with the mapping from
//! every regex (or literal) appearing in the analysed policies to the set of
//! partition blocks it covers. Each block additionally carries enough
//! information to produce a concrete example value when a model is built
//! from a satisfying assignment.

mod automaton;

pub use automaton::Dfa;

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use crate::policy::Community;

/// A community-space expression that participates in the atomic-predicate
/// partition: either a single literal community or a regex.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommunityVar {
    Literal(Community),
    Regex(String),
}

/// How to produce a concrete example for one community atomic predicate.
#[derive(Clone, Debug)]
pub enum CommunityApExample {
    Literal(Community),
    Acceptor(Dfa),
}

/// The atomic predicates of one regex space: a count of partition blocks
/// and, for every known expression, the ids of the blocks it covers.
#[derive(Clone, Debug)]
pub struct RegexAtomicPredicates<K> {
    num: usize,
    aps: HashMap<K, BTreeSet<usize>>,
}

impl<K: Eq + Hash + std::fmt::Debug> RegexAtomicPredicates<K> {
    pub fn new(num: usize) -> RegexAtomicPredicates<K> {
        RegexAtomicPredicates {
            num,
            aps: HashMap::new(),
        }
    }

    pub fn num(&self) -> usize {
        self.num
    }

    pub fn assign(&mut self, key: K, aps: impl IntoIterator<Item = usize>) {
        let aps: BTreeSet<usize> = aps.into_iter().collect();
        assert!(aps.iter().all(|ap| *ap < self.num));
        self.aps.insert(key, aps);
    }

    /// The partition blocks covered by `key`, or `None` if the partition
    /// has never seen this expression. Callers treat an unknown expression
    /// as a never-matching predicate.
    pub fn aps_for(&self, key: &K) -> Option<&BTreeSet<usize>> {
        self.aps.get(key)
    }
}

/// Everything externally supplied that shapes the symbolic route encoding:
/// atomic predicates for communities and AS paths, plus the finite value
/// lists for tracks, source VRFs, next-hop interfaces, and tunnel
/// attributes.
#[derive(Clone, Debug)]
pub struct AtomicPredicateCatalogue {
    communities: RegexAtomicPredicates<CommunityVar>,
    as_paths: RegexAtomicPredicates<String>,
    community_examples: HashMap<usize, CommunityApExample>,
    as_path_examples: HashMap<usize, Dfa>,
    tracks: Vec<String>,
    source_vrfs: Vec<String>,
    next_hop_interfaces: Vec<String>,
    tunnel_attributes: Vec<String>,
}

impl AtomicPredicateCatalogue {
    /// Creates a catalogue. The AS-path partition must have at least one
    /// block because every route has some AS path.
    pub fn new(num_community_aps: usize, num_as_path_aps: usize) -> AtomicPredicateCatalogue {
        assert!(
            num_as_path_aps >= 1,
            "the AS-path partition must cover the whole space"
        );
        AtomicPredicateCatalogue {
            communities: RegexAtomicPredicates::new(num_community_aps),
            as_paths: RegexAtomicPredicates::new(num_as_path_aps),
            community_examples: HashMap::new(),
            as_path_examples: HashMap::new(),
            tracks: Vec::new(),
            source_vrfs: Vec::new(),
            next_hop_interfaces: Vec::new(),
            tunnel_attributes: Vec::new(),
        }
    }

    pub fn num_community_aps(&self) -> usize {
        self.communities.num()
    }

    pub fn num_as_path_aps(&self) -> usize {
        self.as_paths.num()
    }

    pub fn assign_community(&mut self, var: CommunityVar, aps: impl IntoIterator<Item = usize>) {
        self.communities.assign(var, aps);
    }

    pub fn assign_as_path(&mut self, regex: impl Into<String>, aps: impl IntoIterator<Item = usize>) {
        self.as_paths.assign(regex.into(), aps);
    }

    pub fn community_aps_for(&self, var: &CommunityVar) -> Option<&BTreeSet<usize>> {
        self.communities.aps_for(var)
    }

    pub fn as_path_aps_for(&self, regex: &str) -> Option<&BTreeSet<usize>> {
        self.as_paths.aps_for(&regex.to_string())
    }

    pub fn set_community_example(&mut self, ap: usize, example: CommunityApExample) {
        assert!(ap < self.communities.num());
        self.community_examples.insert(ap, example);
    }

    pub fn set_as_path_example(&mut self, ap: usize, acceptor: Dfa) {
        assert!(ap < self.as_paths.num());
        self.as_path_examples.insert(ap, acceptor);
    }

    /// A concrete community contained in block `ap`, if one can be derived.
    pub fn community_example(&self, ap: usize) -> Option<Community> {
        match self.community_examples.get(&ap)? {
            CommunityApExample::Literal(c) => Some(*c),
            CommunityApExample::Acceptor(dfa) => {
                let tokens = dfa.shortest_accepted_string()?;
                let joined = tokens.join("");
                joined.parse().ok()
            }
        }
    }

    /// A concrete AS path contained in block `ap`, if one can be derived.
    /// The acceptor runs over decimal ASN tokens.
    pub fn as_path_example(&self, ap: usize) -> Option<Vec<u64>> {
        let tokens = self.as_path_examples.get(&ap)?.shortest_accepted_string()?;
        tokens.iter().map(|t| t.parse().ok()).collect()
    }

    pub fn set_tracks(&mut self, tracks: Vec<String>) {
        self.tracks = tracks;
    }

    pub fn set_source_vrfs(&mut self, vrfs: Vec<String>) {
        self.source_vrfs = vrfs;
    }

    pub fn set_next_hop_interfaces(&mut self, interfaces: Vec<String>) {
        self.next_hop_interfaces = interfaces;
    }

    pub fn set_tunnel_attributes(&mut self, attributes: Vec<String>) {
        self.tunnel_attributes = attributes;
    }

    pub fn tracks(&self) -> &[String] {
        &self.tracks
    }

    pub fn source_vrfs(&self) -> &[String] {
        &self.source_vrfs
    }

    pub fn next_hop_interfaces(&self) -> &[String] {
        &self.next_hop_interfaces
    }

    pub fn tunnel_attributes(&self) -> &[String] {
        &self.tunnel_attributes
    }
}
