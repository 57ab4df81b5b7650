use std::fmt;
use std::str::FromStr;

use crate::route::Protocol;

/// A standard (32-bit) BGP community, written `high:low`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Community {
    pub high: u16,
    pub low: u16,
}

impl Community {
    pub fn new(high: u16, low: u16) -> Community {
        Community { high, low }
    }
}

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.high, self.low)
    }
}

impl FromStr for Community {
    type Err = String;

    fn from_str(s: &str) -> Result<Community, String> {
        let (high, low) = s
            .split_once(':')
            .ok_or_else(|| format!("community `{s}` is not of the form high:low"))?;
        let high = high
            .parse()
            .map_err(|_| format!("invalid community half `{high}`"))?;
        let low = low
            .parse()
            .map_err(|_| format!("invalid community half `{low}`"))?;
        Ok(Community { high, low })
    }
}

/// An IPv4 prefix: a network address and a length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prefix {
    pub ip: u32,
    pub length: u8,
}

impl Prefix {
    pub fn new(ip: u32, length: u8) -> Prefix {
        assert!(length <= 32);
        Prefix { ip, length }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let octets = self.ip.to_be_bytes();
        write!(
            f,
            "{}.{}.{}.{}/{}",
            octets[0], octets[1], octets[2], octets[3], self.length
        )
    }
}

/// A prefix together with an allowed range of more-specific lengths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrefixRange {
    pub prefix: Prefix,
    /// Inclusive bounds on the matched route's prefix length.
    pub length_range: (u8, u8),
}

impl PrefixRange {
    pub fn new(prefix: Prefix, low: u8, high: u8) -> PrefixRange {
        PrefixRange {
            prefix,
            length_range: (low, high),
        }
    }

    /// A range matching exactly this prefix.
    pub fn exact(prefix: Prefix) -> PrefixRange {
        PrefixRange {
            prefix,
            length_range: (prefix.length, prefix.length),
        }
    }
}

/// Which address of the route a prefix match inspects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrefixExpr {
    DestinationNetwork,
    NextHopIp,
}

/// The set of prefix ranges a prefix match compares against.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrefixSetExpr {
    Explicit(Vec<PrefixRange>),
    /// A named route-filter list resolved through the configuration.
    Named(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineAction {
    Permit,
    Deny,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntComparator {
    Eq,
    Ge,
    Gt,
    Le,
    Lt,
}

/// An integer-valued expression used by attribute assignments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LongExpr {
    Literal(u64),
    IncrementBy(u64),
    DecrementBy(u64),
}

/// A predicate over a single community value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommunityMatchExpr {
    Literal(Community),
    Regex(String),
    Not(Box<CommunityMatchExpr>),
    AnyOf(Vec<CommunityMatchExpr>),
    AllOf(Vec<CommunityMatchExpr>),
}

/// A predicate over the route's whole community set.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommunitySetMatchExpr {
    /// Some community in the set satisfies the inner match.
    HasCommunity(CommunityMatchExpr),
    MatchAll(Vec<CommunitySetMatchExpr>),
    MatchAny(Vec<CommunitySetMatchExpr>),
    Not(Box<CommunitySetMatchExpr>),
    /// A named community set match resolved through the configuration.
    Reference(String),
    /// Compares the number of communities on the route.
    HasSize(IntComparator, u64),
    /// First-match list of permit/deny lines.
    Lines(Vec<CommunitySetMatchLine>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommunitySetMatchLine {
    pub action: LineAction,
    pub expr: CommunitySetMatchExpr,
}

/// An expression producing a community set, used by `SetCommunities`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommunitySetExpr {
    /// The communities currently on the route.
    InputCommunities,
    Literal(Vec<Community>),
    Union(Vec<CommunitySetExpr>),
    Difference {
        initial: Box<CommunitySetExpr>,
        remove: CommunityMatchExpr,
    },
    /// A named community set resolved through the configuration.
    Reference(String),
}

/// A predicate over the route's AS path.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AsPathMatchExpr {
    Regex(String),
    /// Disjunction of inner matches.
    Any(Vec<AsPathMatchExpr>),
    /// A named AS-path access list resolved through the configuration.
    AccessList(String),
    /// Length comparisons are not expressible over the path encoding.
    HasLength(IntComparator, u64),
}

/// The next hop installed by `SetNextHop`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NextHopExpr {
    Ip(u32),
    Discard,
    SelfIp,
    BgpPeerAddress,
}

/// Boolean guard expressions.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BooleanExpr {
    Lit(bool),
    /// True iff this policy was entered through a call expression.
    CallExprContext,
    /// True iff this policy was entered through a call statement.
    CallStatementContext,
    MatchProtocol(Vec<Protocol>),
    MatchPrefixSet {
        prefix: PrefixExpr,
        prefixes: PrefixSetExpr,
    },
    MatchTag(IntComparator, u64),
    MatchCommunities(CommunitySetMatchExpr),
    MatchAsPath(AsPathMatchExpr),
    MatchSourceVrf(String),
    TrackSucceeded(String),
    Not(Box<BooleanExpr>),
    Conjunction(Vec<BooleanExpr>),
    Disjunction(Vec<BooleanExpr>),
    /// Evaluates elements in order until one does not fall through; the
    /// conjunction is accepting when every consulted element accepts.
    ConjunctionChain(Vec<BooleanExpr>),
    /// Evaluates elements in order until one does not fall through and
    /// returns that element's verdict.
    FirstMatchChain(Vec<BooleanExpr>),
    /// Invoke another policy as a subroutine expression.
    Call(String),
}

/// Policy statements.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Statement {
    ExitAccept,
    ExitReject,
    ReturnTrue,
    ReturnFalse,
    /// Return the current default action.
    ReturnLocalDefaultAction,
    SetDefaultActionAccept,
    SetDefaultActionReject,
    SetLocalDefaultActionAccept,
    SetLocalDefaultActionReject,
    /// Fall through to the next element of an enclosing chain.
    Fallthrough,
    SetDefaultPolicy(String),
    If {
        guard: BooleanExpr,
        then_branch: Vec<Statement>,
        else_branch: Vec<Statement>,
    },
    SetMetric(LongExpr),
    SetLocalPreference(LongExpr),
    SetTag(LongExpr),
    SetWeight(u64),
    SetAdminDistance(u64),
    SetOspfMetricType(crate::route::OspfMetricType),
    /// Recognized but not modelled; interpreted as a no-op that flags the
    /// route unsupported.
    SetOrigin(crate::route::OriginType),
    SetCommunities(CommunitySetExpr),
    AddCommunities(Vec<CommunityMatchExpr>),
    DeleteCommunities(CommunityMatchExpr),
    PrependAsPath(Vec<u64>),
    SetNextHop(NextHopExpr),
    SetTunnelAttribute(String),
    RemoveTunnelAttribute,
    Call(String),
    /// Statements whose effect is buffered by the device until the policy
    /// finishes; the symbolic semantics are unchanged.
    Buffered(Box<Statement>),
    /// A traced block; tracing has no symbolic effect.
    Traceable(Vec<Statement>),
}

#[cfg(test)]
mod tests {
    use super::Community;

    #[test]
    fn community_parse_and_display() {
        let c: Community = "65000:100".parse().unwrap();
        assert_eq!(c, Community::new(65000, 100));
        assert_eq!(c.to_string(), "65000:100");
        assert!("65000".parse::<Community>().is_err());
        assert!("a:b".parse::<Community>().is_err());
        assert!("70000:1".parse::<Community>().is_err());
    }

    #[test]
    fn prefix_display() {
        let p = super::Prefix::new(0x0a00_0000, 8);
        assert_eq!(p.to_string(), "10.0.0.0/8");
    }
}
