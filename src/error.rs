//! Error types for the symbolic route-policy analysis.
//!
//! The taxonomy distinguishes *unsupported* constructs (recognized but not
//! modelled; silently approximating them would invalidate every accept/deny
//! conclusion downstream) from *undefined* references to called policies.
//! Undefined prefix lists, community lists and AS-path lists are not errors:
//! they are the recoverable "this match never succeeds" outcome and are only
//! logged. Internal invariant violations (for example extracting a value from
//! a finite domain with an out-of-range index) panic at the violation site.

use thiserror::Error;

/// A fatal analysis error. Any of these aborts the current analysis call.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A recognized-but-unimplemented statement, expression, or comparator.
    #[error("unsupported routing-policy construct: {0}")]
    UnsupportedFeature(String),

    /// A policy call whose target does not exist in the configuration.
    #[error("called routing policy does not exist: {0}")]
    UndefinedPolicy(String),

    /// A `FirstMatchChain` with no elements and no default policy to defer to.
    #[error("first-match chain has no elements and no default policy")]
    EmptyChain,
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
