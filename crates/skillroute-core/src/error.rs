//! Error types for skill routing.
//!
//! Two layers exist.  [`SkillError`] is what an individual skill reports from
//! its match, guard, or execute step.  [`RouteError`] is what
//! [`SkillOrchestrator::run`](crate::SkillOrchestrator::run) returns when the
//! selected skill's guard or execute step fails; it always names the skill
//! that produced the failure.  Scoring faults never surface as errors, they
//! are absorbed into a score of zero.

use std::fmt;
use std::time::Duration;

/// The lifecycle step a skill call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Relevance scoring.
    Match,
    /// Pre-flight guard check.
    Guard,
    /// Business logic.
    Execute,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match => write!(f, "match"),
            Self::Guard => write!(f, "guard"),
            Self::Execute => write!(f, "execute"),
        }
    }
}

/// Errors raised by a skill implementation.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    /// The guard vetoed execution.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The input does not have the shape the skill expects.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The skill ran but could not produce an output.
    #[error("execution failed: {0}")]
    Failed(String),

    /// The call did not complete within the configured deadline.
    #[error("{phase} timed out after {after:?}")]
    Timeout { phase: Phase, after: Duration },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for unexpected failures.  Prefer a typed variant whenever
    /// possible.
    #[error("internal skill error: {0}")]
    Internal(String),
}

/// Failure of a [`run`](crate::SkillOrchestrator::run) call.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The selected skill's guard refused the request.
    #[error("guard of skill `{skill}` rejected the request: {source}")]
    GuardRejected { skill: String, source: SkillError },

    /// The selected skill's execute step failed.
    #[error("skill `{skill}` failed: {source}")]
    ExecutionFailed { skill: String, source: SkillError },
}

impl RouteError {
    /// Name of the skill that produced the failure.
    pub fn skill(&self) -> &str {
        match self {
            Self::GuardRejected { skill, .. } | Self::ExecutionFailed { skill, .. } => skill,
        }
    }

    /// The underlying skill error.
    pub fn skill_error(&self) -> &SkillError {
        match self {
            Self::GuardRejected { source, .. } | Self::ExecutionFailed { source, .. } => source,
        }
    }
}

/// Convenience alias used by skill implementations.
pub type Result<T> = std::result::Result<T, SkillError>;
