//! The skill capability set.
//!
//! A skill is any value implementing [`Skill`]: identity fields plus a
//! relevance score, an optional guard, and an execute step.  Skills are shared
//! as `Arc<dyn Skill>` and never mutated by the orchestrator.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{SkillContext, SkillIO, SkillOutput, SkillScore};

/// A self-contained handler the orchestrator can route to.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Unique-ish name (e.g. `brand-deck`).  The registry does not enforce
    /// uniqueness.
    fn name(&self) -> &str;

    /// Semantic version string.
    fn version(&self) -> Option<&str> {
        None
    }

    /// One-line summary.
    fn summary(&self) -> Option<&str> {
        None
    }

    /// Long-form description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Tags that describe the skill's capabilities.
    fn tags(&self) -> &[String] {
        &[]
    }

    /// JSON Schema describing the expected input.  Informational: callers
    /// may validate against it upstream, the orchestrator never does.
    fn input_schema(&self) -> Option<&Value> {
        None
    }

    /// Return a relevance score for this request.
    ///
    /// Should be cheap and deterministic.  Values outside `[0, 1]` are clamped
    /// and NaN counts as zero; an error also counts as zero.
    async fn score(&self, io: &SkillIO, ctx: &SkillContext) -> Result<SkillScore>;

    /// The skill's pre-flight check, if it declares one.
    fn guard(&self) -> Option<&dyn SkillGuard> {
        None
    }

    /// Run the skill's business logic.
    async fn execute(&self, io: &SkillIO, ctx: &SkillContext) -> Result<SkillOutput>;
}

/// Pre-flight safety and policy check.  Returning an error vetoes execution.
#[async_trait]
pub trait SkillGuard: Send + Sync {
    async fn check(&self, io: &SkillIO, ctx: &SkillContext) -> Result<()>;
}

impl fmt::Debug for dyn Skill + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Skill")
            .field("name", &self.name())
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}

/// Normalize a raw score into `[0, 1]`.  NaN maps to exactly zero.
pub fn normalize_score(raw: SkillScore) -> SkillScore {
    if raw.is_nan() {
        return 0.0;
    }
    // `+ 0.0` folds a negative zero into positive zero.
    raw.clamp(0.0, 1.0) + 0.0
}
