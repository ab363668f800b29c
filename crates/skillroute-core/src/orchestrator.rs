//! Skill orchestrator: scoring, selection, and guarded execution.
//!
//! Routing is a three-stage funnel:
//!
//! | Stage | What happens |
//! |-------|--------------|
//! | 1 | Every skill in a registry snapshot is scored, one at a time, in registration order |
//! | 2 | The scoreboard is stably sorted by score and truncated to the top-K window |
//! | 3 | The first entry in the window whose score reaches the threshold is selected |
//!
//! The window is applied *before* the threshold, so a skill ranked below
//! position K is never selected even when its score clears the threshold.
//!
//! Scoring faults are absorbed: a failing match step counts as a score of
//! zero and is reported to observers, and routing continues.  Guard and
//! execute faults fail the run with a [`RouteError`] after observers have
//! been told.
//!
//! # Example
//!
//! ```rust,no_run
//! # use skillroute_core::{OrchestratorOptions, SkillContext, SkillIO, SkillOrchestrator, SkillRegistry};
//! # async fn example() {
//! let registry = SkillRegistry::new();
//! // registry.register(...);
//! let orchestrator = SkillOrchestrator::new(registry, OrchestratorOptions::default());
//!
//! let output = orchestrator
//!     .run(&SkillIO::new("make a deck about AI"), &SkillContext::new())
//!     .await
//!     .unwrap();
//! if output.is_no_match() {
//!     println!("nothing qualified");
//! }
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::error::{Phase, RouteError, SkillError};
use crate::observer::{ErrorEvent, ExecuteEndEvent, ExecuteEvent, MatchEvent, ObserverSet};
use crate::options::OrchestratorOptions;
use crate::registry::SkillRegistry;
use crate::skill::{Skill, normalize_score};
use crate::types::{SkillContext, SkillIO, SkillOutput, SkillScore};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A skill together with the normalized score it produced.
#[derive(Debug, Clone)]
pub struct ScoredSkill {
    pub skill: Arc<dyn Skill>,
    pub score: SkillScore,
}

/// The outcome of [`SkillOrchestrator::route`].
#[derive(Debug, Clone)]
pub struct Route {
    /// The selected skill, if any qualified.
    pub skill: Option<Arc<dyn Skill>>,
    /// Score of the selected skill; zero when nothing was selected.
    pub score: SkillScore,
    /// Every scored skill, best first, ties in registration order.
    pub ranked: Vec<ScoredSkill>,
}

impl Route {
    /// The highest score on the scoreboard, selected or not.
    pub fn best_score(&self) -> SkillScore {
        self.ranked.first().map_or(0.0, |s| s.score)
    }

    pub fn is_selected(&self) -> bool {
        self.skill.is_some()
    }
}

// ---------------------------------------------------------------------------
// SkillOrchestrator
// ---------------------------------------------------------------------------

/// Routes requests to at most one registered skill and runs it.
///
/// Holds no per-call state: concurrent `route`/`run` calls on one orchestrator
/// are independent.
pub struct SkillOrchestrator {
    registry: SkillRegistry,
    options: OrchestratorOptions,
    observers: ObserverSet,
}

impl SkillOrchestrator {
    /// Create an orchestrator over `registry`.  The options are fixed for the
    /// orchestrator's lifetime.
    pub fn new(registry: SkillRegistry, options: OrchestratorOptions) -> Self {
        let observers = ObserverSet::new(options.observers.clone());
        Self {
            registry,
            options,
            observers,
        }
    }

    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Score every registered skill and select at most one.
    pub async fn route(&self, io: &SkillIO, ctx: &SkillContext) -> Route {
        let skills = self.registry.list();
        let mut ranked = Vec::with_capacity(skills.len());

        for skill in skills {
            let score = self.score_skill(skill.as_ref(), io, ctx).await;
            ranked.push(ScoredSkill { skill, score });
        }

        // `sort_by` is stable, so equal scores keep registration order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        let selected = ranked
            .iter()
            .take(self.options.top_k)
            .find(|s| s.score >= self.options.threshold)
            .cloned();

        match selected {
            Some(ScoredSkill { skill, score }) => {
                tracing::info!(skill = %skill.name(), score, "skill selected");
                Route {
                    skill: Some(skill),
                    score,
                    ranked,
                }
            }
            None => {
                tracing::info!(
                    candidates = ranked.len(),
                    threshold = self.options.threshold,
                    top_k = self.options.top_k,
                    "no skill cleared the threshold"
                );
                Route {
                    skill: None,
                    score: 0.0,
                    ranked,
                }
            }
        }
    }

    /// Route the request and execute the selected skill.
    ///
    /// A miss is not an error: it returns [`SkillOutput::no_match`].  Guard
    /// and execute failures are reported to observers and then returned.
    pub async fn run(&self, io: &SkillIO, ctx: &SkillContext) -> Result<SkillOutput, RouteError> {
        let span = tracing::info_span!("skill_run", run_id = %Uuid::now_v7());
        self.run_inner(io, ctx).instrument(span).await
    }

    // -- Private helpers ----------------------------------------------------

    async fn run_inner(&self, io: &SkillIO, ctx: &SkillContext) -> Result<SkillOutput, RouteError> {
        let route = self.route(io, ctx).await;
        let best_score = route.best_score();
        let Some(skill) = route.skill else {
            return Ok(SkillOutput::no_match(route.score, best_score));
        };
        let skill = skill.as_ref();

        if let Some(guard) = skill.guard() {
            if let Err(error) = self.bounded(Phase::Guard, guard.check(io, ctx)).await {
                tracing::warn!(skill = %skill.name(), error = %error, "guard rejected request");
                self.report_error(skill, &error, io, ctx);
                return Err(RouteError::GuardRejected {
                    skill: skill.name().to_owned(),
                    source: error,
                });
            }
        }

        self.observers
            .execute_started(&ExecuteEvent { skill, io, ctx });

        match self.bounded(Phase::Execute, skill.execute(io, ctx)).await {
            Ok(output) => {
                self.observers.execute_ended(&ExecuteEndEvent {
                    skill,
                    output: &output,
                    io,
                    ctx,
                });
                Ok(output)
            }
            Err(error) => {
                tracing::warn!(skill = %skill.name(), error = %error, "skill execution failed");
                self.report_error(skill, &error, io, ctx);
                Err(RouteError::ExecutionFailed {
                    skill: skill.name().to_owned(),
                    source: error,
                })
            }
        }
    }

    /// Score one skill, absorbing failures into zero.
    async fn score_skill(&self, skill: &dyn Skill, io: &SkillIO, ctx: &SkillContext) -> SkillScore {
        let score = match self.bounded(Phase::Match, skill.score(io, ctx)).await {
            Ok(raw) => {
                self.observers.match_started(&MatchEvent {
                    skill,
                    score: raw,
                    io,
                    ctx,
                });
                normalize_score(raw)
            }
            Err(error) => {
                tracing::warn!(skill = %skill.name(), error = %error, "match failed, scoring as 0");
                self.report_error(skill, &error, io, ctx);
                0.0
            }
        };

        self.observers.match_ended(&MatchEvent {
            skill,
            score,
            io,
            ctx,
        });
        tracing::debug!(skill = %skill.name(), score, "skill scored");
        score
    }

    fn report_error(&self, skill: &dyn Skill, error: &SkillError, io: &SkillIO, ctx: &SkillContext) {
        self.observers.errored(&ErrorEvent {
            skill: Some(skill),
            error,
            io,
            ctx,
        });
    }

    /// Await a skill call, applying the configured deadline if there is one.
    async fn bounded<T>(
        &self,
        phase: Phase,
        call: impl Future<Output = crate::error::Result<T>>,
    ) -> crate::error::Result<T> {
        match self.options.call_timeout {
            Some(after) => tokio::time::timeout(after, call)
                .await
                .map_err(|_| SkillError::Timeout { phase, after })?,
            None => call.await,
        }
    }
}

impl std::fmt::Debug for SkillOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillOrchestrator")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
