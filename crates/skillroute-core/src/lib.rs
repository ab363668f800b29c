//! SkillRoute core.
//!
//! This crate routes a request to at most one registered skill and runs it:
//!
//! - **[`skill`]** -- The [`Skill`] capability set (score, optional guard,
//!   execute) implemented by every handler.
//! - **[`registry`]** -- Ordered, snapshot-able [`SkillRegistry`].
//! - **[`orchestrator`]** -- [`SkillOrchestrator`] with the scoring loop,
//!   top-K/threshold selection, and the guard→execute pipeline.
//! - **[`observer`]** -- Passive lifecycle listeners with panic isolation.
//! - **[`options`]** -- [`OrchestratorOptions`] and the serializable
//!   [`RoutingConfig`].
//! - **[`session`]** -- [`SkillSession`], a registry/orchestrator pair with a
//!   stored context and last-output tracking.
//! - **[`types`]** -- Per-call data: [`SkillContext`], [`SkillIO`],
//!   [`SkillOutput`].
//! - **[`error`]** -- [`SkillError`] and [`RouteError`] via [`thiserror`].
//!
//! All public types are `Send + Sync`.

pub mod error;
pub mod observer;
pub mod options;
pub mod orchestrator;
pub mod registry;
pub mod session;
pub mod skill;
pub mod types;

pub use error::{Phase, RouteError, SkillError};
pub use observer::{
    ErrorEvent, ExecuteEndEvent, ExecuteEvent, LastOutput, MatchEvent, SkillObserver,
    TracingObserver,
};
pub use options::{DEFAULT_THRESHOLD, DEFAULT_TOP_K, OrchestratorOptions, RoutingConfig};
pub use orchestrator::{Route, ScoredSkill, SkillOrchestrator};
pub use registry::SkillRegistry;
pub use session::SkillSession;
pub use skill::{Skill, SkillGuard, normalize_score};
pub use types::{
    Artifact, NO_MATCH_REASON, Scratch, Services, SkillContext, SkillIO, SkillOutput, SkillScore,
};
