//! Lifecycle observers.
//!
//! Observers are passive listeners notified at five points of a run: before
//! and after each skill is scored, before and after execution, and on error.
//! Every hook has a no-op default so an observer implements only what it
//! cares about.
//!
//! Hooks are called synchronously, in registration order, and the
//! orchestrator does not move on until every observer has returned.  A
//! panicking observer is isolated: the panic is caught and logged, the
//! remaining observers still receive the event, and the run outcome is
//! unchanged.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::SkillError;
use crate::skill::Skill;
use crate::types::{SkillContext, SkillIO, SkillOutput, SkillScore};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Payload of [`SkillObserver::on_match_start`] and
/// [`SkillObserver::on_match_end`].
#[derive(Debug, Clone, Copy)]
pub struct MatchEvent<'a> {
    pub skill: &'a dyn Skill,
    /// Raw score for `on_match_start`, normalized score for `on_match_end`.
    pub score: SkillScore,
    pub io: &'a SkillIO,
    pub ctx: &'a SkillContext,
}

/// Payload of [`SkillObserver::on_execute_start`].
#[derive(Debug, Clone, Copy)]
pub struct ExecuteEvent<'a> {
    pub skill: &'a dyn Skill,
    pub io: &'a SkillIO,
    pub ctx: &'a SkillContext,
}

/// Payload of [`SkillObserver::on_execute_end`].
#[derive(Debug, Clone, Copy)]
pub struct ExecuteEndEvent<'a> {
    pub skill: &'a dyn Skill,
    pub output: &'a SkillOutput,
    pub io: &'a SkillIO,
    pub ctx: &'a SkillContext,
}

/// Payload of [`SkillObserver::on_error`].
#[derive(Debug, Clone, Copy)]
pub struct ErrorEvent<'a> {
    /// The skill the error originated from, when there is one.
    pub skill: Option<&'a dyn Skill>,
    pub error: &'a SkillError,
    pub io: &'a SkillIO,
    pub ctx: &'a SkillContext,
}

// ---------------------------------------------------------------------------
// Observer trait
// ---------------------------------------------------------------------------

/// Listener for routing and execution lifecycle events.
pub trait SkillObserver: Send + Sync {
    fn on_match_start(&self, _event: &MatchEvent<'_>) {}

    fn on_match_end(&self, _event: &MatchEvent<'_>) {}

    fn on_execute_start(&self, _event: &ExecuteEvent<'_>) {}

    fn on_execute_end(&self, _event: &ExecuteEndEvent<'_>) {}

    fn on_error(&self, _event: &ErrorEvent<'_>) {}
}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

/// Ordered set of observers with panic isolation.
#[derive(Clone, Default)]
pub(crate) struct ObserverSet {
    observers: Vec<Arc<dyn SkillObserver>>,
}

impl ObserverSet {
    pub(crate) fn new(observers: Vec<Arc<dyn SkillObserver>>) -> Self {
        Self { observers }
    }

    pub(crate) fn match_started(&self, event: &MatchEvent<'_>) {
        self.notify("on_match_start", |o| o.on_match_start(event));
    }

    pub(crate) fn match_ended(&self, event: &MatchEvent<'_>) {
        self.notify("on_match_end", |o| o.on_match_end(event));
    }

    pub(crate) fn execute_started(&self, event: &ExecuteEvent<'_>) {
        self.notify("on_execute_start", |o| o.on_execute_start(event));
    }

    pub(crate) fn execute_ended(&self, event: &ExecuteEndEvent<'_>) {
        self.notify("on_execute_end", |o| o.on_execute_end(event));
    }

    pub(crate) fn errored(&self, event: &ErrorEvent<'_>) {
        self.notify("on_error", |o| o.on_error(event));
    }

    fn notify(&self, hook: &'static str, call: impl Fn(&dyn SkillObserver)) {
        for (index, observer) in self.observers.iter().enumerate() {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| call(observer.as_ref()))) {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".into());
                tracing::warn!(hook, observer = index, panic = %message, "observer panicked, ignoring");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Built-in observers
// ---------------------------------------------------------------------------

/// Emits a structured `tracing` event at every lifecycle point.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SkillObserver for TracingObserver {
    fn on_match_end(&self, event: &MatchEvent<'_>) {
        tracing::debug!(skill = %event.skill.name(), score = event.score, "skill scored");
    }

    fn on_execute_start(&self, event: &ExecuteEvent<'_>) {
        tracing::info!(skill = %event.skill.name(), "executing skill");
    }

    fn on_execute_end(&self, event: &ExecuteEndEvent<'_>) {
        tracing::info!(
            skill = %event.skill.name(),
            artifacts = event.output.artifacts.len(),
            "skill finished"
        );
    }

    fn on_error(&self, event: &ErrorEvent<'_>) {
        tracing::error!(
            skill = event.skill.map(|s| s.name()).unwrap_or("<none>"),
            error = %event.error,
            "skill error"
        );
    }
}

/// Keeps the most recent output delivered through `on_execute_end`.
#[derive(Debug, Default)]
pub struct LastOutput {
    last: Mutex<Option<SkillOutput>>,
}

impl LastOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent successful output, if any run has completed.
    pub fn get(&self) -> Option<SkillOutput> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SkillObserver for LastOutput {
    fn on_execute_end(&self, event: &ExecuteEndEvent<'_>) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(event.output.clone());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
