//! A long-lived routing session.
//!
//! [`SkillSession`] bundles one registry and orchestrator built from a fixed
//! skill list with a stored caller context, and remembers the latest
//! successful output.  It suits request loops such as a REPL or a chat
//! handler where the same skills serve many turns.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::RouteError;
use crate::observer::LastOutput;
use crate::options::OrchestratorOptions;
use crate::orchestrator::SkillOrchestrator;
use crate::registry::SkillRegistry;
use crate::skill::Skill;
use crate::types::{SkillContext, SkillIO, SkillOutput};

/// Registry, orchestrator, and caller context for a sequence of runs.
#[derive(Debug)]
pub struct SkillSession {
    orchestrator: SkillOrchestrator,
    ctx: SkillContext,
    last: Arc<LastOutput>,
}

impl SkillSession {
    /// Build a session with default options.
    pub fn new(skills: impl IntoIterator<Item = Arc<dyn Skill>>, ctx: SkillContext) -> Self {
        Self::with_options(skills, ctx, OrchestratorOptions::default())
    }

    /// Build a session with the given options.  An observer that records the
    /// latest output is appended to `options.observers`.
    pub fn with_options(
        skills: impl IntoIterator<Item = Arc<dyn Skill>>,
        ctx: SkillContext,
        options: OrchestratorOptions,
    ) -> Self {
        let registry = SkillRegistry::new();
        registry.register_all(skills);

        let last = Arc::new(LastOutput::new());
        let options = options.with_observer(last.clone());

        Self {
            orchestrator: SkillOrchestrator::new(registry, options),
            ctx,
            last,
        }
    }

    /// Route and run one request.  Each run gets a fresh scratch bag.
    pub async fn run(
        &self,
        input: impl Into<Value>,
        hints: Option<Map<String, Value>>,
    ) -> Result<SkillOutput, RouteError> {
        let io = SkillIO {
            input: input.into(),
            hints,
        };
        let ctx = self.ctx.for_run();
        self.orchestrator.run(&io, &ctx).await
    }

    /// The most recent output produced by a skill.  No-match outputs are not
    /// recorded.
    pub fn last(&self) -> Option<SkillOutput> {
        self.last.get()
    }

    pub fn orchestrator(&self) -> &SkillOrchestrator {
        &self.orchestrator
    }

    pub fn registry(&self) -> &SkillRegistry {
        self.orchestrator.registry()
    }

    pub fn context(&self) -> &SkillContext {
        &self.ctx
    }
}
