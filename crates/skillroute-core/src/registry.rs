//! Skill registry.
//!
//! An ordered collection of skills.  Registration order matters: it is the
//! order in which skills are scored and the tie-break when two skills score
//! the same.
//!
//! The collection sits behind a single [`RwLock`] so that taking a snapshot
//! with [`SkillRegistry::list`] is atomic with respect to
//! [`register`](SkillRegistry::register) and
//! [`unregister`](SkillRegistry::unregister).  A routing pass works on its
//! snapshot and is unaffected by concurrent mutation.
//!
//! # Example
//!
//! ```rust
//! # use std::sync::Arc;
//! # use async_trait::async_trait;
//! # use skillroute_core::{Skill, SkillContext, SkillIO, SkillOutput, SkillRegistry};
//! struct Echo;
//!
//! #[async_trait]
//! impl Skill for Echo {
//!     fn name(&self) -> &str { "echo" }
//!     async fn score(&self, _: &SkillIO, _: &SkillContext) -> skillroute_core::error::Result<f64> {
//!         Ok(1.0)
//!     }
//!     async fn execute(&self, io: &SkillIO, _: &SkillContext) -> skillroute_core::error::Result<SkillOutput> {
//!         Ok(SkillOutput::new(io.input.clone()))
//!     }
//! }
//!
//! let registry = SkillRegistry::new();
//! registry.register(Arc::new(Echo));
//! assert_eq!(registry.names(), vec!["echo".to_string()]);
//!
//! registry.unregister("echo");
//! assert!(registry.is_empty());
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use crate::skill::Skill;

/// Concurrent, ordered skill registry.
///
/// The registry is cheaply cloneable (`Arc`-backed) and `Send + Sync`; clones
/// share the same collection.
#[derive(Clone)]
pub struct SkillRegistry {
    inner: Arc<RwLock<Vec<Arc<dyn Skill>>>>,
}

impl SkillRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Append a skill.
    ///
    /// No deduplication: registering a second skill with an existing name
    /// keeps both.
    pub fn register(&self, skill: Arc<dyn Skill>) {
        tracing::info!(skill = %skill.name(), "skill registered");
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(skill);
    }

    /// Append several skills, preserving their order.
    pub fn register_all(&self, skills: impl IntoIterator<Item = Arc<dyn Skill>>) {
        let skills: Vec<_> = skills.into_iter().collect();
        for skill in &skills {
            tracing::info!(skill = %skill.name(), "skill registered");
        }
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(skills);
    }

    /// Remove every skill named `name`.
    ///
    /// Returns how many entries were removed; zero is not an error.
    pub fn unregister(&self, name: &str) -> usize {
        let mut skills = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = skills.len();
        skills.retain(|s| s.name() != name);
        let removed = before - skills.len();

        if removed > 0 {
            tracing::info!(skill = %name, removed, "skill unregistered");
        }
        removed
    }

    /// Snapshot of the current skills, in registration order.
    pub fn list(&self) -> Vec<Arc<dyn Skill>> {
        let snapshot = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        tracing::trace!(count = snapshot.len(), "registry snapshot taken");
        snapshot
    }

    /// Names of the current skills, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| s.name().to_owned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SkillRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SkillRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillRegistry")
            .field("skills", &self.names())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::Result;
    use crate::types::{SkillContext, SkillIO, SkillOutput};

    struct Named(&'static str);

    #[async_trait]
    impl Skill for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn score(&self, _io: &SkillIO, _ctx: &SkillContext) -> Result<f64> {
            Ok(0.0)
        }

        async fn execute(&self, _io: &SkillIO, _ctx: &SkillContext) -> Result<SkillOutput> {
            Ok(SkillOutput::default())
        }
    }

    #[test]
    fn register_preserves_order() {
        let registry = SkillRegistry::new();
        registry.register(Arc::new(Named("a")));
        registry.register(Arc::new(Named("b")));
        registry.register_all([
            Arc::new(Named("c")) as Arc<dyn Skill>,
            Arc::new(Named("d")),
        ]);

        assert_eq!(registry.names(), vec!["a", "b", "c", "d"]);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn duplicates_are_kept_and_removed_together() {
        let registry = SkillRegistry::new();
        registry.register(Arc::new(Named("dup")));
        registry.register(Arc::new(Named("other")));
        registry.register(Arc::new(Named("dup")));
        assert_eq!(registry.len(), 3);

        let removed = registry.unregister("dup");
        assert_eq!(removed, 2);
        assert_eq!(registry.names(), vec!["other"]);
    }

    #[test]
    fn unregister_missing_is_noop() {
        let registry = SkillRegistry::new();
        registry.register(Arc::new(Named("a")));
        assert_eq!(registry.unregister("nope"), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn list_is_a_snapshot() {
        let registry = SkillRegistry::new();
        registry.register(Arc::new(Named("a")));

        let mut snapshot = registry.list();
        snapshot.clear();
        registry.register(Arc::new(Named("b")));

        assert!(snapshot.is_empty());
        assert_eq!(registry.len(), 2);

        let snapshot = registry.list();
        registry.unregister("a");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn clones_share_state() {
        let registry = SkillRegistry::new();
        let handle = registry.clone();
        handle.register(Arc::new(Named("shared")));
        assert_eq!(registry.names(), vec!["shared"]);
    }
}
