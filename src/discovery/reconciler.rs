//! Refresh cycle orchestration
//!
//! One cycle walks every (matching) namespace, then diffs the discovered
//! sources against the previous cycle's. [`Reconciler::refresh`] is a pure
//! function of the previous [`CycleState`] and the registry's answers; the
//! stateful [`Discovery`] wrapper keeps the state between cycles.

use std::sync::Arc;

use futures::TryStreamExt;
use tracing::{error, info, instrument};

use super::resolver::walk_namespace;
use super::state::{clean_deleted_targets, CycleOutcome, CycleState};
use super::target::TargetGroup;
use crate::error::Result;
use crate::registry::{paginate, Registry};

/// Result of one successful refresh cycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Refresh {
    /// State to hand to the next cycle
    pub state: CycleState,
    /// Upserts followed by deletions
    pub groups: Vec<TargetGroup>,
}

/// Runs refresh cycles against a registry
#[derive(Clone)]
pub struct Reconciler {
    registry: Arc<dyn Registry>,
    namespace_filter: Option<String>,
}

impl Reconciler {
    pub fn new(registry: Arc<dyn Registry>, namespace_filter: Option<String>) -> Self {
        Self {
            registry,
            namespace_filter,
        }
    }

    fn matches(&self, namespace: &str) -> bool {
        self.namespace_filter
            .as_deref()
            .map_or(true, |filter| filter == namespace)
    }

    /// Run one refresh cycle.
    ///
    /// Fails only if the namespaces themselves cannot be enumerated; in that
    /// case nothing is emitted and `previous` remains the current state.
    #[instrument(skip_all, fields(known = previous.known_sources.len()))]
    pub async fn refresh(&self, previous: &CycleState) -> Result<Refresh> {
        let registry = self.registry.as_ref();
        let mut outcome = CycleOutcome::default();

        let pages = paginate(|token| registry.list_namespaces(token));
        futures::pin_mut!(pages);

        while let Some(namespaces) = pages.try_next().await.map_err(|e| {
            error!("Could not list namespaces: {}", e);
            e
        })? {
            for namespace in namespaces.iter().filter(|ns| self.matches(&ns.name)) {
                outcome.merge(walk_namespace(registry, namespace).await);
            }
        }

        let (state, deletions) = clean_deleted_targets(previous, &outcome);
        let mut groups = outcome.groups;
        groups.extend(deletions);

        info!("Refresh done, {} target groups", groups.len());
        Ok(Refresh { state, groups })
    }
}

/// A [`Reconciler`] together with the state it carries between cycles
pub struct Discovery {
    reconciler: Reconciler,
    state: CycleState,
}

impl Discovery {
    pub fn new(reconciler: Reconciler) -> Self {
        Self {
            reconciler,
            state: CycleState::default(),
        }
    }

    /// Run one cycle and adopt its state if it succeeded
    pub async fn refresh(&mut self) -> Result<Vec<TargetGroup>> {
        let Refresh { state, groups } = self.reconciler.refresh(&self.state).await?;
        self.state = state;
        Ok(groups)
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }
}
