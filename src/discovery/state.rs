//! Cycle bookkeeping and the deletion diff
//!
//! [`CycleState`] is the only thing carried from one refresh cycle to the
//! next. [`CycleOutcome`] collects what a single cycle observed. The two
//! failure sets are kept apart on purpose: a failed namespace listing
//! protects every known source in that namespace, a failed instance query
//! protects only that one source.

use std::collections::BTreeSet;

use tracing::info;

use super::target::{SourceSpec, TargetGroup};

/// Sources considered live as of the last successful cycle
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleState {
    pub known_sources: BTreeSet<SourceSpec>,
}

impl CycleState {
    pub fn new(known_sources: impl IntoIterator<Item = SourceSpec>) -> Self {
        Self {
            known_sources: known_sources.into_iter().collect(),
        }
    }
}

/// Everything observed during one refresh cycle
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Groups built from successful instance queries, in discovery order
    pub groups: Vec<TargetGroup>,
    /// Sources whose instances were fetched this cycle
    pub current_sources: BTreeSet<SourceSpec>,
    /// Sources whose instance query failed this cycle
    pub failed_services: BTreeSet<SourceSpec>,
    /// Namespaces whose service listing failed this cycle
    pub failed_namespaces: BTreeSet<String>,
}

impl CycleOutcome {
    /// Record a successfully resolved source and its group
    pub fn record_live(&mut self, spec: SourceSpec, group: TargetGroup) {
        self.current_sources.insert(spec);
        self.groups.push(group);
    }

    pub fn record_failed_service(&mut self, spec: SourceSpec) {
        self.failed_services.insert(spec);
    }

    pub fn record_failed_namespace(&mut self, namespace: impl Into<String>) {
        self.failed_namespaces.insert(namespace.into());
    }

    /// Fold another partial outcome into this one, keeping group order
    pub fn merge(&mut self, other: CycleOutcome) {
        self.groups.extend(other.groups);
        self.current_sources.extend(other.current_sources);
        self.failed_services.extend(other.failed_services);
        self.failed_namespaces.extend(other.failed_namespaces);
    }
}

/// Diff the previously known sources against what this cycle observed.
///
/// Returns the next known-source set and one deletion group per source
/// that is confirmed gone. Sources missing because of a failure are carried
/// forward without emitting anything.
pub fn clean_deleted_targets(
    previous: &CycleState,
    outcome: &CycleOutcome,
) -> (CycleState, Vec<TargetGroup>) {
    let mut next = outcome.current_sources.clone();
    let mut deletions = Vec::new();

    for spec in &previous.known_sources {
        if outcome.current_sources.contains(spec) {
            continue;
        }
        if outcome.failed_namespaces.contains(&spec.namespace) {
            info!(
                "Skipping cleanup of {} because syncing namespace {} failed",
                spec, spec.namespace
            );
            next.insert(spec.clone());
            continue;
        }
        if outcome.failed_services.contains(spec) {
            info!("Skipping cleanup of {} because syncing the source failed", spec);
            next.insert(spec.clone());
            continue;
        }
        info!("Cleaning up deleted source {}", spec);
        deletions.push(TargetGroup::deletion(spec));
    }

    (
        CycleState {
            known_sources: next,
        },
        deletions,
    )
}
