//! Target discovery for Cloud Map services
//!
//! Each refresh cycle walks the registry hierarchy, turns every service into
//! a [`TargetGroup`], and emits explicit removal groups for sources that
//! disappeared. Sources that could not be queried because of a transient
//! failure are never reported as removed.

pub mod reconciler;
pub mod resolver;
pub mod scheduler;
pub mod state;
pub mod target;
pub mod translate;


pub use reconciler::{Discovery, Reconciler, Refresh};
pub use resolver::{build_target_group, resolve_service, walk_namespace};
pub use state::{clean_deleted_targets, CycleOutcome, CycleState};
pub use target::{
    LabelSet, SourceSpec, TargetGroup, ADDRESS_LABEL, LABEL_NAMESPACE_NAME, LABEL_SERVICE_NAME,
};
pub use translate::{instance_address, join_host_port};
