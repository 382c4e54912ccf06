//! Per-service resolution and per-namespace walking

use futures::TryStreamExt;
use tracing::{debug, error, info};

use super::state::CycleOutcome;
use super::target::{SourceSpec, TargetGroup};
use super::translate::instance_address;
use crate::error::Result;
use crate::registry::{paginate, InstanceSummary, NamespaceSummary, Registry};

/// Build the target group for `spec` from its discovered instances.
///
/// Instances without an address are left out. A service without usable
/// instances still yields a group, just with no targets.
pub fn build_target_group(spec: &SourceSpec, instances: &[InstanceSummary]) -> TargetGroup {
    let mut group = TargetGroup::for_source(spec);
    group.targets.reserve(instances.len());

    for instance in instances {
        match instance_address(instance) {
            Some(address) => group.push_address(address),
            None => info!(
                "Skipping instance {} of {} with no ip",
                instance.instance_id, spec
            ),
        }
    }

    group
}

/// Query the live instances of one service and build its group
pub async fn resolve_service(registry: &dyn Registry, spec: &SourceSpec) -> Result<TargetGroup> {
    let instances = registry
        .discover_instances(&spec.namespace, &spec.service)
        .await?;
    Ok(build_target_group(spec, &instances))
}

/// Resolve every service of `namespace`.
///
/// A failed instance query marks only that source as failed. A failed
/// service listing marks the whole namespace as failed and stops the walk;
/// groups resolved from earlier pages are kept.
pub async fn walk_namespace(registry: &dyn Registry, namespace: &NamespaceSummary) -> CycleOutcome {
    let mut outcome = CycleOutcome::default();
    let pages = paginate(|token| registry.list_services(&namespace.id, token));
    futures::pin_mut!(pages);

    loop {
        let services = match pages.try_next().await {
            Ok(Some(services)) => services,
            Ok(None) => break,
            Err(e) => {
                error!("Error listing services in namespace {}: {}", namespace.name, e);
                outcome.record_failed_namespace(namespace.name.as_str());
                break;
            }
        };

        for service in services {
            let spec = SourceSpec::new(namespace.name.as_str(), service.name);
            debug!("Processing service {}", spec);
            match resolve_service(registry, &spec).await {
                Ok(group) => outcome.record_live(spec, group),
                Err(e) => {
                    error!("Error discovering instances of {}: {}", spec, e);
                    outcome.record_failed_service(spec);
                }
            }
        }
    }

    info!(
        "Namespace {} produced {} target groups",
        namespace.name,
        outcome.groups.len()
    );
    outcome
}
