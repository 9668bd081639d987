//! StatefulSet resource usage
//!
//! StatefulSets replace one replica at a time, so no surge overhead applies.

use super::pod::template_resources;
use crate::error::CalcResult;
use crate::models::{Details, ResourceUsage, WorkloadDescriptor};
use k8s_openapi::api::apps::v1::StatefulSet;
use tracing::debug;

/// Replica count Kubernetes assumes when `spec.replicas` is absent
const DEFAULT_REPLICAS: i32 = 1;

/// Calculate the cpu/memory a single statefulset needs. Replicas are taken
/// into account; the update strategy is recorded for reporting only.
pub fn statefulset(statefulset: &StatefulSet) -> CalcResult<ResourceUsage> {
    let descriptor = WorkloadDescriptor::of(statefulset);
    let spec = statefulset.spec.as_ref();

    let replicas = spec.and_then(|s| s.replicas).unwrap_or(DEFAULT_REPLICAS);
    let strategy = spec
        .and_then(|s| s.update_strategy.as_ref())
        .and_then(|u| u.type_.clone())
        .unwrap_or_default();

    let per_replica = match spec {
        Some(spec) => template_resources(&spec.template)?,
        None => Default::default(),
    };
    let cpu = per_replica.cpu.scale(i64::from(replicas));
    let memory = per_replica.memory.scale(i64::from(replicas));

    debug!(name = %descriptor.name, replicas, cpu = %cpu, memory = %memory, "calculated statefulset usage");

    Ok(ResourceUsage::new(
        cpu,
        memory,
        Details::new(descriptor, replicas, replicas.max(0), strategy),
    ))
}
