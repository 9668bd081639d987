//! DaemonSet resource usage

use super::pod::template_resources;
use crate::error::CalcResult;
use crate::models::{Details, ResourceUsage, WorkloadDescriptor};
use k8s_openapi::api::apps::v1::DaemonSet;
use tracing::debug;

/// Resources of one daemon pod. The node count is unknown, so no replica
/// count is reported.
pub fn daemonset(daemonset: &DaemonSet) -> CalcResult<ResourceUsage> {
    let descriptor = WorkloadDescriptor::of(daemonset);
    let resources = match &daemonset.spec {
        Some(spec) => template_resources(&spec.template)?,
        None => Default::default(),
    };

    debug!(name = %descriptor.name, cpu = %resources.cpu, memory = %resources.memory, "calculated daemonset usage");

    Ok(ResourceUsage::new(
        resources.cpu,
        resources.memory,
        Details::without_rollout(descriptor),
    ))
}
