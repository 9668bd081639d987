//! Pod template resource summation

use crate::error::{CalcError, CalcResult};
use crate::models::{Details, ResourceUsage, WorkloadDescriptor};
use crate::quantity::{Quantity, Unit};
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, PodTemplateSpec};
use tracing::debug;

const CPU: &str = "cpu";
const MEMORY: &str = "memory";

/// Summed limits of one pod
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PodResources {
    pub cpu: Quantity,
    pub memory: Quantity,
}

/// Sum the CPU and memory limits of every container and init container.
///
/// Init-container limits are added to container limits even though init
/// containers do not run concurrently with the main containers at runtime.
/// This is a deliberate conservative (upper-bound) simplification, not a
/// scheduling simulation.
///
/// A container without a limit contributes zero for that resource. Memory
/// is rounded up to whole bytes.
pub fn pod_resources(spec: &PodSpec) -> CalcResult<PodResources> {
    let mut total = PodResources::default();

    let init_containers = spec.init_containers.iter().flatten();
    for container in spec.containers.iter().chain(init_containers) {
        total.cpu += container_limit(container, CPU)?;
        total.memory += container_limit(container, MEMORY)?;
    }

    total.memory = total.memory.round_up_to(Unit::Whole);
    Ok(total)
}

/// Resources of a pod template; a template without a pod spec sums to zero
pub fn template_resources(template: &PodTemplateSpec) -> CalcResult<PodResources> {
    match &template.spec {
        Some(spec) => pod_resources(spec),
        None => Ok(PodResources::default()),
    }
}

fn container_limit(container: &Container, resource: &'static str) -> CalcResult<Quantity> {
    let limit = container
        .resources
        .as_ref()
        .and_then(|r| r.limits.as_ref())
        .and_then(|limits| limits.get(resource));

    match limit {
        Some(raw) => raw.0.parse().map_err(|source| CalcError::InvalidQuantity {
            resource,
            value: raw.0.clone(),
            source,
        }),
        None => Ok(Quantity::zero()),
    }
}

/// Resource usage of a bare pod
pub fn pod(pod: &Pod) -> CalcResult<ResourceUsage> {
    let descriptor = WorkloadDescriptor::of(pod);
    let resources = match &pod.spec {
        Some(spec) => pod_resources(spec)?,
        None => PodResources::default(),
    };

    debug!(kind = %descriptor.kind, name = %descriptor.name, cpu = %resources.cpu, memory = %resources.memory, "calculated pod usage");

    Ok(ResourceUsage::new(
        resources.cpu,
        resources.memory,
        Details::without_rollout(descriptor),
    ))
}
