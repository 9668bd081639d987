//! Job and CronJob resource usage

use super::pod::{template_resources, PodResources};
use crate::error::CalcResult;
use crate::models::{Details, ResourceUsage, WorkloadDescriptor};
use k8s_openapi::api::batch::v1::{CronJob, Job, JobSpec};
use tracing::debug;

fn job_spec_resources(spec: Option<&JobSpec>) -> CalcResult<PodResources> {
    match spec {
        Some(spec) => template_resources(&spec.template),
        None => Ok(PodResources::default()),
    }
}

/// Resources of one job pod
pub fn job(job: &Job) -> CalcResult<ResourceUsage> {
    let descriptor = WorkloadDescriptor::of(job);
    let resources = job_spec_resources(job.spec.as_ref())?;

    debug!(name = %descriptor.name, cpu = %resources.cpu, memory = %resources.memory, "calculated job usage");

    Ok(ResourceUsage::new(
        resources.cpu,
        resources.memory,
        Details::without_rollout(descriptor),
    ))
}

/// Resources of one pod of the job template
pub fn cronjob(cronjob: &CronJob) -> CalcResult<ResourceUsage> {
    let job_spec = cronjob
        .spec
        .as_ref()
        .and_then(|s| s.job_template.spec.as_ref());
    let descriptor = WorkloadDescriptor::of(cronjob);
    let resources = job_spec_resources(job_spec)?;

    debug!(name = %descriptor.name, cpu = %resources.cpu, memory = %resources.memory, "calculated cronjob usage");

    Ok(ResourceUsage::new(
        resources.cpu,
        resources.memory,
        Details::without_rollout(descriptor),
    ))
}
