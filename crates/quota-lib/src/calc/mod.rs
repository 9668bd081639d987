//! Per-kind resource usage calculation
//!
//! [`Workload`] is the closed set of kinds a calculator exists for;
//! [`Workload::resource_usage`] routes each to its calculator and rejects
//! everything else with [`CalcError::UnsupportedKind`].

mod daemonset;
mod deployment;
mod job;
mod pod;
mod statefulset;


pub use daemonset::daemonset;
pub use deployment::{deployment, rollout_overhead, Overhead, RolloutStrategy, StrategyType};
pub use job::{cronjob, job};
pub use pod::{pod, pod_resources, template_resources, PodResources};
pub use statefulset::statefulset;

use crate::error::{CalcError, CalcResult};
use crate::models::ResourceUsage;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::Resource;

/// A decoded workload object
#[derive(Debug, Clone)]
pub enum Workload {
    Deployment(Box<Deployment>),
    StatefulSet(Box<StatefulSet>),
    DaemonSet(Box<DaemonSet>),
    Job(Box<Job>),
    CronJob(Box<CronJob>),
    Pod(Box<Pod>),
    /// Any kind without a calculator
    Unsupported { version: String, kind: String },
}

impl Workload {
    pub fn api_version(&self) -> &str {
        match self {
            Workload::Deployment(_) => Deployment::API_VERSION,
            Workload::StatefulSet(_) => StatefulSet::API_VERSION,
            Workload::DaemonSet(_) => DaemonSet::API_VERSION,
            Workload::Job(_) => Job::API_VERSION,
            Workload::CronJob(_) => CronJob::API_VERSION,
            Workload::Pod(_) => Pod::API_VERSION,
            Workload::Unsupported { version, .. } => version,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Workload::Deployment(_) => Deployment::KIND,
            Workload::StatefulSet(_) => StatefulSet::KIND,
            Workload::DaemonSet(_) => DaemonSet::KIND,
            Workload::Job(_) => Job::KIND,
            Workload::CronJob(_) => CronJob::KIND,
            Workload::Pod(_) => Pod::KIND,
            Workload::Unsupported { kind, .. } => kind,
        }
    }

    /// Calculate the resource usage with the calculator for this kind
    pub fn resource_usage(&self) -> CalcResult<ResourceUsage> {
        match self {
            Workload::Deployment(d) => deployment(d),
            Workload::StatefulSet(s) => statefulset(s),
            Workload::DaemonSet(d) => daemonset(d),
            Workload::Job(j) => job(j),
            Workload::CronJob(c) => cronjob(c),
            Workload::Pod(p) => pod(p),
            Workload::Unsupported { version, kind } => Err(CalcError::UnsupportedKind {
                version: version.clone(),
                kind: kind.clone(),
            }),
        }
    }
}
