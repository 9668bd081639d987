//! Resource quota calculation for Kubernetes workloads
//!
//! This crate estimates the peak CPU and memory limits a set of workload
//! manifests needs, including the extra pods a rolling update schedules
//! while old and new replicas coexist:
//! - Exact resource quantities
//! - Per-kind calculators (Deployment, StatefulSet, DaemonSet, Job, CronJob, Pod)
//! - Aggregation across a multi-document manifest stream
//! - Manifest decoding into typed Kubernetes objects

pub mod aggregate;
pub mod calc;
pub mod error;
pub mod intstr;
pub mod manifest;
pub mod models;
pub mod quantity;

pub use aggregate::{aggregate, Aggregator, Folded, Report, Summary};
pub use calc::Workload;
pub use error::{CalcError, CalcResult};
pub use intstr::{IntOrPercent, Rounding};
pub use manifest::{DecodeError, Documents};
pub use models::*;
pub use quantity::{Format, Quantity, QuantityError, Unit};

/// Calculate the resource usage of the first document in `input`.
pub fn calculate_yaml(input: &str) -> CalcResult<ResourceUsage> {
    let workload = Documents::new(input).next().ok_or(DecodeError::Empty)??;
    workload.resource_usage()
}
