//! Core data models for resource usage reporting

use crate::quantity::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::{Metadata, Resource};
use serde::Serialize;

/// Identity of a workload, used for reporting only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadDescriptor {
    pub api_version: String,
    pub kind: String,
    pub name: String,
}

impl WorkloadDescriptor {
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Descriptor of a typed Kubernetes object
    pub fn of<K>(object: &K) -> Self
    where
        K: Resource + Metadata<Ty = ObjectMeta>,
    {
        Self::new(
            K::API_VERSION,
            K::KIND,
            object.metadata().name.clone().unwrap_or_default(),
        )
    }
}

/// Per-workload reporting details
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Details {
    pub version: String,
    pub kind: String,
    pub name: String,
    pub replicas: i32,
    pub max_replicas: i32,
    pub strategy: String,
}

impl Details {
    pub fn new(
        descriptor: WorkloadDescriptor,
        replicas: i32,
        max_replicas: i32,
        strategy: impl Into<String>,
    ) -> Self {
        Self {
            version: descriptor.api_version,
            kind: descriptor.kind,
            name: descriptor.name,
            replicas,
            max_replicas,
            strategy: strategy.into(),
        }
    }

    /// Details for kinds without a replica or rollout concept
    pub fn without_rollout(descriptor: WorkloadDescriptor) -> Self {
        Self::new(descriptor, 0, 0, "")
    }
}

/// Resources a single workload needs at its peak
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceUsage {
    pub cpu: Quantity,
    pub memory: Quantity,
    pub details: Details,
}

impl ResourceUsage {
    pub fn new(cpu: Quantity, memory: Quantity, details: Details) -> Self {
        Self {
            cpu,
            memory,
            details,
        }
    }
}
