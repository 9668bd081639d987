//! Deployment resource usage with rollout overhead
//!
//! During a rolling update old and new replicas coexist. `maxSurge` bounds
//! how many pods may run above the desired count, `maxUnavailable` how many
//! may be missing below it. Their difference is the transient pod overhead,
//! and the ratio of the peak pod count to the desired count scales the
//! steady-state resource total linearly.

use super::pod::template_resources;
use crate::error::{CalcError, CalcResult};
use crate::intstr::{IntOrPercent, Rounding};
use crate::models::{Details, ResourceUsage, WorkloadDescriptor};
use crate::quantity::{Quantity, Unit};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentStrategy};
use tracing::debug;

/// Default for both `maxSurge` and `maxUnavailable`
const DEFAULT_ROLLING_BOUND: IntOrPercent = IntOrPercent::Percent(25);

const RECREATE: &str = "Recreate";
const ROLLING_UPDATE: &str = "RollingUpdate";

/// Deployment strategy type as written in the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyType {
    Recreate,
    RollingUpdate,
    /// Field absent or empty
    Unset,
    Other(String),
}

impl StrategyType {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => StrategyType::Unset,
            Some(RECREATE) => StrategyType::Recreate,
            Some(ROLLING_UPDATE) => StrategyType::RollingUpdate,
            Some(other) => StrategyType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StrategyType::Recreate => RECREATE,
            StrategyType::RollingUpdate => ROLLING_UPDATE,
            StrategyType::Unset => "",
            StrategyType::Other(raw) => raw,
        }
    }
}

/// Rollout policy of a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutStrategy {
    pub strategy_type: StrategyType,
    pub max_unavailable: Option<IntOrPercent>,
    pub max_surge: Option<IntOrPercent>,
}

impl RolloutStrategy {
    pub fn new(strategy_type: StrategyType) -> Self {
        Self {
            strategy_type,
            max_unavailable: None,
            max_surge: None,
        }
    }

    pub fn rolling_update(max_unavailable: IntOrPercent, max_surge: IntOrPercent) -> Self {
        Self {
            strategy_type: StrategyType::RollingUpdate,
            max_unavailable: Some(max_unavailable),
            max_surge: Some(max_surge),
        }
    }

    /// Read the strategy from a deployment spec.
    ///
    /// Rolling update bounds are only read for an explicit `RollingUpdate`
    /// type; an unset type always uses the defaults.
    pub fn from_spec(strategy: Option<&DeploymentStrategy>) -> CalcResult<Self> {
        let strategy_type = StrategyType::from_raw(strategy.and_then(|s| s.type_.as_deref()));
        let mut rollout = Self::new(strategy_type);

        let rolling_update = strategy.and_then(|s| s.rolling_update.as_ref());
        if let (StrategyType::RollingUpdate, Some(bounds)) = (&rollout.strategy_type, rolling_update) {
            rollout.max_unavailable = bounds
                .max_unavailable
                .as_ref()
                .map(IntOrPercent::try_from)
                .transpose()?;
            rollout.max_surge = bounds.max_surge.as_ref().map(IntOrPercent::try_from).transpose()?;
        }

        Ok(rollout)
    }
}

/// Extra pods a rollout may schedule on top of the desired count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overhead {
    /// Signed: negative when `maxUnavailable` exceeds `maxSurge`
    pub pod_overhead: i32,
    pub max_replicas: i32,
}

impl Overhead {
    /// Overhead factor `pod_overhead / replicas + 1` as an exact
    /// `(numerator, denominator)` pair
    pub fn factor(&self, replicas: i32) -> (i64, i64) {
        let replicas = i64::from(replicas);
        (replicas + i64::from(self.pod_overhead), replicas)
    }
}

/// Resolve the rollout overhead of `replicas` pods under `strategy`.
///
/// `replicas` must be non-zero; zero-replica deployments are handled by
/// [`deployment`] before the strategy is looked at.
pub fn rollout_overhead(replicas: i32, strategy: &RolloutStrategy, name: &str) -> CalcResult<Overhead> {
    match &strategy.strategy_type {
        // old and new pods never coexist
        StrategyType::Recreate => Ok(Overhead {
            pod_overhead: 0,
            max_replicas: replicas,
        }),
        StrategyType::Unset | StrategyType::RollingUpdate => {
            let max_unavailable = strategy
                .max_unavailable
                .unwrap_or(DEFAULT_ROLLING_BOUND)
                .resolve(replicas, Rounding::Down);
            let max_surge = strategy
                .max_surge
                .unwrap_or(DEFAULT_ROLLING_BOUND)
                .resolve(replicas, Rounding::Up);

            let pod_overhead = max_surge.saturating_sub(max_unavailable);
            Ok(Overhead {
                pod_overhead,
                max_replicas: replicas.saturating_add(pod_overhead),
            })
        }
        StrategyType::Other(raw) => Err(CalcError::UnknownStrategy {
            name: name.to_string(),
            strategy: raw.clone(),
        }),
    }
}

/// Calculate the cpu/memory a single deployment needs. Replicas and the
/// deployment strategy are taken into account.
pub fn deployment(deployment: &Deployment) -> CalcResult<ResourceUsage> {
    let descriptor = WorkloadDescriptor::of(deployment);
    let spec = deployment.spec.as_ref();

    let replicas = spec
        .and_then(|s| s.replicas)
        .ok_or_else(|| CalcError::MissingField {
            kind: descriptor.kind.clone(),
            name: descriptor.name.clone(),
            field: "spec.replicas",
        })?;
    let raw_strategy = spec.and_then(|s| s.strategy.as_ref());

    // nothing beyond the raw type is read for an empty deployment
    if replicas == 0 {
        let strategy_name = raw_strategy
            .and_then(|s| s.type_.clone())
            .unwrap_or_default();
        return Ok(ResourceUsage::new(
            Quantity::zero(),
            Quantity::zero(),
            Details::new(descriptor, 0, 0, strategy_name),
        ));
    }

    let strategy = RolloutStrategy::from_spec(raw_strategy)?;
    let overhead = rollout_overhead(replicas, &strategy, &descriptor.name)?;
    let per_replica = match spec {
        Some(spec) => template_resources(&spec.template)?,
        None => Default::default(),
    };

    // per_replica * replicas * factor, kept as one exact ratio
    let (factor_num, factor_den) = overhead.factor(replicas);
    let numerator = i64::from(replicas) * factor_num;
    let cpu = per_replica.cpu.mul_ratio(numerator, factor_den, Unit::Milli);
    let memory = per_replica.memory.mul_ratio(numerator, factor_den, Unit::Whole);

    // an unset type has been resolved with the RollingUpdate defaults
    let strategy_name = match strategy.strategy_type {
        StrategyType::Unset => ROLLING_UPDATE.to_string(),
        other => other.as_str().to_string(),
    };
    let max_replicas = overhead.max_replicas.max(0);

    debug!(
        name = %descriptor.name,
        replicas,
        max_replicas,
        pod_overhead = overhead.pod_overhead,
        cpu = %cpu,
        memory = %memory,
        "calculated deployment usage"
    );

    Ok(ResourceUsage::new(
        cpu,
        memory,
        Details::new(descriptor, replicas, max_replicas, strategy_name),
    ))
}
