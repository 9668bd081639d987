//! Absolute-or-percentage values
//!
//! Rolling update bounds (`maxSurge`, `maxUnavailable`) are either an
//! absolute pod count or a percentage of the desired replica count.

use crate::error::{CalcError, CalcResult};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::fmt;

/// Rounding applied when a percentage is resolved to a pod count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// An absolute integer or a percentage of some base count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntOrPercent {
    Int(i32),
    Percent(i32),
}

impl IntOrPercent {
    /// Resolve against `base`. Absolute values are returned as-is.
    pub fn resolve(&self, base: i32, rounding: Rounding) -> i32 {
        match *self {
            IntOrPercent::Int(value) => value,
            IntOrPercent::Percent(percent) => {
                let scaled = i64::from(percent) * i64::from(base);
                let resolved = match rounding {
                    Rounding::Down => scaled.div_euclid(100),
                    Rounding::Up => -(-scaled).div_euclid(100),
                };
                resolved.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
            }
        }
    }
}

impl TryFrom<&IntOrString> for IntOrPercent {
    type Error = CalcError;

    fn try_from(value: &IntOrString) -> CalcResult<Self> {
        match value {
            IntOrString::Int(v) => Ok(IntOrPercent::Int(*v)),
            IntOrString::String(s) => s
                .strip_suffix('%')
                .and_then(|p| p.trim().parse().ok())
                .map(IntOrPercent::Percent)
                .ok_or_else(|| CalcError::InvalidIntOrPercent { value: s.clone() }),
        }
    }
}

impl fmt::Display for IntOrPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntOrPercent::Int(v) => write!(f, "{}", v),
            IntOrPercent::Percent(p) => write!(f, "{}%", p),
        }
    }
}
