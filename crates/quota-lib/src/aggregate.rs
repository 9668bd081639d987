//! Aggregation of per-workload results into a run total
//!
//! Results are folded strictly in input order. Unsupported kinds are
//! skipped; any other failure is handed back to the caller and leaves the
//! totals accumulated so far untouched.

use crate::error::CalcError;
use crate::models::ResourceUsage;
use crate::quantity::Quantity;
use serde::Serialize;
use tracing::debug;

/// Running totals, optionally with the records that contributed to them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub cpu: Quantity,
    pub memory: Quantity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ResourceUsage>>,
}

/// What [`Aggregator::fold`] did with a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folded {
    /// Added to the totals
    Counted,
    /// Unsupported kind, ignored
    Skipped,
}

/// Accumulates resource usage across documents
#[derive(Debug, Clone)]
pub struct Aggregator {
    summary: Summary,
}

impl Aggregator {
    /// Create an aggregator; `retain_details` keeps every counted record
    pub fn new(retain_details: bool) -> Self {
        Self {
            summary: Summary {
                details: retain_details.then(Vec::new),
                ..Default::default()
            },
        }
    }

    /// Fold one document's result into the totals
    pub fn fold(&mut self, result: Result<ResourceUsage, CalcError>) -> Result<Folded, CalcError> {
        let usage = match result {
            Ok(usage) => usage,
            Err(err) if err.is_unsupported() => {
                debug!("ignoring: {}", err);
                return Ok(Folded::Skipped);
            }
            Err(err) => return Err(err),
        };

        self.summary.cpu += usage.cpu;
        self.summary.memory += usage.memory;
        if let Some(details) = self.summary.details.as_mut() {
            details.push(usage);
        }

        Ok(Folded::Counted)
    }

    /// Totals accumulated so far
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn finish(self) -> Summary {
        self.summary
    }
}

/// Outcome of folding a whole stream
#[derive(Debug)]
pub struct Report {
    pub summary: Summary,
    /// Per-document failures other than unsupported kinds, in input order
    pub failures: Vec<CalcError>,
}

/// Fold every result, collecting failures instead of stopping at them
pub fn aggregate<I>(results: I, retain_details: bool) -> Report
where
    I: IntoIterator<Item = Result<ResourceUsage, CalcError>>,
{
    let mut aggregator = Aggregator::new(retain_details);
    let failures = results
        .into_iter()
        .filter_map(|result| aggregator.fold(result).err())
        .collect();

    Report {
        summary: aggregator.finish(),
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Details, WorkloadDescriptor};
    use pretty_assertions::assert_eq;

    fn usage(name: &str, cpu: &str, memory: &str) -> ResourceUsage {
        ResourceUsage::new(
            cpu.parse().unwrap(),
            memory.parse().unwrap(),
            Details::new(WorkloadDescriptor::new("apps/v1", "Deployment", name), 1, 1, "Recreate"),
        )
    }

    fn unsupported() -> CalcError {
        CalcError::UnsupportedKind {
            version: "v1".to_string(),
            kind: "Service".to_string(),
        }
    }

    #[test]
    fn test_totals_and_details_in_order() {
        let mut aggregator = Aggregator::new(true);
        assert_eq!(aggregator.fold(Ok(usage("a", "1", "1Gi"))).unwrap(), Folded::Counted);
        assert_eq!(aggregator.fold(Err(unsupported())).unwrap(), Folded::Skipped);
        assert_eq!(aggregator.fold(Ok(usage("b", "500m", "512Mi"))).unwrap(), Folded::Counted);

        let summary = aggregator.finish();
        assert_eq!(summary.cpu.to_string(), "1500m");
        assert_eq!(summary.memory.to_string(), "1536Mi");

        let names: Vec<&str> = summary
            .details
            .as_ref()
            .unwrap()
            .iter()
            .map(|u| u.details.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_details_not_retained_by_default() {
        let mut aggregator = Aggregator::new(false);
        aggregator.fold(Ok(usage("a", "1", "1Gi"))).unwrap();
        assert!(aggregator.summary().details.is_none());
        assert_eq!(aggregator.summary().cpu.to_string(), "1");
    }

    #[test]
    fn test_failure_keeps_partial_totals() {
        let mut aggregator = Aggregator::new(true);
        aggregator.fold(Ok(usage("a", "2", "2Gi"))).unwrap();

        let failure = CalcError::UnknownStrategy {
            name: "b".to_string(),
            strategy: "BlueGreen".to_string(),
        };
        assert!(aggregator.fold(Err(failure)).is_err());

        let summary = aggregator.summary();
        assert_eq!(summary.cpu.to_string(), "2");
        assert_eq!(summary.details.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_aggregate_collects_failures() {
        let results = vec![
            Ok(usage("a", "1", "1Gi")),
            Err(unsupported()),
            Err(CalcError::UnknownStrategy {
                name: "b".to_string(),
                strategy: "Canary".to_string(),
            }),
            Ok(usage("c", "1", "1Gi")),
        ];

        let report = aggregate(results, false);
        assert_eq!(report.summary.cpu.to_string(), "2");
        assert_eq!(report.summary.memory.to_string(), "2Gi");
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0], CalcError::UnknownStrategy { .. }));
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = Aggregator::new(false).finish();
        assert_eq!(summary.cpu.to_string(), "0");
        assert_eq!(summary.memory.to_string(), "0");
    }

    #[test]
    fn test_summary_serializes_quantities_as_strings() {
        let mut aggregator = Aggregator::new(false);
        aggregator.fold(Ok(usage("a", "1", "1Gi"))).unwrap();

        let json = serde_json::to_value(aggregator.summary()).unwrap();
        assert_eq!(json, serde_json::json!({ "cpu": "1", "memory": "1Gi" }));
    }
}
