//! Error types for resource usage calculation

use crate::manifest::DecodeError;
use crate::quantity::QuantityError;
use thiserror::Error;

/// Errors produced while calculating the resource usage of one workload
#[derive(Debug, Error)]
pub enum CalcError {
    /// No calculator exists for the decoded kind; callers skip the document
    #[error("calculating {version}/{kind} resource usage: resource not supported")]
    UnsupportedKind { version: String, kind: String },

    #[error("deployment: {name} deployment strategy {strategy:?} is unknown")]
    UnknownStrategy { name: String, strategy: String },

    #[error("invalid {resource} limit {value:?}: {source}")]
    InvalidQuantity {
        resource: &'static str,
        value: String,
        #[source]
        source: QuantityError,
    },

    #[error("invalid value for IntOrString: {value:?} is not a percentage")]
    InvalidIntOrPercent { value: String },

    #[error("{kind} {name}: missing required field {field}")]
    MissingField {
        kind: String,
        name: String,
        field: &'static str,
    },

    #[error("decoding manifest: {0}")]
    Decode(#[from] DecodeError),
}

impl CalcError {
    /// Returns true for documents that are skipped rather than failed
    pub fn is_unsupported(&self) -> bool {
        matches!(self, CalcError::UnsupportedKind { .. })
    }
}

pub type CalcResult<T> = Result<T, CalcError>;
