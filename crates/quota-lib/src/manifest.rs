//! Multi-document manifest decoding
//!
//! Splits a YAML stream into documents and decodes each into a typed
//! [`Workload`]. Kinds without a calculator decode to
//! [`Workload::Unsupported`] rather than failing, so they can be skipped.

use crate::calc::Workload;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::Resource;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::Value;
use std::io::Read;
use thiserror::Error;
use tracing::debug;

/// Keys under which Kubernetes expects resource quantity maps
const QUANTITY_MAPS: [&str; 3] = ["limits", "requests", "overhead"];

/// Errors produced while decoding a manifest document
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("reading input: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("document is missing {0}")]
    MissingTypeMeta(&'static str),

    #[error("decoding {version}/{kind}: {source}")]
    Object {
        version: String,
        kind: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("input contains no documents")]
    Empty,
}

/// Iterator over the workloads of a multi-document YAML stream, in input
/// order. Empty documents are skipped.
pub struct Documents<'de> {
    documents: serde_yaml::Deserializer<'de>,
}

impl<'de> Documents<'de> {
    pub fn new(input: &'de str) -> Self {
        Self {
            documents: serde_yaml::Deserializer::from_str(input),
        }
    }

    pub fn from_reader<R: Read + 'de>(reader: R) -> Self {
        Self {
            documents: serde_yaml::Deserializer::from_reader(reader),
        }
    }
}

impl Iterator for Documents<'_> {
    type Item = Result<Workload, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let document = self.documents.next()?;
            let value = match Value::deserialize(document) {
                Ok(value) => value,
                Err(err) => return Some(Err(err.into())),
            };

            if value.is_null() {
                debug!("skipping empty document");
                continue;
            }

            return Some(decode_value(value));
        }
    }
}

/// Decode one parsed document into a workload
pub fn decode_value(value: Value) -> Result<Workload, DecodeError> {
    let version = type_meta(&value, "apiVersion")?;
    let kind = type_meta(&value, "kind")?;

    let workload = if is::<Deployment>(&version, &kind) {
        Workload::Deployment(typed(value, &version, &kind)?)
    } else if is::<StatefulSet>(&version, &kind) {
        Workload::StatefulSet(typed(value, &version, &kind)?)
    } else if is::<DaemonSet>(&version, &kind) {
        Workload::DaemonSet(typed(value, &version, &kind)?)
    } else if is::<Job>(&version, &kind) {
        Workload::Job(typed(value, &version, &kind)?)
    } else if is::<CronJob>(&version, &kind) {
        Workload::CronJob(typed(value, &version, &kind)?)
    } else if is::<Pod>(&version, &kind) {
        Workload::Pod(typed(value, &version, &kind)?)
    } else {
        Workload::Unsupported { version, kind }
    };

    Ok(workload)
}

fn type_meta(value: &Value, key: &'static str) -> Result<String, DecodeError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(DecodeError::MissingTypeMeta(key))
}

fn is<K: Resource>(version: &str, kind: &str) -> bool {
    version == K::API_VERSION && kind == K::KIND
}

fn typed<K: DeserializeOwned>(mut value: Value, version: &str, kind: &str) -> Result<Box<K>, DecodeError> {
    stringify_quantities(&mut value);
    serde_yaml::from_value(value)
        .map(Box::new)
        .map_err(|source| DecodeError::Object {
            version: version.to_string(),
            kind: kind.to_string(),
            source,
        })
}

/// Quantities are strings in the API types, but manifests commonly write
/// them as bare numbers (`cpu: 1`). Rewrite numeric entries of quantity
/// maps as strings.
fn stringify_quantities(value: &mut Value) {
    match value {
        Value::Mapping(mapping) => {
            for (key, child) in mapping.iter_mut() {
                let is_quantity_map = key
                    .as_str()
                    .is_some_and(|k| QUANTITY_MAPS.contains(&k));

                match child {
                    Value::Mapping(quantities) if is_quantity_map => {
                        for (_, quantity) in quantities.iter_mut() {
                            if let Value::Number(n) = quantity {
                                *quantity = Value::String(n.to_string());
                            }
                        }
                    }
                    _ => stringify_quantities(child),
                }
            }
        }
        Value::Sequence(items) => items.iter_mut().for_each(stringify_quantities),
        Value::Tagged(tagged) => stringify_quantities(&mut tagged.value),
        _ => {}
    }
}
