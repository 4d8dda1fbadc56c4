//! Benchmark metadata from launcher strings and declared annotations
//!
//! Two compact string formats come from the run configuration:
//!
//! - user properties: `key=value;key2=value2`
//! - custom benchmark metadata: `target:key=value,key2=value2;target2:...`
//!   where `target` is a benchmark identifier or its class name
//!
//! Pairs that do not split into exactly one key and one value are skipped.
//! Parsed custom metadata is merged with the annotations the harness
//! reports, and the result is resolved per benchmark: method-level keys
//! first, then class-level keys for anything the method did not declare.

use crate::measurement::BenchmarkName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Free-form key → value metadata
pub type MetadataMap = BTreeMap<String, String>;

/// Legacy keys copied into typed report fields during backfill
pub mod keys {
    pub const CATEGORY: &str = "api";
    pub const CONTEXT: &str = "context";
    pub const VERSION: &str = "version";
    pub const PROJECT: &str = "project";
    pub const PROJECT_VERSION: &str = "projectVersion";
}

fn split_pair(pair: &str) -> Option<(String, String)> {
    let mut parts = pair.split('=');
    let key = parts.next()?.trim();
    let value = parts.next()?.trim();
    if parts.next().is_some() || key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

/// Parse `key=value;key2=value2`
///
/// # Example
/// ```
/// use benchgate::metadata::parse_user_properties;
///
/// let props = parse_user_properties("team=io;broken;owner=alice");
/// assert_eq!(props.len(), 2);
/// assert_eq!(props["owner"], "alice");
/// ```
pub fn parse_user_properties(raw: &str) -> MetadataMap {
    raw.split(';').filter_map(split_pair).collect()
}

/// Parse `target:key=value,key2=value2;target2:...`
pub fn parse_benchmark_metadata(raw: &str) -> BTreeMap<String, MetadataMap> {
    let mut parsed: BTreeMap<String, MetadataMap> = BTreeMap::new();

    for entry in raw.split(';') {
        let Some((target, pairs)) = entry.split_once(':') else {
            if !entry.trim().is_empty() {
                tracing::warn!("Ignoring benchmark metadata entry without target: '{}'", entry);
            }
            continue;
        };
        let target = target.trim();
        if target.is_empty() {
            continue;
        }

        let values: MetadataMap = pairs.split(',').filter_map(split_pair).collect();
        if !values.is_empty() {
            parsed.entry(target.to_string()).or_default().extend(values);
        }
    }

    parsed
}

/// Declared metadata for a run, keyed by benchmark identifier or class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    /// Benchmark identifier → method-level metadata
    #[serde(default)]
    pub methods: BTreeMap<String, MetadataMap>,
    /// Class name → class-level metadata
    #[serde(default)]
    pub classes: BTreeMap<String, MetadataMap>,
}

impl Annotations {
    /// Merge custom launcher metadata
    ///
    /// A target naming a known benchmark identifier is method-level; any
    /// other target is treated as a class name. Launcher values replace
    /// harness-declared values for the same key.
    pub fn merge_custom(
        &mut self,
        custom: BTreeMap<String, MetadataMap>,
        identifiers: &BTreeSet<String>,
    ) {
        for (target, values) in custom {
            let slot = if identifiers.contains(&target) {
                self.methods.entry(target)
            } else {
                self.classes.entry(target)
            };
            slot.or_default().extend(values);
        }
    }

    /// Effective metadata for one benchmark
    pub fn resolve(&self, identifier: &str) -> MetadataMap {
        let mut resolved = self.methods.get(identifier).cloned().unwrap_or_default();
        let class = BenchmarkName::parse(identifier).class;
        if let Some(class_values) = self.classes.get(class) {
            for (key, value) in class_values {
                resolved
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        resolved
    }

    /// Category declared through the legacy `api` key, if any
    pub fn declared_category(&self, identifier: &str) -> Option<String> {
        self.resolve(identifier).remove(keys::CATEGORY)
    }
}
