//! Tamper-evident benchmark fingerprints
//!
//! Each benchmark gets three SHA-256 fingerprints:
//!
//! - **declared**: the author-controlled identity metadata (annotations),
//!   canonicalized so that declaration order does not matter
//! - **structural**: the compiled implementation body
//! - **container**: the whole enclosing class surface, so a change to a
//!   sibling method sharing fixtures/state is also visible
//!
//! Fingerprints are pure functions of their input bytes. Line-number tables
//! and formatting noise are stripped before hashing; nothing volatile
//! (timestamps, addresses) is ever mixed in.
//!
//! # Example
//! ```
//! use benchgate::fingerprint::FingerprintGenerator;
//!
//! let generator = FingerprintGenerator::new();
//! let a = generator.fingerprint(b"api=io", b"iload_1\nireturn", b"class Bench");
//! let b = generator.fingerprint(b"api=io", b"iload_1\nireturn", b"class Bench");
//! assert_eq!(a, b);
//! assert!(a.is_complete());
//! ```

use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::borrow::Cow;

const DECLARED_DOMAIN: &[u8] = b"benchgate.declared.v1\0";
const STRUCTURAL_DOMAIN: &[u8] = b"benchgate.structural.v1\0";
const CONTAINER_DOMAIN: &[u8] = b"benchgate.container.v1\0";

/// Fingerprint triple for one benchmark
///
/// A `None` field means the input for that hash could not be resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    #[serde(default)]
    pub declared: Option<String>,
    #[serde(default)]
    pub structural: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
}

impl Fingerprint {
    /// All three hashes resolved
    pub fn is_complete(&self) -> bool {
        self.declared.is_some() && self.structural.is_some() && self.container.is_some()
    }

    /// Names of the unresolved fields
    pub fn missing(&self) -> Vec<String> {
        [
            ("declared", &self.declared),
            ("structural", &self.structural),
            ("container", &self.container),
        ]
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

/// Harness-supplied byte content for one benchmark
///
/// The harness enumerates benchmarks explicitly; any input it could not
/// obtain (e.g. class not found on the execution path) is left `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkSource {
    pub identifier: String,
    #[serde(default)]
    pub declared: Option<Vec<u8>>,
    #[serde(default)]
    pub body: Option<Vec<u8>>,
    #[serde(default)]
    pub container: Option<Vec<u8>>,
}

impl BenchmarkSource {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    pub fn with_declared(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.declared = Some(bytes.into());
        self
    }

    pub fn with_body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = Some(bytes.into());
        self
    }

    pub fn with_container(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.container = Some(bytes.into());
        self
    }
}

/// Fingerprinting outcome for one benchmark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintRecord {
    pub identifier: String,
    /// Resolved hashes; incomplete when `missing` is non-empty
    pub fingerprint: Fingerprint,
    pub missing: Vec<String>,
}

impl FingerprintRecord {
    pub fn is_resolved(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Computes canonicalized SHA-256 fingerprints
#[derive(Debug, Clone)]
pub struct FingerprintGenerator {
    line_number_entry: Regex,
}

impl Default for FingerprintGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintGenerator {
    pub fn new() -> Self {
        // Disassembler line-number tables: "LineNumberTable:" and "line 42: 7"
        let line_number_entry = Regex::new(r"^(?:LineNumberTable:|line \d+: \d+)$")
            .expect("line-number pattern is valid");
        Self { line_number_entry }
    }

    /// Fingerprint a benchmark whose three inputs are all available
    pub fn fingerprint(&self, declared: &[u8], body: &[u8], container: &[u8]) -> Fingerprint {
        Fingerprint {
            declared: Some(self.declared_hash(declared)),
            structural: Some(self.structural_hash(body)),
            container: Some(self.container_hash(container)),
        }
    }

    /// Hash of declared identity metadata (order-insensitive lines)
    pub fn declared_hash(&self, bytes: &[u8]) -> String {
        let canonical = match std::str::from_utf8(bytes) {
            Ok(text) => {
                let mut lines: Vec<&str> = text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect();
                lines.sort_unstable();
                lines.dedup();
                Cow::Owned(lines.join("\n").into_bytes())
            }
            Err(_) => Cow::Borrowed(bytes),
        };
        digest(DECLARED_DOMAIN, &canonical)
    }

    /// Hash of the compiled implementation body
    pub fn structural_hash(&self, bytes: &[u8]) -> String {
        digest(STRUCTURAL_DOMAIN, &self.canonical_code(bytes))
    }

    /// Hash of the enclosing class surface
    pub fn container_hash(&self, bytes: &[u8]) -> String {
        digest(CONTAINER_DOMAIN, &self.canonical_code(bytes))
    }

    /// Container hash over named members, independent of member order
    pub fn container_hash_from_members(&self, members: &[(&str, &[u8])]) -> String {
        let mut sorted = members.to_vec();
        sorted.sort_by_key(|(name, _)| *name);

        let mut surface = Vec::new();
        for (name, body) in sorted {
            surface.extend_from_slice(name.as_bytes());
            surface.push(0);
            surface.extend_from_slice(&self.canonical_code(body));
            surface.push(0);
        }
        digest(CONTAINER_DOMAIN, &surface)
    }

    /// Fingerprint one source, isolating unresolved inputs
    pub fn fingerprint_source(&self, source: &BenchmarkSource) -> FingerprintRecord {
        let fingerprint = Fingerprint {
            declared: source.declared.as_deref().map(|b| self.declared_hash(b)),
            structural: source.body.as_deref().map(|b| self.structural_hash(b)),
            container: source.container.as_deref().map(|b| self.container_hash(b)),
        };
        let missing = fingerprint.missing();
        if !missing.is_empty() {
            tracing::warn!(
                "Fingerprint inputs unresolved for {}: {}",
                source.identifier,
                missing.join(", ")
            );
        }
        FingerprintRecord {
            identifier: source.identifier.clone(),
            fingerprint,
            missing,
        }
    }

    /// Fingerprint all sources in parallel; output order matches input order
    pub fn fingerprint_all(&self, sources: &[BenchmarkSource]) -> Vec<FingerprintRecord> {
        sources
            .par_iter()
            .map(|source| self.fingerprint_source(source))
            .collect()
    }

    /// Normalize code text: LF endings, no trailing whitespace, no blank
    /// lines, no line-number entries. Non-UTF-8 input is hashed verbatim.
    fn canonical_code<'a>(&self, bytes: &'a [u8]) -> Cow<'a, [u8]> {
        let Ok(text) = std::str::from_utf8(bytes) else {
            return Cow::Borrowed(bytes);
        };

        let canonical = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .filter(|line| !self.line_number_entry.is_match(line.trim()))
            .collect::<Vec<_>>()
            .join("\n");
        Cow::Owned(canonical.into_bytes())
    }
}

fn digest(domain: &[u8], payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(payload);
    hex::encode(hasher.finalize())
}
