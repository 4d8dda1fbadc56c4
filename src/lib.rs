//! Benchgate - benchmark fingerprinting, scoring and regression gating
//!
//! This library turns raw benchmark measurements into a scored,
//! fingerprinted report and decides whether the run is a statistically
//! significant regression against historical baselines.

pub mod cli;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod measurement;
pub mod metadata;
pub mod regression;
pub mod report;
pub mod scoring;
pub mod settings;
