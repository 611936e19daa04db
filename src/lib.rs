//! phishscan: phishing-detection feature extraction for URLs.
//!
//! Modular structure:
//! - [`features`] : lexical analysis, fixed 89-column record schema, extraction pipeline
//! - [`probe`] : WHOIS registration lookup and DNS resolution
//! - [`content`] : page fetch and HTML content heuristics
//! - [`model`] : classifier seam and ONNX implementation
//! - [`risk`] : verdicts over classifier scores
//! - [`export`] : CSV / JSON-lines output
//! - [`logging`] : tracing subscriber setup

pub mod config;
pub mod content;
pub mod export;
pub mod features;
pub mod logging;
pub mod model;
pub mod probe;
pub mod risk;

pub use config::ExtractorConfig;
pub use export::{write_csv, RecordSink};
pub use features::{Extraction, FeatureExtractor, FeatureRecord};
pub use logging::StructuredLogger;
pub use model::{Classifier, OnnxClassifier};
pub use risk::{RiskEngine, Verdict};
