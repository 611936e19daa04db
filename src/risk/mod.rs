//! Verdicts over classifier scores.

mod engine;

pub use engine::{Assessment, RiskEngine, Verdict};
