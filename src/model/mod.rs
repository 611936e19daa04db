//! Classifier seam. The pipeline never calls a model itself; callers build one and
//! score finished records with it.

mod onnx;

pub use onnx::OnnxClassifier;

use crate::features::FeatureRecord;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("onnx runtime: {0}")]
    Ort(#[from] ort::OrtError),
    #[error("input shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("model produced no score")]
    NoOutput,
}

/// Maliciousness probability in [0, 1] for one record.
pub trait Classifier: Send + Sync {
    fn score(&self, record: &FeatureRecord) -> Result<f32, ModelError>;
}
