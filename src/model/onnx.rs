//! ONNX Runtime classifier. Input: [1, feature_dim] f32 numeric vector.
//! Output: class probabilities (`[1, 2]`, malicious at index 1) or a single score.
//! If the model file is missing, runs in no-op mode (returns 0.0).

use super::{Classifier, ModelError};
use crate::features::FeatureRecord;
use ndarray::{Array2, CowArray};
use ort::tensor::OrtOwnedTensor;
use ort::{Environment, GraphOptimizationLevel, Session, SessionBuilder, Value};
use std::path::Path;
use std::sync::Arc;

pub struct OnnxClassifier {
    session: Option<Session>,
    feature_dim: usize,
}

impl OnnxClassifier {
    /// Load model from path. If the file is missing, the classifier scores everything 0.0.
    pub fn load(path: &Path, feature_dim: usize) -> Result<Self, ModelError> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "ONNX model not found; scoring disabled");
            return Ok(Self {
                session: None,
                feature_dim,
            });
        }

        let env = Arc::new(Environment::builder().with_name("phishscan").build()?);
        let session = SessionBuilder::new(&env)?
            .with_optimization_level(GraphOptimizationLevel::Level1)?
            .with_model_from_file(path)?;
        tracing::info!(path = %path.display(), feature_dim, "ONNX model loaded");

        Ok(Self {
            session: Some(session),
            feature_dim,
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    /// Pad or truncate to the model's input width.
    fn input_row(&self, record: &FeatureRecord) -> Vec<f32> {
        let mut row = record.numeric_vector();
        row.resize(self.feature_dim, 0.0);
        row
    }
}

impl Classifier for OnnxClassifier {
    fn score(&self, record: &FeatureRecord) -> Result<f32, ModelError> {
        let Some(ref session) = self.session else {
            return Ok(0.0);
        };

        let arr = CowArray::from(Array2::from_shape_vec((1, self.feature_dim), self.input_row(record))?.into_dyn());
        let input = Value::from_array(session.allocator(), &arr)?;
        let outputs = session.run(vec![input])?;

        // Classifiers exported with a label output put probabilities second.
        let out = outputs.get(1).or_else(|| outputs.first()).ok_or(ModelError::NoOutput)?;
        let tensor: OrtOwnedTensor<f32, _> = out.try_extract()?;
        let view = tensor.view();
        let values: Vec<f32> = view.iter().copied().collect();
        let score = match values.as_slice() {
            [_, malicious, ..] => *malicious,
            [only] => *only,
            [] => return Err(ModelError::NoOutput),
        };
        Ok(score.clamp(0.0, 1.0))
    }
}
