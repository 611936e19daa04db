//! URL feature extraction: lexical analysis, record schema and the assembling pipeline.

pub mod lexical;
pub mod pipeline;
mod record;

pub use lexical::{HostParts, LexicalFeatures, UrlParts, WordStats};
pub use pipeline::{assemble, Extraction, FeatureExtractor, Stage, StageFailure};
pub use record::{FeatureRecord, FeatureValue};

pub use crate::content::ContentFeatures;
pub use crate::probe::RegistrationInfo;
