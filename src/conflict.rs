//! Conflict extraction and classification.

pub mod align;
pub mod classifier;
pub mod dependencies;
pub mod extractor;
pub mod markers;
pub mod tokens;

pub use classifier::{categorize, Classifier};
pub use extractor::{locate_markers, Extractor};
