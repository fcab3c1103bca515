//! End-to-end orchestration: request validation, staged progress
//! events, and output sanitization.

pub mod progress;
pub mod sanitize;

pub use progress::{AnalysisRequest, InsightPipeline, ProgressEvent};
pub use sanitize::{sanitize_result, sanitize_text};
