//! Message analysis: shared result contract, sampling, and the two
//! analyzer implementations behind one router.

pub mod generative;
pub mod heuristic;
pub mod router;
pub mod sampler;
pub mod types;

pub use generative::GenerativeAnalyzer;
pub use heuristic::{DomainPolicy, HeuristicAnalyzer};
pub use router::AnalysisEngine;
pub use types::{AnalysisMethod, AnalysisResult, Message, ScoredMessage};
