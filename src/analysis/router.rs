//! Method dispatch.
//!
//! Both analyzers are constructed up front so a request for either
//! method never pays a setup cost; routing itself does no I/O.

use std::sync::Arc;

use crate::analysis::generative::GenerativeAnalyzer;
use crate::analysis::heuristic::{DomainPolicy, HeuristicAnalyzer};
use crate::analysis::types::{AnalysisMethod, AnalysisResult, Message};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::llm::LlmProvider;

/// Holds one instance of each analyzer and routes by method.
pub struct AnalysisEngine {
    heuristic: HeuristicAnalyzer,
    generative: GenerativeAnalyzer,
}

impl AnalysisEngine {
    pub fn new(llm: Arc<dyn LlmProvider>, config: AnalysisConfig, policy: DomainPolicy) -> Self {
        Self {
            heuristic: HeuristicAnalyzer::new(policy.clone()),
            generative: GenerativeAnalyzer::new(llm, config, policy),
        }
    }

    /// Run the requested analyzer over the same input contract.
    pub async fn analyze(
        &self,
        messages: &[Message],
        method: AnalysisMethod,
    ) -> Result<AnalysisResult, AnalysisError> {
        match method {
            AnalysisMethod::Heuristic => Ok(self.heuristic.analyze(messages)),
            AnalysisMethod::Generative => self.generative.analyze(messages).await,
        }
    }
}
