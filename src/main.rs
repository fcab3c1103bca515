use std::sync::Arc;

use futures::StreamExt;

use inbox_insight::analysis::types::AnalysisMethod;
use inbox_insight::analysis::{AnalysisEngine, DomainPolicy};
use inbox_insight::config::{AnalysisConfig, MailConfig};
use inbox_insight::llm::{LlmConfig, create_provider};
use inbox_insight::mail::GmailConnector;
use inbox_insight::pipeline::{AnalysisRequest, InsightPipeline, ProgressEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_else(|_| {
        eprintln!("Error: ANTHROPIC_API_KEY not set");
        eprintln!("  export ANTHROPIC_API_KEY=sk-ant-...");
        std::process::exit(1);
    });

    let mail_config = MailConfig::from_env().unwrap_or_else(|| {
        eprintln!("Error: INSIGHT_MAIL_TOKEN not set");
        eprintln!("  export INSIGHT_MAIL_TOKEN=<gmail oauth access token>");
        std::process::exit(1);
    });

    let analysis_config = AnalysisConfig::from_env();

    let lookback_days: i64 = std::env::var("INSIGHT_LOOKBACK_DAYS")
        .unwrap_or_else(|_| "7".to_string())
        .parse()
        .unwrap_or(7);

    let method: AnalysisMethod = std::env::var("INSIGHT_METHOD")
        .unwrap_or_else(|_| "generative".to_string())
        .parse()
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    eprintln!("📬 Inbox Insight v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", analysis_config.model);
    eprintln!("   Method: {}", method.label());
    eprintln!("   Lookback: {} day(s)\n", lookback_days);

    let llm = create_provider(&LlmConfig {
        api_key: secrecy::SecretString::from(api_key),
        model: analysis_config.model.clone(),
        base_url: None,
    })?;

    let connector = Arc::new(GmailConnector::new(mail_config)?);
    let engine = AnalysisEngine::new(llm, analysis_config, DomainPolicy::default());
    let pipeline = InsightPipeline::new(connector, engine);

    let mut events = pipeline.run(AnalysisRequest {
        lookback_days,
        method,
    })?;

    // One JSON line per event; the terminal event decides the exit code.
    let mut failed = false;
    while let Some(event) = events.next().await {
        if let ProgressEvent::Error { .. } = event {
            failed = true;
        }
        println!("{}", serde_json::to_string(&event)?);
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
