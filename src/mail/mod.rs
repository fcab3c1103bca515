//! Mail provider integration — wire types, normalization, connector.

pub mod gmail;
pub mod normalizer;
pub mod types;

pub use gmail::GmailConnector;
pub use normalizer::normalize;
pub use types::RawMessage;

use async_trait::async_trait;

use crate::error::MailError;

/// Trait for mail provider connectors — pure I/O, no analysis logic.
///
/// Implementations return the provider's raw message shape; parsing
/// and scoring live in the normalizer and analyzers. Injected into the
/// pipeline rather than held as ambient global state.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Provider name (e.g. "gmail").
    fn name(&self) -> &str;

    /// Fetch all unread raw messages received within the lookback
    /// window, most recent first where the provider supports ordering.
    ///
    /// A message that fails to fetch individually is skipped, not
    /// fatal; only listing-level failures abort the call.
    async fn fetch_unread(&self, lookback_days: u32) -> Result<Vec<RawMessage>, MailError>;
}
