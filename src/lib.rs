//! inbox-insight — ranked "what matters" view over unread mail.

pub mod analysis;
pub mod config;
pub mod error;
pub mod llm;
pub mod mail;
pub mod pipeline;
