//! Wire types for the mail provider's message format.
//!
//! Mirrors the provider JSON shape exactly: a message carries an `id`,
//! a short `snippet`, and a `payload` holding headers plus either a
//! direct base64url body or a nested `parts` list of the same shape.

use serde::{Deserialize, Serialize};

/// One raw message as returned by the provider's fetch call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub id: String,
    /// Provider-generated short preview.
    #[serde(default)]
    pub snippet: String,
    /// Root of the MIME part tree. Absent on truly broken messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<RawPart>,
}

/// One node of the part tree. The root payload and nested parts share
/// this shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPart {
    #[serde(default, rename = "mimeType")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<RawHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RawBody>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<RawPart>,
}

/// A single `{name, value}` header pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawHeader {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Body payload carrying URL-safe base64 data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Response shape of the provider's listing call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessageList {
    #[serde(default)]
    pub messages: Vec<RawMessageRef>,
}

/// One entry of the listing response — id only, body fetched separately.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessageRef {
    #[serde(default)]
    pub id: String,
}
