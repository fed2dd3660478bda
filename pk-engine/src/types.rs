//! Wire types shared with the engine.

use serde::{Deserialize, Serialize};

/// Opaque bearer token for an authenticated session.
///
/// The engine mints these; the CLI stores and forwards them without ever
/// inspecting the contents. No `Display` impl so a token cannot end up in
/// log output by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Connection details a running engine publishes under `<node>/agent.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentInfo {
    pub url: String,
    pub pid: u32,
}

/// Engine-reported liveness and identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UnlockRequest<'a> {
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnlockResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordChangeRequest<'a> {
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SecretListResponse {
    pub secrets: Vec<String>,
}

/// One file in a bulk directory import.
#[derive(Debug, Serialize)]
pub(crate) struct ImportEntry<'a> {
    pub path: &'a str,
    /// File contents, base64-encoded.
    pub content: String,
}
