//! The engine interface and its HTTP implementation.

use crate::error::EngineError;
use crate::types::{
    AgentInfo, ImportEntry, PasswordChangeRequest, SecretListResponse, SessionToken,
    StatusInfo, UnlockRequest, UnlockResponse,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use std::fs;
use std::path::Path;
use tracing::debug;

/// File a running engine writes into the node data directory when it binds.
pub const AGENT_INFO_FILE: &str = "agent.json";

/// The calls this CLI makes against the external engine.
pub trait Engine {
    /// Validate a password and mint a session token.
    fn verify_password(&self, password: &str) -> Result<SessionToken, EngineError>;

    /// Check that an out-of-band token is currently valid.
    fn verify_token(&self, token: &str) -> Result<(), EngineError>;

    /// Change the engine password. Requires an authenticated session.
    fn change_password(&self, token: &SessionToken, new_password: &str)
        -> Result<(), EngineError>;

    /// Report engine liveness.
    fn status(&self, token: &SessionToken) -> Result<StatusInfo, EngineError>;

    /// Import a new secret. Fails if the path already exists.
    fn create_secret(
        &self,
        token: &SessionToken,
        vault: &str,
        path: &str,
        content: &[u8],
    ) -> Result<(), EngineError>;

    /// Replace an existing secret. Fails if the path does not exist.
    fn update_secret(
        &self,
        token: &SessionToken,
        vault: &str,
        path: &str,
        content: &[u8],
    ) -> Result<(), EngineError>;

    fn get_secret(
        &self,
        token: &SessionToken,
        vault: &str,
        path: &str,
    ) -> Result<Vec<u8>, EngineError>;

    fn delete_secret(
        &self,
        token: &SessionToken,
        vault: &str,
        path: &str,
    ) -> Result<(), EngineError>;

    fn list_secrets(
        &self,
        token: &SessionToken,
        vault: &str,
    ) -> Result<Vec<String>, EngineError>;

    /// Bulk-import many secrets in one call.
    fn import_directory(
        &self,
        token: &SessionToken,
        vault: &str,
        entries: &[(String, Vec<u8>)],
    ) -> Result<(), EngineError>;
}

/// HTTP client for a locally running engine.
#[derive(Debug)]
pub struct HttpEngine {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpEngine {
    /// Discover the engine through `<node>/agent.json`.
    ///
    /// A missing info file means no engine is serving this node directory;
    /// that is reported as `NotRunning`, not as an I/O error.
    pub fn connect(node_dir: &Path) -> Result<Self, EngineError> {
        let info_path = node_dir.join(AGENT_INFO_FILE);
        let content = match fs::read_to_string(&info_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::NotRunning {
                    path: node_dir.to_path_buf(),
                });
            }
            Err(e) => return Err(EngineError::Io(e)),
        };
        let info: AgentInfo = serde_json::from_str(&content)?;
        debug!(url = %info.url, pid = info.pid, "connected to agent");

        Ok(Self {
            base_url: info.url.trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::new(),
        })
    }

    fn protocol_error(response: reqwest::blocking::Response) -> EngineError {
        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        EngineError::Protocol { status, body }
    }
}

impl Engine for HttpEngine {
    fn verify_password(&self, password: &str) -> Result<SessionToken, EngineError> {
        let url = format!("{}/session/unlock", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&UnlockRequest { password })
            .send()?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(EngineError::AuthInvalid);
        }
        if !response.status().is_success() {
            return Err(Self::protocol_error(response));
        }
        let body: UnlockResponse = response.json()?;
        Ok(SessionToken::new(body.token))
    }

    fn verify_token(&self, token: &str) -> Result<(), EngineError> {
        let url = format!("{}/session", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {token}"))
            .send()?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(EngineError::AuthInvalid),
            s if s.is_success() => Ok(()),
            _ => Err(Self::protocol_error(response)),
        }
    }

    fn change_password(
        &self,
        token: &SessionToken,
        new_password: &str,
    ) -> Result<(), EngineError> {
        let url = format!("{}/session/password", self.base_url);
        let response = self
            .client
            .put(&url)
            .header("Authorization", format!("Bearer {}", token.as_str()))
            .json(&PasswordChangeRequest {
                password: new_password,
            })
            .send()?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(EngineError::AuthInvalid),
            s if s.is_success() => Ok(()),
            _ => Err(Self::protocol_error(response)),
        }
    }

    fn status(&self, token: &SessionToken) -> Result<StatusInfo, EngineError> {
        let url = format!("{}/status", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token.as_str()))
            .send()?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(EngineError::AuthInvalid),
            s if s.is_success() => Ok(response.json()?),
            _ => Err(Self::protocol_error(response)),
        }
    }

    fn create_secret(
        &self,
        token: &SessionToken,
        vault: &str,
        path: &str,
        content: &[u8],
    ) -> Result<(), EngineError> {
        let url = format!("{}/vaults/{vault}/secrets/{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token.as_str()))
            .body(content.to_vec())
            .send()?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(EngineError::AuthInvalid),
            StatusCode::CONFLICT => Err(EngineError::AlreadyExists(format!("{vault}:{path}"))),
            s if s.is_success() => Ok(()),
            _ => Err(Self::protocol_error(response)),
        }
    }

    fn update_secret(
        &self,
        token: &SessionToken,
        vault: &str,
        path: &str,
        content: &[u8],
    ) -> Result<(), EngineError> {
        let url = format!("{}/vaults/{vault}/secrets/{path}", self.base_url);
        let response = self
            .client
            .put(&url)
            .header("Authorization", format!("Bearer {}", token.as_str()))
            .body(content.to_vec())
            .send()?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(EngineError::AuthInvalid),
            StatusCode::NOT_FOUND => Err(EngineError::NotFound(format!("{vault}:{path}"))),
            s if s.is_success() => Ok(()),
            _ => Err(Self::protocol_error(response)),
        }
    }

    fn get_secret(
        &self,
        token: &SessionToken,
        vault: &str,
        path: &str,
    ) -> Result<Vec<u8>, EngineError> {
        let url = format!("{}/vaults/{vault}/secrets/{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token.as_str()))
            .send()?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(EngineError::AuthInvalid),
            StatusCode::NOT_FOUND => Err(EngineError::NotFound(format!("{vault}:{path}"))),
            s if s.is_success() => Ok(response.bytes()?.to_vec()),
            _ => Err(Self::protocol_error(response)),
        }
    }

    fn delete_secret(
        &self,
        token: &SessionToken,
        vault: &str,
        path: &str,
    ) -> Result<(), EngineError> {
        let url = format!("{}/vaults/{vault}/secrets/{path}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .header("Authorization", format!("Bearer {}", token.as_str()))
            .send()?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(EngineError::AuthInvalid),
            StatusCode::NOT_FOUND => Err(EngineError::NotFound(format!("{vault}:{path}"))),
            s if s.is_success() => Ok(()),
            _ => Err(Self::protocol_error(response)),
        }
    }

    fn list_secrets(
        &self,
        token: &SessionToken,
        vault: &str,
    ) -> Result<Vec<String>, EngineError> {
        let url = format!("{}/vaults/{vault}/secrets", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token.as_str()))
            .send()?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(EngineError::AuthInvalid),
            StatusCode::NOT_FOUND => Err(EngineError::NotFound(vault.to_string())),
            s if s.is_success() => {
                let body: SecretListResponse = response.json()?;
                Ok(body.secrets)
            }
            _ => Err(Self::protocol_error(response)),
        }
    }

    fn import_directory(
        &self,
        token: &SessionToken,
        vault: &str,
        entries: &[(String, Vec<u8>)],
    ) -> Result<(), EngineError> {
        let url = format!("{}/vaults/{vault}/import", self.base_url);
        let body: Vec<ImportEntry> = entries
            .iter()
            .map(|(path, content)| ImportEntry {
                path,
                content: STANDARD.encode(content),
            })
            .collect();

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token.as_str()))
            .json(&body)
            .send()?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(EngineError::AuthInvalid),
            s if s.is_success() => Ok(()),
            _ => Err(Self::protocol_error(response)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn connect_reports_not_running_when_info_file_is_absent() {
        let temp_dir = TempDir::new().expect("should create temp dir");

        let err = HttpEngine::connect(temp_dir.path()).expect_err("connect should fail");
        assert!(matches!(err, EngineError::NotRunning { .. }));
    }

    #[test]
    fn connect_rejects_malformed_agent_info() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        std::fs::write(temp_dir.path().join(AGENT_INFO_FILE), "not json")
            .expect("should write agent info");

        let err = HttpEngine::connect(temp_dir.path()).expect_err("connect should fail");
        assert!(matches!(err, EngineError::Serialization(_)));
    }

    #[test]
    fn connect_reads_published_url() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        std::fs::write(
            temp_dir.path().join(AGENT_INFO_FILE),
            r#"{"url": "http://127.0.0.1:1234/", "pid": 42}"#,
        )
        .expect("should write agent info");

        let engine = HttpEngine::connect(temp_dir.path()).expect("connect should succeed");
        assert_eq!(engine.base_url, "http://127.0.0.1:1234");
    }
}
