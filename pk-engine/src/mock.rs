//! In-memory engine double for tests.
//!
//! Replaces the HTTP round-trip with a process-local map so consumers of the
//! [`Engine`] trait can be tested without a running engine.

use crate::client::Engine;
use crate::error::EngineError;
use crate::types::{SessionToken, StatusInfo};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};

pub struct MemoryEngine {
    password: RefCell<String>,
    valid_tokens: RefCell<HashSet<String>>,
    vaults: RefCell<HashMap<String, BTreeMap<String, Vec<u8>>>>,
    minted: RefCell<u64>,
}

impl MemoryEngine {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: RefCell::new(password.into()),
            valid_tokens: RefCell::new(HashSet::new()),
            vaults: RefCell::new(HashMap::new()),
            minted: RefCell::new(0),
        }
    }

    /// Mint a token that the engine will accept, without a password check.
    /// Stands in for a token captured from an earlier session.
    pub fn issue_token(&self) -> SessionToken {
        let mut minted = self.minted.borrow_mut();
        *minted += 1;
        let token = format!("mock-token-{minted}");
        self.valid_tokens.borrow_mut().insert(token.clone());
        SessionToken::new(token)
    }

    /// Test inspection: the stored bytes for a secret, if any.
    pub fn secret(&self, vault: &str, path: &str) -> Option<Vec<u8>> {
        self.vaults
            .borrow()
            .get(vault)
            .and_then(|secrets| secrets.get(path))
            .cloned()
    }

    fn check(&self, token: &SessionToken) -> Result<(), EngineError> {
        if self.valid_tokens.borrow().contains(token.as_str()) {
            Ok(())
        } else {
            Err(EngineError::AuthInvalid)
        }
    }
}

impl Engine for MemoryEngine {
    fn verify_password(&self, password: &str) -> Result<SessionToken, EngineError> {
        if *self.password.borrow() == password {
            Ok(self.issue_token())
        } else {
            Err(EngineError::AuthInvalid)
        }
    }

    fn verify_token(&self, token: &str) -> Result<(), EngineError> {
        if self.valid_tokens.borrow().contains(token) {
            Ok(())
        } else {
            Err(EngineError::AuthInvalid)
        }
    }

    fn change_password(
        &self,
        token: &SessionToken,
        new_password: &str,
    ) -> Result<(), EngineError> {
        self.check(token)?;
        *self.password.borrow_mut() = new_password.to_string();
        Ok(())
    }

    fn status(&self, token: &SessionToken) -> Result<StatusInfo, EngineError> {
        self.check(token)?;
        Ok(StatusInfo {
            status: "LIVE".to_string(),
            pid: Some(std::process::id()),
            node_id: Some("mock-node".to_string()),
        })
    }

    fn create_secret(
        &self,
        token: &SessionToken,
        vault: &str,
        path: &str,
        content: &[u8],
    ) -> Result<(), EngineError> {
        self.check(token)?;
        let mut vaults = self.vaults.borrow_mut();
        let secrets = vaults.entry(vault.to_string()).or_default();
        if secrets.contains_key(path) {
            return Err(EngineError::AlreadyExists(format!("{vault}:{path}")));
        }
        secrets.insert(path.to_string(), content.to_vec());
        Ok(())
    }

    fn update_secret(
        &self,
        token: &SessionToken,
        vault: &str,
        path: &str,
        content: &[u8],
    ) -> Result<(), EngineError> {
        self.check(token)?;
        let mut vaults = self.vaults.borrow_mut();
        let secrets = vaults
            .get_mut(vault)
            .ok_or_else(|| EngineError::NotFound(vault.to_string()))?;
        match secrets.get_mut(path) {
            Some(existing) => {
                *existing = content.to_vec();
                Ok(())
            }
            None => Err(EngineError::NotFound(format!("{vault}:{path}"))),
        }
    }

    fn get_secret(
        &self,
        token: &SessionToken,
        vault: &str,
        path: &str,
    ) -> Result<Vec<u8>, EngineError> {
        self.check(token)?;
        self.secret(vault, path)
            .ok_or_else(|| EngineError::NotFound(format!("{vault}:{path}")))
    }

    fn delete_secret(
        &self,
        token: &SessionToken,
        vault: &str,
        path: &str,
    ) -> Result<(), EngineError> {
        self.check(token)?;
        let mut vaults = self.vaults.borrow_mut();
        let removed = vaults
            .get_mut(vault)
            .and_then(|secrets| secrets.remove(path))
            .is_some();
        if removed {
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("{vault}:{path}")))
        }
    }

    fn list_secrets(
        &self,
        token: &SessionToken,
        vault: &str,
    ) -> Result<Vec<String>, EngineError> {
        self.check(token)?;
        let vaults = self.vaults.borrow();
        let secrets = vaults
            .get(vault)
            .ok_or_else(|| EngineError::NotFound(vault.to_string()))?;
        Ok(secrets.keys().cloned().collect())
    }

    fn import_directory(
        &self,
        token: &SessionToken,
        vault: &str,
        entries: &[(String, Vec<u8>)],
    ) -> Result<(), EngineError> {
        self.check(token)?;
        let mut vaults = self.vaults.borrow_mut();
        let secrets = vaults.entry(vault.to_string()).or_default();
        for (path, content) in entries {
            secrets.insert(path.clone(), content.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_mints_a_valid_token() {
        let engine = MemoryEngine::new("hunter2");

        let token = engine
            .verify_password("hunter2")
            .expect("correct password should mint a token");
        engine
            .verify_token(token.as_str())
            .expect("minted token should verify");

        assert!(matches!(
            engine.verify_password("wrong"),
            Err(EngineError::AuthInvalid)
        ));
    }

    #[test]
    fn create_conflicts_and_update_requires_existence() {
        let engine = MemoryEngine::new("hunter2");
        let token = engine.issue_token();

        engine
            .create_secret(&token, "vault", "a/b", b"one")
            .expect("create should succeed");
        assert!(matches!(
            engine.create_secret(&token, "vault", "a/b", b"two"),
            Err(EngineError::AlreadyExists(_))
        ));

        engine
            .update_secret(&token, "vault", "a/b", b"two")
            .expect("update should succeed");
        assert_eq!(engine.secret("vault", "a/b"), Some(b"two".to_vec()));

        assert!(matches!(
            engine.update_secret(&token, "vault", "missing", b"x"),
            Err(EngineError::NotFound(_))
        ));
    }
}
