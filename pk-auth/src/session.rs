//! Per-invocation authentication decisions.
//!
//! A [`SessionGate`] is built fresh for every command from an explicit node
//! path and an engine handle; there is no ambient session state. Resolution
//! order for a gated command:
//!
//! 1. an explicitly supplied token, validated against the engine;
//! 2. the token stored under the node directory, used as-is;
//! 3. a supplied password, exchanged for a short-lived token;
//! 4. one interactive password prompt, if a terminal is attached;
//! 5. failure with `AuthenticationRequired`.
//!
//! Only `unlock` persists a token. A failed validation never mutates the
//! token file.

use crate::password::prompt_password;
use crate::token_store::TokenStore;
use pk_core::{PkError, Result};
use pk_engine::{Engine, SessionToken, StatusInfo};
use std::path::Path;
use tracing::debug;

/// Credential inputs gathered at the CLI boundary.
#[derive(Debug, Clone, Default)]
pub struct CredentialRequest {
    /// Out-of-band token (environment or token file).
    pub token: Option<String>,
    /// Supplied password (environment or password file).
    pub password: Option<String>,
    /// Whether an interactive prompt may be attempted as a last resort.
    pub interactive: bool,
}

impl CredentialRequest {
    /// Inputs for a non-interactive context with nothing supplied.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    ExplicitToken,
    StoredToken,
    Password,
}

/// The resolved outcome: a usable token plus where it came from.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: SessionToken,
    pub source: CredentialSource,
}

pub struct SessionGate<E: Engine> {
    store: TokenStore,
    engine: E,
}

impl<E: Engine> SessionGate<E> {
    pub fn new(node_dir: &Path, engine: E) -> Result<Self> {
        Ok(Self {
            store: TokenStore::new(node_dir)?,
            engine,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Resolve a credential for a generic gated command. Never persists.
    pub fn resolve(&self, request: &CredentialRequest) -> Result<Credential> {
        if let Some(raw) = &request.token {
            // An explicit token is authoritative: a mismatch fails the
            // command rather than falling back to other sources.
            self.engine.verify_token(raw)?;
            debug!("authenticated via explicit token");
            return Ok(Credential {
                token: SessionToken::new(raw.clone()),
                source: CredentialSource::ExplicitToken,
            });
        }

        if let Some(token) = self.store.read()? {
            debug!("authenticated via stored session token");
            return Ok(Credential {
                token,
                source: CredentialSource::StoredToken,
            });
        }

        self.authenticate_with_password(request)
    }

    /// `unlock`: authenticate and persist the session token.
    ///
    /// With `fresh`, the stored token is ignored and a re-authentication is
    /// forced; the old token is only replaced once the engine has accepted
    /// the new credential, so a failed attempt leaves it untouched.
    pub fn unlock(&self, request: &CredentialRequest, fresh: bool) -> Result<Credential> {
        if !fresh {
            if let Some(token) = self.store.read()? {
                debug!("session already unlocked");
                return Ok(Credential {
                    token,
                    source: CredentialSource::StoredToken,
                });
            }
        }

        let credential = if let Some(raw) = &request.token {
            self.engine.verify_token(raw)?;
            Credential {
                token: SessionToken::new(raw.clone()),
                source: CredentialSource::ExplicitToken,
            }
        } else {
            self.authenticate_with_password(request)?
        };

        self.store.create(&credential.token)?;
        Ok(credential)
    }

    /// `lock`: destroy the session token unconditionally. Idempotent.
    pub fn lock(&self) -> Result<()> {
        self.store.destroy()?;
        Ok(())
    }

    /// `status`: report engine liveness through a resolved credential,
    /// without mutating the token file.
    pub fn status(&self, request: &CredentialRequest) -> Result<StatusInfo> {
        let credential = self.resolve(request)?;
        Ok(self.engine.status(&credential.token)?)
    }

    /// Change the engine password. Requires an authenticated session.
    pub fn change_password(&self, request: &CredentialRequest, new_password: &str) -> Result<()> {
        let credential = self.resolve(request)?;
        self.engine.change_password(&credential.token, new_password)?;
        Ok(())
    }

    /// Tail of the resolution ladder: supplied password, one prompt, or
    /// failure.
    fn authenticate_with_password(&self, request: &CredentialRequest) -> Result<Credential> {
        let password = match request.password.clone() {
            Some(password) => password,
            None if request.interactive => prompt_password("Password")?,
            None => return Err(PkError::AuthenticationRequired),
        };

        let token = self.engine.verify_password(&password)?;
        debug!("authenticated via password");
        Ok(Credential {
            token,
            source: CredentialSource::Password,
        })
    }
}

/// Destroy the session token for a node directory without requiring an
/// engine connection; `lock` must work while the engine is down.
pub fn lock_node(node_dir: &Path) -> Result<()> {
    let store = TokenStore::new(node_dir)?;
    store.destroy()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pk_engine::mock::MemoryEngine;
    use tempfile::TempDir;

    fn gate(password: &str) -> (TempDir, SessionGate<MemoryEngine>) {
        let temp_dir = TempDir::new().expect("should create temp dir");
        let gate = SessionGate::new(temp_dir.path(), MemoryEngine::new(password))
            .expect("should build session gate");
        (temp_dir, gate)
    }

    fn with_password(password: &str) -> CredentialRequest {
        CredentialRequest {
            password: Some(password.to_string()),
            ..CredentialRequest::empty()
        }
    }

    #[test]
    fn no_credentials_and_no_terminal_fails_with_required() {
        let (_temp_dir, gate) = gate("hunter2");
        let err = gate
            .resolve(&CredentialRequest::empty())
            .expect_err("resolution should fail");
        assert!(matches!(err, PkError::AuthenticationRequired));
    }

    #[test]
    fn explicit_token_bypasses_the_store() {
        let (_temp_dir, gate) = gate("hunter2");
        // A stored token that the engine would reject: resolution must not
        // even look at it when an explicit token is supplied.
        gate.store
            .create(&SessionToken::new("stale-garbage"))
            .expect("should seed store");
        let captured = gate.engine().issue_token();

        let credential = gate
            .resolve(&CredentialRequest {
                token: Some(captured.as_str().to_string()),
                ..CredentialRequest::empty()
            })
            .expect("explicit token should authenticate");

        assert_eq!(credential.source, CredentialSource::ExplicitToken);
        assert_eq!(credential.token, captured);
        // Store untouched
        assert_eq!(
            gate.store.read().expect("read should succeed"),
            Some(SessionToken::new("stale-garbage"))
        );
    }

    #[test]
    fn invalid_explicit_token_fails_without_fallback() {
        let (_temp_dir, gate) = gate("hunter2");
        gate.store
            .create(&gate.engine().issue_token())
            .expect("should seed store with a valid token");

        let err = gate
            .resolve(&CredentialRequest {
                token: Some("forged".to_string()),
                password: Some("hunter2".to_string()),
                interactive: false,
            })
            .expect_err("forged token should fail");
        assert!(matches!(err, PkError::AuthenticationInvalid));
    }

    #[test]
    fn stored_token_is_used_without_revalidation() {
        let (_temp_dir, gate) = gate("hunter2");
        // Not registered with the engine at all; step 2 trusts the store.
        gate.store
            .create(&SessionToken::new("stored"))
            .expect("should seed store");

        let credential = gate
            .resolve(&CredentialRequest::empty())
            .expect("stored token should authenticate");
        assert_eq!(credential.source, CredentialSource::StoredToken);
        assert_eq!(credential.token, SessionToken::new("stored"));
    }

    #[test]
    fn stored_token_outranks_a_supplied_password() {
        let (_temp_dir, gate) = gate("hunter2");
        gate.store
            .create(&SessionToken::new("stored"))
            .expect("should seed store");

        let credential = gate
            .resolve(&with_password("hunter2"))
            .expect("resolution should succeed");
        assert_eq!(credential.source, CredentialSource::StoredToken);
    }

    #[test]
    fn password_resolution_does_not_persist() {
        let (_temp_dir, gate) = gate("hunter2");

        let credential = gate
            .resolve(&with_password("hunter2"))
            .expect("password should authenticate");
        assert_eq!(credential.source, CredentialSource::Password);
        gate.engine()
            .verify_token(credential.token.as_str())
            .expect("minted token should be valid");

        // Short-lived credential: nothing was written
        assert_eq!(gate.store.read().expect("read should succeed"), None);
    }

    #[test]
    fn wrong_password_is_invalid_not_required() {
        let (_temp_dir, gate) = gate("hunter2");
        let err = gate
            .resolve(&with_password("wrong"))
            .expect_err("wrong password should fail");
        assert!(matches!(err, PkError::AuthenticationInvalid));
    }

    #[test]
    fn unlock_persists_the_minted_token() {
        let (_temp_dir, gate) = gate("hunter2");

        let credential = gate
            .unlock(&with_password("hunter2"), false)
            .expect("unlock should succeed");
        assert_eq!(credential.source, CredentialSource::Password);
        assert_eq!(
            gate.store.read().expect("read should succeed"),
            Some(credential.token.clone())
        );

        // Round trip: a subsequent gated command needs no password
        let status = gate
            .status(&CredentialRequest::empty())
            .expect("status should succeed after unlock");
        assert_eq!(status.status, "LIVE");
    }

    #[test]
    fn unlock_with_existing_token_short_circuits() {
        let (_temp_dir, gate) = gate("hunter2");
        gate.store
            .create(&SessionToken::new("existing"))
            .expect("should seed store");

        // Even a wrong password is irrelevant: the session is already open.
        let credential = gate
            .unlock(&with_password("wrong"), false)
            .expect("unlock should short-circuit");
        assert_eq!(credential.source, CredentialSource::StoredToken);
    }

    #[test]
    fn fresh_unlock_forces_reauthentication() {
        let (_temp_dir, gate) = gate("hunter2");
        gate.store
            .create(&SessionToken::new("old"))
            .expect("should seed store");

        let credential = gate
            .unlock(&with_password("hunter2"), true)
            .expect("fresh unlock should succeed");
        assert_eq!(credential.source, CredentialSource::Password);
        assert_ne!(credential.token, SessionToken::new("old"));
        assert_eq!(
            gate.store.read().expect("read should succeed"),
            Some(credential.token)
        );
    }

    #[test]
    fn failed_unlock_leaves_the_existing_token_untouched() {
        let (_temp_dir, gate) = gate("hunter2");
        gate.store
            .create(&SessionToken::new("old"))
            .expect("should seed store");

        let err = gate
            .unlock(&with_password("wrong"), true)
            .expect_err("wrong password should fail");
        assert!(matches!(err, PkError::AuthenticationInvalid));
        assert_eq!(
            gate.store.read().expect("read should succeed"),
            Some(SessionToken::new("old"))
        );
    }

    #[test]
    fn lock_is_idempotent_and_leaves_no_token() {
        let (_temp_dir, gate) = gate("hunter2");
        gate.unlock(&with_password("hunter2"), false)
            .expect("unlock should succeed");

        gate.lock().expect("first lock should succeed");
        gate.lock().expect("second lock should succeed");
        assert_eq!(gate.store.read().expect("read should succeed"), None);

        // Next gated command is back to requiring credentials
        let err = gate
            .resolve(&CredentialRequest::empty())
            .expect_err("resolution should fail after lock");
        assert!(matches!(err, PkError::AuthenticationRequired));
    }

    #[test]
    fn change_password_requires_a_credential() {
        let (_temp_dir, gate) = gate("hunter2");
        gate.change_password(&with_password("hunter2"), "correct horse")
            .expect("password change should succeed");

        // Old password no longer mints tokens, the new one does
        assert!(matches!(
            gate.resolve(&with_password("hunter2")),
            Err(PkError::AuthenticationInvalid)
        ));
        gate.resolve(&with_password("correct horse"))
            .expect("new password should authenticate");
    }

    #[test]
    fn lock_node_works_without_an_engine() {
        let temp_dir = TempDir::new().expect("should create temp dir");
        let store = TokenStore::new(temp_dir.path()).expect("should open store");
        store
            .create(&SessionToken::new("t"))
            .expect("create should succeed");

        lock_node(temp_dir.path()).expect("lock should succeed");
        lock_node(temp_dir.path()).expect("repeat lock should succeed");
        assert_eq!(store.read().expect("read should succeed"), None);
    }
}
