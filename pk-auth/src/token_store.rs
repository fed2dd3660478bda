//! Single-slot persistence for the session token.
//!
//! One file per node data directory; its presence is the sole source of
//! truth for "a session is authenticated". Writes go through a temp file and
//! an atomic rename so a concurrent reader never observes a torn token.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use pk_engine::SessionToken;
use rand::RngCore;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name for the session token
const TOKEN_FILE: &str = "token";

/// File permissions for the token file
const TOKEN_FILE_PERMISSIONS: u32 = 0o600;

#[derive(Debug)]
pub struct TokenStore {
    node_dir: PathBuf,
    token_file: PathBuf,
}

impl TokenStore {
    /// Open the store for a node data directory, creating the directory with
    /// owner-only permissions when missing.
    pub fn new(node_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let node_dir = node_dir.into();
        pk_core::paths::ensure_node_dir(&node_dir)?;
        let token_file = node_dir.join(TOKEN_FILE);
        Ok(Self {
            node_dir,
            token_file,
        })
    }

    /// Write the token, replacing any existing one.
    ///
    /// The content lands in a temp file first and is renamed into place, so
    /// an interrupted write leaves the previous state intact.
    pub fn create(&self, token: &SessionToken) -> io::Result<()> {
        let mut temp_file = tempfile::Builder::new()
            .prefix(".token")
            .suffix(".tmp")
            .tempfile_in(&self.node_dir)?;
        temp_file.write_all(token.as_str().as_bytes())?;
        temp_file.flush()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(TOKEN_FILE_PERMISSIONS);
            temp_file.as_file().set_permissions(perms)?;
        }

        temp_file.persist(&self.token_file).map_err(|e| e.error)?;
        debug!(path = %self.token_file.display(), "session token written");
        Ok(())
    }

    /// Read the stored token. Absence is a normal outcome, not an error.
    pub fn read(&self) -> io::Result<Option<SessionToken>> {
        match fs::read_to_string(&self.token_file) {
            Ok(content) => {
                let trimmed = content.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(SessionToken::new(trimmed)))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove the token file. Destroying an absent token succeeds silently.
    pub fn destroy(&self) -> io::Result<()> {
        match fs::remove_file(&self.token_file) {
            Ok(()) => {
                debug!(path = %self.token_file.display(), "session token destroyed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Discard any existing token and write a freshly generated one.
    pub fn create_fresh(&self) -> io::Result<SessionToken> {
        let token = generate_token();
        self.create(&token)?;
        Ok(token)
    }

    pub fn path(&self) -> &Path {
        &self.token_file
    }
}

/// Generate a random token: 32 bytes of OS randomness, base64-encoded.
fn generate_token() -> SessionToken {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    SessionToken::new(STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, TokenStore) {
        let temp_dir = TempDir::new().expect("should create temp dir");
        let store =
            TokenStore::new(temp_dir.path().join("node")).expect("should open token store");
        (temp_dir, store)
    }

    #[test]
    fn read_of_missing_token_is_none() {
        let (_temp_dir, store) = store();
        assert_eq!(store.read().expect("read should succeed"), None);
    }

    #[test]
    fn create_then_read_round_trips() {
        let (_temp_dir, store) = store();
        let token = SessionToken::new("opaque-bearer-value");

        store.create(&token).expect("create should succeed");
        assert_eq!(store.read().expect("read should succeed"), Some(token));
    }

    #[test]
    fn create_replaces_an_existing_token() {
        let (_temp_dir, store) = store();
        store
            .create(&SessionToken::new("first"))
            .expect("create should succeed");
        store
            .create(&SessionToken::new("second"))
            .expect("replace should succeed");

        assert_eq!(
            store.read().expect("read should succeed"),
            Some(SessionToken::new("second"))
        );
    }

    #[test]
    fn destroy_is_idempotent() {
        let (_temp_dir, store) = store();
        store
            .create(&SessionToken::new("t"))
            .expect("create should succeed");

        store.destroy().expect("first destroy should succeed");
        store.destroy().expect("second destroy should succeed");
        assert_eq!(store.read().expect("read should succeed"), None);
    }

    #[test]
    fn create_fresh_always_replaces() {
        let (_temp_dir, store) = store();
        store
            .create(&SessionToken::new("old"))
            .expect("create should succeed");

        let fresh = store.create_fresh().expect("fresh should succeed");
        assert_ne!(fresh, SessionToken::new("old"));
        assert_eq!(store.read().expect("read should succeed"), Some(fresh));

        let another = store.create_fresh().expect("second fresh should succeed");
        assert_eq!(store.read().expect("read should succeed"), Some(another));
    }

    #[test]
    fn stray_temp_file_never_shadows_the_token() {
        // A writer killed between the temp write and the rename leaves a
        // `.token*.tmp` file behind; reads must still see the old state.
        let (_temp_dir, store) = store();
        store
            .create(&SessionToken::new("committed"))
            .expect("create should succeed");
        fs::write(store.node_dir.join(".token-interrupted.tmp"), "truncat")
            .expect("should write stray temp file");

        assert_eq!(
            store.read().expect("read should succeed"),
            Some(SessionToken::new("committed"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp_dir, store) = store();
        store
            .create(&SessionToken::new("t"))
            .expect("create should succeed");

        let mode = fs::metadata(store.path())
            .expect("should stat token file")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, TOKEN_FILE_PERMISSIONS);
    }

    #[test]
    fn generated_tokens_are_distinct() {
        assert_ne!(generate_token(), generate_token());
    }
}
