//! Per-invocation configuration, resolved from flags and `PK_*` environment
//! variables at the boundary so command handlers never read the environment
//! themselves.

use crate::cli::Args;
use pk_auth::password::{read_password_file, stdin_is_interactive};
use pk_auth::CredentialRequest;
use pk_core::{PkError, Result};
use std::env;
use std::path::PathBuf;

pub const ENV_NODE_PATH: &str = "PK_NODE_PATH";
pub const ENV_PASSWORD: &str = "PK_PASSWORD";
pub const ENV_PASSWORD_NEW: &str = "PK_PASSWORD_NEW";
pub const ENV_TOKEN: &str = "PK_TOKEN";

/// Everything a command handler needs to know about this invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub node_path: PathBuf,
    pub password_file: Option<PathBuf>,
    pub token_file: Option<PathBuf>,
}

impl Invocation {
    pub fn from_args(args: &Args) -> Result<Self> {
        let node_path = match &args.node_path {
            Some(path) => path.clone(),
            None => match env::var_os(ENV_NODE_PATH) {
                Some(path) if !path.is_empty() => PathBuf::from(path),
                _ => pk_core::paths::default_node_dir()?,
            },
        };

        if let Some(file) = &args.password_file {
            if !file.is_file() {
                return Err(PkError::Usage(format!(
                    "password file `{}` does not exist",
                    file.display()
                )));
            }
        }
        if let Some(file) = &args.token_file {
            if !file.is_file() {
                return Err(PkError::Usage(format!(
                    "token file `{}` does not exist",
                    file.display()
                )));
            }
        }

        Ok(Self {
            node_path,
            password_file: args.password_file.clone(),
            token_file: args.token_file.clone(),
        })
    }

    /// Gather credential inputs: `PK_TOKEN` over a token file, `PK_PASSWORD`
    /// over a password file, prompting left to the session gate.
    pub fn credential_request(&self) -> Result<CredentialRequest> {
        let token = match non_empty_var(ENV_TOKEN) {
            Some(token) => Some(token),
            None => match &self.token_file {
                Some(file) => Some(read_password_file(file)?),
                None => None,
            },
        };

        let password = match non_empty_var(ENV_PASSWORD) {
            Some(password) => Some(password),
            None => match &self.password_file {
                Some(file) => Some(read_password_file(file)?),
                None => None,
            },
        };

        Ok(CredentialRequest {
            token,
            password,
            interactive: stdin_is_interactive(),
        })
    }

    /// The replacement password for `agent password`, from `PK_PASSWORD_NEW`.
    pub fn new_password_from_env(&self) -> Option<String> {
        non_empty_var(ENV_PASSWORD_NEW)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}
