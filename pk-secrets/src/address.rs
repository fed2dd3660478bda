//! The `vaultName:secretPath[=envVarName]` grammar.
//!
//! The first `:` separates the vault name from the remainder. Within the
//! remainder, a backslash makes an immediately following NUL, `\`, `/` or `=`
//! literal; any other backslash passes through unchanged. The last unescaped
//! `=` whose right-hand side is a valid environment variable name separates
//! the secret path from the binding; a malformed right-hand side folds the
//! `=` back into the path as literal content.

use pk_core::PkError;
use std::fmt::{self, Write as _};
use std::str::FromStr;
use thiserror::Error;

/// A parsed secret address, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretAddress {
    vault_name: String,
    secret_path: String,
    env_var_name: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid secret address `{token}` at byte {offset}: {kind}")]
pub struct AddressSyntaxError {
    pub token: String,
    pub offset: usize,
    pub kind: AddressErrorKind,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressErrorKind {
    #[error("expected `:` between vault name and secret path")]
    MissingVaultSeparator,
    #[error("vault name is empty")]
    EmptyVaultName,
    #[error("vault name contains an invalid character")]
    InvalidVaultName,
    #[error("secret path is empty")]
    EmptySecretPath,
    #[error("secret path contains an unescaped NUL byte")]
    NulInPath,
    #[error("environment variable name is empty")]
    EmptyEnvVar,
}

fn is_vault_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn is_env_var_name(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b == b'_' || b.is_ascii_alphabetic() => {}
        _ => return false,
    }
    bytes.all(|b| b == b'_' || b.is_ascii_alphanumeric())
}

impl SecretAddress {
    /// Parse a raw CLI token.
    pub fn parse(token: &str) -> Result<Self, AddressSyntaxError> {
        let err = |offset: usize, kind: AddressErrorKind| AddressSyntaxError {
            token: token.to_string(),
            offset,
            kind,
        };

        let colon = token
            .find(':')
            .ok_or_else(|| err(token.len(), AddressErrorKind::MissingVaultSeparator))?;
        let vault_name = &token[..colon];
        if vault_name.is_empty() {
            return Err(err(0, AddressErrorKind::EmptyVaultName));
        }
        if let Some((offset, _)) = vault_name.char_indices().find(|(_, c)| !is_vault_char(*c)) {
            return Err(err(offset, AddressErrorKind::InvalidVaultName));
        }

        let rest = &token[colon + 1..];
        let base = colon + 1;

        // One pass: unescape the remainder and record where unescaped `=`
        // land, both in the output and in the source token.
        let mut unescaped = String::with_capacity(rest.len());
        let mut separators: Vec<(usize, usize)> = Vec::new();
        let mut chars = rest.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.peek().copied() {
                    Some((_, next @ ('\0' | '\\' | '/' | '='))) => {
                        chars.next();
                        unescaped.push(next);
                    }
                    _ => unescaped.push('\\'),
                },
                '\0' => return Err(err(base + i, AddressErrorKind::NulInPath)),
                '=' => {
                    separators.push((unescaped.len(), base + i));
                    unescaped.push('=');
                }
                _ => unescaped.push(c),
            }
        }

        let (secret_path, env_var_name) = match separators.last().copied() {
            None => (unescaped, None),
            Some((out_pos, src_offset)) => {
                let candidate = &unescaped[out_pos + 1..];
                if candidate.is_empty() {
                    return Err(err(src_offset, AddressErrorKind::EmptyEnvVar));
                }
                if is_env_var_name(candidate) {
                    (unescaped[..out_pos].to_string(), Some(candidate.to_string()))
                } else {
                    // Not a binding after all: the `=` stays literal content.
                    (unescaped, None)
                }
            }
        };

        if secret_path.is_empty() {
            return Err(err(base, AddressErrorKind::EmptySecretPath));
        }

        Ok(Self {
            vault_name: vault_name.to_string(),
            secret_path,
            env_var_name,
        })
    }

    /// Construct an address directly, bypassing the string grammar but not
    /// its validation. Used by directory expansion.
    pub fn new(
        vault_name: impl Into<String>,
        secret_path: impl Into<String>,
    ) -> Result<Self, AddressSyntaxError> {
        let vault_name = vault_name.into();
        let secret_path = secret_path.into();
        let err = |offset: usize, kind: AddressErrorKind| AddressSyntaxError {
            token: format!("{vault_name}:{secret_path}"),
            offset,
            kind,
        };

        if vault_name.is_empty() {
            return Err(err(0, AddressErrorKind::EmptyVaultName));
        }
        if let Some((offset, _)) = vault_name.char_indices().find(|(_, c)| !is_vault_char(*c)) {
            return Err(err(offset, AddressErrorKind::InvalidVaultName));
        }
        if secret_path.is_empty() {
            return Err(err(vault_name.len() + 1, AddressErrorKind::EmptySecretPath));
        }

        Ok(Self {
            vault_name,
            secret_path,
            env_var_name: None,
        })
    }

    pub fn vault_name(&self) -> &str {
        &self.vault_name
    }

    pub fn secret_path(&self) -> &str {
        &self.secret_path
    }

    pub fn env_var_name(&self) -> Option<&str> {
        self.env_var_name.as_deref()
    }
}

/// Check a bare vault-name argument against the address grammar.
pub fn is_valid_vault_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_vault_char)
}

impl FromStr for SecretAddress {
    type Err = AddressSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SecretAddress::parse(s)
    }
}

impl fmt::Display for SecretAddress {
    /// Renders with enough escaping that the output re-parses to the same
    /// address.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.vault_name)?;
        for c in self.secret_path.chars() {
            match c {
                '\\' | '=' | '\0' => {
                    f.write_char('\\')?;
                    f.write_char(c)?;
                }
                _ => f.write_char(c)?,
            }
        }
        if let Some(env) = &self.env_var_name {
            write!(f, "={env}")?;
        }
        Ok(())
    }
}

impl From<AddressSyntaxError> for PkError {
    fn from(err: AddressSyntaxError) -> Self {
        PkError::Usage(err.to_string())
    }
}
