//! Secret command handlers.
//!
//! Addresses are parsed before anything touches the engine, so a malformed
//! argument fails as a usage error with no partial mutation.

use crate::cli::SecretsSubcommand;
use crate::config::Invocation;
use pk_auth::{Credential, SessionGate};
use pk_core::{pk_println, pk_success, PkError, Result};
use pk_engine::{Engine, HttpEngine};
use pk_secrets::{address::is_valid_vault_name, expand_directory, SecretAddress};
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn handle_secrets_command(command: &SecretsSubcommand, invocation: &Invocation) -> Result<()> {
    match command {
        SecretsSubcommand::Create {
            local_path,
            address,
        } => handle_create(invocation, local_path, address),
        SecretsSubcommand::Update {
            local_path,
            address,
        } => handle_update(invocation, local_path, address),
        SecretsSubcommand::Get { address } => handle_get(invocation, address),
        SecretsSubcommand::Delete { address } => handle_delete(invocation, address),
        SecretsSubcommand::List { vault_name } => handle_list(invocation, vault_name),
        SecretsSubcommand::Dir {
            directory,
            vault_name,
        } => handle_dir(invocation, directory, vault_name),
        SecretsSubcommand::Env { addresses, command } => {
            handle_env(invocation, addresses, command)
        }
    }
}

/// Connect to the engine and resolve a credential for this invocation.
fn authenticate(invocation: &Invocation) -> Result<(SessionGate<HttpEngine>, Credential)> {
    let engine = HttpEngine::connect(&invocation.node_path)?;
    let gate = SessionGate::new(&invocation.node_path, engine)?;
    let request = invocation.credential_request()?;
    let credential = gate.resolve(&request)?;
    Ok((gate, credential))
}

fn handle_create(invocation: &Invocation, local_path: &Path, address: &str) -> Result<()> {
    let address: SecretAddress = address.parse()?;
    let content = fs::read(local_path)?;

    let (gate, credential) = authenticate(invocation)?;
    gate.engine().create_secret(
        &credential.token,
        address.vault_name(),
        address.secret_path(),
        &content,
    )?;
    pk_success!("Created secret {}", address);
    Ok(())
}

fn handle_update(invocation: &Invocation, local_path: &Path, address: &str) -> Result<()> {
    let address: SecretAddress = address.parse()?;
    let content = fs::read(local_path)?;

    let (gate, credential) = authenticate(invocation)?;
    gate.engine().update_secret(
        &credential.token,
        address.vault_name(),
        address.secret_path(),
        &content,
    )?;
    pk_success!("Updated secret {}", address);
    Ok(())
}

fn handle_get(invocation: &Invocation, address: &str) -> Result<()> {
    let address: SecretAddress = address.parse()?;

    let (gate, credential) = authenticate(invocation)?;
    let content = gate.engine().get_secret(
        &credential.token,
        address.vault_name(),
        address.secret_path(),
    )?;

    // Raw bytes to stdout; the secret may not be text
    std::io::stdout().write_all(&content)?;
    Ok(())
}

fn handle_delete(invocation: &Invocation, address: &str) -> Result<()> {
    let address: SecretAddress = address.parse()?;

    let (gate, credential) = authenticate(invocation)?;
    gate.engine().delete_secret(
        &credential.token,
        address.vault_name(),
        address.secret_path(),
    )?;
    pk_success!("Deleted secret {}", address);
    Ok(())
}

fn handle_list(invocation: &Invocation, vault_name: &str) -> Result<()> {
    if !is_valid_vault_name(vault_name) {
        return Err(PkError::Usage(format!("invalid vault name `{vault_name}`")));
    }

    let (gate, credential) = authenticate(invocation)?;
    let secrets = gate.engine().list_secrets(&credential.token, vault_name)?;
    for path in secrets {
        pk_println!("{}", path);
    }
    Ok(())
}

fn handle_dir(invocation: &Invocation, directory: &Path, vault_name: &str) -> Result<()> {
    let addresses = expand_directory(directory, vault_name)?;
    if addresses.is_empty() {
        pk_println!("No files found under {}", directory.display());
        return Ok(());
    }

    let (gate, credential) = authenticate(invocation)?;
    let mut entries = Vec::with_capacity(addresses.len());
    for address in &addresses {
        let content = fs::read(directory.join(address.secret_path()))?;
        entries.push((address.secret_path().to_string(), content));
    }
    gate.engine()
        .import_directory(&credential.token, vault_name, &entries)?;
    pk_success!("Imported {} secrets into {}", entries.len(), vault_name);
    Ok(())
}

fn handle_env(invocation: &Invocation, addresses: &[String], command: &[String]) -> Result<()> {
    // All addresses must parse before any engine call
    let addresses: Vec<SecretAddress> = addresses
        .iter()
        .map(|raw| raw.parse())
        .collect::<std::result::Result<_, _>>()?;
    let (program, args) = command
        .split_first()
        .ok_or_else(|| PkError::Usage("no command to run after `--`".to_string()))?;

    let (gate, credential) = authenticate(invocation)?;
    let mut env_vars = Vec::with_capacity(addresses.len());
    for address in &addresses {
        let content = gate.engine().get_secret(
            &credential.token,
            address.vault_name(),
            address.secret_path(),
        )?;
        let value = String::from_utf8(content).map_err(|_| {
            PkError::Engine(format!("secret {address} is not valid UTF-8"))
        })?;
        let name = match address.env_var_name() {
            Some(name) => name.to_string(),
            None => default_env_name(address.secret_path()),
        };
        env_vars.push((name, value));
    }

    let mut expression = duct::cmd(program.as_str(), args).unchecked();
    for (name, value) in env_vars {
        expression = expression.env(name, value);
    }
    let output = expression.run()?;

    if !output.status.success() {
        std::process::exit(output.status.code().unwrap_or(1));
    }
    Ok(())
}

/// Variable name for an unbound address: last path segment, upper-cased,
/// with anything outside `[A-Za-z0-9]` mapped to `_`.
fn default_env_name(secret_path: &str) -> String {
    let segment = secret_path.rsplit('/').next().unwrap_or(secret_path);
    let mut name: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_env_names_are_valid_identifiers() {
        assert_eq!(default_env_name("db/password"), "PASSWORD");
        assert_eq!(default_env_name("api-key.prod"), "API_KEY_PROD");
        assert_eq!(default_env_name("9lives"), "_9LIVES");
        assert_eq!(default_env_name("single"), "SINGLE");
    }
}
