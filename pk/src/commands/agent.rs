//! Session command handlers: lock, unlock, status, password.

use crate::cli::{AgentSubcommand, OutputFormat};
use crate::config::Invocation;
use pk_auth::password::prompt_password;
use pk_auth::SessionGate;
use pk_core::{pk_println, pk_success, PkError, Result};
use pk_engine::{EngineError, HttpEngine};
use serde::Serialize;

pub fn handle_agent_command(command: &AgentSubcommand, invocation: &Invocation) -> Result<()> {
    match command {
        AgentSubcommand::Lock => handle_lock(invocation),
        AgentSubcommand::Unlock { fresh } => handle_unlock(invocation, *fresh),
        AgentSubcommand::Status { format } => handle_status(invocation, *format),
        AgentSubcommand::Password => handle_password(invocation),
    }
}

/// Destroy the session token. Works whether or not the engine is running,
/// and whether or not a token exists.
fn handle_lock(invocation: &Invocation) -> Result<()> {
    pk_auth::lock_node(&invocation.node_path)?;
    pk_success!("Session locked");
    Ok(())
}

fn handle_unlock(invocation: &Invocation, fresh: bool) -> Result<()> {
    let engine = HttpEngine::connect(&invocation.node_path)?;
    let gate = SessionGate::new(&invocation.node_path, engine)?;
    let request = invocation.credential_request()?;

    gate.unlock(&request, fresh)?;
    pk_success!("Session unlocked");
    Ok(())
}

/// What `status` reports; serialized as-is for `--format json`.
#[derive(Debug, Serialize)]
struct StatusReport {
    status: String,
    node_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    node_id: Option<String>,
}

fn handle_status(invocation: &Invocation, format: OutputFormat) -> Result<()> {
    let node_path = invocation.node_path.display().to_string();

    let report = match HttpEngine::connect(&invocation.node_path) {
        Ok(engine) => {
            let gate = SessionGate::new(&invocation.node_path, engine)?;
            let request = invocation.credential_request()?;
            let info = gate.status(&request)?;
            StatusReport {
                status: info.status,
                node_path,
                pid: info.pid,
                node_id: info.node_id,
            }
        }
        // No engine serving this node directory: that is a reportable
        // state, not a failure, and it needs no credentials.
        Err(EngineError::NotRunning { .. }) => StatusReport {
            status: "DEAD".to_string(),
            node_path,
            pid: None,
            node_id: None,
        },
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Json => pk_println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            pk_println!("status: {}", report.status);
            pk_println!("node path: {}", report.node_path);
            if let Some(pid) = report.pid {
                pk_println!("pid: {}", pid);
            }
            if let Some(node_id) = &report.node_id {
                pk_println!("node id: {}", node_id);
            }
        }
    }
    Ok(())
}

fn handle_password(invocation: &Invocation) -> Result<()> {
    let engine = HttpEngine::connect(&invocation.node_path)?;
    let gate = SessionGate::new(&invocation.node_path, engine)?;
    let request = invocation.credential_request()?;

    let new_password = match invocation.new_password_from_env() {
        Some(password) => password,
        None if request.interactive => prompt_password("New password")?,
        None => {
            return Err(PkError::Usage(
                "new password required: set PK_PASSWORD_NEW or run interactively".to_string(),
            ));
        }
    };

    gate.change_password(&request, &new_password)?;
    pk_success!("Password changed");
    Ok(())
}
