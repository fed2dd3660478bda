//! Command dispatch.

mod agent;
mod secrets;

use crate::cli::{Args, Command};
use crate::config::Invocation;
use pk_core::Result;

pub fn execute_command(args: &Args) -> Result<()> {
    let invocation = Invocation::from_args(args)?;

    match &args.command {
        Command::Agent { command } => agent::handle_agent_command(command, &invocation),
        Command::Secrets { command } => secrets::handle_secrets_command(command, &invocation),
    }
}
