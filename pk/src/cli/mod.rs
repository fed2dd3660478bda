// CLI argument parsing and definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "pk")]
#[command(about = "Command-line front end for the pk secret-management agent")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Node data directory (defaults to PK_NODE_PATH, then the platform data dir)
    #[arg(short = 'n', long = "node-path", alias = "np", global = true, value_name = "PATH")]
    pub node_path: Option<PathBuf>,

    /// File to read the password from instead of PK_PASSWORD or a prompt
    #[arg(long, global = true, value_name = "PATH")]
    pub password_file: Option<PathBuf>,

    /// File to read an out-of-band session token from (PK_TOKEN takes precedence)
    #[arg(long, global = true, value_name = "PATH")]
    pub token_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Subcommand)]
pub enum AgentSubcommand {
    /// Destroy the session token, locking the node
    Lock,
    /// Authenticate against the engine and persist a session token
    Unlock {
        /// Discard any existing session and force re-authentication
        #[arg(long)]
        fresh: bool,
    },
    /// Report agent liveness and session state
    Status {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Change the engine password (new password from PK_PASSWORD_NEW or a prompt)
    Password,
}

#[derive(Debug, Clone, Subcommand)]
pub enum SecretsSubcommand {
    /// Import a local file as a new secret
    Create {
        /// Local file to import
        local_path: PathBuf,
        /// Destination address (vaultName:secretPath)
        address: String,
    },
    /// Replace the contents of an existing secret
    Update {
        /// Local file to import
        local_path: PathBuf,
        /// Destination address (vaultName:secretPath)
        address: String,
    },
    /// Write the contents of a secret to stdout
    Get {
        /// Secret address (vaultName:secretPath)
        address: String,
    },
    /// Delete a secret
    Delete {
        /// Secret address (vaultName:secretPath)
        address: String,
    },
    /// List the secret paths in a vault
    List {
        /// Vault to list
        vault_name: String,
    },
    /// Import every file under a directory, one secret per file
    Dir {
        /// Directory to import recursively
        directory: PathBuf,
        /// Destination vault
        vault_name: String,
    },
    /// Run a command with secrets injected as environment variables
    Env {
        /// Addresses to inject (vaultName:secretPath[=ENV_VAR])
        #[arg(required = true)]
        addresses: Vec<String>,
        /// Command to run, after `--`
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Manage the agent session for a node
    Agent {
        #[command(subcommand)]
        command: AgentSubcommand,
    },
    /// Manipulate secrets inside vaults
    Secrets {
        #[command(subcommand)]
        command: SecretsSubcommand,
    },
}
