//! Session authentication for the CLI.
//!
//! [`TokenStore`] persists the session token as a single file under the node
//! data directory; [`SessionGate`] decides per invocation whether a command
//! may proceed and performs the lock/unlock transitions.

pub mod password;
pub mod session;
pub mod token_store;

pub use session::{lock_node, Credential, CredentialRequest, CredentialSource, SessionGate};
pub use token_store::TokenStore;
