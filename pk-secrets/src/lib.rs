//! Secret addressing.
//!
//! CLI arguments of the form `vaultName:secretPath[=envVarName]` are parsed
//! into typed [`SecretAddress`] values before anything touches the engine.
//! Directory arguments expand into one address per file.

pub mod address;
pub mod directory;

pub use address::{AddressErrorKind, AddressSyntaxError, SecretAddress};
pub use directory::{expand_directory, DirectoryError};
