//! Boundary to the external secret-management engine.
//!
//! Everything the CLI needs from the engine (password verification and
//! token minting, session status, vault secret operations) goes through the
//! [`Engine`] trait. [`HttpEngine`] is the production implementation; it
//! discovers a locally running engine through the node data directory and
//! speaks JSON over HTTP. The engine itself (storage, cryptography,
//! networking) lives outside this repository.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod types;

pub use client::{Engine, HttpEngine};
pub use error::EngineError;
pub use types::{AgentInfo, SessionToken, StatusInfo};
