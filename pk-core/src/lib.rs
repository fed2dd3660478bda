pub mod error;
pub mod logging;
pub mod output_macros;
pub mod paths;

// Re-export the error type and result alias for convenience
pub use error::{PkError, Result};
