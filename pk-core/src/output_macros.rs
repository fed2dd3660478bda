//! Output macros for user-facing CLI messages.
//!
//! Logging goes through `tracing` to stderr; these macros are for the
//! command output itself.

#[macro_export]
macro_rules! pk_println {
    () => {
        println!();
    };
    ($($arg:tt)*) => {
        println!("{}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! pk_error {
    ($($arg:tt)*) => {
        eprintln!("{}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! pk_success {
    ($($arg:tt)*) => {
        println!("✓ {}", format!($($arg)*));
    }
}
