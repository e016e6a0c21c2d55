// Needed so that macros can uniformly refer to `::shellbridge_core` and still work
// from within this crate or a different one.
extern crate self as shellbridge_core;

pub mod bridge;
pub mod error;
pub mod options;
pub mod registry;
pub mod runtime;
pub mod values;

pub use error::{Error, ErrorKind, Result};
pub use options::{MarshalOptions, MarshalOptionsOverride};
pub use values::{Array, Map, Value, ValueType, WeakMap};

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_chain_transitions() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
