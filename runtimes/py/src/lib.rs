//! Python runtime adapter.
//!
//! [`interp`] is a minimal reference-counted object model; [`bridge`]
//! exposes native objects, containers and functions as extension types and
//! turns Python callables and exceptions back into native ones.

pub mod bridge;
pub mod interp;
pub mod options;

pub use bridge::{PyBridge, PyFunction};
pub use interp::{ExcType, PyErr, PyInterpreter, PyRef, PyResult};
pub use options::{PyInterpreterOptions, PyInterpreterOptionsOverride};

#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
