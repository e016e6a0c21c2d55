//! JavaScript runtime adapter.
//!
//! [`engine`] is a minimal tracing-GC object model; [`bridge`] exposes native
//! objects, containers and functions through it and turns its callables and
//! errors back into native ones.

pub mod bridge;
pub mod engine;
pub mod options;

pub use bridge::{JsBridge, JsFunction};
pub use engine::{Handle, JsContext, JsResult, JsValue};
pub use options::{JsContextOptions, JsContextOptionsOverride};

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
