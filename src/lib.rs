//! Shellbridge - Native objects and functions shared with embedded script runtimes
//!
//! # Overview
//!
//! Shellbridge exposes host objects, functions and containers to script
//! engines through one dynamic [`Value`] model:
//!
//! - [`bridge::ObjectBridge`] and [`bridge::FunctionBase`] describe what a
//!   native object or function offers to scripts.
//! - [`bridge::ObjectBuilder`] builds objects from member tables, including
//!   chain states that enable members as calls are made.
//! - [`registry`] holds named objects and class factories.
//! - [`js`] and [`py`] adapt the model to a tracing and a reference counted
//!   runtime, keeping natives alive exactly as long as script wrappers exist.
//!
//! # Quick Start
//!
//! ```
//! use shellbridge::bridge_fn;
//! use shellbridge::js::{JsBridge, JsContext, JsValue};
//!
//! #[bridge_fn]
//! fn upper(s: String) -> String {
//!     s.to_uppercase()
//! }
//!
//! let ctx = JsContext::new();
//! let bridge = JsBridge::new(&ctx);
//! bridge.set_global("upper", &Upper::new().into_value());
//!
//! let upper = ctx.get_global("upper");
//! let result = ctx
//!     .call(&upper, &JsValue::Undefined, &[JsValue::string("hello")])
//!     .unwrap();
//! assert_eq!(result, JsValue::string("HELLO"));
//! ```
//!
//! # Errors
//!
//! Every failure is an [`Error`] with an [`ErrorKind`]. Errors cross into
//! scripts as the error value schema and come back unchanged; use
//! [`render_error_to`] to print one with its causes.

// Error rendering utilities
pub mod error_renderer;
pub use error_renderer::{
    CharSet, RenderConfig, render_error_to, render_error_value, render_error_value_to,
    render_parse_error, render_parse_error_to,
};

// Re-export the value model and bridge contracts
pub use shellbridge_core::{
    Array, Error, ErrorKind, Map, MarshalOptions, MarshalOptionsOverride, Result, Value,
    ValueType, WeakMap, bridge, registry, runtime, values,
};

// Runtime adapters
pub use shellbridge_js as js;
pub use shellbridge_py as py;

// Binding macros
pub use shellbridge_macros::{bridge_const, bridge_fn, bridge_package};
