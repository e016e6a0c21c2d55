//! Procedural macros exposing Rust functions to scripts.
//!
//! - `#[bridge_fn]` - Turn a function into a signature-checked `FunctionBase`
//! - `#[bridge_const]` - Mark a function as a package constant
//! - `#[bridge_package]` - Generate a package builder from a module

extern crate proc_macro;

use proc_macro::TokenStream;

mod bridge_const;
mod bridge_fn;
mod bridge_package;
mod common;

/// Turn a plain Rust function into a callable value.
///
/// Generates a struct implementing [`FunctionBase`] whose signature is
/// derived from the parameter types. Arguments are validated with
/// [`validate_args`] and converted through [`Bridge`] before the function
/// runs.
///
/// [`FunctionBase`]: shellbridge_core::bridge::FunctionBase
/// [`validate_args`]: shellbridge_core::bridge::validate_args
/// [`Bridge`]: shellbridge_core::values::Bridge
///
/// # Example
///
/// ```ignore
/// use shellbridge_macros::bridge_fn;
///
/// #[bridge_fn]
/// fn repeat(s: String, times: i64) -> String {
///     s.repeat(times as usize)
/// }
///
/// let value = Repeat::new().into_value();
/// ```
///
/// # Naming
///
/// The script-visible name is the function name; the struct name is its
/// PascalCase form. Both can be changed with `name`:
///
/// ```ignore
/// #[bridge_fn(name = upper)]
/// fn to_upper(s: String) -> String {
///     s.to_uppercase()
/// }
/// // Generates struct `Upper`, called as `upper`
/// ```
///
/// # Fallible Functions
///
/// Functions can return `Result<T, E>` where `E: Into<shellbridge_core::Error>`.
/// The declared return type is that of `T`.
///
/// # Restrictions
///
/// - Parameters must be owned types implementing `Bridge`
/// - Generic and lifetime parameters are not supported
/// - Pattern matching in parameters is not supported
#[proc_macro_attribute]
pub fn bridge_fn(attr: TokenStream, item: TokenStream) -> TokenStream {
    bridge_fn::bridge_fn_impl(attr, item)
}

/// Mark a function as a package constant.
///
/// The function takes no arguments and returns a `Bridge` type. By default
/// the constant name is the function name in SCREAMING_SNAKE_CASE; override
/// it with `name`:
///
/// ```ignore
/// #[bridge_const(name = MAX_ROWS)]
/// fn max_rows() -> i64 {
///     1000
/// }
/// ```
#[proc_macro_attribute]
pub fn bridge_const(attr: TokenStream, item: TokenStream) -> TokenStream {
    bridge_const::bridge_const_impl(attr, item)
}

/// Generate a package builder from a module.
///
/// ```ignore
/// #[bridge_package]
/// mod text {
///     use super::*;
///
///     #[bridge_const]
///     fn version() -> String {
///         "1.0".to_string()
///     }
///
///     #[bridge_fn]
///     fn upper(s: String) -> String {
///         s.to_uppercase()
///     }
/// }
///
/// // Generated: pub fn build_text_package() -> Map
/// ```
///
/// The builder name can be set with `builder`:
///
/// ```ignore
/// #[bridge_package(builder = text_package)]
/// mod text { ... }
/// ```
#[proc_macro_attribute]
pub fn bridge_package(attr: TokenStream, item: TokenStream) -> TokenStream {
    bridge_package::bridge_package_impl(attr, item)
}
