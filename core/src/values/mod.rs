pub mod binder;
pub mod containers;
pub mod display;
pub mod json;
pub mod parse;
pub mod typed;
pub mod value;

pub use binder::Binder;
pub use containers::{Array, Map, WeakMap};
pub use parse::ParseError;
pub use typed::Bridge;
pub use value::{Value, ValueType};

#[cfg(test)]
mod json_test;
#[cfg(test)]
mod parse_test;
