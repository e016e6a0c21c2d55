//! Fluent construction of named value collections.

use crate::values::Value;

/// Failure to finish a [`Binder`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Names bound more than once, in the order they were first repeated.
    #[error("Duplicate binding for {}", quoted(.0))]
    DuplicateBinding(Vec<String>),
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("'{}'", name))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<Error> for crate::error::Error {
    fn from(error: Error) -> Self {
        crate::error::Error::logic(error.to_string())
    }
}

/// Builds a named collection, such as an object registry, one binding at a
/// time. Duplicates are collected and reported together by `build`.
pub trait Binder: Sized {
    type Output;

    fn bind(self, name: &str, value: Value) -> Self;

    fn build(self) -> Result<Self::Output, Error>;
}
