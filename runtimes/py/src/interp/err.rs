use std::fmt;

/// Built-in exception classes raised by the interpreter and the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExcType {
    TypeError,
    AttributeError,
    ValueError,
    IndexError,
    KeyError,
    RuntimeError,
}

impl ExcType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExcType::TypeError => "TypeError",
            ExcType::AttributeError => "AttributeError",
            ExcType::ValueError => "ValueError",
            ExcType::IndexError => "IndexError",
            ExcType::KeyError => "KeyError",
            ExcType::RuntimeError => "RuntimeError",
        }
    }
}

impl fmt::Display for ExcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raised exception.
///
/// `error_type` is set when the exception reports a native error and names
/// its kind, so the error is rebuilt unchanged when it propagates back.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{exc_type}: {message}")]
pub struct PyErr {
    pub exc_type: ExcType,
    pub message: String,
    pub code: Option<i64>,
    pub error_type: Option<String>,
    #[source]
    pub cause: Option<Box<PyErr>>,
}

impl PyErr {
    pub fn new(exc_type: ExcType, message: impl Into<String>) -> Self {
        Self {
            exc_type,
            message: message.into(),
            code: None,
            error_type: None,
            cause: None,
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ExcType::TypeError, message)
    }

    pub fn attribute_error(message: impl Into<String>) -> Self {
        Self::new(ExcType::AttributeError, message)
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Self::new(ExcType::IndexError, message)
    }

    pub fn key_error(key: &str) -> Self {
        Self::new(ExcType::KeyError, format!("'{}'", key))
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        Self::new(ExcType::RuntimeError, message)
    }

    pub fn with_cause(mut self, cause: PyErr) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type PyResult<T> = Result<T, PyErr>;
