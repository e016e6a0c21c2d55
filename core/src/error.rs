//! Public error type shared by the value model, the bridge and every runtime
//! adapter.
//!
//! Errors cross runtime boundaries in two shapes: as this enum on the native
//! side, and as an error Map (`{type, message, description, cause, code?}`)
//! when handed to script code or to the CLI collaborator. Adapters translate
//! between the enum and their runtime's exception objects, keeping the message
//! and the causal chain.

use crate::values::{Map, Value, ValueType};

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Coarse classification used when an error crosses into a foreign runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Type,
    Attribute,
    Argument,
    Logic,
    Scripting,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::Type,
        ErrorKind::Attribute,
        ErrorKind::Argument,
        ErrorKind::Logic,
        ErrorKind::Scripting,
    ];

    /// Name used for the `type` field of the error value schema.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Type => "TypeError",
            ErrorKind::Attribute => "AttributeError",
            ErrorKind::Argument => "ArgumentError",
            ErrorKind::Logic => "LogicError",
            ErrorKind::Scripting => "ScriptingError",
        }
    }

    pub fn from_name(name: &str) -> Option<ErrorKind> {
        ErrorKind::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A value was read under the wrong tag.
    #[error("Invalid typecast: {expected} expected, but value is {actual}")]
    TypeMismatch {
        expected: ValueType,
        actual: ValueType,
    },

    #[error("{0}")]
    Type(String),

    /// Covers absent members and chain members that are not enabled yet.
    #[error("Invalid object member '{member}' in {class}")]
    UnknownMember { class: String, member: String },

    #[error("Object member '{member}' of {class} is read only")]
    ReadOnlyMember { class: String, member: String },

    #[error("No factory registered for {package}.{class}")]
    UnknownFactory { package: String, class: String },

    #[error("{0}")]
    Attribute(String),

    #[error("{0}")]
    Argument(String),

    #[error("{0}")]
    Logic(String),

    /// An error raised by script code, possibly wrapping the native error that
    /// caused it.
    #[error("{message}")]
    Scripting {
        message: String,
        code: Option<i64>,
        #[source]
        cause: Option<Box<Error>>,
    },

    #[error("Callable '{0}' no longer exists")]
    CallableGone(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TypeMismatch { .. } | Error::Type(_) => ErrorKind::Type,
            Error::UnknownMember { .. }
            | Error::ReadOnlyMember { .. }
            | Error::UnknownFactory { .. }
            | Error::Attribute(_) => ErrorKind::Attribute,
            Error::Argument(_) => ErrorKind::Argument,
            Error::Logic(_) => ErrorKind::Logic,
            Error::Scripting { .. } | Error::CallableGone(_) => ErrorKind::Scripting,
        }
    }

    pub fn unknown_member(class: impl Into<String>, member: impl Into<String>) -> Self {
        Error::UnknownMember {
            class: class.into(),
            member: member.into(),
        }
    }

    pub fn read_only(class: impl Into<String>, member: impl Into<String>) -> Self {
        Error::ReadOnlyMember {
            class: class.into(),
            member: member.into(),
        }
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Error::Argument(message.into())
    }

    pub fn logic(message: impl Into<String>) -> Self {
        Error::Logic(message.into())
    }

    pub fn scripting(message: impl Into<String>) -> Self {
        Error::Scripting {
            message: message.into(),
            code: None,
            cause: None,
        }
    }

    /// Builds an error of the given kind from its parts.
    ///
    /// Used when an error comes back from a script and only its kind name,
    /// message and code survived the trip.
    pub fn from_parts(
        kind: ErrorKind,
        message: impl Into<String>,
        code: Option<i64>,
        cause: Option<Error>,
    ) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Type => Error::Type(message),
            ErrorKind::Attribute => Error::Attribute(message),
            ErrorKind::Argument => Error::Argument(message),
            ErrorKind::Logic => Error::Logic(message),
            ErrorKind::Scripting => Error::Scripting {
                message,
                code,
                cause: cause.map(Box::new),
            },
        }
    }

    /// Wraps `self` as the cause of a scripting error.
    pub fn caused(self, message: impl Into<String>) -> Self {
        Error::Scripting {
            message: message.into(),
            code: self.code(),
            cause: Some(Box::new(self)),
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            Error::Scripting { code, .. } => *code,
            _ => None,
        }
    }

    pub fn cause(&self) -> Option<&Error> {
        match self {
            Error::Scripting { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }

    /// Converts the error into the error value schema:
    /// `{type, message, description, cause, code?}`.
    pub fn to_value(&self) -> Value {
        let map = Map::new();
        let message = self.to_string();
        map.set("type", Value::from(self.kind().as_str()));
        map.set(
            "description",
            Value::from(format!("{}: {}", self.kind(), message)),
        );
        map.set("message", Value::from(message));
        let cause = match self.cause() {
            Some(cause) => cause.to_value(),
            None => Value::Null,
        };
        map.set("cause", cause);
        if let Some(code) = self.code() {
            map.set("code", Value::Integer(code));
        }
        Value::Map(map)
    }

    /// Rebuilds an error from the error value schema.
    ///
    /// Values that do not follow the schema become a scripting error carrying
    /// their description, so nothing raised by a script is lost.
    pub fn from_value(value: &Value) -> Self {
        let Ok(map) = value.as_map() else {
            return Error::scripting(value.descr(false));
        };
        let message = match map.get("message") {
            Some(Value::String(message)) => message.to_string(),
            Some(other) => other.descr(false),
            None => return Error::scripting(value.descr(false)),
        };
        let kind = match map.get("type") {
            Some(Value::String(name)) => ErrorKind::from_name(&name),
            _ => None,
        };
        let code = match map.get("code") {
            Some(Value::Integer(code)) => Some(code),
            _ => None,
        };
        let cause = match map.get("cause") {
            Some(cause @ Value::Map(_)) => Some(Error::from_value(&cause)),
            _ => None,
        };
        match kind {
            Some(kind) if kind != ErrorKind::Scripting => {
                Error::from_parts(kind, message, code, cause)
            }
            _ => Error::Scripting {
                message,
                code,
                cause: cause.map(Box::new),
            },
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
