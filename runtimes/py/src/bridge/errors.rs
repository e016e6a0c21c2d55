//! Native errors raised into Python and Python exceptions caught by natives.
//!
//! The exception class follows the error kind. `error_type` keeps the native
//! kind name so a re-raised error comes back unchanged.

use shellbridge_core::{Error, ErrorKind};

use crate::interp::{ExcType, PyErr};

/// Bounds how far a cause chain is followed.
const MAX_CAUSE_DEPTH: usize = 16;

pub(crate) fn exc_type(kind: ErrorKind) -> ExcType {
    match kind {
        ErrorKind::Type => ExcType::TypeError,
        ErrorKind::Attribute => ExcType::AttributeError,
        ErrorKind::Argument => ExcType::ValueError,
        ErrorKind::Logic | ErrorKind::Scripting => ExcType::RuntimeError,
    }
}

pub(crate) fn raise_native(error: &Error) -> PyErr {
    let kind = error.kind();
    PyErr {
        exc_type: exc_type(kind),
        message: error.to_string(),
        code: error.code(),
        error_type: Some(kind.as_str().to_string()),
        cause: error.cause().map(|cause| Box::new(raise_native(cause))),
    }
}

pub(crate) fn error_from_exception(err: &PyErr) -> Error {
    error_at(err, 0)
}

fn error_at(err: &PyErr, depth: usize) -> Error {
    let cause = match &err.cause {
        Some(cause) if depth < MAX_CAUSE_DEPTH => Some(error_at(cause, depth + 1)),
        _ => None,
    };
    let kind = err.error_type.as_deref().and_then(ErrorKind::from_name);
    match kind {
        Some(kind) => Error::from_parts(kind, err.message.clone(), err.code, cause),
        None => Error::Scripting {
            message: err.to_string(),
            code: err.code,
            cause: cause.map(Box::new),
        },
    }
}
