//! Native errors thrown into scripts and script exceptions caught by natives.
//!
//! A native error becomes an error object with `name`, `message`, `type`
//! and, when present, `code` and `cause`. The `type` property carries the
//! native kind so the error comes back unchanged if the script rethrows it.

use shellbridge_core::{Error, ErrorKind};

use crate::engine::{JsContext, JsValue};

/// Bounds how far a `cause` chain is followed.
const MAX_CAUSE_DEPTH: usize = 16;

pub(crate) fn throw_native(ctx: &JsContext, error: &Error) -> JsValue {
    let kind = error.kind();
    let thrown = JsValue::Object(ctx.new_error(kind.as_str(), &error.to_string()));
    let _ = ctx.set(&thrown, "type", JsValue::string(kind.as_str()));
    if let Some(code) = error.code() {
        let _ = ctx.set(&thrown, "code", JsValue::Number(code as f64));
    }
    let cause = match error.cause() {
        Some(cause) => throw_native(ctx, cause),
        None => JsValue::Null,
    };
    let _ = ctx.set(&thrown, "cause", cause);
    thrown
}

pub(crate) fn error_from_thrown(ctx: &JsContext, thrown: &JsValue) -> Error {
    error_at(ctx, thrown, 0)
}

fn error_at(ctx: &JsContext, thrown: &JsValue, depth: usize) -> Error {
    if !matches!(thrown, JsValue::Object(_)) {
        return Error::scripting(format!("Uncaught {}", thrown));
    }
    let read = |key: &str| {
        ctx.get(thrown, key)
            .ok()
            .filter(|value| !value.is_nullish())
    };
    let Some(message) = read("message") else {
        return Error::scripting("Uncaught exception without a message");
    };
    let message = message.to_string();
    let code = read("code").and_then(|code| match code {
        JsValue::Number(n) if n.fract() == 0.0 => Some(n as i64),
        JsValue::BigInt(n) => Some(n),
        _ => None,
    });
    let cause = match read("cause") {
        Some(cause) if depth < MAX_CAUSE_DEPTH => Some(error_at(ctx, &cause, depth + 1)),
        _ => None,
    };
    let kind = read("type").and_then(|kind| kind.as_str().and_then(ErrorKind::from_name));
    match kind {
        Some(kind) => Error::from_parts(kind, message, code, cause),
        None => {
            let name = read("name").map_or_else(|| "Error".to_string(), |name| name.to_string());
            Error::Scripting {
                message: format!("{}: {}", name, message),
                code,
                cause: cause.map(Box::new),
            }
        }
    }
}
