use std::borrow::Cow;

use ecow::EcoString;
use smallvec::SmallVec;

use crate::{
    error::{Error, Result},
    values::{Value, ValueType},
};

/// One declared parameter of a function or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: EcoString,
    /// `None` accepts any value.
    pub ty: Option<ValueType>,
    pub optional: bool,
}

pub type Signature = SmallVec<[Param; 4]>;

impl Param {
    pub fn new(name: impl Into<EcoString>, ty: ValueType) -> Self {
        Self::typed(name, Some(ty))
    }

    pub fn typed(name: impl Into<EcoString>, ty: Option<ValueType>) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
        }
    }

    pub fn any(name: impl Into<EcoString>) -> Self {
        Self::typed(name, None)
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Integers are accepted where a Float is declared; see [`validate_args`].
    pub fn accepts(&self, value: &Value) -> bool {
        match (self.ty, value) {
            (None, _) => true,
            (Some(_), Value::Null | Value::Undefined) if self.optional => true,
            (Some(ValueType::Map), Value::MapRef(weak)) => weak.is_alive(),
            (Some(ValueType::Float), Value::Integer(_)) => true,
            (Some(ty), value) => value.value_type() == ty,
        }
    }
}

/// Checks `args` against `params` and returns the arguments the callee
/// should see: Integers passed to Float parameters are widened, everything
/// else is passed through untouched.
///
/// Trailing optional parameters may be omitted; `variadic` skips the check
/// entirely.
pub fn validate_args<'a>(
    function: &str,
    params: &[Param],
    args: &'a [Value],
    variadic: bool,
) -> Result<Cow<'a, [Value]>> {
    if variadic {
        return Ok(Cow::Borrowed(args));
    }
    let max = params.len();
    let min = params
        .iter()
        .rposition(|param| !param.optional)
        .map_or(0, |last| last + 1);
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(Error::argument(format!(
            "{}: Invalid number of arguments, expected {} but got {}",
            function,
            expected,
            args.len()
        )));
    }
    for (index, (param, arg)) in params.iter().zip(args).enumerate() {
        if !param.accepts(arg) {
            // `accepts` only fails for typed parameters.
            let expected = param.ty.map_or("any", ValueType::as_str);
            return Err(Error::argument(format!(
                "{}: Argument #{} ({}) is expected to be {}, but got {}",
                function,
                index + 1,
                param.name,
                expected,
                arg.type_name()
            )));
        }
    }
    Ok(widen_floats(params, args))
}

fn widen_floats<'a>(params: &[Param], args: &'a [Value]) -> Cow<'a, [Value]> {
    let widens = |(param, arg): (&Param, &Value)| {
        param.ty == Some(ValueType::Float) && matches!(arg, Value::Integer(_))
    };
    if !params.iter().zip(args).any(widens) {
        return Cow::Borrowed(args);
    }
    let widened = args
        .iter()
        .enumerate()
        .map(|(index, arg)| match (params.get(index), arg) {
            (Some(param), Value::Integer(i)) if param.ty == Some(ValueType::Float) => {
                Value::Float(*i as f64)
            }
            _ => arg.clone(),
        })
        .collect();
    Cow::Owned(widened)
}
