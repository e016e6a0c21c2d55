//! Reader for the literal text format written by [`Value::repr`].

use core::ops::Range;

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::{
    error::Error,
    values::{Array, Map, Value},
};

/// Nesting limit for arrays and maps in literal text.
pub const DEFAULT_MAX_DEPTH: usize = 500;

#[derive(Parser)]
#[grammar = "values/literal.pest"]
struct LiteralParser;

/// A literal that could not be read, with the byte span it failed at.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Range<usize>,
    /// The text that failed to parse.
    pub input: String,
}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Self {
        Error::argument(format!(
            "Invalid literal at offset {}: {}",
            error.span.start, error.message
        ))
    }
}

fn convert_pest_error(error: pest::error::Error<Rule>, source: &str) -> ParseError {
    let span = match error.location {
        pest::error::InputLocation::Pos(pos) => pos..pos,
        pest::error::InputLocation::Span((start, end)) => start..end,
    };
    ParseError {
        message: error.variant.message().into_owned(),
        span,
        input: source.to_string(),
    }
}

fn custom_error(pair: &Pair<Rule>, message: impl Into<String>) -> pest::error::Error<Rule> {
    pest::error::Error::new_from_span(
        pest::error::ErrorVariant::CustomError {
            message: message.into(),
        },
        pair.as_span(),
    )
}

impl Value {
    /// Parses literal text, such as the output of [`Value::repr`].
    pub fn parse(source: &str) -> Result<Value, ParseError> {
        Self::parse_with_max_depth(source, DEFAULT_MAX_DEPTH)
    }

    pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<Value, ParseError> {
        let mut pairs = LiteralParser::parse(Rule::main, source).map_err(|e| {
            tracing::debug!("Literal parser failed with: {:?}", e);
            convert_pest_error(e, source)
        })?;
        let reader = Reader { max_depth };
        // Rule::main always produces one pair whose first child is the value.
        let value = pairs
            .next()
            .and_then(|main| main.into_inner().next())
            .ok_or_else(|| ParseError {
                message: "expected a value".to_string(),
                span: 0..source.len(),
                input: source.to_string(),
            })?;
        reader
            .value(value, 0)
            .map_err(|e| convert_pest_error(e, source))
    }
}

struct Reader {
    max_depth: usize,
}

impl Reader {
    fn value(&self, pair: Pair<Rule>, depth: usize) -> Result<Value, pest::error::Error<Rule>> {
        match pair.as_rule() {
            Rule::undefined => Ok(Value::Undefined),
            Rule::null => Ok(Value::Null),
            Rule::boolean => Ok(Value::Bool(pair.as_str() == "true")),
            Rule::integer => pair
                .as_str()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| custom_error(&pair, "integer literal out of range")),
            Rule::float => self.float(&pair),
            Rule::string => self.string(pair).map(Value::String),
            Rule::array => {
                self.check_depth(&pair, depth)?;
                let items = pair
                    .into_inner()
                    .map(|item| self.value(item, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(Array::from_vec(items)))
            }
            Rule::map => {
                self.check_depth(&pair, depth)?;
                let map = Map::new();
                for entry in pair.into_inner() {
                    let mut parts = entry.into_inner();
                    let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                        unreachable!("entry always has a key and a value");
                    };
                    let key = self.string(key)?;
                    map.set(key.as_str(), self.value(value, depth + 1)?);
                }
                Ok(Value::Map(map))
            }
            rule => Err(custom_error(&pair, format!("unexpected {:?}", rule))),
        }
    }

    fn check_depth(&self, pair: &Pair<Rule>, depth: usize) -> Result<(), pest::error::Error<Rule>> {
        if depth >= self.max_depth {
            return Err(custom_error(
                pair,
                format!("nesting exceeds the maximum depth of {}", self.max_depth),
            ));
        }
        Ok(())
    }

    fn float(&self, pair: &Pair<Rule>) -> Result<Value, pest::error::Error<Rule>> {
        let text = pair.as_str();
        let (negative, magnitude) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let value = match magnitude {
            "inf" => f64::INFINITY,
            "nan" => f64::NAN,
            _ => magnitude
                .parse::<f64>()
                .map_err(|_| custom_error(pair, "invalid float literal"))?,
        };
        Ok(Value::Float(if negative { -value } else { value }))
    }

    fn string(&self, pair: Pair<Rule>) -> Result<ecow::EcoString, pest::error::Error<Rule>> {
        let Some(inner) = pair.clone().into_inner().next() else {
            return Err(custom_error(&pair, "malformed string literal"));
        };
        let raw = inner.as_str();
        let mut out = ecow::EcoString::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('0') => out.push('\0'),
                Some('u') => {
                    // Grammar guarantees `{` hex digits `}`.
                    let digits: String = chars
                        .by_ref()
                        .skip(1)
                        .take_while(|c| *c != '}')
                        .collect();
                    let decoded = u32::from_str_radix(&digits, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| {
                            let message = format!("invalid unicode escape \\u{{{}}}", digits);
                            custom_error(&inner, message)
                        })?;
                    out.push(decoded);
                }
                Some(other) => out.push(other),
                None => return Err(custom_error(&inner, "dangling escape")),
            }
        }
        Ok(out)
    }
}
