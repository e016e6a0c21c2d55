//! Error rendering using ariadne
//!
//! Literal parse errors are rendered with the offending source line and a
//! label at the failing span. Errors in the error value schema
//! (`{type, message, description, cause, code?}`) render as plain reports
//! with their causal chain, one line per cause.

use std::io::Write;

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use shellbridge_core::{Error, Value, values::ParseError};

/// Bounds how far a cause chain is followed.
const MAX_CAUSE_DEPTH: usize = 16;

/// Character set for rendering error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharSet {
    /// Use Unicode characters for rich visual output.
    #[default]
    Unicode,
    /// Use ASCII-only characters for compatibility.
    Ascii,
}

/// Configuration for error rendering.
#[derive(Debug, Clone)]
pub struct RenderConfig<'a> {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
    /// The filename to display in error messages.
    /// Defaults to "<literal>" if not provided.
    pub filename: Option<&'a str>,
    pub charset: CharSet,
}

impl Default for RenderConfig<'_> {
    fn default() -> Self {
        RenderConfig::default()
    }
}

impl RenderConfig<'_> {
    const fn default() -> Self {
        Self {
            color: true,
            filename: None,
            charset: CharSet::Unicode,
        }
    }
}

/// Render a literal parse error to stderr using the default config.
pub fn render_parse_error(error: &ParseError) {
    render_parse_error_to(error, &mut std::io::stderr(), &RenderConfig::default()).ok();
}

/// Render a literal parse error to a writer with the given configuration.
///
/// # Example
/// ```no_run
/// use shellbridge::{RenderConfig, Value, render_parse_error_to};
///
/// if let Err(e) = Value::parse("[1, 2") {
///     let mut buf = Vec::new();
///     let config = RenderConfig { color: false, ..Default::default() };
///     render_parse_error_to(&e, &mut buf, &config).ok();
///     println!("{}", String::from_utf8_lossy(&buf));
/// }
/// ```
pub fn render_parse_error_to(
    error: &ParseError,
    writer: &mut dyn Write,
    config: &RenderConfig,
) -> std::io::Result<()> {
    let filename = config.filename.unwrap_or("<literal>");
    let source = error.input.as_str();

    // Empty spans point at the character they start on.
    let mut span = error.span.clone();
    if span.is_empty() && span.start < source.len() {
        span.end = source[span.start..]
            .chars()
            .next()
            .map_or(span.start, |c| span.start + c.len_utf8());
    }

    let ariadne_charset = match config.charset {
        CharSet::Unicode => ariadne::CharSet::Unicode,
        CharSet::Ascii => ariadne::CharSet::Ascii,
    };
    let ariadne_config = ariadne::Config::default()
        .with_color(config.color)
        .with_char_set(ariadne_charset)
        .with_index_type(ariadne::IndexType::Byte);

    let mut colors = ColorGenerator::new();
    colors.next(); // Skip the first color.

    Report::build(ReportKind::Error, (filename, span.clone()))
        .with_message("Invalid literal")
        .with_config(ariadne_config)
        .with_label(
            Label::new((filename, span))
                .with_message(&error.message)
                .with_color(colors.next()),
        )
        .finish()
        .write((filename, Source::from(source)), writer)
}

/// Render an error value to stderr.
pub fn render_error_value(value: &Value) {
    render_error_value_to(value, &mut std::io::stderr()).ok();
}

/// Render an error value as a report: the error itself, then one
/// `Caused by:` line per cause.
///
/// Values outside the schema render as their description.
pub fn render_error_value_to(value: &Value, writer: &mut dyn Write) -> std::io::Result<()> {
    let mut current = Some(value.clone());
    let mut depth = 0;
    while let Some(value) = current.take() {
        let prefix = if depth == 0 { "Error" } else { "Caused by" };
        let Ok(map) = value.as_map() else {
            writeln!(writer, "{}: {}", prefix, value.descr(false))?;
            break;
        };
        let field = |key: &str| match map.get(key) {
            Some(Value::String(s)) => Some(s.to_string()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.descr(false)),
        };
        let kind = field("type").unwrap_or_else(|| "Error".to_string());
        let message = field("message").unwrap_or_default();
        write!(writer, "{}: {}: {}", prefix, kind, message)?;
        if let Some(Value::Integer(code)) = map.get("code") {
            write!(writer, " (code {})", code)?;
        }
        writeln!(writer)?;

        depth += 1;
        if depth < MAX_CAUSE_DEPTH {
            current = map.get("cause").filter(|cause| !cause.is_null());
        }
    }
    Ok(())
}

/// Render a native error through its error value.
pub fn render_error_to(error: &Error, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_value_to(&error.to_value(), writer)
}

#[cfg(test)]
mod tests {
    use expect_test::{Expect, expect};
    use pretty_assertions::assert_eq;

    use super::*;

    const UNICODE_CONFIG: RenderConfig = RenderConfig {
        color: false,
        filename: Some("test.literal"),
        charset: CharSet::Unicode,
    };

    const ASCII_CONFIG: RenderConfig = RenderConfig {
        color: false,
        filename: Some("test.literal"),
        charset: CharSet::Ascii,
    };

    fn render_parse(error: &ParseError, config: &RenderConfig) -> String {
        let mut buf = Vec::new();
        render_parse_error_to(error, &mut buf, config).unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn check_error(error: &Error, expected: Expect) {
        let mut buf = Vec::new();
        render_error_to(error, &mut buf).unwrap();
        expected.assert_eq(&String::from_utf8_lossy(&buf));
    }

    fn bad_literal() -> ParseError {
        ParseError {
            message: "expected value".to_string(),
            span: 4..5,
            input: "[1, @]".to_string(),
        }
    }

    #[test]
    fn test_parse_error_unicode() {
        let output = render_parse(&bad_literal(), &UNICODE_CONFIG);
        assert!(output.contains("Error: Invalid literal"), "{output}");
        assert!(output.contains("test.literal:1:5"), "{output}");
        assert!(output.contains("[1, @]"), "{output}");
        assert!(output.contains("╰─"), "{output}");
        assert!(output.contains("expected value"), "{output}");
    }

    #[test]
    fn test_parse_error_ascii() {
        let output = render_parse(&bad_literal(), &ASCII_CONFIG);
        assert!(output.contains("test.literal:1:5"), "{output}");
        assert!(output.is_ascii(), "{output}");
    }

    #[test]
    fn test_parser_failures_render() {
        let error = Value::parse("[1, 2").unwrap_err();
        let output = render_parse(&error, &ASCII_CONFIG);
        assert!(output.contains("[1, 2"), "{output}");
        assert!(output.contains("Error: Invalid literal"), "{output}");
    }

    #[test]
    fn test_error_value_report() {
        check_error(
            &Error::argument("upper: Invalid number of arguments, expected 1 but got 0"),
            expect![[r#"
                Error: ArgumentError: upper: Invalid number of arguments, expected 1 but got 0
            "#]],
        );
    }

    #[test]
    fn test_error_value_report_with_causes() {
        let error = Error::Scripting {
            message: "Access denied".into(),
            code: Some(1045),
            cause: Some(Box::new(Error::logic("Connection closed"))),
        };
        check_error(
            &error,
            expect![[r#"
                Error: ScriptingError: Access denied (code 1045)
                Caused by: LogicError: Connection closed
            "#]],
        );
    }

    #[test]
    fn test_values_outside_the_schema() {
        let mut buf = Vec::new();
        render_error_value_to(&Value::from("boom"), &mut buf).unwrap();
        assert_eq!(String::from_utf8_lossy(&buf), "Error: boom\n");
    }

    #[test]
    fn test_render_config_default_charset() {
        let config = RenderConfig::default();
        assert_eq!(config.charset, CharSet::Unicode);
        assert!(config.color);
    }
}
