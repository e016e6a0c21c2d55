//! Human-readable (`descr`) and re-parsable (`repr`) text forms of a [`Value`].
//!
//! Containers that are already being printed further up the stack are written
//! as `[...]` or `{...}`, so self-referencing data prints in finite space.

use core::fmt::Write;

use crate::values::Value;

const INDENT: &str = "    ";

impl Value {
    /// Display text. Top-level strings print bare; `pretty` spreads containers
    /// over multiple indented lines.
    pub fn descr(&self, pretty: bool) -> String {
        let mut printer = Printer::new(Mode::Descr { pretty });
        printer.value(self, 0, true);
        printer.out
    }

    /// Text that [`Value::parse`] reads back as an equal value, for values
    /// built from primitives, Arrays and Maps.
    pub fn repr(&self) -> String {
        let mut printer = Printer::new(Mode::Repr);
        printer.value(self, 0, false);
        printer.out
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Descr { pretty: bool },
    Repr,
}

struct Printer {
    out: String,
    mode: Mode,
    active: Vec<*const ()>,
}

impl Printer {
    fn new(mode: Mode) -> Self {
        Self {
            out: String::new(),
            mode,
            active: Vec::new(),
        }
    }

    fn pretty(&self) -> bool {
        self.mode == Mode::Descr { pretty: true }
    }

    fn value(&mut self, value: &Value, depth: usize, top: bool) {
        match value {
            Value::Undefined => self.out.push_str("undefined"),
            Value::Null => self.out.push_str("null"),
            Value::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Value::Integer(i) => {
                let _ = write!(self.out, "{}", i);
            }
            Value::Float(f) => self.out.push_str(&format_float(*f)),
            Value::String(s) => {
                if top && self.mode != Mode::Repr {
                    self.out.push_str(s);
                } else {
                    quote_into(&mut self.out, s);
                }
            }
            Value::Array(array) => {
                let addr = array.addr();
                if self.active.contains(&addr) {
                    self.out.push_str("[...]");
                    return;
                }
                self.active.push(addr);
                let items = array.to_vec();
                self.sequence('[', ']', depth, items.len(), |printer, index, depth| {
                    printer.value(&items[index], depth, false);
                });
                self.active.pop();
            }
            Value::Map(map) => self.map(map, depth),
            Value::MapRef(weak) => match weak.upgrade() {
                Some(map) => self.map(&map, depth),
                None => self.out.push_str("null"),
            },
            Value::Object(object) => match self.mode {
                Mode::Descr { pretty } => {
                    object.append_descr(&mut self.out, pretty.then_some(depth));
                }
                Mode::Repr => object.append_repr(&mut self.out),
            },
            Value::Function(function) => {
                let _ = write!(self.out, "<Function:{}>", function.name());
            }
        }
    }

    fn map(&mut self, map: &crate::values::Map, depth: usize) {
        let addr = map.addr();
        if self.active.contains(&addr) {
            self.out.push_str("{...}");
            return;
        }
        self.active.push(addr);
        let entries = map.entries();
        self.sequence('{', '}', depth, entries.len(), |printer, index, depth| {
            let (key, value) = &entries[index];
            quote_into(&mut printer.out, key);
            printer.out.push_str(": ");
            printer.value(value, depth, false);
        });
        self.active.pop();
    }

    fn sequence(
        &mut self,
        open: char,
        close: char,
        depth: usize,
        len: usize,
        mut item: impl FnMut(&mut Printer, usize, usize),
    ) {
        self.out.push(open);
        if len == 0 {
            self.out.push(close);
            return;
        }
        let pretty = self.pretty();
        for index in 0..len {
            if index > 0 {
                self.out.push(',');
                if !pretty {
                    self.out.push(' ');
                }
            }
            if pretty {
                self.newline(depth + 1);
            }
            item(self, index, depth + 1);
        }
        if pretty {
            self.newline(depth);
        }
        self.out.push(close);
    }

    fn newline(&mut self, depth: usize) {
        self.out.push('\n');
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
    }
}

/// Formats a float so that it always reads back as a float.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        let text = if f > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else {
        // `{:?}` keeps a fractional part (`1.0`) or uses exponent notation
        // (`1e16`), both of which the literal grammar reads as floats.
        format!("{:?}", f)
    }
}

/// Appends `s` as a double-quoted literal with escapes.
pub fn quote_into(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
