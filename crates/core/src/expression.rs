//! Literal-only evaluation of JSX attribute expressions.
//!
//! Attribute values such as `data={[["a", 1], ["b", 2]]}` are read as data,
//! never executed. Anything that is not a literal is kept verbatim as
//! [`LiteralValue::Opaque`] so callers can decide what to do with it.

use serde_json::{Map, Number, Value as JsonValue};
use std::fmt::Write as _;

/// A value read from a JavaScript literal expression.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// `null` or `undefined`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Any numeric literal
    Number(f64),
    /// String literal, escapes decoded
    String(String),
    /// Array literal
    Array(Vec<LiteralValue>),
    /// Object literal, keys in source order
    Object(Vec<(String, LiteralValue)>),
    /// Source text that is not a literal
    Opaque(String),
}

impl LiteralValue {
    /// Whether this value, or anything nested in it, is opaque.
    pub fn contains_opaque(&self) -> bool {
        match self {
            LiteralValue::Opaque(_) => true,
            LiteralValue::Array(items) => items.iter().any(LiteralValue::contains_opaque),
            LiteralValue::Object(entries) => entries.iter().any(|(_, value)| value.contains_opaque()),
            _ => false,
        }
    }

    /// String content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Short name of the value's type, for messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            LiteralValue::Null => "null",
            LiteralValue::Bool(_) => "boolean",
            LiteralValue::Number(_) => "number",
            LiteralValue::String(_) => "string",
            LiteralValue::Array(_) => "array",
            LiteralValue::Object(_) => "object",
            LiteralValue::Opaque(_) => "expression",
        }
    }

    /// JSON form of the value. Returns `None` when an opaque part is present.
    pub fn to_json(&self) -> Option<JsonValue> {
        Some(match self {
            LiteralValue::Null => JsonValue::Null,
            LiteralValue::Bool(value) => JsonValue::Bool(*value),
            LiteralValue::Number(value) => number_to_json(*value),
            LiteralValue::String(value) => JsonValue::String(value.clone()),
            LiteralValue::Array(items) => JsonValue::Array(
                items
                    .iter()
                    .map(LiteralValue::to_json)
                    .collect::<Option<Vec<_>>>()?,
            ),
            LiteralValue::Object(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), value.to_json()?);
                }
                JsonValue::Object(map)
            }
            LiteralValue::Opaque(_) => return None,
        })
    }

    /// Build a literal from JSON.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => LiteralValue::Null,
            JsonValue::Bool(value) => LiteralValue::Bool(*value),
            JsonValue::Number(number) => LiteralValue::Number(number.as_f64().unwrap_or(0.0)),
            JsonValue::String(value) => LiteralValue::String(value.clone()),
            JsonValue::Array(items) => {
                LiteralValue::Array(items.iter().map(LiteralValue::from_json).collect())
            }
            JsonValue::Object(map) => LiteralValue::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), LiteralValue::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// JavaScript source for the value that [`evaluate`] reads back.
    ///
    /// Braces inside strings are written as unicode escapes so the emitted
    /// text stays brace-balanced inside an MDX `{…}` attribute.
    ///
    /// ```
    /// use mdxblocks_core::expression::{LiteralValue, evaluate};
    ///
    /// let value = LiteralValue::Array(vec![
    ///     LiteralValue::String("{a}".into()),
    ///     LiteralValue::Number(2.0),
    /// ]);
    /// let source = value.to_source();
    /// assert_eq!(source, r#"["\u007ba\u007d", 2]"#);
    /// assert_eq!(evaluate(&source), value);
    /// ```
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    fn write_source(&self, out: &mut String) {
        match self {
            LiteralValue::Null => out.push_str("null"),
            LiteralValue::Bool(value) => out.push_str(if *value { "true" } else { "false" }),
            LiteralValue::Number(value) => out.push_str(&format_number(*value)),
            LiteralValue::String(value) => write_string(value, out),
            LiteralValue::Array(items) => {
                out.push('[');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    item.write_source(out);
                }
                out.push(']');
            }
            LiteralValue::Object(entries) if entries.is_empty() => out.push_str("{}"),
            LiteralValue::Object(entries) => {
                out.push_str("{ ");
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    if is_identifier(key) {
                        out.push_str(key);
                    } else {
                        write_string(key, out);
                    }
                    out.push_str(": ");
                    value.write_source(out);
                }
                out.push_str(" }");
            }
            LiteralValue::Opaque(raw) => out.push_str(raw),
        }
    }
}

/// Formats a number the way JavaScript prints it for integral values.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn number_to_json(value: f64) -> JsonValue {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        JsonValue::Number(Number::from(value as i64))
    } else {
        Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
    }
}

fn write_string(value: &str, out: &mut String) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '{' => out.push_str("\\u007b"),
            '}' => out.push_str("\\u007d"),
            ch if ch.is_control() => {
                let _ = write!(out, "\\u{:04x}", ch as u32);
            }
            ch => out.push(ch),
        }
    }
    out.push('"');
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(ch) if ch.is_alphabetic() || ch == '_' || ch == '$')
        && chars.all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$')
}

/// Evaluate a JavaScript expression as a literal.
///
/// Never fails: input that is not a literal, as a whole or in part, comes
/// back as [`LiteralValue::Opaque`] holding the original text.
///
/// ```
/// use mdxblocks_core::expression::{LiteralValue, evaluate};
///
/// assert_eq!(evaluate("true"), LiteralValue::Bool(true));
/// assert_eq!(evaluate(" 0x10 "), LiteralValue::Number(16.0));
/// assert_eq!(evaluate("props.title"), LiteralValue::Opaque("props.title".into()));
/// ```
pub fn evaluate(expression: &str) -> LiteralValue {
    let mut reader = Reader::new(expression);
    reader.skip_trivia();
    let value = reader.value();
    reader.skip_trivia();
    match value {
        Some(value) if reader.at_end() => value,
        _ => LiteralValue::Opaque(expression.trim().to_string()),
    }
}

struct Reader<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                self.pos += rest.find('\n').unwrap_or(rest.len());
            } else if rest.starts_with("/*") {
                self.pos += rest[2..].find("*/").map_or(rest.len(), |end| end + 4);
            } else if self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            } else {
                return;
            }
        }
    }

    /// Reads one value. `None` means the input is malformed at this point,
    /// which makes the whole expression opaque.
    fn value(&mut self) -> Option<LiteralValue> {
        match self.peek()? {
            '[' => self.array(),
            '{' => self.object(),
            '"' | '\'' => {
                let quote = self.bump()?;
                self.string(quote).map(LiteralValue::String)
            }
            '`' => self.template(),
            ch if ch.is_ascii_digit() || ch == '.' => self.number(),
            '-' | '+'
                if self
                    .peek_second()
                    .is_some_and(|next| next.is_ascii_digit() || next == '.' || next == 'I') =>
            {
                self.number()
            }
            ch if ch.is_alphabetic() || ch == '_' || ch == '$' => self.keyword(),
            _ => self.opaque(),
        }
    }

    fn array(&mut self) -> Option<LiteralValue> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek()? {
                ']' => {
                    self.bump();
                    return Some(LiteralValue::Array(items));
                }
                ',' => {
                    // Hole, as in `[1, , 2]`.
                    self.bump();
                    items.push(LiteralValue::Null);
                    continue;
                }
                _ => {}
            }
            items.push(self.value()?);
            self.skip_trivia();
            match self.bump()? {
                ',' => {}
                ']' => return Some(LiteralValue::Array(items)),
                _ => return None,
            }
        }
    }

    fn object(&mut self) -> Option<LiteralValue> {
        self.bump();
        let mut entries: Vec<(String, LiteralValue)> = Vec::new();
        loop {
            self.skip_trivia();
            let key = match self.peek()? {
                '}' => {
                    self.bump();
                    return Some(LiteralValue::Object(entries));
                }
                '"' | '\'' => {
                    let quote = self.bump()?;
                    self.string(quote)?
                }
                ch if ch.is_ascii_digit() => match self.number()? {
                    LiteralValue::Number(value) => format_number(value),
                    _ => return None,
                },
                ch if ch.is_alphabetic() || ch == '_' || ch == '$' => self.identifier().to_string(),
                _ => return None,
            };
            self.skip_trivia();
            let value = match self.peek()? {
                ':' => {
                    self.bump();
                    self.skip_trivia();
                    self.value()?
                }
                // Shorthand `{ title }` refers to a variable.
                ',' | '}' => LiteralValue::Opaque(key.clone()),
                _ => return None,
            };
            match entries.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }
            self.skip_trivia();
            match self.bump()? {
                ',' => {}
                '}' => return Some(LiteralValue::Object(entries)),
                _ => return None,
            }
        }
    }

    fn string(&mut self, quote: char) -> Option<String> {
        let mut out = String::new();
        loop {
            match self.bump()? {
                ch if ch == quote => return Some(out),
                '\\' => self.escape(&mut out)?,
                '\n' if quote != '`' => return None,
                ch => out.push(ch),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Option<()> {
        match self.bump()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            'x' => {
                let hex = self.take(2)?;
                out.push(char::from_u32(u32::from_str_radix(hex, 16).ok()?)?);
            }
            'u' => {
                let code = if self.peek() == Some('{') {
                    self.bump();
                    let end = self.rest().find('}')?;
                    let hex = self.take(end)?;
                    self.bump();
                    u32::from_str_radix(hex, 16).ok()?
                } else {
                    u32::from_str_radix(self.take(4)?, 16).ok()?
                };
                // Lone surrogates have no char; keep the replacement character.
                out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            // Line continuation.
            '\n' => {}
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            ch => out.push(ch),
        }
        Some(())
    }

    fn take(&mut self, len: usize) -> Option<&'a str> {
        let slice = self.rest().get(..len)?;
        self.pos += len;
        Some(slice)
    }

    fn template(&mut self) -> Option<LiteralValue> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump()? {
                '`' => return Some(LiteralValue::String(out)),
                '\\' => self.escape(&mut out)?,
                '$' if self.peek() == Some('{') => {
                    // Interpolation: keep the whole template verbatim.
                    self.pos = start;
                    return self.opaque();
                }
                ch => out.push(ch),
            }
        }
    }

    fn number(&mut self) -> Option<LiteralValue> {
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };
        let sign = if negative { -1.0 } else { 1.0 };
        if self.rest().starts_with("Infinity") {
            self.pos += "Infinity".len();
            return Some(LiteralValue::Number(sign * f64::INFINITY));
        }

        let rest = self.rest();
        let radix = match rest.get(..2) {
            Some("0x" | "0X") => 16,
            Some("0o" | "0O") => 8,
            Some("0b" | "0B") => 2,
            _ => 10,
        };
        if radix != 10 {
            self.pos += 2;
            let digits = self.scan(|ch| ch.is_digit(radix) || ch == '_');
            let digits = digits.replace('_', "");
            let value = u64::from_str_radix(&digits, radix).ok()?;
            return Some(LiteralValue::Number(sign * value as f64));
        }

        let start = self.pos;
        self.scan(|ch| ch.is_ascii_digit() || ch == '_');
        if self.peek() == Some('.') {
            self.bump();
            self.scan(|ch| ch.is_ascii_digit() || ch == '_');
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            self.scan(|ch| ch.is_ascii_digit());
        }
        let text = self.source[start..self.pos].replace('_', "");
        // BigInt suffix.
        if self.peek() == Some('n') {
            self.bump();
        }
        let value: f64 = text.parse().ok()?;
        Some(LiteralValue::Number(sign * value))
    }

    fn scan(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&accept) {
            self.bump();
        }
        &self.source[start..self.pos]
    }

    fn identifier(&mut self) -> &'a str {
        self.scan(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$')
    }

    fn keyword(&mut self) -> Option<LiteralValue> {
        let start = self.pos;
        let word = self.identifier();
        let value = match word {
            "true" => LiteralValue::Bool(true),
            "false" => LiteralValue::Bool(false),
            "null" | "undefined" => LiteralValue::Null,
            "NaN" => LiteralValue::Number(f64::NAN),
            "Infinity" => LiteralValue::Number(f64::INFINITY),
            _ => {
                self.pos = start;
                return self.opaque();
            }
        };
        // `true.toString()` and friends are not literals.
        let save = self.pos;
        self.skip_trivia();
        if matches!(self.peek(), None | Some(',' | ']' | '}')) {
            self.pos = save;
            Some(value)
        } else {
            self.pos = start;
            self.opaque()
        }
    }

    /// Consumes a non-literal token up to the next top-level `,` or closing
    /// bracket and returns it verbatim.
    fn opaque(&mut self) -> Option<LiteralValue> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(ch) = self.peek() {
            match ch {
                '"' | '\'' | '`' => {
                    self.bump();
                    if self.skip_raw_string(ch).is_none() {
                        break;
                    }
                    continue;
                }
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' if depth == 0 => break,
                ')' | ']' | '}' => depth -= 1,
                ',' if depth == 0 => break,
                _ => {}
            }
            self.bump();
        }
        let raw = self.source[start..self.pos].trim();
        if raw.is_empty() {
            None
        } else {
            Some(LiteralValue::Opaque(raw.to_string()))
        }
    }

    fn skip_raw_string(&mut self, quote: char) -> Option<()> {
        loop {
            match self.bump()? {
                ch if ch == quote => return Some(()),
                '\\' => {
                    self.bump()?;
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(value: &str) -> LiteralValue {
        LiteralValue::String(value.to_string())
    }

    #[test]
    fn test_scalars() {
        assert_eq!(evaluate("null"), LiteralValue::Null);
        assert_eq!(evaluate("undefined"), LiteralValue::Null);
        assert_eq!(evaluate("false"), LiteralValue::Bool(false));
        assert_eq!(evaluate("-1.5e2"), LiteralValue::Number(-150.0));
        assert_eq!(evaluate("1_000"), LiteralValue::Number(1000.0));
        assert_eq!(evaluate("'it\\'s'"), string("it's"));
        assert_eq!(evaluate("\"tab\\there\""), string("tab\there"));
        assert_eq!(evaluate("`plain`"), string("plain"));
        assert_eq!(evaluate("\"\\u{1F600}\""), string("\u{1F600}"));
    }

    #[test]
    fn test_table_data() {
        let value = evaluate(
            r#"[
                ["Name", "Age"], // header
                ["Ann", 30],
                ["Bob", 41,],
            ]"#,
        );
        assert_eq!(
            value,
            LiteralValue::Array(vec![
                LiteralValue::Array(vec![string("Name"), string("Age")]),
                LiteralValue::Array(vec![string("Ann"), LiteralValue::Number(30.0)]),
                LiteralValue::Array(vec![string("Bob"), LiteralValue::Number(41.0)]),
            ])
        );
    }

    #[test]
    fn test_objects_with_mixed_keys() {
        let value = evaluate("{ label: 'Name', \"sortable\": true, 2: null, /* c */ }");
        assert_eq!(
            value,
            LiteralValue::Object(vec![
                ("label".into(), string("Name")),
                ("sortable".into(), LiteralValue::Bool(true)),
                ("2".into(), LiteralValue::Null),
            ])
        );
    }

    #[test]
    fn test_opaque_parts_are_element_wise() {
        let value = evaluate("[1, foo(2, 3), `a${b}`]");
        assert_eq!(
            value,
            LiteralValue::Array(vec![
                LiteralValue::Number(1.0),
                LiteralValue::Opaque("foo(2, 3)".into()),
                LiteralValue::Opaque("`a${b}`".into()),
            ])
        );
        assert!(value.contains_opaque());
        assert_eq!(value.to_json(), None);
    }

    #[test]
    fn test_whole_expression_opaque() {
        assert_eq!(evaluate("a + b"), LiteralValue::Opaque("a + b".into()));
        assert_eq!(evaluate("true && x"), LiteralValue::Opaque("true && x".into()));
        assert_eq!(evaluate("[1, 2"), LiteralValue::Opaque("[1, 2".into()));
        assert_eq!(evaluate(""), LiteralValue::Opaque(String::new()));
        assert_eq!(evaluate("/* only */"), LiteralValue::Opaque("/* only */".into()));
    }

    #[test]
    fn test_source_reads_back() {
        let value = LiteralValue::Object(vec![
            ("label".into(), string("Say \"hi\"\n{x}")),
            ("data-id".into(), LiteralValue::Number(0.25)),
            ("items".into(), LiteralValue::Array(vec![])),
            ("meta".into(), LiteralValue::Object(vec![])),
        ]);
        let source = value.to_source();
        assert!(!source.contains("{x}"));
        assert_eq!(evaluate(&source), value);
    }

    #[test]
    fn test_json_conversion() {
        let value = evaluate("{ cols: 3, ratio: 0.5, tags: ['a'] }");
        assert_eq!(
            value.to_json(),
            Some(serde_json::json!({"cols": 3, "ratio": 0.5, "tags": ["a"]}))
        );
        assert_eq!(
            LiteralValue::from_json(&serde_json::json!([true, null])),
            LiteralValue::Array(vec![LiteralValue::Bool(true), LiteralValue::Null])
        );
    }
}
