//! Structured literal decoding for loosely typed wire input
//!
//! Query strings deliver nested values as text. A literal is decoded in two
//! steps:
//! 1. strict JSON;
//! 2. a relaxed literal grammar accepting single-quoted strings,
//!    `True`/`False`/`None`, tuples in parentheses and trailing commas.
//!
//! List fields add a third step: text that does not open with `[` or `(`
//! is split on commas instead. Text that does open a bracket must decode,
//! it never falls back to splitting.

use serde_json::{Map, Number, Value};
use std::iter::Peekable;
use std::str::Chars;

/// Maximum nesting accepted by the relaxed grammar
pub const MAX_DEPTH: usize = 64;

/// Decode a structured literal (JSON, then relaxed grammar)
pub fn parse(input: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(input) {
        return Some(value);
    }
    parse_relaxed(input)
}

/// Decode text destined for a list field
///
/// Returns `None` when bracketed text is not a valid list literal.
pub fn decode_list(input: &str) -> Option<Vec<Value>> {
    let trimmed = input.trim();
    if trimmed.starts_with('[') || trimmed.starts_with('(') {
        return match parse(trimmed)? {
            Value::Array(items) => Some(items),
            _ => None,
        };
    }
    Some(split(trimmed))
}

/// Naive comma split with trimmed items
pub fn split(input: &str) -> Vec<Value> {
    if input.trim().is_empty() {
        return Vec::new();
    }
    input
        .split(',')
        .map(|item| Value::String(item.trim().to_string()))
        .collect()
}

fn parse_relaxed(input: &str) -> Option<Value> {
    let mut parser = Parser {
        chars: input.chars().peekable(),
        depth: 0,
    };
    let value = parser.value()?;
    parser.skip_ws();
    match parser.chars.peek() {
        None => Some(value),
        Some(_) => None,
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn value(&mut self) -> Option<Value> {
        self.skip_ws();
        match *self.chars.peek()? {
            '[' => self.sequence(']'),
            '(' => self.sequence(')'),
            '{' => self.mapping(),
            '\'' | '"' => self.string().map(Value::String),
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            c if c.is_alphabetic() => self.keyword(),
            _ => None,
        }
    }

    fn sequence(&mut self, close: char) -> Option<Value> {
        let tuple = close == ')';
        self.enter()?;
        self.chars.next();

        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            self.skip_ws();
            if self.eat(close) {
                break;
            }
            items.push(self.value()?);
            self.skip_ws();
            if self.eat(',') {
                saw_comma = true;
                continue;
            }
            if self.eat(close) {
                break;
            }
            return None;
        }
        self.depth -= 1;

        // `(x)` is a parenthesised value, `(x,)` a 1-tuple
        if tuple && items.len() == 1 && !saw_comma {
            return items.pop();
        }
        Some(Value::Array(items))
    }

    fn mapping(&mut self) -> Option<Value> {
        self.enter()?;
        self.chars.next();

        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.eat('}') {
                break;
            }
            let key = match self.chars.peek()? {
                '\'' | '"' => self.string()?,
                _ => return None,
            };
            self.skip_ws();
            if !self.eat(':') {
                return None;
            }
            let value = self.value()?;
            map.insert(key, value);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                break;
            }
            return None;
        }
        self.depth -= 1;
        Some(Value::Object(map))
    }

    fn string(&mut self) -> Option<String> {
        let quote = self.chars.next()?;
        let mut out = String::new();
        loop {
            match self.chars.next()? {
                '\\' => match self.chars.next()? {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '0' => out.push('\0'),
                    c @ ('\\' | '\'' | '"') => out.push(c),
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                },
                c if c == quote => return Some(out),
                c => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Option<Value> {
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E' | '_') {
                if c != '_' {
                    text.push(c);
                }
                self.chars.next();
            } else {
                break;
            }
        }

        if !text.contains(['.', 'e', 'E']) {
            if let Ok(int) = text.parse::<i64>() {
                return Some(Value::Number(Number::from(int)));
            }
        }
        let float = text.parse::<f64>().ok()?;
        Number::from_f64(float).map(Value::Number)
    }

    fn keyword(&mut self) -> Option<Value> {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        match word.as_str() {
            "True" | "true" => Some(Value::Bool(true)),
            "False" | "false" => Some(Value::Bool(false)),
            "None" | "null" => Some(Value::Null),
            _ => None,
        }
    }

    fn enter(&mut self) -> Option<()> {
        self.depth += 1;
        (self.depth <= MAX_DEPTH).then_some(())
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek() == Some(&expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }
}
