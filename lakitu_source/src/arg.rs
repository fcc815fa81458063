use core::fmt;

use serde::{Deserialize, Serialize};

/// A single argument of a macro call.
///
/// Numeric literals are decoded eagerly. Everything else (identifiers, `A | B` flag
/// expressions, `&name.l` references, `name + 12` offsets) is kept as trimmed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arg {
    /// A decimal or hex integer literal.
    Int(i64),
    /// A floating point literal, with or without a trailing `f`.
    Float(f64),
    /// Any other argument text.
    Symbol(String),
}

impl Arg {
    /// Classify a raw argument.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some(value) = parse_int(text) {
            Arg::Int(value)
        } else if let Some(value) = parse_float(text) {
            Arg::Float(value)
        } else {
            Arg::Symbol(text.to_owned())
        }
    }

    /// Returns the value if this is an integer literal.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Arg::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value if this is a numeric literal.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Arg::Int(value) => Some(*value as f32),
            Arg::Float(value) => Some(*value as f32),
            Arg::Symbol(_) => None,
        }
    }

    /// Returns the text if this is not a numeric literal.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Arg::Symbol(text) => Some(text),
            _ => None,
        }
    }

    /// Interprets `TRUE`/`FALSE`, `G_ON`/`G_OFF`, and integers as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Arg::Int(value) => Some(*value != 0),
            Arg::Float(_) => None,
            Arg::Symbol(text) => match text.as_str() {
                "TRUE" | "G_ON" | "true" => Some(true),
                "FALSE" | "G_OFF" | "false" => Some(false),
                _ => None,
            },
        }
    }

    /// Splits a flag expression such as `G_LIGHTING | G_CULL_BACK` into its names.
    pub fn flags(&self) -> Vec<String> {
        match self {
            Arg::Symbol(text) => text
                .split('|')
                .map(|flag| flag.trim())
                .filter(|flag| !flag.is_empty())
                .map(str::to_owned)
                .collect(),
            Arg::Int(value) => vec![format!("{:#X}", value)],
            Arg::Float(value) => vec![value.to_string()],
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(value) => write!(f, "{}", value),
            Arg::Float(value) => write!(f, "{}", value),
            Arg::Symbol(text) => write!(f, "{}", text),
        }
    }
}

impl From<&str> for Arg {
    fn from(text: &str) -> Self {
        Arg::parse(text)
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            i64::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.parse().ok()?
        }
        None => return None,
    };
    Some(if negative { -value } else { value })
}

fn parse_float(text: &str) -> Option<f64> {
    let body = text
        .strip_suffix('f')
        .or_else(|| text.strip_suffix('F'))
        .unwrap_or(text);
    let valid = body.bytes().any(|b| b.is_ascii_digit())
        && body
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if valid {
        body.parse().ok()
    } else {
        None
    }
}
