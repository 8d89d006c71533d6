//! Typed scalar values and the scanner that infers them from raw tokens.

use crate::ScalarStyle;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static STRICT_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?[0-9]+$").unwrap());

static LENIENT_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?[0-9]+(?:[_,][0-9]+)*$").unwrap());

static FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^[-+]?(?:[0-9][0-9_]*)?\.[0-9]+(?:[eE][-+]?[0-9]+)?$",
        r"|^[-+]?[0-9][0-9_]*(?:\.[0-9]*)?[eE][-+]?[0-9]+$",
        r"|^[-+]?[0-9][0-9_]*\.$",
    ))
    .unwrap()
});

/// A scalar after type inference.
#[derive(Debug, Clone)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Numeric value of an integer or float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Human-readable type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "boolean",
            Scalar::Integer(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::String(_) => "string",
        }
    }
}

/// Integers and floats compare numerically, so `1 == 1.0`.
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Integer(a), Scalar::Integer(b)) => a == b,
            (Scalar::String(a), Scalar::String(b)) => a == b,
            (Scalar::Float(_), _) | (_, Scalar::Float(_)) => {
                match (self.as_f64(), other.as_f64()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(x) if x.is_nan() => write!(f, "NaN"),
            Scalar::Float(x) if x.is_infinite() => {
                write!(f, "{}", if *x > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Scalar::Float(x) if x.fract() == 0.0 => write!(f, "{:.1}", x),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::String(s) => write!(f, "{}", s),
        }
    }
}

/// Infers native scalar types from raw YAML tokens.
///
/// Quoted scalars are always strings. Plain scalars are tried, in order, as
/// null, boolean, integer and float before falling back to a string.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarScanner {
    /// Only accept bare digit runs as decimal integers (no `_` or `,`
    /// separators)
    pub strict_integer: bool,
}

impl ScalarScanner {
    pub fn new(strict_integer: bool) -> Self {
        Self { strict_integer }
    }

    /// Turn a raw token into a typed scalar.
    pub fn tokenize(&self, raw: &str, style: ScalarStyle) -> Scalar {
        if style == ScalarStyle::Quoted {
            return Scalar::String(raw.to_string());
        }

        match raw {
            "" | "~" | "null" | "Null" | "NULL" => return Scalar::Null,
            "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => {
                return Scalar::Bool(true);
            }
            "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => {
                return Scalar::Bool(false);
            }
            ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
                return Scalar::Float(f64::INFINITY);
            }
            "-.inf" | "-.Inf" | "-.INF" => return Scalar::Float(f64::NEG_INFINITY),
            ".nan" | ".NaN" | ".NAN" => return Scalar::Float(f64::NAN),
            _ => {}
        }

        if let Some(i) = self.parse_integer(raw) {
            return Scalar::Integer(i);
        }

        if FLOAT.is_match(raw) {
            if let Ok(f) = raw.replace('_', "").parse::<f64>() {
                return Scalar::Float(f);
            }
        }

        Scalar::String(raw.to_string())
    }

    fn parse_integer(&self, raw: &str) -> Option<i64> {
        let (negative, unsigned) = match raw.as_bytes().first() {
            Some(b'-') => (true, &raw[1..]),
            Some(b'+') => (false, &raw[1..]),
            _ => (false, raw),
        };

        let radix = if let Some(hex) = unsigned.strip_prefix("0x") {
            Some((hex, 16))
        } else {
            unsigned.strip_prefix("0o").map(|oct| (oct, 8))
        };

        if let Some((digits, radix)) = radix {
            let value = i64::from_str_radix(digits, radix).ok()?;
            return Some(if negative { -value } else { value });
        }

        let pattern = if self.strict_integer {
            &*STRICT_INTEGER
        } else {
            &*LENIENT_INTEGER
        };
        if !pattern.is_match(raw) {
            return None;
        }

        raw.replace(['_', ','], "").parse::<i64>().ok()
    }
}
