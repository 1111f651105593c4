//! Values accepted by `set` and `set_with_expiration`.
//!
//! Every variant has one canonical byte form: the form stores persist and the
//! string `get` hands back. Numbers are written in decimal, booleans as `1`/`0`,
//! structured data as JSON via [`Value::json`].

use crate::error::Result;
use serde::Serialize;
use std::fmt;

/// A storable cache value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Bytes(Vec<u8>),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl Value {
    /// Encode any serializable value as a JSON string value.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if serde serialization fails.
    ///
    /// # Example
    ///
    /// ```
    /// use cache_contract::Value;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Session { user: String, admin: bool }
    ///
    /// let value = Value::json(&Session { user: "john".into(), admin: false }).unwrap();
    /// assert_eq!(value.to_string(), r#"{"user":"john","admin":false}"#);
    /// ```
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Value::Str(serde_json::to_string(value)?))
    }

    /// Canonical byte form written to the store.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Bytes(bytes) => bytes.clone(),
            other => other.to_string().into_bytes(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Bytes(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            Value::Int(n) => write!(f, "{}", n),
            Value::UInt(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Bytes(bytes.to_vec())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(f64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

macro_rules! value_from_int {
    ($variant:ident: $target:ty => $($t:ty),+) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::$variant(n as $target)
                }
            }
        )+
    };
}

value_from_int!(Int: i64 => i8, i16, i32, i64, isize);
value_from_int!(UInt: u64 => u8, u16, u32, u64, usize);
