//! Call records: which contract operation was invoked, with which arguments.

use crate::context::Context;
use crate::value::Value;
use std::fmt;
use std::time::Duration;

/// Operations of the [`Cache`](crate::Cache) contract, as seen by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    IsConnected,
    Get,
    Set,
    SetWithExpiration,
    Del,
    DelWithPattern,
    Keys,
    Close,
}

/// Number of positional arguments an operation takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    /// Variadic tail: at least this many arguments.
    AtLeast(usize),
}

/// Result shape an operation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `bool` (is_connected)
    Connected,
    /// `Result<String>` (get)
    Value,
    /// `Result<Vec<String>>` (keys)
    Keys,
    /// `Result<()>` (everything else)
    Unit,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::IsConnected,
        Method::Get,
        Method::Set,
        Method::SetWithExpiration,
        Method::Del,
        Method::DelWithPattern,
        Method::Keys,
        Method::Close,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Method::IsConnected => "IsConnected",
            Method::Get => "Get",
            Method::Set => "Set",
            Method::SetWithExpiration => "SetWithExpiration",
            Method::Del => "Del",
            Method::DelWithPattern => "DelWithPattern",
            Method::Keys => "Keys",
            Method::Close => "Close",
        }
    }

    /// Argument arity. The context counts as the first argument; `Close` takes none.
    pub fn arity(&self) -> Arity {
        match self {
            Method::Close => Arity::Exactly(0),
            Method::IsConnected => Arity::Exactly(1),
            Method::Get | Method::DelWithPattern | Method::Keys => Arity::Exactly(2),
            Method::Set => Arity::Exactly(3),
            Method::SetWithExpiration => Arity::Exactly(4),
            Method::Del => Arity::AtLeast(2),
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Method::IsConnected => Shape::Connected,
            Method::Get => Shape::Value,
            Method::Keys => Shape::Keys,
            Method::Set
            | Method::SetWithExpiration
            | Method::Del
            | Method::DelWithPattern
            | Method::Close => Shape::Unit,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One concrete argument of a call.
///
/// Keys, patterns and string values are all [`Arg::Str`], so an exact
/// matcher built from `"john"` matches `set(ctx, "user:1", "john")`.
/// Non-string values keep their [`Value`] variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Context(Context),
    Str(String),
    Value(Value),
    Duration(Duration),
}

impl Arg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&Context> {
        match self {
            Arg::Context(ctx) => Some(ctx),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Arg::Duration(d) => Some(*d),
            _ => None,
        }
    }

    /// The argument as a stored value; strings convert to `Value::Str`.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Arg::Str(s) => Some(Value::Str(s.clone())),
            Arg::Value(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Context(ctx) => write!(f, "{:?}", ctx),
            Arg::Str(s) => write!(f, "{:?}", s),
            Arg::Value(v) => write!(f, "{:?}", v),
            Arg::Duration(d) => write!(f, "{:?}", d),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        match value {
            Value::Str(s) => Arg::Str(s),
            other => Arg::Value(other),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<&String> for Arg {
    fn from(s: &String) -> Self {
        Arg::Str(s.clone())
    }
}

impl From<Context> for Arg {
    fn from(ctx: Context) -> Self {
        Arg::Context(ctx)
    }
}

impl From<&Context> for Arg {
    fn from(ctx: &Context) -> Self {
        Arg::Context(ctx.clone())
    }
}

impl From<Duration> for Arg {
    fn from(d: Duration) -> Self {
        Arg::Duration(d)
    }
}

macro_rules! arg_from_value {
    ($($t:ty),+) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Arg::from(Value::from(v))
                }
            }
        )+
    };
}

arg_from_value!(bool, i32, i64, u32, u64, usize, f64, Vec<u8>);

/// An actual invocation: method plus concrete positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub method: Method,
    pub args: Vec<Arg>,
}

impl CallRecord {
    pub fn new(method: Method, args: Vec<Arg>) -> Self {
        CallRecord { method, args }
    }
}

impl fmt::Display for CallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.method)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}
