//! Argument matchers for expectations.
//!
//! The engine never interprets argument contents: a glob pattern passed to
//! `keys` is compared like any other string. Matchers only test equality or
//! run a predicate.

use super::call::Arg;
use crate::context::Context;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type ArgPredicate = Arc<dyn Fn(&Arg) -> bool + Send + Sync>;
type RestPredicate = Arc<dyn Fn(&[Arg]) -> bool + Send + Sync>;

/// Accepts or rejects one positional argument (or, for [`Matcher::Rest`], a tail).
#[derive(Clone)]
pub enum Matcher {
    /// Deep equality with the given argument.
    Exact(Arg),
    /// Wildcard.
    Any,
    /// Custom test on the actual argument.
    Predicate(ArgPredicate),
    /// Consumes every remaining argument (at least one). Only valid as the
    /// last matcher of a `Del` expectation, to match a variable key list.
    Rest(RestPredicate),
}

impl Matcher {
    pub fn any() -> Self {
        Matcher::Any
    }

    pub fn eq(arg: impl Into<Arg>) -> Self {
        Matcher::Exact(arg.into())
    }

    /// Match when `predicate` returns true for the actual argument.
    ///
    /// ```
    /// use cache_contract::mock::Matcher;
    ///
    /// let user_keys = Matcher::when(|arg| {
    ///     arg.as_str().is_some_and(|key| key.starts_with("user:"))
    /// });
    /// ```
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&Arg) -> bool + Send + Sync + 'static,
    {
        Matcher::Predicate(Arc::new(predicate))
    }

    /// Match a non-empty tail of arguments with one predicate.
    pub fn rest<F>(predicate: F) -> Self
    where
        F: Fn(&[Arg]) -> bool + Send + Sync + 'static,
    {
        Matcher::Rest(Arc::new(predicate))
    }

    /// Accept any non-empty tail.
    pub fn any_rest() -> Self {
        Matcher::rest(|_| true)
    }

    /// Accept a tail holding exactly `keys`, in any order.
    pub fn keys_unordered<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut expected: Vec<String> = keys.into_iter().map(Into::into).collect();
        expected.sort();
        Matcher::rest(move |args| {
            let mut actual: Vec<&str> = args.iter().filter_map(Arg::as_str).collect();
            if actual.len() != args.len() {
                return false;
            }
            actual.sort_unstable();
            actual.len() == expected.len()
                && actual.iter().zip(&expected).all(|(a, e)| *a == e.as_str())
        })
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Matcher::Rest(_))
    }

    /// Test a single argument. A `Rest` matcher never accepts a single argument.
    pub fn accepts(&self, arg: &Arg) -> bool {
        match self {
            Matcher::Exact(expected) => expected == arg,
            Matcher::Any => true,
            Matcher::Predicate(predicate) => predicate(arg),
            Matcher::Rest(_) => false,
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact(arg) => write!(f, "{}", arg),
            Matcher::Any => f.write_str("Any"),
            Matcher::Predicate(_) => f.write_str("<predicate>"),
            Matcher::Rest(_) => f.write_str("<rest..>"),
        }
    }
}

impl From<Arg> for Matcher {
    fn from(arg: Arg) -> Self {
        Matcher::Exact(arg)
    }
}

macro_rules! matcher_from_arg {
    ($($t:ty),+) => {
        $(
            impl From<$t> for Matcher {
                fn from(v: $t) -> Self {
                    Matcher::Exact(Arg::from(v))
                }
            }
        )+
    };
}

matcher_from_arg!(
    &str,
    String,
    &String,
    Context,
    &Context,
    Duration,
    Value,
    bool,
    i32,
    i64,
    u32,
    u64,
    usize,
    f64,
    Vec<u8>
);

/// Build a matcher list from exact values and explicit matchers.
///
/// Each element goes through `Matcher::from`, so literals become exact
/// matchers and `Matcher` values are kept as-is.
///
/// ```
/// use cache_contract::{args, Context};
/// use cache_contract::mock::Matcher;
///
/// let ctx = Context::background();
/// let matchers = args![&ctx, "user:1", Matcher::any()];
/// assert_eq!(matchers.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::mock::Matcher>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        vec![$($crate::mock::Matcher::from($arg)),+]
    };
}
