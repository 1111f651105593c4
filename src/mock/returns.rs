//! Return behaviors: what a matched expectation hands back to the caller.

use super::call::{Arg, Method, Shape};
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// A contract-shaped result produced by an expectation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Connected(bool),
    Value(Result<String>),
    Keys(Result<Vec<String>>),
    Unit(Result<()>),
}

impl Outcome {
    pub fn shape(&self) -> Shape {
        match self {
            Outcome::Connected(_) => Shape::Connected,
            Outcome::Value(_) => Shape::Value,
            Outcome::Keys(_) => Shape::Keys,
            Outcome::Unit(_) => Shape::Unit,
        }
    }

    // The coercions below panic on a shape mismatch: a `return_with` closure
    // that produced the wrong kind of outcome is a broken test, not a runtime error.

    pub(crate) fn into_connected(self, method: Method) -> bool {
        match self {
            Outcome::Connected(connected) => connected,
            other => shape_mismatch(method, &other),
        }
    }

    pub(crate) fn into_value(self, method: Method) -> Result<String> {
        match self {
            Outcome::Value(result) => result,
            other => shape_mismatch(method, &other),
        }
    }

    pub(crate) fn into_keys(self, method: Method) -> Result<Vec<String>> {
        match self {
            Outcome::Keys(result) => result,
            other => shape_mismatch(method, &other),
        }
    }

    pub(crate) fn into_unit(self, method: Method) -> Result<()> {
        match self {
            Outcome::Unit(result) => result,
            other => shape_mismatch(method, &other),
        }
    }
}

fn shape_mismatch(method: Method, outcome: &Outcome) -> ! {
    panic!(
        "mock: {} must return a {:?} outcome, but the expectation produced {:?}",
        method,
        method.shape(),
        outcome
    )
}

type ComputeFn = Arc<dyn Fn(&[Arg]) -> Outcome + Send + Sync>;

/// How a matched expectation produces its outcome.
#[derive(Clone)]
pub enum ReturnBehavior {
    /// Same outcome on every call.
    Fixed(Outcome),
    /// Outcome computed from the actual call arguments.
    Compute(ComputeFn),
}

impl ReturnBehavior {
    pub fn compute<F>(f: F) -> Self
    where
        F: Fn(&[Arg]) -> Outcome + Send + Sync + 'static,
    {
        ReturnBehavior::Compute(Arc::new(f))
    }

    pub fn produce(&self, args: &[Arg]) -> Outcome {
        match self {
            ReturnBehavior::Fixed(outcome) => outcome.clone(),
            ReturnBehavior::Compute(f) => f(args),
        }
    }
}

impl fmt::Debug for ReturnBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnBehavior::Fixed(outcome) => f.debug_tuple("Fixed").field(outcome).finish(),
            ReturnBehavior::Compute(_) => f.write_str("Compute(<fn>)"),
        }
    }
}
