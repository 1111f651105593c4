//! The expectation engine behind [`MockCache`](super::MockCache).
//!
//! Holds the ordered expectation set, matches incoming calls against it and
//! verifies call counts at teardown. The engine itself is not synchronized;
//! `MockCache` runs every match under a single mutex so that selecting a rule
//! and bumping its counter happen atomically.

use super::call::{Arity, CallRecord, Method};
use super::matcher::Matcher;
use super::returns::{Outcome, ReturnBehavior};
use std::fmt;

/// One programmed rule: method + argument matchers + return behavior.
#[derive(Debug, Clone)]
pub struct Expectation {
    method: Method,
    matchers: Vec<Matcher>,
    returns: Option<ReturnBehavior>,
    call_count: usize,
    expected_calls: Option<usize>,
}

impl Expectation {
    /// Create an expectation with no return behavior and no call-count bound.
    ///
    /// # Panics
    /// If `matchers` does not fit the arity of `method`. A `Rest` matcher is
    /// only accepted as the last matcher of a `Del` expectation.
    pub fn new(method: Method, matchers: Vec<Matcher>) -> Self {
        if let Err(msg) = check_arity(method, &matchers) {
            panic!("mock: invalid expectation for {}: {}", method, msg);
        }

        Expectation {
            method,
            matchers,
            returns: None,
            call_count: 0,
            expected_calls: None,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn call_count(&self) -> usize {
        self.call_count
    }

    pub fn expected_calls(&self) -> Option<usize> {
        self.expected_calls
    }

    pub(crate) fn set_returns(&mut self, returns: ReturnBehavior) {
        self.returns = Some(returns);
    }

    pub(crate) fn set_expected_calls(&mut self, n: usize) {
        self.expected_calls = Some(n);
    }

    /// True when every matcher accepts its positional argument.
    pub fn accepts(&self, call: &CallRecord) -> bool {
        if call.method != self.method {
            return false;
        }

        let mut remaining = call.args.as_slice();
        for matcher in &self.matchers {
            if let Matcher::Rest(predicate) = matcher {
                return !remaining.is_empty() && predicate(remaining);
            }
            match remaining.split_first() {
                Some((arg, tail)) if matcher.accepts(arg) => remaining = tail,
                _ => return false,
            }
        }
        remaining.is_empty()
    }

    /// True once a bounded expectation has been called as often as allowed.
    pub fn is_exhausted(&self) -> bool {
        self.expected_calls
            .is_some_and(|expected| self.call_count >= expected)
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.method)?;
        for (i, matcher) in self.matchers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?}", matcher)?;
        }
        f.write_str(")")
    }
}

fn check_arity(method: Method, matchers: &[Matcher]) -> Result<(), String> {
    let rest_positions: Vec<usize> = matchers
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_rest())
        .map(|(i, _)| i)
        .collect();

    match method.arity() {
        Arity::Exactly(n) => {
            if !rest_positions.is_empty() {
                return Err("a rest matcher is only valid for variadic operations".into());
            }
            if matchers.len() != n {
                return Err(format!(
                    "expected {} argument matcher(s), got {}",
                    n,
                    matchers.len()
                ));
            }
        }
        Arity::AtLeast(n) => match rest_positions.as_slice() {
            [] if matchers.len() < n => {
                return Err(format!(
                    "expected at least {} argument matcher(s), got {}",
                    n,
                    matchers.len()
                ));
            }
            [] => {}
            [pos] if *pos == matchers.len() - 1 && *pos + 1 >= n => {}
            [pos] if *pos != matchers.len() - 1 => {
                return Err("a rest matcher must be the last matcher".into());
            }
            [_] => {
                return Err(format!(
                    "a rest matcher must follow at least {} positional matcher(s)",
                    n - 1
                ));
            }
            _ => return Err("at most one rest matcher is allowed".into()),
        },
    }
    Ok(())
}

/// Why a call could not be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmatchedReason {
    /// No registered expectation accepts the call.
    NoExpectation { registered_for_method: usize },
    /// Expectations accept the call, but all of them already hit their bound.
    Exhausted { matching: usize },
    /// The selected expectation was never given a return behavior.
    MissingReturn { expectation: String },
}

/// A call that no expectation covers.
///
/// This signals a broken test rather than a runtime failure, so
/// [`MockCache`](super::MockCache) panics with it instead of returning an error.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedCall {
    pub call: CallRecord,
    pub reason: UnmatchedReason,
}

impl fmt::Display for UnmatchedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mock: unmatched call {}: ", self.call)?;
        match &self.reason {
            UnmatchedReason::NoExpectation {
                registered_for_method,
            } => write!(
                f,
                "no matching expectation ({} registered for {})",
                registered_for_method, self.call.method
            ),
            UnmatchedReason::Exhausted { matching } => write!(
                f,
                "all {} matching expectation(s) already reached their call count",
                matching
            ),
            UnmatchedReason::MissingReturn { expectation } => write!(
                f,
                "expectation {} has no return behavior",
                expectation
            ),
        }
    }
}

impl std::error::Error for UnmatchedCall {}

/// One bounded expectation whose call count was not met.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmetExpectation {
    pub expectation: String,
    pub expected: usize,
    pub actual: usize,
}

/// Every violated call-count bound, reported together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectationUnmet {
    pub unmet: Vec<UnmetExpectation>,
}

impl fmt::Display for ExpectationUnmet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mock: {} expectation(s) not met", self.unmet.len())?;
        for item in &self.unmet {
            write!(
                f,
                "\n  - {}: expected {} call(s), got {}",
                item.expectation, item.expected, item.actual
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for ExpectationUnmet {}

/// Ordered set of expectations plus the matching and assertion algorithms.
#[derive(Debug, Default)]
pub struct ExpectationEngine {
    expectations: Vec<Expectation>,
}

impl ExpectationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an expectation. Returns its position in registration order.
    pub fn register(&mut self, expectation: Expectation) -> usize {
        self.expectations.push(expectation);
        self.expectations.len() - 1
    }

    pub fn len(&self) -> usize {
        self.expectations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expectations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Expectation> {
        self.expectations.get(index)
    }

    /// Total matched calls across every expectation for `method`.
    pub fn calls(&self, method: Method) -> usize {
        self.expectations
            .iter()
            .filter(|e| e.method == method)
            .map(|e| e.call_count)
            .sum()
    }

    /// Match `call`, bump the selected rule and produce its outcome.
    ///
    /// Selection: among rules for the same method whose matchers all accept
    /// the arguments, the first registered one that is not exhausted wins.
    ///
    /// # Errors
    /// Returns [`UnmatchedCall`] if no rule accepts the call, if every
    /// accepting rule is exhausted, or if the chosen rule has no return behavior.
    pub fn try_call(&mut self, call: &CallRecord) -> Result<Outcome, UnmatchedCall> {
        let matching: Vec<usize> = self
            .expectations
            .iter()
            .enumerate()
            .filter(|(_, e)| e.accepts(call))
            .map(|(i, _)| i)
            .collect();

        if matching.is_empty() {
            let registered_for_method = self
                .expectations
                .iter()
                .filter(|e| e.method == call.method)
                .count();
            return Err(UnmatchedCall {
                call: call.clone(),
                reason: UnmatchedReason::NoExpectation {
                    registered_for_method,
                },
            });
        }

        let Some(&selected) = matching
            .iter()
            .find(|&&i| !self.expectations[i].is_exhausted())
        else {
            return Err(UnmatchedCall {
                call: call.clone(),
                reason: UnmatchedReason::Exhausted {
                    matching: matching.len(),
                },
            });
        };

        let expectation = &mut self.expectations[selected];
        let Some(returns) = expectation.returns.clone() else {
            return Err(UnmatchedCall {
                call: call.clone(),
                reason: UnmatchedReason::MissingReturn {
                    expectation: expectation.to_string(),
                },
            });
        };

        expectation.call_count += 1;
        debug!(
            "✓ Mock {} matched expectation #{} (call {})",
            call, selected, expectation.call_count
        );

        Ok(returns.produce(&call.args))
    }

    /// Like [`try_call`](Self::try_call), but panics on an unmatched call.
    ///
    /// Callers holding the engine behind a lock should use `try_call` and
    /// panic after releasing it.
    pub fn call(&mut self, call: &CallRecord) -> Outcome {
        match self.try_call(call) {
            Ok(outcome) => outcome,
            Err(unmatched) => panic!("{}", unmatched),
        }
    }

    /// Verify every bounded expectation was called exactly as often as required.
    ///
    /// Unbounded expectations are not checked. Calling this repeatedly without
    /// new calls in between gives the same verdict.
    ///
    /// # Errors
    /// Returns [`ExpectationUnmet`] listing every violation at once.
    pub fn assert_expectations(&self) -> Result<(), ExpectationUnmet> {
        let unmet: Vec<UnmetExpectation> = self
            .expectations
            .iter()
            .filter_map(|e| {
                let expected = e.expected_calls?;
                (e.call_count != expected).then(|| UnmetExpectation {
                    expectation: e.to_string(),
                    expected,
                    actual: e.call_count,
                })
            })
            .collect();

        if unmet.is_empty() {
            Ok(())
        } else {
            Err(ExpectationUnmet { unmet })
        }
    }
}
