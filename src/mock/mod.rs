//! Programmable cache backend for tests.
//!
//! [`MockCache`] implements the [`Cache`] contract without storing anything:
//! every call is turned into a [`CallRecord`] and served by the first matching
//! [`Expectation`]. Failures of any kind can be injected by programming an
//! expectation to return an error.
//!
//! # Example
//!
//! ```
//! use cache_contract::mock::{Matcher, Method, MockCache};
//! use cache_contract::{args, Cache, Context, Error};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = MockCache::new();
//! let _verify = cache.verifier();
//! let ctx = Context::background();
//!
//! cache
//!     .on(Method::Get, args![Matcher::any(), "user:1"])
//!     .return_value("john")
//!     .once();
//! cache
//!     .on(Method::Get, args![Matcher::any(), "user:1"])
//!     .return_err(Error::NotFound);
//!
//! assert_eq!(cache.get(&ctx, "user:1").await, Ok("john".to_string()));
//! assert_eq!(cache.get(&ctx, "user:1").await, Err(Error::NotFound));
//! # }
//! ```
//!
//! # Argument conventions
//!
//! - The [`Context`] is the first argument of every operation except `Close`,
//!   which has none. It matches by identity; use [`Matcher::any`] to ignore it.
//! - `Del` passes each key as its own positional argument after the context.
//!   Match an exact key list with one matcher per key, or a variable list with
//!   a trailing [`Matcher::rest`] / [`Matcher::any_rest`] / [`Matcher::keys_unordered`].
//! - `Set` and `DelWithPattern` are recorded as themselves, never as the
//!   `SetWithExpiration` or `Keys` + `Del` calls a store backend would make.
//!
//! # Failure signals
//!
//! A call that no expectation covers panics with an [`UnmatchedCall`] message;
//! it is never reported as an `Error`. Call-count bounds are checked by
//! [`MockCache::assert_expectations`] or, automatically at scope exit, by the
//! guard from [`MockCache::verifier`].

pub mod call;
pub mod engine;
pub mod matcher;
pub mod returns;

pub use call::{Arg, Arity, CallRecord, Method, Shape};
pub use engine::{
    Expectation, ExpectationEngine, ExpectationUnmet, UnmatchedCall, UnmatchedReason,
    UnmetExpectation,
};
pub use matcher::Matcher;
pub use returns::{Outcome, ReturnBehavior};

use crate::backend::Cache;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::value::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// In-memory, behavior-programmable implementation of [`Cache`].
///
/// Clones share one expectation set.
#[derive(Clone, Default)]
pub struct MockCache {
    engine: Arc<Mutex<ExpectationEngine>>,
}

impl MockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an expectation for `method` with one matcher per argument.
    ///
    /// The returned handle configures the return behavior and call count. The
    /// expectation is registered, fully configured, when the handle drops: at
    /// the end of the usual `cache.on(..).return_value(..).once();` statement.
    /// Calls made before that never see a half-configured rule.
    ///
    /// # Panics
    /// If the matchers do not fit the method's arity.
    pub fn on(&self, method: Method, matchers: Vec<Matcher>) -> ExpectationHandle {
        ExpectationHandle {
            engine: Arc::clone(&self.engine),
            expectation: Some(Expectation::new(method, matchers)),
            method,
        }
    }

    /// Check every bounded expectation. Idempotent.
    ///
    /// # Errors
    /// Returns [`ExpectationUnmet`] listing every violated bound.
    pub fn assert_expectations(&self) -> std::result::Result<(), ExpectationUnmet> {
        self.lock().assert_expectations()
    }

    /// Guard that asserts expectations when dropped.
    ///
    /// Panics on violation unless the thread is already unwinding, in which
    /// case the violation is logged so the original panic stays visible.
    pub fn verifier(&self) -> ExpectationGuard {
        ExpectationGuard {
            cache: self.clone(),
            armed: true,
        }
    }

    /// Number of matched calls to `method` so far.
    pub fn calls(&self, method: Method) -> usize {
        self.lock().calls(method)
    }

    // A panic inside a user predicate or `return_with` closure poisons the
    // lock; the expectation set is still consistent, so keep using it.
    fn lock(&self) -> MutexGuard<'_, ExpectationEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn invoke(&self, method: Method, args: Vec<Arg>) -> Outcome {
        let call = CallRecord::new(method, args);
        let result = self.lock().try_call(&call);
        match result {
            Ok(outcome) => outcome,
            Err(unmatched) => panic!("{}", unmatched),
        }
    }
}

impl Cache for MockCache {
    async fn is_connected(&self, ctx: &Context) -> bool {
        self.invoke(Method::IsConnected, vec![Arg::from(ctx)])
            .into_connected(Method::IsConnected)
    }

    async fn get(&self, ctx: &Context, key: &str) -> Result<String> {
        self.invoke(Method::Get, vec![Arg::from(ctx), Arg::from(key)])
            .into_value(Method::Get)
    }

    async fn set(&self, ctx: &Context, key: &str, value: impl Into<Value>) -> Result<()> {
        let value: Value = value.into();
        self.invoke(
            Method::Set,
            vec![Arg::from(ctx), Arg::from(key), Arg::from(value)],
        )
        .into_unit(Method::Set)
    }

    async fn set_with_expiration(
        &self,
        ctx: &Context,
        key: &str,
        value: impl Into<Value>,
        expiration: Duration,
    ) -> Result<()> {
        let value: Value = value.into();
        self.invoke(
            Method::SetWithExpiration,
            vec![
                Arg::from(ctx),
                Arg::from(key),
                Arg::from(value),
                Arg::from(expiration),
            ],
        )
        .into_unit(Method::SetWithExpiration)
    }

    async fn del(&self, ctx: &Context, keys: &[&str]) -> Result<()> {
        let mut args = Vec::with_capacity(keys.len() + 1);
        args.push(Arg::from(ctx));
        args.extend(keys.iter().map(|key| Arg::from(*key)));
        self.invoke(Method::Del, args).into_unit(Method::Del)
    }

    async fn del_with_pattern(&self, ctx: &Context, pattern: &str) -> Result<()> {
        self.invoke(
            Method::DelWithPattern,
            vec![Arg::from(ctx), Arg::from(pattern)],
        )
        .into_unit(Method::DelWithPattern)
    }

    async fn keys(&self, ctx: &Context, pattern: &str) -> Result<Vec<String>> {
        self.invoke(Method::Keys, vec![Arg::from(ctx), Arg::from(pattern)])
            .into_keys(Method::Keys)
    }

    async fn close(&self) -> Result<()> {
        self.invoke(Method::Close, Vec::new())
            .into_unit(Method::Close)
    }
}

/// Configures a pending expectation and registers it on drop.
///
/// Nothing is registered if the handle is dropped during a panic, so a
/// rejected configuration leaves the expectation set untouched.
pub struct ExpectationHandle {
    engine: Arc<Mutex<ExpectationEngine>>,
    expectation: Option<Expectation>,
    method: Method,
}

impl ExpectationHandle {
    fn update(&mut self, f: impl FnOnce(&mut Expectation)) {
        if let Some(expectation) = self.expectation.as_mut() {
            f(expectation);
        }
    }

    /// Return a fixed outcome on every match.
    ///
    /// # Panics
    /// If the outcome's shape does not fit the method.
    pub fn returns(mut self, outcome: Outcome) -> Self {
        if outcome.shape() != self.method.shape() {
            panic!(
                "mock: {} must return a {:?} outcome, got {:?}",
                self.method,
                self.method.shape(),
                outcome
            );
        }
        self.update(|e| e.set_returns(ReturnBehavior::Fixed(outcome)));
        self
    }

    /// Compute the outcome from the actual arguments on every match.
    ///
    /// The closure runs while the expectation set is locked, so it must not
    /// call back into the same mock.
    pub fn return_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Arg]) -> Outcome + Send + Sync + 'static,
    {
        self.update(|e| e.set_returns(ReturnBehavior::compute(f)));
        self
    }

    /// `IsConnected` result.
    pub fn return_bool(self, connected: bool) -> Self {
        self.returns(Outcome::Connected(connected))
    }

    /// Successful `Get` result.
    pub fn return_value(self, value: impl Into<String>) -> Self {
        self.returns(Outcome::Value(Ok(value.into())))
    }

    /// Successful `Keys` result.
    pub fn return_keys<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = keys.into_iter().map(Into::into).collect();
        self.returns(Outcome::Keys(Ok(keys)))
    }

    /// Success for operations without a value (`Set`, `Del`, `Close`, …).
    pub fn return_ok(self) -> Self {
        self.returns(Outcome::Unit(Ok(())))
    }

    /// Failure in whatever result shape the method uses.
    ///
    /// # Panics
    /// For `IsConnected`, which cannot fail; program `return_bool(false)` instead.
    pub fn return_err(self, err: Error) -> Self {
        let outcome = match self.method.shape() {
            Shape::Value => Outcome::Value(Err(err)),
            Shape::Keys => Outcome::Keys(Err(err)),
            Shape::Unit => Outcome::Unit(Err(err)),
            Shape::Connected => panic!(
                "mock: {} never fails; use return_bool(false) instead",
                self.method
            ),
        };
        self.returns(outcome)
    }

    /// Require exactly `n` matching calls by assertion time.
    ///
    /// Once `n` calls have matched, later calls fall through to the next
    /// matching expectation.
    pub fn times(mut self, n: usize) -> Self {
        self.update(|e| e.set_expected_calls(n));
        self
    }

    pub fn once(self) -> Self {
        self.times(1)
    }

    pub fn twice(self) -> Self {
        self.times(2)
    }
}

impl Drop for ExpectationHandle {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        if let Some(expectation) = self.expectation.take() {
            self.engine
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .register(expectation);
        }
    }
}

/// Asserts the mock's expectations when dropped. See [`MockCache::verifier`].
pub struct ExpectationGuard {
    cache: MockCache,
    armed: bool,
}

impl ExpectationGuard {
    /// Assert now and consume the guard without a second check.
    ///
    /// # Errors
    /// Returns [`ExpectationUnmet`] listing every violated bound.
    pub fn finish(mut self) -> std::result::Result<(), ExpectationUnmet> {
        self.armed = false;
        self.cache.assert_expectations()
    }
}

impl Drop for ExpectationGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(unmet) = self.cache.assert_expectations() {
            if std::thread::panicking() {
                warn!("{}", unmet);
            } else {
                panic!("{}", unmet);
            }
        }
    }
}
