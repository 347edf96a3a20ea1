//! Navigation guards.
//!
//! A guard is an asynchronous check that runs before a navigation is
//! committed. It receives a [`GuardContext`] describing the navigation and a
//! [`Next`] continuation, and settles the step in one of two ways:
//!
//! - by calling a method on [`Next`], or
//! - by completing the future it returned.
//!
//! Whichever signal arrives first decides the [`GuardOutcome`]; later
//! signals are ignored.
//!
//! ```
//! use waymark_router::guard::{Guard, GuardOutcome};
//!
//! // Settles through the returned future.
//! let auth = Guard::from_fn(|ctx, _next| async move {
//! 	if ctx.to.path().starts_with("/admin") {
//! 		GuardOutcome::Redirect("/login".to_string())
//! 	} else {
//! 		GuardOutcome::Proceed
//! 	}
//! });
//!
//! // Settles through the continuation.
//! let logger = Guard::from_fn(|_ctx, next| {
//! 	next.proceed();
//! 	std::future::pending::<GuardOutcome>()
//! });
//! # let _ = (auth, logger);
//! ```

mod pipeline;
mod registry;
mod settle;

pub use pipeline::{ChangeSet, GuardFailure, GuardFailureKind, GuardPipeline, QueuedGuard};
pub use registry::{AfterHook, GuardId, GuardRegistry, HookRegistry};
pub use settle::{Next, SettlementCell, run_guard};

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::location::Location;
use crate::matcher::RouteRecord;

/// Result of a single guard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GuardOutcome {
	/// Let the navigation continue.
	#[default]
	Proceed,
	/// Cancel the navigation, optionally with a reason.
	Abort(Option<String>),
	/// Cancel the navigation and navigate to another path instead.
	Redirect(String),
}

impl GuardOutcome {
	/// Cancels with a reason.
	pub fn abort(reason: impl Into<String>) -> Self {
		Self::Abort(Some(reason.into()))
	}

	/// Redirects to `target`.
	pub fn redirect(target: impl Into<String>) -> Self {
		Self::Redirect(target.into())
	}

	/// Maps `Ok` to [`GuardOutcome::Proceed`] and `Err` to an abort carrying
	/// the error message.
	pub fn from_result<E: fmt::Display>(result: Result<(), E>) -> Self {
		match result {
			Ok(()) => Self::Proceed,
			Err(error) => Self::Abort(Some(error.to_string())),
		}
	}

	/// Returns `true` for [`GuardOutcome::Proceed`].
	pub fn is_proceed(&self) -> bool {
		matches!(self, Self::Proceed)
	}
}

impl From<bool> for GuardOutcome {
	fn from(allowed: bool) -> Self {
		if allowed { Self::Proceed } else { Self::Abort(None) }
	}
}

/// Step of the guard pipeline a guard belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GuardStep {
	/// `beforeRouteLeave` hooks of leaving records.
	Leave,
	/// Global `before_each` guards.
	Before,
	/// `beforeRouteUpdate` hooks of updating records.
	Update,
	/// Record-level `before_enter` guards.
	BeforeEnter,
	/// `beforeRouteEnter` hooks of entering records.
	Enter,
	/// Global `before_resolve` guards.
	Resolve,
}

impl GuardStep {
	/// Steps in execution order.
	pub const ORDER: [GuardStep; 6] = [
		Self::Leave,
		Self::Before,
		Self::Update,
		Self::BeforeEnter,
		Self::Enter,
		Self::Resolve,
	];

	/// Short name used in logs and errors.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Leave => "leave",
			Self::Before => "before",
			Self::Update => "update",
			Self::BeforeEnter => "before-enter",
			Self::Enter => "enter",
			Self::Resolve => "resolve",
		}
	}
}

impl fmt::Display for GuardStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// What a guard sees of the navigation.
#[derive(Debug, Clone)]
pub struct GuardContext {
	/// Navigation target.
	pub to: Location,
	/// Location being left.
	pub from: Location,
	/// Record that owns the guard. `None` for global guards.
	pub record: Option<Arc<RouteRecord>>,
}

/// An asynchronous navigation guard.
#[async_trait]
pub trait NavigationGuard: Send + Sync {
	/// Checks a pending navigation.
	async fn check(&self, ctx: GuardContext, next: Next) -> GuardOutcome;
}

#[async_trait]
impl<F, Fut> NavigationGuard for F
where
	F: Fn(GuardContext, Next) -> Fut + Send + Sync,
	Fut: Future<Output = GuardOutcome> + Send + 'static,
{
	async fn check(&self, ctx: GuardContext, next: Next) -> GuardOutcome {
		(self)(ctx, next).await
	}
}

/// Shared handle to a guard.
#[derive(Clone)]
pub struct Guard(Arc<dyn NavigationGuard>);

impl Guard {
	/// Wraps any [`NavigationGuard`].
	pub fn new(guard: impl NavigationGuard + 'static) -> Self {
		Self(Arc::new(guard))
	}

	/// Creates a guard from an async closure.
	pub fn from_fn<F, Fut>(guard: F) -> Self
	where
		F: Fn(GuardContext, Next) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = GuardOutcome> + Send + 'static,
	{
		Self(Arc::new(guard))
	}

	/// Creates a guard from a synchronous check.
	pub fn sync<F>(check: F) -> Self
	where
		F: Fn(&GuardContext) -> GuardOutcome + Send + Sync + 'static,
	{
		Self::from_fn(move |ctx, _next| std::future::ready(check(&ctx)))
	}

	pub(crate) fn from_shared(guard: Arc<dyn NavigationGuard>) -> Self {
		Self(guard)
	}

	pub(crate) fn shared(&self) -> Arc<dyn NavigationGuard> {
		Arc::clone(&self.0)
	}

	pub(crate) fn inner(&self) -> &dyn NavigationGuard {
		self.0.as_ref()
	}
}

impl fmt::Debug for Guard {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Guard")
	}
}

impl<G: NavigationGuard + 'static> From<G> for Guard {
	fn from(guard: G) -> Self {
		Self::new(guard)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_outcome_from_result() {
		assert_eq!(
			GuardOutcome::from_result::<String>(Ok(())),
			GuardOutcome::Proceed
		);
		assert_eq!(
			GuardOutcome::from_result(Err("denied")),
			GuardOutcome::abort("denied")
		);
	}

	#[rstest]
	#[case(true, GuardOutcome::Proceed)]
	#[case(false, GuardOutcome::Abort(None))]
	fn test_outcome_from_bool(#[case] allowed: bool, #[case] expected: GuardOutcome) {
		assert_eq!(GuardOutcome::from(allowed), expected);
	}

	#[rstest]
	fn test_step_order_matches_pipeline() {
		let names: Vec<&str> = GuardStep::ORDER.iter().map(GuardStep::as_str).collect();

		assert_eq!(
			names,
			vec!["leave", "before", "update", "before-enter", "enter", "resolve"]
		);
	}
}
