//! First-signal-wins settlement of a guard step.

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{self, Either};
use parking_lot::Mutex;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use super::registry::panic_message;
use super::{Guard, GuardContext, GuardOutcome};

/// Single-assignment cell holding the outcome of one guard invocation.
///
/// Only the first call to [`SettlementCell::settle`] takes effect.
pub struct SettlementCell {
	sender: Mutex<Option<oneshot::Sender<GuardOutcome>>>,
}

impl SettlementCell {
	/// Creates a cell together with the receiver of its outcome.
	pub fn new() -> (Arc<Self>, oneshot::Receiver<GuardOutcome>) {
		let (sender, receiver) = oneshot::channel();
		let cell = Arc::new(Self {
			sender: Mutex::new(Some(sender)),
		});
		(cell, receiver)
	}

	/// Stores `outcome` unless the cell already settled. Returns whether this
	/// call settled it.
	pub fn settle(&self, outcome: GuardOutcome) -> bool {
		match self.sender.lock().take() {
			// A dropped receiver means the step is already over.
			Some(sender) => sender.send(outcome).is_ok(),
			None => false,
		}
	}

	/// Returns `true` once the cell has settled.
	pub fn is_settled(&self) -> bool {
		self.sender.lock().is_none()
	}
}

impl fmt::Debug for SettlementCell {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SettlementCell")
			.field("settled", &self.is_settled())
			.finish()
	}
}

/// Continuation handed to a guard.
#[derive(Debug, Clone)]
pub struct Next {
	cell: Arc<SettlementCell>,
}

impl Next {
	pub(crate) fn new(cell: Arc<SettlementCell>) -> Self {
		Self { cell }
	}

	/// Lets the navigation continue.
	pub fn proceed(&self) -> bool {
		self.settle(GuardOutcome::Proceed)
	}

	/// Cancels the navigation.
	pub fn abort(&self, reason: impl Into<String>) -> bool {
		self.settle(GuardOutcome::abort(reason))
	}

	/// Redirects the navigation.
	pub fn redirect(&self, target: impl Into<String>) -> bool {
		self.settle(GuardOutcome::redirect(target))
	}

	/// Settles with an arbitrary outcome. Returns `false` when the step was
	/// already settled.
	pub fn settle(&self, outcome: GuardOutcome) -> bool {
		self.cell.settle(outcome)
	}

	/// Returns `true` once the step has settled.
	pub fn is_settled(&self) -> bool {
		self.cell.is_settled()
	}
}

/// Runs one guard to settlement.
///
/// The guard's continuation and its returned future race; the first one to
/// produce an outcome decides. If the continuation wins, the guard's future
/// is dropped. A guard that panics aborts the step.
pub async fn run_guard(guard: &Guard, ctx: GuardContext) -> GuardOutcome {
	let (cell, receiver) = SettlementCell::new();
	let next = Next::new(Arc::clone(&cell));
	let to = ctx.to.full_path().to_string();
	let returned = guard.inner().check(ctx, next);

	let settle_on_return = async move {
		let outcome = match AssertUnwindSafe(returned).catch_unwind().await {
			Ok(outcome) => outcome,
			Err(payload) => {
				let message = panic_message(payload.as_ref());
				tracing::warn!(to = %to, panic = message, "guard panicked");
				GuardOutcome::abort(format!("guard panicked: {message}"))
			}
		};
		cell.settle(outcome);
	};
	futures::pin_mut!(settle_on_return);

	match future::select(receiver, settle_on_return).await {
		Either::Left((outcome, _)) => outcome.unwrap_or_else(|_| dropped_outcome()),
		Either::Right(((), receiver)) => receiver.await.unwrap_or_else(|_| dropped_outcome()),
	}
}

fn dropped_outcome() -> GuardOutcome {
	GuardOutcome::abort("guard settlement was dropped")
}
