//! Registries for global guards and after hooks.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::AfterHookError;
use crate::location::Location;
use crate::observer::{ObserverId, Observers};

use super::{Guard, NavigationGuard};

/// Identifier returned when a guard or hook is registered.
pub type GuardId = ObserverId;

/// Callback run after a navigation has been committed.
pub type AfterHook = dyn Fn(&Location, &Location) -> Result<(), AfterHookError> + Send + Sync;

/// Registration-ordered list of global guards.
#[derive(Debug, Default)]
pub struct GuardRegistry {
	guards: Observers<dyn NavigationGuard>,
}

impl GuardRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a guard.
	pub fn add(&self, guard: impl Into<Guard>) -> GuardId {
		self.guards.add(guard.into().shared())
	}

	/// Removes a guard. Returns `false` if it was not registered.
	pub fn remove(&self, id: GuardId) -> bool {
		self.guards.remove(id)
	}

	/// Guards in registration order.
	pub fn snapshot(&self) -> Vec<Guard> {
		self.guards
			.snapshot()
			.into_iter()
			.map(Guard::from_shared)
			.collect()
	}

	pub fn len(&self) -> usize {
		self.guards.len()
	}

	pub fn is_empty(&self) -> bool {
		self.guards.is_empty()
	}
}

/// Registration-ordered list of after hooks.
#[derive(Debug, Default)]
pub struct HookRegistry {
	hooks: Observers<AfterHook>,
}

impl HookRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a hook.
	pub fn add<F>(&self, hook: F) -> GuardId
	where
		F: Fn(&Location, &Location) -> Result<(), AfterHookError> + Send + Sync + 'static,
	{
		self.hooks.add(Arc::new(hook))
	}

	/// Removes a hook. Returns `false` if it was not registered.
	pub fn remove(&self, id: GuardId) -> bool {
		self.hooks.remove(id)
	}

	pub fn len(&self) -> usize {
		self.hooks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.hooks.is_empty()
	}

	/// Runs every hook in order and returns how many of them failed.
	///
	/// Errors and panics are logged and never stop the remaining hooks.
	pub fn run(&self, to: &Location, from: &Location) -> usize {
		let mut failures = 0;
		for (index, hook) in self.hooks.snapshot().into_iter().enumerate() {
			match panic::catch_unwind(AssertUnwindSafe(|| hook(to, from))) {
				Ok(Ok(())) => {}
				Ok(Err(error)) => {
					failures += 1;
					tracing::warn!(
						hook = index,
						to = %to.full_path(),
						from = %from.full_path(),
						error = %error,
						"after hook failed"
					);
				}
				Err(payload) => {
					failures += 1;
					tracing::warn!(
						hook = index,
						to = %to.full_path(),
						from = %from.full_path(),
						panic = panic_message(payload.as_ref()),
						"after hook panicked"
					);
				}
			}
		}
		failures
	}
}

pub(super) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
	if let Some(message) = payload.downcast_ref::<&'static str>() {
		message
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.as_str()
	} else {
		"unknown panic"
	}
}
