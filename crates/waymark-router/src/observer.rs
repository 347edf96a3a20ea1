//! Owned callback registries.
//!
//! [`Observers`] keeps callbacks in registration order and hands out ids so
//! that a callback can later be removed. Dispatch always works on a snapshot,
//! which lets callbacks register or remove other callbacks while running.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Registration-ordered set of shared callbacks.
pub struct Observers<F: ?Sized> {
	next_id: AtomicU64,
	entries: RwLock<Vec<(ObserverId, Arc<F>)>>,
}

impl<F: ?Sized> Observers<F> {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self {
			next_id: AtomicU64::new(1),
			entries: RwLock::new(Vec::new()),
		}
	}

	/// Appends a callback and returns its id.
	pub fn add(&self, observer: Arc<F>) -> ObserverId {
		let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
		self.entries.write().push((id, observer));
		id
	}

	/// Removes a callback. Returns `false` when the id is unknown.
	pub fn remove(&self, id: ObserverId) -> bool {
		let mut entries = self.entries.write();
		let before = entries.len();
		entries.retain(|(entry_id, _)| *entry_id != id);
		entries.len() != before
	}

	/// Returns the callbacks in registration order.
	pub fn snapshot(&self) -> Vec<Arc<F>> {
		self.entries
			.read()
			.iter()
			.map(|(_, observer)| Arc::clone(observer))
			.collect()
	}

	/// Number of registered callbacks.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` when nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Removes every callback.
	pub fn clear(&self) {
		self.entries.write().clear();
	}
}

impl<F: ?Sized> Default for Observers<F> {
	fn default() -> Self {
		Self::new()
	}
}

impl<F: ?Sized> fmt::Debug for Observers<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Observers")
			.field("count", &self.len())
			.finish()
	}
}
