//! In-process session history.

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::{HistoryHost, HostLocation, PopCallback, ScrollPosition};
use crate::error::{RouterError, RouterResult};
use crate::matcher::split_location;

struct Slot {
	url: String,
	location: HostLocation,
	state: Option<Value>,
}

struct InjectedFailure {
	/// Writes that still succeed before the failure.
	remaining: usize,
	message: String,
}

#[derive(Default)]
struct Stack {
	slots: Vec<Slot>,
	index: usize,
	scroll: ScrollPosition,
	failure: Option<InjectedFailure>,
}

impl Stack {
	fn current(&self) -> &Slot {
		&self.slots[self.index]
	}

	fn take_failure(&mut self) -> RouterResult<()> {
		let Some(failure) = self.failure.as_mut() else {
			return Ok(());
		};
		if failure.remaining > 0 {
			failure.remaining -= 1;
			return Ok(());
		}
		let message = std::mem::take(&mut failure.message);
		self.failure = None;
		Err(RouterError::HistoryWriteFailed(message))
	}

	fn slot_for(&self, url: &str, state: Value) -> Slot {
		Slot {
			url: url.to_string(),
			location: resolve_url(&self.current().location, url),
			state: Some(state),
		}
	}
}

/// Session history kept in memory.
///
/// Used on native targets and in tests. Clones share the same stack. Moves
/// through [`HistoryHost::go`] fire the pop callback synchronously.
#[derive(Clone)]
pub struct MemoryHost {
	stack: Arc<Mutex<Stack>>,
	pop: Arc<RwLock<Option<Arc<PopCallback>>>>,
}

impl MemoryHost {
	/// Creates a stack with a single slot at `url` and no stored record.
	pub fn new(url: &str) -> Self {
		let stack = Stack {
			slots: vec![Slot {
				url: url.to_string(),
				location: resolve_url(&HostLocation::default(), url),
				state: None,
			}],
			..Stack::default()
		};
		Self {
			stack: Arc::new(Mutex::new(stack)),
			pop: Arc::new(RwLock::new(None)),
		}
	}

	/// Index of the current slot.
	pub fn index(&self) -> usize {
		self.stack.lock().index
	}

	/// URLs of every slot, oldest first.
	pub fn urls(&self) -> Vec<String> {
		self.stack
			.lock()
			.slots
			.iter()
			.map(|slot| slot.url.clone())
			.collect()
	}

	/// Stored record of slot `index`.
	pub fn state_at(&self, index: usize) -> Option<Value> {
		self.stack
			.lock()
			.slots
			.get(index)
			.and_then(|slot| slot.state.clone())
	}

	/// Overwrites the current slot's record without going through a write.
	pub fn set_state(&self, state: Value) {
		let mut stack = self.stack.lock();
		let index = stack.index;
		stack.slots[index].state = Some(state);
	}

	/// Overwrites the record of slot `index`. Out-of-range indices are ignored.
	pub fn set_state_at(&self, index: usize, state: Value) {
		if let Some(slot) = self.stack.lock().slots.get_mut(index) {
			slot.state = Some(state);
		}
	}

	/// Sets the scroll offsets reported from now on.
	pub fn set_scroll(&self, scroll: ScrollPosition) {
		self.stack.lock().scroll = scroll;
	}

	/// Makes the next push or replace fail with `message`.
	pub fn fail_next_write(&self, message: impl Into<String>) {
		self.fail_write_after(0, message);
	}

	/// Lets `successes` writes through, then fails the following one.
	pub fn fail_write_after(&self, successes: usize, message: impl Into<String>) {
		self.stack.lock().failure = Some(InjectedFailure {
			remaining: successes,
			message: message.into(),
		});
	}
}

impl fmt::Debug for MemoryHost {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let stack = self.stack.lock();
		f.debug_struct("MemoryHost")
			.field("urls", &stack.slots.iter().map(|s| &s.url).collect::<Vec<_>>())
			.field("index", &stack.index)
			.finish()
	}
}

impl HistoryHost for MemoryHost {
	fn location(&self) -> HostLocation {
		self.stack.lock().current().location.clone()
	}

	fn state(&self) -> Option<Value> {
		self.stack.lock().current().state.clone()
	}

	fn length(&self) -> usize {
		self.stack.lock().slots.len()
	}

	fn scroll(&self) -> ScrollPosition {
		self.stack.lock().scroll
	}

	fn push_state(&self, state: Value, url: &str) -> RouterResult<()> {
		let mut stack = self.stack.lock();
		stack.take_failure()?;
		let slot = stack.slot_for(url, state);
		let next = stack.index + 1;
		stack.slots.truncate(next);
		stack.slots.push(slot);
		stack.index = next;
		Ok(())
	}

	fn replace_state(&self, state: Value, url: &str) -> RouterResult<()> {
		let mut stack = self.stack.lock();
		stack.take_failure()?;
		let slot = stack.slot_for(url, state);
		let index = stack.index;
		stack.slots[index] = slot;
		Ok(())
	}

	fn go(&self, delta: i32) {
		let state = {
			let mut stack = self.stack.lock();
			let target = stack.index as i64 + i64::from(delta);
			if delta == 0 || target < 0 || target >= stack.slots.len() as i64 {
				return;
			}
			stack.index = target as usize;
			stack.current().state.clone()
		};
		let callback = self.pop.read().clone();
		if let Some(callback) = callback {
			callback(state);
		}
	}

	fn on_pop(&self, callback: PopCallback) {
		*self.pop.write() = Some(Arc::new(callback));
	}
}

/// Resolves `url` against the location of the current slot.
///
/// A fragment-only URL keeps the current pathname and query.
fn resolve_url(current: &HostLocation, url: &str) -> HostLocation {
	let (path, query, fragment) = split_location(url);
	let hash = fragment.map(|f| format!("#{f}")).unwrap_or_default();
	if url.starts_with('#') {
		return HostLocation {
			pathname: current.pathname.clone(),
			search: current.search.clone(),
			hash,
		};
	}
	HostLocation {
		pathname: if path.is_empty() { "/".to_string() } else { path.to_string() },
		search: query.map(|q| format!("?{q}")).unwrap_or_default(),
		hash,
	}
}
