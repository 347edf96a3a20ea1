//! Session history.
//!
//! [`HistorySource`] models the host's session-history stack as a sequence
//! of serializable [`HistoryEntry`] records. It reads the current location,
//! writes push and replace entries, and reports back/forward moves made
//! outside the router to its listeners.
//!
//! The host itself sits behind [`HistoryHost`]. [`MemoryHost`] keeps the
//! stack in process; on `wasm32` a browser-backed host is available through
//! `create_web_history`.

#[cfg(target_arch = "wasm32")]
mod browser;
mod memory;

#[cfg(target_arch = "wasm32")]
pub use browser::{BrowserHost, create_web_hash_history, create_web_history};
pub use memory::MemoryHost;

use futures::channel::oneshot;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::error::{RouterError, RouterResult};
use crate::observer::{ObserverId, Observers};
use crate::timeout::with_deadline;

/// Identifier of a history listener.
pub type ListenerId = ObserverId;

/// Callback invoked with the stored state record of the slot the host moved to.
pub type PopCallback = Box<dyn Fn(Option<Value>) + Send + Sync>;

/// Listener for back/forward moves.
pub type HistoryListener = dyn Fn(&HistoryChange) + Send + Sync;

/// Scroll offsets captured when an entry is left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
	pub left: f64,
	pub top: f64,
}

impl ScrollPosition {
	pub fn new(left: f64, top: f64) -> Self {
		Self { left, top }
	}
}

/// Record stored in one session-history slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
	#[serde(default)]
	pub back: Option<String>,
	pub current: String,
	#[serde(default)]
	pub forward: Option<String>,
	/// Whether the slot was last written in place.
	pub replace: bool,
	#[serde(default)]
	pub scroll: Option<ScrollPosition>,
	/// Index of the slot in the stack. Grows by one on push only.
	pub position: i64,
	/// Caller data stored next to the core fields.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl HistoryEntry {
	/// Keys owned by the entry itself. Extra data cannot use them.
	pub const RESERVED_KEYS: [&'static str; 6] =
		["back", "current", "forward", "replace", "scroll", "position"];

	/// The entry written for a slot that has no usable record.
	pub fn initial(current: impl Into<String>, position: i64) -> Self {
		Self {
			back: None,
			current: current.into(),
			forward: None,
			replace: true,
			scroll: None,
			position,
			extra: Map::new(),
		}
	}

	/// Decodes a stored record.
	pub fn from_value(value: Value) -> RouterResult<Self> {
		serde_json::from_value(value).map_err(|error| RouterError::MalformedEntry(error.to_string()))
	}

	/// Encodes the entry for the host.
	pub fn to_value(&self) -> RouterResult<Value> {
		serde_json::to_value(self).map_err(|error| RouterError::MalformedEntry(error.to_string()))
	}

	/// Merges caller data, skipping reserved keys.
	pub fn merge_extra(&mut self, extra: Map<String, Value>) {
		for (key, value) in extra {
			if Self::RESERVED_KEYS.contains(&key.as_str()) {
				tracing::debug!(key = %key, "ignoring reserved key in history extra data");
				continue;
			}
			self.extra.insert(key, value);
		}
	}
}

/// How locations are encoded in URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
	/// `base + path`, read back from the pathname.
	#[default]
	Web,
	/// `base + "#" + path`, read back from the fragment.
	Hash,
}

/// The host's view of its current URL.
///
/// `search` and `hash` keep their leading `?` and `#`, as browsers report
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostLocation {
	pub pathname: String,
	pub search: String,
	pub hash: String,
}

/// The platform session history.
pub trait HistoryHost: Send + Sync {
	fn location(&self) -> HostLocation;

	/// Stored record of the current slot, if any.
	fn state(&self) -> Option<Value>;

	/// Number of slots in the stack.
	fn length(&self) -> usize;

	fn scroll(&self) -> ScrollPosition;

	/// Appends a slot after the current one, discarding forward slots.
	fn push_state(&self, state: Value, url: &str) -> RouterResult<()>;

	/// Overwrites the current slot.
	fn replace_state(&self, state: Value, url: &str) -> RouterResult<()>;

	/// Moves `delta` slots. Out-of-range moves are ignored.
	fn go(&self, delta: i32);

	/// Registers the callback fired after every host-driven move.
	fn on_pop(&self, callback: PopCallback);
}

/// A back/forward move reported to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryChange {
	/// Location after the move.
	pub to: String,
	/// Location before the move.
	pub from: String,
	pub is_back: bool,
	/// Position difference between the new and the previous entry.
	pub delta: i64,
	/// Entry of the slot that was left.
	pub from_entry: HistoryEntry,
}

struct Snapshot {
	location: String,
	entry: HistoryEntry,
}

struct SourceInner {
	host: Arc<dyn HistoryHost>,
	mode: HistoryMode,
	base: String,
	snapshot: RwLock<Snapshot>,
	listeners: Observers<HistoryListener>,
	/// Waiters of silent moves, oldest first. Each swallows one pop signal.
	silent: Mutex<VecDeque<oneshot::Sender<()>>>,
}

/// Session history bound to a host.
///
/// Cloning yields another handle to the same source.
#[derive(Clone)]
pub struct HistorySource {
	inner: Arc<SourceInner>,
}

impl fmt::Debug for HistorySource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let snapshot = self.inner.snapshot.read();
		f.debug_struct("HistorySource")
			.field("mode", &self.inner.mode)
			.field("base", &self.inner.base)
			.field("location", &snapshot.location)
			.field("position", &snapshot.entry.position)
			.field("listeners", &self.inner.listeners.len())
			.finish()
	}
}

/// Creates an in-memory history positioned at `initial`.
pub fn create_memory_history(initial: &str) -> RouterResult<HistorySource> {
	HistorySource::new(MemoryHost::new(initial), HistoryMode::Web, "")
}

impl HistorySource {
	/// Binds to `host`.
	///
	/// When the current slot has no record, or one that does not decode, a
	/// default entry is written in place before anything else.
	pub fn new(host: impl HistoryHost + 'static, mode: HistoryMode, base: &str) -> RouterResult<Self> {
		let base = normalize_base(base)?;
		let host: Arc<dyn HistoryHost> = Arc::new(host);
		let location = read_location(host.as_ref(), mode, &base);

		let entry = match host.state().map(HistoryEntry::from_value) {
			Some(Ok(entry)) => entry,
			stored => {
				if let Some(Err(error)) = stored {
					tracing::warn!(error = %error, location = %location, "replacing malformed history entry");
				}
				let entry = HistoryEntry::initial(location.clone(), last_position(host.as_ref()));
				host.replace_state(entry.to_value()?, &href(mode, &base, &location))?;
				tracing::debug!(location = %location, position = entry.position, "synthesized initial history entry");
				entry
			}
		};

		let inner = Arc::new(SourceInner {
			host,
			mode,
			base,
			snapshot: RwLock::new(Snapshot { location, entry }),
			listeners: Observers::new(),
			silent: Mutex::new(VecDeque::new()),
		});

		let weak: Weak<SourceInner> = Arc::downgrade(&inner);
		inner.host.on_pop(Box::new(move |state| {
			if let Some(inner) = weak.upgrade() {
				inner.handle_pop(state);
			}
		}));

		Ok(Self { inner })
	}

	/// Current location string: path plus query and fragment.
	pub fn location(&self) -> String {
		self.inner.snapshot.read().location.clone()
	}

	/// Mirror of the current slot's record.
	pub fn entry(&self) -> HistoryEntry {
		self.inner.snapshot.read().entry.clone()
	}

	pub fn mode(&self) -> HistoryMode {
		self.inner.mode
	}

	pub fn base(&self) -> &str {
		&self.inner.base
	}

	/// URL for `path` under the configured base and mode.
	pub fn create_href(&self, path: &str) -> String {
		href(self.inner.mode, &self.inner.base, path)
	}

	/// Adds a slot for `target`.
	///
	/// The current slot is first rewritten to point forward at `target` and
	/// to remember the scroll offsets; then the new slot is pushed. If either
	/// write fails the mirror keeps what the host last accepted.
	pub fn push(&self, target: &str, extra: Map<String, Value>) -> RouterResult<()> {
		let inner = &self.inner;
		let mut snapshot = inner.snapshot.write();

		let mut leaving = snapshot.entry.clone();
		leaving.forward = Some(target.to_string());
		leaving.scroll = Some(inner.host.scroll());
		let leaving_url = inner.href(&leaving.current);
		inner.host.replace_state(leaving.to_value()?, &leaving_url)?;
		let position = leaving.position + 1;
		snapshot.entry = leaving;

		let mut entry = HistoryEntry {
			back: Some(snapshot.location.clone()),
			current: target.to_string(),
			forward: None,
			replace: false,
			scroll: None,
			position,
			extra: Map::new(),
		};
		entry.merge_extra(extra);
		inner.host.push_state(entry.to_value()?, &inner.href(target))?;

		snapshot.entry = entry;
		snapshot.location = target.to_string();
		Ok(())
	}

	/// Rewrites the current slot to `target`, keeping its neighbours and
	/// position.
	pub fn replace(&self, target: &str, extra: Map<String, Value>) -> RouterResult<()> {
		let inner = &self.inner;
		let mut snapshot = inner.snapshot.write();

		let mut entry = HistoryEntry {
			back: snapshot.entry.back.clone(),
			current: target.to_string(),
			forward: snapshot.entry.forward.clone(),
			replace: true,
			scroll: None,
			position: snapshot.entry.position,
			extra: Map::new(),
		};
		entry.merge_extra(extra);
		inner.host.replace_state(entry.to_value()?, &inner.href(target))?;

		snapshot.entry = entry;
		snapshot.location = target.to_string();
		Ok(())
	}

	/// Registers a back/forward listener.
	pub fn listen<F>(&self, listener: F) -> ListenerId
	where
		F: Fn(&HistoryChange) + Send + Sync + 'static,
	{
		self.inner.listeners.add(Arc::new(listener))
	}

	/// Removes a listener. Returns `false` if it was not registered.
	pub fn unlisten(&self, id: ListenerId) -> bool {
		self.inner.listeners.remove(id)
	}

	pub fn listener_count(&self) -> usize {
		self.inner.listeners.len()
	}

	/// Moves through the stack. Listeners are notified once the host reports
	/// the move.
	pub fn go(&self, delta: i32) {
		if delta != 0 {
			self.inner.host.go(delta);
		}
	}

	pub fn back(&self) {
		self.go(-1);
	}

	pub fn forward(&self) {
		self.go(1);
	}

	/// Moves through the stack without notifying listeners.
	///
	/// Hosts may report the move later than this call returns; await the
	/// returned [`SilentMove`] before writing history again.
	pub fn go_silently(&self, delta: i32) -> SilentMove {
		if delta == 0 {
			return SilentMove { receiver: None };
		}
		let (sender, receiver) = oneshot::channel();
		self.inner.silent.lock().push_back(sender);
		self.inner.host.go(delta);
		SilentMove {
			receiver: Some(receiver),
		}
	}
}

/// Upper bound for a host to report a silent move.
pub const SILENT_MOVE_TIMEOUT: Duration = Duration::from_secs(1);

/// A move started by [`HistorySource::go_silently`].
///
/// Dropping it before the host reports the move releases the pop signal it
/// would have swallowed.
#[derive(Debug)]
#[must_use = "history writes may race the move unless it is awaited"]
pub struct SilentMove {
	receiver: Option<oneshot::Receiver<()>>,
}

impl SilentMove {
	/// Waits until the host reports the move. Returns `false` when it did not
	/// within `limit`.
	pub async fn wait(self, limit: Duration) -> bool {
		let Some(mut receiver) = self.receiver else {
			return true;
		};
		match receiver.try_recv() {
			Ok(Some(())) => true,
			Ok(None) => matches!(with_deadline(Some(limit), receiver).await, Ok(Ok(()))),
			Err(_) => false,
		}
	}
}

impl SourceInner {
	fn href(&self, path: &str) -> String {
		href(self.mode, &self.base, path)
	}

	/// Oldest silent move still being waited for.
	fn next_silent_waiter(&self) -> Option<oneshot::Sender<()>> {
		let mut silent = self.silent.lock();
		while let Some(waiter) = silent.pop_front() {
			if !waiter.is_canceled() {
				return Some(waiter);
			}
		}
		None
	}

	fn handle_pop(&self, state: Option<Value>) {
		let to = read_location(self.host.as_ref(), self.mode, &self.base);

		let entry = match state.map(HistoryEntry::from_value) {
			Some(Ok(entry)) => entry,
			stored => {
				if let Some(Err(error)) = stored {
					tracing::warn!(error = %error, location = %to, "replacing malformed history entry");
				}
				let entry = HistoryEntry::initial(to.clone(), last_position(self.host.as_ref()));
				let written = entry
					.to_value()
					.and_then(|value| self.host.replace_state(value, &self.href(&to)));
				if let Err(error) = written {
					tracing::warn!(error = %error, location = %to, "failed to store synthesized history entry");
				}
				entry
			}
		};

		let (from, from_entry) = {
			let mut snapshot = self.snapshot.write();
			let from = std::mem::replace(&mut snapshot.location, to.clone());
			let from_entry = std::mem::replace(&mut snapshot.entry, entry.clone());
			(from, from_entry)
		};

		if let Some(waiter) = self.next_silent_waiter() {
			let _ = waiter.send(());
			tracing::trace!(to = %to, "silent history move");
			return;
		}

		let delta = entry.position - from_entry.position;
		let change = HistoryChange {
			to,
			from,
			is_back: delta < 0,
			delta,
			from_entry,
		};
		for listener in self.listeners.snapshot() {
			listener(&change);
		}
	}
}

fn normalize_base(base: &str) -> RouterResult<String> {
	if !base.is_empty() && !base.starts_with('/') {
		return Err(RouterError::Config(format!(
			"history base must start with '/': {base}"
		)));
	}
	Ok(base.trim_end_matches('/').to_string())
}

fn last_position(host: &dyn HistoryHost) -> i64 {
	host.length().saturating_sub(1) as i64
}

fn href(mode: HistoryMode, base: &str, path: &str) -> String {
	match mode {
		HistoryMode::Web => format!("{base}{path}"),
		HistoryMode::Hash => format!("{base}#{path}"),
	}
}

fn read_location(host: &dyn HistoryHost, mode: HistoryMode, base: &str) -> String {
	let location = host.location();
	match mode {
		HistoryMode::Web => {
			let path = location
				.pathname
				.strip_prefix(base)
				.filter(|rest| rest.is_empty() || rest.starts_with('/'))
				.unwrap_or(&location.pathname);
			let path = if path.is_empty() { "/" } else { path };
			format!("{}{}{}", path, location.search, location.hash)
		}
		HistoryMode::Hash => {
			let fragment = location.hash.strip_prefix('#').unwrap_or(&location.hash);
			if fragment.is_empty() {
				"/".to_string()
			} else {
				fragment.to_string()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use parking_lot::Mutex;
	use rstest::rstest;
	use serde_json::json;

	fn recorded_changes(source: &HistorySource) -> Arc<Mutex<Vec<HistoryChange>>> {
		let changes = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&changes);
		source.listen(move |change| sink.lock().push(change.clone()));
		changes
	}

	#[rstest]
	fn test_new_synthesizes_initial_entry() {
		// Arrange
		let host = MemoryHost::new("/start");

		// Act
		let source = HistorySource::new(host.clone(), HistoryMode::Web, "").unwrap();

		// Assert
		let entry = source.entry();
		assert_eq!(entry, HistoryEntry::initial("/start", 0));
		assert_eq!(host.state(), Some(entry.to_value().unwrap()));
		assert_eq!(source.location(), "/start");
	}

	#[rstest]
	fn test_new_keeps_existing_entry() {
		// Arrange
		let host = MemoryHost::new("/kept");
		let mut stored = HistoryEntry::initial("/kept", 4);
		stored.back = Some("/before".to_string());
		host.set_state(stored.to_value().unwrap());

		// Act
		let source = HistorySource::new(host, HistoryMode::Web, "").unwrap();

		// Assert
		assert_eq!(source.entry(), stored);
	}

	#[rstest]
	#[case(json!({"unrelated": true}))]
	#[case(json!("not an object"))]
	#[case(json!({"current": "/x", "replace": "yes", "position": 0}))]
	fn test_new_replaces_malformed_entry(#[case] stored: Value) {
		// Arrange
		let host = MemoryHost::new("/page");
		host.set_state(stored);

		// Act
		let source = HistorySource::new(host.clone(), HistoryMode::Web, "").unwrap();

		// Assert
		assert_eq!(source.entry(), HistoryEntry::initial("/page", 0));
		assert_eq!(host.state(), Some(source.entry().to_value().unwrap()));
	}

	#[rstest]
	fn test_push_writes_both_slots() {
		// Arrange
		let host = MemoryHost::new("/");
		host.set_scroll(ScrollPosition::new(0.0, 120.0));
		let source = HistorySource::new(host.clone(), HistoryMode::Web, "").unwrap();

		// Act
		source.push("/about", Map::new()).unwrap();

		// Assert
		let previous = HistoryEntry::from_value(host.state_at(0).unwrap()).unwrap();
		assert_eq!(previous.forward.as_deref(), Some("/about"));
		assert_eq!(previous.scroll, Some(ScrollPosition::new(0.0, 120.0)));
		let current = source.entry();
		assert_eq!(current.back.as_deref(), Some("/"));
		assert_eq!(current.current, "/about");
		assert_eq!(current.position, 1);
		assert!(!current.replace);
		assert_eq!(host.urls(), vec!["/", "/about"]);
		assert_eq!(source.location(), "/about");
	}

	#[rstest]
	fn test_two_pushes_advance_position_by_two() {
		let source = create_memory_history("/").unwrap();
		let start = source.entry().position;

		source.push("/about", Map::new()).unwrap();
		source.push("/", Map::new()).unwrap();

		assert_eq!(source.entry().position, start + 2);
		assert_eq!(source.location(), "/");
	}

	#[rstest]
	fn test_replace_keeps_neighbours_and_position() {
		// Arrange
		let source = create_memory_history("/").unwrap();
		source.push("/a", Map::new()).unwrap();

		// Act
		source.replace("/b", Map::new()).unwrap();

		// Assert
		let entry = source.entry();
		assert_eq!(entry.back.as_deref(), Some("/"));
		assert_eq!(entry.current, "/b");
		assert_eq!(entry.position, 1);
		assert!(entry.replace);
	}

	#[rstest]
	fn test_extra_cannot_override_core_fields() {
		// Arrange
		let source = create_memory_history("/").unwrap();
		let mut extra = Map::new();
		extra.insert("position".to_string(), json!(99));
		extra.insert("modal".to_string(), json!(true));

		// Act
		source.push("/a", extra).unwrap();

		// Assert
		let entry = source.entry();
		assert_eq!(entry.position, 1);
		assert_eq!(entry.extra.get("modal"), Some(&json!(true)));
		assert!(!entry.extra.contains_key("position"));
	}

	#[rstest]
	fn test_failed_first_write_leaves_mirror_untouched() {
		// Arrange
		let host = MemoryHost::new("/");
		let source = HistorySource::new(host.clone(), HistoryMode::Web, "").unwrap();
		let before = source.entry();
		host.fail_next_write("quota exceeded");

		// Act
		let result = source.push("/a", Map::new());

		// Assert
		assert_eq!(
			result,
			Err(RouterError::HistoryWriteFailed("quota exceeded".to_string()))
		);
		assert_eq!(source.entry(), before);
		assert_eq!(source.location(), "/");
		assert_eq!(host.urls(), vec!["/"]);
	}

	#[rstest]
	fn test_failed_second_write_mirrors_accepted_replace() {
		// Arrange
		let host = MemoryHost::new("/");
		let source = HistorySource::new(host.clone(), HistoryMode::Web, "").unwrap();
		host.fail_write_after(1, "security error");

		// Act
		let result = source.push("/a", Map::new());

		// Assert
		assert!(matches!(result, Err(RouterError::HistoryWriteFailed(_))));
		assert_eq!(source.location(), "/");
		assert_eq!(source.entry().forward.as_deref(), Some("/a"));
		assert_eq!(Some(source.entry().to_value().unwrap()), host.state());
	}

	#[rstest]
	fn test_back_and_forward_notify_listeners() {
		// Arrange
		let host = MemoryHost::new("/");
		let source = HistorySource::new(host.clone(), HistoryMode::Web, "").unwrap();
		source.push("/a", Map::new()).unwrap();
		let changes = recorded_changes(&source);

		// Act
		source.back();
		source.forward();

		// Assert
		let changes = changes.lock();
		assert_eq!(changes.len(), 2);
		assert_eq!((changes[0].from.as_str(), changes[0].to.as_str()), ("/a", "/"));
		assert!(changes[0].is_back);
		assert_eq!(changes[0].delta, -1);
		assert_eq!(changes[0].from_entry.current, "/a");
		assert!(!changes[1].is_back);
		assert_eq!(changes[1].delta, 1);
		assert_eq!(source.location(), "/a");
	}

	#[rstest]
	fn test_go_silently_skips_listeners() {
		// Arrange
		let host = MemoryHost::new("/");
		let source = HistorySource::new(host.clone(), HistoryMode::Web, "").unwrap();
		source.push("/a", Map::new()).unwrap();
		let changes = recorded_changes(&source);

		// Act
		let silent = source.go_silently(-1);
		let reported = futures::executor::block_on(silent.wait(SILENT_MOVE_TIMEOUT));
		source.forward();

		// Assert
		assert!(reported);
		assert_eq!(changes.lock().len(), 1);
		assert_eq!(source.location(), "/a");
	}

	#[rstest]
	fn test_abandoned_silent_move_does_not_swallow_later_moves() {
		// Arrange
		let host = MemoryHost::new("/");
		let source = HistorySource::new(host.clone(), HistoryMode::Web, "").unwrap();
		source.push("/a", Map::new()).unwrap();
		let changes = recorded_changes(&source);

		// Act
		drop(source.go_silently(5));
		source.back();

		// Assert
		assert_eq!(host.index(), 0);
		assert_eq!(changes.lock().len(), 1);
		assert_eq!(changes.lock()[0].to, "/");
	}

	#[rstest]
	fn test_zero_silent_move_is_already_reported() {
		let source = create_memory_history("/").unwrap();

		let silent = source.go_silently(0);

		assert!(futures::executor::block_on(silent.wait(SILENT_MOVE_TIMEOUT)));
	}

	#[rstest]
	fn test_unlisten_stops_notifications() {
		let source = create_memory_history("/").unwrap();
		source.push("/a", Map::new()).unwrap();
		let changes = Arc::new(Mutex::new(0));
		let sink = Arc::clone(&changes);
		let id = source.listen(move |_| *sink.lock() += 1);

		assert!(source.unlisten(id));
		source.back();

		assert_eq!(*changes.lock(), 0);
	}

	#[rstest]
	fn test_pop_to_malformed_slot_synthesizes_entry() {
		// Arrange
		let host = MemoryHost::new("/");
		let source = HistorySource::new(host.clone(), HistoryMode::Web, "").unwrap();
		source.push("/a", Map::new()).unwrap();
		host.set_state_at(0, json!({"garbage": 1}));
		let changes = recorded_changes(&source);

		// Act
		source.back();

		// Assert
		let entry = source.entry();
		assert_eq!(entry.current, "/");
		assert!(entry.replace);
		assert_eq!(host.state(), Some(entry.to_value().unwrap()));
		assert_eq!(changes.lock().len(), 1);
	}

	#[rstest]
	#[case(HistoryMode::Web, "", "/about", "/about")]
	#[case(HistoryMode::Web, "/app/", "/about", "/app/about")]
	#[case(HistoryMode::Hash, "", "/about", "#/about")]
	#[case(HistoryMode::Hash, "/app", "/about", "/app#/about")]
	fn test_create_href(
		#[case] mode: HistoryMode,
		#[case] base: &str,
		#[case] path: &str,
		#[case] expected: &str,
	) {
		let source = HistorySource::new(MemoryHost::new("/"), mode, base).unwrap();

		assert_eq!(source.create_href(path), expected);
	}

	#[rstest]
	fn test_web_mode_strips_base() {
		let host = MemoryHost::new("/app/docs?page=2#intro");

		let source = HistorySource::new(host, HistoryMode::Web, "/app").unwrap();

		assert_eq!(source.location(), "/docs?page=2#intro");
	}

	#[rstest]
	#[case("/index.html#/settings", "/settings")]
	#[case("/index.html", "/")]
	fn test_hash_mode_reads_fragment(#[case] url: &str, #[case] expected: &str) {
		let source = HistorySource::new(MemoryHost::new(url), HistoryMode::Hash, "").unwrap();

		assert_eq!(source.location(), expected);
	}

	#[rstest]
	fn test_hash_mode_push_updates_fragment() {
		// Arrange
		let host = MemoryHost::new("/index.html");
		let source = HistorySource::new(host.clone(), HistoryMode::Hash, "").unwrap();

		// Act
		source.push("/settings", Map::new()).unwrap();

		// Assert
		assert_eq!(host.location().pathname, "/index.html");
		assert_eq!(host.location().hash, "#/settings");
		assert_eq!(source.location(), "/settings");
	}

	#[rstest]
	fn test_invalid_base_is_rejected() {
		let result = HistorySource::new(MemoryHost::new("/"), HistoryMode::Web, "app");

		assert!(matches!(result, Err(RouterError::Config(_))));
	}

	#[rstest]
	fn test_entry_serializes_with_stored_field_names() {
		let mut entry = HistoryEntry::initial("/a", 2);
		entry.scroll = Some(ScrollPosition::new(1.0, 2.0));
		entry.extra.insert("modal".to_string(), json!(true));

		let value = entry.to_value().unwrap();

		assert_eq!(
			value,
			json!({
				"back": null,
				"current": "/a",
				"forward": null,
				"replace": true,
				"scroll": {"left": 1.0, "top": 2.0},
				"position": 2,
				"modal": true,
			})
		);
	}
}
