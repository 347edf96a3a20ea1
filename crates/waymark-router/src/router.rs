//! Navigation controller.
//!
//! [`Router`] ties the route table, the session history and the guard
//! pipeline together. Every navigation goes through the same sequence:
//! resolve the target, run the guards, write history, publish the new
//! location, then run the after hooks.
//!
//! ```
//! use waymark_router::guard::{Guard, GuardOutcome};
//! use waymark_router::history::create_memory_history;
//! use waymark_router::matcher::RouteDefinition;
//! use waymark_router::router::{Router, RouterOptions};
//!
//! let router = Router::new(RouterOptions::new(
//! 	create_memory_history("/").unwrap(),
//! 	vec![RouteDefinition::new("/"), RouteDefinition::new("/about")],
//! ))
//! .unwrap();
//! router.before_each(Guard::sync(|_| GuardOutcome::Proceed));
//!
//! futures::executor::block_on(async {
//! 	let location = router.push("/about").await.unwrap();
//! 	assert_eq!(location.path(), "/about");
//! });
//! ```

use parking_lot::{Mutex, RwLock};
use serde_json::Map;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::config::{NavigationSettings, RouterSettings};
use crate::error::{AfterHookError, RouterError, RouterResult};
use crate::guard::{Guard, GuardFailureKind, GuardId, GuardPipeline, GuardRegistry, HookRegistry};
use crate::history::{HistoryChange, HistorySource, ListenerId, SILENT_MOVE_TIMEOUT};
use crate::location::Location;
use crate::matcher::{PathMatcher, RouteDefinition, RouteRecord};
use crate::observer::{ObserverId, Observers};
use crate::timeout::with_deadline;

/// Identifier of a location subscriber.
pub type SubscriptionId = ObserverId;

/// Callback receiving `(to, from)` after every committed navigation.
pub type Subscriber = dyn Fn(&Location, &Location) + Send + Sync;

/// Where the router is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationState {
	/// No navigation has been committed yet.
	Idle,
	/// Looking up the target.
	Resolving,
	/// Running the guard pipeline.
	Guarding,
	/// Writing history and publishing the new location.
	Committing,
	/// At rest after at least one committed navigation.
	Ready,
}

/// Inputs for [`Router::new`].
#[derive(Debug)]
pub struct RouterOptions {
	pub history: HistorySource,
	pub routes: Vec<RouteDefinition>,
	pub settings: RouterSettings,
}

impl RouterOptions {
	/// Options with default settings.
	pub fn new(history: HistorySource, routes: Vec<RouteDefinition>) -> Self {
		Self {
			history,
			routes,
			settings: RouterSettings::default(),
		}
	}

	pub fn with_settings(mut self, settings: RouterSettings) -> Self {
		self.settings = settings;
		self
	}
}

/// How a navigation writes history once its guards pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Commit {
	Push,
	Replace,
	/// The host already moved; rewrite the slot in place and skip after hooks.
	HistoryMove,
}

struct RouterInner {
	history: HistorySource,
	matcher: RwLock<PathMatcher>,
	navigation: NavigationSettings,
	current: RwLock<Location>,
	/// Phase of the navigation in flight, if any.
	phase: RwLock<Option<NavigationState>>,
	ready: AtomicBool,
	before: GuardRegistry,
	resolve: GuardRegistry,
	after: HookRegistry,
	subscribers: Observers<Subscriber>,
	/// Serializes navigations. Waiters are served in FIFO order.
	navigation_lock: tokio::sync::Mutex<()>,
	pending: Mutex<VecDeque<HistoryChange>>,
	listener: Mutex<Option<ListenerId>>,
}

/// The navigation controller.
///
/// Cloning yields another handle to the same router.
#[derive(Clone)]
pub struct Router {
	inner: Arc<RouterInner>,
}

impl fmt::Debug for Router {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("state", &self.state())
			.field("current", &self.inner.current.read().full_path())
			.field("routes", &self.inner.matcher.read().len())
			.finish()
	}
}

impl Router {
	/// Creates a router.
	///
	/// Nothing is committed until the first navigation; [`Router::install`]
	/// navigates to the location the history host starts at.
	pub fn new(options: RouterOptions) -> RouterResult<Self> {
		let RouterOptions {
			history,
			routes,
			settings,
		} = options;
		settings.validate()?;
		let matcher = PathMatcher::new(routes)?;
		tracing::debug!(routes = matcher.len(), "router created");

		Ok(Self {
			inner: Arc::new(RouterInner {
				history,
				matcher: RwLock::new(matcher),
				navigation: settings.navigation,
				current: RwLock::new(Location::start()),
				phase: RwLock::new(None),
				ready: AtomicBool::new(false),
				before: GuardRegistry::new(),
				resolve: GuardRegistry::new(),
				after: HookRegistry::new(),
				subscribers: Observers::new(),
				navigation_lock: tokio::sync::Mutex::new(()),
				pending: Mutex::new(VecDeque::new()),
				listener: Mutex::new(None),
			}),
		})
	}

	/// Navigates to the host's current location if nothing has been committed
	/// yet. Otherwise returns the current location.
	pub async fn install(&self) -> RouterResult<Location> {
		if self.is_ready() {
			return Ok(self.current_location());
		}
		let target = self.inner.history.location();
		self.push(&target).await
	}

	/// Navigates to `path`, adding a history slot.
	pub async fn push(&self, path: &str) -> RouterResult<Location> {
		self.navigate(path, Commit::Push).await
	}

	/// Navigates to `path`, rewriting the current history slot.
	pub async fn replace(&self, path: &str) -> RouterResult<Location> {
		self.navigate(path, Commit::Replace).await
	}

	async fn navigate(&self, path: &str, commit: Commit) -> RouterResult<Location> {
		let _navigation = self.inner.navigation_lock.lock().await;
		self.inner.drain_history().await;
		self.inner.navigate_locked(path.to_string(), commit, 0).await
	}

	/// Processes queued back/forward moves.
	///
	/// Moves are also processed on a spawned task when an executor is
	/// available, and before the next navigation. Returns how many moves
	/// were handled by this call.
	pub async fn sync_history(&self) -> usize {
		let _navigation = self.inner.navigation_lock.lock().await;
		self.inner.drain_history().await
	}

	/// Moves `delta` slots through the session history.
	pub fn go(&self, delta: i32) {
		self.inner.history.go(delta);
	}

	pub fn back(&self) {
		self.go(-1);
	}

	pub fn forward(&self) {
		self.go(1);
	}

	/// Registers a guard that runs for every navigation, before component
	/// update hooks.
	pub fn before_each(&self, guard: impl Into<Guard>) -> GuardId {
		self.inner.before.add(guard)
	}

	pub fn remove_before_each(&self, id: GuardId) -> bool {
		self.inner.before.remove(id)
	}

	/// Registers a guard that runs last, once every other guard passed.
	pub fn before_resolve(&self, guard: impl Into<Guard>) -> GuardId {
		self.inner.resolve.add(guard)
	}

	pub fn remove_before_resolve(&self, id: GuardId) -> bool {
		self.inner.resolve.remove(id)
	}

	/// Registers a hook that runs after every committed navigation.
	///
	/// Hook failures are logged and do not affect the navigation.
	pub fn after_each<F>(&self, hook: F) -> GuardId
	where
		F: Fn(&Location, &Location) -> Result<(), AfterHookError> + Send + Sync + 'static,
	{
		self.inner.after.add(hook)
	}

	pub fn remove_after_each(&self, id: GuardId) -> bool {
		self.inner.after.remove(id)
	}

	/// Snapshot of the committed location.
	pub fn current_location(&self) -> Location {
		self.inner.current.read().clone()
	}

	/// Subscribes to committed location changes.
	pub fn subscribe<F>(&self, subscriber: F) -> SubscriptionId
	where
		F: Fn(&Location, &Location) + Send + Sync + 'static,
	{
		self.inner.subscribers.add(Arc::new(subscriber))
	}

	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		self.inner.subscribers.remove(id)
	}

	/// Resolves `path` against the route table without navigating.
	pub fn resolve(&self, path: &str) -> RouterResult<Location> {
		self.inner.matcher.read().resolve(path)
	}

	/// Resolves a route by name without navigating.
	pub fn resolve_named(&self, name: &str) -> RouterResult<Location> {
		self.inner.matcher.read().resolve_named(name)
	}

	/// Adds a route, under `parent` when given.
	pub fn add_route(&self, definition: RouteDefinition, parent: Option<&str>) -> RouterResult<()> {
		self.inner.matcher.write().add_route(definition, parent)
	}

	/// Removes a route and its descendants.
	///
	/// The committed location keeps the records it was resolved with.
	pub fn remove_route(&self, path: &str) -> RouterResult<Vec<Arc<RouteRecord>>> {
		self.inner.matcher.write().remove_route(path)
	}

	pub fn has_route(&self, path: &str) -> bool {
		self.inner.matcher.read().has_route(path)
	}

	/// Registered records in registration order.
	pub fn routes(&self) -> Vec<Arc<RouteRecord>> {
		self.inner.matcher.read().records()
	}

	pub fn history(&self) -> &HistorySource {
		&self.inner.history
	}

	pub fn settings(&self) -> &NavigationSettings {
		&self.inner.navigation
	}

	pub fn state(&self) -> NavigationState {
		match *self.inner.phase.read() {
			Some(phase) => phase,
			None if self.is_ready() => NavigationState::Ready,
			None => NavigationState::Idle,
		}
	}

	/// Returns `true` once the first navigation has been committed.
	pub fn is_ready(&self) -> bool {
		self.inner.ready.load(Ordering::Acquire)
	}
}

impl Drop for RouterInner {
	fn drop(&mut self) {
		if let Some(id) = self.listener.get_mut().take() {
			self.history.unlisten(id);
		}
	}
}

/// Marks the navigation phase and clears it when dropped.
struct PhaseGuard<'a> {
	phase: &'a RwLock<Option<NavigationState>>,
}

impl<'a> PhaseGuard<'a> {
	fn enter(phase: &'a RwLock<Option<NavigationState>>, state: NavigationState) -> Self {
		*phase.write() = Some(state);
		Self { phase }
	}

	fn advance(&self, state: NavigationState) {
		*self.phase.write() = Some(state);
	}
}

impl Drop for PhaseGuard<'_> {
	fn drop(&mut self) {
		*self.phase.write() = None;
	}
}

enum Guarded {
	Passed,
	Redirect(String),
}

impl RouterInner {
	/// Runs one navigation, following redirects. Must hold the navigation
	/// lock.
	async fn navigate_locked(
		self: &Arc<Self>,
		mut target: String,
		commit: Commit,
		mut redirects: usize,
	) -> RouterResult<Location> {
		loop {
			let phase = PhaseGuard::enter(&self.phase, NavigationState::Resolving);
			let to = self.matcher.read().resolve(&target)?;
			let from = self.current.read().clone();
			tracing::debug!(to = %to.full_path(), from = %from.full_path(), "navigation started");

			phase.advance(NavigationState::Guarding);
			match self.run_guards(&to, &from).await? {
				Guarded::Passed => {}
				Guarded::Redirect(next) => {
					redirects += 1;
					if redirects > self.navigation.max_redirects {
						tracing::warn!(to = %next, limit = self.navigation.max_redirects, "too many redirects");
						return Err(RouterError::RedirectLimit {
							to: next,
							limit: self.navigation.max_redirects,
						});
					}
					tracing::debug!(from = %to.full_path(), to = %next, "navigation redirected");
					target = next;
					continue;
				}
			}

			phase.advance(NavigationState::Committing);
			self.commit(&to, &from, commit)?;
			return Ok(to);
		}
	}

	async fn run_guards(&self, to: &Location, from: &Location) -> RouterResult<Guarded> {
		let pipeline = GuardPipeline::build(to, from, &self.before, &self.resolve);
		let timeout = self.navigation.guard_timeout();

		match with_deadline(timeout, pipeline.run()).await {
			Ok(Ok(())) => Ok(Guarded::Passed),
			Ok(Err(failure)) => match &failure.kind {
				GuardFailureKind::Redirected(next) => Ok(Guarded::Redirect(next.clone())),
				GuardFailureKind::Aborted(reason) => {
					tracing::warn!(
						to = %to.full_path(),
						step = %failure.step,
						index = failure.index,
						reason = reason.as_deref().unwrap_or(""),
						"navigation rejected by guard"
					);
					Err(RouterError::GuardRejected(failure.rejection(to.full_path())))
				}
			},
			Err(_) => {
				// Only reachable with a configured timeout.
				let timeout = timeout.unwrap_or_default();
				tracing::warn!(to = %to.full_path(), ?timeout, "navigation timed out");
				Err(RouterError::GuardTimeout {
					to: to.full_path().to_string(),
					timeout,
				})
			}
		}
	}

	fn commit(self: &Arc<Self>, to: &Location, from: &Location, commit: Commit) -> RouterResult<()> {
		let first = !self.ready.load(Ordering::Acquire);
		match commit {
			Commit::Push if !first => self.history.push(&to.href(), Map::new())?,
			_ => self.history.replace(&to.href(), Map::new())?,
		}
		*self.current.write() = to.clone();
		tracing::debug!(to = %to.full_path(), from = %from.full_path(), ?commit, "navigation committed");

		if first {
			self.mark_ready();
		}
		// Committed: subscribers and hooks observe the router at rest.
		*self.phase.write() = None;

		for subscriber in self.subscribers.snapshot() {
			subscriber(to, from);
		}
		if commit != Commit::HistoryMove {
			self.after.run(to, from);
		}
		Ok(())
	}

	fn mark_ready(self: &Arc<Self>) {
		if self.ready.swap(true, Ordering::AcqRel) {
			return;
		}
		let weak = Arc::downgrade(self);
		let id = self.history.listen(move |change| {
			if let Some(inner) = weak.upgrade() {
				inner.enqueue(change.clone());
			}
		});
		*self.listener.lock() = Some(id);
		tracing::info!(location = %self.current.read().full_path(), "router ready");
	}

	fn enqueue(self: &Arc<Self>, change: HistoryChange) {
		tracing::debug!(to = %change.to, from = %change.from, delta = change.delta, "history move queued");
		self.pending.lock().push_back(change);
		spawn_sync(Arc::downgrade(self));
	}

	/// Handles every queued move. Must hold the navigation lock.
	async fn drain_history(self: &Arc<Self>) -> usize {
		let mut handled = 0;
		loop {
			let next = self.pending.lock().pop_front();
			let Some(change) = next else {
				return handled;
			};
			self.handle_history_move(change).await;
			handled += 1;
		}
	}

	async fn handle_history_move(self: &Arc<Self>, change: HistoryChange) {
		let resolved = self.matcher.read().resolve(&change.to);
		let to = match resolved {
			Ok(to) => to,
			Err(error) => {
				tracing::warn!(to = %change.to, error = %error, "back/forward to unknown location");
				self.undo_history_move(&change).await;
				return;
			}
		};
		let from = self.current.read().clone();

		if !self.navigation.guard_history_navigation {
			let phase = PhaseGuard::enter(&self.phase, NavigationState::Committing);
			if let Err(error) = self.commit(&to, &from, Commit::HistoryMove) {
				tracing::warn!(to = %change.to, error = %error, "failed to commit back/forward move");
			}
			drop(phase);
			return;
		}

		let phase = PhaseGuard::enter(&self.phase, NavigationState::Guarding);
		match self.run_guards(&to, &from).await {
			Ok(Guarded::Passed) => {
				phase.advance(NavigationState::Committing);
				if let Err(error) = self.commit(&to, &from, Commit::Replace) {
					tracing::warn!(to = %change.to, error = %error, "failed to commit back/forward move");
				}
			}
			Ok(Guarded::Redirect(next)) => {
				drop(phase);
				// The host has to be back on the slot that was left before
				// anything is pushed.
				self.undo_history_move(&change).await;
				if let Err(error) = self.navigate_locked(next, Commit::Push, 1).await {
					tracing::warn!(to = %change.to, error = %error, "redirect after back/forward failed");
				}
			}
			Err(error) => {
				drop(phase);
				tracing::warn!(to = %change.to, error = %error, "back/forward move cancelled");
				self.undo_history_move(&change).await;
			}
		}
	}

	/// Moves the host back to the slot `change` left and waits until it
	/// reports arriving there.
	async fn undo_history_move(&self, change: &HistoryChange) {
		let delta = match i32::try_from(-change.delta) {
			Ok(delta) if delta != 0 => delta,
			_ => {
				tracing::warn!(delta = change.delta, "cannot restore history position");
				return;
			}
		};
		let reported = self.history.go_silently(delta).wait(SILENT_MOVE_TIMEOUT).await;
		if !reported {
			tracing::warn!(
				delta,
				timeout = ?SILENT_MOVE_TIMEOUT,
				"history did not report the restoring move"
			);
		}
	}
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_sync(inner: Weak<RouterInner>) {
	// Without a runtime, moves wait for `sync_history` or the next navigation.
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		handle.spawn(async move {
			if let Some(inner) = inner.upgrade() {
				Router { inner }.sync_history().await;
			}
		});
	}
}

#[cfg(target_arch = "wasm32")]
fn spawn_sync(inner: Weak<RouterInner>) {
	wasm_bindgen_futures::spawn_local(async move {
		if let Some(inner) = inner.upgrade() {
			Router { inner }.sync_history().await;
		}
	});
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::guard::GuardOutcome;
	use crate::history::{HistoryMode, MemoryHost};
	use rstest::{fixture, rstest};

	#[fixture]
	fn router() -> Router {
		let history = HistorySource::new(MemoryHost::new("/"), HistoryMode::Web, "").unwrap();
		Router::new(RouterOptions::new(
			history,
			vec![
				RouteDefinition::new("/").name("home"),
				RouteDefinition::new("/about").name("about"),
				RouteDefinition::new("/login"),
			],
		))
		.unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_first_commit_replaces_and_marks_ready(router: Router) {
		// Arrange
		assert_eq!(router.state(), NavigationState::Idle);

		// Act
		let location = router.push("/about").await.unwrap();

		// Assert
		assert_eq!(location.path(), "/about");
		assert_eq!(router.state(), NavigationState::Ready);
		assert!(router.is_ready());
		assert_eq!(router.history().entry().position, 0);
		assert!(router.history().entry().replace);
		assert_eq!(router.history().listener_count(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_later_commit_pushes(router: Router) {
		router.install().await.unwrap();

		router.push("/about").await.unwrap();

		assert_eq!(router.history().entry().position, 1);
		assert_eq!(router.current_location().path(), "/about");
	}

	#[rstest]
	#[tokio::test]
	async fn test_no_match_keeps_location(router: Router) {
		// Arrange
		router.install().await.unwrap();

		// Act
		let result = router.push("/missing").await;

		// Assert
		assert_eq!(result, Err(RouterError::no_match("/missing")));
		assert_eq!(router.current_location().path(), "/");
		assert_eq!(router.state(), NavigationState::Ready);
	}

	#[rstest]
	#[tokio::test]
	async fn test_redirect_is_followed(router: Router) {
		// Arrange
		router.install().await.unwrap();
		router.before_each(Guard::sync(|ctx| {
			if ctx.to.path() == "/about" {
				GuardOutcome::redirect("/login")
			} else {
				GuardOutcome::Proceed
			}
		}));

		// Act
		let location = router.push("/about").await.unwrap();

		// Assert
		assert_eq!(location.path(), "/login");
		assert_eq!(router.history().location(), "/login");
	}

	#[rstest]
	#[tokio::test]
	async fn test_redirect_loop_is_bounded() {
		// Arrange
		let history = HistorySource::new(MemoryHost::new("/"), HistoryMode::Web, "").unwrap();
		let router = Router::new(
			RouterOptions::new(
				history,
				vec![RouteDefinition::new("/"), RouteDefinition::new("/a"), RouteDefinition::new("/b")],
			)
			.with_settings(RouterSettings::default().with_max_redirects(3)),
		)
		.unwrap();
		router.before_each(Guard::sync(|ctx| match ctx.to.path() {
			"/a" => GuardOutcome::redirect("/b"),
			"/b" => GuardOutcome::redirect("/a"),
			_ => GuardOutcome::Proceed,
		}));

		// Act
		let result = router.push("/a").await;

		// Assert
		assert_eq!(
			result,
			Err(RouterError::RedirectLimit {
				to: "/a".to_string(),
				limit: 3,
			})
		);
		assert!(router.current_location().is_start());
	}

	#[rstest]
	#[tokio::test]
	async fn test_removed_guard_no_longer_runs(router: Router) {
		let id = router.before_each(Guard::sync(|_| GuardOutcome::abort("blocked")));

		assert!(router.remove_before_each(id));
		let result = router.push("/about").await;

		assert!(result.is_ok());
	}

	#[rstest]
	fn test_invalid_settings_are_rejected() {
		let history = HistorySource::new(MemoryHost::new("/"), HistoryMode::Web, "").unwrap();

		let result = Router::new(
			RouterOptions::new(history, Vec::new())
				.with_settings(RouterSettings::default().with_max_redirects(0)),
		);

		assert!(matches!(result, Err(RouterError::Config(_))));
	}

	#[rstest]
	fn test_route_table_operations(router: Router) {
		// Arrange
		router
			.add_route(RouteDefinition::new("team").name("team"), Some("/about"))
			.unwrap();

		// Act
		let named = router.resolve_named("team").unwrap();
		let removed = router.remove_route("/about").unwrap();

		// Assert
		assert_eq!(named.path(), "/about/team");
		assert_eq!(removed.len(), 2);
		assert!(!router.has_route("/about/team"));
		assert_eq!(router.routes().len(), 2);
	}
}
