//! # Waymark
//!
//! Client-side navigation for single-page applications.
//!
//! Waymark resolves URL paths to chains of route records, keeps the
//! committed location synchronized with the session history and runs
//! asynchronous navigation guards before every transition. It works on
//! native targets against an in-memory history and on `wasm32` against the
//! browser's `History` API.
//!
//! ## Quick Example
//!
//! ```
//! use waymark::prelude::*;
//!
//! let router = Router::new(RouterOptions::new(
//! 	create_memory_history("/").unwrap(),
//! 	vec![
//! 		RouteDefinition::new("/").name("home"),
//! 		RouteDefinition::new("/about")
//! 			.name("about")
//! 			.children(vec![RouteDefinition::new("team")]),
//! 	],
//! ))
//! .unwrap();
//!
//! router.before_each(Guard::sync(|ctx| {
//! 	if ctx.to.path() == "/about/team" {
//! 		GuardOutcome::abort("members only")
//! 	} else {
//! 		GuardOutcome::Proceed
//! 	}
//! }));
//!
//! futures::executor::block_on(async {
//! 	router.install().await.unwrap();
//! 	router.push("/about").await.unwrap();
//! 	assert!(router.push("/about/team").await.is_err());
//! 	assert_eq!(router.current_location().path(), "/about");
//! });
//! ```

pub use waymark_router::{config, error, guard, history, location, matcher, observer, router};

pub use waymark_router::{
	AfterHookError, Component, ComponentHook, Guard, GuardContext, GuardOutcome, GuardRejection,
	GuardStep, HistoryChange, HistoryEntry, HistoryHost, HistoryMode, HistorySource, Location,
	MemoryHost, NavigationGuard, NavigationState, Next, PathMatcher, RouteDefinition, RouteRecord,
	Router, RouterError, RouterOptions, RouterResult, RouterSettings, SubscriptionId, async_trait,
	create_memory_history,
};

/// Commonly used types.
pub mod prelude {
	pub use crate::{
		Component, Guard, GuardContext, GuardOutcome, Location, NavigationGuard, Next,
		RouteDefinition, Router, RouterError, RouterOptions, RouterResult, RouterSettings,
		async_trait, create_memory_history,
	};
}
