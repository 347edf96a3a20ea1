//! Client-side navigation engine.
//!
//! `waymark-router` maps URL paths to chains of route records, keeps the
//! committed location in step with the session history and runs
//! asynchronous navigation guards before every transition.
//!
//! ## Modules
//!
//! - [`matcher`]: route tree and literal path resolution
//! - [`history`]: session-history model over a pluggable host
//! - [`guard`]: guards, their settlement and the ordered pipeline
//! - [`router`]: the navigation controller
//! - [`config`]: TOML-backed settings
//!
//! ## Example
//!
//! ```
//! use waymark_router::{Guard, GuardOutcome, RouteDefinition, Router, RouterOptions};
//! use waymark_router::history::create_memory_history;
//!
//! let router = Router::new(RouterOptions::new(
//! 	create_memory_history("/").unwrap(),
//! 	vec![
//! 		RouteDefinition::new("/"),
//! 		RouteDefinition::new("/admin").before_enter(Guard::sync(|_| GuardOutcome::redirect("/"))),
//! 	],
//! ))
//! .unwrap();
//!
//! futures::executor::block_on(async {
//! 	router.install().await.unwrap();
//! 	let location = router.push("/admin").await.unwrap();
//! 	assert_eq!(location.path(), "/");
//! });
//! ```

pub mod config;
pub mod error;
pub mod guard;
pub mod history;
pub mod location;
pub mod matcher;
pub mod observer;
pub mod router;
mod timeout;

pub use config::RouterSettings;
pub use error::{AfterHookError, GuardRejection, RouterError, RouterResult};
pub use guard::{Guard, GuardContext, GuardOutcome, GuardStep, NavigationGuard, Next};
pub use history::{
	HistoryChange, HistoryEntry, HistoryHost, HistoryMode, HistorySource, MemoryHost,
	create_memory_history,
};
pub use location::Location;
pub use matcher::{Component, ComponentHook, PathMatcher, RouteDefinition, RouteRecord};
pub use router::{NavigationState, Router, RouterOptions, SubscriptionId};

/// Re-export of `async_trait` for implementing [`NavigationGuard`].
pub use async_trait::async_trait;
