//! Browser History Tests
//!
//! Runs against the real `History` API of a headless browser.
//!
//! ```text
//! wasm-pack test --headless --firefox crates/waymark-router
//! ```

#![cfg(target_arch = "wasm32")]

use serde_json::Map;
use wasm_bindgen_test::*;
use waymark_router::history::{create_web_hash_history, create_web_history};
use waymark_router::{RouteDefinition, Router, RouterOptions};

wasm_bindgen_test_configure!(run_in_browser);

fn pathname() -> String {
	web_sys::window().unwrap().location().pathname().unwrap()
}

#[wasm_bindgen_test]
fn test_push_updates_address_bar() {
	let history = create_web_history("").unwrap();

	history.push("/waymark/pushed", Map::new()).unwrap();

	assert_eq!(pathname(), "/waymark/pushed");
	assert_eq!(history.location(), "/waymark/pushed");
	assert_eq!(history.entry().current, "/waymark/pushed");
}

#[wasm_bindgen_test]
fn test_hash_history_writes_fragment() {
	let history = create_web_hash_history("").unwrap();

	history.replace("/settings", Map::new()).unwrap();

	let hash = web_sys::window().unwrap().location().hash().unwrap();
	assert_eq!(hash, "#/settings");
	assert_eq!(history.location(), "/settings");
}

#[wasm_bindgen_test]
async fn test_router_commits_to_browser_history() {
	// Arrange
	let history = create_web_history("").unwrap();
	history.replace("/", Map::new()).unwrap();
	let router = Router::new(RouterOptions::new(
		history,
		vec![RouteDefinition::new("/"), RouteDefinition::new("/about")],
	))
	.unwrap();

	// Act
	router.install().await.unwrap();
	let location = router.push("/about").await.unwrap();

	// Assert
	assert_eq!(location.path(), "/about");
	assert_eq!(pathname(), "/about");
}
