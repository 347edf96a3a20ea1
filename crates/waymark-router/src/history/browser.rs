//! Browser session history backed by `web-sys`.

use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{History, PopStateEvent, Window};

use super::{HistoryHost, HistoryMode, HistorySource, HostLocation, PopCallback, ScrollPosition};
use crate::error::{RouterError, RouterResult};

/// Creates a history source for the current window using pathname URLs.
pub fn create_web_history(base: &str) -> RouterResult<HistorySource> {
	HistorySource::new(BrowserHost, HistoryMode::Web, base)
}

/// Creates a history source for the current window using fragment URLs.
pub fn create_web_hash_history(base: &str) -> RouterResult<HistorySource> {
	HistorySource::new(BrowserHost, HistoryMode::Hash, base)
}

/// The window's `History` and `Location`.
///
/// Holds no JavaScript handles; the window is looked up on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserHost;

fn window() -> RouterResult<Window> {
	web_sys::window().ok_or_else(|| RouterError::HistoryWriteFailed("no window available".to_string()))
}

fn history() -> RouterResult<History> {
	window()?
		.history()
		.map_err(|error| RouterError::HistoryWriteFailed(format!("{:?}", error)))
}

fn to_js(state: &Value) -> RouterResult<JsValue> {
	js_sys::JSON::parse(&state.to_string())
		.map_err(|error| RouterError::MalformedEntry(format!("{:?}", error)))
}

fn from_js(state: JsValue) -> Option<Value> {
	if state.is_null() || state.is_undefined() {
		return None;
	}
	let text: String = js_sys::JSON::stringify(&state).ok()?.into();
	// Records that are not JSON are handed on as a bare string, which fails
	// to decode and gets replaced.
	Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

impl HistoryHost for BrowserHost {
	fn location(&self) -> HostLocation {
		let Ok(window) = window() else {
			return HostLocation::default();
		};
		let location = window.location();
		HostLocation {
			pathname: location.pathname().unwrap_or_else(|_| "/".to_string()),
			search: location.search().unwrap_or_default(),
			hash: location.hash().unwrap_or_default(),
		}
	}

	fn state(&self) -> Option<Value> {
		history().ok()?.state().ok().and_then(from_js)
	}

	fn length(&self) -> usize {
		history()
			.ok()
			.and_then(|history| history.length().ok())
			.unwrap_or(1) as usize
	}

	fn scroll(&self) -> ScrollPosition {
		let Ok(window) = window() else {
			return ScrollPosition::default();
		};
		ScrollPosition {
			left: window.scroll_x().unwrap_or_default(),
			top: window.scroll_y().unwrap_or_default(),
		}
	}

	fn push_state(&self, state: Value, url: &str) -> RouterResult<()> {
		history()?
			.push_state_with_url(&to_js(&state)?, "", Some(url))
			.map_err(|error| RouterError::HistoryWriteFailed(format!("{:?}", error)))
	}

	fn replace_state(&self, state: Value, url: &str) -> RouterResult<()> {
		history()?
			.replace_state_with_url(&to_js(&state)?, "", Some(url))
			.map_err(|error| RouterError::HistoryWriteFailed(format!("{:?}", error)))
	}

	fn go(&self, delta: i32) {
		if let Ok(history) = history()
			&& let Err(error) = history.go_with_delta(delta)
		{
			tracing::warn!(delta, error = ?error, "history.go failed");
		}
	}

	fn on_pop(&self, callback: PopCallback) {
		let Ok(window) = window() else {
			tracing::warn!("no window available, back/forward will not be observed");
			return;
		};
		let handler = Closure::wrap(Box::new(move |event: PopStateEvent| {
			callback(from_js(event.state()));
		}) as Box<dyn FnMut(_)>);

		if let Err(error) =
			window.add_event_listener_with_callback("popstate", handler.as_ref().unchecked_ref())
		{
			tracing::warn!(error = ?error, "failed to register popstate listener");
			return;
		}
		// The listener lives as long as the page.
		handler.forget();
	}
}
