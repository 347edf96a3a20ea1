//! Router settings.
//!
//! Settings are plain serde structs with defaults for every field, so a TOML
//! document only needs the keys it changes:
//!
//! ```
//! use waymark_router::config::RouterSettings;
//!
//! let settings = RouterSettings::from_toml_str(
//! 	r#"
//! 	[navigation]
//! 	guard_timeout_ms = 2000
//! 	guard_history_navigation = true
//! 	"#,
//! )
//! .unwrap();
//!
//! assert_eq!(settings.navigation.max_redirects, 10);
//! assert!(settings.navigation.guard_history_navigation);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{RouterError, RouterResult};
use crate::history::{HistoryHost, HistoryMode, HistorySource};

/// Default bound on consecutive guard redirects.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Top-level router settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
	pub history: HistorySettings,
	pub navigation: NavigationSettings,
}

/// `[history]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
	/// URL encoding of locations.
	pub mode: HistoryMode,
	/// Prefix of every URL the router writes. Empty or starting with `/`.
	pub base: String,
}

impl HistorySettings {
	/// Binds a history source to `host` using these settings.
	pub fn create_source(&self, host: impl HistoryHost + 'static) -> RouterResult<HistorySource> {
		HistorySource::new(host, self.mode, &self.base)
	}
}

/// `[navigation]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
	/// Upper bound for the guard pipeline of one navigation, in milliseconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub guard_timeout_ms: Option<u64>,
	pub max_redirects: usize,
	/// Run guards for back/forward moves made outside the router.
	pub guard_history_navigation: bool,
}

impl Default for NavigationSettings {
	fn default() -> Self {
		Self {
			guard_timeout_ms: None,
			max_redirects: DEFAULT_MAX_REDIRECTS,
			guard_history_navigation: false,
		}
	}
}

impl NavigationSettings {
	pub fn guard_timeout(&self) -> Option<Duration> {
		self.guard_timeout_ms.map(Duration::from_millis)
	}
}

impl RouterSettings {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(source: &str) -> RouterResult<Self> {
		let settings: Self = toml::from_str(source)
			.map_err(|error| RouterError::Config(format!("invalid router settings: {}", error)))?;
		settings.validate()?;
		Ok(settings)
	}

	/// Reads, parses and validates a TOML file.
	pub fn from_toml_file(path: impl AsRef<Path>) -> RouterResult<Self> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path).map_err(|error| {
			RouterError::Config(format!("failed to read {}: {}", path.display(), error))
		})?;
		Self::from_toml_str(&source)
	}

	pub fn to_toml_string(&self) -> RouterResult<String> {
		toml::to_string(self).map_err(|error| RouterError::Config(error.to_string()))
	}

	/// Checks values that serde cannot express.
	pub fn validate(&self) -> RouterResult<()> {
		let base = &self.history.base;
		if !base.is_empty() && !base.starts_with('/') {
			return Err(RouterError::Config(format!(
				"history.base must be empty or start with '/': {base}"
			)));
		}
		if self.navigation.max_redirects == 0 {
			return Err(RouterError::Config(
				"navigation.max_redirects must be at least 1".to_string(),
			));
		}
		if self.navigation.guard_timeout_ms == Some(0) {
			return Err(RouterError::Config(
				"navigation.guard_timeout_ms must be greater than 0".to_string(),
			));
		}
		Ok(())
	}

	pub fn with_mode(mut self, mode: HistoryMode) -> Self {
		self.history.mode = mode;
		self
	}

	pub fn with_base(mut self, base: impl Into<String>) -> Self {
		self.history.base = base.into();
		self
	}

	pub fn with_guard_timeout(mut self, timeout: Duration) -> Self {
		self.navigation.guard_timeout_ms = Some(timeout.as_millis() as u64);
		self
	}

	pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
		self.navigation.max_redirects = max_redirects;
		self
	}

	pub fn with_guarded_history(mut self, enabled: bool) -> Self {
		self.navigation.guard_history_navigation = enabled;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_empty_document_uses_defaults() {
		let settings = RouterSettings::from_toml_str("").unwrap();

		assert_eq!(settings, RouterSettings::default());
		assert_eq!(settings.history.mode, HistoryMode::Web);
		assert_eq!(settings.navigation.max_redirects, DEFAULT_MAX_REDIRECTS);
		assert_eq!(settings.navigation.guard_timeout(), None);
	}

	#[rstest]
	fn test_full_document() {
		// Arrange
		let source = r#"
			[history]
			mode = "hash"
			base = "/app"

			[navigation]
			guard_timeout_ms = 1500
			max_redirects = 3
			guard_history_navigation = true
		"#;

		// Act
		let settings = RouterSettings::from_toml_str(source).unwrap();

		// Assert
		assert_eq!(settings.history.mode, HistoryMode::Hash);
		assert_eq!(settings.history.base, "/app");
		assert_eq!(
			settings.navigation.guard_timeout(),
			Some(Duration::from_millis(1500))
		);
		assert_eq!(settings.navigation.max_redirects, 3);
		assert!(settings.navigation.guard_history_navigation);
	}

	#[rstest]
	#[case("[history]\nbase = \"app\"\n", "history.base")]
	#[case("[navigation]\nmax_redirects = 0\n", "max_redirects")]
	#[case("[navigation]\nguard_timeout_ms = 0\n", "guard_timeout_ms")]
	#[case("[history]\nmode = \"memory\"\n", "invalid router settings")]
	fn test_invalid_documents(#[case] source: &str, #[case] fragment: &str) {
		let error = RouterSettings::from_toml_str(source).unwrap_err();

		match error {
			RouterError::Config(message) => assert!(message.contains(fragment), "{message}"),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[rstest]
	fn test_history_settings_create_source() {
		let settings = RouterSettings::default().with_mode(HistoryMode::Hash).with_base("/app");

		let source = settings
			.history
			.create_source(crate::history::MemoryHost::new("/app#/docs"))
			.unwrap();

		assert_eq!(source.location(), "/docs");
		assert_eq!(source.create_href("/x"), "/app#/x");
	}

	#[rstest]
	fn test_toml_round_trip_of_builder_values() {
		// Arrange
		let settings = RouterSettings::default()
			.with_mode(HistoryMode::Hash)
			.with_base("/docs")
			.with_guard_timeout(Duration::from_secs(2))
			.with_max_redirects(4)
			.with_guarded_history(true);

		// Act
		let parsed = RouterSettings::from_toml_str(&settings.to_toml_string().unwrap()).unwrap();

		// Assert
		assert_eq!(parsed, settings);
	}
}
