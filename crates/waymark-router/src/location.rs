//! Resolved locations.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::matcher::{RouteRecord, split_location};

/// A resolved navigation target.
///
/// Produced fresh by every resolve call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
	path: String,
	full_path: String,
	query: BTreeMap<String, String>,
	params: BTreeMap<String, String>,
	matched: Vec<Arc<RouteRecord>>,
}

impl Location {
	pub(crate) fn new(
		path: String,
		full_path: String,
		matched: Vec<Arc<RouteRecord>>,
	) -> Self {
		Self {
			path,
			full_path,
			query: BTreeMap::new(),
			params: BTreeMap::new(),
			matched,
		}
	}

	/// The location the router holds before its first committed navigation.
	pub fn start() -> Self {
		Self::new("/".to_string(), "/".to_string(), Vec::new())
	}

	/// Returns `true` for the [`Location::start`] placeholder.
	pub fn is_start(&self) -> bool {
		self.matched.is_empty() && self.path == "/" && self.full_path == "/"
	}

	/// Normalized path used for matching.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Path as requested, including query and fragment.
	pub fn full_path(&self) -> &str {
		&self.full_path
	}

	/// Normalized path with the requested query and fragment re-attached.
	///
	/// This is what gets written to history, so `//about?x=1` is stored as
	/// `/about?x=1`.
	pub fn href(&self) -> String {
		let (_, query, fragment) = split_location(&self.full_path);
		let mut href = self.path.clone();
		if let Some(query) = query {
			href.push('?');
			href.push_str(query);
		}
		if let Some(fragment) = fragment {
			href.push('#');
			href.push_str(fragment);
		}
		href
	}

	/// Query values. Always empty: matching is literal.
	pub fn query(&self) -> &BTreeMap<String, String> {
		&self.query
	}

	/// Path parameters. Always empty: matching is literal.
	pub fn params(&self) -> &BTreeMap<String, String> {
		&self.params
	}

	/// Matched records ordered root to leaf.
	pub fn matched(&self) -> &[Arc<RouteRecord>] {
		&self.matched
	}

	/// The most specific matched record.
	pub fn leaf(&self) -> Option<&Arc<RouteRecord>> {
		self.matched.last()
	}

	/// Name of the most specific matched record.
	pub fn name(&self) -> Option<&str> {
		self.leaf().and_then(|record| record.name())
	}

	/// Returns `true` if a record with `path` is part of the matched chain.
	pub fn contains_record(&self, path: &str) -> bool {
		self.matched.iter().any(|record| record.path() == path)
	}
}

impl Default for Location {
	fn default() -> Self {
		Self::start()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_start_location() {
		let start = Location::start();

		assert!(start.is_start());
		assert_eq!(start.path(), "/");
		assert!(start.matched().is_empty());
		assert!(start.query().is_empty());
		assert!(start.params().is_empty());
		assert!(start.name().is_none());
		assert_eq!(start.href(), "/");
	}

	#[rstest]
	#[case("/about", "/about")]
	#[case("//about", "/about")]
	#[case("//docs///intro?tab=1#top", "/docs/intro?tab=1#top")]
	#[case("/search?", "/search?")]
	#[case("/faq#", "/faq#")]
	fn test_href_normalizes_path_only(#[case] requested: &str, #[case] expected: &str) {
		let (bare, _, _) = split_location(requested);
		let location = Location::new(
			crate::matcher::normalize_path(bare),
			requested.to_string(),
			Vec::new(),
		);

		assert_eq!(location.href(), expected);
	}
}
