//! Path normalization helpers.

/// The path separator.
pub const SEPARATOR: char = '/';

/// Normalizes a path: guarantees a leading separator and collapses repeated
/// separators. Trailing separators are kept, so `/about/` and `/about` stay
/// distinct.
pub fn normalize_path(path: &str) -> String {
	let mut normalized = String::with_capacity(path.len() + 1);
	normalized.push(SEPARATOR);
	let mut previous_was_separator = true;

	for ch in path.chars() {
		if ch == SEPARATOR {
			if previous_was_separator {
				continue;
			}
			previous_was_separator = true;
		} else {
			previous_was_separator = false;
		}
		normalized.push(ch);
	}

	normalized
}

/// Computes the normalized path of a child route.
///
/// An absolute child path ignores the parent entirely.
pub fn join_paths(parent: Option<&str>, child: &str) -> String {
	match parent {
		Some(parent) if !child.starts_with(SEPARATOR) => {
			normalize_path(&format!("{}{}{}", parent, SEPARATOR, child))
		}
		_ => normalize_path(child),
	}
}

/// Splits a location string into its path, query and fragment parts.
pub fn split_location(location: &str) -> (&str, Option<&str>, Option<&str>) {
	let (rest, fragment) = match location.split_once('#') {
		Some((rest, fragment)) => (rest, Some(fragment)),
		None => (location, None),
	};
	let (path, query) = match rest.split_once('?') {
		Some((path, query)) => (path, Some(query)),
		None => (rest, None),
	};
	(path, query, fragment)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("/", "/")]
	#[case("", "/")]
	#[case("about", "/about")]
	#[case("//about//m", "/about/m")]
	#[case("/about/", "/about/")]
	#[case("/a///b/", "/a/b/")]
	fn test_normalize_path(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(normalize_path(input), expected);
	}

	#[rstest]
	#[case(Some("/about"), "m", "/about/m")]
	#[case(Some("/about/"), "m", "/about/m")]
	#[case(Some("/"), "a", "/a")]
	#[case(Some("/about"), "/m", "/m")]
	#[case(Some("/about"), "", "/about/")]
	#[case(None, "about", "/about")]
	#[case(None, "/", "/")]
	fn test_join_paths(#[case] parent: Option<&str>, #[case] child: &str, #[case] expected: &str) {
		assert_eq!(join_paths(parent, child), expected);
	}

	#[rstest]
	#[case("/about", "/about", None, None)]
	#[case("/about?tab=1", "/about", Some("tab=1"), None)]
	#[case("/about#top", "/about", None, Some("top"))]
	#[case("/about?tab=1#top", "/about", Some("tab=1"), Some("top"))]
	fn test_split_location(
		#[case] input: &str,
		#[case] path: &str,
		#[case] query: Option<&str>,
		#[case] fragment: Option<&str>,
	) {
		assert_eq!(split_location(input), (path, query, fragment));
	}
}
