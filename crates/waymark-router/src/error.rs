//! Error types for navigation.
//!
//! Every fallible router operation returns [`RouterResult`]. Navigation
//! failures leave the current location untouched; see the individual
//! variants for the recovery story of each kind.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::guard::GuardStep;

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;

/// Error type for router operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RouterError {
	/// No registered route has the requested normalized path.
	#[error("no route matches path: {path}")]
	NoMatch {
		/// The normalized path that was looked up.
		path: String,
	},

	/// A guard vetoed the navigation.
	#[error(transparent)]
	GuardRejected(GuardRejection),

	/// Guards kept redirecting past the configured limit.
	#[error("navigation to '{to}' exceeded the redirect limit of {limit}")]
	RedirectLimit {
		/// The last redirect target.
		to: String,
		/// Configured maximum number of redirects.
		limit: usize,
	},

	/// The guard pipeline did not settle within the configured timeout.
	#[error("navigation to '{to}' timed out after {timeout:?}")]
	GuardTimeout {
		/// The navigation target.
		to: String,
		/// The timeout that elapsed.
		timeout: Duration,
	},

	/// The host refused a history write (quota, security restrictions, ...).
	///
	/// The attempt failed but the router state is intact; callers may retry.
	#[error("history write failed: {0}")]
	HistoryWriteFailed(String),

	/// A stored history record is missing required fields.
	#[error("malformed history entry: {0}")]
	MalformedEntry(String),

	/// A route with the same normalized path is already registered.
	#[error("route already registered: {path}")]
	DuplicateRoute {
		/// The conflicting normalized path.
		path: String,
	},

	/// A route definition could not be registered.
	#[error("invalid route definition: {0}")]
	InvalidRoute(String),

	/// Router settings failed to load or validate.
	#[error("configuration error: {0}")]
	Config(String),
}

impl RouterError {
	/// Creates a [`RouterError::NoMatch`] for the given path.
	pub fn no_match(path: impl Into<String>) -> Self {
		Self::NoMatch { path: path.into() }
	}

	/// Returns `true` if this error aborted a navigation because of a guard.
	pub fn is_guard_rejection(&self) -> bool {
		matches!(self, Self::GuardRejected(_))
	}
}

/// Details about a guard that vetoed a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRejection {
	/// Path of the navigation target.
	pub to: String,
	/// Pipeline step the guard belongs to.
	pub step: GuardStep,
	/// Position of the guard within its step.
	pub index: usize,
	/// Path of the record owning the guard, for record and component guards.
	pub record: Option<String>,
	/// Reason supplied by the guard, if any.
	pub reason: Option<String>,
}

impl fmt::Display for GuardRejection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"navigation to '{}' rejected by {} guard #{}",
			self.to, self.step, self.index
		)?;
		if let Some(record) = &self.record {
			write!(f, " of route '{}'", record)?;
		}
		if let Some(reason) = &self.reason {
			write!(f, ": {}", reason)?;
		}
		Ok(())
	}
}

impl std::error::Error for GuardRejection {}

/// Error reported by an after-navigation hook.
///
/// After hooks run once a navigation is committed, so these errors are only
/// logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("after hook failed: {0}")]
pub struct AfterHookError(pub String);

impl From<&str> for AfterHookError {
	fn from(message: &str) -> Self {
		Self(message.to_string())
	}
}

impl From<String> for AfterHookError {
	fn from(message: String) -> Self {
		Self(message)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_no_match_display() {
		// Arrange
		let error = RouterError::no_match("/missing");

		// Act
		let message = error.to_string();

		// Assert
		assert_eq!(message, "no route matches path: /missing");
	}

	#[rstest]
	#[case(None, None, "navigation to '/admin' rejected by before guard #0")]
	#[case(
		Some("/admin"),
		Some("login required"),
		"navigation to '/admin' rejected by before guard #0 of route '/admin': login required"
	)]
	fn test_guard_rejection_display(
		#[case] record: Option<&str>,
		#[case] reason: Option<&str>,
		#[case] expected: &str,
	) {
		// Arrange
		let rejection = GuardRejection {
			to: "/admin".to_string(),
			step: GuardStep::Before,
			index: 0,
			record: record.map(String::from),
			reason: reason.map(String::from),
		};

		// Act
		let error = RouterError::GuardRejected(rejection);

		// Assert
		assert_eq!(error.to_string(), expected);
		assert!(error.is_guard_rejection());
	}

	#[rstest]
	fn test_timeout_display() {
		let error = RouterError::GuardTimeout {
			to: "/slow".to_string(),
			timeout: Duration::from_millis(250),
		};

		assert_eq!(
			error.to_string(),
			"navigation to '/slow' timed out after 250ms"
		);
	}
}
