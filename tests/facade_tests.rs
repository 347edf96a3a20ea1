//! Facade Tests
//!
//! Checks that the `waymark` crate exposes a working router through its
//! prelude alone.

use rstest::rstest;
use waymark::prelude::*;

struct RequireLogin {
	logged_in: bool,
}

#[async_trait]
impl NavigationGuard for RequireLogin {
	async fn check(&self, ctx: GuardContext, _next: Next) -> GuardOutcome {
		if self.logged_in || !ctx.to.path().starts_with("/account") {
			GuardOutcome::Proceed
		} else {
			GuardOutcome::redirect("/login")
		}
	}
}

fn router(logged_in: bool) -> Router {
	let router = Router::new(RouterOptions::new(
		create_memory_history("/").unwrap(),
		vec![
			RouteDefinition::new("/"),
			RouteDefinition::new("/login").name("login"),
			RouteDefinition::new("/account").child(RouteDefinition::new("billing")),
		],
	))
	.unwrap();
	router.before_each(RequireLogin { logged_in });
	router
}

#[rstest]
#[case(false, "/login")]
#[case(true, "/account/billing")]
#[tokio::test]
async fn test_trait_guard_through_prelude(#[case] logged_in: bool, #[case] expected: &str) {
	// Arrange
	let router = router(logged_in);
	router.install().await.unwrap();

	// Act
	let location = router.push("/account/billing").await.unwrap();

	// Assert
	assert_eq!(location.path(), expected);
	assert_eq!(router.current_location().path(), expected);
}

#[rstest]
fn test_resolve_without_navigating() {
	let router = router(true);

	let location = router.resolve("/account/billing?tab=invoices").unwrap();

	assert_eq!(location.matched().len(), 2);
	assert_eq!(location.full_path(), "/account/billing?tab=invoices");
	assert!(!router.is_ready());
	assert!(matches!(
		router.resolve("/nowhere"),
		Err(RouterError::NoMatch { .. })
	));
}
