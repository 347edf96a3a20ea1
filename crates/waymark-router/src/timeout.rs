//! Optional deadline for a future.

use std::future::Future;
use std::time::Duration;

/// The deadline passed before the future completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Elapsed;

/// Runs `future`, giving up after `limit` when one is set.
pub(crate) async fn with_deadline<F: Future>(
	limit: Option<Duration>,
	future: F,
) -> Result<F::Output, Elapsed> {
	match limit {
		Some(limit) => deadline(limit, future).await,
		None => Ok(future.await),
	}
}

#[cfg(not(target_arch = "wasm32"))]
async fn deadline<F: Future>(limit: Duration, future: F) -> Result<F::Output, Elapsed> {
	tokio::time::timeout(limit, future).await.map_err(|_| Elapsed)
}

#[cfg(target_arch = "wasm32")]
async fn deadline<F: Future>(limit: Duration, future: F) -> Result<F::Output, Elapsed> {
	use futures::future::{self, Either};

	let millis = u32::try_from(limit.as_millis()).unwrap_or(u32::MAX);
	let sleep = gloo_timers::future::TimeoutFuture::new(millis);
	futures::pin_mut!(future);
	match future::select(future, sleep).await {
		Either::Left((output, _)) => Ok(output),
		Either::Right(((), _)) => Err(Elapsed),
	}
}
