//! Side effects whose failure must never fail the surrounding request.

use std::fmt::Display;
use std::future::Future;

use tracing::warn;

/// Await `fut`, logging and discarding any error.
///
/// Returns the success value when there is one so callers can still use it.
///
/// # Examples
/// ```
/// use fieldops::domain::best_effort;
///
/// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
/// let outcome = best_effort("audit", async { Err::<(), _>("db down") }).await;
/// assert!(outcome.is_none());
/// # });
/// ```
pub async fn best_effort<T, E, Fut>(label: &str, fut: Fut) -> Option<T>
where
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(side_effect = label, %error, "best-effort side effect failed");
            None
        }
    }
}
