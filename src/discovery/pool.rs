//! Bounded task pool shared by the sweep and enrichment phases

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Run `task` once per item with at most `limit` futures executing at a time.
///
/// Results come back in completion order; `on_done` sees each one as it
/// arrives. A task that panics is logged and left out of the results.
pub async fn run_bounded<I, T, F, Fut, R, D>(items: I, limit: usize, task: F, mut on_done: D) -> Vec<R>
where
    I: IntoIterator<Item = T>,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
    R: Send + 'static,
    D: FnMut(&R),
{
    // Semaphore::new panics above MAX_PERMITS
    let semaphore = Arc::new(Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS)));
    let mut set = JoinSet::new();

    for item in items {
        let fut = task(item);
        let semaphore = Arc::clone(&semaphore);
        set.spawn(async move {
            // Only fails if the semaphore is closed, which never happens here
            let _permit = semaphore.acquire_owned().await.ok()?;
            Some(fut.await)
        });
    }

    let mut results = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Some(result)) => {
                on_done(&result);
                results.push(result);
            }
            Ok(None) => {}
            Err(e) => log::warn!("Probe task failed: {}", e),
        }
    }
    results
}
