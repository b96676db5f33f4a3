//! Callback-style access to the async API.

use std::future::Future;

use tokio::task::JoinHandle;

/// Drive `fut` on the current runtime and hand its result to `cb`.
///
/// The future must own what it uses, e.g. a cloned API group:
/// `let objects = node.object(); with_callback(async move { objects.get(&h).await }, cb)`.
pub fn with_callback<F, T, C>(fut: F, cb: C) -> JoinHandle<()>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
    C: FnOnce(T) + Send + 'static,
{
    tokio::spawn(async move { cb(fut.await) })
}
