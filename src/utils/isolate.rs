//! Fault Isolation
//!
//! Runs user-supplied hooks (command handlers, task hooks) so that a panic
//! comes back as an ordinary error instead of unwinding through the caller.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use anyhow::anyhow;
use futures_util::FutureExt;

/// Await `hook`, converting a panic into an error.
pub async fn isolated<F>(hook: F) -> anyhow::Result<()>
where
    F: Future<Output = anyhow::Result<()>>,
{
    match AssertUnwindSafe(hook).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(anyhow!("panicked: {}", panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "unknown payload"
    }
}
