//! Async runtime management for FFI
//!
//! The REST and realtime APIs are async; the C entry points drive them to
//! completion on one global Tokio runtime.

use std::future::Future;
use std::sync::Mutex;
use tokio::runtime::{Handle, Runtime};

use crate::error::{Error, ErrorCode, Result};

lazy_static::lazy_static! {
    /// Global Tokio runtime for async operations
    static ref RUNTIME: Mutex<Option<Runtime>> = Mutex::new(None);
}

/// Initialize the async runtime
///
/// It's safe to call multiple times - subsequent calls are no-ops.
pub fn init_runtime() -> Result<()> {
    let mut runtime_guard = RUNTIME
        .lock()
        .map_err(|_| Error::new(ErrorCode::Unknown, "Failed to acquire runtime lock"))?;

    if runtime_guard.is_none() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("rocketchat-worker")
            .build()
            .map_err(|e| Error::new(ErrorCode::Unknown, format!("Failed to create Tokio runtime: {e}")))?;
        *runtime_guard = Some(runtime);
    }

    Ok(())
}

/// Shutdown the async runtime
///
/// Background tasks (realtime read loops) get a few seconds to finish.
pub fn shutdown_runtime() {
    if let Ok(mut runtime_guard) = RUNTIME.lock() {
        if let Some(runtime) = runtime_guard.take() {
            runtime.shutdown_timeout(std::time::Duration::from_secs(5));
        }
    }
}

fn runtime_handle() -> Result<Handle> {
    RUNTIME
        .lock()
        .map_err(|_| Error::new(ErrorCode::Unknown, "Failed to acquire runtime lock"))?
        .as_ref()
        .map(|rt| rt.handle().clone())
        .ok_or_else(|| Error::new(ErrorCode::InvalidState, "Library not initialized, call rocketchat_init() first"))
}

/// Execute an async future synchronously
///
/// Blocks the calling thread until the future completes. Fails with
/// `InvalidState` when the runtime isn't initialized.
pub fn block_on<F>(future: F) -> Result<F::Output>
where
    F: Future,
{
    let handle = runtime_handle()?;
    Ok(handle.block_on(future))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_on() {
        init_runtime().unwrap();

        let result = block_on(async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            42
        });
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_multiple_init() {
        init_runtime().unwrap();
        init_runtime().unwrap();
    }
}
