//! Deferred render passes.
//!
//! A pass is a tokio task that sleeps for the configured delay and then runs.
//! In [`RenderMode::FireAndForget`] every scheduled pass runs. In
//! [`RenderMode::Debounce`] scheduling aborts the pass still waiting, if any.
//! Unbinding cancels everything still waiting.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use log::trace;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

use crate::config::RenderMode;
use crate::error::{BridgeError, BridgeResult, LockResultExt};

const LOG_TARGET: &str = "editbridge::scheduler";

struct Binding {
    handle: Handle,
    cancel: CancellationToken,
}

#[derive(Default)]
pub struct RenderScheduler {
    binding: Mutex<Option<Binding>>,
    pending: Mutex<Option<AbortHandle>>,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current tokio runtime for later passes.
    pub fn bind(&self) -> BridgeResult<()> {
        let handle = Handle::try_current().map_err(|e| BridgeError::NoRuntime(e.to_string()))?;
        *self.binding.lock().recover_poison("RenderScheduler::bind") = Some(Binding {
            handle,
            cancel: CancellationToken::new(),
        });
        Ok(())
    }

    /// Cancel every pending pass and release the runtime.
    pub fn unbind(&self) {
        let binding = self
            .binding
            .lock()
            .recover_poison("RenderScheduler::unbind")
            .take();
        if let Some(binding) = binding {
            binding.cancel.cancel();
        }
        if let Some(pending) = self
            .pending
            .lock()
            .recover_poison("RenderScheduler::unbind")
            .take()
        {
            pending.abort();
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding
            .lock()
            .recover_poison("RenderScheduler::is_bound")
            .is_some()
    }

    /// Run `job` after `delay`. Returns false when not bound.
    pub fn schedule<F>(&self, delay: Duration, mode: RenderMode, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let Some((handle, cancel)) = self.binding_parts() else {
            return false;
        };

        let mut pending = self.pending.lock().recover_poison("RenderScheduler::schedule");
        if mode == RenderMode::Debounce
            && let Some(previous) = pending.take()
        {
            previous.abort();
            trace!(target: LOG_TARGET, "Superseded pending render pass");
        }

        let task = handle.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    trace!(target: LOG_TARGET, "Render pass cancelled");
                }
                _ = tokio::time::sleep(delay) => job(),
            }
        });
        if mode == RenderMode::Debounce {
            *pending = Some(task.abort_handle());
        }
        true
    }

    /// Spawn `future` on the bound runtime. Returns false when not bound.
    pub fn spawn<F>(&self, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.binding_parts() {
            Some((handle, _)) => {
                handle.spawn(future);
                true
            }
            None => false,
        }
    }

    fn binding_parts(&self) -> Option<(Handle, CancellationToken)> {
        self.binding
            .lock()
            .recover_poison("RenderScheduler::binding_parts")
            .as_ref()
            .map(|binding| (binding.handle.clone(), binding.cancel.clone()))
    }
}
