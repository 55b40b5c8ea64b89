use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Inner {
    stopped: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
}

/// Stop flag shared between the Ctrl+C handler and the polling loop.
///
/// Cloning hands out another handle to the same flag. Waits return early
/// as soon as any handle calls [`ShutdownSignal::trigger`].
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        let _guard = self.inner.mutex.lock();
        self.inner.condvar.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` unless shutdown is triggered first.
    ///
    /// Returns `true` if shutdown was triggered.
    pub fn wait(&self, duration: Duration) -> bool {
        if self.is_shutdown() {
            return true;
        }

        let Ok(guard) = self.inner.mutex.lock() else {
            return true;
        };
        match self
            .inner
            .condvar
            .wait_timeout_while(guard, duration, |_| !self.is_shutdown())
        {
            Ok(_) => self.is_shutdown(),
            // Poisoned: nobody can trigger us reliably any more
            Err(_) => true,
        }
    }
}
