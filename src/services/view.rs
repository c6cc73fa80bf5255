use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

/// Mounted flag of a view. Results that land after `unmount` are dropped;
/// the underlying request still runs to completion.
#[derive(Debug, Clone)]
pub struct ViewGuard {
    mounted: Arc<AtomicBool>,
}

impl ViewGuard {
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub async fn apply_if_mounted<T, F>(&self, fut: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let out = fut.await;
        if self.is_mounted() {
            Some(out)
        } else {
            debug!("view unmounted, discarding result");
            None
        }
    }
}

impl Default for ViewGuard {
    fn default() -> Self {
        Self::new()
    }
}
