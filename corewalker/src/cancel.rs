//! The cooperative cancellation flag from `spec.md` §5: polled between
//! iterator steps and between visitor callbacks. On cancel, an iterator
//! behaves as if it reached the end of its sequence and a visitor
//! finalizes with whatever partial result it has accumulated; nothing
//! panics or unwinds through the graph.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
