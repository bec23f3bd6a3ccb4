//! Thread-local current-context slot

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::collections::WindowId;

static NEXT_SLOT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT: Cell<Option<(u64, WindowId)>> = const { Cell::new(None) };
}

/// Handle to the calling thread's "current context" slot
///
/// Each thread holds at most one current window. Slots are tagged with the
/// platform that allocated them, so a window made current by one platform
/// instance is invisible to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextSlot {
    id: u64,
}

impl ContextSlot {
    /// Allocate a slot tag
    pub fn allocate() -> Self {
        Self {
            id: NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Window whose context is current on this thread
    pub fn get(self) -> Option<WindowId> {
        CURRENT.with(|current| match current.get() {
            Some((id, window)) if id == self.id => Some(window),
            _ => None,
        })
    }

    /// Record `window` as current on this thread
    pub fn set(self, window: Option<WindowId>) {
        CURRENT.with(|current| current.set(window.map(|w| (self.id, w))));
    }

    /// Clear the slot if it still belongs to this tag
    pub fn release(self) {
        CURRENT.with(|current| {
            if matches!(current.get(), Some((id, _)) if id == self.id) {
                current.set(None);
            }
        });
    }
}
