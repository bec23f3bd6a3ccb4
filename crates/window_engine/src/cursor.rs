//! Cursor objects
//!
//! Cursors carry no engine-side state. The platform registry owns them and
//! windows refer to them by [`CursorId`](crate::foundation::collections::CursorId).

use std::any::Any;

use crate::input::CursorShape;

/// Backend half of a cursor
pub trait CursorBackend {
    /// Get access to the concrete type for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Where a cursor came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorSource {
    /// Built from an RGBA image with a hotspot
    Image {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
        /// Hotspot x
        xhot: i32,
        /// Hotspot y
        yhot: i32,
    },
    /// A system shape
    Standard(CursorShape),
}

/// A cursor image usable by any window
pub struct Cursor {
    source: CursorSource,
    backend: Box<dyn CursorBackend>,
}

impl Cursor {
    pub(crate) fn new(source: CursorSource, backend: Box<dyn CursorBackend>) -> Self {
        Self { source, backend }
    }

    /// Image or shape the cursor was created from
    pub fn source(&self) -> CursorSource {
        self.source
    }

    /// Backend half
    pub fn backend(&self) -> &dyn CursorBackend {
        self.backend.as_ref()
    }
}
