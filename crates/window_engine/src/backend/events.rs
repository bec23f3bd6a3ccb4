//! Events reported by backends
//!
//! The pump methods of [`super::PlatformBackend`] return these in the order the
//! OS delivered them. The platform routes each one to the matching window or
//! platform entry point before looking at the next.

use std::path::PathBuf;

use super::NativeHandle;
use crate::input::{JoystickEvent, Key, KeyMods, KeyState, MouseButton};

/// A single backend event
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// Something happened to a window
    Window(NativeHandle, WindowEvent),
    /// The set of connected monitors may have changed
    MonitorsChanged,
    /// A joystick changed
    Joystick(JoystickEvent),
}

/// Window-level events
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    /// The user asked to close the window
    Closed,
    /// Content area moved
    Moved {
        /// New x position
        x: i32,
        /// New y position
        y: i32,
    },
    /// Content area resized
    Resized {
        /// New width
        width: i32,
        /// New height
        height: i32,
    },
    /// Contents need redrawing
    Refresh,
    /// Input focus gained or lost
    Focus(bool),
    /// Minimized or restored
    Minimized(bool),
    /// Maximized or restored
    Maximized(bool),
    /// Framebuffer resized
    FramebufferResized {
        /// New width in pixels
        width: i32,
        /// New height in pixels
        height: i32,
    },
    /// Content scale changed
    ContentScale {
        /// Horizontal scale
        x: f32,
        /// Vertical scale
        y: f32,
    },
    /// Mouse button pressed or released
    MouseButton {
        /// Button
        button: MouseButton,
        /// `Press` or `Release`
        action: KeyState,
        /// Modifiers held
        mods: KeyMods,
    },
    /// Cursor moved to an absolute content-area position
    CursorMoved {
        /// New x
        x: f64,
        /// New y
        y: f64,
    },
    /// Relative motion while the cursor is disabled
    CursorDelta {
        /// Horizontal delta
        dx: f64,
        /// Vertical delta
        dy: f64,
    },
    /// Cursor entered or left the content area
    CursorEnter(bool),
    /// Scroll wheel or touchpad scroll
    Scroll {
        /// Horizontal offset
        x: f64,
        /// Vertical offset
        y: f64,
    },
    /// Key pressed, repeated or released
    Key {
        /// Translated key
        key: Key,
        /// Platform scancode
        scancode: i32,
        /// `Press`, `Repeat` or `Release`
        action: KeyState,
        /// Modifiers held
        mods: KeyMods,
    },
    /// Text input
    Char {
        /// Unicode code point
        codepoint: u32,
        /// Modifiers held
        mods: KeyMods,
        /// Whether the input is plain text (no Ctrl/Alt chord)
        plain: bool,
    },
    /// Files dropped on the window
    Drop(Vec<PathBuf>),
}
