//! Backend half of a window

use image::RgbaImage;

use crate::backend::NativeHandle;
use crate::cursor::CursorBackend;
use crate::input::CursorMode;
use crate::window::Rect;

/// Native window primitives
///
/// Arguments are validated by [`crate::Window`] before they reach the backend.
/// The native window is destroyed when the box is dropped, after the window's
/// context is gone.
pub trait WindowBackend {
    /// Handle used to route backend events to this window
    fn native_handle(&self) -> NativeHandle;

    /// Native window handed to `eglCreateWindowSurface`
    fn egl_native_window(&self) -> NativeHandle {
        self.native_handle()
    }

    /// Maximized state
    fn is_maximized(&self) -> bool;
    /// Minimized state
    fn is_minimized(&self) -> bool;
    /// Visible state
    fn is_visible(&self) -> bool;
    /// Cursor over the content area
    fn is_hovered(&self) -> bool;
    /// Input focus
    fn is_focused(&self) -> bool;
    /// Framebuffer alpha is composited
    fn is_framebuffer_transparent(&self) -> bool;

    /// Content area position in screen coordinates
    fn position(&self) -> (i32, i32);
    /// Content area size in screen coordinates
    fn size(&self) -> (i32, i32);
    /// Framebuffer size in pixels
    fn framebuffer_size(&self) -> (i32, i32);
    /// Decoration extents as `(left, top, right, bottom)`
    fn frame_size(&self) -> (i32, i32, i32, i32);
    /// Content scale
    fn content_scale(&self) -> (f32, f32);
    /// Whole-window opacity
    fn opacity(&self) -> f32;
    /// OS cursor position relative to the content area
    fn cursor_position(&self) -> (f64, f64);

    /// Change the title
    fn set_title(&mut self, title: &str);
    /// Change the icon; `images` is never empty
    fn set_icon(&mut self, images: &[RgbaImage]);
    /// Show `cursor` over the content area, or the default arrow
    fn set_cursor(&mut self, cursor: Option<&dyn CursorBackend>);
    /// Move the content area
    fn set_position(&mut self, x: i32, y: i32);
    /// Resize the content area
    fn set_size(&mut self, width: i32, height: i32);
    /// Constrain resizing; `-1` leaves a bound open
    fn set_size_limits(&mut self, min_width: i32, min_height: i32, max_width: i32, max_height: i32);
    /// Constrain the aspect ratio; `-1` removes the constraint
    fn set_aspect_ratio(&mut self, numerator: i32, denominator: i32);
    /// Set whole-window opacity
    fn set_opacity(&mut self, opacity: f32);
    /// Toggle decorations
    fn set_decorated(&mut self, decorated: bool);
    /// Toggle always-on-top
    fn set_floating(&mut self, floating: bool);
    /// Toggle user resizing
    fn set_resizable(&mut self, resizable: bool);
    /// Let mouse input pass through to windows below
    fn set_mouse_passthrough(&mut self, enabled: bool);
    /// Go fullscreen over `fullscreen`, or back to a windowed `windowed` rectangle
    fn set_monitor(&mut self, fullscreen: Option<Rect>, windowed: Rect);
    /// Warp the OS cursor
    fn set_cursor_position(&mut self, x: f64, y: f64);
    /// Apply a cursor mode
    fn set_cursor_mode(&mut self, mode: CursorMode);
    /// Toggle unaccelerated motion
    fn set_raw_mouse_motion(&mut self, enabled: bool);

    /// Maximize
    fn maximize(&mut self);
    /// Minimize
    fn minimize(&mut self);
    /// Restore from maximized or minimized
    fn restore(&mut self);
    /// Show
    fn show(&mut self);
    /// Hide
    fn hide(&mut self);
    /// Flash or bounce to get the user's attention
    fn request_attention(&mut self);
    /// Raise and take input focus
    fn focus(&mut self);
}
