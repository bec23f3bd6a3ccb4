//! Headless windows

use image::RgbaImage;

use super::{HeadlessCursor, Shared};
use crate::backend::{NativeHandle, WindowEvent, WindowRequest};
use crate::cursor::CursorBackend;
use crate::input::CursorMode;
use crate::monitor::DONT_CARE;
use crate::window::{Rect, WindowBackend};

/// Everything a headless window remembers
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWindowState {
    /// Title
    pub title: String,
    /// Content area position
    pub position: (i32, i32),
    /// Content area size
    pub size: (i32, i32),
    /// Content scale
    pub content_scale: (f32, f32),
    /// Opacity
    pub opacity: f32,
    /// Shown
    pub visible: bool,
    /// Has input focus
    pub focused: bool,
    /// Cursor over the content area
    pub hovered: bool,
    /// Maximized
    pub maximized: bool,
    /// Minimized
    pub minimized: bool,
    /// Decorated
    pub decorated: bool,
    /// Always on top
    pub floating: bool,
    /// User resizable
    pub resizable: bool,
    /// Mouse passthrough
    pub mouse_passthrough: bool,
    /// Transparent framebuffer
    pub transparent: bool,
    /// `(min_width, min_height, max_width, max_height)`
    pub size_limits: (i32, i32, i32, i32),
    /// `(numerator, denominator)`
    pub aspect_ratio: (i32, i32),
    /// OS cursor position
    pub cursor_position: (f64, f64),
    /// Cursor mode
    pub cursor_mode: CursorMode,
    /// Raw mouse motion
    pub raw_mouse_motion: bool,
    /// Id of the cursor shown, `None` for the arrow
    pub cursor: Option<u64>,
    /// Area covered while fullscreen
    pub fullscreen: Option<Rect>,
    /// Size of the icon image last set
    pub icon: Option<(u32, u32)>,
    /// Number of attention requests
    pub attention_requests: usize,
}

impl HeadlessWindowState {
    pub(super) fn new(request: &WindowRequest<'_>) -> Self {
        let (position, size) = match request.fullscreen {
            Some(area) => ((area.x, area.y), (area.width, area.height)),
            None => ((0, 0), (request.width, request.height)),
        };
        Self {
            title: request.title.to_string(),
            position,
            size,
            content_scale: (1.0, 1.0),
            opacity: 1.0,
            visible: false,
            focused: false,
            hovered: false,
            maximized: false,
            minimized: false,
            decorated: request.window.decorated,
            floating: request.window.floating,
            resizable: request.window.resizable,
            mouse_passthrough: false,
            transparent: request.framebuffer.transparent,
            size_limits: (DONT_CARE, DONT_CARE, DONT_CARE, DONT_CARE),
            aspect_ratio: (DONT_CARE, DONT_CARE),
            cursor_position: (0.0, 0.0),
            cursor_mode: CursorMode::Normal,
            raw_mouse_motion: false,
            cursor: None,
            fullscreen: request.fullscreen,
            icon: None,
            attention_requests: 0,
        }
    }
}

/// Native half of a headless window
pub(super) struct HeadlessWindow {
    handle: NativeHandle,
    state: Shared,
}

impl HeadlessWindow {
    pub(super) fn new(handle: NativeHandle, state: Shared) -> Self {
        Self { handle, state }
    }

    fn read<T>(&self, f: impl FnOnce(&HeadlessWindowState) -> T) -> T
    where
        T: Default,
    {
        self.state.borrow().windows.get(&self.handle).map(f).unwrap_or_default()
    }

    /// Update the record and queue whatever events the change produces
    fn update(&self, f: impl FnOnce(&mut HeadlessWindowState) -> Vec<WindowEvent>) {
        let mut state = self.state.borrow_mut();
        let events = match state.windows.get_mut(&self.handle) {
            Some(window) => f(window),
            None => return,
        };
        for event in events {
            state.push_window_event(self.handle, event);
        }
    }
}

impl Drop for HeadlessWindow {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.windows.remove(&self.handle);
        state.record(format!("destroy_window:{}", self.handle.0));
    }
}

impl WindowBackend for HeadlessWindow {
    fn native_handle(&self) -> NativeHandle {
        self.handle
    }

    fn is_maximized(&self) -> bool {
        self.read(|w| w.maximized)
    }

    fn is_minimized(&self) -> bool {
        self.read(|w| w.minimized)
    }

    fn is_visible(&self) -> bool {
        self.read(|w| w.visible)
    }

    fn is_hovered(&self) -> bool {
        self.read(|w| w.hovered)
    }

    fn is_focused(&self) -> bool {
        self.read(|w| w.focused)
    }

    fn is_framebuffer_transparent(&self) -> bool {
        self.read(|w| w.transparent)
    }

    fn position(&self) -> (i32, i32) {
        self.read(|w| w.position)
    }

    fn size(&self) -> (i32, i32) {
        self.read(|w| w.size)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn framebuffer_size(&self) -> (i32, i32) {
        self.read(|w| {
            (
                (w.size.0 as f32 * w.content_scale.0) as i32,
                (w.size.1 as f32 * w.content_scale.1) as i32,
            )
        })
    }

    fn frame_size(&self) -> (i32, i32, i32, i32) {
        self.read(|w| if w.decorated && w.fullscreen.is_none() { (1, 30, 1, 1) } else { (0, 0, 0, 0) })
    }

    fn content_scale(&self) -> (f32, f32) {
        self.read(|w| w.content_scale)
    }

    fn opacity(&self) -> f32 {
        self.read(|w| w.opacity)
    }

    fn cursor_position(&self) -> (f64, f64) {
        self.read(|w| w.cursor_position)
    }

    fn set_title(&mut self, title: &str) {
        self.update(|w| {
            w.title = title.to_string();
            Vec::new()
        });
    }

    fn set_icon(&mut self, images: &[RgbaImage]) {
        self.update(|w| {
            w.icon = images.first().map(RgbaImage::dimensions);
            Vec::new()
        });
    }

    fn set_cursor(&mut self, cursor: Option<&dyn CursorBackend>) {
        let id = cursor
            .and_then(|c| c.as_any().downcast_ref::<HeadlessCursor>())
            .map(HeadlessCursor::id);
        self.update(|w| {
            w.cursor = id;
            Vec::new()
        });
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.update(|w| {
            w.position = (x, y);
            vec![WindowEvent::Moved { x, y }]
        });
    }

    fn set_size(&mut self, width: i32, height: i32) {
        self.update(|w| {
            w.size = (width, height);
            vec![
                WindowEvent::Resized { width, height },
                WindowEvent::FramebufferResized { width, height },
            ]
        });
    }

    fn set_size_limits(&mut self, min_width: i32, min_height: i32, max_width: i32, max_height: i32) {
        self.update(|w| {
            w.size_limits = (min_width, min_height, max_width, max_height);
            Vec::new()
        });
    }

    fn set_aspect_ratio(&mut self, numerator: i32, denominator: i32) {
        self.update(|w| {
            w.aspect_ratio = (numerator, denominator);
            Vec::new()
        });
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.update(|w| {
            w.opacity = opacity;
            Vec::new()
        });
    }

    fn set_decorated(&mut self, decorated: bool) {
        self.update(|w| {
            w.decorated = decorated;
            Vec::new()
        });
    }

    fn set_floating(&mut self, floating: bool) {
        self.update(|w| {
            w.floating = floating;
            Vec::new()
        });
    }

    fn set_resizable(&mut self, resizable: bool) {
        self.update(|w| {
            w.resizable = resizable;
            Vec::new()
        });
    }

    fn set_mouse_passthrough(&mut self, enabled: bool) {
        self.update(|w| {
            w.mouse_passthrough = enabled;
            Vec::new()
        });
    }

    fn set_monitor(&mut self, fullscreen: Option<Rect>, windowed: Rect) {
        self.update(|w| {
            let area = fullscreen.unwrap_or(windowed);
            w.fullscreen = fullscreen;
            w.position = (area.x, area.y);
            w.size = (area.width, area.height);
            vec![WindowEvent::Resized {
                width: area.width,
                height: area.height,
            }]
        });
    }

    fn set_cursor_position(&mut self, x: f64, y: f64) {
        self.update(|w| {
            w.cursor_position = (x, y);
            Vec::new()
        });
    }

    fn set_cursor_mode(&mut self, mode: CursorMode) {
        self.update(|w| {
            w.cursor_mode = mode;
            Vec::new()
        });
    }

    fn set_raw_mouse_motion(&mut self, enabled: bool) {
        self.update(|w| {
            w.raw_mouse_motion = enabled;
            Vec::new()
        });
    }

    fn maximize(&mut self) {
        self.update(|w| {
            if w.maximized {
                return Vec::new();
            }
            w.maximized = true;
            w.minimized = false;
            vec![WindowEvent::Maximized(true)]
        });
    }

    fn minimize(&mut self) {
        self.update(|w| {
            if w.minimized {
                return Vec::new();
            }
            w.minimized = true;
            vec![WindowEvent::Minimized(true)]
        });
    }

    fn restore(&mut self) {
        self.update(|w| {
            if w.minimized {
                w.minimized = false;
                vec![WindowEvent::Minimized(false)]
            } else if w.maximized {
                w.maximized = false;
                vec![WindowEvent::Maximized(false)]
            } else {
                Vec::new()
            }
        });
    }

    fn show(&mut self) {
        self.update(|w| {
            w.visible = true;
            Vec::new()
        });
    }

    fn hide(&mut self) {
        self.update(|w| {
            w.visible = false;
            Vec::new()
        });
    }

    fn request_attention(&mut self) {
        self.update(|w| {
            w.attention_requests += 1;
            Vec::new()
        });
    }

    fn focus(&mut self) {
        let mut state = self.state.borrow_mut();
        let others: Vec<NativeHandle> = state
            .windows
            .iter_mut()
            .filter(|(handle, w)| **handle != self.handle && w.focused)
            .map(|(handle, w)| {
                w.focused = false;
                *handle
            })
            .collect();
        for other in others {
            state.push_window_event(other, WindowEvent::Focus(false));
        }

        if let Some(window) = state.windows.get_mut(&self.handle) {
            if !window.focused {
                window.focused = true;
                state.push_window_event(self.handle, WindowEvent::Focus(true));
            }
        }
    }
}
