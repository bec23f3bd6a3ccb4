//! # Windows
//!
//! A [`Window`] couples a backend window with the engine-side state that is
//! the same on every OS: cached presentation flags, size and aspect
//! constraints, per-key and per-button input state, the virtual cursor used
//! while the cursor is disabled, and the callback table.
//!
//! Backends never call user code directly. Their events are translated by the
//! platform into the `on_*` entry points below, which update state and run
//! the matching callback synchronously.
//!
//! ## Input state machine
//!
//! Keys and mouse buttons move between [`KeyState::Release`],
//! [`KeyState::Press`] and, with sticky input enabled, [`KeyState::Stick`].
//! A press on a key that is already down is reported as
//! [`KeyState::Repeat`]. A sticky release reads back once as a press.

mod backend;
pub mod callbacks;

pub use backend::WindowBackend;
pub use callbacks::CallbackKind;

use std::path::PathBuf;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::backend::{BackendError, NativeHandle, WindowRequest};
use crate::context::Context;
use crate::cursor::CursorBackend;
use crate::error::{EngineError, EngineResult};
use crate::foundation::collections::{CursorId, MonitorId, WindowId};
use crate::input::{CursorMode, InputMode, Key, KeyMods, KeyState, MouseButton, KEY_COUNT, MOUSE_BUTTON_COUNT};
use crate::monitor::{VideoMode, DONT_CARE};
use callbacks::{dispatch, WindowCallbacks};

/// Screen rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub width: i32,
    /// Height
    pub height: i32,
}

impl Rect {
    /// Build a rectangle
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }
}

/// Presentation hints for new windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Title bar and borders
    pub decorated: bool,
    /// Shown after creation
    pub visible: bool,
    /// Focused after creation
    pub focused: bool,
    /// Take focus whenever shown
    pub focus_on_show: bool,
    /// User resizable
    pub resizable: bool,
    /// Always on top
    pub floating: bool,
    /// Start maximized
    pub maximized: bool,
    /// Minimize a fullscreen window when it loses focus
    pub auto_minimize: bool,
    /// Center the cursor on fullscreen windows
    pub center_cursor: bool,
    /// Scale the content area by the monitor's content scale
    pub scale_to_monitor: bool,
    /// Mouse input passes through to windows below
    pub mouse_passthrough: bool,
    /// Refresh rate for fullscreen windows, or [`DONT_CARE`]
    pub refresh_rate: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            decorated: true,
            visible: true,
            focused: true,
            focus_on_show: true,
            resizable: true,
            floating: false,
            maximized: false,
            auto_minimize: true,
            center_cursor: true,
            scale_to_monitor: true,
            mouse_passthrough: false,
            refresh_rate: DONT_CARE,
        }
    }
}

impl WindowConfig {
    /// Set initial visibility
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set initial focus
    pub fn with_focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Set user resizability
    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    /// Set decorations
    pub fn with_decorated(mut self, decorated: bool) -> Self {
        self.decorated = decorated;
        self
    }

    /// Set always-on-top
    pub fn with_floating(mut self, floating: bool) -> Self {
        self.floating = floating;
        self
    }

    /// Set mouse passthrough
    pub fn with_mouse_passthrough(mut self, enabled: bool) -> Self {
        self.mouse_passthrough = enabled;
        self
    }

    /// Set the fullscreen refresh rate
    pub fn with_refresh_rate(mut self, refresh_rate: i32) -> Self {
        self.refresh_rate = refresh_rate;
        self
    }
}

/// Pick the image whose pixel area is closest to `width * height`
///
/// The first image wins ties. Backends use this to fill the icon sizes their
/// OS asks for.
pub fn choose_image(images: &[RgbaImage], width: u32, height: u32) -> Option<&RgbaImage> {
    let target = u64::from(width) * u64::from(height);
    let mut closest = None;
    let mut least_diff = u64::MAX;

    for image in images {
        let diff = (u64::from(image.width()) * u64::from(image.height())).abs_diff(target);
        if diff < least_diff {
            closest = Some(image);
            least_diff = diff;
        }
    }
    closest
}

fn is_valid_cursor_coordinate(value: f64) -> bool {
    value.is_finite()
}

/// A window and its optional rendering context
pub struct Window {
    id: WindowId,
    title: String,
    min_width: i32,
    min_height: i32,
    max_width: i32,
    max_height: i32,
    numerator: i32,
    denominator: i32,
    floating: bool,
    decorated: bool,
    resizable: bool,
    focus_on_show: bool,
    auto_minimize: bool,
    mouse_passthrough: bool,
    should_close: bool,

    cursor_mode: CursorMode,
    keys: [KeyState; KEY_COUNT],
    scancodes: [i32; KEY_COUNT],
    mouse_buttons: [KeyState; MOUSE_BUTTON_COUNT],
    sticky_keys: bool,
    sticky_mouse_buttons: bool,
    lock_key_mods: bool,
    raw_mouse_motion: bool,
    raw_mouse_motion_supported: bool,
    virtual_cursor: (f64, f64),

    video_mode: VideoMode,
    monitor: Option<MonitorId>,
    cursor: Option<CursorId>,
    callbacks: WindowCallbacks,

    // Dropped before the native window it renders into
    context: Option<Context>,
    backend: Box<dyn WindowBackend>,
}

impl Window {
    pub(crate) fn new(
        id: WindowId,
        request: &WindowRequest<'_>,
        monitor: Option<MonitorId>,
        backend: Box<dyn WindowBackend>,
        raw_mouse_motion_supported: bool,
    ) -> Self {
        let config = request.window;
        Self {
            id,
            title: request.title.to_string(),
            min_width: DONT_CARE,
            min_height: DONT_CARE,
            max_width: DONT_CARE,
            max_height: DONT_CARE,
            numerator: DONT_CARE,
            denominator: DONT_CARE,
            floating: config.floating,
            decorated: config.decorated,
            resizable: config.resizable,
            focus_on_show: config.focus_on_show,
            auto_minimize: config.auto_minimize,
            mouse_passthrough: config.mouse_passthrough,
            should_close: false,
            cursor_mode: CursorMode::Normal,
            keys: [KeyState::Release; KEY_COUNT],
            scancodes: [-1; KEY_COUNT],
            mouse_buttons: [KeyState::Release; MOUSE_BUTTON_COUNT],
            sticky_keys: false,
            sticky_mouse_buttons: false,
            lock_key_mods: false,
            raw_mouse_motion: false,
            raw_mouse_motion_supported,
            virtual_cursor: (0.0, 0.0),
            video_mode: VideoMode::new(
                request.width,
                request.height,
                request.framebuffer.red_bits,
                request.framebuffer.green_bits,
                request.framebuffer.blue_bits,
                config.refresh_rate,
            ),
            monitor,
            cursor: None,
            callbacks: WindowCallbacks::default(),
            context: None,
            backend,
        }
    }

    /// Registry id
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Backend handle events are routed by
    pub fn native_handle(&self) -> NativeHandle {
        self.backend.native_handle()
    }

    /// Backend half
    pub fn backend(&self) -> &dyn WindowBackend {
        self.backend.as_ref()
    }

    pub(crate) fn backend_mut(&mut self) -> &mut dyn WindowBackend {
        self.backend.as_mut()
    }

    // ---------------------------------------------------------------- state

    /// Maximized
    pub fn is_maximized(&self) -> bool {
        self.backend.is_maximized()
    }

    /// Minimized
    pub fn is_minimized(&self) -> bool {
        self.backend.is_minimized()
    }

    /// Visible
    pub fn is_visible(&self) -> bool {
        self.backend.is_visible()
    }

    /// Has input focus
    pub fn is_focused(&self) -> bool {
        self.backend.is_focused()
    }

    /// Cursor is over the content area
    pub fn is_hovered(&self) -> bool {
        self.backend.is_hovered()
    }

    /// Framebuffer alpha is composited with the desktop
    pub fn is_framebuffer_transparent(&self) -> bool {
        self.backend.is_framebuffer_transparent()
    }

    /// Always on top
    pub fn is_floating(&self) -> bool {
        self.floating
    }

    /// Has decorations
    pub fn is_decorated(&self) -> bool {
        self.decorated
    }

    /// User resizable
    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    /// Takes focus when shown
    pub fn is_focus_on_show(&self) -> bool {
        self.focus_on_show
    }

    /// Minimizes on focus loss while fullscreen
    pub fn is_auto_minimize(&self) -> bool {
        self.auto_minimize
    }

    /// Mouse input passes through
    pub fn is_mouse_passthrough(&self) -> bool {
        self.mouse_passthrough
    }

    /// Close flag, set by the user or by a close request
    pub fn should_close(&self) -> bool {
        self.should_close
    }

    /// Set the close flag
    pub fn set_should_close(&mut self, value: bool) {
        self.should_close = value;
    }

    // ------------------------------------------------------------- geometry

    /// Title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Change the title
    pub fn set_title(&mut self, title: &str) -> EngineResult<()> {
        if title.is_empty() {
            return Err(EngineError::InvalidValue("Window title cannot be empty".to_string()).logged());
        }
        title.clone_into(&mut self.title);
        self.backend.set_title(title);
        Ok(())
    }

    /// Change the icon; the backend picks the closest image per icon size
    pub fn set_icon(&mut self, images: &[RgbaImage]) -> EngineResult<()> {
        if images.is_empty() {
            return Err(EngineError::InvalidValue("Icon image list cannot be empty".to_string()).logged());
        }
        self.backend.set_icon(images);
        Ok(())
    }

    /// Content area position
    pub fn position(&self) -> (i32, i32) {
        self.backend.position()
    }

    /// Move the content area; ignored while fullscreen
    pub fn set_position(&mut self, x: i32, y: i32) {
        if self.monitor.is_some() {
            return;
        }
        self.backend.set_position(x, y);
    }

    /// Content area size
    pub fn size(&self) -> (i32, i32) {
        self.backend.size()
    }

    /// Resize the content area
    ///
    /// Fullscreen windows should be resized through
    /// [`crate::Platform::set_window_size`], which also switches the
    /// monitor's video mode.
    pub fn set_size(&mut self, width: i32, height: i32) -> EngineResult<()> {
        if width <= 0 || height <= 0 {
            return Err(EngineError::InvalidValue(format!("Invalid window size {width}x{height}")).logged());
        }
        self.video_mode.width = width;
        self.video_mode.height = height;
        self.backend.set_size(width, height);
        Ok(())
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> (i32, i32) {
        self.backend.framebuffer_size()
    }

    /// Decoration extents `(left, top, right, bottom)`
    pub fn frame_size(&self) -> (i32, i32, i32, i32) {
        self.backend.frame_size()
    }

    /// Content scale
    pub fn content_scale(&self) -> (f32, f32) {
        self.backend.content_scale()
    }

    /// Current size limits `(min_width, min_height, max_width, max_height)`
    pub fn size_limits(&self) -> (i32, i32, i32, i32) {
        (self.min_width, self.min_height, self.max_width, self.max_height)
    }

    /// Constrain the content area size; [`DONT_CARE`] leaves a bound open
    ///
    /// Limits are always recorded but only applied while windowed and
    /// resizable.
    pub fn set_size_limits(&mut self, min_width: i32, min_height: i32, max_width: i32, max_height: i32) -> EngineResult<()> {
        if min_width != DONT_CARE && min_height != DONT_CARE && (min_width < 0 || min_height < 0) {
            return Err(
                EngineError::InvalidValue(format!("Invalid window minimum size {min_width}x{min_height}")).logged()
            );
        }

        if max_width != DONT_CARE
            && max_height != DONT_CARE
            && (max_width < 0 || max_height < 0 || max_width < min_width || max_height < min_height)
        {
            return Err(
                EngineError::InvalidValue(format!("Invalid window maximum size {max_width}x{max_height}")).logged()
            );
        }

        self.min_width = min_width;
        self.min_height = min_height;
        self.max_width = max_width;
        self.max_height = max_height;

        if self.monitor.is_none() && self.resizable {
            self.backend.set_size_limits(min_width, min_height, max_width, max_height);
        }
        Ok(())
    }

    /// Current aspect ratio constraint
    pub fn aspect_ratio(&self) -> (i32, i32) {
        (self.numerator, self.denominator)
    }

    /// Constrain the aspect ratio; [`DONT_CARE`] for both removes it
    pub fn set_aspect_ratio(&mut self, numerator: i32, denominator: i32) -> EngineResult<()> {
        if numerator != DONT_CARE && denominator != DONT_CARE && (numerator <= 0 || denominator <= 0) {
            return Err(
                EngineError::InvalidValue(format!("Invalid window aspect ratio {numerator}:{denominator}")).logged()
            );
        }

        self.numerator = numerator;
        self.denominator = denominator;

        if self.monitor.is_none() && self.resizable {
            self.backend.set_aspect_ratio(numerator, denominator);
        }
        Ok(())
    }

    /// Whole-window opacity
    pub fn opacity(&self) -> f32 {
        self.backend.opacity()
    }

    /// Set whole-window opacity in `0.0..=1.0`
    pub fn set_opacity(&mut self, opacity: f32) -> EngineResult<()> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(EngineError::InvalidValue(format!("Invalid window opacity {opacity}")).logged());
        }
        self.backend.set_opacity(opacity);
        Ok(())
    }

    /// Toggle always-on-top
    pub fn set_floating(&mut self, value: bool) {
        self.floating = value;
        if self.monitor.is_none() {
            self.backend.set_floating(value);
        }
    }

    /// Toggle decorations
    pub fn set_decorated(&mut self, value: bool) {
        self.decorated = value;
        if self.monitor.is_none() {
            self.backend.set_decorated(value);
        }
    }

    /// Toggle user resizing
    pub fn set_resizable(&mut self, value: bool) {
        self.resizable = value;
        if self.monitor.is_none() {
            self.backend.set_resizable(value);
        }
    }

    /// Take focus when shown
    pub fn set_focus_on_show(&mut self, value: bool) {
        self.focus_on_show = value;
    }

    /// Minimize on focus loss while fullscreen
    pub fn set_auto_minimize(&mut self, value: bool) {
        self.auto_minimize = value;
    }

    /// Let mouse input pass through
    pub fn set_mouse_passthrough(&mut self, value: bool) {
        self.mouse_passthrough = value;
        self.backend.set_mouse_passthrough(value);
    }

    /// Maximize; ignored while fullscreen
    pub fn maximize(&mut self) {
        if self.monitor.is_none() {
            self.backend.maximize();
        }
    }

    /// Minimize
    pub fn minimize(&mut self) {
        self.backend.minimize();
    }

    /// Restore from minimized or maximized
    pub fn restore(&mut self) {
        self.backend.restore();
    }

    /// Show, and focus if focus-on-show is set; ignored while fullscreen
    pub fn show(&mut self) {
        if self.monitor.is_some() {
            return;
        }
        self.backend.show();
        if self.focus_on_show {
            self.backend.focus();
        }
    }

    /// Hide; ignored while fullscreen
    pub fn hide(&mut self) {
        if self.monitor.is_none() {
            self.backend.hide();
        }
    }

    /// Raise and focus
    pub fn focus(&mut self) {
        self.backend.focus();
    }

    /// Ask for the user's attention
    pub fn request_attention(&mut self) {
        self.backend.request_attention();
    }

    /// Warp the OS cursor to the middle of the content area
    pub fn center_cursor(&mut self) {
        let (width, height) = self.backend.size();
        self.backend
            .set_cursor_position(f64::from(width) / 2.0, f64::from(height) / 2.0);
    }

    /// Monitor this window is fullscreen on
    pub fn monitor(&self) -> Option<MonitorId> {
        self.monitor
    }

    pub(crate) fn set_monitor_field(&mut self, monitor: Option<MonitorId>) {
        self.monitor = monitor;
    }

    /// Video mode wanted while fullscreen
    pub fn video_mode(&self) -> VideoMode {
        self.video_mode
    }

    pub(crate) fn set_video_mode_request(&mut self, width: i32, height: i32, refresh_rate: i32) {
        self.video_mode.width = width;
        self.video_mode.height = height;
        self.video_mode.refresh_rate = refresh_rate;
    }

    /// Cursor shown over the content area, `None` for the default arrow
    pub fn cursor(&self) -> Option<CursorId> {
        self.cursor
    }

    pub(crate) fn set_cursor(&mut self, id: Option<CursorId>, cursor: Option<&dyn CursorBackend>) {
        self.cursor = id;
        self.backend.set_cursor(cursor);
    }

    // -------------------------------------------------------------- context

    /// Rendering context, if the window was created with a client API
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub(crate) fn context_mut(&mut self) -> Option<&mut Context> {
        self.context.as_mut()
    }

    pub(crate) fn set_context(&mut self, context: Context) {
        self.context = Some(context);
    }

    /// Present the back buffer
    pub fn swap_buffers(&mut self) -> EngineResult<()> {
        match &mut self.context {
            Some(context) => context.swap_buffers(),
            None => Err(EngineError::NoWindowContext.logged()),
        }
    }

    // ---------------------------------------------------------------- input

    /// Current cursor mode
    pub fn cursor_mode(&self) -> CursorMode {
        self.cursor_mode
    }

    /// Sticky keys enabled
    pub fn sticky_keys(&self) -> bool {
        self.sticky_keys
    }

    /// Sticky mouse buttons enabled
    pub fn sticky_mouse_buttons(&self) -> bool {
        self.sticky_mouse_buttons
    }

    /// Lock key modifiers are reported
    pub fn lock_key_mods(&self) -> bool {
        self.lock_key_mods
    }

    /// Raw mouse motion enabled
    pub fn raw_mouse_motion(&self) -> bool {
        self.raw_mouse_motion
    }

    /// Change an input mode
    pub fn set_input_mode(&mut self, mode: InputMode) -> EngineResult<()> {
        match mode {
            InputMode::Cursor(cursor_mode) => {
                if self.cursor_mode == cursor_mode {
                    return Ok(());
                }
                self.cursor_mode = cursor_mode;
                self.virtual_cursor = self.backend.cursor_position();
                self.backend.set_cursor_mode(cursor_mode);
            }
            InputMode::StickyKeys(enabled) => {
                if self.sticky_keys == enabled {
                    return Ok(());
                }
                if !enabled {
                    release_sticky(&mut self.keys);
                }
                self.sticky_keys = enabled;
            }
            InputMode::StickyMouseButtons(enabled) => {
                if self.sticky_mouse_buttons == enabled {
                    return Ok(());
                }
                if !enabled {
                    release_sticky(&mut self.mouse_buttons);
                }
                self.sticky_mouse_buttons = enabled;
            }
            InputMode::LockKeyMods(enabled) => self.lock_key_mods = enabled,
            InputMode::RawMouseMotion(enabled) => {
                if !self.raw_mouse_motion_supported {
                    return Err(EngineError::PlatformError(BackendError::Unsupported(
                        "Raw mouse motion is not supported on this system".to_string(),
                    ))
                    .logged());
                }
                if self.raw_mouse_motion == enabled {
                    return Ok(());
                }
                self.raw_mouse_motion = enabled;
                self.backend.set_raw_mouse_motion(enabled);
            }
        }
        Ok(())
    }

    /// Last reported state of `key`; a sticky release reads as one press
    pub fn key(&mut self, key: Key) -> KeyState {
        let Some(index) = key.index() else {
            log::error!("Invalid key {key:?}");
            return KeyState::Release;
        };
        read_sticky(&mut self.keys[index])
    }

    /// Last reported state of `button`; a sticky release reads as one press
    pub fn mouse_button(&mut self, button: MouseButton) -> KeyState {
        read_sticky(&mut self.mouse_buttons[button.index()])
    }

    /// Cursor position relative to the content area
    ///
    /// While the cursor is disabled this is the unbounded virtual position.
    pub fn cursor_position(&self) -> (f64, f64) {
        if self.cursor_mode == CursorMode::Disabled {
            self.virtual_cursor
        } else {
            self.backend.cursor_position()
        }
    }

    /// Move the cursor; ignored unless the window is focused
    pub fn set_cursor_position(&mut self, x: f64, y: f64) -> EngineResult<()> {
        if !is_valid_cursor_coordinate(x) || !is_valid_cursor_coordinate(y) {
            return Err(EngineError::InvalidValue(format!("Invalid cursor position {x} {y}")).logged());
        }

        if !self.backend.is_focused() {
            return Ok(());
        }

        if self.cursor_mode == CursorMode::Disabled {
            self.virtual_cursor = (x, y);
        } else {
            self.backend.set_cursor_position(x, y);
        }
        Ok(())
    }

    // ------------------------------------------------------------ callbacks

    /// Call `callback` when the window moves
    pub fn set_position_callback(&mut self, callback: impl FnMut(&mut Self, i32, i32) + 'static) {
        self.callbacks.position = Some(Box::new(callback));
    }

    /// Call `callback` when the content area is resized
    pub fn set_size_callback(&mut self, callback: impl FnMut(&mut Self, i32, i32) + 'static) {
        self.callbacks.size = Some(Box::new(callback));
    }

    /// Call `callback` when the user asks to close the window
    pub fn set_close_callback(&mut self, callback: impl FnMut(&mut Self) + 'static) {
        self.callbacks.close = Some(Box::new(callback));
    }

    /// Call `callback` when the content needs redrawing
    pub fn set_refresh_callback(&mut self, callback: impl FnMut(&mut Self) + 'static) {
        self.callbacks.refresh = Some(Box::new(callback));
    }

    /// Call `callback` when focus changes
    pub fn set_focus_callback(&mut self, callback: impl FnMut(&mut Self, bool) + 'static) {
        self.callbacks.focus = Some(Box::new(callback));
    }

    /// Call `callback` when the window is minimized or restored
    pub fn set_minimize_callback(&mut self, callback: impl FnMut(&mut Self, bool) + 'static) {
        self.callbacks.minimize = Some(Box::new(callback));
    }

    /// Call `callback` when the window is maximized or restored
    pub fn set_maximize_callback(&mut self, callback: impl FnMut(&mut Self, bool) + 'static) {
        self.callbacks.maximize = Some(Box::new(callback));
    }

    /// Call `callback` when the framebuffer is resized
    pub fn set_framebuffer_size_callback(&mut self, callback: impl FnMut(&mut Self, i32, i32) + 'static) {
        self.callbacks.framebuffer_size = Some(Box::new(callback));
    }

    /// Call `callback` when the content scale changes
    pub fn set_content_scale_callback(&mut self, callback: impl FnMut(&mut Self, f32, f32) + 'static) {
        self.callbacks.content_scale = Some(Box::new(callback));
    }

    /// Call `callback` on mouse button input
    pub fn set_mouse_button_callback(
        &mut self,
        callback: impl FnMut(&mut Self, MouseButton, KeyState, KeyMods) + 'static,
    ) {
        self.callbacks.mouse_button = Some(Box::new(callback));
    }

    /// Call `callback` when the cursor moves
    pub fn set_cursor_position_callback(&mut self, callback: impl FnMut(&mut Self, f64, f64) + 'static) {
        self.callbacks.cursor_position = Some(Box::new(callback));
    }

    /// Call `callback` when the cursor enters or leaves the content area
    pub fn set_cursor_enter_callback(&mut self, callback: impl FnMut(&mut Self, bool) + 'static) {
        self.callbacks.cursor_enter = Some(Box::new(callback));
    }

    /// Call `callback` on scroll input
    pub fn set_scroll_callback(&mut self, callback: impl FnMut(&mut Self, f64, f64) + 'static) {
        self.callbacks.scroll = Some(Box::new(callback));
    }

    /// Call `callback` on key input
    pub fn set_key_callback(&mut self, callback: impl FnMut(&mut Self, Key, i32, KeyState, KeyMods) + 'static) {
        self.callbacks.key = Some(Box::new(callback));
    }

    /// Call `callback` on character input
    pub fn set_char_callback(&mut self, callback: impl FnMut(&mut Self, u32) + 'static) {
        self.callbacks.character = Some(Box::new(callback));
    }

    /// Call `callback` on character input, with modifiers
    pub fn set_char_mods_callback(&mut self, callback: impl FnMut(&mut Self, u32, KeyMods) + 'static) {
        self.callbacks.character_mods = Some(Box::new(callback));
    }

    /// Call `callback` when paths are dropped on the window
    pub fn set_drop_callback(&mut self, callback: impl FnMut(&mut Self, &[PathBuf]) + 'static) {
        self.callbacks.drop = Some(Box::new(callback));
    }

    /// Empty one callback slot
    pub fn remove_callback(&mut self, kind: CallbackKind) {
        self.callbacks.remove(kind);
    }

    /// Whether a callback slot is filled
    pub fn has_callback(&self, kind: CallbackKind) -> bool {
        self.callbacks.is_set(kind)
    }

    /// Empty every callback slot
    pub fn clear_callbacks(&mut self) {
        self.callbacks = WindowCallbacks::default();
    }

    // ---------------------------------------------------------- event input

    /// The window moved
    pub fn on_position(&mut self, x: i32, y: i32) {
        dispatch!(self, position, x, y);
    }

    /// The content area was resized
    pub fn on_size(&mut self, width: i32, height: i32) {
        dispatch!(self, size, width, height);
    }

    /// The user asked to close the window
    pub fn on_close(&mut self) {
        self.should_close = true;
        dispatch!(self, close);
    }

    /// The content needs redrawing
    pub fn on_refresh(&mut self) {
        dispatch!(self, refresh);
    }

    /// Focus changed
    ///
    /// Losing focus releases every key and button still held, through the
    /// regular key and button paths so callbacks see the releases.
    pub fn on_focus(&mut self, focused: bool) {
        dispatch!(self, focus, focused);

        if !focused {
            for index in 0..KEY_COUNT {
                if self.keys[index] != KeyState::Press {
                    continue;
                }
                let Some(key) = i32::try_from(index).ok().and_then(Key::from_code) else {
                    continue;
                };
                let scancode = self.scancodes[index];
                self.on_key(key, scancode, KeyState::Release, KeyMods::empty());
            }

            for button in MouseButton::ALL {
                if self.mouse_buttons[button.index()] == KeyState::Press {
                    self.on_mouse_button(button, KeyState::Release, KeyMods::empty());
                }
            }
        }
    }

    /// Minimized or restored
    pub fn on_minimize(&mut self, minimized: bool) {
        dispatch!(self, minimize, minimized);
    }

    /// Maximized or restored
    pub fn on_maximize(&mut self, maximized: bool) {
        dispatch!(self, maximize, maximized);
    }

    /// Framebuffer resized
    pub fn on_framebuffer_size(&mut self, width: i32, height: i32) {
        dispatch!(self, framebuffer_size, width, height);
    }

    /// Content scale changed
    pub fn on_content_scale(&mut self, x: f32, y: f32) {
        dispatch!(self, content_scale, x, y);
    }

    /// Mouse button input
    pub fn on_mouse_button(&mut self, button: MouseButton, action: KeyState, mods: KeyMods) {
        let mods = mods.masked(self.lock_key_mods);

        self.mouse_buttons[button.index()] = if action == KeyState::Release && self.sticky_mouse_buttons {
            KeyState::Stick
        } else {
            action
        };

        dispatch!(self, mouse_button, button, action, mods);
    }

    /// Cursor moved; repeated positions are dropped
    #[allow(clippy::float_cmp)]
    pub fn on_cursor_position(&mut self, x: f64, y: f64) {
        if self.virtual_cursor == (x, y) {
            return;
        }
        self.virtual_cursor = (x, y);
        dispatch!(self, cursor_position, x, y);
    }

    /// Relative motion while the cursor is disabled
    pub fn on_cursor_delta(&mut self, dx: f64, dy: f64) {
        let (x, y) = self.virtual_cursor;
        self.on_cursor_position(x + dx, y + dy);
    }

    /// Cursor entered or left the content area
    pub fn on_cursor_enter(&mut self, entered: bool) {
        dispatch!(self, cursor_enter, entered);
    }

    /// Scroll input
    pub fn on_scroll(&mut self, x: f64, y: f64) {
        dispatch!(self, scroll, x, y);
    }

    /// Key input
    pub fn on_key(&mut self, key: Key, scancode: i32, action: KeyState, mods: KeyMods) {
        let mut action = action;

        if let Some(index) = key.index() {
            let previous = self.keys[index];
            if action == KeyState::Release && previous == KeyState::Release {
                return;
            }

            let repeated = action == KeyState::Press && previous == KeyState::Press;

            self.keys[index] = if action == KeyState::Release && self.sticky_keys {
                KeyState::Stick
            } else {
                action
            };
            self.scancodes[index] = scancode;

            if repeated {
                action = KeyState::Repeat;
            }
        }

        let mods = mods.masked(self.lock_key_mods);
        dispatch!(self, key, key, scancode, action, mods);
    }

    /// Character input
    ///
    /// Control characters are dropped. The plain character callback only
    /// runs when `plain` is set, i.e. no modifier other than shift was held.
    pub fn on_char(&mut self, codepoint: u32, mods: KeyMods, plain: bool) {
        if codepoint < 32 || (127..160).contains(&codepoint) {
            return;
        }

        let mods = mods.masked(self.lock_key_mods);
        dispatch!(self, character_mods, codepoint, mods);

        if plain {
            dispatch!(self, character, codepoint);
        }
    }

    /// Paths dropped on the window
    pub fn on_drop(&mut self, paths: &[PathBuf]) {
        dispatch!(self, drop, paths);
    }
}

fn read_sticky(state: &mut KeyState) -> KeyState {
    if *state == KeyState::Stick {
        *state = KeyState::Release;
        KeyState::Press
    } else {
        *state
    }
}

fn release_sticky(states: &mut [KeyState]) {
    for state in states.iter_mut().filter(|s| **s == KeyState::Stick) {
        *state = KeyState::Release;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::{HeadlessBackend, HeadlessHandle};
    use crate::backend::PlatformBackend;
    use crate::context::{ContextApi, ContextConfig, FramebufferConfig};
    use slotmap::SlotMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn test_window() -> (Window, HeadlessHandle) {
        let mut backend = HeadlessBackend::new();
        let handle = backend.handle();
        let window_config = WindowConfig::default();
        let framebuffer = FramebufferConfig::default();
        let context = ContextConfig::default().with_version(ContextApi::None, 1, 0);
        let request = WindowRequest {
            title: "Test",
            width: 640,
            height: 480,
            window: &window_config,
            framebuffer: &framebuffer,
            context: &context,
            fullscreen: None,
        };
        let native = backend.create_window(&request).unwrap();
        let mut ids: SlotMap<WindowId, ()> = SlotMap::with_key();
        let window = Window::new(ids.insert(()), &request, None, native, true);
        (window, handle)
    }

    fn record_keys(window: &mut Window) -> Rc<RefCell<Vec<(Key, KeyState)>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        window.set_key_callback(move |_, key, _, action, _| sink.borrow_mut().push((key, action)));
        events
    }

    #[test]
    fn test_release_of_released_key_is_ignored() {
        let (mut window, _handle) = test_window();
        let events = record_keys(&mut window);

        window.on_key(Key::A, 30, KeyState::Release, KeyMods::empty());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_press_on_pressed_key_is_repeat() {
        let (mut window, _handle) = test_window();
        let events = record_keys(&mut window);

        window.on_key(Key::A, 30, KeyState::Press, KeyMods::empty());
        window.on_key(Key::A, 30, KeyState::Press, KeyMods::empty());
        window.on_key(Key::A, 30, KeyState::Release, KeyMods::empty());

        assert_eq!(
            *events.borrow(),
            vec![(Key::A, KeyState::Press), (Key::A, KeyState::Repeat), (Key::A, KeyState::Release)]
        );
        assert_eq!(window.key(Key::A), KeyState::Release);
    }

    #[test]
    fn test_sticky_key_reads_once() {
        let (mut window, _handle) = test_window();
        window.set_input_mode(InputMode::StickyKeys(true)).unwrap();

        window.on_key(Key::Space, 57, KeyState::Press, KeyMods::empty());
        window.on_key(Key::Space, 57, KeyState::Release, KeyMods::empty());

        assert_eq!(window.key(Key::Space), KeyState::Press);
        assert_eq!(window.key(Key::Space), KeyState::Release);
    }

    #[test]
    fn test_disabling_sticky_releases_stuck_entries() {
        let (mut window, _handle) = test_window();
        window.set_input_mode(InputMode::StickyKeys(true)).unwrap();
        window.set_input_mode(InputMode::StickyMouseButtons(true)).unwrap();

        window.on_key(Key::W, 17, KeyState::Press, KeyMods::empty());
        window.on_key(Key::W, 17, KeyState::Release, KeyMods::empty());
        window.on_mouse_button(MouseButton::Left, KeyState::Press, KeyMods::empty());
        window.on_mouse_button(MouseButton::Left, KeyState::Release, KeyMods::empty());

        window.set_input_mode(InputMode::StickyKeys(false)).unwrap();
        window.set_input_mode(InputMode::StickyMouseButtons(false)).unwrap();

        assert_eq!(window.key(Key::W), KeyState::Release);
        assert_eq!(window.mouse_button(MouseButton::Left), KeyState::Release);
    }

    #[test]
    fn test_focus_loss_releases_held_input() {
        let (mut window, _handle) = test_window();
        let events = record_keys(&mut window);
        let buttons = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&buttons);
        window.set_mouse_button_callback(move |_, button, action, _| sink.borrow_mut().push((button, action)));

        window.on_key(Key::LeftShift, 42, KeyState::Press, KeyMods::SHIFT);
        window.on_key(Key::D, 32, KeyState::Press, KeyMods::SHIFT);
        window.on_mouse_button(MouseButton::Right, KeyState::Press, KeyMods::empty());
        window.on_focus(false);

        let released: Vec<_> = events.borrow().iter().filter(|(_, a)| *a == KeyState::Release).copied().collect();
        assert_eq!(released, vec![(Key::D, KeyState::Release), (Key::LeftShift, KeyState::Release)]);
        assert_eq!(buttons.borrow().last(), Some(&(MouseButton::Right, KeyState::Release)));
        assert_eq!(window.key(Key::D), KeyState::Release);
    }

    #[test]
    fn test_focus_loss_reuses_last_scancode() {
        let (mut window, _handle) = test_window();
        let scancodes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&scancodes);
        window.set_key_callback(move |_, _, scancode, action, _| sink.borrow_mut().push((scancode, action)));

        window.on_key(Key::Q, 16, KeyState::Press, KeyMods::empty());
        window.on_focus(false);
        assert_eq!(*scancodes.borrow(), vec![(16, KeyState::Press), (16, KeyState::Release)]);
    }

    #[test]
    fn test_lock_mods_are_stripped() {
        let (mut window, _handle) = test_window();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        window.set_key_callback(move |_, _, _, _, mods| sink.borrow_mut().push(mods));

        let mods = KeyMods::SHIFT | KeyMods::CAPS_LOCK | KeyMods::NUM_LOCK;
        window.on_key(Key::A, 30, KeyState::Press, mods);
        window.set_input_mode(InputMode::LockKeyMods(true)).unwrap();
        window.on_key(Key::B, 48, KeyState::Press, mods);

        assert_eq!(*seen.borrow(), vec![KeyMods::SHIFT, mods]);
    }

    #[test]
    fn test_char_filtering() {
        let (mut window, _handle) = test_window();
        let plain = Rc::new(RefCell::new(Vec::new()));
        let with_mods = Rc::new(RefCell::new(Vec::new()));
        let plain_sink = Rc::clone(&plain);
        let mods_sink = Rc::clone(&with_mods);
        window.set_char_callback(move |_, c| plain_sink.borrow_mut().push(c));
        window.set_char_mods_callback(move |_, c, _| mods_sink.borrow_mut().push(c));

        window.on_char(0x0A, KeyMods::empty(), true);
        window.on_char(0x7F, KeyMods::empty(), true);
        window.on_char(0x9F, KeyMods::empty(), true);
        window.on_char(u32::from('a'), KeyMods::empty(), true);
        window.on_char(u32::from('b'), KeyMods::CONTROL, false);
        window.on_char(0xA0, KeyMods::empty(), true);

        assert_eq!(*plain.borrow(), vec![u32::from('a'), 0xA0]);
        assert_eq!(*with_mods.borrow(), vec![u32::from('a'), u32::from('b'), 0xA0]);
    }

    #[test]
    fn test_disabled_cursor_is_virtual() {
        let (mut window, handle) = test_window();
        window.focus();
        handle.set_cursor_position(window.native_handle(), 10.0, 20.0);

        window.set_input_mode(InputMode::Cursor(CursorMode::Disabled)).unwrap();
        assert_eq!(window.cursor_position(), (10.0, 20.0));

        window.set_cursor_position(500.0, -300.0).unwrap();
        assert_eq!(window.cursor_position(), (500.0, -300.0));
        assert_eq!(handle.window_state(window.native_handle()).unwrap().cursor_position, (10.0, 20.0));

        window.on_cursor_delta(5.0, 5.0);
        assert_eq!(window.cursor_position(), (505.0, -295.0));
    }

    #[test]
    fn test_cursor_position_rules() {
        let (mut window, handle) = test_window();
        assert!(window.set_cursor_position(f64::NAN, 0.0).is_err());
        assert!(window.set_cursor_position(0.0, f64::INFINITY).is_err());

        window.set_cursor_position(3.0, 4.0).unwrap();
        assert_eq!(handle.window_state(window.native_handle()).unwrap().cursor_position, (0.0, 0.0));

        window.focus();
        window.set_cursor_position(3.0, 4.0).unwrap();
        assert_eq!(window.cursor_position(), (3.0, 4.0));
    }

    #[test]
    fn test_repeated_cursor_position_is_dropped() {
        let (mut window, _handle) = test_window();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        window.set_cursor_position_callback(move |_, _, _| *sink.borrow_mut() += 1);

        window.on_cursor_position(1.0, 1.0);
        window.on_cursor_position(1.0, 1.0);
        window.on_cursor_position(2.0, 1.0);
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_raw_motion_requires_support() {
        let (mut window, _handle) = test_window();
        window.raw_mouse_motion_supported = false;
        assert!(window.set_input_mode(InputMode::RawMouseMotion(true)).is_err());
        assert!(!window.raw_mouse_motion());

        window.raw_mouse_motion_supported = true;
        window.set_input_mode(InputMode::RawMouseMotion(true)).unwrap();
        assert!(window.raw_mouse_motion());
    }

    #[test]
    fn test_size_limits_validation_and_gating() {
        let (mut window, handle) = test_window();
        assert!(window.set_size_limits(-5, -5, 100, 100).is_err());
        assert!(window.set_size_limits(200, 200, 100, 100).is_err());

        window.set_size_limits(100, 100, 800, 600).unwrap();
        assert_eq!(handle.window_state(window.native_handle()).unwrap().size_limits, (100, 100, 800, 600));

        window.set_resizable(false);
        window.set_size_limits(DONT_CARE, DONT_CARE, DONT_CARE, DONT_CARE).unwrap();
        assert_eq!(window.size_limits(), (-1, -1, -1, -1));
        assert_eq!(handle.window_state(window.native_handle()).unwrap().size_limits, (100, 100, 800, 600));
    }

    #[test]
    fn test_aspect_ratio_validation() {
        let (mut window, handle) = test_window();
        assert!(window.set_aspect_ratio(0, 9).is_err());
        window.set_aspect_ratio(16, 9).unwrap();
        assert_eq!(window.aspect_ratio(), (16, 9));
        assert_eq!(handle.window_state(window.native_handle()).unwrap().aspect_ratio, (16, 9));
        window.set_aspect_ratio(DONT_CARE, DONT_CARE).unwrap();
    }

    #[test]
    fn test_opacity_range() {
        let (mut window, _handle) = test_window();
        assert!(window.set_opacity(1.5).is_err());
        assert!(window.set_opacity(-0.1).is_err());
        assert!(window.set_opacity(f32::NAN).is_err());
        window.set_opacity(0.5).unwrap();
        approx::assert_relative_eq!(window.opacity(), 0.5);
    }

    #[test]
    fn test_title_and_icon_validation() {
        let (mut window, handle) = test_window();
        assert!(window.set_title("").is_err());
        window.set_title("Renamed").unwrap();
        assert_eq!(window.title(), "Renamed");
        assert_eq!(handle.window_state(window.native_handle()).unwrap().title, "Renamed");
        assert!(window.set_icon(&[]).is_err());
    }

    #[test]
    fn test_close_sets_flag_and_dispatches() {
        let (mut window, _handle) = test_window();
        let closed = Rc::new(RefCell::new(false));
        let sink = Rc::clone(&closed);
        window.set_close_callback(move |w| {
            *sink.borrow_mut() = true;
            w.set_should_close(false);
        });

        window.on_close();
        assert!(*closed.borrow());
        assert!(!window.should_close());
    }

    #[test]
    fn test_callback_can_replace_itself() {
        let (mut window, _handle) = test_window();
        let hits = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&hits);
        window.set_scroll_callback(move |w, _, _| {
            first.borrow_mut().push("first");
            let second = Rc::clone(&first);
            w.set_scroll_callback(move |_, _, _| second.borrow_mut().push("second"));
        });

        window.on_scroll(0.0, 1.0);
        window.on_scroll(0.0, 1.0);
        assert_eq!(*hits.borrow(), vec!["first", "second"]);

        window.remove_callback(CallbackKind::Scroll);
        assert!(!window.has_callback(CallbackKind::Scroll));
    }

    #[test]
    fn test_choose_image_by_area() {
        let images = vec![RgbaImage::new(16, 16), RgbaImage::new(32, 32), RgbaImage::new(48, 48)];
        assert_eq!(choose_image(&images, 30, 30).map(RgbaImage::width), Some(32));
        assert_eq!(choose_image(&images, 1, 1).map(RgbaImage::width), Some(16));
        assert_eq!(choose_image(&images, 256, 256).map(RgbaImage::width), Some(48));
        assert!(choose_image(&[], 32, 32).is_none());
    }

    #[test]
    fn test_show_focuses_when_configured() {
        let (mut window, handle) = test_window();
        window.set_focus_on_show(false);
        window.show();
        assert!(window.is_visible());
        assert!(!window.is_focused());

        window.hide();
        window.set_focus_on_show(true);
        window.show();
        assert!(window.is_focused());
        assert!(handle.window_state(window.native_handle()).unwrap().visible);
    }
}
