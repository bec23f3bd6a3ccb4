//! # Platform
//!
//! The [`Platform`] owns the backend and every engine object built on it:
//! windows, monitors and cursors live in handle registries, the creation hints
//! and the clock live here, and so does the lazily loaded EGL library.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use window_engine::backend::headless::HeadlessBackend;
//! use window_engine::Platform;
//!
//! let mut platform = Platform::init(Box::new(HeadlessBackend::new()))?;
//! let window = platform.open_window("Hello", 640, 480, None)?;
//! while !platform.window(window).is_some_and(|w| w.should_close()) {
//!     platform.poll_events();
//!     # break;
//! }
//! # Ok::<(), window_engine::EngineError>(())
//! ```

pub mod hints;

pub use hints::Hints;

use std::rc::Rc;

use image::RgbaImage;

use crate::backend::{BackendEvent, NativeHandle, PlatformBackend, ProcAddress, WindowEvent, WindowRequest};
use crate::context::egl::EglLibrary;
use crate::context::{
    choose_framebuffer_config, Context, ContextApi, ContextBackend, ContextConfig, ContextSlot, ContextType,
    FramebufferConfig,
};
use crate::cursor::{Cursor, CursorSource};
use crate::error::{EngineError, EngineResult};
use crate::foundation::collections::{CursorId, MonitorId, Registry, WindowId};
use crate::foundation::time::Clock;
use crate::input::{CursorShape, Joystick, Joysticks, Key};
use crate::monitor::{Monitor, VideoMode, DONT_CARE};
use crate::window::{Rect, Window, WindowConfig};

/// Called with a monitor right after it appears or right before it is removed
pub type MonitorCallback = Box<dyn FnMut(MonitorId, &Monitor)>;
/// Called with the slot index of a joystick that appeared or went away
pub type JoystickCallback = Box<dyn FnMut(usize)>;

#[derive(Default)]
struct PlatformCallbacks {
    monitor_connected: Option<MonitorCallback>,
    monitor_disconnected: Option<MonitorCallback>,
    joystick_connected: Option<JoystickCallback>,
    joystick_disconnected: Option<JoystickCallback>,
}

/// Owner of the backend and every window, monitor and cursor
pub struct Platform {
    windows: Registry<WindowId, Window>,
    cursors: Registry<CursorId, Cursor>,
    monitors: Registry<MonitorId, Monitor>,
    hints: Hints,
    clock: Clock,
    slot: ContextSlot,
    joysticks: Joysticks,
    callbacks: PlatformCallbacks,
    egl: Option<Rc<EglLibrary>>,
    backend: Box<dyn PlatformBackend>,
    terminated: bool,
}

impl Platform {
    /// Bring the backend up and take the first monitor inventory
    pub fn init(mut backend: Box<dyn PlatformBackend>) -> EngineResult<Self> {
        backend.init().map_err(|e| EngineError::from(e).logged())?;

        let clock = Clock::new(backend.timer_value(), backend.timer_frequency());
        let mut platform = Self {
            windows: Registry::new(),
            cursors: Registry::new(),
            monitors: Registry::new(),
            hints: Hints::default(),
            clock,
            slot: ContextSlot::allocate(),
            joysticks: Joysticks::default(),
            callbacks: PlatformCallbacks::default(),
            egl: None,
            backend,
            terminated: false,
        };
        platform.poll_monitors();

        log::info!("Platform initialized with {} monitor(s)", platform.monitors.len());
        Ok(platform)
    }

    /// Tear everything down; also run on drop
    ///
    /// Monitors get their original gamma ramp and video mode back before any
    /// window is destroyed, and all engine objects are gone before the backend
    /// itself is terminated.
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        for monitor in self.monitors.values_mut() {
            monitor.restore_original_gamma_ramp();
            if monitor.window().is_some() {
                monitor.restore_video_mode();
                monitor.set_window(None);
            }
        }

        let windows = self.windows.keys().to_vec();
        for id in windows {
            self.windows.remove(id);
        }

        let cursors = self.cursors.keys().to_vec();
        for id in cursors {
            self.cursors.remove(id);
        }

        let monitors = self.monitors.keys().to_vec();
        for id in monitors {
            self.monitors.remove(id);
        }

        self.slot.release();
        self.joysticks.terminate(self.backend.as_mut());
        self.backend.terminate();
        self.egl = None;

        log::info!("Platform terminated");
    }

    /// Backend the platform was initialized with
    pub fn backend(&self) -> &dyn PlatformBackend {
        self.backend.as_ref()
    }

    // ---------------------------------------------------------------- hints

    /// Hints used by [`Self::open_window`]
    pub fn hints(&self) -> &Hints {
        &self.hints
    }

    /// Mutable hints
    pub fn hints_mut(&mut self) -> &mut Hints {
        &mut self.hints
    }

    /// Replace every hint
    pub fn set_hints(&mut self, hints: Hints) {
        self.hints = hints;
    }

    /// Back to the defaults set at init
    pub fn reset_hints(&mut self) {
        self.hints = Hints::default();
    }

    // -------------------------------------------------------------- windows

    /// Create a window from the current hints
    ///
    /// `monitor` makes the window fullscreen on that monitor.
    pub fn open_window(
        &mut self,
        title: &str,
        width: i32,
        height: i32,
        monitor: Option<MonitorId>,
    ) -> EngineResult<WindowId> {
        let window = WindowConfig {
            refresh_rate: self.hints.refresh_rate,
            ..self.hints.window
        };
        let context = self.hints.context;
        let framebuffer = self.hints.framebuffer;
        self.open_window_with(title, width, height, monitor, &window, &context, &framebuffer)
    }

    /// Create a window from explicit configuration
    ///
    /// A window whose context cannot be created, or whose context turns out
    /// to be below the requested version, is destroyed again before the error
    /// is returned.
    pub fn open_window_with(
        &mut self,
        title: &str,
        width: i32,
        height: i32,
        monitor: Option<MonitorId>,
        window: &WindowConfig,
        context: &ContextConfig,
        framebuffer: &FramebufferConfig,
    ) -> EngineResult<WindowId> {
        if title.is_empty() {
            return Err(EngineError::InvalidArgument("Window title must not be empty".to_string()).logged());
        }
        if width <= 0 || height <= 0 {
            return Err(EngineError::InvalidValue(format!("Invalid window size {width}x{height}")).logged());
        }
        context.validate().map_err(EngineError::logged)?;

        if let Some(share) = context.share {
            let shared = self.windows.get(share).ok_or_else(|| EngineError::NoSuchWindow.logged())?;
            if shared.context().is_none() {
                return Err(EngineError::NoWindowContext.logged());
            }
        }

        let fullscreen = match monitor {
            Some(id) => {
                let monitor = self.monitors.get_mut(id).ok_or_else(|| EngineError::NoSuchMonitor.logged())?;
                let desired = VideoMode::new(
                    width,
                    height,
                    framebuffer.red_bits,
                    framebuffer.green_bits,
                    framebuffer.blue_bits,
                    window.refresh_rate,
                );
                let (x, y) = monitor.position();
                let mode = monitor.closest_video_mode(&desired).unwrap_or(desired);
                Some(Rect::new(x, y, mode.width, mode.height))
            }
            None => None,
        };

        let request = WindowRequest {
            title,
            width,
            height,
            window,
            framebuffer,
            context,
            fullscreen,
        };
        let native = self
            .backend
            .create_window(&request)
            .map_err(|e| EngineError::from(e).logged())?;

        let raw_supported = self.backend.raw_mouse_motion_supported();
        let id = self
            .windows
            .insert_with_key(|id| Window::new(id, &request, monitor, native, raw_supported));

        if let Err(e) = self.finish_window(id, monitor, window, context, framebuffer) {
            self.discard_window(id);
            return Err(e);
        }

        log::info!("Opened window \"{title}\" ({width}x{height})");
        Ok(id)
    }

    fn finish_window(
        &mut self,
        id: WindowId,
        monitor: Option<MonitorId>,
        config: &WindowConfig,
        context: &ContextConfig,
        framebuffer: &FramebufferConfig,
    ) -> EngineResult<()> {
        if context.api != ContextApi::None {
            self.create_context(id, context, framebuffer)?;
        }

        if let Some(monitor) = monitor {
            self.acquire_monitor(monitor, id)?;
        }

        let window = self.windows.get_mut(id).ok_or(EngineError::NoSuchWindow)?;
        if config.mouse_passthrough {
            window.set_mouse_passthrough(true);
        }

        if monitor.is_some() {
            if config.center_cursor {
                window.center_cursor();
            }
        } else if config.visible {
            if config.maximized {
                window.maximize();
            }
            window.show();
            if config.focused {
                window.focus();
            }
        }
        Ok(())
    }

    fn create_context(&mut self, id: WindowId, context: &ContextConfig, framebuffer: &FramebufferConfig) -> EngineResult<()> {
        let backend = match context.kind {
            ContextType::Native => self.create_native_context(id, context, framebuffer)?,
            ContextType::Egl => self.create_egl_context(id, context, framebuffer)?,
        };

        let window = self.windows.get_mut(id).ok_or(EngineError::NoSuchWindow)?;
        window.set_context(Context::new(backend, context.kind, id, self.slot));
        self.refresh_context_attribs(id, context)
    }

    fn create_native_context(
        &mut self,
        id: WindowId,
        context: &ContextConfig,
        framebuffer: &FramebufferConfig,
    ) -> EngineResult<Box<dyn ContextBackend>> {
        let window = self.windows.get(id).ok_or(EngineError::NoSuchWindow)?;
        let offered = self
            .backend
            .native_framebuffer_configs(window.backend(), context)
            .map_err(|e| EngineError::from(e).logged())?;
        let chosen = *choose_framebuffer_config(framebuffer, &offered).ok_or_else(|| {
            EngineError::FormatUnavailable("Failed to find a suitable pixel format".to_string()).logged()
        })?;

        let (window, shared) = self
            .windows
            .get_mut_with(id, context.share)
            .ok_or(EngineError::NoSuchWindow)?;
        let share = shared.and_then(Window::context).map(Context::backend);

        self.backend
            .create_native_context(window.backend_mut(), &chosen, context, share)
            .map_err(|e| EngineError::from(e).logged())
    }

    fn create_egl_context(
        &mut self,
        id: WindowId,
        context: &ContextConfig,
        framebuffer: &FramebufferConfig,
    ) -> EngineResult<Box<dyn ContextBackend>> {
        let egl = self.egl_library()?;
        let share = share_backend(&self.windows, context.share);
        let window = self.windows.get(id).ok_or(EngineError::NoSuchWindow)?;
        egl.create_context(self.backend.as_ref(), window.backend(), framebuffer, context, share)
    }

    fn egl_library(&mut self) -> EngineResult<Rc<EglLibrary>> {
        if let Some(egl) = &self.egl {
            return Ok(Rc::clone(egl));
        }
        let egl = Rc::new(EglLibrary::load(self.backend.as_ref())?);
        self.egl = Some(Rc::clone(&egl));
        Ok(egl)
    }

    /// Loaded EGL library, once an EGL context has been requested
    pub fn egl(&self) -> Option<&EglLibrary> {
        self.egl.as_deref()
    }

    fn discard_window(&mut self, id: WindowId) {
        if let Some(window) = self.windows.remove(id) {
            if let Some(monitor) = window.monitor() {
                self.release_monitor(monitor, id);
            }
        }
    }

    /// Destroy a window and its context
    ///
    /// If the window's context is current on this thread, the thread is left
    /// without a current context.
    pub fn destroy_window(&mut self, id: WindowId) -> EngineResult<()> {
        let window = self.windows.remove(id).ok_or_else(|| EngineError::NoSuchWindow.logged())?;
        if let Some(monitor) = window.monitor() {
            self.release_monitor(monitor, id);
        }
        log::debug!("Destroyed window \"{}\"", window.title());
        drop(window);
        Ok(())
    }

    /// Live windows, oldest first
    pub fn windows(&self) -> &[WindowId] {
        self.windows.keys()
    }

    /// First window still alive
    pub fn primary_window(&self) -> Option<WindowId> {
        self.windows.first()
    }

    /// Window by id
    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    /// Mutable window by id
    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(id)
    }

    fn window_by_handle(&self, handle: NativeHandle) -> Option<WindowId> {
        self.windows
            .iter()
            .find(|(_, window)| window.native_handle() == handle)
            .map(|(id, _)| id)
    }

    /// Resize a window, refitting the video mode of its monitor when fullscreen
    pub fn set_window_size(&mut self, id: WindowId, width: i32, height: i32) -> EngineResult<()> {
        let window = self.windows.get_mut(id).ok_or_else(|| EngineError::NoSuchWindow.logged())?;
        let Some(monitor) = window.monitor() else {
            return window.set_size(width, height);
        };

        if width <= 0 || height <= 0 {
            return Err(EngineError::InvalidValue(format!("Invalid window size {width}x{height}")).logged());
        }
        let refresh_rate = window.video_mode().refresh_rate;
        window.set_video_mode_request(width, height, refresh_rate);
        let (x, y) = window.position();

        let area = self.acquire_monitor(monitor, id)?;
        if let Some(window) = self.windows.get_mut(id) {
            window.backend_mut().set_monitor(Some(area), Rect::new(x, y, width, height));
        }
        Ok(())
    }

    /// Make a window fullscreen on `monitor`, or windowed at `(x, y)` when `None`
    pub fn set_window_monitor(
        &mut self,
        id: WindowId,
        monitor: Option<MonitorId>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        refresh_rate: i32,
    ) -> EngineResult<()> {
        if width <= 0 || height <= 0 {
            return Err(EngineError::InvalidValue(format!("Invalid window size {width}x{height}")).logged());
        }
        if refresh_rate < 0 && refresh_rate != DONT_CARE {
            return Err(EngineError::InvalidValue(format!("Invalid refresh rate {refresh_rate}")).logged());
        }
        if let Some(monitor) = monitor {
            if !self.monitors.contains(monitor) {
                return Err(EngineError::NoSuchMonitor.logged());
            }
        }

        let window = self.windows.get_mut(id).ok_or_else(|| EngineError::NoSuchWindow.logged())?;
        let request = window.video_mode();
        let previous = window.monitor();
        window.set_video_mode_request(width, height, refresh_rate);

        // The new monitor is switched before anything is released so a failure leaves
        // the window on its old monitor
        let fullscreen = match monitor {
            Some(monitor) => match self.acquire_monitor(monitor, id) {
                Ok(area) => Some(area),
                Err(e) => {
                    if let Some(window) = self.windows.get_mut(id) {
                        window.set_video_mode_request(request.width, request.height, request.refresh_rate);
                    }
                    return Err(e);
                }
            },
            None => None,
        };

        if previous != monitor {
            if let Some(previous) = previous {
                self.release_monitor(previous, id);
            }
        }

        if let Some(window) = self.windows.get_mut(id) {
            window.set_monitor_field(monitor);
            window.backend_mut().set_monitor(fullscreen, Rect::new(x, y, width, height));
        }
        Ok(())
    }

    /// Switch `monitor` to the window's video mode and record the occupant
    fn acquire_monitor(&mut self, monitor: MonitorId, id: WindowId) -> EngineResult<Rect> {
        let mode = self.windows.get(id).ok_or(EngineError::NoSuchWindow)?.video_mode();
        let monitor = self.monitors.get_mut(monitor).ok_or_else(|| EngineError::NoSuchMonitor.logged())?;

        monitor.set_video_mode(&mode)?;
        monitor.set_window(Some(id));

        let (x, y) = monitor.position();
        let current = monitor.video_mode().unwrap_or(mode);
        Ok(Rect::new(x, y, current.width, current.height))
    }

    /// Give `monitor` back its original mode if `id` still occupies it
    fn release_monitor(&mut self, monitor: MonitorId, id: WindowId) {
        if let Some(monitor) = self.monitors.get_mut(monitor) {
            if monitor.window() == Some(id) {
                monitor.set_window(None);
                monitor.restore_video_mode();
            }
        }
    }

    // -------------------------------------------------------------- context

    /// Make a window's context current on this thread, or clear the thread's context
    pub fn make_context_current(&mut self, window: Option<WindowId>) -> EngineResult<()> {
        let kind = match window {
            Some(id) => {
                let window = self.windows.get(id).ok_or_else(|| EngineError::NoSuchWindow.logged())?;
                let context = window.context().ok_or_else(|| EngineError::NoWindowContext.logged())?;
                Some(context.kind())
            }
            None => None,
        };

        if let Some(previous) = self.slot.get() {
            match self.windows.get_mut(previous).and_then(Window::context_mut) {
                Some(context) => {
                    if kind != Some(context.kind()) {
                        context.release_current()?;
                    }
                }
                None => self.slot.set(None),
            }
        }

        match window {
            Some(id) => self
                .windows
                .get_mut(id)
                .and_then(Window::context_mut)
                .ok_or(EngineError::NoWindowContext)?
                .make_current(),
            None => {
                self.slot.set(None);
                Ok(())
            }
        }
    }

    /// Window whose context is current on this thread
    pub fn current_context(&self) -> Option<WindowId> {
        self.slot.get().filter(|id| self.windows.contains(*id))
    }

    fn current_context_mut(&mut self) -> EngineResult<&mut Context> {
        let id = self.slot.get().ok_or_else(|| EngineError::NoCurrentContext.logged())?;
        self.windows
            .get_mut(id)
            .and_then(Window::context_mut)
            .ok_or_else(|| EngineError::NoCurrentContext.logged())
    }

    /// Read back what the driver granted for a window's context
    ///
    /// The context is made current for the duration and the previously
    /// current context is restored afterwards, whatever the outcome.
    pub fn refresh_context_attribs(&mut self, id: WindowId, requested: &ContextConfig) -> EngineResult<()> {
        let previous = self.current_context();
        self.make_context_current(Some(id))?;

        let result = match self.windows.get_mut(id).and_then(Window::context_mut) {
            Some(context) => context
                .refresh_attributes(requested, self.backend.as_ref())
                .and_then(|()| context.clear_and_swap()),
            None => Err(EngineError::NoWindowContext.logged()),
        };

        if let Err(e) = self.make_context_current(previous) {
            log::warn!("Failed to restore previous context: {e}");
        }
        result
    }

    /// Present the back buffer of a window
    pub fn swap_buffers(&mut self, id: WindowId) -> EngineResult<()> {
        self.windows
            .get_mut(id)
            .ok_or_else(|| EngineError::NoSuchWindow.logged())?
            .swap_buffers()
    }

    /// Set the swap interval of the current context
    pub fn swap_interval(&mut self, interval: i32) -> EngineResult<()> {
        self.current_context_mut()?.swap_interval(interval)
    }

    /// Whether the current context supports an OpenGL or platform extension
    pub fn extension_supported(&mut self, name: &str) -> EngineResult<bool> {
        let context = self.current_context_mut()?;
        if name.is_empty() {
            return Err(EngineError::InvalidValue("Extension name cannot be an empty string".to_string()).logged());
        }
        Ok(context.has_extension(name))
    }

    /// Address of a client API function for the current context
    pub fn proc_address(&mut self, name: &str) -> Option<ProcAddress> {
        self.current_context_mut().ok()?.proc_address(name)
    }

    // ---------------------------------------------------------------- time

    /// Seconds since init or the last [`Self::set_time`]
    pub fn time(&self) -> f64 {
        self.clock.seconds(self.backend.timer_value())
    }

    /// Rebase the clock so it currently reads `seconds`
    pub fn set_time(&mut self, seconds: f64) -> EngineResult<()> {
        let now = self.backend.timer_value();
        self.clock.set_seconds(now, seconds)
    }

    /// Raw tick counter
    pub fn timer_value(&self) -> u64 {
        self.backend.timer_value()
    }

    /// Ticks per second
    pub fn timer_frequency(&self) -> u64 {
        self.clock.frequency()
    }

    // -------------------------------------------------------------- cursors

    /// Create a cursor from an RGBA image with its hotspot at `(xhot, yhot)`
    pub fn create_cursor(&mut self, image: &RgbaImage, xhot: i32, yhot: i32) -> EngineResult<CursorId> {
        if image.width() == 0 || image.height() == 0 {
            return Err(EngineError::InvalidValue("Cursor image must not be empty".to_string()).logged());
        }
        let backend = self
            .backend
            .create_cursor(image, xhot, yhot)
            .map_err(|e| EngineError::from(e).logged())?;
        let source = CursorSource::Image {
            width: image.width(),
            height: image.height(),
            xhot,
            yhot,
        };
        Ok(self.cursors.insert(Cursor::new(source, backend)))
    }

    /// Create a cursor with a system shape
    pub fn create_standard_cursor(&mut self, shape: CursorShape) -> EngineResult<CursorId> {
        let backend = self
            .backend
            .create_standard_cursor(shape)
            .map_err(|e| EngineError::from(e).logged())?;
        Ok(self.cursors.insert(Cursor::new(CursorSource::Standard(shape), backend)))
    }

    /// Destroy a cursor; windows showing it fall back to the default arrow
    pub fn destroy_cursor(&mut self, id: CursorId) -> EngineResult<()> {
        if !self.cursors.contains(id) {
            return Err(EngineError::NoSuchCursor.logged());
        }
        for window in self.windows.values_mut() {
            if window.cursor() == Some(id) {
                window.set_cursor(None, None);
            }
        }
        self.cursors.remove(id);
        Ok(())
    }

    /// Cursor by id
    pub fn cursor(&self, id: CursorId) -> Option<&Cursor> {
        self.cursors.get(id)
    }

    /// Show `cursor` over a window's content area, or the default arrow for `None`
    pub fn set_window_cursor(&mut self, window: WindowId, cursor: Option<CursorId>) -> EngineResult<()> {
        let backend = match cursor {
            Some(id) => Some(self.cursors.get(id).ok_or_else(|| EngineError::NoSuchCursor.logged())?.backend()),
            None => None,
        };
        self.windows
            .get_mut(window)
            .ok_or_else(|| EngineError::NoSuchWindow.logged())?
            .set_cursor(cursor, backend);
        Ok(())
    }

    // ------------------------------------------------------------- monitors

    /// Connected monitors, primary first
    pub fn monitors(&self) -> &[MonitorId] {
        self.monitors.keys()
    }

    /// The primary monitor
    pub fn primary_monitor(&self) -> Option<MonitorId> {
        self.monitors.first()
    }

    /// Monitor by id
    pub fn monitor(&self, id: MonitorId) -> Option<&Monitor> {
        self.monitors.get(id)
    }

    /// Mutable monitor by id
    pub fn monitor_mut(&mut self, id: MonitorId) -> Option<&mut Monitor> {
        self.monitors.get_mut(id)
    }

    /// Re-enumerate monitors
    ///
    /// Monitors are matched by name. Vanished monitors lose their fullscreen
    /// window and are removed after the disconnect callback saw them; new ones
    /// are appended, the primary one at the front.
    pub fn poll_monitors(&mut self) {
        let mut reported = self.backend.monitors();

        // Each reported monitor matches at most one known monitor
        let mut vanished = Vec::new();
        for (id, monitor) in self.monitors.iter() {
            match reported.iter().position(|d| d.device == monitor.device_name()) {
                Some(index) => {
                    reported.remove(index);
                }
                None => vanished.push(id),
            }
        }

        for id in vanished {
            let occupant = self.monitors.get(id).and_then(Monitor::window);
            if let Some(window) = occupant.and_then(|w| self.windows.get_mut(w)) {
                let (x, y) = window.position();
                let (width, height) = window.size();
                window.set_monitor_field(None);
                window.backend_mut().set_monitor(None, Rect::new(x, y, width, height));
            }

            if let Some(monitor) = self.monitors.get(id) {
                log::info!("Monitor disconnected: {}", monitor.name());
                if let Some(callback) = self.callbacks.monitor_disconnected.as_mut() {
                    callback(id, monitor);
                }
            }
            self.monitors.remove(id);
        }

        for descriptor in reported {
            let primary = descriptor.primary;
            let monitor = Monitor::new(descriptor);
            log::info!("Monitor connected: {}", monitor.name());
            let id = if primary {
                self.monitors.insert_front(monitor)
            } else {
                self.monitors.insert(monitor)
            };
            if let (Some(callback), Some(monitor)) = (self.callbacks.monitor_connected.as_mut(), self.monitors.get(id)) {
                callback(id, monitor);
            }
        }
    }

    // --------------------------------------------------------------- events

    /// Process pending events without blocking
    pub fn poll_events(&mut self) {
        let events = self.backend.poll_events();
        self.process_events(events);
    }

    /// Block until events arrive, then process them
    pub fn wait_events(&mut self) {
        let events = self.backend.wait_events();
        self.process_events(events);
    }

    /// Block for at most `timeout` seconds, then process whatever arrived
    pub fn wait_events_timeout(&mut self, timeout: f64) -> EngineResult<()> {
        if !timeout.is_finite() || timeout < 0.0 {
            return Err(EngineError::InvalidValue(format!("Invalid time {timeout}")).logged());
        }
        let events = self.backend.wait_events_timeout(timeout);
        self.process_events(events);
        Ok(())
    }

    /// Wake up a thread blocked in one of the wait methods
    pub fn post_empty_event(&mut self) {
        self.backend.post_empty_event();
    }

    fn process_events(&mut self, events: Vec<BackendEvent>) {
        for event in events {
            match event {
                BackendEvent::Window(handle, event) => match self.window_by_handle(handle) {
                    Some(id) => self.dispatch_window_event(id, event),
                    None => log::trace!("Dropping event for unknown window {handle:?}"),
                },
                BackendEvent::MonitorsChanged => self.poll_monitors(),
                BackendEvent::Joystick(event) => match self.joysticks.apply(event) {
                    Some((id, true)) => {
                        if let Some(callback) = self.callbacks.joystick_connected.as_mut() {
                            callback(id);
                        }
                    }
                    Some((id, false)) => {
                        if let Some(callback) = self.callbacks.joystick_disconnected.as_mut() {
                            callback(id);
                        }
                    }
                    None => {}
                },
            }
        }
    }

    fn dispatch_window_event(&mut self, id: WindowId, event: WindowEvent) {
        let Some(window) = self.windows.get_mut(id) else {
            return;
        };

        match event {
            WindowEvent::Closed => window.on_close(),
            WindowEvent::Moved { x, y } => window.on_position(x, y),
            WindowEvent::Resized { width, height } => window.on_size(width, height),
            WindowEvent::Refresh => window.on_refresh(),
            WindowEvent::Focus(focused) => {
                window.on_focus(focused);
                if !focused && window.monitor().is_some() && window.is_auto_minimize() {
                    window.minimize();
                }
            }
            WindowEvent::Minimized(minimized) => {
                let monitor = window.monitor();
                window.on_minimize(minimized);
                if let Some(monitor) = monitor {
                    self.refit_fullscreen(id, monitor, minimized);
                }
            }
            WindowEvent::Maximized(maximized) => window.on_maximize(maximized),
            WindowEvent::FramebufferResized { width, height } => window.on_framebuffer_size(width, height),
            WindowEvent::ContentScale { x, y } => window.on_content_scale(x, y),
            WindowEvent::MouseButton { button, action, mods } => window.on_mouse_button(button, action, mods),
            WindowEvent::CursorMoved { x, y } => window.on_cursor_position(x, y),
            WindowEvent::CursorDelta { dx, dy } => window.on_cursor_delta(dx, dy),
            WindowEvent::CursorEnter(entered) => window.on_cursor_enter(entered),
            WindowEvent::Scroll { x, y } => window.on_scroll(x, y),
            WindowEvent::Key {
                key,
                scancode,
                action,
                mods,
            } => window.on_key(key, scancode, action, mods),
            WindowEvent::Char { codepoint, mods, plain } => window.on_char(codepoint, mods, plain),
            WindowEvent::Drop(paths) => window.on_drop(&paths),
        }
    }

    /// A minimized fullscreen window gives its monitor back until restored
    fn refit_fullscreen(&mut self, id: WindowId, monitor: MonitorId, minimized: bool) {
        if minimized {
            self.release_monitor(monitor, id);
            return;
        }

        match self.acquire_monitor(monitor, id) {
            Ok(area) => {
                if let Some(window) = self.windows.get_mut(id) {
                    let (x, y) = window.position();
                    let (width, height) = window.size();
                    window.backend_mut().set_monitor(Some(area), Rect::new(x, y, width, height));
                }
            }
            Err(e) => log::warn!("Failed to reacquire monitor after restore: {e}"),
        }
    }

    // ------------------------------------------------------------ callbacks

    /// Called after a monitor is connected
    pub fn set_monitor_connected_callback(&mut self, callback: impl FnMut(MonitorId, &Monitor) + 'static) {
        self.callbacks.monitor_connected = Some(Box::new(callback));
    }

    /// Called before a disconnected monitor is removed
    pub fn set_monitor_disconnected_callback(&mut self, callback: impl FnMut(MonitorId, &Monitor) + 'static) {
        self.callbacks.monitor_disconnected = Some(Box::new(callback));
    }

    /// Called after a joystick is connected
    pub fn set_joystick_connected_callback(&mut self, callback: impl FnMut(usize) + 'static) {
        self.callbacks.joystick_connected = Some(Box::new(callback));
    }

    /// Called after a joystick is disconnected
    pub fn set_joystick_disconnected_callback(&mut self, callback: impl FnMut(usize) + 'static) {
        self.callbacks.joystick_disconnected = Some(Box::new(callback));
    }

    // ------------------------------------------------------------ joysticks

    /// Whether slot `id` holds a joystick; brings the joystick subsystem up on first use
    pub fn joystick_present(&mut self, id: usize) -> bool {
        self.joysticks.init(self.backend.as_mut()) && self.joysticks.is_present(id)
    }

    /// Joystick in slot `id`; brings the joystick subsystem up on first use
    pub fn joystick(&mut self, id: usize) -> Option<&Joystick> {
        if !self.joysticks.init(self.backend.as_mut()) {
            return None;
        }
        self.joysticks.get(id)
    }

    // ------------------------------------------------------ keys, clipboard

    /// Layout-dependent name of a printable key
    ///
    /// For [`Key::Unknown`] the scancode names the key instead.
    pub fn key_name(&self, key: Key, scancode: i32) -> Option<String> {
        let scancode = if key == Key::Unknown {
            scancode
        } else {
            if !key.is_printable() {
                return None;
            }
            self.backend.key_scancode(key)
        };
        self.backend.scancode_name(scancode)
    }

    /// Platform scancode of a key, or `-1`
    pub fn key_scancode(&self, key: Key) -> i32 {
        if key == Key::Unknown {
            log::error!("Invalid key {key:?}");
            return -1;
        }
        self.backend.key_scancode(key)
    }

    /// Whether unaccelerated mouse motion is available
    pub fn raw_mouse_motion_supported(&self) -> bool {
        self.backend.raw_mouse_motion_supported()
    }

    /// Replace the clipboard text
    pub fn set_clipboard_string(&mut self, text: &str) {
        self.backend.set_clipboard_string(text);
    }

    /// Current clipboard text
    pub fn clipboard_string(&mut self) -> Option<String> {
        self.backend.clipboard_string()
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn share_backend(windows: &Registry<WindowId, Window>, share: Option<WindowId>) -> Option<&dyn ContextBackend> {
    windows.get(share?)?.context().map(Context::backend)
}
