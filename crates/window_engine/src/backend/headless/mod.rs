//! # Headless Backend
//!
//! An in-memory [`PlatformBackend`] with no OS dependency. Windows, monitors,
//! contexts and the EGL library are plain records behind a shared
//! `Rc<RefCell<_>>`, so a [`HeadlessHandle`] kept by the caller can script
//! events and inspect what the engine asked the backend to do.
//!
//! ```rust
//! use window_engine::backend::headless::{HeadlessBackend, HeadlessMonitor};
//! use window_engine::monitor::VideoMode;
//! use window_engine::Platform;
//!
//! let backend = HeadlessBackend::new();
//! let handle = backend.handle();
//! handle.add_monitor(HeadlessMonitor::new("Main").with_modes(vec![VideoMode::new(1920, 1080, 8, 8, 8, 60)]));
//!
//! let platform = Platform::init(Box::new(backend))?;
//! assert_eq!(platform.monitors().len(), 1);
//! # Ok::<(), window_engine::EngineError>(())
//! ```

mod context;
mod egl;
mod monitor;
mod window;

pub use context::HeadlessContext;
pub use egl::HeadlessEglConfig;
pub use monitor::HeadlessMonitor;
pub use window::HeadlessWindowState;

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use image::RgbaImage;

use super::{
    BackendError, BackendEvent, BackendResult, DynamicLibrary, MonitorDescriptor, NativeHandle, PlatformBackend,
    ProcAddress, WindowEvent, WindowRequest,
};
use crate::context::egl::EglApi;
use crate::context::{ContextBackend, ContextConfig, FramebufferConfig, GlFunctions};
use crate::cursor::CursorBackend;
use crate::input::{CursorShape, Key};
use crate::monitor::VideoMode;
use crate::window::WindowBackend;

use context::{gl_proc_address, HeadlessGl, HeadlessLibrary};
use egl::{EglState, HeadlessEgl};
use monitor::{HeadlessMonitorBackend, MonitorState};
use window::HeadlessWindow;

/// Ticks per second of the headless clock
pub const TIMER_FREQUENCY: u64 = 1_000_000;

/// Scripted GL driver shared by every context
#[derive(Debug, Clone)]
struct GlState {
    version: String,
    extensions: Vec<String>,
    integers: HashMap<u32, i32>,
    missing: Vec<String>,
    platform_extensions: Vec<String>,
}

impl Default for GlState {
    fn default() -> Self {
        Self {
            version: "3.3.0 Headless".to_string(),
            extensions: Vec::new(),
            integers: HashMap::new(),
            missing: Vec::new(),
            platform_extensions: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct ContextStats {
    created: usize,
    live: usize,
    make_current_calls: usize,
    current: Option<u64>,
    swaps: usize,
    clears: usize,
    swap_interval: i32,
    last_share: Option<u64>,
}

#[derive(Debug, Default)]
struct JoystickStats {
    init_calls: usize,
    terminate_calls: usize,
    init_fails: bool,
}

struct State {
    init_fails: bool,
    window_creation_fails: bool,
    native_context_fails: bool,
    raw_mouse_motion: bool,
    log: Vec<String>,
    events: VecDeque<BackendEvent>,
    empty_events: usize,
    ticks: u64,
    clipboard: Option<String>,
    next_id: u64,
    next_device: u32,
    windows: HashMap<NativeHandle, HeadlessWindowState>,
    monitors: Vec<MonitorState>,
    native_configs: Vec<FramebufferConfig>,
    gl: GlState,
    contexts: ContextStats,
    joysticks: JoystickStats,
    libraries: Vec<String>,
    egl: EglState,
    live_cursors: usize,
}

impl Default for State {
    fn default() -> Self {
        Self {
            init_fails: false,
            window_creation_fails: false,
            native_context_fails: false,
            raw_mouse_motion: true,
            log: Vec::new(),
            events: VecDeque::new(),
            empty_events: 0,
            ticks: 0,
            clipboard: None,
            next_id: 1,
            next_device: 1,
            windows: HashMap::new(),
            monitors: Vec::new(),
            native_configs: vec![
                FramebufferConfig {
                    handle: 1,
                    ..FramebufferConfig::default()
                },
                FramebufferConfig {
                    handle: 2,
                    ..FramebufferConfig::default().with_color_bits(5, 6, 5, 0)
                },
            ],
            gl: GlState::default(),
            contexts: ContextStats::default(),
            joysticks: JoystickStats::default(),
            libraries: Vec::new(),
            egl: EglState::default(),
            live_cursors: 0,
        }
    }
}

impl State {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn record(&mut self, entry: impl Into<String>) {
        self.log.push(entry.into());
    }

    fn monitor(&self, device: &str) -> Option<&MonitorState> {
        self.monitors.iter().find(|m| m.device == device)
    }

    fn monitor_mut(&mut self, device: &str) -> Option<&mut MonitorState> {
        self.monitors.iter_mut().find(|m| m.device == device)
    }

    fn push_window_event(&mut self, handle: NativeHandle, event: WindowEvent) {
        self.events.push_back(BackendEvent::Window(handle, event));
    }
}

type Shared = Rc<RefCell<State>>;

/// In-memory backend
pub struct HeadlessBackend {
    state: Shared,
}

impl HeadlessBackend {
    /// Backend with no monitors and a 3.3 GL driver
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State::default())),
        }
    }

    /// Scripting handle sharing this backend's state
    pub fn handle(&self) -> HeadlessHandle {
        HeadlessHandle {
            state: Rc::clone(&self.state),
        }
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Scripting and inspection side of a [`HeadlessBackend`]
#[derive(Clone)]
pub struct HeadlessHandle {
    state: Shared,
}

impl HeadlessHandle {
    /// Every backend call worth asserting on, in order
    pub fn call_log(&self) -> Vec<String> {
        self.state.borrow().log.clone()
    }

    /// Make the next `init` fail
    pub fn set_init_fails(&self, fails: bool) {
        self.state.borrow_mut().init_fails = fails;
    }

    /// Make window creation fail
    pub fn set_window_creation_fails(&self, fails: bool) {
        self.state.borrow_mut().window_creation_fails = fails;
    }

    /// Whether raw mouse motion is reported as supported
    pub fn set_raw_mouse_motion_supported(&self, supported: bool) {
        self.state.borrow_mut().raw_mouse_motion = supported;
    }

    /// Queue an event for the next pump
    pub fn push_event(&self, event: BackendEvent) {
        self.state.borrow_mut().events.push_back(event);
    }

    /// Queue a window event for the next pump
    pub fn push_window_event(&self, window: NativeHandle, event: WindowEvent) {
        self.state.borrow_mut().push_window_event(window, event);
    }

    /// Discard queued events
    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    /// Number of `post_empty_event` calls
    pub fn empty_events_posted(&self) -> usize {
        self.state.borrow().empty_events
    }

    /// Move the clock forward
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn advance_time(&self, seconds: f64) {
        self.state.borrow_mut().ticks += (seconds * TIMER_FREQUENCY as f64) as u64;
    }

    // ------------------------------------------------------------- windows

    /// Snapshot of a native window
    pub fn window_state(&self, window: NativeHandle) -> Option<HeadlessWindowState> {
        self.state.borrow().windows.get(&window).cloned()
    }

    /// Number of live native windows
    pub fn window_count(&self) -> usize {
        self.state.borrow().windows.len()
    }

    /// Move the OS cursor as if the user did
    pub fn set_cursor_position(&self, window: NativeHandle, x: f64, y: f64) {
        if let Some(state) = self.state.borrow_mut().windows.get_mut(&window) {
            state.cursor_position = (x, y);
        }
    }

    // ------------------------------------------------------------ monitors

    /// Connect a monitor; reported by the next enumeration
    ///
    /// Returns the device key the other monitor methods take.
    pub fn add_monitor(&self, monitor: HeadlessMonitor) -> String {
        let mut state = self.state.borrow_mut();
        let device = format!("HEADLESS{}", state.next_device);
        state.next_device += 1;
        state.monitors.push(MonitorState::new(device.clone(), monitor));
        device
    }

    /// Disconnect a monitor
    pub fn remove_monitor(&self, device: &str) {
        self.state.borrow_mut().monitors.retain(|m| m.device != device);
    }

    /// Replace the modes a monitor reports
    pub fn set_monitor_modes(&self, device: &str, modes: Vec<VideoMode>) {
        if let Some(monitor) = self.state.borrow_mut().monitor_mut(device) {
            monitor.info.modes = modes;
        }
    }

    /// Mode the monitor is currently in
    pub fn monitor_current_mode(&self, device: &str) -> Option<VideoMode> {
        self.state.borrow().monitor(device).and_then(|m| m.current)
    }

    /// Number of mode switches performed on a monitor
    pub fn monitor_mode_switches(&self, device: &str) -> usize {
        self.state.borrow().monitor(device).map_or(0, |m| m.mode_switches)
    }

    /// Number of gamma ramps installed on a monitor
    pub fn monitor_gamma_sets(&self, device: &str) -> usize {
        self.state.borrow().monitor(device).map_or(0, |m| m.gamma_sets)
    }

    // ----------------------------------------------------------- joysticks

    /// Number of `init_joysticks` calls
    pub fn joystick_init_calls(&self) -> usize {
        self.state.borrow().joysticks.init_calls
    }

    /// Number of `terminate_joysticks` calls
    pub fn joystick_terminate_calls(&self) -> usize {
        self.state.borrow().joysticks.terminate_calls
    }

    /// Make joystick init fail
    pub fn set_joystick_init_fails(&self, fails: bool) {
        self.state.borrow_mut().joysticks.init_fails = fails;
    }

    // ------------------------------------------------------------------ GL

    /// Version string the driver reports
    pub fn set_gl_version(&self, version: &str) {
        self.state.borrow_mut().gl.version = version.to_string();
    }

    /// Extensions the driver reports
    pub fn set_gl_extensions(&self, extensions: &[&str]) {
        self.state.borrow_mut().gl.extensions = extensions.iter().map(ToString::to_string).collect();
    }

    /// Value returned by `glGetIntegerv(pname)`
    pub fn set_gl_integer(&self, pname: u32, value: i32) {
        self.state.borrow_mut().gl.integers.insert(pname, value);
    }

    /// Make a GL entry point unresolvable
    pub fn remove_gl_function(&self, name: &str) {
        self.state.borrow_mut().gl.missing.push(name.to_string());
    }

    /// Extensions of the native platform API (WGL, GLX, ...)
    pub fn set_platform_extensions(&self, extensions: &[&str]) {
        self.state.borrow_mut().gl.platform_extensions = extensions.iter().map(ToString::to_string).collect();
    }

    /// Pixel formats offered for native contexts
    pub fn set_native_configs(&self, configs: Vec<FramebufferConfig>) {
        self.state.borrow_mut().native_configs = configs;
    }

    /// Make native context creation fail
    pub fn set_native_context_fails(&self, fails: bool) {
        self.state.borrow_mut().native_context_fails = fails;
    }

    /// Contexts created so far
    pub fn contexts_created(&self) -> usize {
        self.state.borrow().contexts.created
    }

    /// Native and EGL contexts not yet destroyed
    pub fn live_contexts(&self) -> usize {
        let state = self.state.borrow();
        state.contexts.live + state.egl.live_contexts
    }

    /// Id of the context current on the headless driver
    pub fn current_context(&self) -> Option<u64> {
        let state = self.state.borrow();
        state.contexts.current.or(state.egl.current)
    }

    /// Number of make-current calls, releases included
    pub fn make_current_calls(&self) -> usize {
        self.state.borrow().contexts.make_current_calls
    }

    /// Number of buffer swaps
    pub fn swap_count(&self) -> usize {
        self.state.borrow().contexts.swaps
    }

    /// Number of `glClear` calls
    pub fn clear_count(&self) -> usize {
        self.state.borrow().contexts.clears
    }

    /// Last swap interval set
    pub fn swap_interval(&self) -> i32 {
        self.state.borrow().contexts.swap_interval
    }

    /// Context id the last native context was created to share with
    pub fn last_shared_context(&self) -> Option<u64> {
        self.state.borrow().contexts.last_share
    }

    // ----------------------------------------------------------------- EGL

    /// Make a dynamic library loadable
    pub fn add_library(&self, name: &str) {
        self.state.borrow_mut().libraries.push(name.to_string());
    }

    /// Configs the EGL display offers
    pub fn set_egl_configs(&self, configs: Vec<HeadlessEglConfig>) {
        self.state.borrow_mut().egl.configs = configs;
    }

    /// Display extension string
    pub fn set_egl_extensions(&self, extensions: &str) {
        self.state.borrow_mut().egl.display_extensions = extensions.to_string();
    }

    /// Make `eglInitialize` fail
    pub fn set_egl_initialize_fails(&self, fails: bool) {
        self.state.borrow_mut().egl.initialize_fails = fails;
    }

    /// Make `eglCreateContext` fail
    pub fn set_egl_create_context_fails(&self, fails: bool) {
        self.state.borrow_mut().egl.create_context_fails = fails;
    }

    /// Make `eglCreateWindowSurface` fail
    pub fn set_egl_surface_fails(&self, fails: bool) {
        self.state.borrow_mut().egl.surface_fails = fails;
    }

    /// Make `eglSwapInterval` fail
    pub fn set_egl_swap_interval_fails(&self, fails: bool) {
        self.state.borrow_mut().egl.swap_interval_fails = fails;
    }

    /// Live EGL `(contexts, surfaces)`
    pub fn egl_live_objects(&self) -> (usize, usize) {
        let egl = &self.state.borrow().egl;
        (egl.live_contexts, egl.live_surfaces)
    }

    /// Attribute list passed to the last `eglCreateContext`
    pub fn egl_context_attributes(&self) -> Vec<i32> {
        self.state.borrow().egl.last_context_attributes.clone()
    }

    /// Id of the `EGLConfig` passed to the last `eglCreateContext`
    pub fn egl_context_config(&self) -> Option<u64> {
        self.state.borrow().egl.last_context_config
    }

    /// Number of `eglTerminate` calls
    pub fn egl_terminate_calls(&self) -> usize {
        self.state.borrow().egl.terminate_calls
    }

    // ------------------------------------------------------------- cursors

    /// Cursors not yet destroyed
    pub fn live_cursors(&self) -> usize {
        self.state.borrow().live_cursors
    }
}

/// Cursor record
pub struct HeadlessCursor {
    id: u64,
    state: Shared,
}

impl HeadlessCursor {
    /// Cursor id, as seen in [`HeadlessWindowState::cursor`]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl CursorBackend for HeadlessCursor {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl Drop for HeadlessCursor {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.live_cursors -= 1;
        state.record(format!("destroy_cursor:{}", self.id));
    }
}

impl PlatformBackend for HeadlessBackend {
    fn init(&mut self) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        if state.init_fails {
            return Err(BackendError::Failed("Headless init refused".to_string()));
        }
        state.record("init");
        Ok(())
    }

    fn terminate(&mut self) {
        self.state.borrow_mut().record("terminate");
    }

    fn poll_events(&mut self) -> Vec<BackendEvent> {
        self.state.borrow_mut().events.drain(..).collect()
    }

    fn wait_events(&mut self) -> Vec<BackendEvent> {
        self.poll_events()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn wait_events_timeout(&mut self, timeout: f64) -> Vec<BackendEvent> {
        let mut state = self.state.borrow_mut();
        if state.events.is_empty() {
            state.ticks += (timeout * TIMER_FREQUENCY as f64) as u64;
        }
        state.events.drain(..).collect()
    }

    fn post_empty_event(&mut self) {
        self.state.borrow_mut().empty_events += 1;
    }

    fn timer_value(&self) -> u64 {
        self.state.borrow().ticks
    }

    fn timer_frequency(&self) -> u64 {
        TIMER_FREQUENCY
    }

    fn set_clipboard_string(&mut self, text: &str) {
        self.state.borrow_mut().clipboard = Some(text.to_string());
    }

    fn clipboard_string(&mut self) -> Option<String> {
        self.state.borrow().clipboard.clone()
    }

    fn scancode_name(&self, scancode: i32) -> Option<String> {
        let key = Key::from_code(scancode).filter(|k| k.is_printable())?;
        let name = match key {
            Key::KeyPadDecimal => ".".to_string(),
            Key::KeyPadDivide => "/".to_string(),
            Key::KeyPadMultiply => "*".to_string(),
            Key::KeyPadSubtract => "-".to_string(),
            Key::KeyPadAdd => "+".to_string(),
            Key::KeyPadEqual => "=".to_string(),
            k if (Key::KeyPad0..=Key::KeyPad9).contains(&k) => (k.code() - Key::KeyPad0.code()).to_string(),
            k => u8::try_from(k.code())
                .ok()
                .filter(u8::is_ascii_graphic)
                .map(|c| char::from(c).to_ascii_lowercase().to_string())?,
        };
        Some(name)
    }

    fn key_scancode(&self, key: Key) -> i32 {
        key.code()
    }

    fn raw_mouse_motion_supported(&self) -> bool {
        self.state.borrow().raw_mouse_motion
    }

    fn monitors(&mut self) -> Vec<MonitorDescriptor> {
        let state = self.state.borrow();
        state
            .monitors
            .iter()
            .map(|m| MonitorDescriptor {
                name: m.info.name.clone(),
                device: m.device.clone(),
                width_mm: m.info.width_mm,
                height_mm: m.info.height_mm,
                primary: m.info.primary,
                backend: Box::new(HeadlessMonitorBackend::new(m, Rc::clone(&self.state))),
            })
            .collect()
    }

    fn create_window(&mut self, request: &WindowRequest<'_>) -> BackendResult<Box<dyn WindowBackend>> {
        let mut state = self.state.borrow_mut();
        if state.window_creation_fails {
            return Err(BackendError::Failed("Headless window creation refused".to_string()));
        }

        let handle = NativeHandle(state.next_id());
        state.windows.insert(handle, HeadlessWindowState::new(request));
        state.record(format!("create_window:{}", request.title));
        drop(state);

        Ok(Box::new(HeadlessWindow::new(handle, Rc::clone(&self.state))))
    }

    fn native_framebuffer_configs(
        &mut self,
        _window: &dyn WindowBackend,
        _context: &ContextConfig,
    ) -> BackendResult<Vec<FramebufferConfig>> {
        Ok(self.state.borrow().native_configs.clone())
    }

    fn create_native_context(
        &mut self,
        window: &mut dyn WindowBackend,
        framebuffer: &FramebufferConfig,
        _context: &ContextConfig,
        share: Option<&dyn ContextBackend>,
    ) -> BackendResult<Box<dyn ContextBackend>> {
        let mut state = self.state.borrow_mut();
        if state.native_context_fails {
            return Err(BackendError::Failed("Headless context creation refused".to_string()));
        }

        let id = state.next_id();
        state.contexts.created += 1;
        state.contexts.live += 1;
        state.contexts.last_share = share
            .and_then(|s| s.as_any().downcast_ref::<HeadlessContext>())
            .map(HeadlessContext::id);
        state.record(format!("create_context:{id}"));
        drop(state);

        Ok(Box::new(HeadlessContext::new(
            id,
            window.native_handle(),
            framebuffer.handle,
            Rc::clone(&self.state),
        )))
    }

    fn bind_gl_functions(
        &self,
        resolve: &dyn Fn(&str) -> Option<ProcAddress>,
    ) -> Option<Box<dyn GlFunctions>> {
        resolve("glGetIntegerv")?;
        resolve("glGetString")?;
        let indexed = resolve("glGetStringi").is_some();
        Some(Box::new(HeadlessGl::new(Rc::clone(&self.state), indexed)))
    }

    fn create_cursor(&mut self, image: &RgbaImage, xhot: i32, yhot: i32) -> BackendResult<Box<dyn CursorBackend>> {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.live_cursors += 1;
        state.record(format!("create_cursor:{id}:{}x{}@{xhot},{yhot}", image.width(), image.height()));
        drop(state);
        Ok(Box::new(HeadlessCursor {
            id,
            state: Rc::clone(&self.state),
        }))
    }

    fn create_standard_cursor(&mut self, shape: CursorShape) -> BackendResult<Box<dyn CursorBackend>> {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.live_cursors += 1;
        state.record(format!("create_cursor:{id}:{shape:?}"));
        drop(state);
        Ok(Box::new(HeadlessCursor {
            id,
            state: Rc::clone(&self.state),
        }))
    }

    fn init_joysticks(&mut self) -> bool {
        let mut state = self.state.borrow_mut();
        state.joysticks.init_calls += 1;
        !state.joysticks.init_fails
    }

    fn terminate_joysticks(&mut self) {
        self.state.borrow_mut().joysticks.terminate_calls += 1;
    }

    fn open_library(&self, name: &str) -> Option<Box<dyn DynamicLibrary>> {
        let mut state = self.state.borrow_mut();
        if !state.libraries.iter().any(|l| l == name) {
            return None;
        }
        state.record(format!("open_library:{name}"));
        drop(state);
        Some(Box::new(HeadlessLibrary::new(name, Rc::clone(&self.state))))
    }

    fn load_egl(&self, library: &dyn DynamicLibrary) -> Option<Box<dyn EglApi>> {
        library.symbol("eglGetDisplay")?;
        Some(Box::new(HeadlessEgl::new(Rc::clone(&self.state))))
    }
}

/// Deterministic fake address for a GL or EGL entry point
fn fake_address(name: &str) -> ProcAddress {
    ProcAddress(name.bytes().fold(0x1000_usize, |acc, b| acc.wrapping_mul(31).wrapping_add(usize::from(b))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scancode_names() {
        let backend = HeadlessBackend::new();
        assert_eq!(backend.scancode_name(Key::A.code()).as_deref(), Some("a"));
        assert_eq!(backend.scancode_name(Key::KeyPad7.code()).as_deref(), Some("7"));
        assert_eq!(backend.scancode_name(Key::KeyPadAdd.code()).as_deref(), Some("+"));
        assert_eq!(backend.scancode_name(Key::Escape.code()), None);
        assert_eq!(backend.scancode_name(-1), None);
    }

    #[test]
    fn test_events_drain_in_order() {
        let mut backend = HeadlessBackend::new();
        let handle = backend.handle();
        handle.push_event(BackendEvent::MonitorsChanged);
        handle.push_window_event(NativeHandle(7), WindowEvent::Refresh);

        let events = backend.poll_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], BackendEvent::MonitorsChanged);
        assert!(backend.poll_events().is_empty());
    }

    #[test]
    fn test_wait_timeout_advances_idle_clock() {
        let mut backend = HeadlessBackend::new();
        let before = backend.timer_value();
        assert!(backend.wait_events_timeout(0.5).is_empty());
        assert_eq!(backend.timer_value() - before, TIMER_FREQUENCY / 2);
    }

    #[test]
    fn test_libraries_open_only_when_installed() {
        let backend = HeadlessBackend::new();
        let handle = backend.handle();
        assert!(backend.open_library("libEGL.so.1").is_none());

        handle.add_library("libEGL.so.1");
        let library = backend.open_library("libEGL.so.1").unwrap();
        assert_eq!(library.name(), "libEGL.so.1");
        drop(library);
        assert_eq!(handle.call_log(), vec!["open_library:libEGL.so.1", "close_library:libEGL.so.1"]);
    }
}
