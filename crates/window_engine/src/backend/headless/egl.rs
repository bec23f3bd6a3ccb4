//! Headless EGL driver

use std::cell::Cell;

use super::context::gl_proc_address;
use super::{fake_address, Shared};
use crate::backend::ProcAddress;
use crate::context::egl::{
    EglApi, EglConfig, EglContextHandle, EglDisplay, EglSurface, EGL_ALPHA_SIZE, EGL_BAD_CONTEXT, EGL_BAD_DISPLAY,
    EGL_BAD_MATCH, EGL_BAD_NATIVE_WINDOW, EGL_BLUE_SIZE, EGL_COLOR_BUFFER_TYPE, EGL_CONFIG_CAVEAT, EGL_DEPTH_SIZE, EGL_EXTENSIONS, EGL_GREEN_SIZE,
    EGL_NONE, EGL_NOT_INITIALIZED, EGL_OPENGL_BIT, EGL_OPENGL_ES2_BIT, EGL_RED_SIZE, EGL_RENDERABLE_TYPE, EGL_RGB_BUFFER,
    EGL_SAMPLES, EGL_STENCIL_SIZE, EGL_SUCCESS, EGL_SURFACE_TYPE, EGL_WINDOW_BIT,
};

/// One `EGLConfig` offered by the headless display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessEglConfig {
    /// Config id
    pub id: u64,
    /// Red bits
    pub red: i32,
    /// Green bits
    pub green: i32,
    /// Blue bits
    pub blue: i32,
    /// Alpha bits
    pub alpha: i32,
    /// Depth bits
    pub depth: i32,
    /// Stencil bits
    pub stencil: i32,
    /// Samples
    pub samples: i32,
    /// `EGL_COLOR_BUFFER_TYPE`
    pub color_buffer_type: i32,
    /// `EGL_SURFACE_TYPE`
    pub surface_type: i32,
    /// `EGL_RENDERABLE_TYPE`
    pub renderable_type: i32,
    /// `EGL_CONFIG_CAVEAT`
    pub caveat: i32,
}

impl HeadlessEglConfig {
    /// RGBA8, depth 24, stencil 8, window capable, renderable with GL and GLES2
    pub fn rgba8(id: u64) -> Self {
        Self {
            id,
            red: 8,
            green: 8,
            blue: 8,
            alpha: 8,
            depth: 24,
            stencil: 8,
            samples: 0,
            color_buffer_type: EGL_RGB_BUFFER,
            surface_type: EGL_WINDOW_BIT,
            renderable_type: EGL_OPENGL_BIT | EGL_OPENGL_ES2_BIT,
            caveat: EGL_NONE,
        }
    }

    /// Same config with a different renderable mask
    pub fn with_renderable(mut self, renderable_type: i32) -> Self {
        self.renderable_type = renderable_type;
        self
    }

    /// Same config with a caveat such as `EGL_SLOW_CONFIG`
    pub fn with_caveat(mut self, caveat: i32) -> Self {
        self.caveat = caveat;
        self
    }

    fn attribute(&self, attribute: i32) -> Option<i32> {
        Some(match attribute {
            EGL_RED_SIZE => self.red,
            EGL_GREEN_SIZE => self.green,
            EGL_BLUE_SIZE => self.blue,
            EGL_ALPHA_SIZE => self.alpha,
            EGL_DEPTH_SIZE => self.depth,
            EGL_STENCIL_SIZE => self.stencil,
            EGL_SAMPLES => self.samples,
            EGL_COLOR_BUFFER_TYPE => self.color_buffer_type,
            EGL_SURFACE_TYPE => self.surface_type,
            EGL_RENDERABLE_TYPE => self.renderable_type,
            EGL_CONFIG_CAVEAT => self.caveat,
            _ => return None,
        })
    }
}

pub(super) struct EglState {
    pub configs: Vec<HeadlessEglConfig>,
    pub display_extensions: String,
    pub client_extensions: bool,
    pub initialize_fails: bool,
    pub create_context_fails: bool,
    pub surface_fails: bool,
    pub swap_interval_fails: bool,
    pub live_contexts: usize,
    pub live_surfaces: usize,
    pub terminate_calls: usize,
    pub current: Option<u64>,
    pub last_context_attributes: Vec<i32>,
    pub last_context_config: Option<u64>,
}

impl Default for EglState {
    fn default() -> Self {
        Self {
            configs: vec![HeadlessEglConfig::rgba8(1)],
            display_extensions: "EGL_KHR_create_context EGL_KHR_get_all_proc_addresses".to_string(),
            client_extensions: true,
            initialize_fails: false,
            create_context_fails: false,
            surface_fails: false,
            swap_interval_fails: false,
            live_contexts: 0,
            live_surfaces: 0,
            terminate_calls: 0,
            current: None,
            last_context_attributes: Vec::new(),
            last_context_config: None,
        }
    }
}

/// [`EglApi`] over the shared headless state
pub(super) struct HeadlessEgl {
    state: Shared,
    error: Cell<i32>,
}

impl HeadlessEgl {
    pub fn new(state: Shared) -> Self {
        Self {
            state,
            error: Cell::new(EGL_SUCCESS),
        }
    }

    fn fail<T>(&self, error: i32) -> Option<T> {
        self.error.set(error);
        None
    }
}

impl EglApi for HeadlessEgl {
    fn get_error(&self) -> i32 {
        self.error.replace(EGL_SUCCESS)
    }

    fn get_display(&self, _native_display: u64) -> Option<EglDisplay> {
        Some(EglDisplay(1))
    }

    fn initialize(&self, _display: EglDisplay) -> Option<(i32, i32)> {
        let mut state = self.state.borrow_mut();
        if state.egl.initialize_fails {
            return self.fail(EGL_NOT_INITIALIZED);
        }
        state.record("egl_initialize");
        Some((1, 5))
    }

    fn terminate(&self, _display: EglDisplay) {
        let mut state = self.state.borrow_mut();
        state.egl.terminate_calls += 1;
        state.record("egl_terminate");
    }

    fn query_string(&self, display: Option<EglDisplay>, name: i32) -> Option<String> {
        let state = self.state.borrow();
        match (display, name) {
            (None, EGL_EXTENSIONS) if state.egl.client_extensions => Some("EGL_EXT_client_extensions".to_string()),
            (None, _) => self.fail(EGL_BAD_DISPLAY),
            (Some(_), EGL_EXTENSIONS) => Some(state.egl.display_extensions.clone()),
            (Some(_), _) => None,
        }
    }

    fn get_configs(&self, _display: EglDisplay) -> Vec<EglConfig> {
        self.state.borrow().egl.configs.iter().map(|c| EglConfig(c.id)).collect()
    }

    fn get_config_attrib(&self, _display: EglDisplay, config: EglConfig, attribute: i32) -> Option<i32> {
        let state = self.state.borrow();
        state
            .egl
            .configs
            .iter()
            .find(|c| c.id == config.0)
            .and_then(|c| c.attribute(attribute))
    }

    fn bind_api(&self, _api: u32) -> bool {
        true
    }

    fn create_context(
        &self,
        _display: EglDisplay,
        config: EglConfig,
        _share: Option<EglContextHandle>,
        attributes: &[i32],
    ) -> Option<EglContextHandle> {
        let mut state = self.state.borrow_mut();
        state.egl.last_context_attributes = attributes.to_vec();
        state.egl.last_context_config = Some(config.0);
        if state.egl.create_context_fails {
            return self.fail(EGL_BAD_MATCH);
        }
        let id = state.next_id();
        state.egl.live_contexts += 1;
        state.contexts.created += 1;
        state.record(format!("egl_create_context:{id}"));
        Some(EglContextHandle(id))
    }

    fn destroy_context(&self, _display: EglDisplay, context: EglContextHandle) {
        let mut state = self.state.borrow_mut();
        state.egl.live_contexts -= 1;
        if state.egl.current == Some(context.0) {
            state.egl.current = None;
        }
        state.record(format!("egl_destroy_context:{}", context.0));
    }

    fn create_window_surface(
        &self,
        _display: EglDisplay,
        _config: EglConfig,
        native_window: u64,
        _attributes: &[i32],
    ) -> Option<EglSurface> {
        let mut state = self.state.borrow_mut();
        if state.egl.surface_fails || !state.windows.keys().any(|w| w.0 == native_window) {
            return self.fail(EGL_BAD_NATIVE_WINDOW);
        }
        let id = state.next_id();
        state.egl.live_surfaces += 1;
        Some(EglSurface(id))
    }

    fn destroy_surface(&self, _display: EglDisplay, _surface: EglSurface) {
        self.state.borrow_mut().egl.live_surfaces -= 1;
    }

    fn make_current(
        &self,
        _display: EglDisplay,
        _draw: Option<EglSurface>,
        _read: Option<EglSurface>,
        context: Option<EglContextHandle>,
    ) -> bool {
        let mut state = self.state.borrow_mut();
        state.contexts.make_current_calls += 1;
        state.egl.current = context.map(|c| c.0);
        true
    }

    fn swap_buffers(&self, _display: EglDisplay, _surface: EglSurface) -> bool {
        self.state.borrow_mut().contexts.swaps += 1;
        true
    }

    fn swap_interval(&self, _display: EglDisplay, interval: i32) -> bool {
        let mut state = self.state.borrow_mut();
        if state.egl.swap_interval_fails {
            self.error.set(EGL_BAD_CONTEXT);
            return false;
        }
        state.contexts.swap_interval = interval;
        true
    }

    fn get_proc_address(&self, name: &str) -> Option<ProcAddress> {
        if name.starts_with("egl") {
            return Some(fake_address(name));
        }
        gl_proc_address(&self.state.borrow(), name)
    }
}
