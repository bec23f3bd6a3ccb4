//! # Backend Module
//!
//! This module defines the contract between the engine and a concrete OS
//! windowing stack, and ships the in-memory `headless` implementation.
//!
//! ## Organization
//!
//! - **`PlatformBackend`**: process-level primitives (event pump, clock,
//!   clipboard, key names, monitor enumeration, object creation, library loading)
//! - **Per-object traits**: `WindowBackend`, `MonitorBackend`, `ContextBackend`
//!   and `CursorBackend` live next to the engine types that own them
//! - **Headless**: a scriptable backend with no OS dependency
//!
//! ## Design Principles
//!
//! - **Abstraction**: The engine holds boxed trait objects, never backend types
//! - **Primitive operations**: Validation, state machines and negotiation stay in
//!   the engine; backends only translate to and from the OS
//! - **Error Propagation**: Backend failures surface as [`BackendError`]

pub mod events;
pub mod headless;

use image::RgbaImage;
use thiserror::Error;

use crate::context::egl::EglApi;
use crate::context::{ContextBackend, ContextConfig, FramebufferConfig, GlFunctions};
use crate::cursor::CursorBackend;
use crate::input::{CursorShape, Key};
use crate::monitor::MonitorBackend;
use crate::window::{Rect, WindowBackend, WindowConfig};

pub use events::{BackendEvent, WindowEvent};

/// Backend failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// An OS call failed
    #[error("{0}")]
    Failed(String),

    /// A library or entry point could not be loaded
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// The backend does not implement the operation
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Opaque native object handle (window handle, display connection, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeHandle(pub u64);

/// Address of a resolved function, to be cast by whoever owns its signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcAddress(pub usize);

/// A loaded dynamic library; closed when dropped
pub trait DynamicLibrary {
    /// File name the library was opened under
    fn name(&self) -> &str;

    /// Resolve an exported symbol
    fn symbol(&self, name: &str) -> Option<ProcAddress>;
}

/// Everything needed to build a native window
pub struct WindowRequest<'a> {
    /// Initial title
    pub title: &'a str,
    /// Requested content width
    pub width: i32,
    /// Requested content height
    pub height: i32,
    /// Presentation hints
    pub window: &'a WindowConfig,
    /// Desired framebuffer, for backends that pick a visual at window creation
    pub framebuffer: &'a FramebufferConfig,
    /// Requested context, for backends that need it before the window exists
    pub context: &'a ContextConfig,
    /// Monitor area to cover when the window starts fullscreen
    pub fullscreen: Option<Rect>,
}

/// A monitor reported by [`PlatformBackend::monitors`]
pub struct MonitorDescriptor {
    /// Human readable name; identical models may share it
    pub name: String,
    /// Stable OS device key, unique among connected monitors and used to match
    /// monitors across re-enumeration
    pub device: String,
    /// Physical width in millimeters
    pub width_mm: i32,
    /// Physical height in millimeters
    pub height_mm: i32,
    /// Whether the OS considers this the primary monitor
    pub primary: bool,
    /// Backend half of the monitor
    pub backend: Box<dyn MonitorBackend>,
}

/// EGL library names tried in order
pub const DEFAULT_EGL_LIBRARIES: &[&str] = &["libEGL.so.1", "libEGL.dll", "EGL.dll"];
/// OpenGL ES 1.x client library names
pub const DEFAULT_GLES1_LIBRARIES: &[&str] = &["libGLESv1_CM.so.1", "libGLES_CM.so.1", "GLESv1_CM.dll", "libGLES_CM.dll"];
/// OpenGL ES 2.0+ client library names
pub const DEFAULT_GLES2_LIBRARIES: &[&str] = &["libGLESv2.so.2", "GLESv2.dll", "libGLESv2.dll"];
/// Desktop OpenGL client library names
pub const DEFAULT_GL_LIBRARIES: &[&str] = &["libOpenGL.so.0", "libGL.so.1"];

/// # Platform Backend Trait
///
/// Process-level primitives an OS backend provides. The engine owns exactly one
/// boxed implementation inside [`crate::Platform`] and calls it from the thread
/// that created the platform.
///
/// ## Implementation Notes
///
/// Backends should:
/// - Report input and window changes as [`BackendEvent`]s from the pump methods
///   instead of calling into the engine
/// - Leave validation to the engine; arguments arriving here are already checked
/// - Tag window events with the [`NativeHandle`] of the window they belong to
pub trait PlatformBackend {
    /// Bring the backend up
    fn init(&mut self) -> BackendResult<()>;

    /// Tear the backend down; every engine object is gone by now
    fn terminate(&mut self);

    /// Drain pending events without blocking
    fn poll_events(&mut self) -> Vec<BackendEvent>;

    /// Block until at least one event is available, then drain
    fn wait_events(&mut self) -> Vec<BackendEvent>;

    /// Block for at most `timeout` seconds, then drain
    fn wait_events_timeout(&mut self, timeout: f64) -> Vec<BackendEvent>;

    /// Wake a thread blocked in one of the wait methods
    fn post_empty_event(&mut self);

    /// Raw monotonic tick counter
    fn timer_value(&self) -> u64;

    /// Ticks per second of [`Self::timer_value`]
    fn timer_frequency(&self) -> u64;

    /// Replace the system clipboard text
    fn set_clipboard_string(&mut self, text: &str);

    /// Current system clipboard text
    fn clipboard_string(&mut self) -> Option<String>;

    /// Layout-dependent name of the key with `scancode`
    fn scancode_name(&self, scancode: i32) -> Option<String>;

    /// Platform scancode of `key`, or `-1`
    fn key_scancode(&self, key: Key) -> i32;

    /// Whether unaccelerated mouse motion can be delivered
    fn raw_mouse_motion_supported(&self) -> bool;

    /// Enumerate connected monitors
    fn monitors(&mut self) -> Vec<MonitorDescriptor>;

    /// Create a native window
    fn create_window(&mut self, request: &WindowRequest<'_>) -> BackendResult<Box<dyn WindowBackend>>;

    /// Pixel formats usable for a native context on `window`
    fn native_framebuffer_configs(
        &mut self,
        window: &dyn WindowBackend,
        context: &ContextConfig,
    ) -> BackendResult<Vec<FramebufferConfig>>;

    /// Create a native context on `window` with the pixel format the engine chose
    fn create_native_context(
        &mut self,
        window: &mut dyn WindowBackend,
        framebuffer: &FramebufferConfig,
        context: &ContextConfig,
        share: Option<&dyn ContextBackend>,
    ) -> BackendResult<Box<dyn ContextBackend>>;

    /// Turn resolved GL entry points into callable query functions
    ///
    /// `resolve` looks names up through the current context.
    fn bind_gl_functions(
        &self,
        resolve: &dyn Fn(&str) -> Option<ProcAddress>,
    ) -> Option<Box<dyn GlFunctions>>;

    /// Create a cursor from an RGBA image with the given hotspot
    fn create_cursor(&mut self, image: &RgbaImage, xhot: i32, yhot: i32) -> BackendResult<Box<dyn CursorBackend>>;

    /// Create a cursor with a system shape
    fn create_standard_cursor(&mut self, shape: CursorShape) -> BackendResult<Box<dyn CursorBackend>>;

    /// Bring up joystick polling
    fn init_joysticks(&mut self) -> bool;

    /// Shut joystick polling down
    fn terminate_joysticks(&mut self);

    /// Open a dynamic library
    fn open_library(&self, name: &str) -> Option<Box<dyn DynamicLibrary>>;

    /// Bind the EGL entry points exported by `library`
    fn load_egl(&self, library: &dyn DynamicLibrary) -> Option<Box<dyn EglApi>>;

    /// Native display handed to `eglGetDisplay`
    fn egl_native_display(&self) -> NativeHandle {
        NativeHandle::default()
    }

    /// EGL library names to try
    fn egl_library_names(&self) -> &[&'static str] {
        DEFAULT_EGL_LIBRARIES
    }

    /// OpenGL ES 1.x client library names
    fn gles1_library_names(&self) -> &[&'static str] {
        DEFAULT_GLES1_LIBRARIES
    }

    /// OpenGL ES 2.0+ client library names
    fn gles2_library_names(&self) -> &[&'static str] {
        DEFAULT_GLES2_LIBRARIES
    }

    /// Desktop OpenGL client library names
    fn gl_library_names(&self) -> &[&'static str] {
        DEFAULT_GL_LIBRARIES
    }
}
