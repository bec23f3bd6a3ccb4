//! EGL entry points and constants

#![allow(missing_docs)]

use crate::backend::ProcAddress;

/// `EGLDisplay`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EglDisplay(pub u64);

/// `EGLConfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EglConfig(pub u64);

/// `EGLContext`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EglContextHandle(pub u64);

/// `EGLSurface`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EglSurface(pub u64);

pub const EGL_SUCCESS: i32 = 0x3000;
pub const EGL_NOT_INITIALIZED: i32 = 0x3001;
pub const EGL_BAD_ACCESS: i32 = 0x3002;
pub const EGL_BAD_ALLOC: i32 = 0x3003;
pub const EGL_BAD_ATTRIBUTE: i32 = 0x3004;
pub const EGL_BAD_CONFIG: i32 = 0x3005;
pub const EGL_BAD_CONTEXT: i32 = 0x3006;
pub const EGL_BAD_CURRENT_SURFACE: i32 = 0x3007;
pub const EGL_BAD_DISPLAY: i32 = 0x3008;
pub const EGL_BAD_MATCH: i32 = 0x3009;
pub const EGL_BAD_NATIVE_PIXMAP: i32 = 0x300A;
pub const EGL_BAD_NATIVE_WINDOW: i32 = 0x300B;
pub const EGL_BAD_PARAMETER: i32 = 0x300C;
pub const EGL_BAD_SURFACE: i32 = 0x300D;
pub const EGL_CONTEXT_LOST: i32 = 0x300E;

pub const EGL_ALPHA_SIZE: i32 = 0x3021;
pub const EGL_BLUE_SIZE: i32 = 0x3022;
pub const EGL_GREEN_SIZE: i32 = 0x3023;
pub const EGL_RED_SIZE: i32 = 0x3024;
pub const EGL_DEPTH_SIZE: i32 = 0x3025;
pub const EGL_STENCIL_SIZE: i32 = 0x3026;
pub const EGL_CONFIG_CAVEAT: i32 = 0x3027;
pub const EGL_SAMPLES: i32 = 0x3031;
pub const EGL_SURFACE_TYPE: i32 = 0x3033;
pub const EGL_NONE: i32 = 0x3038;
pub const EGL_COLOR_BUFFER_TYPE: i32 = 0x303F;
pub const EGL_RENDERABLE_TYPE: i32 = 0x3040;
pub const EGL_SLOW_CONFIG: i32 = 0x3050;
pub const EGL_NON_CONFORMANT_CONFIG: i32 = 0x3051;
pub const EGL_EXTENSIONS: i32 = 0x3055;
pub const EGL_RGB_BUFFER: i32 = 0x308E;

pub const EGL_WINDOW_BIT: i32 = 0x0004;
pub const EGL_OPENGL_ES_BIT: i32 = 0x0001;
pub const EGL_OPENGL_ES2_BIT: i32 = 0x0004;
pub const EGL_OPENGL_BIT: i32 = 0x0008;

pub const EGL_OPENGL_ES_API: u32 = 0x30A0;
pub const EGL_OPENGL_API: u32 = 0x30A2;

pub const EGL_CONTEXT_CLIENT_VERSION: i32 = 0x3098;
pub const EGL_CONTEXT_MAJOR_VERSION_KHR: i32 = 0x3098;
pub const EGL_CONTEXT_MINOR_VERSION_KHR: i32 = 0x30FB;
pub const EGL_CONTEXT_FLAGS_KHR: i32 = 0x30FC;
pub const EGL_CONTEXT_OPENGL_PROFILE_MASK_KHR: i32 = 0x30FD;
pub const EGL_CONTEXT_OPENGL_DEBUG_BIT_KHR: i32 = 0x0001;
pub const EGL_CONTEXT_OPENGL_FORWARD_COMPATIBLE_BIT_KHR: i32 = 0x0002;
pub const EGL_CONTEXT_OPENGL_ROBUST_ACCESS_BIT_KHR: i32 = 0x0004;
pub const EGL_CONTEXT_OPENGL_CORE_PROFILE_BIT_KHR: i32 = 0x0001;
pub const EGL_CONTEXT_OPENGL_COMPATIBILITY_PROFILE_BIT_KHR: i32 = 0x0002;
pub const EGL_CONTEXT_OPENGL_RESET_NOTIFICATION_STRATEGY_KHR: i32 = 0x31BD;
pub const EGL_NO_RESET_NOTIFICATION_KHR: i32 = 0x31BE;
pub const EGL_LOSE_CONTEXT_ON_RESET_KHR: i32 = 0x31BF;
pub const EGL_CONTEXT_OPENGL_NO_ERROR_KHR: i32 = 0x31B3;
pub const EGL_GL_COLORSPACE_KHR: i32 = 0x309D;
pub const EGL_GL_COLORSPACE_SRGB_KHR: i32 = 0x3089;
pub const EGL_CONTEXT_RELEASE_BEHAVIOR_KHR: i32 = 0x2097;
pub const EGL_CONTEXT_RELEASE_BEHAVIOR_NONE_KHR: i32 = 0;
pub const EGL_CONTEXT_RELEASE_BEHAVIOR_FLUSH_KHR: i32 = 0x2098;

/// The EGL entry points, resolved by the platform backend from a loaded library
///
/// Methods mirror the C API. Null handles are `None`, `EGLBoolean` results
/// are `bool`, and attribute lists are `EGL_NONE` terminated.
pub trait EglApi {
    /// `eglGetError`
    fn get_error(&self) -> i32;

    /// `eglGetDisplay`
    fn get_display(&self, native_display: u64) -> Option<EglDisplay>;

    /// `eglInitialize`, returning the EGL version
    fn initialize(&self, display: EglDisplay) -> Option<(i32, i32)>;

    /// `eglTerminate`
    fn terminate(&self, display: EglDisplay);

    /// `eglQueryString`; `None` display queries client extensions
    fn query_string(&self, display: Option<EglDisplay>, name: i32) -> Option<String>;

    /// `eglGetConfigs`
    fn get_configs(&self, display: EglDisplay) -> Vec<EglConfig>;

    /// `eglGetConfigAttrib`
    fn get_config_attrib(&self, display: EglDisplay, config: EglConfig, attribute: i32) -> Option<i32>;

    /// `eglBindAPI`
    fn bind_api(&self, api: u32) -> bool;

    /// `eglCreateContext`
    fn create_context(
        &self,
        display: EglDisplay,
        config: EglConfig,
        share: Option<EglContextHandle>,
        attributes: &[i32],
    ) -> Option<EglContextHandle>;

    /// `eglDestroyContext`
    fn destroy_context(&self, display: EglDisplay, context: EglContextHandle);

    /// `eglCreateWindowSurface`
    fn create_window_surface(
        &self,
        display: EglDisplay,
        config: EglConfig,
        native_window: u64,
        attributes: &[i32],
    ) -> Option<EglSurface>;

    /// `eglDestroySurface`
    fn destroy_surface(&self, display: EglDisplay, surface: EglSurface);

    /// `eglMakeCurrent`
    fn make_current(
        &self,
        display: EglDisplay,
        draw: Option<EglSurface>,
        read: Option<EglSurface>,
        context: Option<EglContextHandle>,
    ) -> bool;

    /// `eglSwapBuffers`
    fn swap_buffers(&self, display: EglDisplay, surface: EglSurface) -> bool;

    /// `eglSwapInterval`
    fn swap_interval(&self, display: EglDisplay, interval: i32) -> bool;

    /// `eglGetProcAddress`
    fn get_proc_address(&self, name: &str) -> Option<ProcAddress>;
}

/// Human readable description of an EGL error code
pub fn egl_error_string(error: i32) -> &'static str {
    match error {
        EGL_SUCCESS => "Success",
        EGL_NOT_INITIALIZED => "EGL is not or could not be initialized",
        EGL_BAD_ACCESS => "EGL cannot access a requested resource",
        EGL_BAD_ALLOC => "EGL failed to allocate resources for the requested operation",
        EGL_BAD_ATTRIBUTE => "An unrecognized attribute or attribute value was passed in the attribute list",
        EGL_BAD_CONTEXT => "An EGLContext argument does not name a valid EGL rendering context",
        EGL_BAD_CONFIG => "An EGLConfig argument does not name a valid EGL frame buffer configuration",
        EGL_BAD_CURRENT_SURFACE => {
            "The current surface of the calling thread is a window, pixel buffer or pixmap that is no longer valid"
        }
        EGL_BAD_DISPLAY => "An EGLDisplay argument does not name a valid EGL display connection",
        EGL_BAD_SURFACE => "An EGLSurface argument does not name a valid surface configured for GL rendering",
        EGL_BAD_MATCH => "Arguments are inconsistent",
        EGL_BAD_PARAMETER => "One or more argument values are invalid",
        EGL_BAD_NATIVE_PIXMAP => "A NativePixmapType argument does not refer to a valid native pixmap",
        EGL_BAD_NATIVE_WINDOW => "A NativeWindowType argument does not refer to a valid native window",
        EGL_CONTEXT_LOST => "The application must destroy all contexts and reinitialize",
        _ => "Unknown EGL error",
    }
}
