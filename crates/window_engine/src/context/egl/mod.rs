//! # EGL Context Provider
//!
//! Context creation through EGL, built by the engine on top of the
//! [`EglApi`] entry points a backend resolves from the system library.
//!
//! The library is loaded lazily the first time a window asks for an EGL
//! context and shared (`Rc`) between the platform and every [`EglContext`].
//! The display is terminated when the last holder goes away.

mod api;

pub use api::*;

use std::any::Any;
use std::rc::Rc;

use crate::backend::{BackendError, BackendResult, DynamicLibrary, PlatformBackend, ProcAddress};
use crate::context::{
    choose_framebuffer_config, string_in_extension_string, ContextApi, ContextBackend, ContextConfig,
    ContextProfile, ContextReleaseBehavior, ContextRobustness, FramebufferConfig,
};
use crate::error::{EngineError, EngineResult};
use crate::window::WindowBackend;

/// EGL extensions the engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EglExtensions {
    /// `EGL_EXT_client_extensions`
    pub client_extensions: bool,
    /// `EGL_KHR_create_context`
    pub create_context: bool,
    /// `EGL_KHR_create_context_no_error`
    pub create_context_no_error: bool,
    /// `EGL_KHR_gl_colorspace`
    pub gl_colorspace: bool,
    /// `EGL_KHR_get_all_proc_addresses`
    pub get_all_proc_addresses: bool,
    /// `EGL_KHR_context_flush_control`
    pub context_flush_control: bool,
}

impl EglExtensions {
    fn from_display_string(extensions: &str) -> Self {
        Self {
            client_extensions: false,
            create_context: string_in_extension_string("EGL_KHR_create_context", extensions),
            create_context_no_error: string_in_extension_string("EGL_KHR_create_context_no_error", extensions),
            gl_colorspace: string_in_extension_string("EGL_KHR_gl_colorspace", extensions),
            get_all_proc_addresses: string_in_extension_string("EGL_KHR_get_all_proc_addresses", extensions),
            context_flush_control: string_in_extension_string("EGL_KHR_context_flush_control", extensions),
        }
    }
}

/// A loaded and initialized EGL library
pub struct EglLibrary {
    api: Box<dyn EglApi>,
    display: EglDisplay,
    version: (i32, i32),
    prefix: bool,
    extensions: EglExtensions,
    _library: Box<dyn DynamicLibrary>,
}

fn unavailable(message: String) -> EngineError {
    EngineError::ApiUnavailable(message).logged()
}

impl EglLibrary {
    /// Open the first EGL library the platform can find and initialize its display
    pub fn load(platform: &dyn PlatformBackend) -> EngineResult<Self> {
        let library = platform
            .egl_library_names()
            .iter()
            .find_map(|name| platform.open_library(name))
            .ok_or_else(|| unavailable("EGL: Library not found".to_string()))?;

        let prefix = library.name().starts_with("lib");

        let api = platform
            .load_egl(library.as_ref())
            .ok_or_else(|| unavailable("EGL: Failed to load required entry points".to_string()))?;

        let client_extensions =
            api.query_string(None, EGL_EXTENSIONS).is_some() && api.get_error() == EGL_SUCCESS;

        let Some(display) = api.get_display(platform.egl_native_display().0) else {
            return Err(unavailable(format!(
                "EGL: Failed to get EGL display: {}",
                egl_error_string(api.get_error())
            )));
        };

        let Some(version) = api.initialize(display) else {
            let reason = egl_error_string(api.get_error());
            api.terminate(display);
            return Err(unavailable(format!("EGL: Failed to initialize EGL: {reason}")));
        };

        let mut extensions = api
            .query_string(Some(display), EGL_EXTENSIONS)
            .map(|s| EglExtensions::from_display_string(&s))
            .unwrap_or_default();
        extensions.client_extensions = client_extensions;

        log::info!("Loaded EGL {}.{} from {}", version.0, version.1, library.name());
        log::debug!("EGL extensions: {extensions:?}");

        Ok(Self {
            api,
            display,
            version,
            prefix,
            extensions,
            _library: library,
        })
    }

    /// Initialized display
    pub fn display(&self) -> EglDisplay {
        self.display
    }

    /// EGL version reported by `eglInitialize`
    pub fn version(&self) -> (i32, i32) {
        self.version
    }

    /// Extensions detected at load time
    pub fn extensions(&self) -> EglExtensions {
        self.extensions
    }

    fn last_error(&self) -> &'static str {
        egl_error_string(self.api.get_error())
    }

    fn choose_config(&self, context: &ContextConfig, desired: &FramebufferConfig) -> EngineResult<EglConfig> {
        let native = self.api.get_configs(self.display);
        if native.is_empty() {
            return Err(unavailable("EGL: No EGLConfigs returned".to_string()));
        }

        let attrib = |config: EglConfig, name: i32| self.api.get_config_attrib(self.display, config, name).unwrap_or(0);

        let required_renderable = match context.api {
            ContextApi::OpenGlEs if context.major == 1 => EGL_OPENGL_ES_BIT,
            ContextApi::OpenGlEs => EGL_OPENGL_ES2_BIT,
            _ => EGL_OPENGL_BIT,
        };

        let usable: Vec<FramebufferConfig> = native
            .into_iter()
            .filter(|&n| attrib(n, EGL_COLOR_BUFFER_TYPE) == EGL_RGB_BUFFER)
            .filter(|&n| attrib(n, EGL_SURFACE_TYPE) & EGL_WINDOW_BIT != 0)
            .filter(|&n| attrib(n, EGL_RENDERABLE_TYPE) & required_renderable != 0)
            .filter(|&n| attrib(n, EGL_CONFIG_CAVEAT) != EGL_NON_CONFORMANT_CONFIG)
            .map(|n| FramebufferConfig {
                red_bits: attrib(n, EGL_RED_SIZE),
                green_bits: attrib(n, EGL_GREEN_SIZE),
                blue_bits: attrib(n, EGL_BLUE_SIZE),
                alpha_bits: attrib(n, EGL_ALPHA_SIZE),
                depth_bits: attrib(n, EGL_DEPTH_SIZE),
                stencil_bits: attrib(n, EGL_STENCIL_SIZE),
                samples: attrib(n, EGL_SAMPLES),
                double_buffer: true,
                srgb: false,
                handle: n.0,
                ..FramebufferConfig::default()
            })
            .collect();

        if usable.is_empty() {
            return Err(unavailable(
                "EGL: The driver does not appear to support the requested client API".to_string(),
            ));
        }

        choose_framebuffer_config(desired, &usable)
            .map(|closest| EglConfig(closest.handle))
            .ok_or_else(|| EngineError::FormatUnavailable("EGL: Failed to find a suitable EGLConfig".to_string()).logged())
    }

    fn open_client_library(&self, platform: &dyn PlatformBackend, context: &ContextConfig) -> Option<Box<dyn DynamicLibrary>> {
        let names = match context.api {
            ContextApi::OpenGlEs if context.major == 1 => platform.gles1_library_names(),
            ContextApi::OpenGlEs => platform.gles2_library_names(),
            _ => platform.gl_library_names(),
        };

        names
            .iter()
            // Pair lib-prefixed client libraries with a lib-prefixed EGL
            .filter(|name| name.starts_with("lib") == self.prefix)
            .find_map(|name| platform.open_library(name))
    }

    /// Create a context and window surface for `window`
    pub fn create_context(
        self: &Rc<Self>,
        platform: &dyn PlatformBackend,
        window: &dyn WindowBackend,
        framebuffer: &FramebufferConfig,
        context: &ContextConfig,
        share: Option<&dyn ContextBackend>,
    ) -> EngineResult<Box<dyn ContextBackend>> {
        let share = share
            .and_then(|s| s.as_any().downcast_ref::<EglContext>())
            .and_then(|s| s.handle);

        let config = self.choose_config(context, framebuffer)?;

        let bound = match context.api {
            ContextApi::OpenGlEs => self.api.bind_api(EGL_OPENGL_ES_API),
            _ => self.api.bind_api(EGL_OPENGL_API),
        };
        if !bound {
            return Err(unavailable(format!("EGL: Failed to bind client API: {}", self.last_error())));
        }

        let attributes = context_attributes(context, &self.extensions);
        let Some(handle) = self.api.create_context(self.display, config, share, &attributes) else {
            return Err(EngineError::VersionUnavailable(format!(
                "EGL: Failed to create context: {}",
                self.last_error()
            ))
            .logged());
        };

        let surface_attributes = surface_attributes(framebuffer, &self.extensions);
        let Some(surface) =
            self.api
                .create_window_surface(self.display, config, window.egl_native_window().0, &surface_attributes)
        else {
            let reason = self.last_error();
            self.api.destroy_context(self.display, handle);
            return Err(EngineError::PlatformError(BackendError::Failed(format!(
                "EGL: Failed to create window surface: {reason}"
            )))
            .logged());
        };

        let client = if self.extensions.get_all_proc_addresses {
            None
        } else {
            let Some(client) = self.open_client_library(platform, context) else {
                self.api.destroy_surface(self.display, surface);
                self.api.destroy_context(self.display, handle);
                return Err(unavailable("EGL: Failed to load client library".to_string()));
            };
            Some(client)
        };

        Ok(Box::new(EglContext {
            egl: Rc::clone(self),
            handle: Some(handle),
            config,
            surface: Some(surface),
            client,
        }))
    }
}

impl Drop for EglLibrary {
    fn drop(&mut self) {
        self.api.terminate(self.display);
        log::debug!("EGL display terminated");
    }
}

/// Attribute list for `eglCreateContext`
pub fn context_attributes(context: &ContextConfig, extensions: &EglExtensions) -> Vec<i32> {
    let mut attributes = Vec::new();

    if extensions.create_context {
        let mut mask = 0;
        let mut flags = 0;

        if context.api == ContextApi::OpenGl {
            if context.forward {
                flags |= EGL_CONTEXT_OPENGL_FORWARD_COMPATIBLE_BIT_KHR;
            }
            match context.profile {
                ContextProfile::Core => mask |= EGL_CONTEXT_OPENGL_CORE_PROFILE_BIT_KHR,
                ContextProfile::Compatibility => mask |= EGL_CONTEXT_OPENGL_COMPATIBILITY_PROFILE_BIT_KHR,
                ContextProfile::Any => {}
            }
        }

        if context.debug {
            flags |= EGL_CONTEXT_OPENGL_DEBUG_BIT_KHR;
        }

        if context.robustness != ContextRobustness::None {
            let strategy = if context.robustness == ContextRobustness::NoResetNotification {
                EGL_NO_RESET_NOTIFICATION_KHR
            } else {
                EGL_LOSE_CONTEXT_ON_RESET_KHR
            };
            attributes.extend([EGL_CONTEXT_OPENGL_RESET_NOTIFICATION_STRATEGY_KHR, strategy]);
            flags |= EGL_CONTEXT_OPENGL_ROBUST_ACCESS_BIT_KHR;
        }

        if context.no_error && extensions.create_context_no_error {
            attributes.extend([EGL_CONTEXT_OPENGL_NO_ERROR_KHR, 1]);
        }

        if context.major != 1 || context.minor != 0 {
            attributes.extend([EGL_CONTEXT_MAJOR_VERSION_KHR, context.major]);
            attributes.extend([EGL_CONTEXT_MINOR_VERSION_KHR, context.minor]);
        }

        if mask != 0 {
            attributes.extend([EGL_CONTEXT_OPENGL_PROFILE_MASK_KHR, mask]);
        }
        if flags != 0 {
            attributes.extend([EGL_CONTEXT_FLAGS_KHR, flags]);
        }
    } else if context.api == ContextApi::OpenGlEs {
        attributes.extend([EGL_CONTEXT_CLIENT_VERSION, context.major]);
    }

    if extensions.context_flush_control {
        match context.release {
            ContextReleaseBehavior::None => {
                attributes.extend([EGL_CONTEXT_RELEASE_BEHAVIOR_KHR, EGL_CONTEXT_RELEASE_BEHAVIOR_NONE_KHR]);
            }
            ContextReleaseBehavior::Flush => {
                attributes.extend([EGL_CONTEXT_RELEASE_BEHAVIOR_KHR, EGL_CONTEXT_RELEASE_BEHAVIOR_FLUSH_KHR]);
            }
            ContextReleaseBehavior::Any => {}
        }
    }

    attributes.push(EGL_NONE);
    attributes
}

/// Attribute list for `eglCreateWindowSurface`
pub fn surface_attributes(framebuffer: &FramebufferConfig, extensions: &EglExtensions) -> Vec<i32> {
    let mut attributes = Vec::new();
    if framebuffer.srgb && extensions.gl_colorspace {
        attributes.extend([EGL_GL_COLORSPACE_KHR, EGL_GL_COLORSPACE_SRGB_KHR]);
    }
    attributes.push(EGL_NONE);
    attributes
}

/// An EGL context and its window surface
pub struct EglContext {
    egl: Rc<EglLibrary>,
    handle: Option<EglContextHandle>,
    config: EglConfig,
    surface: Option<EglSurface>,
    client: Option<Box<dyn DynamicLibrary>>,
}

impl EglContext {
    /// Config the context was created with
    pub fn config(&self) -> EglConfig {
        self.config
    }

    /// Raw context handle, `None` once destroyed
    pub fn handle(&self) -> Option<EglContextHandle> {
        self.handle
    }
}

impl ContextBackend for EglContext {
    fn make_current(&mut self) -> BackendResult<()> {
        if self.egl.api.make_current(self.egl.display, self.surface, self.surface, self.handle) {
            Ok(())
        } else {
            Err(BackendError::Failed(format!(
                "EGL: Failed to make context current: {}",
                self.egl.last_error()
            )))
        }
    }

    fn release_current(&mut self) -> BackendResult<()> {
        if self.egl.api.make_current(self.egl.display, None, None, None) {
            Ok(())
        } else {
            Err(BackendError::Failed(format!(
                "EGL: Failed to clear current context: {}",
                self.egl.last_error()
            )))
        }
    }

    fn swap_buffers(&mut self) -> BackendResult<()> {
        let surface = self
            .surface
            .ok_or_else(|| BackendError::Failed("EGL: Context has no surface".to_string()))?;
        if self.egl.api.swap_buffers(self.egl.display, surface) {
            Ok(())
        } else {
            Err(BackendError::Failed(format!("EGL: Failed to swap buffers: {}", self.egl.last_error())))
        }
    }

    fn swap_interval(&mut self, interval: i32) -> BackendResult<()> {
        if !self.egl.api.swap_interval(self.egl.display, interval) {
            log::warn!("EGL: Failed to set swap interval {interval}: {}", self.egl.last_error());
        }
        Ok(())
    }

    fn platform_extension_supported(&self, name: &str) -> bool {
        self.egl
            .api
            .query_string(Some(self.egl.display), EGL_EXTENSIONS)
            .is_some_and(|extensions| string_in_extension_string(name, &extensions))
    }

    fn proc_address(&self, name: &str) -> Option<ProcAddress> {
        self.client
            .as_ref()
            .and_then(|client| client.symbol(name))
            .or_else(|| self.egl.api.get_proc_address(name))
    }

    fn destroy(&mut self) {
        self.client = None;
        if let Some(surface) = self.surface.take() {
            self.egl.api.destroy_surface(self.egl.display, surface);
        }
        if let Some(handle) = self.handle.take() {
            self.egl.api.destroy_context(self.egl.display, handle);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_extensions() -> EglExtensions {
        EglExtensions {
            client_extensions: true,
            create_context: true,
            create_context_no_error: true,
            gl_colorspace: true,
            get_all_proc_addresses: true,
            context_flush_control: true,
        }
    }

    #[test]
    fn test_default_request_is_just_terminator() {
        let attributes = context_attributes(&ContextConfig::default(), &all_extensions());
        assert_eq!(attributes, vec![EGL_NONE]);
    }

    #[test]
    fn test_khr_create_context_attributes() {
        let context = ContextConfig::default()
            .with_version(ContextApi::OpenGl, 4, 5)
            .with_profile(ContextProfile::Core)
            .with_forward(true)
            .with_debug(true)
            .with_robustness(ContextRobustness::LoseContextOnReset);

        let attributes = context_attributes(&context, &all_extensions());
        assert_eq!(
            attributes,
            vec![
                EGL_CONTEXT_OPENGL_RESET_NOTIFICATION_STRATEGY_KHR,
                EGL_LOSE_CONTEXT_ON_RESET_KHR,
                EGL_CONTEXT_MAJOR_VERSION_KHR,
                4,
                EGL_CONTEXT_MINOR_VERSION_KHR,
                5,
                EGL_CONTEXT_OPENGL_PROFILE_MASK_KHR,
                EGL_CONTEXT_OPENGL_CORE_PROFILE_BIT_KHR,
                EGL_CONTEXT_FLAGS_KHR,
                EGL_CONTEXT_OPENGL_FORWARD_COMPATIBLE_BIT_KHR
                    | EGL_CONTEXT_OPENGL_DEBUG_BIT_KHR
                    | EGL_CONTEXT_OPENGL_ROBUST_ACCESS_BIT_KHR,
                EGL_NONE,
            ]
        );
    }

    #[test]
    fn test_es_forward_and_profile_are_ignored() {
        let mut context = ContextConfig::default().with_version(ContextApi::OpenGlEs, 3, 0);
        context.forward = true;
        context.profile = ContextProfile::Core;

        let attributes = context_attributes(&context, &all_extensions());
        assert_eq!(
            attributes,
            vec![EGL_CONTEXT_MAJOR_VERSION_KHR, 3, EGL_CONTEXT_MINOR_VERSION_KHR, 0, EGL_NONE]
        );
    }

    #[test]
    fn test_es_client_version_without_khr_create_context() {
        let context = ContextConfig::default().with_version(ContextApi::OpenGlEs, 2, 0);
        let attributes = context_attributes(&context, &EglExtensions::default());
        assert_eq!(attributes, vec![EGL_CONTEXT_CLIENT_VERSION, 2, EGL_NONE]);

        let desktop = ContextConfig::default().with_version(ContextApi::OpenGl, 3, 3);
        assert_eq!(context_attributes(&desktop, &EglExtensions::default()), vec![EGL_NONE]);
    }

    #[test]
    fn test_no_error_needs_extension() {
        let mut context = ContextConfig::default();
        context.no_error = true;

        let mut extensions = all_extensions();
        assert_eq!(
            context_attributes(&context, &extensions),
            vec![EGL_CONTEXT_OPENGL_NO_ERROR_KHR, 1, EGL_NONE]
        );
        extensions.create_context_no_error = false;
        assert_eq!(context_attributes(&context, &extensions), vec![EGL_NONE]);
    }

    #[test]
    fn test_release_behavior() {
        let mut context = ContextConfig::default();
        context.release = ContextReleaseBehavior::None;
        assert_eq!(
            context_attributes(&context, &all_extensions()),
            vec![EGL_CONTEXT_RELEASE_BEHAVIOR_KHR, EGL_CONTEXT_RELEASE_BEHAVIOR_NONE_KHR, EGL_NONE]
        );
        context.release = ContextReleaseBehavior::Flush;
        assert_eq!(
            context_attributes(&context, &all_extensions()),
            vec![EGL_CONTEXT_RELEASE_BEHAVIOR_KHR, EGL_CONTEXT_RELEASE_BEHAVIOR_FLUSH_KHR, EGL_NONE]
        );
    }

    #[test]
    fn test_srgb_surface_needs_colorspace() {
        let framebuffer = FramebufferConfig::default();
        assert_eq!(
            surface_attributes(&framebuffer, &all_extensions()),
            vec![EGL_GL_COLORSPACE_KHR, EGL_GL_COLORSPACE_SRGB_KHR, EGL_NONE]
        );
        assert_eq!(surface_attributes(&framebuffer, &EglExtensions::default()), vec![EGL_NONE]);
        assert_eq!(
            surface_attributes(&framebuffer.with_srgb(false), &all_extensions()),
            vec![EGL_NONE]
        );
    }

    #[test]
    fn test_extension_parsing_is_exact() {
        let parsed = EglExtensions::from_display_string("EGL_KHR_create_context_no_error EGL_KHR_gl_colorspace");
        assert!(!parsed.create_context);
        assert!(parsed.create_context_no_error);
        assert!(parsed.gl_colorspace);
        assert!(!parsed.context_flush_control);
    }

    #[test]
    fn test_error_strings() {
        assert_eq!(egl_error_string(EGL_SUCCESS), "Success");
        assert_eq!(egl_error_string(EGL_BAD_MATCH), "Arguments are inconsistent");
        assert_eq!(egl_error_string(0x1234), "Unknown EGL error");
    }
}
