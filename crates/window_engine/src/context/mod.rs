//! # Rendering Contexts
//!
//! A [`Context`] is the engine-side half of an OpenGL or OpenGL ES context bound
//! to a window. The backend half is either a native context created by the
//! platform backend, or an [`egl::EglContext`] built by the engine on top of a
//! backend-loaded EGL library.
//!
//! ## Lifecycle
//!
//! 1. The platform collects offered framebuffer configurations and runs
//!    [`choose_framebuffer_config`]
//! 2. The backend (or the EGL layer) creates the context
//! 3. [`Context::refresh_attributes`] reads back what the driver actually
//!    granted, while the context is temporarily current
//! 4. Dropping the context releases the current-context slot if it still
//!    points at the owning window, then destroys the backend half

mod backend;
pub mod current;
pub mod egl;
pub mod extensions;
pub mod framebuffer;

pub use backend::{ContextBackend, GlFunctions};
pub use current::ContextSlot;
pub use extensions::string_in_extension_string;
pub use framebuffer::{choose_framebuffer_config, FramebufferConfig};

use serde::{Deserialize, Serialize};

use crate::backend::{BackendError, PlatformBackend, ProcAddress};
use crate::error::{EngineError, EngineResult};
use crate::foundation::collections::WindowId;
use extensions::{
    parse_version_string, GL_COLOR_BUFFER_BIT, GL_CONTEXT_COMPATIBILITY_PROFILE_BIT,
    GL_CONTEXT_CORE_PROFILE_BIT, GL_CONTEXT_FLAGS, GL_CONTEXT_FLAG_DEBUG_BIT,
    GL_CONTEXT_FLAG_FORWARD_COMPATIBLE_BIT, GL_CONTEXT_FLAG_NO_ERROR_BIT_KHR,
    GL_CONTEXT_PROFILE_MASK, GL_CONTEXT_RELEASE_BEHAVIOR, GL_CONTEXT_RELEASE_BEHAVIOR_FLUSH,
    GL_EXTENSIONS, GL_LOSE_CONTEXT_ON_RESET_ARB, GL_NO_RESET_NOTIFICATION_ARB,
    GL_NUM_EXTENSIONS, GL_RESET_NOTIFICATION_STRATEGY_ARB, GL_VERSION,
};

/// Client API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContextApi {
    /// No context
    None,
    /// Desktop OpenGL
    #[default]
    OpenGl,
    /// OpenGL ES
    OpenGlEs,
}

/// Context creation API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContextType {
    /// The platform's own context API (WGL, GLX, NSGL ...)
    #[default]
    Native,
    /// EGL
    Egl,
}

/// OpenGL profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContextProfile {
    /// Whatever the driver picks
    #[default]
    Any,
    /// Core profile
    Core,
    /// Compatibility profile
    Compatibility,
}

/// Robustness strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContextRobustness {
    /// No robustness
    #[default]
    None,
    /// Robust access without reset notification
    NoResetNotification,
    /// Robust access, context lost on reset
    LoseContextOnReset,
}

/// Behavior when the context is released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContextReleaseBehavior {
    /// Driver default
    #[default]
    Any,
    /// Flush the pipeline
    Flush,
    /// Do nothing
    None,
}

/// Requested context properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Client API, or [`ContextApi::None`] for a window without a context
    pub api: ContextApi,
    /// Creation API
    pub kind: ContextType,
    /// Minimum major version
    pub major: i32,
    /// Minimum minor version
    pub minor: i32,
    /// Forward-compatible OpenGL context
    pub forward: bool,
    /// Debug context
    pub debug: bool,
    /// Context that does not report errors
    pub no_error: bool,
    /// OpenGL profile
    pub profile: ContextProfile,
    /// Robustness strategy
    pub robustness: ContextRobustness,
    /// Release behavior
    pub release: ContextReleaseBehavior,
    /// Window whose context objects are shared
    #[serde(skip)]
    pub share: Option<WindowId>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            api: ContextApi::OpenGl,
            kind: ContextType::Native,
            major: 1,
            minor: 0,
            forward: false,
            debug: false,
            no_error: false,
            profile: ContextProfile::Any,
            robustness: ContextRobustness::None,
            release: ContextReleaseBehavior::Any,
            share: None,
        }
    }
}

impl ContextConfig {
    /// Request a client API and version
    pub fn with_version(mut self, api: ContextApi, major: i32, minor: i32) -> Self {
        self.api = api;
        self.major = major;
        self.minor = minor;
        self
    }

    /// Select the creation API
    pub fn with_kind(mut self, kind: ContextType) -> Self {
        self.kind = kind;
        self
    }

    /// Request an OpenGL profile
    pub fn with_profile(mut self, profile: ContextProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Request a forward-compatible context
    pub fn with_forward(mut self, forward: bool) -> Self {
        self.forward = forward;
        self
    }

    /// Request a debug context
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Request a robustness strategy
    pub fn with_robustness(mut self, robustness: ContextRobustness) -> Self {
        self.robustness = robustness;
        self
    }

    /// Share objects with another window's context
    pub fn with_share(mut self, share: Option<WindowId>) -> Self {
        self.share = share;
        self
    }

    /// Check that the requested version exists and the options fit together
    pub fn validate(&self) -> EngineResult<()> {
        let (major, minor) = (self.major, self.minor);

        match self.api {
            ContextApi::None => {
                if self.share.is_some() {
                    return Err(EngineError::InvalidArgument(
                        "A window without a context cannot share one".to_string(),
                    ));
                }
                Ok(())
            }
            ContextApi::OpenGl => {
                if major < 1
                    || minor < 0
                    || (major == 1 && minor > 5)
                    || (major == 2 && minor > 1)
                    || (major == 3 && minor > 3)
                {
                    return Err(EngineError::InvalidValue(format!("Invalid OpenGL version {major}.{minor}")));
                }

                if self.profile != ContextProfile::Any && (major <= 2 || (major == 3 && minor < 2)) {
                    return Err(EngineError::InvalidValue(
                        "Context profiles are only defined for OpenGL version 3.2 and above".to_string(),
                    ));
                }

                if self.forward && major <= 2 {
                    return Err(EngineError::InvalidValue(
                        "Forward-compatibility is only defined for OpenGL version 3.0 and above".to_string(),
                    ));
                }
                Ok(())
            }
            ContextApi::OpenGlEs => {
                if major < 1 || minor < 0 || (major == 1 && minor > 1) || (major == 2 && minor > 0) {
                    return Err(EngineError::InvalidValue(format!("Invalid OpenGL ES version {major}.{minor}")));
                }
                if self.profile != ContextProfile::Any {
                    return Err(EngineError::InvalidArgument(
                        "Context profiles are not defined for OpenGL ES".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// What the driver actually granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextAttributes {
    /// Client API
    pub api: ContextApi,
    /// Creation API
    pub kind: ContextType,
    /// Major version
    pub major: i32,
    /// Minor version
    pub minor: i32,
    /// Revision
    pub revision: i32,
    /// Forward-compatible
    pub forward: bool,
    /// Debug context
    pub debug: bool,
    /// No-error context
    pub no_error: bool,
    /// Profile
    pub profile: ContextProfile,
    /// Robustness strategy
    pub robustness: ContextRobustness,
    /// Release behavior
    pub release: ContextReleaseBehavior,
}

impl ContextAttributes {
    fn at_least(&self, major: i32, minor: i32) -> bool {
        self.major > major || (self.major == major && self.minor >= minor)
    }
}

/// A rendering context owned by a window
pub struct Context {
    backend: Box<dyn ContextBackend>,
    gl: Option<Box<dyn GlFunctions>>,
    attributes: ContextAttributes,
    window: WindowId,
    slot: ContextSlot,
}

impl Context {
    /// Wrap a freshly created backend context
    pub fn new(backend: Box<dyn ContextBackend>, kind: ContextType, window: WindowId, slot: ContextSlot) -> Self {
        Self {
            backend,
            gl: None,
            attributes: ContextAttributes {
                kind,
                ..ContextAttributes::default()
            },
            window,
            slot,
        }
    }

    /// Attributes read back after creation
    pub fn attributes(&self) -> &ContextAttributes {
        &self.attributes
    }

    /// Client API
    pub fn api(&self) -> ContextApi {
        self.attributes.api
    }

    /// Creation API
    pub fn kind(&self) -> ContextType {
        self.attributes.kind
    }

    /// Backend half
    pub fn backend(&self) -> &dyn ContextBackend {
        self.backend.as_ref()
    }

    pub(crate) fn make_current(&mut self) -> EngineResult<()> {
        self.backend.make_current().map_err(|e| {
            EngineError::PlatformError(BackendError::Failed(format!("Failed to make context current: {e}"))).logged()
        })?;
        self.slot.set(Some(self.window));
        Ok(())
    }

    pub(crate) fn release_current(&mut self) -> EngineResult<()> {
        self.backend.release_current().map_err(|e| {
            EngineError::PlatformError(BackendError::Failed(format!("Failed to clear current context: {e}"))).logged()
        })?;
        self.slot.set(None);
        Ok(())
    }

    pub(crate) fn swap_buffers(&mut self) -> EngineResult<()> {
        if self.attributes.kind == ContextType::Egl && self.slot.get() != Some(self.window) {
            return Err(EngineError::PlatformError(BackendError::Failed(
                "The EGL context must be current on the calling thread when swapping buffers".to_string(),
            ))
            .logged());
        }
        self.backend.swap_buffers().map_err(|e| EngineError::from(e).logged())
    }

    pub(crate) fn swap_interval(&mut self, interval: i32) -> EngineResult<()> {
        self.backend.swap_interval(interval).map_err(|e| EngineError::from(e).logged())
    }

    pub(crate) fn proc_address(&self, name: &str) -> Option<ProcAddress> {
        self.backend.proc_address(name)
    }

    /// Extension lookup for a context that is current on this thread
    ///
    /// 3.0+ contexts walk the indexed extension list; older ones scan the
    /// legacy space-separated string. Anything not found there is checked
    /// against the platform API.
    pub(crate) fn has_extension(&self, name: &str) -> bool {
        if let Some(gl) = &self.gl {
            if self.attributes.major >= 3 {
                let count = u32::try_from(gl.get_integer(GL_NUM_EXTENSIONS)).unwrap_or(0);
                for i in 0..count {
                    match gl.get_string_indexed(GL_EXTENSIONS, i) {
                        Some(extension) if extension == name => return true,
                        Some(_) => {}
                        None => {
                            log::error!("Extension string retrieval is broken");
                            return false;
                        }
                    }
                }
            } else {
                match gl.get_string(GL_EXTENSIONS) {
                    Some(extensions) => {
                        if string_in_extension_string(name, &extensions) {
                            return true;
                        }
                    }
                    None => {
                        log::error!("Extension string retrieval is broken");
                        return false;
                    }
                }
            }
        }

        self.backend.platform_extension_supported(name)
    }

    /// Read back what the driver granted
    ///
    /// The context must be current. Fails if entry points cannot be resolved,
    /// the version string is unreadable, or the granted version is below the
    /// requested one.
    pub fn refresh_attributes(&mut self, requested: &ContextConfig, platform: &dyn PlatformBackend) -> EngineResult<()> {
        self.attributes.kind = requested.kind;
        self.attributes.api = ContextApi::OpenGl;

        let backend = self.backend.as_ref();
        if backend.proc_address("glGetIntegerv").is_none() || backend.proc_address("glGetString").is_none() {
            return Err(EngineError::PlatformError(BackendError::Unavailable(
                "OpenGL GetProcAddress failed".to_string(),
            ))
            .logged());
        }

        let gl = platform
            .bind_gl_functions(&|name| backend.proc_address(name))
            .ok_or_else(|| {
                EngineError::PlatformError(BackendError::Unavailable("Failed to bind GL query functions".to_string()))
                    .logged()
            })?;

        let api_name = if requested.api == ContextApi::OpenGlEs { "OpenGL ES" } else { "OpenGL" };
        let Some(version) = gl.get_string(GL_VERSION) else {
            return Err(EngineError::PlatformError(BackendError::Failed(format!("{api_name} GetString failed"))).logged());
        };

        let Some((is_es, major, minor, revision)) = parse_version_string(&version) else {
            return Err(EngineError::PlatformError(BackendError::Failed(format!(
                "No version found in {api_name} version string \"{version}\""
            )))
            .logged());
        };

        if is_es {
            self.attributes.api = ContextApi::OpenGlEs;
        }
        self.attributes.major = major;
        self.attributes.minor = minor;
        self.attributes.revision = revision;

        let api_name = if is_es { "OpenGL ES" } else { "OpenGL" };
        if major < requested.major || (major == requested.major && minor < requested.minor) {
            // Without ARB_create_context the driver may hand out less than asked for
            return Err(EngineError::VersionUnavailable(format!(
                "Requested {api_name} version {}.{}, got version {major}.{minor}",
                requested.major, requested.minor
            ))
            .logged());
        }

        if major >= 3 && backend.proc_address("glGetStringi").is_none() {
            return Err(EngineError::PlatformError(BackendError::Unavailable(
                "Entry point retrieval is broken".to_string(),
            ))
            .logged());
        }

        self.gl = Some(gl);
        self.read_flags(requested);

        log::debug!(
            "Context granted: {api_name} {major}.{minor}.{revision} ({:?} profile)",
            self.attributes.profile
        );
        Ok(())
    }

    fn read_flags(&mut self, requested: &ContextConfig) {
        let Some(gl) = self.gl.as_deref() else {
            return;
        };

        if self.attributes.api == ContextApi::OpenGl {
            if self.attributes.major >= 3 {
                let flags = gl.get_integer(GL_CONTEXT_FLAGS);
                if flags & GL_CONTEXT_FLAG_FORWARD_COMPATIBLE_BIT != 0 {
                    self.attributes.forward = true;
                }
                if flags & GL_CONTEXT_FLAG_DEBUG_BIT != 0 {
                    self.attributes.debug = true;
                } else if requested.debug && self.has_extension("GL_ARB_debug_output") {
                    // Pre-KHR_debug drivers do not set the bit for debug contexts
                    self.attributes.debug = true;
                }
                if flags & GL_CONTEXT_FLAG_NO_ERROR_BIT_KHR != 0 {
                    self.attributes.no_error = true;
                }
            }

            if self.attributes.at_least(3, 2) {
                let mask = gl.get_integer(GL_CONTEXT_PROFILE_MASK);
                if mask & GL_CONTEXT_COMPATIBILITY_PROFILE_BIT != 0 {
                    self.attributes.profile = ContextProfile::Compatibility;
                } else if mask & GL_CONTEXT_CORE_PROFILE_BIT != 0 {
                    self.attributes.profile = ContextProfile::Core;
                } else if self.has_extension("GL_ARB_compatibility") {
                    // Versionless 3.2+ contexts may leave the mask empty
                    self.attributes.profile = ContextProfile::Compatibility;
                }
            }

            if self.has_extension("GL_ARB_robustness") {
                self.read_robustness();
            }
        } else if self.has_extension("GL_EXT_robustness") {
            // The EXT constants match the ARB ones
            self.read_robustness();
        }

        if self.has_extension("GL_KHR_context_flush_control") {
            if let Some(gl) = self.gl.as_deref() {
                match gl.get_integer(GL_CONTEXT_RELEASE_BEHAVIOR) {
                    0 => self.attributes.release = ContextReleaseBehavior::None,
                    GL_CONTEXT_RELEASE_BEHAVIOR_FLUSH => self.attributes.release = ContextReleaseBehavior::Flush,
                    _ => {}
                }
            }
        }
    }

    fn read_robustness(&mut self) {
        let Some(gl) = self.gl.as_deref() else {
            return;
        };
        match gl.get_integer(GL_RESET_NOTIFICATION_STRATEGY_ARB) {
            GL_LOSE_CONTEXT_ON_RESET_ARB => self.attributes.robustness = ContextRobustness::LoseContextOnReset,
            GL_NO_RESET_NOTIFICATION_ARB => self.attributes.robustness = ContextRobustness::NoResetNotification,
            _ => {}
        }
    }

    /// Clear the color buffer once so stale video memory is never presented
    pub(crate) fn clear_and_swap(&mut self) -> EngineResult<()> {
        if let Some(gl) = &self.gl {
            gl.clear(GL_COLOR_BUFFER_BIT);
        }
        self.swap_buffers()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if self.slot.get() == Some(self.window) {
            if let Err(e) = self.backend.release_current() {
                log::warn!("Failed to release context of destroyed window: {e}");
            }
            self.slot.set(None);
        }
        self.backend.destroy();
    }
}
