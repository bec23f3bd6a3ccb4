//! Backend half of a rendering context

use std::any::Any;

use crate::backend::{BackendResult, ProcAddress};

/// Context primitives provided by the native backend or by the EGL layer
///
/// Implementations release their resources in [`Self::destroy`], which the
/// engine calls exactly once before dropping the context.
pub trait ContextBackend {
    /// Make this context current on the calling thread
    fn make_current(&mut self) -> BackendResult<()>;

    /// Detach whatever context of this kind is current on the calling thread
    fn release_current(&mut self) -> BackendResult<()>;

    /// Present the back buffer
    fn swap_buffers(&mut self) -> BackendResult<()>;

    /// Set the swap interval of the current context
    fn swap_interval(&mut self, interval: i32) -> BackendResult<()>;

    /// Extension check against the platform API (WGL, GLX, EGL ...)
    fn platform_extension_supported(&self, name: &str) -> bool;

    /// Resolve a client API function for the current context
    fn proc_address(&self, name: &str) -> Option<ProcAddress>;

    /// Release the context and its drawable
    fn destroy(&mut self);

    /// Get access to the concrete type for downcasting
    ///
    /// Backends use this to recover their own type from a share context.
    fn as_any(&self) -> &dyn Any;
}

/// GL query entry points resolved from the current context
///
/// Only the handful of calls needed to read back context attributes and
/// extension strings.
pub trait GlFunctions {
    /// `glGetIntegerv` for a single value
    fn get_integer(&self, pname: u32) -> i32;

    /// `glGetString`
    fn get_string(&self, name: u32) -> Option<String>;

    /// `glGetStringi`
    fn get_string_indexed(&self, name: u32, index: u32) -> Option<String>;

    /// `glClear`
    fn clear(&self, mask: u32);
}
