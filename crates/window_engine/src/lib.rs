//! # Window Engine
//!
//! A backend-agnostic windowing, input and OpenGL context engine.
//!
//! ## Features
//!
//! - **Windows**: creation hints, fullscreen on a monitor, size constraints and
//!   per-window callbacks
//! - **Input**: key and mouse button state with sticky modes, cursor modes,
//!   joysticks and clipboard access
//! - **Monitors**: sorted video mode catalogs, closest-mode switching and gamma
//!   ramps that are restored at shutdown
//! - **Contexts**: framebuffer negotiation, native or EGL contexts and read-back
//!   of the granted version, profile and flags
//! - **Backends**: everything OS specific sits behind the [`backend`] traits; a
//!   scriptable headless backend ships with the crate
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use window_engine::prelude::*;
//! use window_engine::backend::headless::HeadlessBackend;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut platform = Platform::init(Box::new(HeadlessBackend::new()))?;
//!     let window = platform.open_window("Hello", 640, 480, None)?;
//!     platform.make_context_current(Some(window))?;
//!
//!     while !platform.window(window).is_some_and(Window::should_close) {
//!         platform.swap_buffers(window)?;
//!         platform.poll_events();
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod backend;
pub mod config;
pub mod context;
pub mod cursor;
pub mod error;
pub mod foundation;
pub mod input;
pub mod monitor;
pub mod platform;
pub mod window;

#[cfg(test)]
mod tests;

pub use error::{EngineError, EngineResult};
pub use platform::{Hints, Platform};
pub use window::Window;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, EngineSettings},
        context::{ContextApi, ContextConfig, ContextProfile, ContextType, FramebufferConfig},
        cursor::Cursor,
        foundation::collections::{CursorId, MonitorId, WindowId},
        input::{CursorMode, CursorShape, InputMode, Key, KeyMods, KeyState, MouseButton},
        monitor::{GammaRamp, Monitor, VideoMode, DONT_CARE},
        window::{CallbackKind, WindowConfig},
        EngineError, EngineResult, Hints, Platform, Window,
    };
}
