//! # Monitors
//!
//! A monitor wraps its backend half with the engine-side state: the lazily
//! fetched and sorted video mode catalog, the original gamma ramp (cached on the
//! first ramp change so it can be restored at shutdown), and the weak link to
//! the window currently occupying it in fullscreen.

mod backend;
pub mod gamma;
pub mod video_mode;

pub use backend::MonitorBackend;
pub use gamma::GammaRamp;
pub use video_mode::{closest_video_mode, split_bpp, VideoMode, DONT_CARE};

use crate::backend::{BackendError, MonitorDescriptor};
use crate::error::{EngineError, EngineResult};
use crate::foundation::collections::WindowId;

/// A physical display
pub struct Monitor {
    name: String,
    device: String,
    width_mm: i32,
    height_mm: i32,
    modes: Vec<VideoMode>,
    current_mode: Option<VideoMode>,
    original_ramp: Option<GammaRamp>,
    window: Option<WindowId>,
    backend: Box<dyn MonitorBackend>,
}

impl Monitor {
    /// Wrap a monitor reported by the backend
    pub fn new(descriptor: MonitorDescriptor) -> Self {
        Self {
            name: descriptor.name,
            device: descriptor.device,
            width_mm: descriptor.width_mm,
            height_mm: descriptor.height_mm,
            modes: Vec::new(),
            current_mode: None,
            original_ramp: None,
            window: None,
            backend: descriptor.backend,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// OS device key, unique among connected monitors
    pub fn device_name(&self) -> &str {
        &self.device
    }

    /// Physical size in millimeters
    pub fn physical_size(&self) -> (i32, i32) {
        (self.width_mm, self.height_mm)
    }

    /// Viewport position on the virtual desktop
    pub fn position(&self) -> (i32, i32) {
        self.backend.position()
    }

    /// Usable area: `(x, y, width, height)`
    pub fn workarea(&self) -> (i32, i32, i32, i32) {
        self.backend.workarea()
    }

    /// Content scale
    pub fn content_scale(&self) -> (f32, f32) {
        self.backend.content_scale()
    }

    /// Supported video modes, sorted ascending
    ///
    /// Fetched from the backend once; the catalog is assumed static afterwards.
    pub fn video_modes(&mut self) -> &[VideoMode] {
        self.refresh_video_modes();
        &self.modes
    }

    /// Mode currently in use
    pub fn video_mode(&mut self) -> Option<VideoMode> {
        self.current_mode = self.backend.current_video_mode();
        self.current_mode
    }

    /// Supported mode closest to `desired`
    pub fn closest_video_mode(&mut self, desired: &VideoMode) -> Option<VideoMode> {
        if !self.refresh_video_modes() {
            return None;
        }
        closest_video_mode(desired, &self.modes).copied()
    }

    /// Switch to the supported mode closest to `desired`
    ///
    /// Does nothing if that mode is already active.
    pub fn set_video_mode(&mut self, desired: &VideoMode) -> EngineResult<()> {
        let Some(best) = self.closest_video_mode(desired) else {
            return Err(EngineError::FormatUnavailable(format!(
                "Monitor {} reports no video modes",
                self.name
            ))
            .logged());
        };

        if self.video_mode() == Some(best) {
            return Ok(());
        }

        log::debug!("Switching monitor {} to {best}", self.name);
        self.backend
            .set_video_mode(&best)
            .map_err(|e| EngineError::from(e).logged())?;
        self.current_mode = Some(best);
        Ok(())
    }

    /// Switch back to the mode in use before the engine touched the monitor
    pub fn restore_video_mode(&mut self) {
        self.backend.restore_video_mode();
        self.current_mode = self.backend.current_video_mode();
    }

    /// Install a gamma ramp computed from an exponent
    ///
    /// The ramp keeps the size of the one currently installed.
    pub fn set_gamma(&mut self, gamma: f32) -> EngineResult<()> {
        // Validate before asking the backend for anything
        GammaRamp::from_gamma(gamma, 0)?;

        let Some(current) = self.gamma_ramp() else {
            return Err(EngineError::PlatformError(BackendError::Unsupported(format!(
                "Monitor {} has no gamma ramp",
                self.name
            )))
            .logged());
        };

        let ramp = GammaRamp::from_gamma(gamma, current.size())?;
        self.set_gamma_ramp(&ramp)
    }

    /// Ramp currently installed
    pub fn gamma_ramp(&self) -> Option<GammaRamp> {
        self.backend.gamma_ramp()
    }

    /// Install a gamma ramp
    ///
    /// The first successful call caches the ramp that was installed before, so
    /// [`Self::restore_original_gamma_ramp`] can put it back.
    pub fn set_gamma_ramp(&mut self, ramp: &GammaRamp) -> EngineResult<()> {
        if !ramp.is_valid() {
            return Err(EngineError::InvalidValue("Invalid gamma ramp".to_string()).logged());
        }

        if self.original_ramp.is_none() {
            let Some(original) = self.backend.gamma_ramp() else {
                return Err(EngineError::PlatformError(BackendError::Failed(format!(
                    "Failed to read the original gamma ramp of {}",
                    self.name
                )))
                .logged());
            };
            self.original_ramp = Some(original);
        }

        self.backend
            .set_gamma_ramp(ramp)
            .map_err(|e| EngineError::from(e).logged())
    }

    /// Put back the ramp cached by the first [`Self::set_gamma_ramp`]
    pub fn restore_original_gamma_ramp(&mut self) {
        if let Some(original) = &self.original_ramp {
            if let Err(e) = self.backend.set_gamma_ramp(original) {
                log::warn!("Failed to restore gamma ramp of {}: {e}", self.name);
            }
        }
    }

    /// Window occupying this monitor in fullscreen
    pub fn window(&self) -> Option<WindowId> {
        self.window
    }

    pub(crate) fn set_window(&mut self, window: Option<WindowId>) {
        self.window = window;
    }

    fn refresh_video_modes(&mut self) -> bool {
        if !self.modes.is_empty() {
            return true;
        }

        self.modes = self.backend.video_modes();
        if self.modes.is_empty() {
            return false;
        }
        self.modes.sort();
        true
    }
}
