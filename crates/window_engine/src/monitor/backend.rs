//! Backend half of a monitor

use super::{GammaRamp, VideoMode};
use crate::backend::BackendResult;

/// Per-monitor primitives an OS backend provides
pub trait MonitorBackend {
    /// Position of the monitor's viewport on the virtual desktop
    fn position(&self) -> (i32, i32);

    /// Area not covered by task bars and docks: `(x, y, width, height)`
    fn workarea(&self) -> (i32, i32, i32, i32);

    /// Ratio between current DPI and the platform default
    fn content_scale(&self) -> (f32, f32);

    /// Every mode the monitor supports, in any order
    fn video_modes(&self) -> Vec<VideoMode>;

    /// Mode currently in use
    fn current_video_mode(&self) -> Option<VideoMode>;

    /// Switch to `mode`, which came from [`Self::video_modes`]
    fn set_video_mode(&mut self, mode: &VideoMode) -> BackendResult<()>;

    /// Switch back to the mode the monitor had before the first switch
    fn restore_video_mode(&mut self);

    /// Ramp currently installed, if the monitor supports gamma
    fn gamma_ramp(&self) -> Option<GammaRamp>;

    /// Install a validated ramp
    fn set_gamma_ramp(&mut self, ramp: &GammaRamp) -> BackendResult<()>;
}
