//! Headless monitors

use super::Shared;
use crate::backend::BackendResult;
use crate::monitor::{GammaRamp, MonitorBackend, VideoMode};

const GAMMA_RAMP_SIZE: u16 = 256;

/// Description of a monitor to connect with [`super::HeadlessHandle::add_monitor`]
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMonitor {
    /// Display name; several monitors may share one
    pub name: String,
    /// Physical width in millimeters
    pub width_mm: i32,
    /// Physical height in millimeters
    pub height_mm: i32,
    /// Reported as the primary monitor
    pub primary: bool,
    /// Viewport position
    pub position: (i32, i32),
    /// Work area, `None` for the whole current mode
    pub workarea: Option<(i32, i32, i32, i32)>,
    /// Content scale
    pub content_scale: (f32, f32),
    /// Supported modes; the first is the one in use
    pub modes: Vec<VideoMode>,
    /// Whether the monitor has a gamma ramp
    pub gamma: bool,
}

impl HeadlessMonitor {
    /// A 600x340 mm monitor with no modes
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            width_mm: 600,
            height_mm: 340,
            primary: false,
            position: (0, 0),
            workarea: None,
            content_scale: (1.0, 1.0),
            modes: Vec::new(),
            gamma: true,
        }
    }

    /// Supported modes, the first one active
    pub fn with_modes(mut self, modes: Vec<VideoMode>) -> Self {
        self.modes = modes;
        self
    }

    /// Report as primary
    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    /// Viewport position
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = (x, y);
        self
    }

    /// Content scale
    pub fn with_content_scale(mut self, x: f32, y: f32) -> Self {
        self.content_scale = (x, y);
        self
    }

    /// Drop gamma support
    pub fn without_gamma(mut self) -> Self {
        self.gamma = false;
        self
    }
}

pub(super) struct MonitorState {
    pub device: String,
    pub info: HeadlessMonitor,
    pub current: Option<VideoMode>,
    pub original: Option<VideoMode>,
    pub ramp: Option<GammaRamp>,
    pub mode_switches: usize,
    pub gamma_sets: usize,
}

impl MonitorState {
    pub fn new(device: String, info: HeadlessMonitor) -> Self {
        let ramp = info.gamma.then(|| {
            let step = u16::MAX / (GAMMA_RAMP_SIZE - 1);
            GammaRamp::uniform((0..GAMMA_RAMP_SIZE).map(|i| i * step).collect())
        });
        Self {
            device,
            current: info.modes.first().copied(),
            original: None,
            ramp,
            mode_switches: 0,
            gamma_sets: 0,
            info,
        }
    }
}

/// Backend half handed to the engine; looks its record up by device key
pub(super) struct HeadlessMonitorBackend {
    device: String,
    name: String,
    state: Shared,
}

impl HeadlessMonitorBackend {
    pub fn new(monitor: &MonitorState, state: Shared) -> Self {
        Self {
            device: monitor.device.clone(),
            name: monitor.info.name.clone(),
            state,
        }
    }

    fn read<T: Default>(&self, f: impl FnOnce(&MonitorState) -> T) -> T {
        self.state.borrow().monitor(&self.device).map(f).unwrap_or_default()
    }
}

impl MonitorBackend for HeadlessMonitorBackend {
    fn position(&self) -> (i32, i32) {
        self.read(|m| m.info.position)
    }

    fn workarea(&self) -> (i32, i32, i32, i32) {
        self.read(|m| {
            m.info.workarea.unwrap_or_else(|| {
                let (width, height) = m.current.map_or((0, 0), |mode| (mode.width, mode.height));
                (m.info.position.0, m.info.position.1, width, height)
            })
        })
    }

    fn content_scale(&self) -> (f32, f32) {
        self.read(|m| m.info.content_scale)
    }

    fn video_modes(&self) -> Vec<VideoMode> {
        self.read(|m| m.info.modes.clone())
    }

    fn current_video_mode(&self) -> Option<VideoMode> {
        self.read(|m| m.current)
    }

    fn set_video_mode(&mut self, mode: &VideoMode) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        if let Some(monitor) = state.monitor_mut(&self.device) {
            if monitor.original.is_none() {
                monitor.original = monitor.current;
            }
            monitor.current = Some(*mode);
            monitor.mode_switches += 1;
        }
        state.record(format!("set_video_mode:{}:{mode}", self.name));
        Ok(())
    }

    fn restore_video_mode(&mut self) {
        let mut state = self.state.borrow_mut();
        let restored = state.monitor_mut(&self.device).and_then(|monitor| {
            let original = monitor.original.take()?;
            monitor.current = Some(original);
            Some(original)
        });
        if restored.is_some() {
            state.record(format!("restore_video_mode:{}", self.name));
        }
    }

    fn gamma_ramp(&self) -> Option<GammaRamp> {
        self.read(|m| m.ramp.clone())
    }

    fn set_gamma_ramp(&mut self, ramp: &GammaRamp) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        if let Some(monitor) = state.monitor_mut(&self.device) {
            monitor.ramp = Some(ramp.clone());
            monitor.gamma_sets += 1;
        }
        state.record(format!("set_gamma_ramp:{}", self.name));
        Ok(())
    }
}
