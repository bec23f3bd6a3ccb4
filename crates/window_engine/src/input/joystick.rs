//! Joystick state
//!
//! The backend does the device polling and reports connection changes and
//! element updates as [`JoystickEvent`]s; this module keeps the latest state
//! per slot and owns the lazy subsystem gate.

use bitflags::bitflags;

use crate::backend::PlatformBackend;

/// Number of joystick slots
pub const MAX_JOYSTICKS: usize = 16;

bitflags! {
    /// Directional hat position
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HatState: u8 {
        /// Hat pushed up
        const UP = 1 << 0;
        /// Hat pushed right
        const RIGHT = 1 << 1;
        /// Hat pushed down
        const DOWN = 1 << 2;
        /// Hat pushed left
        const LEFT = 1 << 3;
        /// Up and right
        const RIGHT_UP = Self::RIGHT.bits() | Self::UP.bits();
        /// Down and right
        const RIGHT_DOWN = Self::RIGHT.bits() | Self::DOWN.bits();
        /// Up and left
        const LEFT_UP = Self::LEFT.bits() | Self::UP.bits();
        /// Down and left
        const LEFT_DOWN = Self::LEFT.bits() | Self::DOWN.bits();
    }
}

impl HatState {
    /// Hat at rest
    pub const CENTERED: Self = Self::empty();
}

/// Joystick updates reported by the backend
#[derive(Debug, Clone, PartialEq)]
pub enum JoystickEvent {
    /// A device appeared in slot `id`
    Connected {
        /// Slot index
        id: usize,
        /// Human readable device name
        name: String,
        /// Number of axes
        axes: usize,
        /// Number of buttons
        buttons: usize,
        /// Number of hats
        hats: usize,
    },
    /// The device in slot `id` went away
    Disconnected {
        /// Slot index
        id: usize,
    },
    /// Axis moved, `value` in `-1.0..=1.0`
    Axis {
        /// Slot index
        id: usize,
        /// Axis index
        axis: usize,
        /// New position
        value: f32,
    },
    /// Button changed
    Button {
        /// Slot index
        id: usize,
        /// Button index
        button: usize,
        /// Whether the button is down
        pressed: bool,
    },
    /// Hat changed
    Hat {
        /// Slot index
        id: usize,
        /// Hat index
        hat: usize,
        /// New hat position
        state: HatState,
    },
}

/// A connected joystick
#[derive(Debug, Clone, PartialEq)]
pub struct Joystick {
    name: String,
    axes: Vec<f32>,
    buttons: Vec<bool>,
    hats: Vec<HatState>,
}

impl Joystick {
    /// Device name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Axis positions
    pub fn axes(&self) -> &[f32] {
        &self.axes
    }

    /// Button states
    pub fn buttons(&self) -> &[bool] {
        &self.buttons
    }

    /// Hat positions
    pub fn hats(&self) -> &[HatState] {
        &self.hats
    }
}

/// Joystick slots plus the subsystem init gate
#[derive(Debug, Default)]
pub struct Joysticks {
    initialized: bool,
    slots: [Option<Joystick>; MAX_JOYSTICKS],
}

impl Joysticks {
    /// Whether the backend joystick subsystem is up
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Bring up the backend joystick subsystem once
    ///
    /// A failed attempt tears the backend side down again and leaves the gate
    /// closed so a later call retries.
    pub fn init(&mut self, backend: &mut dyn PlatformBackend) -> bool {
        if !self.initialized {
            if !backend.init_joysticks() {
                backend.terminate_joysticks();
                return false;
            }
            log::debug!("Joystick subsystem initialized");
        }

        self.initialized = true;
        true
    }

    /// Shut the backend joystick subsystem down and forget every device
    pub fn terminate(&mut self, backend: &mut dyn PlatformBackend) {
        if self.initialized {
            backend.terminate_joysticks();
            self.initialized = false;
        }
        self.slots = Default::default();
    }

    /// Joystick in slot `id`, if connected
    pub fn get(&self, id: usize) -> Option<&Joystick> {
        self.slots.get(id)?.as_ref()
    }

    /// Whether slot `id` holds a device
    pub fn is_present(&self, id: usize) -> bool {
        self.get(id).is_some()
    }

    /// Apply a backend update
    ///
    /// Returns `Some((id, connected))` when the event changed a slot's
    /// connection state.
    pub fn apply(&mut self, event: JoystickEvent) -> Option<(usize, bool)> {
        match event {
            JoystickEvent::Connected { id, name, axes, buttons, hats } => {
                let slot = self.slots.get_mut(id)?;
                log::info!("Joystick {id} connected: {name}");
                *slot = Some(Joystick {
                    name,
                    axes: vec![0.0; axes],
                    buttons: vec![false; buttons],
                    hats: vec![HatState::CENTERED; hats],
                });
                Some((id, true))
            }
            JoystickEvent::Disconnected { id } => {
                let joystick = self.slots.get_mut(id)?.take()?;
                log::info!("Joystick {id} disconnected: {}", joystick.name);
                Some((id, false))
            }
            JoystickEvent::Axis { id, axis, value } => {
                if let Some(v) = self.slot_mut(id).and_then(|j| j.axes.get_mut(axis)) {
                    *v = value.clamp(-1.0, 1.0);
                }
                None
            }
            JoystickEvent::Button { id, button, pressed } => {
                if let Some(b) = self.slot_mut(id).and_then(|j| j.buttons.get_mut(button)) {
                    *b = pressed;
                }
                None
            }
            JoystickEvent::Hat { id, hat, state } => {
                if let Some(h) = self.slot_mut(id).and_then(|j| j.hats.get_mut(hat)) {
                    *h = state;
                }
                None
            }
        }
    }

    fn slot_mut(&mut self, id: usize) -> Option<&mut Joystick> {
        self.slots.get_mut(id)?.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessBackend;

    fn connect(joysticks: &mut Joysticks, id: usize) -> Option<(usize, bool)> {
        joysticks.apply(JoystickEvent::Connected {
            id,
            name: "Pad".to_string(),
            axes: 2,
            buttons: 4,
            hats: 1,
        })
    }

    #[test]
    fn test_init_is_idempotent() {
        let mut backend = HeadlessBackend::new();
        let handle = backend.handle();
        let mut joysticks = Joysticks::default();

        assert!(joysticks.init(&mut backend));
        assert!(joysticks.init(&mut backend));
        assert_eq!(handle.joystick_init_calls(), 1);
    }

    #[test]
    fn test_failed_init_tears_down() {
        let mut backend = HeadlessBackend::new();
        let handle = backend.handle();
        handle.set_joystick_init_fails(true);
        let mut joysticks = Joysticks::default();

        assert!(!joysticks.init(&mut backend));
        assert!(!joysticks.is_initialized());
        assert_eq!(handle.joystick_terminate_calls(), 1);

        handle.set_joystick_init_fails(false);
        assert!(joysticks.init(&mut backend));
        assert_eq!(handle.joystick_init_calls(), 2);
    }

    #[test]
    fn test_connection_changes_are_reported() {
        let mut joysticks = Joysticks::default();
        assert_eq!(connect(&mut joysticks, 3), Some((3, true)));
        assert!(joysticks.is_present(3));
        assert_eq!(joysticks.apply(JoystickEvent::Disconnected { id: 3 }), Some((3, false)));
        assert!(!joysticks.is_present(3));
        assert_eq!(joysticks.apply(JoystickEvent::Disconnected { id: 3 }), None);
        assert_eq!(connect(&mut joysticks, MAX_JOYSTICKS), None);
    }

    #[test]
    fn test_element_updates() {
        let mut joysticks = Joysticks::default();
        connect(&mut joysticks, 0);

        joysticks.apply(JoystickEvent::Axis { id: 0, axis: 1, value: 2.0 });
        joysticks.apply(JoystickEvent::Button { id: 0, button: 2, pressed: true });
        joysticks.apply(JoystickEvent::Hat { id: 0, hat: 0, state: HatState::LEFT_UP });
        joysticks.apply(JoystickEvent::Button { id: 0, button: 99, pressed: true });

        let pad = joysticks.get(0).unwrap();
        assert_eq!(pad.axes(), &[0.0, 1.0]);
        assert_eq!(pad.buttons(), &[false, false, true, false]);
        assert_eq!(pad.hats(), &[HatState::LEFT | HatState::UP]);
    }
}
