//! Input management system
//!
//! Key, mouse button and modifier vocabulary shared by windows and backends.
//! Key codes follow the printable-ASCII / function-key layout used by most
//! desktop windowing libraries, so backends can translate native codes with a
//! single table.

pub mod joystick;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub use joystick::{Joystick, JoystickEvent, Joysticks, HatState};

/// Number of key slots tracked per window
pub const KEY_COUNT: usize = Key::Menu as usize + 1;

/// Number of mouse buttons tracked per window
pub const MOUSE_BUTTON_COUNT: usize = 8;

/// Per-key and per-button state
///
/// `Stick` records a release that happened while sticky input was enabled.
/// It reads back once as `Press` and then decays to `Release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyState {
    /// Not held
    #[default]
    Release,
    /// Held down
    Press,
    /// Held down and auto-repeated
    Repeat,
    /// Released since the last poll while sticky input was on
    Stick,
}

bitflags! {
    /// Modifier keys held during an input event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyMods: u32 {
        /// Either shift key
        const SHIFT = 1 << 0;
        /// Either control key
        const CONTROL = 1 << 1;
        /// Either alt key
        const ALT = 1 << 2;
        /// Either super key
        const SUPER = 1 << 3;
        /// Caps lock is engaged
        const CAPS_LOCK = 1 << 4;
        /// Num lock is engaged
        const NUM_LOCK = 1 << 5;
    }
}

impl KeyMods {
    /// Strip the lock bits unless lock-key reporting is enabled
    #[must_use]
    pub fn masked(self, lock_key_mods: bool) -> Self {
        if lock_key_mods {
            self
        } else {
            self - (Self::CAPS_LOCK | Self::NUM_LOCK)
        }
    }
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left = 0,
    /// Right mouse button
    Right = 1,
    /// Middle mouse button
    Middle = 2,
    /// Extra button 4
    Button4 = 3,
    /// Extra button 5
    Button5 = 4,
    /// Extra button 6
    Button6 = 5,
    /// Extra button 7
    Button7 = 6,
    /// Extra button 8
    Button8 = 7,
}

impl MouseButton {
    /// All buttons in index order
    pub const ALL: [Self; MOUSE_BUTTON_COUNT] = [
        Self::Left,
        Self::Right,
        Self::Middle,
        Self::Button4,
        Self::Button5,
        Self::Button6,
        Self::Button7,
        Self::Button8,
    ];

    /// Slot index of this button
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Per-window input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputMode {
    /// Cursor visibility and capture
    Cursor(CursorMode),
    /// Deferred key releases
    StickyKeys(bool),
    /// Deferred mouse button releases
    StickyMouseButtons(bool),
    /// Report caps lock and num lock in modifiers
    LockKeyMods(bool),
    /// Unaccelerated motion while the cursor is disabled
    RawMouseMotion(bool),
}

/// Cursor modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CursorMode {
    /// Visible and free
    #[default]
    Normal,
    /// Invisible over the content area
    Hidden,
    /// Invisible and captured; positions become virtual
    Disabled,
}

/// Standard system cursor shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorShape {
    /// Regular arrow
    Arrow,
    /// Text input I-beam
    IBeam,
    /// Crosshair
    Crosshair,
    /// Pointing hand
    PointingHand,
    /// Horizontal resize
    ResizeEW,
    /// Vertical resize
    ResizeNS,
    /// Top-left to bottom-right diagonal resize
    ResizeNWSE,
    /// Top-right to bottom-left diagonal resize
    ResizeNESW,
    /// Omni-directional resize
    ResizeAll,
    /// Operation not allowed
    NotAllowed,
}

/// Keyboard keys
///
/// Discriminants are the key codes; printable keys use their US-layout ASCII
/// value and everything else starts at 256.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum Key {
    Unknown = -1,

    Space = 32,
    Apostrophe = 39,
    Comma = 44,
    Minus = 45,
    Period = 46,
    Slash = 47,
    Num0 = 48,
    Num1 = 49,
    Num2 = 50,
    Num3 = 51,
    Num4 = 52,
    Num5 = 53,
    Num6 = 54,
    Num7 = 55,
    Num8 = 56,
    Num9 = 57,
    Semicolon = 59,
    Equal = 61,
    A = 65,
    B = 66,
    C = 67,
    D = 68,
    E = 69,
    F = 70,
    G = 71,
    H = 72,
    I = 73,
    J = 74,
    K = 75,
    L = 76,
    M = 77,
    N = 78,
    O = 79,
    P = 80,
    Q = 81,
    R = 82,
    S = 83,
    T = 84,
    U = 85,
    V = 86,
    W = 87,
    X = 88,
    Y = 89,
    Z = 90,
    LeftBracket = 91,
    Backslash = 92,
    RightBracket = 93,
    GraveAccent = 96,
    World1 = 161,
    World2 = 162,

    Escape = 256,
    Enter = 257,
    Tab = 258,
    Backspace = 259,
    Insert = 260,
    Delete = 261,
    Right = 262,
    Left = 263,
    Down = 264,
    Up = 265,
    PageUp = 266,
    PageDown = 267,
    Home = 268,
    End = 269,
    CapsLock = 280,
    ScrollLock = 281,
    NumLock = 282,
    PrintScreen = 283,
    Pause = 284,
    F1 = 290,
    F2 = 291,
    F3 = 292,
    F4 = 293,
    F5 = 294,
    F6 = 295,
    F7 = 296,
    F8 = 297,
    F9 = 298,
    F10 = 299,
    F11 = 300,
    F12 = 301,
    F13 = 302,
    F14 = 303,
    F15 = 304,
    F16 = 305,
    F17 = 306,
    F18 = 307,
    F19 = 308,
    F20 = 309,
    F21 = 310,
    F22 = 311,
    F23 = 312,
    F24 = 313,
    F25 = 314,
    KeyPad0 = 320,
    KeyPad1 = 321,
    KeyPad2 = 322,
    KeyPad3 = 323,
    KeyPad4 = 324,
    KeyPad5 = 325,
    KeyPad6 = 326,
    KeyPad7 = 327,
    KeyPad8 = 328,
    KeyPad9 = 329,
    KeyPadDecimal = 330,
    KeyPadDivide = 331,
    KeyPadMultiply = 332,
    KeyPadSubtract = 333,
    KeyPadAdd = 334,
    KeyPadEnter = 335,
    KeyPadEqual = 336,
    LeftShift = 340,
    LeftControl = 341,
    LeftAlt = 342,
    LeftSuper = 343,
    RightShift = 344,
    RightControl = 345,
    RightAlt = 346,
    RightSuper = 347,
    Menu = 348,
}

impl Key {
    /// Every named key, in code order
    pub const ALL: &'static [Self] = &[
        Self::Space, Self::Apostrophe, Self::Comma, Self::Minus, Self::Period, Self::Slash,
        Self::Num0, Self::Num1, Self::Num2, Self::Num3, Self::Num4,
        Self::Num5, Self::Num6, Self::Num7, Self::Num8, Self::Num9,
        Self::Semicolon, Self::Equal,
        Self::A, Self::B, Self::C, Self::D, Self::E, Self::F, Self::G, Self::H, Self::I,
        Self::J, Self::K, Self::L, Self::M, Self::N, Self::O, Self::P, Self::Q, Self::R,
        Self::S, Self::T, Self::U, Self::V, Self::W, Self::X, Self::Y, Self::Z,
        Self::LeftBracket, Self::Backslash, Self::RightBracket, Self::GraveAccent,
        Self::World1, Self::World2,
        Self::Escape, Self::Enter, Self::Tab, Self::Backspace, Self::Insert, Self::Delete,
        Self::Right, Self::Left, Self::Down, Self::Up,
        Self::PageUp, Self::PageDown, Self::Home, Self::End,
        Self::CapsLock, Self::ScrollLock, Self::NumLock, Self::PrintScreen, Self::Pause,
        Self::F1, Self::F2, Self::F3, Self::F4, Self::F5, Self::F6, Self::F7, Self::F8,
        Self::F9, Self::F10, Self::F11, Self::F12, Self::F13, Self::F14, Self::F15,
        Self::F16, Self::F17, Self::F18, Self::F19, Self::F20, Self::F21, Self::F22,
        Self::F23, Self::F24, Self::F25,
        Self::KeyPad0, Self::KeyPad1, Self::KeyPad2, Self::KeyPad3, Self::KeyPad4,
        Self::KeyPad5, Self::KeyPad6, Self::KeyPad7, Self::KeyPad8, Self::KeyPad9,
        Self::KeyPadDecimal, Self::KeyPadDivide, Self::KeyPadMultiply,
        Self::KeyPadSubtract, Self::KeyPadAdd, Self::KeyPadEnter, Self::KeyPadEqual,
        Self::LeftShift, Self::LeftControl, Self::LeftAlt, Self::LeftSuper,
        Self::RightShift, Self::RightControl, Self::RightAlt, Self::RightSuper,
        Self::Menu,
    ];

    /// Key code as reported to applications
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look a key up by code
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL
            .binary_search_by_key(&code, |k| k.code())
            .ok()
            .map(|i| Self::ALL[i])
    }

    /// State slot for this key, `None` for [`Key::Unknown`]
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.code()).ok()
    }

    /// Whether the key produces a layout-dependent character and therefore
    /// has a printable name
    pub fn is_printable(self) -> bool {
        self == Self::KeyPadEqual
            || (Self::KeyPad0..=Self::KeyPadAdd).contains(&self)
            || (Self::Apostrophe..=Self::World2).contains(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_table_is_sorted() {
        assert!(Key::ALL.windows(2).all(|w| w[0].code() < w[1].code()));
        assert_eq!(Key::ALL.last().copied(), Some(Key::Menu));
    }

    #[test]
    fn test_key_from_code() {
        assert_eq!(Key::from_code(65), Some(Key::A));
        assert_eq!(Key::from_code(348), Some(Key::Menu));
        assert_eq!(Key::from_code(58), None);
        assert_eq!(Key::from_code(-1), None);
    }

    #[test]
    fn test_unknown_key_has_no_slot() {
        assert_eq!(Key::Unknown.index(), None);
        assert_eq!(Key::Menu.index(), Some(KEY_COUNT - 1));
    }

    #[test]
    fn test_printable_keys() {
        assert!(Key::A.is_printable());
        assert!(Key::Apostrophe.is_printable());
        assert!(Key::KeyPad5.is_printable());
        assert!(Key::KeyPadEqual.is_printable());
        assert!(!Key::Space.is_printable());
        assert!(!Key::KeyPadEnter.is_printable());
        assert!(!Key::F1.is_printable());
    }

    #[test]
    fn test_lock_mods_masking() {
        let mods = KeyMods::SHIFT | KeyMods::CAPS_LOCK | KeyMods::NUM_LOCK;
        assert_eq!(mods.masked(false), KeyMods::SHIFT);
        assert_eq!(mods.masked(true), mods);
    }
}
