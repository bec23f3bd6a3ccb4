//! Per-window callback table
//!
//! One optional boxed closure per event kind. The window takes a closure out
//! of its slot while running it, so a callback gets `&mut Window` and may
//! install a replacement for its own slot.

use std::path::PathBuf;

use crate::input::{Key, KeyMods, KeyState, MouseButton};
use crate::window::Window;

/// Content area moved
pub type PositionCallback = Box<dyn FnMut(&mut Window, i32, i32)>;
/// Content area resized
pub type SizeCallback = Box<dyn FnMut(&mut Window, i32, i32)>;
/// User asked to close the window
pub type CloseCallback = Box<dyn FnMut(&mut Window)>;
/// Content needs redrawing
pub type RefreshCallback = Box<dyn FnMut(&mut Window)>;
/// Input focus gained or lost
pub type FocusCallback = Box<dyn FnMut(&mut Window, bool)>;
/// Minimized or restored
pub type MinimizeCallback = Box<dyn FnMut(&mut Window, bool)>;
/// Maximized or restored
pub type MaximizeCallback = Box<dyn FnMut(&mut Window, bool)>;
/// Framebuffer resized
pub type FramebufferSizeCallback = Box<dyn FnMut(&mut Window, i32, i32)>;
/// Content scale changed
pub type ContentScaleCallback = Box<dyn FnMut(&mut Window, f32, f32)>;
/// Mouse button pressed or released
pub type MouseButtonCallback = Box<dyn FnMut(&mut Window, MouseButton, KeyState, KeyMods)>;
/// Cursor moved
pub type CursorPositionCallback = Box<dyn FnMut(&mut Window, f64, f64)>;
/// Cursor entered or left the content area
pub type CursorEnterCallback = Box<dyn FnMut(&mut Window, bool)>;
/// Scroll wheel or touchpad offset
pub type ScrollCallback = Box<dyn FnMut(&mut Window, f64, f64)>;
/// Key pressed, repeated or released
pub type KeyCallback = Box<dyn FnMut(&mut Window, Key, i32, KeyState, KeyMods)>;
/// Unicode character input
pub type CharCallback = Box<dyn FnMut(&mut Window, u32)>;
/// Unicode character input with modifiers
pub type CharModsCallback = Box<dyn FnMut(&mut Window, u32, KeyMods)>;
/// Paths dropped on the window
pub type DropCallback = Box<dyn FnMut(&mut Window, &[PathBuf])>;

/// Names a callback slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    /// [`PositionCallback`]
    Position,
    /// [`SizeCallback`]
    Size,
    /// [`CloseCallback`]
    Close,
    /// [`RefreshCallback`]
    Refresh,
    /// [`FocusCallback`]
    Focus,
    /// [`MinimizeCallback`]
    Minimize,
    /// [`MaximizeCallback`]
    Maximize,
    /// [`FramebufferSizeCallback`]
    FramebufferSize,
    /// [`ContentScaleCallback`]
    ContentScale,
    /// [`MouseButtonCallback`]
    MouseButton,
    /// [`CursorPositionCallback`]
    CursorPosition,
    /// [`CursorEnterCallback`]
    CursorEnter,
    /// [`ScrollCallback`]
    Scroll,
    /// [`KeyCallback`]
    Key,
    /// [`CharCallback`]
    Char,
    /// [`CharModsCallback`]
    CharMods,
    /// [`DropCallback`]
    Drop,
}

#[derive(Default)]
pub(crate) struct WindowCallbacks {
    pub position: Option<PositionCallback>,
    pub size: Option<SizeCallback>,
    pub close: Option<CloseCallback>,
    pub refresh: Option<RefreshCallback>,
    pub focus: Option<FocusCallback>,
    pub minimize: Option<MinimizeCallback>,
    pub maximize: Option<MaximizeCallback>,
    pub framebuffer_size: Option<FramebufferSizeCallback>,
    pub content_scale: Option<ContentScaleCallback>,
    pub mouse_button: Option<MouseButtonCallback>,
    pub cursor_position: Option<CursorPositionCallback>,
    pub cursor_enter: Option<CursorEnterCallback>,
    pub scroll: Option<ScrollCallback>,
    pub key: Option<KeyCallback>,
    pub character: Option<CharCallback>,
    pub character_mods: Option<CharModsCallback>,
    pub drop: Option<DropCallback>,
}

impl WindowCallbacks {
    pub fn remove(&mut self, kind: CallbackKind) {
        match kind {
            CallbackKind::Position => self.position = None,
            CallbackKind::Size => self.size = None,
            CallbackKind::Close => self.close = None,
            CallbackKind::Refresh => self.refresh = None,
            CallbackKind::Focus => self.focus = None,
            CallbackKind::Minimize => self.minimize = None,
            CallbackKind::Maximize => self.maximize = None,
            CallbackKind::FramebufferSize => self.framebuffer_size = None,
            CallbackKind::ContentScale => self.content_scale = None,
            CallbackKind::MouseButton => self.mouse_button = None,
            CallbackKind::CursorPosition => self.cursor_position = None,
            CallbackKind::CursorEnter => self.cursor_enter = None,
            CallbackKind::Scroll => self.scroll = None,
            CallbackKind::Key => self.key = None,
            CallbackKind::Char => self.character = None,
            CallbackKind::CharMods => self.character_mods = None,
            CallbackKind::Drop => self.drop = None,
        }
    }

    pub fn is_set(&self, kind: CallbackKind) -> bool {
        match kind {
            CallbackKind::Position => self.position.is_some(),
            CallbackKind::Size => self.size.is_some(),
            CallbackKind::Close => self.close.is_some(),
            CallbackKind::Refresh => self.refresh.is_some(),
            CallbackKind::Focus => self.focus.is_some(),
            CallbackKind::Minimize => self.minimize.is_some(),
            CallbackKind::Maximize => self.maximize.is_some(),
            CallbackKind::FramebufferSize => self.framebuffer_size.is_some(),
            CallbackKind::ContentScale => self.content_scale.is_some(),
            CallbackKind::MouseButton => self.mouse_button.is_some(),
            CallbackKind::CursorPosition => self.cursor_position.is_some(),
            CallbackKind::CursorEnter => self.cursor_enter.is_some(),
            CallbackKind::Scroll => self.scroll.is_some(),
            CallbackKind::Key => self.key.is_some(),
            CallbackKind::Char => self.character.is_some(),
            CallbackKind::CharMods => self.character_mods.is_some(),
            CallbackKind::Drop => self.drop.is_some(),
        }
    }
}

/// Run the closure in `$slot` with the window borrowed mutably
///
/// A closure that installed a replacement for its own slot keeps the
/// replacement.
macro_rules! dispatch {
    ($window:ident, $slot:ident $(, $arg:expr)*) => {
        if let Some(mut callback) = $window.callbacks.$slot.take() {
            callback($window $(, $arg)*);
            if $window.callbacks.$slot.is_none() {
                $window.callbacks.$slot = Some(callback);
            }
        }
    };
}

pub(crate) use dispatch;
