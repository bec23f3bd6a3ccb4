//! Cross-module tests driving a [`Platform`] over the headless backend

mod context_tests;
mod platform_tests;

use crate::backend::headless::{HeadlessBackend, HeadlessHandle, HeadlessMonitor};
use crate::foundation::logging;
use crate::monitor::VideoMode;
use crate::Platform;

/// Device key the headless backend gives the first monitor it connects
pub const MAIN_DEVICE: &str = "HEADLESS1";

pub fn main_modes() -> Vec<VideoMode> {
    vec![
        VideoMode::new(1920, 1080, 8, 8, 8, 60),
        VideoMode::new(1280, 720, 8, 8, 8, 60),
        VideoMode::new(800, 600, 8, 8, 8, 60),
    ]
}

/// Platform with one primary 1920x1080 monitor named "Main"
pub fn platform() -> (Platform, HeadlessHandle) {
    logging::init_for_tests();
    let backend = HeadlessBackend::new();
    let handle = backend.handle();
    let device = handle.add_monitor(HeadlessMonitor::new("Main").with_primary(true).with_modes(main_modes()));
    assert_eq!(device, MAIN_DEVICE);
    let platform = Platform::init(Box::new(backend)).unwrap();
    (platform, handle)
}

/// Platform whose EGL library can be loaded
pub fn egl_platform() -> (Platform, HeadlessHandle) {
    let (mut platform, handle) = platform();
    handle.add_library("libEGL.so.1");
    platform.hints_mut().context.kind = crate::context::ContextType::Egl;
    (platform, handle)
}
