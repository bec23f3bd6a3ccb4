use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use image::RgbaImage;

use super::{platform, MAIN_DEVICE};
use crate::backend::headless::{HeadlessBackend, HeadlessMonitor};
use crate::backend::{BackendEvent, WindowEvent};
use crate::context::{ContextApi, ContextConfig, ContextProfile};
use crate::input::{CursorShape, JoystickEvent, Key, KeyMods, KeyState};
use crate::monitor::DONT_CARE;
use crate::window::WindowConfig;
use crate::{EngineError, Platform};

#[test]
fn test_init_failure_is_reported() {
    let backend = HeadlessBackend::new();
    backend.handle().set_init_fails(true);
    assert!(matches!(Platform::init(Box::new(backend)), Err(EngineError::PlatformError(_))));
}

#[test]
fn test_primary_monitor_comes_first() {
    let backend = HeadlessBackend::new();
    let handle = backend.handle();
    handle.add_monitor(HeadlessMonitor::new("Side"));
    handle.add_monitor(HeadlessMonitor::new("Main").with_primary(true));

    let platform = Platform::init(Box::new(backend)).unwrap();
    let primary = platform.primary_monitor().unwrap();
    assert_eq!(platform.monitor(primary).unwrap().name(), "Main");
    assert_eq!(platform.monitors().len(), 2);
}

#[test]
fn test_open_window_with_default_hints() {
    let (mut platform, handle) = platform();
    let id = platform.open_window("Main", 640, 480, None).unwrap();

    let window = platform.window(id).unwrap();
    assert!(window.is_visible());
    assert!(window.is_focused());
    assert_eq!(window.size(), (640, 480));
    assert_eq!(platform.primary_window(), Some(id));

    let attributes = window.context().unwrap().attributes();
    assert_eq!((attributes.major, attributes.minor), (3, 3));
    assert_eq!(attributes.api, ContextApi::OpenGl);

    // The fresh context was cleared and presented once, then released again
    assert_eq!(handle.clear_count(), 1);
    assert_eq!(handle.swap_count(), 1);
    assert_eq!(platform.current_context(), None);
}

#[test]
fn test_open_window_rejects_bad_arguments() {
    let (mut platform, handle) = platform();
    assert!(matches!(platform.open_window("", 640, 480, None), Err(EngineError::InvalidArgument(_))));
    assert!(matches!(platform.open_window("Zero", 0, 480, None), Err(EngineError::InvalidValue(_))));

    platform.hints_mut().context = ContextConfig::default()
        .with_version(ContextApi::OpenGlEs, 2, 0)
        .with_profile(ContextProfile::Core);
    assert!(matches!(platform.open_window("ES", 640, 480, None), Err(EngineError::InvalidArgument(_))));

    assert_eq!(handle.window_count(), 0);
    assert!(platform.windows().is_empty());
}

#[test]
fn test_window_below_requested_version_is_discarded() {
    let (mut platform, handle) = platform();
    platform.hints_mut().context = ContextConfig::default().with_version(ContextApi::OpenGl, 4, 1);

    let result = platform.open_window("Too new", 640, 480, None);
    assert!(matches!(result, Err(EngineError::VersionUnavailable(_))));
    assert_eq!(handle.window_count(), 0);
    assert_eq!(handle.live_contexts(), 0);
    assert!(platform.windows().is_empty());
}

#[test]
fn test_missing_pixel_format_rolls_back() {
    let (mut platform, handle) = platform();
    handle.set_native_configs(Vec::new());
    assert!(matches!(platform.open_window("No format", 640, 480, None), Err(EngineError::FormatUnavailable(_))));
    assert_eq!(handle.window_count(), 0);
}

#[test]
fn test_native_context_failure_rolls_back() {
    let (mut platform, handle) = platform();
    handle.set_native_context_fails(true);
    assert!(matches!(platform.open_window("No context", 640, 480, None), Err(EngineError::PlatformError(_))));
    assert_eq!(handle.window_count(), 0);
    assert_eq!(handle.contexts_created(), 0);
}

#[test]
fn test_broken_entry_points_roll_back() {
    let (mut platform, handle) = platform();
    handle.remove_gl_function("glGetStringi");
    assert!(platform.open_window("No stringi", 640, 480, None).is_err());
    assert_eq!(handle.window_count(), 0);
    assert_eq!(handle.live_contexts(), 0);
    assert_eq!(platform.current_context(), None);
}

#[test]
fn test_window_without_context() {
    let (mut platform, handle) = platform();
    platform.hints_mut().context = ContextConfig::default().with_version(ContextApi::None, 0, 0);
    let id = platform.open_window("Bare", 320, 240, None).unwrap();

    assert!(platform.window(id).unwrap().context().is_none());
    assert_eq!(handle.contexts_created(), 0);
    assert_eq!(platform.make_context_current(Some(id)), Err(EngineError::NoWindowContext));
    assert_eq!(platform.swap_buffers(id), Err(EngineError::NoWindowContext));
}

#[test]
fn test_hints_apply_and_reset() {
    let (mut platform, handle) = platform();
    platform.hints_mut().window = WindowConfig::default().with_visible(false).with_resizable(false);
    let hidden = platform.open_window("Hidden", 320, 240, None).unwrap();
    let window = platform.window(hidden).unwrap();
    assert!(!window.is_visible());
    assert!(!window.is_resizable());
    assert!(!handle.window_state(window.native_handle()).unwrap().resizable);

    platform.reset_hints();
    assert!(platform.hints().window.visible);
    assert_eq!(platform.hints().refresh_rate, DONT_CARE);
}

#[test]
fn test_time_rebasing() {
    let (mut platform, handle) = platform();
    handle.advance_time(2.0);
    assert_relative_eq!(platform.time(), 2.0);

    platform.set_time(10.0).unwrap();
    handle.advance_time(0.5);
    assert_relative_eq!(platform.time(), 10.5);

    assert!(platform.set_time(-1.0).is_err());
    assert!(platform.set_time(f64::NAN).is_err());
    assert!(platform.set_time(18_446_744_074.0).is_err());
    assert_relative_eq!(platform.time(), 10.5);
    assert_eq!(platform.timer_frequency(), crate::backend::headless::TIMER_FREQUENCY);
}

#[test]
fn test_wait_events_timeout_validation() {
    let (mut platform, _handle) = platform();
    assert!(platform.wait_events_timeout(-1.0).is_err());
    assert!(platform.wait_events_timeout(f64::NAN).is_err());
    assert!(platform.wait_events_timeout(f64::INFINITY).is_err());
    assert!(platform.wait_events_timeout(0.0).is_ok());
}

#[test]
fn test_events_reach_their_window() {
    let (mut platform, handle) = platform();
    let first = platform.open_window("First", 320, 240, None).unwrap();
    let second = platform.open_window("Second", 320, 240, None).unwrap();
    platform.poll_events();

    let sizes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&sizes);
    platform
        .window_mut(second)
        .unwrap()
        .set_size_callback(move |_, w, h| sink.borrow_mut().push((w, h)));

    let native = platform.window(second).unwrap().native_handle();
    handle.push_window_event(
        native,
        WindowEvent::Key {
            key: Key::A,
            scancode: 30,
            action: KeyState::Press,
            mods: KeyMods::empty(),
        },
    );
    handle.push_window_event(native, WindowEvent::Closed);
    platform.poll_events();

    assert_eq!(platform.window_mut(second).unwrap().key(Key::A), KeyState::Press);
    assert!(platform.window(second).unwrap().should_close());
    assert!(!platform.window(first).unwrap().should_close());

    platform.window_mut(second).unwrap().set_size(800, 600).unwrap();
    platform.poll_events();
    assert_eq!(*sizes.borrow(), vec![(800, 600)]);
}

#[test]
fn test_fullscreen_window_occupies_monitor() {
    let (mut platform, handle) = platform();
    let main = platform.primary_monitor().unwrap();
    let id = platform.open_window("Full", 1280, 720, Some(main)).unwrap();

    assert_eq!(platform.monitor(main).unwrap().window(), Some(id));
    assert_eq!(handle.monitor_current_mode(MAIN_DEVICE).map(|m| m.width), Some(1280));
    let native = platform.window(id).unwrap().native_handle();
    let state = handle.window_state(native).unwrap();
    assert_eq!(state.size, (1280, 720));
    assert!(state.fullscreen.is_some());

    platform.destroy_window(id).unwrap();
    assert_eq!(platform.monitor(main).unwrap().window(), None);
    assert_eq!(handle.monitor_current_mode(MAIN_DEVICE).map(|m| m.width), Some(1920));
}

#[test]
fn test_set_window_monitor_round_trip() {
    let (mut platform, handle) = platform();
    let main = platform.primary_monitor().unwrap();
    let id = platform.open_window("Switch", 640, 480, None).unwrap();

    assert!(platform.set_window_monitor(id, Some(main), 0, 0, 800, 600, -5).is_err());
    assert!(platform.set_window_monitor(id, Some(main), 0, 0, 0, 600, DONT_CARE).is_err());

    platform.set_window_monitor(id, Some(main), 0, 0, 800, 600, DONT_CARE).unwrap();
    assert_eq!(platform.window(id).unwrap().monitor(), Some(main));
    assert_eq!(platform.monitor(main).unwrap().window(), Some(id));
    assert_eq!(handle.monitor_current_mode(MAIN_DEVICE).map(|m| m.width), Some(800));

    platform.set_window_size(id, 1280, 720).unwrap();
    assert_eq!(handle.monitor_current_mode(MAIN_DEVICE).map(|m| m.width), Some(1280));

    platform.set_window_monitor(id, None, 50, 60, 640, 480, DONT_CARE).unwrap();
    assert_eq!(platform.window(id).unwrap().monitor(), None);
    assert_eq!(platform.monitor(main).unwrap().window(), None);
    assert_eq!(handle.monitor_current_mode(MAIN_DEVICE).map(|m| m.width), Some(1920));

    let native = platform.window(id).unwrap().native_handle();
    let state = handle.window_state(native).unwrap();
    assert_eq!(state.position, (50, 60));
    assert_eq!(state.fullscreen, None);
}

#[test]
fn test_failed_monitor_switch_leaves_window_in_place() {
    let (mut platform, handle) = platform();
    let main = platform.primary_monitor().unwrap();
    let empty_device = handle.add_monitor(HeadlessMonitor::new("Empty").with_position(1920, 0).with_modes(vec![]));
    handle.push_event(BackendEvent::MonitorsChanged);
    platform.poll_events();
    let empty = platform.monitors().iter().copied().find(|&m| m != main).unwrap();

    let id = platform.open_window("Switch", 640, 480, None).unwrap();
    let requested = platform.window(id).unwrap().video_mode();
    let result = platform.set_window_monitor(id, Some(empty), 0, 0, 800, 600, DONT_CARE);
    assert!(matches!(result, Err(EngineError::FormatUnavailable(_))));
    assert_eq!(platform.window(id).unwrap().monitor(), None);
    assert_eq!(platform.window(id).unwrap().video_mode(), requested);
    assert_eq!(platform.monitor(empty).unwrap().window(), None);

    platform.set_window_monitor(id, Some(main), 0, 0, 1280, 720, DONT_CARE).unwrap();
    let native = platform.window(id).unwrap().native_handle();
    let fullscreen = handle.window_state(native).unwrap().fullscreen;

    assert!(platform.set_window_monitor(id, Some(empty), 0, 0, 800, 600, DONT_CARE).is_err());
    assert_eq!(platform.window(id).unwrap().monitor(), Some(main));
    assert_eq!(platform.monitor(main).unwrap().window(), Some(id));
    assert_eq!(platform.monitor(empty).unwrap().window(), None);
    assert_eq!(handle.monitor_current_mode(MAIN_DEVICE).map(|m| m.width), Some(1280));
    assert_eq!(handle.window_state(native).unwrap().fullscreen, fullscreen);
    assert_eq!(handle.monitor_mode_switches(&empty_device), 0);
}

#[test]
fn test_fullscreen_focus_loss_minimizes_and_releases_monitor() {
    let (mut platform, handle) = platform();
    let main = platform.primary_monitor().unwrap();
    let id = platform.open_window("Full", 1280, 720, Some(main)).unwrap();
    let native = platform.window(id).unwrap().native_handle();
    platform.poll_events();

    handle.push_window_event(native, WindowEvent::Focus(false));
    platform.poll_events();
    assert!(platform.window(id).unwrap().is_minimized());

    // The minimize queued its own notification
    platform.poll_events();
    assert_eq!(platform.monitor(main).unwrap().window(), None);
    assert_eq!(handle.monitor_current_mode(MAIN_DEVICE).map(|m| m.width), Some(1920));

    handle.push_window_event(native, WindowEvent::Minimized(false));
    platform.poll_events();
    assert_eq!(platform.monitor(main).unwrap().window(), Some(id));
    assert_eq!(handle.monitor_current_mode(MAIN_DEVICE).map(|m| m.width), Some(1280));
}

#[test]
fn test_monitor_hotplug() {
    let (mut platform, handle) = platform();
    let main = platform.primary_monitor().unwrap();
    let id = platform.open_window("Full", 1280, 720, Some(main)).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let connected = Rc::clone(&seen);
    let disconnected = Rc::clone(&seen);
    platform.set_monitor_connected_callback(move |_, m| connected.borrow_mut().push(format!("+{}", m.name())));
    platform.set_monitor_disconnected_callback(move |_, m| disconnected.borrow_mut().push(format!("-{}", m.name())));

    handle.add_monitor(HeadlessMonitor::new("Side").with_position(1920, 0));
    handle.push_event(BackendEvent::MonitorsChanged);
    platform.poll_events();
    assert_eq!(platform.monitors().len(), 2);

    handle.remove_monitor(MAIN_DEVICE);
    handle.push_event(BackendEvent::MonitorsChanged);
    platform.poll_events();

    assert_eq!(*seen.borrow(), vec!["+Side".to_string(), "-Main".to_string()]);
    assert_eq!(platform.monitors().len(), 1);
    assert!(platform.monitor(main).is_none());
    assert_eq!(platform.window(id).unwrap().monitor(), None);
}

#[test]
fn test_hotplug_tells_identical_monitors_apart() {
    let (mut platform, handle) = platform();
    let connected = Rc::new(RefCell::new(0));
    let disconnected = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&connected);
    platform.set_monitor_connected_callback(move |_, _| *sink.borrow_mut() += 1);
    let sink = Rc::clone(&disconnected);
    platform.set_monitor_disconnected_callback(move |id, _| sink.borrow_mut().push(id));

    let twin = handle.add_monitor(HeadlessMonitor::new("Main").with_position(1920, 0));
    handle.push_event(BackendEvent::MonitorsChanged);
    platform.poll_events();
    assert_eq!(platform.monitors().len(), 2);
    assert_eq!(*connected.borrow(), 1);

    let main = platform.primary_monitor().unwrap();
    let second = platform.monitors()[1];
    assert_eq!(platform.monitor(second).unwrap().name(), "Main");
    assert_eq!(platform.monitor(second).unwrap().device_name(), twin);

    handle.remove_monitor(&twin);
    handle.push_event(BackendEvent::MonitorsChanged);
    platform.poll_events();
    assert_eq!(*disconnected.borrow(), vec![second]);
    assert_eq!(platform.monitors(), &[main]);
    assert_eq!(platform.monitor(main).unwrap().device_name(), MAIN_DEVICE);
}

#[test]
fn test_destroying_cursor_detaches_it() {
    let (mut platform, handle) = platform();
    let id = platform.open_window("Cursor", 320, 240, None).unwrap();
    let native = platform.window(id).unwrap().native_handle();

    assert!(platform.create_cursor(&RgbaImage::new(0, 0), 0, 0).is_err());
    let image = platform.create_cursor(&RgbaImage::new(16, 16), 8, 8).unwrap();
    let hand = platform.create_standard_cursor(CursorShape::PointingHand).unwrap();
    assert_eq!(handle.live_cursors(), 2);

    platform.set_window_cursor(id, Some(hand)).unwrap();
    assert_eq!(platform.window(id).unwrap().cursor(), Some(hand));
    assert!(handle.window_state(native).unwrap().cursor.is_some());

    platform.destroy_cursor(hand).unwrap();
    assert_eq!(platform.window(id).unwrap().cursor(), None);
    assert_eq!(handle.window_state(native).unwrap().cursor, None);
    assert_eq!(handle.live_cursors(), 1);
    assert!(platform.cursor(image).is_some());
    assert_eq!(platform.destroy_cursor(hand), Err(EngineError::NoSuchCursor));
}

#[test]
fn test_terminate_order() {
    let (mut platform, handle) = platform();
    let main = platform.primary_monitor().unwrap();
    platform.monitor_mut(main).unwrap().set_gamma(2.2).unwrap();
    platform.open_window("Doomed", 320, 240, None).unwrap();
    platform.create_standard_cursor(CursorShape::Arrow).unwrap();

    platform.terminate();
    platform.terminate();
    drop(platform);

    let log = handle.call_log();
    let position = |prefix: &str| log.iter().rposition(|entry| entry.starts_with(prefix)).unwrap();
    assert!(position("set_gamma_ramp:Main") < position("destroy_window"));
    assert!(position("destroy_context") < position("destroy_window"));
    assert!(position("destroy_cursor") < position("terminate"));
    assert!(position("destroy_window") < position("terminate"));
    assert_eq!(log.iter().filter(|entry| *entry == "terminate").count(), 1);
    assert_eq!(handle.monitor_gamma_sets(MAIN_DEVICE), 2);
    assert_eq!(handle.live_contexts(), 0);
    assert_eq!(handle.live_cursors(), 0);
}

#[test]
fn test_key_names() {
    let (platform, _handle) = platform();
    assert_eq!(platform.key_name(Key::A, 0).as_deref(), Some("a"));
    assert_eq!(platform.key_name(Key::Escape, 0), None);
    assert_eq!(platform.key_name(Key::Unknown, Key::KeyPad1.code()).as_deref(), Some("1"));
    assert_eq!(platform.key_scancode(Key::Unknown), -1);
    assert_eq!(platform.key_scancode(Key::B), Key::B.code());
}

#[test]
fn test_joysticks_initialize_lazily() {
    let (mut platform, handle) = platform();
    assert_eq!(handle.joystick_init_calls(), 0);
    assert!(!platform.joystick_present(0));
    assert_eq!(handle.joystick_init_calls(), 1);

    let events = Rc::new(RefCell::new(Vec::new()));
    let on = Rc::clone(&events);
    let off = Rc::clone(&events);
    platform.set_joystick_connected_callback(move |id| on.borrow_mut().push((id, true)));
    platform.set_joystick_disconnected_callback(move |id| off.borrow_mut().push((id, false)));

    handle.push_event(BackendEvent::Joystick(JoystickEvent::Connected {
        id: 2,
        name: "Pad".to_string(),
        axes: 2,
        buttons: 8,
        hats: 1,
    }));
    handle.push_event(BackendEvent::Joystick(JoystickEvent::Axis { id: 2, axis: 1, value: 2.0 }));
    platform.poll_events();

    let joystick = platform.joystick(2).unwrap();
    assert_eq!(joystick.name(), "Pad");
    assert_relative_eq!(joystick.axes()[1], 1.0);

    handle.push_event(BackendEvent::Joystick(JoystickEvent::Disconnected { id: 2 }));
    platform.poll_events();
    assert!(!platform.joystick_present(2));
    assert_eq!(*events.borrow(), vec![(2, true), (2, false)]);
    assert_eq!(handle.joystick_init_calls(), 1);
}

#[test]
fn test_clipboard_and_empty_events() {
    let (mut platform, handle) = platform();
    assert_eq!(platform.clipboard_string(), None);
    platform.set_clipboard_string("copied");
    assert_eq!(platform.clipboard_string().as_deref(), Some("copied"));

    platform.post_empty_event();
    assert_eq!(handle.empty_events_posted(), 1);
}
