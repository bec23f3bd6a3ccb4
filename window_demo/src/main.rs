//! Window demo
//!
//! Opens a window on the headless backend, replays a short scripted input
//! session through the event pump and reports what the window saw.

use std::cell::RefCell;
use std::rc::Rc;

use image::{Rgba, RgbaImage};
use window_engine::backend::headless::{HeadlessBackend, HeadlessHandle, HeadlessMonitor};
use window_engine::backend::WindowEvent;
use window_engine::config::ConfigError;
use window_engine::foundation::logging;
use window_engine::prelude::*;

const SETTINGS_PATH: &str = "window_demo/config/window_demo.toml";

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Default)]
struct Stats {
    keys: usize,
    chars: String,
    scroll: (f64, f64),
    resizes: Vec<(i32, i32)>,
}

fn headless_backend() -> (HeadlessBackend, HeadlessHandle) {
    let backend = HeadlessBackend::new();
    let handle = backend.handle();
    handle.add_monitor(
        HeadlessMonitor::new("Headless-1")
            .with_primary(true)
            .with_modes(vec![
                VideoMode::new(1920, 1080, 8, 8, 8, 60),
                VideoMode::new(1280, 720, 8, 8, 8, 60),
            ]),
    );
    handle.set_gl_extensions(&["GL_ARB_debug_output", "GL_KHR_context_flush_control"]);
    (backend, handle)
}

fn window_icon(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([255, 160, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn script_session(handle: &HeadlessHandle, window: &Window) {
    let native = window.native_handle();
    for codepoint in "hi".chars().map(u32::from) {
        handle.push_window_event(
            native,
            WindowEvent::Char {
                codepoint,
                mods: KeyMods::empty(),
                plain: true,
            },
        );
    }
    handle.push_window_event(native, WindowEvent::Scroll { x: 0.0, y: -2.5 });
    handle.push_window_event(
        native,
        WindowEvent::Key {
            key: Key::Escape,
            scancode: Key::Escape.code(),
            action: KeyState::Press,
            mods: KeyMods::empty(),
        },
    );
}

fn run() -> Result<(), DemoError> {
    let settings = EngineSettings::load_or_default(SETTINGS_PATH);
    logging::init_with_level(&settings.log_level);
    log::info!("Starting window demo");

    let (backend, handle) = headless_backend();
    let mut platform = Platform::init(Box::new(backend))?;

    if let Some(path) = &settings.hints_path {
        platform.set_hints(Hints::load_from_file(path)?);
        log::info!("Loaded creation hints from {path}");
    }

    let id = platform.open_window("Window Demo", 800, 600, None)?;
    let stats = Rc::new(RefCell::new(Stats::default()));

    {
        let window = platform.window_mut(id).ok_or(EngineError::NoSuchWindow)?;
        window.set_icon(&[window_icon(16), window_icon(32)])?;
        window.set_size_limits(320, 240, DONT_CARE, DONT_CARE)?;

        let sink = Rc::clone(&stats);
        window.set_key_callback(move |window, key, _, action, _| {
            sink.borrow_mut().keys += 1;
            if key == Key::Escape && action == KeyState::Press {
                window.set_should_close(true);
            }
        });
        let sink = Rc::clone(&stats);
        window.set_char_callback(move |_, codepoint| {
            if let Some(c) = char::from_u32(codepoint) {
                sink.borrow_mut().chars.push(c);
            }
        });
        let sink = Rc::clone(&stats);
        window.set_scroll_callback(move |_, x, y| {
            let mut stats = sink.borrow_mut();
            stats.scroll.0 += x;
            stats.scroll.1 += y;
        });
        let sink = Rc::clone(&stats);
        window.set_size_callback(move |_, width, height| sink.borrow_mut().resizes.push((width, height)));
    }

    platform.make_context_current(Some(id))?;
    platform.swap_interval(1)?;
    if let Some(context) = platform.window(id).and_then(Window::context) {
        let attributes = context.attributes();
        log::info!(
            "Context: {:?} {}.{}.{} ({:?} profile)",
            attributes.api,
            attributes.major,
            attributes.minor,
            attributes.revision,
            attributes.profile
        );
    }
    log::info!("Debug output available: {}", platform.extension_supported("GL_ARB_debug_output")?);

    if let Some(window) = platform.window_mut(id) {
        window.set_size(1024, 768)?;
        script_session(&handle, window);
    }

    let mut frames = 0_u32;
    while !platform.window(id).is_some_and(Window::should_close) {
        platform.swap_buffers(id)?;
        platform.wait_events_timeout(1.0 / 60.0)?;
        frames += 1;
    }

    let stats = stats.borrow();
    log::info!(
        "Closed after {frames} frame(s) and {:.3}s: {} key event(s), typed {:?}, scrolled {:?}, resized {:?}",
        platform.time(),
        stats.keys,
        stats.chars,
        stats.scroll,
        stats.resizes
    );

    platform.destroy_window(id)?;
    platform.terminate();
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        log::error!("Window demo failed: {e}");
        eprintln!("Window demo failed: {e}");
        std::process::exit(1);
    }
}
