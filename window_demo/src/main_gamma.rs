//! Gamma and video mode demo
//!
//! Lists the headless monitors, fades the primary monitor's gamma, runs a
//! fullscreen window through a few video modes and unplugs a monitor while the
//! platform is watching.

use window_engine::backend::headless::{HeadlessBackend, HeadlessHandle, HeadlessMonitor};
use window_engine::backend::BackendEvent;
use window_engine::prelude::*;

/// Device keys of the two headless monitors
struct Devices {
    primary: String,
    side: String,
}

fn headless_backend() -> (HeadlessBackend, HeadlessHandle, Devices) {
    let backend = HeadlessBackend::new();
    let handle = backend.handle();
    let primary = handle.add_monitor(
        HeadlessMonitor::new("Headless-1")
            .with_primary(true)
            .with_modes(vec![
                VideoMode::new(2560, 1440, 8, 8, 8, 144),
                VideoMode::new(1920, 1080, 8, 8, 8, 60),
                VideoMode::new(1920, 1080, 8, 8, 8, 144),
                VideoMode::new(1280, 720, 8, 8, 8, 60),
            ]),
    );
    let side = handle.add_monitor(
        HeadlessMonitor::new("Headless-2")
            .with_position(2560, 0)
            .with_content_scale(1.5, 1.5)
            .with_modes(vec![VideoMode::new(1600, 900, 8, 8, 8, 60)]),
    );
    (backend, handle, Devices { primary, side })
}

fn describe_monitors(platform: &mut Platform) {
    for id in platform.monitors().to_vec() {
        let Some(monitor) = platform.monitor_mut(id) else {
            continue;
        };
        let (x, y) = monitor.position();
        let (width_mm, height_mm) = monitor.physical_size();
        let (xscale, yscale) = monitor.content_scale();
        log::info!(
            "{} at ({x}, {y}), {width_mm}x{height_mm} mm, scale {xscale}x{yscale}",
            monitor.name()
        );
        for mode in monitor.video_modes() {
            log::info!("    {mode}");
        }
    }
}

fn fade_gamma(platform: &mut Platform, monitor: MonitorId) -> EngineResult<()> {
    let monitor = platform.monitor_mut(monitor).ok_or(EngineError::NoSuchMonitor)?;
    for step in 0..=4_u8 {
        let gamma = 1.0 + f32::from(step) * 0.25;
        monitor.set_gamma(gamma)?;
        if let Some(ramp) = monitor.gamma_ramp() {
            log::info!(
                "Gamma {gamma:.2}: {} entries, midpoint {}",
                ramp.size(),
                ramp.red[ramp.size() / 2]
            );
        }
    }
    Ok(())
}

fn cycle_modes(
    platform: &mut Platform,
    handle: &HeadlessHandle,
    devices: &Devices,
    monitor: MonitorId,
) -> EngineResult<()> {
    let window = platform.open_window("Gamma Demo", 1920, 1080, Some(monitor))?;

    for (width, height, refresh) in [(1280, 720, 60), (1920, 1080, 144), (1000, 700, DONT_CARE)] {
        platform.set_window_monitor(window, Some(monitor), 0, 0, width, height, refresh)?;
        if let Some(mode) = platform.monitor_mut(monitor).and_then(Monitor::video_mode) {
            log::info!("Requested {width}x{height}@{refresh}, monitor now runs {mode}");
        }
    }

    platform.set_window_monitor(window, None, 100, 100, 800, 600, DONT_CARE)?;
    log::info!(
        "Windowed again after {} mode switch(es)",
        handle.monitor_mode_switches(&devices.primary)
    );
    platform.destroy_window(window)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    log::info!("Starting gamma demo");

    let (backend, handle, devices) = headless_backend();
    let mut platform = Platform::init(Box::new(backend))?;

    platform.set_monitor_connected_callback(|_, monitor| log::info!("Connected: {}", monitor.name()));
    platform.set_monitor_disconnected_callback(|_, monitor| log::info!("Disconnected: {}", monitor.name()));

    describe_monitors(&mut platform);

    let primary = platform.primary_monitor().ok_or(EngineError::NoSuchMonitor)?;
    fade_gamma(&mut platform, primary)?;
    cycle_modes(&mut platform, &handle, &devices, primary)?;

    handle.remove_monitor(&devices.side);
    handle.push_event(BackendEvent::MonitorsChanged);
    platform.poll_events();
    log::info!("{} monitor(s) left", platform.monitors().len());

    // Gamma is put back when the platform terminates
    platform.terminate();
    log::info!("Gamma ramp writes: {}", handle.monitor_gamma_sets(&devices.primary));
    Ok(())
}
