//! Creation hints
//!
//! Hints are the defaults [`super::Platform::open_window`] uses for every
//! window it creates. They persist until changed or reset.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::context::{ContextConfig, FramebufferConfig};
use crate::monitor::DONT_CARE;
use crate::window::WindowConfig;

/// Framebuffer, window and context hints plus the fullscreen refresh rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hints {
    /// Desired framebuffer
    pub framebuffer: FramebufferConfig,
    /// Window presentation
    pub window: WindowConfig,
    /// Client API and context options
    pub context: ContextConfig,
    /// Refresh rate wanted when fullscreen, or [`DONT_CARE`]
    pub refresh_rate: i32,
}

impl Default for Hints {
    fn default() -> Self {
        Self {
            framebuffer: FramebufferConfig::default(),
            window: WindowConfig::default(),
            context: ContextConfig::default(),
            refresh_rate: DONT_CARE,
        }
    }
}

impl Config for Hints {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextApi, ContextProfile};

    #[test]
    fn test_hints_round_trip_toml() {
        let path = std::env::temp_dir().join(format!("window_engine_{}_hints.toml", std::process::id()));
        let mut hints = Hints::default();
        hints.context = hints
            .context
            .with_version(ContextApi::OpenGl, 3, 3)
            .with_profile(ContextProfile::Core);
        hints.window.resizable = false;
        hints.framebuffer.samples = 4;
        hints.refresh_rate = 60;

        hints.save_to_file(&path).unwrap();
        let loaded = Hints::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, hints);
    }

    #[test]
    fn test_hints_from_partial_ron() {
        let loaded: Hints = ron::from_str("(context: (major: 4, minor: 1), window: (decorated: false))").unwrap();
        assert_eq!(loaded.context.major, 4);
        assert_eq!(loaded.context.minor, 1);
        assert!(!loaded.window.decorated);
        assert!(loaded.window.visible);
        assert_eq!(loaded.refresh_rate, DONT_CARE);
    }
}
