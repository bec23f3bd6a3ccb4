//! Framebuffer configurations and closest-config selection

use serde::{Deserialize, Serialize};

use crate::monitor::DONT_CARE;

/// Buffer depths and flags, either requested or offered by a driver
///
/// In requests, [`DONT_CARE`] means any value is fine and `0` means the buffer
/// is not wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FramebufferConfig {
    /// Red channel bits
    pub red_bits: i32,
    /// Green channel bits
    pub green_bits: i32,
    /// Blue channel bits
    pub blue_bits: i32,
    /// Alpha channel bits
    pub alpha_bits: i32,
    /// Depth buffer bits
    pub depth_bits: i32,
    /// Stencil buffer bits
    pub stencil_bits: i32,
    /// Accumulation buffer red bits
    pub accum_red_bits: i32,
    /// Accumulation buffer green bits
    pub accum_green_bits: i32,
    /// Accumulation buffer blue bits
    pub accum_blue_bits: i32,
    /// Accumulation buffer alpha bits
    pub accum_alpha_bits: i32,
    /// Auxiliary buffer count
    pub aux_buffers: i32,
    /// Multisample count
    pub samples: i32,
    /// Stereoscopic rendering
    pub stereo: bool,
    /// Double buffering
    pub double_buffer: bool,
    /// sRGB capable
    pub srgb: bool,
    /// Transparent window framebuffer
    pub transparent: bool,
    /// Backend pixel format or config id of an offered configuration
    #[serde(skip)]
    pub handle: u64,
}

impl Default for FramebufferConfig {
    fn default() -> Self {
        Self {
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 8,
            depth_bits: 24,
            stencil_bits: 8,
            accum_red_bits: 0,
            accum_green_bits: 0,
            accum_blue_bits: 0,
            accum_alpha_bits: 0,
            aux_buffers: 0,
            samples: 0,
            stereo: false,
            double_buffer: true,
            srgb: true,
            transparent: false,
            handle: 0,
        }
    }
}

impl FramebufferConfig {
    /// Set the color channel depths
    pub fn with_color_bits(mut self, red: i32, green: i32, blue: i32, alpha: i32) -> Self {
        self.red_bits = red;
        self.green_bits = green;
        self.blue_bits = blue;
        self.alpha_bits = alpha;
        self
    }

    /// Set depth and stencil depths
    pub fn with_depth_stencil(mut self, depth: i32, stencil: i32) -> Self {
        self.depth_bits = depth;
        self.stencil_bits = stencil;
        self
    }

    /// Set the multisample count
    pub fn with_samples(mut self, samples: i32) -> Self {
        self.samples = samples;
        self
    }

    /// Set double buffering
    pub fn with_double_buffer(mut self, double_buffer: bool) -> Self {
        self.double_buffer = double_buffer;
        self
    }

    /// Set sRGB capability
    pub fn with_srgb(mut self, srgb: bool) -> Self {
        self.srgb = srgb;
        self
    }

    /// Set stereo rendering
    pub fn with_stereo(mut self, stereo: bool) -> Self {
        self.stereo = stereo;
        self
    }

    /// Set framebuffer transparency
    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// Tag an offered configuration with its backend id
    pub fn with_handle(mut self, handle: u64) -> Self {
        self.handle = handle;
        self
    }
}

fn squared_diff(desired: i32, actual: i32) -> u64 {
    if desired == DONT_CARE {
        0
    } else {
        let diff = u64::from(desired.abs_diff(actual));
        diff * diff
    }
}

/// Pick the offered configuration closest to `desired`
///
/// Stereo (when requested) and double buffering are hard constraints.
/// Survivors are ranked by the number of missing buffers, then by the squared
/// color channel differences, then by the squared differences of every other
/// channel plus one for missing sRGB. The first candidate wins ties.
pub fn choose_framebuffer_config<'a>(
    desired: &FramebufferConfig,
    alternatives: &'a [FramebufferConfig],
) -> Option<&'a FramebufferConfig> {
    let mut least_missing = u64::MAX;
    let mut least_color_diff = u64::MAX;
    let mut least_extra_diff = u64::MAX;
    let mut closest: Option<&FramebufferConfig> = None;

    for current in alternatives {
        if desired.stereo && !current.stereo {
            continue;
        }
        if desired.double_buffer != current.double_buffer {
            continue;
        }

        let mut missing = 0u64;
        if desired.alpha_bits > 0 && current.alpha_bits == 0 {
            missing += 1;
        }
        if desired.depth_bits > 0 && current.depth_bits == 0 {
            missing += 1;
        }
        if desired.stencil_bits > 0 && current.stencil_bits == 0 {
            missing += 1;
        }
        if desired.aux_buffers > 0 && current.aux_buffers < desired.aux_buffers {
            missing += u64::from(desired.aux_buffers.abs_diff(current.aux_buffers));
        }
        if desired.samples > 0 && current.samples == 0 {
            // Several multisample buffers count as one
            missing += 1;
        }
        if desired.transparent != current.transparent {
            missing += 1;
        }

        let color_diff = squared_diff(desired.red_bits, current.red_bits)
            + squared_diff(desired.green_bits, current.green_bits)
            + squared_diff(desired.blue_bits, current.blue_bits);

        let mut extra_diff = squared_diff(desired.alpha_bits, current.alpha_bits)
            + squared_diff(desired.depth_bits, current.depth_bits)
            + squared_diff(desired.stencil_bits, current.stencil_bits)
            + squared_diff(desired.accum_red_bits, current.accum_red_bits)
            + squared_diff(desired.accum_green_bits, current.accum_green_bits)
            + squared_diff(desired.accum_blue_bits, current.accum_blue_bits)
            + squared_diff(desired.accum_alpha_bits, current.accum_alpha_bits)
            + squared_diff(desired.samples, current.samples);
        if desired.srgb && !current.srgb {
            extra_diff += 1;
        }

        let better = if missing < least_missing {
            true
        } else {
            missing == least_missing
                && (color_diff < least_color_diff
                    || (color_diff == least_color_diff && extra_diff < least_extra_diff))
        };

        if better {
            closest = Some(current);
            least_missing = missing;
            least_color_diff = color_diff;
            least_extra_diff = extra_diff;
        }
    }

    closest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offered(handle: u64) -> FramebufferConfig {
        FramebufferConfig::default().with_srgb(false).with_handle(handle)
    }

    #[test]
    fn test_stereo_is_hard_constraint() {
        let desired = FramebufferConfig::default().with_stereo(true);
        let alternatives = [offered(1), offered(2)];
        assert!(choose_framebuffer_config(&desired, &alternatives).is_none());

        let alternatives = [offered(1), offered(2).with_stereo(true)];
        assert_eq!(choose_framebuffer_config(&desired, &alternatives).map(|c| c.handle), Some(2));
    }

    #[test]
    fn test_double_buffer_is_hard_constraint() {
        let desired = FramebufferConfig::default().with_double_buffer(false);
        let alternatives = [offered(1), offered(2).with_double_buffer(false)];
        assert_eq!(choose_framebuffer_config(&desired, &alternatives).map(|c| c.handle), Some(2));
    }

    #[test]
    fn test_missing_buffers_dominate() {
        let desired = FramebufferConfig::default();
        let no_depth = offered(1).with_depth_stencil(0, 8);
        let poor_color = offered(2).with_color_bits(5, 6, 5, 8);
        let alternatives = [no_depth, poor_color];
        assert_eq!(choose_framebuffer_config(&desired, &alternatives).map(|c| c.handle), Some(2));
    }

    #[test]
    fn test_color_diff_then_extra_diff() {
        let desired = FramebufferConfig::default();
        let alternatives = [
            offered(1).with_color_bits(10, 10, 10, 8),
            offered(2).with_color_bits(8, 8, 8, 8).with_depth_stencil(16, 8),
            offered(3).with_color_bits(8, 8, 8, 8).with_depth_stencil(24, 8),
        ];
        assert_eq!(choose_framebuffer_config(&desired, &alternatives).map(|c| c.handle), Some(3));
    }

    #[test]
    fn test_large_gap_outweighs_small_gaps() {
        let desired = FramebufferConfig::default().with_color_bits(8, 8, 8, DONT_CARE);
        // 1+1+1 = 3 versus 4*4 = 16
        let alternatives = [
            offered(1).with_color_bits(12, 8, 8, 8),
            offered(2).with_color_bits(9, 9, 9, 8),
        ];
        assert_eq!(choose_framebuffer_config(&desired, &alternatives).map(|c| c.handle), Some(2));
    }

    #[test]
    fn test_ties_keep_first() {
        let desired = FramebufferConfig::default();
        let alternatives = [offered(7), offered(8), offered(9)];
        assert_eq!(choose_framebuffer_config(&desired, &alternatives).map(|c| c.handle), Some(7));
    }

    #[test]
    fn test_missing_srgb_counts_as_extra() {
        let desired = FramebufferConfig::default();
        let alternatives = [offered(1), offered(2).with_srgb(true)];
        assert_eq!(choose_framebuffer_config(&desired, &alternatives).map(|c| c.handle), Some(2));
    }

    #[test]
    fn test_dont_care_channels_are_ignored() {
        let desired = FramebufferConfig::default().with_color_bits(DONT_CARE, 8, 8, 8);
        let alternatives = [offered(1).with_color_bits(2, 8, 8, 8), offered(2)];
        assert_eq!(choose_framebuffer_config(&desired, &alternatives).map(|c| c.handle), Some(1));
    }

    #[test]
    fn test_transparency_mismatch_is_missing() {
        let desired = FramebufferConfig::default().with_transparent(true);
        let alternatives = [offered(1), offered(2).with_transparent(true).with_color_bits(5, 5, 5, 8)];
        assert_eq!(choose_framebuffer_config(&desired, &alternatives).map(|c| c.handle), Some(2));
    }
}
