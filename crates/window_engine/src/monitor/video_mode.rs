//! Video modes and closest-mode selection

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel for "don't care" in requested modes
pub const DONT_CARE: i32 = -1;

/// A display configuration a monitor can be switched to
///
/// Modes are ordered by color depth, then pixel area, then width, then refresh
/// rate, which is the order a monitor's catalog is sorted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VideoMode {
    /// Width in screen coordinates
    pub width: i32,
    /// Height in screen coordinates
    pub height: i32,
    /// Red channel depth, or [`DONT_CARE`] in requests
    pub red_bits: i32,
    /// Green channel depth, or [`DONT_CARE`] in requests
    pub green_bits: i32,
    /// Blue channel depth, or [`DONT_CARE`] in requests
    pub blue_bits: i32,
    /// Refresh rate in Hz, or [`DONT_CARE`] in requests
    pub refresh_rate: i32,
}

impl VideoMode {
    /// Create a mode from its parts
    pub const fn new(
        width: i32,
        height: i32,
        red_bits: i32,
        green_bits: i32,
        blue_bits: i32,
        refresh_rate: i32,
    ) -> Self {
        Self {
            width,
            height,
            red_bits,
            green_bits,
            blue_bits,
            refresh_rate,
        }
    }

    /// Create a mode from a combined bits-per-pixel value
    pub fn from_bpp(width: i32, height: i32, bpp: i32, refresh_rate: i32) -> Self {
        let (red_bits, green_bits, blue_bits) = split_bpp(bpp);
        Self::new(width, height, red_bits, green_bits, blue_bits, refresh_rate)
    }

    /// Combined color depth
    pub fn bpp(&self) -> i32 {
        self.red_bits + self.green_bits + self.blue_bits
    }

    /// Pixel area
    pub fn area(&self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }
}

impl Ord for VideoMode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bpp()
            .cmp(&other.bpp())
            .then_with(|| self.area().cmp(&other.area()))
            .then_with(|| self.width.cmp(&other.width))
            .then_with(|| self.refresh_rate.cmp(&other.refresh_rate))
            // Remaining fields only keep the order consistent with `Eq`
            .then_with(|| self.height.cmp(&other.height))
            .then_with(|| self.red_bits.cmp(&other.red_bits))
            .then_with(|| self.green_bits.cmp(&other.green_bits))
    }
}

impl PartialOrd for VideoMode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VideoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} ({}Hz) [r{}, g{}, b{}]",
            self.width, self.height, self.refresh_rate, self.red_bits, self.green_bits, self.blue_bits
        )
    }
}

/// Split a bits-per-pixel value into red, green and blue depths
///
/// 32 is read as 24. Leftover bits go to green first, then red.
pub fn split_bpp(bpp: i32) -> (i32, i32, i32) {
    let bpp = if bpp == 32 { 24 } else { bpp };

    let third = bpp / 3;
    let (mut red, mut green, blue) = (third, third, third);
    let delta = bpp - third * 3;
    if delta >= 1 {
        green += 1;
    }
    if delta == 2 {
        red += 1;
    }
    (red, green, blue)
}

/// Pick the mode in `modes` closest to `desired`
///
/// Candidates are ranked by summed absolute channel difference (ignoring
/// don't-care channels), then absolute pixel-area difference, then refresh
/// rate difference. A don't-care refresh rate scores `u32::MAX - rate`, so the
/// highest rate wins among otherwise equal modes. First match wins ties.
pub fn closest_video_mode<'a>(desired: &VideoMode, modes: &'a [VideoMode]) -> Option<&'a VideoMode> {
    let mut closest = None;
    let mut least = (u64::MAX, u64::MAX, u64::MAX);

    for mode in modes {
        let channel = |actual: i32, wanted: i32| {
            if wanted == DONT_CARE {
                0
            } else {
                u64::from(actual.abs_diff(wanted))
            }
        };
        let color_diff = channel(mode.red_bits, desired.red_bits)
            + channel(mode.green_bits, desired.green_bits)
            + channel(mode.blue_bits, desired.blue_bits);

        let size_diff = mode.area().abs_diff(desired.area());

        let refresh_diff = if desired.refresh_rate == DONT_CARE {
            u64::from(u32::MAX - mode.refresh_rate.clamp(0, i32::MAX).unsigned_abs())
        } else {
            u64::from(mode.refresh_rate.abs_diff(desired.refresh_rate))
        };

        let score = (color_diff, size_diff, refresh_diff);
        if score < least {
            least = score;
            closest = Some(mode);
        }
    }

    closest
}
