//! Gamma ramps

use crate::error::{EngineError, EngineResult};

/// Per-channel lookup table mapping intensity levels to output levels
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GammaRamp {
    /// Red channel samples
    pub red: Vec<u16>,
    /// Green channel samples
    pub green: Vec<u16>,
    /// Blue channel samples
    pub blue: Vec<u16>,
}

impl GammaRamp {
    /// Ramp with the same samples on every channel
    pub fn uniform(samples: Vec<u16>) -> Self {
        Self {
            red: samples.clone(),
            green: samples.clone(),
            blue: samples,
        }
    }

    /// Build the ramp for exponent `gamma` with `size` entries
    ///
    /// Entry `i` is `(i / (size - 1))^(1 / gamma) * 65535 + 0.5`, clamped to
    /// the 16-bit range.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn from_gamma(gamma: f32, size: usize) -> EngineResult<Self> {
        if gamma.is_nan() || gamma <= 0.0 || gamma > f32::MAX {
            return Err(EngineError::InvalidValue(format!("Invalid gamma value {gamma}")).logged());
        }

        let last = size.saturating_sub(1).max(1) as f32;
        let samples = (0..size)
            .map(|i| {
                let value = (i as f32 / last).powf(1.0 / gamma) * 65535.0 + 0.5;
                value.min(65535.0) as u16
            })
            .collect();
        Ok(Self::uniform(samples))
    }

    /// Number of entries per channel
    pub fn size(&self) -> usize {
        self.red.len()
    }

    /// A ramp is installable only if it is non-empty and all channels match
    pub fn is_valid(&self) -> bool {
        let size = self.red.len();
        size > 0 && self.green.len() == size && self.blue.len() == size
    }
}
