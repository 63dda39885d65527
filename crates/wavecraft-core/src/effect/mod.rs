//! Signal-processing stages - trait and parameter mapping
//!
//! Every stage processes a `SampleBuffer` in place and exposes normalized
//! (0.0-1.0) parameters mapped onto real ranges. Parameter setters clamp
//! their input, so a live graph can never be handed an invalid value -
//! the render path is error-free by construction.

pub mod compressor;
pub mod delay;
pub mod filter;
pub mod gain;
pub mod reverb;

pub use compressor::CompressorEffect;
pub use delay::DelayEffect;
pub use filter::{FilterEffect, FilterMode};
pub use gain::GainEffect;
pub use reverb::{ConvolutionReverb, ImpulseResponse};

use crate::types::SampleBuffer;

/// Information about an effect parameter
#[derive(Debug, Clone)]
pub struct ParamInfo {
    /// Parameter name for display
    pub name: String,
    /// Default value (normalized 0.0-1.0)
    pub default: f32,
    /// Minimum actual value
    pub min: f32,
    /// Maximum actual value
    pub max: f32,
    /// Unit label (e.g., "ms", "dB", "Hz")
    pub unit: String,
}

impl Default for ParamInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            default: 0.5,
            min: 0.0,
            max: 1.0,
            unit: String::new(),
        }
    }
}

impl ParamInfo {
    /// Create a new parameter info with name and normalized default
    pub fn new(name: impl Into<String>, default: f32) -> Self {
        Self {
            name: name.into(),
            default,
            ..Default::default()
        }
    }

    /// Set the actual value range
    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Set the unit label
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }
}

/// Current parameter value in both representations
#[derive(Debug, Clone, Copy)]
pub struct ParamValue {
    /// Normalized value (0.0-1.0)
    pub normalized: f32,
    /// Actual value after range mapping
    pub actual: f32,
}

impl ParamValue {
    /// Create from a normalized value with the given param info
    ///
    /// The normalized value is clamped to [0, 1] before mapping.
    pub fn from_normalized(normalized: f32, info: &ParamInfo) -> Self {
        let normalized = normalized.clamp(0.0, 1.0);
        let actual = info.min + normalized * (info.max - info.min);
        Self { normalized, actual }
    }
}

/// Information about an effect
#[derive(Debug, Clone)]
pub struct EffectInfo {
    /// Effect name for display
    pub name: String,
    /// Effect category (e.g., "Filter", "Dynamics", "Delay")
    pub category: String,
    /// Parameter descriptions
    pub params: Vec<ParamInfo>,
}

impl EffectInfo {
    /// Create a new effect info
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            params: Vec::new(),
        }
    }

    /// Add a parameter to this effect
    pub fn with_param(mut self, param: ParamInfo) -> Self {
        self.params.push(param);
        self
    }

    /// Get the number of parameters
    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

/// The core effect trait - implemented by all processing stages
///
/// Stages process planar buffers in place at the sample rate they were
/// constructed with. All parameters are normalized (0.0-1.0).
pub trait Effect: Send {
    /// Process a buffer in place
    fn process(&mut self, buffer: &mut SampleBuffer);

    /// Get information about this effect (name, category, parameters)
    fn info(&self) -> &EffectInfo;

    /// Get the current parameter values
    fn get_params(&self) -> &[ParamValue];

    /// Set a parameter by index (normalized value 0.0-1.0)
    ///
    /// Out-of-range indices are ignored; out-of-range values are clamped.
    fn set_param(&mut self, index: usize, value: f32);

    /// Set the bypass state
    fn set_bypass(&mut self, bypass: bool);

    /// Check if the effect is bypassed
    fn is_bypassed(&self) -> bool;

    /// Reset internal state (delay lines, filter history, envelopes)
    fn reset(&mut self);
}

/// Base implementation helper for effects
///
/// Provides bypass state and normalized parameter storage.
#[derive(Debug, Clone)]
pub struct EffectBase {
    info: EffectInfo,
    params: Vec<ParamValue>,
    bypassed: bool,
}

impl EffectBase {
    /// Create a new effect base from effect info
    pub fn new(info: EffectInfo) -> Self {
        let params: Vec<ParamValue> = info
            .params
            .iter()
            .map(|p| ParamValue::from_normalized(p.default, p))
            .collect();
        Self {
            info,
            params,
            bypassed: false,
        }
    }

    /// Get the effect info
    pub fn info(&self) -> &EffectInfo {
        &self.info
    }

    /// Get the current parameter values
    pub fn get_params(&self) -> &[ParamValue] {
        &self.params
    }

    /// Set a parameter value (clamped to the parameter's range)
    pub fn set_param(&mut self, index: usize, value: f32) {
        if index < self.params.len() {
            self.params[index] = ParamValue::from_normalized(value, &self.info.params[index]);
        }
    }

    /// Get a parameter's actual (denormalized) value
    pub fn param_actual(&self, index: usize) -> f32 {
        self.params.get(index).map(|p| p.actual).unwrap_or(0.0)
    }

    /// Get a parameter's normalized value
    pub fn param_normalized(&self, index: usize) -> f32 {
        self.params.get(index).map(|p| p.normalized).unwrap_or(0.0)
    }

    /// Set bypass state
    pub fn set_bypass(&mut self, bypass: bool) {
        self.bypassed = bypass;
    }

    /// Check if bypassed
    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }
}
