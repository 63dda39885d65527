//! Gain stage - simple volume control

use crate::effect::{Effect, EffectBase, EffectInfo, ParamInfo, ParamValue};
use crate::types::SampleBuffer;

/// A simple gain (volume) stage
///
/// Parameters:
/// - Gain: volume multiplier (0.0 = silence, 1.0 = unity, 2.0 = +6dB)
pub struct GainEffect {
    base: EffectBase,
}

impl GainEffect {
    /// Create a new gain stage at unity
    pub fn new() -> Self {
        let info = EffectInfo::new("Gain", "Utility").with_param(
            ParamInfo::new("Gain", 0.5) // 0.5 normalized = unity on the 0-2 range
                .with_range(0.0, 2.0)
                .with_unit("x"),
        );

        Self {
            base: EffectBase::new(info),
        }
    }

    /// Create with an explicit linear gain value
    pub fn with_gain(gain: f32) -> Self {
        let mut effect = Self::new();
        effect.base.set_param(0, (gain / 2.0).clamp(0.0, 1.0));
        effect
    }

    fn gain(&self) -> f32 {
        self.base.param_actual(0)
    }
}

impl Default for GainEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for GainEffect {
    fn process(&mut self, buffer: &mut SampleBuffer) {
        if self.base.is_bypassed() {
            return;
        }
        buffer.scale(self.gain());
    }

    fn info(&self) -> &EffectInfo {
        self.base.info()
    }

    fn get_params(&self) -> &[ParamValue] {
        self.base.get_params()
    }

    fn set_param(&mut self, index: usize, value: f32) {
        self.base.set_param(index, value);
    }

    fn set_bypass(&mut self, bypass: bool) {
        self.base.set_bypass(bypass);
    }

    fn is_bypassed(&self) -> bool {
        self.base.is_bypassed()
    }

    fn reset(&mut self) {
        // No state to reset
    }
}
