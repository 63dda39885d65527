//! Filter stage - biquad with low-pass, high-pass, shelf and peaking modes

use crate::effect::{Effect, EffectBase, EffectInfo, ParamInfo, ParamValue};
use crate::types::SampleBuffer;

/// Supported filter responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FilterMode {
    LowPass,
    HighPass,
    /// Boost/cut below the corner frequency
    LowShelf,
    /// Boost/cut above the corner frequency
    HighShelf,
    /// Boost/cut around the center frequency
    Peaking,
}

/// Maximum channels the per-channel filter state covers
const MAX_CHANNELS: usize = 2;

/// Two-pole biquad (RBJ cookbook coefficients), direct form 1
struct Biquad {
    // Normalized coefficients (a0 divided out)
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    // Per-channel history: x[n-1], x[n-2], y[n-1], y[n-2]
    x1: [f32; MAX_CHANNELS],
    x2: [f32; MAX_CHANNELS],
    y1: [f32; MAX_CHANNELS],
    y2: [f32; MAX_CHANNELS],
}

impl Biquad {
    fn new() -> Self {
        let mut f = Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: [0.0; MAX_CHANNELS],
            x2: [0.0; MAX_CHANNELS],
            y1: [0.0; MAX_CHANNELS],
            y2: [0.0; MAX_CHANNELS],
        };
        f.set_coefficients(FilterMode::LowPass, 1000.0, 0.707, 0.0, 44_100);
        f
    }

    fn set_coefficients(
        &mut self,
        mode: FilterMode,
        frequency: f32,
        q: f32,
        gain_db: f32,
        sample_rate: u32,
    ) {
        let nyquist = sample_rate as f32 / 2.0;
        let frequency = frequency.clamp(10.0, nyquist * 0.99);
        let q = q.clamp(0.1, 18.0);

        let omega = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
        let (sin_w, cos_w) = omega.sin_cos();
        let alpha = sin_w / (2.0 * q);
        // Shelf/peaking amplitude
        let a = 10.0_f32.powf(gain_db / 40.0);

        let (b0, b1, b2, a0, a1, a2) = match mode {
            FilterMode::LowPass => {
                let b1 = 1.0 - cos_w;
                let b0 = b1 / 2.0;
                (b0, b1, b0, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
            }
            FilterMode::HighPass => {
                let b1 = -(1.0 + cos_w);
                let b0 = (1.0 + cos_w) / 2.0;
                (b0, b1, b0, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
            }
            FilterMode::LowShelf => {
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w),
                    a * ((a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha),
                    (a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w),
                    (a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha,
                )
            }
            FilterMode::HighShelf => {
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w),
                    a * ((a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha),
                    (a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w),
                    (a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha,
                )
            }
            FilterMode::Peaking => (
                1.0 + alpha * a,
                -2.0 * cos_w,
                1.0 - alpha * a,
                1.0 + alpha / a,
                -2.0 * cos_w,
                1.0 - alpha / a,
            ),
        };

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    #[inline]
    fn process(&mut self, channel: usize, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1[channel] + self.b2 * self.x2[channel]
            - self.a1 * self.y1[channel]
            - self.a2 * self.y2[channel];
        self.x2[channel] = self.x1[channel];
        self.x1[channel] = x;
        self.y2[channel] = self.y1[channel];
        self.y1[channel] = y;
        y
    }

    fn reset(&mut self) {
        self.x1 = [0.0; MAX_CHANNELS];
        self.x2 = [0.0; MAX_CHANNELS];
        self.y1 = [0.0; MAX_CHANNELS];
        self.y2 = [0.0; MAX_CHANNELS];
    }
}

/// Biquad filter stage
///
/// Parameters:
/// - Frequency: center/corner frequency (20Hz-20kHz)
/// - Q: resonance/bandwidth (0.1-18)
/// - Gain: boost/cut in dB, used by the shelf and peaking modes
///
/// Coefficients are recomputed only when a parameter or the mode changes,
/// never per sample.
pub struct FilterEffect {
    base: EffectBase,
    mode: FilterMode,
    filter: Biquad,
    sample_rate: u32,
}

impl FilterEffect {
    /// Create a new filter at the given sample rate
    pub fn new(mode: FilterMode, sample_rate: u32) -> Self {
        let info = EffectInfo::new("Filter", "Filter")
            .with_param(
                ParamInfo::new("Frequency", 0.5)
                    .with_range(20.0, 20_000.0)
                    .with_unit("Hz"),
            )
            .with_param(
                ParamInfo::new("Q", 0.033) // ~0.707 on the 0.1-18 range
                    .with_range(0.1, 18.0)
                    .with_unit("Q"),
            )
            .with_param(
                ParamInfo::new("Gain", 0.5) // 0dB at center of -24..24
                    .with_range(-24.0, 24.0)
                    .with_unit("dB"),
            );

        let mut effect = Self {
            base: EffectBase::new(info),
            mode,
            filter: Biquad::new(),
            sample_rate,
        };
        effect.update_coefficients();
        effect
    }

    /// Create with explicit parameter values (frequency Hz, Q, gain dB)
    pub fn with_params(
        mode: FilterMode,
        frequency: f32,
        q: f32,
        gain_db: f32,
        sample_rate: u32,
    ) -> Self {
        let mut effect = Self::new(mode, sample_rate);
        effect.set_param(0, (frequency - 20.0) / (20_000.0 - 20.0));
        effect.set_param(1, (q - 0.1) / (18.0 - 0.1));
        effect.set_param(2, (gain_db + 24.0) / 48.0);
        effect
    }

    /// Current filter mode
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Change the filter response mode
    pub fn set_mode(&mut self, mode: FilterMode) {
        self.mode = mode;
        self.update_coefficients();
    }

    fn update_coefficients(&mut self) {
        self.filter.set_coefficients(
            self.mode,
            self.base.param_actual(0),
            self.base.param_actual(1),
            self.base.param_actual(2),
            self.sample_rate,
        );
    }
}

impl Effect for FilterEffect {
    fn process(&mut self, buffer: &mut SampleBuffer) {
        if self.base.is_bypassed() {
            return;
        }

        let channels = buffer.channel_count().min(MAX_CHANNELS);
        for ch in 0..channels {
            // channel index bounded above
            let samples = buffer.channel_mut(ch).expect("channel in range");
            for sample in samples.iter_mut() {
                *sample = self.filter.process(ch, *sample);
            }
        }
    }

    fn info(&self) -> &EffectInfo {
        self.base.info()
    }

    fn get_params(&self) -> &[ParamValue] {
        self.base.get_params()
    }

    fn set_param(&mut self, index: usize, value: f32) {
        self.base.set_param(index, value);
        self.update_coefficients();
    }

    fn set_bypass(&mut self, bypass: bool) {
        self.base.set_bypass(bypass);
    }

    fn is_bypassed(&self) -> bool {
        self.base.is_bypassed()
    }

    fn reset(&mut self) {
        self.filter.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mean absolute amplitude of channel 0
    fn mean_level(buffer: &SampleBuffer) -> f32 {
        let samples = buffer.channel(0).unwrap();
        samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32
    }

    fn nyquist_buzz(frames: usize) -> SampleBuffer {
        // Alternating +1/-1 is the highest representable frequency
        let mut buffer = SampleBuffer::allocate(1, frames, 44_100).unwrap();
        for (i, s) in buffer.channel_mut(0).unwrap().iter_mut().enumerate() {
            *s = if i % 2 == 0 { 1.0 } else { -1.0 };
        }
        buffer
    }

    fn dc_hold(frames: usize) -> SampleBuffer {
        let mut buffer = SampleBuffer::allocate(1, frames, 44_100).unwrap();
        buffer.channel_mut(0).unwrap().fill(1.0);
        buffer
    }

    #[test]
    fn test_lowpass_attenuates_high_frequencies() {
        let mut effect = FilterEffect::with_params(FilterMode::LowPass, 500.0, 0.707, 0.0, 44_100);
        let mut buffer = nyquist_buzz(512);
        effect.process(&mut buffer);
        assert!(
            mean_level(&buffer) < 0.05,
            "low-pass should kill the Nyquist buzz"
        );
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut effect = FilterEffect::with_params(FilterMode::LowPass, 500.0, 0.707, 0.0, 44_100);
        let mut buffer = dc_hold(4096);
        effect.process(&mut buffer);
        // After settling, DC passes at unity
        let tail = &buffer.channel(0).unwrap()[3000..];
        let tail_mean = tail.iter().sum::<f32>() / tail.len() as f32;
        assert!((tail_mean - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut effect =
            FilterEffect::with_params(FilterMode::HighPass, 500.0, 0.707, 0.0, 44_100);
        let mut buffer = dc_hold(4096);
        effect.process(&mut buffer);
        let tail = &buffer.channel(0).unwrap()[3000..];
        let tail_mean = tail.iter().map(|s| s.abs()).sum::<f32>() / tail.len() as f32;
        assert!(tail_mean < 0.05, "high-pass should block DC");
    }

    #[test]
    fn test_highshelf_boosts_highs() {
        let mut boosted =
            FilterEffect::with_params(FilterMode::HighShelf, 2000.0, 0.707, 12.0, 44_100);
        let mut buffer = nyquist_buzz(512);
        boosted.process(&mut buffer);
        assert!(
            mean_level(&buffer) > 1.5,
            "+12dB high shelf should boost the buzz well above unity"
        );
    }

    #[test]
    fn test_peaking_flat_at_zero_gain() {
        let mut effect =
            FilterEffect::with_params(FilterMode::Peaking, 1000.0, 1.0, 0.0, 44_100);
        let mut buffer = nyquist_buzz(512);
        effect.process(&mut buffer);
        // Zero-gain peaking is an identity filter
        assert!((mean_level(&buffer) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut effect = FilterEffect::with_params(FilterMode::LowPass, 200.0, 0.707, 0.0, 44_100);
        let mut buffer = dc_hold(1024);
        effect.process(&mut buffer);
        effect.reset();

        // After reset, silence in gives silence out
        let mut silent = SampleBuffer::allocate(1, 256, 44_100).unwrap();
        effect.process(&mut silent);
        assert_eq!(silent.peak(), 0.0);
    }

    #[test]
    fn test_mode_switch_updates_response() {
        let mut effect = FilterEffect::with_params(FilterMode::LowPass, 500.0, 0.707, 0.0, 44_100);
        effect.set_mode(FilterMode::HighPass);
        assert_eq!(effect.mode(), FilterMode::HighPass);

        let mut buffer = nyquist_buzz(512);
        effect.process(&mut buffer);
        // High-pass with a 500Hz corner passes the buzz nearly untouched
        assert!(mean_level(&buffer) > 0.9);
    }
}
