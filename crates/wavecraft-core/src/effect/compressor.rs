//! Dynamic range compressor
//!
//! Feed-forward design with a soft knee and exponential attack/release
//! smoothing. Channels are linked: the gain computer runs on the per-frame
//! peak across channels so the stereo image doesn't shift under compression.

use crate::effect::{Effect, EffectBase, EffectInfo, ParamInfo, ParamValue};
use crate::types::SampleBuffer;

/// Floor for the level detector, about -80 dBFS
const LEVEL_FLOOR: f32 = 1e-4;

/// Gain computer: dB in, dB of gain reduction out (always <= 0)
///
/// Below `threshold - knee/2` no reduction is applied; above
/// `threshold + knee/2` the full ratio applies; in between the transfer
/// curve is the standard quadratic knee interpolation.
#[inline]
fn gain_reduction_db(level_db: f32, threshold_db: f32, ratio: f32, knee_db: f32) -> f32 {
    let over = level_db - threshold_db;
    let half_knee = knee_db / 2.0;

    if over <= -half_knee {
        0.0
    } else if over >= half_knee {
        over * (1.0 / ratio - 1.0)
    } else {
        // Quadratic interpolation across the knee
        let t = over + half_knee;
        (1.0 / ratio - 1.0) * t * t / (2.0 * knee_db)
    }
}

/// Feed-forward soft-knee compressor
///
/// Parameters:
/// - Threshold: level above which compression starts (-60..0 dBFS)
/// - Ratio: compression ratio (1:1 to 20:1)
/// - Attack: envelope attack time (0.1-100ms)
/// - Release: envelope release time (10-1000ms)
/// - Knee: soft knee width (0-24 dB)
pub struct CompressorEffect {
    base: EffectBase,
    sample_rate: u32,
    /// Smoothed level estimate in linear amplitude
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

impl CompressorEffect {
    /// Create a new compressor at the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        let info = EffectInfo::new("Compressor", "Dynamics")
            .with_param(
                ParamInfo::new("Threshold", 0.7) // -18dBFS
                    .with_range(-60.0, 0.0)
                    .with_unit("dB"),
            )
            .with_param(
                ParamInfo::new("Ratio", 0.158) // 4:1
                    .with_range(1.0, 20.0)
                    .with_unit(":1"),
            )
            .with_param(
                ParamInfo::new("Attack", 0.1) // ~10ms
                    .with_range(0.1, 100.0)
                    .with_unit("ms"),
            )
            .with_param(
                ParamInfo::new("Release", 0.09) // ~100ms
                    .with_range(10.0, 1000.0)
                    .with_unit("ms"),
            )
            .with_param(
                ParamInfo::new("Knee", 0.25) // 6dB
                    .with_range(0.0, 24.0)
                    .with_unit("dB"),
            );

        let mut effect = Self {
            base: EffectBase::new(info),
            sample_rate,
            envelope: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
        };
        effect.update_coefficients();
        effect
    }

    /// Create with explicit settings (threshold dBFS, ratio, attack ms,
    /// release ms, knee dB)
    pub fn with_params(
        threshold_db: f32,
        ratio: f32,
        attack_ms: f32,
        release_ms: f32,
        knee_db: f32,
        sample_rate: u32,
    ) -> Self {
        let mut effect = Self::new(sample_rate);
        effect.set_param(0, (threshold_db + 60.0) / 60.0);
        effect.set_param(1, (ratio - 1.0) / 19.0);
        effect.set_param(2, (attack_ms - 0.1) / 99.9);
        effect.set_param(3, (release_ms - 10.0) / 990.0);
        effect.set_param(4, knee_db / 24.0);
        effect
    }

    fn update_coefficients(&mut self) {
        // First-order exponential: coeff = exp(-1 / (tau * fs))
        let attack_secs = self.base.param_actual(2) / 1000.0;
        let release_secs = self.base.param_actual(3) / 1000.0;
        self.attack_coeff = (-1.0 / (attack_secs * self.sample_rate as f32)).exp();
        self.release_coeff = (-1.0 / (release_secs * self.sample_rate as f32)).exp();
    }
}

impl Effect for CompressorEffect {
    fn process(&mut self, buffer: &mut SampleBuffer) {
        if self.base.is_bypassed() {
            return;
        }

        let threshold_db = self.base.param_actual(0);
        let ratio = self.base.param_actual(1);
        let knee_db = self.base.param_actual(4);
        let frame_count = buffer.frame_count();
        let channel_count = buffer.channel_count();

        for frame in 0..frame_count {
            // Linked detector: per-frame peak over all channels
            let mut peak = 0.0_f32;
            for ch in 0..channel_count {
                // channel index bounded by channel_count
                let s = buffer.channel(ch).expect("channel in range")[frame].abs();
                if s > peak {
                    peak = s;
                }
            }

            // Smooth the level with asymmetric attack/release
            let coeff = if peak > self.envelope {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.envelope = self.envelope * coeff + peak * (1.0 - coeff);

            let level_db = 20.0 * self.envelope.max(LEVEL_FLOOR).log10();
            let reduction_db = gain_reduction_db(level_db, threshold_db, ratio, knee_db);
            let gain = 10.0_f32.powf(reduction_db / 20.0);

            for ch in 0..channel_count {
                let samples = buffer.channel_mut(ch).expect("channel in range");
                samples[frame] *= gain;
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
        if index == 2 || index == 3 {
            self.update_coefficients();
        }
    }

    fn set_bypass(&mut self, bypass: bool) {
        self.base.set_bypass(bypass);
    }

    fn is_bypassed(&self) -> bool {
        self.base.is_bypassed()
    }

    fn reset(&mut self) {
        self.envelope = 0.0;
    }
}
