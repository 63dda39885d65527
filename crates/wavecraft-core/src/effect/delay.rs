//! Feedback delay send effect
//!
//! A per-channel delay line with:
//! - Delay time in ms
//! - Feedback control
//! - Wet level for the send output

use crate::effect::{Effect, EffectBase, EffectInfo, ParamInfo, ParamValue};
use crate::types::SampleBuffer;

/// Maximum delay time in seconds
const MAX_DELAY_SECONDS: f32 = 2.0;

/// Single-channel circular delay line
struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,
}

impl DelayLine {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            delay_samples: capacity / 8,
        }
    }

    fn set_delay_samples(&mut self, samples: usize) {
        self.delay_samples = samples.clamp(1, self.buffer.len() - 1);
    }

    /// Read the sample written delay_samples ago
    #[inline]
    fn read(&self) -> f32 {
        let read_pos = if self.write_pos >= self.delay_samples {
            self.write_pos - self.delay_samples
        } else {
            self.buffer.len() - (self.delay_samples - self.write_pos)
        };
        self.buffer[read_pos]
    }

    /// Write to delay line and advance position
    #[inline]
    fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Process one sample through the delay with feedback
    #[inline]
    fn process(&mut self, input: f32, feedback: f32) -> f32 {
        let delayed = self.read();
        self.write(input + delayed * feedback);
        delayed
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// Delay effect meant for a send path
///
/// Parameters:
/// - Time: delay time in ms (10-2000ms)
/// - Feedback: amount of signal fed back (0-95%)
/// - Wet: wet output level (0-1)
///
/// The output replaces the input with the delayed (wet) signal scaled by the
/// wet level. The dry path is carried separately by the graph, so no dry
/// signal is mixed in here.
pub struct DelayEffect {
    base: EffectBase,
    lines: Vec<DelayLine>,
    sample_rate: u32,
}

impl DelayEffect {
    /// Create a new delay effect at the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        let info = EffectInfo::new("Delay", "Delay")
            .with_param(
                ParamInfo::new("Time", 0.245) // ~500ms
                    .with_range(10.0, 2000.0)
                    .with_unit("ms"),
            )
            .with_param(
                ParamInfo::new("Feedback", 0.4) // 38%
                    .with_range(0.0, 0.95),
            )
            .with_param(
                ParamInfo::new("Wet", 1.0).with_range(0.0, 1.0),
            );

        let capacity = (sample_rate as f32 * MAX_DELAY_SECONDS) as usize;
        let mut effect = Self {
            base: EffectBase::new(info),
            lines: (0..2).map(|_| DelayLine::new(capacity)).collect(),
            sample_rate,
        };
        effect.update_delay_time();
        effect
    }

    /// Delay time in ms
    fn delay_time_ms(&self) -> f32 {
        self.base.param_actual(0)
    }

    /// Feedback amount (0.0-0.95)
    fn feedback(&self) -> f32 {
        self.base.param_actual(1)
    }

    /// Wet output level (0.0-1.0)
    fn wet(&self) -> f32 {
        self.base.param_actual(2)
    }

    fn update_delay_time(&mut self) {
        let samples = (self.delay_time_ms() / 1000.0 * self.sample_rate as f32) as usize;
        for line in &mut self.lines {
            line.set_delay_samples(samples);
        }
    }
}

impl Effect for DelayEffect {
    fn process(&mut self, buffer: &mut SampleBuffer) {
        if self.base.is_bypassed() {
            return;
        }

        let feedback = self.feedback();
        let wet = self.wet();

        let channels = buffer.channel_count().min(self.lines.len());
        for ch in 0..channels {
            let line = &mut self.lines[ch];
            // channel index bounded above
            let samples = buffer.channel_mut(ch).expect("channel in range");
            for sample in samples.iter_mut() {
                *sample = line.process(*sample, feedback) * wet;
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
        if index == 0 {
            self.update_delay_time();
        }
    }

    fn set_bypass(&mut self, bypass: bool) {
        self.base.set_bypass(bypass);
    }

    fn is_bypassed(&self) -> bool {
        self.base.is_bypassed()
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
    }
}
