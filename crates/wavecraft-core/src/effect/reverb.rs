//! Convolution reverb send effect
//!
//! Convolves the input with a synthetic impulse response: exponentially
//! decaying noise, generated from a fixed seed so renders are repeatable.
//! Output is fully wet; the graph carries the dry path and applies the
//! send level.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::effect::{Effect, EffectBase, EffectInfo, ParamInfo, ParamValue};
use crate::error::{EngineError, EngineResult};
use crate::types::SampleBuffer;

/// Synthetic impulse response, one tap series per channel
pub struct ImpulseResponse {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl ImpulseResponse {
    /// Generate a decaying-noise impulse response.
    ///
    /// Each tap is `noise * (1 - n/len)^decay` where noise is uniform in
    /// [-1, 1]. A larger `decay` gives a shorter, tighter tail. The same
    /// seed always produces the same response.
    pub fn generate(
        duration_secs: f32,
        decay: f32,
        sample_rate: u32,
        channel_count: usize,
        seed: u64,
    ) -> EngineResult<Self> {
        if !(duration_secs > 0.0) || !(decay > 0.0) {
            return Err(EngineError::InvalidArgument(format!(
                "impulse response needs positive duration and decay, got {duration_secs}s / {decay}"
            )));
        }
        if channel_count == 0 || sample_rate == 0 {
            return Err(EngineError::InvalidArgument(
                "impulse response needs at least one channel and a nonzero sample rate".into(),
            ));
        }

        let len = ((duration_secs * sample_rate as f32) as usize).max(1);
        let mut rng = StdRng::seed_from_u64(seed);

        let channels = (0..channel_count)
            .map(|_| {
                (0..len)
                    .map(|n| {
                        let noise: f32 = rng.gen_range(-1.0..=1.0);
                        let envelope = (1.0 - n as f32 / len as f32).powf(decay);
                        noise * envelope
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Number of taps per channel
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn taps(&self, channel: usize) -> &[f32] {
        // Mono responses are shared across input channels
        &self.channels[channel.min(self.channels.len() - 1)]
    }
}

/// Per-channel convolution state: a ring of recent input samples
struct ConvolutionState {
    history: Vec<f32>,
    pos: usize,
}

impl ConvolutionState {
    fn new(taps: usize) -> Self {
        Self {
            history: vec![0.0; taps],
            pos: 0,
        }
    }

    /// Push one input sample and produce the convolved output
    #[inline]
    fn process(&mut self, input: f32, taps: &[f32]) -> f32 {
        self.history[self.pos] = input;

        let len = self.history.len();
        let mut acc = 0.0_f32;
        for (k, &tap) in taps.iter().enumerate() {
            let idx = (self.pos + len - k) % len;
            acc += tap * self.history[idx];
        }

        self.pos = (self.pos + 1) % len;
        acc
    }

    fn reset(&mut self) {
        self.history.fill(0.0);
        self.pos = 0;
    }
}

/// Direct-form convolution reverb
///
/// Cost is O(taps) per sample, which is fine for offline rendering and
/// for short responses in real time. Parameters:
/// - Wet: wet output level (0-1)
pub struct ConvolutionReverb {
    base: EffectBase,
    response: ImpulseResponse,
    states: Vec<ConvolutionState>,
}

impl ConvolutionReverb {
    /// Create a reverb around the given impulse response
    pub fn new(response: ImpulseResponse) -> Self {
        let info = EffectInfo::new("Reverb", "Reverb")
            .with_param(ParamInfo::new("Wet", 1.0).with_range(0.0, 1.0));

        let taps = response.len();
        Self {
            base: EffectBase::new(info),
            response,
            states: (0..2).map(|_| ConvolutionState::new(taps)).collect(),
        }
    }

    /// Length of the impulse response in taps
    pub fn response_len(&self) -> usize {
        self.response.len()
    }
}

impl Effect for ConvolutionReverb {
    fn process(&mut self, buffer: &mut SampleBuffer) {
        if self.base.is_bypassed() {
            return;
        }

        let wet = self.base.param_actual(0);
        let channels = buffer.channel_count().min(self.states.len());
        for ch in 0..channels {
            let taps = self.response.taps(ch);
            let state = &mut self.states[ch];
            // channel index bounded above
            let samples = buffer.channel_mut(ch).expect("channel in range");
            for sample in samples.iter_mut() {
                *sample = state.process(*sample, taps) * wet;
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
    }

    fn set_bypass(&mut self, bypass: bool) {
        self.base.set_bypass(bypass);
    }

    fn is_bypassed(&self) -> bool {
        self.base.is_bypassed()
    }

    fn reset(&mut self) {
        for state in &mut self.states {
            state.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_response() -> ImpulseResponse {
        ImpulseResponse::generate(0.01, 2.0, 44_100, 1, 7).unwrap()
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = ImpulseResponse::generate(0.1, 3.0, 44_100, 2, 42).unwrap();
        let b = ImpulseResponse::generate(0.1, 3.0, 44_100, 2, 42).unwrap();
        assert_eq!(a.channels, b.channels);

        let c = ImpulseResponse::generate(0.1, 3.0, 44_100, 2, 43).unwrap();
        assert_ne!(a.channels, c.channels);
    }

    #[test]
    fn test_envelope_decays() {
        let ir = ImpulseResponse::generate(0.5, 3.0, 44_100, 1, 1).unwrap();
        let taps = ir.taps(0);
        let head: f32 = taps[..100].iter().map(|t| t.abs()).sum();
        let tail: f32 = taps[taps.len() - 100..].iter().map(|t| t.abs()).sum();
        assert!(head > tail * 10.0, "tail should be much quieter than head");
    }

    #[test]
    fn test_invalid_arguments_rejected() {
        assert!(ImpulseResponse::generate(0.0, 1.0, 44_100, 1, 0).is_err());
        assert!(ImpulseResponse::generate(0.1, -1.0, 44_100, 1, 0).is_err());
        assert!(ImpulseResponse::generate(0.1, 1.0, 44_100, 0, 0).is_err());
        assert!(ImpulseResponse::generate(0.1, 1.0, 0, 1, 0).is_err());
    }

    #[test]
    fn test_impulse_reproduces_response() {
        let ir = short_response();
        let taps: Vec<f32> = ir.taps(0).to_vec();
        let mut reverb = ConvolutionReverb::new(ir);

        // A unit impulse convolved with the response yields the response
        let mut buffer = SampleBuffer::allocate(1, taps.len(), 44_100).unwrap();
        buffer.channel_mut(0).unwrap()[0] = 1.0;
        reverb.process(&mut buffer);

        let out = buffer.channel(0).unwrap();
        for (o, t) in out.iter().zip(taps.iter()) {
            assert!((o - t).abs() < 1e-5);
        }
    }

    #[test]
    fn test_output_is_fully_wet() {
        let mut reverb = ConvolutionReverb::new(short_response());
        let mut buffer = SampleBuffer::allocate(1, 32, 44_100).unwrap();
        buffer.channel_mut(0).unwrap()[5] = 1.0;
        let dry = buffer.channel(0).unwrap().to_vec();

        reverb.process(&mut buffer);
        assert_ne!(buffer.channel(0).unwrap(), &dry[..]);
    }

    #[test]
    fn test_reset_clears_tail() {
        let mut reverb = ConvolutionReverb::new(short_response());
        let mut buffer = SampleBuffer::allocate(1, 64, 44_100).unwrap();
        buffer.channel_mut(0).unwrap().fill(1.0);
        reverb.process(&mut buffer);

        reverb.reset();

        let mut silent = SampleBuffer::allocate(1, 64, 44_100).unwrap();
        reverb.process(&mut silent);
        assert_eq!(silent.peak(), 0.0);
    }
}
