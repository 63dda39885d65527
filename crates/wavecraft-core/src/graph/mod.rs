//! Effect graph - declarative mix topology compiled into a render plan
//!
//! A [`GraphSpec`] describes the stages declaratively; [`EffectGraph::connect`]
//! validates it once against a [`RenderContext`] and compiles it into a flat
//! render plan. The topology is fixed:
//!
//! ```text
//! input -> [inserts, in order] -+-> dry -----------------+-> output
//!                               +-> reverb send * level -+
//!                               +-> delay send * level --+
//! ```
//!
//! Inserts (gain, filter, compressor) process the signal in series. Sends
//! tap the post-insert signal, run their effect fully wet, and are summed
//! back scaled by their send level. Send levels default to zero, so a fresh
//! graph passes the dry chain through unchanged.
//!
//! Parameter changes while connected go through the [`GraphController`]
//! returned by `connect`, and take effect at the next block boundary.

mod command;

pub use command::{command_channel, GraphCommand, GraphController, StageShape};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::device::RenderContext;
use crate::effect::{
    CompressorEffect, ConvolutionReverb, DelayEffect, Effect, FilterEffect, FilterMode,
    GainEffect, ImpulseResponse,
};
use crate::error::{EngineError, EngineResult};
use crate::types::SampleBuffer;

fn default_gain() -> f32 {
    1.0
}
fn default_frequency() -> f32 {
    1000.0
}
fn default_q() -> f32 {
    0.707
}
fn default_threshold_db() -> f32 {
    -18.0
}
fn default_ratio() -> f32 {
    4.0
}
fn default_attack_ms() -> f32 {
    10.0
}
fn default_release_ms() -> f32 {
    100.0
}
fn default_knee_db() -> f32 {
    6.0
}
fn default_reverb_duration() -> f32 {
    1.5
}
fn default_reverb_decay() -> f32 {
    3.0
}
fn default_delay_time_ms() -> f32 {
    500.0
}
fn default_delay_feedback() -> f32 {
    0.35
}

/// One stage in a graph description
///
/// Gain, Filter and Compressor are inserts; Reverb and Delay are sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StageSpec {
    Gain {
        #[serde(default = "default_gain")]
        gain: f32,
    },
    Filter {
        mode: FilterMode,
        #[serde(default = "default_frequency")]
        frequency: f32,
        #[serde(default = "default_q")]
        q: f32,
        #[serde(default)]
        gain_db: f32,
    },
    Compressor {
        #[serde(default = "default_threshold_db")]
        threshold_db: f32,
        #[serde(default = "default_ratio")]
        ratio: f32,
        #[serde(default = "default_attack_ms")]
        attack_ms: f32,
        #[serde(default = "default_release_ms")]
        release_ms: f32,
        #[serde(default = "default_knee_db")]
        knee_db: f32,
    },
    Reverb {
        #[serde(default = "default_reverb_duration")]
        duration_secs: f32,
        #[serde(default = "default_reverb_decay")]
        decay: f32,
        #[serde(default)]
        seed: u64,
        /// Send level, silent by default
        #[serde(default)]
        send: f32,
    },
    Delay {
        #[serde(default = "default_delay_time_ms")]
        time_ms: f32,
        #[serde(default = "default_delay_feedback")]
        feedback: f32,
        /// Send level, silent by default
        #[serde(default)]
        send: f32,
    },
}

impl StageSpec {
    fn is_send(&self) -> bool {
        matches!(self, StageSpec::Reverb { .. } | StageSpec::Delay { .. })
    }

    /// Check the stage against the render sample rate
    fn validate(&self, index: usize, sample_rate: u32) -> EngineResult<()> {
        let err = |msg: String| Err(EngineError::InvalidArgument(format!("stage {index}: {msg}")));
        match *self {
            StageSpec::Gain { gain } => {
                if !gain.is_finite() || !(0.0..=2.0).contains(&gain) {
                    return err(format!("gain must be in 0..=2, got {gain}"));
                }
            }
            StageSpec::Filter { frequency, q, .. } => {
                if !(frequency > 0.0) || frequency >= sample_rate as f32 / 2.0 {
                    return err(format!("frequency {frequency}Hz out of range for {sample_rate}Hz"));
                }
                if !(q > 0.0) {
                    return err(format!("q must be positive, got {q}"));
                }
            }
            StageSpec::Compressor {
                ratio,
                attack_ms,
                release_ms,
                knee_db,
                ..
            } => {
                if !(ratio >= 1.0) {
                    return err(format!("ratio must be >= 1, got {ratio}"));
                }
                if !(attack_ms > 0.0) || !(release_ms > 0.0) {
                    return err("attack and release must be positive".into());
                }
                if !(knee_db >= 0.0) {
                    return err(format!("knee must be non-negative, got {knee_db}"));
                }
            }
            StageSpec::Reverb {
                duration_secs,
                decay,
                send,
                ..
            } => {
                if !(duration_secs > 0.0) || !(decay > 0.0) {
                    return err("reverb duration and decay must be positive".into());
                }
                if !(0.0..=1.0).contains(&send) {
                    return err(format!("send level must be in 0..=1, got {send}"));
                }
            }
            StageSpec::Delay {
                time_ms,
                feedback,
                send,
            } => {
                if !(time_ms > 0.0) {
                    return err(format!("delay time must be positive, got {time_ms}"));
                }
                if !(0.0..1.0).contains(&feedback) {
                    return err(format!("feedback must be in 0..1, got {feedback}"));
                }
                if !(0.0..=1.0).contains(&send) {
                    return err(format!("send level must be in 0..=1, got {send}"));
                }
            }
        }
        Ok(())
    }
}

/// Declarative description of a processing graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSpec {
    pub stages: Vec<StageSpec>,
}

impl GraphSpec {
    /// The standard mix: unity gain, gentle low-pass, 4:1 compressor, plus
    /// reverb and delay sends (silent until a send level is raised)
    pub fn standard() -> Self {
        Self {
            stages: vec![
                StageSpec::Gain { gain: 1.0 },
                StageSpec::Filter {
                    mode: FilterMode::LowPass,
                    frequency: 18_000.0,
                    q: default_q(),
                    gain_db: 0.0,
                },
                StageSpec::Compressor {
                    threshold_db: default_threshold_db(),
                    ratio: default_ratio(),
                    attack_ms: default_attack_ms(),
                    release_ms: default_release_ms(),
                    knee_db: default_knee_db(),
                },
                StageSpec::Reverb {
                    duration_secs: default_reverb_duration(),
                    decay: default_reverb_decay(),
                    seed: 0,
                    send: 0.0,
                },
                StageSpec::Delay {
                    time_ms: default_delay_time_ms(),
                    feedback: default_delay_feedback(),
                    send: 0.0,
                },
            ],
        }
    }

    fn validate(&self, sample_rate: u32) -> EngineResult<()> {
        for (index, stage) in self.stages.iter().enumerate() {
            stage.validate(index, sample_rate)?;
        }
        Ok(())
    }
}

/// Lifecycle of a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    /// Built from a spec, not yet attached to a context
    Configured,
    /// Attached and processing
    Connected,
    /// Detached; can be connected again
    Disconnected,
}

/// A compiled stage: the effect plus its routing
struct CompiledStage {
    effect: Box<dyn Effect>,
    /// `Some(level)` for send stages, `None` for inserts
    send: Option<f32>,
}

/// Everything the render path needs, built once at connect
struct RenderPlan {
    stages: Vec<CompiledStage>,
    block_size: usize,
    /// Post-insert signal tapped for the sends
    tap: SampleBuffer,
    /// Per-send wet scratch
    wet: SampleBuffer,
}

impl RenderPlan {
    fn reshape_scratch(&mut self, channels: usize, frames: usize) {
        if self.tap.channel_count() != channels || self.tap.frame_count() != frames {
            // Only happens on the first block and on partial final blocks
            self.tap = SampleBuffer::allocate(channels, frames, self.tap.sample_rate())
                .unwrap_or_else(|_| self.tap.clone());
            self.wet = self.tap.clone();
        }
    }
}

/// An effect graph, from description to running render plan
pub struct EffectGraph {
    spec: GraphSpec,
    state: GraphState,
    plan: Option<RenderPlan>,
    commands: Option<rtrb::Consumer<GraphCommand>>,
    /// Attach slot shared with the context; cleared on disconnect
    attach_slot: Option<Arc<AtomicBool>>,
}

impl EffectGraph {
    /// Build a graph from a spec
    pub fn new(spec: GraphSpec) -> Self {
        Self {
            spec,
            state: GraphState::Configured,
            plan: None,
            commands: None,
            attach_slot: None,
        }
    }

    pub fn state(&self) -> GraphState {
        self.state
    }

    pub fn spec(&self) -> &GraphSpec {
        &self.spec
    }

    /// Validate the spec against the context, compile the render plan and
    /// claim the context's attach slot.
    ///
    /// Returns the controller for live parameter changes. Fails with
    /// [`EngineError::AlreadyConnected`] if this graph is already connected
    /// or the context already has another graph attached.
    pub fn connect(&mut self, ctx: &mut RenderContext) -> EngineResult<GraphController> {
        if self.state == GraphState::Connected {
            return Err(EngineError::AlreadyConnected);
        }

        let sample_rate = ctx.sample_rate();
        self.spec.validate(sample_rate)?;

        let slot = ctx.try_attach()?;

        let mut stages = Vec::with_capacity(self.spec.stages.len());
        let mut shapes = Vec::with_capacity(self.spec.stages.len());
        for stage in &self.spec.stages {
            let compiled = compile_stage(stage, sample_rate)?;
            shapes.push(StageShape {
                param_count: compiled.effect.info().param_count(),
                is_send: compiled.send.is_some(),
            });
            stages.push(compiled);
        }

        let block_size = ctx.block_size();
        let tap = SampleBuffer::allocate(1, block_size, sample_rate)?;
        let wet = tap.clone();
        self.plan = Some(RenderPlan {
            stages,
            block_size,
            tap,
            wet,
        });

        let (producer, consumer) = command_channel();
        self.commands = Some(consumer);
        self.attach_slot = Some(slot);
        self.state = GraphState::Connected;

        info!(
            "graph connected: {} stages at {}Hz, {} frame blocks",
            self.spec.stages.len(),
            sample_rate,
            block_size
        );
        Ok(GraphController::new(producer, shapes))
    }

    /// Detach from the context and drop the render plan
    pub fn disconnect(&mut self) -> EngineResult<()> {
        if self.state != GraphState::Connected {
            return Err(EngineError::NotConnected);
        }
        if let Some(slot) = self.attach_slot.take() {
            slot.store(false, Ordering::Release);
        }
        self.plan = None;
        self.commands = None;
        self.state = GraphState::Disconnected;
        info!("graph disconnected");
        Ok(())
    }

    /// Process one block in place
    ///
    /// Pending controller commands are applied first, then the insert chain
    /// runs in order, then each send taps the post-insert signal and its
    /// scaled wet output is summed back in. The block must not exceed the
    /// context's block size.
    pub fn process_block(&mut self, buffer: &mut SampleBuffer) -> EngineResult<()> {
        if self.state != GraphState::Connected {
            return Err(EngineError::NotConnected);
        }
        // Connected implies the plan and consumer exist
        let plan = self.plan.as_mut().expect("connected graph has a plan");
        let commands = self.commands.as_mut().expect("connected graph has a queue");

        if buffer.frame_count() > plan.block_size {
            return Err(EngineError::InvalidArgument(format!(
                "block of {} frames exceeds block size {}",
                buffer.frame_count(),
                plan.block_size
            )));
        }

        while let Ok(command) = commands.pop() {
            apply_command(plan, &command);
        }

        if buffer.is_empty() {
            return Ok(());
        }

        // Insert chain in series
        for stage in plan.stages.iter_mut().filter(|s| s.send.is_none()) {
            stage.effect.process(buffer);
        }

        let has_audible_send = plan
            .stages
            .iter()
            .any(|s| matches!(s.send, Some(level) if level > 0.0));
        if !has_audible_send {
            // Send effects still consume the tap so their tails stay in time
            plan.reshape_scratch(buffer.channel_count(), buffer.frame_count());
            for stage in plan.stages.iter_mut().filter(|s| s.send.is_some()) {
                plan.wet.copy_from(buffer);
                stage.effect.process(&mut plan.wet);
            }
            return Ok(());
        }

        plan.reshape_scratch(buffer.channel_count(), buffer.frame_count());
        plan.tap.copy_from(buffer);

        for stage in plan.stages.iter_mut() {
            let Some(level) = stage.send else { continue };
            plan.wet.copy_from(&plan.tap);
            stage.effect.process(&mut plan.wet);
            plan.wet.scale(level);
            buffer.add_buffer(&plan.wet);
        }
        Ok(())
    }

    /// Render a whole buffer offline, chunked by the context block size
    ///
    /// The input is untouched; the processed signal is returned as a new
    /// buffer. Stage state is reset first so renders are repeatable.
    pub fn render_offline(&mut self, input: &SampleBuffer) -> EngineResult<SampleBuffer> {
        if self.state != GraphState::Connected {
            return Err(EngineError::NotConnected);
        }
        let block_size = self.plan.as_ref().expect("connected graph has a plan").block_size;

        if let Some(plan) = self.plan.as_mut() {
            for stage in plan.stages.iter_mut() {
                stage.effect.reset();
            }
        }

        let frame_count = input.frame_count();
        let mut output =
            SampleBuffer::allocate(input.channel_count(), frame_count, input.sample_rate())?;

        let mut start = 0;
        while start < frame_count {
            let end = (start + block_size).min(frame_count);
            let mut block = input.copy_range(start, end)?;
            self.process_block(&mut block)?;
            for ch in 0..output.channel_count() {
                output.channel_mut(ch)?[start..end].copy_from_slice(block.channel(ch)?);
            }
            start = end;
        }

        debug!("offline render: {} frames in {} frame blocks", frame_count, block_size);
        Ok(output)
    }
}

fn compile_stage(spec: &StageSpec, sample_rate: u32) -> EngineResult<CompiledStage> {
    let stage = match *spec {
        StageSpec::Gain { gain } => CompiledStage {
            effect: Box::new(GainEffect::with_gain(gain)),
            send: None,
        },
        StageSpec::Filter {
            mode,
            frequency,
            q,
            gain_db,
        } => CompiledStage {
            effect: Box::new(FilterEffect::with_params(mode, frequency, q, gain_db, sample_rate)),
            send: None,
        },
        StageSpec::Compressor {
            threshold_db,
            ratio,
            attack_ms,
            release_ms,
            knee_db,
        } => CompiledStage {
            effect: Box::new(CompressorEffect::with_params(
                threshold_db,
                ratio,
                attack_ms,
                release_ms,
                knee_db,
                sample_rate,
            )),
            send: None,
        },
        StageSpec::Reverb {
            duration_secs,
            decay,
            seed,
            send,
        } => {
            // One independent noise sequence per channel
            let response = ImpulseResponse::generate(
                duration_secs,
                decay,
                sample_rate,
                crate::types::MAX_CODEC_CHANNELS,
                seed,
            )?;
            CompiledStage {
                effect: Box::new(ConvolutionReverb::new(response)),
                send: Some(send),
            }
        }
        StageSpec::Delay {
            time_ms,
            feedback,
            send,
        } => {
            let mut delay = DelayEffect::new(sample_rate);
            delay.set_param(0, (time_ms - 10.0) / 1990.0);
            delay.set_param(1, feedback / 0.95);
            CompiledStage {
                effect: Box::new(delay),
                send: Some(send),
            }
        }
    };
    Ok(stage)
}

fn apply_command(plan: &mut RenderPlan, command: &GraphCommand) {
    match *command {
        GraphCommand::SetParam {
            stage,
            param,
            value,
        } => {
            // Controller validated the indices against the compiled shape
            if let Some(s) = plan.stages.get_mut(stage) {
                s.effect.set_param(param, value);
            }
        }
        GraphCommand::SetBypass { stage, bypass } => {
            if let Some(s) = plan.stages.get_mut(stage) {
                s.effect.set_bypass(bypass);
            }
        }
        GraphCommand::SetSendLevel { stage, level } => {
            if let Some(s) = plan.stages.get_mut(stage) {
                if s.send.is_some() {
                    s.send = Some(level);
                }
            }
        }
        GraphCommand::ResetStages => {
            for s in plan.stages.iter_mut() {
                s.effect.reset();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn context() -> RenderContext {
        RenderContext::open(&EngineConfig::default()).unwrap()
    }

    fn ramp(frames: usize) -> SampleBuffer {
        let mut buffer = SampleBuffer::allocate(1, frames, 44_100).unwrap();
        for (i, s) in buffer.channel_mut(0).unwrap().iter_mut().enumerate() {
            *s = (i as f32 / frames as f32) * 0.5;
        }
        buffer
    }

    #[test]
    fn test_state_machine() {
        let mut ctx = context();
        let mut graph = EffectGraph::new(GraphSpec::standard());
        assert_eq!(graph.state(), GraphState::Configured);

        let _ctl = graph.connect(&mut ctx).unwrap();
        assert_eq!(graph.state(), GraphState::Connected);
        assert!(matches!(graph.connect(&mut ctx), Err(EngineError::AlreadyConnected)));

        graph.disconnect().unwrap();
        assert_eq!(graph.state(), GraphState::Disconnected);
        assert!(matches!(graph.disconnect(), Err(EngineError::NotConnected)));

        // Disconnected graphs can reconnect
        let _ctl = graph.connect(&mut ctx).unwrap();
        assert_eq!(graph.state(), GraphState::Connected);
    }

    #[test]
    fn test_context_allows_one_graph() {
        let mut ctx = context();
        let mut first = EffectGraph::new(GraphSpec::standard());
        let mut second = EffectGraph::new(GraphSpec::standard());

        let _ctl = first.connect(&mut ctx).unwrap();
        assert!(matches!(second.connect(&mut ctx), Err(EngineError::AlreadyConnected)));

        first.disconnect().unwrap();
        assert!(second.connect(&mut ctx).is_ok());
    }

    #[test]
    fn test_process_requires_connection() {
        let mut graph = EffectGraph::new(GraphSpec::standard());
        let mut buffer = ramp(64);
        assert!(matches!(
            graph.process_block(&mut buffer),
            Err(EngineError::NotConnected)
        ));
    }

    #[test]
    fn test_empty_graph_is_passthrough() {
        let mut ctx = context();
        let mut graph = EffectGraph::new(GraphSpec::default());
        let _ctl = graph.connect(&mut ctx).unwrap();

        let mut buffer = ramp(256);
        let original = buffer.clone();
        graph.process_block(&mut buffer).unwrap();
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_silent_sends_leave_dry_chain() {
        let mut ctx = context();
        // Unity inserts; sends present but at level zero
        let mut graph = EffectGraph::new(GraphSpec {
            stages: vec![
                StageSpec::Gain { gain: 1.0 },
                StageSpec::Delay {
                    time_ms: 100.0,
                    feedback: 0.0,
                    send: 0.0,
                },
            ],
        });
        let _ctl = graph.connect(&mut ctx).unwrap();

        let mut buffer = ramp(256);
        let original = buffer.clone();
        graph.process_block(&mut buffer).unwrap();
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_insert_gain_applies() {
        let mut ctx = context();
        let mut graph = EffectGraph::new(GraphSpec {
            stages: vec![StageSpec::Gain { gain: 0.5 }],
        });
        let _ctl = graph.connect(&mut ctx).unwrap();

        let mut buffer = SampleBuffer::allocate(1, 128, 44_100).unwrap();
        buffer.channel_mut(0).unwrap().fill(0.8);
        graph.process_block(&mut buffer).unwrap();
        for &s in buffer.channel(0).unwrap() {
            assert!((s - 0.4).abs() < 1e-6);
        }
    }

    #[test]
    fn test_send_adds_wet_signal() {
        let mut ctx = context();
        let mut graph = EffectGraph::new(GraphSpec {
            stages: vec![StageSpec::Delay {
                time_ms: 10.0,
                feedback: 0.0,
                send: 1.0,
            }],
        });
        let _ctl = graph.connect(&mut ctx).unwrap();

        // Impulse at frame 0; the echo lands ~441 frames later
        let mut input = SampleBuffer::allocate(1, 1024, 44_100).unwrap();
        input.channel_mut(0).unwrap()[0] = 1.0;
        let output = graph.render_offline(&input).unwrap();

        let samples = output.channel(0).unwrap();
        assert!((samples[0] - 1.0).abs() < 1e-5, "dry path is untouched");
        let echo = samples[300..600].iter().any(|s| s.abs() > 0.5);
        assert!(echo, "send echo should appear after the delay time");
    }

    #[test]
    fn test_commands_take_effect_next_block() {
        let mut ctx = context();
        let mut graph = EffectGraph::new(GraphSpec {
            stages: vec![StageSpec::Gain { gain: 1.0 }],
        });
        let mut ctl = graph.connect(&mut ctx).unwrap();

        let mut first = SampleBuffer::allocate(1, 64, 44_100).unwrap();
        first.channel_mut(0).unwrap().fill(1.0);
        graph.process_block(&mut first).unwrap();
        assert!((first.channel(0).unwrap()[0] - 1.0).abs() < 1e-6);

        // Gain param 0 normalized: 0.25 of 0..2 is 0.5 linear
        ctl.set_param(0, 0, 0.25).unwrap();

        let mut second = SampleBuffer::allocate(1, 64, 44_100).unwrap();
        second.channel_mut(0).unwrap().fill(1.0);
        graph.process_block(&mut second).unwrap();
        assert!((second.channel(0).unwrap()[0] - 0.5).abs() < 1e-6);
        // The whole block sees the new value
        assert!((second.channel(0).unwrap()[63] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_send_level_command() {
        let mut ctx = context();
        let mut graph = EffectGraph::new(GraphSpec {
            stages: vec![StageSpec::Delay {
                time_ms: 10.0,
                feedback: 0.0,
                send: 0.0,
            }],
        });
        let mut ctl = graph.connect(&mut ctx).unwrap();
        ctl.set_send_level(0, 1.0).unwrap();

        let mut input = SampleBuffer::allocate(1, 1024, 44_100).unwrap();
        input.channel_mut(0).unwrap()[0] = 1.0;
        let output = graph.render_offline(&input).unwrap();
        let echo = output.channel(0).unwrap()[300..600]
            .iter()
            .any(|s| s.abs() > 0.5);
        assert!(echo, "raised send level should make the echo audible");
    }

    #[test]
    fn test_oversized_block_rejected() {
        let mut ctx = context();
        let mut graph = EffectGraph::new(GraphSpec::standard());
        let _ctl = graph.connect(&mut ctx).unwrap();

        let mut buffer = SampleBuffer::allocate(1, 513, 44_100).unwrap();
        assert!(matches!(
            graph.process_block(&mut buffer),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_invalid_spec_rejected_at_connect() {
        let mut ctx = context();
        let mut graph = EffectGraph::new(GraphSpec {
            stages: vec![StageSpec::Filter {
                mode: FilterMode::LowPass,
                frequency: 44_100.0, // above Nyquist
                q: 0.707,
                gain_db: 0.0,
            }],
        });
        assert!(graph.connect(&mut ctx).is_err());
        // Failed validation must not leave the context attached
        assert!(!ctx.is_attached());
    }

    #[test]
    fn test_render_offline_is_repeatable() {
        let mut ctx = context();
        let mut graph = EffectGraph::new(GraphSpec {
            stages: vec![
                StageSpec::Compressor {
                    threshold_db: -18.0,
                    ratio: 4.0,
                    attack_ms: 5.0,
                    release_ms: 100.0,
                    knee_db: 6.0,
                },
                StageSpec::Reverb {
                    duration_secs: 0.05,
                    decay: 2.0,
                    seed: 9,
                    send: 0.4,
                },
            ],
        });
        let _ctl = graph.connect(&mut ctx).unwrap();

        let input = ramp(2048);
        let first = graph.render_offline(&input).unwrap();
        let second = graph.render_offline(&input).unwrap();
        assert_eq!(first, second, "state reset makes renders repeatable");
    }

    #[test]
    fn test_spec_yaml_round_trip() {
        let spec = GraphSpec::standard();
        let yaml = serde_yaml::to_string(&spec).unwrap();
        let parsed: GraphSpec = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.stages.len(), spec.stages.len());
        assert!(matches!(parsed.stages[0], StageSpec::Gain { .. }));
        assert!(matches!(parsed.stages[3], StageSpec::Reverb { send, .. } if send == 0.0));
    }
}
