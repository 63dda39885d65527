//! Lock-free parameter queue for a running effect graph
//!
//! The control side pushes commands through a lock-free ring buffer; the
//! render side drains the queue at the start of each block, so a parameter
//! change always takes effect at a block boundary and never mid-block.
//!
//! `rtrb` is used because both ends are wait-free: the control thread never
//! blocks the render thread and vice versa.

use crate::error::{EngineError, EngineResult};

/// Commands applied by the render side at block boundaries
#[derive(Debug, Clone, PartialEq)]
pub enum GraphCommand {
    /// Set a normalized (0-1) parameter on a stage
    SetParam {
        stage: usize,
        param: usize,
        value: f32,
    },
    /// Bypass or re-enable a stage
    SetBypass { stage: usize, bypass: bool },
    /// Set the send level of a send stage (0-1)
    SetSendLevel { stage: usize, level: f32 },
    /// Clear all stage processing state (delay lines, envelopes)
    ResetStages,
}

/// Capacity of the command queue
///
/// Automation bursts from a UI send at most a handful of commands per frame;
/// 256 gives ample headroom for a full-graph preset change in one block.
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Create a new command channel (producer/consumer pair)
pub fn command_channel() -> (rtrb::Producer<GraphCommand>, rtrb::Consumer<GraphCommand>) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}

/// Per-stage shape information the controller validates against
///
/// Captured when the graph is compiled so the control side can reject bad
/// indices without touching the render side.
#[derive(Debug, Clone)]
pub struct StageShape {
    pub param_count: usize,
    pub is_send: bool,
}

/// Control-side handle for a connected graph
///
/// Validates every command against the compiled graph shape before queuing,
/// so the render side only ever sees well-formed commands.
pub struct GraphController {
    producer: rtrb::Producer<GraphCommand>,
    shapes: Vec<StageShape>,
}

impl GraphController {
    pub(crate) fn new(producer: rtrb::Producer<GraphCommand>, shapes: Vec<StageShape>) -> Self {
        Self { producer, shapes }
    }

    /// Number of stages in the graph
    pub fn stage_count(&self) -> usize {
        self.shapes.len()
    }

    fn shape(&self, stage: usize) -> EngineResult<&StageShape> {
        self.shapes.get(stage).ok_or_else(|| {
            EngineError::OutOfRange(format!(
                "stage {stage} out of range for graph with {} stages",
                self.shapes.len()
            ))
        })
    }

    fn push(&mut self, command: GraphCommand) -> EngineResult<()> {
        self.producer.push(command).map_err(|_| {
            EngineError::InvalidArgument("graph command queue is full".into())
        })
    }

    /// Queue a normalized parameter change, applied at the next block
    pub fn set_param(&mut self, stage: usize, param: usize, value: f32) -> EngineResult<()> {
        let shape = self.shape(stage)?;
        if param >= shape.param_count {
            return Err(EngineError::OutOfRange(format!(
                "param {param} out of range for stage {stage} with {} params",
                shape.param_count
            )));
        }
        if !value.is_finite() {
            return Err(EngineError::InvalidArgument(format!(
                "param value must be finite, got {value}"
            )));
        }
        self.push(GraphCommand::SetParam {
            stage,
            param,
            value,
        })
    }

    /// Queue a bypass change, applied at the next block
    pub fn set_bypass(&mut self, stage: usize, bypass: bool) -> EngineResult<()> {
        self.shape(stage)?;
        self.push(GraphCommand::SetBypass { stage, bypass })
    }

    /// Queue a send-level change; fails for insert stages
    pub fn set_send_level(&mut self, stage: usize, level: f32) -> EngineResult<()> {
        let shape = self.shape(stage)?;
        if !shape.is_send {
            return Err(EngineError::InvalidArgument(format!(
                "stage {stage} is an insert, not a send"
            )));
        }
        if !(0.0..=1.0).contains(&level) {
            return Err(EngineError::InvalidArgument(format!(
                "send level must be in 0..=1, got {level}"
            )));
        }
        self.push(GraphCommand::SetSendLevel { stage, level })
    }

    /// Queue a reset of all stage state
    pub fn reset_stages(&mut self) -> EngineResult<()> {
        self.push(GraphCommand::ResetStages)
    }
}
