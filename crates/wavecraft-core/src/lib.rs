//! Wavecraft Core - audio signal processing and non-destructive editing engine

pub mod codec;
pub mod config;
pub mod device;
pub mod edit;
pub mod effect;
pub mod error;
pub mod graph;
pub mod transport;
pub mod types;
pub mod waveform;

pub use error::{EngineError, EngineResult};
pub use types::*;
