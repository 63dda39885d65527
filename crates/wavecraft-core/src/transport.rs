//! Playback transport - wall-clock scheduling over a loaded buffer
//!
//! The scheduler never touches sample data; it derives the playhead from a
//! wall-clock anchor. While playing:
//!
//! ```text
//! current_frame = (now - anchor) * rate * sample_rate
//! ```
//!
//! and the anchor is chosen at play/seek/rate-change so the equation holds
//! at the transition instant. Repeated seeks or rate changes therefore
//! never accumulate drift.
//!
//! State changes are published two ways: a typed event channel for
//! listeners that need every transition, and a pair of atomics for UI code
//! that just polls the playhead without locking.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::types::SampleBuffer;

/// Transport lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TransportState {
    Stopped = 0,
    Playing = 1,
    Paused = 2,
}

impl TransportState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => TransportState::Playing,
            2 => TransportState::Paused,
            _ => TransportState::Stopped,
        }
    }
}

/// Transition events published to subscribers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportEvent {
    Started { frame: usize },
    Paused { frame: usize },
    Stopped,
    Seeked { frame: usize },
    RateChanged { rate: f64 },
    /// The playhead reached the end of the buffer; emitted exactly once
    /// per run past the end
    EndOfPlayback,
}

/// Lock-free transport snapshot for UI polling
///
/// Position and state are advisory: they are updated on every transition
/// and every [`PlaybackScheduler::current_frame`] call, so a poller sees
/// the playhead advance without taking any lock. Relaxed ordering is
/// enough; the two fields are independent hints, not a consistent pair.
pub struct TransportAtomics {
    position: AtomicU64,
    state: AtomicU8,
}

impl TransportAtomics {
    fn new() -> Self {
        Self {
            position: AtomicU64::new(0),
            state: AtomicU8::new(TransportState::Stopped as u8),
        }
    }

    pub fn position(&self) -> usize {
        self.position.load(Ordering::Relaxed) as usize
    }

    pub fn state(&self) -> TransportState {
        TransportState::from_u8(self.state.load(Ordering::Relaxed))
    }

    fn store(&self, position: usize, state: TransportState) {
        self.position.store(position as u64, Ordering::Relaxed);
        self.state.store(state as u8, Ordering::Relaxed);
    }
}

/// Full transport snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub has_buffer: bool,
    pub state: TransportState,
    pub current_frame: usize,
    pub rate: f64,
}

/// Wall-clock playback scheduler
pub struct PlaybackScheduler {
    buffer: Option<SampleBuffer>,
    state: TransportState,
    /// Playhead while not playing; refreshed from the anchor while playing
    position: usize,
    rate: f64,
    /// Wall-clock instant corresponding to frame zero at the current rate
    anchor: Option<Instant>,
    /// Guards the exactly-once end event
    end_emitted: bool,
    atomics: Arc<TransportAtomics>,
    subscribers: Vec<Sender<TransportEvent>>,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self {
            buffer: None,
            state: TransportState::Stopped,
            position: 0,
            rate: 1.0,
            anchor: None,
            end_emitted: false,
            atomics: Arc::new(TransportAtomics::new()),
            subscribers: Vec::new(),
        }
    }

    /// Subscribe to transport events
    pub fn subscribe(&mut self) -> Receiver<TransportEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Shared atomics for lock-free polling
    pub fn atomics(&self) -> Arc<TransportAtomics> {
        Arc::clone(&self.atomics)
    }

    fn emit(&mut self, event: TransportEvent) {
        // Drop subscribers whose receiver went away
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    fn frame_count(&self) -> usize {
        self.buffer.as_ref().map_or(0, |b| b.frame_count())
    }

    fn sample_rate(&self) -> u32 {
        self.buffer.as_ref().map_or(0, |b| b.sample_rate())
    }

    /// Frames per second of wall-clock time at the current rate
    fn frames_per_second(&self) -> f64 {
        self.rate * self.sample_rate() as f64
    }

    fn anchor_for(&self, frame: usize) -> Instant {
        let offset = std::time::Duration::from_secs_f64(frame as f64 / self.frames_per_second());
        Instant::now() - offset
    }

    fn publish(&self) {
        self.atomics.store(self.position, self.state);
    }

    /// Load a buffer, replacing any previous one. Playback stops and the
    /// playhead returns to zero.
    pub fn load(&mut self, buffer: SampleBuffer) {
        info!(
            "transport: loaded {} frames at {}Hz",
            buffer.frame_count(),
            buffer.sample_rate()
        );
        self.buffer = Some(buffer);
        self.state = TransportState::Stopped;
        self.position = 0;
        self.anchor = None;
        self.end_emitted = false;
        self.publish();
    }

    /// Drop the loaded buffer and stop
    pub fn unload(&mut self) {
        self.buffer = None;
        self.state = TransportState::Stopped;
        self.position = 0;
        self.anchor = None;
        self.end_emitted = false;
        self.publish();
    }

    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn buffer(&self) -> Option<&SampleBuffer> {
        self.buffer.as_ref()
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Start playing from the given frame
    ///
    /// Valid from every state, including while already playing, in which
    /// case the playhead jumps to `start_frame`.
    pub fn play(&mut self, start_frame: usize) -> EngineResult<()> {
        if self.buffer.is_none() {
            return Err(EngineError::NoBufferLoaded);
        }
        if start_frame > self.frame_count() {
            return Err(EngineError::OutOfRange(format!(
                "start frame {start_frame} past end ({} frames)",
                self.frame_count()
            )));
        }

        self.position = start_frame;
        self.anchor = Some(self.anchor_for(start_frame));
        self.state = TransportState::Playing;
        self.end_emitted = false;
        self.publish();
        debug!("transport: play from frame {start_frame}");
        self.emit(TransportEvent::Started { frame: start_frame });
        Ok(())
    }

    /// Resume from the current playhead position
    pub fn resume(&mut self) -> EngineResult<()> {
        let frame = self.current_frame();
        self.play(frame)
    }

    /// Freeze the playhead, keeping the buffer and position
    pub fn pause(&mut self) -> EngineResult<()> {
        if self.state != TransportState::Playing {
            return Err(EngineError::InvalidArgument(
                "pause is only valid while playing".into(),
            ));
        }
        self.position = self.current_frame();
        if self.state == TransportState::Stopped {
            // The playhead crossed the end while pausing; the auto-stop wins
            return Ok(());
        }
        self.anchor = None;
        self.state = TransportState::Paused;
        self.publish();
        let frame = self.position;
        self.emit(TransportEvent::Paused { frame });
        Ok(())
    }

    /// Stop and rewind to frame zero, keeping the buffer
    pub fn stop(&mut self) {
        self.position = 0;
        self.anchor = None;
        self.state = TransportState::Stopped;
        self.end_emitted = false;
        self.publish();
        self.emit(TransportEvent::Stopped);
    }

    /// Move the playhead. Valid in every state; while playing the clock is
    /// re-anchored so playback continues from the new frame without drift.
    pub fn seek(&mut self, frame: usize) -> EngineResult<()> {
        if self.buffer.is_none() {
            return Err(EngineError::NoBufferLoaded);
        }
        if frame > self.frame_count() {
            return Err(EngineError::OutOfRange(format!(
                "seek target {frame} past end ({} frames)",
                self.frame_count()
            )));
        }

        self.position = frame;
        if self.state == TransportState::Playing {
            self.anchor = Some(self.anchor_for(frame));
        }
        self.end_emitted = false;
        self.publish();
        self.emit(TransportEvent::Seeked { frame });
        Ok(())
    }

    /// Change the playback rate (1.0 = realtime)
    ///
    /// While playing, the clock is re-anchored at the current playhead so
    /// the rate change is seamless.
    pub fn set_rate(&mut self, rate: f64) -> EngineResult<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(EngineError::InvalidArgument(format!(
                "playback rate must be finite and positive, got {rate}"
            )));
        }

        let frame = self.current_frame();
        self.rate = rate;
        if self.state == TransportState::Playing {
            self.anchor = Some(self.anchor_for(frame));
        }
        self.emit(TransportEvent::RateChanged { rate });
        Ok(())
    }

    /// Current playhead frame, clamped to the buffer length
    ///
    /// While playing this derives the frame from the wall clock; reaching
    /// the end auto-stops the transport and emits
    /// [`TransportEvent::EndOfPlayback`] exactly once.
    pub fn current_frame(&mut self) -> usize {
        if self.state == TransportState::Playing {
            // Playing implies an anchor
            let anchor = self.anchor.expect("playing transport has an anchor");
            let elapsed = anchor.elapsed().as_secs_f64();
            let frame = (elapsed * self.frames_per_second()) as usize;

            if frame >= self.frame_count() {
                self.position = self.frame_count();
                self.anchor = None;
                self.state = TransportState::Stopped;
                self.publish();
                if !self.end_emitted {
                    self.end_emitted = true;
                    debug!("transport: end of playback");
                    self.emit(TransportEvent::EndOfPlayback);
                }
            } else {
                self.position = frame;
                self.publish();
            }
        }
        self.position
    }

    /// Full snapshot of the transport
    pub fn snapshot(&mut self) -> PlaybackState {
        let current_frame = self.current_frame();
        PlaybackState {
            has_buffer: self.buffer.is_some(),
            state: self.state,
            current_frame,
            rate: self.rate,
        }
    }
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new()
    }
}
