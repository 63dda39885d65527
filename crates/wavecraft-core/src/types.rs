//! Common types for Wavecraft
//!
//! This module contains the fundamental audio types used throughout the
//! engine: the planar multichannel sample buffer and the frame-accurate
//! selection used by the editor.

use crate::error::{EngineError, EngineResult};

/// Default sample rate (44.1kHz - CD rate, matches the container codec's
/// most common input). The actual rate always travels with the buffer.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default render block size in frames
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Maximum channel count the 16-bit PCM container supports
pub const MAX_CODEC_CHANNELS: usize = 2;

/// Audio sample type (32-bit float for processing, 16-bit in container files)
pub type Sample = f32;

/// A planar multichannel buffer of float samples
///
/// Every channel holds exactly `frame_count` samples. Samples are nominally
/// in [-1.0, 1.0] but may transiently exceed that range during processing;
/// clipping happens at export time in the codec.
///
/// A `SampleBuffer` is exclusively owned by whichever component currently
/// holds it. There is no shared mutable aliasing between two logical
/// buffers - edits during playback replace the buffer, they never mutate
/// one a renderer is reading.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<Sample>>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Allocate a zero-initialized buffer
    ///
    /// Fails with `InvalidArgument` if `channel_count` or `sample_rate`
    /// is zero. A zero `frame_count` is a valid empty buffer.
    pub fn allocate(
        channel_count: usize,
        frame_count: usize,
        sample_rate: u32,
    ) -> EngineResult<Self> {
        if channel_count == 0 {
            return Err(EngineError::InvalidArgument(
                "channel count must be at least 1".into(),
            ));
        }
        if sample_rate == 0 {
            return Err(EngineError::InvalidArgument(
                "sample rate must be positive".into(),
            ));
        }
        Ok(Self {
            channels: vec![vec![0.0; frame_count]; channel_count],
            sample_rate,
        })
    }

    /// Build a buffer from already-decoded planar channel data
    ///
    /// Fails with `InvalidArgument` if there are no channels, the sample
    /// rate is zero, or the channels have mismatched lengths.
    pub fn from_channel_data(channels: Vec<Vec<Sample>>, sample_rate: u32) -> EngineResult<Self> {
        if channels.is_empty() {
            return Err(EngineError::InvalidArgument(
                "channel count must be at least 1".into(),
            ));
        }
        if sample_rate == 0 {
            return Err(EngineError::InvalidArgument(
                "sample rate must be positive".into(),
            ));
        }
        let frame_count = channels[0].len();
        if channels.iter().any(|c| c.len() != frame_count) {
            return Err(EngineError::InvalidArgument(
                "all channels must have the same length".into(),
            ));
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Number of channels (>= 1)
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames per channel
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Check if the buffer holds no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// Duration in seconds (`frame_count / sample_rate`)
    pub fn duration_seconds(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Get a channel's samples
    ///
    /// Fails with `OutOfRange` if `index >= channel_count`.
    pub fn channel(&self, index: usize) -> EngineResult<&[Sample]> {
        self.channels
            .get(index)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::OutOfRange(format!(
                "channel {} out of range (channel count {})",
                index,
                self.channels.len()
            )))
    }

    /// Get mutable access to a channel's samples
    pub fn channel_mut(&mut self, index: usize) -> EngineResult<&mut [Sample]> {
        let count = self.channels.len();
        self.channels
            .get_mut(index)
            .map(Vec::as_mut_slice)
            .ok_or_else(|| EngineError::OutOfRange(format!(
                "channel {} out of range (channel count {})",
                index, count
            )))
    }

    /// Copy a frame range `[start, end)` into a new buffer
    ///
    /// Fails with `OutOfRange` if `start > end` or `end > frame_count`.
    pub fn copy_range(&self, start: usize, end: usize) -> EngineResult<Self> {
        if start > end || end > self.frame_count() {
            return Err(EngineError::OutOfRange(format!(
                "range {}..{} outside buffer of {} frames",
                start,
                end,
                self.frame_count()
            )));
        }
        let channels = self
            .channels
            .iter()
            .map(|c| c[start..end].to_vec())
            .collect();
        Ok(Self {
            channels,
            sample_rate: self.sample_rate,
        })
    }

    /// Fill every channel with silence
    pub fn fill_silence(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    /// Scale all samples by a factor
    pub fn scale(&mut self, factor: Sample) {
        for channel in &mut self.channels {
            for sample in channel.iter_mut() {
                *sample *= factor;
            }
        }
    }

    /// Add another buffer to this one (summing samples)
    ///
    /// The buffers must have identical channel and frame counts.
    pub fn add_buffer(&mut self, other: &SampleBuffer) {
        assert_eq!(
            self.channel_count(),
            other.channel_count(),
            "channel counts must match"
        );
        assert_eq!(
            self.frame_count(),
            other.frame_count(),
            "frame counts must match"
        );
        for (dst, src) in self.channels.iter_mut().zip(other.channels.iter()) {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d += *s;
            }
        }
    }

    /// Copy sample data from another buffer of identical shape
    pub fn copy_from(&mut self, other: &SampleBuffer) {
        assert_eq!(self.channel_count(), other.channel_count());
        assert_eq!(self.frame_count(), other.frame_count());
        for (dst, src) in self.channels.iter_mut().zip(other.channels.iter()) {
            dst.copy_from_slice(src);
        }
    }

    /// Peak amplitude across all channels
    pub fn peak(&self) -> Sample {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .map(|s| s.abs())
            .fold(0.0, Sample::max)
    }
}

/// A frame-accurate selection into a specific buffer
///
/// Invariant after `normalized` + `clamped`:
/// `0 <= start_frame <= end_frame <= frame_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// First selected frame (inclusive)
    pub start_frame: usize,
    /// One past the last selected frame (exclusive)
    pub end_frame: usize,
}

impl Selection {
    /// Create a selection without normalizing
    pub fn new(start_frame: usize, end_frame: usize) -> Self {
        Self {
            start_frame,
            end_frame,
        }
    }

    /// Return the selection with endpoints ordered `start <= end`
    ///
    /// Interactive drags can produce reversed endpoints; every consumer
    /// works on the normalized form.
    pub fn normalized(self) -> Self {
        if self.start_frame <= self.end_frame {
            self
        } else {
            Self {
                start_frame: self.end_frame,
                end_frame: self.start_frame,
            }
        }
    }

    /// Clamp both endpoints into `[0, frame_count]`
    pub fn clamped(self, frame_count: usize) -> Self {
        Self {
            start_frame: self.start_frame.min(frame_count),
            end_frame: self.end_frame.min(frame_count),
        }
    }

    /// Selected length in frames
    pub fn len(&self) -> usize {
        self.end_frame.saturating_sub(self.start_frame)
    }

    /// Check if the selection covers zero frames
    pub fn is_empty(&self) -> bool {
        self.start_frame >= self.end_frame
    }
}
