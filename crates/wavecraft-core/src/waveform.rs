//! Waveform summarization for visualization
//!
//! Downsamples a buffer into min/max peak pairs, one per pixel column at a
//! given zoom factor. The summary is regenerated whole whenever the zoom or
//! the underlying buffer changes - it is never incrementally patched.

use crate::types::SampleBuffer;

/// A single pixel column of the summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakColumn {
    /// Lowest sample value in this column's block
    pub min: f32,
    /// Highest sample value in this column's block
    pub max: f32,
}

/// Decimated min/max representation of a buffer at one zoom level
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformSummary {
    columns: Vec<PeakColumn>,
}

impl WaveformSummary {
    /// Number of pixel columns (`viewport_width * zoom`)
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check for an empty summary (zero-width viewport or zoom)
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The columns in display order
    pub fn columns(&self) -> &[PeakColumn] {
        &self.columns
    }
}

/// Summarize channel 0 of a buffer into `viewport_width * zoom` columns
///
/// Each column scans `max(1, frame_count / columns)` samples and records the
/// running min and max. At very high zoom on a short buffer each column maps
/// to at most one sample (min == max); columns past the end of the buffer
/// are silent `(0.0, 0.0)`.
///
/// Pure function: identical inputs always produce an identical summary.
pub fn summarize(buffer: &SampleBuffer, viewport_width: usize, zoom: usize) -> WaveformSummary {
    let column_count = viewport_width * zoom;
    if column_count == 0 {
        return WaveformSummary {
            columns: Vec::new(),
        };
    }

    // channel 0 always exists
    let samples = buffer.channel(0).expect("buffer has a first channel");
    let frame_count = samples.len();
    let block_size = (frame_count / column_count).max(1);

    let columns = (0..column_count)
        .map(|col| {
            let start = col * block_size;
            let end = ((col + 1) * block_size).min(frame_count);

            if start >= end {
                return PeakColumn { min: 0.0, max: 0.0 };
            }

            let mut min = f32::INFINITY;
            let mut max = f32::NEG_INFINITY;
            for &sample in &samples[start..end] {
                min = min.min(sample);
                max = max.max(sample);
            }
            PeakColumn { min, max }
        })
        .collect();

    log::debug!(
        "summarized {} frames into {} columns (block size {})",
        frame_count,
        column_count,
        block_size
    );
    WaveformSummary { columns }
}

/// Smoothing window size (moving average)
pub const SMOOTHING_WINDOW: usize = 3;

/// Apply moving-average smoothing to summary columns for display
///
/// Reduces visual noise in dense waveforms. Note: the result is shorter
/// than the input by `SMOOTHING_WINDOW - 1`.
pub fn smooth_peaks(columns: &[PeakColumn]) -> Vec<PeakColumn> {
    if columns.len() < SMOOTHING_WINDOW {
        return columns.to_vec();
    }

    columns
        .windows(SMOOTHING_WINDOW)
        .map(|w| {
            let min = w.iter().map(|c| c.min).sum::<f32>() / SMOOTHING_WINDOW as f32;
            let max = w.iter().map(|c| c.max).sum::<f32>() / SMOOTHING_WINDOW as f32;
            PeakColumn { min, max }
        })
        .collect()
}
