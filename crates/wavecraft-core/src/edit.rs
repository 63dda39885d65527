//! Sample-accurate, non-destructive editing
//!
//! Selection handling, trim, linear fades, and the pixel <-> frame mapping
//! that keeps the editor view and the audio data in agreement. The two
//! mappings are exact inverses up to floating-point rounding, which is what
//! makes selection round-trips and playhead rendering line up.

use crate::error::{EngineError, EngineResult};
use crate::types::{SampleBuffer, Selection};

/// Fade ramp direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    /// Ramp from silence up to full level
    In,
    /// Ramp from full level down to silence
    Out,
}

/// The view geometry that maps pixels to frames and back
///
/// `viewport_width * zoom` is the total pixel width of the rendered
/// waveform; `duration_seconds * sample_rate` is the frame span it covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Viewport width in pixels
    pub viewport_width: usize,
    /// Zoom factor (1 = whole buffer fits the viewport)
    pub zoom: usize,
    /// Duration of the displayed buffer in seconds
    pub duration_seconds: f64,
    /// Sample rate of the displayed buffer in Hz
    pub sample_rate: u32,
}

impl ViewTransform {
    /// Total rendered width in pixels
    pub fn total_width(&self) -> f64 {
        (self.viewport_width * self.zoom) as f64
    }

    /// Convert a pixel coordinate to a (fractional) frame position
    pub fn pixel_to_frame(&self, pixel: f64) -> f64 {
        pixel / self.total_width() * self.duration_seconds * self.sample_rate as f64
    }

    /// Convert a frame position to a (fractional) pixel coordinate
    pub fn frame_to_pixel(&self, frame: f64) -> f64 {
        frame / (self.duration_seconds * self.sample_rate as f64) * self.total_width()
    }
}

/// Build a normalized selection from two pixel coordinates
///
/// Converts both endpoints through the view transform, orders them so
/// `start <= end` (interactive drags go both ways), and clamps into the
/// buffer. Rounds to the nearest frame.
pub fn selection_from_pixels(
    transform: &ViewTransform,
    pixel_a: f64,
    pixel_b: f64,
    frame_count: usize,
) -> Selection {
    let frame_a = transform.pixel_to_frame(pixel_a).round().max(0.0) as usize;
    let frame_b = transform.pixel_to_frame(pixel_b).round().max(0.0) as usize;
    Selection::new(frame_a, frame_b)
        .normalized()
        .clamped(frame_count)
}

/// Copy the selected range into a new buffer
///
/// Fails with `EmptySelection` on a zero-length selection and `OutOfRange`
/// if the selection extends past the buffer.
pub fn trim_to_selection(
    buffer: &SampleBuffer,
    selection: Selection,
) -> EngineResult<SampleBuffer> {
    let selection = selection.normalized();
    if selection.is_empty() {
        return Err(EngineError::EmptySelection);
    }
    buffer.copy_range(selection.start_frame, selection.end_frame)
}

/// Apply a linear fade across the selection, in place, on every channel
///
/// For each frame `i` in `[start, end)` the gain is
/// `progress = (i - start) / (end - start)` for a fade-in and
/// `1 - progress` for a fade-out. The ramp is linear, not logarithmic, and
/// not idempotent: applying a fade-in twice attenuates the start further.
pub fn apply_fade(
    buffer: &mut SampleBuffer,
    selection: Selection,
    direction: FadeDirection,
) -> EngineResult<()> {
    let selection = selection.normalized();
    if selection.is_empty() {
        return Err(EngineError::EmptySelection);
    }
    if selection.end_frame > buffer.frame_count() {
        return Err(EngineError::OutOfRange(format!(
            "selection {}..{} outside buffer of {} frames",
            selection.start_frame,
            selection.end_frame,
            buffer.frame_count()
        )));
    }

    let start = selection.start_frame;
    let span = selection.len() as f32;
    for ch in 0..buffer.channel_count() {
        let samples = buffer.channel_mut(ch)?;
        for i in start..selection.end_frame {
            let progress = (i - start) as f32 / span;
            let gain = match direction {
                FadeDirection::In => progress,
                FadeDirection::Out => 1.0 - progress,
            };
            samples[i] *= gain;
        }
    }

    log::debug!(
        "applied {:?} fade over frames {}..{}",
        direction,
        start,
        selection.end_frame
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_buffer(frames: usize, value: f32) -> SampleBuffer {
        let mut buffer = SampleBuffer::allocate(2, frames, 44_100).unwrap();
        for ch in 0..2 {
            buffer.channel_mut(ch).unwrap().fill(value);
        }
        buffer
    }

    fn transform() -> ViewTransform {
        ViewTransform {
            viewport_width: 800,
            zoom: 2,
            duration_seconds: 10.0,
            sample_rate: 44_100,
        }
    }

    #[test]
    fn test_pixel_frame_round_trip() {
        let t = transform();
        let total = (t.viewport_width * t.zoom) as i64;
        for p in 0..=total {
            let pixel = p as f64;
            let back = t.frame_to_pixel(t.pixel_to_frame(pixel));
            assert!(
                (back - pixel).abs() < 1.0,
                "pixel {} came back as {}",
                pixel,
                back
            );
        }
    }

    #[test]
    fn test_pixel_to_frame_endpoints() {
        let t = transform();
        assert_eq!(t.pixel_to_frame(0.0), 0.0);
        // Rightmost pixel maps to the last frame of the 10s buffer
        let last = t.pixel_to_frame(t.total_width());
        assert!((last - 441_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_selection_from_pixels_normalizes_drag() {
        let t = transform();
        // Dragged right-to-left
        let sel = selection_from_pixels(&t, 900.0, 100.0, 441_000);
        assert!(sel.start_frame < sel.end_frame);

        let forward = selection_from_pixels(&t, 100.0, 900.0, 441_000);
        assert_eq!(sel, forward);
    }

    #[test]
    fn test_selection_from_pixels_clamps() {
        let t = transform();
        let sel = selection_from_pixels(&t, 0.0, 10_000.0, 1000);
        assert_eq!(sel.end_frame, 1000);
    }

    #[test]
    fn test_trim_full_range_equals_original() {
        let buffer = constant_buffer(500, 0.25);
        let trimmed =
            trim_to_selection(&buffer, Selection::new(0, buffer.frame_count())).unwrap();
        assert_eq!(trimmed, buffer);
    }

    #[test]
    fn test_trim_empty_selection_fails() {
        let buffer = constant_buffer(100, 0.5);
        assert!(matches!(
            trim_to_selection(&buffer, Selection::new(40, 40)),
            Err(EngineError::EmptySelection)
        ));
    }

    #[test]
    fn test_fade_in_ramp() {
        let mut buffer = constant_buffer(100, 1.0);
        apply_fade(&mut buffer, Selection::new(0, 100), FadeDirection::In).unwrap();

        let samples = buffer.channel(0).unwrap();
        assert_eq!(samples[0], 0.0);
        assert!((samples[50] - 0.5).abs() < 0.011);
        // Last frame of the range is (N-1)/N, just under full level
        assert!((samples[99] - 0.99).abs() < 1e-6);
        // Both channels faded
        assert_eq!(buffer.channel(1).unwrap()[0], 0.0);
    }

    #[test]
    fn test_fade_in_then_out_attenuates_ends_and_midpoint() {
        let mut buffer = constant_buffer(200, 1.0);
        let sel = Selection::new(0, 200);
        apply_fade(&mut buffer, sel, FadeDirection::In).unwrap();
        apply_fade(&mut buffer, sel, FadeDirection::Out).unwrap();

        let samples = buffer.channel(0).unwrap();
        assert!(samples[0].abs() < 1e-6);
        assert!(samples[199].abs() < 0.011);
        // Midpoint is progress * (1 - progress) = 0.25, well below unity
        assert!(samples[100] < 0.3);
        assert!(samples[100] > 0.2);
    }

    #[test]
    fn test_fade_not_idempotent() {
        let mut once = constant_buffer(100, 1.0);
        let sel = Selection::new(0, 100);
        apply_fade(&mut once, sel, FadeDirection::In).unwrap();
        let mut twice = once.clone();
        apply_fade(&mut twice, sel, FadeDirection::In).unwrap();

        // Reapplying squares the ramp: strictly quieter inside the range
        let a = once.channel(0).unwrap()[25];
        let b = twice.channel(0).unwrap()[25];
        assert!(b < a);
    }

    #[test]
    fn test_fade_rejects_bad_selections() {
        let mut buffer = constant_buffer(100, 1.0);
        assert!(matches!(
            apply_fade(&mut buffer, Selection::new(10, 10), FadeDirection::In),
            Err(EngineError::EmptySelection)
        ));
        assert!(matches!(
            apply_fade(&mut buffer, Selection::new(0, 101), FadeDirection::Out),
            Err(EngineError::OutOfRange(_))
        ));
    }
}
