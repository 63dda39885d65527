//! PCM container codec (RIFF/WAVE, 16-bit little-endian)
//!
//! Decodes and encodes the engine's only wire format: a standard
//! uncompressed WAV container with a 44-byte header. The layout is part of
//! the compatibility contract - any other header layout is a break.
//!
//! Sample scaling is deliberately asymmetric and bit-faithful:
//! negative integers map through 32768, non-negative through 32767, and the
//! encoder applies the exact inverse. `decode(encode(buffer))` reproduces
//! the 16-bit-quantized amplitudes exactly.

mod service;

pub use service::{CodecProgress, CodecService};

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{EngineError, EngineResult};
use crate::types::{Sample, SampleBuffer, MAX_CODEC_CHANNELS};

/// Fixed header size the encoder emits (RIFF + fmt + data headers)
pub const HEADER_SIZE: usize = 44;

/// PCM format tag in the fmt chunk
const FORMAT_PCM: u16 = 1;

/// How many frames to convert between cancellation checks
const CANCEL_CHECK_INTERVAL: usize = 65_536;

/// Format fields parsed from the fmt chunk
#[derive(Debug, Clone, Copy)]
struct FmtChunk {
    format_tag: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

/// Decode a WAV byte stream into a sample buffer
///
/// Validates the four-component layout (`RIFF` size tag, `WAVE` format tag,
/// `fmt ` sub-chunk, `data` sub-chunk) and the declared sample format
/// (16-bit signed PCM, 1-2 channels). Fails with `MalformedContainer` on
/// any tag mismatch, unsupported format, or a declared data length that
/// exceeds the available bytes.
pub fn decode(bytes: &[u8]) -> EngineResult<SampleBuffer> {
    decode_with_cancel(bytes, None)
}

/// Encode a sample buffer as a WAV byte stream
///
/// Emits the fixed four-chunk layout described in the module docs. Samples
/// are clamped to [-1, 1] before integer conversion. Fails with
/// `InvalidArgument` for buffers with more than 2 channels.
pub fn encode(buffer: &SampleBuffer) -> EngineResult<Vec<u8>> {
    encode_with_cancel(buffer, None)
}

/// Decode a WAV file from disk
pub fn decode_file<P: AsRef<Path>>(path: P) -> EngineResult<SampleBuffer> {
    let bytes = std::fs::read(path.as_ref())?;
    decode(&bytes)
}

/// Encode a sample buffer to a WAV file on disk
pub fn encode_file<P: AsRef<Path>>(buffer: &SampleBuffer, path: P) -> EngineResult<()> {
    let bytes = encode(buffer)?;
    std::fs::write(path.as_ref(), bytes)?;
    Ok(())
}

/// Decode with an optional cancellation flag
///
/// Cancellation discards the partial output and returns `DecodeCancelled`;
/// the source bytes are untouched.
pub(crate) fn decode_with_cancel(
    bytes: &[u8],
    cancel: Option<&AtomicBool>,
) -> EngineResult<SampleBuffer> {
    if bytes.len() < HEADER_SIZE {
        return Err(EngineError::MalformedContainer(format!(
            "{} bytes is too short for a WAV header",
            bytes.len()
        )));
    }
    if &bytes[0..4] != b"RIFF" {
        return Err(EngineError::MalformedContainer("missing RIFF tag".into()));
    }
    if &bytes[8..12] != b"WAVE" {
        return Err(EngineError::MalformedContainer("missing WAVE tag".into()));
    }

    // Walk the sub-chunks after the 12-byte RIFF header. Fixed 44-byte
    // files parse on the first two iterations; writers that insert extra
    // chunks (LIST, bext) still decode.
    let mut pos = 12;
    let mut fmt: Option<FmtChunk> = None;
    let mut data: Option<&[u8]> = None;

    while pos + 8 <= bytes.len() {
        let chunk_id: [u8; 4] = bytes[pos..pos + 4].try_into().unwrap();
        let chunk_size =
            u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let body_start = pos + 8;

        match &chunk_id {
            b"fmt " => {
                if chunk_size < 16 || body_start + 16 > bytes.len() {
                    return Err(EngineError::MalformedContainer(
                        "fmt chunk too small".into(),
                    ));
                }
                let f = &bytes[body_start..];
                fmt = Some(FmtChunk {
                    format_tag: u16::from_le_bytes([f[0], f[1]]),
                    channels: u16::from_le_bytes([f[2], f[3]]),
                    sample_rate: u32::from_le_bytes([f[4], f[5], f[6], f[7]]),
                    bits_per_sample: u16::from_le_bytes([f[14], f[15]]),
                });
            }
            b"data" => {
                if body_start + chunk_size > bytes.len() {
                    return Err(EngineError::MalformedContainer(format!(
                        "data chunk declares {} bytes but only {} are available",
                        chunk_size,
                        bytes.len() - body_start
                    )));
                }
                data = Some(&bytes[body_start..body_start + chunk_size]);
            }
            _ => {}
        }

        // Chunks are word-aligned
        pos = body_start + chunk_size + (chunk_size % 2);
    }

    let fmt = fmt.ok_or_else(|| EngineError::MalformedContainer("missing fmt chunk".into()))?;
    let data = data.ok_or_else(|| EngineError::MalformedContainer("missing data chunk".into()))?;

    if fmt.format_tag != FORMAT_PCM {
        return Err(EngineError::MalformedContainer(format!(
            "unsupported format tag {} (expected PCM)",
            fmt.format_tag
        )));
    }
    if fmt.bits_per_sample != 16 {
        return Err(EngineError::MalformedContainer(format!(
            "unsupported bit depth {} (expected 16)",
            fmt.bits_per_sample
        )));
    }
    if fmt.channels == 0 || fmt.channels as usize > MAX_CODEC_CHANNELS {
        return Err(EngineError::MalformedContainer(format!(
            "unsupported channel count {} (expected 1-2)",
            fmt.channels
        )));
    }
    if fmt.sample_rate == 0 {
        return Err(EngineError::MalformedContainer(
            "sample rate must be positive".into(),
        ));
    }

    let channel_count = fmt.channels as usize;
    let frame_count = data.len() / (channel_count * 2);
    let mut channels = vec![Vec::with_capacity(frame_count); channel_count];

    for frame in 0..frame_count {
        if frame % CANCEL_CHECK_INTERVAL == 0 {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    log::info!("decode cancelled at frame {}/{}", frame, frame_count);
                    return Err(EngineError::DecodeCancelled);
                }
            }
        }
        let base = frame * channel_count * 2;
        for (ch, channel) in channels.iter_mut().enumerate() {
            let offset = base + ch * 2;
            let raw = i16::from_le_bytes([data[offset], data[offset + 1]]);
            channel.push(int_to_float(raw));
        }
    }

    log::debug!(
        "decoded {} frames, {} channel(s) at {}Hz",
        frame_count,
        channel_count,
        fmt.sample_rate
    );
    SampleBuffer::from_channel_data(channels, fmt.sample_rate)
}

/// Encode with an optional cancellation flag
pub(crate) fn encode_with_cancel(
    buffer: &SampleBuffer,
    cancel: Option<&AtomicBool>,
) -> EngineResult<Vec<u8>> {
    let channel_count = buffer.channel_count();
    if channel_count > MAX_CODEC_CHANNELS {
        return Err(EngineError::InvalidArgument(format!(
            "container supports 1-2 channels, buffer has {}",
            channel_count
        )));
    }

    let frame_count = buffer.frame_count();
    let data_size = frame_count * channel_count * 2;
    let mut out = Vec::with_capacity(HEADER_SIZE + data_size);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((36 + data_size) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk (16-byte PCM form)
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&(channel_count as u16).to_le_bytes());
    out.extend_from_slice(&buffer.sample_rate().to_le_bytes());
    let byte_rate = buffer.sample_rate() * channel_count as u32 * 2;
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&((channel_count * 2) as u16).to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_size as u32).to_le_bytes());

    for frame in 0..frame_count {
        if frame % CANCEL_CHECK_INTERVAL == 0 {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    log::info!("encode cancelled at frame {}/{}", frame, frame_count);
                    return Err(EngineError::EncodeCancelled);
                }
            }
        }
        for ch in 0..channel_count {
            // channel index is bounded by the loop
            let sample = buffer.channel(ch).expect("channel in range")[frame];
            out.extend_from_slice(&float_to_int(sample).to_le_bytes());
        }
    }

    log::debug!("encoded {} frames into {} bytes", frame_count, out.len());
    Ok(out)
}

/// 16-bit integer to float, asymmetric: /32768 for negative, /32767 otherwise
#[inline]
fn int_to_float(raw: i16) -> Sample {
    if raw < 0 {
        raw as Sample / 32_768.0
    } else {
        raw as Sample / 32_767.0
    }
}

/// Float to 16-bit integer: clamp to [-1, 1], then the inverse scaling
#[inline]
fn float_to_int(sample: Sample) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32_768.0).round().max(-32_768.0) as i16
    } else {
        (clamped * 32_767.0).round() as i16
    }
}
