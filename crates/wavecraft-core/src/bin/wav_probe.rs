//! wav-probe - inspect a WAV file from the command line
//!
//! Decodes the file, prints its format and peak level, and renders a
//! coarse ASCII waveform of channel zero.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use wavecraft_core::codec;
use wavecraft_core::waveform;

/// Rows of the ASCII waveform
const PLOT_HEIGHT: usize = 8;
/// Columns of the ASCII waveform
const PLOT_WIDTH: usize = 72;

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        bail!("usage: wav-probe <file.wav>");
    }
    let path = PathBuf::from(&args[1]);

    let buffer = codec::decode_file(&path)
        .with_context(|| format!("failed to decode {:?}", path))?;

    println!("file:       {}", path.display());
    println!("channels:   {}", buffer.channel_count());
    println!("rate:       {} Hz", buffer.sample_rate());
    println!("frames:     {}", buffer.frame_count());
    println!("duration:   {:.3} s", buffer.duration_seconds());
    println!("peak:       {:.4}", buffer.peak());

    let summary = waveform::summarize(&buffer, PLOT_WIDTH, 1);
    if !summary.is_empty() {
        println!();
        for line in render_plot(summary.columns()) {
            println!("{line}");
        }
    }

    Ok(())
}

/// Render peak columns as rows of '#' characters, top row = +1.0
fn render_plot(columns: &[waveform::PeakColumn]) -> Vec<String> {
    let mut rows = Vec::with_capacity(PLOT_HEIGHT);
    for row in 0..PLOT_HEIGHT {
        // Row bands cover [-1, 1] from top to bottom
        let band_top = 1.0 - 2.0 * row as f32 / PLOT_HEIGHT as f32;
        let band_bottom = 1.0 - 2.0 * (row + 1) as f32 / PLOT_HEIGHT as f32;
        let line: String = columns
            .iter()
            .map(|c| {
                if c.max >= band_bottom && c.min <= band_top {
                    '#'
                } else {
                    ' '
                }
            })
            .collect();
        rows.push(line);
    }
    rows
}
