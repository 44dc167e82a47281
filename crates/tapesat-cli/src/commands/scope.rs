//! Display spectrum of a rendered file.
//!
//! Renders the input through the pipeline with the spectrum feed attached,
//! consumes frames at the display cadence the way a UI would, and prints the
//! final smoothed display array as a bar chart.

use super::common::{ParamArgs, describe};
use clap::Args;
use std::path::PathBuf;
use tapesat_analysis::{MAX_DB, MIN_DB, REDRAW_HZ, SCOPE_SIZE, SpectrumAnalyzer, skewed_proportion};
use tapesat_effects::TapePipeline;
use tapesat_io::{OfflineRenderer, read_wav};

#[derive(Args)]
pub struct ScopeArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    #[command(flatten)]
    params: ParamArgs,

    /// Display channel to print (0 = left, 1 = right)
    #[arg(long, default_value = "0")]
    channel: usize,

    /// Number of rows in the printed chart
    #[arg(long, default_value = "32")]
    rows: usize,

    /// Processing block size
    #[arg(long, default_value = "512")]
    block_size: u32,
}

const BAR_WIDTH: usize = 48;

pub fn run(args: ScopeArgs) -> anyhow::Result<()> {
    let snapshot = args.params.resolve()?;
    let (input, spec) = read_wav(&args.input)?;

    let mut pipeline = TapePipeline::with_parameters(&snapshot);
    let mut analyzer = pipeline.attach_spectrum();
    if args.channel >= analyzer.num_channels() {
        anyhow::bail!(
            "channel {} out of range (display has {} channels)",
            args.channel,
            analyzer.num_channels()
        );
    }

    let redraw_every = (spec.sample_rate / REDRAW_HZ).max(1) as usize;
    let mut next_redraw = redraw_every;
    let mut renderer = OfflineRenderer::new(pipeline, args.block_size);
    renderer.render(&input, spec.sample_rate, |progress| {
        if progress.frames_done >= next_redraw {
            analyzer.process_fft();
            next_redraw = progress.frames_done + redraw_every;
        }
    });
    analyzer.process_fft();

    if analyzer.frames_processed(args.channel) == 0 {
        anyhow::bail!(
            "input too short for a spectrum frame ({} frames)",
            input.num_samples()
        );
    }

    println!("Spectrum of {} ({})", args.input.display(), describe(&snapshot));
    print_chart(&analyzer, args.channel, args.rows.max(1), spec.sample_rate);
    Ok(())
}

fn print_chart(analyzer: &SpectrumAnalyzer, channel: usize, rows: usize, sample_rate: u32) {
    let scope = analyzer.scope_data(channel);
    let nyquist = sample_rate as f32 / 2.0;

    for row in 0..rows {
        let index = row * SCOPE_SIZE / rows;
        let level = scope[index];
        let freq = skewed_proportion(index, SCOPE_SIZE) * nyquist;
        let filled = ((level - MIN_DB) / (MAX_DB - MIN_DB) * BAR_WIDTH as f32).round() as usize;
        println!(
            "{freq:>8.0} Hz {level:>6.1} dB |{}",
            "#".repeat(filled.min(BAR_WIDTH))
        );
    }
}
