//! File-based rendering command.

use super::common::{ParamArgs, describe, levels_db, progress_bar};
use clap::Args;
use tapesat_effects::TapePipeline;
use tapesat_io::{OfflineRenderer, WavSpec, read_wav, write_wav};
use std::path::PathBuf;

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    params: ParamArgs,

    /// Processing block size
    #[arg(long, default_value = "512")]
    block_size: u32,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,

    /// Shift the output to cancel the oversampler's latency
    #[arg(long)]
    compensate_latency: bool,

    /// Seed for the hiss generator
    #[arg(long)]
    seed: Option<u64>,
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    let snapshot = args.params.resolve()?;

    println!("Reading {}...", args.input.display());
    let (input, spec) = read_wav(&args.input)?;
    println!(
        "  {} channel(s), {} frames, {} Hz, {:.2}s",
        input.num_channels(),
        input.num_samples(),
        spec.sample_rate,
        input.num_samples() as f32 / spec.sample_rate as f32
    );
    println!("Parameters: {}", describe(&snapshot));

    let mut pipeline = TapePipeline::with_parameters(&snapshot);
    if let Some(seed) = args.seed {
        pipeline = pipeline.with_noise_seed(seed);
    }
    let mut renderer = OfflineRenderer::new(pipeline, args.block_size)
        .with_latency_compensation(args.compensate_latency);

    let pb = progress_bar(input.num_samples() as u64)?;
    let output = renderer.render(&input, spec.sample_rate, |progress| {
        pb.set_position(progress.frames_done as u64);
    });
    pb.finish_with_message("done");

    tracing::info!(
        sample_rate = spec.sample_rate,
        block_size = renderer.block_size(),
        latency = renderer.pipeline().latency_samples(),
        "rendered"
    );

    let (input_rms, input_peak) = levels_db(input.channels());
    let (output_rms, output_peak) = levels_db(output.channels());
    println!("\nStats:");
    println!("  Input:  RMS {input_rms:.1} dB, Peak {input_peak:.1} dB");
    println!("  Output: RMS {output_rms:.1} dB, Peak {output_peak:.1} dB");

    let out_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: args.bit_depth,
    };

    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &output, out_spec)?;
    println!("Done!");

    Ok(())
}
