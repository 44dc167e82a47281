//! Pipeline and WAV file information.

use super::common::{ParamArgs, describe};
use clap::Args;
use std::path::PathBuf;
use tapesat_core::ProcessSpec;
use tapesat_effects::{ParamId, TapePipeline};
use tapesat_io::{WavFormat, read_wav_info};

/// Display pipeline information.
#[derive(Args)]
pub struct InfoArgs {
    /// Optional WAV file to describe
    pub file: Option<PathBuf>,

    #[command(flatten)]
    params: ParamArgs,

    /// Sample rate used for the latency report (the file's rate if given)
    #[arg(long, default_value = "48000")]
    sample_rate: u32,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let mut sample_rate = args.sample_rate;

    if let Some(file) = &args.file {
        let info = read_wav_info(file)?;
        let format_str = match info.format {
            WavFormat::Pcm => "PCM",
            WavFormat::IeeeFloat => "IEEE Float",
        };

        println!("File:        {}", file.display());
        println!("Format:      {} {}-bit", format_str, info.bits_per_sample);
        println!("Channels:    {}", info.channels);
        println!("Sample Rate: {} Hz", info.sample_rate);
        println!(
            "Duration:    {:.3}s ({} frames)",
            info.duration_secs, info.num_frames
        );
        println!();
        sample_rate = info.sample_rate;
    }

    let spec = ProcessSpec::new(f64::from(sample_rate), 512, 2);
    if !spec.is_valid() {
        anyhow::bail!("cannot prepare the pipeline at {sample_rate} Hz");
    }
    let snapshot = args.params.resolve()?;
    let mut pipeline = TapePipeline::with_parameters(&snapshot);
    pipeline.prepare(&spec);

    println!("Pipeline:    gain -> saturation (2x) -> noise -> mix");
    println!(
        "Latency:     {:.3} samples at {} Hz",
        pipeline.latency_samples(),
        sample_rate
    );
    println!("Tail:        {:.1}s", pipeline.tail_seconds());
    println!("Settings:    {}", describe(&snapshot));
    println!();
    println!("Parameters:");
    for id in ParamId::ALL {
        let d = id.descriptor();
        println!(
            "  {:10} {}..{}{} (default {})",
            id.name(),
            d.min,
            d.max,
            d.unit.suffix(),
            d.default
        );
    }

    Ok(())
}
