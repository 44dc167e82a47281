//! Preset management commands.

use super::common::ParamArgs;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use tapesat_config::paths::{ensure_user_presets_dir, list_user_presets, preset_file_name};
use tapesat_config::{Preset, factory_presets, is_factory_preset, resolve_preset, user_presets_dir};
use tapesat_effects::ParamId;

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List available presets (factory and user)
    List {
        /// Show only factory presets
        #[arg(long)]
        factory: bool,

        /// Show only user presets
        #[arg(long)]
        user: bool,
    },

    /// Show the parameter values of a preset
    Show {
        /// Preset name or path
        name: String,
    },

    /// Save a parameter set as a user preset
    Save {
        /// Name for the new preset
        name: String,

        #[command(flatten)]
        params: ParamArgs,

        /// Description of the preset
        #[arg(short, long)]
        description: Option<String>,

        /// Write to this file instead of the user presets directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite if preset already exists
        #[arg(long)]
        force: bool,
    },

    /// Show preset directories
    Paths,
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.command {
        PresetsCommand::List { factory, user } => list_presets(factory, user),
        PresetsCommand::Show { name } => show_preset(&name),
        PresetsCommand::Save {
            name,
            params,
            description,
            output,
            force,
        } => save_preset(&name, &params, description.as_deref(), output, force),
        PresetsCommand::Paths => {
            println!("User presets: {}", user_presets_dir().display());
            Ok(())
        }
    }
}

fn list_presets(factory_only: bool, user_only: bool) -> anyhow::Result<()> {
    let header = format!(
        "  {:12} {:>6} {:>6} {:>6} {:>6}  {}",
        "name", "sat", "drive", "mix", "hiss", "description"
    );

    if !user_only {
        println!("factory:");
        println!("{header}");
        for preset in factory_presets() {
            print_row(&preset.name, &preset);
        }
        println!();
    }

    if !factory_only {
        println!("user ({}):", user_presets_dir().display());
        let paths = list_user_presets();
        if paths.is_empty() {
            println!("  (none yet; try `tapesat presets save <name> --drive 4 --mix 50`)");
        } else {
            println!("{header}");
        }
        for path in paths {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("?");
            match Preset::load(&path) {
                Ok(preset) => print_row(stem, &preset),
                Err(e) => println!("  {stem:12} unreadable: {e}"),
            }
        }
    }

    Ok(())
}

fn print_row(label: &str, preset: &Preset) {
    match preset.snapshot() {
        Ok(p) => println!(
            "  {label:12} {:>6.1} {:>6.1} {:>6.1} {:>6.1}  {}",
            p.saturation,
            p.drive,
            p.mix,
            p.hiss,
            preset.description.as_deref().unwrap_or("")
        ),
        Err(e) => println!("  {label:12} invalid: {e}"),
    }
}

fn show_preset(name: &str) -> anyhow::Result<()> {
    let preset = resolve_preset(name)?;
    let snapshot = preset.snapshot()?;

    println!("Preset: {}", preset.name);
    println!("{}", "=".repeat(8 + preset.name.len()));
    if let Some(desc) = &preset.description {
        println!("{desc}");
    }
    println!();

    for id in ParamId::ALL {
        let d = id.descriptor();
        println!(
            "  {:10} {:>6.1}{:2} (range {}..{}, default {})",
            id.name(),
            snapshot.get(id),
            d.unit.suffix(),
            d.min,
            d.max,
            d.default
        );
    }

    Ok(())
}

fn save_preset(
    name: &str,
    params: &ParamArgs,
    description: Option<&str>,
    output: Option<PathBuf>,
    force: bool,
) -> anyhow::Result<()> {
    if output.is_none() && is_factory_preset(name) {
        anyhow::bail!("'{name}' is a factory preset name; pick another name");
    }

    let path = match output {
        Some(path) => path,
        None => ensure_user_presets_dir()?.join(preset_file_name(name)),
    };
    if path.exists() && !force {
        anyhow::bail!(
            "Preset file {} already exists. Use --force to overwrite.",
            path.display()
        );
    }

    let mut preset = Preset::from_snapshot(name, &params.resolve()?);
    if let Some(desc) = description {
        preset = preset.with_description(desc);
    }
    preset.save(&path)?;

    println!("Saved preset '{}' to {}", name, path.display());
    Ok(())
}
