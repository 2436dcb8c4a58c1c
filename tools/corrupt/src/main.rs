//! Command-line tool for corrupted validation sets.
//!
//! - `list`: the 60 configuration names
//! - `info`: dataset metadata for one configuration
//! - `generate`: corrupt a validation directory and write images plus a manifest

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use corrupt_core::{
    load_toml_config, setup_cli_logging, CorruptionType, GenerationConfig, ImageEncoding,
};
use corrupt_dataset::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "corrupt")]
#[command(about = "Deterministic common-corruption variants of an image validation set", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML configuration file; command-line flags take precedence
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Png,
    Jpeg,
}

#[derive(Subcommand)]
enum Commands {
    /// List all configuration names
    List {
        /// Only list configurations of this corruption type
        #[arg(short = 't', long)]
        corruption: Option<String>,
    },

    /// Print dataset metadata for a configuration as JSON
    Info {
        /// Configuration name, e.g. fog_3
        name: String,

        /// Validation images directory, to report the split size
        #[arg(short, long)]
        images_dir: Option<PathBuf>,

        /// Validation labels file (flat layout)
        #[arg(short, long, requires = "images_dir")]
        labels: Option<PathBuf>,

        /// Class names file, one per line, to name the label feature
        #[arg(long)]
        class_names: Option<PathBuf>,
    },

    /// Corrupt the validation split and write it to disk
    Generate {
        /// Configuration name, e.g. fog_3
        #[arg(short, long, conflicts_with_all = ["corruption", "all"])]
        name: Option<String>,

        /// Corruption type (with --severity)
        #[arg(short = 't', long, requires = "severity")]
        corruption: Option<String>,

        /// Severity 1-5 (with --corruption)
        #[arg(short, long, requires = "corruption")]
        severity: Option<i64>,

        /// Generate all 60 configurations, one sub-directory each
        #[arg(long)]
        all: bool,

        /// Validation images directory
        #[arg(short, long)]
        images_dir: Option<PathBuf>,

        /// Validation labels file, one label per line in file name order (flat layout)
        #[arg(short, long)]
        labels: Option<PathBuf>,

        /// Class names file, one per line (per-class layout)
        #[arg(long)]
        class_names: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output image format
        #[arg(short, long, value_enum)]
        format: Option<Format>,

        /// JPEG quality when --format jpeg
        #[arg(short, long, default_value = "95")]
        quality: u8,

        /// Replace an existing output dataset
        #[arg(long)]
        overwrite: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_cli_logging(cli.verbose)?;

    let mut config: GenerationConfig = match &cli.config {
        Some(path) => load_toml_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GenerationConfig::default(),
    };

    match cli.command {
        Commands::List { corruption } => list_configs(corruption.as_deref())?,

        Commands::Info {
            name,
            images_dir,
            labels,
            class_names,
        } => {
            if labels.is_some() {
                config.source.labels_file = labels;
            }
            if class_names.is_some() {
                config.source.class_names_file = class_names;
            }
            let class_names = load_class_names(&config)?;
            if let Some(dir) = images_dir {
                config.source.images_dir = dir;
                let source = open_source(&config, class_names.as_ref())?;
                print_info(CorruptedImagenet::from_config_name(source, &name)?, class_names)?;
            } else {
                let dataset = CorruptedImagenet::from_config_name(InMemorySource::default(), &name)?;
                print_info(dataset, class_names)?;
            }
        }

        Commands::Generate {
            name,
            corruption,
            severity,
            all,
            images_dir,
            labels,
            class_names,
            output_dir,
            format,
            quality,
            overwrite,
        } => {
            if let Some(dir) = images_dir {
                config.source.images_dir = dir;
            }
            if labels.is_some() {
                config.source.labels_file = labels;
            }
            if class_names.is_some() {
                config.source.class_names_file = class_names;
            }
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            match format {
                Some(Format::Png) => config.output.encoding = ImageEncoding::Png,
                Some(Format::Jpeg) => config.output.encoding = ImageEncoding::Jpeg { quality },
                None => {}
            }
            config.output.overwrite |= overwrite;

            let configs = if all {
                builder_configs()
            } else {
                vec![select_config(&config, name, corruption, severity)?]
            };
            let class_names = load_class_names(&config)?;
            let source = open_source(&config, class_names.as_ref())?;

            for builder_config in configs {
                let out_dir = if all {
                    config.output.dir.join(&builder_config.name)
                } else {
                    config.output.dir.clone()
                };
                let mut dataset = CorruptedImagenet::new(source.clone(), builder_config);
                if let Some(class_names) = &class_names {
                    dataset = dataset.with_class_names(class_names.clone());
                }
                generate(&dataset, &out_dir, &config)?;
            }
        }
    }

    Ok(())
}

fn list_configs(corruption: Option<&str>) -> Result<()> {
    let filter = corruption.map(str::parse::<CorruptionType>).transpose()?;
    for config in builder_configs() {
        if filter.map_or(true, |t| t == config.spec.corruption_type) {
            println!("{:<24} {}", config.name, config.description);
        }
    }
    Ok(())
}

fn print_info<S: ValidationSource>(
    mut dataset: CorruptedImagenet<S>,
    class_names: Option<ClassNames>,
) -> Result<()> {
    if let Some(class_names) = class_names {
        dataset = dataset.with_class_names(class_names);
    }
    println!("{}", serde_json::to_string_pretty(&dataset.info())?);
    Ok(())
}

/// Configuration from `--name`, `--corruption/--severity` or the config file, in that order
fn select_config(
    config: &GenerationConfig,
    name: Option<String>,
    corruption: Option<String>,
    severity: Option<i64>,
) -> Result<BuilderConfig> {
    if let Some(name) = name {
        return Ok(BuilderConfig::from_name(&name)?);
    }
    if let (Some(corruption), Some(severity)) = (corruption, severity) {
        let bound = resolve(&corruption, severity)?;
        return Ok(BuilderConfig::new(bound.spec()));
    }
    match config.spec()? {
        Some(spec) => Ok(BuilderConfig::new(spec)),
        None => bail!("No configuration selected: pass --name, --corruption/--severity or --all"),
    }
}

fn load_class_names(config: &GenerationConfig) -> Result<Option<ClassNames>> {
    Ok(config
        .source
        .class_names_file
        .as_deref()
        .map(ClassNames::from_file)
        .transpose()?)
}

/// Flat layout when a labels file is configured, per-class layout otherwise
fn open_source(config: &GenerationConfig, class_names: Option<&ClassNames>) -> Result<DirectorySource> {
    let images_dir = &config.source.images_dir;
    let source = match &config.source.labels_file {
        Some(labels) => DirectorySource::flat(images_dir, labels)?,
        None => DirectorySource::per_class(images_dir, class_names)?,
    };
    if source.num_examples() == 0 {
        warn!("No images found in {}", images_dir.display());
    }
    Ok(source)
}

fn generate(
    dataset: &CorruptedImagenet<DirectorySource>,
    out_dir: &Path,
    config: &GenerationConfig,
) -> Result<()> {
    info!("Generating {} into {}", dataset.config().name, out_dir.display());

    let mut writer = DatasetWriter::create(out_dir, config.output.encoding, config.output.overwrite)?;
    writer.write_info(&dataset.info())?;

    let pb = ProgressBar::new(dataset.source().num_examples() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    pb.set_message(dataset.config().name.clone());

    let mut rng = RandomState::from_entropy();
    for example in dataset.generate_examples(&mut rng)? {
        let example = example.with_context(|| {
            format!("Generation of {} aborted", dataset.config().name)
        })?;
        writer.write(&example)?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    let written = writer.finish()?;
    info!("{}: {} examples", dataset.config().name, written);
    Ok(())
}
