//! CLI definitions and command dispatch.

use std::{
    fs::remove_dir_all,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::warn;

use cascadia_core::{
    BuildConfig, BuildOptions, ExternalTools, FontMetadata, FontPreparer, LogObserver,
    PipelineContext, PrepareSources,
    donor::glyph_set_from_font,
    io::{glob_fonts, read_font},
    run_build,
};
use cascadia_hint_transfer::HintContainer;
use clap::{Parser, Subcommand};

use crate::bridge::SourceBridge;

#[derive(Parser)]
#[command(name = "cascadia-build")]
#[command(about = "Build the Cascadia Code font family")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct BuildArgs {
    #[arg(long, default_value = "sources")]
    pub input_dir: PathBuf,
    #[arg(long, default_value = "build")]
    pub output_dir: PathBuf,
    /// Font binary carrying the precompiled hint tables.
    #[arg(long)]
    pub vtt_data: Option<PathBuf>,
    #[arg(short, long)]
    pub version: Option<String>,
    #[arg(long)]
    pub no_powerline: bool,
    #[arg(long)]
    pub no_mono: bool,
    #[arg(long)]
    pub no_nerd_fonts: bool,
    #[arg(long)]
    pub no_italic: bool,
    /// Also build static instances (TTF and OTF).
    #[arg(long)]
    pub static_fonts: bool,
    /// Skip hint-program transfer onto the variable fonts.
    #[arg(long)]
    pub no_vtt_compile: bool,
    /// Convert every output to WOFF2 as well.
    #[arg(long)]
    pub web_fonts: bool,
}

impl BuildArgs {
    fn into_config(self) -> BuildConfig {
        let mut config = BuildConfig::new(self.input_dir, self.output_dir);
        config.options = BuildOptions {
            powerline: !self.no_powerline,
            mono: !self.no_mono,
            nerd_fonts: !self.no_nerd_fonts,
            italic: !self.no_italic,
            static_instances: self.static_fonts,
            compile_hints: !self.no_vtt_compile,
            web_fonts: self.web_fonts,
        };
        if let Some(version) = self.version {
            config.version = version;
        }
        config.vtt_data = self.vtt_data;
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the font family.
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },
    /// Remove build outputs.
    Clean {
        #[arg(long, default_value = "build")]
        output_dir: PathBuf,
    },
}

impl Commands {
    pub fn run(self) -> Result<()> {
        match self {
            Commands::Build { args } => build(args.into_config()),
            Commands::Clean { output_dir } => clean(&output_dir),
        }
    }
}

fn build(config: BuildConfig) -> Result<()> {
    let bridge = SourceBridge::new(&config);
    let document = bridge.load_document().context("Failed to load design document")?;

    let sources = load_prepare_sources(&config)?;
    let preparer =
        FontPreparer::new(sources, FontMetadata::family_defaults(config.version.clone()));

    let hints = load_hint_container(&config)?;
    let tools = ExternalTools::new(&config.tools);

    let summary = run_build(&PipelineContext {
        config: &config,
        document: &document,
        instantiator: &bridge,
        compiler: &bridge,
        preparer: &preparer,
        hints: hints.as_ref(),
        tools: &tools,
        observer: &LogObserver,
    })?;

    println!(
        "\nBuilt {} font files ({} hint failures, {} web fonts)",
        summary.outputs.len(),
        summary.hint_failures,
        summary.web_fonts_written
    );
    Ok(())
}

fn load_prepare_sources(config: &BuildConfig) -> Result<PrepareSources> {
    let features_dir = config.input_dir.join("features");
    let read_features = |name: &str| {
        std::fs::read_to_string(features_dir.join(name))
            .with_context(|| format!("Failed to read feature file '{name}'"))
    };

    let mut sources = PrepareSources {
        code_features: read_features("code.fea")?,
        mono_features: read_features("mono.fea")?,
        decoration_features: std::fs::read_to_string(features_dir.join("decoration.fea")).ok(),
        ..PrepareSources::default()
    };

    let options = &config.options;
    if options.powerline || options.nerd_fonts {
        sources.powerline_donor = glyph_set_from_font(&read_font(&config.powerline_donor)?)
            .with_context(|| {
                format!("Failed to load donor {}", config.powerline_donor.display())
            })?;
    }
    if options.nerd_fonts {
        let mut donors = config.symbol_donors.clone();
        if donors.is_empty() {
            donors = glob_fonts(&config.input_dir.join("donors"), "symbols*.ttf")?;
        }
        for path in donors {
            let set = glyph_set_from_font(&read_font(&path)?)
                .with_context(|| format!("Failed to load donor {}", path.display()))?;
            sources.symbol_donors.push(set);
        }
    }

    Ok(sources)
}

fn load_hint_container(config: &BuildConfig) -> Result<Option<HintContainer>> {
    if !config.options.compile_hints {
        return Ok(None);
    }
    let Some(path) = &config.vtt_data else {
        warn!("no --vtt-data given, skipping hint-program transfer");
        return Ok(None);
    };
    let data = read_font(path)?;
    let container = HintContainer::from_font_bytes(&data)
        .with_context(|| format!("Failed to read hint tables from {}", path.display()))?;
    Ok(Some(container))
}

fn clean(output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        remove_dir_all(output_dir)
            .with_context(|| format!("Failed to remove {}", output_dir.display()))?;
        println!("Removed {}", output_dir.display());
    } else {
        println!("Skipped {} (not found)", output_dir.display());
    }
    Ok(())
}
