//! Command line arguments

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use glyphs_model::Font;
use log::info;

use crate::{
    config::{Settings, SettingsOverrides},
    engine::{clear_master_paths, for_each_selected, sync_glyph, Engine, GlyphSelection, RunReport},
    offset::NormalOffset,
    profile::Preset,
    Error,
};

/// Turn single stroke glyphs into multi-line masters.
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Synthesize the masters and bracket layers of the selected glyphs
    Process {
        #[command(flatten)]
        font: FontArgs,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Match every layer's width to the first master, keeping side bearing proportions
    Sync {
        #[command(flatten)]
        font: FontArgs,
    },
    /// Delete all paths in every master of the selected glyphs
    Clear {
        #[command(flatten)]
        font: FontArgs,
    },
}

#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct FontArgs {
    /// A font json file
    #[arg(short, long)]
    pub source: PathBuf,

    /// Where to write the result. Defaults to overwriting the source.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// A glyph to work on, may be repeated
    #[arg(long = "glyph")]
    pub glyphs: Vec<String>,

    /// Glyph names must match this regex to be processed
    #[arg(short, long)]
    #[clap(default_value = None)]
    pub glyph_name_filter: Option<String>,
}

impl FontArgs {
    pub fn selection(&self) -> Result<GlyphSelection, Error> {
        GlyphSelection::new(
            self.glyphs.iter().map(String::as_str),
            self.glyph_name_filter.as_deref(),
        )
    }

    pub fn output(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.source)
    }
}

/// Values here take precedence over the config file.
///
/// Numbers are taken as text so a typo falls back to the default instead of
/// failing the run.
#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct SettingsArgs {
    /// A yaml settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Distance between the two lines of a split stroke
    #[arg(long, allow_hyphen_values = true)]
    pub offset: Option<String>,

    #[arg(long)]
    pub min_width: Option<String>,

    #[arg(long)]
    pub medium_width: Option<String>,

    #[arg(long)]
    pub max_width: Option<String>,

    /// Keep split strokes on the dominant axis of the original
    #[arg(long)]
    pub maintain_y: Option<String>,

    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// Comma separated axis ids for the bracket layers
    #[arg(long)]
    pub bracket_axes: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub bracket_threshold: Option<String>,
}

impl SettingsArgs {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            original_offset: self.offset.clone(),
            min_stroke_width: self.min_width.clone(),
            medium_stroke_width: self.medium_width.clone(),
            max_stroke_width: self.max_width.clone(),
            maintain_y_position: self.maintain_y.clone(),
            preset: self.preset,
            bracket_axes: self.bracket_axes.clone(),
            bracket_threshold: self.bracket_threshold.clone(),
        }
    }

    pub fn settings(&self) -> Result<Settings, Error> {
        let mut settings = match &self.config {
            Some(file) => Settings::load(file)?,
            None => Settings::default(),
        };
        settings.apply_overrides(&self.overrides());
        Ok(settings)
    }
}

impl Command {
    fn font_args(&self) -> &FontArgs {
        match self {
            Command::Process { font, .. } | Command::Sync { font } | Command::Clear { font } => {
                font
            }
        }
    }

    /// Load the font, run the command on the selection and save what succeeded.
    ///
    /// Fails if any glyph failed, after saving the others.
    pub fn run(&self) -> Result<RunReport, Error> {
        let font_args = self.font_args();
        let selection = font_args.selection()?;
        let mut font = Font::load(&font_args.source)?;

        let report = match self {
            Command::Process { settings, .. } => {
                let settings = settings.settings()?;
                info!("Processing with {settings:?}");
                Engine::new(settings, NormalOffset).process(&mut font, &selection)
            }
            Command::Sync { .. } => for_each_selected(&mut font, &selection, sync_glyph),
            Command::Clear { .. } => for_each_selected(&mut font, &selection, clear_master_paths),
        };
        report.log_summary();

        if !report.glyphs.is_empty() {
            let output = font_args.output();
            font.save(output)?;
            info!("Wrote {}", output.display());
        }
        report.into_result()
    }
}
