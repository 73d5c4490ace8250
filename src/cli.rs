use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Options file (default: `<config dir>/quizdl/options.json`).
    #[arg(long, global = true)]
    pub options_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract a set and print the page agent reply as JSON.
    Scrape(ScrapeArgs),
    /// Extract a set and save it as JSON, CSV or DOCX.
    Download(DownloadArgs),
    Options {
        #[command(subcommand)]
        command: OptionsCommand,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Docx,
}

impl ExportFormat {
    pub fn ext(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Docx => "docx",
        }
    }
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct PageSourceArgs {
    /// Saved HTML of a set page (expand the set before saving).
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Fetch the set page over HTTP.
    #[arg(long)]
    pub url: Option<String>,
}

#[derive(Debug, Args)]
pub struct PageArgs {
    #[command(flatten)]
    pub source: PageSourceArgs,

    /// Address the saved HTML was loaded from (resolves links, names the set URL).
    #[arg(long, requires = "html")]
    pub page_url: Option<String>,

    /// Page layout JSON overriding the built-in selectors.
    #[arg(long)]
    pub layout: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    #[command(flatten)]
    pub page: PageArgs,

    /// Mark the payload as swapped (definition first).
    #[arg(long)]
    pub swap: bool,

    /// Write the reply here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub page: PageArgs,

    #[command(flatten)]
    pub edits: OptionEdits,

    /// Directory offered for saving.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Save into `--out-dir` without prompting.
    #[arg(long)]
    pub yes: bool,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

/// Edits to the stored options; every given flag is persisted.
#[derive(Debug, Args, Default)]
pub struct OptionEdits {
    /// Filename template, e.g. `{quizSetTitle}_YYYY-MM-DD_{swapState}`.
    #[arg(long)]
    pub pattern: Option<String>,

    #[arg(long, value_enum)]
    pub format: Option<ExportFormat>,

    /// Present definitions before terms.
    #[arg(long)]
    pub swap: Option<bool>,

    /// Embed or reference definition images.
    #[arg(long)]
    pub include_images: Option<bool>,

    /// Use the stored filename template instead of the default one.
    #[arg(long)]
    pub custom_pattern: Option<bool>,
}

#[derive(Debug, Subcommand)]
pub enum OptionsCommand {
    /// Print the stored options.
    Show,
    /// Change and persist options.
    Set(OptionEdits),
    /// Restore and persist the defaults.
    Reset,
}
