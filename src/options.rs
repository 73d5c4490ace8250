use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::cli::{ExportFormat, OptionEdits, OptionsCommand};
use crate::filename::DEFAULT_PATTERN;

const APP_DIR: &str = "quizdl";
const OPTIONS_FILE: &str = "options.json";

/// User presentation options, persisted as one flat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOptions {
    pub filename_pattern: String,
    pub output_format: ExportFormat,
    pub swap: bool,
    pub include_images: bool,
    pub custom_pattern_enabled: bool,
}

impl Default for UserOptions {
    fn default() -> Self {
        Self {
            filename_pattern: DEFAULT_PATTERN.to_owned(),
            output_format: ExportFormat::Json,
            swap: false,
            include_images: true,
            custom_pattern_enabled: false,
        }
    }
}

impl UserOptions {
    /// Pattern used for the next download.
    pub fn effective_pattern(&self) -> &str {
        if self.custom_pattern_enabled && !self.filename_pattern.trim().is_empty() {
            &self.filename_pattern
        } else {
            DEFAULT_PATTERN
        }
    }

    /// Overlays every key present in `partial`; absent keys keep their current value.
    pub fn apply(&mut self, partial: PartialOptions) {
        if let Some(pattern) = partial.filename_pattern {
            self.filename_pattern = pattern;
        }
        if let Some(format) = partial.output_format {
            self.output_format = format;
        }
        if let Some(swap) = partial.swap {
            self.swap = swap;
        }
        if let Some(include_images) = partial.include_images {
            self.include_images = include_images;
        }
        if let Some(enabled) = partial.custom_pattern_enabled {
            self.custom_pattern_enabled = enabled;
        }
    }
}

/// Stored record as read back: any key may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialOptions {
    #[serde(default)]
    pub filename_pattern: Option<String>,
    #[serde(default)]
    pub output_format: Option<ExportFormat>,
    #[serde(default)]
    pub swap: Option<bool>,
    #[serde(default)]
    pub include_images: Option<bool>,
    #[serde(default)]
    pub custom_pattern_enabled: Option<bool>,
}

impl PartialOptions {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl From<&OptionEdits> for PartialOptions {
    fn from(edits: &OptionEdits) -> Self {
        // Typing a pattern turns the custom pattern on unless told otherwise.
        let custom_pattern_enabled = edits
            .custom_pattern
            .or(edits.pattern.as_ref().map(|_| true));
        Self {
            filename_pattern: edits.pattern.clone(),
            output_format: edits.format,
            swap: edits.swap,
            include_images: edits.include_images,
            custom_pattern_enabled,
        }
    }
}

#[async_trait]
pub trait OptionsStore: Send + Sync {
    async fn load(&self) -> anyhow::Result<PartialOptions>;
    async fn save(&self, options: &UserOptions) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct JsonFileOptionsStore {
    path: PathBuf,
}

impl JsonFileOptionsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `--options-file` when given, else `<config dir>/quizdl/options.json`.
    pub fn open(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Ok(Self::new(path));
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("no config directory; pass --options-file"))?;
        Ok(Self::new(config_dir.join(APP_DIR).join(OPTIONS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl OptionsStore for JsonFileOptionsStore {
    async fn load(&self) -> anyhow::Result<PartialOptions> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no stored options");
                return Ok(PartialOptions::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("read: {}", self.path.display()));
            }
        };
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parse options: {}", self.path.display()))
    }

    async fn save(&self, options: &UserOptions) -> anyhow::Result<()> {
        write_json_atomic(&self.path, options).await?;
        tracing::debug!(path = %self.path.display(), "saved options");
        Ok(())
    }
}

async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    fs::create_dir_all(parent)
        .await
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value).context("serialize options")?;
    fs::write(&tmp_path, &data)
        .await
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}

/// Loads the stored record over the defaults.
pub async fn load_options(store: &dyn OptionsStore) -> anyhow::Result<UserOptions> {
    let mut options = UserOptions::default();
    options.apply(store.load().await?);
    Ok(options)
}

pub async fn run(options_file: Option<&Path>, command: OptionsCommand) -> anyhow::Result<()> {
    let store = JsonFileOptionsStore::open(options_file)?;
    let options = match command {
        OptionsCommand::Show => load_options(&store).await?,
        OptionsCommand::Set(edits) => {
            let mut options = load_options(&store).await?;
            options.apply(PartialOptions::from(&edits));
            store.save(&options).await?;
            options
        }
        OptionsCommand::Reset => {
            let options = UserOptions::default();
            store.save(&options).await?;
            options
        }
    };
    tracing::info!(path = %store.path().display(), "options");
    let text = serde_json::to_string_pretty(&options).context("serialize options")?;
    println!("{text}");
    Ok(())
}
