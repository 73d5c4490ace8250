//! Control agent: options, the download pipeline and user-confirmed saving.

use std::fmt;
use std::io::{BufRead as _, IsTerminal as _, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt as _;

use crate::agent::PageAgentHandle;
use crate::cli::DownloadArgs;
use crate::export::{Rendered, format_payload};
use crate::filename;
use crate::formats::{ScrapeReply, ScrapeRequest};
use crate::layout::PageLayout;
use crate::net::{HttpImageFetcher, ImageFetcher};
use crate::options::{JsonFileOptionsStore, OptionsStore, PartialOptions, UserOptions, load_options};

pub const MSG_WRONG_SITE: &str = "Error: Please open a Quizlet set page.";
pub const MSG_NO_DATA: &str = "Error: No data found or script failed.";
pub const MSG_NOT_READY: &str = "Error: Page not ready or blocked.";
pub const MSG_SCRAPING: &str = "Scraping data...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Progress,
    Success,
    Error,
}

/// One-line user-facing status with a color cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub tone: Tone,
    pub text: String,
}

impl Status {
    pub fn progress(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Progress,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.tone == Tone::Error
    }

    pub fn render(&self, color: bool) -> String {
        if !color {
            return self.text.clone();
        }
        let code = match self.tone {
            Tone::Progress => "33",
            Tone::Success => "32",
            Tone::Error => "31",
        };
        format!("\x1b[{code}m{}\x1b[0m", self.text)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Destination for a finished file. `Ok(None)` means the user cancelled.
#[async_trait]
pub trait SaveTarget: Send + Sync {
    async fn save(&self, suggested_name: &str, file: &Rendered) -> anyhow::Result<Option<PathBuf>>;
}

/// Saves into a directory the user confirmed up front with `--yes`.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
    overwrite: bool,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            dir: dir.into(),
            overwrite,
        }
    }
}

#[async_trait]
impl SaveTarget for DirectorySaver {
    async fn save(&self, suggested_name: &str, file: &Rendered) -> anyhow::Result<Option<PathBuf>> {
        let path = self.dir.join(suggested_name);
        write_file(&path, file, self.overwrite).await?;
        Ok(Some(path))
    }
}

/// Asks on the terminal where to save, offering `dir/suggested_name`.
#[derive(Debug, Clone)]
pub struct PromptSaver {
    dir: PathBuf,
    overwrite: bool,
}

impl PromptSaver {
    pub fn new(dir: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            dir: dir.into(),
            overwrite,
        }
    }
}

#[async_trait]
impl SaveTarget for PromptSaver {
    async fn save(&self, suggested_name: &str, file: &Rendered) -> anyhow::Result<Option<PathBuf>> {
        let suggested = self.dir.join(suggested_name);
        let Some(answer) = prompt(format!("Save as [{}]: ", suggested.display())).await? else {
            return Ok(None);
        };

        let path = match answer.trim() {
            "" => suggested,
            typed => {
                let typed = PathBuf::from(typed);
                if typed.is_dir() {
                    typed.join(suggested_name)
                } else {
                    typed
                }
            }
        };

        let mut overwrite = self.overwrite;
        if !overwrite && tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let confirm = prompt(format!("{} exists. Overwrite? [y/N]: ", path.display())).await?;
            let yes = confirm
                .as_deref()
                .map(|answer| matches!(answer.trim(), "y" | "Y" | "yes"))
                .unwrap_or(false);
            if !yes {
                return Ok(None);
            }
            overwrite = true;
        }

        write_file(&path, file, overwrite).await?;
        Ok(Some(path))
    }
}

/// Reads one answer line from stdin; `None` on end of input.
async fn prompt(question: String) -> anyhow::Result<Option<String>> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<Option<String>> {
        let mut stderr = std::io::stderr().lock();
        write!(stderr, "{question}").context("write prompt")?;
        stderr.flush().context("flush prompt")?;

        let mut line = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("read answer")?;
        Ok((read > 0).then_some(line))
    })
    .await
    .context("join prompt task")?
}

/// Writes `file` to `path`. Without `overwrite` the file must not exist yet; the check
/// and the create are one `create_new` open.
async fn write_file(path: &Path, file: &Rendered, overwrite: bool) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create dir: {}", parent.display()))?;
    }

    let mut open = tokio::fs::OpenOptions::new();
    open.write(true);
    if overwrite {
        open.create(true).truncate(true);
    } else {
        open.create_new(true);
    }
    let mut out = match open.open(path).await {
        Ok(out) => out,
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }
        Err(err) => return Err(err).with_context(|| format!("open: {}", path.display())),
    };
    out.write_all(&file.bytes)
        .await
        .with_context(|| format!("write: {}", path.display()))?;
    out.flush()
        .await
        .with_context(|| format!("flush: {}", path.display()))?;
    tracing::info!(path = %path.display(), mime = file.mime_type, bytes = file.bytes.len(), "saved file");
    Ok(())
}

pub struct ControlAgent {
    store: Box<dyn OptionsStore>,
    target: Box<dyn SaveTarget>,
    fetcher: Box<dyn ImageFetcher>,
    layout: PageLayout,
    options: UserOptions,
}

impl ControlAgent {
    /// Restores the stored options once for this session.
    pub async fn open(
        store: Box<dyn OptionsStore>,
        target: Box<dyn SaveTarget>,
        fetcher: Box<dyn ImageFetcher>,
        layout: PageLayout,
    ) -> anyhow::Result<Self> {
        let options = load_options(store.as_ref()).await.context("load options")?;
        tracing::debug!(?options, "restored options");
        Ok(Self {
            store,
            target,
            fetcher,
            layout,
            options,
        })
    }

    pub fn options(&self) -> &UserOptions {
        &self.options
    }

    /// Applies an edit and saves the whole record.
    pub async fn update(&mut self, edits: PartialOptions) -> anyhow::Result<()> {
        if edits.is_empty() {
            return Ok(());
        }
        self.options.apply(edits);
        self.store
            .save(&self.options)
            .await
            .context("save options")
    }

    pub async fn download(&mut self, page: &mut PageAgentHandle) -> Status {
        if !self.layout.matches_site(page.location()) {
            tracing::warn!(location = %page.location(), site = %self.layout.site_host, "not a set page");
            return Status::error(MSG_WRONG_SITE);
        }

        let reply = match page.request(ScrapeRequest::scrape(self.options.swap)).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(%err, "page agent unavailable");
                return Status::error(MSG_NOT_READY);
            }
        };
        let payload = match reply {
            ScrapeReply::Success { payload } => payload,
            ScrapeReply::Fail {
                message: Some(message),
                ..
            } => return Status::error(message),
            ScrapeReply::Fail { message: None, .. } => return Status::error(MSG_NO_DATA),
        };

        let format = self.options.output_format;
        let now = chrono::Local::now().fixed_offset();
        let name = filename::generate(
            self.options.effective_pattern(),
            &payload.info,
            format.ext(),
            &now,
        );

        let file = match format_payload(
            &payload,
            format,
            self.options.include_images,
            self.fetcher.as_ref(),
        )
        .await
        {
            Ok(file) => file,
            Err(err) => {
                tracing::error!("format payload: {err:#}");
                return Status::error(format!("Error: {err}"));
            }
        };

        match self.target.save(&name, &file).await {
            Ok(Some(_)) => Status::success(format!(
                "Done! Found {} terms.",
                payload.info.number_of_quizzes
            )),
            Ok(None) => Status::error("Save cancelled."),
            Err(err) => {
                tracing::error!("save file: {err:#}");
                Status::error(format!("Error: {err}"))
            }
        }
    }
}

pub async fn run(options_file: Option<&Path>, args: DownloadArgs) -> anyhow::Result<()> {
    let layout = PageLayout::load_or_default(args.page.layout.as_deref()).context("load layout")?;
    let store = JsonFileOptionsStore::open(options_file)?;
    let target: Box<dyn SaveTarget> = if args.yes {
        Box::new(DirectorySaver::new(&args.out_dir, args.force))
    } else {
        Box::new(PromptSaver::new(&args.out_dir, args.force))
    };
    let fetcher = HttpImageFetcher::new()?;

    let mut control =
        ControlAgent::open(Box::new(store), target, Box::new(fetcher), layout.clone()).await?;
    control.update(PartialOptions::from(&args.edits)).await?;

    let color = std::io::stdout().is_terminal();
    println!("{}", Status::progress(MSG_SCRAPING).render(color));

    let mut page = crate::agent::open_page(&args.page, &layout).await;
    let status = control.download(&mut page).await;
    println!("{}", status.render(color));

    if status.is_error() {
        anyhow::bail!("download did not complete");
    }
    Ok(())
}
