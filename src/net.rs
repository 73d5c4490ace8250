use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use url::Url;

use crate::cli::PageArgs;

const CLIENT_USER_AGENT: &str = concat!("quizdl/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub html: String,
    pub location: Url,
}

pub async fn load_page(args: &PageArgs) -> anyhow::Result<LoadedPage> {
    if let Some(path) = &args.source.html {
        let html = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read page html: {}", path.display()))?;
        let location = match &args.page_url {
            Some(page_url) => Url::parse(page_url).context("parse --page-url")?,
            None => {
                let abs = std::path::absolute(path)
                    .with_context(|| format!("resolve page path: {}", path.display()))?;
                Url::from_file_path(&abs)
                    .map_err(|()| anyhow::anyhow!("page path is not a valid file url: {}", abs.display()))?
            }
        };
        tracing::debug!(path = %path.display(), %location, "loaded page snapshot");
        return Ok(LoadedPage { html, location });
    }

    let Some(raw_url) = &args.source.url else {
        anyhow::bail!("either --html or --url is required");
    };
    let url = Url::parse(raw_url).context("parse --url")?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("--url must be http/https: {url}");
    }
    fetch_page(&url).await
}

async fn fetch_page(url: &Url) -> anyhow::Result<LoadedPage> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("build page http client")?;

    let response = client
        .get(url.clone())
        .header(USER_AGENT, CLIENT_USER_AGENT)
        .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
        .send()
        .await
        .with_context(|| format!("GET {url}"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("GET {url} returned {status}");
    }
    let location = response.url().clone();
    let html = response
        .text()
        .await
        .with_context(|| format!("read body: {url}"))?;
    tracing::info!(%location, bytes = html.len(), "fetched page");
    Ok(LoadedPage { html, location })
}

/// Source of image bytes for document export.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build image http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(ACCEPT, "image/*")
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {url} returned {status}");
        }
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("read image body: {url}"))?;
        Ok(bytes.to_vec())
    }
}
