use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

/// Structural description of one revision of the flashcard-set page.
///
/// The extractor never hard-codes selectors; when the site layout drifts, ship a new
/// `PageLayout` (or pass one with `--layout`) instead of touching the logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLayout {
    /// Free-form revision label, logged with every extraction.
    pub version: String,
    /// Host (or host suffix) the page must be served from.
    pub site_host: String,
    pub selectors: Selectors,
    /// Image sources are cut down to the first match of this pattern.
    pub image_url_pattern: String,
    /// Sets larger than this are truncated behind a "show more" control.
    pub expand_threshold: u64,
    /// Delay before the second auto-expand attempt.
    pub expand_retry_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    pub set_title: String,
    pub set_count: String,
    pub show_more_button: String,
    pub creator_name: String,
    pub creator_url: String,
    pub rows: String,
    /// Relative to a row.
    pub term_text: String,
    /// Relative to a row.
    pub definition: String,
    /// Relative to the definition container.
    pub definition_text: String,
    /// Relative to the definition container.
    pub definition_image: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            version: "quizlet-2025.1".to_owned(),
            site_host: "quizlet.com".to_owned(),
            selectors: Selectors {
                set_title: ".s1ygu81a".to_owned(),
                set_count: ".t1hzdbu9 .t18rmeis".to_owned(),
                show_more_button: ".a1qd8xfe.a1q8vbq2".to_owned(),
                creator_name: ".u1xtrgf5 .UserLink-content .UILink span".to_owned(),
                creator_url: ".u1xtrgf5 .UserLink-content .UILink".to_owned(),
                rows: ".SetPageTermsList-term .se6rv9p".to_owned(),
                term_text: ".s7ascy3".to_owned(),
                definition: ".l1rpwius".to_owned(),
                definition_text: ".hdftvph .TermText".to_owned(),
                definition_image: ".sumuxuf .SetPageTerm-image".to_owned(),
            },
            image_url_pattern: r"https://o\..+".to_owned(),
            expand_threshold: 100,
            expand_retry_delay_ms: 2000,
        }
    }
}

impl PageLayout {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read layout: {}", path.display()))?;
        let layout: Self = serde_json::from_str(&contents)
            .with_context(|| format!("parse layout: {}", path.display()))?;
        layout
            .validate()
            .with_context(|| format!("validate layout: {}", path.display()))?;
        Ok(layout)
    }

    /// Built-in layout, or the one stored at `path`.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let s = &self.selectors;
        for (name, selector) in [
            ("set_title", &s.set_title),
            ("set_count", &s.set_count),
            ("show_more_button", &s.show_more_button),
            ("creator_name", &s.creator_name),
            ("creator_url", &s.creator_url),
            ("rows", &s.rows),
            ("term_text", &s.term_text),
            ("definition", &s.definition),
            ("definition_text", &s.definition_text),
            ("definition_image", &s.definition_image),
        ] {
            scraper::Selector::parse(selector)
                .map_err(|err| anyhow::anyhow!("invalid selector {name} ({selector}): {err}"))?;
        }
        regex::Regex::new(&self.image_url_pattern).context("invalid image_url_pattern")?;
        if self.site_host.trim().is_empty() {
            anyhow::bail!("site_host must not be empty");
        }
        Ok(())
    }

    /// Whether `page_url` is served from this layout's site.
    pub fn matches_site(&self, page_url: &str) -> bool {
        let Ok(url) = url::Url::parse(page_url) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let site = self.site_host.trim_start_matches('.');
        host == site || host.ends_with(&format!(".{site}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_valid() {
        PageLayout::default().validate().unwrap();
    }

    #[test]
    fn invalid_selector_is_rejected() {
        let mut layout = PageLayout::default();
        layout.selectors.rows = "..broken[".to_owned();
        let err = layout.validate().unwrap_err();
        assert!(format!("{err:#}").contains("rows"));
    }

    #[test]
    fn matches_site_accepts_subdomains_only_of_the_site() {
        let layout = PageLayout::default();
        assert!(layout.matches_site("https://quizlet.com/123/bio-flash-cards/"));
        assert!(layout.matches_site("https://www.quizlet.com/123/"));
        assert!(!layout.matches_site("https://notquizlet.com/123/"));
        assert!(!layout.matches_site("file:///tmp/set.html"));
        assert!(!layout.matches_site("not a url"));
    }

    #[test]
    fn layout_round_trips_through_json_file() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("layout.json");
        let mut layout = PageLayout::default();
        layout.version = "custom".to_owned();
        std::fs::write(&path, serde_json::to_string_pretty(&layout)?)?;
        assert_eq!(PageLayout::load(&path)?, layout);
        Ok(())
    }
}
