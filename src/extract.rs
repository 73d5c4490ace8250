use std::collections::BTreeMap;
use std::io::Write as _;

use anyhow::Context as _;
use chrono::NaiveDateTime;
use regex::Regex;

use crate::cli::ScrapeArgs;
use crate::dom::{DomNode, PageDom};
use crate::formats::{
    ACTION_SCRAPE, DefinitionPart, ExtractionRecord, ExtractionResult, ScrapeReply,
    ScrapeRequest, SetInfo,
};
use crate::layout::PageLayout;
use crate::text::{first_integer, normalize_text, pad_width, padded_key};

pub const DEFAULT_TITLE: &str = "Untitled Set";
pub const DEFAULT_CREATOR: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error(
        "Mismatch error: Found {found} terms but expected {expected}. Please scroll down/expand all."
    )]
    Mismatch { found: usize, expected: u64 },
    #[error("no terms found on the page")]
    Empty,
}

impl From<ExtractError> for ScrapeReply {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Mismatch { .. } => ScrapeReply::fail_message(err.to_string()),
            ExtractError::Empty => ScrapeReply::Fail {
                message: None,
                count: Some(0),
            },
        }
    }
}

pub async fn run(args: ScrapeArgs) -> anyhow::Result<()> {
    let layout = PageLayout::load_or_default(args.page.layout.as_deref()).context("load layout")?;
    let mut page = crate::agent::open_page(&args.page, &layout).await;
    let reply = page
        .request(ScrapeRequest::scrape(args.swap))
        .await
        .context("scrape request")?;

    let json = serde_json::to_string_pretty(&reply).context("serialize scrape reply")?;
    match &args.out {
        Some(out) => std::fs::write(out, format!("{json}\n"))
            .with_context(|| format!("write scrape reply: {}", out.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("write scrape reply")?;
        }
    }

    if let ScrapeReply::Fail { message, .. } = reply {
        anyhow::bail!(
            "scrape failed: {}",
            message.as_deref().unwrap_or("no terms found on the page")
        );
    }
    Ok(())
}

/// Answers one request addressed to the page agent.
pub fn handle_request<D: PageDom>(
    dom: &D,
    layout: &PageLayout,
    request: &ScrapeRequest,
    now: NaiveDateTime,
) -> ScrapeReply {
    if request.action != ACTION_SCRAPE {
        tracing::warn!(action = %request.action, "unsupported page agent action");
        return ScrapeReply::fail_message(format!("unsupported action: {}", request.action));
    }

    match extract(dom, layout, request.swap, now) {
        Ok(payload) => ScrapeReply::Success { payload },
        Err(err) => {
            tracing::warn!(%err, "extraction failed");
            err.into()
        }
    }
}

pub fn extract<D: PageDom>(
    dom: &D,
    layout: &PageLayout,
    swap: bool,
    now: NaiveDateTime,
) -> Result<ExtractionResult, ExtractError> {
    let selectors = &layout.selectors;

    let title = dom
        .select_first(&selectors.set_title)
        .map(|node| normalize_text(&node.inner_text()))
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_owned());
    let creator_name = dom
        .select_first(&selectors.creator_name)
        .map(|node| normalize_text(&node.inner_text()))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_CREATOR.to_owned());
    let creator_url = dom
        .select_first(&selectors.creator_url)
        .and_then(|node| node.url_attr("href"))
        .unwrap_or_default();

    let rows = dom.select_all(&selectors.rows);
    let count = rows.len();

    let expected = dom
        .select_first(&selectors.set_count)
        .and_then(|node| first_integer(&node.inner_text()));
    if let Some(expected) = expected
        && expected != count as u64
    {
        return Err(ExtractError::Mismatch {
            found: count,
            expected,
        });
    }
    if count == 0 {
        return Err(ExtractError::Empty);
    }

    let image_pattern = match Regex::new(&layout.image_url_pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::warn!(%err, "invalid image url pattern; keeping raw image urls");
            None
        }
    };

    let width = pad_width(count);
    let mut quiz_data = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        let term_part = row
            .select_first(&selectors.term_text)
            .map(|node| normalize_text(&node.inner_text()))
            .unwrap_or_default();

        let definition_part = match row.select_first(&selectors.definition) {
            Some(container) => DefinitionPart {
                text: container
                    .select_first(&selectors.definition_text)
                    .map(|node| normalize_text(&node.inner_text()))
                    .unwrap_or_default(),
                image: container
                    .select_first(&selectors.definition_image)
                    .and_then(|node| node.url_attr("src"))
                    .map(|raw| normalize_image_url(&raw, image_pattern.as_ref()))
                    .unwrap_or_default(),
            },
            None => DefinitionPart::default(),
        };

        quiz_data.insert(
            padded_key(idx + 1, width),
            ExtractionRecord {
                term_part,
                definition_part,
            },
        );
    }

    tracing::info!(layout = %layout.version, count, swap, "extracted set");

    Ok(ExtractionResult {
        info: SetInfo {
            quiz_set_title: title,
            quiz_set_url: dom.location().to_owned(),
            creator_name,
            creator_url,
            date_scraped: local_timestamp(now),
            number_of_quizzes: count,
            swapped: swap,
        },
        quiz_data,
    })
}

/// Keeps the first match of the image pattern; non-matching sources pass through.
pub fn normalize_image_url(raw: &str, pattern: Option<&Regex>) -> String {
    pattern
        .and_then(|re| re.find(raw))
        .map(|m| m.as_str().to_owned())
        .unwrap_or_else(|| raw.to_owned())
}

/// Local wall-clock time rendered as if it were UTC (`Z` suffix, no zone shift).
pub fn local_timestamp(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::dom::fake::{FakeNode, FakePage};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 4)
            .unwrap()
            .and_hms_milli_opt(5, 6, 7, 89)
            .unwrap()
    }

    fn row(layout: &PageLayout, term: &str, definition: &str, image: Option<&str>) -> FakeNode {
        let s = &layout.selectors;
        let mut container =
            FakeNode::default().with_child(&s.definition_text, FakeNode::text(definition));
        if let Some(image) = image {
            container =
                container.with_child(&s.definition_image, FakeNode::default().with_attr("src", image));
        }
        FakeNode::default()
            .with_child(&s.term_text, FakeNode::text(term))
            .with_child(&s.definition, container)
    }

    fn set_page(layout: &PageLayout, rows: usize, indicator: Option<&str>) -> FakePage {
        let s = &layout.selectors;
        let rows = (1..=rows)
            .map(|i| row(layout, &format!("term {i}"), &format!("definition {i}"), None))
            .collect();
        let mut page = FakePage::new("https://quizlet.com/42/bio/")
            .with(&s.set_title, vec![FakeNode::text("  Bio \n Basics ")])
            .with(&s.creator_name, vec![FakeNode::text("alice")])
            .with(
                &s.creator_url,
                vec![FakeNode::default().with_attr("href", "https://quizlet.com/user/alice")],
            )
            .with(&s.rows, rows);
        if let Some(indicator) = indicator {
            page = page.with(&s.set_count, vec![FakeNode::text(indicator)]);
        }
        page
    }

    #[test]
    fn keys_are_contiguous_and_padded_to_count_width() {
        let layout = PageLayout::default();
        for n in [1_usize, 9, 10, 11, 100, 123] {
            let result = extract(&set_page(&layout, n, None), &layout, false, now()).unwrap();
            let width = n.to_string().len();
            let keys = result.quiz_data.keys().cloned().collect::<Vec<_>>();
            let expected = (1..=n).map(|i| format!("{i:0width$}")).collect::<Vec<_>>();
            assert_eq!(keys, expected, "n = {n}");
            assert_eq!(result.info.number_of_quizzes, n);
        }
    }

    #[test]
    fn metadata_is_normalized_and_timestamp_is_local_with_z() {
        let layout = PageLayout::default();
        let result = extract(&set_page(&layout, 2, Some("Terms in this set (2)")), &layout, true, now())
            .unwrap();
        assert_eq!(result.info.quiz_set_title, "Bio\nBasics");
        assert_eq!(result.info.quiz_set_url, "https://quizlet.com/42/bio/");
        assert_eq!(result.info.creator_name, "alice");
        assert_eq!(result.info.creator_url, "https://quizlet.com/user/alice");
        assert_eq!(result.info.date_scraped, "2026-03-04T05:06:07.089Z");
        assert!(result.info.swapped);
    }

    #[test]
    fn missing_lookups_degrade_to_defaults() {
        let layout = PageLayout::default();
        let page = FakePage::new("https://quizlet.com/1/").with(
            &layout.selectors.rows,
            vec![FakeNode::default()],
        );
        let result = extract(&page, &layout, false, now()).unwrap();
        assert_eq!(result.info.quiz_set_title, DEFAULT_TITLE);
        assert_eq!(result.info.creator_name, DEFAULT_CREATOR);
        assert_eq!(result.info.creator_url, "");
        let record = &result.quiz_data["1"];
        assert_eq!(record.term_part, "");
        assert_eq!(record.definition_part, DefinitionPart::default());
    }

    #[test]
    fn count_mismatch_fails_without_payload() {
        let layout = PageLayout::default();
        let page = set_page(&layout, 100, Some("Terms in this set (150)"));
        let err = extract(&page, &layout, false, now()).unwrap_err();
        assert_eq!(
            err,
            ExtractError::Mismatch {
                found: 100,
                expected: 150
            }
        );
        let message = err.to_string();
        assert!(message.contains("100") && message.contains("150"));

        let reply = handle_request(&page, &layout, &ScrapeRequest::scrape(false), now());
        assert!(matches!(reply, ScrapeReply::Fail { message: Some(m), count: None } if m.contains("150")));
    }

    #[test]
    fn empty_set_is_a_zero_count_failure() {
        let layout = PageLayout::default();
        let page = set_page(&layout, 0, None);
        let reply = handle_request(&page, &layout, &ScrapeRequest::scrape(false), now());
        assert_eq!(
            reply,
            ScrapeReply::Fail {
                message: None,
                count: Some(0)
            }
        );
    }

    #[test]
    fn indicator_without_digits_is_ignored() {
        let layout = PageLayout::default();
        let page = set_page(&layout, 3, Some("Terms in this set"));
        assert!(extract(&page, &layout, false, now()).is_ok());
    }

    #[test]
    fn unsupported_action_is_rejected() {
        let layout = PageLayout::default();
        let page = set_page(&layout, 1, None);
        let request = ScrapeRequest {
            action: "scrape_other".to_owned(),
            swap: false,
        };
        let reply = handle_request(&page, &layout, &request, now());
        assert!(matches!(reply, ScrapeReply::Fail { message: Some(m), .. } if m.contains("scrape_other")));
    }

    #[test]
    fn swap_does_not_move_content_between_fields() {
        let layout = PageLayout::default();
        let page = set_page(&layout, 3, None);
        let plain = extract(&page, &layout, false, now()).unwrap();
        let swapped = extract(&page, &layout, true, now()).unwrap();
        assert_eq!(plain.quiz_data, swapped.quiz_data);
        assert!(!plain.info.swapped);
        assert!(swapped.info.swapped);
    }

    #[test]
    fn definition_image_is_normalized_by_pattern() {
        let layout = PageLayout::default();
        let s = &layout.selectors;
        let page = FakePage::new("https://quizlet.com/1/").with(
            &s.rows,
            vec![
                row(&layout, "a", "x", Some("https://o.quizlet.com/abc.jpg")),
                row(&layout, "b", "y", Some("https://cdn.example.com/raw.png?w=10")),
            ],
        );
        let result = extract(&page, &layout, false, now()).unwrap();
        assert_eq!(result.quiz_data["1"].definition_part.image, "https://o.quizlet.com/abc.jpg");
        assert_eq!(
            result.quiz_data["2"].definition_part.image,
            "https://cdn.example.com/raw.png?w=10"
        );
    }

    #[test]
    fn normalize_image_url_keeps_first_match_or_raw() {
        let re = Regex::new(r"https://o\..+").unwrap();
        assert_eq!(
            normalize_image_url("https://o.quizlet.com/x.png", Some(&re)),
            "https://o.quizlet.com/x.png"
        );
        assert_eq!(
            normalize_image_url("proxy?u=https://o.quizlet.com/x.png", Some(&re)),
            "https://o.quizlet.com/x.png"
        );
        assert_eq!(normalize_image_url("data:image/png;base64,AA", Some(&re)), "data:image/png;base64,AA");
        assert_eq!(normalize_image_url("anything", None), "anything");
    }
}
