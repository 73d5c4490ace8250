use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Action name understood by the page agent.
pub const ACTION_SCRAPE: &str = "scrape_set";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetInfo {
    pub quiz_set_title: String,
    #[serde(rename = "quizSetURL")]
    pub quiz_set_url: String,
    pub creator_name: String,
    #[serde(rename = "creatorURL")]
    pub creator_url: String,
    pub date_scraped: String,
    pub number_of_quizzes: usize,
    pub swapped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRecord {
    pub term_part: String,
    pub definition_part: DefinitionPart,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionPart {
    pub text: String,
    /// Absolute image URL, empty when the definition has no picture.
    pub image: String,
}

impl DefinitionPart {
    pub fn image_url(&self) -> Option<&str> {
        let image = self.image.trim();
        (!image.is_empty()).then_some(image)
    }
}

/// Payload of one successful extraction, keyed by zero-padded 1-based index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub info: SetInfo,
    pub quiz_data: BTreeMap<String, ExtractionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub action: String,
    #[serde(default)]
    pub swap: bool,
}

impl ScrapeRequest {
    pub fn scrape(swap: bool) -> Self {
        Self {
            action: ACTION_SCRAPE.to_owned(),
            swap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScrapeReply {
    Success {
        payload: ExtractionResult,
    },
    Fail {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<usize>,
    },
}

impl ScrapeReply {
    pub fn fail_message(message: impl Into<String>) -> Self {
        Self::Fail {
            message: Some(message.into()),
            count: None,
        }
    }
}
