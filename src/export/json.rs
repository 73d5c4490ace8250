use std::collections::BTreeMap;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::export::definition_display;
use crate::formats::{DefinitionPart, ExtractionResult, SetInfo};
use crate::text::normalize_text;

/// Shape of the exported JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonExport {
    pub info: SetInfo,
    pub quiz_data: BTreeMap<String, JsonRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonRecord {
    pub term_part: String,
    pub definition_part: String,
}

/// Copies the payload, re-normalizing every text field on the way.
pub fn to_export(result: &ExtractionResult, include_images: bool) -> JsonExport {
    let info = &result.info;
    let info = SetInfo {
        quiz_set_title: normalize_text(&info.quiz_set_title),
        quiz_set_url: normalize_text(&info.quiz_set_url),
        creator_name: normalize_text(&info.creator_name),
        creator_url: normalize_text(&info.creator_url),
        date_scraped: normalize_text(&info.date_scraped),
        number_of_quizzes: info.number_of_quizzes,
        swapped: info.swapped,
    };

    let quiz_data = result
        .quiz_data
        .iter()
        .map(|(key, record)| {
            let definition = DefinitionPart {
                text: normalize_text(&record.definition_part.text),
                image: normalize_text(&record.definition_part.image),
            };
            (
                key.clone(),
                JsonRecord {
                    term_part: normalize_text(&record.term_part),
                    definition_part: definition_display(&definition, include_images),
                },
            )
        })
        .collect();

    JsonExport { info, quiz_data }
}

pub fn render(result: &ExtractionResult, include_images: bool) -> anyhow::Result<Vec<u8>> {
    let export = to_export(result, include_images);

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    export
        .serialize(&mut serializer)
        .context("serialize json export")?;
    Ok(out)
}
