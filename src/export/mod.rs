//! Serializers turning an extraction payload into a downloadable file.

pub mod csv;
pub mod docx;
pub mod json;
pub mod ooxml;

use crate::cli::ExportFormat;
use crate::formats::{DefinitionPart, ExtractionRecord, ExtractionResult};
use crate::net::ImageFetcher;

/// Serialized file contents plus the MIME type to save them with.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

pub fn mime_type(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Json => "application/json;charset=utf-8",
        ExportFormat::Csv => "text/csv;charset=utf-8",
        ExportFormat::Docx => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
    }
}

pub async fn format_payload(
    result: &ExtractionResult,
    format: ExportFormat,
    include_images: bool,
    fetcher: &dyn ImageFetcher,
) -> anyhow::Result<Rendered> {
    let bytes = match format {
        ExportFormat::Json => json::render(result, include_images)?,
        ExportFormat::Csv => csv::render(result, include_images).into_bytes(),
        ExportFormat::Docx => docx::render(result, include_images, fetcher).await?,
    };
    tracing::info!(
        format = format.ext(),
        bytes = bytes.len(),
        records = result.quiz_data.len(),
        "formatted payload"
    );
    Ok(Rendered {
        bytes,
        mime_type: mime_type(format),
    })
}

/// One of the two presentation columns of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Term,
    Definition,
}

impl Column {
    pub fn label(self) -> &'static str {
        match self {
            Column::Term => "Term",
            Column::Definition => "Definition",
        }
    }
}

/// Left-to-right column order for tabular formats.
pub fn column_order(swapped: bool) -> [Column; 2] {
    if swapped {
        [Column::Definition, Column::Term]
    } else {
        [Column::Term, Column::Definition]
    }
}

/// Single-string rendering of a definition: its text, then ` (imageURL)` when images
/// are wanted and present.
pub fn definition_display(part: &DefinitionPart, include_images: bool) -> String {
    match part.image_url() {
        Some(image) if include_images => {
            if part.text.is_empty() {
                format!("({image})")
            } else {
                format!("{} ({image})", part.text)
            }
        }
        _ => part.text.clone(),
    }
}

pub(crate) fn cell_text(record: &ExtractionRecord, column: Column, include_images: bool) -> String {
    match column {
        Column::Term => record.term_part.clone(),
        Column::Definition => definition_display(&record.definition_part, include_images),
    }
}
