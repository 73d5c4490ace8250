use crate::export::ooxml::{
    Alignment, Block, DocumentBuilder, DocxWriter, ImageId, Inline, Paragraph, Table, TableCell,
    TableRow, TextRun, pct_of_text_width, px_to_twips,
};
use crate::export::{Column, column_order};
use crate::formats::{ExtractionRecord, ExtractionResult, SetInfo};
use crate::net::ImageFetcher;

const FONT: &str = "Calibri";
const INFO_SIZE: u32 = 24;
const DATA_SIZE: u32 = 22;
const COLUMN_PCT: [u32; 2] = [30, 70];
const IMAGE_WIDTH_PX: u32 = 200;
const IMAGE_HEIGHT_PX: u32 = 150;

pub async fn render(
    result: &ExtractionResult,
    include_images: bool,
    fetcher: &dyn ImageFetcher,
) -> anyhow::Result<Vec<u8>> {
    let mut writer = DocxWriter::new(FONT, &result.info.quiz_set_title);

    // Fetch one image at a time; each failure only drops that picture.
    let mut images = Vec::with_capacity(result.quiz_data.len());
    for (key, record) in &result.quiz_data {
        let image = match record.definition_part.image_url() {
            Some(url) if include_images => match fetcher.fetch(url).await {
                Ok(bytes) => {
                    let id = writer.add_image(bytes);
                    if id.is_none() {
                        tracing::warn!(key = %key, url = %url, "unsupported image format; omitting");
                    }
                    id.map(|id| (id, url.to_owned()))
                }
                Err(err) => {
                    tracing::warn!(key = %key, url = %url, "image fetch failed; omitting: {err:#}");
                    None
                }
            },
            _ => None,
        };
        images.push(image);
    }

    build(&mut writer, result, &images);
    writer.finish()
}

/// Lays out the info preamble and the record table. `images[i]` belongs to the i-th
/// record in key order.
pub fn build<B: DocumentBuilder>(
    builder: &mut B,
    result: &ExtractionResult,
    images: &[Option<(ImageId, String)>],
) {
    for paragraph in info_section(&result.info) {
        builder.add_paragraph(paragraph);
    }
    builder.add_paragraph(Paragraph {
        spacing_after: Some(200),
        ..Paragraph::default()
    });

    let columns = column_order(result.info.swapped);
    let mut rows = vec![TableRow {
        cells: columns
            .iter()
            .zip(COLUMN_PCT)
            .map(|(column, pct)| TableCell {
                width_pct: Some(pct),
                blocks: vec![Block::Paragraph(Paragraph {
                    children: vec![run(column.label(), INFO_SIZE, true)],
                    alignment: Alignment::Center,
                    spacing_after: None,
                })],
            })
            .collect(),
    }];

    for (idx, record) in result.quiz_data.values().enumerate() {
        let image = images.get(idx).and_then(Option::as_ref);
        rows.push(TableRow {
            cells: columns
                .iter()
                .zip(COLUMN_PCT)
                .map(|(column, pct)| TableCell {
                    width_pct: Some(pct),
                    blocks: cell_blocks(record, *column, image),
                })
                .collect(),
        });
    }

    builder.add_table(Table {
        rows,
        width_pct: Some(100),
        grid_twips: COLUMN_PCT.iter().map(|pct| pct_of_text_width(*pct)).collect(),
    });
}

fn info_section(info: &SetInfo) -> Vec<Paragraph> {
    vec![
        info_line("Quiz Set Title: ", &info.quiz_set_title),
        hyperlink_line("Quiz Set URL: ", &info.quiz_set_url),
        info_line("Creator Name: ", &info.creator_name),
        hyperlink_line("Creator URL: ", &info.creator_url),
        info_line("Date Scraped: ", &info.date_scraped),
        info_line("Number of Quizzes: ", &info.number_of_quizzes.to_string()),
    ]
}

fn info_line(label: &str, value: &str) -> Paragraph {
    Paragraph {
        children: vec![run(label, INFO_SIZE, true), run(value, INFO_SIZE, false)],
        alignment: Alignment::Start,
        spacing_after: Some(100),
    }
}

fn hyperlink_line(label: &str, url: &str) -> Paragraph {
    if url.is_empty() {
        return info_line(label, url);
    }
    Paragraph {
        children: vec![
            run(label, INFO_SIZE, true),
            Inline::Hyperlink {
                url: url.to_owned(),
                children: vec![Inline::Run(TextRun {
                    text: url.to_owned(),
                    size: INFO_SIZE,
                    hyperlink_style: true,
                    ..TextRun::default()
                })],
            },
        ],
        alignment: Alignment::Start,
        spacing_after: Some(100),
    }
}

fn run(text: &str, size: u32, bold: bool) -> Inline {
    Inline::Run(TextRun {
        text: text.to_owned(),
        bold,
        size,
        ..TextRun::default()
    })
}

/// One run per line, every line after the first preceded by a break.
fn multiline_runs(text: &str) -> Vec<Inline> {
    text.split('\n')
        .enumerate()
        .map(|(idx, line)| {
            Inline::Run(TextRun {
                text: line.to_owned(),
                size: DATA_SIZE,
                break_before: idx > 0,
                ..TextRun::default()
            })
        })
        .collect()
}

fn cell_blocks(
    record: &ExtractionRecord,
    column: Column,
    image: Option<&(ImageId, String)>,
) -> Vec<Block> {
    let text = match column {
        Column::Term => &record.term_part,
        Column::Definition => &record.definition_part.text,
    };
    let mut blocks = vec![Block::Paragraph(Paragraph {
        children: multiline_runs(text),
        ..Paragraph::default()
    })];

    if column == Column::Definition
        && let Some((id, url)) = image
    {
        blocks.push(Block::Table(image_frame(*id, url)));
    }
    blocks
}

fn image_frame(id: ImageId, url: &str) -> Table {
    Table {
        rows: vec![TableRow {
            cells: vec![TableCell {
                width_pct: None,
                blocks: vec![Block::Paragraph(Paragraph {
                    children: vec![Inline::Hyperlink {
                        url: url.to_owned(),
                        children: vec![Inline::Image {
                            id,
                            width_px: IMAGE_WIDTH_PX,
                            height_px: IMAGE_HEIGHT_PX,
                        }],
                    }],
                    alignment: Alignment::Center,
                    spacing_after: None,
                })],
            }],
        }],
        width_pct: None,
        grid_twips: vec![px_to_twips(IMAGE_WIDTH_PX)],
    }
}
