use crate::export::{cell_text, column_order};
use crate::formats::ExtractionResult;

const BOM: char = '\u{feff}';

/// Metadata block, separator row, header row, then one row per record.
pub fn render(result: &ExtractionResult, include_images: bool) -> String {
    let info = &result.info;
    let mut rows = vec![
        "Key,Value".to_owned(),
        format!("Quiz Set Title,{}", escape_cell(&info.quiz_set_title)),
        format!("Quiz Set URL,{}", escape_cell(&info.quiz_set_url)),
        format!("Creator Name,{}", escape_cell(&info.creator_name)),
        format!("Creator URL,{}", escape_cell(&info.creator_url)),
        format!("Date Scraped,{}", escape_cell(&info.date_scraped)),
        format!("Number of Quizzes,{}", info.number_of_quizzes),
        ",".to_owned(),
    ];

    let columns = column_order(info.swapped);
    rows.push(format!("{},{}", columns[0].label(), columns[1].label()));

    // BTreeMap iteration is lexicographic, i.e. numeric for padded keys.
    for record in result.quiz_data.values() {
        rows.push(format!(
            "{},{}",
            escape_cell(&cell_text(record, columns[0], include_images)),
            escape_cell(&cell_text(record, columns[1], include_images)),
        ));
    }

    let mut out = String::new();
    out.push(BOM);
    out.push_str(&rows.join("\n"));
    out
}

pub fn escape_cell(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_owned()
    }
}
