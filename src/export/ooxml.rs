//! Minimal WordprocessingML package writer.
//!
//! Callers describe content through [`DocumentBuilder`]; this module owns the XML parts,
//! relationships and media of the resulting `.docx` zip.

use std::io::{Cursor, Write as _};

use anyhow::Context as _;
use chrono::Utc;
use zip::write::SimpleFileOptions;

const EMU_PER_PX: u64 = 9525;
const TWIPS_PER_PX: u32 = 15;
/// Letter page with one-inch margins.
pub const TEXT_WIDTH_TWIPS: u32 = 9360;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageId(usize);

#[derive(Debug, Clone, Default)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    /// Font size in half-points (`24` = 12pt).
    pub size: u32,
    /// Emit a line break before the text.
    pub break_before: bool,
    pub hyperlink_style: bool,
}

#[derive(Debug, Clone)]
pub enum Inline {
    Run(TextRun),
    Hyperlink { url: String, children: Vec<Inline> },
    Image { id: ImageId, width_px: u32, height_px: u32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Start,
    Center,
}

#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub children: Vec<Inline>,
    pub alignment: Alignment,
    /// Space after the paragraph, in twips.
    pub spacing_after: Option<u32>,
}

#[derive(Debug, Clone)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Default)]
pub struct TableCell {
    pub width_pct: Option<u32>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub rows: Vec<TableRow>,
    /// `None` sizes the table to its content.
    pub width_pct: Option<u32>,
    pub grid_twips: Vec<u32>,
}

/// Narrow document-building surface used by the export layout.
pub trait DocumentBuilder {
    fn add_paragraph(&mut self, paragraph: Paragraph);

    fn add_table(&mut self, table: Table);

    /// Registers picture bytes; `None` when the format cannot be embedded.
    fn add_image(&mut self, bytes: Vec<u8>) -> Option<ImageId>;
}

#[derive(Debug)]
struct Relationship {
    id: String,
    kind: &'static str,
    target: String,
    external: bool,
}

#[derive(Debug)]
struct Media {
    rel_id: String,
    file_name: String,
    bytes: Vec<u8>,
}

pub struct DocxWriter {
    font: String,
    title: String,
    body: String,
    relationships: Vec<Relationship>,
    media: Vec<Media>,
    next_drawing_id: u32,
}

const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

impl DocxWriter {
    pub fn new(font: &str, title: &str) -> Self {
        Self {
            font: font.to_owned(),
            title: title.to_owned(),
            body: String::new(),
            relationships: vec![Relationship {
                id: "rId1".to_owned(),
                kind: REL_STYLES,
                target: "styles.xml".to_owned(),
                external: false,
            }],
            media: Vec::new(),
            next_drawing_id: 1,
        }
    }

    pub fn finish(self) -> anyhow::Result<Vec<u8>> {
        let document_xml = self.render_document_xml();
        let rels_xml = self.render_document_rels();
        let content_types = render_content_types();
        let styles = render_styles(&self.font);
        let core = render_core_props(&self.title);

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for (name, contents) in [
            ("[Content_Types].xml", content_types.as_str()),
            ("_rels/.rels", ROOT_RELS),
            ("docProps/core.xml", core.as_str()),
            ("word/document.xml", document_xml.as_str()),
            ("word/styles.xml", styles.as_str()),
            ("word/_rels/document.xml.rels", rels_xml.as_str()),
        ] {
            zip.start_file(name, options)
                .with_context(|| format!("docx start_file {name}"))?;
            zip.write_all(contents.as_bytes())
                .with_context(|| format!("docx write {name}"))?;
        }

        let stored = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(0o644);
        for media in &self.media {
            let name = format!("word/media/{}", media.file_name);
            zip.start_file(name.as_str(), stored)
                .with_context(|| format!("docx start_file {name}"))?;
            zip.write_all(&media.bytes)
                .with_context(|| format!("docx write {name}"))?;
        }

        let cursor = zip.finish().context("docx finish zip")?;
        Ok(cursor.into_inner())
    }

    fn next_rel_id(&self) -> String {
        format!("rId{}", self.relationships.len() + 1)
    }

    fn hyperlink_rel(&mut self, url: &str) -> String {
        if let Some(existing) = self
            .relationships
            .iter()
            .find(|rel| rel.external && rel.kind == REL_HYPERLINK && rel.target == url)
        {
            return existing.id.clone();
        }
        let id = self.next_rel_id();
        self.relationships.push(Relationship {
            id: id.clone(),
            kind: REL_HYPERLINK,
            target: url.to_owned(),
            external: true,
        });
        id
    }

    fn render_paragraph(&mut self, paragraph: &Paragraph) -> String {
        let mut out = String::from("<w:p>");
        if paragraph.spacing_after.is_some() || paragraph.alignment != Alignment::Start {
            out.push_str("<w:pPr>");
            if let Some(after) = paragraph.spacing_after {
                out.push_str(&format!("<w:spacing w:after=\"{after}\"/>"));
            }
            if paragraph.alignment == Alignment::Center {
                out.push_str("<w:jc w:val=\"center\"/>");
            }
            out.push_str("</w:pPr>");
        }
        for inline in &paragraph.children {
            self.render_inline(inline, &mut out);
        }
        out.push_str("</w:p>");
        out
    }

    fn render_inline(&mut self, inline: &Inline, out: &mut String) {
        match inline {
            Inline::Run(run) => out.push_str(&self.render_run(run)),
            Inline::Hyperlink { url, children } => {
                let rel_id = self.hyperlink_rel(url);
                out.push_str(&format!("<w:hyperlink r:id=\"{rel_id}\" w:history=\"1\">"));
                for child in children {
                    self.render_inline(child, out);
                }
                out.push_str("</w:hyperlink>");
            }
            Inline::Image {
                id,
                width_px,
                height_px,
            } => {
                let drawing = self.render_drawing(*id, *width_px, *height_px);
                out.push_str(&format!("<w:r>{drawing}</w:r>"));
            }
        }
    }

    fn render_run(&self, run: &TextRun) -> String {
        let font = xml_escape(&self.font);
        let mut out = String::from("<w:r><w:rPr>");
        if run.hyperlink_style {
            out.push_str("<w:rStyle w:val=\"Hyperlink\"/>");
        }
        out.push_str(&format!(
            "<w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:cs=\"{font}\"/>"
        ));
        if run.bold {
            out.push_str("<w:b/><w:bCs/>");
        }
        if run.hyperlink_style {
            out.push_str("<w:color w:val=\"0563C1\"/>");
        }
        if run.size > 0 {
            out.push_str(&format!(
                "<w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/>",
                size = run.size
            ));
        }
        if run.hyperlink_style {
            out.push_str("<w:u w:val=\"single\"/>");
        }
        out.push_str("</w:rPr>");
        if run.break_before {
            out.push_str("<w:br/>");
        }
        out.push_str(&format!(
            "<w:t xml:space=\"preserve\">{}</w:t></w:r>",
            xml_escape(&run.text)
        ));
        out
    }

    fn render_drawing(&mut self, id: ImageId, width_px: u32, height_px: u32) -> String {
        let Some(media) = self.media.get(id.0) else {
            tracing::debug!(?id, "unknown image id; skipping drawing");
            return String::new();
        };
        let rel_id = media.rel_id.clone();
        let name = xml_escape(&media.file_name);
        let drawing_id = self.next_drawing_id;
        self.next_drawing_id += 1;

        let cx = u64::from(width_px) * EMU_PER_PX;
        let cy = u64::from(height_px) * EMU_PER_PX;
        format!(
            "<w:drawing><wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">\
<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>\
<wp:docPr id=\"{drawing_id}\" name=\"Picture {drawing_id}\"/>\
<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect=\"1\"/></wp:cNvGraphicFramePr>\
<a:graphic><a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">\
<pic:pic><pic:nvPicPr><pic:cNvPr id=\"{drawing_id}\" name=\"{name}\"/><pic:cNvPicPr/></pic:nvPicPr>\
<pic:blipFill><a:blip r:embed=\"{rel_id}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>\
<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>\
<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>\
</a:graphicData></a:graphic></wp:inline></w:drawing>"
        )
    }

    fn render_table(&mut self, table: &Table) -> String {
        let mut out = String::from("<w:tbl><w:tblPr><w:tblStyle w:val=\"TableGrid\"/>");
        match table.width_pct {
            Some(pct) => out.push_str(&format!("<w:tblW w:w=\"{}\" w:type=\"pct\"/>", pct * 50)),
            None => out.push_str("<w:tblW w:w=\"0\" w:type=\"auto\"/>"),
        }
        out.push_str("<w:tblLook w:val=\"04A0\"/></w:tblPr><w:tblGrid>");
        for width in &table.grid_twips {
            out.push_str(&format!("<w:gridCol w:w=\"{width}\"/>"));
        }
        out.push_str("</w:tblGrid>");

        for row in &table.rows {
            out.push_str("<w:tr>");
            for cell in &row.cells {
                out.push_str("<w:tc><w:tcPr>");
                match cell.width_pct {
                    Some(pct) => {
                        out.push_str(&format!("<w:tcW w:w=\"{}\" w:type=\"pct\"/>", pct * 50))
                    }
                    None => out.push_str("<w:tcW w:w=\"0\" w:type=\"auto\"/>"),
                }
                out.push_str("</w:tcPr>");
                for block in &cell.blocks {
                    match block {
                        Block::Paragraph(paragraph) => {
                            out.push_str(&self.render_paragraph(paragraph))
                        }
                        Block::Table(nested) => out.push_str(&self.render_table(nested)),
                    }
                }
                // A cell must end with a paragraph.
                if !matches!(cell.blocks.last(), Some(Block::Paragraph(_))) {
                    out.push_str("<w:p/>");
                }
                out.push_str("</w:tc>");
            }
            out.push_str("</w:tr>");
        }
        out.push_str("</w:tbl>");
        out
    }

    fn render_document_xml(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" \
xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\" \
xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">\
<w:body>{body}\
<w:sectPr><w:pgSz w:w=\"12240\" w:h=\"15840\"/>\
<w:pgMar w:top=\"1440\" w:right=\"1440\" w:bottom=\"1440\" w:left=\"1440\" w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/>\
</w:sectPr></w:body></w:document>\n",
            body = self.body
        )
    }

    fn render_document_rels(&self) -> String {
        let mut out = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
        );
        for rel in &self.relationships {
            let mode = if rel.external {
                " TargetMode=\"External\""
            } else {
                ""
            };
            out.push_str(&format!(
                "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"{mode}/>",
                rel.id,
                rel.kind,
                xml_escape(&rel.target)
            ));
        }
        out.push_str("</Relationships>\n");
        out
    }
}

impl DocumentBuilder for DocxWriter {
    fn add_paragraph(&mut self, paragraph: Paragraph) {
        let xml = self.render_paragraph(&paragraph);
        self.body.push_str(&xml);
    }

    fn add_table(&mut self, table: Table) {
        let xml = self.render_table(&table);
        self.body.push_str(&xml);
    }

    fn add_image(&mut self, bytes: Vec<u8>) -> Option<ImageId> {
        let ext = sniff_image_extension(&bytes)?;
        let rel_id = self.next_rel_id();
        let file_name = format!("image{}.{ext}", self.media.len() + 1);
        self.relationships.push(Relationship {
            id: rel_id.clone(),
            kind: REL_IMAGE,
            target: format!("media/{file_name}"),
            external: false,
        });
        self.media.push(Media {
            rel_id,
            file_name,
            bytes,
        });
        Some(ImageId(self.media.len() - 1))
    }
}

/// Picture formats Word renders natively, detected by signature.
pub fn sniff_image_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.starts_with(b"BM") && bytes.len() > 14 {
        Some("bmp")
    } else {
        None
    }
}

/// Cell width in twips for a percentage of the text column.
pub fn pct_of_text_width(pct: u32) -> u32 {
    TEXT_WIDTH_TWIPS * pct / 100
}

pub fn px_to_twips(px: u32) -> u32 {
    px * TWIPS_PER_PX
}

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>\
</Relationships>
";

fn render_content_types() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Default Extension="jpeg" ContentType="image/jpeg"/>
  <Default Extension="gif" ContentType="image/gif"/>
  <Default Extension="bmp" ContentType="image/bmp"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>
"#
    .to_string()
}

fn render_styles(font: &str) -> String {
    let font = xml_escape(font);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:eastAsia="{font}" w:cs="{font}"/><w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr></w:rPrDefault>
    <w:pPrDefault/>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>
  <w:style w:type="character" w:default="1" w:styleId="DefaultParagraphFont"><w:name w:val="Default Paragraph Font"/><w:uiPriority w:val="1"/><w:semiHidden/><w:unhideWhenUsed/></w:style>
  <w:style w:type="character" w:styleId="Hyperlink"><w:name w:val="Hyperlink"/><w:basedOn w:val="DefaultParagraphFont"/><w:uiPriority w:val="99"/><w:unhideWhenUsed/><w:rPr><w:color w:val="0563C1"/><w:u w:val="single"/></w:rPr></w:style>
  <w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/><w:uiPriority w:val="99"/><w:semiHidden/><w:unhideWhenUsed/><w:tblPr><w:tblInd w:w="0" w:type="dxa"/><w:tblCellMar><w:top w:w="0" w:type="dxa"/><w:left w:w="108" w:type="dxa"/><w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style>
  <w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:basedOn w:val="TableNormal"/><w:uiPriority w:val="39"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders></w:tblPr></w:style>
</w:styles>
"#
    )
}

fn render_core_props(title: &str) -> String {
    let created = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:title>{title}</dc:title>
  <dc:creator>quizdl</dc:creator>
  <dcterms:created xsi:type="dcterms:W3CDTF">{created}</dcterms:created>
</cp:coreProperties>
"#,
        title = xml_escape(title)
    )
}

fn xml_escape(input: &str) -> String {
    // Control characters other than tab/newline are not allowed in XML 1.0.
    input
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect::<String>()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use std::io::Read as _;

    use super::*;

    const PNG_1X1: &[u8] = &[
        137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82, 0, 0, 0, 1, 0, 0, 0, 1, 8,
        4, 0, 0, 0, 181, 28, 12, 2, 0, 0, 0, 11, 73, 68, 65, 84, 120, 218, 99, 252, 255, 23, 0,
        2, 3, 1, 128, 110, 220, 25, 0, 0, 0, 0, 73, 69, 78, 68, 174, 66, 96, 130,
    ];

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn package_contains_required_parts() -> anyhow::Result<()> {
        let mut writer = DocxWriter::new("Calibri", "T & C");
        writer.add_paragraph(Paragraph {
            children: vec![Inline::Run(TextRun {
                text: "<hello>".to_owned(),
                size: 24,
                ..TextRun::default()
            })],
            ..Paragraph::default()
        });
        let bytes = writer.finish()?;

        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice()))?;
        let names = archive.file_names().collect::<Vec<_>>();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
            "word/_rels/document.xml.rels",
            "docProps/core.xml",
        ] {
            assert!(names.contains(&part), "missing {part}");
        }
        assert!(read_part(&bytes, "word/document.xml").contains("&lt;hello&gt;"));
        assert!(read_part(&bytes, "docProps/core.xml").contains("T &amp; C"));
        Ok(())
    }

    #[test]
    fn hyperlinks_share_one_relationship_per_target() -> anyhow::Result<()> {
        let mut writer = DocxWriter::new("Calibri", "t");
        for _ in 0..2 {
            writer.add_paragraph(Paragraph {
                children: vec![Inline::Hyperlink {
                    url: "https://example.com/?a=1&b=2".to_owned(),
                    children: vec![Inline::Run(TextRun {
                        text: "link".to_owned(),
                        hyperlink_style: true,
                        ..TextRun::default()
                    })],
                }],
                ..Paragraph::default()
            });
        }
        let bytes = writer.finish()?;
        let rels = read_part(&bytes, "word/_rels/document.xml.rels");
        assert_eq!(rels.matches("TargetMode=\"External\"").count(), 1);
        assert!(rels.contains("Target=\"https://example.com/?a=1&amp;b=2\""));
        let document = read_part(&bytes, "word/document.xml");
        assert_eq!(document.matches("<w:hyperlink r:id=\"rId2\"").count(), 2);
        Ok(())
    }

    #[test]
    fn images_are_sniffed_and_stored_as_media() -> anyhow::Result<()> {
        let mut writer = DocxWriter::new("Calibri", "t");
        assert!(writer.add_image(b"<svg/>".to_vec()).is_none());
        let id = writer.add_image(PNG_1X1.to_vec()).unwrap();
        writer.add_paragraph(Paragraph {
            children: vec![Inline::Image {
                id,
                width_px: 200,
                height_px: 150,
            }],
            ..Paragraph::default()
        });
        let bytes = writer.finish()?;

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice()))?;
        let mut media = Vec::new();
        archive.by_name("word/media/image1.png")?.read_to_end(&mut media)?;
        assert_eq!(media, PNG_1X1);

        let document = read_part(&bytes, "word/document.xml");
        assert!(document.contains("<wp:extent cx=\"1905000\" cy=\"1428750\"/>"));
        assert!(document.contains("r:embed=\"rId2\""));
        Ok(())
    }

    #[test]
    fn cells_always_end_with_a_paragraph() -> anyhow::Result<()> {
        let mut writer = DocxWriter::new("Calibri", "t");
        writer.add_table(Table {
            rows: vec![TableRow {
                cells: vec![TableCell {
                    width_pct: Some(30),
                    blocks: vec![Block::Table(Table {
                        rows: vec![TableRow {
                            cells: vec![TableCell::default()],
                        }],
                        ..Table::default()
                    })],
                }],
            }],
            width_pct: Some(100),
            grid_twips: vec![TEXT_WIDTH_TWIPS],
        });
        let bytes = writer.finish()?;
        let document = read_part(&bytes, "word/document.xml");
        assert!(document.contains("<w:tblW w:w=\"5000\" w:type=\"pct\"/>"));
        assert!(document.contains("<w:tcW w:w=\"1500\" w:type=\"pct\"/>"));
        assert!(document.contains("</w:tbl><w:p/></w:tc>"));
        Ok(())
    }
}
