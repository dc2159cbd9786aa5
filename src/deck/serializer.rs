//! PDF serialization of composed slides.
//!
//! One page per slide. Layout frames are in inches from the top-left corner;
//! PDF user space is points from the bottom-left, so every y is flipped.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::assets::{ImageAsset, QrMatrix};
use super::layout::{
    Color, Frame, Slide, SlideElement, TableBlock, TextBlock, Weight, BRAND, INK, POINTS_PER_INCH, RULE,
    SLIDE_HEIGHT_IN, SLIDE_WIDTH_IN, WHITE,
};
use super::DeckError;

pub const PDF_MIME: &str = "application/pdf";

/// Serialized deck ready for download
#[derive(Debug, Clone)]
pub struct DeckArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub slide_count: usize,
}

/// Quiet zone around QR codes, in modules
const QR_QUIET_ZONE: usize = 2;
const CELL_PADDING: f32 = 0.08;
const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

/// Serialize slides into a PDF document
pub fn serialize_deck(slides: &[Slide], title: &str) -> Result<Vec<u8>, DeckError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let fonts_id = doc.add_object(dictionary! {
        FONT_REGULAR => regular_id,
        FONT_BOLD => bold_id,
    });

    let mut page_ids = Vec::with_capacity(slides.len());
    let mut placeholder_id = None;
    for slide in slides {
        let page_id = write_page(&mut doc, pages_id, fonts_id, &mut placeholder_id, slide)?;
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::from(*id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(sanitize(title)),
        "Producer" => Object::string_literal("salesdeck"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Write one slide as a page.
///
/// Every placeholder raster on every page points at one shared XObject.
fn write_page(
    doc: &mut Document,
    pages_id: ObjectId,
    fonts_id: ObjectId,
    placeholder_id: &mut Option<ObjectId>,
    slide: &Slide,
) -> Result<ObjectId, DeckError> {
    let mut page = PageWriter::new();
    let mut images = Dictionary::new();

    for element in &slide.elements {
        match element {
            SlideElement::Rect { frame, fill } => page.fill_rect(*frame, *fill),
            SlideElement::Text(block) => page.text(block),
            SlideElement::Image { frame, asset } => {
                let name = format!("Im{}", images.len() + 1);
                let image_id = match *placeholder_id {
                    Some(id) if asset.placeholder => id,
                    _ => {
                        let id = doc.add_object(image_stream(asset)?);
                        if asset.placeholder {
                            *placeholder_id = Some(id);
                        }
                        id
                    }
                };
                images.set(name.as_bytes(), image_id);
                page.image(*frame, &name);
            }
            SlideElement::Table(table) => page.table(table),
            SlideElement::Qr { frame, matrix } => page.qr(*frame, matrix),
        }
    }

    let content_id = doc.add_object(Stream::new(
        dictionary! { "Filter" => "FlateDecode" },
        deflate(&page.content.encode()?)?,
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), pt(SLIDE_WIDTH_IN).into(), pt(SLIDE_HEIGHT_IN).into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => fonts_id,
            "XObject" => images,
        },
    });
    Ok(page_id)
}

fn image_stream(asset: &ImageAsset) -> Result<Stream, DeckError> {
    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => asset.width as i64,
            "Height" => asset.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(&asset.rgb)?,
    ))
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, DeckError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn pt(inches: f32) -> f32 {
    inches * POINTS_PER_INCH
}

/// Bottom edge of a frame in PDF user space
fn pdf_y(frame: &Frame) -> f32 {
    pt(SLIDE_HEIGHT_IN - frame.bottom())
}

/// Encode text as WinAnsi bytes for the standard Type1 fonts.
///
/// Latin-1 letters keep their code points; characters outside WinAnsi
/// become `?`.
fn sanitize(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| match c {
            ' '..='~' | '\u{a1}'..='\u{ff}' => c as u8,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2022}' => 0x95,
            '\u{20ac}' => 0x80,
            _ if c.is_whitespace() => b' ',
            _ => b'?',
        })
        .collect()
}

struct PageWriter {
    content: Content,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            content: Content { operations: vec![] },
        }
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.content.operations.push(Operation::new(operator, operands));
    }

    fn fill_color(&mut self, color: Color) {
        let Color(r, g, b) = color;
        self.op(
            "rg",
            vec![
                (r as f32 / 255.0).into(),
                (g as f32 / 255.0).into(),
                (b as f32 / 255.0).into(),
            ],
        );
    }

    fn fill_rect(&mut self, frame: Frame, color: Color) {
        self.fill_color(color);
        self.op(
            "re",
            vec![pt(frame.x).into(), pdf_y(&frame).into(), pt(frame.w).into(), pt(frame.h).into()],
        );
        self.op("f", vec![]);
    }

    fn hline(&mut self, x: f32, y: f32, w: f32, color: Color) {
        let Color(r, g, b) = color;
        self.op(
            "RG",
            vec![
                (r as f32 / 255.0).into(),
                (g as f32 / 255.0).into(),
                (b as f32 / 255.0).into(),
            ],
        );
        self.op("w", vec![0.5f32.into()]);
        let y = pt(SLIDE_HEIGHT_IN - y);
        self.op("m", vec![pt(x).into(), y.into()]);
        self.op("l", vec![pt(x + w).into(), y.into()]);
        self.op("S", vec![]);
    }

    /// Single line of text with its cap top at the frame's top edge
    fn show(&mut self, x: f32, top: f32, value: &str, size_pt: f32, weight: Weight, color: Color) {
        let font = match weight {
            Weight::Regular => FONT_REGULAR,
            Weight::Bold => FONT_BOLD,
        };
        let baseline = pt(SLIDE_HEIGHT_IN - top) - size_pt * 0.8;

        self.fill_color(color);
        self.op("BT", vec![]);
        self.op("Tf", vec![Object::Name(font.as_bytes().to_vec()), size_pt.into()]);
        self.op("Td", vec![pt(x).into(), baseline.into()]);
        self.op("Tj", vec![Object::string_literal(sanitize(value))]);
        self.op("ET", vec![]);
    }

    fn text(&mut self, block: &TextBlock) {
        self.show(block.frame.x, block.frame.y, &block.text, block.size_pt, block.weight, block.color);
    }

    fn image(&mut self, frame: Frame, name: &str) {
        self.op("q", vec![]);
        self.op(
            "cm",
            vec![
                pt(frame.w).into(),
                0.into(),
                0.into(),
                pt(frame.h).into(),
                pt(frame.x).into(),
                pdf_y(&frame).into(),
            ],
        );
        self.op("Do", vec![Object::Name(name.as_bytes().to_vec())]);
        self.op("Q", vec![]);
    }

    fn table(&mut self, table: &TableBlock) {
        let row_h = table.row_height();
        let frame = table.frame;
        let text_offset = (row_h - table.size_pt / POINTS_PER_INCH) / 2.0;
        let mut y = frame.y;

        if let Some(header) = &table.header {
            self.fill_rect(Frame::new(frame.x, y, frame.w, row_h), BRAND);
            self.row(table, header, y + text_offset, Weight::Bold, WHITE);
            y += row_h;
        }

        for row in &table.rows {
            self.row(table, row, y + text_offset, Weight::Regular, INK);
            y += row_h;
            self.hline(frame.x, y, frame.w, RULE);
        }
    }

    fn row(&mut self, table: &TableBlock, cells: &[String], top: f32, weight: Weight, color: Color) {
        let mut x = table.frame.x;
        for (cell, fraction) in cells.iter().zip(&table.columns) {
            let width = table.frame.w * fraction;
            let max_chars = ((pt(width - 2.0 * CELL_PADDING)) / (table.size_pt * 0.5)).max(1.0) as usize;
            let shown: String = cell.chars().take(max_chars).collect();
            self.show(x + CELL_PADDING, top, &shown, table.size_pt, weight, color);
            x += width;
        }
    }

    fn qr(&mut self, frame: Frame, matrix: &QrMatrix) {
        self.fill_rect(frame, WHITE);

        let modules = matrix.width + 2 * QR_QUIET_ZONE;
        let size = frame.w.min(frame.h) / modules as f32;
        let origin_x = frame.x + QR_QUIET_ZONE as f32 * size;
        let origin_y = frame.y + QR_QUIET_ZONE as f32 * size;

        self.fill_color(Color(0, 0, 0));
        for y in 0..matrix.width {
            for x in 0..matrix.width {
                if matrix.is_dark(x, y) {
                    let module = Frame::new(origin_x + x as f32 * size, origin_y + y as f32 * size, size, size);
                    self.op(
                        "re",
                        vec![pt(module.x).into(), pdf_y(&module).into(), pt(size).into(), pt(size).into()],
                    );
                }
            }
        }
        self.op("f", vec![]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::layout::{compose_slide, PriceDisplay};
    use crate::deck::DeckOptions;
    use crate::models::site::fixtures::deck_site;
    use chrono::NaiveDate;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn slide(code: &str) -> Slide {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        compose_slide(&deck_site(code, Some("1000")), &DeckOptions::default(), false, today).unwrap()
    }

    fn page_bytes(doc: &Document, page_id: ObjectId) -> Vec<u8> {
        let mut raw = Vec::new();
        for id in doc.get_page_contents(page_id) {
            let stream = doc.get_object(id).unwrap().as_stream().unwrap();
            ZlibDecoder::new(stream.content.as_slice()).read_to_end(&mut raw).unwrap();
        }
        raw
    }

    fn page_text(doc: &Document, page_id: ObjectId) -> String {
        String::from_utf8_lossy(&page_bytes(doc, page_id)).into_owned()
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(
            sanitize("Caf\u{e9} \u{2013} \u{201c}A\u{201d}"),
            b"Caf\xe9 \x96 \x93A\x94".to_vec()
        );
        assert_eq!(sanitize("line\tbreak"), b"line break".to_vec());
        assert_eq!(sanitize("\u{2192} \u{4e2d}"), b"? ?".to_vec());
    }

    #[test]
    fn test_latin1_place_names_keep_their_letters() {
        assert_eq!(sanitize("Para\u{f1}aque"), b"Para\xf1aque".to_vec());

        let mut s = slide("A");
        s.elements.push(SlideElement::Text(TextBlock {
            frame: Frame::new(0.5, 0.5, 4.0, 0.3),
            text: "Para\u{f1}aque".to_string(),
            size_pt: 12.0,
            weight: Weight::Regular,
            color: INK,
        }));
        let bytes = serialize_deck(&[s], "Deck").unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let content = Content::decode(&page_bytes(&doc, page_id)).unwrap();
        let shown: Vec<&[u8]> = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| op.operands.first()?.as_str().ok())
            .collect();
        assert!(shown.contains(&b"Para\xf1aque".as_slice()));
    }

    #[test]
    fn test_placeholders_shared_and_streams_compressed() {
        let slides: Vec<Slide> = (0..20).map(|i| slide(&format!("S-{}", i))).collect();
        let bytes = serialize_deck(&slides, "Deck").unwrap();
        assert!(bytes.len() < 250_000, "deck is {} bytes", bytes.len());

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 20);
        let images: Vec<&Stream> = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .filter(|s| s.dict.get(b"Subtype").and_then(|v| v.as_name()).ok() == Some(b"Image".as_slice()))
            .collect();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].dict.get(b"Filter").unwrap().as_name().unwrap(), b"FlateDecode");
    }

    #[test]
    fn test_empty_deck_is_still_valid() {
        let bytes = serialize_deck(&[], "Empty").unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().is_empty());
    }
}
