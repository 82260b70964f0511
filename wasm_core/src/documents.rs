//! PDF helpers built on `lopdf`. Documents are loaded and written fully in
//! memory; nothing here streams.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::GenericImageView;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use serde::{Deserialize, Serialize};

use crate::images::decode_image;

const MM_TO_PT: f32 = 72.0 / 25.4;
const PX_TO_PT: f32 = 72.0 / 96.0;
const TEXT_MARGIN_MM: f32 = 20.0;
const IMAGE_MARGIN_MM: f32 = 10.0;
const INHERITABLE_PAGE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    /// Page matches the image; only meaningful for [`images_to_pdf`].
    Fit,
}

impl PageSize {
    /// Width and height in millimetres, portrait.
    fn millimetres(self) -> (f32, f32) {
        match self {
            Self::A4 | Self::Fit => (210.0, 297.0),
            Self::Letter => (215.9, 279.4),
            Self::Legal => (215.9, 355.6),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextPdfOptions {
    pub font_size: f32,
    pub page_size: PageSize,
}

impl Default for TextPdfOptions {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            page_size: PageSize::A4,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImagesPdfOptions {
    pub page_size: PageSize,
    pub orientation: Orientation,
}

/// 1-based inclusive page range.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

/// Lays `text` out in Helvetica with 20 mm margins, wrapping long lines by
/// estimated glyph width and starting a new page when the next line would
/// cross the bottom margin.
pub fn text_to_pdf(text: &str, options: &TextPdfOptions) -> Result<Vec<u8>, String> {
    let font_size = if options.font_size > 0.0 { options.font_size } else { 12.0 };
    let (page_w_mm, page_h_mm) = options.page_size.millimetres();
    let max_width_pt = (page_w_mm - 2.0 * TEXT_MARGIN_MM) * MM_TO_PT;
    let line_height_mm = font_size * 0.35;

    let lines: Vec<String> = text
        .replace("\r\n", "\n")
        .replace('\t', "    ")
        .split('\n')
        .flat_map(|line| wrap_line(line, font_size, max_width_pt))
        .collect();

    let mut pages: Vec<Vec<(f32, String)>> = vec![Vec::new()];
    let mut y_mm = TEXT_MARGIN_MM;
    for line in lines {
        if y_mm + line_height_mm > page_h_mm - TEXT_MARGIN_MM {
            pages.push(Vec::new());
            y_mm = TEXT_MARGIN_MM;
        }
        if let Some(page) = pages.last_mut() {
            page.push((y_mm, line));
        }
        y_mm += line_height_mm;
    }

    let mut builder = PdfBuilder::new();
    let font_id = builder.doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources = dictionary! { "Font" => dictionary! { "F1" => font_id } };
    let (width_pt, height_pt) = (page_w_mm * MM_TO_PT, page_h_mm * MM_TO_PT);
    for page in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), font_size.into()]),
        ];
        for (y, line) in page {
            let baseline = height_pt - y * MM_TO_PT;
            operations.push(Operation::new(
                "Tm",
                vec![
                    1.into(),
                    0.into(),
                    0.into(),
                    1.into(),
                    (TEXT_MARGIN_MM * MM_TO_PT).into(),
                    baseline.into(),
                ],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(to_win_ansi(&line), StringFormat::Literal)],
            ));
        }
        operations.push(Operation::new("ET", vec![]));
        builder.add_page(width_pt, height_pt, Content { operations }, resources.clone())?;
    }
    builder.finish()
}

/// Helvetica advance widths as a fraction of the font size, coarse buckets.
fn glyph_width(ch: char) -> f32 {
    match ch {
        ' ' | 'i' | 'j' | 'l' | '.' | ',' | ';' | ':' | '\'' | '|' | '!' | 'I' | 'f' | 't' => 0.28,
        'm' | 'w' | 'M' | 'W' | '@' => 0.83,
        'A'..='Z' => 0.67,
        _ => 0.55,
    }
}

fn wrap_line(line: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let width_of = |text: &str| text.chars().map(glyph_width).sum::<f32>() * font_size;
    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in line.split(' ') {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if width_of(&candidate) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            wrapped.push(std::mem::take(&mut current));
        }
        // a single word wider than the line is hard-broken
        for ch in word.chars() {
            if width_of(&current) + glyph_width(ch) * font_size > max_width && !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
            }
            current.push(ch);
        }
    }
    wrapped.push(current);
    wrapped
}

fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch as u32 {
            0x20..=0x7e | 0xa0..=0xff => ch as u32 as u8,
            0x2018 | 0x2019 => b'\'',
            0x201c | 0x201d => b'"',
            0x2013 | 0x2014 => b'-',
            _ => b'?',
        })
        .collect()
}

/// One image per page, scaled to fit inside 10 mm margins and centered.
/// `PageSize::Fit` pages take the image size at 96 dpi with no margin.
pub fn images_to_pdf(images: &[Vec<u8>], options: &ImagesPdfOptions) -> Result<Vec<u8>, String> {
    if images.is_empty() {
        return Err("at least one image is required".into());
    }
    let mut builder = PdfBuilder::new();
    for (index, bytes) in images.iter().enumerate() {
        let decoded = decode_image(bytes).map_err(|err| format!("image {}: {err}", index + 1))?;
        let (px_w, px_h) = decoded.dimensions();
        let mut image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => px_w as i64,
            "Height" => px_h as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        if decoded.color().has_alpha() {
            let alpha: Vec<u8> = decoded.to_rgba8().pixels().map(|pixel| pixel[3]).collect();
            let mask_id = builder.doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => px_w as i64,
                    "Height" => px_h as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                deflate(&alpha)?,
            ));
            image_dict.set("SMask", mask_id);
        }
        let image_id = builder
            .doc
            .add_object(Stream::new(image_dict, deflate(decoded.to_rgb8().as_raw())?));

        let (page_w, page_h, draw_w, draw_h) = if options.page_size == PageSize::Fit {
            let (w, h) = (px_w as f32 * PX_TO_PT, px_h as f32 * PX_TO_PT);
            (w, h, w, h)
        } else {
            let (mut w_mm, mut h_mm) = options.page_size.millimetres();
            if options.orientation == Orientation::Landscape {
                std::mem::swap(&mut w_mm, &mut h_mm);
            }
            let image_ratio = px_w as f32 / px_h as f32;
            let (draw_w_mm, draw_h_mm) = if image_ratio > w_mm / h_mm {
                let w = w_mm - 2.0 * IMAGE_MARGIN_MM;
                (w, w / image_ratio)
            } else {
                let h = h_mm - 2.0 * IMAGE_MARGIN_MM;
                (h * image_ratio, h)
            };
            (
                w_mm * MM_TO_PT,
                h_mm * MM_TO_PT,
                draw_w_mm * MM_TO_PT,
                draw_h_mm * MM_TO_PT,
            )
        };
        let x = (page_w - draw_w) / 2.0;
        let y = (page_h - draw_h) / 2.0;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![draw_w.into(), 0.into(), 0.into(), draw_h.into(), x.into(), y.into()],
                ),
                Operation::new("Do", vec!["Im0".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let resources = dictionary! { "XObject" => dictionary! { "Im0" => image_id } };
        builder.add_page(page_w, page_h, content, resources)?;
    }
    builder.finish()
}

fn deflate(bytes: &[u8]) -> Result<Vec<u8>, String> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(|err| err.to_string())?;
    encoder.finish().map_err(|err| err.to_string())
}

struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl PdfBuilder {
    fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    fn add_page(
        &mut self,
        width: f32,
        height: f32,
        content: Content,
        resources: Dictionary,
    ) -> Result<(), String> {
        let encoded = content.encode().map_err(|err| err.to_string())?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, String> {
        save(&mut self.into_document())
    }

    /// Writes the page tree and catalog and points the trailer at them.
    fn into_document(mut self) -> Document {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc
    }
}

fn save(doc: &mut Document) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(|err| err.to_string())?;
    Ok(out)
}

fn load(bytes: &[u8]) -> Result<Document, String> {
    if bytes.is_empty() {
        return Err("input PDF is empty".into());
    }
    Document::load_mem(bytes).map_err(|err| format!("failed to read PDF: {err}"))
}

pub fn pdf_page_count(bytes: &[u8]) -> Result<u32, String> {
    Ok(load(bytes)?.get_pages().len() as u32)
}

/// Concatenates every page of every document in order.
pub fn merge_pdfs(documents: &[Vec<u8>]) -> Result<Vec<u8>, String> {
    if documents.is_empty() {
        return Err("at least one PDF is required".into());
    }
    let sources = documents
        .iter()
        .map(|bytes| {
            let doc = load(bytes)?;
            let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
            Ok((doc, pages))
        })
        .collect::<Result<Vec<_>, String>>()?;
    assemble(sources)
}

/// One output document per range. Pages past the end are skipped, so a
/// range entirely out of bounds yields an empty document.
pub fn split_pdf(bytes: &[u8], ranges: &[PageRange]) -> Result<Vec<Vec<u8>>, String> {
    let source = load(bytes)?;
    let total = source.get_pages().len() as u32;
    ranges
        .iter()
        .map(|range| {
            let pages: Vec<u32> = (range.start.max(1)..=range.end.min(total)).collect();
            assemble(vec![(source.clone(), pages)])
        })
        .collect()
}

/// Copies the listed 1-based pages in the order given; invalid numbers are
/// dropped and repeats are kept.
///
/// # Example
/// ```
/// use wcag_core::documents::{extract_pdf_pages, pdf_page_count, text_to_pdf, TextPdfOptions};
/// let long_text = "line\n".repeat(200);
/// let pdf = text_to_pdf(&long_text, &TextPdfOptions::default())?;
/// assert!(pdf_page_count(&pdf)? > 1);
/// let first = extract_pdf_pages(&pdf, &[1, 99])?;
/// assert_eq!(pdf_page_count(&first)?, 1);
/// # Ok::<(), String>(())
/// ```
pub fn extract_pdf_pages(bytes: &[u8], pages: &[u32]) -> Result<Vec<u8>, String> {
    let source = load(bytes)?;
    let total = source.get_pages().len() as u32;
    let wanted: Vec<u32> = pages
        .iter()
        .copied()
        .filter(|page| (1..=total).contains(page))
        .collect();
    assemble(vec![(source, wanted)])
}

/// Text of every page, each preceded by a `--- Page N ---` marker.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, String> {
    let doc = load(bytes)?;
    let mut out = String::new();
    for number in doc.get_pages().keys() {
        let text = doc.extract_text(&[*number]).map_err(|err| err.to_string());
        push_page_text(&mut out, *number, text);
    }
    Ok(out)
}

/// Appends one page section. A page whose text cannot be read is kept with
/// a note naming the failure.
fn push_page_text(out: &mut String, number: u32, text: Result<String, String>) {
    out.push_str(&format!("--- Page {number} ---\n"));
    match text {
        Ok(text) => out.push_str(text.trim_end()),
        Err(err) => out.push_str(&format!("[text extraction failed: {err}]")),
    }
    out.push_str("\n\n");
}

fn assemble(sources: Vec<(Document, Vec<u32>)>) -> Result<Vec<u8>, String> {
    let mut output = Document::with_version("1.5");
    let mut next_id = 1;
    let mut page_dicts = Vec::new();

    for (mut doc, wanted) in sources {
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;
        let page_ids = doc.get_pages();
        for number in wanted {
            if let Some(page_id) = page_ids.get(&number) {
                page_dicts.push(page_with_inherited_attributes(&doc, *page_id)?);
            }
        }
        for (id, object) in doc.objects {
            if let Ok("Catalog" | "Pages" | "Page" | "Outlines" | "Outline") = object.type_name() {
                continue;
            }
            output.objects.insert(id, object);
        }
    }
    output.max_id = next_id;

    let mut builder = PdfBuilder {
        pages_id: output.new_object_id(),
        doc: output,
        kids: Vec::new(),
    };
    for mut page in page_dicts {
        page.set("Parent", builder.pages_id);
        let page_id = builder.doc.add_object(page);
        builder.kids.push(page_id.into());
    }
    // Pruning only keeps what the trailer reaches, so the catalog comes first.
    let mut output = builder.into_document();
    output.prune_objects();
    save(&mut output)
}

fn page_with_inherited_attributes(doc: &Document, page_id: ObjectId) -> Result<Dictionary, String> {
    let mut page = doc
        .get_dictionary(page_id)
        .map_err(|err| format!("broken page object: {err}"))?
        .clone();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(parent_id) = parent {
        depth += 1;
        let Ok(node) = doc.get_dictionary(parent_id) else {
            break;
        };
        if depth > 32 {
            break;
        }
        for key in INHERITABLE_PAGE_KEYS {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    page.remove(b"Parent");
    Ok(page)
}
