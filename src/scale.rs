//! Resizing pages to a target paper size

use crate::crop::rotation;
use crate::error::{Result, ToolError};
use crate::models::{OutputNamer, Settings};
use crate::pdf_engine::{self, page_box, PageBox, PdfDocument};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};
use tracing::info;

const POINTS_PER_INCH: f32 = 72.0;

/// Target page size in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperSize {
    pub width: f32,
    pub height: f32,
}

impl PaperSize {
    pub fn from_inches(width: f32, height: f32) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ToolError::InvalidDimensions(format!("{width} x {height}")));
        }
        Ok(Self {
            width: width * POINTS_PER_INCH,
            height: height * POINTS_PER_INCH,
        })
    }

    /// Parse `"8.5 11"` or `"8,5x11"`.
    pub fn parse(query: &str) -> Result<Self> {
        let invalid = || ToolError::InvalidDimensions(query.to_string());
        let values: Vec<f32> = query
            .split(|c: char| c.is_whitespace() || c == 'x' || c == 'X' || c == ';')
            .filter(|part| !part.is_empty())
            .map(|part| part.replace(',', ".").parse::<f32>().map_err(|_| invalid()))
            .collect::<Result<_>>()?;
        match values.as_slice() {
            [width, height] => Self::from_inches(*width, *height),
            _ => Err(invalid()),
        }
    }
}

fn content_refs(doc: &Document, page: &Dictionary) -> Vec<Object> {
    match page.get(b"Contents") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        _ => Vec::new(),
    }
}

fn scale_page(doc: &mut Document, page_id: ObjectId, target: PaperSize) -> Result<()> {
    let area: PageBox = page_box(doc, page_id);
    let (width, height) = match rotation(doc, page_id) {
        90 | 270 => (target.height, target.width),
        _ => (target.width, target.height),
    };
    let sx = width / area.width();
    let sy = height / area.height();
    let tx = -area.x0 * sx;
    let ty = -area.y0 * sy;

    let open = doc.add_object(Stream::new(
        Dictionary::new(),
        format!("q {sx:.6} 0 0 {sy:.6} {tx:.4} {ty:.4} cm\n").into_bytes(),
    ));
    let close = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));

    let mut contents = vec![Object::Reference(open)];
    contents.extend(content_refs(doc, doc.get_dictionary(page_id)?));
    contents.push(Object::Reference(close));

    let page = doc.get_dictionary_mut(page_id)?;
    page.set("Contents", Object::Array(contents));
    page.set("MediaBox", PageBox::new(0.0, 0.0, width, height).to_object());
    for key in [&b"CropBox"[..], b"TrimBox", b"BleedBox", b"ArtBox"] {
        page.remove(key);
    }
    Ok(())
}

/// Scale every page of `doc` to `target`.
pub fn scale_document(mut doc: Document, target: PaperSize) -> Result<Document> {
    for page_id in doc.get_pages().into_values() {
        scale_page(&mut doc, page_id, target)?;
    }
    doc.prune_objects();
    Ok(doc)
}

/// Write `{stem} [scaled].pdf` with every page resized to `target`.
pub fn scale(path: &Path, target: PaperSize, settings: &Settings) -> Result<PathBuf> {
    let doc = PdfDocument::open(path)?;
    let mut scaled = scale_document(doc.into_document(), target)?;

    let output = OutputNamer::new(path, &settings.suffix, settings.naming).tagged("scaled");
    pdf_engine::save(&mut scaled, &output)?;
    info!(width = target.width, height = target.height, output = %output.display(), "scaled");
    Ok(output)
}
