//! Splitting two-column scans into one page per column

use crate::error::Result;
use crate::models::{OutputNamer, Settings};
use crate::pdf_engine::{self, inherited_attribute, materialize_inherited, page_box, PageBox, PdfDocument};
use lopdf::{Document, Object, ObjectId};
use std::path::{Path, PathBuf};
use tracing::info;

/// Page rotation normalized to 0, 90, 180 or 270.
pub fn rotation(doc: &Document, page_id: ObjectId) -> i64 {
    match inherited_attribute(doc, page_id, b"Rotate") {
        Some(Object::Integer(degrees)) => degrees.rem_euclid(360) / 90 * 90,
        _ => 0,
    }
}

/// The halves of `area` that appear on the left and on the right once the
/// page is displayed with `rotation`.
pub fn halves(area: PageBox, rotation: i64) -> (PageBox, PageBox) {
    let mid_x = (area.x0 + area.x1) / 2.0;
    let mid_y = (area.y0 + area.y1) / 2.0;
    let low_x = PageBox::new(area.x0, area.y0, mid_x, area.y1);
    let high_x = PageBox::new(mid_x, area.y0, area.x1, area.y1);
    let low_y = PageBox::new(area.x0, area.y0, area.x1, mid_y);
    let high_y = PageBox::new(area.x0, mid_y, area.x1, area.y1);

    match rotation {
        90 => (low_y, high_y),
        180 => (high_x, low_x),
        270 => (high_y, low_y),
        _ => (low_x, high_x),
    }
}

fn page_tree_root(doc: &Document) -> Result<ObjectId> {
    let catalog_id = doc.trailer.get(b"Root").and_then(Object::as_reference)?;
    let pages_id = doc
        .get_dictionary(catalog_id)?
        .get(b"Pages")
        .and_then(Object::as_reference)?;
    Ok(pages_id)
}

/// Replace every page with its left half followed by its right half.
pub fn crop_document(mut doc: Document) -> Result<Document> {
    let pages_id = page_tree_root(&doc)?;

    let mut kids = Vec::new();
    for page_id in doc.get_pages().into_values() {
        let area = page_box(&doc, page_id);
        let (left, right) = halves(area, rotation(&doc, page_id));

        let mut template = doc.get_dictionary(page_id)?.clone();
        materialize_inherited(&doc, page_id, &mut template);
        template.set("Parent", Object::Reference(pages_id));

        for half in [left, right] {
            let mut dict = template.clone();
            dict.set("MediaBox", half.to_object());
            dict.set("CropBox", half.to_object());
            kids.push(Object::Reference(doc.add_object(dict)));
        }
    }

    let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    let pages = doc.get_dictionary_mut(pages_id)?;
    pages.set("Kids", Object::Array(kids));
    pages.set("Count", Object::Integer(count));
    doc.prune_objects();
    Ok(doc)
}

/// Write `{stem} [cropped].pdf` with twice the pages of `path`.
pub fn crop(path: &Path, settings: &Settings) -> Result<PathBuf> {
    let doc = PdfDocument::open(path)?;
    let pages = doc.page_ids().len();
    let mut cropped = crop_document(doc.into_document())?;

    let output = OutputNamer::new(path, &settings.suffix, settings.naming).tagged("cropped");
    pdf_engine::save(&mut cropped, &output)?;
    info!(pages, output = %output.display(), "cropped");
    Ok(output)
}
