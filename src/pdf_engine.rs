//! Document boundary over lopdf
//!
//! Every action opens its input through [`PdfDocument`] and never mutates the
//! loaded document in place: writes always go through a clone.

use crate::error::{Result, ToolError};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ordered pages that can be written out as standalone documents.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Size of the whole document as stored.
    fn document_size(&self) -> u64;

    /// Write exactly the pages `pages` (zero-based, half-open) to `path`.
    fn write_range(&self, pages: Range<usize>, path: &Path) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct PdfDocument {
    path: PathBuf,
    doc: Document,
    size: u64,
}

impl PdfDocument {
    /// Open an unencrypted document.
    pub fn open(path: &Path) -> Result<Self> {
        let doc = load(path)?;
        if doc.is_encrypted() {
            return Err(ToolError::Encrypted(path.to_path_buf()));
        }
        Self::from_document(path, doc)
    }

    pub(crate) fn from_document(path: &Path, doc: Document) -> Result<Self> {
        let size = fs::metadata(path)?.len();
        debug!(path = %path.display(), pages = doc.get_pages().len(), size, "opened document");
        Ok(Self {
            path: path.to_path_buf(),
            doc,
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Page object ids in page order.
    pub fn page_ids(&self) -> Vec<ObjectId> {
        self.doc.get_pages().into_values().collect()
    }

    /// A new document holding only the pages in `pages`.
    pub fn extract(&self, pages: Range<usize>) -> Result<Document> {
        let count = self.page_count();
        if pages.start >= pages.end || pages.end > count {
            return Err(ToolError::PageOutOfRange {
                page: pages.end,
                count,
            });
        }

        let to_delete: Vec<u32> = self
            .doc
            .get_pages()
            .into_keys()
            .enumerate()
            .filter(|(index, _)| !pages.contains(index))
            .map(|(_, number)| number)
            .collect();

        let mut doc = self.doc.clone();
        doc.delete_pages(&to_delete);
        doc.prune_objects();
        Ok(doc)
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    fn document_size(&self) -> u64 {
        self.size
    }

    fn write_range(&self, pages: Range<usize>, path: &Path) -> Result<()> {
        let mut doc = self.extract(pages.clone())?;
        doc.save(path)
            .map_err(|e| ToolError::PageSerialization {
                pages,
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

/// Load without checking encryption.
pub fn load(path: &Path) -> Result<Document> {
    Document::load(path).map_err(|source| ToolError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save(doc: &mut Document, path: &Path) -> Result<()> {
    doc.save(path).map_err(|e| {
        ToolError::Io(std::io::Error::other(format!(
            "failed to write {}: {e}",
            path.display()
        )))
    })?;
    Ok(())
}

/// Look up `key` on a page, following `/Parent` for inheritable attributes.
pub fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok();
    // Page trees deeper than this are malformed.
    for _ in 0..32 {
        let dict = current?;
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value).clone());
        }
        current = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .ok();
    }
    None
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        #[allow(clippy::cast_possible_truncation, clippy::unnecessary_cast)]
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Page rectangle `[x0, y0, x1, y1]`, normalized so `x0 < x1` and `y0 < y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn to_object(self) -> Object {
        Object::Array(vec![
            Object::Real(self.x0.into()),
            Object::Real(self.y0.into()),
            Object::Real(self.x1.into()),
            Object::Real(self.y1.into()),
        ])
    }

    fn from_object(object: &Object) -> Option<Self> {
        let values: Vec<f32> = object.as_array().ok()?.iter().filter_map(number).collect();
        match values.as_slice() {
            [x0, y0, x1, y1] => Some(Self::new(*x0, *y0, *x1, *y1)),
            _ => None,
        }
    }
}

/// The visible area of a page: CropBox if present, otherwise MediaBox,
/// otherwise US Letter.
pub fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    inherited_attribute(doc, page_id, b"CropBox")
        .or_else(|| inherited_attribute(doc, page_id, b"MediaBox"))
        .and_then(|object| PageBox::from_object(&object))
        .unwrap_or_else(|| PageBox::new(0.0, 0.0, 612.0, 792.0))
}

/// Copy the inheritable attributes a page relies on onto its own dictionary,
/// so the page survives being moved to another parent.
pub fn materialize_inherited(doc: &Document, page_id: ObjectId, dict: &mut Dictionary) {
    for key in [&b"Resources"[..], b"MediaBox", b"CropBox", b"Rotate"] {
        if !dict.has(key) {
            if let Some(value) = inherited_attribute(doc, page_id, key) {
                dict.set(key.to_vec(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_pdf, FixturePage};
    use tempfile::TempDir;

    #[test]
    fn test_open_nonexistent() {
        let result = PdfDocument::open(Path::new("/nonexistent/file.pdf"));
        assert!(matches!(result, Err(ToolError::Unreadable { .. })));
    }

    #[test]
    fn test_open_not_a_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.pdf");
        fs::write(&path, b"hello").unwrap();
        assert!(matches!(
            PdfDocument::open(&path),
            Err(ToolError::Unreadable { .. })
        ));
    }

    #[test]
    fn test_write_range_keeps_requested_pages() {
        let dir = TempDir::new().unwrap();
        let input = build_pdf(dir.path(), "input.pdf", &FixturePage::numbered(6));
        let doc = PdfDocument::open(&input).unwrap();
        assert_eq!(doc.page_count(), 6);

        let out = dir.path().join("out.pdf");
        doc.write_range(2..5, &out).unwrap();

        let written = PdfDocument::open(&out).unwrap();
        assert_eq!(written.page_count(), 3);
        let widths: Vec<f32> = written
            .page_ids()
            .into_iter()
            .map(|id| page_box(written.document(), id).width())
            .collect();
        assert_eq!(widths, vec![603.0, 604.0, 605.0]);
    }

    #[test]
    fn test_write_range_rejects_empty_range() {
        let dir = TempDir::new().unwrap();
        let input = build_pdf(dir.path(), "input.pdf", &FixturePage::numbered(2));
        let doc = PdfDocument::open(&input).unwrap();
        assert!(doc.write_range(1..1, &dir.path().join("x.pdf")).is_err());
        assert!(doc.write_range(0..3, &dir.path().join("x.pdf")).is_err());
    }

    #[test]
    fn test_inherited_media_box() {
        let dir = TempDir::new().unwrap();
        let input = build_pdf(dir.path(), "input.pdf", &[FixturePage::inheriting()]);
        let doc = PdfDocument::open(&input).unwrap();
        let id = doc.page_ids()[0];

        let page_box = page_box(doc.document(), id);
        assert!((page_box.width() - 612.0).abs() < f32::EPSILON);
        assert!((page_box.height() - 792.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_page_box_normalizes() {
        let b = PageBox::new(100.0, 50.0, 0.0, 0.0);
        assert!((b.x0 - 0.0).abs() < f32::EPSILON);
        assert!((b.width() - 100.0).abs() < f32::EPSILON);
        assert!((b.height() - 50.0).abs() < f32::EPSILON);
    }
}
