//! Combining documents

use crate::error::{Result, ToolError};
use crate::pdf_engine::{self, materialize_inherited, PdfDocument};
use lopdf::{Dictionary, Document, Object, ObjectId};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Name used when the query leaves the output name blank.
const DEFAULT_NAME: &str = "merged";

fn type_name(object: &Object) -> Option<&[u8]> {
    match object {
        Object::Dictionary(dict) => match dict.get(b"Type") {
            Ok(Object::Name(name)) => Some(name.as_slice()),
            _ => None,
        },
        _ => None,
    }
}

/// Objects rebuilt for the merged document instead of copied.
fn is_structural(object: &Object) -> bool {
    matches!(
        type_name(object),
        Some(b"Catalog" | b"Pages" | b"Outlines" | b"Outline")
    )
}

/// Append the pages of every document, in order, into one new document.
pub fn merge_documents(docs: Vec<Document>) -> Result<Document> {
    let mut merged = Document::with_version("1.5");
    let mut kids: Vec<ObjectId> = Vec::new();
    let mut next_id = 1;

    for mut doc in docs {
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for &id in &page_ids {
            let mut dict = doc.get_dictionary(id)?.clone();
            materialize_inherited(&doc, id, &mut dict);
            doc.objects.insert(id, Object::Dictionary(dict));
        }
        kids.extend(page_ids);

        merged.objects.extend(
            doc.objects
                .into_iter()
                .filter(|(_, object)| !is_structural(object)),
        );
    }

    merged.max_id = next_id - 1;
    let pages_id = merged.new_object_id();
    for &id in &kids {
        if let Ok(dict) = merged.get_dictionary_mut(id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        (
            "Kids",
            Object::Array(kids.into_iter().map(Object::Reference).collect()),
        ),
        ("Count", Object::Integer(count)),
    ]);
    merged.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = merged.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    merged.trailer.set("Root", Object::Reference(catalog_id));
    merged.prune_objects();

    Ok(merged)
}

/// Check that a merge selection has at least two files sharing one directory.
pub fn validate_selection(paths: &[PathBuf]) -> Result<&Path> {
    if paths.len() < 2 {
        return Err(ToolError::Selection(paths.len()));
    }
    let dir = paths[0].parent().unwrap_or_else(|| Path::new("."));
    if paths.iter().any(|p| p.parent().unwrap_or_else(|| Path::new(".")) != dir) {
        return Err(ToolError::MultiplePaths);
    }
    Ok(dir)
}

/// Merge `paths` in selection order into `{dir}/{name}.pdf`.
pub fn merge(paths: &[PathBuf], name: &str) -> Result<PathBuf> {
    let dir = validate_selection(paths)?;

    let docs = paths
        .par_iter()
        .map(|path| PdfDocument::open(path).map(PdfDocument::into_document))
        .collect::<Result<Vec<_>>>()?;

    let name = match name.trim() {
        "" => DEFAULT_NAME,
        name => name,
    };
    let output = dir.join(format!("{name}.pdf"));

    let mut merged = merge_documents(docs)?;
    pdf_engine::save(&mut merged, &output)?;
    info!(files = paths.len(), pages = merged.get_pages().len(), output = %output.display(), "merged");
    Ok(output)
}

/// Merge like [`merge`], then move the selected files to the trash. Nothing
/// is trashed unless the merged file was written, and a source that the
/// output replaced is kept.
pub fn merge_and_trash(paths: &[PathBuf], name: &str) -> Result<PathBuf> {
    let output = merge(paths, name)?;
    let sources: Vec<&PathBuf> = paths.iter().filter(|path| **path != output).collect();
    let count = sources.len();
    trash::delete_all(sources)?;
    info!(files = count, "moved merged files to the trash");
    Ok(output)
}
