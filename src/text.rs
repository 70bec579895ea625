use crate::error::Result;
use crate::models::{OutputNamer, Settings};
use crate::pdf_engine::PdfDocument;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Extract the text of every page into `{stem}.txt`.
pub fn extract_text(path: &Path, settings: &Settings) -> Result<PathBuf> {
    let doc = PdfDocument::open(path)?;
    let document = doc.document();
    let mut text = String::new();

    for number in document.get_pages().into_keys() {
        match document.extract_text(&[number]) {
            Ok(page) => text.push_str(&page),
            Err(e) => warn!(page = number, error = %e, "no text extracted"),
        }
        text.push('\n');
    }

    let output = OutputNamer::new(path, &settings.suffix, settings.naming).with_extension("txt");
    fs::write(&output, &text)?;
    info!(chars = text.len(), output = %output.display(), "extracted text");
    Ok(output)
}
