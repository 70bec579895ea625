use crate::error::{Result, ToolError};
use crate::models::{OutputNamer, Settings};
use crate::pdf_engine;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Write a decrypted copy of `path` as `{stem} [decrypted].pdf`.
pub fn decrypt(path: &Path, password: &str, settings: &Settings) -> Result<PathBuf> {
    let mut doc = pdf_engine::load(path)?;
    if !doc.is_encrypted() {
        return Err(ToolError::NotEncrypted(path.to_path_buf()));
    }

    doc.decrypt(password).map_err(|e| {
        debug!(path = %path.display(), error = %e, "decryption failed");
        ToolError::WrongPassword(path.to_path_buf())
    })?;
    doc.trailer.remove(b"Encrypt");

    let output = OutputNamer::new(path, &settings.suffix, settings.naming).tagged("decrypted");
    pdf_engine::save(&mut doc, &output)?;
    info!(output = %output.display(), "decrypted");
    Ok(output)
}
