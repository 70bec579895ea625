use crate::error::{Result, ToolError};
use crate::models::{OutputNamer, Settings};
use crate::pdf_engine;
use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::{Document, Object, StringFormat};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{debug, info};

/// RC4 key length in bits.
const KEY_LENGTH: usize = 128;

/// Write a password protected copy of `path` as `{stem} [encrypted].pdf`.
/// `password` opens the document and also owns its permissions.
pub fn encrypt(path: &Path, password: &str, settings: &Settings) -> Result<PathBuf> {
    if password.is_empty() {
        return Err(ToolError::EmptyPassword);
    }
    let mut doc = pdf_engine::load(path)?;
    if doc.is_encrypted() {
        return Err(ToolError::AlreadyEncrypted(path.to_path_buf()));
    }

    ensure_file_id(&mut doc, path);
    let failed = |reason: String| {
        debug!(path = %path.display(), reason = %reason, "encryption failed");
        ToolError::Encryption {
            path: path.to_path_buf(),
            reason,
        }
    };
    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &doc,
        owner_password: password,
        user_password: password,
        key_length: KEY_LENGTH,
        permissions: Permissions::all(),
    })
    .map_err(|e| failed(e.to_string()))?;
    doc.encrypt(&state).map_err(|e| failed(e.to_string()))?;

    let output = OutputNamer::new(path, &settings.suffix, settings.naming).tagged("encrypted");
    pdf_engine::save(&mut doc, &output)?;
    info!(output = %output.display(), "encrypted");
    Ok(output)
}

/// The encryption key is derived from the first `/ID` string, so a document
/// without one gets a fresh identifier.
fn ensure_file_id(doc: &mut Document, path: &Path) {
    if doc.trailer.get(b"ID").is_ok() {
        return;
    }
    let mut hasher = Sha256::new();
    hasher.update(path.as_os_str().as_encoded_bytes());
    hasher.update(OffsetDateTime::now_utc().unix_timestamp_nanos().to_le_bytes());
    let id = hasher.finalize()[..16].to_vec();
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(id.clone(), StringFormat::Hexadecimal),
            Object::String(id, StringFormat::Hexadecimal),
        ]),
    );
}
