//! Splitting a document into parts, by file size or by page count
//!
//! The size-constrained split runs in three steps: every page is serialized
//! on its own to estimate its size ([`estimator`]), the estimates are checked
//! against the real document size to pick a [`Mode`], and the
//! [`Partitioner`] groups and writes the pages.

pub mod count;
pub mod estimator;
pub mod partitioner;

#[cfg(test)]
pub(crate) mod fake;

pub use count::{parse_page_count, split_by_count};
pub use estimator::{estimate_page_sizes, PageSizes};
pub use partitioner::{quotient_ratio, Mode, Partitioner};

use crate::error::{Result, ToolError};
use crate::models::{ChunkReport, OutputNamer, Settings};
use crate::pdf_engine::{PageSource, PdfDocument};
use crate::progress::{self, ProgressCache};
use std::path::Path;
use tracing::info;

/// Maximum size of one output file, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cap(u64);

impl Cap {
    pub fn from_bytes(bytes: u64) -> Option<Self> {
        (bytes > 0).then_some(Self(bytes))
    }

    /// Parse a size in megabytes (10^6 bytes). Accepts `,` as the decimal
    /// separator.
    pub fn parse_megabytes(query: &str) -> Result<Self> {
        let normalized = query.trim().replace(',', ".");
        let invalid = || ToolError::InvalidCap(query.to_string());

        let megabytes: f64 = normalized.parse().map_err(|_| invalid())?;
        if !megabytes.is_finite() || megabytes <= 0.0 {
            return Err(invalid());
        }
        let bytes = (megabytes * 1_000_000.0).round();
        if bytes < 1.0 || bytes >= u64::MAX as f64 {
            return Err(invalid());
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(Self(bytes as u64))
    }

    pub fn bytes(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SplitOptions {
    pub fidelity_threshold: f64,
    pub max_corrections: u32,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for SplitOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            fidelity_threshold: settings.fidelity_threshold,
            max_corrections: settings.max_corrections,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub mode: Mode,
    pub ratio: f64,
    pub sizes: PageSizes,
    pub chunks: Vec<ChunkReport>,
}

/// Split `source` into parts of at most `cap` bytes each. A page that is
/// larger than the cap on its own becomes a part by itself.
pub fn split_by_size<S: PageSource + ?Sized>(
    source: &S,
    cap: Cap,
    namer: &OutputNamer,
    options: &SplitOptions,
    cache: &mut dyn ProgressCache,
) -> Result<SplitOutcome> {
    let sizes = estimate_page_sizes(source, namer.dir(), cache)?;
    let ratio = quotient_ratio(source.document_size(), sizes.total());
    let mode = Mode::select(ratio, options.fidelity_threshold);
    info!(
        pages = sizes.len(),
        document = source.document_size(),
        estimated = sizes.total(),
        ratio,
        ?mode,
        cap = cap.bytes(),
        "splitting by size"
    );

    let (chunks, sizes) =
        Partitioner::new(source, namer, cap.bytes(), sizes, options.max_corrections).run(mode)?;
    progress::publish(cache, progress::PAGE_NUMBER, sizes.len() as u64);

    Ok(SplitOutcome {
        mode,
        ratio,
        sizes,
        chunks,
    })
}

/// Split the PDF at `path` into parts no larger than `query` megabytes.
pub fn split_size(
    path: &Path,
    query: &str,
    settings: &Settings,
    cache: &mut dyn ProgressCache,
) -> Result<SplitOutcome> {
    let cap = Cap::parse_megabytes(query)?;
    let doc = PdfDocument::open(path)?;
    let namer = OutputNamer::new(path, &settings.suffix, settings.naming);
    split_by_size(&doc, cap, &namer, &SplitOptions::from(settings), cache)
}

/// Split the PDF at `path` into parts of `query` pages.
pub fn split_count(path: &Path, query: &str, settings: &Settings) -> Result<Vec<ChunkReport>> {
    let per_part = parse_page_count(query)?;
    let doc = PdfDocument::open(path)?;
    let namer = OutputNamer::new(path, &settings.suffix, settings.naming);
    split_by_count(&doc, per_part, &namer)
}
