use crate::error::{Result, ToolError};
use crate::models::{ChunkReport, OutputNamer};
use crate::pdf_engine::PageSource;
use std::fs;
use tracing::info;

/// Parse the pages-per-part argument.
pub fn parse_page_count(query: &str) -> Result<usize> {
    let query = query.trim();
    let digits = query.trim_start_matches(['+', '-']);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ToolError::NotInteger(query.to_string()));
    }
    let value: i64 = query
        .parse()
        .map_err(|_| ToolError::NotInteger(query.to_string()))?;
    match value {
        v if v < 0 => Err(ToolError::NegativeValue(v)),
        0 => Err(ToolError::ZeroValue),
        v => usize::try_from(v).map_err(|_| ToolError::NotInteger(query.to_string())),
    }
}

/// Write consecutive parts of `per_part` pages; the last part takes the rest.
pub fn split_by_count<S: PageSource + ?Sized>(
    source: &S,
    per_part: usize,
    namer: &OutputNamer,
) -> Result<Vec<ChunkReport>> {
    let count = source.page_count();
    let mut reports = Vec::new();
    let mut start = 0;
    while start < count {
        let stop = (start + per_part).min(count);
        let number = reports.len() + 1;
        let path = namer.part(number);
        source.write_range(start..stop, &path)?;
        let bytes = fs::metadata(&path)?.len();
        reports.push(ChunkReport {
            number,
            pages: start..stop,
            path,
            bytes,
        });
        start = stop;
    }
    info!(parts = reports.len(), per_part, "split by page count");
    Ok(reports)
}
