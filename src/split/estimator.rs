//! Per-page size estimation by trial serialization

use crate::error::{Result, ToolError};
use crate::pdf_engine::PageSource;
use crate::progress::{self, ProgressCache};
use std::fs;
use std::ops::Range;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Isolated serialized size of every page, in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageSizes(Vec<u64>);

impl PageSizes {
    pub fn new(sizes: Vec<u64>) -> Self {
        Self(sizes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> u64 {
        self.0[index]
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn sum(&self, pages: Range<usize>) -> u64 {
        self.0[pages].iter().sum()
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// A copy where the entries of `pages` share `real` evenly. The first
    /// `real % len` entries carry one extra byte so the range still sums to
    /// `real`.
    pub fn corrected(&self, pages: Range<usize>, real: u64) -> Self {
        let len = pages.len() as u64;
        if len == 0 {
            return self.clone();
        }
        let base = real / len;
        let remainder = real % len;

        let mut sizes = self.0.clone();
        for (offset, size) in sizes[pages].iter_mut().enumerate() {
            *size = base + u64::from((offset as u64) < remainder);
        }
        Self(sizes)
    }
}

/// Serialize every page on its own into a scratch file under `scratch_dir`
/// and record the resulting file size. Progress stops one page short of the
/// page count.
pub fn estimate_page_sizes<S: PageSource + ?Sized>(
    source: &S,
    scratch_dir: &Path,
    cache: &mut dyn ProgressCache,
) -> Result<PageSizes> {
    let count = source.page_count();
    progress::publish(cache, progress::PAGE_COUNT, count as u64);

    let mut sizes = Vec::with_capacity(count);
    for index in 0..count {
        let pages = index..index + 1;
        let scratch = NamedTempFile::new_in(scratch_dir).map_err(|e| serialization(&pages, &e))?;
        source.write_range(pages.clone(), scratch.path())?;
        let size = fs::metadata(scratch.path())
            .map_err(|e| serialization(&pages, &e))?
            .len();
        sizes.push(size);
        // the last page is reported by the caller once the parts are written
        if index + 1 < count {
            progress::publish(cache, progress::PAGE_NUMBER, index as u64 + 1);
        }
    }

    debug!(pages = count, total = sizes.iter().sum::<u64>(), "estimated page sizes");
    Ok(PageSizes(sizes))
}

fn serialization(pages: &Range<usize>, err: &std::io::Error) -> ToolError {
    ToolError::PageSerialization {
        pages: pages.clone(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{MemoryCache, PAGE_COUNT, PAGE_NUMBER};
    use crate::split::fake::FakeSource;
    use tempfile::TempDir;

    #[test]
    fn test_corrected_spreads_remainder() {
        let sizes = PageSizes::new(vec![10, 10, 10, 10, 10]);
        let corrected = sizes.corrected(1..4, 11);
        assert_eq!(corrected.as_slice(), &[10, 4, 4, 3, 10]);
        assert_eq!(corrected.sum(1..4), 11);
        // the original vector is left alone
        assert_eq!(sizes.as_slice(), &[10, 10, 10, 10, 10]);
    }

    #[test]
    fn test_estimate_isolated_sizes() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::new(vec![100, 250, 75]).with_overhead(20, 5);
        let mut cache = MemoryCache::new();

        let sizes = estimate_page_sizes(&source, dir.path(), &mut cache).unwrap();
        assert_eq!(sizes.as_slice(), &[125, 275, 100]);
        assert_eq!(cache.get(PAGE_COUNT, None).unwrap(), Some(3));
        assert_eq!(cache.get(PAGE_NUMBER, None).unwrap(), Some(2));
        // scratch files are gone
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::new(vec![3_000, 1_200, 9_999, 40]);
        let mut cache = MemoryCache::new();

        let first = estimate_page_sizes(&source, dir.path(), &mut cache).unwrap();
        let second = estimate_page_sizes(&source, dir.path(), &mut cache).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_estimate_failure_aborts() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::new(vec![10, 10, 10]).failing_on(1);
        let mut cache = MemoryCache::new();

        let err = estimate_page_sizes(&source, dir.path(), &mut cache).unwrap_err();
        assert!(matches!(err, ToolError::PageSerialization { pages, .. } if pages == (1..2)));
    }
}
