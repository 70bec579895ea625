//! In-memory page source with an exact size model.

use crate::error::{Result, ToolError};
use crate::pdf_engine::PageSource;
use std::fs;
use std::ops::Range;
use std::path::Path;
use std::sync::Mutex;

/// Every written file is `overhead + shared + sum(pages)` bytes long, so a
/// single page measures larger than its share of a multi-page file.
#[derive(Debug, Default)]
pub struct FakeSource {
    pages: Vec<u64>,
    overhead: u64,
    shared: u64,
    fail_on: Option<usize>,
    writes: Mutex<Vec<Range<usize>>>,
}

impl FakeSource {
    pub fn new(pages: Vec<u64>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn uniform(count: usize, size: u64) -> Self {
        Self::new(vec![size; count])
    }

    pub fn with_overhead(mut self, overhead: u64, shared: u64) -> Self {
        self.overhead = overhead;
        self.shared = shared;
        self
    }

    pub fn failing_on(mut self, page: usize) -> Self {
        self.fail_on = Some(page);
        self
    }

    pub fn size_of(&self, pages: Range<usize>) -> u64 {
        self.overhead + self.shared + self.pages[pages].iter().sum::<u64>()
    }

    pub fn writes(&self) -> Vec<Range<usize>> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl PageSource for FakeSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn document_size(&self) -> u64 {
        self.size_of(0..self.pages.len())
    }

    fn write_range(&self, pages: Range<usize>, path: &Path) -> Result<()> {
        if self.fail_on.is_some_and(|page| pages.contains(&page)) {
            return Err(ToolError::PageSerialization {
                pages,
                reason: "simulated failure".into(),
            });
        }
        let len = usize::try_from(self.size_of(pages.clone())).unwrap_or(usize::MAX);
        fs::write(path, vec![b'%'; len])?;
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(pages);
        }
        Ok(())
    }
}
