//! Groups pages into size-capped chunks and writes them out

use super::estimator::PageSizes;
use crate::error::Result;
use crate::models::{ChunkReport, OutputNamer};
use crate::pdf_engine::PageSource;
use std::fs;
use std::ops::Range;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Per-page estimates add up to the real document size: trust them.
    HighFidelity,
    /// Estimates are inflated by shared resources: verify against real sizes.
    LowFidelity,
}

impl Mode {
    pub fn select(ratio: f64, threshold: f64) -> Self {
        if ratio > threshold {
            Self::HighFidelity
        } else {
            Self::LowFidelity
        }
    }
}

/// `min / max` of the real document size and the sum of the page estimates.
pub fn quotient_ratio(actual: u64, estimated: u64) -> f64 {
    if actual == 0 && estimated == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = actual.min(estimated) as f64 / actual.max(estimated) as f64;
    ratio
}

struct Written {
    pages: Range<usize>,
    bytes: u64,
    path: PathBuf,
}

pub struct Partitioner<'a, S: PageSource + ?Sized> {
    source: &'a S,
    namer: &'a OutputNamer,
    cap: u64,
    max_corrections: u32,
    sizes: PageSizes,
    reports: Vec<ChunkReport>,
}

impl<'a, S: PageSource + ?Sized> Partitioner<'a, S> {
    pub fn new(
        source: &'a S,
        namer: &'a OutputNamer,
        cap: u64,
        sizes: PageSizes,
        max_corrections: u32,
    ) -> Self {
        Self {
            source,
            namer,
            cap,
            max_corrections,
            sizes,
            reports: Vec::new(),
        }
    }

    /// Write every chunk. Returns the reports and the size vector as it stood
    /// after the last correction.
    pub fn run(mut self, mode: Mode) -> Result<(Vec<ChunkReport>, PageSizes)> {
        match mode {
            Mode::HighFidelity => self.high_fidelity()?,
            Mode::LowFidelity => self.low_fidelity()?,
        }
        Ok((self.reports, self.sizes))
    }

    fn high_fidelity(&mut self) -> Result<()> {
        let count = self.sizes.len();
        let mut start = 0;
        while start < count {
            let mut stop = start + 1;
            let mut estimate = self.sizes.get(start);
            while stop < count && estimate + self.sizes.get(stop) < self.cap {
                estimate += self.sizes.get(stop);
                stop += 1;
            }
            let written = self.write_fitting(start..stop)?;
            start = written.pages.end;
            self.record(written);
        }
        Ok(())
    }

    fn low_fidelity(&mut self) -> Result<()> {
        let count = self.sizes.len();
        let mut start = 0;
        let mut corrections = 0;

        while start < count {
            let mut stop = start + 1;
            let mut estimate = self.sizes.get(start);
            while estimate < self.cap && stop < count {
                estimate += self.sizes.get(stop);
                stop += 1;
            }

            if estimate < self.cap || stop - start == 1 {
                // Ran out of pages, or a single page already reaches the cap.
                let written = self.write_fitting(start..stop)?;
                start = written.pages.end;
                corrections = 0;
                self.record(written);
                continue;
            }

            stop -= 1;
            let written = self.write_fitting(start..stop)?;
            let pessimistic =
                written.pages.end == stop && written.bytes + self.sizes.get(stop) < self.cap;

            if pessimistic {
                if corrections < self.max_corrections {
                    fs::remove_file(&written.path)?;
                    debug!(
                        pages = ?written.pages,
                        estimated = self.sizes.sum(written.pages.clone()),
                        real = written.bytes,
                        "estimates too pessimistic, re-estimating"
                    );
                    self.sizes = self.sizes.corrected(written.pages, written.bytes);
                    corrections += 1;
                    continue;
                }
                warn!(
                    pages = ?written.pages,
                    corrections,
                    "correction limit reached, keeping chunk as written"
                );
            }

            start = written.pages.end;
            corrections = 0;
            self.record(written);
        }
        Ok(())
    }

    /// Write `pages` as the next part, dropping trailing pages while the file
    /// exceeds the cap and still holds more than one page.
    fn write_fitting(&self, mut pages: Range<usize>) -> Result<Written> {
        let path = self.namer.part(self.reports.len() + 1);
        loop {
            self.source.write_range(pages.clone(), &path)?;
            let bytes = fs::metadata(&path)?.len();
            if bytes <= self.cap || pages.len() == 1 {
                return Ok(Written { pages, bytes, path });
            }
            debug!(pages = ?pages, bytes, cap = self.cap, "chunk over cap, dropping last page");
            pages.end -= 1;
        }
    }

    fn record(&mut self, written: Written) {
        let number = self.reports.len() + 1;
        if written.bytes > self.cap {
            warn!(
                page = written.pages.start + 1,
                bytes = written.bytes,
                cap = self.cap,
                "single page exceeds the size limit"
            );
        }
        info!(
            number,
            pages = written.pages.len(),
            bytes = written.bytes,
            path = %written.path.display(),
            "wrote chunk"
        );
        self.reports.push(ChunkReport {
            number,
            pages: written.pages,
            path: written.path,
            bytes: written.bytes,
        });
    }
}
