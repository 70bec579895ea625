//! Backend for a launcher workflow that merges, splits, slices and reshapes
//! PDF files.
//!
//! The centerpiece is [`split::split_size`], which splits a document into
//! parts below a byte limit even though page sizes do not add up linearly.

pub mod commands;
pub mod crop;
pub mod decrypt;
pub mod encrypt;
pub mod error;
pub mod merge;
pub mod models;
pub mod notifier;
pub mod pdf_engine;
pub mod progress;
pub mod scale;
pub mod slice;
pub mod split;
pub mod storage;
pub mod text;

#[cfg(test)]
mod test_support;

pub use error::{Result, ToolError};
pub use models::{ChunkReport, NamingStyle, OutputNamer, Settings};
pub use pdf_engine::{PageSource, PdfDocument};
pub use progress::{FileCache, MemoryCache, ProgressCache};
pub use split::{split_by_size, split_size, Cap, Mode, SplitOptions, SplitOutcome};
