//! Error types shared by every action

use std::ops::Range;
use std::path::PathBuf;

/// Result type for workflow actions
pub type Result<T> = std::result::Result<T, ToolError>;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Size argument missing, non-numeric, zero or negative
    #[error("invalid size argument: {0:?}")]
    InvalidCap(String),
    #[error("not an integer: {0:?}")]
    NotInteger(String),
    #[error("negative value: {0}")]
    NegativeValue(i64),
    #[error("zero is not a valid argument")]
    ZeroValue,
    #[error("{} is encrypted", .0.display())]
    Encrypted(PathBuf),
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },
    /// A page range could not be written out as its own document
    #[error("failed to serialize pages {}..{}: {reason}", pages.start, pages.end)]
    PageSerialization { pages: Range<usize>, reason: String },
    #[error("no input file selected")]
    NoInput,
    #[error("at least two PDF files are required, got {0}")]
    Selection(usize),
    #[error("files come from different directories")]
    MultiplePaths,
    #[error("invalid page range syntax: {0:?}")]
    Syntax(String),
    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },
    #[error("page numbers start at 1")]
    PageZero,
    #[error("range {start}-{stop} is reversed")]
    ReverseRange { start: usize, stop: usize },
    #[error("{} is not encrypted", .0.display())]
    NotEncrypted(PathBuf),
    #[error("wrong password for {}", .0.display())]
    WrongPassword(PathBuf),
    #[error("{} is already encrypted", .0.display())]
    AlreadyEncrypted(PathBuf),
    #[error("empty password")]
    EmptyPassword,
    #[error("cannot encrypt {}: {reason}", path.display())]
    Encryption { path: PathBuf, reason: String },
    /// The merged file is on disk but its sources are still in place
    #[error("could not move the merged files to the trash: {0}")]
    Trash(#[from] trash::Error),
    #[error("invalid page dimensions: {0}")]
    InvalidDimensions(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Pdf(#[from] lopdf::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    /// Message shown to the user in the launcher notification.
    pub fn user_message(&self, action: &str) -> String {
        match self {
            Self::InvalidCap(_) => "The argument must be a positive numeric value.".into(),
            Self::NotInteger(_) => "The argument is not an integer.".into(),
            Self::NegativeValue(_) => "Negative integer is not a valid argument.".into(),
            Self::ZeroValue => "Zero is not a valid argument.".into(),
            Self::Encrypted(_) | Self::Unreadable { .. } => {
                format!("{action} action cannot handle an encrypted PDF file.")
            }
            Self::NoInput => "You must select a PDF file.".into(),
            Self::Selection(_) => "You must select at least two PDF files to merge.".into(),
            Self::MultiplePaths => "Cannot merge PDF files from multiple paths.".into(),
            Self::Syntax(_) => "The input syntax is not valid.".into(),
            Self::PageOutOfRange { .. } => "Page number out of range.".into(),
            Self::PageZero => "Page number cannot be zero.".into(),
            Self::ReverseRange { .. } => "You cannot set a page range in reverse order.".into(),
            Self::NotEncrypted(_) => "The PDF file is not encrypted.".into(),
            Self::WrongPassword(_) => "The entered password is not valid.".into(),
            Self::AlreadyEncrypted(_) => "The PDF file is already encrypted.".into(),
            Self::EmptyPassword => "The password cannot be empty.".into(),
            Self::Trash(_) => "The files were merged but could not be moved to the trash.".into(),
            Self::InvalidDimensions(_) => "Page dimensions must be positive numbers.".into(),
            Self::PageSerialization { .. }
            | Self::Encryption { .. }
            | Self::Io(_)
            | Self::Pdf(_)
            | Self::Json(_) => {
                format!("{action} action failed: {self}")
            }
        }
    }
}
