use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingStyle {
    /// `name [part 1].pdf`
    #[default]
    Bracketed,
    /// `name (part 1).pdf`
    Legacy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub suffix: String,
    pub naming: NamingStyle,
    pub fidelity_threshold: f64,
    pub max_corrections: u32,
    pub progress_max_age_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            suffix: "part".to_string(),
            naming: NamingStyle::default(),
            fidelity_threshold: 0.95,
            max_corrections: 8,
            progress_max_age_secs: 10,
        }
    }
}

/// Builds output paths next to the input document.
#[derive(Debug, Clone)]
pub struct OutputNamer {
    dir: PathBuf,
    stem: String,
    suffix: String,
    style: NamingStyle,
}

impl OutputNamer {
    pub fn new(input: &Path, suffix: &str, style: NamingStyle) -> Self {
        let dir = input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());

        Self {
            dir,
            stem,
            suffix: suffix.to_string(),
            style,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the `number`-th part (1-based).
    pub fn part(&self, number: usize) -> PathBuf {
        let name = match self.style {
            NamingStyle::Bracketed => format!("{} [{} {}].pdf", self.stem, self.suffix, number),
            NamingStyle::Legacy => format!("{} (part {}).pdf", self.stem, number),
        };
        self.dir.join(name)
    }

    /// Path for single-output actions, e.g. `tagged("sliced")`.
    pub fn tagged(&self, tag: &str) -> PathBuf {
        let name = match self.style {
            NamingStyle::Bracketed => format!("{} [{}].pdf", self.stem, tag),
            NamingStyle::Legacy => format!("{} ({}).pdf", self.stem, tag),
        };
        self.dir.join(name)
    }

    pub fn with_extension(&self, ext: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.stem, ext))
    }
}

/// One file written by a split or slice action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReport {
    pub number: usize,
    pub pages: Range<usize>,
    pub path: PathBuf,
    pub bytes: u64,
}

impl ChunkReport {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
