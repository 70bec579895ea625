//! Progress counters shared between a running action and the polling UI
//!
//! A long-running action publishes `page_count` and `page_number` into a
//! [`ProgressCache`]; the `progress` command reads them back, together with
//! their age, and renders launcher feedback.

use crate::error::Result;
use crate::storage::atomic_write;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::warn;

pub const PAGE_COUNT: &str = "page_count";
pub const PAGE_NUMBER: &str = "page_number";

const ICON_WARNING: &str =
    "/System/Library/CoreServices/CoreTypes.bundle/Contents/Resources/AlertCautionIcon.icns";
const ICON_DONE: &str = "checkmark.png";

pub trait ProgressCache {
    fn put(&mut self, key: &str, value: u64) -> Result<()>;

    /// Value stored under `key`, or `None` if missing or older than `max_age`.
    fn get(&self, key: &str, max_age: Option<Duration>) -> Result<Option<u64>>;

    /// Time since `key` was last written.
    fn age(&self, key: &str) -> Result<Option<Duration>>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct CacheEntry {
    value: u64,
    #[serde(with = "time::serde::timestamp")]
    stored_at: OffsetDateTime,
}

impl CacheEntry {
    fn age(&self) -> Duration {
        let elapsed = OffsetDateTime::now_utc() - self.stored_at;
        elapsed.try_into().unwrap_or(Duration::ZERO)
    }

    fn fresh(&self, max_age: Option<Duration>) -> bool {
        max_age.is_none_or(|max| self.age() <= max)
    }
}

/// One JSON file per key inside the workflow cache directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&data) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupted cache entry");
                Ok(None)
            }
        }
    }
}

impl ProgressCache for FileCache {
    fn put(&mut self, key: &str, value: u64) -> Result<()> {
        let entry = CacheEntry {
            value,
            stored_at: OffsetDateTime::now_utc(),
        };
        atomic_write(&self.entry_path(key), &serde_json::to_string(&entry)?)?;
        Ok(())
    }

    fn get(&self, key: &str, max_age: Option<Duration>) -> Result<Option<u64>> {
        Ok(self
            .read(key)?
            .filter(|entry| entry.fresh(max_age))
            .map(|entry| entry.value))
    }

    fn age(&self, key: &str) -> Result<Option<Duration>> {
        Ok(self.read(key)?.map(|entry| entry.age()))
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    entries: HashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value as if it had been written `ago` in the past.
    pub fn put_aged(&mut self, key: &str, value: u64, ago: Duration) {
        let stored_at = OffsetDateTime::now_utc() - ago;
        self.entries
            .insert(key.to_string(), CacheEntry { value, stored_at });
    }
}

impl ProgressCache for MemoryCache {
    fn put(&mut self, key: &str, value: u64) -> Result<()> {
        self.put_aged(key, value, Duration::ZERO);
        Ok(())
    }

    fn get(&self, key: &str, max_age: Option<Duration>) -> Result<Option<u64>> {
        Ok(self
            .entries
            .get(key)
            .filter(|entry| entry.fresh(max_age))
            .map(|entry| entry.value))
    }

    fn age(&self, key: &str) -> Result<Option<Duration>> {
        Ok(self.entries.get(key).map(CacheEntry::age))
    }
}

/// Publish a counter, logging instead of failing the action when the cache
/// is unavailable.
pub fn publish(cache: &mut dyn ProgressCache, key: &str, value: u64) {
    if let Err(e) = cache.put(key, value) {
        warn!(key, value, error = %e, "could not publish progress");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Icon {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
}

/// Script filter output understood by the launcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub items: Vec<Item>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerun: Option<f32>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

/// Five dots with the `n`-th (mod 5) one filled.
pub fn progress_bar(n: u64) -> String {
    let filled = (n % 5) as usize;
    (0..5)
        .map(|i| if i == filled { '\u{25CF}' } else { '\u{25CB}' })
        .collect()
}

/// Feedback for the `n`-th poll of a running split.
pub fn progress_feedback(cache: &dyn ProgressCache, n: u64, max_age: Duration) -> Result<Feedback> {
    let page_number = cache.get(PAGE_NUMBER, Some(max_age))?;
    let page_count = cache.get(PAGE_COUNT, None)?;

    let item = match (page_number, page_count) {
        (Some(number), Some(count)) if count > 0 => {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let percent = ((number as f64 / count as f64) * 100.0).round() as u64;
            let title = format!("Page {number} of {count} processed ({percent}% completed)");
            if number == count {
                Item {
                    title,
                    subtitle: None,
                    valid: true,
                    icon: Some(Icon {
                        path: ICON_DONE.to_string(),
                    }),
                }
            } else {
                Item {
                    title,
                    subtitle: Some(progress_bar(n)),
                    valid: true,
                    icon: None,
                }
            }
        }
        _ => {
            let reading = cache
                .age(PAGE_COUNT)?
                .is_some_and(|age| age < max_age);
            if reading {
                Item {
                    title: "Reading the PDF file...".to_string(),
                    subtitle: Some(progress_bar(n)),
                    valid: true,
                    icon: None,
                }
            } else {
                Item {
                    title: "Split action is not running.".to_string(),
                    subtitle: None,
                    valid: true,
                    icon: Some(Icon {
                        path: ICON_WARNING.to_string(),
                    }),
                }
            }
        }
    };

    let mut variables = BTreeMap::new();
    variables.insert("n".to_string(), (n + 1).to_string());

    Ok(Feedback {
        items: vec![item],
        rerun: Some(1.0),
        variables,
    })
}
