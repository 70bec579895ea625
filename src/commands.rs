//! Command line surface used by the launcher
//!
//! The launcher passes the selected files in `abs_path` (tab separated) and
//! the typed argument in `query`; both can also be given as arguments.

use crate::crop::crop;
use crate::decrypt::decrypt;
use crate::encrypt::encrypt;
use crate::error::{Result, ToolError};
use crate::merge::{merge, merge_and_trash};
use crate::models::Settings;
use crate::notifier::{ConsoleNotifier, Notifier, TITLE};
use crate::progress::{progress_feedback, ProgressCache};
use crate::scale::{scale, PaperSize};
use crate::slice::{slice, SliceMode};
use crate::split::{split_count, split_size};
use crate::storage;
use crate::text::extract_text;
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, warn};

#[derive(Parser, Debug)]
#[command(name = "pdftools", version, about = "Merge, split, slice and reshape PDF files")]
pub struct Cli {
    /// Selected files, tab separated when read from the environment
    #[arg(long = "files", env = "abs_path", value_delimiter = '\t', global = true)]
    pub files: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct Query {
    /// Argument typed in the launcher
    #[arg(env = "query", default_value = "", allow_hyphen_values = true)]
    pub query: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Split a file into parts no larger than the given megabytes
    #[command(name = "splitsize")]
    SplitSize(Query),
    /// Split a file into parts of the given page count
    #[command(name = "splitcount")]
    SplitCount(Query),
    /// Write one file per page range
    #[command(name = "slicemulti")]
    SliceMulti(Query),
    /// Write all page ranges into one file
    #[command(name = "slicesingle")]
    SliceSingle(Query),
    /// Merge the selected files into `<query>.pdf`
    #[command(alias = "mrg")]
    Merge(Query),
    /// Merge the selected files, then move them to the trash
    #[command(name = "mrgtrash")]
    MergeTrash(Query),
    /// Protect the selected files with a password
    Encrypt(Query),
    /// Remove the password from the selected files
    Decrypt(Query),
    /// Split two-column pages into single columns
    Crop,
    /// Resize pages to `<width> <height>` in inches
    Scale(Query),
    /// Extract the text of the selected files
    Text,
    /// Report the progress of a running split
    Progress {
        /// Poll counter kept by the launcher
        #[arg(env = "n", default_value_t = 0)]
        n: u64,
    },
    /// Write the default settings file
    InitConfig,
}

impl Command {
    /// Action name used in user facing messages.
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::SplitSize(_) | Self::SplitCount(_) => "Split",
            Self::SliceMulti(_) | Self::SliceSingle(_) => "Slice",
            Self::Merge(_) | Self::MergeTrash(_) => "Merge",
            Self::Encrypt(_) => "Encrypt",
            Self::Decrypt(_) => "Decrypt",
            Self::Crop => "Crop",
            Self::Scale(_) => "Scale",
            Self::Text => "Text",
            Self::Progress { .. } => "Progress",
            Self::InitConfig => "Configuration",
        }
    }

    /// Notifier for this command. `progress` owns stdout for its feedback
    /// JSON, so its notifications go to stderr.
    pub fn notifier(&self) -> ConsoleNotifier {
        match self {
            Self::Progress { .. } => ConsoleNotifier::stderr(),
            _ => ConsoleNotifier::new(),
        }
    }
}

fn single_file(files: &[PathBuf]) -> Result<&Path> {
    match files {
        [] => Err(ToolError::NoInput),
        [file] => Ok(file.as_path()),
        [file, rest @ ..] => {
            warn!(ignored = rest.len(), "only the first selected file is used");
            Ok(file.as_path())
        }
    }
}

/// Run `action` on every file in parallel, one result per file.
fn for_each_file<F>(files: &[PathBuf], action: F) -> Vec<Result<String>>
where
    F: Fn(&Path) -> Result<String> + Sync + Send,
{
    if files.is_empty() {
        return vec![Err(ToolError::NoInput)];
    }
    files.par_iter().map(|path| action(path.as_path())).collect()
}

fn created(action: &str, count: usize) -> String {
    match count {
        1 => format!("{action} action completed: 1 file created."),
        n => format!("{action} action completed: {n} files created."),
    }
}

/// Execute `command` and return the message for each completed unit of work.
pub fn execute(
    command: &Command,
    files: &[PathBuf],
    settings: &Settings,
    cache: &mut dyn ProgressCache,
    out: &mut dyn Write,
) -> Vec<Result<String>> {
    let action = command.action_name();
    let single = |result: Result<String>| vec![result];

    match command {
        Command::SplitSize(Query { query }) => single(
            single_file(files)
                .and_then(|file| split_size(file, query, settings, cache))
                .map(|outcome| created(action, outcome.chunks.len())),
        ),
        Command::SplitCount(Query { query }) => single(
            single_file(files)
                .and_then(|file| split_count(file, query, settings))
                .map(|chunks| created(action, chunks.len())),
        ),
        Command::SliceMulti(Query { query }) | Command::SliceSingle(Query { query }) => {
            let mode = match command {
                Command::SliceSingle(_) => SliceMode::Single,
                _ => SliceMode::Multi,
            };
            single(
                single_file(files)
                    .and_then(|file| slice(file, query, mode, settings))
                    .map(|outputs| created(action, outputs.len())),
            )
        }
        Command::Merge(Query { query }) => single(
            merge(files, query).map(|_| "Merge action completed.".to_string()),
        ),
        Command::MergeTrash(Query { query }) => single(
            merge_and_trash(files, query).map(|_| "Merge action completed.".to_string()),
        ),
        Command::Encrypt(Query { query }) => for_each_file(files, |path| {
            encrypt(path, query, settings).map(|_| "Encryption successfully completed.".to_string())
        }),
        Command::Decrypt(Query { query }) => for_each_file(files, |path| {
            decrypt(path, query, settings).map(|_| "Decryption successfully completed.".to_string())
        }),
        Command::Crop => for_each_file(files, |path| {
            crop(path, settings).map(|_| "Crop action completed.".to_string())
        }),
        Command::Scale(Query { query }) => match PaperSize::parse(query) {
            Ok(target) => for_each_file(files, |path| {
                scale(path, target, settings).map(|_| "Scale action completed.".to_string())
            }),
            Err(e) => single(Err(e)),
        },
        Command::Text => for_each_file(files, |path| {
            extract_text(path, settings).map(|_| "Text extraction completed.".to_string())
        }),
        Command::Progress { n } => {
            let max_age = Duration::from_secs(settings.progress_max_age_secs);
            single(
                progress_feedback(cache, *n, max_age)
                    .and_then(|feedback| {
                        serde_json::to_writer(&mut *out, &feedback)?;
                        writeln!(out)?;
                        Ok(())
                    })
                    .map(|()| String::new()),
            )
        }
        Command::InitConfig => single(
            storage::save_settings(settings)
                .map(|path| format!("Settings written to {}", path.display())),
        ),
    }
}

/// Execute the parsed command line and notify the user of every outcome.
/// Returns whether every unit of work succeeded.
pub fn run(
    cli: &Cli,
    settings: &Settings,
    notifier: &dyn Notifier,
    cache: &mut dyn ProgressCache,
    out: &mut dyn Write,
) -> bool {
    let action = cli.command.action_name();
    let mut success = true;

    for result in execute(&cli.command, &cli.files, settings, cache, out) {
        match result {
            Ok(message) if message.is_empty() => {}
            Ok(message) => notifier.notify(TITLE, &message),
            Err(e) => {
                error!(action, error = %e, "action failed");
                notifier.notify(TITLE, &e.user_message(action));
                success = false;
            }
        }
    }
    success
}
