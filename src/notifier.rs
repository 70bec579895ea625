use std::io::Write;
use std::sync::Mutex;
use tracing::{info, warn};

pub const TITLE: &str = "PDF Tools";

/// Delivers the one-line outcome of an action to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Target {
    #[default]
    Stdout,
    Stderr,
}

/// Prints notifications one per line. On stdout the launcher's notification
/// step picks them up.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    target: Target,
    lock: Mutex<()>,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stderr() -> Self {
        Self {
            target: Target::Stderr,
            ..Self::default()
        }
    }

    pub const fn target(&self) -> Target {
        self.target
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!(title, message, "notification");
        let _guard = self.lock.lock();
        let written = match self.target {
            Target::Stdout => writeln!(std::io::stdout().lock(), "{message}"),
            Target::Stderr => writeln!(std::io::stderr().lock(), "{message}"),
        };
        if let Err(e) = written {
            warn!(error = %e, stream = ?self.target, "could not print notification");
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.iter().map(|(_, m)| m.clone()).collect())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((title.to_string(), message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify(TITLE, "first");
        notifier.notify(TITLE, "second");
        assert_eq!(notifier.messages(), vec!["first", "second"]);
    }
}
