// Grouped console output for the Actions log.

use crate::action_command::ActionCommand;
use parking_lot::Mutex;
use std::io::{self, Write};

/// Output sink that understands log groups.
///
/// `Terminal` renders groups as workflow commands on stdout; tests use
/// `CollectingGroupLogger`.
pub trait GroupLogger: Send + Sync {
    /// Begin a named, collapsible group.
    fn start_group(&self, name: &str);

    fn end_group(&self);

    /// A line of regular output (child stdout/stderr, progress notes).
    fn write_line(&self, line: &str);

    /// Only shown when step debug logging is on.
    fn debug(&self, message: &str);

    /// Report the run's terminal failure.
    fn set_failed(&self, message: &str);
}

/// Writes to the process stdout.
#[derive(Debug, Default)]
pub struct Terminal {
    /// Suppresses all output.
    pub silent: bool,
}

impl Terminal {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&self, line: &str) {
        if self.silent {
            return;
        }
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{}", line);
        let _ = handle.flush();
    }
}

impl GroupLogger for Terminal {
    fn start_group(&self, name: &str) {
        self.emit(&ActionCommand::group(name).to_string());
    }

    fn end_group(&self) {
        self.emit(&ActionCommand::end_group().to_string());
    }

    fn write_line(&self, line: &str) {
        self.emit(line);
    }

    fn debug(&self, message: &str) {
        self.emit(&ActionCommand::debug(message).to_string());
    }

    fn set_failed(&self, message: &str) {
        self.emit(&ActionCommand::error(message).to_string());
    }
}

/// One recorded call on a [`CollectingGroupLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    StartGroup(String),
    EndGroup,
    Line(String),
    Debug(String),
    Failed(String),
}

/// Records every call in order.
#[derive(Debug, Default)]
pub struct CollectingGroupLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl CollectingGroupLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    /// Names of every group opened, in order.
    pub fn group_names(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                LogEvent::StartGroup(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: LogEvent) {
        self.events.lock().push(event);
    }
}

impl GroupLogger for CollectingGroupLogger {
    fn start_group(&self, name: &str) {
        self.push(LogEvent::StartGroup(name.to_string()));
    }

    fn end_group(&self) {
        self.push(LogEvent::EndGroup);
    }

    fn write_line(&self, line: &str) {
        self.push(LogEvent::Line(line.to_string()));
    }

    fn debug(&self, message: &str) {
        self.push(LogEvent::Debug(message.to_string()));
    }

    fn set_failed(&self, message: &str) {
        self.push(LogEvent::Failed(message.to_string()));
    }
}
