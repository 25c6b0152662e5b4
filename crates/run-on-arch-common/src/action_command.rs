// Workflow commands written to stdout for the Actions log viewer.
// Format: `::command::data`.

use std::fmt;

/// The delimiter used both as prefix and as separator.
pub const COMMAND_DELIMITER: &str = "::";

pub const GROUP: &str = "group";
pub const END_GROUP: &str = "endgroup";
pub const ERROR: &str = "error";
pub const DEBUG: &str = "debug";

struct EscapeMapping {
    token: &'static str,
    replacement: &'static str,
}

/// `%` must stay first so replacements are not escaped twice.
const ESCAPE_DATA_MAPPINGS: &[EscapeMapping] = &[
    EscapeMapping { token: "%",  replacement: "%25" },
    EscapeMapping { token: "\r", replacement: "%0D" },
    EscapeMapping { token: "\n", replacement: "%0A" },
];

/// A workflow command ready to be printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCommand {
    pub command: String,
    pub data: String,
}

impl ActionCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            data: String::new(),
        }
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    /// Opens a collapsible group in the log viewer.
    pub fn group(name: &str) -> Self {
        Self::new(GROUP).with_data(name)
    }

    pub fn end_group() -> Self {
        Self::new(END_GROUP)
    }

    /// Marks the message as an error annotation.
    pub fn error(message: &str) -> Self {
        Self::new(ERROR).with_data(message)
    }

    pub fn debug(message: &str) -> Self {
        Self::new(DEBUG).with_data(message)
    }
}

impl fmt::Display for ActionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            COMMAND_DELIMITER,
            self.command,
            COMMAND_DELIMITER,
            escape_data(&self.data)
        )
    }
}

/// Escape command data so it stays on one line.
pub fn escape_data(value: &str) -> String {
    let mut escaped = value.to_string();
    for mapping in ESCAPE_DATA_MAPPINGS {
        escaped = escaped.replace(mapping.token, mapping.replacement);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_and_end_group() {
        assert_eq!(ActionCommand::group("echo a").to_string(), "::group::echo a");
        assert_eq!(ActionCommand::end_group().to_string(), "::endgroup::");
    }

    #[test]
    fn data_is_escaped() {
        let cmd = ActionCommand::error("line1\nline2\r100%");
        assert_eq!(cmd.to_string(), "::error::line1%0Aline2%0D100%25");
    }

    #[test]
    fn percent_is_not_double_escaped() {
        assert_eq!(escape_data("%0A"), "%250A");
    }

    #[test]
    fn debug_command() {
        assert_eq!(
            ActionCommand::debug("shell: /bin/sh").to_string(),
            "::debug::shell: /bin/sh"
        );
    }
}
