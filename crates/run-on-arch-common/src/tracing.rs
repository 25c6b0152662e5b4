// Diagnostic logging setup.
//
// Diagnostics go to stderr so they never land inside a step's output group.

use tracing_subscriber::EnvFilter;

/// Configuration for diagnostic output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSetting {
    /// Directive used when `RUST_LOG` is not set.
    pub default_directive: String,
}

impl Default for TraceSetting {
    fn default() -> Self {
        Self {
            default_directive: "warn".to_string(),
        }
    }
}

impl TraceSetting {
    /// Settings derived from the Actions debug switch (`RUNNER_DEBUG=1`).
    pub fn from_runner_debug(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("1") | Some("true") => Self {
                default_directive: "debug".to_string(),
            },
            _ => Self::default(),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.default_directive))
    }
}

/// Install the global `tracing` subscriber. Safe to call more than once;
/// later calls are ignored.
pub fn init(setting: &TraceSetting) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(setting.filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
