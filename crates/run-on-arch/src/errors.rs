use run_on_arch_common::OsPlatform;
use std::path::PathBuf;

/// Every way a run can fail. All of them are fatal: the first one aborts
/// the run and its message becomes the action's failure message.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("run-on-arch supports only {supported}, not {actual}")]
    UnsupportedPlatform {
        supported: OsPlatform,
        actual: OsPlatform,
    },

    #[error("Input required and not supplied: {0}")]
    MissingInput(String),

    /// `key` is set when a single entry is at fault.
    #[error("{}", invalid_env_message(.key.as_deref(), .reason))]
    InvalidEnvironmentSpec {
        key: Option<String>,
        reason: String,
    },

    #[error("run-on-arch: dockerRunArgs could not be parsed: {0}")]
    InvalidDockerRunArgs(#[from] run_on_arch_sdk::ArgSplitError),

    #[error("run-on-arch: multipleRun must be a list of {{name, run}} objects ({0})")]
    InvalidRunSpec(String),

    #[error("run-on-arch: multipleRun objects must have run key (item {index})")]
    MissingRunField { index: usize },

    #[error("run-on-arch: failed to write script '{}': {cause:#}", .path.display())]
    ScriptWrite {
        path: PathBuf,
        cause: anyhow::Error,
    },

    #[error("run-on-arch: bootstrap failed: {0:#}")]
    BootstrapFailure(anyhow::Error),

    #[error("run-on-arch: step '{step}' failed: {cause:#}")]
    StepExecutionFailure {
        step: String,
        cause: anyhow::Error,
    },
}

fn invalid_env_message(key: Option<&str>, reason: &str) -> String {
    match key {
        Some(key) => format!("run-on-arch: env {key} value must be flat ({reason})"),
        None => format!("run-on-arch: env must be a flat mapping of key/value pairs ({reason})"),
    }
}

impl RunError {
    /// The failing step's name, for step failures.
    pub fn step_name(&self) -> Option<&str> {
        match self {
            RunError::StepExecutionFailure { step, .. } => Some(step),
            _ => None,
        }
    }
}
