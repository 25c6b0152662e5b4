// Action inputs, read the way the Actions toolkit reads them.
//
// The runner passes each `with:` entry as `INPUT_<NAME>`, upper-cased with
// spaces turned into underscores.

use run_on_arch_common::constants::variables::INPUT_PREFIX;
use std::collections::HashMap;

use crate::errors::RunError;

pub const IMAGE: &str = "image";
pub const SETUP: &str = "setup";
pub const SHELL: &str = "shell";
pub const DOCKER_RUN_ARGS: &str = "dockerRunArgs";
pub const GITHUB_TOKEN: &str = "githubToken";
pub const ENV: &str = "env";
pub const RUN: &str = "run";
pub const MULTIPLE_RUN: &str = "multipleRun";

/// Raw action inputs keyed by their `INPUT_*` variable name.
#[derive(Debug, Clone, Default)]
pub struct ActionInputs {
    inputs: HashMap<String, String>,
}

impl ActionInputs {
    /// Collect every `INPUT_*` entry from `vars`.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let inputs = vars
            .into_iter()
            .filter(|(k, _)| k.starts_with(INPUT_PREFIX))
            .collect();
        Self { inputs }
    }

    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// The variable the runner uses for `name`.
    pub fn variable_name(name: &str) -> String {
        format!("{}{}", INPUT_PREFIX, name.replace(' ', "_").to_uppercase())
    }

    /// Look up an input. Values are trimmed and an empty value counts as
    /// not supplied.
    pub fn get_input(&self, name: &str, required: bool) -> Result<Option<String>, RunError> {
        let value = self
            .inputs
            .get(&Self::variable_name(name))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if required && value.is_none() {
            return Err(RunError::MissingInput(name.to_string()));
        }

        Ok(value)
    }
}

/// The typed view of every input the action accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSettings {
    pub image: String,
    /// Written to the setup script even when empty.
    pub setup: String,
    pub shell: Option<String>,
    pub docker_run_args: Option<String>,
    pub github_token: Option<String>,
    pub env: Option<String>,
    pub run: Option<String>,
    pub multiple_run: Option<String>,
}

impl ActionSettings {
    pub fn from_inputs(inputs: &ActionInputs) -> Result<Self, RunError> {
        let image = inputs
            .get_input(IMAGE, true)?
            .ok_or_else(|| RunError::MissingInput(IMAGE.to_string()))?;

        Ok(Self {
            image,
            setup: inputs.get_input(SETUP, false)?.unwrap_or_default(),
            shell: inputs.get_input(SHELL, false)?,
            docker_run_args: inputs.get_input(DOCKER_RUN_ARGS, false)?,
            github_token: inputs.get_input(GITHUB_TOKEN, false)?,
            env: inputs.get_input(ENV, false)?,
            run: inputs.get_input(RUN, false)?,
            multiple_run: inputs.get_input(MULTIPLE_RUN, false)?,
        })
    }
}
