// Flattens the `env` input into the process environment and the `-e` flags
// that expose each entry to the container.

use run_on_arch_common::constants::variables::GITHUB_TOKEN;
use serde_yaml::Value;
use std::collections::HashMap;

use crate::errors::RunError;
use crate::yaml::{kind_of, scalar_to_string};

/// Variable name to value. Only ever holds flat string values.
pub type EnvironmentMap = HashMap<String, String>;

/// Result of flattening: the merged environment plus the runtime flags,
/// user-supplied flags first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedEnvironment {
    pub environment: EnvironmentMap,
    pub runtime_flags: Vec<String>,
}

pub struct EnvironmentFlattener;

impl EnvironmentFlattener {
    /// Merge `inherited`, the token and the `env` mapping (in increasing
    /// precedence) and append one `-e<KEY>` flag per mapping entry to
    /// `runtime_flags`.
    ///
    /// The mapping is validated in full before anything is merged.
    pub fn flatten(
        env_spec: Option<&str>,
        inherited: EnvironmentMap,
        github_token: Option<&str>,
        runtime_flags: Vec<String>,
    ) -> Result<FlattenedEnvironment, RunError> {
        let entries = match env_spec {
            Some(text) if !text.trim().is_empty() => Self::parse(text)?,
            _ => Vec::new(),
        };

        let mut environment = inherited;
        let mut runtime_flags = runtime_flags;

        if let Some(token) = github_token.filter(|t| !t.is_empty()) {
            environment.insert(GITHUB_TOKEN.to_string(), token.to_string());
        }

        for (key, value) in entries {
            runtime_flags.push(Self::runtime_flag(&key));
            environment.insert(key, value);
        }

        Ok(FlattenedEnvironment {
            environment,
            runtime_flags,
        })
    }

    /// Flag telling the runtime to copy `key` from its own environment.
    /// The value never appears on the command line.
    pub fn runtime_flag(key: &str) -> String {
        format!("-e{key}")
    }

    /// Parse the mapping text into ordered key/value pairs.
    pub fn parse(text: &str) -> Result<Vec<(String, String)>, RunError> {
        let doc: Value = serde_yaml::from_str(text).map_err(|e| RunError::InvalidEnvironmentSpec {
            key: None,
            reason: format!("invalid YAML: {e}"),
        })?;

        let mapping = match doc {
            // A document of only comments.
            Value::Null => return Ok(Vec::new()),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(RunError::InvalidEnvironmentSpec {
                    key: None,
                    reason: format!("found {}", kind_of(&other)),
                })
            }
        };

        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in &mapping {
            let key = scalar_to_string(key).ok_or_else(|| RunError::InvalidEnvironmentSpec {
                key: None,
                reason: format!("key is {}", kind_of(key)),
            })?;
            let value = scalar_to_string(value).ok_or_else(|| RunError::InvalidEnvironmentSpec {
                key: Some(key.clone()),
                reason: format!("found {}", kind_of(value)),
            })?;
            entries.push((key, value));
        }

        Ok(entries)
    }
}
