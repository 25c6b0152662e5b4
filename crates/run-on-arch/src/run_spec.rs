// Normalizes the `run` / `multipleRun` inputs into an ordered list of steps.

use serde_yaml::Value;

use crate::errors::RunError;
use crate::yaml::{kind_of, scalar_to_string};

/// One named unit of shell text, executed once, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStep {
    /// Label for the step's log group.
    pub name: String,
    pub script: String,
}

impl RunStep {
    /// A step named after the first line of its script.
    pub fn from_script(script: impl Into<String>) -> Self {
        let script = script.into();
        Self {
            name: first_line(&script).to_string(),
            script,
        }
    }
}

/// The two shapes the run input can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunInput<'a> {
    Single(&'a str),
    Multiple(&'a str),
    None,
}

impl<'a> RunInput<'a> {
    /// A non-empty `run` takes precedence over `multipleRun`.
    pub fn select(run: Option<&'a str>, multiple_run: Option<&'a str>) -> Self {
        match (run, multiple_run) {
            (Some(script), _) if !script.is_empty() => RunInput::Single(script),
            (_, Some(list)) if !list.is_empty() => RunInput::Multiple(list),
            _ => RunInput::None,
        }
    }
}

pub struct RunSpecParser;

impl RunSpecParser {
    pub fn parse(input: RunInput<'_>) -> Result<Vec<RunStep>, RunError> {
        match input {
            RunInput::Single(script) => Ok(vec![RunStep::from_script(script)]),
            RunInput::Multiple(text) => Self::parse_multiple(text),
            RunInput::None => Ok(Vec::new()),
        }
    }

    fn parse_multiple(text: &str) -> Result<Vec<RunStep>, RunError> {
        let doc: Value = serde_yaml::from_str(text)
            .map_err(|e| RunError::InvalidRunSpec(format!("invalid YAML: {e}")))?;

        let items = match doc {
            Value::Sequence(items) => items,
            other => return Err(RunError::InvalidRunSpec(format!("found {}", kind_of(&other)))),
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| Self::parse_item(index, item))
            .collect()
    }

    fn parse_item(index: usize, item: &Value) -> Result<RunStep, RunError> {
        let mapping = item.as_mapping().ok_or_else(|| {
            RunError::InvalidRunSpec(format!("item {index} is {}", kind_of(item)))
        })?;

        let script = match mapping.get("run") {
            None | Some(Value::Null) => return Err(RunError::MissingRunField { index }),
            Some(value) => scalar_to_string(value).ok_or_else(|| {
                RunError::InvalidRunSpec(format!("run of item {index} is {}", kind_of(value)))
            })?,
        };
        if script.is_empty() {
            return Err(RunError::MissingRunField { index });
        }

        let name = match mapping.get("name") {
            None | Some(Value::Null) => None,
            Some(value) => Some(scalar_to_string(value).ok_or_else(|| {
                RunError::InvalidRunSpec(format!("name of item {index} is {}", kind_of(value)))
            })?),
        };

        Ok(match name {
            Some(name) if !name.is_empty() => RunStep { name, script },
            _ => RunStep::from_script(script),
        })
    }
}

fn first_line(script: &str) -> &str {
    script.split('\n').next().unwrap_or(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(steps: &[RunStep]) -> Vec<&str> {
        steps.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn single_run_named_by_first_line() {
        let steps = RunSpecParser::parse(RunInput::Single("apt-get update\nmake test")).unwrap();
        assert_eq!(
            steps,
            vec![RunStep {
                name: "apt-get update".into(),
                script: "apt-get update\nmake test".into(),
            }]
        );
    }

    #[test]
    fn single_line_script_is_its_own_name() {
        let steps = RunSpecParser::parse(RunInput::Single("uname -a")).unwrap();
        assert_eq!(names(&steps), vec!["uname -a"]);
    }

    #[test]
    fn multiple_runs_keep_order_and_derive_names() {
        let text = "- run: echo a\n- name: B\n  run: echo b\n- run: |\n    l1\n    l2\n";
        let steps = RunSpecParser::parse(RunInput::Multiple(text)).unwrap();
        assert_eq!(names(&steps), vec!["echo a", "B", "l1"]);
        assert_eq!(steps[0].script, "echo a");
        assert_eq!(steps[1].script, "echo b");
        assert_eq!(steps[2].script, "l1\nl2\n");
    }

    #[test]
    fn duplicate_names_are_kept() {
        let text = "- {name: same, run: a}\n- {name: same, run: b}";
        let steps = RunSpecParser::parse(RunInput::Multiple(text)).unwrap();
        assert_eq!(names(&steps), vec!["same", "same"]);
    }

    #[test]
    fn empty_name_falls_back_to_first_line() {
        let steps = RunSpecParser::parse(RunInput::Multiple("- {name: '', run: ls}")).unwrap();
        assert_eq!(names(&steps), vec!["ls"]);
    }

    #[test]
    fn missing_run_field() {
        let text = "- run: ok\n- name: no script\n";
        let err = RunSpecParser::parse(RunInput::Multiple(text)).unwrap_err();
        assert!(matches!(err, RunError::MissingRunField { index: 1 }));
    }

    #[test]
    fn empty_or_null_run_counts_as_missing() {
        for text in ["- run: ''", "- run:", "- {name: x, run: ~}"] {
            let err = RunSpecParser::parse(RunInput::Multiple(text)).unwrap_err();
            assert!(matches!(err, RunError::MissingRunField { index: 0 }), "{text}");
        }
    }

    #[test]
    fn top_level_must_be_a_list() {
        for text in ["run: ls", "just text", "~"] {
            let err = RunSpecParser::parse(RunInput::Multiple(text)).unwrap_err();
            assert!(matches!(err, RunError::InvalidRunSpec(_)), "{text}");
        }
    }

    #[test]
    fn items_must_be_mappings() {
        let err = RunSpecParser::parse(RunInput::Multiple("- ls\n- run: ok")).unwrap_err();
        assert!(matches!(err, RunError::InvalidRunSpec(ref m) if m.contains("item 0")));
    }

    #[test]
    fn nested_run_is_invalid() {
        let err = RunSpecParser::parse(RunInput::Multiple("- run: [a, b]")).unwrap_err();
        assert!(matches!(err, RunError::InvalidRunSpec(_)));
    }

    #[test]
    fn no_input_is_a_no_op() {
        assert!(RunSpecParser::parse(RunInput::None).unwrap().is_empty());
    }

    #[test]
    fn single_run_wins_over_multiple() {
        assert_eq!(
            RunInput::select(Some("echo single"), Some("- run: echo multi")),
            RunInput::Single("echo single")
        );
        assert_eq!(
            RunInput::select(Some(""), Some("- run: echo multi")),
            RunInput::Multiple("- run: echo multi")
        );
        assert_eq!(RunInput::select(None, None), RunInput::None);
    }
}
