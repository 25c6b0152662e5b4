// Turns a run step into the commands script and runs it in the worker.

use run_on_arch_sdk::IOUtil;
use std::path::{Path, PathBuf};

use crate::errors::RunError;
use crate::execution_context::ExecutionContext;
use crate::handlers::step_host::StepHost;
use crate::run_spec::RunStep;

/// Strict mode: exit on the first failing command or unset variable.
pub const STRICT_MODE: &str = "set -eu;";

/// Writes step scripts to a single fixed path. Every step replaces the
/// previous step's script.
#[derive(Debug, Clone)]
pub struct StepScriptMaterializer {
    path: PathBuf,
}

impl StepScriptMaterializer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Interpreter line, strict mode, then the body verbatim.
    pub fn render(step: &RunStep, shell: &str) -> String {
        [format!("#!{shell}"), STRICT_MODE.to_string(), step.script.clone()].join("\n")
    }

    /// Write the script for `step`. Returns once the file is on disk.
    pub fn materialize(&self, step: &RunStep, shell: &str) -> Result<&Path, RunError> {
        IOUtil::write_script(&self.path, &Self::render(step, shell)).map_err(|cause| {
            RunError::ScriptWrite {
                path: self.path.clone(),
                cause,
            }
        })?;
        Ok(&self.path)
    }
}

/// Executes one step: materialize, then run the script with the context's
/// shell through the given host.
pub struct ScriptHandler<'a> {
    materializer: &'a StepScriptMaterializer,
    host: &'a dyn StepHost,
}

impl<'a> ScriptHandler<'a> {
    pub fn new(materializer: &'a StepScriptMaterializer, host: &'a dyn StepHost) -> Self {
        Self { materializer, host }
    }

    pub async fn run_async(&self, context: &ExecutionContext, step: &RunStep) -> Result<(), RunError> {
        let script_path = self.materializer.materialize(step, &context.shell)?;
        tracing::debug!(target: "driver", step = %step.name, path = %script_path.display(), "Step script written");

        let arguments = vec![script_path.display().to_string()];
        self.host
            .execute_async(&context.shell, &arguments, &context.environment)
            .await
            .map_err(|cause| RunError::StepExecutionFailure {
                step: step.name.clone(),
                cause,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn step(script: &str) -> RunStep {
        RunStep::from_script(script)
    }

    #[test]
    fn render_layout() {
        let rendered = StepScriptMaterializer::render(&step("echo a\necho b"), "/bin/bash");
        assert_eq!(rendered, "#!/bin/bash\nset -eu;\necho a\necho b");
    }

    #[test]
    fn body_is_not_validated() {
        let rendered = StepScriptMaterializer::render(&step("if then fi ((("), "/bin/sh");
        assert!(rendered.ends_with("if then fi ((("));
    }

    #[test]
    fn materialize_twice_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let materializer = StepScriptMaterializer::new(dir.path().join("commands.sh"));
        let s = step("make -j4");

        materializer.materialize(&s, "/bin/sh").unwrap();
        let first = fs::read_to_string(materializer.path()).unwrap();
        materializer.materialize(&s, "/bin/sh").unwrap();
        let second = fs::read_to_string(materializer.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, "#!/bin/sh\nset -eu;\nmake -j4");
    }

    #[test]
    fn later_step_replaces_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let materializer = StepScriptMaterializer::new(dir.path().join("commands.sh"));
        materializer
            .materialize(&step("a very long first script body"), "/bin/sh")
            .unwrap();
        materializer.materialize(&step("ls"), "/bin/sh").unwrap();
        assert_eq!(
            fs::read_to_string(materializer.path()).unwrap(),
            "#!/bin/sh\nset -eu;\nls"
        );
    }

    #[test]
    fn unwritable_path_is_script_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let materializer = StepScriptMaterializer::new(blocker.join("commands.sh"));
        let err = materializer.materialize(&step("ls"), "/bin/sh").unwrap_err();
        assert!(matches!(err, RunError::ScriptWrite { .. }));
    }
}
