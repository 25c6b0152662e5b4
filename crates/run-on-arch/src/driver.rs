// ExecutionDriver: bootstrap the emulated worker once, then run every step
// inside it, in order, stopping at the first failure.
//
//   Initializing -> BootstrappingRuntime -> (Idle <-> ExecutingStep) -> Completed
//        |                  |                            |
//        +------------------+------------> Failed <------+

use run_on_arch_common::constants::scripts;
use run_on_arch_common::{GroupLogger, OsPlatform, SUPPORTED_PLATFORM};
use run_on_arch_sdk::IOUtil;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::environment::EnvironmentMap;
use crate::errors::RunError;
use crate::execution_context::ExecutionContext;
use crate::handlers::script_handler::{ScriptHandler, StepScriptMaterializer};
use crate::handlers::step_host::{ContainerStepHost, StepHost};
use crate::inputs::{ActionInputs, ActionSettings};
use crate::run_spec::{RunInput, RunSpecParser};

/// Group wrapping the bootstrap's output.
pub const BOOTSTRAP_GROUP: &str = "Prepare docker";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Initializing,
    BootstrappingRuntime,
    /// Waiting to start step `next`.
    Idle { next: usize },
    ExecutingStep { index: usize },
    Completed,
    Failed,
}

impl DriverState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DriverState::Completed | DriverState::Failed)
    }

    fn can_transition_to(&self, next: &DriverState) -> bool {
        use DriverState::*;
        match (self, next) {
            (Initializing, BootstrappingRuntime) => true,
            (BootstrappingRuntime, Idle { next: 0 }) => true,
            (Idle { next: n }, ExecutingStep { index }) => n == index,
            (ExecutingStep { index }, Idle { next }) => *next == index + 1,
            (Idle { .. }, Completed) => true,
            (Initializing | BootstrappingRuntime | ExecutingStep { .. }, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverState::Initializing => write!(f, "Initializing"),
            DriverState::BootstrappingRuntime => write!(f, "BootstrappingRuntime"),
            DriverState::Idle { next } => write!(f, "Idle(next={next})"),
            DriverState::ExecutingStep { index } => write!(f, "ExecutingStep({index})"),
            DriverState::Completed => write!(f, "Completed"),
            DriverState::Failed => write!(f, "Failed"),
        }
    }
}

/// Locations of the three fixed script files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPaths {
    pub bootstrap: PathBuf,
    pub setup: PathBuf,
    pub commands: PathBuf,
}

impl ScriptPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            bootstrap: dir.join(scripts::BOOTSTRAP),
            setup: dir.join(scripts::SETUP),
            commands: dir.join(scripts::COMMANDS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub scripts: ScriptPaths,
    /// Container runtime binary used for `docker exec`.
    pub docker_path: String,
    /// Host platform; only Linux is supported.
    pub platform: OsPlatform,
}

pub struct ExecutionDriver {
    options: DriverOptions,
    /// Runs the bootstrap on the host.
    host: Arc<dyn StepHost>,
    /// Runs steps inside the worker.
    worker: Arc<dyn StepHost>,
    output: Arc<dyn GroupLogger>,
    state: DriverState,
}

impl ExecutionDriver {
    pub fn new(options: DriverOptions, host: Arc<dyn StepHost>, output: Arc<dyn GroupLogger>) -> Self {
        let worker: Arc<dyn StepHost> = Arc::new(ContainerStepHost::worker(
            options.docker_path.clone(),
            Arc::clone(&host),
        ));
        Self {
            options,
            host,
            worker,
            output,
            state: DriverState::Initializing,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Drive a whole run. Call once per driver.
    pub async fn run(&mut self, inputs: &ActionInputs, inherited: EnvironmentMap) -> Result<(), RunError> {
        let result = self.run_steps(inputs, inherited).await;
        match &result {
            Ok(()) => self.transition(DriverState::Completed),
            Err(e) => {
                tracing::error!(target: "driver", "Run failed: {}", e);
                self.transition(DriverState::Failed);
            }
        }
        result
    }

    async fn run_steps(&mut self, inputs: &ActionInputs, inherited: EnvironmentMap) -> Result<(), RunError> {
        self.check_platform()?;

        let settings = ActionSettings::from_inputs(inputs)?;
        let context = ExecutionContext::resolve(&settings, inherited)?;
        let steps = RunSpecParser::parse(RunInput::select(
            settings.run.as_deref(),
            settings.multiple_run.as_deref(),
        ))?;
        self.output.debug(&format!("Using shell {}", context.shell));
        self.output
            .debug(&format!("Resolved {} run step(s)", steps.len()));

        self.write_setup_script(&settings.setup)?;

        self.transition(DriverState::BootstrappingRuntime);
        self.bootstrap(&context).await?;
        self.transition(DriverState::Idle { next: 0 });

        let materializer = StepScriptMaterializer::new(self.options.scripts.commands.clone());
        let worker = Arc::clone(&self.worker);
        let handler = ScriptHandler::new(&materializer, worker.as_ref());

        for (index, step) in steps.iter().enumerate() {
            self.transition(DriverState::ExecutingStep { index });

            self.output.start_group(&step.name);
            let result = handler.run_async(&context, step).await;
            self.output.end_group();
            result?;

            self.transition(DriverState::Idle { next: index + 1 });
        }

        Ok(())
    }

    fn check_platform(&self) -> Result<(), RunError> {
        if self.options.platform != SUPPORTED_PLATFORM {
            return Err(RunError::UnsupportedPlatform {
                supported: SUPPORTED_PLATFORM,
                actual: self.options.platform,
            });
        }
        Ok(())
    }

    fn write_setup_script(&self, setup: &str) -> Result<(), RunError> {
        let path = &self.options.scripts.setup;
        IOUtil::write_script(path, setup).map_err(|cause| RunError::ScriptWrite {
            path: path.clone(),
            cause,
        })
    }

    async fn bootstrap(&self, context: &ExecutionContext) -> Result<(), RunError> {
        self.output.start_group(BOOTSTRAP_GROUP);
        self.output
            .write_line("Configuring Docker for multi-architecture support");

        let bootstrap = self.options.scripts.bootstrap.display().to_string();
        let result = self
            .host
            .execute_async(&bootstrap, &context.bootstrap_arguments(), &context.environment)
            .await;

        self.output.end_group();
        result.map_err(RunError::BootstrapFailure)
    }

    fn transition(&mut self, next: DriverState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(target: "driver", "{} -> {}", self.state, next);
        self.state = next;
    }
}
