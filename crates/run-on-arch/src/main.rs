// Entry point for the run-on-arch action.
//
// The runner invokes the binary with the action's inputs in `INPUT_*`
// variables. Exit code 0 means every step passed.

use clap::Parser;
use run_on_arch_common::constants::{docker, variables};
use run_on_arch_common::{GroupLogger, Terminal, TraceSetting, CURRENT_PLATFORM};
use run_on_arch_sdk::IOUtil;
use std::path::PathBuf;
use std::sync::Arc;

use run_on_arch::handlers::step_host::DefaultStepHost;
use run_on_arch::{ActionInputs, DriverOptions, ExecutionDriver, ScriptPaths};

/// Command-line arguments for the action.
#[derive(Parser, Debug)]
#[command(name = "run-on-arch", about = "Run commands inside an emulated foreign-architecture container")]
struct Args {
    /// Directory holding the bootstrap script. Also receives the setup and
    /// commands scripts. Defaults to the binary's own directory.
    #[arg(long = "action-dir", env = variables::GITHUB_ACTION_PATH)]
    action_dir: Option<PathBuf>,

    /// Container runtime binary.
    #[arg(long = "docker", default_value = docker::DEFAULT_PATH)]
    docker: String,
}

fn main() {
    let args = Args::parse();

    let runner_debug = std::env::var(variables::RUNNER_DEBUG).ok();
    run_on_arch_common::tracing::init(&TraceSetting::from_runner_debug(runner_debug.as_deref()));

    let terminal = Arc::new(Terminal::new());

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            terminal.set_failed(&format!("Failed to build Tokio runtime: {e}"));
            std::process::exit(1);
        }
    };

    let exit_code = runtime.block_on(run(args, terminal));

    std::process::exit(exit_code);
}

async fn run(args: Args, terminal: Arc<Terminal>) -> i32 {
    let action_dir = match args.action_dir {
        Some(dir) => dir,
        None => match IOUtil::get_bin_path() {
            Ok(dir) => dir,
            Err(e) => {
                terminal.set_failed(&format!("run-on-arch: cannot locate action directory: {e:#}"));
                return 1;
            }
        },
    };
    tracing::debug!("Action directory: {}", action_dir.display());

    let options = DriverOptions {
        scripts: ScriptPaths::in_dir(&action_dir),
        docker_path: args.docker,
        platform: CURRENT_PLATFORM,
    };
    let output: Arc<dyn GroupLogger> = terminal.clone();
    let host = Arc::new(DefaultStepHost::new(Arc::clone(&output)));
    let mut driver = ExecutionDriver::new(options, host, output);

    let inputs = ActionInputs::from_env();
    let inherited = std::env::vars().collect();

    match driver.run(&inputs, inherited).await {
        Ok(()) => {
            tracing::info!("All steps completed");
            0
        }
        Err(e) => {
            terminal.set_failed(&e.to_string());
            1
        }
    }
}
