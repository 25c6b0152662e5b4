// run-on-arch: run shell steps inside an emulated foreign-architecture
// container on a Linux CI host.
//
// Architecture:
//   main → ExecutionDriver::run → bootstrap (DefaultStepHost)
//     → per-step ScriptHandler::run_async → ContainerStepHost (`docker exec`)

pub mod driver;
pub mod environment;
pub mod errors;
pub mod execution_context;
pub mod handlers;
pub mod inputs;
pub mod run_spec;
pub mod shell;
pub mod yaml;

pub use driver::{DriverOptions, DriverState, ExecutionDriver, ScriptPaths};
pub use errors::RunError;
pub use inputs::{ActionInputs, ActionSettings};
