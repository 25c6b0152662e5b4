// Step execution: script materialization and the hosts processes run on.

pub mod script_handler;
pub mod step_host;
