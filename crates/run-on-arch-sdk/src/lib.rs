// run-on-arch-sdk: foundation layer for run-on-arch.
// No dependencies on other run-on-arch crates; provides tracing, process
// and file utilities used by the rest of the workspace.

pub mod arg_util;
pub mod io_util;
pub mod process_invoker;
pub mod trace;

pub use arg_util::{ArgSplitError, ArgUtil};
pub use io_util::IOUtil;
pub use process_invoker::{ProcessDataReceivedEventArgs, ProcessExitCodeError, ProcessInvoker};
pub use trace::TraceWriter;
