use crate::trace::TraceWriter;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Error type for non-zero process exit codes.
#[derive(Debug, thiserror::Error)]
#[error(
    "Exit code {exit_code} returned from process: file name '{file_name}', arguments '{arguments}'."
)]
pub struct ProcessExitCodeError {
    pub exit_code: i32,
    pub file_name: String,
    pub arguments: String,
}

/// A line received from stdout or stderr.
#[derive(Debug, Clone)]
pub struct ProcessDataReceivedEventArgs {
    pub data: String,
}

/// Spawns a child process, reads stdout/stderr on separate tasks and delivers
/// each line through a channel while waiting for the process to exit.
///
/// There is no timeout: `execute` returns only once the child has exited and
/// both streams have been drained.
pub struct ProcessInvoker {
    trace: Arc<dyn TraceWriter>,
    stdout_tx: mpsc::UnboundedSender<ProcessDataReceivedEventArgs>,
    stdout_rx: Option<mpsc::UnboundedReceiver<ProcessDataReceivedEventArgs>>,
    stderr_tx: mpsc::UnboundedSender<ProcessDataReceivedEventArgs>,
    stderr_rx: Option<mpsc::UnboundedReceiver<ProcessDataReceivedEventArgs>>,
}

impl ProcessInvoker {
    pub fn new(trace: Arc<dyn TraceWriter>) -> Self {
        let (stdout_tx, stdout_rx) = mpsc::unbounded_channel();
        let (stderr_tx, stderr_rx) = mpsc::unbounded_channel();
        Self {
            trace,
            stdout_tx,
            stdout_rx: Some(stdout_rx),
            stderr_tx,
            stderr_rx: Some(stderr_rx),
        }
    }

    /// Take the stdout receiver. Can only be called once; subsequent calls return `None`.
    pub fn take_stdout_receiver(
        &mut self,
    ) -> Option<mpsc::UnboundedReceiver<ProcessDataReceivedEventArgs>> {
        self.stdout_rx.take()
    }

    /// Take the stderr receiver. Can only be called once; subsequent calls return `None`.
    pub fn take_stderr_receiver(
        &mut self,
    ) -> Option<mpsc::UnboundedReceiver<ProcessDataReceivedEventArgs>> {
        self.stderr_rx.take()
    }

    /// Run `file_name` with `arguments` and wait for it to exit.
    ///
    /// When `environment` is given it becomes the child's complete
    /// environment; otherwise the child inherits ours. With
    /// `require_exit_code_zero` a non-zero exit is returned as a
    /// [`ProcessExitCodeError`].
    ///
    /// Returns the process exit code.
    pub async fn execute(
        &self,
        working_directory: &str,
        file_name: &str,
        arguments: &[String],
        environment: Option<&HashMap<String, String>>,
        require_exit_code_zero: bool,
    ) -> Result<i32> {
        anyhow::ensure!(!file_name.is_empty(), "file_name must not be empty");

        let display_args = arguments.join(" ");
        self.trace.info("Starting process:");
        self.trace.info(&format!("  File name: '{file_name}'"));
        self.trace.info(&format!("  Arguments: '{display_args}'"));
        self.trace
            .info(&format!("  Working directory: '{working_directory}'"));
        self.trace.info(&format!(
            "  Require exit code zero: '{require_exit_code_zero}'"
        ));

        let mut cmd = Command::new(file_name);
        cmd.args(arguments);

        if !working_directory.is_empty() && Path::new(working_directory).is_dir() {
            cmd.current_dir(working_directory);
        }

        if let Some(env) = environment {
            cmd.env_clear();
            cmd.envs(env);
        }

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.stdin(Stdio::null());

        let start = std::time::Instant::now();
        let mut child = cmd.spawn().with_context(|| {
            format!("Failed to start process '{file_name}' with arguments '{display_args}'")
        })?;

        let pid = child.id().unwrap_or(0);
        self.trace.info(&format!(
            "Process started with process id {pid}, waiting for process exit."
        ));

        let stdout_task = child.stdout.take().map(|stdout| {
            spawn_line_reader(stdout, self.stdout_tx.clone(), self.trace.clone(), "STDOUT")
        });
        let stderr_task = child.stderr.take().map(|stderr| {
            spawn_line_reader(stderr, self.stderr_tx.clone(), self.trace.clone(), "STDERR")
        });

        let status = child
            .wait()
            .await
            .context("Failed to wait for process")?;
        // Signal-terminated children have no code.
        let exit_code = status.code().unwrap_or(-1);

        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        if let Some(task) = stderr_task {
            let _ = task.await;
        }

        let elapsed = start.elapsed();
        self.trace.info(&format!(
            "Finished process {pid} with exit code {exit_code}, and elapsed time {elapsed:.2?}."
        ));

        if exit_code != 0 && require_exit_code_zero {
            return Err(ProcessExitCodeError {
                exit_code,
                file_name: file_name.to_string(),
                arguments: display_args,
            }
            .into());
        }

        Ok(exit_code)
    }
}

fn spawn_line_reader<R>(
    stream: R,
    tx: mpsc::UnboundedSender<ProcessDataReceivedEventArgs>,
    trace: Arc<dyn TraceWriter>,
    label: &'static str,
) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        // Children may print arbitrary bytes; keep draining until EOF so the
        // pipe never closes under a running child.
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let _ = tx.send(ProcessDataReceivedEventArgs {
                        data: decode_line(&buf),
                    });
                }
                Err(e) => {
                    trace.error(&format!("{label} stream read failed: {e}"));
                    break;
                }
            }
        }
        trace.verbose(&format!("{label} stream read finished."));
    })
}

/// One output line without its terminator; invalid UTF-8 is replaced.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{CollectingTraceWriter, NullTraceWriter, TraceLevel};

    fn make_invoker() -> ProcessInvoker {
        ProcessInvoker::new(Arc::new(NullTraceWriter))
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn execute_streams_stdout() {
        let mut invoker = make_invoker();
        let mut rx = invoker.take_stdout_receiver().unwrap();

        let handle = tokio::spawn(async move {
            invoker
                .execute("", "echo", &args(&["hello", "world"]), None, false)
                .await
        });

        let mut lines = Vec::new();
        while let Some(evt) = rx.recv().await {
            lines.push(evt.data);
        }

        let exit_code = handle.await.unwrap().unwrap();
        assert_eq!(exit_code, 0);
        assert_eq!(lines, vec!["hello world"]);
    }

    #[tokio::test]
    async fn arguments_are_not_resplit() {
        let mut invoker = make_invoker();
        let mut rx = invoker.take_stdout_receiver().unwrap();

        let handle = tokio::spawn(async move {
            invoker
                .execute("", "/bin/sh", &args(&["-c", "echo \"$0|$1\"", "a b", "c"]), None, true)
                .await
        });

        let mut lines = Vec::new();
        while let Some(evt) = rx.recv().await {
            lines.push(evt.data);
        }
        handle.await.unwrap().unwrap();
        assert_eq!(lines, vec!["a b|c"]);
    }

    #[tokio::test]
    async fn execute_nonexistent() {
        let invoker = make_invoker();
        let result = invoker
            .execute("", "nonexistent_command_xyz_123", &[], None, false)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn execute_require_exit_code_zero() {
        let invoker = make_invoker();
        let result = invoker
            .execute("", "/bin/sh", &args(&["-c", "exit 3"]), None, true)
            .await;
        let err = result.unwrap_err();
        let exit = err.downcast_ref::<ProcessExitCodeError>().unwrap();
        assert_eq!(exit.exit_code, 3);
        assert!(err.to_string().contains("Exit code 3"));
    }

    #[tokio::test]
    async fn non_zero_exit_is_returned_when_not_required() {
        let invoker = make_invoker();
        let code = invoker
            .execute("", "/bin/sh", &args(&["-c", "exit 5"]), None, false)
            .await
            .unwrap();
        assert_eq!(code, 5);
    }

    #[tokio::test]
    async fn environment_replaces_inherited() {
        let mut env = HashMap::new();
        env.insert("MY_TEST_VAR".to_string(), "test_value_123".to_string());

        let mut invoker = make_invoker();
        let mut rx = invoker.take_stdout_receiver().unwrap();

        let handle = tokio::spawn(async move {
            invoker
                .execute(
                    "",
                    "/bin/sh",
                    &args(&["-c", "echo \"$MY_TEST_VAR:${HOME:-unset}\""]),
                    Some(&env),
                    true,
                )
                .await
        });

        let mut lines = Vec::new();
        while let Some(evt) = rx.recv().await {
            lines.push(evt.data);
        }

        handle.await.unwrap().unwrap();
        assert_eq!(lines, vec!["test_value_123:unset"]);
    }

    #[tokio::test]
    async fn stderr_is_delivered_separately() {
        let mut invoker = make_invoker();
        let mut out_rx = invoker.take_stdout_receiver().unwrap();
        let mut err_rx = invoker.take_stderr_receiver().unwrap();

        let handle = tokio::spawn(async move {
            invoker
                .execute("", "/bin/sh", &args(&["-c", "echo out; echo err >&2"]), None, true)
                .await
        });

        let mut out = Vec::new();
        while let Some(evt) = out_rx.recv().await {
            out.push(evt.data);
        }
        let mut err = Vec::new();
        while let Some(evt) = err_rx.recv().await {
            err.push(evt.data);
        }
        handle.await.unwrap().unwrap();
        assert_eq!(out, vec!["out"]);
        assert_eq!(err, vec!["err"]);
    }

    #[tokio::test]
    async fn start_and_finish_are_traced() {
        let trace = Arc::new(CollectingTraceWriter::new());
        let invoker = ProcessInvoker::new(trace.clone());
        invoker
            .execute("", "/bin/sh", &args(&["-c", "true"]), None, true)
            .await
            .unwrap();

        assert!(trace.contains(TraceLevel::Info, "File name: '/bin/sh'"));
        assert!(trace.contains(TraceLevel::Info, "with exit code 0"));
    }

    #[tokio::test]
    async fn invalid_utf8_does_not_stop_the_stream() {
        let mut invoker = make_invoker();
        let mut rx = invoker.take_stdout_receiver().unwrap();

        let script = "printf 'caf\\351\\n'; i=0; while [ $i -lt 5000 ]; do echo line$i; i=$((i+1)); done; echo done";
        let handle = tokio::spawn(async move {
            invoker
                .execute("", "/bin/sh", &args(&["-c", script]), None, true)
                .await
        });

        let mut lines = Vec::new();
        while let Some(evt) = rx.recv().await {
            lines.push(evt.data);
        }

        assert_eq!(handle.await.unwrap().unwrap(), 0);
        assert_eq!(lines.len(), 5002);
        assert_eq!(lines[0], "caf\u{FFFD}");
        assert_eq!(lines[1], "line0");
        assert_eq!(lines[5000], "line4999");
        assert_eq!(lines[5001], "done");
    }

    #[test]
    fn decode_line_strips_terminators() {
        assert_eq!(decode_line(b"abc\r\n"), "abc");
        assert_eq!(decode_line(b"abc\n"), "abc");
        assert_eq!(decode_line(b"no newline"), "no newline");
        assert_eq!(decode_line(b"caf\xe9\n"), "caf\u{FFFD}");
    }
}
