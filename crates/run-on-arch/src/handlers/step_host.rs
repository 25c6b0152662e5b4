// Where processes run: directly on the host, or inside the worker container
// via `docker exec`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use run_on_arch_common::constants::docker;
use run_on_arch_common::GroupLogger;
use run_on_arch_sdk::trace::TracingTraceWriter;
use run_on_arch_sdk::ProcessInvoker;
use std::sync::Arc;

use crate::environment::EnvironmentMap;

/// Runs a process to completion. A non-zero exit is an error.
#[async_trait]
pub trait StepHost: Send + Sync {
    async fn execute_async(
        &self,
        file_name: &str,
        arguments: &[String],
        environment: &EnvironmentMap,
    ) -> Result<()>;
}

/// Runs processes on the host, forwarding every stdout/stderr line to the
/// log as it arrives.
pub struct DefaultStepHost {
    output: Arc<dyn GroupLogger>,
}

impl DefaultStepHost {
    pub fn new(output: Arc<dyn GroupLogger>) -> Self {
        Self { output }
    }
}

#[async_trait]
impl StepHost for DefaultStepHost {
    async fn execute_async(
        &self,
        file_name: &str,
        arguments: &[String],
        environment: &EnvironmentMap,
    ) -> Result<()> {
        let mut invoker = ProcessInvoker::new(Arc::new(TracingTraceWriter));

        let forwarders: Vec<_> = [invoker.take_stdout_receiver(), invoker.take_stderr_receiver()]
            .into_iter()
            .flatten()
            .map(|mut rx| {
                let output = Arc::clone(&self.output);
                tokio::spawn(async move {
                    while let Some(evt) = rx.recv().await {
                        output.write_line(&evt.data);
                    }
                })
            })
            .collect();

        let result = invoker
            .execute("", file_name, arguments, Some(environment), true)
            .await;

        // Closes the channels so the forwarders drain and stop.
        drop(invoker);
        for forwarder in forwarders {
            if let Err(e) = forwarder.await {
                tracing::warn!(target: "process", "Output forwarder for '{}' stopped early: {}", file_name, e);
            }
        }

        result
            .map(|_| ())
            .with_context(|| format!("Process '{file_name}' failed"))
    }
}

/// Runs processes inside a running container through `docker exec -t`.
pub struct ContainerStepHost {
    docker_path: String,
    container: String,
    inner: Arc<dyn StepHost>,
}

impl ContainerStepHost {
    /// Targets the bootstrap's `worker` container.
    pub fn worker(docker_path: impl Into<String>, inner: Arc<dyn StepHost>) -> Self {
        Self::new(docker_path, docker::WORKER_CONTAINER, inner)
    }

    pub fn new(
        docker_path: impl Into<String>,
        container: impl Into<String>,
        inner: Arc<dyn StepHost>,
    ) -> Self {
        Self {
            docker_path: docker_path.into(),
            container: container.into(),
            inner,
        }
    }

    /// `docker` arguments for running `file_name arguments...` in the container.
    pub fn exec_arguments(&self, file_name: &str, arguments: &[String]) -> Vec<String> {
        let mut args = vec![
            "exec".to_string(),
            "-t".to_string(),
            self.container.clone(),
            file_name.to_string(),
        ];
        args.extend(arguments.iter().cloned());
        args
    }
}

#[async_trait]
impl StepHost for ContainerStepHost {
    async fn execute_async(
        &self,
        file_name: &str,
        arguments: &[String],
        environment: &EnvironmentMap,
    ) -> Result<()> {
        let docker_args = self.exec_arguments(file_name, arguments);
        self.inner
            .execute_async(&self.docker_path, &docker_args, environment)
            .await
            .with_context(|| format!("docker exec in container '{}' failed", self.container))
    }
}
