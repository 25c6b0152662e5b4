// The resolved, read-only state every step runs against.

use run_on_arch_sdk::ArgUtil;

use crate::environment::{EnvironmentFlattener, EnvironmentMap};
use crate::errors::RunError;
use crate::inputs::ActionSettings;
use crate::shell::ShellResolver;

/// Built once before the bootstrap; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub image: String,
    /// Interpreter used for every step inside the worker.
    pub shell: String,
    /// Environment for the bootstrap and every `docker exec`.
    pub environment: EnvironmentMap,
    /// `dockerRunArgs` tokens followed by one `-e<KEY>` per `env` entry.
    pub runtime_flags: Vec<String>,
}

impl ExecutionContext {
    pub fn resolve(settings: &ActionSettings, inherited: EnvironmentMap) -> Result<Self, RunError> {
        let shell = ShellResolver::resolve(settings.shell.as_deref(), &settings.image);

        let user_flags = match settings.docker_run_args.as_deref() {
            Some(args) => ArgUtil::split(args)?,
            None => Vec::new(),
        };

        let flattened = EnvironmentFlattener::flatten(
            settings.env.as_deref(),
            inherited,
            settings.github_token.as_deref(),
            user_flags,
        )?;

        Ok(Self {
            image: settings.image.clone(),
            shell,
            environment: flattened.environment,
            runtime_flags: flattened.runtime_flags,
        })
    }

    /// Bootstrap arguments: the image, then every runtime flag.
    pub fn bootstrap_arguments(&self) -> Vec<String> {
        std::iter::once(self.image.clone())
            .chain(self.runtime_flags.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ActionSettings {
        ActionSettings {
            image: "arm64v8/alpine:3.19".into(),
            docker_run_args: Some("--volume \"/host dir:/work\" --rm".into()),
            env: Some("CC: clang\nJOBS: 4".into()),
            github_token: Some("ghs_x".into()),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_everything() {
        let mut inherited = EnvironmentMap::new();
        inherited.insert("HOME".into(), "/home/runner".into());

        let ctx = ExecutionContext::resolve(&settings(), inherited).unwrap();
        assert_eq!(ctx.shell, "/bin/sh");
        assert_eq!(
            ctx.runtime_flags,
            vec!["--volume", "/host dir:/work", "--rm", "-eCC", "-eJOBS"]
        );
        assert_eq!(ctx.environment["HOME"], "/home/runner");
        assert_eq!(ctx.environment["CC"], "clang");
        assert_eq!(ctx.environment["GITHUB_TOKEN"], "ghs_x");
    }

    #[test]
    fn bootstrap_arguments_start_with_image() {
        let ctx = ExecutionContext::resolve(&settings(), EnvironmentMap::new()).unwrap();
        let args = ctx.bootstrap_arguments();
        assert_eq!(args[0], "arm64v8/alpine:3.19");
        assert_eq!(&args[1..], ctx.runtime_flags.as_slice());
    }

    #[test]
    fn bad_docker_run_args() {
        let mut s = settings();
        s.docker_run_args = Some("--name 'unterminated".into());
        let err = ExecutionContext::resolve(&s, EnvironmentMap::new()).unwrap_err();
        assert!(matches!(err, RunError::InvalidDockerRunArgs(_)));
    }

    #[test]
    fn bad_env_spec() {
        let mut s = settings();
        s.env = Some("- not\n- a mapping".into());
        let err = ExecutionContext::resolve(&s, EnvironmentMap::new()).unwrap_err();
        assert!(matches!(err, RunError::InvalidEnvironmentSpec { .. }));
    }
}
