// Platform detection and the well-known names shared across the workspace.

use std::fmt;

/// Operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsPlatform {
    Linux,
    MacOS,
    Windows,
    /// Any other target OS.
    Other,
}

impl fmt::Display for OsPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsPlatform::Linux => write!(f, "Linux"),
            OsPlatform::MacOS => write!(f, "macOS"),
            OsPlatform::Windows => write!(f, "Windows"),
            OsPlatform::Other => write!(f, "unknown"),
        }
    }
}

/// The current OS platform, detected at compile time.
#[cfg(target_os = "linux")]
pub const CURRENT_PLATFORM: OsPlatform = OsPlatform::Linux;
#[cfg(target_os = "macos")]
pub const CURRENT_PLATFORM: OsPlatform = OsPlatform::MacOS;
#[cfg(target_os = "windows")]
pub const CURRENT_PLATFORM: OsPlatform = OsPlatform::Windows;
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub const CURRENT_PLATFORM: OsPlatform = OsPlatform::Other;

/// The only platform the emulation bootstrap supports.
pub const SUPPORTED_PLATFORM: OsPlatform = OsPlatform::Linux;

/// Fixed script files, all relative to the action directory.
pub mod scripts {
    /// Shipped with the action; configures emulation and starts the worker.
    pub const BOOTSTRAP: &str = "run-on-arch.sh";
    /// The user's `setup` input, sourced by the bootstrap.
    pub const SETUP: &str = "run-on-arch-setup.sh";
    /// Rewritten before every step.
    pub const COMMANDS: &str = "run-on-arch-commands.sh";
}

/// Container runtime names.
pub mod docker {
    pub const DEFAULT_PATH: &str = "docker";
    /// Name the bootstrap gives the long-lived container.
    pub const WORKER_CONTAINER: &str = "worker";
}

/// Shells chosen when the `shell` input is empty.
pub mod shells {
    /// Images whose name contains this use the POSIX shell.
    pub const MINIMAL_LIBC_MARKER: &str = "alpine";
    pub const POSIX: &str = "/bin/sh";
    pub const FULL: &str = "/bin/bash";
}

/// Environment variable names.
pub mod variables {
    /// Reserved key the `githubToken` input is exported under.
    pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
    /// Action directory for composite and Node actions.
    pub const GITHUB_ACTION_PATH: &str = "GITHUB_ACTION_PATH";
    /// Set to `1` when step debug logging is enabled.
    pub const RUNNER_DEBUG: &str = "RUNNER_DEBUG";
    /// Prefix the runner uses to pass `with:` inputs.
    pub const INPUT_PREFIX: &str = "INPUT_";
}
