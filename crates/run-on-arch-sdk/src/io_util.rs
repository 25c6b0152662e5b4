use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File helpers for the fixed-path scripts handed to the shell.
pub struct IOUtil;

impl IOUtil {
    /// Replace the contents of `path` with `content` and make it executable.
    ///
    /// The data is synced to disk before returning, so a process launched
    /// afterwards always sees the complete file.
    pub fn write_script(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory '{}'", parent.display())
                })?;
            }
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create script file '{}'", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write script file '{}'", path.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to flush script file '{}'", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o755)).with_context(|| {
                format!("Failed to mark script file '{}' executable", path.display())
            })?;
        }

        Ok(())
    }

    /// Directory containing the currently running executable.
    pub fn get_bin_path() -> Result<PathBuf> {
        let exe = std::env::current_exe().context("Failed to get current executable path")?;
        exe.parent()
            .map(Path::to_path_buf)
            .with_context(|| format!("Executable '{}' has no parent directory", exe.display()))
    }
}
