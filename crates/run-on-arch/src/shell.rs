use run_on_arch_common::constants::shells;

pub struct ShellResolver;

impl ShellResolver {
    /// The explicit shell if given, otherwise `/bin/sh` for images whose
    /// name contains `alpine` (musl images ship without bash) and
    /// `/bin/bash` for everything else.
    pub fn resolve(explicit: Option<&str>, image: &str) -> String {
        match explicit {
            Some(shell) if !shell.is_empty() => shell.to_string(),
            _ if image.contains(shells::MINIMAL_LIBC_MARKER) => shells::POSIX.to_string(),
            _ => shells::FULL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_shell_is_verbatim() {
        assert_eq!(ShellResolver::resolve(Some("/usr/bin/zsh"), "alpine:3.19"), "/usr/bin/zsh");
    }

    #[test]
    fn alpine_images_get_sh() {
        assert_eq!(ShellResolver::resolve(None, "alpine:3.19"), "/bin/sh");
        assert_eq!(ShellResolver::resolve(None, "arm32v6/alpine"), "/bin/sh");
        assert_eq!(ShellResolver::resolve(Some(""), "ghcr.io/x/builder-alpine"), "/bin/sh");
    }

    #[test]
    fn other_images_get_bash() {
        assert_eq!(ShellResolver::resolve(None, "arm64v8/ubuntu:22.04"), "/bin/bash");
        assert_eq!(ShellResolver::resolve(None, "debian:bookworm"), "/bin/bash");
    }

    #[test]
    fn marker_match_is_case_sensitive() {
        assert_eq!(ShellResolver::resolve(None, "ALPINE"), "/bin/bash");
    }
}
