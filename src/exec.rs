//! Single choke-point for external command execution.
//!
//! All shell-outs to host tools (`useradd`, `usermod`, `apt-get`, `lsblk`,
//! ...) go through this module so that every command is logged with its exact
//! arguments before it runs and every failure carries the command's stderr.

use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::{BootstrapError, Result};

/// Run a command, capture its output, and fail on non-zero exit.
///
/// Returns the command's stdout on success. On non-zero exit the trimmed
/// stderr is surfaced in the error message.
pub fn run(program: &str, args: &[&str]) -> Result<String> {
    info!("exec: {} {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| BootstrapError::system(format!("failed to spawn {}: {}", program, e)))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(BootstrapError::system(format!(
            "{} exited with code {}: {}",
            program,
            code,
            stderr.trim()
        )))
    }
}

/// Run a command purely for its exit status.
///
/// Used for existence probes (`getent`, `which`) where a non-zero exit is an
/// answer, not an error. Spawn failures also report `false`.
pub fn succeeds(program: &str, args: &[&str]) -> bool {
    debug!("probe: {} {:?}", program, args);

    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Run a command with extra environment variables set.
///
/// Package-manager invocations need `DEBIAN_FRONTEND=noninteractive` so that
/// install prompts cannot hang the provisioning flow.
pub fn run_with_env(program: &str, args: &[&str], env: &[(&str, &str)]) -> Result<String> {
    info!("exec: {} {:?} env={:?}", program, args, env);

    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null());
    for (key, value) in env {
        cmd.env(key, value);
    }

    let output = cmd
        .output()
        .map_err(|e| BootstrapError::system(format!("failed to spawn {}: {}", program, e)))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(BootstrapError::system(format!(
            "{} exited with code {}: {}",
            program,
            code,
            stderr.trim()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_stdout() {
        let out = run("echo", &["hello"]).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn test_run_nonzero_exit_is_error() {
        let err = run("false", &[]).unwrap_err();
        assert!(matches!(err, BootstrapError::System(_)));
    }

    #[test]
    fn test_run_missing_program_is_error() {
        let err = run("this_program_does_not_exist_42", &[]).unwrap_err();
        assert!(matches!(err, BootstrapError::System(_)));
    }

    #[test]
    fn test_succeeds_probe() {
        assert!(succeeds("true", &[]));
        assert!(!succeeds("false", &[]));
        assert!(!succeeds("this_program_does_not_exist_42", &[]));
    }

    #[test]
    fn test_run_with_env_passes_variables() {
        let out = run_with_env("sh", &["-c", "echo $BOOTSTRAP_TEST_VAR"], &[(
            "BOOTSTRAP_TEST_VAR",
            "present",
        )])
        .unwrap();
        assert_eq!(out.trim(), "present");
    }
}
