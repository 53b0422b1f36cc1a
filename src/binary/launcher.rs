use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use super::BinaryError;
use crate::options::NormalizedRequest;

/// The project directory: the request's `path`, or the current directory.
///
/// `-P/--project` is accepted on the command line but is not part of the
/// request (`project` is not an allow-listed key), so without a `path` the
/// binary always sees the current directory.
///
/// # Errors
///
/// Returns `BinaryError::NoProject` if the current directory is unavailable.
pub fn project_dir(request: &NormalizedRequest) -> Result<PathBuf, BinaryError> {
    match &request.path {
        Some(path) => Ok(PathBuf::from(path)),
        None => std::env::current_dir().map_err(|e| BinaryError::NoProject(e.to_string())),
    }
}

/// Arguments for a headless run of `project`.
#[must_use]
pub fn run_args(request: &NormalizedRequest, project: &Path) -> Vec<String> {
    let mut args = vec!["--run-project".to_string(), project.display().to_string()];
    push_value(&mut args, "--browser", request.browser.as_deref());
    push_value(&mut args, "--config", request.config.as_deref());
    push_value(&mut args, "--env", request.env.as_deref());
    push_value(&mut args, "--key", request.key.as_deref());
    push_value(&mut args, "--port", request.port.as_deref());
    if let Some(record) = request.record {
        args.push("--record".into());
        args.push(record.to_string());
    }
    push_value(&mut args, "--reporter", request.reporter.as_deref());
    push_value(
        &mut args,
        "--reporter-options",
        request.reporter_options.as_deref(),
    );
    push_value(&mut args, "--spec", request.spec.as_deref());
    args
}

/// Arguments for opening `project` interactively.
#[must_use]
pub fn open_args(request: &NormalizedRequest, project: &Path) -> Vec<String> {
    let mut args = vec!["--project".to_string(), project.display().to_string()];
    push_value(&mut args, "--port", request.port.as_deref());
    push_value(&mut args, "--env", request.env.as_deref());
    push_value(&mut args, "--config", request.config.as_deref());
    args
}

fn push_value(args: &mut Vec<String>, flag: &str, value: Option<&str>) {
    if let Some(value) = value {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}

/// Spawn the binary with inherited stdio and wait for it.
///
/// Resolves with the child's exit code; termination by signal counts as 1.
///
/// # Errors
///
/// Returns `BinaryError::SpawnFailed` if the process cannot be started.
pub async fn spawn_and_wait(binary: &Path, args: &[String]) -> Result<i32, BinaryError> {
    tracing::debug!(binary = %binary.display(), ?args, "spawning binary");
    let status = Command::new(binary)
        .args(args)
        .status()
        .await
        .map_err(|e| spawn_failed(binary, &e))?;
    Ok(status.code().unwrap_or(1))
}

/// Spawn the binary in its own process group and return without waiting.
///
/// Returns the child's PID.
///
/// # Errors
///
/// Returns `BinaryError::SpawnFailed` if the process cannot be started.
pub fn spawn_detached(binary: &Path, args: &[String]) -> Result<u32, BinaryError> {
    tracing::debug!(binary = %binary.display(), ?args, "spawning detached binary");
    let mut cmd = Command::new(binary);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    cmd.process_group(0);

    let child = cmd.spawn().map_err(|e| spawn_failed(binary, &e))?;
    Ok(child.id().unwrap_or(0))
}

/// First line of `<binary> --version`, or `None` if it cannot be obtained.
pub async fn query_version(binary: &Path) -> Option<String> {
    let output = Command::new(binary)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_version(&String::from_utf8_lossy(&output.stdout))
}

fn parse_version(stdout: &str) -> Option<String> {
    let line = stdout.lines().next()?.trim();
    let version = line.rsplit(' ').next().unwrap_or(line);
    (!version.is_empty()).then(|| version.to_string())
}

/// Run `<binary> --smoke-test --ping=<ping>` and require the ping echoed back.
///
/// # Errors
///
/// Returns `BinaryError::SpawnFailed` if the binary cannot start, or
/// `BinaryError::SmokeTestFailed` if it fails or echoes something else.
pub async fn smoke_test(binary: &Path, ping: &str) -> Result<(), BinaryError> {
    let output = Command::new(binary)
        .arg("--smoke-test")
        .arg(format!("--ping={ping}"))
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| spawn_failed(binary, &e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BinaryError::SmokeTestFailed(format!(
            "exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let echoed = String::from_utf8_lossy(&output.stdout);
    if echoed.trim() == ping {
        Ok(())
    } else {
        Err(BinaryError::SmokeTestFailed(format!(
            "expected ping {ping}, got {:?}",
            echoed.trim()
        )))
    }
}

fn spawn_failed(binary: &Path, e: &std::io::Error) -> BinaryError {
    BinaryError::SpawnFailed(format!("failed to spawn {}: {e}", binary.display()))
}
