//! External tool execution
//!
//! Every pipeline stage describes the command it needs as a [`ToolInvocation`]
//! and hands it to a [`ToolRunner`]. The first non-zero exit is returned as
//! [`RawdroidError::ToolFailed`] and stops the pipeline.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{RawdroidError, Result};

/// A single external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Short name used in logs and errors (`aapt`, `jarsigner`, ...)
    pub tool: String,
    /// Executable to run
    pub program: PathBuf,
    /// Arguments, passed without shell interpretation
    pub args: Vec<OsString>,
    /// Working directory, if different from the current one
    pub cwd: Option<PathBuf>,
}

impl ToolInvocation {
    /// Create an invocation of `program`, labelled `tool`
    pub fn new(tool: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run in the given directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Arguments as lossy strings, for display and assertions
    pub fn args_lossy(&self) -> Vec<String> {
        self.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    /// Whether `arg` appears among the arguments
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

/// Flags whose following argument is a password
const SECRET_FLAGS: &[&str] = &["-storepass", "-keypass"];

/// Renders the command line with passwords masked
impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        let mut hide_next = false;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if hide_next {
                f.write_str(" ***")?;
            } else if arg.starts_with("pass:") {
                f.write_str(" pass:***")?;
            } else {
                write!(f, " {}", arg)?;
            }
            hide_next = SECRET_FLAGS.contains(&&*arg);
        }
        Ok(())
    }
}

/// Executes external tools
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the invocation to completion; a non-zero exit is an error
    async fn run(&self, invocation: &ToolInvocation) -> Result<()>;

    /// True when tools are only recorded, so their outputs never appear
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Runs tools as child processes with inherited stdio
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<()> {
        info!("Running {}", invocation.tool);
        debug!("{}", invocation);

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(ref cwd) = invocation.cwd {
            cmd.current_dir(cwd);
        }

        let status = cmd.status().await.map_err(|source| RawdroidError::Spawn {
            tool: invocation.tool.clone(),
            source,
        })?;

        if !status.success() {
            return Err(RawdroidError::ToolFailed {
                tool: invocation.tool.clone(),
                status,
            });
        }

        Ok(())
    }
}

/// Records invocations instead of running them
///
/// Backs `--dry-run`. `fail_on` makes the named tool report exit status 1,
/// which is how pipeline tests exercise early aborts.
#[derive(Debug, Default)]
pub struct DryRunner {
    calls: Mutex<Vec<ToolInvocation>>,
    fail_on: Option<String>,
}

impl DryRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner on which `tool` fails
    pub fn failing_on(tool: impl Into<String>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(tool.into()),
        }
    }

    /// Invocations seen so far, in order
    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Tool names seen so far, in order
    pub fn tools(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.tool).collect()
    }
}

#[async_trait]
impl ToolRunner for DryRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<()> {
        info!("[dry-run] {}", invocation);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }

        if self.fail_on.as_deref() == Some(invocation.tool.as_str()) {
            return Err(RawdroidError::ToolFailed {
                tool: invocation.tool.clone(),
                status: exit_status(1),
            });
        }
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

#[cfg(unix)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}

/// Locate `name` on `PATH`, falling back to `fallback` when it exists
pub fn find_tool(name: &str, fallback: Option<&Path>) -> Result<PathBuf> {
    if let Ok(path) = which::which(name) {
        return Ok(path);
    }
    match fallback {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        _ => Err(RawdroidError::ToolNotFound(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder() {
        let inv = ToolInvocation::new("zipalign", "/sdk/build-tools/30.0.3/zipalign")
            .args(["-v", "4"])
            .arg("in.apk")
            .arg("out.apk");

        assert_eq!(inv.args_lossy(), vec!["-v", "4", "in.apk", "out.apk"]);
        assert!(inv.has_arg("in.apk"));
        assert_eq!(
            inv.to_string(),
            "/sdk/build-tools/30.0.3/zipalign -v 4 in.apk out.apk"
        );
    }

    #[test]
    fn test_display_masks_passwords() {
        let inv = ToolInvocation::new("jarsigner", "jarsigner")
            .args(["-storepass", "hunter2", "app.apk"])
            .args(["--ks-pass", "pass:hunter2"]);

        let shown = inv.to_string();
        assert!(!shown.contains("hunter2"));
        assert_eq!(shown, "jarsigner -storepass *** app.apk --ks-pass pass:***");
    }

    #[test]
    fn test_find_tool_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("rawdroid-no-such-tool");
        assert!(matches!(
            find_tool("rawdroid-no-such-tool", Some(&fallback)),
            Err(RawdroidError::ToolNotFound(_))
        ));

        std::fs::write(&fallback, b"").unwrap();
        assert_eq!(find_tool("rawdroid-no-such-tool", Some(&fallback)).unwrap(), fallback);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_reports_exit_status() {
        let runner = ProcessRunner::new();
        runner.run(&ToolInvocation::new("true", "true")).await.unwrap();

        let err = runner.run(&ToolInvocation::new("false", "false")).await.unwrap_err();
        assert_eq!(err.tool(), Some("false"));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_dry_runner_records_and_fails_on_request() {
        let runner = DryRunner::failing_on("jarsigner");
        runner.run(&ToolInvocation::new("aapt", "aapt")).await.unwrap();
        let err = runner
            .run(&ToolInvocation::new("jarsigner", "jarsigner"))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert_eq!(runner.tools(), vec!["aapt", "jarsigner"]);
    }

    #[tokio::test]
    async fn test_process_runner_missing_program() {
        let runner = ProcessRunner::new();
        let err = runner
            .run(&ToolInvocation::new("ghost", "/nonexistent/rawdroid-ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, RawdroidError::Spawn { .. }));
    }
}
