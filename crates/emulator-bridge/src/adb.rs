//! ADB (Android Debug Bridge) Client
//!
//! Builds `adb` invocations and runs them through a [`ToolRunner`].

use std::path::{Path, PathBuf};

use rawdroid_core::{find_tool, RawdroidError, ToolInvocation, ToolRunner};
use tracing::info;

/// Activity class of apps without Java code
pub const NATIVE_ACTIVITY: &str = "android.app.NativeActivity";

/// ADB errors
#[derive(Debug, thiserror::Error)]
pub enum AdbError {
    #[error("APK not found: {0:?}")]
    ApkNotFound(PathBuf),
    #[error(transparent)]
    Tool(#[from] RawdroidError),
}

/// ADB Client
pub struct AdbClient<'a> {
    adb: PathBuf,
    serial: Option<String>,
    runner: &'a dyn ToolRunner,
}

impl<'a> AdbClient<'a> {
    /// Create a client for an explicit `adb` executable
    pub fn new(adb: PathBuf, runner: &'a dyn ToolRunner) -> Self {
        Self {
            adb,
            serial: None,
            runner,
        }
    }

    /// Use `adb` from `PATH`, or `sdk_adb` when it is not there
    pub fn locate(sdk_adb: &Path, runner: &'a dyn ToolRunner) -> Result<Self, AdbError> {
        let adb = match find_tool("adb", Some(sdk_adb)) {
            Ok(adb) => adb,
            Err(_) if runner.is_dry_run() => sdk_adb.to_path_buf(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self::new(adb, runner))
    }

    /// Target a specific device instead of the default one
    pub fn with_serial(mut self, serial: Option<String>) -> Self {
        self.serial = serial;
        self
    }

    /// Get the ADB executable path
    pub fn adb_path(&self) -> &Path {
        &self.adb
    }

    fn command<I, S>(&self, args: I) -> ToolInvocation
    where
        I: IntoIterator<Item = S>,
        S: Into<std::ffi::OsString>,
    {
        let mut inv = ToolInvocation::new("adb", &self.adb);
        if let Some(ref serial) = self.serial {
            inv = inv.args(["-s", serial.as_str()]);
        }
        inv.args(args)
    }

    /// Install an APK, replacing an existing installation
    pub async fn install(&self, apk: &Path) -> Result<(), AdbError> {
        if !apk.exists() && !self.runner.is_dry_run() {
            return Err(AdbError::ApkNotFound(apk.to_path_buf()));
        }
        info!("Installing {:?}", apk);
        self.runner
            .run(&self.command(["install", "-r"]).arg(apk))
            .await?;
        Ok(())
    }

    /// Uninstall a package
    pub async fn uninstall(&self, package: &str) -> Result<(), AdbError> {
        info!("Uninstalling {}", package);
        self.runner.run(&self.command(["uninstall", package])).await?;
        Ok(())
    }

    /// Launch an activity
    pub async fn start_activity(&self, component: &str) -> Result<(), AdbError> {
        info!("Starting {}", component);
        self.runner
            .run(&self.command(["shell", "am", "start", "-n", component]))
            .await?;
        Ok(())
    }

    /// Launch the NativeActivity of `package`
    pub async fn launch_native(&self, package: &str) -> Result<(), AdbError> {
        self.start_activity(&format!("{}/{}", package, NATIVE_ACTIVITY))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawdroid_core::{DryRunner, ProcessRunner};

    #[test]
    fn test_install_uses_replace_flag() {
        let runner = DryRunner::new();
        let dir = tempfile::tempdir().unwrap();
        let apk = dir.path().join("app.apk");
        std::fs::write(&apk, b"PK").unwrap();

        let adb = AdbClient::new(PathBuf::from("/sdk/platform-tools/adb"), &runner);
        tokio_test::block_on(adb.install(&apk)).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool, "adb");
        assert_eq!(calls[0].args_lossy()[..2], ["install", "-r"]);
    }

    #[test]
    fn test_install_missing_apk() {
        let runner = ProcessRunner::new();
        let adb = AdbClient::new(PathBuf::from("/nonexistent/adb"), &runner);
        let err = tokio_test::block_on(adb.install(Path::new("/nonexistent/app.apk"))).unwrap_err();

        assert!(matches!(err, AdbError::ApkNotFound(_)));
    }

    #[test]
    fn test_dry_run_install_without_apk() {
        let runner = DryRunner::new();
        let adb = AdbClient::new(PathBuf::from("adb"), &runner);
        tokio_test::block_on(adb.install(Path::new("/nonexistent/app.apk"))).unwrap();
        assert_eq!(runner.tools(), vec!["adb"]);
    }

    #[test]
    fn test_serial_is_passed_first() {
        let runner = DryRunner::new();
        let adb = AdbClient::new(PathBuf::from("adb"), &runner)
            .with_serial(Some("emulator-5554".into()));
        tokio_test::block_on(adb.launch_native("org.example.app")).unwrap();

        assert_eq!(
            runner.calls()[0].args_lossy(),
            vec![
                "-s",
                "emulator-5554",
                "shell",
                "am",
                "start",
                "-n",
                "org.example.app/android.app.NativeActivity"
            ]
        );
    }

    #[test]
    fn test_failure_is_propagated() {
        let runner = DryRunner::failing_on("adb");
        let adb = AdbClient::new(PathBuf::from("adb"), &runner);
        let err = tokio_test::block_on(adb.uninstall("org.example.app")).unwrap_err();
        assert!(matches!(err, AdbError::Tool(RawdroidError::ToolFailed { .. })));
    }
}
