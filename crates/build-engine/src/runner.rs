//! Build Runner
//!
//! Coordinates the pipeline: render manifest, clean, compile every ABI,
//! package, and for signed builds re-pack, sign and align. Any failing step
//! ends the run; nothing is retried.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rawdroid_android_toolchain::ToolchainPaths;
use rawdroid_core::ToolRunner;
use rawdroid_emulator_bridge::AdbClient;
use rawdroid_manifest_manager::{ManifestTemplate, TemplateValues};
use tracing::{debug, info, warn};

use crate::apk::ApkAssembler;
use crate::compiler::ClangInvoker;
use crate::signing::{ApkSigner, KeyStore};
use crate::{BuildConfig, BuildError, PackagingMode};

/// Build output
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Package produced by the last step
    pub apk: PathBuf,
    /// One shared library per ABI, in build order
    pub libraries: Vec<PathBuf>,
    /// Was signed
    pub signed: bool,
    /// Package size in bytes, 0 when it was not produced (dry run)
    pub size: u64,
    /// Build duration in seconds
    pub duration_secs: f64,
}

/// What `clean` removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
}

/// Globs matching packages and signature files in the project directory
fn package_patterns(project_dir: &Path) -> Vec<String> {
    let dir = if project_dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        project_dir
    };
    let root = glob::Pattern::escape(&dir.to_string_lossy());
    ["*.apk", "*.apk.idsig"]
        .iter()
        .map(|pattern| Path::new(&root).join(pattern).to_string_lossy().into_owned())
        .collect()
}

/// Delete packages, signature files and the staging tree contents
pub async fn clean(config: &BuildConfig) -> Result<CleanReport, BuildError> {
    let mut report = CleanReport::default();

    for pattern in package_patterns(&config.project_dir) {
        for entry in glob::glob(&pattern)? {
            let path = entry.map_err(glob::GlobError::into_error)?;
            if path.is_file() {
                tokio::fs::remove_file(&path).await?;
                report.removed.push(path);
            }
        }
    }

    let staging = config.output_dir();
    if staging.is_dir() {
        let mut entries = tokio::fs::read_dir(&staging).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                tokio::fs::remove_dir_all(&path).await?;
            } else {
                tokio::fs::remove_file(&path).await?;
            }
            report.removed.push(path);
        }
    }

    debug!("Removed {} paths", report.removed.len());
    Ok(report)
}

/// Build runner that coordinates the build process
pub struct BuildRunner<'a> {
    config: BuildConfig,
    paths: ToolchainPaths,
    runner: &'a dyn ToolRunner,
    serial: Option<String>,
}

impl<'a> BuildRunner<'a> {
    /// Create a new build runner
    pub fn new(config: BuildConfig, paths: ToolchainPaths, runner: &'a dyn ToolRunner) -> Self {
        Self {
            config,
            paths,
            runner,
            serial: None,
        }
    }

    /// Install to this device instead of the default one
    pub fn with_serial(mut self, serial: Option<String>) -> Self {
        self.serial = serial;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn paths(&self) -> &ToolchainPaths {
        &self.paths
    }

    fn keystore(&self) -> Result<KeyStore, BuildError> {
        KeyStore::from_config(self.config.keystore_path(), &self.config.project.signing)
    }

    /// Render `AndroidManifest.xml` from its template
    pub async fn render_manifest(&self) -> Result<(), BuildError> {
        let template = ManifestTemplate::for_manifest(&self.config.manifest_path());
        template
            .render(&TemplateValues::from_app(&self.config.project.app))
            .await?;
        Ok(())
    }

    /// Run the build
    pub async fn build(&self) -> Result<BuildOutput, BuildError> {
        let start = Instant::now();
        info!(
            "Starting {} build of {} for {:?}",
            self.config.mode.as_str(),
            self.config.app_name(),
            self.config.targets()
        );

        // Fail on a missing password before any work is done
        let keystore = match self.config.mode {
            PackagingMode::Signed => Some(self.keystore()?),
            PackagingMode::Direct => None,
        };

        self.render_manifest().await?;
        clean(&self.config).await?;

        let libraries = ClangInvoker::new(&self.config, &self.paths.ndk_prebuilt)
            .compile_all(self.runner)
            .await?;

        let assembler = ApkAssembler::new(&self.config, &self.paths);
        let mut apk = assembler.package(self.runner).await?;

        if let Some(keystore) = keystore {
            let base = self.config.base_apk();
            if self.runner.is_dry_run() && !base.exists() {
                info!("[dry-run] re-pack {:?} into {:?}", base, self.config.unaligned_apk());
            } else {
                assembler.repack()?;
            }

            apk = ApkSigner::new(&self.paths, keystore)
                .sign_and_align(&self.config.unaligned_apk(), &self.config.final_apk(), self.runner)
                .await?;
        }

        let size = tokio::fs::metadata(&apk).await.map(|m| m.len()).unwrap_or(0);
        let duration_secs = start.elapsed().as_secs_f64();
        info!("Build completed in {:.2}s: {:?}", duration_secs, apk);

        Ok(BuildOutput {
            apk,
            libraries,
            signed: self.config.mode == PackagingMode::Signed,
            size,
            duration_secs,
        })
    }

    fn adb(&self) -> Result<AdbClient<'a>, BuildError> {
        Ok(AdbClient::locate(&self.paths.platform_adb(), self.runner)?
            .with_serial(self.serial.clone()))
    }

    /// Install the package on the device
    pub async fn install(&self) -> Result<(), BuildError> {
        if self.config.mode == PackagingMode::Direct {
            warn!("Installing an unsigned package; devices usually reject it");
        }
        self.adb()?.install(&self.config.installable_apk()).await?;
        Ok(())
    }

    /// Remove the app from the device
    pub async fn uninstall(&self) -> Result<(), BuildError> {
        self.adb()?
            .uninstall(&self.config.project.app.package)
            .await?;
        Ok(())
    }

    /// Start the app's NativeActivity
    pub async fn launch(&self) -> Result<(), BuildError> {
        self.adb()?
            .launch_native(&self.config.project.app.package)
            .await?;
        Ok(())
    }
}
