//! CLI commands for rawdroid
//!
//! Each positional step maps to one handler. Steps run left to right and the
//! first failure ends the run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::info;

use rawdroid_android_toolchain::{ToolchainDetector, ToolchainPaths};
use rawdroid_build_engine::signing::{generate_keystore, KeyStore};
use rawdroid_build_engine::{clean, BuildConfig, BuildRunner, PackagingMode};
use rawdroid_core::{DryRunner, ProcessRunner, ProjectConfig, ToolRunner, CONFIG_FILE_NAME};

/// Pipeline step selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Step {
    /// Print the resolved toolchain directories
    Paths,
    /// Render the manifest, compile, package and (signed) sign
    Build,
    /// Delete packages and the staging directory contents
    Clean,
    /// Install the package on the device
    Push,
    /// Generate the signing keystore if missing
    Keystore,
    /// Remove the app from the device
    Uninstall,
    /// Start the app on the device
    Run,
}

impl Step {
    fn needs_toolchain(self) -> bool {
        !matches!(self, Step::Clean | Step::Keystore)
    }
}

/// Options shared by every step
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub project_dir: PathBuf,
    pub config: Option<PathBuf>,
    pub signed: bool,
    pub dry_run: bool,
    pub device: Option<String>,
}

impl Options {
    /// Configuration file, `<project>/rawdroid.toml` unless given
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.project_dir.join(CONFIG_FILE_NAME))
    }
}

/// Steps to run when none are given
pub fn default_steps(mode: PackagingMode) -> Vec<Step> {
    match mode {
        PackagingMode::Direct => vec![Step::Build],
        PackagingMode::Signed => vec![Step::Build, Step::Push],
    }
}

/// Load the project configuration and apply command-line overrides
pub async fn load_config(options: &Options) -> Result<BuildConfig> {
    let path = options.config_path();
    let project = ProjectConfig::load(&path)
        .await
        .with_context(|| format!("Failed to load {}", path.display()))?;

    let mut config = BuildConfig::new(options.project_dir.clone(), project);
    if options.signed {
        config = config.with_mode(PackagingMode::Signed);
    }
    Ok(config)
}

/// Run `steps`, or the default steps for the packaging mode
pub async fn execute(steps: &[Step], options: &Options) -> Result<()> {
    let config = load_config(options).await?;
    let steps = if steps.is_empty() {
        default_steps(config.mode)
    } else {
        steps.to_vec()
    };

    let runner: Box<dyn ToolRunner> = if options.dry_run {
        Box::new(DryRunner::new())
    } else {
        Box::new(ProcessRunner::new())
    };

    let paths = if steps.iter().any(|s| s.needs_toolchain()) {
        Some(
            ToolchainDetector::new()
                .resolve(&config.project.toolchain)
                .context("Failed to resolve the Android toolchain")?,
        )
    } else {
        None
    };

    for step in steps {
        info!("==> {:?}", step);
        run_step(step, &config, paths.as_ref(), runner.as_ref(), options).await?;
    }
    Ok(())
}

async fn run_step(
    step: Step,
    config: &BuildConfig,
    paths: Option<&ToolchainPaths>,
    runner: &dyn ToolRunner,
    options: &Options,
) -> Result<()> {
    match step {
        Step::Clean => {
            let report = clean(config).await.context("Clean failed")?;
            info!("Removed {} paths", report.removed.len());
            return Ok(());
        }
        Step::Keystore => {
            let keystore = KeyStore::from_config(config.keystore_path(), &config.project.signing)?;
            let dname = &config.project.signing.dname;
            if generate_keystore(&keystore, dname, runner)
                .await
                .context("Keystore generation failed")?
            {
                info!("Created {}", keystore.path.display());
            }
            return Ok(());
        }
        _ => {}
    }

    let paths = paths.cloned().context("Android toolchain was not resolved")?;
    let build = BuildRunner::new(config.clone(), paths, runner).with_serial(options.device.clone());

    match step {
        Step::Paths => println!("{}", build.paths()),
        Step::Build => {
            let output = build.build().await.context("Build failed")?;
            info!(
                "Built {} ({} bytes, {} libraries) in {:.2}s",
                output.apk.display(),
                output.size,
                output.libraries.len(),
                output.duration_secs
            );
        }
        Step::Push => build.install().await.context("Install failed")?,
        Step::Uninstall => build.uninstall().await.context("Uninstall failed")?,
        Step::Run => build.launch().await.context("Launch failed")?,
        Step::Clean | Step::Keystore => {}
    }
    Ok(())
}
