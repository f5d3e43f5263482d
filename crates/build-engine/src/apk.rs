//! APK Assembly
//!
//! Stages assets, runs `aapt package`, and for signed builds unpacks the base
//! package into the staging tree and re-packs it together with the native
//! libraries.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use rawdroid_android_toolchain::ToolchainPaths;
use rawdroid_core::{ToolInvocation, ToolRunner};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::{BuildConfig, BuildError};

/// Entries that must stay uncompressed in the package
const STORED_ENTRIES: &[&str] = &["resources.arsc", "AndroidManifest.xml"];

/// Copy a directory tree, creating `to` as needed; returns the number of files
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize, BuildError> {
    let mut copied = 0;
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Archive name of a staged file, always `/`-separated
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Zip `dir` into `output`, in sorted path order
pub fn pack_dir(dir: &Path, output: &Path) -> Result<usize, BuildError> {
    let mut zip = ZipWriter::new(File::create(output)?);
    let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = FileOptions::default().compression_method(CompressionMethod::Stored);

    let mut entries = 0;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let name = entry_name(relative);

        let options = if STORED_ENTRIES.contains(&name.as_str()) {
            stored
        } else {
            deflated
        };
        debug!("Adding {}", name);
        zip.start_file(name, options)?;
        io::copy(&mut File::open(entry.path())?, &mut zip)?;
        entries += 1;
    }

    zip.finish()?;
    Ok(entries)
}

/// Package assembler
pub struct ApkAssembler<'a> {
    config: &'a BuildConfig,
    paths: &'a ToolchainPaths,
}

impl<'a> ApkAssembler<'a> {
    pub fn new(config: &'a BuildConfig, paths: &'a ToolchainPaths) -> Self {
        Self { config, paths }
    }

    /// Copy the source assets into the staging tree
    pub async fn stage_assets(&self) -> Result<usize, BuildError> {
        let from = self.config.assets_dir();
        let to = self.config.staged_assets_dir();
        tokio::fs::create_dir_all(&to).await?;

        if !from.is_dir() {
            warn!("Asset directory {:?} not found, packaging without assets", from);
            return Ok(0);
        }

        let copied = copy_tree(&from, &to)?;
        info!("Staged {} asset files", copied);
        Ok(copied)
    }

    /// The `aapt package` command
    pub fn package_invocation(&self) -> ToolInvocation {
        let app = &self.config.project.app;
        ToolInvocation::new("aapt", self.paths.aapt())
            .args(["package", "-f", "-F"])
            .arg(self.config.base_apk())
            .arg("-I")
            .arg(self.paths.android_jar(app.api))
            .arg("-M")
            .arg(self.config.manifest_path())
            .arg("-S")
            .arg(self.config.resources_dir())
            .arg("-A")
            .arg(self.config.staged_assets_dir())
            .arg("-v")
            .arg("--target-sdk-version")
            .arg(app.target_api.to_string())
            .current_dir(&self.config.project_dir)
    }

    /// Stage assets and build the base package
    pub async fn package(&self, runner: &dyn ToolRunner) -> Result<PathBuf, BuildError> {
        self.stage_assets().await?;
        info!("Packaging {:?}", self.config.base_apk());
        runner.run(&self.package_invocation()).await?;
        Ok(self.config.base_apk())
    }

    /// Unpack the base package into the staging tree and zip the whole tree
    pub fn repack(&self) -> Result<PathBuf, BuildError> {
        let staging = self.config.output_dir();
        let base = self.config.base_apk();
        let output = self.config.unaligned_apk();

        info!("Unpacking {:?} into {:?}", base, staging);
        let mut archive = ZipArchive::new(File::open(&base)?)?;
        archive.extract(&staging)?;

        if output.exists() {
            std::fs::remove_file(&output)?;
        }
        let entries = pack_dir(&staging, &output)?;
        info!("Re-packed {} entries into {:?}", entries, output);
        Ok(output)
    }
}
