//! Build Configuration
//!
//! Binds a [`ProjectConfig`] to a project directory and derives every input
//! and output path of the pipeline from it.

use std::path::{Path, PathBuf};

use rawdroid_core::{Abi, ProjectConfig};

/// How the final package is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackagingMode {
    /// Libraries are staged next to the base package, which is not signed
    #[default]
    Direct,
    /// Base package is re-packed with the libraries, signed and aligned
    Signed,
}

impl PackagingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackagingMode::Direct => "direct",
            PackagingMode::Signed => "signed",
        }
    }
}

/// Build configuration
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root directory
    pub project_dir: PathBuf,
    /// Settings from `rawdroid.toml`
    pub project: ProjectConfig,
    /// Packaging strategy
    pub mode: PackagingMode,
}

impl BuildConfig {
    pub fn new(project_dir: PathBuf, project: ProjectConfig) -> Self {
        let mode = if project.build.signed {
            PackagingMode::Signed
        } else {
            PackagingMode::Direct
        };
        Self {
            project_dir,
            project,
            mode,
        }
    }

    pub fn with_mode(mut self, mode: PackagingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Resolve a project-relative path
    pub fn path(&self, relative: &Path) -> PathBuf {
        self.project_dir.join(relative)
    }

    pub fn app_name(&self) -> &str {
        &self.project.app.name
    }

    pub fn targets(&self) -> &[Abi] {
        &self.project.build.targets
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path(&self.project.build.manifest)
    }

    pub fn resources_dir(&self) -> PathBuf {
        self.path(&self.project.build.resources)
    }

    /// Source asset directory
    pub fn assets_dir(&self) -> PathBuf {
        self.path(&self.project.build.assets)
    }

    /// Staging directory (`makecapk/`)
    pub fn output_dir(&self) -> PathBuf {
        self.path(&self.project.build.output_dir)
    }

    /// Staged asset directory handed to `aapt`
    pub fn staged_assets_dir(&self) -> PathBuf {
        self.output_dir().join("assets")
    }

    /// Directory receiving the library of one ABI
    pub fn lib_dir(&self, abi: Abi) -> PathBuf {
        self.output_dir().join("lib").join(abi.abi_name())
    }

    /// Shared library produced for one ABI
    pub fn library_path(&self, abi: Abi) -> PathBuf {
        self.lib_dir(abi).join(format!("lib{}.so", self.app_name()))
    }

    /// Package written by `aapt`
    pub fn base_apk(&self) -> PathBuf {
        self.project_dir.join("temp.apk")
    }

    /// Re-packed package, before alignment
    pub fn unaligned_apk(&self) -> PathBuf {
        let mut name = self.project.build.output_dir.as_os_str().to_owned();
        name.push(".apk");
        self.project_dir.join(name)
    }

    /// Signed and aligned package
    pub fn final_apk(&self) -> PathBuf {
        self.project_dir.join(format!("{}.apk", self.app_name()))
    }

    /// Package installed by `push`
    pub fn installable_apk(&self) -> PathBuf {
        match self.mode {
            PackagingMode::Direct => self.base_apk(),
            PackagingMode::Signed => self.final_apk(),
        }
    }

    pub fn keystore_path(&self) -> PathBuf {
        self.path(&self.project.signing.keystore)
    }
}
