//! NDK compiler invocation
//!
//! Builds one shared library per ABI with the NDK clang wrapper. Each ABI is
//! compiled independently; the only thing they share is the staging tree.

use std::path::{Path, PathBuf};

use rawdroid_android_toolchain::Toolchain;
use rawdroid_core::{Abi, ToolInvocation, ToolRunner};
use tracing::info;

use crate::{BuildConfig, BuildError};

/// Flags shared by every ABI at link time
const LINK_FLAGS: &[&str] = &[
    "-Wl,--gc-sections",
    "-s",
    "-lm",
    "-lGLESv3",
    "-lEGL",
    "-landroid",
    "-llog",
    "-shared",
    "-uANativeActivity_onCreate",
];

/// Invokes the NDK clang for each configured ABI
pub struct ClangInvoker<'a> {
    config: &'a BuildConfig,
    prebuilt: &'a Path,
}

impl<'a> ClangInvoker<'a> {
    pub fn new(config: &'a BuildConfig, prebuilt: &'a Path) -> Self {
        Self { config, prebuilt }
    }

    /// Compile flags, independent of the ABI apart from the sysroot
    fn compile_flags(&self, toolchain: &Toolchain) -> Vec<String> {
        let app = &self.config.project.app;
        let mut flags: Vec<String> = [
            "-ffunction-sections",
            "-Os",
            "-fdata-sections",
            "-Wall",
            "-fvisibility=hidden",
            "-fPIC",
            "-Os",
            "-DANDROID",
        ]
        .iter()
        .map(|f| f.to_string())
        .collect();

        flags.push(format!("-DAPPNAME=\"{}\"", app.name));
        flags.push("-DANDROID_FULLSCREEN".to_string());
        flags.push(format!("-DANDROIDVERSION={}", app.api));

        // The NDK headers come before the last project include dir
        let sysroot = format!("-I{}", toolchain.include_dir().display());
        match self.config.project.build.include_dirs.split_last() {
            Some((last, rest)) => {
                flags.extend(rest.iter().map(|dir| format!("-I{}", dir.display())));
                flags.push(sysroot);
                flags.push(format!("-I{}", last.display()));
            }
            None => flags.push(sysroot),
        }
        flags
    }

    /// Complete flag list for one ABI, without sources and output
    pub fn flags(&self, toolchain: &Toolchain) -> Vec<String> {
        let mut flags = self.compile_flags(toolchain);
        flags.extend(LINK_FLAGS.iter().map(|f| f.to_string()));
        flags.extend(toolchain.abi.arch_flags().iter().map(|f| f.to_string()));
        flags.push(format!("-L{}", toolchain.lib_dir().display()));
        flags
    }

    /// The compiler command for one ABI
    pub fn invocation(&self, toolchain: &Toolchain) -> ToolInvocation {
        ToolInvocation::new("clang", &toolchain.clang)
            .args(self.flags(toolchain))
            .args(self.config.project.build.sources.iter().map(|s| s.as_os_str()))
            .arg("-o")
            .arg(self.config.library_path(toolchain.abi))
            .current_dir(&self.config.project_dir)
    }

    /// Compile the library for one ABI and return its path
    pub async fn compile(&self, abi: Abi, runner: &dyn ToolRunner) -> Result<PathBuf, BuildError> {
        let toolchain = Toolchain::locate(self.prebuilt, abi, self.config.project.app.api)?;
        let output = self.config.library_path(abi);

        tokio::fs::create_dir_all(self.config.lib_dir(abi)).await?;

        info!("Compiling {} for {}", self.config.app_name(), abi);
        runner.run(&self.invocation(&toolchain)).await?;
        Ok(output)
    }

    /// Compile every configured ABI in order, stopping at the first failure
    pub async fn compile_all(&self, runner: &dyn ToolRunner) -> Result<Vec<PathBuf>, BuildError> {
        let mut libraries = Vec::with_capacity(self.config.targets().len());
        for abi in self.config.targets() {
            libraries.push(self.compile(*abi, runner).await?);
        }
        Ok(libraries)
    }
}
