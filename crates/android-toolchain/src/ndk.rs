//! NDK toolchain lookup
//!
//! Maps an ABI and API level to the clang wrapper and sysroot inside the
//! NDK LLVM prebuilt directory.

use std::path::{Path, PathBuf};

use rawdroid_core::Abi;

use crate::ToolchainError;

/// Detect the host platform tag
pub fn host_tag() -> &'static str {
    if cfg!(windows) {
        "windows-x86_64"
    } else if cfg!(target_os = "macos") {
        "darwin-x86_64"
    } else {
        "linux-x86_64"
    }
}

/// NDK Toolchain for a specific ABI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub abi: Abi,
    pub api_level: u32,
    pub clang: PathBuf,
    pub sysroot: PathBuf,
}

impl Toolchain {
    /// Toolchain paths, without checking that they exist
    pub fn new(prebuilt: &Path, abi: Abi, api_level: u32) -> Self {
        // Clang uses target-api format
        let suffix = if cfg!(windows) { ".cmd" } else { "" };
        let clang_name = format!("{}{}-clang{}", abi.ndk_triple(), api_level, suffix);

        Self {
            abi,
            api_level,
            clang: prebuilt.join("bin").join(clang_name),
            sysroot: prebuilt.join("sysroot"),
        }
    }

    /// Toolchain whose clang wrapper is known to exist
    pub fn locate(prebuilt: &Path, abi: Abi, api_level: u32) -> Result<Self, ToolchainError> {
        let toolchain = Self::new(prebuilt, abi, api_level);
        if !toolchain.clang.exists() {
            return Err(ToolchainError::CompilerNotFound {
                abi: abi.abi_name().to_string(),
                path: toolchain.clang,
            });
        }
        Ok(toolchain)
    }

    /// Android-specific system headers
    pub fn include_dir(&self) -> PathBuf {
        self.sysroot.join("usr").join("include").join("android")
    }

    /// Platform libraries for this ABI and API level
    pub fn lib_dir(&self) -> PathBuf {
        self.sysroot
            .join("usr")
            .join("lib")
            .join(self.abi.sysroot_triple())
            .join(self.api_level.to_string())
    }
}
