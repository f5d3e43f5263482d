//! Android Build Engine
//!
//! Compiles per-ABI shared libraries with the NDK clang, packages them with
//! `aapt`, and optionally re-packs, signs and aligns the result.

pub mod apk;
pub mod compiler;
pub mod config;
pub mod runner;
pub mod signing;

pub use apk::ApkAssembler;
pub use compiler::ClangInvoker;
pub use config::{BuildConfig, PackagingMode};
pub use runner::{clean, BuildOutput, BuildRunner, CleanReport};
pub use signing::ApkSigner;

use rawdroid_android_toolchain::ToolchainError;
use rawdroid_core::RawdroidError;
use rawdroid_emulator_bridge::AdbError;
use rawdroid_manifest_manager::TemplateError;

/// Build errors
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Core(#[from] RawdroidError),
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Device(#[from] AdbError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Cannot walk directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl BuildError {
    /// Exit code the CLI should terminate with
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::Core(e) => e.exit_code(),
            BuildError::Device(AdbError::Tool(e)) => e.exit_code(),
            _ => 1,
        }
    }
}
