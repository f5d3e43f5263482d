//! Android Toolchain Resolution
//!
//! Locates, without hard-coding version numbers:
//! - Android SDK root and build-tools
//! - Android NDK and its LLVM prebuilt directory
//! - the per-ABI clang wrapper

pub mod detector;
pub mod ndk;
pub mod paths;

pub use detector::{ToolchainDetector, ToolchainPaths};
pub use ndk::{host_tag, Toolchain};
pub use paths::{expand_home, resolve, PathResolver};

/// Toolchain resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    #[error("No path matches `{pattern}`")]
    NoMatch { pattern: String },
    #[error("Invalid glob pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("Cannot determine the home directory")]
    NoHomeDir,
    #[error("Compiler for {abi} not found: {path}")]
    CompilerNotFound { abi: String, path: std::path::PathBuf },
}
