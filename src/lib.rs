//! rawdroid - build native C Android apps without Gradle
//!
//! Resolves the SDK and NDK, cross-compiles one shared library per ABI,
//! packages it with `aapt`, and optionally signs, aligns and installs the
//! result.
//!
//! ## Architecture
//!
//! - `rawdroid-core`: configuration, errors and external process execution
//! - `rawdroid-android-toolchain`: SDK/NDK path resolution
//! - `rawdroid-manifest-manager`: AndroidManifest.xml template rendering
//! - `rawdroid-emulator-bridge`: device access through `adb`
//! - `rawdroid-build-engine`: compilation, packaging and signing

#![warn(clippy::all)]

pub mod commands;

pub use rawdroid_android_toolchain as toolchain;
pub use rawdroid_build_engine as build;
pub use rawdroid_core as core;
pub use rawdroid_emulator_bridge as device;
pub use rawdroid_manifest_manager as manifest;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::commands::{execute, Options, Step};
    pub use rawdroid_android_toolchain::{ToolchainDetector, ToolchainPaths};
    pub use rawdroid_build_engine::{BuildConfig, BuildRunner, PackagingMode};
    pub use rawdroid_core::{ProjectConfig, ToolRunner};
}
