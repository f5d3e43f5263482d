//! Toolchain Detection
//!
//! Resolves the SDK, NDK, build-tools and NDK prebuilt directories from the
//! configured glob patterns, each one possibly built on the previous.

use std::fmt;
use std::path::PathBuf;

use rawdroid_core::ToolchainSection;
use tracing::info;

use crate::ndk::host_tag;
use crate::paths::PathResolver;
use crate::ToolchainError;

/// Resolved toolchain directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainPaths {
    pub sdk: PathBuf,
    pub ndk: PathBuf,
    pub build_tools: PathBuf,
    pub ndk_prebuilt: PathBuf,
}

impl ToolchainPaths {
    fn build_tool(&self, name: &str, windows_ext: &str) -> PathBuf {
        if cfg!(windows) {
            self.build_tools.join(format!("{}{}", name, windows_ext))
        } else {
            self.build_tools.join(name)
        }
    }

    /// `aapt` packaging tool
    pub fn aapt(&self) -> PathBuf {
        self.build_tool("aapt", ".exe")
    }

    /// `zipalign`
    pub fn zipalign(&self) -> PathBuf {
        self.build_tool("zipalign", ".exe")
    }

    /// `apksigner`
    pub fn apksigner(&self) -> PathBuf {
        self.build_tool("apksigner", ".bat")
    }

    /// Framework jar for an API level
    pub fn android_jar(&self, api: u32) -> PathBuf {
        self.sdk
            .join("platforms")
            .join(format!("android-{}", api))
            .join("android.jar")
    }

    /// `adb` inside the SDK, used when none is on `PATH`
    pub fn platform_adb(&self) -> PathBuf {
        let name = if cfg!(windows) { "adb.exe" } else { "adb" };
        self.sdk.join("platform-tools").join(name)
    }
}

impl fmt::Display for ToolchainPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ANDROID_SDK_PATH: {:?}", self.sdk)?;
        writeln!(f, "ANDROID_SDK_TOOLS_PATH: {:?}", self.build_tools)?;
        writeln!(f, "ANDROID_NDK_PATH: {:?}", self.ndk)?;
        write!(f, "ANDROID_NDK_TOOLS_PATH: {:?}", self.ndk_prebuilt)
    }
}

/// Toolchain detector
pub struct ToolchainDetector {
    resolver: PathResolver,
}

impl Default for ToolchainDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolchainDetector {
    pub fn new() -> Self {
        Self::with_resolver(PathResolver::new())
    }

    pub fn with_resolver(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// Resolve every toolchain directory, in dependency order
    pub fn resolve(mut self, patterns: &ToolchainSection) -> Result<ToolchainPaths, ToolchainError> {
        self.resolver.define("host", host_tag());

        let sdk = self.resolver.resolve(&patterns.sdk)?;
        self.resolver.define("sdk", &sdk);

        let ndk = self.resolver.resolve(&patterns.ndk)?;
        self.resolver.define("ndk", &ndk);

        let build_tools = self.resolver.resolve(&patterns.build_tools)?;
        let ndk_prebuilt = self.resolver.resolve(&patterns.prebuilt)?;

        info!("Using Android SDK at {:?}", sdk);
        info!("Using Android NDK at {:?}", ndk);

        Ok(ToolchainPaths {
            sdk,
            ndk,
            build_tools,
            ndk_prebuilt,
        })
    }
}
