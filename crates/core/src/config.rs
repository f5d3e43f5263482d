//! Project Configuration
//!
//! Settings read from `rawdroid.toml`:
//! - application identity used to render the manifest
//! - toolchain glob patterns
//! - build inputs, outputs and target ABIs
//! - signing keystore

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::abi::Abi;
use crate::error::{RawdroidError, Result};
use crate::KEYSTORE_PASSWORD_ENV;

/// Application identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppSection {
    /// Application name, also the shared library name
    pub name: String,
    /// Display label
    pub label: String,
    /// Java package identifier
    pub package: String,
    /// API level the native code is compiled against
    pub api: u32,
    /// Target SDK version written into the manifest
    pub target_api: u32,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "rawdrawandroid".to_string(),
            label: "Rawdraw Android".to_string(),
            package: "org.vatrolin.rawdrawandroid".to_string(),
            api: 30,
            target_api: 30,
        }
    }
}

/// Toolchain glob patterns
///
/// Patterns may start with `~` and may reference `{sdk}`, `{ndk}` and
/// `{host}`, which are substituted with paths resolved earlier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolchainSection {
    pub sdk: String,
    pub ndk: String,
    pub build_tools: String,
    pub prebuilt: String,
}

impl Default for ToolchainSection {
    fn default() -> Self {
        Self {
            sdk: "~/Android/Sdk".to_string(),
            ndk: "{sdk}/ndk/23*".to_string(),
            build_tools: "{sdk}/build-tools/*".to_string(),
            prebuilt: "{ndk}/toolchains/llvm/prebuilt/{host}".to_string(),
        }
    }
}

/// Build inputs and outputs, relative to the project directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildSection {
    /// Target ABIs, built in this order
    pub targets: Vec<Abi>,
    /// C sources handed to the compiler
    pub sources: Vec<PathBuf>,
    /// Extra include directories
    pub include_dirs: Vec<PathBuf>,
    /// Rendered manifest; the template is the same path with `.template` appended
    pub manifest: PathBuf,
    /// Android resource directory
    pub resources: PathBuf,
    /// Asset directory copied into the package
    pub assets: PathBuf,
    /// Staging directory for libraries and assets
    pub output_dir: PathBuf,
    /// Repack, sign and align the package
    pub signed: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            targets: vec![Abi::X86_64],
            sources: vec![
                PathBuf::from("test.c"),
                PathBuf::from("android_native_app_glue.c"),
            ],
            include_dirs: vec![PathBuf::from("./rawdraw"), PathBuf::from(".")],
            manifest: PathBuf::from("AndroidManifest.xml"),
            resources: PathBuf::from("Sources/res"),
            assets: PathBuf::from("Sources/assets"),
            output_dir: PathBuf::from("makecapk"),
            signed: false,
        }
    }
}

/// Signing keystore
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SigningSection {
    pub keystore: PathBuf,
    pub alias: String,
    /// Prefer the environment variable; kept for local throwaway keystores
    pub password: Option<String>,
    /// Distinguished name used when generating the keystore
    pub dname: String,
}

impl Default for SigningSection {
    fn default() -> Self {
        Self {
            keystore: PathBuf::from("my-release-key.keystore"),
            alias: "standkey".to_string(),
            password: None,
            dname: "CN=example.com, OU=ID, O=Example, L=Doe, S=John, C=GB".to_string(),
        }
    }
}

impl SigningSection {
    /// Keystore password from the environment, falling back to the config file
    pub fn resolve_password(&self) -> Result<String> {
        self.resolve_password_with(std::env::var(KEYSTORE_PASSWORD_ENV).ok())
    }

    fn resolve_password_with(&self, from_env: Option<String>) -> Result<String> {
        from_env
            .filter(|p| !p.is_empty())
            .or_else(|| self.password.clone())
            .ok_or_else(|| {
                RawdroidError::Config(format!(
                    "no keystore password: set {} or signing.password",
                    KEYSTORE_PASSWORD_ENV
                ))
            })
    }
}

/// Complete project configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    pub app: AppSection,
    pub toolchain: ToolchainSection,
    pub build: BuildSection,
    pub signing: SigningSection,
}

impl ProjectConfig {
    /// Load configuration from file, using defaults when it does not exist
    pub async fn load(path: &Path) -> Result<Self> {
        if tokio::fs::try_exists(path).await? {
            debug!("Loading config from {:?}", path);
            let contents = tokio::fs::read_to_string(path).await?;
            Self::from_toml(&contents)
        } else {
            info!("No {:?}, using default configuration", path);
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.app.name.is_empty() {
            return Err(RawdroidError::Config("app.name must not be empty".into()));
        }
        if self.build.targets.is_empty() {
            return Err(RawdroidError::Config("build.targets must list at least one ABI".into()));
        }
        if self.build.sources.is_empty() {
            return Err(RawdroidError::Config("build.sources must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProjectConfig::default();
        assert_eq!(config.app.name, "rawdrawandroid");
        assert_eq!(config.app.package, "org.vatrolin.rawdrawandroid");
        assert_eq!(config.build.targets, vec![Abi::X86_64]);
        assert!(!config.build.signed);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ProjectConfig::from_toml(
            r#"
            [app]
            name = "cube"
            api = 29

            [build]
            targets = ["arm64-v8a", "x86"]
            signed = true
            "#,
        )
        .unwrap();

        assert_eq!(config.app.name, "cube");
        assert_eq!(config.app.api, 29);
        assert_eq!(config.app.label, "Rawdraw Android");
        assert_eq!(config.build.targets, vec![Abi::Arm64V8a, Abi::X86]);
        assert!(config.build.signed);
        assert_eq!(config.toolchain.ndk, "{sdk}/ndk/23*");
    }

    #[test]
    fn test_unknown_abi_rejected() {
        let err = ProjectConfig::from_toml("[build]\ntargets = [\"mips\"]\n").unwrap_err();
        assert!(matches!(err, RawdroidError::TomlParse(_)));
    }

    #[test]
    fn test_empty_targets_rejected() {
        let err = ProjectConfig::from_toml("[build]\ntargets = []\n").unwrap_err();
        assert!(matches!(err, RawdroidError::Config(_)));
    }

    #[test]
    fn test_password_prefers_environment() {
        let signing = SigningSection {
            password: Some("from-file".into()),
            ..Default::default()
        };
        assert_eq!(signing.resolve_password_with(Some("from-env".into())).unwrap(), "from-env");
        assert_eq!(signing.resolve_password_with(None).unwrap(), "from-file");
        assert_eq!(signing.resolve_password_with(Some(String::new())).unwrap(), "from-file");
    }

    #[test]
    fn test_missing_password_is_config_error() {
        let signing = SigningSection::default();
        let err = signing.resolve_password_with(None).unwrap_err();
        assert!(matches!(err, RawdroidError::Config(_)));
    }

    #[tokio::test]
    async fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::load(&dir.path().join("rawdroid.toml")).await.unwrap();
        assert_eq!(config, ProjectConfig::default());
    }
}
