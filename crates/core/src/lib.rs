//! rawdroid core - configuration and shared types
//!
//! This crate holds what every stage of the build pipeline needs: the project
//! configuration loaded from `rawdroid.toml`, the target ABI table, the shared
//! error type and the external process runner.

pub mod abi;
pub mod config;
pub mod error;
pub mod process;

pub use abi::Abi;
pub use config::{AppSection, BuildSection, ProjectConfig, SigningSection, ToolchainSection};
pub use error::{RawdroidError, Result};
pub use process::{find_tool, DryRunner, ProcessRunner, ToolInvocation, ToolRunner};

/// rawdroid version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file name, looked up in the project directory
pub const CONFIG_FILE_NAME: &str = "rawdroid.toml";

/// Environment variable carrying the keystore password
pub const KEYSTORE_PASSWORD_ENV: &str = "RAWDROID_KEYSTORE_PASSWORD";
