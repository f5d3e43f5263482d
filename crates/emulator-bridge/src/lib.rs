//! Android Device Bridge
//!
//! Installs, launches and removes the packaged app on the default device or
//! emulator through `adb`.

pub mod adb;

pub use adb::{AdbClient, AdbError, NATIVE_ACTIVITY};
