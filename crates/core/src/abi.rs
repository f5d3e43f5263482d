//! Target ABIs
//!
//! Every ABI maps to a fixed set of names and instruction-set flags used by
//! the NDK compiler and the APK `lib/` layout.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target ABI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Abi {
    Arm64V8a,
    ArmeabiV7a,
    X86,
    X86_64,
}

impl Abi {
    /// Get the ABI name as used in APK lib directory
    pub fn abi_name(&self) -> &'static str {
        match self {
            Abi::Arm64V8a => "arm64-v8a",
            Abi::ArmeabiV7a => "armeabi-v7a",
            Abi::X86 => "x86",
            Abi::X86_64 => "x86_64",
        }
    }

    /// Prefix of the NDK clang wrapper, e.g. `aarch64-linux-android30-clang`
    pub fn ndk_triple(&self) -> &'static str {
        match self {
            Abi::Arm64V8a => "aarch64-linux-android",
            Abi::ArmeabiV7a => "armv7a-linux-androideabi",
            Abi::X86 => "i686-linux-android",
            Abi::X86_64 => "x86_64-linux-android",
        }
    }

    /// Directory name under `sysroot/usr/lib`
    pub fn sysroot_triple(&self) -> &'static str {
        match self {
            Abi::Arm64V8a => "aarch64-linux-android",
            Abi::ArmeabiV7a => "arm-linux-androideabi",
            Abi::X86 => "i686-linux-android",
            Abi::X86_64 => "x86_64-linux-android",
        }
    }

    /// Instruction-set flags passed to clang
    pub fn arch_flags(&self) -> &'static [&'static str] {
        match self {
            Abi::Arm64V8a => &["-m64"],
            Abi::ArmeabiV7a => &["-mfloat-abi=softfp", "-m32"],
            Abi::X86 => &["-march=i686", "-mtune=intel", "-mssse3", "-mfpmath=sse", "-m32"],
            Abi::X86_64 => &["-march=x86-64", "-msse4.2", "-mpopcnt", "-m64", "-mtune=x86-64"],
        }
    }

    /// Get all supported ABIs
    pub fn all() -> &'static [Abi] {
        &[Abi::Arm64V8a, Abi::ArmeabiV7a, Abi::X86, Abi::X86_64]
    }
}

impl FromStr for Abi {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arm64-v8a" | "aarch64-linux-android" => Ok(Abi::Arm64V8a),
            "armeabi-v7a" | "armv7a-linux-androideabi" => Ok(Abi::ArmeabiV7a),
            "x86" | "i686-linux-android" => Ok(Abi::X86),
            "x86_64" | "x86_64-linux-android" => Ok(Abi::X86_64),
            _ => Err(format!(
                "unknown ABI `{}` (expected one of: arm64-v8a, armeabi-v7a, x86, x86_64)",
                s
            )),
        }
    }
}

impl TryFrom<String> for Abi {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Abi> for String {
    fn from(abi: Abi) -> Self {
        abi.abi_name().to_string()
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abi_name())
    }
}
