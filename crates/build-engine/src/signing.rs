//! APK Signing
//!
//! Legacy JAR signing with `jarsigner`, 4-byte alignment with `zipalign`,
//! then APK Signature Scheme signing with `apksigner`, which newer platform
//! versions require.

use std::path::{Path, PathBuf};

use rawdroid_android_toolchain::ToolchainPaths;
use rawdroid_core::{SigningSection, ToolInvocation, ToolRunner};
use tracing::info;

use crate::BuildError;

/// Keystore password and key alias used for every signer
#[derive(Clone)]
pub struct KeyStore {
    /// Path to keystore file
    pub path: PathBuf,
    /// Key alias
    pub alias: String,
    password: String,
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("path", &self.path)
            .field("alias", &self.alias)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl KeyStore {
    pub fn new(path: PathBuf, alias: &str, password: String) -> Self {
        Self {
            path,
            alias: alias.to_string(),
            password,
        }
    }

    /// Keystore from configuration; the password must be available
    pub fn from_config(path: PathBuf, signing: &SigningSection) -> Result<Self, BuildError> {
        let password = signing.resolve_password()?;
        Ok(Self::new(path, &signing.alias, password))
    }

    /// Check if keystore exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// JDK tool, preferring `$JAVA_HOME/bin`
fn java_tool(name: &str) -> PathBuf {
    let exe = if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    };
    if let Some(home) = std::env::var_os("JAVA_HOME") {
        let candidate = PathBuf::from(home).join("bin").join(&exe);
        if candidate.exists() {
            return candidate;
        }
    }
    PathBuf::from(exe)
}

/// APK Signer
pub struct ApkSigner<'a> {
    paths: &'a ToolchainPaths,
    keystore: KeyStore,
}

impl<'a> ApkSigner<'a> {
    pub fn new(paths: &'a ToolchainPaths, keystore: KeyStore) -> Self {
        Self { paths, keystore }
    }

    /// `jarsigner` over the unaligned package
    pub fn jarsigner_invocation(&self, apk: &Path) -> ToolInvocation {
        ToolInvocation::new("jarsigner", java_tool("jarsigner"))
            .args(["-sigalg", "SHA1withRSA", "-digestalg", "SHA1", "-verbose", "-keystore"])
            .arg(&self.keystore.path)
            .arg("-storepass")
            .arg(&self.keystore.password)
            .arg(apk)
            .arg(&self.keystore.alias)
    }

    /// `zipalign` from the unaligned package into the final one
    pub fn zipalign_invocation(&self, input: &Path, output: &Path) -> ToolInvocation {
        ToolInvocation::new("zipalign", self.paths.zipalign())
            .args(["-v", "4"])
            .arg(input)
            .arg(output)
    }

    /// `apksigner` over the aligned package, in place
    pub fn apksigner_invocation(&self, apk: &Path) -> ToolInvocation {
        ToolInvocation::new("apksigner", self.paths.apksigner())
            .arg("sign")
            .arg("--key-pass")
            .arg(format!("pass:{}", self.keystore.password))
            .arg("--ks-pass")
            .arg(format!("pass:{}", self.keystore.password))
            .arg("--ks")
            .arg(&self.keystore.path)
            .arg(apk)
    }

    /// Sign, align and re-sign `unaligned` into `output`
    pub async fn sign_and_align(
        &self,
        unaligned: &Path,
        output: &Path,
        runner: &dyn ToolRunner,
    ) -> Result<PathBuf, BuildError> {
        if !self.keystore.exists() {
            return Err(rawdroid_core::RawdroidError::Config(format!(
                "keystore {:?} not found; run `rawdroid keystore` first",
                self.keystore.path
            ))
            .into());
        }

        info!("Signing {:?}", unaligned);
        runner.run(&self.jarsigner_invocation(unaligned)).await?;

        if tokio::fs::try_exists(output).await? {
            tokio::fs::remove_file(output).await?;
        }
        runner.run(&self.zipalign_invocation(unaligned, output)).await?;

        runner.run(&self.apksigner_invocation(output)).await?;
        info!("APK signed successfully: {:?}", output);
        Ok(output.to_path_buf())
    }
}

/// `keytool` command generating a new signing keystore
pub fn keystore_invocation(keystore: &KeyStore, dname: &str) -> ToolInvocation {
    ToolInvocation::new("keytool", java_tool("keytool"))
        .args(["-genkey", "-v", "-keystore"])
        .arg(&keystore.path)
        .arg("-alias")
        .arg(&keystore.alias)
        .args(["-keyalg", "RSA", "-keysize", "2048", "-validity", "10000"])
        .arg("-storepass")
        .arg(&keystore.password)
        .arg("-keypass")
        .arg(&keystore.password)
        .arg("-dname")
        .arg(dname)
}

/// Generate a new keystore unless one already exists
pub async fn generate_keystore(
    keystore: &KeyStore,
    dname: &str,
    runner: &dyn ToolRunner,
) -> Result<bool, BuildError> {
    if keystore.exists() {
        info!("Keystore {:?} already exists", keystore.path);
        return Ok(false);
    }

    info!("Generating keystore: {:?}", keystore.path);
    runner.run(&keystore_invocation(keystore, dname)).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawdroid_core::DryRunner;

    fn paths() -> ToolchainPaths {
        ToolchainPaths {
            sdk: PathBuf::from("/sdk"),
            ndk: PathBuf::from("/sdk/ndk/23.1"),
            build_tools: PathBuf::from("/sdk/build-tools/30.0.3"),
            ndk_prebuilt: PathBuf::from("/sdk/ndk/23.1/prebuilt"),
        }
    }

    #[test]
    fn test_keystore_debug_hides_password() {
        let ks = KeyStore::new(PathBuf::from("release.keystore"), "standkey", "hunter2".into());
        let shown = format!("{:?}", ks);
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("standkey"));
    }

    #[test]
    fn test_jarsigner_arguments() {
        let paths = paths();
        let ks = KeyStore::new(PathBuf::from("/proj/my.keystore"), "standkey", "secret".into());
        let inv = ApkSigner::new(&paths, ks).jarsigner_invocation(Path::new("/proj/makecapk.apk"));

        assert_eq!(
            inv.args_lossy(),
            vec![
                "-sigalg",
                "SHA1withRSA",
                "-digestalg",
                "SHA1",
                "-verbose",
                "-keystore",
                "/proj/my.keystore",
                "-storepass",
                "secret",
                "/proj/makecapk.apk",
                "standkey",
            ]
        );
    }

    #[test]
    fn test_apksigner_arguments() {
        let paths = paths();
        let ks = KeyStore::new(PathBuf::from("/proj/my.keystore"), "standkey", "secret".into());
        let inv = ApkSigner::new(&paths, ks).apksigner_invocation(Path::new("/proj/app.apk"));

        assert_eq!(inv.tool, "apksigner");
        assert_eq!(
            inv.args_lossy(),
            vec![
                "sign",
                "--key-pass",
                "pass:secret",
                "--ks-pass",
                "pass:secret",
                "--ks",
                "/proj/my.keystore",
                "/proj/app.apk",
            ]
        );
    }

    #[tokio::test]
    async fn test_sign_order_and_stale_output_removed() {
        let dir = tempfile::tempdir().unwrap();
        let keystore = dir.path().join("my.keystore");
        let output = dir.path().join("app.apk");
        std::fs::write(&keystore, b"ks").unwrap();
        std::fs::write(&output, b"stale").unwrap();

        let paths = paths();
        let runner = DryRunner::new();
        let signer = ApkSigner::new(&paths, KeyStore::new(keystore, "standkey", "pw".into()));
        signer
            .sign_and_align(&dir.path().join("makecapk.apk"), &output, &runner)
            .await
            .unwrap();

        assert_eq!(runner.tools(), vec!["jarsigner", "zipalign", "apksigner"]);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_failed_jarsigner_stops_alignment() {
        let dir = tempfile::tempdir().unwrap();
        let keystore = dir.path().join("my.keystore");
        std::fs::write(&keystore, b"ks").unwrap();

        let paths = paths();
        let runner = DryRunner::failing_on("jarsigner");
        let signer = ApkSigner::new(&paths, KeyStore::new(keystore, "standkey", "pw".into()));
        let err = signer
            .sign_and_align(&dir.path().join("makecapk.apk"), &dir.path().join("app.apk"), &runner)
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert_eq!(runner.tools(), vec!["jarsigner"]);
    }

    #[tokio::test]
    async fn test_missing_keystore_runs_nothing() {
        let paths = paths();
        let runner = DryRunner::new();
        let signer = ApkSigner::new(
            &paths,
            KeyStore::new(PathBuf::from("/nonexistent/my.keystore"), "standkey", "pw".into()),
        );
        let err = signer
            .sign_and_align(Path::new("makecapk.apk"), Path::new("app.apk"), &runner)
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::Core(_)));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generate_keystore_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my.keystore");
        let runner = DryRunner::new();
        let ks = KeyStore::new(path.clone(), "standkey", "pw".into());

        assert!(generate_keystore(&ks, "CN=test", &runner).await.unwrap());
        assert_eq!(runner.tools(), vec!["keytool"]);

        std::fs::write(&path, b"ks").unwrap();
        assert!(!generate_keystore(&ks, "CN=test", &runner).await.unwrap());
        assert_eq!(runner.calls().len(), 1);
    }
}
