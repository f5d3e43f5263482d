//! Manifest Template
//!
//! Replaces every `${NAME}` placeholder in a template with its configured
//! value. Values are XML-escaped, since they land in attribute values.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use indexmap::IndexMap;
use rawdroid_core::AppSection;
use regex::Regex;
use tracing::{debug, info};

use crate::TEMPLATE_SUFFIX;

/// Template errors
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("No value for placeholder ${{{name}}}")]
    MissingValue { name: String },
    #[error("Cannot read template {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder regex is valid"))
}

/// Placeholder values, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateValues {
    values: IndexMap<String, String>,
}

impl TemplateValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values for the standard manifest placeholders
    pub fn from_app(app: &AppSection) -> Self {
        let mut values = Self::new();
        values.insert("APPNAME", &app.name);
        values.insert("LABEL", &app.label);
        values.insert("PACKAGENAME", &app.package);
        values.insert("ANDROIDVERSION", app.api.to_string());
        values.insert("ANDROIDTARGET", app.target_api.to_string());
        values
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Substitute every placeholder in `template`
    pub fn render(&self, template: &str) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for caps in placeholder_regex().captures_iter(template) {
            let whole = caps.get(0).expect("group 0 always matches");
            let name = &caps[1];
            let value = self.get(name).ok_or_else(|| TemplateError::MissingValue {
                name: name.to_string(),
            })?;

            out.push_str(&template[last..whole.start()]);
            out.push_str(&quick_xml::escape::escape(value));
            last = whole.end();
        }

        out.push_str(&template[last..]);
        Ok(out)
    }
}

/// A manifest and its `.template` source
#[derive(Debug, Clone)]
pub struct ManifestTemplate {
    template: PathBuf,
    output: PathBuf,
}

impl ManifestTemplate {
    /// Template for `manifest`, read from `manifest` + `.template`
    pub fn for_manifest(manifest: &Path) -> Self {
        let mut template = manifest.as_os_str().to_owned();
        template.push(TEMPLATE_SUFFIX);
        Self {
            template: PathBuf::from(template),
            output: manifest.to_path_buf(),
        }
    }

    pub fn template_path(&self) -> &Path {
        &self.template
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Render the template and write the manifest
    ///
    /// Nothing is written when a placeholder has no value.
    pub async fn render(&self, values: &TemplateValues) -> Result<(), TemplateError> {
        let text = tokio::fs::read_to_string(&self.template)
            .await
            .map_err(|source| TemplateError::Read {
                path: self.template.clone(),
                source,
            })?;

        let rendered = values.render(&text)?;
        debug!("Rendered {} bytes from {:?}", rendered.len(), self.template);

        tokio::fs::write(&self.output, rendered)
            .await
            .map_err(|source| TemplateError::Write {
                path: self.output.clone(),
                source,
            })?;

        info!("Wrote {:?}", self.output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="${PACKAGENAME}">
    <uses-sdk android:minSdkVersion="${ANDROIDVERSION}" android:targetSdkVersion="${ANDROIDTARGET}" />
    <application android:label="${LABEL}" android:hasCode="false">
        <activity android:name="android.app.NativeActivity">
            <meta-data android:name="android.app.lib_name" android:value="${APPNAME}" />
        </activity>
    </application>
</manifest>
"#;

    #[test]
    fn test_render_substitutes_all_placeholders() {
        let values = TemplateValues::from_app(&AppSection::default());
        let rendered = values.render(MANIFEST).unwrap();

        assert!(rendered.contains(r#"package="org.vatrolin.rawdrawandroid""#));
        assert!(rendered.contains(r#"android:targetSdkVersion="30""#));
        assert!(rendered.contains(r#"android:label="Rawdraw Android""#));
        assert!(rendered.contains(r#"android:value="rawdrawandroid""#));
        assert!(!rendered.contains("${"));
    }

    #[test]
    fn test_missing_placeholder_names_key() {
        let values = TemplateValues::from_app(&AppSection::default());
        let err = values.render("<x a=\"${APPNAME}\" b=\"${ICON}\"/>").unwrap_err();

        match err {
            TemplateError::MissingValue { name } => assert_eq!(name, "ICON"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_values_are_xml_escaped() {
        let mut values = TemplateValues::new();
        values.insert("LABEL", "Tom & Jerry");
        assert_eq!(values.render("${LABEL}").unwrap(), "Tom &amp; Jerry");
    }

    #[test]
    fn test_text_without_placeholders_is_unchanged() {
        let values = TemplateValues::new();
        assert_eq!(values.render("$ {A} $A {A}").unwrap(), "$ {A} $A {A}");
    }

    #[tokio::test]
    async fn test_render_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("AndroidManifest.xml");
        std::fs::write(dir.path().join("AndroidManifest.xml.template"), MANIFEST).unwrap();

        let template = ManifestTemplate::for_manifest(&manifest);
        let values = TemplateValues::from_app(&AppSection::default());

        template.render(&values).await.unwrap();
        let first = std::fs::read(&manifest).unwrap();
        template.render(&values).await.unwrap();
        let second = std::fs::read(&manifest).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failed_render_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("AndroidManifest.xml");
        std::fs::write(dir.path().join("AndroidManifest.xml.template"), "${NOPE}").unwrap();

        let err = ManifestTemplate::for_manifest(&manifest)
            .render(&TemplateValues::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TemplateError::MissingValue { .. }));
        assert!(!manifest.exists());
    }

    #[tokio::test]
    async fn test_missing_template_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ManifestTemplate::for_manifest(&dir.path().join("AndroidManifest.xml"))
            .render(&TemplateValues::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TemplateError::Read { .. }));
    }
}
