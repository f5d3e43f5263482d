//! Android Manifest Manager
//!
//! Renders `AndroidManifest.xml` from a `${NAME}` template.

pub mod template;

pub use template::{ManifestTemplate, TemplateError, TemplateValues};

/// Suffix appended to the manifest path to find its template
pub const TEMPLATE_SUFFIX: &str = ".template";
