//! Path Resolver
//!
//! Expands home-relative glob patterns such as `~/Android/Sdk/ndk/23*` and
//! returns the first match in glob order.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::ToolchainError;

/// Replace a leading `~` with `home`
pub fn expand_home(pattern: &str, home: Option<&Path>) -> Result<String, ToolchainError> {
    let rest = match pattern.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return Ok(pattern.to_string()),
    };

    let home = home.ok_or(ToolchainError::NoHomeDir)?;
    Ok(format!("{}{}", glob::Pattern::escape(&home.to_string_lossy()), rest))
}

/// Resolve a pattern against the current user's home directory
pub fn resolve(pattern: &str) -> Result<PathBuf, ToolchainError> {
    PathResolver::new().resolve(pattern)
}

/// Glob resolver with `{name}` substitution
#[derive(Debug, Clone)]
pub struct PathResolver {
    home: Option<PathBuf>,
    vars: Vec<(String, String)>,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PathResolver {
    /// Create a resolver for the current user
    pub fn new() -> Self {
        Self::with_home(dirs::home_dir())
    }

    /// Create a resolver with an explicit home directory
    pub fn with_home(home: Option<PathBuf>) -> Self {
        Self {
            home,
            vars: Vec::new(),
        }
    }

    /// Make `{name}` expand to `value` in later patterns
    pub fn define(&mut self, name: &str, value: impl AsRef<Path>) {
        let value = glob::Pattern::escape(&value.as_ref().to_string_lossy());
        self.vars.retain(|(n, _)| n != name);
        self.vars.push((name.to_string(), value));
    }

    /// Pattern after `{name}` and `~` expansion
    pub fn expand(&self, pattern: &str) -> Result<String, ToolchainError> {
        let mut expanded = expand_home(pattern, self.home.as_deref())?;
        for (name, value) in &self.vars {
            expanded = expanded.replace(&format!("{{{}}}", name), value);
        }
        Ok(expanded)
    }

    /// All matches of a pattern, in glob order
    pub fn matches(&self, pattern: &str) -> Result<Vec<PathBuf>, ToolchainError> {
        let expanded = self.expand(pattern)?;
        let paths = glob::glob(&expanded).map_err(|source| ToolchainError::Pattern {
            pattern: expanded.clone(),
            source,
        })?;

        let mut found = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) => found.push(path),
                Err(e) => debug!("Skipping unreadable path: {}", e),
            }
        }
        Ok(found)
    }

    /// First match of a pattern; zero matches is an error
    pub fn resolve(&self, pattern: &str) -> Result<PathBuf, ToolchainError> {
        let mut found = self.matches(pattern)?;
        if found.is_empty() {
            return Err(ToolchainError::NoMatch {
                pattern: self.expand(pattern)?,
            });
        }
        if found.len() > 1 {
            warn!(
                "`{}` matches {} paths, using {:?}",
                pattern,
                found.len(),
                found[0]
            );
        }
        Ok(found.swap_remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home() {
        let home = Path::new("/home/dev");
        assert_eq!(expand_home("~/Android/Sdk", Some(home)).unwrap(), "/home/dev/Android/Sdk");
        assert_eq!(expand_home("~", Some(home)).unwrap(), "/home/dev");
        assert_eq!(expand_home("/opt/sdk", None).unwrap(), "/opt/sdk");
        assert_eq!(expand_home("~other/sdk", Some(home)).unwrap(), "~other/sdk");
        assert!(matches!(expand_home("~/sdk", None), Err(ToolchainError::NoHomeDir)));
    }

    #[test]
    fn test_resolve_returns_first_match() {
        let home = tempfile::tempdir().unwrap();
        for version in ["23.1.7779620", "23.0.7599858", "25.2.9519653"] {
            std::fs::create_dir_all(home.path().join("Android/Sdk/ndk").join(version)).unwrap();
        }

        let resolver = PathResolver::with_home(Some(home.path().to_path_buf()));
        let ndk = resolver.resolve("~/Android/Sdk/ndk/23*").unwrap();
        assert_eq!(ndk, home.path().join("Android/Sdk/ndk/23.0.7599858"));
    }

    #[test]
    fn test_resolve_no_match_fails() {
        let home = tempfile::tempdir().unwrap();
        let resolver = PathResolver::with_home(Some(home.path().to_path_buf()));

        let err = resolver.resolve("~/Android/Sdk/ndk/23*").unwrap_err();
        match err {
            ToolchainError::NoMatch { pattern } => assert!(pattern.ends_with("Android/Sdk/ndk/23*")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_pattern() {
        let resolver = PathResolver::with_home(None);
        assert!(matches!(resolver.resolve("/tmp/[unclosed"), Err(ToolchainError::Pattern { .. })));
    }

    #[test]
    fn test_defined_vars_are_substituted() {
        let root = tempfile::tempdir().unwrap();
        let sdk = root.path().join("sdk");
        std::fs::create_dir_all(sdk.join("build-tools/30.0.3")).unwrap();

        let mut resolver = PathResolver::with_home(None);
        resolver.define("sdk", &sdk);
        assert_eq!(
            resolver.resolve("{sdk}/build-tools/*").unwrap(),
            sdk.join("build-tools/30.0.3")
        );
    }
}
