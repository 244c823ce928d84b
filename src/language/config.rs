//! Module manifests and language configuration.
//!
//! Read once at boot from the module filesystem convention:
//!
//! ```text
//! <ModulesRoot>/<ModuleName>/manifest.json
//! <ModulesRoot>/<ModuleName>/Language/<iso>/lang.json
//! ```
//!
//! Manifest defects are deployment errors and abort boot. Tests and embedded
//! hosts can build a [`LanguageConfig`] in memory instead of loading one.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Per-module `manifest.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleManifest {
    /// Module type, e.g. `view` or `api`.
    #[serde(rename = "type")]
    pub module_type: String,
    /// Whether the module's view routes are language-expanded.
    #[serde(default)]
    pub languages: bool,
    /// ISO code of the module's default language; required when `languages`
    /// is enabled.
    #[serde(default)]
    pub default_language: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
}

/// Per-language `lang.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageSpec {
    /// URI prefix for this language, e.g. `ka`.
    #[serde(rename = "Prefix")]
    pub prefix: String,
    pub iso: String,
    pub name: String,
    /// `Accept-Language`/`Content-Language` tag for this language.
    #[serde(default)]
    pub header: Option<String>,
}

/// A module's manifest plus its configured languages.
#[derive(Debug, Clone)]
pub struct ModuleLanguages {
    pub manifest: ModuleManifest,
    pub languages: Vec<LanguageSpec>,
}

#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("missing manifest for module `{module}` at {path}")]
    MissingManifest { module: String, path: PathBuf },
    #[error("malformed manifest for module `{module}`: {source}")]
    MalformedManifest {
        module: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed language file {path}: {source}")]
    MalformedLanguage {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("module `{module}` enables languages but declares no usable default language")]
    MissingDefault { module: String },
    #[error("failed reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// All loaded module manifests and language sets, keyed by module name.
#[derive(Debug, Clone, Default)]
pub struct LanguageConfig {
    modules: HashMap<String, ModuleLanguages>,
}

impl LanguageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory registration, bypassing the filesystem.
    pub fn insert(
        &mut self,
        module: impl Into<String>,
        manifest: ModuleManifest,
        languages: Vec<LanguageSpec>,
    ) {
        self.modules
            .insert(module.into(), ModuleLanguages { manifest, languages });
    }

    #[must_use]
    pub fn module(&self, name: &str) -> Option<&ModuleLanguages> {
        self.modules.get(name)
    }

    #[must_use]
    pub fn default_language(&self, module: &str) -> Option<&str> {
        self.modules
            .get(module)?
            .manifest
            .default_language
            .as_deref()
    }

    #[must_use]
    pub fn theme(&self, module: &str) -> Option<&str> {
        self.modules.get(module)?.manifest.theme.as_deref()
    }

    /// URI prefix configured for a module language.
    #[must_use]
    pub fn prefix_for(&self, module: &str, iso: &str) -> Option<&str> {
        self.modules
            .get(module)?
            .languages
            .iter()
            .find(|l| l.iso == iso)
            .map(|l| l.prefix.as_str())
    }

    /// Load manifests and language files for the named modules.
    ///
    /// Any missing or malformed file is startup-fatal. A module that enables
    /// languages must declare a default that is actually present among its
    /// `Language/<iso>/lang.json` files.
    pub fn load(modules_root: &Path, modules: &[String]) -> Result<Self, LanguageError> {
        let mut config = Self::new();
        for module in modules {
            let manifest_path = modules_root.join(module).join("manifest.json");
            let raw = std::fs::read_to_string(&manifest_path).map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    LanguageError::MissingManifest {
                        module: module.clone(),
                        path: manifest_path.clone(),
                    }
                } else {
                    LanguageError::Io {
                        path: manifest_path.clone(),
                        source,
                    }
                }
            })?;
            let manifest: ModuleManifest =
                serde_json::from_str(&raw).map_err(|source| LanguageError::MalformedManifest {
                    module: module.clone(),
                    source,
                })?;

            let languages = if manifest.languages {
                let langs = load_language_dir(&modules_root.join(module).join("Language"))?;
                let default_present = manifest
                    .default_language
                    .as_ref()
                    .map(|d| langs.iter().any(|l| &l.iso == d))
                    .unwrap_or(false);
                if !default_present {
                    return Err(LanguageError::MissingDefault {
                        module: module.clone(),
                    });
                }
                langs
            } else {
                Vec::new()
            };

            debug!(
                module = %module,
                languages = languages.len(),
                "Module manifest loaded"
            );
            config.insert(module.clone(), manifest, languages);
        }
        Ok(config)
    }
}

fn load_language_dir(dir: &Path) -> Result<Vec<LanguageSpec>, LanguageError> {
    let mut specs = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(specs),
        Err(source) => {
            return Err(LanguageError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    // Deterministic load order regardless of directory iteration order.
    dirs.sort();
    for lang_dir in dirs {
        let lang_path = lang_dir.join("lang.json");
        let raw = std::fs::read_to_string(&lang_path).map_err(|source| LanguageError::Io {
            path: lang_path.clone(),
            source,
        })?;
        let spec: LanguageSpec =
            serde_json::from_str(&raw).map_err(|source| LanguageError::MalformedLanguage {
                path: lang_path.clone(),
                source,
            })?;
        specs.push(spec);
    }
    Ok(specs)
}
