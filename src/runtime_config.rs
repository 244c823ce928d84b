//! # Runtime Configuration Module
//!
//! Environment-variable based configuration for the framework runtime.
//!
//! ## Environment Variables
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `PORTICO_DEVELOPER` | developer mode (`1`/`true` enables the `debug` block in envelopes and verbatim error messages) | off |
//! | `PORTICO_SIGNING_KEY` | HMAC signing key for issued tokens | empty |
//! | `PORTICO_ERROR_MODULE` | module that renders browser-facing 404 pages | unset |
//! | `PORTICO_MODULES_ROOT` | filesystem root of module manifests and language files | `modules` |
//!
//! The developer flag must never be enabled in production: it puts stack
//! traces and bearer tokens into response payloads.

use std::env;
use std::path::PathBuf;

/// Runtime configuration loaded once at boot.
///
/// Load from the environment with [`RuntimeConfig::from_env()`], or build one
/// explicitly in tests with the `with_*` methods.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Developer mode: verbose error payloads and the envelope `debug` block.
    pub developer: bool,
    /// HMAC key used to sign and verify issued tokens.
    pub signing_key: String,
    /// Name of the module that renders browser-facing error pages.
    pub error_module: Option<String>,
    /// Filesystem root under which `<Module>/manifest.json` and
    /// `<Module>/Language/<iso>/lang.json` live.
    pub modules_root: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            developer: false,
            signing_key: String::new(),
            error_module: None,
            modules_root: PathBuf::from("modules"),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let developer = env::var("PORTICO_DEVELOPER")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let signing_key = env::var("PORTICO_SIGNING_KEY").unwrap_or_default();
        let error_module = env::var("PORTICO_ERROR_MODULE").ok().filter(|v| !v.is_empty());
        let modules_root = env::var("PORTICO_MODULES_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("modules"));
        Self {
            developer,
            signing_key,
            error_module,
            modules_root,
        }
    }

    pub fn with_developer(mut self, developer: bool) -> Self {
        self.developer = developer;
        self
    }

    pub fn with_signing_key(mut self, key: impl Into<String>) -> Self {
        self.signing_key = key.into();
        self
    }

    pub fn with_error_module(mut self, module: impl Into<String>) -> Self {
        self.error_module = Some(module.into());
        self
    }

    pub fn with_modules_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.modules_root = root.into();
        self
    }
}
