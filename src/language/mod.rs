//! # Language Module
//!
//! Multi-language route support: per-module manifests, language files, and
//! the rewriter that expands localizable routes into per-language variants.

mod config;
mod rewriter;

pub use config::{
    LanguageConfig, LanguageError, LanguageSpec, ModuleLanguages, ModuleManifest,
};
pub use rewriter::rewrite;
