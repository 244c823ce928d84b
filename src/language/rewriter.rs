//! Language route rewriting.
//!
//! Expands each view-returning GET route of a localized module into one
//! prefixed variant per configured language, plus an unprefixed alias for
//! the module's default language. A single localizable route therefore
//! becomes N+1 concrete entries:
//!
//! ```text
//! products            (default alias, replaces the original entry in place)
//! en/products
//! ka/products
//! ```
//!
//! Rewriting is idempotent: only entries without language metadata are
//! candidates, and the first pass annotates every candidate.

use super::config::{LanguageConfig, LanguageError};
use crate::router::{normalize_path, LanguageMeta, RouteKind, RouteTable};
use http::Method;
use tracing::{debug, info, warn};

/// Rewrite the table in place. Run once after route loading; safe to run
/// again (no duplicate accumulation).
pub fn rewrite(table: &mut RouteTable, config: &LanguageConfig) -> Result<(), LanguageError> {
    let candidates: Vec<_> = table
        .entries(&Method::GET)
        .iter()
        .filter(|e| e.kind == RouteKind::View && e.language.is_none())
        .filter(|e| {
            config
                .module(&e.module)
                .map(|m| m.manifest.languages)
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    let mut expanded = 0usize;
    for base in candidates {
        let module_langs = match config.module(&base.module) {
            Some(m) => m,
            None => continue,
        };
        let default_iso = module_langs
            .manifest
            .default_language
            .clone()
            .ok_or_else(|| LanguageError::MissingDefault {
                module: base.module.clone(),
            })?;
        let isos: Vec<String> = module_langs
            .languages
            .iter()
            .map(|l| l.iso.clone())
            .collect();

        for lang in &module_langs.languages {
            let localized = join_localized(&lang.prefix, &base.pattern);
            if let Some(existing) = table.retrieve(&Method::GET, &localized) {
                if let Some(meta) = &existing.language {
                    if meta.iso != lang.iso {
                        warn!(
                            pattern = %localized,
                            existing_iso = %meta.iso,
                            iso = %lang.iso,
                            "Two languages share a URI prefix; last registration wins"
                        );
                    }
                }
            }
            let mut entry = base.clone();
            entry.pattern = localized.clone();
            entry.language = Some(LanguageMeta {
                iso: lang.iso.clone(),
                prefix: lang.prefix.clone(),
                original_uri: base.pattern.clone(),
                default: false,
                languages: isos.clone(),
            });
            debug!(pattern = %localized, iso = %lang.iso, "Localized route registered");
            table.store(entry);
            expanded += 1;
        }

        // The unprefixed default alias replaces the original entry in place,
        // keeping its registration-order position.
        let mut default_entry = base.clone();
        default_entry.language = Some(LanguageMeta {
            iso: default_iso,
            prefix: String::new(),
            original_uri: base.pattern.clone(),
            default: true,
            languages: isos,
        });
        table.store(default_entry);
    }

    if expanded > 0 {
        info!(expanded, "Language route expansion complete");
    }
    Ok(())
}

/// Prefix a route pattern with a language prefix, collapsing duplicate
/// slashes and trimming the edges.
fn join_localized(prefix: &str, pattern: &str) -> String {
    normalize_path(&format!("{prefix}/{pattern}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_collapses_slashes() {
        assert_eq!(join_localized("ka", "products"), "ka/products");
        assert_eq!(join_localized("ka/", "/products/"), "ka/products");
        assert_eq!(join_localized("", "products"), "products");
    }
}
