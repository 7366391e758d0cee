//! Translator configuration and the driver-facing host contract.
//!
//! The driver (file I/O, module resolution, build integration) lives outside
//! this workspace. Everything the translator needs from it flows through
//! `TranslatorHost`: a pure module-naming function, an options block, and an
//! optional warning sink.

use serde::{Deserialize, Serialize};

use rustc_hash::FxHashSet;

use crate::diagnostics::Diagnostic;

/// Module format of the emitted program.
///
/// Typedef statements (`exports.T;`) are only meaningful when the emitted
/// program addresses an exports object, so typedef emission is gated on
/// `CommonJs`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleKind {
    #[default]
    CommonJs,
    Es2015,
    None,
}

/// Options controlling the translation of a program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorOptions {
    /// Rewrite trailing "/index" in import paths when resolving modules.
    pub convert_index_import_shorthand: bool,
    /// Source paths whose declared types render as `?`.
    pub type_blacklist_paths: FxHashSet<String>,
    /// Force every emitted type string to `?`.
    pub untyped: bool,
    /// Do not rewrite dotted access into quoted access for index-signature
    /// receivers.
    pub disable_auto_quoting: bool,
    /// Output module format; typedefs are emitted only for `CommonJs`.
    pub module: ModuleKind,
    /// Whether non-actionable debug warnings are recorded at all.
    pub log_warnings: bool,
}

/// The contract the driver supplies to the translator.
pub trait TranslatorHost {
    /// Compute the canonical cross-module name for a target module.
    /// Must be pure: the same inputs always produce the same name.
    fn path_to_module_name(&self, importer_path: &str, imported_path: &str) -> String;

    fn options(&self) -> &TranslatorOptions;

    /// Sink for non-fatal warnings. The default routes to `tracing`.
    fn log_warning(&self, diag: &Diagnostic) {
        tracing::warn!(file = %diag.file, "{}", diag.message_text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default_module_is_commonjs() {
        let options = TranslatorOptions::default();
        assert_eq!(options.module, ModuleKind::CommonJs);
        assert!(!options.untyped);
    }
}
