use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

// -----------------------------------------------------------------------------
// Pass names
// -----------------------------------------------------------------------------

/// One rewrite stage. Declaration order is the order the pipeline runs them in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum PassKind {
    /// Inline indexed reads of all-string array literals.
    StringArray,
    /// Decode hex/unicode escapes and base64 payloads.
    HexBase64,
    /// Fold literal-only arithmetic and logical expressions.
    ConstFold,
    /// Drop debugger/console/empty statements and literal-boolean `if`s.
    Junk,
    /// Rename obfuscated local bindings to `var_N`.
    IdRename,
}

impl PassKind {
    /// Every pass, in pipeline order.
    pub fn all() -> impl Iterator<Item = PassKind> {
        PassKind::iter()
    }
}

// -----------------------------------------------------------------------------
// Options
// -----------------------------------------------------------------------------

/// Caller-facing knobs for [`crate::deobfuscate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeobfuscateOptions {
    /// Passes to run. Empty means all of them.
    pub passes: BTreeSet<PassKind>,
    /// Gates `idRename` even when it is listed in `passes`.
    pub rename: bool,
    /// Emit per-pass diagnostics through `log`. Never changes the output.
    pub verbose: bool,
}

impl Default for DeobfuscateOptions {
    fn default() -> Self {
        Self {
            passes: BTreeSet::new(),
            rename: true,
            verbose: false,
        }
    }
}

impl DeobfuscateOptions {
    /// Options running only `passes` (or all passes when empty).
    pub fn with_passes(passes: impl IntoIterator<Item = PassKind>) -> Self {
        Self {
            passes: passes.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Build options from a loose JSON config map.
    ///
    /// `passes` may be an array of names or one comma-separated string; names
    /// that don't match a pass are ignored.
    pub fn from_config(mut config: HashMap<String, serde_json::Value>) -> Self {
        let mut options = Self::default();

        if let Some(value) = config.remove("passes") {
            let names: Vec<String> = match value {
                serde_json::Value::String(list) => {
                    list.split(',').map(|s| s.trim().to_string()).collect()
                }
                serde_json::Value::Array(items) => items
                    .into_iter()
                    .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
                    .collect(),
                _ => vec![],
            };
            for name in names.iter().filter(|n| !n.is_empty()) {
                match PassKind::from_str(name) {
                    Ok(kind) => {
                        options.passes.insert(kind);
                    }
                    Err(_) => log::warn!("ignoring unknown pass `{}`", name),
                }
            }
        }
        if let Some(rename) = config.remove("rename").and_then(|v| v.as_bool()) {
            options.rename = rename;
        }
        if let Some(verbose) = config.remove("verbose").and_then(|v| v.as_bool()) {
            options.verbose = verbose;
        }
        options
    }

    /// Was `kind` requested (explicitly, or implicitly by an empty selection)?
    pub fn is_requested(&self, kind: PassKind) -> bool {
        self.passes.is_empty() || self.passes.contains(&kind)
    }

    /// Will the pipeline actually run `kind`?
    pub fn is_enabled(&self, kind: PassKind) -> bool {
        self.is_requested(kind) && (kind != PassKind::IdRename || self.rename)
    }
}
