//! Configuration for schema compilation.

use serde::{Deserialize, Serialize};

/// Default prefix prepended to a component name to form its `$ref` string.
pub const DEFAULT_REF_PREFIX: &str = "#/components/schemas/";

/// Options for schema compilation.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `max-depth`, `ref-prefix`).
/// Missing fields fall back to their defaults, so a config file may set only
/// the options it cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CompileOptions {
    /// Maximum nesting of dispatches (fields, array and collection elements)
    /// below a root before compilation fails with `DepthExceeded`.
    pub max_depth: usize,
    /// Prefix used by `Schema::ref_name` when pointing at a component.
    pub ref_prefix: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_depth: 50,
            ref_prefix: DEFAULT_REF_PREFIX.to_string(),
        }
    }
}
