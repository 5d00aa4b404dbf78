use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// A single vehicle entry exactly as an insurer publishes it.
///
/// Upstream catalogs disagree on field types (years as numbers or strings, type codes as
/// numbers or strings, opaque ids of any JSON type), so loosely typed fields stay as
/// [`Value`] until [`normalize_record`](crate::normalize_record) resolves them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawCatalogRecord {
    /// Identifier scoped to the insurer; passed through untouched.
    #[serde(default)]
    pub insurance_company_id: Value,
    pub make: RawMake,
    #[serde(default)]
    pub model: RawModel,
    /// Model year, either a JSON integer or a numeric string.
    #[serde(default)]
    pub year: Value,
    /// Short model/type code. Missing on some catalogs.
    #[serde(default)]
    pub type_id: Value,
    /// Embedded structured payload, usually a JSON document serialized into a string.
    /// Some insurers publish the literal string `"null"` instead of omitting it.
    #[serde(default)]
    pub extra_data: Option<Value>,
}

/// Brand block of a raw record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawMake {
    pub make_string: String,
    #[serde(default)]
    pub submake: Option<String>,
    #[serde(default)]
    pub make_id: Value,
}

/// Model block of a raw record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawModel {
    #[serde(default)]
    pub model_string: String,
}

/// Uniform record consumed by the matching engine.
///
/// Text fields are uppercased and trimmed. `submake` is never empty: records without a
/// sub-brand carry their brand name here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub source: String,
    pub insurance_company_id: Value,
    pub make: String,
    pub submake: String,
    pub year: i32,
    pub type_id: String,
    pub make_id: Value,
    pub description: String,
}

/// Per-insurer catalog declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceProfile {
    /// Source identifier stamped on every record (e.g. `"chubb"`).
    pub name: String,
    /// JSON file holding the raw record array.
    pub path: PathBuf,
    /// Set for catalogs that do not reliably populate the sub-brand; the engine then
    /// skips the sub-brand filter for this source.
    #[serde(default)]
    pub skip_submake_filter: bool,
}

impl SourceProfile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            skip_submake_filter: false,
        }
    }

    pub fn with_skip_submake_filter(mut self, skip: bool) -> Self {
        self.skip_submake_filter = skip;
        self
    }
}

/// Record count for one loaded source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceStats {
    pub source: String,
    pub records: usize,
    /// Records whose description came from the plain model name instead of `extraData`.
    pub description_fallbacks: usize,
    pub skip_submake_filter: bool,
}
