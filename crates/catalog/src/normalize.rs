use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::error::RecordError;
use crate::types::{CatalogRecord, RawCatalogRecord};

/// Where a record's description text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionOrigin {
    /// The `description` field of the embedded `extraData` document.
    ExtraData,
    /// The plain `model.modelString` field.
    ModelName,
}

/// Description text plus its origin; the text is not yet uppercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDescription {
    pub text: String,
    pub origin: DescriptionOrigin,
    /// Why `extraData` was not used, when it was not.
    pub fallback_reason: Option<ExtraDataError>,
}

/// Why an `extraData` payload could not supply a description.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtraDataError {
    #[error("extraData is absent")]
    Absent,
    #[error("extraData is the literal string \"null\"")]
    Null,
    #[error("extraData is not valid JSON: {0}")]
    Malformed(String),
    #[error("extraData has no description")]
    MissingDescription,
    #[error("extraData description is not text")]
    NotText,
}

/// Extracts the description from an `extraData` payload.
///
/// Accepts either a JSON document serialized into a string (the common upstream shape)
/// or an already structured object. Blank descriptions count as missing.
pub fn parse_extra_data(extra: Option<&Value>) -> Result<String, ExtraDataError> {
    let document = match extra {
        None | Some(Value::Null) => return Err(ExtraDataError::Absent),
        Some(Value::String(raw)) if raw.trim() == "null" => return Err(ExtraDataError::Null),
        Some(Value::String(raw)) => serde_json::from_str::<Value>(raw)
            .map_err(|e| ExtraDataError::Malformed(e.to_string()))?,
        Some(object @ Value::Object(_)) => object.clone(),
        Some(_) => {
            return Err(ExtraDataError::Malformed(
                "expected a JSON string or object".into(),
            ))
        }
    };

    match document.get("description") {
        None | Some(Value::Null) => Err(ExtraDataError::MissingDescription),
        Some(Value::String(text)) if text.trim().is_empty() => {
            Err(ExtraDataError::MissingDescription)
        }
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(ExtraDataError::NotText),
    }
}

/// Picks the description for a raw record: `extraData.description` when usable, otherwise
/// the plain model name.
pub fn resolve_description(raw: &RawCatalogRecord) -> ResolvedDescription {
    match parse_extra_data(raw.extra_data.as_ref()) {
        Ok(text) => ResolvedDescription {
            text,
            origin: DescriptionOrigin::ExtraData,
            fallback_reason: None,
        },
        Err(reason) => ResolvedDescription {
            text: raw.model.model_string.clone(),
            origin: DescriptionOrigin::ModelName,
            fallback_reason: Some(reason),
        },
    }
}

/// Uppercases and trims a catalog text field.
pub fn normalize_text(s: &str) -> String {
    s.trim().to_uppercase()
}

/// Renders a loosely typed upstream scalar as text; `null` becomes the empty string.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_year(value: &Value) -> Result<i32, RecordError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| RecordError::InvalidYear(value.to_string()))
}

/// Normalizes one upstream record into the uniform [`CatalogRecord`] shape.
pub fn normalize_record(
    raw: &RawCatalogRecord,
    source: &str,
) -> Result<CatalogRecord, RecordError> {
    normalize_with_origin(raw, source).map(|(record, _)| record)
}

pub(crate) fn normalize_with_origin(
    raw: &RawCatalogRecord,
    source: &str,
) -> Result<(CatalogRecord, DescriptionOrigin), RecordError> {
    let make = normalize_text(&raw.make.make_string);
    if make.is_empty() {
        return Err(RecordError::EmptyMake);
    }

    let submake = raw
        .make
        .submake
        .as_deref()
        .map(normalize_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| make.clone());

    let year = parse_year(&raw.year)?;

    let resolved = resolve_description(raw);
    if let Some(reason) = &resolved.fallback_reason {
        debug!(source, %reason, "description_fallback_to_model_name");
    }

    let record = CatalogRecord {
        source: source.to_string(),
        insurance_company_id: raw.insurance_company_id.clone(),
        make,
        submake,
        year,
        type_id: normalize_text(&scalar_text(&raw.type_id)),
        make_id: raw.make.make_id.clone(),
        description: normalize_text(&resolved.text),
    };
    Ok((record, resolved.origin))
}
