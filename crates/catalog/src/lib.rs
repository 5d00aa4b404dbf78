//! Homologador Catalog Layer
//!
//! Every insurer publishes its vehicle catalog with its own conventions: brands in mixed
//! case, sub-brands sometimes missing, years as numbers or strings, and the useful
//! description buried in a JSON document serialized into the `extraData` string (or
//! replaced by the literal `"null"`). This crate turns those files into one flat,
//! read-only collection of uniform [`CatalogRecord`]s.
//!
//! ## What we do here
//!
//! - **Normalize text** - brand, sub-brand, type code, and description are trimmed and
//!   uppercased so the matcher can compare them directly.
//! - **Fill the sub-brand** - a missing or blank sub-brand becomes the brand itself.
//! - **Resolve descriptions** - [`resolve_description`] prefers `extraData.description`
//!   and falls back to `model.modelString`, reporting why through [`ExtraDataError`].
//! - **Load sources** - [`Catalog::load`] reads each [`SourceProfile`] in order and keeps
//!   per-source capabilities such as `skip_submake_filter`.
//!
//! Load failures are fatal: a catalog that cannot be read or normalized must stop the
//! process before it serves any query.
//!
//! ## Example
//!
//! ```
//! use catalog::{normalize_record, RawCatalogRecord};
//! use serde_json::json;
//!
//! let raw: RawCatalogRecord = serde_json::from_value(json!({
//!     "insuranceCompanyId": 10,
//!     "make": { "makeString": "Toyota", "makeId": 3 },
//!     "model": { "modelString": "Corolla" },
//!     "year": 2020,
//!     "typeId": "cor",
//!     "extraData": "{\"description\": \"cor le sedan\"}"
//! }))
//! .unwrap();
//!
//! let record = normalize_record(&raw, "chubb").unwrap();
//! assert_eq!(record.submake, "TOYOTA");
//! assert_eq!(record.description, "COR LE SEDAN");
//! ```

mod error;
mod loader;
mod normalize;
mod types;

pub use crate::error::{CatalogError, RecordError};
pub use crate::loader::{load_source, normalize_all, Catalog};
pub use crate::normalize::{
    normalize_record, normalize_text, parse_extra_data, resolve_description, DescriptionOrigin,
    ExtraDataError, ResolvedDescription,
};
pub use crate::types::{
    CatalogRecord, RawCatalogRecord, RawMake, RawModel, SourceProfile, SourceStats,
};
