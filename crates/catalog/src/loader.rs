use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::time::Instant;

use tracing::{info, warn};

use crate::error::CatalogError;
use crate::normalize::{normalize_with_origin, DescriptionOrigin};
use crate::types::{CatalogRecord, RawCatalogRecord, SourceProfile, SourceStats};

/// Normalizes a source's raw records, preserving their order.
///
/// Returns the records plus the number of descriptions that fell back to the model name.
pub fn normalize_all(
    raws: &[RawCatalogRecord],
    source: &str,
) -> Result<(Vec<CatalogRecord>, usize), CatalogError> {
    let mut records = Vec::with_capacity(raws.len());
    let mut fallbacks = 0;
    for (index, raw) in raws.iter().enumerate() {
        let (record, origin) =
            normalize_with_origin(raw, source).map_err(|reason| CatalogError::InvalidRecord {
                source_name: source.to_string(),
                index,
                reason,
            })?;
        if origin == DescriptionOrigin::ModelName {
            fallbacks += 1;
        }
        records.push(record);
    }
    Ok((records, fallbacks))
}

/// Reads and normalizes one insurer catalog file.
pub fn load_source(profile: &SourceProfile) -> Result<Vec<CatalogRecord>, CatalogError> {
    load_source_with_stats(profile).map(|(records, _)| records)
}

fn load_source_with_stats(
    profile: &SourceProfile,
) -> Result<(Vec<CatalogRecord>, SourceStats), CatalogError> {
    let start = Instant::now();
    let content = fs::read_to_string(&profile.path).map_err(|source| CatalogError::Io {
        path: profile.path.clone(),
        source,
    })?;
    let raws: Vec<RawCatalogRecord> =
        serde_json::from_str(&content).map_err(|source| CatalogError::Json {
            path: profile.path.clone(),
            source,
        })?;

    let (records, description_fallbacks) = normalize_all(&raws, &profile.name)?;
    info!(
        source = %profile.name,
        path = %profile.path.display(),
        records = records.len(),
        description_fallbacks,
        skip_submake_filter = profile.skip_submake_filter,
        elapsed_micros = start.elapsed().as_micros(),
        "catalog_source_loaded"
    );
    if records.is_empty() {
        warn!(source = %profile.name, "catalog_source_empty");
    }

    let stats = SourceStats {
        source: profile.name.clone(),
        records: records.len(),
        description_fallbacks,
        skip_submake_filter: profile.skip_submake_filter,
    };
    Ok((records, stats))
}

/// The merged, read-only catalog of every configured source.
///
/// Records keep source order first, then upstream file order; the engine's tie-breaking
/// relies on this encounter order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<CatalogRecord>,
    sources: Vec<SourceProfile>,
    stats: Vec<SourceStats>,
}

impl Catalog {
    /// Loads every source in declaration order.
    pub fn load(profiles: &[SourceProfile]) -> Result<Self, CatalogError> {
        validate_profiles(profiles)?;

        let mut records = Vec::new();
        let mut stats = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let (mut source_records, source_stats) = load_source_with_stats(profile)?;
            records.append(&mut source_records);
            stats.push(source_stats);
        }

        info!(
            sources = profiles.len(),
            records = records.len(),
            "catalog_loaded"
        );
        Ok(Self {
            records,
            sources: profiles.to_vec(),
            stats,
        })
    }

    /// Builds a catalog from already normalized records, e.g. for tests or
    /// non-file upstreams. Sources without a profile get the default capabilities.
    pub fn from_records(
        profiles: Vec<SourceProfile>,
        records: Vec<CatalogRecord>,
    ) -> Result<Self, CatalogError> {
        validate_profiles(&profiles)?;
        let stats = profiles
            .iter()
            .map(|profile| SourceStats {
                source: profile.name.clone(),
                records: records.iter().filter(|r| r.source == profile.name).count(),
                description_fallbacks: 0,
                skip_submake_filter: profile.skip_submake_filter,
            })
            .collect();
        Ok(Self {
            records,
            sources: profiles,
            stats,
        })
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn sources(&self) -> &[SourceProfile] {
        &self.sources
    }

    pub fn stats(&self) -> &[SourceStats] {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Names of sources whose sub-brand filter is disabled.
    pub fn submake_exempt_sources(&self) -> BTreeSet<String> {
        self.sources
            .iter()
            .filter(|p| p.skip_submake_filter)
            .map(|p| p.name.clone())
            .collect()
    }

    /// Distinct descriptions in encounter order, for warming embedding caches.
    pub fn distinct_descriptions(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.description.as_str())
            .filter(|d| seen.insert(*d))
            .collect()
    }
}

fn validate_profiles(profiles: &[SourceProfile]) -> Result<(), CatalogError> {
    let mut names = HashSet::new();
    for profile in profiles {
        if profile.name.trim().is_empty() {
            return Err(CatalogError::EmptySourceName);
        }
        if !names.insert(profile.name.as_str()) {
            return Err(CatalogError::DuplicateSource(profile.name.clone()));
        }
    }
    Ok(())
}
