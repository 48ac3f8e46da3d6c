//! Source ingestion pipeline.
//!
//! discover -> classify -> group by kind -> parse each group in parallel ->
//! stable sort by discovery index -> missing-type report -> provenance stamp.
//!
//! A single file never fails the run: anything that cannot be read, decoded
//! or parsed becomes an opaque unit and a [`ParseFailure`].

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use artifact_resolver::ResolvedClasspath;
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::config::model::IngestConfig;
use crate::core::classify::Classifier;
use crate::core::fs_scan::{DiscoveredFile, discover};
use crate::errors::{IngestError, ParseFailure, Result};
use crate::model::{Charset, OpaqueReason, Payload, SourceKind, SourceUnit, Syntax};
use crate::parsers::ParserRouter;
use crate::provenance::ProvenanceBundle;
use crate::type_index::TypeIndex;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub discovered: usize,
    pub ingested: usize,
    pub oversized: usize,
    pub failed: usize,
    pub missing_types: usize,
}

#[derive(Debug, Default)]
pub struct IngestOutput {
    /// In discovery order.
    pub units: Vec<SourceUnit>,
    pub failures: Vec<ParseFailure>,
    pub stats: IngestStats,
}

#[instrument(skip_all, fields(root = %root.display()))]
pub fn ingest(
    root: &Path,
    cfg: &IngestConfig,
    classpath: &ResolvedClasspath,
    provenance: &ProvenanceBundle,
) -> Result<IngestOutput> {
    cfg.validate()
        .map_err(|e| IngestError::Config(e.to_string()))?;

    let files = discover(root, cfg)?;
    let classifier = Classifier::new(&cfg.filters)?;
    let router = ParserRouter::new()?;

    let mut stats = IngestStats {
        discovered: files.len(),
        ..Default::default()
    };

    let mut groups: BTreeMap<SourceKind, Vec<DiscoveredFile>> = BTreeMap::new();
    for file in files {
        match classifier.classify(&file.rel) {
            Some(kind) => groups.entry(kind).or_default().push(file),
            None => debug!("ingest: not accepted {}", file.rel),
        }
    }

    let index = if groups.keys().any(SourceKind::is_compiled) {
        TypeIndex::from_classpath(classpath)
    } else {
        TypeIndex::default()
    };

    let threshold = cfg.limits.size_threshold_bytes;
    let mut parsed: Vec<(usize, SourceUnit, Option<ParseFailure>)> = Vec::new();
    for (kind, group) in &groups {
        info!("ingest: parsing {} {} file(s)", group.len(), kind);
        let results: Vec<_> = group
            .par_iter()
            .map(|file| {
                let (unit, failure) = ingest_file(file, *kind, threshold, &router);
                (file.index, unit, failure)
            })
            .collect();
        parsed.extend(results);
    }
    parsed.sort_by_key(|(index, _, _)| *index);

    let mut failures = Vec::new();
    let mut units = Vec::with_capacity(parsed.len());
    for (_, unit, failure) in parsed {
        if let Some(f) = failure {
            failures.push(f);
        } else if matches!(
            unit.payload(),
            Payload::Opaque {
                reason: OpaqueReason::Oversized,
                ..
            }
        ) {
            stats.oversized += 1;
        }
        units.push(unit);
    }

    let units = report_missing_types(units, &index, &mut stats);
    let units: Vec<SourceUnit> = units.into_iter().map(|u| provenance.stamp(u)).collect();

    stats.ingested = units.len();
    stats.failed = failures.len();
    info!(
        "ingest: done, units={} oversized={} failed={} missing_types={}",
        stats.ingested, stats.oversized, stats.failed, stats.missing_types
    );
    Ok(IngestOutput {
        units,
        failures,
        stats,
    })
}

fn ingest_file(
    file: &DiscoveredFile,
    kind: SourceKind,
    threshold: u64,
    router: &ParserRouter,
) -> (SourceUnit, Option<ParseFailure>) {
    let unit = SourceUnit::new(
        &file.rel,
        kind,
        Payload::Opaque {
            size: file.size,
            reason: OpaqueReason::Oversized,
        },
    )
    .with_attributes(file.attributes);

    if file.size > threshold {
        debug!(
            "ingest: {} is {} bytes (threshold {threshold}), kept opaque",
            file.rel, file.size
        );
        return (unit, None);
    }

    let degrade = |unit: SourceUnit, reason: String| {
        warn!("ingest: {} degraded to opaque: {reason}", file.rel);
        let failure = ParseFailure {
            path: file.rel.clone().into(),
            reason: reason.clone(),
        };
        let unit = unit.with_payload(Payload::Opaque {
            size: file.size,
            reason: OpaqueReason::Unparseable(reason),
        });
        (unit, Some(failure))
    };

    let bytes = match fs::read(&file.path) {
        Ok(b) => b,
        Err(err) => return degrade(unit, format!("read failed: {err}")),
    };

    // NUL bytes in the plain-text group mean binary content
    if kind == SourceKind::PlainText && bytes.contains(&0) {
        return (unit.with_payload(Payload::Bytes { bytes }), None);
    }

    let (charset, text) = match Charset::decode(&bytes) {
        Ok(decoded) => decoded,
        Err(reason) => return degrade(unit, reason),
    };
    match router.parser_for(kind).parse(&text) {
        Ok(syntax) => (
            unit.with_payload(Payload::text(text))
                .with_charset(charset)
                .with_syntax(syntax),
            None,
        ),
        Err(reason) => degrade(unit, reason),
    }
}

/// Fills `missing_types` on compiled units: imports known neither to the
/// classpath index, the platform namespaces nor the project itself.
fn report_missing_types(
    units: Vec<SourceUnit>,
    index: &TypeIndex,
    stats: &mut IngestStats,
) -> Vec<SourceUnit> {
    let mut declared: HashSet<&str> = HashSet::new();
    let mut packages: HashSet<&str> = HashSet::new();
    for unit in &units {
        if let Some(Syntax::Compiled {
            package,
            declared_types,
            ..
        }) = unit.syntax()
        {
            declared.extend(declared_types.iter().map(String::as_str));
            packages.extend(package.as_deref());
        }
    }

    let known = |name: &str, package: bool| {
        index.knows(name, package)
            || (package && packages.contains(name))
            || enclosing_names(name).any(|n| declared.contains(n))
    };

    let mut missing_by_unit: Vec<Option<Vec<String>>> = Vec::with_capacity(units.len());
    for unit in &units {
        let missing = match unit.syntax() {
            Some(Syntax::Compiled { imports, .. }) => {
                let missing: Vec<String> = imports
                    .iter()
                    .filter(|imp| !known(imp.required_type(), imp.wildcard && !imp.is_static))
                    .map(|imp| imp.required_type().to_string())
                    .collect();
                for name in &missing {
                    debug!("ingest: no type information for {name} in {}", unit.path().display());
                }
                Some(missing)
            }
            _ => None,
        };
        missing_by_unit.push(missing);
    }

    let total: usize = missing_by_unit.iter().flatten().map(Vec::len).sum();
    if total > 0 {
        let files = missing_by_unit
            .iter()
            .flatten()
            .filter(|m| !m.is_empty())
            .count();
        warn!("ingest: {total} import(s) without type information in {files} file(s)");
    }
    stats.missing_types = total;

    units
        .into_iter()
        .zip(missing_by_unit)
        .map(|(unit, missing)| match (missing, unit.syntax().cloned()) {
            (
                Some(missing),
                Some(Syntax::Compiled {
                    package,
                    imports,
                    declared_types,
                    ..
                }),
            ) => unit.with_syntax(Syntax::Compiled {
                package,
                imports,
                declared_types,
                missing_types: missing,
            }),
            _ => unit,
        })
        .collect()
}

/// `a.b.C.D` -> `a.b.C.D`, `a.b.C`, `a.b`, `a`.
fn enclosing_names(name: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(name), |n| n.rsplit_once('.').map(|(head, _)| head))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosing_names_walks_outwards() {
        let names: Vec<&str> = enclosing_names("a.b.C.D").collect();
        assert_eq!(names, ["a.b.C.D", "a.b.C", "a.b", "a"]);
    }
}
