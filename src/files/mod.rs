//! Directory-level batch conversion between the entity store, per-type CSV
//! files and per-type GeoJSON files.
//!
//! One file per entity type (`<Type>.csv`, `<Type>.geojson`). Malformed
//! files are skipped with a warning and siblings continue; malformed rows
//! are counted, never fatal. No error propagates out of a batch for a
//! single bad record.

use crate::entity::Entity;
use crate::store::EntityStore;
use crate::transcode::geojson::{feature_collection_to_rows, to_feature_collection, FeatureCollection};
use crate::transcode::record::TrafficFlowRecord;
use crate::transcode::{csv_columns, entity_from_row, entity_to_row};
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Aggregate outcome of one batch operation. Partial failures surface
/// here as counts, not as errors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    /// Files processed to completion.
    pub files: usize,
    /// Files skipped because they could not be parsed at all.
    pub skipped_files: usize,
    /// Entities/rows written.
    pub entities: usize,
    /// Rows or records dropped (missing id, unparseable stored document).
    pub skipped_rows: usize,
}

/// Export every entity type in the store to `<dir>/<Type>.csv`.
pub fn export_store_to_csv(store: &EntityStore, dir: &Path) -> Result<BatchReport> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut report = BatchReport::default();
    for entity_type in store.types()? {
        let (entities, unparsed) = load_type(store, &entity_type)?;
        report.skipped_rows += unparsed;
        if entities.is_empty() {
            continue;
        }

        let columns = csv_columns(&entities);
        let path = dir.join(format!("{}.csv", entity_type));
        write_csv(&path, &columns, entities.iter().map(|e| entity_to_row(e, &columns)))?;

        info!(
            entity_type = %entity_type,
            count = entities.len(),
            path = %path.display(),
            "Exported entities to CSV"
        );
        report.files += 1;
        report.entities += entities.len();
    }
    Ok(report)
}

/// Import every `*.csv` in `dir` into the store, replacing each type
/// wholesale (delete-by-type then insert).
///
/// The file stem declares the entity type when a row omits the `type`
/// column. Rows without an id are skipped and counted. `context_url` is
/// stamped onto each imported entity.
pub fn import_csv_to_store(
    store: &EntityStore,
    dir: &Path,
    context_url: &str,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    for path in files_with_extension(dir, "csv")? {
        let declared_type = file_stem(&path);
        let rows = match read_csv_rows(&path) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable CSV file");
                report.skipped_files += 1;
                continue;
            }
        };

        let mut entities = Vec::new();
        for row in &rows {
            match entity_from_row(row, &declared_type) {
                Some(mut entity) => {
                    entity.context = Some(Value::String(context_url.to_string()));
                    entities.push(entity);
                }
                None => report.skipped_rows += 1,
            }
        }
        if entities.is_empty() {
            report.skipped_files += 1;
            continue;
        }

        let entity_type = entities[0].entity_type.clone();
        let inserted = store.replace_all(&entity_type, &entities)?;

        info!(
            entity_type = %entity_type,
            count = inserted,
            path = %path.display(),
            "Imported CSV file into store"
        );
        report.files += 1;
        report.entities += inserted;
    }
    Ok(report)
}

/// Export every entity type in the store to `<dir>/<Type>.geojson`.
///
/// Entities without a decodable location are left out of the document (and
/// counted); the rest keep their native geometry.
pub fn export_store_to_geojson(store: &EntityStore, dir: &Path) -> Result<BatchReport> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut report = BatchReport::default();
    for entity_type in store.types()? {
        let (entities, unparsed) = load_type(store, &entity_type)?;
        report.skipped_rows += unparsed;
        if entities.is_empty() {
            continue;
        }

        let fc = to_feature_collection(&entities);
        report.skipped_rows += entities.len() - fc.features.len();

        let path = dir.join(format!("{}.geojson", entity_type));
        let document = serde_json::to_string_pretty(&fc)
            .context("Failed to serialize FeatureCollection")?;
        fs::write(&path, document)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(
            entity_type = %entity_type,
            features = fc.features.len(),
            path = %path.display(),
            "Exported entities to GeoJSON"
        );
        report.files += 1;
        report.entities += fc.features.len();
    }
    Ok(report)
}

/// Convert every `*.geojson` in `geojson_dir` to a CSV in `csv_dir`.
///
/// Documents that are not FeatureCollections (or not JSON at all) are
/// skipped with zero processed; siblings continue.
pub fn geojson_dir_to_csv(geojson_dir: &Path, csv_dir: &Path) -> Result<BatchReport> {
    fs::create_dir_all(csv_dir)
        .with_context(|| format!("Failed to create output directory {}", csv_dir.display()))?;

    let mut report = BatchReport::default();
    for path in files_with_extension(geojson_dir, "geojson")? {
        let fc: FeatureCollection = match fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|text| serde_json::from_str(&text).map_err(anyhow::Error::from))
        {
            Ok(fc) => fc,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping non-FeatureCollection file");
                report.skipped_files += 1;
                continue;
            }
        };

        let (header, rows) = feature_collection_to_rows(&fc);
        let out_path = csv_dir.join(format!("{}.csv", file_stem(&path)));
        let count = rows.len();
        write_csv(&out_path, &header, rows.into_iter())?;

        info!(
            features = count,
            path = %out_path.display(),
            "Converted GeoJSON file to CSV"
        );
        report.files += 1;
        report.entities += count;
    }
    Ok(report)
}

/// Import a plain-JSON traffic feed file into the store.
///
/// The feed is an array of station documents; each becomes a typed record
/// and then a `TrafficFlowObserved` entity, upserted by id. Documents
/// without a station id are skipped and counted. A feed that is not a
/// JSON array at all is a skip-this-file outcome with zero processed.
pub fn import_feed_to_store(store: &EntityStore, path: &Path) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    let items: Vec<Value> = match fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|text| serde_json::from_str(&text).map_err(anyhow::Error::from))
    {
        Ok(items) => items,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Skipping unreadable feed file");
            report.skipped_files += 1;
            return Ok(report);
        }
    };

    let mut entities = Vec::new();
    for item in &items {
        match TrafficFlowRecord::from_feed(item) {
            Some(record) => entities.push(record.to_entity()),
            None => report.skipped_rows += 1,
        }
    }
    let inserted = store.upsert_all(&entities)?;

    info!(
        count = inserted,
        path = %path.display(),
        "Imported traffic feed into store"
    );
    report.files += 1;
    report.entities += inserted;
    Ok(report)
}

/// Read all entities of one type from the store, counting documents that
/// no longer parse instead of failing the batch.
pub fn load_type(store: &EntityStore, entity_type: &str) -> Result<(Vec<Entity>, usize)> {
    let mut entities = Vec::new();
    let mut unparsed = 0;
    for stored in store.get_by_type(entity_type)? {
        match Entity::from_store_record(&stored.data) {
            Ok(entity) => entities.push(entity),
            Err(e) => {
                warn!(entity_id = %stored.id, error = %e, "Skipping unparseable stored entity");
                unparsed += 1;
            }
        }
    }
    Ok((entities, unparsed))
}

/// Read a CSV file into header-keyed row maps. Tolerates a UTF-8 BOM on
/// the first header cell.
fn read_csv_rows(path: &Path) -> Result<Vec<HashMap<String, String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let header: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to read CSV record")?;
        let row: HashMap<String, String> = header
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| (column.clone(), cell.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn write_csv<I>(path: &Path, header: &[String], rows: I) -> Result<()>
where
    I: Iterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer
        .write_record(header)
        .context("Failed to write CSV header")?;
    for row in rows {
        writer.write_record(&row).context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(extension))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_csv_rows_strips_bom() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("FloodSensor.csv");
        fs::write(&path, "\u{feff}id,waterLevel\nurn:1,1.5\n").unwrap();

        let rows = read_csv_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id").unwrap(), "urn:1");
        assert_eq!(rows[0].get("waterLevel").unwrap(), "1.5");
    }

    #[test]
    fn test_import_skips_rows_without_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("FloodSensor.csv");
        fs::write(&path, "id,waterLevel\nurn:1,1.5\n,0.3\n").unwrap();

        let store = EntityStore::open_in_memory().unwrap();
        let report = import_csv_to_store(&store, dir.path(), "https://example.org/ctx.jsonld")
            .unwrap();

        assert_eq!(report.files, 1);
        assert_eq!(report.entities, 1);
        assert_eq!(report.skipped_rows, 1);
    }

    #[test]
    fn test_feed_import_builds_typed_entities() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("traffic_feed.json");
        fs::write(
            &path,
            serde_json::json!([
                {
                    "stationId": "Q1-042",
                    "name": "Nguyen Hue Station",
                    "longitude": 106.703,
                    "latitude": 10.774,
                    "intensity": 145,
                    "roadSegment": "NguyenHue-01"
                },
                {"name": "no station id"}
            ])
            .to_string(),
        )
        .unwrap();

        let store = EntityStore::open_in_memory().unwrap();
        let report = import_feed_to_store(&store, &path).unwrap();
        assert_eq!(report.entities, 1);
        assert_eq!(report.skipped_rows, 1);

        let rows = store.get_by_type("TrafficFlowObserved").unwrap();
        let entity = Entity::from_store_record(&rows[0].data).unwrap();
        assert_eq!(entity.id, "urn:ngsi-ld:TrafficFlowObserved:Q1-042");
        assert_eq!(
            entity.attributes.get("refRoadSegment").unwrap().flat_value(),
            serde_json::json!("urn:ngsi-ld:RoadSegment:NguyenHue-01")
        );
    }

    #[test]
    fn test_non_array_feed_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("traffic_feed.json");
        fs::write(&path, "{\"not\": \"an array\"}").unwrap();

        let store = EntityStore::open_in_memory().unwrap();
        let report = import_feed_to_store(&store, &path).unwrap();
        assert_eq!(report.skipped_files, 1);
        assert_eq!(report.entities, 0);
    }

    #[test]
    fn test_malformed_file_skipped_siblings_continue() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Broken.geojson"), "not json at all").unwrap();
        fs::write(
            dir.path().join("FloodSensor.geojson"),
            serde_json::json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [106.7, 10.8]},
                    "properties": {"id": "urn:1", "type": "FloodSensor"}
                }]
            })
            .to_string(),
        )
        .unwrap();

        let out = tempdir().unwrap();
        let report = geojson_dir_to_csv(dir.path(), out.path()).unwrap();

        assert_eq!(report.files, 1);
        assert_eq!(report.skipped_files, 1);
        assert_eq!(report.entities, 1);
        assert!(out.path().join("FloodSensor.csv").exists());
        assert!(!out.path().join("Broken.csv").exists());
    }
}
