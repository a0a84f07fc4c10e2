// Row-level transcoding between flattened tables and canonical entities
pub mod geojson;
pub mod record;


use crate::entity::{Entity, RESERVED_FIELDS};
use crate::geometry::Geometry;
use crate::ngsi::{Attribute, ScalarValue};
use std::collections::{BTreeSet, HashMap};

/// Build an entity from one flattened row.
///
/// Returns `None` when the row has no usable `id`; a row without an
/// identifier cannot be transcoded and is skipped by callers, not treated
/// as an error. `type` falls back to `declared_type` (the file-level type)
/// when the column is absent or empty.
///
/// Geometry handling prefers the explicit `geometry_type`/`geometry` column
/// pair; with only a `location` cell, Point decoding applies unless the
/// cell holds a lossy display placeholder, in which case the geometry is
/// dropped and resolution is deferred to a richer source. Empty cells are
/// omitted entirely; every remaining column is classified heuristically and
/// wrapped as a Property, with `observedAt` getting the DateTime
/// sub-envelope.
pub fn entity_from_row(row: &HashMap<String, String>, declared_type: &str) -> Option<Entity> {
    let id = match row.get("id") {
        Some(v) if !v.is_empty() => v.clone(),
        _ => return None,
    };
    let entity_type = row
        .get("type")
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| declared_type.to_string());

    let mut entity = Entity::new(id, entity_type);

    // Explicit geometry columns are authoritative over the location cell.
    let typed_geometry = match (row.get("geometry_type"), row.get("geometry")) {
        (Some(kind), Some(cell)) if !cell.is_empty() => Geometry::from_typed_cell(kind, cell),
        _ => None,
    };
    if let Some(geometry) = typed_geometry {
        entity.set("location", Attribute::geometry(geometry));
    } else if let Some(cell) = row.get("location") {
        if !cell.is_empty() && !Geometry::is_placeholder_cell(cell) {
            if let Some(geometry) = Geometry::from_point_cell(cell) {
                entity.set("location", Attribute::geometry(geometry));
            }
        }
    }

    if let Some(ts) = row.get("observedAt").filter(|v| !v.is_empty()) {
        entity.set("observedAt", Attribute::date_time(ts.clone()));
    }

    for (key, value) in row {
        if value.is_empty() || key == "@context" || RESERVED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        entity.set(key.clone(), Attribute::scalar(ScalarValue::parse(value)));
    }

    Some(entity)
}

/// Render an entity to one row of cells aligned with `columns`.
///
/// `id` and `type` copy verbatim; `location` uses the lossy display cell,
/// the `geometry`/`geometry_type` pair the full codec; every other
/// attribute unwraps and stringifies. Columns absent on this entity render
/// as empty strings so row width stays uniform across a batch.
pub fn entity_to_row(entity: &Entity, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|column| cell_for(entity, column))
        .collect()
}

fn cell_for(entity: &Entity, column: &str) -> String {
    match column {
        "id" => entity.id.clone(),
        "type" => entity.entity_type.clone(),
        "geometry" => entity
            .location()
            .map(Geometry::to_geometry_cell)
            .unwrap_or_default(),
        "geometry_type" => entity
            .location()
            .map(|g| g.type_name().to_string())
            .unwrap_or_default(),
        "observedAt" => entity.observed_at().unwrap_or_default(),
        other => entity
            .attributes
            .get(other)
            .map(Attribute::cell_value)
            .unwrap_or_default(),
    }
}

/// Derive the export header for a batch of same-type entities: `id`,
/// `type`, then the union of attribute names across the whole batch,
/// sorted ascending.
pub fn csv_columns(entities: &[Entity]) -> Vec<String> {
    let mut names = BTreeSet::new();
    for entity in entities {
        names.extend(entity.attributes.keys().cloned());
    }
    let mut columns = vec!["id".to_string(), "type".to_string()];
    columns.extend(names);
    columns
}
