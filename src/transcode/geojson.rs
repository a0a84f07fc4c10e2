use crate::entity::Entity;
use crate::geometry::Geometry;
use crate::ngsi::ScalarValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
enum CollectionTag {
    FeatureCollection,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
enum FeatureTag {
    Feature,
}

/// A GeoJSON FeatureCollection document. Anything whose `type` is not
/// literally `"FeatureCollection"` fails to parse, which callers treat as
/// a skip-this-file outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    tag: CollectionTag,
    pub features: Vec<Feature>,
}

/// One GeoJSON Feature: a geometry paired with a flat property mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    tag: FeatureTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection {
            tag: CollectionTag::FeatureCollection,
            features,
        }
    }
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Map<String, Value>) -> Feature {
        Feature {
            tag: FeatureTag::Feature,
            geometry: Some(geometry),
            properties,
        }
    }
}

/// Convert a batch of same-type entities into a FeatureCollection.
///
/// Each entity becomes one Feature: its location as a native GeoJSON
/// geometry, its remaining attributes unwrapped to native values (numbers,
/// booleans and strings stay typed, never stringified). Entities without a
/// decodable location are dropped; a null-geometry Feature is never
/// emitted. Property key sets are per-feature in this direction, since
/// GeoJSON features are independent. Input order is preserved.
pub fn to_feature_collection(entities: &[Entity]) -> FeatureCollection {
    let mut features = Vec::new();
    for entity in entities {
        let geometry = match entity.location() {
            Some(g) => g.clone(),
            None => continue,
        };

        let mut properties = Map::new();
        properties.insert("id".to_string(), Value::String(entity.id.clone()));
        properties.insert(
            "type".to_string(),
            Value::String(entity.entity_type.clone()),
        );
        for (name, attribute) in &entity.attributes {
            if name == "location" {
                continue;
            }
            properties.insert(name.clone(), attribute.flat_value());
        }

        features.push(Feature::new(geometry, properties));
    }
    FeatureCollection::new(features)
}

/// Flatten a FeatureCollection into a header and rows.
///
/// The header is the union of property names across ALL features (a
/// feature missing a property still gets the column, filled with an empty
/// string): `id`, `type` first, the rest sorted ascending, then
/// `geometry_type` and `geometry` appended last. Geometries stringify via
/// the Point cell or the JSON coordinate array depending on variant.
/// Feature order carries through to row order.
pub fn feature_collection_to_rows(fc: &FeatureCollection) -> (Vec<String>, Vec<Vec<String>>) {
    let mut names: BTreeSet<String> = BTreeSet::new();
    for feature in &fc.features {
        names.extend(feature.properties.keys().cloned());
    }
    for fixed in ["id", "type", "geometry_type", "geometry"] {
        names.remove(fixed);
    }

    let mut header = vec!["id".to_string(), "type".to_string()];
    header.extend(names);
    header.push("geometry_type".to_string());
    header.push("geometry".to_string());

    let rows = fc
        .features
        .iter()
        .map(|feature| {
            header
                .iter()
                .map(|column| feature_cell(feature, column))
                .collect()
        })
        .collect();

    (header, rows)
}

fn feature_cell(feature: &Feature, column: &str) -> String {
    match column {
        "geometry_type" => feature
            .geometry
            .as_ref()
            .map(|g| g.type_name().to_string())
            .unwrap_or_default(),
        "geometry" => feature
            .geometry
            .as_ref()
            .map(Geometry::to_geometry_cell)
            .unwrap_or_default(),
        other => feature
            .properties
            .get(other)
            .map(ScalarValue::cell_from_json)
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ngsi::Attribute;
    use serde_json::json;

    fn entity_with_point(id: &str, lon: f64, lat: f64) -> Entity {
        let mut entity = Entity::new(id, "FloodSensor");
        entity.set(
            "location",
            Attribute::geometry(Geometry::Point {
                coordinates: [lon, lat],
            }),
        );
        entity
    }

    #[test]
    fn test_entities_become_features() {
        let mut a = entity_with_point("urn:ngsi-ld:FloodSensor:HCMC:1", 106.7, 10.8);
        a.set("waterLevel", Attribute::scalar(ScalarValue::parse("1.5")));
        a.set("observedAt", Attribute::date_time("2025-06-01T00:00:00Z"));

        let fc = to_feature_collection(&[a]);
        assert_eq!(fc.features.len(), 1);

        let feature = &fc.features[0];
        assert_eq!(
            feature.geometry,
            Some(Geometry::Point {
                coordinates: [106.7, 10.8]
            })
        );
        // Values stay native, the DateTime envelope peels to its string
        assert_eq!(feature.properties["waterLevel"], json!(1.5));
        assert_eq!(feature.properties["observedAt"], json!("2025-06-01T00:00:00Z"));
        assert_eq!(feature.properties["id"], json!("urn:ngsi-ld:FloodSensor:HCMC:1"));
        assert_eq!(feature.properties["type"], json!("FloodSensor"));
        assert!(!feature.properties.contains_key("location"));
    }

    #[test]
    fn test_entity_without_location_is_dropped() {
        let mut no_location = Entity::new("urn:ngsi-ld:FloodSensor:HCMC:2", "FloodSensor");
        no_location.set("waterLevel", Attribute::scalar(ScalarValue::parse("0.4")));
        let with_location = entity_with_point("urn:ngsi-ld:FloodSensor:HCMC:3", 106.7, 10.8);

        let fc = to_feature_collection(&[no_location, with_location]);
        assert_eq!(fc.features.len(), 1);
        assert_eq!(
            fc.features[0].properties["id"],
            json!("urn:ngsi-ld:FloodSensor:HCMC:3")
        );
    }

    #[test]
    fn test_row_header_is_union_of_all_features() {
        let mut a = entity_with_point("urn:1", 106.7, 10.8);
        a.set("x", Attribute::scalar(ScalarValue::parse("5")));
        let mut b = entity_with_point("urn:2", 106.8, 10.9);
        b.set("y", Attribute::scalar(ScalarValue::parse("hi")));

        let fc = to_feature_collection(&[a, b]);
        let (header, rows) = feature_collection_to_rows(&fc);

        assert_eq!(
            header,
            ["id", "type", "x", "y", "geometry_type", "geometry"]
        );
        assert_eq!(rows.len(), 2);

        let x_col = header.iter().position(|c| c == "x").unwrap();
        let y_col = header.iter().position(|c| c == "y").unwrap();
        assert_eq!(rows[0][x_col], "5");
        assert_eq!(rows[0][y_col], "");
        assert_eq!(rows[1][x_col], "");
        assert_eq!(rows[1][y_col], "hi");
    }

    #[test]
    fn test_geometry_columns_render_by_variant() {
        let mut line = Entity::new("urn:3", "TrafficFlowObserved");
        line.set(
            "location",
            Attribute::geometry(Geometry::LineString {
                coordinates: vec![[106.7, 10.8], [106.71, 10.81]],
            }),
        );
        let point = entity_with_point("urn:4", 106.7, 10.8);

        let fc = to_feature_collection(&[line, point]);
        let (header, rows) = feature_collection_to_rows(&fc);

        let type_col = header.iter().position(|c| c == "geometry_type").unwrap();
        let geom_col = header.iter().position(|c| c == "geometry").unwrap();
        assert_eq!(rows[0][type_col], "LineString");
        assert_eq!(rows[0][geom_col], "[[106.7,10.8],[106.71,10.81]]");
        assert_eq!(rows[1][type_col], "Point");
        assert_eq!(rows[1][geom_col], "10.8,106.7");
    }

    #[test]
    fn test_row_order_follows_feature_order() {
        let ids = ["urn:c", "urn:a", "urn:b"];
        let entities: Vec<Entity> = ids
            .iter()
            .map(|&id| entity_with_point(id, 106.7, 10.8))
            .collect();

        let fc = to_feature_collection(&entities);
        let (header, rows) = feature_collection_to_rows(&fc);
        let id_col = header.iter().position(|c| c == "id").unwrap();
        let seen: Vec<&str> = rows.iter().map(|r| r[id_col].as_str()).collect();
        assert_eq!(seen, ids);
    }

    #[test]
    fn test_non_feature_collection_fails_to_parse() {
        let doc = json!({"type": "Feature", "geometry": null, "properties": {}});
        assert!(serde_json::from_value::<FeatureCollection>(doc).is_err());
    }

    #[test]
    fn test_feature_collection_document_round_trip() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [106.7, 10.8]},
                "properties": {"id": "urn:1", "type": "FloodSensor", "waterLevel": 1.5}
            }]
        });
        let fc: FeatureCollection = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(serde_json::to_value(&fc).unwrap(), doc);
    }
}
