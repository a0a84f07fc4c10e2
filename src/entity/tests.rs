use super::*;
use crate::ngsi::ScalarValue;
use serde_json::json;

fn flood_sensor_document() -> String {
    json!({
        "@context": "https://uri.etsi.org/ngsi-ld/v1/ngsi-ld-core-context.jsonld",
        "id": "urn:ngsi-ld:FloodSensor:HCMC:42",
        "type": "FloodSensor",
        "waterLevel": {"type": "Property", "value": 1.5},
        "batteryLevel": {"type": "Property", "value": 0.82},
        "location": {
            "type": "GeoProperty",
            "value": {"type": "Point", "coordinates": [106.7, 10.8]}
        },
        "observedAt": {
            "type": "Property",
            "value": {"@type": "DateTime", "@value": "2025-06-01T00:00:00Z"}
        }
    })
    .to_string()
}

#[test]
fn test_parse_store_record() {
    let entity = Entity::from_store_record(&flood_sensor_document()).unwrap();

    assert_eq!(entity.id, "urn:ngsi-ld:FloodSensor:HCMC:42");
    assert_eq!(entity.entity_type, "FloodSensor");
    assert_eq!(
        entity.location(),
        Some(&Geometry::Point {
            coordinates: [106.7, 10.8]
        })
    );
    assert_eq!(
        entity.observed_at(),
        Some("2025-06-01T00:00:00Z".to_string())
    );
    assert_eq!(
        entity.attributes.get("waterLevel").unwrap().flat_value(),
        json!(1.5)
    );
}

#[test]
fn test_store_record_round_trip() {
    let entity = Entity::from_store_record(&flood_sensor_document()).unwrap();
    let serialized = entity.to_store_record().unwrap();
    let reparsed = Entity::from_store_record(&serialized).unwrap();
    assert_eq!(entity, reparsed);
}

#[test]
fn test_invalid_json_is_an_error() {
    assert!(Entity::from_store_record("not json").is_err());
}

#[test]
fn test_bare_observed_at_survives() {
    // Older seed documents keep observedAt as a bare string at the root
    let doc = json!({
        "id": "urn:ngsi-ld:EmergencyVehicle:HCMC:7",
        "type": "EmergencyVehicle",
        "speed": {"type": "Property", "value": 45},
        "observedAt": "2025-05-30T12:00:00Z"
    })
    .to_string();

    let entity = Entity::from_store_record(&doc).unwrap();
    assert_eq!(
        entity.observed_at(),
        Some("2025-05-30T12:00:00Z".to_string())
    );

    // And re-serializes in the same bare shape
    let round = serde_json::to_value(&entity).unwrap();
    assert_eq!(round["observedAt"], json!("2025-05-30T12:00:00Z"));
}

#[test]
fn test_context_passes_through_opaque() {
    let doc = json!({
        "@context": ["https://example.org/ctx-a.jsonld", "https://example.org/ctx-b.jsonld"],
        "id": "urn:ngsi-ld:FloodZone:HCMC:3",
        "type": "FloodZone"
    })
    .to_string();

    let entity = Entity::from_store_record(&doc).unwrap();
    let round = serde_json::to_value(&entity).unwrap();
    assert_eq!(
        round["@context"],
        json!(["https://example.org/ctx-a.jsonld", "https://example.org/ctx-b.jsonld"])
    );
}

#[test]
fn test_missing_location_is_none() {
    let mut entity = Entity::new("urn:ngsi-ld:FloodSensor:HCMC:1", "FloodSensor");
    entity.set("waterLevel", Attribute::scalar(ScalarValue::parse("1.2")));
    assert_eq!(entity.location(), None);
}

#[test]
fn test_attribute_order_is_sorted() {
    let mut entity = Entity::new("urn:ngsi-ld:FloodSensor:HCMC:1", "FloodSensor");
    entity.set("waterLevel", Attribute::scalar(ScalarValue::parse("1.2")));
    entity.set("batteryLevel", Attribute::scalar(ScalarValue::parse("0.9")));
    entity.set("active", Attribute::scalar(ScalarValue::parse("true")));

    let names: Vec<&String> = entity.attributes.keys().collect();
    assert_eq!(names, ["active", "batteryLevel", "waterLevel"]);
}
