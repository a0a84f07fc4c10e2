//! Typed traffic-flow station records.
//!
//! One relational row per observation station, mapped 1:1 to the
//! `TrafficFlowObserved` entity family. Feed documents arrive as plain
//! JSON; the record gives the fields names and types before they are
//! wrapped into attribute envelopes.

use crate::entity::Entity;
use crate::geometry::Geometry;
use crate::ngsi::{Attribute, ScalarValue};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Context documents for the transportation data model.
pub const TRAFFIC_CONTEXT: [&str; 2] = [
    "https://raw.githubusercontent.com/smart-data-models/dataModel.Transportation/master/context.jsonld",
    "https://uri.etsi.org/ngsi-ld/v1/ngsi-ld-core-context.jsonld",
];

/// One traffic observation station record.
#[derive(Clone, Debug, PartialEq)]
pub struct TrafficFlowRecord {
    pub entity_id: String,
    pub name: String,
    pub description: Option<String>,
    pub location_lon: f64,
    pub location_lat: f64,
    pub date_observed: Option<DateTime<Utc>>,
    pub intensity: i64,
    pub occupancy: f64,
    pub average_vehicle_speed: f64,
    pub average_vehicle_length: f64,
    pub congested: bool,
    pub lane_id: i64,
    pub ref_road_segment: Option<String>,
}

impl TrafficFlowRecord {
    /// Build a record from one plain-JSON feed document.
    ///
    /// Returns `None` when the document has no station id (a record
    /// without an identifier is skipped, not an error). Missing numeric
    /// fields default to zero, `laneId` to 1. Station and road-segment
    /// ids expand into their URN forms.
    pub fn from_feed(data: &Value) -> Option<TrafficFlowRecord> {
        let station_id = data
            .get("stationId")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())?;

        Some(TrafficFlowRecord {
            entity_id: format!("urn:ngsi-ld:TrafficFlowObserved:{}", station_id),
            name: str_field(data, "name"),
            description: data
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            location_lon: num_field(data, "longitude"),
            location_lat: num_field(data, "latitude"),
            date_observed: data
                .get("dateObserved")
                .and_then(Value::as_str)
                .and_then(parse_datetime),
            intensity: data.get("intensity").and_then(Value::as_i64).unwrap_or(0),
            occupancy: num_field(data, "occupancy"),
            average_vehicle_speed: num_field(data, "averageVehicleSpeed"),
            average_vehicle_length: num_field(data, "averageVehicleLength"),
            congested: data
                .get("congested")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            lane_id: data.get("laneId").and_then(Value::as_i64).unwrap_or(1),
            ref_road_segment: data
                .get("roadSegment")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(|s| format!("urn:ngsi-ld:RoadSegment:{}", s)),
        })
    }

    /// Convert to the canonical entity form.
    ///
    /// Scalar fields wrap as Properties, the station position as a Point
    /// GeoProperty, and the road-segment reference, when present, as a
    /// Relationship. Unset optional fields are left off the entity.
    pub fn to_entity(&self) -> Entity {
        let mut entity = Entity::new(self.entity_id.clone(), "TrafficFlowObserved");
        entity.context = Some(json!(TRAFFIC_CONTEXT));

        entity.set(
            "name",
            Attribute::scalar(ScalarValue::Text(self.name.clone())),
        );
        entity.set(
            "description",
            Attribute::scalar(ScalarValue::Text(
                self.description.clone().unwrap_or_default(),
            )),
        );
        entity.set(
            "location",
            Attribute::geometry(Geometry::Point {
                coordinates: [self.location_lon, self.location_lat],
            }),
        );
        if let Some(observed) = &self.date_observed {
            entity.set(
                "dateObserved",
                Attribute::scalar(ScalarValue::Text(
                    observed.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
                )),
            );
        }
        entity.set(
            "intensity",
            Attribute::scalar(ScalarValue::Int(self.intensity)),
        );
        entity.set(
            "occupancy",
            Attribute::scalar(ScalarValue::Float(self.occupancy)),
        );
        entity.set(
            "averageVehicleSpeed",
            Attribute::scalar(ScalarValue::Float(self.average_vehicle_speed)),
        );
        entity.set(
            "averageVehicleLength",
            Attribute::scalar(ScalarValue::Float(self.average_vehicle_length)),
        );
        entity.set(
            "congested",
            Attribute::scalar(ScalarValue::Bool(self.congested)),
        );
        entity.set("laneId", Attribute::scalar(ScalarValue::Int(self.lane_id)));
        if let Some(segment) = &self.ref_road_segment {
            entity.set("refRoadSegment", Attribute::relationship(segment.clone()));
        }
        entity
    }
}

fn str_field(data: &Value, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn num_field(data: &Value, key: &str) -> f64 {
    data.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Parse an ISO 8601 timestamp, tolerating both offset and `Z` suffixes.
fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
