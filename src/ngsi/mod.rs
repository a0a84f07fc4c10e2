// NGSI-LD attribute envelopes and scalar cell typing
pub mod scalar;

pub use scalar::ScalarValue;

use crate::geometry::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker for the DateTime sub-envelope; only the literal `"DateTime"`
/// matches on deserialize.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum DateTimeTag {
    DateTime,
}

/// The `{"@type": "DateTime", "@value": "<iso8601>"}` marker nested inside
/// a Property value for timestamps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DateTimeValue {
    #[serde(rename = "@type")]
    pub tag: DateTimeTag,
    #[serde(rename = "@value")]
    pub value: String,
}

/// Payload of a Property: either the DateTime sub-envelope or a plain JSON
/// value. The DateTime form is tried first so a matching `@type`/`@value`
/// object never falls through to the opaque scalar arm.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    DateTime(DateTimeValue),
    Scalar(Value),
}

/// NGSI-LD attribute envelope, discriminated on the `type` tag.
///
/// The three envelope kinds are Property (scalar value), GeoProperty
/// (geometry value) and Relationship (reference to another entity by id).
/// An unknown fourth tag is a deserialize error at this level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    Property { value: PropertyValue },
    GeoProperty { value: Geometry },
    Relationship { object: String },
}

/// An entity attribute: a recognized envelope, or a raw value carried
/// through verbatim.
///
/// The raw arm absorbs historical documents where `observedAt` sits at the
/// root as a bare string, and preserves structures this crate does not
/// model (unsupported geometry kinds, deeply nested values) byte-for-byte
/// across a store round trip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    Wrapped(Envelope),
    Raw(Value),
}

impl Attribute {
    /// Wrap a classified scalar as a Property.
    pub fn scalar(value: ScalarValue) -> Attribute {
        Attribute::Wrapped(Envelope::Property {
            value: PropertyValue::Scalar(value.to_json()),
        })
    }

    /// Wrap an ISO 8601 timestamp as a Property with the DateTime
    /// sub-envelope (the `observedAt` form).
    pub fn date_time(iso: impl Into<String>) -> Attribute {
        Attribute::Wrapped(Envelope::Property {
            value: PropertyValue::DateTime(DateTimeValue {
                tag: DateTimeTag::DateTime,
                value: iso.into(),
            }),
        })
    }

    /// Wrap a geometry as a GeoProperty.
    pub fn geometry(geometry: Geometry) -> Attribute {
        Attribute::Wrapped(Envelope::GeoProperty { value: geometry })
    }

    /// Wrap a reference to another entity as a Relationship.
    pub fn relationship(object: impl Into<String>) -> Attribute {
        Attribute::Wrapped(Envelope::Relationship {
            object: object.into(),
        })
    }

    /// Unwrap to the native JSON value.
    ///
    /// Recovers exactly what was wrapped: plain Properties yield their
    /// value, DateTime Properties peel down to the ISO string, GeoProperties
    /// yield the geometry document, Relationships their target id. Raw
    /// attributes pass through unchanged.
    pub fn flat_value(&self) -> Value {
        match self {
            Attribute::Wrapped(Envelope::Property {
                value: PropertyValue::Scalar(v),
            }) => v.clone(),
            Attribute::Wrapped(Envelope::Property {
                value: PropertyValue::DateTime(dt),
            }) => Value::String(dt.value.clone()),
            Attribute::Wrapped(Envelope::GeoProperty { value }) => {
                serde_json::to_value(value).unwrap_or(Value::Null)
            }
            Attribute::Wrapped(Envelope::Relationship { object }) => {
                Value::String(object.clone())
            }
            Attribute::Raw(v) => v.clone(),
        }
    }

    /// Render to a flattened cell string. Geometries collapse to their
    /// lossy display form; everything else stringifies its unwrapped value.
    pub fn cell_value(&self) -> String {
        match self {
            Attribute::Wrapped(Envelope::GeoProperty { value }) => value.to_display_cell(),
            _ => ScalarValue::cell_from_json(&self.flat_value()),
        }
    }

    /// The geometry, when this attribute is a GeoProperty.
    pub fn as_geometry(&self) -> Option<&Geometry> {
        match self {
            Attribute::Wrapped(Envelope::GeoProperty { value }) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_unwrap() {
        let attr: Attribute = serde_json::from_value(json!({
            "type": "Property",
            "value": 42
        }))
        .unwrap();
        assert_eq!(attr.flat_value(), json!(42));
    }

    #[test]
    fn test_date_time_unwrap() {
        let attr: Attribute = serde_json::from_value(json!({
            "type": "Property",
            "value": {"@type": "DateTime", "@value": "2025-01-01T00:00:00Z"}
        }))
        .unwrap();
        assert_eq!(attr.flat_value(), json!("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn test_wrap_unwrap_is_exact() {
        for value in [json!(1.5), json!(200), json!(true), json!("urban_road")] {
            let attr = Attribute::Wrapped(Envelope::Property {
                value: PropertyValue::Scalar(value.clone()),
            });
            assert_eq!(attr.flat_value(), value);
        }
    }

    #[test]
    fn test_scalar_wrap_serialization() {
        let attr = Attribute::scalar(ScalarValue::parse("1.5"));
        let doc = serde_json::to_value(&attr).unwrap();
        assert_eq!(doc, json!({"type": "Property", "value": 1.5}));
    }

    #[test]
    fn test_date_time_wrap_serialization() {
        let attr = Attribute::date_time("2025-06-01T00:00:00Z");
        let doc = serde_json::to_value(&attr).unwrap();
        assert_eq!(
            doc,
            json!({
                "type": "Property",
                "value": {"@type": "DateTime", "@value": "2025-06-01T00:00:00Z"}
            })
        );
    }

    #[test]
    fn test_relationship() {
        let attr: Attribute = serde_json::from_value(json!({
            "type": "Relationship",
            "object": "urn:ngsi-ld:MedicalFacility:HCMC:1"
        }))
        .unwrap();
        assert_eq!(attr.flat_value(), json!("urn:ngsi-ld:MedicalFacility:HCMC:1"));
    }

    #[test]
    fn test_geo_property_parses_into_geometry() {
        let attr: Attribute = serde_json::from_value(json!({
            "type": "GeoProperty",
            "value": {"type": "Point", "coordinates": [106.7, 10.8]}
        }))
        .unwrap();
        let geometry = attr.as_geometry().unwrap();
        assert_eq!(
            geometry,
            &Geometry::Point {
                coordinates: [106.7, 10.8]
            }
        );
    }

    #[test]
    fn test_bare_value_passes_through() {
        // Legacy documents keep observedAt as a bare string at the root
        let attr: Attribute = serde_json::from_value(json!("2025-06-01T00:00:00Z")).unwrap();
        assert_eq!(attr, Attribute::Raw(json!("2025-06-01T00:00:00Z")));
        assert_eq!(attr.flat_value(), json!("2025-06-01T00:00:00Z"));
    }

    #[test]
    fn test_unmodeled_envelope_passes_through_verbatim() {
        let doc = json!({
            "type": "GeoProperty",
            "value": {"type": "MultiPoint", "coordinates": [[1.0, 2.0]]}
        });
        let attr: Attribute = serde_json::from_value(doc.clone()).unwrap();
        // Not a modeled geometry, so it lands in the raw arm unchanged
        assert_eq!(attr, Attribute::Raw(doc.clone()));
        assert_eq!(serde_json::to_value(&attr).unwrap(), doc);
    }

    #[test]
    fn test_geometry_cell_value_is_display_form() {
        let attr = Attribute::geometry(Geometry::LineString {
            coordinates: vec![[106.7, 10.8], [106.71, 10.81], [106.72, 10.82]],
        });
        assert_eq!(attr.cell_value(), "LineString with 3 points");
    }
}
