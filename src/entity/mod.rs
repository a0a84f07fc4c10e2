use crate::geometry::Geometry;
use crate::ngsi::{Attribute, Envelope, PropertyValue};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[cfg(test)]
mod tests;

/// Attribute names that receive special handling during transcoding.
///
/// `id` and `type` identify the entity, `location` carries its geometry,
/// `observedAt` its timestamp; `geometry` and `geometry_type` are the
/// flattened-export column pair for the geometry.
pub const RESERVED_FIELDS: [&str; 6] = [
    "id",
    "type",
    "location",
    "observedAt",
    "geometry",
    "geometry_type",
];

/// Canonical smart-city entity: the in-memory record unifying the tabular,
/// geographic and semantic representations.
///
/// Serde round-trips the full NGSI-LD document: `id` and `type` are named
/// fields, `@context` passes through opaquely, and every other key lands in
/// the attribute map. The map is ordered so derived column sets come out
/// deterministic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// `@context` document reference, carried verbatim.
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Stable identifier, `urn:ngsi-ld:<Type>:<namespace>:<uuid>` by
    /// convention.
    pub id: String,

    /// Schema family tag (e.g. "FloodSensor", "TrafficFlowObserved").
    #[serde(rename = "type")]
    pub entity_type: String,

    /// All remaining attributes, keyed by name.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Attribute>,
}

impl Entity {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Entity {
        Entity {
            context: None,
            id: id.into(),
            entity_type: entity_type.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Parse a stored NGSI-LD JSON document into the canonical form.
    ///
    /// Attributes arrive already enveloped, so this is an unwrap pass: the
    /// semantically-typed values survive exactly, with no heuristic
    /// re-decoding. This is the high-fidelity path, preferred over flattened
    /// round trips whenever the store is available.
    pub fn from_store_record(json: &str) -> Result<Entity> {
        serde_json::from_str(json).context("Failed to parse stored entity document")
    }

    /// Serialize to the stored NGSI-LD JSON document.
    pub fn to_store_record(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize entity document")
    }

    /// The entity's location geometry, when present and modeled.
    pub fn location(&self) -> Option<&Geometry> {
        self.attributes.get("location")?.as_geometry()
    }

    /// The `observedAt` timestamp as an ISO 8601 string, whichever
    /// historical shape it was stored in (DateTime Property or bare
    /// root-level string).
    pub fn observed_at(&self) -> Option<String> {
        match self.attributes.get("observedAt")? {
            Attribute::Wrapped(Envelope::Property {
                value: PropertyValue::DateTime(dt),
            }) => Some(dt.value.clone()),
            Attribute::Wrapped(Envelope::Property {
                value: PropertyValue::Scalar(Value::String(s)),
            }) => Some(s.clone()),
            Attribute::Raw(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// Insert or replace an attribute.
    pub fn set(&mut self, name: impl Into<String>, attribute: Attribute) {
        self.attributes.insert(name.into(), attribute);
    }
}
