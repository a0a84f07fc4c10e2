use serde::{Deserialize, Serialize};

/// A coordinate pair in `[longitude, latitude]` order.
///
/// Every structured representation stores coordinates this way. The one
/// exception is the flattened Point cell, which reads `"latitude,longitude"`
/// by convention; the inversion is applied on both encode and decode.
pub type Position = [f64; 2];

/// Geometry of an entity location, discriminated on the GeoJSON `type` tag.
///
/// A document carrying any other tag (e.g. `MultiPoint`) fails to
/// deserialize rather than being silently mishandled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
}

impl Geometry {
    /// GeoJSON type tag for this variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::LineString { .. } => "LineString",
            Geometry::Polygon { .. } => "Polygon",
        }
    }

    /// Decode a flattened Point cell of the form `"lat,lon"`.
    ///
    /// Exactly two comma-separated parts, both parsing as floats. Any
    /// malformed input yields `None`; callers drop the geometry silently,
    /// never fail the row.
    pub fn from_point_cell(cell: &str) -> Option<Geometry> {
        let parts: Vec<&str> = cell.split(',').collect();
        if parts.len() != 2 {
            return None;
        }
        let lat = parts[0].trim().parse::<f64>().ok()?;
        let lon = parts[1].trim().parse::<f64>().ok()?;
        Some(Geometry::Point {
            coordinates: [lon, lat],
        })
    }

    /// Decode a JSON-encoded coordinate array cell, dispatched on an
    /// explicit geometry type column.
    ///
    /// The type column is authoritative; no prefix sniffing happens here.
    /// Decode is permissive: no ring-closure or point-count validation.
    /// Unknown types and parse failures yield `None`.
    pub fn from_typed_cell(geometry_type: &str, cell: &str) -> Option<Geometry> {
        match geometry_type {
            "Point" => Geometry::from_point_cell(cell),
            "LineString" => serde_json::from_str::<Vec<Position>>(cell)
                .ok()
                .map(|coordinates| Geometry::LineString { coordinates }),
            "Polygon" => serde_json::from_str::<Vec<Vec<Position>>>(cell)
                .ok()
                .map(|coordinates| Geometry::Polygon { coordinates }),
            _ => None,
        }
    }

    /// Encode for the `geometry` column: Points use the `"lat,lon"` cell,
    /// LineStrings and Polygons their JSON coordinate arrays.
    pub fn to_geometry_cell(&self) -> String {
        match self {
            Geometry::Point { coordinates } => {
                format!("{},{}", coordinates[1], coordinates[0])
            }
            _ => self.to_coords_cell(),
        }
    }

    /// JSON serialization of the coordinates alone (no type tag).
    pub fn to_coords_cell(&self) -> String {
        let encoded = match self {
            Geometry::Point { coordinates } => serde_json::to_string(coordinates),
            Geometry::LineString { coordinates } => serde_json::to_string(coordinates),
            Geometry::Polygon { coordinates } => serde_json::to_string(coordinates),
        };
        encoded.unwrap_or_default()
    }

    /// Lossy human-readable cell for flattened display exports.
    ///
    /// One-way only; this output must never be fed back into a decoder.
    /// Points keep their `"lat,lon"` form, richer geometries collapse to a
    /// summary (vertex count = size of the outer ring).
    pub fn to_display_cell(&self) -> String {
        match self {
            Geometry::Point { coordinates } => {
                format!("{},{}", coordinates[1], coordinates[0])
            }
            Geometry::LineString { coordinates } => {
                format!("LineString with {} points", coordinates.len())
            }
            Geometry::Polygon { coordinates } => {
                let vertices = coordinates.first().map(Vec::len).unwrap_or(0);
                format!("Polygon with {} vertices", vertices)
            }
        }
    }

    /// True when a lone `location` cell holds a lossy display placeholder
    /// rather than decodable coordinates.
    ///
    /// Such cells defer to a richer data source; the geometry is dropped,
    /// never guessed.
    pub fn is_placeholder_cell(cell: &str) -> bool {
        cell.starts_with("LineString") || cell.starts_with("Polygon")
    }
}
