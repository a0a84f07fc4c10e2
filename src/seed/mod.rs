//! Randomized seed data for a city deployment.
//!
//! Generates the six entity families over real Ho Chi Minh City geography:
//! road segments as LineStrings, clustered incident/vehicle/facility/sensor
//! Points, and irregular FloodZone Polygons around known flood-prone
//! centers. Zone, road and waterway tables are built in; they double as the
//! richer source that flattened placeholder cells defer to.

use crate::config::SeedConfig;
use crate::entity::Entity;
use crate::geometry::Geometry;
use crate::ngsi::{Attribute, ScalarValue};
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

/// A district with bounding box, sampling weight and landmark cluster
/// centers (latitude, longitude).
struct Zone {
    lat: (f64, f64),
    lon: (f64, f64),
    weight: f64,
    landmarks: &'static [(f64, f64)],
    urban: bool,
    flood_prone: bool,
}

// HCMC metropolitan area, 106.356-107.027 lon / 10.372-11.160 lat
static ZONES: &[Zone] = &[
    // District 1 (Central)
    Zone {
        lat: (10.762, 10.792),
        lon: (106.690, 106.712),
        weight: 0.12,
        landmarks: &[(10.777, 106.701), (10.770, 106.695), (10.780, 106.705)],
        urban: true,
        flood_prone: false,
    },
    // District 3
    Zone {
        lat: (10.765, 10.795),
        lon: (106.660, 106.690),
        weight: 0.10,
        landmarks: &[(10.780, 106.675), (10.770, 106.680), (10.785, 106.670)],
        urban: true,
        flood_prone: false,
    },
    // District 7 (Phu My Hung)
    Zone {
        lat: (10.720, 10.750),
        lon: (106.700, 106.740),
        weight: 0.15,
        landmarks: &[(10.735, 106.720), (10.728, 106.715), (10.742, 106.725)],
        urban: true,
        flood_prone: true,
    },
    // Thu Duc City
    Zone {
        lat: (10.820, 10.900),
        lon: (106.730, 106.820),
        weight: 0.20,
        landmarks: &[(10.850, 106.770), (10.865, 106.785), (10.835, 106.750)],
        urban: false,
        flood_prone: true,
    },
    // Binh Thanh District
    Zone {
        lat: (10.795, 10.825),
        lon: (106.690, 106.720),
        weight: 0.12,
        landmarks: &[(10.810, 106.705), (10.805, 106.698), (10.818, 106.712)],
        urban: true,
        flood_prone: true,
    },
    // Tan Binh District (Airport)
    Zone {
        lat: (10.790, 10.825),
        lon: (106.640, 106.675),
        weight: 0.11,
        landmarks: &[(10.810, 106.658), (10.800, 106.650), (10.818, 106.665)],
        urban: true,
        flood_prone: false,
    },
    // Go Vap District
    Zone {
        lat: (10.820, 10.860),
        lon: (106.650, 106.690),
        weight: 0.10,
        landmarks: &[(10.840, 106.670), (10.835, 106.665), (10.848, 106.680)],
        urban: false,
        flood_prone: false,
    },
    // Can Gio District
    Zone {
        lat: (10.372, 10.450),
        lon: (106.850, 106.950),
        weight: 0.05,
        landmarks: &[(10.410, 106.900), (10.395, 106.880), (10.425, 106.920)],
        urban: false,
        flood_prone: true,
    },
    // Cu Chi District
    Zone {
        lat: (10.950, 11.050),
        lon: (106.450, 106.550),
        weight: 0.05,
        landmarks: &[(11.000, 106.500), (10.980, 106.480), (11.020, 106.520)],
        urban: false,
        flood_prone: false,
    },
];

struct Road {
    name: &'static str,
    highway: &'static str,
    coords: &'static [[f64; 2]],
}

static MAJOR_ROADS: &[Road] = &[
    Road {
        name: "Võ Văn Kiệt Boulevard",
        highway: "primary",
        coords: &[[106.640, 10.760], [106.650, 10.760], [106.680, 10.760], [106.710, 10.760]],
    },
    Road {
        name: "Xa Lộ Hà Nội (Hanoi Highway)",
        highway: "trunk",
        coords: &[[106.700, 10.780], [106.730, 10.805], [106.760, 10.830], [106.780, 10.850]],
    },
    Road {
        name: "Nguyễn Văn Linh",
        highway: "primary",
        coords: &[[106.680, 10.720], [106.695, 10.730], [106.710, 10.740], [106.730, 10.750]],
    },
    Road {
        name: "Quốc Lộ 1A (QL1A)",
        highway: "trunk",
        coords: &[[106.640, 10.780], [106.650, 10.800], [106.660, 10.820], [106.680, 10.850]],
    },
    Road {
        name: "East-West Highway",
        highway: "motorway",
        coords: &[[106.690, 10.775], [106.720, 10.775], [106.750, 10.775], [106.780, 10.775]],
    },
    Road {
        name: "Phạm Văn Đồng",
        highway: "primary",
        coords: &[[106.650, 10.800], [106.670, 10.815], [106.690, 10.830], [106.710, 10.845]],
    },
    Road {
        name: "Đường Võ Nguyên Giáp",
        highway: "primary",
        coords: &[[106.730, 10.780], [106.750, 10.795], [106.770, 10.810], [106.790, 10.825]],
    },
    Road {
        name: "Cách Mạng Tháng 8",
        highway: "primary",
        coords: &[[106.665, 10.770], [106.670, 10.780], [106.675, 10.790], [106.680, 10.800]],
    },
    Road {
        name: "Đinh Tiên Hoàng",
        highway: "secondary",
        coords: &[[106.695, 10.770], [106.700, 10.775], [106.705, 10.780], [106.710, 10.785]],
    },
    Road {
        name: "Trần Hưng Đạo",
        highway: "primary",
        coords: &[[106.680, 10.755], [106.690, 10.760], [106.700, 10.765], [106.710, 10.770]],
    },
];

struct Corridor {
    lat: (f64, f64),
    lon: (f64, f64),
}

// Waterway corridors for flood sensor placement
static WATERWAYS: &[Corridor] = &[
    Corridor { lat: (10.720, 10.820), lon: (106.680, 106.740) }, // Saigon River
    Corridor { lat: (10.750, 10.950), lon: (106.780, 106.880) }, // Dong Nai River
    Corridor { lat: (10.760, 10.775), lon: (106.690, 106.710) }, // Ben Nghe Canal
    Corridor { lat: (10.760, 10.780), lon: (106.650, 106.680) }, // Tau Hu Canal
    Corridor { lat: (10.650, 10.730), lon: (106.720, 106.780) }, // Nha Be River
];

struct FloodArea {
    name: &'static str,
    center: (f64, f64),
    severity: &'static str,
    area_type: &'static str,
}

static FLOOD_AREAS: &[FloodArea] = &[
    FloodArea { name: "Nguyễn Hữu Cảnh", center: (10.792, 106.715), severity: "high", area_type: "urban_road" },
    FloodArea { name: "Thảo Điền", center: (10.805, 106.740), severity: "high", area_type: "residential" },
    FloodArea { name: "Bình Thạnh - Xô Viết Nghệ Tĩnh", center: (10.800, 106.705), severity: "medium", area_type: "urban_road" },
    FloodArea { name: "Quận 8 - Bến Phú Định", center: (10.740, 106.660), severity: "high", area_type: "canal_side" },
    FloodArea { name: "Hàng Xanh Intersection", center: (10.803, 106.710), severity: "medium", area_type: "intersection" },
    FloodArea { name: "An Phú - Xa Lộ Hà Nội", center: (10.798, 106.745), severity: "medium", area_type: "highway" },
    FloodArea { name: "Linh Đông - Phạm Văn Đồng", center: (10.852, 106.725), severity: "high", area_type: "urban_road" },
    FloodArea { name: "Thủ Đức - Võ Văn Ngân", center: (10.850, 106.755), severity: "medium", area_type: "urban_road" },
    FloodArea { name: "Phú Mỹ Hưng - Nguyễn Văn Linh", center: (10.728, 106.715), severity: "low", area_type: "urban_road" },
    FloodArea { name: "Nhà Bè - Lê Văn Lương", center: (10.695, 106.730), severity: "high", area_type: "lowland" },
    FloodArea { name: "Tân Bình - Cộng Hòa", center: (10.800, 106.650), severity: "medium", area_type: "urban_road" },
    FloodArea { name: "Tân Phú - Âu Cơ", center: (10.785, 106.635), severity: "medium", area_type: "canal_side" },
    FloodArea { name: "Gò Vấp - Nguyễn Oanh", center: (10.845, 106.670), severity: "medium", area_type: "urban_road" },
    FloodArea { name: "Bình Tân - Tên Lửa", center: (10.752, 106.595), severity: "high", area_type: "residential" },
    FloodArea { name: "Quận 6 - Hậu Giang", center: (10.753, 106.635), severity: "high", area_type: "canal_side" },
    FloodArea { name: "Quận 11 - Lạc Long Quân", center: (10.770, 106.640), severity: "medium", area_type: "canal_side" },
    FloodArea { name: "Bình Chánh - Quốc Lộ 1A", center: (10.705, 106.580), severity: "high", area_type: "lowland" },
    FloodArea { name: "Hóc Môn - Phan Văn Hớn", center: (10.885, 106.605), severity: "medium", area_type: "agricultural" },
    FloodArea { name: "Củ Chi - Tỉnh Lộ 8", center: (10.970, 106.495), severity: "low", area_type: "agricultural" },
    FloodArea { name: "Cần Giờ - Ven Biển", center: (10.415, 106.895), severity: "high", area_type: "coastal" },
];

static FACILITY_NAMES: &[&str] = &[
    "HCMC General Hospital",
    "Cho Ray Hospital",
    "115 People's Hospital",
    "University Medical Center",
    "Phu Nhuan Hospital",
    "Binh Thanh Clinic",
    "District 1 Medical Center",
    "Tan Binh Hospital",
    "City Children's Hospital",
    "Heart Institute",
    "Thu Duc Hospital",
    "District 7 Medical Center",
];

/// Generate the full randomized city dataset.
pub fn generate_city(config: &SeedConfig) -> Vec<Entity> {
    let mut rng = rand::thread_rng();
    generate_city_with_rng(config, &mut rng)
}

/// Same as [`generate_city`], with a caller-supplied RNG for
/// reproducibility.
pub fn generate_city_with_rng<R: Rng>(config: &SeedConfig, rng: &mut R) -> Vec<Entity> {
    let mut entities = Vec::new();
    entities.extend(traffic_flow_observed(config, rng));
    entities.extend(emergency_incidents(config, rng));
    entities.extend(emergency_vehicles(config, rng));
    entities.extend(medical_facilities(config, rng));
    entities.extend(flood_sensors(config, rng));
    entities.extend(flood_zones(config, rng));
    entities
}

fn traffic_flow_observed<R: Rng>(config: &SeedConfig, rng: &mut R) -> Vec<Entity> {
    let count = count_in(rng, config.traffic_flow);
    (0..count)
        .map(|i| {
            let road = &MAJOR_ROADS[i % MAJOR_ROADS.len()];
            let mut entity = new_entity("TrafficFlowObserved", config, rng);
            entity.set(
                "location",
                Attribute::geometry(Geometry::LineString {
                    coordinates: road.coords.to_vec(),
                }),
            );
            entity.set("roadName", text(road.name));
            entity.set("roadClass", text(road.highway));
            entity.set(
                "congestionIndex",
                float(round3(rng.gen_range(0.0..1.0))),
            );
            entity.set("averageVehicleSpeed", int(rng.gen_range(5..=60)));
            entity.set("vehicleCount", int(rng.gen_range(10..=200)));
            entity
        })
        .collect()
}

fn emergency_incidents<R: Rng>(config: &SeedConfig, rng: &mut R) -> Vec<Entity> {
    let incident_types = ["Fire", "TrafficAccident", "Flooding", "MedicalEmergency"];
    let severities = ["Low", "Medium", "High", "Critical"];
    let statuses = ["Active", "Dispatching", "Resolved"];

    let count = count_in(rng, config.incidents);
    (0..count)
        .map(|_| {
            let zone = weighted_zone(rng);
            let mut entity = new_entity("EmergencyIncident", config, rng);
            entity.set("incidentType", text(pick(rng, &incident_types)));
            entity.set("severity", text(pick(rng, &severities)));
            entity.set("status", text(pick(rng, &statuses)));
            entity.set("location", point(clustered_point(rng, zone, 0.003)));
            entity
        })
        .collect()
}

fn emergency_vehicles<R: Rng>(config: &SeedConfig, rng: &mut R) -> Vec<Entity> {
    let vehicle_types = ["Ambulance", "FireTruck", "PoliceCar"];
    let statuses = ["Available", "OnMission", "Maintenance"];

    let count = count_in(rng, config.vehicles);
    (0..count)
        .map(|_| {
            let zone = &ZONES[rng.gen_range(0..ZONES.len())];
            let mut entity = new_entity("EmergencyVehicle", config, rng);
            entity.set("vehicleType", text(pick(rng, &vehicle_types)));
            entity.set("status", text(pick(rng, &statuses)));
            entity.set("speed", int(rng.gen_range(0..=80)));
            entity.set("heading", int(rng.gen_range(0..=360)));
            entity.set("location", point(clustered_point(rng, zone, 0.005)));
            entity
        })
        .collect()
}

fn medical_facilities<R: Rng>(config: &SeedConfig, rng: &mut R) -> Vec<Entity> {
    let urban: Vec<&Zone> = ZONES.iter().filter(|z| z.urban).collect();

    let count = count_in(rng, config.facilities);
    (0..count)
        .map(|i| {
            let zone = urban[rng.gen_range(0..urban.len())];
            let bed_capacity = rng.gen_range(100..=2000);
            let mut entity = new_entity("MedicalFacility", config, rng);
            entity.set("name", text(FACILITY_NAMES[i % FACILITY_NAMES.len()]));
            entity.set("bedCapacity", int(bed_capacity));
            entity.set("availableBeds", int(rng.gen_range(0..=bed_capacity)));
            entity.set("location", point(clustered_point(rng, zone, 0.002)));
            entity
        })
        .collect()
}

fn flood_sensors<R: Rng>(config: &SeedConfig, rng: &mut R) -> Vec<Entity> {
    let count = count_in(rng, config.flood_sensors);
    // 70% along waterways, the rest in flood-prone districts
    let waterway_count = count * 7 / 10;
    let prone: Vec<&Zone> = ZONES.iter().filter(|z| z.flood_prone).collect();

    (0..count)
        .map(|i| {
            let coordinates = if i < waterway_count {
                waterway_point(rng)
            } else {
                let zone = prone[rng.gen_range(0..prone.len())];
                clustered_point(rng, zone, 0.004)
            };
            let mut entity = new_entity("FloodSensor", config, rng);
            entity.set("waterLevel", float(round2(rng.gen_range(0.0..2.5))));
            entity.set("batteryLevel", float(round2(rng.gen_range(0.3..1.0))));
            entity.set("location", point(coordinates));
            entity
        })
        .collect()
}

fn flood_zones<R: Rng>(config: &SeedConfig, rng: &mut R) -> Vec<Entity> {
    let count = count_in(rng, config.flood_zones);

    let mut areas: Vec<(String, (f64, f64), &'static str, &'static str)> = FLOOD_AREAS
        .choose_multiple(rng, count.min(FLOOD_AREAS.len()))
        .map(|a| (a.name.to_string(), a.center, a.severity, a.area_type))
        .collect();
    // Top up with jittered variants when more zones were requested than
    // the table holds
    while areas.len() < count {
        let base = &FLOOD_AREAS[rng.gen_range(0..FLOOD_AREAS.len())];
        let center = (
            base.center.0 + rng.gen_range(-0.005..0.005),
            base.center.1 + rng.gen_range(-0.005..0.005),
        );
        areas.push((
            format!("{} (Extended)", base.name),
            center,
            base.severity,
            base.area_type,
        ));
    }

    areas
        .into_iter()
        .map(|(name, (center_lat, center_lon), severity, area_type)| {
            let level = severity_level(severity);
            let (min_size, max_size) = area_size_range(area_type);
            let size_meters = rng.gen_range(min_size..=max_size);
            let ring = polygon_around(rng, center_lat, center_lon, size_meters);

            let mut entity = new_entity("FloodZone", config, rng);
            entity.set("name", Attribute::scalar(ScalarValue::Text(name)));
            entity.set("floodSeverity", text(severity));
            entity.set("areaType", text(area_type));
            entity.set(
                "waterDepth",
                float(round2(rng.gen_range(0.1..0.8) * level as f64)),
            );
            entity.set(
                "affectedPopulation",
                int(rng.gen_range(50..=500) * level),
            );
            entity.set("isActive", Attribute::scalar(ScalarValue::Bool(rng.gen_bool(0.75))));
            entity.set(
                "location",
                Attribute::geometry(Geometry::Polygon {
                    coordinates: vec![ring],
                }),
            );
            entity
        })
        .collect()
}

/// Irregular closed ring around a center point. Offsets assume the HCMC
/// latitude band (1° lat ≈ 111 km, 1° lon ≈ 109 km).
fn polygon_around<R: Rng>(rng: &mut R, center_lat: f64, center_lon: f64, size_meters: i64) -> Vec<[f64; 2]> {
    const IRREGULARITY: f64 = 0.3;
    let lat_offset = size_meters as f64 / 111_000.0;
    let lon_offset = size_meters as f64 / 109_000.0;

    let vertex_count = rng.gen_range(6..=10);
    let mut angles: Vec<f64> = (0..vertex_count)
        .map(|_| rng.gen_range(0.0..std::f64::consts::TAU))
        .collect();
    angles.sort_by(|a, b| a.total_cmp(b));

    let mut ring: Vec<[f64; 2]> = angles
        .iter()
        .map(|angle| {
            let r_factor = 1.0 + rng.gen_range(-IRREGULARITY..IRREGULARITY);
            let lat = center_lat + lat_offset * r_factor * angle.sin();
            let lon = center_lon + lon_offset * r_factor * angle.cos();
            [lon, lat]
        })
        .collect();
    // Close the ring (first point == last point)
    ring.push(ring[0]);
    ring
}

fn severity_level(severity: &str) -> i64 {
    match severity {
        "low" => 1,
        "medium" => 2,
        _ => 3,
    }
}

fn area_size_range(area_type: &str) -> (i64, i64) {
    match area_type {
        "urban_road" => (200, 400),
        "intersection" => (150, 300),
        "residential" => (350, 600),
        "canal_side" => (250, 500),
        "lowland" => (450, 800),
        "highway" => (300, 600),
        "agricultural" | "coastal" => (500, 800),
        _ => (100, 200),
    }
}

fn new_entity<R: Rng>(entity_type: &str, config: &SeedConfig, rng: &mut R) -> Entity {
    let id = format!(
        "urn:ngsi-ld:{}:{}:{}",
        entity_type,
        config.namespace,
        Uuid::new_v4()
    );
    let mut entity = Entity::new(id, entity_type);
    entity.set(
        "observedAt",
        Attribute::date_time(random_timestamp(rng, config.days_back)),
    );
    entity
}

/// Random ISO 8601 timestamp within the last `days_back` days.
fn random_timestamp<R: Rng>(rng: &mut R, days_back: i64) -> String {
    let span_seconds = days_back.max(0) * 86_400;
    let offset = rng.gen_range(0..=span_seconds);
    let ts = Utc::now() - chrono::Duration::seconds(offset);
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Uniform point within a waterway corridor, nudged perpendicular so
/// sensors sit near the water rather than in it.
fn waterway_point<R: Rng>(rng: &mut R) -> [f64; 2] {
    let corridor = &WATERWAYS[rng.gen_range(0..WATERWAYS.len())];
    let lat = rng.gen_range(corridor.lat.0..corridor.lat.1);
    let lon = rng.gen_range(corridor.lon.0..corridor.lon.1) + rng.gen_range(-0.002..0.002);
    [lon, lat]
}

/// Point clustered around a random landmark of the zone, clamped to the
/// zone's bounding box.
fn clustered_point<R: Rng>(rng: &mut R, zone: &Zone, cluster_std: f64) -> [f64; 2] {
    let (landmark_lat, landmark_lon) = if zone.landmarks.is_empty() {
        (
            (zone.lat.0 + zone.lat.1) / 2.0,
            (zone.lon.0 + zone.lon.1) / 2.0,
        )
    } else {
        zone.landmarks[rng.gen_range(0..zone.landmarks.len())]
    };

    let lat = gaussian(rng, landmark_lat, cluster_std).clamp(zone.lat.0, zone.lat.1);
    let lon = gaussian(rng, landmark_lon, cluster_std).clamp(zone.lon.0, zone.lon.1);
    [lon, lat]
}

/// Gaussian approximation via Irwin-Hall: the sum of 12 uniform(-0.5, 0.5)
/// samples approximates N(0, 1).
fn gaussian<R: Rng>(rng: &mut R, mean: f64, std: f64) -> f64 {
    let sample: f64 = (0..12).map(|_| rng.gen_range(-0.5..0.5)).sum();
    mean + sample * std
}

fn weighted_zone<R: Rng>(rng: &mut R) -> &'static Zone {
    let total: f64 = ZONES.iter().map(|z| z.weight).sum();
    let mut pick = rng.gen_range(0.0..total);
    for zone in ZONES {
        if pick < zone.weight {
            return zone;
        }
        pick -= zone.weight;
    }
    &ZONES[ZONES.len() - 1]
}

fn count_in<R: Rng>(rng: &mut R, range: [usize; 2]) -> usize {
    rng.gen_range(range[0]..=range[1])
}

fn pick<'a, R: Rng>(rng: &mut R, options: &[&'a str]) -> &'a str {
    options[rng.gen_range(0..options.len())]
}

fn point(coordinates: [f64; 2]) -> Attribute {
    Attribute::geometry(Geometry::Point { coordinates })
}

fn text(value: &str) -> Attribute {
    Attribute::scalar(ScalarValue::Text(value.to_string()))
}

fn int(value: i64) -> Attribute {
    Attribute::scalar(ScalarValue::Int(value))
}

fn float(value: f64) -> Attribute {
    Attribute::scalar(ScalarValue::Float(value))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
