//! Data models for cities, administrative regions and street-network graphs.
//!
//! These types mirror the wire shapes produced by the Urban Topology backend
//! (snake_case field names, `(lon, lat)` coordinate order in polygon rings)
//! while exposing an idiomatic Rust surface to the rest of the workspace.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in wire order: `(longitude, latitude)`.
///
/// Polygon rings arrive from the backend as `[lon, lat]` pairs. Map widgets
/// want `(lat, lon)`; use [`LonLat::lat_lon`] for that flip instead of
/// reordering fields ad hoc.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LonLat(pub f64, pub f64);

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self(lon, lat)
    }

    pub fn lon(&self) -> f64 {
        self.0
    }

    pub fn lat(&self) -> f64 {
        self.1
    }

    /// Coordinate pair in rendering order.
    pub fn lat_lon(&self) -> (f64, f64) {
        (self.1, self.0)
    }
}

/// A polygon ring: a closed sequence of `(lon, lat)` points.
pub type Ring = Vec<LonLat>;

/// Static city metadata as served by the backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CityProperties {
    pub population: u64,
    pub population_density: f64,
    #[serde(rename = "c_longitude")]
    pub center_longitude: f64,
    #[serde(rename = "c_latitude")]
    pub center_latitude: f64,
    pub time_zone: String,
    #[serde(rename = "time_created")]
    pub created_at: NaiveDateTime,
}

/// A city known to the backend.
///
/// `districts` is never populated from the wire: the city endpoint returns it
/// empty and the region endpoint is fetched separately, so grouping happens
/// client side (see [`crate::lod::group_by_level`]).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct City {
    pub id: u64,
    #[serde(rename = "city_name")]
    pub name: String,
    #[serde(rename = "property")]
    pub properties: CityProperties,
    pub downloaded: bool,
    #[serde(skip)]
    pub districts: Vec<RegionGroup>,
}

impl City {
    /// Attach lazily fetched, already grouped districts to a city snapshot.
    pub fn with_districts(mut self, districts: Vec<RegionGroup>) -> Self {
        self.districts = districts;
        self
    }
}

/// Geometry kind of a region. The backend only ever emits polygons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Polygon,
}

/// An administrative region (district) of a city.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Region {
    pub id: u64,
    pub admin_level: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub geometry_type: GeometryType,
    #[serde(rename = "regions")]
    pub rings: Vec<Ring>,
}

impl Region {
    /// A region without at least one ring has no drawable geometry.
    pub fn is_valid(&self) -> bool {
        !self.rings.is_empty()
    }

    /// Rings flipped to `(lat, lon)` order for map rendering.
    pub fn rings_lat_lon(&self) -> Vec<Vec<(f64, f64)>> {
        self.rings
            .iter()
            .map(|ring| ring.iter().map(LonLat::lat_lon).collect())
            .collect()
    }
}

/// Regions sharing one `admin_level`, one entry per level of detail.
///
/// Groups are ordered ascending by `admin_level`; a group's index in that
/// ordering (not the raw level value) is what level navigation works with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegionGroup {
    pub admin_level: i32,
    pub regions: Vec<Region>,
}

/// What the user asked a graph for: a known region or a drawn polygon.
///
/// Exactly one variant is active per request. The polygon variant must carry
/// at least three points to describe an area; that is validated before any
/// network call is made.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GraphRequest {
    Region { city_id: u64, region_id: u64 },
    Polygon { city_id: u64, polygon: Vec<LonLat> },
}

impl GraphRequest {
    pub fn city_id(&self) -> u64 {
        match self {
            GraphRequest::Region { city_id, .. } => *city_id,
            GraphRequest::Polygon { city_id, .. } => *city_id,
        }
    }

    /// Deterministic cache key covering the full request payload, including
    /// the polygon point list, so only truly identical requests collide.
    pub fn cache_key(&self) -> String {
        match self {
            GraphRequest::Region { city_id, region_id } => {
                format!("region:{city_id}:{region_id}")
            }
            GraphRequest::Polygon { city_id, polygon } => {
                let mut key = format!("polygon:{city_id}");
                for point in polygon {
                    key.push_str(&format!(":{:.7},{:.7}", point.lon(), point.lat()));
                }
                key
            }
        }
    }
}

/// Server-computed centrality metrics joined onto a node.
///
/// Absent metrics stay `None`; zero is a legitimate metric value and is never
/// used as a stand-in for "missing".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub degree: Option<f64>,
    pub in_degree: Option<f64>,
    pub out_degree: Option<f64>,
    pub eigenvector: Option<f64>,
    pub betweenness: Option<f64>,
    pub radius: Option<f64>,
    pub color: Option<String>,
}

/// An intersection node of the street-network graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub way_id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub metrics: NodeMetrics,
}

/// A street segment between two nodes of the same snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: Option<String>,
    pub way_id: Option<String>,
    pub from: String,
    pub to: String,
    pub name: Option<String>,
}

/// A building/entrance connectivity node of the secondary access layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessNode {
    pub id: String,
    pub node_type: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub source_type: Option<String>,
    pub source_id: Option<String>,
    pub name: Option<String>,
}

/// An access-layer edge, typically linking a building to the road network.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessEdge {
    pub id: Option<String>,
    pub from: String,
    pub to: String,
    pub way_id: Option<String>,
    pub road_type: Option<String>,
    pub length_m: Option<f64>,
    pub is_building_link: bool,
    pub name: Option<String>,
}

/// Building/entrance connectivity, toggled independently of the road graph.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccessLayer {
    pub nodes: BTreeMap<String, AccessNode>,
    pub edges: Vec<AccessEdge>,
}

/// An immutable street-network graph built from one backend response.
///
/// A new user selection discards the old snapshot and builds a fresh one;
/// nothing mutates a snapshot after construction.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub name: Option<String>,
    pub nodes: BTreeMap<String, GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub access: Option<AccessLayer>,
}

impl GraphSnapshot {
    /// Whether there is anything worth drawing. An empty valid subset is
    /// "no data to display", not an error.
    pub fn has_renderable_data(&self) -> bool {
        !self.nodes.is_empty() && !self.edges.is_empty()
    }
}
