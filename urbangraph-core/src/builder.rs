//! Graph assembly from heterogeneous backend responses.
//!
//! The graph endpoints have emitted two shapes over the backend's lifetime:
//! a CSV bundle (`points_csv` / `edges_csv` / `metrics_csv`, optionally an
//! access layer) and a legacy native JSON graph with keyed node/edge maps.
//! Both are resolved exactly once, here, into a [`GraphSnapshot`]; no other
//! module looks at response shape.
//!
//! Row-level damage never fails a build. Rows with unparseable coordinates
//! are counted and skipped, edges with missing or dangling endpoints are
//! counted and dropped, and the caller gets the valid subset plus an
//! [`IngestReport`] to surface as a soft warning.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::Value;

use crate::csv::{parse_bool, parse_number, parse_table};
use crate::types::{
    AccessEdge, AccessLayer, AccessNode, GraphEdge, GraphNode, GraphSnapshot, NodeMetrics,
};

/// Accepted header aliases, in lookup order. The backend has renamed these
/// columns more than once; the first non-empty match wins.
const LAT_ALIASES: &[&str] = &["latitude", "lat", "latitude_value"];
const LON_ALIASES: &[&str] = &["longitude", "long", "longtitude", "lon"];
const EDGE_FROM_ALIASES: &[&str] = &["source", "from", "id_src", "n1"];
const EDGE_TO_ALIASES: &[&str] = &["target", "to", "id_dist", "n2"];
const WAY_ID_ALIASES: &[&str] = &["way_id", "id_way", "source_way_id"];

/// How many offending row ids to keep as a diagnostic sample.
const SAMPLE_LIMIT: usize = 8;

/// One backend graph response, shape resolved during deserialization.
///
/// Variant order matters: the CSV bundle has required fields and is tried
/// first; the native shape is the deprecated fallback and tolerates almost
/// anything.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum GraphResponse {
    Csv(CsvBundle),
    Native(NativeGraph),
}

/// The current backend contract: graph tables as embedded CSV text.
#[derive(Clone, Debug, Deserialize)]
pub struct CsvBundle {
    pub points_csv: String,
    pub edges_csv: String,
    #[serde(default)]
    pub metrics_csv: Option<String>,
    #[serde(default)]
    pub access_nodes_csv: Option<String>,
    #[serde(default)]
    pub access_edges_csv: Option<String>,
    #[serde(default)]
    pub graph_name: Option<String>,
}

/// Legacy shape: node and edge maps inlined as JSON objects.
///
/// Fields are kept as raw values because old payloads were not reliably
/// object-shaped; the builder checks and treats anything else as empty.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NativeGraph {
    #[serde(default)]
    pub nodes: Value,
    #[serde(default)]
    pub edges: Value,
    #[serde(default)]
    pub graph_name: Option<String>,
}

/// Counts of rows the builder had to discard, plus a sample of offending
/// ids. Non-fatal by design: partial graphs are still useful.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Point rows skipped for a missing id or unparseable coordinate.
    pub skipped_points: usize,
    /// Edges dropped for a missing or dangling endpoint.
    pub dropped_edges: usize,
    /// Access-layer node rows skipped.
    pub skipped_access_nodes: usize,
    /// Access-layer edges dropped.
    pub dropped_access_edges: usize,
    /// Up to [`SAMPLE_LIMIT`] ids of skipped rows, for diagnostics.
    pub sample_ids: Vec<String>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.skipped_points == 0
            && self.dropped_edges == 0
            && self.skipped_access_nodes == 0
            && self.dropped_access_edges == 0
    }

    fn note_sample(&mut self, id: &str) {
        if self.sample_ids.len() < SAMPLE_LIMIT && !id.is_empty() {
            self.sample_ids.push(id.to_string());
        }
    }
}

/// A built snapshot together with its data-quality report.
#[derive(Clone, Debug)]
pub struct BuiltGraph {
    pub snapshot: GraphSnapshot,
    pub report: IngestReport,
}

/// Build a normalized graph snapshot from either response shape.
pub fn build_graph(response: GraphResponse) -> BuiltGraph {
    let built = match response {
        GraphResponse::Csv(bundle) => from_csv_bundle(bundle),
        GraphResponse::Native(native) => from_native(native),
    };
    if !built.report.is_clean() {
        tracing::warn!(
            skipped_points = built.report.skipped_points,
            dropped_edges = built.report.dropped_edges,
            skipped_access_nodes = built.report.skipped_access_nodes,
            dropped_access_edges = built.report.dropped_access_edges,
            sample = ?built.report.sample_ids,
            "graph built from partial data"
        );
    }
    built
}

/// First non-empty value among the accepted aliases for a column.
fn field<'a>(row: &'a HashMap<String, String>, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .filter_map(|key| row.get(*key))
        .find(|value| !value.is_empty())
        .map(String::as_str)
}

fn optional(row: &HashMap<String, String>, aliases: &[&str]) -> Option<String> {
    field(row, aliases).map(str::to_string)
}

fn from_csv_bundle(bundle: CsvBundle) -> BuiltGraph {
    let mut report = IngestReport::default();

    let metrics_by_id: HashMap<String, HashMap<String, String>> = bundle
        .metrics_csv
        .as_deref()
        .map(parse_table)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|row| {
            let id = field(&row, &["id"])?.to_string();
            Some((id, row))
        })
        .collect();

    let mut nodes = BTreeMap::new();
    for row in parse_table(&bundle.points_csv) {
        let Some(id) = field(&row, &["id"]) else {
            report.skipped_points += 1;
            continue;
        };
        let lat = field(&row, LAT_ALIASES).and_then(parse_number);
        let lon = field(&row, LON_ALIASES).and_then(parse_number);
        let (Some(lat), Some(lon)) = (lat, lon) else {
            report.skipped_points += 1;
            report.note_sample(id);
            continue;
        };

        let metrics = metrics_by_id
            .get(id)
            .map(metrics_from_row)
            .unwrap_or_default();

        nodes.insert(
            id.to_string(),
            GraphNode {
                id: id.to_string(),
                lat,
                lon,
                way_id: optional(&row, WAY_ID_ALIASES),
                name: optional(&row, &["name"]),
                metrics,
            },
        );
    }

    let mut edges = Vec::new();
    for row in parse_table(&bundle.edges_csv) {
        let (Some(from), Some(to)) = (field(&row, EDGE_FROM_ALIASES), field(&row, EDGE_TO_ALIASES))
        else {
            report.dropped_edges += 1;
            continue;
        };
        edges.push(GraphEdge {
            id: optional(&row, &["id"]),
            way_id: optional(&row, WAY_ID_ALIASES),
            from: from.to_string(),
            to: to.to_string(),
            name: optional(&row, &["name"]),
        });
    }
    drop_dangling_edges(&mut edges, &nodes, &mut report.dropped_edges);

    let access = match (&bundle.access_nodes_csv, &bundle.access_edges_csv) {
        (Some(nodes_csv), Some(edges_csv)) => {
            Some(access_layer(nodes_csv, edges_csv, &nodes, &mut report))
        }
        _ => None,
    };

    BuiltGraph {
        snapshot: GraphSnapshot {
            name: bundle.graph_name,
            nodes,
            edges,
            access,
        },
        report,
    }
}

/// Parse the secondary access layer. Follows the same tolerant-header,
/// skip-on-invalid policy as the main graph and never affects it: a broken
/// access table just yields a smaller (possibly empty) layer.
fn access_layer(
    nodes_csv: &str,
    edges_csv: &str,
    road_nodes: &BTreeMap<String, GraphNode>,
    report: &mut IngestReport,
) -> AccessLayer {
    let mut nodes = BTreeMap::new();
    for row in parse_table(nodes_csv) {
        let Some(id) = field(&row, &["id"]) else {
            report.skipped_access_nodes += 1;
            continue;
        };
        let lat = field(&row, LAT_ALIASES).and_then(parse_number);
        let lon = field(&row, LON_ALIASES).and_then(parse_number);
        let (Some(lat), Some(lon)) = (lat, lon) else {
            report.skipped_access_nodes += 1;
            report.note_sample(id);
            continue;
        };
        nodes.insert(
            id.to_string(),
            AccessNode {
                id: id.to_string(),
                node_type: optional(&row, &["node_type"]),
                lat,
                lon,
                source_type: optional(&row, &["source_type"]),
                source_id: optional(&row, &["source_id"]),
                name: optional(&row, &["name"]),
            },
        );
    }

    let mut edges = Vec::new();
    for row in parse_table(edges_csv) {
        let (Some(from), Some(to)) = (field(&row, EDGE_FROM_ALIASES), field(&row, EDGE_TO_ALIASES))
        else {
            report.dropped_access_edges += 1;
            continue;
        };
        // Access edges may link an access node to a road node; an endpoint
        // is valid if either set knows it.
        let known =
            |id: &str| nodes.contains_key(id) || road_nodes.contains_key(id);
        if !known(from) || !known(to) {
            report.dropped_access_edges += 1;
            continue;
        }
        edges.push(AccessEdge {
            id: optional(&row, &["id"]),
            from: from.to_string(),
            to: to.to_string(),
            way_id: optional(&row, WAY_ID_ALIASES),
            road_type: optional(&row, &["road_type"]),
            length_m: field(&row, &["length_m"]).and_then(parse_number),
            is_building_link: field(&row, &["is_building_link"])
                .map(parse_bool)
                .unwrap_or(false),
            name: optional(&row, &["name"]),
        });
    }

    AccessLayer { nodes, edges }
}

fn from_native(native: NativeGraph) -> BuiltGraph {
    let mut report = IngestReport::default();

    // Defensive: old payloads sometimes carried nulls or arrays here.
    let mut nodes = BTreeMap::new();
    if let Value::Object(node_map) = native.nodes {
        for (id, value) in node_map {
            let Value::Object(obj) = value else {
                report.skipped_points += 1;
                report.note_sample(&id);
                continue;
            };
            let lat = obj.get("lat").and_then(value_number);
            let lon = obj.get("lon").and_then(value_number);
            let (Some(lat), Some(lon)) = (lat, lon) else {
                report.skipped_points += 1;
                report.note_sample(&id);
                continue;
            };
            nodes.insert(
                id.clone(),
                GraphNode {
                    id: id.clone(),
                    lat,
                    lon,
                    way_id: value_string(obj.get("way_id")),
                    name: value_string(obj.get("name")),
                    metrics: NodeMetrics {
                        degree: obj.get("degree_value").and_then(value_number),
                        in_degree: obj.get("in_degree_value").and_then(value_number),
                        out_degree: obj.get("out_degree_value").and_then(value_number),
                        eigenvector: obj.get("eigenvector_value").and_then(value_number),
                        betweenness: obj.get("betweenness_value").and_then(value_number),
                        radius: obj.get("radius_value").and_then(value_number),
                        color: value_string(obj.get("color_value")),
                    },
                },
            );
        }
    }

    let mut edges = Vec::new();
    let edge_values: Vec<Value> = match native.edges {
        Value::Object(map) => map.into_values().collect(),
        Value::Array(values) => values,
        _ => Vec::new(),
    };
    for value in edge_values {
        let Value::Object(obj) = value else {
            report.dropped_edges += 1;
            continue;
        };
        let from = native_endpoint(&obj, &["from", "source", "n1"]);
        let to = native_endpoint(&obj, &["to", "target", "n2"]);
        let (Some(from), Some(to)) = (from, to) else {
            report.dropped_edges += 1;
            continue;
        };
        edges.push(GraphEdge {
            id: value_string(obj.get("id")),
            way_id: value_string(obj.get("way_id")),
            from,
            to,
            name: value_string(obj.get("name")),
        });
    }
    drop_dangling_edges(&mut edges, &nodes, &mut report.dropped_edges);

    BuiltGraph {
        snapshot: GraphSnapshot {
            name: native.graph_name,
            nodes,
            edges,
            access: None,
        },
        report,
    }
}

/// An edge referencing a node id absent from the resolved node set is
/// excluded — never a placeholder node, never an error.
fn drop_dangling_edges(
    edges: &mut Vec<GraphEdge>,
    nodes: &BTreeMap<String, GraphNode>,
    dropped: &mut usize,
) {
    let before = edges.len();
    edges.retain(|edge| nodes.contains_key(&edge.from) && nodes.contains_key(&edge.to));
    *dropped += before - edges.len();
}

fn metrics_from_row(row: &HashMap<String, String>) -> NodeMetrics {
    let number = |key: &str| field(row, &[key]).and_then(parse_number);
    NodeMetrics {
        degree: number("degree"),
        in_degree: number("in_degree"),
        out_degree: number("out_degree"),
        eigenvector: number("eigenvector"),
        betweenness: number("betweenness"),
        radius: number("radius"),
        color: optional(row, &["color"]),
    }
}

fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn value_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn native_endpoint(obj: &serde_json::Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|key| obj.get(*key))
        .find_map(|value| value_string(Some(value)))
}
