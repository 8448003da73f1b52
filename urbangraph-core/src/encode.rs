//! Visual encodings derived from graph data: viewport bounds, marker radius
//! and color ramps keyed by centrality metrics, and the default styling the
//! map widget falls back to when a node carries no metrics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::GraphNode;

/// Padding applied per axis to degenerate (zero-extent) bounds, in degrees.
/// A zero-area box breaks viewport fitting in the consuming map widget.
pub const BOUNDS_EPSILON: f64 = 0.001;

/// Marker radius when a node has no server-computed radius.
pub const DEFAULT_MARKER_RADIUS: f64 = 5.0;

/// Marker color when a node has no server-computed color.
pub const DEFAULT_MARKER_COLOR: &str = "#008cff";

/// Polyline color and weight for street edges.
pub const EDGE_COLOR: &str = "#85818c";
pub const EDGE_WEIGHT: u32 = 4;

/// Map center used when a snapshot has no nodes to fit: Moscow.
pub const FALLBACK_CENTER: (f64, f64) = (55.75, 37.61);

/// A latitude/longitude axis-aligned viewport box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn area(&self) -> f64 {
        (self.max_lat - self.min_lat) * (self.max_lon - self.min_lon)
    }
}

/// Min/max over all node coordinates, or `None` for an empty set — never a
/// box folded from empty reductions.
///
/// A single node (or a coincident/collinear set) still yields a non-zero
/// area: each degenerate axis is padded by [`BOUNDS_EPSILON`].
pub fn compute_bounds<'a, I>(nodes: I) -> Option<BoundingBox>
where
    I: IntoIterator<Item = &'a GraphNode>,
{
    let mut bounds: Option<BoundingBox> = None;
    for node in nodes {
        bounds = Some(match bounds {
            None => BoundingBox {
                min_lat: node.lat,
                min_lon: node.lon,
                max_lat: node.lat,
                max_lon: node.lon,
            },
            Some(b) => BoundingBox {
                min_lat: b.min_lat.min(node.lat),
                min_lon: b.min_lon.min(node.lon),
                max_lat: b.max_lat.max(node.lat),
                max_lon: b.max_lon.max(node.lon),
            },
        });
    }

    bounds.map(|mut b| {
        if b.min_lat == b.max_lat {
            b.min_lat -= BOUNDS_EPSILON;
            b.max_lat += BOUNDS_EPSILON;
        }
        if b.min_lon == b.max_lon {
            b.min_lon -= BOUNDS_EPSILON;
            b.max_lon += BOUNDS_EPSILON;
        }
        b
    })
}

/// An RGB color rendered as a CSS `rgb(r, g, b)` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Returned for degenerate metric ranges instead of dividing by zero.
    pub const NEUTRAL: Color = Color { r: 0, g: 0, b: 0 };

    pub const BLUE: Color = Color { r: 0, g: 0, b: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Marker radius from a metric already normalized to `[0, 1]`.
///
/// Monotonic, deterministic, matching the server's own encoding so that
/// locally derived radii agree with `metrics_csv` ones.
pub fn radius_from_metric(normalized: f64) -> f64 {
    1.0 + 10.0 * normalized.clamp(0.0, 1.0)
}

/// Linear blue-to-red ramp over `[min, max]`.
///
/// When `max == min` (all nodes equal) the ramp is undefined and the fixed
/// neutral color is returned regardless of `value`.
pub fn color_from_metric(value: f64, min: f64, max: f64) -> Color {
    if max == min {
        return Color::NEUTRAL;
    }
    let t = ((value - min) / (max - min)).clamp(0.0, 1.0);
    Color {
        r: (255.0 * t) as u8,
        g: 0,
        b: (255.0 * (1.0 - t)) as u8,
    }
}

/// Resolved circle-marker styling for one node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub radius: f64,
    pub color: String,
    pub fill_opacity: f64,
}

/// Styling the map widget applies to a node: server-computed radius/color
/// when present, fixed defaults otherwise.
pub fn marker_style(node: &GraphNode) -> MarkerStyle {
    MarkerStyle {
        radius: node.metrics.radius.unwrap_or(DEFAULT_MARKER_RADIUS),
        color: node
            .metrics
            .color
            .clone()
            .unwrap_or_else(|| DEFAULT_MARKER_COLOR.to_string()),
        fill_opacity: 0.8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeMetrics;

    fn node(id: &str, lat: f64, lon: f64) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            lat,
            lon,
            way_id: None,
            name: None,
            metrics: NodeMetrics::default(),
        }
    }

    #[test]
    fn bounds_of_empty_set_is_none() {
        let nodes: Vec<GraphNode> = Vec::new();
        assert_eq!(compute_bounds(&nodes), None);
    }

    #[test]
    fn single_node_bounds_have_area_and_contain_the_node() {
        let nodes = [node("1", 55.75, 37.61)];
        let bounds = compute_bounds(nodes.iter()).unwrap();
        assert!(bounds.area() > 0.0);
        assert!(bounds.contains(55.75, 37.61));
        assert!((bounds.max_lat - bounds.min_lat - 2.0 * BOUNDS_EPSILON).abs() < 1e-12);
    }

    #[test]
    fn collinear_nodes_still_get_a_non_zero_area() {
        let nodes = [node("1", 55.75, 37.61), node("2", 55.75, 37.65)];
        let bounds = compute_bounds(nodes.iter()).unwrap();
        assert!(bounds.area() > 0.0);
        assert!((bounds.max_lon - 37.65).abs() < 1e-12);
    }

    #[test]
    fn multi_node_bounds_are_tight_min_max() {
        let nodes = [
            node("1", 55.70, 37.50),
            node("2", 55.80, 37.70),
            node("3", 55.75, 37.60),
        ];
        let bounds = compute_bounds(nodes.iter()).unwrap();
        assert_eq!(bounds.min_lat, 55.70);
        assert_eq!(bounds.max_lat, 55.80);
        assert_eq!(bounds.min_lon, 37.50);
        assert_eq!(bounds.max_lon, 37.70);
    }

    #[test]
    fn radius_is_monotonic_and_stable() {
        assert_eq!(radius_from_metric(0.0), 1.0);
        assert_eq!(radius_from_metric(1.0), 11.0);
        assert_eq!(radius_from_metric(0.5), radius_from_metric(0.5));
        assert!(radius_from_metric(0.3) < radius_from_metric(0.7));
        // Out-of-range inputs clamp instead of extrapolating.
        assert_eq!(radius_from_metric(2.0), 11.0);
        assert_eq!(radius_from_metric(-1.0), 1.0);
    }

    #[test]
    fn degenerate_metric_range_is_neutral() {
        assert_eq!(color_from_metric(0.3, 0.5, 0.5), Color::NEUTRAL);
        assert_eq!(color_from_metric(123.0, 0.0, 0.0), Color::NEUTRAL);
    }

    #[test]
    fn ramp_endpoints_are_blue_and_red() {
        assert_eq!(color_from_metric(0.0, 0.0, 1.0), Color::BLUE);
        assert_eq!(color_from_metric(1.0, 0.0, 1.0), Color::RED);
        let mid = color_from_metric(0.5, 0.0, 1.0);
        assert_eq!(mid.g, 0);
        assert!(mid.r > 0 && mid.b > 0);
    }

    #[test]
    fn color_renders_as_css_rgb() {
        assert_eq!(Color::NEUTRAL.to_string(), "rgb(0, 0, 0)");
        assert_eq!(Color::RED.to_string(), "rgb(255, 0, 0)");
    }

    #[test]
    fn marker_style_prefers_server_values() {
        let mut styled = node("1", 55.75, 37.61);
        styled.metrics = NodeMetrics {
            radius: Some(7.5),
            color: Some("rgb(10, 0, 245)".to_string()),
            ..NodeMetrics::default()
        };
        let style = marker_style(&styled);
        assert_eq!(style.radius, 7.5);
        assert_eq!(style.color, "rgb(10, 0, 245)");

        let plain = marker_style(&node("2", 55.75, 37.61));
        assert_eq!(plain.radius, DEFAULT_MARKER_RADIUS);
        assert_eq!(plain.color, DEFAULT_MARKER_COLOR);
    }
}
