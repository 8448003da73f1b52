//! Urban Topology core - street-network graph model and ingestion.
//!
//! This crate is the pure, synchronous heart of the urbangraph workspace:
//! it turns heterogeneous backend graph responses into a normalized
//! node/edge model and derives the parameters a map widget needs to render
//! it. No I/O happens here; the HTTP boundary lives in `urbangraph-client`.
//!
//! # Pipeline
//!
//! ```text
//! backend response -> builder (shape resolution, CSV ingestion)
//!                  -> GraphSnapshot + IngestReport
//!                  -> encode (bounds, radius/color, marker styles)
//! ```

pub mod builder;
pub mod csv;
pub mod encode;
pub mod lod;
pub mod types;

pub use builder::{build_graph, BuiltGraph, CsvBundle, GraphResponse, IngestReport, NativeGraph};
pub use encode::{color_from_metric, compute_bounds, radius_from_metric, BoundingBox, Color};
pub use lod::{group_by_level, LevelOfDetail};
pub use types::{
    City, GraphEdge, GraphNode, GraphRequest, GraphSnapshot, LonLat, Region, RegionGroup,
};
