//! Table and summary rendering for CLI results.

use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use urbangraph_core::builder::BuiltGraph;
use urbangraph_core::encode::compute_bounds;
use urbangraph_core::types::{City, Region, RegionGroup};

#[derive(Tabled)]
struct CityRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Population")]
    population: u64,
    #[tabled(rename = "Density")]
    density: String,
    #[tabled(rename = "Time zone")]
    time_zone: String,
    #[tabled(rename = "Downloaded")]
    downloaded: String,
}

pub fn city_table(cities: &[City]) -> String {
    let rows: Vec<CityRow> = cities
        .iter()
        .map(|city| CityRow {
            id: city.id,
            name: city.name.clone(),
            population: city.properties.population,
            density: format!("{:.1}", city.properties.population_density),
            time_zone: city.properties.time_zone.clone(),
            downloaded: if city.downloaded { "yes" } else { "no" }.to_string(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct RegionRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Admin level")]
    admin_level: i32,
    #[tabled(rename = "Rings")]
    rings: usize,
}

pub fn region_table(regions: &[Region]) -> String {
    let rows: Vec<RegionRow> = regions
        .iter()
        .map(|region| RegionRow {
            id: region.id,
            name: region.name.clone(),
            admin_level: region.admin_level,
            rings: region.rings.len(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// One line per detail level: index, admin level, region count.
pub fn level_summary(groups: &[RegionGroup]) -> String {
    let mut out = String::new();
    for (index, group) in groups.iter().enumerate() {
        out.push_str(&format!(
            "  level {index}: admin_level {} ({} regions)\n",
            group.admin_level,
            group.regions.len()
        ));
    }
    out
}

/// Human-readable summary of a loaded graph, including any data-quality
/// warnings from ingestion.
pub fn graph_summary(built: &BuiltGraph) -> String {
    let snapshot = &built.snapshot;
    let mut out = String::new();

    if let Some(name) = &snapshot.name {
        out.push_str(&format!("{}\n", name.bold()));
    }

    if !snapshot.has_renderable_data() {
        out.push_str(&format!("{}\n", "No data to display.".yellow()));
        return out;
    }

    out.push_str(&format!(
        "nodes: {}  edges: {}\n",
        snapshot.nodes.len(),
        snapshot.edges.len()
    ));
    if let Some(bounds) = compute_bounds(snapshot.nodes.values()) {
        out.push_str(&format!(
            "bounds: lat [{:.4}, {:.4}]  lon [{:.4}, {:.4}]\n",
            bounds.min_lat, bounds.max_lat, bounds.min_lon, bounds.max_lon
        ));
    }
    if let Some(access) = &snapshot.access {
        out.push_str(&format!(
            "access layer: {} nodes, {} edges\n",
            access.nodes.len(),
            access.edges.len()
        ));
    }

    let report = &built.report;
    if !report.is_clean() {
        let mut warning = format!(
            "warning: skipped {} point row(s), dropped {} edge(s)",
            report.skipped_points + report.skipped_access_nodes,
            report.dropped_edges + report.dropped_access_edges
        );
        if !report.sample_ids.is_empty() {
            warning.push_str(&format!(" (e.g. {})", report.sample_ids.join(", ")));
        }
        out.push_str(&format!("{}\n", warning.yellow()));
    }

    out
}
