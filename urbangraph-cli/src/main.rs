//! urbangraph CLI - command-line client for the Urban Topology service.
//!
//! Browses cities and administrative districts, fetches street-network
//! graphs by region or drawn polygon, and exports graph archives.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod output;

use config::CliConfig;
use urbangraph_client::{ApiClient, GraphLoader, MapSelection};
use urbangraph_core::lod::LevelOfDetail;
use urbangraph_core::types::LonLat;

/// Parse a `lon,lat` pair as passed on the command line.
fn parse_point(s: &str) -> Result<LonLat, String> {
    let (lon, lat) = s
        .split_once(',')
        .ok_or_else(|| format!("'{s}' is not a lon,lat pair"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("'{lon}' is not a valid longitude"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("'{lat}' is not a valid latitude"))?;
    Ok(LonLat(lon, lat))
}

/// Browse cities and fetch street-network graphs from an Urban Topology
/// backend.
#[derive(Parser)]
#[command(name = "urbangraph")]
#[command(author, version)]
#[command(about = "City browser and street-network graph client")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Backend base URL (overrides urbangraph.toml)
    #[arg(long, global = true, env = "URBANGRAPH_API_URL")]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List known cities
    Cities {
        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: u32,

        /// Cities per page (defaults to the configured page size)
        #[arg(long)]
        per_page: Option<u32>,
    },

    /// Show one city with its district levels
    City {
        /// City id
        id: u64,
    },

    /// List administrative regions of a city, grouped by detail level
    Regions {
        /// City id
        city_id: u64,

        /// Detail level index to show (0 = coarsest); omit for a summary
        #[arg(short, long)]
        level: Option<usize>,
    },

    /// Fetch a street-network graph
    Graph {
        #[command(subcommand)]
        source: GraphSource,
    },

    /// Download the export archive for one or more regions
    Export {
        /// City id
        city_id: u64,

        /// Region ids to export
        #[arg(required = true)]
        region_ids: Vec<u64>,

        /// Output file for the archive
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum GraphSource {
    /// Graph for an administrative region
    Region {
        /// City id
        city_id: u64,

        /// Region id
        region_id: u64,

        /// Write the normalized graph snapshot as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Graph for a drawn polygon
    Polygon {
        /// City id
        city_id: u64,

        /// Polygon points as lon,lat pairs (at least 3)
        #[arg(long = "point", value_parser = parse_point, num_args = 1.., required = true)]
        points: Vec<LonLat>,

        /// Write the normalized graph snapshot as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let config = CliConfig::load(Path::new("."));
    let client = ApiClient::new(config.client_config(cli.api_url.as_deref()))
        .context("failed to build HTTP client")?;

    match cli.command {
        Commands::Cities { page, per_page } => {
            let per_page = per_page.unwrap_or(config.api.page_size);
            let cities = client.list_cities(page, per_page).await?;
            if cities.is_empty() {
                println!("No cities on page {page}.");
            } else {
                println!("{}", output::city_table(&cities));
            }
        }

        Commands::City { id } => {
            let city = client.city(id).await?;
            let regions = client.city_regions(id).await?;
            let lod = LevelOfDetail::from_regions(regions);
            let city = city.with_districts(lod.groups().to_vec());

            println!("{} (id {})", city.name.bold(), city.id);
            println!(
                "population: {}  density: {:.1}",
                city.properties.population, city.properties.population_density
            );
            println!(
                "center: ({:.4}, {:.4})  {}",
                city.properties.center_latitude,
                city.properties.center_longitude,
                city.properties.time_zone
            );
            println!("downloaded: {}", if city.downloaded { "yes" } else { "no" });
            if city.districts.is_empty() {
                println!("no district data");
            } else {
                println!("district levels:");
                print!("{}", output::level_summary(&city.districts));
            }
        }

        Commands::Regions { city_id, level } => {
            let regions = client.city_regions(city_id).await?;
            let mut lod = LevelOfDetail::from_regions(regions);
            match level {
                Some(index) => {
                    lod.set_level(index);
                    if lod.current_level() != index {
                        anyhow::bail!(
                            "level {index} out of range (city has {} levels)",
                            lod.level_count()
                        );
                    }
                    println!("{}", output::region_table(lod.current_districts()));
                }
                None => {
                    print!("{}", output::level_summary(lod.groups()));
                }
            }
        }

        Commands::Graph { source } => {
            let loader = GraphLoader::new(client);
            let (city_id, selection, json) = match source {
                GraphSource::Region {
                    city_id,
                    region_id,
                    json,
                } => (city_id, MapSelection::Region { region_id }, json),
                GraphSource::Polygon {
                    city_id,
                    points,
                    json,
                } => (city_id, MapSelection::Polygon { points }, json),
            };

            let built = loader.on_selection(city_id, selection).await?;
            print!("{}", output::graph_summary(&built));

            if let Some(path) = json {
                let rendered = serde_json::to_string_pretty(&built.snapshot)?;
                std::fs::write(&path, rendered)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("snapshot written to {}", path.display());
            }
        }

        Commands::Export {
            city_id,
            region_ids,
            output,
        } => {
            let archive = client.export_graph(city_id, &region_ids).await?;
            std::fs::write(&output, &archive)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!(
                "exported {} region(s), {} bytes -> {}",
                region_ids.len(),
                archive.len(),
                output.display()
            );
        }
    }

    Ok(())
}
