//! HTTP client for the Urban Topology backend.
//!
//! The backend contract is external; paths and parameter names follow the
//! deployed service: query-string `city_id` for city/region/export lookups,
//! a path segment for the polygon endpoint, and JSON array bodies
//! (`[region_id]` and `[[[lon, lat], ...]]`) for the graph fetches.

use std::future::Future;
use std::time::Duration;

use urbangraph_core::builder::GraphResponse;
use urbangraph_core::types::{City, LonLat, Region};

use crate::error::{ApiError, Result};

/// Default backend location for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8901/api";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`ApiClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// The graph-fetch seam between the orchestrator and the network.
///
/// [`GraphLoader`](crate::orchestrator::GraphLoader) is generic over this
/// trait so its state machine (validation, caching, retries) is testable
/// against an in-memory backend.
pub trait GraphBackend {
    fn graph_by_region(
        &self,
        city_id: u64,
        region_id: u64,
    ) -> impl Future<Output = Result<GraphResponse>> + Send;

    fn graph_by_polygon<'a>(
        &'a self,
        city_id: u64,
        polygon: &'a [LonLat],
    ) -> impl Future<Output = Result<GraphResponse>> + Send + 'a;
}

/// Typed client over the backend's HTTP endpoints.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// List known cities, paginated.
    pub async fn list_cities(&self, page: u32, per_page: u32) -> Result<Vec<City>> {
        tracing::debug!(page, per_page, "fetching city list");
        let cities = self
            .http
            .get(self.url("/cities/"))
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(cities)
    }

    /// Fetch a single city snapshot. Districts arrive empty; fetch regions
    /// separately and group them client-side.
    pub async fn city(&self, city_id: u64) -> Result<City> {
        let city = self
            .http
            .get(self.url("/city/"))
            .query(&[("city_id", city_id)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(city)
    }

    /// Fetch all administrative regions of a city.
    pub async fn city_regions(&self, city_id: u64) -> Result<Vec<Region>> {
        let regions = self
            .http
            .get(self.url("/regions/city/"))
            .query(&[("city_id", city_id)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(regions)
    }

    /// Download the export archive for a set of regions as opaque bytes.
    pub async fn export_graph(&self, city_id: u64, region_ids: &[u64]) -> Result<Vec<u8>> {
        tracing::debug!(city_id, regions = region_ids.len(), "exporting graph archive");
        let bytes = self
            .http
            .post(self.url("/city/graph/region/export/"))
            .query(&[("city_id", city_id)])
            .json(&region_ids)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

impl GraphBackend for ApiClient {
    async fn graph_by_region(&self, city_id: u64, region_id: u64) -> Result<GraphResponse> {
        tracing::debug!(city_id, region_id, "fetching graph by region");
        let response = self
            .http
            .post(self.url("/city/graph/region/"))
            .query(&[("city_id", city_id)])
            .json(&[region_id])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    async fn graph_by_polygon(&self, city_id: u64, polygon: &[LonLat]) -> Result<GraphResponse> {
        tracing::debug!(city_id, points = polygon.len(), "fetching graph by polygon");
        let response = self
            .http
            .post(self.url(&format!("/city/graph/bbox/{city_id}")))
            .json(&[polygon])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = ApiClient::new(ClientConfig::new("http://example.test/api/")).unwrap();
        assert_eq!(client.url("/cities/"), "http://example.test/api/cities/");
    }
}
