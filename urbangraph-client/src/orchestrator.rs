//! Graph-load orchestration: validation, caching, retries and result
//! commit ordering.
//!
//! One [`GraphLoader`] serves one map view. Map callbacks arrive as
//! [`MapSelection`] commands, become [`GraphRequest`]s, and go through a
//! fixed lifecycle: validate, consult the request cache, fetch with the
//! retry policy, build the snapshot, then commit it as the current graph —
//! but only if no newer request was issued meanwhile. Results are applied
//! in completion order, so that stale-commit guard is what keeps a slow
//! superseded response from overwriting a newer one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use urbangraph_core::builder::{build_graph, BuiltGraph};
use urbangraph_core::types::{GraphRequest, LonLat};

use crate::api::GraphBackend;
use crate::error::{ApiError, LoadError};

/// Additional attempts after the first failed transient fetch.
pub const RETRY_BUDGET: u32 = 2;

/// Minimum points for a drawn polygon to describe an area.
const MIN_POLYGON_POINTS: usize = 3;

/// A user selection event coming off the map surface.
///
/// The map widget owns hit-testing and drawing UX; the core only sees these
/// explicit commands.
#[derive(Clone, Debug, PartialEq)]
pub enum MapSelection {
    /// An administrative region was clicked.
    Region { region_id: u64 },
    /// A free-form polygon was drawn, points in `(lon, lat)` wire order.
    Polygon { points: Vec<LonLat> },
}

impl MapSelection {
    /// Turn a selection into a graph request for the given city.
    pub fn into_request(self, city_id: u64) -> GraphRequest {
        match self {
            MapSelection::Region { region_id } => GraphRequest::Region { city_id, region_id },
            MapSelection::Polygon { points } => GraphRequest::Polygon {
                city_id,
                polygon: points,
            },
        }
    }
}

#[derive(Default)]
struct LoaderState {
    /// Completed builds keyed by the full request payload. Append-only;
    /// an overwrite for an existing key is idempotent since identical
    /// requests yield identical results.
    cache: HashMap<String, Arc<BuiltGraph>>,
    /// In-flight request count, for UI disabling.
    pending: usize,
    /// Key of the most recently issued request; completions compare against
    /// this before committing.
    latest: Option<String>,
    /// The committed current graph, if any.
    current: Option<Arc<BuiltGraph>>,
}

/// Orchestrates graph fetches for one map view.
pub struct GraphLoader<B> {
    backend: B,
    state: Mutex<LoaderState>,
}

impl<B: GraphBackend> GraphLoader<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: Mutex::new(LoaderState::default()),
        }
    }

    /// Handle a map selection for a city: build the request and load it.
    pub async fn on_selection(
        &self,
        city_id: u64,
        selection: MapSelection,
    ) -> Result<Arc<BuiltGraph>, LoadError> {
        self.load(selection.into_request(city_id)).await
    }

    /// Load a graph for a request, going to the network only when the cache
    /// has no entry for the identical request.
    pub async fn load(&self, request: GraphRequest) -> Result<Arc<BuiltGraph>, LoadError> {
        if let Err(reason) = validate(&request) {
            return Err(LoadError {
                request,
                source: ApiError::InvalidRequest { reason },
            });
        }

        let key = request.cache_key();
        {
            let mut state = self.lock_state();
            state.latest = Some(key.clone());
            if let Some(hit) = state.cache.get(&key) {
                tracing::debug!(key = %key, "graph request served from cache");
                let hit = Arc::clone(hit);
                // A cache hit is by definition the latest issued request.
                state.current = Some(Arc::clone(&hit));
                return Ok(hit);
            }
            state.pending += 1;
        }

        let outcome = self.fetch_with_retry(&request).await;

        let mut state = self.lock_state();
        state.pending -= 1;
        match outcome {
            Ok(response) => {
                let built = Arc::new(build_graph(response));
                state.cache.insert(key.clone(), Arc::clone(&built));
                if state.latest.as_deref() == Some(key.as_str()) {
                    state.current = Some(Arc::clone(&built));
                } else {
                    tracing::debug!(key = %key, "superseded result not committed");
                }
                Ok(built)
            }
            Err(source) => {
                tracing::warn!(request = ?request, error = %source, "graph load failed");
                Err(LoadError { request, source })
            }
        }
    }

    async fn fetch_with_retry(
        &self,
        request: &GraphRequest,
    ) -> Result<urbangraph_core::builder::GraphResponse, ApiError> {
        let mut attempt: u32 = 0;
        loop {
            let result = match request {
                GraphRequest::Region { city_id, region_id } => {
                    self.backend.graph_by_region(*city_id, *region_id).await
                }
                GraphRequest::Polygon { city_id, polygon } => {
                    self.backend.graph_by_polygon(*city_id, polygon).await
                }
            };
            match result {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < RETRY_BUDGET => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %err, "transient graph fetch failure, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// True while any tracked request is pending.
    pub fn is_loading(&self) -> bool {
        self.lock_state().pending > 0
    }

    /// The committed current graph, if any load has completed as latest.
    pub fn current(&self) -> Option<Arc<BuiltGraph>> {
        self.lock_state().current.clone()
    }

    /// Peek at the cache without issuing a load.
    pub fn cached(&self, request: &GraphRequest) -> Option<Arc<BuiltGraph>> {
        self.lock_state().cache.get(&request.cache_key()).cloned()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, LoaderState> {
        // The lock is only held for bookkeeping, never across an await.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn validate(request: &GraphRequest) -> Result<(), String> {
    match request {
        GraphRequest::Region { .. } => Ok(()),
        GraphRequest::Polygon { polygon, .. } => {
            if polygon.len() < MIN_POLYGON_POINTS {
                Err(format!(
                    "polygon needs at least {MIN_POLYGON_POINTS} points, got {}",
                    polygon.len()
                ))
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use urbangraph_core::builder::{CsvBundle, GraphResponse};

    fn csv_response(tag: &str) -> GraphResponse {
        GraphResponse::Csv(CsvBundle {
            points_csv: "id,lat,lon\n1,55.75,37.61\n2,55.76,37.62".into(),
            edges_csv: "id,source,target\n10,1,2".into(),
            metrics_csv: None,
            access_nodes_csv: None,
            access_edges_csv: None,
            graph_name: Some(tag.to_string()),
        })
    }

    fn transient() -> ApiError {
        ApiError::Transient {
            message: "connection reset".into(),
        }
    }

    /// Scripted backend: pops one pre-programmed result per call and counts
    /// calls. An optional per-region delay makes completion-order tests
    /// deterministic under paused tokio time.
    struct FakeBackend {
        script: Mutex<VecDeque<Result<GraphResponse, ApiError>>>,
        calls: AtomicUsize,
        delays: HashMap<u64, Duration>,
    }

    impl FakeBackend {
        fn new(script: Vec<Result<GraphResponse, ApiError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
                delays: HashMap::new(),
            }
        }

        fn with_delay(mut self, region_id: u64, delay: Duration) -> Self {
            self.delays.insert(region_id, delay);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn next(&self) -> Result<GraphResponse, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(transient()))
        }
    }

    impl GraphBackend for FakeBackend {
        async fn graph_by_region(
            &self,
            _city_id: u64,
            region_id: u64,
        ) -> Result<GraphResponse, ApiError> {
            let result = self.next();
            if let Some(delay) = self.delays.get(&region_id) {
                tokio::time::sleep(*delay).await;
            }
            result
        }

        async fn graph_by_polygon(
            &self,
            _city_id: u64,
            _polygon: &[LonLat],
        ) -> Result<GraphResponse, ApiError> {
            self.next()
        }
    }

    fn region_request(region_id: u64) -> GraphRequest {
        GraphRequest::Region {
            city_id: 1,
            region_id,
        }
    }

    fn triangle() -> Vec<LonLat> {
        vec![LonLat(0.0, 0.0), LonLat(1.0, 0.0), LonLat(1.0, 1.0)]
    }

    #[tokio::test]
    async fn two_point_polygon_fails_without_network() {
        let loader = GraphLoader::new(FakeBackend::new(vec![]));
        let err = loader
            .load(GraphRequest::Polygon {
                city_id: 1,
                polygon: vec![LonLat(0.0, 0.0), LonLat(1.0, 0.0)],
            })
            .await
            .unwrap_err();

        assert!(matches!(err.source, ApiError::InvalidRequest { .. }));
        assert!(matches!(err.request, GraphRequest::Polygon { .. }));
        assert_eq!(loader.backend.calls(), 0);
        assert!(!loader.is_loading());
    }

    #[tokio::test]
    async fn transient_failures_are_retried_then_succeed() {
        let backend = FakeBackend::new(vec![
            Err(transient()),
            Err(transient()),
            Ok(csv_response("third time lucky")),
        ]);
        let loader = GraphLoader::new(backend);

        let built = loader.load(region_request(5)).await.unwrap();
        assert_eq!(built.snapshot.name.as_deref(), Some("third time lucky"));
        assert_eq!(loader.backend.calls(), 3);
    }

    #[tokio::test]
    async fn retry_budget_is_two_extra_attempts() {
        let backend = FakeBackend::new(vec![
            Err(transient()),
            Err(transient()),
            Err(transient()),
            Ok(csv_response("never reached")),
        ]);
        let loader = GraphLoader::new(backend);

        let err = loader.load(region_request(5)).await.unwrap_err();
        assert!(matches!(err.source, ApiError::Transient { .. }));
        assert_eq!(loader.backend.calls(), 3);
    }

    #[tokio::test]
    async fn not_found_is_terminal_on_first_attempt() {
        let backend = FakeBackend::new(vec![Err(ApiError::NotFound {
            message: "no region".into(),
        })]);
        let loader = GraphLoader::new(backend);

        let err = loader.load(region_request(404)).await.unwrap_err();
        assert!(matches!(err.source, ApiError::NotFound { .. }));
        assert_eq!(loader.backend.calls(), 1);
    }

    #[tokio::test]
    async fn bad_request_polygon_is_terminal_on_first_attempt() {
        let backend = FakeBackend::new(vec![Err(ApiError::BadRequest {
            message: "self-intersecting polygon".into(),
        })]);
        let loader = GraphLoader::new(backend);

        let err = loader
            .load(GraphRequest::Polygon {
                city_id: 1,
                polygon: triangle(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.source, ApiError::BadRequest { .. }));
        assert_eq!(loader.backend.calls(), 1);
    }

    #[tokio::test]
    async fn identical_request_is_served_from_cache() {
        let backend = FakeBackend::new(vec![Ok(csv_response("cached"))]);
        let loader = GraphLoader::new(backend);

        let first = loader.load(region_request(5)).await.unwrap();
        let second = loader.load(region_request(5)).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.backend.calls(), 1);
        assert!(loader.cached(&region_request(5)).is_some());
    }

    #[tokio::test]
    async fn different_polygons_do_not_share_cache_entries() {
        let backend = FakeBackend::new(vec![Ok(csv_response("a")), Ok(csv_response("b"))]);
        let loader = GraphLoader::new(backend);

        let mut other = triangle();
        other[2] = LonLat(0.0, 1.0);

        loader
            .load(GraphRequest::Polygon {
                city_id: 1,
                polygon: triangle(),
            })
            .await
            .unwrap();
        loader
            .load(GraphRequest::Polygon {
                city_id: 1,
                polygon: other,
            })
            .await
            .unwrap();

        assert_eq!(loader.backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_result_does_not_overwrite_newer_commit() {
        // Region 1 completes long after region 2; the loader must keep
        // region 2 as current even though region 1 finishes last.
        let backend = FakeBackend::new(vec![Ok(csv_response("slow")), Ok(csv_response("fast"))])
            .with_delay(1, Duration::from_secs(5));
        let loader = GraphLoader::new(backend);

        let (slow, fast) = tokio::join!(
            loader.load(region_request(1)),
            loader.load(region_request(2)),
        );
        slow.unwrap();
        fast.unwrap();

        let current = loader.current().expect("a commit should have happened");
        assert_eq!(current.snapshot.name.as_deref(), Some("fast"));
        // Both results are cached regardless of commit order.
        assert!(loader.cached(&region_request(1)).is_some());
        assert!(loader.cached(&region_request(2)).is_some());
    }

    #[tokio::test]
    async fn selection_commands_map_to_requests() {
        let backend = FakeBackend::new(vec![Ok(csv_response("clicked"))]);
        let loader = GraphLoader::new(backend);

        let built = loader
            .on_selection(9, MapSelection::Region { region_id: 3 })
            .await
            .unwrap();
        assert_eq!(built.snapshot.name.as_deref(), Some("clicked"));
        assert!(loader
            .cached(&GraphRequest::Region {
                city_id: 9,
                region_id: 3
            })
            .is_some());

        let err = loader
            .on_selection(
                9,
                MapSelection::Polygon {
                    points: vec![LonLat(0.0, 0.0)],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err.source, ApiError::InvalidRequest { .. }));
    }
}
