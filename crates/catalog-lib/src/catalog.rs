//! Catalog refresh pipeline: list, inspect, stats, enrich, sort, cache

use crate::cache::{CacheLookup, FileCache};
use crate::config::Settings;
use crate::enrich;
use crate::models::{ContainerStats, EnrichedContainer, RawInspect};
use crate::runtime::ContainerRuntime;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache key for the enriched snapshot
pub const CONTAINERS_CACHE_KEY: &str = "containers";

/// Stats are sampled for at most this many running containers per refresh
const MAX_STATS_CONTAINERS: usize = 10;

/// Produces enriched, picker-ordered container snapshots
///
/// Owns the runtime client, the snapshot cache, and the settings; every
/// refresh walks the same sequential pipeline and never fails outward.
pub struct ContainerCatalog {
    runtime: Arc<dyn ContainerRuntime>,
    cache: FileCache,
    settings: Settings,
}

impl ContainerCatalog {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, cache: FileCache, settings: Settings) -> Self {
        Self {
            runtime,
            cache,
            settings,
        }
    }

    /// Full enriched snapshot, optionally served from the cache.
    ///
    /// An empty listing is returned as-is and never written to the cache.
    pub async fn refresh(&self, use_cache: bool) -> Vec<EnrichedContainer> {
        if use_cache {
            match self.cache.get::<Vec<EnrichedContainer>>(CONTAINERS_CACHE_KEY) {
                CacheLookup::Hit(containers) => {
                    debug!(count = containers.len(), "Serving catalog from cache");
                    return containers;
                }
                CacheLookup::Miss(reason) => {
                    debug!(?reason, "Catalog cache miss");
                }
            }
        }

        let containers = self.runtime.list_containers().await;
        if containers.is_empty() {
            return Vec::new();
        }

        let ids: Vec<String> = containers
            .iter()
            .filter(|c| !c.id.is_empty())
            .map(|c| c.id.clone())
            .collect();
        let inspected = self.runtime.inspect_containers(&ids).await;

        let stats = if self.settings.enable_stats {
            let running: Vec<String> = containers
                .iter()
                .filter(|c| !c.id.is_empty() && c.status.to_lowercase().contains("up"))
                .take(MAX_STATS_CONTAINERS)
                .map(|c| c.id.clone())
                .collect();
            self.runtime.sample_stats(&running).await
        } else {
            HashMap::new()
        };

        let mut enriched: Vec<EnrichedContainer> = containers
            .iter()
            .map(|container| {
                let inspect = find_inspect(&container.id, &inspected);
                let container_stats = find_stats(&container.id, &stats);
                enrich::enrich(&self.settings.url_scheme, container, inspect, container_stats)
            })
            .collect();

        sort_for_picker(&mut enriched);

        if let Err(e) = self.cache.set(CONTAINERS_CACHE_KEY, &enriched) {
            warn!(error = %e, "Failed to write catalog cache");
        }

        enriched
    }

    /// Containers belonging to one compose project
    pub async fn project_containers(&self, project: &str) -> Vec<EnrichedContainer> {
        self.refresh(true)
            .await
            .into_iter()
            .filter(|c| c.project.as_deref() == Some(project))
            .collect()
    }

    /// Drops the cached snapshot; call after any mutating action
    pub fn invalidate(&self) {
        self.cache.remove(CONTAINERS_CACHE_KEY);
    }
}

/// Resolves a listing id (usually the short form) against inspect records
/// keyed by full id.
///
/// Exact matches win. A short id that prefixes more than one record is
/// reported and treated as unmatched instead of picking one arbitrarily;
/// an empty id never matches anything.
fn find_inspect<'a>(
    short_id: &str,
    inspected: &'a HashMap<String, RawInspect>,
) -> Option<&'a RawInspect> {
    if short_id.is_empty() {
        return None;
    }
    if let Some(exact) = inspected.get(short_id) {
        return Some(exact);
    }

    let mut matches = inspected
        .iter()
        .filter(|(full_id, _)| full_id.starts_with(short_id))
        .map(|(_, record)| record);

    match (matches.next(), matches.next()) {
        (Some(record), None) => Some(record),
        (Some(_), Some(_)) => {
            warn!(
                container_id = %short_id,
                "Multiple inspect records match id prefix; skipping inspect enrichment"
            );
            None
        }
        (None, _) => None,
    }
}

/// Stats come back keyed by whatever id form the runtime echoes; exact match
/// first, then prefix in either direction.
fn find_stats<'a>(
    id: &str,
    stats: &'a HashMap<String, ContainerStats>,
) -> Option<&'a ContainerStats> {
    if id.is_empty() {
        return None;
    }
    if let Some(exact) = stats.get(id) {
        return Some(exact);
    }
    stats
        .iter()
        .find(|(key, _)| key.starts_with(id) || id.starts_with(key.as_str()))
        .map(|(_, value)| value)
}

/// Web services first, then running before stopped, then by display name.
/// The underlying sort is stable, so equal keys keep their listing order.
fn sort_for_picker(containers: &mut [EnrichedContainer]) {
    containers.sort_by_cached_key(|c| {
        (
            !c.is_web_service,
            !c.status.is_running(),
            c.display_name.to_lowercase(),
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheMiss;
    use crate::models::{ContainerStatus, HealthState, RawContainer};
    use crate::runtime::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MockRuntime {
        containers: Vec<RawContainer>,
        inspected: HashMap<String, RawInspect>,
        stats: HashMap<String, ContainerStats>,
        list_calls: AtomicUsize,
        stats_calls: AtomicUsize,
        last_stats_request: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ContainerRuntime for MockRuntime {
        async fn list_containers(&self) -> Vec<RawContainer> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.containers.clone()
        }

        async fn inspect_containers(&self, _ids: &[String]) -> HashMap<String, RawInspect> {
            self.inspected.clone()
        }

        async fn sample_stats(&self, ids: &[String]) -> HashMap<String, ContainerStats> {
            self.stats_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_stats_request.lock().unwrap() = ids.to_vec();
            ids.iter()
                .filter_map(|id| self.stats.get(id).map(|stats| (id.clone(), stats.clone())))
                .collect()
        }
    }

    fn raw(id: &str, name: &str, status: &str, image: &str) -> RawContainer {
        RawContainer {
            id: id.to_string(),
            names: format!("/{name}"),
            status: status.to_string(),
            image: image.to_string(),
            ports: String::new(),
        }
    }

    fn compose_inspect(full_id: &str, project: &str, service: &str) -> RawInspect {
        let mut inspect = RawInspect::default();
        inspect.id = full_id.to_string();
        inspect.config.labels = Some(HashMap::from([
            (
                "com.docker.compose.project".to_string(),
                project.to_string(),
            ),
            (
                "com.docker.compose.service".to_string(),
                service.to_string(),
            ),
        ]));
        inspect
    }

    fn catalog_with(
        runtime: MockRuntime,
        settings: Settings,
    ) -> (TempDir, ContainerCatalog, Arc<MockRuntime>) {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path(), settings.cache_ttl_ms);
        let runtime = Arc::new(runtime);
        let catalog = ContainerCatalog::new(runtime.clone(), cache, settings);
        (dir, catalog, runtime)
    }

    #[tokio::test]
    async fn test_refresh_orders_web_then_running_then_name() {
        let runtime = MockRuntime {
            containers: vec![
                raw("c1", "beta-tool", "Up 1 hour", "busybox"),
                raw("c2", "stopped-site", "Exited (0) 1 day ago", "nginx:alpine"),
                raw("c3", "alpha-tool", "Up 2 hours", "busybox"),
                raw("c4", "running-site", "Up 5 minutes", "nginx:alpine"),
            ],
            ..Default::default()
        };
        let (_dir, catalog, _runtime) = catalog_with(runtime, Settings::default());

        let names: Vec<String> = catalog
            .refresh(false)
            .await
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(
            names,
            vec!["running-site", "stopped-site", "alpha-tool", "beta-tool"]
        );
    }

    #[tokio::test]
    async fn test_refresh_serves_second_call_from_cache() {
        let runtime = MockRuntime {
            containers: vec![raw("c1", "solo", "Up 1 hour", "busybox")],
            ..Default::default()
        };
        let (_dir, catalog, runtime) = catalog_with(runtime, Settings::default());

        let first = catalog.refresh(true).await;
        let second = catalog.refresh(true).await;

        assert_eq!(first, second);
        assert_eq!(runtime.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache_when_asked() {
        let runtime = MockRuntime {
            containers: vec![raw("c1", "solo", "Up 1 hour", "busybox")],
            ..Default::default()
        };
        let (_dir, catalog, runtime) = catalog_with(runtime, Settings::default());

        catalog.refresh(false).await;
        catalog.refresh(false).await;

        assert_eq!(runtime.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_listing_is_not_cached() {
        let (_dir, catalog, _runtime) = catalog_with(MockRuntime::default(), Settings::default());

        assert!(catalog.refresh(true).await.is_empty());

        let lookup = catalog
            .cache
            .get::<Vec<EnrichedContainer>>(CONTAINERS_CACHE_KEY);
        assert_eq!(lookup, CacheLookup::Miss(CacheMiss::Absent));
    }

    #[tokio::test]
    async fn test_short_id_resolves_against_full_inspect_id() {
        let full_id = "abc123def456abc123def456abc123def456";
        let runtime = MockRuntime {
            containers: vec![raw("abc123def456", "shop-web-1", "Up 1 hour", "nginx")],
            inspected: HashMap::from([(
                full_id.to_string(),
                compose_inspect(full_id, "shop", "web"),
            )]),
            ..Default::default()
        };
        let (_dir, catalog, _runtime) = catalog_with(runtime, Settings::default());

        let containers = catalog.refresh(false).await;
        assert_eq!(containers[0].project.as_deref(), Some("shop"));
        assert_eq!(containers[0].service.as_deref(), Some("web"));
    }

    #[tokio::test]
    async fn test_ambiguous_id_prefix_skips_inspect_enrichment() {
        let runtime = MockRuntime {
            containers: vec![raw("abc", "mystery", "Up 1 hour", "busybox")],
            inspected: HashMap::from([
                ("abc111".to_string(), compose_inspect("abc111", "p1", "s1")),
                ("abc222".to_string(), compose_inspect("abc222", "p2", "s2")),
            ]),
            ..Default::default()
        };
        let (_dir, catalog, _runtime) = catalog_with(runtime, Settings::default());

        let containers = catalog.refresh(false).await;
        assert_eq!(containers[0].project, None);
        assert_eq!(containers[0].service, None);
        assert_eq!(containers[0].health, HealthState::Unknown);
    }

    #[test]
    fn test_empty_id_never_matches_any_record() {
        let inspected = HashMap::from([("abc111".to_string(), compose_inspect("abc111", "p", "s"))]);
        assert!(find_inspect("", &inspected).is_none());

        let stats = HashMap::from([(
            "abc111".to_string(),
            ContainerStats {
                cpu_percent: "0.5%".to_string(),
                memory_usage: "10MiB / 1GiB".to_string(),
            },
        )]);
        assert!(find_stats("", &stats).is_none());
    }

    #[tokio::test]
    async fn test_exact_inspect_match_beats_prefix_candidates() {
        let runtime = MockRuntime {
            containers: vec![raw("abc", "exact-hit", "Up 1 hour", "busybox")],
            inspected: HashMap::from([
                ("abc".to_string(), compose_inspect("abc", "right", "web")),
                (
                    "abcdef".to_string(),
                    compose_inspect("abcdef", "wrong", "web"),
                ),
            ]),
            ..Default::default()
        };
        let (_dir, catalog, _runtime) = catalog_with(runtime, Settings::default());

        let containers = catalog.refresh(false).await;
        assert_eq!(containers[0].project.as_deref(), Some("right"));
    }

    #[tokio::test]
    async fn test_stats_are_sampled_only_when_enabled() {
        let make_runtime = || MockRuntime {
            containers: vec![raw("c1", "svc", "Up 1 hour", "busybox")],
            stats: HashMap::from([(
                "c1".to_string(),
                ContainerStats {
                    cpu_percent: "0.5%".to_string(),
                    memory_usage: "10MiB / 1GiB".to_string(),
                },
            )]),
            ..Default::default()
        };

        let (_dir, catalog, runtime) = catalog_with(make_runtime(), Settings::default());
        let containers = catalog.refresh(false).await;
        assert_eq!(containers[0].stats, None);
        assert_eq!(runtime.stats_calls.load(Ordering::SeqCst), 0);

        let settings = Settings {
            enable_stats: true,
            ..Settings::default()
        };
        let (_dir, catalog, runtime) = catalog_with(make_runtime(), settings);
        let containers = catalog.refresh(false).await;
        assert_eq!(runtime.stats_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            containers[0].stats.as_ref().map(|s| s.cpu_percent.as_str()),
            Some("0.5%")
        );
    }

    #[tokio::test]
    async fn test_stats_request_covers_only_first_ten_running() {
        let mut containers = Vec::new();
        for i in 0..12 {
            containers.push(raw(&format!("run{i:02}"), &format!("svc{i:02}"), "Up 1 hour", "busybox"));
        }
        containers.push(raw("stop00", "stopped", "Exited (0)", "busybox"));

        let runtime = MockRuntime {
            containers,
            ..Default::default()
        };
        let settings = Settings {
            enable_stats: true,
            ..Settings::default()
        };
        let (_dir, catalog, runtime) = catalog_with(runtime, settings);

        catalog.refresh(false).await;

        let requested = runtime.last_stats_request.lock().unwrap().clone();
        assert_eq!(requested.len(), MAX_STATS_CONTAINERS);
        assert!(requested.iter().all(|id| id.starts_with("run")));
    }

    #[tokio::test]
    async fn test_project_containers_filters_by_exact_project() {
        let full_a = "aaa111aaa111aaa111";
        let full_b = "bbb222bbb222bbb222";
        let runtime = MockRuntime {
            containers: vec![
                raw("aaa111", "shop-web-1", "Up 1 hour", "nginx"),
                raw("bbb222", "blog-web-1", "Up 1 hour", "nginx"),
            ],
            inspected: HashMap::from([
                (full_a.to_string(), compose_inspect(full_a, "shop", "web")),
                (full_b.to_string(), compose_inspect(full_b, "blog", "web")),
            ]),
            ..Default::default()
        };
        let (_dir, catalog, _runtime) = catalog_with(runtime, Settings::default());

        let shop = catalog.project_containers("shop").await;
        assert_eq!(shop.len(), 1);
        assert_eq!(shop[0].project.as_deref(), Some("shop"));
    }

    #[tokio::test]
    async fn test_invalidate_forces_next_refresh_to_hit_runtime() {
        let runtime = MockRuntime {
            containers: vec![raw("c1", "solo", "Up 1 hour", "busybox")],
            ..Default::default()
        };
        let (_dir, catalog, runtime) = catalog_with(runtime, Settings::default());

        catalog.refresh(true).await;
        catalog.invalidate();
        catalog.refresh(true).await;

        assert_eq!(runtime.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_results_round_trip_through_cache_unchanged() {
        let full_id = "abc123def456abc123def456abc123def456";
        let runtime = MockRuntime {
            containers: vec![raw("abc123def456", "shop-web-1", "Up 1 hour (healthy)", "nginx")],
            inspected: HashMap::from([(
                full_id.to_string(),
                compose_inspect(full_id, "shop", "web"),
            )]),
            ..Default::default()
        };
        let (_dir, catalog, _runtime) = catalog_with(runtime, Settings::default());

        let built = catalog.refresh(true).await;
        let cached = catalog.refresh(true).await;

        assert_eq!(built, cached);
        assert_eq!(cached[0].status, ContainerStatus::Running);
        assert_eq!(cached[0].display_name, "web - shop");
    }
}
