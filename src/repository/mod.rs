pub mod project;
pub mod task;
pub mod user;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::cache::{CacheBackend, keys};
use crate::error::AppError;

/// Pagination plus entity-specific filter for list queries. Serialized as-is
/// to derive the list-cache key, so identical queries share a cache entry.
#[derive(Debug, Clone, Serialize)]
pub struct FindOptions<F> {
    pub skip: i64,
    pub take: i64,
    #[serde(rename = "where")]
    pub filter: F,
}

impl<F> FindOptions<F> {
    /// 1-based page number to skip/take, with the page size clamped to sane
    /// bounds.
    pub fn page(page: i64, page_size: i64, filter: F) -> Self {
        let take = page_size.clamp(1, 100);
        let skip = (page.max(1) - 1) * take;
        Self { skip, take, filter }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

pub(crate) fn total_pages(total: i64, take: i64) -> i64 {
    if take <= 0 { 0 } else { (total + take - 1) / take }
}

/// Primary-store CRUD for one entity type. Implementations talk straight to
/// Postgres; all caching lives in [`CachedRepository`].
#[async_trait]
pub trait EntityStore: Send + Sync {
    type Entity: Serialize + DeserializeOwned + Clone + Send + Sync;
    type Create: Send;
    type Update: Send;
    type Filter: Serialize + Send + Sync;

    fn entity_type(&self) -> &'static str;

    async fn insert(&self, data: Self::Create) -> Result<Self::Entity, AppError>;
    async fn fetch_by_id(&self, id: Uuid) -> Result<Option<Self::Entity>, AppError>;
    async fn fetch_page(
        &self,
        options: &FindOptions<Self::Filter>,
    ) -> Result<Vec<Self::Entity>, AppError>;
    async fn count(&self, filter: &Self::Filter) -> Result<i64, AppError>;
    async fn apply_update(
        &self,
        id: Uuid,
        data: Self::Update,
    ) -> Result<Option<Self::Entity>, AppError>;
    async fn remove(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Cache-aside wrapper over an [`EntityStore`]: read-through per-id snapshots
/// (1 h TTL), cached list pages keyed by the exact query (5 min TTL), and
/// coarse invalidation of the whole list namespace on any mutation.
pub struct CachedRepository<S: EntityStore> {
    store: S,
    cache: Arc<dyn CacheBackend>,
}

impl<S: EntityStore> CachedRepository<S> {
    pub fn new(store: S, cache: Arc<dyn CacheBackend>) -> Self {
        Self { store, cache }
    }

    /// Direct access for entity-specific pass-through queries.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn create(&self, data: S::Create) -> Result<S::Entity, AppError> {
        let entity = self.store.insert(data).await.inspect_err(|e| {
            tracing::error!("error creating {}: {:?}", self.store.entity_type(), e);
        })?;

        // Any cached page may now be stale or miscounted.
        self.invalidate_lists().await;
        tracing::info!("{} created", self.store.entity_type());
        Ok(entity)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<S::Entity>, AppError> {
        let key = keys::entity_key(self.store.entity_type(), id);

        if let Some(json) = self.cache_get(&key).await {
            if let Ok(entity) = serde_json::from_str(&json) {
                tracing::debug!("cache hit for {}", key);
                return Ok(Some(entity));
            }
        }

        let entity = self.store.fetch_by_id(id).await.inspect_err(|e| {
            tracing::error!(
                "error finding {} {}: {:?}",
                self.store.entity_type(),
                id,
                e
            );
        })?;

        if let Some(entity) = &entity {
            if let Ok(json) = serde_json::to_string(entity) {
                self.cache_put(&key, &json, keys::ENTITY_TTL_SECS).await;
            }
        }

        Ok(entity)
    }

    pub async fn find_all(
        &self,
        options: FindOptions<S::Filter>,
    ) -> Result<PaginatedResult<S::Entity>, AppError> {
        let params = serde_json::to_string(&options)?;
        let key = keys::list_key(self.store.entity_type(), &params);

        if let Some(json) = self.cache_get(&key).await {
            if let Ok(page) = serde_json::from_str(&json) {
                tracing::debug!("cache hit for {} list", self.store.entity_type());
                return Ok(page);
            }
        }

        let (data, total) = tokio::try_join!(
            self.store.fetch_page(&options),
            self.store.count(&options.filter)
        )
        .inspect_err(|e| {
            tracing::error!(
                "error listing {}: {:?}",
                self.store.entity_type(),
                e
            );
        })?;

        let result = PaginatedResult {
            data,
            total,
            page: options.skip / options.take + 1,
            page_size: options.take,
            total_pages: total_pages(total, options.take),
        };

        if let Ok(json) = serde_json::to_string(&result) {
            self.cache_put(&key, &json, keys::LIST_TTL_SECS).await;
        }

        Ok(result)
    }

    pub async fn update(&self, id: Uuid, data: S::Update) -> Result<S::Entity, AppError> {
        let entity = self
            .store
            .apply_update(id, data)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    "error updating {} {}: {:?}",
                    self.store.entity_type(),
                    id,
                    e
                );
            })?
            .ok_or_else(|| {
                AppError::NotFound(format!("{} not found", self.store.entity_type()))
            })?;

        self.invalidate_entity(id).await;
        self.invalidate_lists().await;
        tracing::info!("{} {} updated", self.store.entity_type(), id);
        Ok(entity)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let removed = self.store.remove(id).await.inspect_err(|e| {
            tracing::error!(
                "error deleting {} {}: {:?}",
                self.store.entity_type(),
                id,
                e
            );
        })?;

        self.invalidate_entity(id).await;
        self.invalidate_lists().await;
        tracing::info!("{} {} deleted", self.store.entity_type(), id);
        Ok(removed)
    }

    pub async fn count(&self, filter: &S::Filter) -> Result<i64, AppError> {
        self.store.count(filter).await
    }

    pub async fn exists(&self, filter: &S::Filter) -> Result<bool, AppError> {
        Ok(self.store.count(filter).await? > 0)
    }

    /// Drops the per-id snapshot. Exposed for pass-through mutations that
    /// touch an entity row outside [`CachedRepository::update`].
    pub async fn invalidate_entity(&self, id: Uuid) {
        let key = keys::entity_key(self.store.entity_type(), id);
        if let Err(e) = self.cache.delete(&key).await {
            tracing::warn!("failed to invalidate {}: {:?}", key, e);
        }
    }

    /// Drops every cached list page of the type. Exposed for the same
    /// out-of-band mutations as [`CachedRepository::invalidate_entity`].
    pub async fn invalidate_lists(&self) {
        let pattern = keys::list_pattern(self.store.entity_type());
        if let Err(e) = self.cache.delete_matching(&pattern).await {
            tracing::warn!("failed to invalidate {}: {:?}", pattern, e);
        }
    }

    async fn cache_get(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("cache read failed for {}: {:?}", key, e);
                None
            }
        }
    }

    async fn cache_put(&self, key: &str, value: &str, ttl_secs: u64) {
        if let Err(e) = self.cache.set_ex(key, value, ttl_secs).await {
            tracing::warn!("cache write failed for {}: {:?}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::MemoryBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: Uuid,
        name: String,
    }

    #[derive(Debug, Clone, Serialize)]
    struct WidgetFilter {
        name: Option<String>,
    }

    #[derive(Default)]
    struct WidgetStore {
        rows: Mutex<Vec<Widget>>,
        reads: AtomicUsize,
    }

    impl WidgetStore {
        fn read_count(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        fn matches(filter: &WidgetFilter, w: &Widget) -> bool {
            filter.name.as_deref().is_none_or(|n| w.name == n)
        }
    }

    #[async_trait]
    impl EntityStore for WidgetStore {
        type Entity = Widget;
        type Create = String;
        type Update = String;
        type Filter = WidgetFilter;

        fn entity_type(&self) -> &'static str {
            "widget"
        }

        async fn insert(&self, name: String) -> Result<Widget, AppError> {
            let widget = Widget {
                id: Uuid::new_v4(),
                name,
            };
            self.rows.lock().await.push(widget.clone());
            Ok(widget)
        }

        async fn fetch_by_id(&self, id: Uuid) -> Result<Option<Widget>, AppError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.lock().await.iter().find(|w| w.id == id).cloned())
        }

        async fn fetch_page(
            &self,
            options: &FindOptions<WidgetFilter>,
        ) -> Result<Vec<Widget>, AppError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .rows
                .lock()
                .await
                .iter()
                .filter(|w| Self::matches(&options.filter, w))
                .skip(options.skip as usize)
                .take(options.take as usize)
                .cloned()
                .collect())
        }

        async fn count(&self, filter: &WidgetFilter) -> Result<i64, AppError> {
            Ok(self
                .rows
                .lock()
                .await
                .iter()
                .filter(|w| Self::matches(filter, w))
                .count() as i64)
        }

        async fn apply_update(&self, id: Uuid, name: String) -> Result<Option<Widget>, AppError> {
            let mut rows = self.rows.lock().await;
            match rows.iter_mut().find(|w| w.id == id) {
                Some(w) => {
                    w.name = name;
                    Ok(Some(w.clone()))
                }
                None => Ok(None),
            }
        }

        async fn remove(&self, id: Uuid) -> Result<bool, AppError> {
            let mut rows = self.rows.lock().await;
            let before = rows.len();
            rows.retain(|w| w.id != id);
            Ok(rows.len() < before)
        }
    }

    fn repo() -> CachedRepository<WidgetStore> {
        CachedRepository::new(WidgetStore::default(), Arc::new(MemoryBackend::default()))
    }

    fn all() -> FindOptions<WidgetFilter> {
        FindOptions::page(1, 10, WidgetFilter { name: None })
    }

    #[tokio::test]
    async fn find_by_id_populates_cache_and_skips_store_on_second_read() {
        let repo = repo();
        let created = repo.create("alpha".to_string()).await.unwrap();

        let first = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(repo.store().read_count(), 1);

        let second = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(repo.store().read_count(), 1, "second read must be a cache hit");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn update_invalidates_entity_snapshot() {
        let repo = repo();
        let created = repo.create("before".to_string()).await.unwrap();

        // Populate the snapshot, then mutate.
        repo.find_by_id(created.id).await.unwrap();
        repo.update(created.id, "after".to_string()).await.unwrap();

        let current = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(current.name, "after");
    }

    #[tokio::test]
    async fn create_invalidates_cached_list_totals() {
        let repo = repo();
        repo.create("a".to_string()).await.unwrap();

        let page = repo.find_all(all()).await.unwrap();
        assert_eq!(page.total, 1);

        repo.create("b".to_string()).await.unwrap();

        let page = repo.find_all(all()).await.unwrap();
        assert_eq!(page.total, 2, "stale cached total must not survive a create");
    }

    #[tokio::test]
    async fn find_all_serves_repeat_queries_from_cache() {
        let repo = repo();
        repo.create("a".to_string()).await.unwrap();

        repo.find_all(all()).await.unwrap();
        let reads = repo.store().read_count();

        repo.find_all(all()).await.unwrap();
        assert_eq!(repo.store().read_count(), reads);
    }

    #[tokio::test]
    async fn delete_removes_entity_and_refreshes_lists() {
        let repo = repo();
        let created = repo.create("gone".to_string()).await.unwrap();
        repo.find_by_id(created.id).await.unwrap();
        repo.find_all(all()).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.find_by_id(created.id).await.unwrap().is_none());
        assert_eq!(repo.find_all(all()).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn distinct_queries_use_distinct_cache_entries() {
        let repo = repo();
        repo.create("x".to_string()).await.unwrap();
        repo.create("y".to_string()).await.unwrap();

        let filtered = repo
            .find_all(FindOptions::page(
                1,
                10,
                WidgetFilter {
                    name: Some("x".to_string()),
                },
            ))
            .await
            .unwrap();
        assert_eq!(filtered.total, 1);

        let unfiltered = repo.find_all(all()).await.unwrap();
        assert_eq!(unfiltered.total, 2);
    }

    #[tokio::test]
    async fn out_of_band_mutations_can_drop_cached_lists() {
        let repo = repo();
        repo.create("alpha".to_string()).await.unwrap();

        repo.find_all(all()).await.unwrap();
        let reads = repo.store().read_count();

        repo.find_all(all()).await.unwrap();
        assert_eq!(repo.store().read_count(), reads);

        // A store-level mutation outside update() must be able to force the
        // next listing back to the store.
        repo.invalidate_lists().await;
        repo.find_all(all()).await.unwrap();
        assert_eq!(repo.store().read_count(), reads + 1);
    }

    #[tokio::test]
    async fn pagination_math() {
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(20, 10), 2);
        assert_eq!(total_pages(0, 10), 0);

        let opts = FindOptions::page(3, 10, ());
        assert_eq!(opts.skip, 20);
        assert_eq!(opts.take, 10);
    }

    struct BrokenBackend;

    #[async_trait]
    impl CacheBackend for BrokenBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>, AppError> {
            Err(AppError::Internal("cache down".to_string()))
        }
        async fn set_ex(&self, _: &str, _: &str, _: u64) -> Result<(), AppError> {
            Err(AppError::Internal("cache down".to_string()))
        }
        async fn delete(&self, _: &str) -> Result<(), AppError> {
            Err(AppError::Internal("cache down".to_string()))
        }
        async fn delete_matching(&self, _: &str) -> Result<(), AppError> {
            Err(AppError::Internal("cache down".to_string()))
        }
    }

    #[tokio::test]
    async fn unavailable_cache_degrades_to_store_reads() {
        let repo = CachedRepository::new(WidgetStore::default(), Arc::new(BrokenBackend));

        let created = repo.create("resilient".to_string()).await.unwrap();
        let found = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.name, "resilient");

        let page = repo.find_all(all()).await.unwrap();
        assert_eq!(page.total, 1);
    }
}
