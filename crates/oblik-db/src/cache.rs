//! # Read Cache
//!
//! A short-lived, in-process cache in front of list and detail reads.
//!
//! ## Entries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items    : item_id   → Item                                            │
//! │  sales    : item_id   → Vec<Sale>                                       │
//! │  pages    : ItemQuery → Vec<ItemWithSales>                              │
//! │  full     : ()        → Vec<ItemWithSales>   (stats, export)            │
//! │                                                                         │
//! │  every entry expires `ttl` after it was stored                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invalidation
//! Writes name the entity they touched; only entries that can contain it are
//! dropped:
//!
//! | change            | item | sales | pages dropped                       | full |
//! |-------------------|------|-------|-------------------------------------|------|
//! | item created      |  -   |   -   | pages with room left (not full)     | yes  |
//! | item updated      | yes  |   -   | see [`ItemChange::may_alter`]       | yes  |
//! | sales changed     |  -   |  yes  | see [`ItemChange::may_alter`]       | yes  |
//! | item deleted      | yes  |  yes  | pages holding it or a later id      | yes  |
//!
//! ## Fills racing writes
//! A read that misses fetches from the store and then fills the cache. If a
//! write lands in between, the fill may carry pre-write rows. Every
//! invalidation bumps a generation counter; callers read
//! [`ReadCache::generation`] before fetching and pass it to the `put_*`
//! call, which stores nothing once the counter has moved. The check runs
//! under the table lock, and invalidation bumps before it drops entries, so
//! a stale fill is either refused or removed by that invalidation.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use oblik_core::{Item, ItemQuery, ItemWithSales, Sale, StockFilter};

// =============================================================================
// Entry
// =============================================================================

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// One keyed table of entries sharing a TTL.
#[derive(Debug)]
struct TtlMap<K, V> {
    store: RwLock<Table<K, V>>,
}

#[derive(Debug)]
struct Table<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    /// Earliest time the next insert sweeps out expired entries.
    next_sweep: Instant,
}

impl<K: Eq + Hash, V: Clone> TtlMap<K, V> {
    fn new() -> Self {
        Self {
            store: RwLock::new(Table {
                entries: HashMap::new(),
                next_sweep: Instant::now(),
            }),
        }
    }

    async fn get(&self, key: &K) -> Option<V> {
        {
            let store = self.store.read().await;
            match store.entries.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.store.write().await.entries.remove(key);
        None
    }

    /// Stores an entry.
    ///
    /// At most once per `ttl`, the insert first drops every expired entry,
    /// so keys that are never read again (one-off page queries) do not pile
    /// up: the table holds at most what was stored in the last two TTLs.
    ///
    /// `fresh` is evaluated under the write lock; when it returns `false`
    /// nothing is stored.
    async fn insert(&self, key: K, value: V, ttl: Duration, fresh: impl FnOnce() -> bool) {
        let mut store = self.store.write().await;
        if !fresh() {
            debug!("Dropping cache fill that raced a write");
            return;
        }
        let now = Instant::now();
        if now >= store.next_sweep {
            let before = store.entries.len();
            store.entries.retain(|_, entry| !entry.is_expired());
            store.next_sweep = now + ttl;
            if store.entries.len() < before {
                debug!(before, after = store.entries.len(), "Swept expired cache entries");
            }
        }
        store.entries.insert(key, CacheEntry::new(value, ttl));
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.store.read().await.entries.len()
    }

    async fn remove(&self, key: &K) {
        self.store.write().await.entries.remove(key);
    }

    async fn retain(&self, mut keep: impl FnMut(&K, &V) -> bool) {
        self.store
            .write()
            .await
            .entries
            .retain(|k, entry| !entry.is_expired() && keep(k, &entry.value));
    }

    async fn clear(&self) {
        self.store.write().await.entries.clear();
    }
}

// =============================================================================
// Change Description
// =============================================================================

/// What a write did to an item, for targeted invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemChange {
    Created(i64),
    Updated(i64),
    SalesChanged(i64),
    Deleted(i64),
}

impl ItemChange {
    pub fn item_id(&self) -> i64 {
        match *self {
            ItemChange::Created(id)
            | ItemChange::Updated(id)
            | ItemChange::SalesChanged(id)
            | ItemChange::Deleted(id) => id,
        }
    }

    /// Whether a cached page could differ after this change.
    ///
    /// Pages are ordered by id. A change to item `id` cannot touch a page
    /// whose rows all precede `id` unless the page still had room for it.
    /// An unfiltered page keeps its membership on update, so it only
    /// changes when it holds the item.
    pub fn may_alter(&self, query: &ItemQuery, rows: &[ItemWithSales]) -> bool {
        let id = self.item_id();
        let contains = rows.iter().any(|r| r.item.id == id);
        let all_before = rows.iter().all(|r| r.item.id < id);
        let full = rows.len() >= query.limit as usize;
        let unfiltered = query.filter == StockFilter::All && query.search.is_none();

        match self {
            ItemChange::Created(_) => !full,
            ItemChange::Deleted(_) => !all_before,
            ItemChange::Updated(_) | ItemChange::SalesChanged(_) if unfiltered => contains,
            ItemChange::Updated(_) | ItemChange::SalesChanged(_) => {
                contains || !(all_before && full)
            }
        }
    }
}

// =============================================================================
// Read Cache
// =============================================================================

/// Time-boxed read cache shared by every request.
///
/// Cheap to clone; clones share the same entries.
#[derive(Debug, Clone)]
pub struct ReadCache {
    inner: Arc<CacheTables>,
    ttl: Duration,
}

#[derive(Debug)]
struct CacheTables {
    /// Bumped by every invalidation.
    generation: AtomicU64,
    items: TtlMap<i64, Item>,
    sales: TtlMap<i64, Vec<Sale>>,
    pages: TtlMap<ItemQuery, Vec<ItemWithSales>>,
    full: TtlMap<(), Vec<ItemWithSales>>,
}

impl ReadCache {
    /// Creates a cache whose entries live for `ttl`.
    ///
    /// A zero TTL disables caching: nothing is ever stored.
    pub fn new(ttl: Duration) -> Self {
        ReadCache {
            inner: Arc::new(CacheTables {
                generation: AtomicU64::new(0),
                items: TtlMap::new(),
                sales: TtlMap::new(),
                pages: TtlMap::new(),
                full: TtlMap::new(),
            }),
            ttl,
        }
    }

    fn enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Current invalidation generation. Read it before fetching the rows
    /// that will be passed to a `put_*` call.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    fn unchanged_since(&self, observed: u64) -> impl FnOnce() -> bool + '_ {
        move || self.generation() == observed
    }

    pub async fn item(&self, id: i64) -> Option<Item> {
        self.inner.items.get(&id).await
    }

    pub async fn put_item(&self, item: Item, observed: u64) {
        if self.enabled() {
            let fresh = self.unchanged_since(observed);
            self.inner.items.insert(item.id, item, self.ttl, fresh).await;
        }
    }

    pub async fn sales(&self, item_id: i64) -> Option<Vec<Sale>> {
        self.inner.sales.get(&item_id).await
    }

    pub async fn put_sales(&self, item_id: i64, sales: Vec<Sale>, observed: u64) {
        if self.enabled() {
            let fresh = self.unchanged_since(observed);
            self.inner.sales.insert(item_id, sales, self.ttl, fresh).await;
        }
    }

    pub async fn page(&self, query: &ItemQuery) -> Option<Vec<ItemWithSales>> {
        self.inner.pages.get(query).await
    }

    pub async fn put_page(&self, query: ItemQuery, rows: Vec<ItemWithSales>, observed: u64) {
        if self.enabled() {
            let fresh = self.unchanged_since(observed);
            self.inner.pages.insert(query, rows, self.ttl, fresh).await;
        }
    }

    pub async fn full_listing(&self) -> Option<Vec<ItemWithSales>> {
        self.inner.full.get(&()).await
    }

    pub async fn put_full_listing(&self, rows: Vec<ItemWithSales>, observed: u64) {
        if self.enabled() {
            let fresh = self.unchanged_since(observed);
            self.inner.full.insert((), rows, self.ttl, fresh).await;
        }
    }

    /// Drops the entries a write to one item can have made stale.
    pub async fn invalidate(&self, change: ItemChange) {
        let id = change.item_id();
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(?change, generation, "Invalidating cached reads");

        match change {
            ItemChange::Created(_) => {}
            ItemChange::Updated(_) => self.inner.items.remove(&id).await,
            ItemChange::SalesChanged(_) => self.inner.sales.remove(&id).await,
            ItemChange::Deleted(_) => {
                self.inner.items.remove(&id).await;
                self.inner.sales.remove(&id).await;
            }
        }

        self.inner
            .pages
            .retain(|query, rows| !change.may_alter(query, rows))
            .await;
        self.inner.full.clear().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: i64) -> Item {
        Item {
            id,
            name: format!("item {id}"),
            initial_quantity: 1,
            cost_uah: 0.0,
            customs_uah: 0.0,
            description: None,
            origin_country: None,
            original_currency: None,
            cost_original: None,
            shipping_original: None,
            rate: None,
            created_at: Utc::now(),
        }
    }

    fn rows(ids: &[i64]) -> Vec<ItemWithSales> {
        ids.iter().map(|id| ItemWithSales::new(item(*id), vec![])).collect()
    }

    fn query(skip: u32, limit: u32, filter: StockFilter) -> ItemQuery {
        ItemQuery {
            skip,
            limit,
            search: None,
            filter,
        }
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = ReadCache::new(Duration::from_millis(20));
        cache.put_item(item(1), cache.generation()).await;
        assert!(cache.item(1).await.is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.item(1).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_pages_are_swept_without_writes() {
        let cache = ReadCache::new(Duration::from_millis(10));
        for skip in 0..1000 {
            cache.put_page(query(skip, 20, StockFilter::All), rows(&[1]), cache.generation()).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Reads of other keys, then one more fill
        for skip in 2000..2010 {
            assert!(cache.page(&query(skip, 20, StockFilter::All)).await.is_none());
        }
        cache.put_page(query(5000, 20, StockFilter::All), rows(&[1]), cache.generation()).await;

        assert_eq!(cache.inner.pages.len().await, 1);
    }

    #[tokio::test]
    async fn test_fill_older_than_invalidation_is_dropped() {
        let cache = ReadCache::new(Duration::from_secs(60));

        // Rows read before a sale was written, stored after its invalidation
        let observed = cache.generation();
        cache.invalidate(ItemChange::SalesChanged(1)).await;
        cache.put_sales(1, vec![], observed).await;
        cache.put_page(query(0, 20, StockFilter::All), rows(&[1]), observed).await;
        cache.put_full_listing(rows(&[1]), observed).await;

        assert!(cache.sales(1).await.is_none());
        assert!(cache.page(&query(0, 20, StockFilter::All)).await.is_none());
        assert!(cache.full_listing().await.is_none());

        cache.put_sales(1, vec![], cache.generation()).await;
        assert!(cache.sales(1).await.is_some());
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let cache = ReadCache::new(Duration::ZERO);
        cache.put_item(item(1), cache.generation()).await;
        assert!(cache.item(1).await.is_none());
    }

    #[tokio::test]
    async fn test_sale_write_keeps_unrelated_entries() {
        let cache = ReadCache::new(Duration::from_secs(60));
        cache.put_item(item(1), cache.generation()).await;
        cache.put_sales(1, vec![], cache.generation()).await;
        cache.put_sales(2, vec![], cache.generation()).await;
        cache.put_page(query(0, 2, StockFilter::All), rows(&[1, 2]), cache.generation()).await;
        cache.put_page(query(2, 2, StockFilter::All), rows(&[3, 4]), cache.generation()).await;
        cache.put_full_listing(rows(&[1, 2, 3, 4]), cache.generation()).await;

        cache.invalidate(ItemChange::SalesChanged(3)).await;

        assert!(cache.item(1).await.is_some());
        assert!(cache.sales(1).await.is_some());
        assert!(cache.sales(2).await.is_some());
        assert!(cache.page(&query(0, 2, StockFilter::All)).await.is_some());
        assert!(cache.page(&query(2, 2, StockFilter::All)).await.is_none());
        assert!(cache.full_listing().await.is_none());
    }

    #[tokio::test]
    async fn test_delete_drops_item_and_later_pages() {
        let cache = ReadCache::new(Duration::from_secs(60));
        cache.put_item(item(3), cache.generation()).await;
        cache.put_sales(3, vec![], cache.generation()).await;
        cache.put_page(query(0, 2, StockFilter::All), rows(&[1, 2]), cache.generation()).await;
        cache.put_page(query(2, 2, StockFilter::All), rows(&[4, 5]), cache.generation()).await;

        cache.invalidate(ItemChange::Deleted(3)).await;

        assert!(cache.item(3).await.is_none());
        assert!(cache.sales(3).await.is_none());
        assert!(cache.page(&query(0, 2, StockFilter::All)).await.is_some());
        assert!(cache.page(&query(2, 2, StockFilter::All)).await.is_none());
    }

    #[test]
    fn test_may_alter_rules() {
        let full_page = rows(&[1, 2]);
        let short_page = rows(&[7]);
        let all = query(0, 2, StockFilter::All);
        let in_stock = query(0, 2, StockFilter::InStock);

        assert!(!ItemChange::Created(9).may_alter(&all, &full_page));
        assert!(ItemChange::Created(9).may_alter(&all, &short_page));

        // Filtered page: a later item may enter or leave only if there is room
        assert!(!ItemChange::SalesChanged(5).may_alter(&in_stock, &full_page));
        assert!(ItemChange::SalesChanged(5).may_alter(&in_stock, &short_page));
        assert!(ItemChange::Updated(1).may_alter(&in_stock, &full_page));

        // Unfiltered page: only the page holding the item
        assert!(!ItemChange::Updated(7).may_alter(&all, &full_page));
        assert!(ItemChange::Updated(7).may_alter(&all, &short_page));
    }
}
