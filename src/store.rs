//! Todo store
//!
//! [`TodoStore`] is the entry point for reading and changing todo data. Every
//! mutating operation is one unit of work:
//!
//! 1. acquire `store.lock`
//! 2. load `store.json`
//! 3. apply the change (position changes go through [`PositionLedger`])
//! 4. validate and atomically replace `store.json`
//!
//! Any error before step 4 leaves the file untouched, so a reorder writes both
//! swapped records or neither.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ledger::{self, PositionLedger, ReorderOutcome, ScopeResolver};
use crate::lock::FileLock;
use crate::model::{
    normalize_text, Category, CategoryId, Direction, Item, ItemId, ItemPatch, NewItem, Scope,
    TodayWindow, Universe, UniverseId,
};
use crate::storage::Storage;

pub const STORE_SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    STORE_SCHEMA_VERSION
}

/// Last id handed out per entity. Ids are never reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdCounters {
    #[serde(default)]
    pub universe: i64,
    #[serde(default)]
    pub category: i64,
    #[serde(default)]
    pub item: i64,
}

fn bump(counter: &mut i64, floor: Option<i64>) -> i64 {
    *counter = (*counter).max(floor.unwrap_or(0)) + 1;
    *counter
}

/// Everything persisted in `store.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_ids: IdCounters,
    #[serde(default)]
    pub universes: Vec<Universe>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            schema_version: STORE_SCHEMA_VERSION,
            updated_at: None,
            last_ids: IdCounters::default(),
            universes: Vec::new(),
            categories: Vec::new(),
            items: Vec::new(),
        }
    }
}

impl StoreSnapshot {
    fn next_universe_id(&mut self) -> UniverseId {
        let floor = self.universes.iter().map(|u| u.id.get()).max();
        UniverseId(bump(&mut self.last_ids.universe, floor))
    }

    fn next_category_id(&mut self) -> CategoryId {
        let floor = self.categories.iter().map(|c| c.id.get()).max();
        CategoryId(bump(&mut self.last_ids.category, floor))
    }

    fn next_item_id(&mut self) -> ItemId {
        let floor = self.items.iter().map(|i| i.id.get()).max();
        ItemId(bump(&mut self.last_ids.item, floor))
    }

    pub fn universe(&self, id: UniverseId) -> Result<&Universe> {
        self.universes
            .iter()
            .find(|universe| universe.id == id)
            .ok_or(Error::UniverseNotFound(id.get()))
    }

    pub fn category(&self, id: CategoryId) -> Result<&Category> {
        self.categories
            .iter()
            .find(|category| category.id == id)
            .ok_or(Error::CategoryNotFound(id.get()))
    }

    pub fn item(&self, id: ItemId) -> Result<&Item> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .ok_or(Error::ItemNotFound(id.get()))
    }

    fn item_mut(&mut self, id: ItemId) -> Result<&mut Item> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(Error::ItemNotFound(id.get()))
    }

    /// Referential integrity plus the due-date/today-position invariant.
    pub fn validate(&self) -> Result<()> {
        for category in &self.categories {
            if self.universe(category.universe_id).is_err() {
                return Err(Error::OperationFailed(format!(
                    "category {} references missing universe {}",
                    category.id, category.universe_id
                )));
            }
        }
        for item in &self.items {
            if self.category(item.category_id).is_err() {
                return Err(Error::OperationFailed(format!(
                    "item {} references missing category {}",
                    item.id, item.category_id
                )));
            }
            if item.due_date.is_none() && item.today_position.is_positioned() {
                return Err(Error::OperationFailed(format!(
                    "item {} has a today position but no due date",
                    item.id
                )));
            }
        }
        Ok(())
    }
}

/// Which items `list_items` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemFilter {
    #[default]
    All,
    Category(CategoryId),
    DueOn(NaiveDate),
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySection {
    pub category: Category,
    /// Active items in category order
    pub items: Vec<Item>,
    pub completed: Vec<Item>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UniverseSection {
    pub universe: Universe,
    pub categories: Vec<CategorySection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub universes: Vec<UniverseSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TodayEntry {
    pub item: Item,
    pub category: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TodayView {
    pub window: TodayWindow,
    /// Active dated items in today order
    pub items: Vec<TodayEntry>,
    pub completed: Vec<TodayEntry>,
}

fn by_position(left: &Item, right: &Item) -> std::cmp::Ordering {
    left.position
        .cmp(&right.position)
        .then_with(|| left.id.cmp(&right.id))
}

/// Handle on one store root
#[derive(Debug, Clone)]
pub struct TodoStore {
    storage: Storage,
    lock_timeout_ms: u64,
}

impl TodoStore {
    pub fn open(storage: Storage, config: &Config) -> Self {
        Self {
            storage,
            lock_timeout_ms: config.store.lock_timeout_ms,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Create the root and an empty snapshot. Returns `false` when the store
    /// already existed.
    pub fn init(&self) -> Result<bool> {
        self.storage.init()?;
        let _lock = FileLock::acquire(self.storage.lock_file(), self.lock_timeout_ms)?;
        if self.storage.is_initialized() {
            return Ok(false);
        }
        self.storage
            .write_json(&self.storage.store_file(), &StoreSnapshot::default())?;
        info!(root = %self.storage.root().display(), "store initialized");
        Ok(true)
    }

    fn load(&self) -> Result<StoreSnapshot> {
        let path = self.storage.store_file();
        if !path.exists() {
            return Ok(StoreSnapshot::default());
        }
        let snapshot: StoreSnapshot = self.storage.read_json(&path)?;
        if snapshot.schema_version > STORE_SCHEMA_VERSION {
            return Err(Error::OperationFailed(format!(
                "store schema version {} is newer than supported version {}",
                snapshot.schema_version, STORE_SCHEMA_VERSION
            )));
        }
        Ok(snapshot)
    }

    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&StoreSnapshot) -> Result<T>,
    {
        if !self.storage.is_initialized() {
            return f(&StoreSnapshot::default());
        }
        let _lock = FileLock::acquire(self.storage.lock_file(), self.lock_timeout_ms)?;
        let snapshot = self.load()?;
        f(&snapshot)
    }

    fn transaction<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&mut StoreSnapshot) -> Result<T>,
    {
        self.storage.init()?;
        let _lock = FileLock::acquire(self.storage.lock_file(), self.lock_timeout_ms)?;

        let mut snapshot = self.load()?;
        let result = f(&mut snapshot)?;
        snapshot.validate()?;
        snapshot.updated_at = Some(Utc::now());

        self.storage
            .write_json(&self.storage.store_file(), &snapshot)?;
        debug!(operation, items = snapshot.items.len(), "store updated");
        Ok(result)
    }

    // =========================================================================
    // Universes
    // =========================================================================

    pub fn create_universe(&self, name: &str) -> Result<Universe> {
        let name = normalize_text("universe name", name)?;
        self.transaction("create_universe", |snapshot| {
            let position = ledger::next_universe_position(&snapshot.universes)?;
            let universe = Universe {
                id: snapshot.next_universe_id(),
                name,
                position,
                created_at: Utc::now(),
            };
            snapshot.universes.push(universe.clone());
            Ok(universe)
        })
    }

    pub fn list_universes(&self) -> Result<Vec<Universe>> {
        self.read(|snapshot| {
            let mut universes = snapshot.universes.clone();
            universes.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
            Ok(universes)
        })
    }

    /// Refused while any category still belongs to the universe.
    pub fn delete_universe(&self, id: UniverseId) -> Result<Universe> {
        self.transaction("delete_universe", |snapshot| {
            snapshot.universe(id)?;
            let count = snapshot
                .categories
                .iter()
                .filter(|category| category.universe_id == id)
                .count();
            if count > 0 {
                return Err(Error::NonEmptyDependent {
                    kind: "universe",
                    id: id.get(),
                    count,
                    dependents: "categories",
                });
            }
            let idx = snapshot
                .universes
                .iter()
                .position(|universe| universe.id == id)
                .ok_or(Error::UniverseNotFound(id.get()))?;
            let removed = snapshot.universes.remove(idx);
            info!(universe_id = %id, "universe deleted");
            Ok(removed)
        })
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub fn create_category(&self, universe_id: UniverseId, name: &str) -> Result<Category> {
        let name = normalize_text("category name", name)?;
        self.transaction("create_category", |snapshot| {
            snapshot.universe(universe_id)?;
            let position = ledger::next_category_position(&snapshot.categories, universe_id)?;
            let category = Category {
                id: snapshot.next_category_id(),
                universe_id,
                name,
                position,
                created_at: Utc::now(),
            };
            snapshot.categories.push(category.clone());
            Ok(category)
        })
    }

    /// Categories ordered by universe, then by position within it.
    pub fn list_categories(&self, universe: Option<UniverseId>) -> Result<Vec<Category>> {
        self.read(|snapshot| {
            if let Some(universe_id) = universe {
                snapshot.universe(universe_id)?;
            }
            let universe_rank: HashMap<UniverseId, (i64, UniverseId)> = snapshot
                .universes
                .iter()
                .map(|u| (u.id, (u.position, u.id)))
                .collect();

            let mut categories: Vec<Category> = snapshot
                .categories
                .iter()
                .filter(|category| universe.map_or(true, |id| category.universe_id == id))
                .cloned()
                .collect();
            categories.sort_by(|a, b| {
                universe_rank
                    .get(&a.universe_id)
                    .cmp(&universe_rank.get(&b.universe_id))
                    .then_with(|| a.position.cmp(&b.position))
                    .then_with(|| a.id.cmp(&b.id))
            });
            Ok(categories)
        })
    }

    /// Refused while any item, completed or not, is filed under the category.
    pub fn delete_category(&self, id: CategoryId) -> Result<Category> {
        self.transaction("delete_category", |snapshot| {
            snapshot.category(id)?;
            let count = ScopeResolver::new(&snapshot.items).items_in_category(id);
            if count > 0 {
                return Err(Error::NonEmptyDependent {
                    kind: "category",
                    id: id.get(),
                    count,
                    dependents: "items",
                });
            }
            let idx = snapshot
                .categories
                .iter()
                .position(|category| category.id == id)
                .ok_or(Error::CategoryNotFound(id.get()))?;
            let removed = snapshot.categories.remove(idx);
            info!(category_id = %id, "category deleted");
            Ok(removed)
        })
    }

    // =========================================================================
    // Items
    // =========================================================================

    pub fn create_item(&self, new_item: NewItem) -> Result<Item> {
        let content = normalize_text("item content", &new_item.content)?;
        self.transaction("create_item", |snapshot| {
            snapshot.category(new_item.category_id)?;
            let id = snapshot.next_item_id();
            PositionLedger::new(&mut snapshot.items)
                .insert(
                    id,
                    new_item.category_id,
                    content,
                    new_item.due_date,
                    Utc::now(),
                )
                .cloned()
        })
    }

    pub fn get_item(&self, id: ItemId) -> Result<Item> {
        self.read(|snapshot| snapshot.item(id).cloned())
    }

    /// Apply the fields present in `patch`.
    ///
    /// Plain fields are written first, then the category move, the due-date
    /// trigger and finally any explicit position values, so an explicit
    /// `position` or `today_position` wins over an allocated one.
    pub fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item> {
        if patch.is_empty() {
            return Err(Error::NoFieldsProvided);
        }
        let content = patch
            .content
            .as_deref()
            .map(|raw| normalize_text("item content", raw))
            .transpose()?;

        self.transaction("update_item", |snapshot| {
            if let Some(category_id) = patch.category_id {
                snapshot.category(category_id)?;
            }

            let item = snapshot.item_mut(id)?;
            if let Some(content) = content {
                item.content = content;
            }
            if let Some(is_completed) = patch.is_completed {
                item.is_completed = is_completed;
            }

            let mut ledger = PositionLedger::new(&mut snapshot.items);
            if let Some(category_id) = patch.category_id {
                ledger.place_in_category(id, category_id)?;
            }
            if let Some(due_date) = patch.due_date {
                ledger.apply_due_date(id, due_date)?;
            }
            if let Some(position) = patch.position {
                ledger.set_position(id, position)?;
            }
            if let Some(today_position) = patch.today_position {
                ledger.set_today_position(id, today_position)?;
            }

            snapshot.item(id).cloned()
        })
    }

    /// Move an item one step within an explicitly chosen ordering.
    pub fn reorder_item(
        &self,
        id: ItemId,
        direction: Direction,
        scope: Scope,
    ) -> Result<ReorderOutcome> {
        self.transaction("reorder_item", |snapshot| {
            snapshot.item(id)?;
            if let Scope::Category { category_id } = scope {
                snapshot.category(category_id)?;
            }
            PositionLedger::new(&mut snapshot.items).reorder(id, direction, scope)
        })
    }

    /// Move an item one step within its own category, resolved under the lock.
    pub fn reorder_within_category(&self, id: ItemId, direction: Direction) -> Result<ReorderOutcome> {
        self.transaction("reorder_item", |snapshot| {
            let scope = Scope::category(snapshot.item(id)?.category_id);
            PositionLedger::new(&mut snapshot.items).reorder(id, direction, scope)
        })
    }

    pub fn delete_item(&self, id: ItemId) -> Result<Item> {
        self.transaction("delete_item", |snapshot| {
            let idx = snapshot
                .items
                .iter()
                .position(|item| item.id == id)
                .ok_or(Error::ItemNotFound(id.get()))?;
            let removed = snapshot.items.remove(idx);
            info!(item_id = %id, "item deleted");
            Ok(removed)
        })
    }

    /// Remove every completed item and return how many were removed.
    pub fn delete_completed_items(&self) -> Result<usize> {
        self.transaction("delete_completed_items", |snapshot| {
            let before = snapshot.items.len();
            snapshot.items.retain(|item| item.is_active());
            let removed = before - snapshot.items.len();
            info!(removed, "completed items deleted");
            Ok(removed)
        })
    }

    /// Items matching `filter`, active before completed, then by position.
    pub fn list_items(&self, filter: ItemFilter) -> Result<Vec<Item>> {
        self.read(|snapshot| {
            if let ItemFilter::Category(category_id) = filter {
                snapshot.category(category_id)?;
            }
            let mut items: Vec<Item> = snapshot
                .items
                .iter()
                .filter(|item| match filter {
                    ItemFilter::All => true,
                    ItemFilter::Category(category_id) => item.category_id == category_id,
                    ItemFilter::DueOn(date) => item.due_date == Some(date),
                })
                .cloned()
                .collect();
            items.sort_by(|a, b| {
                a.is_completed
                    .cmp(&b.is_completed)
                    .then_with(|| by_position(a, b))
            });
            Ok(items)
        })
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Universes and their categories in display order, each category with
    /// its active items in category order followed by its completed items.
    pub fn overview(&self, universe: Option<UniverseId>) -> Result<Overview> {
        self.read(|snapshot| {
            if let Some(universe_id) = universe {
                snapshot.universe(universe_id)?;
            }
            let mut universes = snapshot.universes.clone();
            universes.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
            let resolver = ScopeResolver::new(&snapshot.items);

            let sections = universes
                .into_iter()
                .filter(|u| universe.map_or(true, |id| u.id == id))
                .map(|u| {
                    let mut categories: Vec<&Category> = snapshot
                        .categories
                        .iter()
                        .filter(|category| category.universe_id == u.id)
                        .collect();
                    categories.sort_by(|a, b| {
                        a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id))
                    });

                    let categories = categories
                        .into_iter()
                        .map(|category| {
                            let items = resolver
                                .ordered_members(Scope::category(category.id))
                                .into_iter()
                                .cloned()
                                .collect();
                            let mut completed: Vec<Item> = snapshot
                                .items
                                .iter()
                                .filter(|item| item.category_id == category.id && !item.is_active())
                                .cloned()
                                .collect();
                            completed.sort_by(by_position);
                            CategorySection {
                                category: category.clone(),
                                items,
                                completed,
                            }
                        })
                        .collect();

                    UniverseSection {
                        universe: u,
                        categories,
                    }
                })
                .collect();

            Ok(Overview {
                universes: sections,
            })
        })
    }

    /// Active dated items inside `window` in today order, plus the completed
    /// items due inside the same window.
    pub fn today(&self, window: TodayWindow) -> Result<TodayView> {
        self.read(|snapshot| {
            let names: HashMap<CategoryId, &str> = snapshot
                .categories
                .iter()
                .map(|category| (category.id, category.name.as_str()))
                .collect();
            let entry = |item: &Item| TodayEntry {
                item: item.clone(),
                category: names
                    .get(&item.category_id)
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
            };

            let items = ScopeResolver::new(&snapshot.items)
                .ordered_members(Scope::today(window))
                .into_iter()
                .map(&entry)
                .collect();

            let mut completed: Vec<&Item> = snapshot
                .items
                .iter()
                .filter(|item| {
                    !item.is_active() && item.due_date.is_some_and(|due| window.contains(due))
                })
                .collect();
            completed.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));

            Ok(TodayView {
                window,
                items,
                completed: completed.into_iter().map(&entry).collect(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TodayPosition;
    use std::fs;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::TempDir;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn open(temp: &TempDir) -> TodoStore {
        TodoStore::open(Storage::new(temp.path().join("root")), &Config::default())
    }

    fn seed_category(store: &TodoStore) -> CategoryId {
        let universe = store.create_universe("Life").unwrap();
        store.create_category(universe.id, "Home").unwrap().id
    }

    fn add(store: &TodoStore, category_id: CategoryId, content: &str, due: Option<&str>) -> Item {
        store
            .create_item(NewItem {
                content: content.to_string(),
                category_id,
                due_date: due.map(date),
            })
            .unwrap()
    }

    fn category_order(store: &TodoStore, category_id: CategoryId) -> Vec<String> {
        store
            .list_items(ItemFilter::Category(category_id))
            .unwrap()
            .into_iter()
            .filter(|item| item.is_active())
            .map(|item| item.content)
            .collect()
    }

    #[test]
    fn init_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        assert!(store.init().unwrap());
        assert!(!store.init().unwrap());
        assert!(store.list_universes().unwrap().is_empty());
    }

    #[test]
    fn reads_on_missing_store_are_empty() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        assert!(store.list_items(ItemFilter::All).unwrap().is_empty());
        assert!(!store.storage().is_initialized());
    }

    #[test]
    fn created_items_append_to_category() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);

        let a = add(&store, home, "A", None);
        let b = add(&store, home, "B", None);
        assert_eq!(a.position, 0);
        assert_eq!(b.position, 1);
        assert_eq!(a.today_position, TodayPosition::Unpositioned);
    }

    #[test]
    fn reorder_persists_swap() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);
        add(&store, home, "A", None);
        let b = add(&store, home, "B", None);
        add(&store, home, "C", None);

        store
            .reorder_item(b.id, Direction::Up, Scope::category(home))
            .unwrap();

        let reopened = open(&temp);
        assert_eq!(category_order(&reopened, home), vec!["B", "A", "C"]);
    }

    #[test]
    fn reopened_item_tied_with_newer_item_can_be_passed() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);
        let a = add(&store, home, "A", None);
        let set_done = |done: bool| ItemPatch {
            is_completed: Some(done),
            ..ItemPatch::default()
        };
        store.update_item(a.id, set_done(true)).unwrap();
        let b = add(&store, home, "B", None);
        store.update_item(a.id, set_done(false)).unwrap();
        assert_eq!(b.position, a.position);
        assert_eq!(category_order(&store, home), vec!["A", "B"]);

        let outcome = store
            .reorder_item(b.id, Direction::Up, Scope::category(home))
            .unwrap();
        assert_ne!(outcome.moved.to, outcome.moved.from);

        let reopened = open(&temp);
        assert_eq!(category_order(&reopened, home), vec!["B", "A"]);
    }

    #[test]
    fn failed_reorder_leaves_store_untouched() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);
        let a = add(&store, home, "A", None);
        add(&store, home, "B", None);

        let before = fs::read(store.storage().store_file()).unwrap();
        let err = store
            .reorder_within_category(a.id, Direction::Up)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMove { .. }));
        assert_eq!(fs::read(store.storage().store_file()).unwrap(), before);
    }

    #[test]
    fn setting_due_date_joins_today_ordering() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);
        let first = add(&store, home, "first", Some("2024-01-01"));
        assert_eq!(first.today_position, TodayPosition::Positioned(0));
        let x = add(&store, home, "X", None);

        let updated = store
            .update_item(
                x.id,
                ItemPatch {
                    due_date: Some(Some(date("2024-01-01"))),
                    ..ItemPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.today_position, TodayPosition::Positioned(1));

        let cleared = store
            .update_item(
                first.id,
                ItemPatch {
                    due_date: Some(None),
                    ..ItemPatch::default()
                },
            )
            .unwrap();
        assert_eq!(cleared.today_position, TodayPosition::Unpositioned);
        assert_eq!(cleared.due_date, None);
    }

    #[test]
    fn explicit_positions_override_allocation() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);
        let item = add(&store, home, "A", None);

        let updated = store
            .update_item(
                item.id,
                ItemPatch {
                    due_date: Some(Some(date("2024-02-02"))),
                    today_position: Some(TodayPosition::Positioned(40)),
                    position: Some(9),
                    ..ItemPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.today_position, TodayPosition::Positioned(40));
        assert_eq!(updated.position, 9);
    }

    #[test]
    fn empty_update_is_rejected() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);
        let item = add(&store, home, "A", None);

        let err = store.update_item(item.id, ItemPatch::default()).unwrap_err();
        assert!(matches!(err, Error::NoFieldsProvided));

        let err = store
            .update_item(
                ItemId(999),
                ItemPatch {
                    content: Some("x".into()),
                    ..ItemPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::ItemNotFound(999)));
    }

    #[test]
    fn completing_keeps_positions_and_leaves_scope() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);
        let a = add(&store, home, "A", Some("2024-01-01"));
        add(&store, home, "B", None);

        let done = store
            .update_item(
                a.id,
                ItemPatch {
                    is_completed: Some(true),
                    ..ItemPatch::default()
                },
            )
            .unwrap();
        assert_eq!(done.position, a.position);
        assert_eq!(done.today_position, a.today_position);
        assert_eq!(category_order(&store, home), vec!["B"]);

        let err = store
            .reorder_item(a.id, Direction::Down, Scope::category(home))
            .unwrap_err();
        assert!(matches!(err, Error::NotInScope { .. }));
    }

    #[test]
    fn category_change_appends_to_destination() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);
        let universe = store.list_universes().unwrap()[0].id;
        let work = store.create_category(universe, "Work").unwrap().id;
        add(&store, work, "W1", None);
        add(&store, work, "W2", None);
        let moved = add(&store, home, "H", None);

        let updated = store
            .update_item(
                moved.id,
                ItemPatch {
                    category_id: Some(work),
                    ..ItemPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.category_id, work);
        assert_eq!(updated.position, 2);
        assert_eq!(category_order(&store, work), vec!["W1", "W2", "H"]);

        let err = store
            .update_item(
                moved.id,
                ItemPatch {
                    category_id: Some(CategoryId(404)),
                    ..ItemPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::CategoryNotFound(404)));
    }

    #[test]
    fn delete_guards_count_dependents() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);
        let universe = store.list_universes().unwrap()[0].id;
        let item = add(&store, home, "A", None);
        store
            .update_item(
                item.id,
                ItemPatch {
                    is_completed: Some(true),
                    ..ItemPatch::default()
                },
            )
            .unwrap();

        let err = store.delete_category(home).unwrap_err();
        assert!(matches!(
            err,
            Error::NonEmptyDependent { kind: "category", count: 1, .. }
        ));
        assert_eq!(store.list_categories(None).unwrap().len(), 1);

        let err = store.delete_universe(universe).unwrap_err();
        assert!(matches!(
            err,
            Error::NonEmptyDependent { kind: "universe", count: 1, .. }
        ));

        assert_eq!(store.delete_completed_items().unwrap(), 1);
        store.delete_category(home).unwrap();
        store.delete_universe(universe).unwrap();
        assert!(store.list_universes().unwrap().is_empty());

        let err = store.delete_category(home).unwrap_err();
        assert!(matches!(err, Error::CategoryNotFound(_)));
    }

    #[test]
    fn ids_are_not_reused() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);
        let first = add(&store, home, "A", None);
        store.delete_item(first.id).unwrap();
        let second = add(&store, home, "B", None);
        assert!(second.id > first.id);
        assert_eq!(second.position, 0);
    }

    #[test]
    fn category_and_universe_positions_append() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let life = store.create_universe("Life").unwrap();
        let job = store.create_universe("Job").unwrap();
        assert_eq!((life.position, job.position), (0, 1));

        let a = store.create_category(life.id, "A").unwrap();
        let b = store.create_category(life.id, "B").unwrap();
        let c = store.create_category(job.id, "C").unwrap();
        assert_eq!((a.position, b.position, c.position), (0, 1, 0));

        let err = store.create_category(UniverseId(77), "X").unwrap_err();
        assert!(matches!(err, Error::UniverseNotFound(77)));
        let err = store.create_universe("   ").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let names: Vec<String> = store
            .list_categories(None)
            .unwrap()
            .into_iter()
            .map(|category| category.name)
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn overview_groups_active_then_completed() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);
        let a = add(&store, home, "A", None);
        add(&store, home, "B", None);
        store
            .update_item(
                a.id,
                ItemPatch {
                    is_completed: Some(true),
                    ..ItemPatch::default()
                },
            )
            .unwrap();

        let overview = store.overview(None).unwrap();
        assert_eq!(overview.universes.len(), 1);
        let section = &overview.universes[0].categories[0];
        assert_eq!(section.category.id, home);
        assert_eq!(section.items.len(), 1);
        assert_eq!(section.items[0].content, "B");
        assert_eq!(section.completed[0].content, "A");

        let err = store.overview(Some(UniverseId(42))).unwrap_err();
        assert!(matches!(err, Error::UniverseNotFound(42)));
    }

    #[test]
    fn today_view_respects_window_and_order() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);
        let early = add(&store, home, "early", Some("2024-01-01"));
        let late = add(&store, home, "late", Some("2024-01-05"));
        add(&store, home, "undated", None);

        store
            .reorder_item(late.id, Direction::Up, Scope::today(TodayWindow::All))
            .unwrap();

        let all = store.today(TodayWindow::All).unwrap();
        let order: Vec<&str> = all.items.iter().map(|e| e.item.content.as_str()).collect();
        assert_eq!(order, vec!["late", "early"]);
        assert_eq!(all.items[0].category, "Home");

        let through = store
            .today(TodayWindow::OnOrBefore(date("2024-01-02")))
            .unwrap();
        assert_eq!(through.items.len(), 1);
        assert_eq!(through.items[0].item.id, early.id);

        let err = store
            .reorder_item(early.id, Direction::Up, Scope::today(TodayWindow::OnOrBefore(date("2024-01-02"))))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMove { boundary: "top", .. }));
    }

    #[test]
    fn list_items_by_due_date() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);
        add(&store, home, "A", Some("2024-03-01"));
        add(&store, home, "B", Some("2024-03-02"));

        let items = store.list_items(ItemFilter::DueOn(date("2024-03-01"))).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, "A");

        let err = store.list_items(ItemFilter::Category(CategoryId(8))).unwrap_err();
        assert!(matches!(err, Error::CategoryNotFound(8)));
    }

    #[test]
    fn concurrent_creates_get_distinct_positions() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let home = seed_category(&store);

        let threads = 6;
        let barrier = Arc::new(Barrier::new(threads));
        let root = store.storage().root().to_path_buf();
        let mut handles = Vec::with_capacity(threads);
        for idx in 0..threads {
            let barrier = Arc::clone(&barrier);
            let root = root.clone();
            handles.push(thread::spawn(move || {
                let store = TodoStore::open(Storage::new(root), &Config::default());
                barrier.wait();
                store
                    .create_item(NewItem {
                        content: format!("item {idx}"),
                        category_id: home,
                        due_date: None,
                    })
                    .unwrap()
                    .position
            }));
        }

        let mut positions: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        positions.sort();
        assert_eq!(positions, (0..threads as i64).collect::<Vec<_>>());
    }
}
