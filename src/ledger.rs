//! Position ledger
//!
//! Two manual orderings live on every item:
//!
//! - `position`: order inside the item's category, over active items only
//! - `today_position`: order across categories, over active items that have a
//!   due date
//!
//! [`ScopeResolver`] answers read-only questions (who is in a scope, in which
//! order, what the next free slot is). [`PositionLedger`] is the only writer of
//! the two ordering keys; the store never assigns them directly.
//!
//! Positions are never renumbered. New members take `max + 1` of the active
//! members of their scope, a reorder swaps the keys of two neighbours (or
//! steps one past the other when they tie), and holes left by deleted or
//! completed items are simply skipped.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{
    Category, CategoryId, Direction, Item, ItemId, Scope, TodayPosition, Universe, UniverseId,
};

/// Position handed out when a scope has no active members.
pub const FIRST_POSITION: i64 = 0;

fn next_after(values: impl Iterator<Item = i64>) -> Result<i64> {
    match values.max() {
        None => Ok(FIRST_POSITION),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| Error::OperationFailed("position space exhausted".to_string())),
    }
}

/// Next display slot for a new universe.
pub fn next_universe_position(universes: &[Universe]) -> Result<i64> {
    next_after(universes.iter().map(|universe| universe.position))
}

/// Next display slot for a new category inside `universe_id`.
pub fn next_category_position(categories: &[Category], universe_id: UniverseId) -> Result<i64> {
    next_after(
        categories
            .iter()
            .filter(|category| category.universe_id == universe_id)
            .map(|category| category.position),
    )
}

/// Read-only view over the item collection.
#[derive(Debug, Clone, Copy)]
pub struct ScopeResolver<'a> {
    items: &'a [Item],
}

impl<'a> ScopeResolver<'a> {
    pub fn new(items: &'a [Item]) -> Self {
        Self { items }
    }

    /// Active members of `scope` in display order.
    ///
    /// Category scope sorts by `(position, id)`. Today scope sorts by
    /// `(today_position, id)` with unpositioned items last, restricted to the
    /// scope's date window.
    pub fn ordered_members(&self, scope: Scope) -> Vec<&'a Item> {
        match scope {
            Scope::Category { category_id } => {
                let mut members: Vec<&Item> = self
                    .items
                    .iter()
                    .filter(|item| item.is_active() && item.category_id == category_id)
                    .collect();
                members.sort_by(|left, right| {
                    left.position
                        .cmp(&right.position)
                        .then_with(|| left.id.cmp(&right.id))
                });
                members
            }
            Scope::Today { window } => {
                let mut members: Vec<&Item> = self
                    .items
                    .iter()
                    .filter(|item| {
                        item.is_active() && item.due_date.is_some_and(|due| window.contains(due))
                    })
                    .collect();
                members.sort_by(|left, right| {
                    left.today_position
                        .cmp(&right.today_position)
                        .then_with(|| left.id.cmp(&right.id))
                });
                members
            }
        }
    }

    /// One past the highest key among the scope's active members.
    ///
    /// For the today ordering the window is ignored: allocation always looks
    /// at every active dated item so a fresh slot never collides with an item
    /// that happens to be outside the current view.
    pub fn next_position(&self, scope: Scope) -> Result<i64> {
        match scope {
            Scope::Category { category_id } => self.next_category_position(category_id),
            Scope::Today { .. } => self.next_today_position(),
        }
    }

    pub fn next_category_position(&self, category_id: CategoryId) -> Result<i64> {
        next_after(
            self.items
                .iter()
                .filter(|item| item.is_active() && item.category_id == category_id)
                .map(|item| item.position),
        )
    }

    pub fn next_today_position(&self) -> Result<i64> {
        next_after(
            self.items
                .iter()
                .filter(|item| item.in_today_scope())
                .filter_map(|item| item.today_position.value()),
        )
    }

    /// Number of items (completed or not) filed under a category.
    pub fn items_in_category(&self, category_id: CategoryId) -> usize {
        self.items
            .iter()
            .filter(|item| item.category_id == category_id)
            .count()
    }
}

/// Old and new ordering key of one side of a swap.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct KeyChange {
    pub item_id: ItemId,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// Result of a successful reorder.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReorderOutcome {
    pub scope: Scope,
    pub direction: Direction,
    pub moved: KeyChange,
    pub displaced: KeyChange,
}

/// Exclusive writer of `position` and `today_position`.
pub struct PositionLedger<'a> {
    items: &'a mut Vec<Item>,
}

impl<'a> PositionLedger<'a> {
    pub fn new(items: &'a mut Vec<Item>) -> Self {
        Self { items }
    }

    pub fn resolver(&self) -> ScopeResolver<'_> {
        ScopeResolver::new(self.items.as_slice())
    }

    fn index_of(&self, item_id: ItemId) -> Result<usize> {
        self.items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or(Error::ItemNotFound(item_id.get()))
    }

    /// Insert a new item at the end of its category and, when it already has
    /// a due date, at the end of the today ordering.
    pub fn insert(
        &mut self,
        id: ItemId,
        category_id: CategoryId,
        content: String,
        due_date: Option<NaiveDate>,
        created_at: DateTime<Utc>,
    ) -> Result<&Item> {
        let resolver = self.resolver();
        let position = resolver.next_category_position(category_id)?;
        let today_position = match due_date {
            Some(_) => TodayPosition::Positioned(resolver.next_today_position()?),
            None => TodayPosition::Unpositioned,
        };

        self.items.push(Item {
            id,
            category_id,
            content,
            is_completed: false,
            due_date,
            position,
            today_position,
            created_at,
        });
        let last = self.items.len() - 1;
        Ok(&self.items[last])
    }

    fn member_ids(&self, scope: Scope) -> Vec<ItemId> {
        self.resolver()
            .ordered_members(scope)
            .into_iter()
            .map(|item| item.id)
            .collect()
    }

    /// The ordering key `scope` reads; `None` is an unpositioned today item.
    fn key(&self, idx: usize, scope: Scope) -> Option<i64> {
        match scope {
            Scope::Category { .. } => Some(self.items[idx].position),
            Scope::Today { .. } => self.items[idx].today_position.value(),
        }
    }

    fn write_key(&mut self, idx: usize, scope: Scope, key: Option<i64>) {
        let item = &mut self.items[idx];
        match (scope, key) {
            (Scope::Category { .. }, Some(key)) => item.position = key,
            (Scope::Category { .. }, None) => {}
            (Scope::Today { .. }, key) => item.today_position = key.into(),
        }
    }

    /// Key one step before (`step < 0`) or after `key`. An unpositioned today
    /// key can only be stepped before, onto the next free today slot.
    fn step_past(&self, key: Option<i64>, step: i64, scope: Scope) -> Result<Option<i64>> {
        match key {
            Some(key) => Ok(key.checked_add(step)),
            None if step < 0 => self.resolver().next_position(scope).map(Some),
            None => Ok(None),
        }
    }

    /// `(moved, neighbour)` key pairs to try, preferred first: a plain swap,
    /// then the moved item stepping past the neighbour, then the neighbour
    /// stepping back past the moved item.
    fn candidate_keys(
        &self,
        item_key: Option<i64>,
        neighbour_key: Option<i64>,
        direction: Direction,
        scope: Scope,
    ) -> Result<Vec<(Option<i64>, Option<i64>)>> {
        let step = match direction {
            Direction::Up => -1,
            Direction::Down => 1,
        };
        let mut candidates = Vec::new();
        if item_key != neighbour_key {
            candidates.push((neighbour_key, item_key));
        }
        if let Some(key) = self.step_past(neighbour_key, step, scope)? {
            candidates.push((Some(key), neighbour_key));
        }
        if let Some(key) = self.step_past(item_key, -step, scope)? {
            candidates.push((item_key, Some(key)));
        }
        Ok(candidates)
    }

    /// Move `item_id` one step past its neighbour in `scope`.
    ///
    /// Only the two records' keys change. Distinct keys are swapped; tied keys
    /// (an un-completed item back in a slot allocated meanwhile, two
    /// unpositioned today items) are split by stepping one key past the other.
    /// Moving the first member up or the last member down is an
    /// `InvalidMove`, a tie with no free value around it is `NoRoomToMove`,
    /// and in both cases the ordering is untouched.
    pub fn reorder(
        &mut self,
        item_id: ItemId,
        direction: Direction,
        scope: Scope,
    ) -> Result<ReorderOutcome> {
        self.index_of(item_id)?;

        let members = self.member_ids(scope);
        let index = members
            .iter()
            .position(|id| *id == item_id)
            .ok_or_else(|| Error::NotInScope {
                item: item_id.get(),
                scope: scope.to_string(),
            })?;

        let neighbour_index = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < members.len() => index + 1,
            _ => {
                return Err(Error::InvalidMove {
                    item: item_id.get(),
                    direction,
                    boundary: match direction {
                        Direction::Up => "top",
                        Direction::Down => "bottom",
                    },
                    scope,
                })
            }
        };
        let neighbour_id = members[neighbour_index];
        let mut expected = members;
        expected.swap(index, neighbour_index);

        let item_idx = self.index_of(item_id)?;
        let neighbour_idx = self.index_of(neighbour_id)?;
        let item_key = self.key(item_idx, scope);
        let neighbour_key = self.key(neighbour_idx, scope);

        for (item_to, neighbour_to) in
            self.candidate_keys(item_key, neighbour_key, direction, scope)?
        {
            self.write_key(item_idx, scope, item_to);
            self.write_key(neighbour_idx, scope, neighbour_to);
            if self.member_ids(scope) == expected {
                return Ok(ReorderOutcome {
                    scope,
                    direction,
                    moved: KeyChange {
                        item_id,
                        from: item_key,
                        to: item_to,
                    },
                    displaced: KeyChange {
                        item_id: neighbour_id,
                        from: neighbour_key,
                        to: neighbour_to,
                    },
                });
            }
        }

        self.write_key(item_idx, scope, item_key);
        self.write_key(neighbour_idx, scope, neighbour_key);
        Err(Error::NoRoomToMove {
            item: item_id.get(),
            neighbour: neighbour_id.get(),
            direction,
            scope,
        })
    }

    /// Write a due date and keep `today_position` consistent with it.
    ///
    /// - clearing the date always clears `today_position`
    /// - setting a date on an item without a today slot appends it to the
    ///   today ordering
    /// - changing one date to another keeps the existing slot
    pub fn apply_due_date(&mut self, item_id: ItemId, due_date: Option<NaiveDate>) -> Result<()> {
        let idx = self.index_of(item_id)?;
        match due_date {
            None => {
                self.items[idx].today_position = TodayPosition::Unpositioned;
            }
            Some(_) => {
                if !self.items[idx].today_position.is_positioned() {
                    let next = self.resolver().next_today_position()?;
                    self.items[idx].today_position = TodayPosition::Positioned(next);
                }
            }
        }
        self.items[idx].due_date = due_date;
        Ok(())
    }

    /// Refile an item under another category, appending it to that category.
    pub fn place_in_category(&mut self, item_id: ItemId, category_id: CategoryId) -> Result<()> {
        let idx = self.index_of(item_id)?;
        if self.items[idx].category_id == category_id {
            return Ok(());
        }
        let next = self.resolver().next_category_position(category_id)?;
        self.items[idx].category_id = category_id;
        self.items[idx].position = next;
        Ok(())
    }

    /// Explicit caller-supplied category position.
    pub fn set_position(&mut self, item_id: ItemId, position: i64) -> Result<()> {
        let idx = self.index_of(item_id)?;
        self.items[idx].position = position;
        Ok(())
    }

    /// Explicit caller-supplied today position.
    ///
    /// An undated item can only hold `Unpositioned`.
    pub fn set_today_position(&mut self, item_id: ItemId, today_position: TodayPosition) -> Result<()> {
        let idx = self.index_of(item_id)?;
        if self.items[idx].due_date.is_none() && today_position.is_positioned() {
            return Err(Error::InvalidArgument(format!(
                "item {item_id} has no due date; today_position must be null"
            )));
        }
        self.items[idx].today_position = today_position;
        Ok(())
    }
}
