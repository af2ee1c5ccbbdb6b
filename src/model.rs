//! Core records and the small value types that describe orderings.
//!
//! Universes own categories, categories own items. Items carry two
//! independent ordering keys: `position` within their category and
//! `today_position` across every dated item.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

macro_rules! entity_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let trimmed = s.trim();
                trimmed.parse::<i64>().map($name).map_err(|_| {
                    Error::InvalidArgument(format!("invalid {} id '{}'", $label, trimmed))
                })
            }
        }
    };
}

entity_id!(UniverseId, "universe");
entity_id!(CategoryId, "category");
entity_id!(ItemId, "item");

/// Secondary ordering key of an item in the today ordering.
///
/// Every `Positioned` value sorts before `Unpositioned`, so "no value sorts
/// last" is a property of `Ord` rather than of each call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TodayPosition {
    #[default]
    Unpositioned,
    Positioned(i64),
}

impl TodayPosition {
    pub fn value(self) -> Option<i64> {
        match self {
            TodayPosition::Unpositioned => None,
            TodayPosition::Positioned(value) => Some(value),
        }
    }

    pub fn is_positioned(self) -> bool {
        matches!(self, TodayPosition::Positioned(_))
    }
}

impl From<Option<i64>> for TodayPosition {
    fn from(value: Option<i64>) -> Self {
        match value {
            Some(value) => TodayPosition::Positioned(value),
            None => TodayPosition::Unpositioned,
        }
    }
}

impl Ord for TodayPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (TodayPosition::Positioned(left), TodayPosition::Positioned(right)) => left.cmp(right),
            (TodayPosition::Positioned(_), TodayPosition::Unpositioned) => Ordering::Less,
            (TodayPosition::Unpositioned, TodayPosition::Positioned(_)) => Ordering::Greater,
            (TodayPosition::Unpositioned, TodayPosition::Unpositioned) => Ordering::Equal,
        }
    }
}

impl PartialOrd for TodayPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TodayPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TodayPosition::Unpositioned => f.write_str("-"),
            TodayPosition::Positioned(value) => write!(f, "{value}"),
        }
    }
}

// Stored and emitted as a nullable integer.
impl Serialize for TodayPosition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TodayPosition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Option::<i64>::deserialize(deserializer).map(TodayPosition::from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Universe {
    pub id: UniverseId,
    pub name: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub universe_id: UniverseId,
    pub name: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub category_id: CategoryId,
    pub content: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub position: i64,
    #[serde(default)]
    pub today_position: TodayPosition,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn is_active(&self) -> bool {
        !self.is_completed
    }

    /// Whether the item takes part in the cross-category today ordering.
    pub fn in_today_scope(&self) -> bool {
        self.is_active() && self.due_date.is_some()
    }
}

/// Direction of a single-step manual reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    pub fn inverse(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(Error::InvalidArgument(format!(
                "invalid direction '{other}' (expected up|down)"
            ))),
        }
    }
}

/// Which slice of the today ordering a view looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "date", rename_all = "snake_case")]
pub enum TodayWindow {
    All,
    OnOrBefore(NaiveDate),
    On(NaiveDate),
}

impl TodayWindow {
    pub fn contains(self, due: NaiveDate) -> bool {
        match self {
            TodayWindow::All => true,
            TodayWindow::OnOrBefore(date) => due <= date,
            TodayWindow::On(date) => due == date,
        }
    }

    /// Mode name accepted by `--window` and `today.window`.
    pub fn mode(self) -> &'static str {
        match self {
            TodayWindow::All => "all",
            TodayWindow::OnOrBefore(_) => "on_or_before",
            TodayWindow::On(_) => "on",
        }
    }

    pub fn date(self) -> Option<NaiveDate> {
        match self {
            TodayWindow::All => None,
            TodayWindow::OnOrBefore(date) | TodayWindow::On(date) => Some(date),
        }
    }

    /// Build a window from its config/CLI mode name and a reference date.
    pub fn from_mode(mode: &str, date: NaiveDate) -> Result<Self> {
        match mode.trim() {
            "all" => Ok(TodayWindow::All),
            "on_or_before" => Ok(TodayWindow::OnOrBefore(date)),
            "on" => Ok(TodayWindow::On(date)),
            other => Err(Error::InvalidArgument(format!(
                "invalid today window '{other}' (expected on|on_or_before|all)"
            ))),
        }
    }
}

/// An ordering scope, always chosen explicitly by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Scope {
    Category { category_id: CategoryId },
    Today { window: TodayWindow },
}

impl Scope {
    pub fn category(category_id: CategoryId) -> Self {
        Scope::Category { category_id }
    }

    pub fn today(window: TodayWindow) -> Self {
        Scope::Today { window }
    }

    /// `tdl item move` flags selecting this scope again.
    pub fn move_flags(&self) -> String {
        match self {
            Scope::Category { category_id } => {
                format!("--category-view --category {category_id}")
            }
            Scope::Today { window } => match window.date() {
                Some(date) => format!("--today-view --window {} --date {date}", window.mode()),
                None => format!("--today-view --window {}", window.mode()),
            },
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Category { category_id } => write!(f, "category {category_id}"),
            Scope::Today { .. } => f.write_str("today"),
        }
    }
}

/// Input for creating an item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub content: String,
    pub category_id: CategoryId,
    pub due_date: Option<NaiveDate>,
}

/// Partial update of an item; `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub content: Option<String>,
    pub is_completed: Option<bool>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<NaiveDate>>,
    pub position: Option<i64>,
    pub today_position: Option<TodayPosition>,
    pub category_id: Option<CategoryId>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.is_completed.is_none()
            && self.due_date.is_none()
            && self.position.is_none()
            && self.today_position.is_none()
            && self.category_id.is_none()
    }
}

/// Parse a `YYYY-MM-DD` date, or the keyword `today`.
pub fn parse_date(raw: &str, today: NaiveDate) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("today") {
        return Ok(today);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|err| {
        Error::InvalidArgument(format!("invalid date '{trimmed}' (expected YYYY-MM-DD): {err}"))
    })
}

/// Trim a user-supplied name or content string, rejecting empty input.
pub fn normalize_text(label: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(format!("{label} cannot be empty")));
    }
    Ok(trimmed.to_string())
}
