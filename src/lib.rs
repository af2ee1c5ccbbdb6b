//! tdl - todo tracking with two manual orderings
//!
//! Universes own categories, categories own items. Every active item has a
//! place in its category (`position`), and every active dated item also has a
//! place in the cross-category today list (`today_position`).
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `tdl.toml`
//! - `error`: Error types, kinds and exit codes
//! - `events`: JSONL change events
//! - `ledger`: Scope resolution, slot allocation, reordering and due-date triggers
//! - `lock`: Store lock and atomic file replacement
//! - `model`: Records, ids and ordering value types
//! - `output`: JSON envelope and human output
//! - `storage`: Root directory layout
//! - `store`: Locked units of work over the persisted snapshot

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod lock;
pub mod model;
pub mod output;
pub mod storage;
pub mod store;

pub use error::{Error, Result};
