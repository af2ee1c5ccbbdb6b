//! Change events for external integrations.
//!
//! With `--events <path|->` every successful mutation is also written as one
//! JSON line to stdout or to an append-only file. Reads never emit events.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

pub const EVENT_SCHEMA_VERSION: &str = "tdl.event.v1";

/// Where `--events` sends its lines. `-` means stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDestination {
    Stdout,
    File(PathBuf),
}

impl EventDestination {
    /// `None` for a missing or blank flag value.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") => None,
            Some("-") => Some(EventDestination::Stdout),
            Some(path) => Some(EventDestination::File(PathBuf::from(path))),
        }
    }

    pub fn open(&self) -> Result<EventSink> {
        match self {
            EventDestination::Stdout => Ok(EventSink::Stdout(io::stdout())),
            EventDestination::File(path) => Ok(EventSink::File(open_append(path)?)),
        }
    }
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(file)
}

/// What changed in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    UniverseCreated,
    UniverseDeleted,
    CategoryCreated,
    CategoryDeleted,
    ItemCreated,
    ItemUpdated,
    ItemCompleted,
    ItemReopened,
    ItemReordered,
    ItemDeleted,
    CompletedItemsPurged,
}

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub schema_version: &'static str,
    pub event: EventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Event {
    /// An event stamped now, carrying the affected record or outcome.
    pub fn new<T: Serialize>(event: EventKind, data: Option<&T>) -> Result<Self> {
        let data = data.map(serde_json::to_value).transpose()?;
        Ok(Self {
            schema_version: EVENT_SCHEMA_VERSION,
            event,
            timestamp: Utc::now(),
            data,
        })
    }
}

/// Open `--events` destination.
pub enum EventSink {
    Stdout(io::Stdout),
    File(File),
}

impl EventSink {
    fn writer(&mut self) -> &mut dyn Write {
        match self {
            EventSink::Stdout(out) => out,
            EventSink::File(file) => file,
        }
    }

    pub fn emit(&mut self, event: &Event) -> Result<()> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        let writer = self.writer();
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }

    /// Build and write one event for `data`.
    pub fn record<T: Serialize>(&mut self, kind: EventKind, data: &T) -> Result<()> {
        self.emit(&Event::new(kind, Some(data))?)
    }
}
