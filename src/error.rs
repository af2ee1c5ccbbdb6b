//! Error types for tdl
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown id, empty update)
//! - 3: Blocked (move past a boundary or a tied neighbour, delete of a non-empty parent)
//! - 4: Operation failed (io, lock contention, corrupt store)

use serde::Serialize;
use thiserror::Error;

use crate::model::{Direction, Scope};

/// Exit codes for the tdl CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for tdl operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Universe not found: {0}")]
    UniverseNotFound(i64),

    #[error("Category not found: {0}")]
    CategoryNotFound(i64),

    #[error("Item not found: {0}")]
    ItemNotFound(i64),

    #[error("Item {item} is not in the {scope} ordering")]
    NotInScope { item: i64, scope: String },

    #[error("No fields to update")]
    NoFieldsProvided,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Blocked (exit code 3)
    #[error("Cannot move item {item} {direction}: already at the {boundary} of the {scope} ordering")]
    InvalidMove {
        item: i64,
        direction: Direction,
        boundary: &'static str,
        scope: Scope,
    },

    #[error("Cannot move item {item} {direction} past item {neighbour}: no free {scope} position left between its neighbours")]
    NoRoomToMove {
        item: i64,
        neighbour: i64,
        direction: Direction,
        scope: Scope,
    },

    #[error("Cannot delete {kind} {id}: it still has {count} {dependents}")]
    NonEmptyDependent {
        kind: &'static str,
        id: i64,
        count: usize,
        dependents: &'static str,
    },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(std::path::PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Coarse classification a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidMove,
    NonEmptyDependent,
    NoFieldsProvided,
    InvalidInput,
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidMove => "invalid_move",
            ErrorKind::NonEmptyDependent => "non_empty_dependent",
            ErrorKind::NoFieldsProvided => "no_fields_provided",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Storage => "storage",
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UniverseNotFound(_)
            | Error::CategoryNotFound(_)
            | Error::ItemNotFound(_)
            | Error::NotInScope { .. } => ErrorKind::NotFound,
            Error::InvalidMove { .. } | Error::NoRoomToMove { .. } => ErrorKind::InvalidMove,
            Error::NonEmptyDependent { .. } => ErrorKind::NonEmptyDependent,
            Error::NoFieldsProvided => ErrorKind::NoFieldsProvided,
            Error::InvalidArgument(_) | Error::InvalidConfig(_) => ErrorKind::InvalidInput,
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => ErrorKind::Storage,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::NotFound | ErrorKind::NoFieldsProvided | ErrorKind::InvalidInput => {
                exit_codes::USER_ERROR
            }
            ErrorKind::InvalidMove | ErrorKind::NonEmptyDependent => exit_codes::BLOCKED,
            ErrorKind::Storage => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured fields for machine-readable output.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::UniverseNotFound(id) => Some(serde_json::json!({ "universe_id": id })),
            Error::CategoryNotFound(id) => Some(serde_json::json!({ "category_id": id })),
            Error::ItemNotFound(id) => Some(serde_json::json!({ "item_id": id })),
            Error::NotInScope { item, scope } => {
                Some(serde_json::json!({ "item_id": item, "scope": scope }))
            }
            Error::InvalidMove {
                item,
                direction,
                boundary,
                scope,
            } => Some(serde_json::json!({
                "item_id": item,
                "direction": direction,
                "boundary": boundary,
                "scope": scope,
            })),
            Error::NoRoomToMove {
                item,
                neighbour,
                direction,
                scope,
            } => Some(serde_json::json!({
                "item_id": item,
                "neighbour_id": neighbour,
                "direction": direction,
                "scope": scope,
            })),
            Error::NonEmptyDependent {
                kind,
                id,
                count,
                dependents,
            } => Some(serde_json::json!({
                "kind": kind,
                "id": id,
                "count": count,
                "dependents": dependents,
            })),
            _ => None,
        }
    }
}

/// Result type alias for tdl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            kind: err.kind().as_str(),
            details: err.details(),
        }
    }
}
