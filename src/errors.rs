use thiserror::Error;

use crate::table::layout::Column;

/// Failures that end a sync run. Everything else degrades to a
/// [`Diagnostic`] and the run continues.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No row carries the id column label. The caller bootstraps a fresh header.
    #[error("no header row with an \"Item ID\" column found in {rows_scanned} rows")]
    MalformedTable { rows_scanned: usize },

    #[error("listing source returned no listings")]
    EmptySnapshot,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Collector(#[from] CollectorError),
}

/// Table store transport failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Listing source failures.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid profile url: {0}")]
    InvalidProfile(String),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Non-fatal findings collected during a run and surfaced as warnings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// A cell could not be parsed; the documented default was used instead.
    #[error("row {row}: unparsable {column} {raw:?}, using {fallback}")]
    ParseRecovery {
        row: usize,
        column: Column,
        raw: String,
        fallback: String,
    },

    /// The snapshot carried the same id twice; the first occurrence was kept.
    #[error("duplicate listing {id} in snapshot (position {position}), keeping first")]
    DuplicateListing { id: String, position: usize },

    /// The table holds a second row for an id; the first row was kept.
    #[error("row {row}: duplicate tracked id {id}, first seen at row {first_row}")]
    DuplicateTrackedRow { id: String, row: usize, first_row: usize },

    /// A repeated header row below the real header was skipped.
    #[error("row {row}: repeated header row skipped")]
    StrayHeader { row: usize },
}

impl Diagnostic {
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::ParseRecovery { .. } => "parse_recovery",
            Diagnostic::DuplicateListing { .. } => "duplicate_listing",
            Diagnostic::DuplicateTrackedRow { .. } => "duplicate_tracked_row",
            Diagnostic::StrayHeader { .. } => "stray_header",
        }
    }
}
