//! Source fetcher error types.

use std::fmt;

use thiserror::Error;

/// Which of the two source tables an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Totals,
    County,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Totals => write!(f, "totals table"),
            Table::County => write!(f, "county table"),
        }
    }
}

/// Network or HTTP failure while retrieving the page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid source URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// The page no longer has the structure we expect.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("No 'travelAdvisories' tables found")]
    NoTables,
    #[error("Missing {0}")]
    MissingTable(Table),
    #[error("{0} has no header")]
    MissingHeader(Table),
    #[error("{table} is not labeled '{expected}' (found '{found}')")]
    UnexpectedTitle {
        table: Table,
        expected: &'static str,
        found: String,
    },
    #[error("{0} has no report date label")]
    MissingReportDate(Table),
    #[error("{0} has no body")]
    MissingBody(Table),
    #[error("{0} has no data rows")]
    NoDataRows(Table),
    #[error("{table} row {row} has {found} columns, expected {expected}")]
    ColumnCount {
        table: Table,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),
    #[error("County '{0}' is missing from the county table")]
    MissingCounty(String),
    #[error("Invalid selector '{0}'")]
    InvalidSelector(&'static str),
}

/// Any failure of [`SnapshotSource::fetch`](super::SnapshotSource::fetch).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
