//! Daily CSV ledgers
//!
//! Two files per UTC day under the ledger directory:
//! - `YYYY-MM-DD matched_orders.csv`: one row per matched trade leg
//! - `YYYY-MM-DD trades.csv`: one profit/inventory row per cycle

pub mod history;
pub mod writer;

pub use history::HistoryReader;
pub use writer::LedgerWriter;

use std::path::{Path, PathBuf};
use thiserror::Error;
use time::Date;

/// Columns of the matched-orders ledger, in write order
pub const MATCHED_ORDER_COLUMNS: [&str; 9] = [
    "Timestamp",
    "Price",
    "Quantity",
    "Side",
    "Venue",
    "Fee",
    "NetPrice",
    "MatchedQuantity",
    "RemainingQuantity",
];

/// Ledger read/write failures
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("ledger timestamp error: {0}")]
    Timestamp(#[from] time::error::Format),

    /// The file exists but does not have the expected columns
    #[error("ledger schema mismatch in {path}: {detail}")]
    Schema { path: PathBuf, detail: String },
}

impl LedgerError {
    pub(crate) fn schema(path: &Path, detail: impl Into<String>) -> Self {
        LedgerError::Schema {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }

    #[inline]
    pub fn is_schema(&self) -> bool {
        matches!(self, LedgerError::Schema { .. })
    }
}

/// Matched-orders file for `day`
pub fn matched_orders_path(dir: &Path, day: Date) -> PathBuf {
    dir.join(format!("{} matched_orders.csv", day))
}

/// Profit/inventory file for `day`
pub fn trades_path(dir: &Path, day: Date) -> PathBuf {
    dir.join(format!("{} trades.csv", day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_file_names() {
        let dir = Path::new("/data");
        assert_eq!(
            matched_orders_path(dir, date!(2023 - 12 - 11)),
            PathBuf::from("/data/2023-12-11 matched_orders.csv")
        );
        assert_eq!(
            trades_path(dir, date!(2024 - 01 - 02)),
            PathBuf::from("/data/2024-01-02 trades.csv")
        );
    }

    #[test]
    fn test_schema_error_classification() {
        let err = LedgerError::schema(Path::new("x.csv"), "missing Venue");
        assert!(err.is_schema());
        assert!(err.to_string().contains("missing Venue"));

        let err = LedgerError::from(std::io::Error::other("disk full"));
        assert!(!err.is_schema());
    }
}
