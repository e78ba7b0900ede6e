//! Loading the current day's matched-orders history

use super::{matched_orders_path, LedgerError, MATCHED_ORDER_COLUMNS};
use crate::core::MatchedTradeLeg;
use std::fs::File;
use std::path::PathBuf;
use time::Date;

/// Reads matched-orders ledgers from one directory
#[derive(Debug, Clone)]
pub struct HistoryReader {
    dir: PathBuf,
}

impl HistoryReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// All legs recorded for `day`, in file order.
    ///
    /// A missing or empty file is an empty history. A header lacking any
    /// expected column is a schema error.
    pub fn load(&self, day: Date) -> Result<Vec<MatchedTradeLeg>, LedgerError> {
        let path = matched_orders_path(&self.dir, day);

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                crate::log_ledger!(tracing::Level::INFO, path = %path.display(), "No history for today");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if file.metadata()?.len() == 0 {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        let missing: Vec<&str> = MATCHED_ORDER_COLUMNS
            .iter()
            .copied()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .collect();
        if !missing.is_empty() {
            return Err(LedgerError::schema(
                &path,
                format!("missing columns: {}", missing.join(", ")),
            ));
        }

        let legs = reader
            .deserialize::<MatchedTradeLeg>()
            .collect::<Result<Vec<_>, _>>()?;

        crate::log_ledger!(
            tracing::Level::INFO,
            path = %path.display(),
            legs = legs.len(),
            "Loaded matched-order history"
        );

        Ok(legs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Side;
    use crate::test_utils::dec;
    use std::io::Write;
    use std::path::Path;
    use time::macros::{date, datetime};

    const DAY: Date = date!(2023 - 12 - 11);

    fn write_file(dir: &Path, contents: &str) {
        let mut f = File::create(matched_orders_path(dir, DAY)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let tmp = tempfile::tempdir().unwrap();
        let reader = HistoryReader::new(tmp.path());
        assert!(reader.load(DAY).unwrap().is_empty());
    }

    #[test]
    fn test_empty_file_is_empty_history() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "");
        let reader = HistoryReader::new(tmp.path());
        assert!(reader.load(DAY).unwrap().is_empty());
    }

    #[test]
    fn test_load_rows() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "Timestamp,Price,Quantity,Side,Venue,Fee,NetPrice,MatchedQuantity,RemainingQuantity\n\
             2023-12-11 16:11:20,23437.2,0.21239833,Ask,Coinmetro,23.4372,23460.6372,0.1,0.11239833\n\
             2023-12-11 16:11:20,23520.00,1.0,Bid,Kraken,56.448,23463.552,0.1,0.9\n",
        );

        let legs = HistoryReader::new(tmp.path()).load(DAY).unwrap();
        assert_eq!(legs.len(), 2);

        assert_eq!(legs[0].timestamp, datetime!(2023-12-11 16:11:20));
        assert_eq!(legs[0].side, Side::Ask);
        assert_eq!(legs[0].venue.as_str(), "Coinmetro");
        assert_eq!(legs[0].remaining_quantity, dec("0.11239833"));
        assert_eq!(legs[1].price, dec("23520"));
        assert_eq!(legs[1].side, Side::Bid);
    }

    #[test]
    fn test_extra_columns_and_order_are_tolerated() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "Venue,Side,Price,Quantity,Fee,NetPrice,MatchedQuantity,RemainingQuantity,Timestamp,Note\n\
             Kraken,Bid,100,2,0,100,1,1,2023-12-11 09:00:00,manual\n",
        );

        let legs = HistoryReader::new(tmp.path()).load(DAY).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].remaining_quantity, dec("1"));
    }

    #[test]
    fn test_padded_headers_are_accepted() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "Timestamp, Price ,Quantity,Side,Venue,Fee,NetPrice,MatchedQuantity, RemainingQuantity\n\
             2023-12-11 16:11:20,100,2,Bid,Kraken,0,100,1,1\n",
        );

        let legs = HistoryReader::new(tmp.path()).load(DAY).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].price, dec("100"));
        assert_eq!(legs[0].remaining_quantity, dec("1"));
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "Timestamp,Price,Quantity,Side,Fee,NetPrice,MatchedQuantity,RemainingQuantity\n\
             2023-12-11 16:11:20,100,2,Bid,0,100,1,1\n",
        );

        let err = HistoryReader::new(tmp.path()).load(DAY).unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("Venue"));
    }
}
