//! Appending matched legs and per-cycle profit rows

use super::{matched_orders_path, trades_path, LedgerError};
use crate::core::{InventoryLedger, MatchedTradeLeg, Venue};
use rust_decimal::Decimal;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use time::{Date, PrimitiveDateTime};

/// Appends to the daily ledgers in one directory
#[derive(Debug, Clone)]
pub struct LedgerWriter {
    dir: PathBuf,
}

impl LedgerWriter {
    /// Create the writer, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Append legs to the matched-orders file of `day`
    pub fn append_legs(&self, day: Date, legs: &[MatchedTradeLeg]) -> Result<(), LedgerError> {
        if legs.is_empty() {
            return Ok(());
        }

        let path = matched_orders_path(&self.dir, day);
        let (file, is_new) = open_append(&path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        for leg in legs {
            writer.serialize(leg)?;
        }
        writer.flush()?;

        crate::log_ledger!(
            tracing::Level::DEBUG,
            path = %path.display(),
            legs = legs.len(),
            "Appended matched legs"
        );
        Ok(())
    }

    /// Append one cycle's profit and per-venue inventory deltas.
    ///
    /// Every venue in `venues` gets a base and a quote column, in order;
    /// venues without fills are written as zero.
    pub fn append_profit_row(
        &self,
        timestamp: PrimitiveDateTime,
        profit: Decimal,
        inventory: &InventoryLedger,
        venues: &[Venue],
    ) -> Result<(), LedgerError> {
        let path = trades_path(&self.dir, timestamp.date());
        let header = trades_header(venues);

        if let Some(existing) = read_header(&path)? {
            if existing != header {
                return Err(LedgerError::schema(
                    &path,
                    format!(
                        "expected columns [{}], found [{}]",
                        header.join(", "),
                        existing.join(", ")
                    ),
                ));
            }
        }

        let (file, is_new) = open_append(&path)?;
        let mut writer = csv::WriterBuilder::new().from_writer(file);
        if is_new {
            writer.write_record(&header)?;
        }

        let mut row = Vec::with_capacity(header.len());
        row.push(format_timestamp(timestamp)?);
        row.push(profit.to_string());
        for venue in venues {
            let delta = inventory.get(venue);
            row.push(delta.base.to_string());
            row.push(delta.quote.to_string());
        }
        writer.write_record(&row)?;
        writer.flush()?;

        crate::log_ledger!(
            tracing::Level::DEBUG,
            path = %path.display(),
            profit = %profit,
            "Appended profit row"
        );
        Ok(())
    }
}

/// `Timestamp, Profit, <Venue>BaseDelta, <Venue>QuoteDelta, ...`
pub fn trades_header(venues: &[Venue]) -> Vec<String> {
    let mut header = vec!["Timestamp".to_string(), "Profit".to_string()];
    for venue in venues {
        header.push(format!("{}BaseDelta", venue));
        header.push(format!("{}QuoteDelta", venue));
    }
    header
}

fn format_timestamp(timestamp: PrimitiveDateTime) -> Result<String, LedgerError> {
    let format = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    Ok(timestamp.format(&format)?)
}

/// Open for appending; reports whether the file had no content yet
fn open_append(path: &Path) -> Result<(File, bool), LedgerError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let is_new = file.metadata()?.len() == 0;
    Ok((file, is_new))
}

/// Header of an existing non-empty file
fn read_header(path: &Path) -> Result<Option<Vec<String>>, LedgerError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if file.metadata()?.len() == 0 {
        return Ok(None);
    }

    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
    let header = reader.headers()?.iter().map(str::to_string).collect();
    Ok(Some(header))
}
