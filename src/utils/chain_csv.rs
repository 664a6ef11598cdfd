use crate::error::Result;
use crate::models::OptionRecord;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Column accessor for one CSV field of a chain record
pub type ColumnAccessor = fn(&OptionRecord) -> &str;

/// Column layout of a chain CSV, in write order.
pub const CHAIN_COLUMNS: [(&str, ColumnAccessor); 20] = [
    ("contractID", |r| r.contract_id.as_str()),
    ("symbol", |r| r.symbol.as_str()),
    ("expiration", |r| r.expiration.as_str()),
    ("strike", |r| r.strike.as_str()),
    ("type", |r| r.option_type.as_str()),
    ("last", |r| r.last.as_str()),
    ("mark", |r| r.mark.as_str()),
    ("bid", |r| r.bid.as_str()),
    ("bid_size", |r| r.bid_size.as_str()),
    ("ask", |r| r.ask.as_str()),
    ("ask_size", |r| r.ask_size.as_str()),
    ("volume", |r| r.volume.as_str()),
    ("open_interest", |r| r.open_interest.as_str()),
    ("date", |r| r.date.as_str()),
    ("implied_volatility", |r| r.implied_volatility.as_str()),
    ("delta", |r| r.delta.as_str()),
    ("gamma", |r| r.gamma.as_str()),
    ("theta", |r| r.theta.as_str()),
    ("vega", |r| r.vega.as_str()),
    ("rho", |r| r.rho.as_str()),
];

/// `<data_dir>/<TICKER>options.csv`, or `<TICKER>_<date>options.csv` for a
/// historical chain
pub fn chain_csv_path(data_dir: &Path, ticker: &str, date: Option<NaiveDate>) -> PathBuf {
    let name = match date {
        Some(d) => format!("{}_{}options.csv", ticker, d.format("%Y-%m-%d")),
        None => format!("{}options.csv", ticker),
    };
    data_dir.join(name)
}

/// Write chain records as CSV with a header row, creating parent directories
pub fn write_chain_csv<P: AsRef<Path>>(path: P, records: &[OptionRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CHAIN_COLUMNS.iter().map(|(name, _)| *name))?;
    for record in records {
        writer.write_record(CHAIN_COLUMNS.iter().map(|(_, get)| get(record)))?;
    }
    writer.flush()?;

    debug!("Wrote {} chain rows to {}", records.len(), path.display());
    Ok(())
}
