//! Surface point extraction from chain CSV files

use crate::error::{OptionsError, Result};
use crate::models::{time_to_expiration, OptionType, SurfacePoint, SurfacePoints};
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace};

pub const STRIKE: &str = "strike";
pub const EXPIRATION: &str = "expiration";
pub const AS_OF_DATE: &str = "date";
pub const IMPLIED_VOLATILITY: &str = "implied_volatility";
pub const OPTION_TYPE: &str = "type";

/// Positions of the columns the extractor reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub strike: usize,
    pub expiration: usize,
    pub date: usize,
    pub implied_volatility: usize,
    pub option_type: usize,
}

impl ColumnIndex {
    /// Locate required columns by name, case-insensitively after trimming.
    pub fn from_headers(headers: &StringRecord) -> Result<Self> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |wanted: &str| {
            names
                .iter()
                .position(|n| n == wanted)
                .ok_or_else(|| OptionsError::MissingColumn(wanted.to_string()))
        };

        Ok(Self {
            strike: find(STRIKE)?,
            expiration: find(EXPIRATION)?,
            date: find(AS_OF_DATE)?,
            implied_volatility: find(IMPLIED_VOLATILITY)?,
            option_type: find(OPTION_TYPE)?,
        })
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an implied volatility, accepting a trailing `%` (`"23.5%"` -> 0.235)
pub fn parse_implied_vol(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    match trimmed.strip_suffix('%') {
        Some(number) => parse_number(number).map(|v| v / 100.0),
        None => parse_number(trimmed),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Turn one CSV record into a typed surface point, or `None` when the row
/// does not qualify.
pub fn parse_row(record: &StringRecord, columns: &ColumnIndex) -> Option<(OptionType, SurfacePoint)> {
    let option_type = OptionType::classify(record.get(columns.option_type)?)?;
    let strike = parse_number(record.get(columns.strike)?)?;
    let implied_vol = parse_implied_vol(record.get(columns.implied_volatility)?)?;

    let expiration = parse_date(record.get(columns.expiration)?)?;
    let as_of = parse_date(record.get(columns.date)?)?;
    if expiration <= as_of {
        return None;
    }

    let tte = time_to_expiration(as_of, expiration);
    if tte <= 0.0 {
        return None;
    }

    Some((option_type, SurfacePoint::new(strike, tte, implied_vol)))
}

/// Read a chain CSV and split its qualifying rows into call and put points.
///
/// A missing required column fails before any data row is read; individual
/// rows that do not parse are skipped.
pub fn extract_points<P: AsRef<Path>>(path: P) -> Result<SurfacePoints> {
    let path = path.as_ref();
    debug!("Extracting surface points from {}", path.display());
    let file = File::open(path)?;
    extract_points_from_reader(file)
}

pub fn extract_points_from_reader<R: Read>(reader: R) -> Result<SurfacePoints> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnIndex::from_headers(rdr.headers()?)?;

    let mut points = SurfacePoints::default();
    let mut skipped = 0usize;
    for (line, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                trace!("Skipping unreadable row {}: {}", line + 2, e);
                skipped += 1;
                continue;
            }
        };

        match parse_row(&record, &columns) {
            Some((option_type, point)) => points.push(option_type, point),
            None => {
                trace!("Skipping row {}: {:?}", line + 2, record);
                skipped += 1;
            }
        }
    }

    debug!(
        "Extracted {} call and {} put points ({} rows skipped)",
        points.calls.len(),
        points.puts.len(),
        skipped
    );
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "strike,expiration,date,implied_volatility,type\n";

    fn extract(body: &str) -> SurfacePoints {
        extract_points_from_reader(format!("{}{}", HEADER, body).as_bytes()).unwrap()
    }

    #[test]
    fn percent_iv_is_normalized() {
        assert_eq!(parse_implied_vol("23.5%"), Some(0.235));
        assert_eq!(parse_implied_vol("0.235"), Some(0.235));
        assert_eq!(parse_implied_vol(" 20% "), Some(0.2));
        assert_eq!(parse_implied_vol("abc%"), None);
        assert_eq!(parse_implied_vol("%"), None);
        assert_eq!(parse_implied_vol(""), None);
        assert_eq!(parse_implied_vol("NaN"), None);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let headers = StringRecord::from(vec![
            "contractID", " Type ", "STRIKE", "Expiration", "Date", "Implied_Volatility",
        ]);
        let idx = ColumnIndex::from_headers(&headers).unwrap();
        assert_eq!(idx.option_type, 1);
        assert_eq!(idx.strike, 2);
        assert_eq!(idx.implied_volatility, 5);
    }

    #[test]
    fn missing_column_fails_before_rows() {
        let data = "strike,expiration,date,implied_volatility\n100,2025-06-20,2025-01-01,0.2\n";
        let err = extract_points_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, OptionsError::MissingColumn(ref c) if c == "type"));
    }

    #[test]
    fn empty_file_is_missing_column() {
        let err = extract_points_from_reader("".as_bytes()).unwrap_err();
        assert!(matches!(err, OptionsError::MissingColumn(_)));
    }

    #[test]
    fn one_year_expiration() {
        let points = extract("100,2026-01-01,2025-01-01,0.2,call\n");
        assert_eq!(points.calls, vec![SurfacePoint::new(100.0, 1.0, 0.2)]);
        assert!(points.puts.is_empty());
    }

    #[test]
    fn rows_keep_source_order_per_type() {
        let points = extract(
            "90,2025-06-20,2025-01-01,0.30,put\n\
             100,2025-06-20,2025-01-01,0.20,call\n\
             80,2025-06-20,2025-01-01,0.35,PUT\n\
             110,2025-12-19,2025-01-01,0.18, Call \n",
        );
        let call_strikes: Vec<f64> = points.calls.iter().map(|p| p.strike).collect();
        let put_strikes: Vec<f64> = points.puts.iter().map(|p| p.strike).collect();
        assert_eq!(call_strikes, vec![100.0, 110.0]);
        assert_eq!(put_strikes, vec![90.0, 80.0]);
    }

    #[test]
    fn invalid_rows_are_skipped_without_disturbing_others() {
        let points = extract(
            "abc,2025-06-20,2025-01-01,0.2,call\n\
             100,2025-06-20,2025-01-01,n/a,call\n\
             100,06/20/2025,2025-01-01,0.2,call\n\
             100,2025-06-20,not-a-date,0.2,call\n\
             100,2025-01-01,2025-01-01,0.2,call\n\
             100,2024-12-01,2025-01-01,0.2,put\n\
             100,2025-06-20,2025-01-01,0.2,straddle\n\
             100,2025-06-20\n\
             105,2025-06-20,2025-01-01,0.21,call\n",
        );
        assert_eq!(points.calls.len(), 1);
        assert_eq!(points.calls[0].strike, 105.0);
        assert!(points.puts.is_empty());
    }

    #[test]
    fn ragged_rows_with_extra_fields_are_read() {
        let points = extract("100,2025-06-20,2025-01-01,25%,put,extra,fields\n");
        assert_eq!(points.puts.len(), 1);
        assert_eq!(points.puts[0].implied_vol, 0.25);
    }

    #[test]
    fn all_rows_filtered_yields_empty_set() {
        let points = extract("100,2025-06-20,2025-01-01,0.2,other\n");
        assert!(points.is_empty());
    }
}
