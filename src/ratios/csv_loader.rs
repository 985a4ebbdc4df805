//! Header-driven parsing of the ratio feeds.
//!
//! Three layouts are understood:
//! - long: `source,target,ratio_avg,ratio_median,ratio_winner` (any column order)
//! - matrix: a corner cell followed by target names; each row is a source
//!   race followed by one avg ratio per target column
//! - EU winners: `country,event,name,dist_km,year,finishers,duration`, from
//!   which winner-to-winner ratios are derived
//!
//! Parsing never fails: a feed without its required columns yields an empty
//! table and a warning, and unusable rows are skipped.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::models::{EuRaceDetail, RaceName, RatioRecord};
use super::table::RatioTable;
use crate::time_codec::{format_time, parse_time};

/// Layout of the default-mode feed, decided from its header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultFeedFormat {
    Long,
    Matrix,
}

impl DefaultFeedFormat {
    /// Expects headers already passed through `normalize_headers`. A header
    /// naming only one of `source`/`target` is a broken long feed, not a
    /// matrix; the matrix layout always starts with an empty corner cell.
    pub fn detect(headers: &StringRecord) -> Option<Self> {
        let has_source = column(headers, "source").is_some();
        let has_target = column(headers, "target").is_some();
        match (has_source, has_target) {
            (true, true) => Some(DefaultFeedFormat::Long),
            (false, false) if headers.len() >= 2 && headers.get(0) == Some("") => {
                Some(DefaultFeedFormat::Matrix)
            }
            _ => None,
        }
    }
}

/// Parsed EU-winner feed: derived winner ratios plus per-race details.
#[derive(Debug, Clone, Default)]
pub struct EuFeed {
    pub table: RatioTable,
    pub details: BTreeMap<RaceName, EuRaceDetail>,
}

/// Parse the default-mode feed in either the long or the matrix layout.
pub fn parse_default_ratios(text: &str) -> RatioTable {
    let mut reader = reader(text);
    let raw_headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            warn!("Ratio feed header unreadable: {}", e);
            return RatioTable::new();
        }
    };
    let headers = normalize_headers(&raw_headers);

    let table = match DefaultFeedFormat::detect(&headers) {
        Some(DefaultFeedFormat::Long) => parse_long(&mut reader, &headers),
        // Matrix header cells are race names, so they keep their case.
        Some(DefaultFeedFormat::Matrix) => parse_matrix(&mut reader, &raw_headers),
        None => {
            warn!(
                "Ratio feed header is neither source/target columns nor a matrix: {:?}",
                raw_headers.iter().collect::<Vec<_>>()
            );
            RatioTable::new()
        }
    };

    info!("Loaded {} default-mode ratio records", table.len());
    table
}

fn parse_long(reader: &mut csv::Reader<&[u8]>, headers: &StringRecord) -> RatioTable {
    let mut table = RatioTable::new();
    let (Some(source_col), Some(target_col)) =
        (column(headers, "source"), column(headers, "target"))
    else {
        warn!("Ratio feed is missing the source or target column");
        return table;
    };
    let avg_col = column(headers, "ratio_avg");
    let median_col = column(headers, "ratio_median");
    let winner_col = column(headers, "ratio_winner");

    for (line, row) in reader.records().enumerate() {
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping unreadable ratio row {}: {}", line + 2, e);
                continue;
            }
        };
        let (Some(source), Some(target)) = (
            row.get(source_col).and_then(RaceName::new),
            row.get(target_col).and_then(RaceName::new),
        ) else {
            continue;
        };

        let record = RatioRecord::new(
            source,
            target,
            parse_ratio(&row, avg_col),
            parse_ratio(&row, median_col),
            parse_ratio(&row, winner_col),
        );
        if let Some(record) = record {
            insert_logged(&mut table, record);
        }
    }
    table
}

fn parse_matrix(reader: &mut csv::Reader<&[u8]>, headers: &StringRecord) -> RatioTable {
    let mut table = RatioTable::new();
    // Column 0 is the row-label corner.
    let targets: Vec<Option<RaceName>> = headers
        .iter()
        .skip(1)
        .map(|h| RaceName::new(strip_bom(h)))
        .collect();

    for row in reader.records() {
        let Ok(row) = row else { continue };
        let Some(source) = row.get(0).and_then(RaceName::new) else {
            continue;
        };
        for (j, target) in targets.iter().enumerate() {
            let Some(target) = target else { continue };
            // Matrix cells are target/source multipliers; invert them so
            // every table divides the source time by its ratio.
            let ratio = parse_ratio(&row, Some(j + 1)).map(|cell| 1.0 / cell);
            if let Some(record) = RatioRecord::new(source.clone(), target.clone(), ratio, None, None) {
                insert_logged(&mut table, record);
            }
        }
    }
    table
}

/// Parse the EU-winner feed and derive winner ratios for every ordered pair
/// of races with a positive winning time.
pub fn parse_eu_winners(text: &str) -> EuFeed {
    let mut reader = reader(text);
    let headers = match reader.headers() {
        Ok(h) => normalize_headers(h),
        Err(e) => {
            warn!("EU winner feed header unreadable: {}", e);
            return EuFeed::default();
        }
    };

    let (Some(event_col), Some(duration_col)) =
        (column(&headers, "event"), column(&headers, "duration"))
    else {
        warn!(
            "EU winner feed is missing the event or duration column: {:?}",
            headers.iter().collect::<Vec<_>>()
        );
        return EuFeed::default();
    };
    let country_col = column(&headers, "country");
    let name_col = column(&headers, "name");
    let dist_col = column(&headers, "dist_km");
    let year_col = column(&headers, "year");
    let finishers_col = column(&headers, "finishers");

    // Pass 1: one winning row per event.
    let mut details: BTreeMap<RaceName, EuRaceDetail> = BTreeMap::new();
    for row in reader.records() {
        let Ok(row) = row else { continue };
        let Some(event) = row.get(event_col).and_then(RaceName::new) else {
            continue;
        };
        let duration_seconds = row.get(duration_col).map(parse_time).unwrap_or(0);
        let candidate = EuRaceDetail {
            event: event.clone(),
            country: text_cell(&row, country_col),
            name: text_cell(&row, name_col),
            dist_km: text_cell(&row, dist_col).and_then(|s| s.parse().ok()),
            year: text_cell(&row, year_col).and_then(|s| s.parse().ok()),
            finishers: text_cell(&row, finishers_col).and_then(|s| s.parse().ok()),
            duration: format_time(duration_seconds as f64),
            duration_seconds,
        };

        let keep_current = details
            .get(&event)
            .is_some_and(|current| rank(current) > rank(&candidate));
        if !keep_current {
            details.insert(event, candidate);
        }
    }

    // Pass 2: all ordered pairs.
    let timed: Vec<(&RaceName, u64)> = details
        .values()
        .filter(|d| d.duration_seconds > 0)
        .map(|d| (&d.event, d.duration_seconds))
        .collect();

    let mut table = RatioTable::new();
    for (i, (source, source_secs)) in timed.iter().enumerate() {
        for (j, (target, target_secs)) in timed.iter().enumerate() {
            if i == j {
                continue;
            }
            let ratio = *source_secs as f64 / *target_secs as f64;
            let record =
                RatioRecord::new((*source).clone(), (*target).clone(), None, None, Some(ratio));
            if let Some(record) = record {
                table.insert(record);
            }
        }
    }

    info!(
        "Loaded {} EU races, {} derived winner ratios",
        details.len(),
        table.len()
    );
    EuFeed { table, details }
}

/// Ordering key for competing rows of the same event: a usable duration
/// first, then the most recent year.
fn rank(detail: &EuRaceDetail) -> (bool, i32) {
    (detail.duration_seconds > 0, detail.year.unwrap_or(i32::MIN))
}

fn reader(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes())
}

fn normalize_headers(headers: &StringRecord) -> StringRecord {
    headers
        .iter()
        .map(|h| strip_bom(h).to_lowercase())
        .collect()
}

fn strip_bom(cell: &str) -> &str {
    cell.trim_start_matches('\u{feff}').trim()
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn text_cell(row: &StringRecord, col: Option<usize>) -> Option<String> {
    let value = row.get(col?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// A ratio cell counts only when it is a finite number above zero.
fn parse_ratio(row: &StringRecord, col: Option<usize>) -> Option<f64> {
    text_cell(row, col)?
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite() && *r > 0.0)
}

fn insert_logged(table: &mut RatioTable, record: RatioRecord) {
    let (source, target) = (record.source.clone(), record.target.clone());
    if !table.insert(record) {
        debug!("Duplicate ratio row for {} -> {} skipped", source, target);
    }
}
