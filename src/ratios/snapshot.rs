//! Immutable snapshot of all loaded race data.
//!
//! A snapshot is built once per refresh and never mutated; a refresh builds
//! a new one and swaps it in, so readers holding the old one stay valid.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

use super::csv_loader::{parse_default_ratios, parse_eu_winners, EuFeed};
use super::models::{DataSourceMode, EuRaceDetail, RaceName, RatioRecord};
use super::table::RatioTable;

#[derive(Debug, Clone)]
pub struct RaceDataSnapshot {
    default: RatioTable,
    eu_winner: RatioTable,
    eu_details: BTreeMap<RaceName, EuRaceDetail>,
    /// Sorted, deduplicated names across both tables.
    race_names: Vec<String>,
    loaded_at: DateTime<Utc>,
}

impl RaceDataSnapshot {
    /// Snapshot with no data, used before the first successful load.
    pub fn empty() -> Self {
        Self::from_parts(RatioTable::new(), EuFeed::default())
    }

    /// Parse both raw feeds. The EU feed is optional.
    pub fn build(default_csv: &str, eu_csv: Option<&str>) -> Self {
        let default = parse_default_ratios(default_csv);
        let eu = eu_csv.map(parse_eu_winners).unwrap_or_default();
        Self::from_parts(default, eu)
    }

    pub fn from_parts(default: RatioTable, eu: EuFeed) -> Self {
        let names: BTreeSet<&str> = default
            .race_names()
            .chain(eu.table.race_names())
            .map(RaceName::as_str)
            .collect();
        let race_names = names.into_iter().map(str::to_string).collect();

        RaceDataSnapshot {
            default,
            eu_winner: eu.table,
            eu_details: eu.details,
            race_names,
            loaded_at: Utc::now(),
        }
    }

    pub fn table(&self, mode: DataSourceMode) -> &RatioTable {
        match mode {
            DataSourceMode::Default => &self.default,
            DataSourceMode::EuWinner => &self.eu_winner,
        }
    }

    /// Ratio record for the ordered pair in the selected table, if observed.
    pub fn resolve(&self, source: &str, target: &str, mode: DataSourceMode) -> Option<&RatioRecord> {
        self.table(mode).resolve(source, target)
    }

    /// Race names offered for selection.
    ///
    /// Default mode returns the global list and ignores `country`. EU mode
    /// returns EU event names, restricted to `country` when one is given.
    pub fn list_race_names(&self, mode: DataSourceMode, country: Option<&str>) -> Vec<String> {
        match mode {
            DataSourceMode::Default => self.race_names.clone(),
            DataSourceMode::EuWinner => {
                let country = country.map(str::trim).filter(|c| !c.is_empty());
                self.eu_details
                    .values()
                    .filter(|d| match country {
                        Some(c) => d.country.as_deref() == Some(c),
                        None => true,
                    })
                    .map(|d| d.event.to_string())
                    .collect()
            }
        }
    }

    /// Sorted distinct countries in the EU side-table.
    pub fn list_countries(&self) -> Vec<String> {
        let countries: BTreeSet<&str> = self
            .eu_details
            .values()
            .filter_map(|d| d.country.as_deref())
            .collect();
        countries.into_iter().map(str::to_string).collect()
    }

    pub fn race_detail(&self, name: &str) -> Option<&EuRaceDetail> {
        self.eu_details.get(name.trim())
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn race_count(&self) -> usize {
        self.race_names.len()
    }

    pub fn eu_race_count(&self) -> usize {
        self.eu_details.len()
    }
}
