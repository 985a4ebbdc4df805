use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A trimmed, non-empty race identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaceName(String);

impl RaceName {
    /// Normalise a raw cell into a race name; blank input is not a race.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(RaceName(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RaceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which independently maintained ratio table backs a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataSourceMode {
    /// Finisher-statistics table: avg, median and winner ratios.
    #[default]
    Default,
    /// Winner-to-winner ratios derived from European race results.
    EuWinner,
}

impl DataSourceMode {
    /// Whether this mode can ever produce the given variant.
    pub fn supports(self, variant: Variant) -> bool {
        match self {
            DataSourceMode::Default => true,
            DataSourceMode::EuWinner => variant == Variant::Winner,
        }
    }
}

/// Statistical basis of a ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Avg,
    Median,
    Winner,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Avg, Variant::Median, Variant::Winner];
}

/// Observed time relationship between an ordered pair of races.
///
/// `target_time ≈ source_time / ratio`. Records are not symmetric: the
/// reverse pair is a separate entry, or no entry at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioRecord {
    pub source: RaceName,
    pub target: RaceName,
    pub ratio_avg: Option<f64>,
    pub ratio_median: Option<f64>,
    pub ratio_winner: Option<f64>,
}

impl RatioRecord {
    /// Build a record, dropping non-finite and non-positive ratios.
    /// Returns `None` when no variant survives.
    pub fn new(
        source: RaceName,
        target: RaceName,
        ratio_avg: Option<f64>,
        ratio_median: Option<f64>,
        ratio_winner: Option<f64>,
    ) -> Option<Self> {
        let record = RatioRecord {
            source,
            target,
            ratio_avg: ratio_avg.filter(|r| is_usable_ratio(*r)),
            ratio_median: ratio_median.filter(|r| is_usable_ratio(*r)),
            ratio_winner: ratio_winner.filter(|r| is_usable_ratio(*r)),
        };
        if record.has_any() {
            Some(record)
        } else {
            None
        }
    }

    pub fn ratio(&self, variant: Variant) -> Option<f64> {
        match variant {
            Variant::Avg => self.ratio_avg,
            Variant::Median => self.ratio_median,
            Variant::Winner => self.ratio_winner,
        }
    }

    pub fn has_any(&self) -> bool {
        Variant::ALL.iter().any(|v| self.ratio(*v).is_some())
    }
}

fn is_usable_ratio(r: f64) -> bool {
    r.is_finite() && r > 0.0
}

/// Presentation details for one European race, taken from its winning row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EuRaceDetail {
    pub event: RaceName,
    pub country: Option<String>,
    /// Display name, when the feed carries one distinct from the event key.
    pub name: Option<String>,
    pub dist_km: Option<f64>,
    pub year: Option<i32>,
    pub finishers: Option<u32>,
    /// Winning time, canonical `HH:MM:SS`.
    pub duration: String,
    #[serde(skip)]
    pub duration_seconds: u64,
}
