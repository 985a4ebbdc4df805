//! Single-observation prediction: one known time on one race, one target.

use serde::Serialize;
use tracing::debug;

use crate::ratios::{DataSourceMode, RaceDataSnapshot, RatioRecord, Variant};
use crate::time_codec::{format_time, parse_time};

/// Why a variant has no numeric prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// No ratio record exists for the pair.
    NoDataAvailable,
    /// The pair has a record but no avg ratio: the races share no finishers.
    NoRunnersInCommon,
    NoMedianData,
    NoWinnerData,
    /// The active data source never carries this variant.
    NotInMode,
}

impl UnavailableReason {
    pub fn message(self) -> &'static str {
        match self {
            UnavailableReason::NoDataAvailable => "No data available",
            UnavailableReason::NoRunnersInCommon => "No runners in common",
            UnavailableReason::NoMedianData => "No median data",
            UnavailableReason::NoWinnerData => "No winner data",
            UnavailableReason::NotInMode => "Not available for this data source",
        }
    }

    /// Reason reported when a record exists but lacks `variant`.
    fn missing(variant: Variant) -> Self {
        match variant {
            Variant::Avg => UnavailableReason::NoRunnersInCommon,
            Variant::Median => UnavailableReason::NoMedianData,
            Variant::Winner => UnavailableReason::NoWinnerData,
        }
    }
}

/// Outcome of one statistical variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantOutcome {
    /// Predicted finish time in whole seconds.
    Predicted { seconds: u64 },
    Unavailable(UnavailableReason),
}

impl VariantOutcome {
    pub fn seconds(&self) -> Option<u64> {
        match self {
            VariantOutcome::Predicted { seconds } => Some(*seconds),
            VariantOutcome::Unavailable(_) => None,
        }
    }

    pub fn reason(&self) -> Option<UnavailableReason> {
        match self {
            VariantOutcome::Predicted { .. } => None,
            VariantOutcome::Unavailable(reason) => Some(*reason),
        }
    }

    /// `HH:MM:SS` for a prediction, the reason text otherwise.
    pub fn display(&self) -> String {
        match self {
            VariantOutcome::Predicted { seconds } => format_time(*seconds as f64),
            VariantOutcome::Unavailable(reason) => reason.message().to_string(),
        }
    }
}

/// Per-variant outcomes for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionResult {
    pub avg: VariantOutcome,
    pub median: VariantOutcome,
    pub winner: VariantOutcome,
}

impl PredictionResult {
    fn uniform(outcome: VariantOutcome) -> Self {
        PredictionResult {
            avg: outcome,
            median: outcome,
            winner: outcome,
        }
    }

    pub fn get(&self, variant: Variant) -> VariantOutcome {
        match variant {
            Variant::Avg => self.avg,
            Variant::Median => self.median,
            Variant::Winner => self.winner,
        }
    }

    /// Whether at least one variant produced a time.
    pub fn has_prediction(&self) -> bool {
        Variant::ALL.iter().any(|v| self.get(*v).seconds().is_some())
    }
}

/// Predict the finish time on `target` from `time` achieved on `source`.
///
/// The same race on both sides returns the input time for every variant
/// without any lookup. Otherwise each variant is `source_seconds / ratio`.
pub fn predict_single(
    snapshot: &RaceDataSnapshot,
    time: &str,
    source: &str,
    target: &str,
    mode: DataSourceMode,
) -> PredictionResult {
    let (source, target) = (source.trim(), target.trim());
    let source_seconds = parse_time(time);

    if source == target {
        return PredictionResult::uniform(VariantOutcome::Predicted {
            seconds: source_seconds,
        });
    }

    let Some(record) = snapshot.resolve(source, target, mode) else {
        debug!("No {:?} ratio for {} -> {}", mode, source, target);
        return PredictionResult::uniform(VariantOutcome::Unavailable(
            UnavailableReason::NoDataAvailable,
        ));
    };

    if source_seconds == 0 {
        return PredictionResult::uniform(VariantOutcome::Predicted { seconds: 0 });
    }

    PredictionResult {
        avg: variant_outcome(record, Variant::Avg, mode, source_seconds),
        median: variant_outcome(record, Variant::Median, mode, source_seconds),
        winner: variant_outcome(record, Variant::Winner, mode, source_seconds),
    }
}

fn variant_outcome(
    record: &RatioRecord,
    variant: Variant,
    mode: DataSourceMode,
    source_seconds: u64,
) -> VariantOutcome {
    if !mode.supports(variant) {
        return VariantOutcome::Unavailable(UnavailableReason::NotInMode);
    }
    match record.ratio(variant) {
        Some(ratio) => VariantOutcome::Predicted {
            seconds: (source_seconds as f64 / ratio).floor() as u64,
        },
        None => VariantOutcome::Unavailable(UnavailableReason::missing(variant)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_CSV: &str = "\
source,target,ratio_avg,ratio_median,ratio_winner
RaceA,RaceB,1.1,1.25,0.75
RaceA,RaceC,,0.5,
RaceC,RaceA,2.0,,
";

    const EU_CSV: &str = "\
country,event,duration
FRA,UTMB,20:00:00
ITA,Lavaredo,10:00:00
";

    fn snapshot() -> RaceDataSnapshot {
        RaceDataSnapshot::build(DEFAULT_CSV, Some(EU_CSV))
    }

    #[test]
    fn test_identity_returns_input_time() {
        let snap = snapshot();
        for mode in [DataSourceMode::Default, DataSourceMode::EuWinner] {
            let result = predict_single(&snap, "2:03:04", "Nowhere", "Nowhere", mode);
            for v in Variant::ALL {
                assert_eq!(result.get(v).display(), "02:03:04");
            }
        }
    }

    #[test]
    fn test_division_direction() {
        let result = predict_single(&snapshot(), "02:00:00", "RaceA", "RaceB", DataSourceMode::Default);
        assert_eq!(result.avg.display(), "01:49:05");
        assert_eq!(result.avg.seconds(), Some(6545));
        assert_eq!(result.median.seconds(), Some(5760));
        assert_eq!(result.winner.seconds(), Some(9600));
    }

    #[test]
    fn test_matrix_feed_predicts_mixed_case_pair() {
        let snap = RaceDataSnapshot::build(",RaceB\nRaceA,1.1\n", None);
        let result = predict_single(&snap, "02:00:00", "RaceA", "RaceB", DataSourceMode::Default);
        assert_eq!(result.avg.display(), "02:12:00");
        assert_eq!(result.median.reason(), Some(UnavailableReason::NoMedianData));
    }

    #[test]
    fn test_missing_pair_is_no_data() {
        let snap = snapshot();
        let result = predict_single(&snap, "02:00:00", "RaceB", "RaceA", DataSourceMode::Default);
        assert_eq!(result.avg.reason(), Some(UnavailableReason::NoDataAvailable));
        assert_eq!(result.avg.display(), "No data available");
        assert!(!result.has_prediction());

        let result = predict_single(&snap, "02:00:00", "RaceA", "RaceB", DataSourceMode::EuWinner);
        assert_eq!(result.winner.reason(), Some(UnavailableReason::NoDataAvailable));
    }

    #[test]
    fn test_missing_avg_is_no_runners_in_common() {
        let result = predict_single(&snapshot(), "1:00:00", "RaceA", "RaceC", DataSourceMode::Default);
        assert_eq!(result.avg.display(), "No runners in common");
        assert_eq!(result.median.seconds(), Some(7200));
        assert_eq!(result.winner.display(), "No winner data");
    }

    #[test]
    fn test_missing_median_message() {
        let result = predict_single(&snapshot(), "1:00:00", "RaceC", "RaceA", DataSourceMode::Default);
        assert_eq!(result.avg.seconds(), Some(1800));
        assert_eq!(result.median.display(), "No median data");
    }

    #[test]
    fn test_zero_time_short_circuits() {
        let result = predict_single(&snapshot(), "", "RaceA", "RaceB", DataSourceMode::Default);
        for v in Variant::ALL {
            assert_eq!(result.get(v).display(), "00:00:00");
        }
    }

    #[test]
    fn test_eu_mode_only_predicts_winner() {
        let result = predict_single(&snapshot(), "10:00:00", "UTMB", "Lavaredo", DataSourceMode::EuWinner);
        // ratio = 20h / 10h = 2.0
        assert_eq!(result.winner.display(), "05:00:00");
        assert_eq!(result.avg.reason(), Some(UnavailableReason::NotInMode));
        assert_eq!(result.median.reason(), Some(UnavailableReason::NotInMode));
    }
}
