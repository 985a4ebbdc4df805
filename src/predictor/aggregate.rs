//! Combining several observations into one estimate per variant.
//!
//! Every observation is treated as an equally weighted, independent estimate
//! of the target time. Variants reduce independently: avg may succeed from
//! one set of observations while winner falls back to a reason message.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::single::{predict_single, PredictionResult, UnavailableReason};
use crate::error::InputError;
use crate::ratios::{DataSourceMode, RaceDataSnapshot, Variant};
use crate::time_codec::{format_time, normalize_time_input};

/// A known finish time on a source race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub race: String,
    pub time: String,
}

impl Observation {
    pub fn new(race: &str, time: &str) -> Self {
        Observation {
            race: race.to_string(),
            time: time.to_string(),
        }
    }
}

/// Reduced result of one variant across all observations.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantAggregate {
    Estimate {
        mean_seconds: f64,
        min_seconds: u64,
        max_seconds: u64,
        /// Observations that contributed a time.
        used: usize,
    },
    /// No observation produced a time; carries the first reason seen.
    Unavailable(UnavailableReason),
}

impl VariantAggregate {
    pub fn time(&self) -> Option<String> {
        match self {
            VariantAggregate::Estimate { mean_seconds, .. } => Some(format_time(*mean_seconds)),
            VariantAggregate::Unavailable(_) => None,
        }
    }

    pub fn min(&self) -> Option<String> {
        match self {
            VariantAggregate::Estimate { min_seconds, .. } => Some(format_time(*min_seconds as f64)),
            VariantAggregate::Unavailable(_) => None,
        }
    }

    pub fn max(&self) -> Option<String> {
        match self {
            VariantAggregate::Estimate { max_seconds, .. } => Some(format_time(*max_seconds as f64)),
            VariantAggregate::Unavailable(_) => None,
        }
    }

    pub fn used(&self) -> usize {
        match self {
            VariantAggregate::Estimate { used, .. } => *used,
            VariantAggregate::Unavailable(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedPrediction {
    /// Number of observations submitted.
    pub observations: usize,
    /// Observations for which no variant produced a time.
    pub excluded: usize,
    pub avg: Option<VariantAggregate>,
    pub median: Option<VariantAggregate>,
    pub winner: Option<VariantAggregate>,
}

impl AggregatedPrediction {
    pub fn get(&self, variant: Variant) -> Option<&VariantAggregate> {
        match variant {
            Variant::Avg => self.avg.as_ref(),
            Variant::Median => self.median.as_ref(),
            Variant::Winner => self.winner.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Variant::ALL.iter().all(|v| self.get(*v).is_none())
    }

    /// Whether any variant produced a numeric estimate.
    pub fn has_estimate(&self) -> bool {
        Variant::ALL
            .iter()
            .any(|v| matches!(self.get(*v), Some(VariantAggregate::Estimate { .. })))
    }

    /// Notice for the caller when some observations could not be used.
    pub fn warning(&self) -> Option<String> {
        if self.excluded == 0 {
            return None;
        }
        Some(format!(
            "{} of {} prediction(s) could not be calculated due to missing data",
            self.excluded, self.observations
        ))
    }
}

/// Check every observation and the target, returning observations with
/// times normalised to `HH:MM:SS`.
pub fn validate_observations(
    observations: &[Observation],
    target: &str,
) -> Result<Vec<Observation>, InputError> {
    if observations.is_empty() {
        return Err(InputError::NoObservations);
    }
    check_target(target)?;

    observations
        .iter()
        .enumerate()
        .map(|(i, obs)| validate_observation(obs, i + 1))
        .collect()
}

/// Validate the one observation of a single prediction request.
pub fn validate_single(observation: &Observation, target: &str) -> Result<Observation, InputError> {
    check_target(target)?;
    validate_observation(observation, 1)
}

fn check_target(target: &str) -> Result<(), InputError> {
    if target.trim().is_empty() {
        return Err(InputError::MissingField("target race".to_string()));
    }
    Ok(())
}

/// `position` is 1-based and only used in error messages.
fn validate_observation(obs: &Observation, position: usize) -> Result<Observation, InputError> {
    if obs.race.trim().is_empty() {
        return Err(InputError::MissingField(format!("race #{}", position)));
    }
    if obs.time.trim().is_empty() {
        return Err(InputError::MissingField(format!("time #{}", position)));
    }
    let time =
        normalize_time_input(&obs.time).ok_or_else(|| InputError::InvalidTime(obs.time.clone()))?;
    Ok(Observation {
        race: obs.race.trim().to_string(),
        time,
    })
}

/// Predict `target` from every observation and reduce each variant to
/// mean/min/max over the observations that produced a time.
///
/// Structurally invalid input is rejected as a whole. `Ok(None)` means no
/// variant has anything to report.
pub fn predict_aggregate(
    snapshot: &RaceDataSnapshot,
    observations: &[Observation],
    target: &str,
    mode: DataSourceMode,
) -> Result<Option<AggregatedPrediction>, InputError> {
    let observations = validate_observations(observations, target)?;

    let results: Vec<PredictionResult> = observations
        .iter()
        .map(|obs| predict_single(snapshot, &obs.time, &obs.race, target, mode))
        .collect();

    let excluded = results.iter().filter(|r| !r.has_prediction()).count();
    let aggregated = AggregatedPrediction {
        observations: results.len(),
        excluded,
        avg: reduce_variant(&results, Variant::Avg),
        median: reduce_variant(&results, Variant::Median),
        winner: reduce_variant(&results, Variant::Winner),
    };

    if excluded > 0 {
        warn!(
            "{} of {} observations gave no prediction for {}",
            excluded,
            results.len(),
            target.trim()
        );
    }

    if aggregated.is_empty() {
        return Ok(None);
    }
    debug!("Aggregated {} observations for {}", results.len(), target.trim());
    Ok(Some(aggregated))
}

fn reduce_variant(results: &[PredictionResult], variant: Variant) -> Option<VariantAggregate> {
    let seconds: Vec<u64> = results
        .iter()
        .filter_map(|r| r.get(variant).seconds())
        .collect();

    if seconds.is_empty() {
        return results
            .iter()
            .find_map(|r| r.get(variant).reason())
            .map(VariantAggregate::Unavailable);
    }

    let total: f64 = seconds.iter().map(|s| *s as f64).sum();
    Some(VariantAggregate::Estimate {
        mean_seconds: total / seconds.len() as f64,
        min_seconds: seconds.iter().copied().min().unwrap_or_default(),
        max_seconds: seconds.iter().copied().max().unwrap_or_default(),
        used: seconds.len(),
    })
}
