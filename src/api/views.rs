//! JSON shapes returned by the API. Times are formatted here and nowhere
//! earlier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::predictor::{
    AggregatedPrediction, Observation, PredictionResult, UnavailableReason, VariantAggregate,
    VariantOutcome,
};
use crate::ratios::DataSourceMode;

#[derive(Debug, Deserialize)]
pub struct RacesQuery {
    #[serde(default)]
    pub mode: DataSourceMode,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub time: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub mode: DataSourceMode,
}

#[derive(Debug, Deserialize)]
pub struct AggregateRequest {
    pub observations: Vec<Observation>,
    pub target: String,
    #[serde(default)]
    pub mode: DataSourceMode,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub races: usize,
    pub eu_races: usize,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VariantView {
    Predicted { time: String, seconds: u64 },
    Unavailable { reason: UnavailableReason, message: String },
}

impl From<VariantOutcome> for VariantView {
    fn from(outcome: VariantOutcome) -> Self {
        match outcome {
            VariantOutcome::Predicted { seconds } => VariantView::Predicted {
                time: outcome.display(),
                seconds,
            },
            VariantOutcome::Unavailable(reason) => VariantView::Unavailable {
                reason,
                message: reason.message().to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictionView {
    pub avg: VariantView,
    pub median: VariantView,
    pub winner: VariantView,
}

impl From<PredictionResult> for PredictionView {
    fn from(result: PredictionResult) -> Self {
        PredictionView {
            avg: result.avg.into(),
            median: result.median.into(),
            winner: result.winner.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AggregateVariantView {
    Estimate {
        time: String,
        min: String,
        max: String,
        used: usize,
    },
    Unavailable {
        reason: UnavailableReason,
        message: String,
    },
}

impl From<&VariantAggregate> for AggregateVariantView {
    fn from(agg: &VariantAggregate) -> Self {
        match agg {
            VariantAggregate::Unavailable(reason) => AggregateVariantView::Unavailable {
                reason: *reason,
                message: reason.message().to_string(),
            },
            VariantAggregate::Estimate { .. } => AggregateVariantView::Estimate {
                time: agg.time().unwrap_or_default(),
                min: agg.min().unwrap_or_default(),
                max: agg.max().unwrap_or_default(),
                used: agg.used(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AggregateView {
    pub observations: usize,
    pub excluded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg: Option<AggregateVariantView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<AggregateVariantView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<AggregateVariantView>,
}

impl From<&AggregatedPrediction> for AggregateView {
    fn from(agg: &AggregatedPrediction) -> Self {
        AggregateView {
            observations: agg.observations,
            excluded: agg.excluded,
            warning: agg.warning(),
            avg: agg.avg.as_ref().map(Into::into),
            median: agg.median.as_ref().map(Into::into),
            winner: agg.winner.as_ref().map(Into::into),
        }
    }
}
