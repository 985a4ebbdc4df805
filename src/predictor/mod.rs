pub mod aggregate;
pub mod single;

pub use aggregate::{predict_aggregate, AggregatedPrediction, Observation, VariantAggregate};
pub use single::{predict_single, PredictionResult, UnavailableReason, VariantOutcome};
