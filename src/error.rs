use thiserror::Error;

/// Failure to fetch or ingest a ratio feed. Prior race data stays in place
/// whenever one of these is returned.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Race data fetch from {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("Race data feed {0} returned an empty payload")]
    EmptyPayload(String),

    #[error("Race data feed {0} produced no usable ratios")]
    NoRatios(String),
}

/// Structurally invalid prediction input. Rejected before any prediction runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Please fill all fields: {0} is missing")]
    MissingField(String),

    #[error("Invalid time '{0}' (expected HH:MM:SS, H:MM, MM:SS or SS)")]
    InvalidTime(String),

    #[error("At least one source race is required")]
    NoObservations,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_display() {
        let err = InputError::InvalidTime("1:2:3:4".to_string());
        assert!(err.to_string().contains("1:2:3:4"));
        assert!(InputError::MissingField("target".to_string())
            .to_string()
            .contains("target"));
    }

    #[test]
    fn test_ingest_error_display() {
        let err = IngestError::Status {
            url: "https://example.com/ratios.csv".to_string(),
            status: 404,
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("ratios.csv"));
    }
}
