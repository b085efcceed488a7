use thiserror::Error;

/// Failure taxonomy for screening operations. Every variant is terminal for
/// the operation that raised it; nothing is retried automatically.
#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error("no scan selected")]
    NoScanSelected,
    #[error("failed to load example asset '{name}': {source}")]
    AssetLoad {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("prediction request failed: {source}")]
    PredictionRequest {
        #[source]
        source: anyhow::Error,
    },
    #[error("report export failed: {source}")]
    Export {
        #[source]
        source: anyhow::Error,
    },
}

impl ScreeningError {
    /// The single human-readable message surfaced to the user. Structured
    /// codes stay internal.
    pub fn user_message(&self) -> String {
        match self {
            ScreeningError::NoScanSelected => {
                "Please select a retinal scan before starting the analysis.".to_string()
            }
            ScreeningError::AssetLoad { name, .. } => {
                format!("Could not load the example image '{name}'. Check the server connection and try again.")
            }
            ScreeningError::PredictionRequest { .. } => {
                "Failed to get a prediction. Make sure the analysis service is reachable and try again."
                    .to_string()
            }
            ScreeningError::Export { .. } => {
                "Failed to export the PDF report. Please try again.".to_string()
            }
        }
    }
}
