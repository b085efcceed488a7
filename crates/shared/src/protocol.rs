use serde::{Deserialize, Serialize};

/// Successful body of `POST /predict`. `probabilities` holds one percentage
/// per category, index-aligned with `DrCategory::ALL`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub filename: String,
    pub diagnosis: String,
    pub confidence: String,
    pub probabilities: Vec<f32>,
    pub heatmap_image: String,
}

/// Body of `POST /export_pdf`; the response is a raw PDF byte stream.
/// Image fields carry standard base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReportRequest {
    pub filename: String,
    pub diagnosis: String,
    pub confidence: String,
    pub probabilities: Vec<f32>,
    pub original_image: String,
    pub heatmap_image: String,
}
