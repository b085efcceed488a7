use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use shared::{
    domain::{self, DrCategory},
    protocol::{ExportReportRequest, PredictResponse},
};
use tokio::sync::Mutex;
use tracing::{info, warn};

pub mod chart;
pub mod error;

pub use chart::{ChartBar, ChartSeries};
pub use error::ScreeningError;

/// An image the user intends to analyze. Bytes are shared with the derived
/// preview so replacing the selection releases both together.
#[derive(Debug, Clone)]
pub struct ScanUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Arc<Vec<u8>>,
}

impl ScanUpload {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: Arc::new(bytes),
        }
    }
}

/// Display handle derived 1:1 from the current selection. Holds the only
/// long-lived reference to the scan bytes besides the selection itself.
#[derive(Debug, Clone)]
pub struct ScanPreview {
    pub generation: u64,
    pub file_name: String,
    pub bytes: Arc<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub file_name: String,
    pub diagnosis: String,
    pub confidence: String,
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// The fixed category matching the diagnosis label, when the service
    /// reported one of the known labels.
    pub fn category(&self) -> Option<DrCategory> {
        DrCategory::ALL
            .iter()
            .copied()
            .find(|category| category.label() == self.diagnosis)
    }
}

/// Server-rendered Grad-CAM overlay, stored verbatim as base64. Front ends
/// decode it for display only.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapImage {
    pub base64: String,
}

impl HeatmapImage {
    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.base64)
            .context("heatmap payload is not valid base64")
    }
}

/// Finished PDF report. Callers persist it under `file_name` only after the
/// export call fully succeeded; a failed export never yields a document.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub file_name: &'static str,
    pub bytes: Vec<u8>,
}

/// Remote collaborators of the controller. One implementation speaks HTTP to
/// the diagnostics service; tests substitute their own.
#[async_trait]
pub trait DiagnosticsApi: Send + Sync {
    async fn predict(&self, scan: &ScanUpload) -> Result<PredictResponse>;
    async fn export_report(&self, request: &ExportReportRequest) -> Result<Vec<u8>>;
    async fn fetch_example(&self, file_name: &str) -> Result<Vec<u8>>;
}

pub struct HttpDiagnosticsApi {
    http: Client,
    server_url: String,
}

impl HttpDiagnosticsApi {
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url = server_url.into();
        Self {
            http: Client::new(),
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

#[async_trait]
impl DiagnosticsApi for HttpDiagnosticsApi {
    async fn predict(&self, scan: &ScanUpload) -> Result<PredictResponse> {
        let part = reqwest::multipart::Part::bytes(scan.bytes.as_ref().clone())
            .file_name(scan.file_name.clone())
            .mime_str(&scan.mime_type)
            .with_context(|| format!("invalid mime type '{}'", scan.mime_type))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/predict", self.server_url))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json::<PredictResponse>()
            .await
            .context("malformed prediction response body")?;
        Ok(response)
    }

    async fn export_report(&self, request: &ExportReportRequest) -> Result<Vec<u8>> {
        let bytes = self
            .http
            .post(format!("{}/export_pdf", self.server_url))
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }

    async fn fetch_example(&self, file_name: &str) -> Result<Vec<u8>> {
        let bytes = self
            .http
            .get(format!("{}/examples/{file_name}", self.server_url))
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

/// Point-in-time copy of the controller state for rendering. Cheap to take:
/// image payloads are behind shared buffers.
#[derive(Debug, Clone, Default)]
pub struct ScreeningSnapshot {
    pub selected: Option<ScanUpload>,
    pub preview: Option<ScanPreview>,
    pub prediction: Option<Prediction>,
    pub heatmap: Option<HeatmapImage>,
    pub chart: Option<ChartSeries>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct ScreeningState {
    generation: u64,
    selected: Option<ScanUpload>,
    preview: Option<ScanPreview>,
    prediction: Option<Prediction>,
    heatmap: Option<HeatmapImage>,
    chart: Option<ChartSeries>,
    is_loading: bool,
    error: Option<String>,
}

impl ScreeningState {
    fn reset_results(&mut self) {
        self.prediction = None;
        self.heatmap = None;
        self.chart = None;
        self.error = None;
    }
}

/// Owns the whole upload/analyze/export cycle: current selection, derived
/// preview, the latest prediction with its chart, the loading flag, and the
/// single user-facing error message.
///
/// Operations take `&self`; state sits behind a mutex that is never held
/// across a network await. Every selection bumps a generation counter and
/// `analyze` re-validates it before applying the response, so a prediction
/// that arrives for a superseded scan is discarded instead of racing the
/// newer selection.
pub struct ScreeningController<A: DiagnosticsApi> {
    api: A,
    inner: Mutex<ScreeningState>,
}

impl<A: DiagnosticsApi> ScreeningController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            inner: Mutex::new(ScreeningState::default()),
        }
    }

    pub async fn snapshot(&self) -> ScreeningSnapshot {
        let state = self.inner.lock().await;
        ScreeningSnapshot {
            selected: state.selected.clone(),
            preview: state.preview.clone(),
            prediction: state.prediction.clone(),
            heatmap: state.heatmap.clone(),
            chart: state.chart.clone(),
            is_loading: state.is_loading,
            error: state.error.clone(),
        }
    }

    /// Stores the scan as the current selection and derives its preview.
    /// Any previous prediction, heatmap, chart, and error are cleared before
    /// the new selection becomes visible. An empty payload is a no-op.
    pub async fn select_scan(&self, scan: ScanUpload) {
        if scan.bytes.is_empty() {
            return;
        }

        let mut state = self.inner.lock().await;
        state.generation += 1;
        state.preview = Some(ScanPreview {
            generation: state.generation,
            file_name: scan.file_name.clone(),
            bytes: Arc::clone(&scan.bytes),
        });
        info!(
            file = %scan.file_name,
            size_bytes = scan.bytes.len(),
            generation = state.generation,
            "scan selected"
        );
        state.selected = Some(scan);
        state.reset_results();
        state.is_loading = false;
    }

    /// Fetches a bundled example asset and selects it as an `image/png` scan.
    /// On fetch failure the previous selection and preview stay untouched;
    /// only the error message is set.
    pub async fn load_example(&self, file_name: &str) -> Result<(), ScreeningError> {
        self.inner.lock().await.error = None;

        let bytes = match self.api.fetch_example(file_name).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                return self
                    .fail(ScreeningError::AssetLoad {
                        name: file_name.to_string(),
                        source: anyhow!("example asset is empty"),
                    })
                    .await;
            }
            Err(source) => {
                return self
                    .fail(ScreeningError::AssetLoad {
                        name: file_name.to_string(),
                        source,
                    })
                    .await;
            }
        };

        self.select_scan(ScanUpload::new(file_name, "image/png", bytes))
            .await;
        Ok(())
    }

    /// Submits the current selection to the prediction service. Exactly one
    /// request per invocation; no retries. The loading flag is false once the
    /// call settles, on the success and the failure path alike.
    pub async fn analyze(&self) -> Result<(), ScreeningError> {
        let (scan, generation) = {
            let mut state = self.inner.lock().await;
            state.error = None;
            let Some(scan) = state.selected.clone() else {
                let err = ScreeningError::NoScanSelected;
                state.error = Some(err.user_message());
                return Err(err);
            };
            state.reset_results();
            state.is_loading = true;
            (scan, state.generation)
        };

        info!(file = %scan.file_name, "requesting prediction");
        let outcome = self.api.predict(&scan).await;

        let mut state = self.inner.lock().await;
        if state.generation != generation {
            // The selection changed while the request was in flight; the
            // response belongs to a superseded scan.
            warn!(
                request_generation = generation,
                current_generation = state.generation,
                "discarding stale prediction response"
            );
            return Ok(());
        }
        state.is_loading = false;

        let response = match outcome {
            Ok(response) => response,
            Err(source) => {
                let err = ScreeningError::PredictionRequest { source };
                state.error = Some(err.user_message());
                warn!(file = %scan.file_name, "prediction request failed: {err}");
                return Err(err);
            }
        };

        let chart = match ChartSeries::from_probabilities(&response.probabilities) {
            Ok(chart) => chart,
            Err(source) => {
                let err = ScreeningError::PredictionRequest {
                    source: anyhow::Error::new(source)
                        .context("prediction service returned a malformed probability vector"),
                };
                state.error = Some(err.user_message());
                return Err(err);
            }
        };

        info!(
            file = %scan.file_name,
            diagnosis = %response.diagnosis,
            confidence = %response.confidence,
            "prediction received"
        );
        state.prediction = Some(Prediction {
            file_name: response.filename,
            diagnosis: response.diagnosis,
            confidence: response.confidence,
            probabilities: response.probabilities,
        });
        state.heatmap = Some(HeatmapImage {
            base64: response.heatmap_image,
        });
        state.chart = Some(chart);
        Ok(())
    }

    /// Bundles the current selection with its completed prediction and asks
    /// the report service for the PDF. Returns the document; nothing is
    /// written anywhere on failure.
    pub async fn export_report(&self) -> Result<ReportDocument, ScreeningError> {
        let request = {
            let mut state = self.inner.lock().await;
            state.error = None;
            let (scan, prediction, heatmap) = match (
                state.selected.clone(),
                state.prediction.clone(),
                state.heatmap.clone(),
            ) {
                (Some(scan), Some(prediction), Some(heatmap)) => (scan, prediction, heatmap),
                _ => {
                    let err = ScreeningError::Export {
                        source: anyhow!("no completed analysis to export"),
                    };
                    state.error = Some(err.user_message());
                    return Err(err);
                }
            };

            ExportReportRequest {
                filename: scan.file_name.clone(),
                diagnosis: prediction.diagnosis,
                confidence: prediction.confidence,
                probabilities: prediction.probabilities,
                original_image: STANDARD.encode(scan.bytes.as_slice()),
                heatmap_image: heatmap.base64,
            }
        };

        info!(file = %request.filename, "requesting PDF report");
        match self.api.export_report(&request).await {
            Ok(bytes) if !bytes.is_empty() => {
                info!(size_bytes = bytes.len(), "report received");
                Ok(ReportDocument {
                    file_name: domain::REPORT_FILE_NAME,
                    bytes,
                })
            }
            Ok(_) => {
                self.fail(ScreeningError::Export {
                    source: anyhow!("report service returned an empty document"),
                })
                .await
            }
            Err(source) => self.fail(ScreeningError::Export { source }).await,
        }
    }

    async fn fail<T>(&self, err: ScreeningError) -> Result<T, ScreeningError> {
        warn!("screening operation failed: {err}");
        self.inner.lock().await.error = Some(err.user_message());
        Err(err)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
