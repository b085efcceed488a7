use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::domain::{EXAMPLE_GALLERY, REPORT_FILE_NAME};
use tokio::{net::TcpListener, sync::oneshot};

fn scan(file_name: &str) -> ScanUpload {
    ScanUpload::new(file_name, "image/png", b"scan-bytes".to_vec())
}

fn moderate_response() -> PredictResponse {
    PredictResponse {
        filename: "scan.png".to_string(),
        diagnosis: "Moderate".to_string(),
        confidence: "87%".to_string(),
        probabilities: vec![5.0, 10.0, 60.0, 20.0, 5.0],
        heatmap_image: STANDARD.encode(b"gradcam-overlay"),
    }
}

struct PredictGate {
    started: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

fn predict_gate() -> (PredictGate, oneshot::Receiver<()>, oneshot::Sender<()>) {
    let (started_tx, started_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel();
    (
        PredictGate {
            started: started_tx,
            release: release_rx,
        },
        started_rx,
        release_tx,
    )
}

struct TestDiagnosticsApi {
    predict_response: Option<PredictResponse>,
    export_document: Option<Vec<u8>>,
    example_bytes: Option<Vec<u8>>,
    predict_calls: AtomicUsize,
    export_calls: AtomicUsize,
    export_requests: tokio::sync::Mutex<Vec<ExportReportRequest>>,
    predict_gate: std::sync::Mutex<Option<PredictGate>>,
}

impl TestDiagnosticsApi {
    fn ok(predict_response: PredictResponse) -> Self {
        Self {
            predict_response: Some(predict_response),
            export_document: Some(b"%PDF-1.4 stub".to_vec()),
            example_bytes: Some(b"example-image".to_vec()),
            predict_calls: AtomicUsize::new(0),
            export_calls: AtomicUsize::new(0),
            export_requests: tokio::sync::Mutex::new(Vec::new()),
            predict_gate: std::sync::Mutex::new(None),
        }
    }

    fn failing() -> Self {
        Self {
            predict_response: None,
            export_document: None,
            example_bytes: None,
            predict_calls: AtomicUsize::new(0),
            export_calls: AtomicUsize::new(0),
            export_requests: tokio::sync::Mutex::new(Vec::new()),
            predict_gate: std::sync::Mutex::new(None),
        }
    }

    fn with_predict_response(mut self, response: PredictResponse) -> Self {
        self.predict_response = Some(response);
        self
    }

    fn with_failing_export(mut self) -> Self {
        self.export_document = None;
        self
    }

    fn with_failing_examples(mut self) -> Self {
        self.example_bytes = None;
        self
    }

    fn with_predict_gate(self, gate: PredictGate) -> Self {
        *self.predict_gate.lock().expect("gate lock") = Some(gate);
        self
    }
}

#[async_trait]
impl DiagnosticsApi for Arc<TestDiagnosticsApi> {
    async fn predict(&self, _scan: &ScanUpload) -> Result<PredictResponse> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.predict_gate.lock().expect("gate lock").take();
        if let Some(gate) = gate {
            let _ = gate.started.send(());
            let _ = gate.release.await;
        }
        self.predict_response
            .clone()
            .ok_or_else(|| anyhow!("prediction service unavailable"))
    }

    async fn export_report(&self, request: &ExportReportRequest) -> Result<Vec<u8>> {
        self.export_calls.fetch_add(1, Ordering::SeqCst);
        self.export_requests.lock().await.push(request.clone());
        self.export_document
            .clone()
            .ok_or_else(|| anyhow!("report service unavailable"))
    }

    async fn fetch_example(&self, _file_name: &str) -> Result<Vec<u8>> {
        self.example_bytes
            .clone()
            .ok_or_else(|| anyhow!("asset fetch failed"))
    }
}

#[tokio::test]
async fn select_scan_stores_selection_and_preview() {
    let api = Arc::new(TestDiagnosticsApi::ok(moderate_response()));
    let controller = ScreeningController::new(Arc::clone(&api));

    controller.select_scan(scan("left-eye.png")).await;

    let snapshot = controller.snapshot().await;
    let selected = snapshot.selected.expect("selection");
    assert_eq!(selected.file_name, "left-eye.png");
    assert_eq!(selected.mime_type, "image/png");
    let preview = snapshot.preview.expect("preview");
    assert_eq!(preview.file_name, "left-eye.png");
    assert!(Arc::ptr_eq(&preview.bytes, &selected.bytes));
    assert!(!snapshot.is_loading);
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn empty_scan_payload_is_a_no_op() {
    let api = Arc::new(TestDiagnosticsApi::ok(moderate_response()));
    let controller = ScreeningController::new(Arc::clone(&api));

    controller
        .select_scan(ScanUpload::new("empty.png", "image/png", Vec::new()))
        .await;

    let snapshot = controller.snapshot().await;
    assert!(snapshot.selected.is_none());
    assert!(snapshot.preview.is_none());
}

#[tokio::test]
async fn superseded_preview_handles_are_released() {
    let api = Arc::new(TestDiagnosticsApi::ok(moderate_response()));
    let controller = ScreeningController::new(Arc::clone(&api));

    let first = scan("first.png");
    let first_bytes = Arc::downgrade(&first.bytes);
    controller.select_scan(first).await;
    assert!(first_bytes.upgrade().is_some());

    controller.select_scan(scan("second.png")).await;

    assert!(
        first_bytes.upgrade().is_none(),
        "replaced preview buffer must be released"
    );
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.preview.expect("preview").file_name, "second.png");
}

#[tokio::test]
async fn new_selection_clears_previous_results() {
    let api = Arc::new(TestDiagnosticsApi::ok(moderate_response()));
    let controller = ScreeningController::new(Arc::clone(&api));

    controller.select_scan(scan("first.png")).await;
    controller.analyze().await.expect("analyze");
    let snapshot = controller.snapshot().await;
    assert!(snapshot.prediction.is_some());
    assert!(snapshot.heatmap.is_some());
    assert!(snapshot.chart.is_some());

    controller.select_scan(scan("second.png")).await;

    let snapshot = controller.snapshot().await;
    assert!(snapshot.prediction.is_none());
    assert!(snapshot.heatmap.is_none());
    assert!(snapshot.chart.is_none());
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn new_selection_clears_previous_error() {
    let api = Arc::new(TestDiagnosticsApi::failing());
    let controller = ScreeningController::new(Arc::clone(&api));

    controller.select_scan(scan("first.png")).await;
    controller.analyze().await.expect_err("analysis must fail");
    assert!(controller.snapshot().await.error.is_some());

    controller.select_scan(scan("second.png")).await;

    assert!(controller.snapshot().await.error.is_none());
}

#[tokio::test]
async fn analyze_without_selection_never_contacts_the_service() {
    let api = Arc::new(TestDiagnosticsApi::ok(moderate_response()));
    let controller = ScreeningController::new(Arc::clone(&api));

    let err = controller.analyze().await.expect_err("must fail");

    assert!(matches!(err, ScreeningError::NoScanSelected));
    assert_eq!(api.predict_calls.load(Ordering::SeqCst), 0);
    let snapshot = controller.snapshot().await;
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.error.expect("error"), err.user_message());
}

#[tokio::test]
async fn analyze_populates_prediction_heatmap_and_chart() {
    let api = Arc::new(TestDiagnosticsApi::ok(moderate_response()));
    let controller = ScreeningController::new(Arc::clone(&api));

    controller.select_scan(scan("scan.png")).await;
    controller.analyze().await.expect("analyze");

    let snapshot = controller.snapshot().await;
    let prediction = snapshot.prediction.expect("prediction");
    assert_eq!(prediction.diagnosis, "Moderate");
    assert_eq!(prediction.confidence, "87%");
    assert_eq!(prediction.category(), Some(DrCategory::Moderate));

    let chart = snapshot.chart.expect("chart");
    assert_eq!(chart.bars.len(), 5);
    assert_eq!(chart.bars[2].label, "Moderate");
    assert_eq!(chart.bars[2].value, 60.0);

    let heatmap = snapshot.heatmap.expect("heatmap");
    assert_eq!(heatmap.decode().expect("decode"), b"gradcam-overlay");

    assert!(!snapshot.is_loading);
    assert!(snapshot.error.is_none());
    assert_eq!(api.predict_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn analyze_failure_sets_generic_error_and_settles_loading() {
    let api = Arc::new(TestDiagnosticsApi::failing());
    let controller = ScreeningController::new(Arc::clone(&api));

    controller.select_scan(scan("scan.png")).await;
    let err = controller.analyze().await.expect_err("must fail");

    assert!(matches!(err, ScreeningError::PredictionRequest { .. }));
    let snapshot = controller.snapshot().await;
    assert!(snapshot.prediction.is_none());
    assert!(snapshot.chart.is_none());
    assert!(!snapshot.is_loading);
    assert!(snapshot
        .error
        .expect("error")
        .starts_with("Failed to get a prediction"));
}

#[tokio::test]
async fn analyze_rejects_malformed_probability_vector() {
    let mut response = moderate_response();
    response.probabilities = vec![1.0, 2.0, 3.0];
    let api = Arc::new(TestDiagnosticsApi::ok(response));
    let controller = ScreeningController::new(Arc::clone(&api));

    controller.select_scan(scan("scan.png")).await;
    let err = controller.analyze().await.expect_err("must fail");

    assert!(matches!(err, ScreeningError::PredictionRequest { .. }));
    let snapshot = controller.snapshot().await;
    assert!(snapshot.prediction.is_none());
    assert!(snapshot.chart.is_none());
    assert!(!snapshot.is_loading);
}

#[tokio::test]
async fn loading_flag_tracks_request_lifetime() {
    let (gate, started_rx, release_tx) = predict_gate();
    let api = Arc::new(TestDiagnosticsApi::ok(moderate_response()).with_predict_gate(gate));
    let controller = Arc::new(ScreeningController::new(Arc::clone(&api)));

    controller.select_scan(scan("scan.png")).await;
    assert!(!controller.snapshot().await.is_loading);

    let task = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.analyze().await }
    });
    started_rx.await.expect("predict started");
    assert!(controller.snapshot().await.is_loading);

    release_tx.send(()).expect("release predict");
    task.await.expect("join").expect("analyze");
    assert!(!controller.snapshot().await.is_loading);
}

#[tokio::test]
async fn analyze_discards_stale_response_after_new_selection() {
    let (gate, started_rx, release_tx) = predict_gate();
    let api = Arc::new(TestDiagnosticsApi::ok(moderate_response()).with_predict_gate(gate));
    let controller = Arc::new(ScreeningController::new(Arc::clone(&api)));

    controller.select_scan(scan("first.png")).await;
    let task = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.analyze().await }
    });
    started_rx.await.expect("predict started");

    controller.select_scan(scan("second.png")).await;
    release_tx.send(()).expect("release predict");
    task.await.expect("join").expect("stale analyze settles cleanly");

    let snapshot = controller.snapshot().await;
    assert!(
        snapshot.prediction.is_none(),
        "a response for a superseded scan must not surface"
    );
    assert!(snapshot.chart.is_none());
    assert!(snapshot.error.is_none());
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.preview.expect("preview").file_name, "second.png");
}

#[tokio::test]
async fn export_bundles_scan_and_prediction() {
    let api = Arc::new(TestDiagnosticsApi::ok(moderate_response()));
    let controller = ScreeningController::new(Arc::clone(&api));

    controller.select_scan(scan("scan.png")).await;
    controller.analyze().await.expect("analyze");
    let document = controller.export_report().await.expect("export");

    assert_eq!(document.file_name, REPORT_FILE_NAME);
    assert_eq!(document.bytes, b"%PDF-1.4 stub".to_vec());

    let requests = api.export_requests.lock().await;
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.filename, "scan.png");
    assert_eq!(request.diagnosis, "Moderate");
    assert_eq!(request.confidence, "87%");
    assert_eq!(request.probabilities, vec![5.0, 10.0, 60.0, 20.0, 5.0]);
    assert_eq!(request.original_image, STANDARD.encode(b"scan-bytes"));
    assert_eq!(request.heatmap_image, moderate_response().heatmap_image);
}

#[tokio::test]
async fn failed_export_yields_no_document_and_keeps_result() {
    let api = Arc::new(TestDiagnosticsApi::ok(moderate_response()).with_failing_export());
    let controller = ScreeningController::new(Arc::clone(&api));

    controller.select_scan(scan("scan.png")).await;
    controller.analyze().await.expect("analyze");
    let err = controller.export_report().await.expect_err("must fail");

    assert!(matches!(err, ScreeningError::Export { .. }));
    let snapshot = controller.snapshot().await;
    assert!(
        snapshot.prediction.is_some(),
        "a failed export must not disturb the result state"
    );
    assert!(snapshot
        .error
        .expect("error")
        .starts_with("Failed to export"));
}

#[tokio::test]
async fn export_without_analysis_fails_locally() {
    let api = Arc::new(TestDiagnosticsApi::ok(moderate_response()));
    let controller = ScreeningController::new(Arc::clone(&api));

    controller.select_scan(scan("scan.png")).await;
    let err = controller.export_report().await.expect_err("must fail");

    assert!(matches!(err, ScreeningError::Export { .. }));
    assert_eq!(api.export_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn load_example_selects_fetched_asset_as_png() {
    let api = Arc::new(TestDiagnosticsApi::ok(moderate_response()));
    let controller = ScreeningController::new(Arc::clone(&api));

    controller
        .load_example("example_moderate.png")
        .await
        .expect("load example");

    let snapshot = controller.snapshot().await;
    let selected = snapshot.selected.expect("selection");
    assert_eq!(selected.file_name, "example_moderate.png");
    assert_eq!(selected.mime_type, "image/png");
    assert_eq!(*selected.bytes, b"example-image".to_vec());
    assert!(snapshot.prediction.is_none());
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn load_example_failure_preserves_selection() {
    let api = Arc::new(TestDiagnosticsApi::ok(moderate_response()).with_failing_examples());
    let controller = ScreeningController::new(Arc::clone(&api));

    controller.select_scan(scan("scan.png")).await;
    controller.analyze().await.expect("analyze");

    let err = controller
        .load_example("example_no_dr.png")
        .await
        .expect_err("must fail");

    assert!(matches!(err, ScreeningError::AssetLoad { .. }));
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.selected.expect("selection").file_name, "scan.png");
    assert_eq!(snapshot.preview.expect("preview").file_name, "scan.png");
    assert!(
        snapshot.prediction.is_some(),
        "a failed example fetch must not disturb prior state"
    );
    assert!(snapshot
        .error
        .expect("error")
        .starts_with("Could not load the example image"));
}

// HTTP round trips against a mock diagnostics service: a real axum server
// on an ephemeral port.

#[derive(Clone)]
struct DiagnosticsServerState {
    export_tx: Arc<tokio::sync::Mutex<Option<oneshot::Sender<ExportReportRequest>>>>,
}

async fn handle_predict(mut multipart: Multipart) -> Result<Json<PredictResponse>, StatusCode> {
    let mut file_name = None;
    let mut file_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(str::to_string);
            file_bytes = Some(field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?);
        }
    }

    let bytes = file_bytes.ok_or(StatusCode::BAD_REQUEST)?;
    if bytes.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(PredictResponse {
        filename: file_name.unwrap_or_default(),
        diagnosis: "Moderate".to_string(),
        confidence: "87%".to_string(),
        probabilities: vec![5.0, 10.0, 60.0, 20.0, 5.0],
        heatmap_image: STANDARD.encode(b"gradcam-overlay"),
    }))
}

async fn handle_export(
    State(state): State<DiagnosticsServerState>,
    Json(request): Json<ExportReportRequest>,
) -> Vec<u8> {
    if let Some(tx) = state.export_tx.lock().await.take() {
        let _ = tx.send(request);
    }
    b"%PDF-1.4 aurasight".to_vec()
}

async fn handle_example(Path(name): Path<String>) -> Result<Vec<u8>, StatusCode> {
    if shared::domain::example_by_name(&name).is_some() {
        Ok(b"example-scan-bytes".to_vec())
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn spawn_diagnostics_server() -> Result<(String, oneshot::Receiver<ExportReportRequest>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    let state = DiagnosticsServerState {
        export_tx: Arc::new(tokio::sync::Mutex::new(Some(tx))),
    };
    let app = Router::new()
        .route("/predict", post(handle_predict))
        .route("/export_pdf", post(handle_export))
        .route("/examples/:name", get(handle_example))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), rx))
}

async fn spawn_unavailable_server() -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new().route(
        "/predict",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn analyze_and_export_against_mock_service() {
    let (server_url, export_rx) = spawn_diagnostics_server().await.expect("spawn server");
    let controller = ScreeningController::new(HttpDiagnosticsApi::new(server_url));

    controller.select_scan(scan("scan.png")).await;
    controller.analyze().await.expect("analyze");

    let snapshot = controller.snapshot().await;
    let prediction = snapshot.prediction.expect("prediction");
    assert_eq!(prediction.file_name, "scan.png");
    assert_eq!(prediction.diagnosis, "Moderate");
    assert_eq!(prediction.confidence, "87%");
    assert_eq!(snapshot.chart.expect("chart").bars.len(), 5);
    assert_eq!(
        snapshot.heatmap.expect("heatmap").decode().expect("decode"),
        b"gradcam-overlay"
    );
    assert!(!snapshot.is_loading);
    assert!(snapshot.error.is_none());

    let document = controller.export_report().await.expect("export");
    assert_eq!(document.file_name, REPORT_FILE_NAME);
    assert_eq!(document.bytes, b"%PDF-1.4 aurasight".to_vec());

    let request = export_rx.await.expect("export payload");
    assert_eq!(request.filename, "scan.png");
    assert_eq!(request.diagnosis, "Moderate");
    assert_eq!(request.original_image, STANDARD.encode(b"scan-bytes"));
    assert_eq!(request.heatmap_image, STANDARD.encode(b"gradcam-overlay"));
}

#[tokio::test]
async fn gallery_examples_are_fetchable() {
    let (server_url, _export_rx) = spawn_diagnostics_server().await.expect("spawn server");
    let controller = ScreeningController::new(HttpDiagnosticsApi::new(server_url));

    controller
        .load_example(EXAMPLE_GALLERY[0].file_name)
        .await
        .expect("load example");

    let selected = controller.snapshot().await.selected.expect("selection");
    assert_eq!(selected.file_name, EXAMPLE_GALLERY[0].file_name);
    assert_eq!(*selected.bytes, b"example-scan-bytes".to_vec());
}

#[tokio::test]
async fn missing_example_maps_to_asset_error() {
    let (server_url, _export_rx) = spawn_diagnostics_server().await.expect("spawn server");
    let controller = ScreeningController::new(HttpDiagnosticsApi::new(server_url));

    let err = controller
        .load_example("not_in_gallery.png")
        .await
        .expect_err("must fail");

    assert!(matches!(err, ScreeningError::AssetLoad { .. }));
    let snapshot = controller.snapshot().await;
    assert!(snapshot.selected.is_none());
    assert!(snapshot.error.is_some());
}

#[tokio::test]
async fn server_error_surfaces_generic_prediction_message() {
    let server_url = spawn_unavailable_server().await.expect("spawn server");
    let controller = ScreeningController::new(HttpDiagnosticsApi::new(server_url));

    controller.select_scan(scan("scan.png")).await;
    let err = controller.analyze().await.expect_err("must fail");

    assert!(matches!(err, ScreeningError::PredictionRequest { .. }));
    let snapshot = controller.snapshot().await;
    assert!(snapshot
        .error
        .expect("error")
        .starts_with("Failed to get a prediction"));
    assert!(!snapshot.is_loading);
}
