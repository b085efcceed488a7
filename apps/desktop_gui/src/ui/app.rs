use std::{fs, thread};

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::{RichText, TextureHandle};
use image::GenericImageView;
use serde::{Deserialize, Serialize};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorCategory, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use client_core::{
    ChartSeries, HttpDiagnosticsApi, Prediction, ScanUpload, ScreeningController,
};
use shared::domain::{DEFAULT_SERVER_URL, EXAMPLE_GALLERY};

const SETTINGS_STORAGE_KEY: &str = "aurasight.desktop.settings";
const PREVIEW_MAX_DIMENSION: f32 = 360.0;

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub server_url: String,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedDesktopSettings {
    server_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

fn server_environment_label(server_url: &str) -> &'static str {
    let server = server_url.to_ascii_lowercase();
    if server.contains("127.0.0.1") || server.contains("localhost") {
        "Local"
    } else if server.contains("staging") {
        "Staging"
    } else if server.contains("dev") {
        "Development"
    } else {
        "Production"
    }
}

fn format_scaled_unit(bytes: u64, unit: u64, suffix: &str) -> String {
    let scaled = bytes as f64 / unit as f64;
    if (scaled - scaled.round()).abs() < 0.05 {
        format!("{:.0} {suffix}", scaled.round())
    } else {
        format!("{scaled:.1} {suffix}")
    }
}

fn human_readable_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        return format!("{bytes} B");
    }
    if bytes < MB {
        return format_scaled_unit(bytes, KB, "KB");
    }
    if bytes < GB {
        return format_scaled_unit(bytes, MB, "MB");
    }
    format_scaled_unit(bytes, GB, "GB")
}

struct PreviewImage {
    texture: TextureHandle,
    size: egui::Vec2,
}

fn load_scan_texture(
    ctx: &egui::Context,
    name: &str,
    bytes: &[u8],
    max_dimension: f32,
) -> Option<PreviewImage> {
    let decoded = image::load_from_memory(bytes).ok()?;
    let (orig_w, orig_h) = decoded.dimensions();
    let scale = (max_dimension / (orig_w.max(orig_h) as f32)).min(1.0);
    let resized = if scale < 1.0 {
        decoded.resize(
            (orig_w as f32 * scale).max(1.0) as u32,
            (orig_h as f32 * scale).max(1.0) as u32,
            image::imageops::FilterType::Triangle,
        )
    } else {
        decoded
    };
    let rgba = resized.to_rgba8();
    let [w, h] = [rgba.width() as usize, rgba.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied([w, h], rgba.as_raw());
    let texture = ctx.load_texture(
        format!("scan-texture:{name}"),
        color_image,
        egui::TextureOptions::LINEAR,
    );
    Some(PreviewImage {
        texture,
        size: egui::vec2(w as f32, h as f32),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResultView {
    Heatmap,
    Original,
}

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    server_url: String,
    applied_server_url: String,
    status: String,
    banner: Option<StatusBanner>,
    selected_file_name: Option<String>,
    selected_size_bytes: u64,
    preview: Option<PreviewImage>,
    prediction: Option<Prediction>,
    chart: Option<ChartSeries>,
    heatmap: Option<PreviewImage>,
    is_loading: bool,
    result_view: ResultView,
}

impl DesktopGuiApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        startup: StartupConfig,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
    ) -> Self {
        let persisted = cc.storage.and_then(|storage| {
            storage
                .get_string(SETTINGS_STORAGE_KEY)
                .and_then(|text| serde_json::from_str::<PersistedDesktopSettings>(&text).ok())
        });

        // An explicit URL on the command line wins over the persisted one.
        let mut server_url = startup.server_url.clone();
        if startup.server_url == DEFAULT_SERVER_URL {
            if let Some(persisted) = persisted {
                server_url = persisted.server_url;
            }
        }

        let mut status = "Starting backend worker...".to_string();
        if server_url != startup.server_url {
            dispatch_backend_command(
                &cmd_tx,
                BackendCommand::SetServerUrl {
                    server_url: server_url.clone(),
                },
                &mut status,
            );
        }

        Self {
            cmd_tx,
            ui_rx,
            applied_server_url: server_url.clone(),
            server_url,
            status,
            banner: None,
            selected_file_name: None,
            selected_size_bytes: 0,
            preview: None,
            prediction: None,
            chart: None,
            heatmap: None,
            is_loading: false,
            result_view: ResultView::Heatmap,
        }
    }

    fn reset_session_state(&mut self) {
        self.selected_file_name = None;
        self.selected_size_bytes = 0;
        self.preview = None;
        self.prediction = None;
        self.chart = None;
        self.heatmap = None;
        self.is_loading = false;
        self.banner = None;
        self.result_view = ResultView::Heatmap;
    }

    fn process_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            // Commands are drained serially by the bridge, so any event other
            // than the start marker means the outstanding one has settled.
            if !matches!(event, UiEvent::AnalysisStarted) {
                self.is_loading = false;
            }
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::ScanSelected { file_name, bytes } => {
                    self.prediction = None;
                    self.chart = None;
                    self.heatmap = None;
                    self.banner = None;
                    self.result_view = ResultView::Heatmap;
                    self.selected_size_bytes = bytes.len() as u64;
                    self.preview =
                        load_scan_texture(ctx, &file_name, &bytes, PREVIEW_MAX_DIMENSION);
                    if self.preview.is_none() {
                        self.banner = Some(StatusBanner {
                            severity: StatusBannerSeverity::Error,
                            message: format!("Could not decode '{file_name}' for preview"),
                        });
                    }
                    self.status = format!(
                        "Selected {file_name} ({})",
                        human_readable_bytes(bytes.len() as u64)
                    );
                    self.selected_file_name = Some(file_name);
                }
                UiEvent::AnalysisStarted => {
                    self.is_loading = true;
                    self.status = "Analyzing scan...".to_string();
                }
                UiEvent::AnalysisComplete {
                    prediction,
                    chart,
                    heatmap_bytes,
                } => {
                    self.heatmap = load_scan_texture(
                        ctx,
                        "model-focus-heatmap",
                        &heatmap_bytes,
                        PREVIEW_MAX_DIMENSION,
                    );
                    self.result_view = if self.heatmap.is_some() {
                        ResultView::Heatmap
                    } else {
                        ResultView::Original
                    };
                    self.status = format!(
                        "Diagnosis: {} ({})",
                        prediction.diagnosis, prediction.confidence
                    );
                    self.prediction = Some(prediction);
                    self.chart = Some(chart);
                }
                UiEvent::ReportReady { file_name, bytes } => {
                    self.save_report_bytes(file_name, &bytes);
                }
                UiEvent::Error(err) => {
                    tracing::warn!(
                        context = ?err.context,
                        category = ?err.category,
                        "ui error: {}",
                        err.message()
                    );
                    self.status = err.message().to_string();
                    self.banner = Some(StatusBanner {
                        severity: StatusBannerSeverity::Error,
                        message: format!("{}: {}", err_label(err.category), err.message()),
                    });
                }
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        if self.is_loading {
            self.status = "Analysis in progress; drop ignored".to_string();
            return;
        }

        if let Some(path) = file.path {
            dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::SelectScanFile { path },
                &mut self.status,
            );
        } else if let Some(bytes) = file.bytes {
            let file_name = if file.name.is_empty() {
                "dropped-scan".to_string()
            } else {
                file.name.clone()
            };
            let mime_type = if file.mime.is_empty() {
                mime_guess::from_path(&file_name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            } else {
                file.mime.clone()
            };
            dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::SelectScanBytes {
                    file_name,
                    mime_type,
                    bytes: bytes.to_vec(),
                },
                &mut self.status,
            );
        }
    }

    fn save_report_bytes(&mut self, suggested_name: &str, bytes: &[u8]) {
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(suggested_name)
            .save_file()
        {
            match fs::write(&path, bytes) {
                Ok(()) => {
                    self.status = format!("Report saved to {}", path.display());
                }
                Err(err) => {
                    self.status = format!("Failed to save report: {err}");
                    self.banner = Some(StatusBanner {
                        severity: StatusBannerSeverity::Error,
                        message: format!("Export: failed to save report: {err}"),
                    });
                }
            }
        } else {
            self.status = "Report export canceled".to_string();
        }
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top-bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("AuraSight").strong().size(18.0));
                ui.label(RichText::new("retinal screening").weak());
                ui.separator();
                ui.label("Service:");
                ui.add(egui::TextEdit::singleline(&mut self.server_url).desired_width(240.0));
                let dirty = self.server_url.trim() != self.applied_server_url;
                let apply = ui.add_enabled(
                    dirty && !self.is_loading && !self.server_url.trim().is_empty(),
                    egui::Button::new("Apply"),
                );
                if apply.clicked() {
                    let server_url = self.server_url.trim().to_string();
                    self.applied_server_url = server_url.clone();
                    self.reset_session_state();
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::SetServerUrl { server_url },
                        &mut self.status,
                    );
                }
                ui.label(
                    RichText::new(server_environment_label(&self.applied_server_url)).weak(),
                );
            });
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status-bar").show(ctx, |ui| {
            if let Some(banner) = self.banner.clone() {
                ui.horizontal(|ui| {
                    let color = match banner.severity {
                        StatusBannerSeverity::Error => egui::Color32::from_rgb(222, 82, 82),
                    };
                    ui.label(RichText::new(&banner.message).color(color));
                    if ui.small_button("Dismiss").clicked() {
                        self.banner = None;
                    }
                });
            }
            ui.label(&self.status);
        });
    }

    fn show_upload_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Retinal scan");
        ui.add_space(6.0);

        let hovering_files = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
        let (zone, _) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), 110.0),
            egui::Sense::hover(),
        );
        let zone_fill = if hovering_files {
            ui.visuals().selection.bg_fill
        } else {
            ui.visuals().faint_bg_color
        };
        ui.painter()
            .rect_filled(zone, egui::CornerRadius::same(8), zone_fill);
        ui.painter().text(
            zone.center(),
            egui::Align2::CENTER_CENTER,
            "Drop a retinal scan anywhere in the window",
            egui::TextStyle::Body.resolve(ui.style()),
            ui.visuals().text_color(),
        );

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let browse = ui.add_enabled(!self.is_loading, egui::Button::new("Browse..."));
            if browse.clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Images", &["png", "jpg", "jpeg", "webp", "bmp", "gif"])
                    .pick_file()
                {
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::SelectScanFile { path },
                        &mut self.status,
                    );
                }
            }

            ui.separator();
            ui.label("Examples:");
            for example in EXAMPLE_GALLERY {
                let button =
                    ui.add_enabled(!self.is_loading, egui::Button::new(example.caption));
                if button.on_hover_text(example.file_name).clicked() {
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::LoadExample {
                            file_name: example.file_name.to_string(),
                        },
                        &mut self.status,
                    );
                }
            }
        });

        ui.add_space(10.0);
        if let Some(file_name) = self.selected_file_name.clone() {
            ui.label(format!(
                "{file_name} ({})",
                human_readable_bytes(self.selected_size_bytes)
            ));
            if let Some(preview) = &self.preview {
                ui.add(egui::Image::new(&preview.texture).fit_to_exact_size(preview.size));
            }

            ui.add_space(8.0);
            let analyze = ui.add_enabled(
                !self.is_loading,
                egui::Button::new(RichText::new("Analyze scan").strong()),
            );
            if analyze.clicked() {
                dispatch_backend_command(&self.cmd_tx, BackendCommand::Analyze, &mut self.status);
            }
        } else {
            ui.label(RichText::new("No scan selected yet.").weak());
        }
    }

    fn show_results_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Analysis");
        ui.add_space(6.0);

        if self.is_loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Contacting the analysis service...");
            });
            return;
        }

        let Some(prediction) = self.prediction.clone() else {
            ui.label(RichText::new(
                "Run an analysis to see the diagnosis, confidence, and model focus heatmap.",
            )
            .weak());
            return;
        };

        ui.label(RichText::new(&prediction.diagnosis).size(26.0).strong());
        ui.label(format!("Confidence: {}", prediction.confidence));
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.result_view, ResultView::Heatmap, "Model focus");
            ui.selectable_value(&mut self.result_view, ResultView::Original, "Original scan");
        });
        let shown = match self.result_view {
            ResultView::Heatmap => self.heatmap.as_ref(),
            ResultView::Original => self.preview.as_ref(),
        };
        if let Some(image) = shown {
            ui.add(egui::Image::new(&image.texture).fit_to_exact_size(image.size));
        } else {
            ui.label(RichText::new("Image unavailable.").weak());
        }

        ui.add_space(10.0);
        if let Some(chart) = self.chart.clone() {
            draw_probability_chart(ui, &chart);
        }

        ui.add_space(10.0);
        let export = ui.add_enabled(
            !self.is_loading,
            egui::Button::new("Export PDF report..."),
        );
        if export.clicked() {
            dispatch_backend_command(&self.cmd_tx, BackendCommand::ExportReport, &mut self.status);
        }
    }
}

fn draw_probability_chart(ui: &mut egui::Ui, chart: &ChartSeries) {
    let max_value = chart.max_value().max(f32::EPSILON);
    for bar in &chart.bars {
        ui.horizontal(|ui| {
            ui.add_sized([120.0, 16.0], egui::Label::new(bar.label));
            let desired = egui::vec2((ui.available_width() - 64.0).max(40.0), 12.0);
            let (rect, _) = ui.allocate_exact_size(desired, egui::Sense::hover());
            ui.painter()
                .rect_filled(rect, egui::CornerRadius::same(3), ui.visuals().faint_bg_color);
            let fraction = (bar.value / max_value).clamp(0.0, 1.0);
            let filled =
                egui::Rect::from_min_size(rect.min, egui::vec2(rect.width() * fraction, rect.height()));
            ui.painter().rect_filled(
                filled,
                egui::CornerRadius::same(3),
                egui::Color32::from_rgb(88, 134, 214),
            );
            ui.label(format!("{:>6.2}%", bar.value));
        });
    }
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events(ctx);
        self.handle_dropped_files(ctx);

        self.show_top_bar(ctx);
        self.show_status_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.columns(2, |columns| {
                    self.show_upload_panel(&mut columns[0]);
                    self.show_results_panel(&mut columns[1]);
                });
            });
        });

        let delay = if self.is_loading { 100 } else { 500 };
        ctx.request_repaint_after(std::time::Duration::from_millis(delay));
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedDesktopSettings {
            server_url: self.applied_server_url.clone(),
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

pub fn start_backend_bridge(
    startup: StartupConfig,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let mut controller =
                ScreeningController::new(HttpDiagnosticsApi::new(&startup.server_url));
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::SetServerUrl { server_url } => {
                        tracing::info!(server_url = %server_url, "backend: set_server_url");
                        controller =
                            ScreeningController::new(HttpDiagnosticsApi::new(&server_url));
                        let _ = ui_tx.try_send(UiEvent::Info(format!(
                            "Using diagnostics service at {server_url}"
                        )));
                    }
                    BackendCommand::SelectScanFile { path } => {
                        tracing::info!(path = %path.display(), "backend: select_scan_file");
                        match tokio::fs::read(&path).await {
                            Ok(bytes) => {
                                let file_name = path
                                    .file_name()
                                    .and_then(|name| name.to_str())
                                    .unwrap_or("scan")
                                    .to_string();
                                let mime_type = mime_guess::from_path(&path)
                                    .first_or_octet_stream()
                                    .essence_str()
                                    .to_string();
                                controller
                                    .select_scan(ScanUpload::new(file_name, mime_type, bytes))
                                    .await;
                                publish_selection(&controller, &ui_tx).await;
                            }
                            Err(err) => {
                                tracing::error!(path = %path.display(), "backend: scan read failed: {err}");
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::Selection,
                                    format!("failed to read '{}': {err}", path.display()),
                                )));
                            }
                        }
                    }
                    BackendCommand::SelectScanBytes {
                        file_name,
                        mime_type,
                        bytes,
                    } => {
                        tracing::info!(file = %file_name, size_bytes = bytes.len(), "backend: select_scan_bytes");
                        controller
                            .select_scan(ScanUpload::new(file_name, mime_type, bytes))
                            .await;
                        publish_selection(&controller, &ui_tx).await;
                    }
                    BackendCommand::LoadExample { file_name } => {
                        tracing::info!(file = %file_name, "backend: load_example");
                        match controller.load_example(&file_name).await {
                            Ok(()) => publish_selection(&controller, &ui_tx).await,
                            Err(err) => {
                                tracing::error!("backend: load_example failed: {err:#}");
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::ExampleLoad,
                                    err.user_message(),
                                )));
                            }
                        }
                    }
                    BackendCommand::Analyze => {
                        let _ = ui_tx.try_send(UiEvent::AnalysisStarted);
                        match controller.analyze().await {
                            Ok(()) => {
                                let snapshot = controller.snapshot().await;
                                match (snapshot.prediction, snapshot.chart, snapshot.heatmap) {
                                    (Some(prediction), Some(chart), Some(heatmap)) => {
                                        match heatmap.decode() {
                                            Ok(heatmap_bytes) => {
                                                let _ = ui_tx.try_send(UiEvent::AnalysisComplete {
                                                    prediction,
                                                    chart,
                                                    heatmap_bytes,
                                                });
                                            }
                                            Err(err) => {
                                                let _ = ui_tx.try_send(UiEvent::Error(
                                                    UiError::from_message(
                                                        UiErrorContext::Analysis,
                                                        format!(
                                                            "heatmap payload unreadable: {err:#}"
                                                        ),
                                                    ),
                                                ));
                                            }
                                        }
                                    }
                                    _ => {
                                        let _ = ui_tx.try_send(UiEvent::Info(
                                            "Analysis superseded by a newer selection".to_string(),
                                        ));
                                    }
                                }
                            }
                            Err(err) => {
                                tracing::error!("backend: analyze failed: {err:#}");
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::Analysis,
                                    err.user_message(),
                                )));
                            }
                        }
                    }
                    BackendCommand::ExportReport => {
                        match controller.export_report().await {
                            Ok(document) => {
                                let _ = ui_tx.try_send(UiEvent::ReportReady {
                                    file_name: document.file_name,
                                    bytes: document.bytes,
                                });
                            }
                            Err(err) => {
                                tracing::error!("backend: export_report failed: {err:#}");
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::Export,
                                    err.user_message(),
                                )));
                            }
                        }
                    }
                }
            }
        });
    });
}

async fn publish_selection(
    controller: &ScreeningController<HttpDiagnosticsApi>,
    ui_tx: &Sender<UiEvent>,
) {
    let snapshot = controller.snapshot().await;
    if let Some(preview) = snapshot.preview {
        let _ = ui_tx.try_send(UiEvent::ScanSelected {
            file_name: preview.file_name,
            bytes: preview.bytes.as_ref().clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{human_readable_bytes, server_environment_label};
    use crate::controller::events::{UiError, UiErrorCategory, UiErrorContext};

    #[test]
    fn formats_scan_sizes_readably() {
        assert_eq!(human_readable_bytes(0), "0 B");
        assert_eq!(human_readable_bytes(1023), "1023 B");
        assert_eq!(human_readable_bytes(1024), "1 KB");
        assert_eq!(human_readable_bytes(1536), "1.5 KB");
        assert_eq!(human_readable_bytes(2 * 1024 * 1024), "2 MB");
    }

    #[test]
    fn classifies_unreachable_service_as_transport_error() {
        let err = UiError::from_message(
            UiErrorContext::Analysis,
            "Failed to get a prediction. Make sure the analysis service is reachable and try again.",
        );
        assert_eq!(err.category, UiErrorCategory::Transport);
    }

    #[test]
    fn classifies_missing_selection_as_validation_error() {
        let err = UiError::from_message(
            UiErrorContext::Analysis,
            "Please select a retinal scan before starting the analysis.",
        );
        assert_eq!(err.category, UiErrorCategory::Validation);
    }

    #[test]
    fn labels_server_environments() {
        assert_eq!(server_environment_label("http://127.0.0.1:8000"), "Local");
        assert_eq!(
            server_environment_label("https://staging.aurasight.example"),
            "Staging"
        );
        assert_eq!(
            server_environment_label("https://api.aurasight.example"),
            "Production"
        );
    }
}
