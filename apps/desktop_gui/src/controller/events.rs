//! UI/backend events and error modeling for the desktop GUI controller.

use client_core::{ChartSeries, Prediction};

pub enum UiEvent {
    Info(String),
    ScanSelected {
        file_name: String,
        bytes: Vec<u8>,
    },
    AnalysisStarted,
    AnalysisComplete {
        prediction: Prediction,
        chart: ChartSeries,
        heatmap_bytes: Vec<u8>,
    },
    ReportReady {
        file_name: &'static str,
        bytes: Vec<u8>,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Selection,
    ExampleLoad,
    Analysis,
    Export,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    pub category: UiErrorCategory,
    pub context: UiErrorContext,
    pub message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("timed out")
            || message_lower.contains("timeout")
            || message_lower.contains("unreachable")
            || message_lower.contains("reachable")
            || message_lower.contains("disconnect")
            || message_lower.contains("server")
        {
            UiErrorCategory::Transport
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("empty")
            || message_lower.contains("select a retinal scan")
        {
            UiErrorCategory::Validation
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
