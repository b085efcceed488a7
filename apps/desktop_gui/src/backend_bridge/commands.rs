//! Backend commands queued from UI to the screening worker.

use std::path::PathBuf;

pub enum BackendCommand {
    SetServerUrl {
        server_url: String,
    },
    SelectScanFile {
        path: PathBuf,
    },
    SelectScanBytes {
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
    LoadExample {
        file_name: String,
    },
    Analyze,
    ExportReport,
}
