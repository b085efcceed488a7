//! UI layer for the desktop GUI: app shell and the backend worker bridge.

pub mod app;

pub use app::{DesktopGuiApp, StartupConfig};
