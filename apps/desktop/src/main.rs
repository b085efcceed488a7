use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{HttpDiagnosticsApi, ScanUpload, ScreeningController};
use shared::domain::{DEFAULT_SERVER_URL, EXAMPLE_GALLERY, REPORT_FILE_NAME};

/// Command-line client for the AuraSight diagnostics service.
#[derive(Parser, Debug)]
struct Args {
    /// Retinal scan to analyze.
    image: Option<PathBuf>,

    /// Analyze a bundled example scan instead of a local file.
    #[arg(long, value_name = "NAME", conflicts_with = "image")]
    example: Option<String>,

    /// Base URL of the diagnostics service.
    #[arg(long, env = "AURASIGHT_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,

    /// Also export the PDF report, optionally to a custom path.
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = REPORT_FILE_NAME)]
    export: Option<PathBuf>,

    /// List the bundled example scans and exit.
    #[arg(long)]
    list_examples: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    if args.list_examples {
        for example in EXAMPLE_GALLERY {
            println!("{:<24} {}", example.file_name, example.caption);
        }
        return Ok(());
    }

    tracing::info!(server_url = %args.server_url, "using diagnostics service");
    let controller = ScreeningController::new(HttpDiagnosticsApi::new(&args.server_url));

    if let Some(name) = &args.example {
        controller.load_example(name).await?;
    } else if let Some(path) = &args.image {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read scan '{}'", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("scan")
            .to_string();
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        controller
            .select_scan(ScanUpload::new(file_name, mime_type, bytes))
            .await;
    } else {
        bail!("provide a scan path or --example <name> (see --list-examples)");
    }

    controller.analyze().await?;
    let snapshot = controller.snapshot().await;
    let prediction = snapshot
        .prediction
        .context("analysis finished without a prediction")?;

    println!("Diagnosis:  {}", prediction.diagnosis);
    println!("Confidence: {}", prediction.confidence);
    println!();
    if let Some(chart) = &snapshot.chart {
        for bar in &chart.bars {
            println!("  {:<18} {:>6.2}%", bar.label, bar.value);
        }
    }

    if let Some(path) = &args.export {
        let document = controller.export_report().await?;
        std::fs::write(path, &document.bytes)
            .with_context(|| format!("failed to write report to '{}'", path.display()))?;
        println!();
        println!("Report saved to {}", path.display());
    }

    Ok(())
}
