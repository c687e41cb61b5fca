//! One-shot booth session from the command line.
//!
//! Reads a capture frame from disk, runs it through the same pipeline the
//! server uses, and prints the resulting delivery as JSON. Useful for checking
//! filters and the overlay at an event site without the kiosk.

use photo_booth::{
    app_state::AppState,
    config::AppConfig,
    models::generation::{AspectRatio, GenerationDraft},
    services::compositor::normalize_capture,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: booth <image-path> <filter-id> [gender] [capture-mode] [ratio]";
const DEFAULT_CAPTURE_MODE: u32 = 1;

struct Args {
    image_path: String,
    filter_id: u32,
    gender: u8,
    capture_mode: u32,
    ratio: AspectRatio,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let image_path = args.next().ok_or("missing <image-path>")?;
    let filter_id = args
        .next()
        .ok_or("missing <filter-id>")?
        .parse()
        .map_err(|e| format!("invalid filter id: {e}"))?;
    let gender = match args.next() {
        Some(value) => value.parse().map_err(|e| format!("invalid gender: {e}"))?,
        None => 0,
    };
    let capture_mode = match args.next() {
        Some(value) => value.parse().map_err(|e| format!("invalid capture mode: {e}"))?,
        None => DEFAULT_CAPTURE_MODE,
    };
    let ratio = match args.next() {
        Some(value) => value.parse().map_err(|_| format!("invalid ratio: {value}"))?,
        None => AspectRatio::Portrait,
    };

    Ok(Args {
        image_path,
        filter_id,
        gender,
        capture_mode,
        ratio,
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            std::process::exit(2);
        }
    };

    let config = AppConfig::from_env().expect("Failed to load configuration");

    let frame = tokio::fs::read(&args.image_path)
        .await
        .expect("Failed to read capture image");
    let base64 = normalize_capture(&frame, args.ratio).expect("Failed to normalize capture");

    let shutdown = CancellationToken::new();
    let state =
        AppState::from_config(&config, shutdown.clone()).expect("Failed to initialize services");

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling session");
            ctrl_c.cancel();
        }
    });

    let draft = GenerationDraft {
        base64: Some(base64),
        filter_id: Some(args.filter_id),
        gender: Some(args.gender),
        capture_mode: Some(args.capture_mode),
        ratio: Some(args.ratio.to_string()),
    };

    match state.pipeline.run(draft, &shutdown).await {
        Ok(delivery) => match serde_json::to_string_pretty(&delivery) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("failed to render delivery: {e}");
                std::process::exit(1);
            }
        },
        Err(e) => {
            tracing::error!(code = e.code(), error = %e, "Booth session failed");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
