//! Galleyscan Scanner Binary
//!
//! Runs the scan pipeline end to end against the synthetic camera and a
//! scripted decoder, printing scan events as they arrive. Real camera and
//! decoder backends plug in through the same traits.
//!
//! ## Usage
//!
//! ```bash
//! # Build with the synthetic sources
//! cargo run --bin galleyscan-scanner --features test-source
//!
//! # Domestic narrow-body context, custom payload
//! GALLEYSCAN_FLIGHT_TYPE=domestic \
//! GALLEYSCAN_AIRCRAFT="Airbus A320" \
//! GALLEYSCAN_PAYLOAD='{"expiry":"2026-09-01","productId":"C-117","name":"Caesar Wrap"}' \
//! cargo run --bin galleyscan-scanner --features test-source
//!
//! # Scan until Ctrl-C instead of exiting after the demo window
//! GALLEYSCAN_SCAN_SECS=0 cargo run --bin galleyscan-scanner --features test-source
//! ```

use anyhow::Result;
use tracing::info;

use galleyscan::{FlightContext, FlightType};

#[cfg(feature = "test-source")]
use galleyscan::{OverlayColor, Point, RenderTarget};

/// Scanner configuration from environment
struct Config {
    /// Flight context the classifier starts with
    context: FlightContext,
    /// Payload the scripted decoder reports
    payload: String,
    /// How long to scan before exiting (0 = until Ctrl-C)
    scan_secs: u64,
    /// Render loop cadence in milliseconds
    refresh_ms: u64,
}

impl Config {
    fn from_env() -> Result<Self> {
        let flight_type = match std::env::var("GALLEYSCAN_FLIGHT_TYPE") {
            Ok(value) => match value.to_ascii_lowercase().as_str() {
                "domestic" => FlightType::Domestic,
                "international" => FlightType::International,
                other => anyhow::bail!("Unknown GALLEYSCAN_FLIGHT_TYPE: {}", other),
            },
            Err(_) => FlightType::International,
        };

        let defaults = FlightContext::default();
        let aircraft = std::env::var("GALLEYSCAN_AIRCRAFT").unwrap_or(defaults.aircraft);
        let origin = std::env::var("GALLEYSCAN_ORIGIN").unwrap_or(defaults.origin);
        let destination = std::env::var("GALLEYSCAN_DESTINATION").unwrap_or(defaults.destination);

        // Default payload expires in three days, inside every warning margin.
        let payload = std::env::var("GALLEYSCAN_PAYLOAD").unwrap_or_else(|_| {
            let expiry = chrono::Local::now().date_naive() + chrono::Days::new(3);
            format!(
                r#"{{"expiry":"{}","productId":"C-117","name":"Chicken Caesar Wrap"}}"#,
                expiry.format("%Y-%m-%d")
            )
        });

        let scan_secs: u64 = std::env::var("GALLEYSCAN_SCAN_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8);

        let refresh_ms: u64 = std::env::var("GALLEYSCAN_REFRESH_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(16);

        Ok(Self {
            context: FlightContext {
                flight_type,
                aircraft,
                origin,
                destination,
            },
            payload,
            scan_secs,
            refresh_ms,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("galleyscan=info".parse().unwrap()),
        )
        .init();

    let config = Config::from_env()?;

    info!("Galleyscan Scanner starting");
    info!(
        "  Flight: {:?} {} -> {} on {}",
        config.context.flight_type, config.context.origin, config.context.destination,
        config.context.aircraft
    );
    info!(
        "  Warning threshold: {} days",
        galleyscan::freshness::warning_threshold(&config.context)
    );
    info!("  Payload: {}", config.payload);

    run(config).await
}

#[cfg(not(feature = "test-source"))]
async fn run(config: Config) -> Result<()> {
    let _ = config;
    anyhow::bail!("Synthetic sources not enabled. Rebuild with --features test-source")
}

#[cfg(feature = "test-source")]
async fn run(config: Config) -> Result<()> {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::Context as _;
    use tokio::sync::broadcast::error::RecvError;
    use tracing::{debug, error, warn};

    use galleyscan::{
        CaptureSession, Detection, FlightContextStore, ScanEvent, ScriptedDecoder, SessionConfig,
        SyntheticCamera, SyntheticCameraConfig,
    };

    let store = FlightContextStore::new(config.context.clone());
    let camera = SyntheticCamera::new(SyntheticCameraConfig::default());

    // The code appears shortly after start, drifts right one pixel per
    // frame, and leaves the frame after about four seconds so the silence
    // sweep gets to run before the demo window closes.
    let mut decoder = ScriptedDecoder::new();
    for frame in 5..125 {
        decoder = decoder.detect_at(
            frame,
            Detection {
                text: config.payload.clone(),
                locator_points: quad_at(120.0 + frame as f32, 90.0),
            },
        );
    }

    let mut session = CaptureSession::new(
        SessionConfig {
            refresh_interval: Duration::from_millis(config.refresh_ms),
            ..SessionConfig::default()
        },
        Arc::new(camera),
        Arc::new(decoder),
        Box::new(ConsoleCanvas::default()),
        store.handle(),
    );

    // Narrate the event stream
    let mut events = session.events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ScanEvent::Tracked { scan, status }) => info!(
                    "Tracked: {} ({}) expires {} [{}]",
                    scan.name.as_deref().unwrap_or("unnamed item"),
                    scan.product_id.as_deref().unwrap_or("no id"),
                    scan.expiry_date,
                    status
                ),
                Ok(ScanEvent::Invalid { text }) => warn!("Unreadable payload: {:?}", text),
                Ok(ScanEvent::Lost) => info!("Code left the frame"),
                Ok(ScanEvent::Error { message }) => error!("Scanner error: {}", message),
                Err(RecvError::Lagged(n)) => warn!("Event stream lagged by {}", n),
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Event task ended");
    });

    session
        .start()
        .await
        .context("Failed to start scan session")?;

    if config.scan_secs == 0 {
        info!("Scanning until Ctrl-C...");
        tokio::signal::ctrl_c().await?;
    } else {
        info!("Scanning for {} seconds...", config.scan_secs);
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(config.scan_secs)) => {}
            _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        }
    }

    session.stop();
    Ok(())
}

#[cfg(feature = "test-source")]
fn quad_at(x: f32, y: f32) -> Vec<Point> {
    vec![
        Point::new(x, y),
        Point::new(x + 120.0, y),
        Point::new(x + 120.0, y + 120.0),
        Point::new(x, y + 120.0),
    ]
}

/// Render target that narrates draw calls instead of painting.
#[cfg(feature = "test-source")]
#[derive(Default)]
struct ConsoleCanvas {
    strokes: u64,
}

#[cfg(feature = "test-source")]
impl RenderTarget for ConsoleCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        info!("Overlay surface sized to {}x{}", width, height);
    }

    fn clear(&mut self) {}

    fn stroke_polygon(&mut self, points: &[Point; 4], color: OverlayColor) {
        self.strokes += 1;
        // Roughly one line per second at display refresh
        if self.strokes % 60 == 1 {
            tracing::debug!(
                "Stroke #{}: corner ({:.0},{:.0}) rgba({},{},{},{})",
                self.strokes,
                points[0].x,
                points[0].y,
                color.r,
                color.g,
                color.b,
                color.a
            );
        }
    }
}
