use std::future::pending;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tokio::time::{Instant, Interval};

use stand_capture::camera::{
    display_label, list_devices, CameraBackend, StillImageBackend, TestPatternBackend,
};
use stand_capture::capture::{CaptureLoop, CaptureSession};
use stand_capture::config::Config;
use stand_capture::detect::{DetectionSnapshot, DetectorClient, FrameUploader, DETECT_URL_ENV};
use stand_capture::overlay::{self, DisplaySize};

/// Where frames come from.
#[derive(Debug, Clone)]
enum CameraSource {
    /// Synthetic front/back cameras
    Pattern,
    /// A still image served as a live stream
    Still(PathBuf),
}

impl CameraSource {
    fn backend(&self) -> Result<Arc<dyn CameraBackend>, String> {
        match self {
            CameraSource::Pattern => Ok(Arc::new(TestPatternBackend::new())),
            CameraSource::Still(path) => StillImageBackend::open_file(path)
                .map(|b| Arc::new(b) as Arc<dyn CameraBackend>)
                .map_err(|e| e.to_string()),
        }
    }
}

/// Parse a camera source (`pattern` or `still:PATH`)
fn parse_source(s: &str) -> Result<CameraSource, String> {
    if s == "pattern" {
        return Ok(CameraSource::Pattern);
    }
    match s.strip_prefix("still:") {
        Some(path) if !path.is_empty() => Ok(CameraSource::Still(PathBuf::from(path))),
        _ => Err(format!(
            "Unknown source '{}'. Use 'pattern' or 'still:PATH'",
            s
        )),
    }
}

/// Parse and validate a display size (WIDTHxHEIGHT format)
fn parse_display(s: &str) -> Result<DisplaySize, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid display size '{}'. Use WIDTHxHEIGHT (e.g., 960x540)",
            s
        ));
    }
    let width: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid width '{}' in display size", parts[0]))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid height '{}' in display size", parts[1]))?;
    if width == 0 || height == 0 {
        return Err("Display width and height must be greater than 0".to_string());
    }
    Ok(DisplaySize::new(width as f32, height as f32))
}

/// stand-capture: live object detection overlay for a camera stream
#[derive(Parser)]
#[command(name = "stand-capture")]
#[command(version, about = "Live object detection overlay for a camera stream")]
#[command(after_help = "EXAMPLES:
    # List cameras from the synthetic test source
    stand-capture list-cameras

    # Check that the detection service is reachable
    stand-capture health --url http://localhost:8000

    # Detect objects in a still image for 10 seconds, drawn at 960x540
    stand-capture run --source still:photo.jpg --duration 10 --display 960x540")]
struct Cli {
    /// Config file path
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    ListCameras {
        /// Camera source: 'pattern' or 'still:PATH'
        #[arg(long, default_value = "pattern", value_parser = parse_source)]
        source: CameraSource,
    },

    /// Check the detection service health endpoint
    Health {
        /// Detection service URL (overrides config and STAND_DETECT_URL)
        #[arg(long)]
        url: Option<String>,
    },

    /// Start the camera and run detection until Ctrl+C
    Run {
        /// Camera source: 'pattern' or 'still:PATH'
        #[arg(long, default_value = "pattern", value_parser = parse_source)]
        source: CameraSource,

        /// Detection service URL (overrides config and STAND_DETECT_URL)
        #[arg(long)]
        url: Option<String>,

        /// Camera index (from list-cameras)
        #[arg(long)]
        camera: Option<usize>,

        /// Size the video is displayed at, WIDTHxHEIGHT (default: native)
        #[arg(long, value_parser = parse_display)]
        display: Option<DisplaySize>,

        /// Mirror overlay boxes for front-facing cameras
        #[arg(long)]
        mirror: bool,

        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<u64>,

        /// Switch to the next camera every N seconds
        #[arg(long)]
        switch_every: Option<u64>,
    },
}

struct RunOptions {
    source: CameraSource,
    url: Option<String>,
    camera: Option<usize>,
    display: Option<DisplaySize>,
    mirror: bool,
    duration: Option<u64>,
    switch_every: Option<u64>,
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to create async runtime: {}", e))
}

fn run_list_cameras(source: &CameraSource) -> Result<(), String> {
    let backend = source.backend()?;
    let cameras = list_devices(backend.as_ref()).map_err(|e| e.to_string())?;

    if cameras.is_empty() {
        println!("No cameras detected");
        return Ok(());
    }

    println!("{} camera(s) found", cameras.len());
    for (i, camera) in cameras.iter().enumerate() {
        println!("  [{}] {} - {}", i, display_label(Some(camera), i), camera);
    }
    Ok(())
}

fn run_health(url: String) -> Result<(), String> {
    let client = DetectorClient::with_base_url(url).map_err(|e| e.to_string())?;
    let rt = runtime()?;
    let health = rt
        .block_on(client.health())
        .map_err(|e| format!("Detection service at {} is unreachable: {}", client.base_url(), e))?;
    println!("{}: {} ({})", client.base_url(), health.status, health.message);
    Ok(())
}

fn run_capture(opts: RunOptions, config: Config) -> Result<(), String> {
    let rt = runtime()?;
    rt.block_on(capture(opts, config))
}

async fn capture(opts: RunOptions, config: Config) -> Result<(), String> {
    let backend = opts.source.backend()?;
    let cameras = list_devices(backend.as_ref()).map_err(|e| e.to_string())?;
    println!("{} camera(s) found", cameras.len());

    let index = opts.camera.unwrap_or(config.camera.device);
    let mut session = CaptureSession::open(backend, cameras, index).map_err(|e| e.to_string())?;

    let url = opts.url.unwrap_or_else(|| config.detector_url());
    let client =
        DetectorClient::with_timeout(url, config.upload_timeout()).map_err(|e| e.to_string())?;
    println!("Sending frames to {}", client.base_url());

    let uploader = FrameUploader::new(client, config.cooldown_policy());
    let mut capture_loop = CaptureLoop::start(&session, uploader, config.loop_settings());
    let mut updates = capture_loop.subscribe();

    let (stop_tx, mut stop_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(true);
    })
    .map_err(|e| format!("Failed to set Ctrl+C handler: {}", e))?;

    let display = opts.display.or_else(|| config.display_size());
    let mirror = opts.mirror || config.camera.mirror_overlay;
    let deadline = opts
        .duration
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut switch_timer = opts.switch_every.filter(|s| *s > 0).map(|secs| {
        let period = Duration::from_secs(secs);
        tokio::time::interval_at(Instant::now() + period, period)
    });

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                render(&session, &snapshot, display, mirror);
            }
            _ = stop_rx.changed() => {
                eprintln!("\nReceived Ctrl+C, shutting down...");
                break;
            }
            _ = until(deadline) => break,
            _ = next_tick(&mut switch_timer) => {
                match session.switch_camera() {
                    Ok(true) => println!("Switched to {}", session.label()),
                    Ok(false) => {}
                    Err(e) => eprintln!("Failed to switch camera: {}", e),
                }
            }
        }
    }

    capture_loop.stop();
    session.close();
    println!("Capture stopped.");
    Ok(())
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => pending().await,
    }
}

fn render(
    session: &CaptureSession,
    snapshot: &DetectionSnapshot,
    display: Option<DisplaySize>,
    mirror: bool,
) {
    let native = session.native_resolution();
    let rendered = display.or_else(|| native.map(DisplaySize::from));
    let boxes = overlay::layout(
        &snapshot.detections,
        native,
        rendered,
        mirror && session.is_mirrored(),
    );

    println!("{}", overlay::status_line(&session.label(), snapshot));
    for b in boxes {
        println!("  {}", b);
    }
}

/// Load .env file and report where the detection URL comes from.
///
/// Does not override existing environment variables.
fn load_env() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();

    if std::env::var(DETECT_URL_ENV).is_err() {
        log::debug!("{} not set, using config file or default URL", DETECT_URL_ENV);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    load_env();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::ListCameras { source } => run_list_cameras(&source),
        Commands::Health { url } => run_health(url.unwrap_or_else(|| config.detector_url())),
        Commands::Run {
            source,
            url,
            camera,
            display,
            mirror,
            duration,
            switch_every,
        } => run_capture(
            RunOptions {
                source,
                url,
                camera,
                display,
                mirror,
                duration,
                switch_every,
            },
            config,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
