use anyhow::{Context, Result, bail};
use camlink::client::upload::{ProgressCallback, UploadProgress, upload_url_for};
use camlink::client::{
    CaptureConfig, CaptureSession, SessionConfig, SyntheticCamera, TransportStrategy,
    UploadConfig, UploadCoordinator, UploadError,
};
use camlink::server::{RelayConfig, serve};
use camlink::utils::{
    DEFAULT_HTTP_PORT, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_BITRATE_KBPS, DEFAULT_STREAM_FPS,
    DEFAULT_STREAM_HEIGHT, DEFAULT_STREAM_WIDTH, MIN_FRAME_BYTES, UPLOAD_MAX_RETRIES,
};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "camlink", version, about = "Camera to viewer relay and capture tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Transport {
    Webrtc,
    Relay,
}

impl From<Transport> for TransportStrategy {
    fn from(t: Transport) -> Self {
        match t {
            Transport::Webrtc => TransportStrategy::WebRtc,
            Transport::Relay => TransportStrategy::Relay,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay / signaling server
    Relay {
        #[arg(long, env = "CAMLINK_BIND", default_value_t = SocketAddr::from(([0, 0, 0, 0], DEFAULT_HTTP_PORT)))]
        bind: SocketAddr,

        #[arg(long, env = "CAMLINK_UPLOAD_DIR", default_value = "uploads")]
        upload_dir: PathBuf,

        #[arg(long, default_value_t = MIN_FRAME_BYTES)]
        min_frame_bytes: usize,

        /// Per-connection outbound queue length
        #[arg(long, default_value_t = 256)]
        queue: usize,
    },

    /// Run a synthetic camera against a relay
    Camera {
        #[arg(long, env = "CAMLINK_URL", default_value = "ws://127.0.0.1:3000/camera")]
        url: String,

        #[arg(long, value_enum, default_value_t = Transport::Relay)]
        transport: Transport,

        #[arg(long, default_value_t = 30)]
        fps: u32,

        #[arg(long, default_value_t = DEFAULT_STREAM_WIDTH)]
        width: u32,

        #[arg(long, default_value_t = DEFAULT_STREAM_HEIGHT)]
        height: u32,

        #[arg(long, default_value_t = DEFAULT_STREAM_FPS)]
        stream_fps: u32,

        #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
        quality: u8,

        #[arg(long, default_value_t = DEFAULT_MAX_BITRATE_KBPS)]
        max_bitrate: u32,

        #[arg(long, env = "CAMLINK_RECORDINGS_DIR", default_value = "recordings")]
        recordings_dir: PathBuf,

        /// Defaults to /upload on the relay host
        #[arg(long)]
        upload_url: Option<String>,
    },

    /// Upload a recording with retries
    Upload {
        file: PathBuf,

        /// Upload endpoint, or a relay ws:// url to derive it from
        #[arg(long, env = "CAMLINK_URL", default_value = "ws://127.0.0.1:3000/camera")]
        url: String,

        #[arg(long, default_value_t = UPLOAD_MAX_RETRIES)]
        retries: u32,
    },
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("camlink=info".parse()?)
                .add_directive("camlink_server=info".parse()?)
                .add_directive("camlink_client=info".parse()?),
        )
        .init();
    Ok(())
}

fn shutdown_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                trigger.cancel();
            }
            Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
        }
    });
    token
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    match Cli::parse().command {
        Commands::Relay {
            bind,
            upload_dir,
            min_frame_bytes,
            queue,
        } => {
            println!("{}", "📡 Starting relay...".green().bold());
            println!("   🎥 Cameras: ws://{}/camera", bind);
            println!("   👀 Viewers: ws://{}/viewer", bind);
            println!("   📂 Uploads: {}", upload_dir.display());

            let config = RelayConfig {
                bind_addr: bind,
                upload_dir,
                min_frame_bytes,
                outbound_queue_capacity: queue,
                ..RelayConfig::default()
            };
            serve(config).await?;
        }

        Commands::Camera {
            url,
            transport,
            fps,
            width,
            height,
            stream_fps,
            quality,
            max_bitrate,
            recordings_dir,
            upload_url,
        } => {
            let mut config = SessionConfig::for_relay(&url, transport.into())
                .with_context(|| format!("bad relay url {url}"))?;
            config.capture = CaptureConfig { fps, width, height };
            config.stream.target_fps = stream_fps;
            config.stream.jpeg_quality = quality;
            config.peer.max_bitrate_kbps = max_bitrate;
            config.recordings_dir = recordings_dir;
            if let Some(upload_url) = upload_url {
                config.upload.url = upload_url;
            }

            println!("{}", "🎬 Starting synthetic camera...".green().bold());
            println!("   🔗 Relay:   {}", url);
            println!("   📤 Uploads: {}", config.upload.url);

            let camera = SyntheticCamera::new(config.capture);
            let session = CaptureSession::new(config, Box::new(camera));
            let mut status = session.status();
            tokio::spawn(async move {
                while status.changed().await.is_ok() {
                    let s = status.borrow_and_update().clone();
                    info!("Status: {} {}", s.phase, s.detail);
                }
            });

            session.run(shutdown_on_ctrl_c()).await?;
            println!("{}", "👋 Camera stopped".cyan());
        }

        Commands::Upload { file, url, retries } => {
            if !file.is_file() {
                bail!("{} is not a file", file.display());
            }

            let endpoint = if url.starts_with("ws") {
                upload_url_for(&url, None)?
            } else {
                url
            };
            let coordinator = UploadCoordinator::new(UploadConfig {
                url: endpoint.clone(),
                max_retries: retries,
                ..UploadConfig::default()
            });

            println!(
                "{} {} → {}",
                "📤 Uploading".cyan(),
                file.display(),
                endpoint
            );

            let on_progress: ProgressCallback = Arc::new(|p: UploadProgress| {
                debug!("{:.0}%", p.fraction() * 100.0);
            });
            let cancel = shutdown_on_ctrl_c();

            match coordinator.upload(&file, &cancel, Some(on_progress)).await {
                Ok(report) => {
                    println!(
                        "{} {} bytes in {} attempt(s), stored as {}",
                        "✨ Uploaded".green().bold(),
                        report.bytes,
                        report.attempts,
                        report.stored_as.unwrap_or_else(|| "?".to_owned())
                    );
                }
                Err(UploadError::Cancelled) => {
                    println!("{}", "Upload cancelled, file kept".yellow());
                }
                Err(e) => return Err(e).with_context(|| format!("uploading {}", file.display())),
            }
        }
    }

    Ok(())
}
