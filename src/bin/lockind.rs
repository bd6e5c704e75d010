//! LockIn Daemon - Camera focus tracking and event streaming
//!
//! This binary runs as a background daemon, analyzing a camera feed per
//! client connection and streaming focus states as newline-delimited
//! JSON over TCP.
//!
//! # Usage
//!
//! ```bash
//! # Start the daemon (foreground)
//! lockind start
//!
//! # Start the daemon (background/daemonized)
//! lockind start -d
//!
//! # Start on a custom port with previews capped at 2 fps
//! lockind start --port 9000 --preview-fps 2
//!
//! # Stop the daemon
//! lockind stop
//!
//! # Check daemon status
//! lockind status
//!
//! # Environment overrides
//! LOCKIN_VISION_PORT=9000 LOCKIN_CAMERA_ID=1 lockind start
//!
//! # Enable debug logging
//! RUST_LOG=lockind=debug lockind start
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: Graceful shutdown

use std::env;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lockind::capture::SyntheticFactory;
use lockind::monitor::spawn_resource_monitor;
use lockind::server::VisionServer;
use lockind::settings::{DaemonSettings, DEFAULT_PORT};

/// LockIn daemon - camera focus tracking server
#[derive(Parser, Debug)]
#[command(name = "lockind", version, about)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the daemon
    Start {
        /// Run as a background daemon (fork to background)
        #[arg(short = 'd', long)]
        daemon: bool,

        /// TCP port to listen on (overrides LOCKIN_VISION_PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Camera index to open per connection (overrides LOCKIN_CAMERA_ID)
        #[arg(long)]
        camera: Option<u32>,

        /// Preview frame rate cap, 0 disables (overrides LOCKIN_PREVIEW_FPS)
        #[arg(long)]
        preview_fps: Option<f64>,

        /// Payloads between throughput log lines (overrides LOCKIN_VISION_LOG_EVERY)
        #[arg(long)]
        log_every: Option<u64>,
    },
    /// Stop the running daemon
    Stop,
    /// Show daemon status
    Status,
}

fn pid_file_path() -> PathBuf {
    let state_dir = dirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("lockin");
    state_dir.join("lockind.pid")
}

fn log_file_path() -> PathBuf {
    let state_dir = dirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("lockin");
    state_dir.join("lockind.log")
}

fn read_pid() -> Option<u32> {
    let path = pid_file_path();
    let mut file = File::open(&path).ok()?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).ok()?;
    contents.trim().parse().ok()
}

fn write_pid() -> Result<()> {
    let path = pid_file_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create state directory")?;
    }
    let mut file = File::create(&path).context("Failed to create PID file")?;
    write!(file, "{}", process::id()).context("Failed to write PID")?;
    Ok(())
}

fn remove_pid_file() {
    let path = pid_file_path();
    let _ = fs::remove_file(path);
}

fn is_process_running(pid: u32) -> bool {
    PathBuf::from(format!("/proc/{pid}")).exists()
}

fn is_daemon_running() -> Option<u32> {
    if let Some(pid) = read_pid() {
        if is_process_running(pid) {
            return Some(pid);
        }
        remove_pid_file();
    }
    None
}

fn stop_daemon(pid: u32) -> Result<()> {
    #[cfg(unix)]
    {
        let result = unsafe { libc::kill(pid as i32, libc::SIGTERM) };
        if result != 0 {
            bail!("Failed to send SIGTERM to process {pid}");
        }
    }
    #[cfg(not(unix))]
    {
        bail!("Stop command is only supported on Unix systems");
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let command = args.command.unwrap_or(Command::Start {
        daemon: false,
        port: None,
        camera: None,
        preview_fps: None,
        log_every: None,
    });

    match command {
        Command::Start {
            daemon,
            port,
            camera,
            preview_fps,
            log_every,
        } => {
            if let Some(pid) = is_daemon_running() {
                eprintln!("Daemon is already running (PID {pid})");
                eprintln!("Use 'lockind stop' to stop it first.");
                process::exit(1);
            }

            if daemon {
                daemonize()?;
            }

            write_pid()?;

            let result = run_daemon(port, camera, preview_fps, log_every);

            remove_pid_file();

            result
        }
        Command::Stop => {
            if let Some(pid) = is_daemon_running() {
                println!("Stopping daemon (PID {pid})...");
                stop_daemon(pid)?;

                for _ in 0..50 {
                    if !is_process_running(pid) {
                        println!("Daemon stopped.");
                        return Ok(());
                    }
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }

                eprintln!("Daemon did not stop within 5 seconds.");
                process::exit(1);
            } else {
                println!("Daemon is not running.");
                Ok(())
            }
        }
        Command::Status => {
            if let Some(pid) = is_daemon_running() {
                println!("Daemon is running (PID {pid})");

                let port = env::var("LOCKIN_VISION_PORT")
                    .ok()
                    .and_then(|raw| raw.trim().parse().ok())
                    .unwrap_or(DEFAULT_PORT);
                println!("Port: {port}");

                Ok(())
            } else {
                println!("Daemon is not running.");
                process::exit(1);
            }
        }
    }
}

fn daemonize() -> Result<()> {
    use daemonize::Daemonize;

    let log_path = log_file_path();

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }

    let stdout = File::create(&log_path).context("Failed to create log file for stdout")?;
    let stderr = File::create(&log_path).context("Failed to create log file for stderr")?;

    let daemonize = Daemonize::new()
        .working_directory("/")
        .stdout(stdout)
        .stderr(stderr);

    daemonize.start().context("Failed to daemonize")?;

    Ok(())
}

#[tokio::main]
async fn run_daemon(
    port: Option<u16>,
    camera: Option<u32>,
    preview_fps: Option<f64>,
    log_every: Option<u64>,
) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("lockind=info".parse()?)
                .add_directive("lockin_core=info".parse()?)
                .add_directive("lockin_protocol=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "LockIn daemon starting"
    );

    // Environment first, then explicit flags on top.
    let mut settings = DaemonSettings::from_env();
    if let Some(port) = port {
        settings.port = port;
    }
    if let Some(camera) = camera {
        settings.camera_id = camera;
    }
    if let Some(preview_fps) = preview_fps {
        settings.preview_fps = preview_fps;
    }
    if let Some(log_every) = log_every {
        settings.log_every = log_every;
    }

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let factory = Arc::new(SyntheticFactory::new());
    let server = VisionServer::bind(settings, factory, cancel_token.clone())
        .await
        .context("Failed to bind stream server")?;

    let _monitor_handle = spawn_resource_monitor(cancel_token.clone(), server.session_gauge());
    info!("Resource monitor started");

    info!(port = settings.port, camera_id = settings.camera_id, "Starting server");

    server.run().await;

    info!("LockIn daemon stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
