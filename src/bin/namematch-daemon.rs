//! namematch-daemon - Persistent daemon with a warm matching engine.
//!
//! CHANGELOG:
//! - 20/10/2026 - Process control moved into the library
//! - 02/02/2026 - Initial implementation

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::info;

use namematch::config::Config;
use namematch::daemon::control::DaemonPaths;
use namematch::daemon::{server::DaemonServer, DEFAULT_SOCKET};

#[derive(Parser)]
#[command(name = "namematch-daemon")]
#[command(about = "Persistent daemon for namematch")]
struct Cli {
    /// Socket path (the pid file is <socket>.pid)
    #[arg(long, global = true, default_value = DEFAULT_SOCKET)]
    socket: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start serving; forks into the background unless --foreground
    Start {
        #[arg(long)]
        foreground: bool,
    },
    /// Signal a running daemon to exit
    Stop,
    /// Exit 0 when a daemon answers on the socket
    Status,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let paths = DaemonPaths::resolve(&cli.socket);

    let result = match cli.command {
        Commands::Start { foreground } => start(&paths, foreground),
        Commands::Stop => paths.stop().map(|pid| println!("Daemon stopped (pid {})", pid)),
        Commands::Status if paths.is_running() => {
            println!("Daemon running at {}", paths.socket.display());
            Ok(())
        }
        Commands::Status => {
            println!("Daemon not running");
            return ExitCode::from(1);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn start(paths: &DaemonPaths, foreground: bool) -> Result<()> {
    paths.prepare()?;

    // Load before forking so config errors reach the terminal.
    let config = Config::load_default()?;
    let mut server = DaemonServer::new(&paths.socket, config);

    if foreground {
        info!("starting in foreground");
    } else {
        daemonize::Daemonize::new()
            .pid_file(&paths.pid_file)
            .working_directory("/tmp")
            .start()
            .map_err(|e| anyhow!("Failed to daemonize: {}", e))?;
    }
    server.serve()
}
