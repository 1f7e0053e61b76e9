//! namematch-client - Thin client for daemon mode.
//!
//! CHANGELOG:
//! - 02/02/2026 - Initial implementation

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use namematch::daemon::protocol::{Request, Response};
use namematch::daemon::DEFAULT_SOCKET;

#[derive(Parser)]
#[command(name = "namematch-client")]
#[command(about = "Thin client for the namematch daemon")]
struct Cli {
    /// Method to call (health, load, lists, unload, search, compare, dedupe, config)
    method: String,

    /// Socket path
    #[arg(long, default_value = DEFAULT_SOCKET)]
    socket: String,

    /// JSON parameters, e.g. '{"list":"people","query":"jon smith"}'
    #[arg(long)]
    params: Option<String>,

    /// Request timeout (seconds)
    #[arg(long, default_value = "30.0")]
    timeout: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let params: HashMap<String, serde_json::Value> = match cli.params {
        Some(p) => serde_json::from_str(&p).context("--params must be a JSON object")?,
        None => HashMap::new(),
    };
    let request = Request::new(&cli.method, params);

    let socket_path = shellexpand::tilde(&cli.socket).to_string();
    let stream = UnixStream::connect(&socket_path)
        .with_context(|| format!("Failed to connect to daemon at {}", socket_path))?;

    let timeout = Some(Duration::from_secs_f64(cli.timeout));
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)?;

    (&stream).write_all(request.to_ndjson_line()?.as_bytes())?;

    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader.read_line(&mut response_line)?;

    let response = Response::from_ndjson_line(&response_line)?;

    if response.ok {
        let result = response.result.unwrap_or(serde_json::Value::Null);
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    } else {
        let message = response
            .error
            .map(|e| e.message)
            .unwrap_or_else(|| "unknown".to_string());
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }
}
