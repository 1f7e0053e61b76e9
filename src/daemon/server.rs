//! UNIX socket server for daemon mode.
//!
//! Listens on a UNIX socket, accepts connections one at a time, and
//! dispatches one request per connection to the `DaemonService`. Serving
//! sequentially keeps the engine's cached index single-owner.
//!
//! CHANGELOG:
//! - 02/02/2026 - Initial implementation

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::Config;
use crate::daemon::{protocol, service::DaemonService};

/// Daemon server listening on UNIX socket.
pub struct DaemonServer {
    service: DaemonService,
    socket_path: String,
}

impl DaemonServer {
    pub fn new(socket_path: impl AsRef<Path>, config: Config) -> Self {
        let socket_path = socket_path.as_ref().to_string_lossy().to_string();
        Self {
            service: DaemonService::new(config),
            socket_path,
        }
    }

    /// Start serving requests (blocking).
    pub fn serve(&mut self) -> Result<()> {
        // Clean up stale socket
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)
            .with_context(|| format!("Failed to bind socket: {}", self.socket_path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        info!(socket = %self.socket_path, "daemon listening");

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(e) = self.handle_connection(stream) {
                        warn!(error = %e, "connection error");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "accept error");
                }
            }
        }

        Ok(())
    }

    fn handle_connection(&mut self, stream: UnixStream) -> Result<()> {
        let mut writer = stream.try_clone()?;
        let mut reader = BufReader::new(&stream);

        let mut line = String::new();
        reader.read_line(&mut line)?;

        if line.trim().is_empty() {
            return Ok(()); // Client disconnected
        }

        let response = self.respond(&line);
        writer.write_all(response.to_ndjson_line()?.as_bytes())?;
        writer.flush()?;

        Ok(())
    }

    /// Turn one request line into its response.
    fn respond(&mut self, line: &str) -> protocol::Response {
        let start = Instant::now();
        let elapsed_ms = |start: Instant| start.elapsed().as_secs_f64() * 1000.0;

        let request = match protocol::Request::from_ndjson_line(line) {
            Ok(request) => request,
            Err(e) => {
                return protocol::Response::error(
                    String::new(),
                    "BAD_REQUEST",
                    format!("{:#}", e),
                    elapsed_ms(start),
                )
            }
        };

        match self.service.dispatch(&request.method, request.params) {
            Ok(result) => protocol::Response::success(request.id, result, elapsed_ms(start)),
            Err(e) => {
                warn!(method = %request.method, error = %e, "request failed");
                protocol::Response::error(request.id, "ERROR", format!("{:#}", e), elapsed_ms(start))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_respond() {
        let mut server = DaemonServer::new("/tmp/unused.sock", Config::default());

        let response = server.respond(r#"{"id":"a","v":1,"method":"health","params":{}}"#);
        assert!(response.ok);
        assert_eq!(response.id, "a");

        let response = server.respond(r#"{"id":"b","method":"nope"}"#);
        assert!(!response.ok);
        assert_eq!(response.error.unwrap().code, "ERROR");

        let response = server.respond("{broken");
        assert_eq!(response.error.unwrap().code, "BAD_REQUEST");
    }
}
