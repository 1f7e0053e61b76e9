//! Daemon protocol types for NDJSON communication over UNIX socket.
//!
//! CHANGELOG:
//! - 02/02/2026 - Initial implementation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PROTOCOL_VERSION: u8 = 1;

/// NDJSON request from client to daemon.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    /// Unique request ID (UUID)
    pub id: String,
    /// Protocol version
    #[serde(default = "default_version")]
    pub v: u8,
    /// Method name (e.g., "health", "load", "search")
    pub method: String,
    /// Method parameters; matching calls also accept config keys here
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

fn default_version() -> u8 {
    PROTOCOL_VERSION
}

/// NDJSON response from daemon to client.
#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub ok: bool,
    pub result: Option<serde_json::Value>,
    pub error: Option<ErrorInfo>,
    pub meta: ResponseMeta,
}

/// Error details in response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code: "ERROR" or "BAD_REQUEST"
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Server execution time in milliseconds
    pub server_ms: f64,
    pub protocol_v: u8,
}

impl Request {
    pub fn new(method: &str, params: HashMap<String, serde_json::Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            v: PROTOCOL_VERSION,
            method: method.to_string(),
            params,
        }
    }

    /// Parse request from NDJSON line.
    pub fn from_ndjson_line(line: &str) -> Result<Self> {
        serde_json::from_str(line).context("Failed to parse request JSON")
    }

    pub fn to_ndjson_line(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

impl Response {
    pub fn success(id: String, result: serde_json::Value, server_ms: f64) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
            meta: ResponseMeta {
                server_ms,
                protocol_v: PROTOCOL_VERSION,
            },
        }
    }

    pub fn error(id: String, code: &str, message: String, server_ms: f64) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(ErrorInfo {
                code: code.to_string(),
                message,
                details: None,
            }),
            meta: ResponseMeta {
                server_ms,
                protocol_v: PROTOCOL_VERSION,
            },
        }
    }

    pub fn from_ndjson_line(line: &str) -> Result<Self> {
        serde_json::from_str(line).context("Failed to parse response JSON")
    }

    /// Serialize response to NDJSON line.
    pub fn to_ndjson_line(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request = Request::from_ndjson_line(r#"{"id":"1","method":"health"}"#).unwrap();
        assert_eq!(request.v, PROTOCOL_VERSION);
        assert!(request.params.is_empty());
        assert!(Request::from_ndjson_line("not json").is_err());
    }

    #[test]
    fn test_request_line() {
        let mut params = HashMap::new();
        params.insert("list".to_string(), json!("people"));
        let request = Request::new("dedupe", params);
        let line = request.to_ndjson_line().unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let parsed = Request::from_ndjson_line(line.trim()).unwrap();
        assert_eq!(parsed.id, request.id);
        assert_eq!(parsed.params["list"], "people");
    }

    #[test]
    fn test_error_response_shape() {
        let response = Response::error("7".into(), "BAD_REQUEST", "missing list".into(), 0.5);
        let value: serde_json::Value = serde_json::from_str(&response.to_ndjson_line().unwrap()).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["result"], serde_json::Value::Null);
        assert_eq!(value["error"]["code"], "BAD_REQUEST");
        assert_eq!(value["meta"]["protocol_v"], 1);
    }
}
