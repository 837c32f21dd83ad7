use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Error body `error` value for any external tool failure.
pub const TOOL_FAILED_MESSAGE: &str = "latex/gs failed";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Render(#[from] RenderError),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0}")]
    Validation(String),

    #[error("pdflatex exited with status {}", exit_label(.exit_code))]
    Compile { exit_code: Option<i32>, log: String },

    #[error("gs exited with status {}", exit_label(.exit_code))]
    Rasterize { exit_code: Option<i32>, log: String },

    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: &'static str, seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Captured tool output, for compiler and rasterizer failures.
    pub fn log(&self) -> Option<&str> {
        match self {
            RenderError::Compile { log, .. } | RenderError::Rasterize { log, .. } => Some(log),
            _ => None,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{tool} not found (configured as {path:?})")]
    ToolNotFound { tool: &'static str, path: String },

    #[error("Invalid bind address {0:?}")]
    InvalidBindAddr(String),

    #[error("Refusing to bind non-loopback address {0}")]
    NonLoopbackBind(std::net::SocketAddr),

    #[error("Invalid dpi range {min}..={max}")]
    InvalidDpiRange { min: i64, max: i64 },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Render(RenderError::Validation(message)) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Render(e) => match e.log() {
                Some(log) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": TOOL_FAILED_MESSAGE, "log": log }),
                ),
                None => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": e.to_string() }),
                ),
            },
        };

        (status, Json(body)).into_response()
    }
}
