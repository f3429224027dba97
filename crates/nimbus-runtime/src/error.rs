// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runtime error taxonomy and the wire error document.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the control-plane client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The control-plane endpoint value is not a usable `host:port`.
    #[error("invalid control-plane endpoint {0:?}: {1}")]
    Endpoint(String, String),

    /// Underlying socket or HTTP failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Missing or malformed headers, or an unexpected status code.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The configured request timeout elapsed.
    #[error("request timed out after {0}ms")]
    Timeout(u64),
}

/// Errors raised while decoding or encoding a typed payload.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// The structured error document posted to the control plane.
///
/// Wire shape: `{"errorType": …, "errorMessage": …, "stackTrace": […]}`.
/// The stack trace is empty when unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub error_type: String,
    pub error_message: String,
    #[serde(default)]
    pub stack_trace: Vec<String>,
}

impl ErrorReport {
    /// Create a report with an explicit error kind.
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            error_message: error_message.into(),
            stack_trace: Vec::new(),
        }
    }

    /// Create a report from a user error, taking its runtime type name as the kind.
    pub fn from_error<E: std::error::Error>(error: &E) -> Self {
        Self::new(short_type_name::<E>(), error.to_string())
    }

    /// Report for a failure while decoding the inbound payload.
    pub(crate) fn decoding(error: CodecError) -> Self {
        Self::new("DecodingError", error.to_string())
    }

    /// Report for a failure while encoding the handler output.
    pub(crate) fn encoding(error: CodecError) -> Self {
        Self::new("EncodingError", error.to_string())
    }

    /// Report for a failure before the first invocation.
    pub(crate) fn initialization(error: &dyn std::error::Error) -> Self {
        Self::new("InitializationError", error.to_string())
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_type, self.error_message)
    }
}

impl std::error::Error for ErrorReport {}

/// Last path segment of a type name, generic arguments stripped.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Top-level runtime failure, mapped to a process exit code.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration could not be read.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// A step of initialization failed before the first invocation.
    #[error("initialization error: {0}")]
    Init(String),

    /// The control plane became unreachable and stayed so after a retry.
    #[error("control-plane failure: {0}")]
    Transport(#[from] ClientError),
}

impl RuntimeError {
    /// Exit code for the process: 1 for unrecoverable transport failure,
    /// 2 for initialization failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Init(_) => 2,
            Self::Transport(_) => 1,
        }
    }
}

/// Type alias for runtime results.
pub type Result<T> = std::result::Result<T, RuntimeError>;
