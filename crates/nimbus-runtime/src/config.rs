// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runtime configuration from environment variables.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Environment variable carrying the control-plane endpoint (`host:port`).
pub const CONTROL_PLANE_ENDPOINT_VAR: &str = "AWS_LAMBDA_RUNTIME_API";

/// Logger verbosity, mirroring the `tracing` level set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a `tracing` filter directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signal that triggers draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopSignal {
    #[default]
    Term,
    Int,
    Hup,
    Quit,
    Usr1,
    Usr2,
}

impl StopSignal {
    /// Signal name without the `SIG` prefix.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Term => "TERM",
            Self::Int => "INT",
            Self::Hup => "HUP",
            Self::Quit => "QUIT",
            Self::Usr1 => "USR1",
            Self::Usr2 => "USR2",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        let name = value.to_ascii_uppercase();
        let name = name.strip_prefix("SIG").unwrap_or(&name);
        match name {
            "TERM" => Some(Self::Term),
            "INT" => Some(Self::Int),
            "HUP" => Some(Self::Hup),
            "QUIT" => Some(Self::Quit),
            "USR1" => Some(Self::Usr1),
            "USR2" => Some(Self::Usr2),
            _ => None,
        }
    }

    /// The matching tokio signal kind.
    #[cfg(unix)]
    pub(crate) fn kind(&self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;
        match self {
            Self::Term => SignalKind::terminate(),
            Self::Int => SignalKind::interrupt(),
            Self::Hup => SignalKind::hangup(),
            Self::Quit => SignalKind::quit(),
            Self::Usr1 => SignalKind::user_defined1(),
            Self::Usr2 => SignalKind::user_defined2(),
        }
    }
}

impl std::fmt::Display for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Process-wide runtime configuration, created once at startup.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Logger verbosity (default: info).
    pub log_level: LogLevel,
    /// Exit cleanly after this many cycles; `None` means unbounded.
    pub max_requests: Option<u64>,
    /// Signal that triggers draining (default: TERM).
    pub stop_signal: StopSignal,
    /// Per control-plane call timeout; `None` means unbounded.
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional (with defaults):
    /// - `LOG_LEVEL`: logger verbosity (default: `info`)
    /// - `MAX_REQUESTS`: positive cycle bound (default: unbounded)
    /// - `STOP_SIGNAL`: signal name, with or without `SIG` prefix (default: `TERM`)
    /// - `REQUEST_TIMEOUT`: per-call timeout in milliseconds (default: unbounded)
    pub fn from_env() -> Result<Self, ConfigError> {
        let log_level = match env::var("LOG_LEVEL") {
            Ok(value) => LogLevel::parse(&value)
                .ok_or(ConfigError::Invalid("LOG_LEVEL", "must be a log level name"))?,
            Err(_) => LogLevel::default(),
        };

        let max_requests = match env::var("MAX_REQUESTS") {
            Ok(value) => {
                let bound: u64 = value
                    .parse()
                    .map_err(|_| ConfigError::Invalid("MAX_REQUESTS", "must be a positive integer"))?;
                if bound == 0 {
                    return Err(ConfigError::Invalid("MAX_REQUESTS", "must be a positive integer"));
                }
                Some(bound)
            }
            Err(_) => None,
        };

        let stop_signal = match env::var("STOP_SIGNAL") {
            Ok(value) => StopSignal::parse(&value)
                .ok_or(ConfigError::Invalid("STOP_SIGNAL", "must be a supported signal name"))?,
            Err(_) => StopSignal::default(),
        };

        let request_timeout = match env::var("REQUEST_TIMEOUT") {
            Ok(value) => {
                let millis: u64 = value.parse().map_err(|_| {
                    ConfigError::Invalid("REQUEST_TIMEOUT", "must be a duration in milliseconds")
                })?;
                if millis == 0 {
                    return Err(ConfigError::Invalid(
                        "REQUEST_TIMEOUT",
                        "must be a duration in milliseconds",
                    ));
                }
                Some(Duration::from_millis(millis))
            }
            Err(_) => None,
        };

        Ok(Self {
            log_level,
            max_requests,
            stop_signal,
            request_timeout,
        })
    }

    /// Set the logger verbosity.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Bound the number of cycles before a clean exit.
    pub fn with_max_requests(mut self, bound: u64) -> Self {
        self.max_requests = Some(bound);
        self
    }

    /// Set the signal that triggers draining.
    pub fn with_stop_signal(mut self, signal: StopSignal) -> Self {
        self.stop_signal = signal;
        self
    }

    /// Bound each control-plane call.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
