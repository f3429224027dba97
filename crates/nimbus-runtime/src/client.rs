// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP client for the function control plane.
//!
//! The control plane lives inside the function container and serves three
//! endpoints under `/runtime/invocation`: a long-poll `next`, a per-request
//! `response` post and a per-request `error` post, plus `/runtime/init/error`
//! for failures before the first invocation.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::{CONTROL_PLANE_ENDPOINT_VAR, Config, ConfigError};
use crate::error::{ClientError, ErrorReport, RuntimeError};

/// Response headers of a `next` call.
mod headers {
    pub const REQUEST_ID: &str = "Lambda-Runtime-Aws-Request-Id";
    pub const TRACE_ID: &str = "Lambda-Runtime-Trace-Id";
    pub const FUNCTION_ARN: &str = "Lambda-Runtime-Invoked-Function-Arn";
    pub const DEADLINE_MS: &str = "Lambda-Runtime-Deadline-Ms";
    pub const COGNITO_IDENTITY: &str = "Lambda-Runtime-Cognito-Identity";
    pub const CLIENT_CONTEXT: &str = "Lambda-Runtime-Client-Context";
    pub const FUNCTION_ERROR_TYPE: &str = "Lambda-Runtime-Function-Error-Type";
}

const RESPONSE_CONTENT_TYPE: &str = "application/octet-stream";
const ERROR_CONTENT_TYPE: &str = "application/json";
const UNHANDLED: &str = "Unhandled";

/// One server-delivered invocation: payload bytes plus parsed headers.
///
/// Created when the client receives `next`; consumed once the matching
/// response or error post completes.
#[derive(Debug, Clone)]
pub struct InvocationEnvelope {
    /// Opaque, non-empty request identifier.
    pub request_id: String,
    /// Tracing identifier, if propagated.
    pub trace_id: Option<String>,
    /// Identifier of the invoked function, if sent.
    pub invoked_function_arn: Option<String>,
    /// Absolute deadline, if sent.
    pub deadline: Option<DateTime<Utc>>,
    /// Mobile-SDK identity blob, if sent.
    pub cognito_identity: Option<String>,
    /// Client-context blob, if sent.
    pub client_context: Option<String>,
    /// Payload bytes; possibly empty.
    pub payload: Bytes,
}

impl InvocationEnvelope {
    fn from_response(status: StatusCode, header_map: &HeaderMap, payload: Bytes) -> Result<Self, ClientError> {
        if status != StatusCode::OK {
            return Err(ClientError::Protocol(format!(
                "next returned unexpected status {status}"
            )));
        }

        let request_id = text_header(header_map, headers::REQUEST_ID)?
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                ClientError::Protocol(format!("next response is missing {}", headers::REQUEST_ID))
            })?;

        let deadline = match text_header(header_map, headers::DEADLINE_MS)? {
            Some(value) => {
                let millis: i64 = value.parse().map_err(|_| {
                    ClientError::Protocol(format!(
                        "{} header is not an integer: {value:?}",
                        headers::DEADLINE_MS
                    ))
                })?;
                Some(DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                    ClientError::Protocol(format!(
                        "{} header is out of range: {millis}",
                        headers::DEADLINE_MS
                    ))
                })?)
            }
            None => None,
        };

        Ok(Self {
            request_id,
            trace_id: text_header(header_map, headers::TRACE_ID)?,
            invoked_function_arn: text_header(header_map, headers::FUNCTION_ARN)?,
            deadline,
            cognito_identity: text_header(header_map, headers::COGNITO_IDENTITY)?,
            client_context: text_header(header_map, headers::CLIENT_CONTEXT)?,
            payload,
        })
    }
}

fn text_header(header_map: &HeaderMap, name: &str) -> Result<Option<String>, ClientError> {
    match header_map.get(name) {
        Some(value) => {
            let text = value
                .to_str()
                .map_err(|_| ClientError::Protocol(format!("{name} header is not valid text")))?;
            Ok(Some(text.to_string()))
        }
        None => Ok(None),
    }
}

/// Client for the control plane, owning the keep-alive connection.
///
/// The connection is reused across the loop and discarded after any
/// transport failure; the next call rebuilds it and retries once.
pub struct RuntimeClient {
    base: Url,
    request_timeout: Option<Duration>,
    http: Mutex<Option<reqwest::Client>>,
}

impl RuntimeClient {
    /// Create a client for the given `host:port` endpoint.
    pub fn new(endpoint: &str, request_timeout: Option<Duration>) -> Result<Self, ClientError> {
        let base = Url::parse(&format!("http://{endpoint}/"))
            .map_err(|e| ClientError::Endpoint(endpoint.to_string(), e.to_string()))?;
        if base.host_str().is_none() {
            return Err(ClientError::Endpoint(
                endpoint.to_string(),
                "no host".to_string(),
            ));
        }
        Ok(Self {
            base,
            request_timeout,
            http: Mutex::new(None),
        })
    }

    /// Create a client from the control-plane endpoint environment variable.
    pub fn from_env(config: &Config) -> Result<Self, RuntimeError> {
        let endpoint = std::env::var(CONTROL_PLANE_ENDPOINT_VAR)
            .map_err(|_| ConfigError::Missing(CONTROL_PLANE_ENDPOINT_VAR))?;
        Self::new(&endpoint, config.request_timeout)
            .map_err(|e| RuntimeError::Init(e.to_string()))
    }

    /// Long-poll the control plane for the next invocation.
    ///
    /// Blocks until the server delivers work, unless a request timeout is
    /// configured.
    #[instrument(skip(self))]
    pub async fn next(&self) -> Result<InvocationEnvelope, ClientError> {
        let url = self.url("runtime/invocation/next")?;
        let response = self
            .send_with_retry("next", |http| http.get(url.clone()))
            .await?;

        let status = response.status();
        let header_map = response.headers().clone();
        let payload = match response.bytes().await {
            Ok(payload) => payload,
            Err(e) => {
                self.reset_connection().await;
                return Err(ClientError::Transport(e));
            }
        };

        let envelope = InvocationEnvelope::from_response(status, &header_map, payload)?;
        debug!(
            request_id = %envelope.request_id,
            payload_len = envelope.payload.len(),
            "invocation received"
        );
        Ok(envelope)
    }

    /// Post the handler result for one invocation.
    #[instrument(skip(self, body), fields(body_len = body.len()))]
    pub async fn respond(&self, request_id: &str, body: Bytes) -> Result<(), ClientError> {
        let url = self.url(&format!("runtime/invocation/{request_id}/response"))?;
        let response = self
            .send_with_retry("response", |http| {
                http.post(url.clone())
                    .header(reqwest::header::CONTENT_TYPE, RESPONSE_CONTENT_TYPE)
                    .body(body.clone())
            })
            .await?;
        debug_non_202("response", response.status());
        debug!("response posted");
        Ok(())
    }

    /// Post a structured error document for one invocation.
    #[instrument(skip(self, report), fields(error_type = %report.error_type))]
    pub async fn report_error(
        &self,
        request_id: &str,
        report: &ErrorReport,
    ) -> Result<(), ClientError> {
        let url = self.url(&format!("runtime/invocation/{request_id}/error"))?;
        let body = serialize_report(report)?;
        let response = self
            .send_with_retry("error", |http| {
                http.post(url.clone())
                    .header(reqwest::header::CONTENT_TYPE, ERROR_CONTENT_TYPE)
                    .header(headers::FUNCTION_ERROR_TYPE, UNHANDLED)
                    .body(body.clone())
            })
            .await?;
        debug_non_202("error", response.status());
        debug!("error posted");
        Ok(())
    }

    /// Post an initialization error; only valid before the first `next`.
    #[instrument(skip(self, report), fields(error_type = %report.error_type))]
    pub async fn report_init_error(&self, report: &ErrorReport) -> Result<(), ClientError> {
        let url = self.url("runtime/init/error")?;
        let body = serialize_report(report)?;
        let response = self
            .send_with_retry("init-error", |http| {
                http.post(url.clone())
                    .header(reqwest::header::CONTENT_TYPE, ERROR_CONTENT_TYPE)
                    .header(headers::FUNCTION_ERROR_TYPE, UNHANDLED)
                    .body(body.clone())
            })
            .await?;
        debug_non_202("init-error", response.status());
        Ok(())
    }

    /// Drop the control-plane connection.
    pub async fn close(&self) {
        let mut guard = self.http.lock().await;
        if guard.take().is_some() {
            debug!("control-plane connection closed");
        }
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Protocol(format!("invalid request path {path:?}: {e}")))
    }

    /// Issue one call, reconnecting and retrying exactly once after a
    /// transport, timeout or status failure.
    async fn send_with_retry<F>(&self, op: &'static str, build: F) -> Result<reqwest::Response, ClientError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut retried = false;
        loop {
            let http = self.connection().await?;
            let mut request = build(&http);
            if let Some(timeout) = self.request_timeout {
                request = request.timeout(timeout);
            }

            let failure = match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => ClientError::Protocol(format!(
                    "{op} returned unexpected status {}",
                    response.status()
                )),
                Err(e) if e.is_timeout() => ClientError::Timeout(
                    self.request_timeout.map(|t| t.as_millis() as u64).unwrap_or(0),
                ),
                Err(e) => ClientError::Transport(e),
            };

            self.reset_connection().await;
            if retried {
                return Err(failure);
            }
            warn!(op, error = %failure, "control-plane call failed, retrying once");
            retried = true;
        }
    }

    async fn connection(&self) -> Result<reqwest::Client, ClientError> {
        let mut guard = self.http.lock().await;
        if let Some(http) = guard.as_ref() {
            return Ok(http.clone());
        }
        debug!(base = %self.base, "establishing control-plane connection");
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(1)
            .user_agent(format!("nimbus-runtime/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Transport)?;
        *guard = Some(http.clone());
        Ok(http)
    }

    async fn reset_connection(&self) {
        self.http.lock().await.take();
    }
}

fn debug_non_202(op: &'static str, status: StatusCode) {
    // send_with_retry already rejected everything non-2xx.
    if status != StatusCode::ACCEPTED {
        debug!(op, %status, "control plane accepted with non-202 status");
    }
}

fn serialize_report(report: &ErrorReport) -> Result<Bytes, ClientError> {
    let body = serde_json::to_vec(report)
        .map_err(|e| ClientError::Protocol(format!("error document serialization: {e}")))?;
    Ok(Bytes::from(body))
}
