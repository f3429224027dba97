// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP gateway proxy request/response payloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Inbound HTTP request proxied through the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    pub http_method: String,
    pub path: String,
    #[serde(default)]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(default)]
    pub multi_value_query_string_parameters: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub multi_value_headers: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub path_parameters: HashMap<String, String>,
    pub request_context: RequestContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl GatewayRequest {
    /// Header lookup, case-insensitive as HTTP requires.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub request_id: String,
    pub stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<RequestIdentity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Response returned to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl GatewayResponse {
    /// A 200 response with a text body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            headers: HashMap::new(),
            body: Some(body.into()),
            is_base64_encoded: false,
        }
    }

    /// A bodyless response with the given status.
    pub fn status(status_code: u16) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            body: None,
            is_base64_encoded: false,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_decodes_with_sparse_fields() {
        let request: GatewayRequest = serde_json::from_str(
            r#"{
                "httpMethod": "POST",
                "path": "/orders",
                "headers": {"Content-Type": "application/json"},
                "requestContext": {
                    "requestId": "gw-1",
                    "stage": "prod",
                    "identity": {"sourceIp": "203.0.113.9"}
                },
                "body": "{\"order\":41}"
            }"#,
        )
        .unwrap();

        assert_eq!(request.http_method, "POST");
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert!(request.query_string_parameters.is_empty());
        assert!(!request.is_base64_encoded);
        assert_eq!(
            request.request_context.identity.unwrap().source_ip.as_deref(),
            Some("203.0.113.9")
        );
    }

    #[test]
    fn test_response_builder() {
        let response = GatewayResponse::ok("hi").with_header("X-Request-Id", "gw-1");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["body"], "hi");
        assert_eq!(json["headers"]["X-Request-Id"], "gw-1");
    }

    #[test]
    fn test_bodyless_response_omits_body() {
        let json = serde_json::to_value(GatewayResponse::status(204)).unwrap();
        assert!(json.get("body").is_none());
        assert!(json.get("headers").is_none());
    }
}
