use std::collections::BTreeMap;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Generic HTTP-like event, either translated from an incoming HTTP request
/// or delivered by the scheduled status trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerEvent {
    #[serde(rename = "httpMethod", default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(rename = "CheckStatus", default)]
    pub check_status: bool,
}

impl HandlerEvent {
    pub fn get() -> Self {
        Self {
            http_method: Some("GET".to_string()),
            ..Default::default()
        }
    }

    pub fn post(body: impl Into<String>) -> Self {
        Self {
            http_method: Some("POST".to_string()),
            body: Some(body.into()),
            ..Default::default()
        }
    }

    pub fn check_status() -> Self {
        Self {
            check_status: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl HandlerResponse {
    /// `{"statusCode": 200}` with neither headers nor body.
    pub fn bare_ok() -> Self {
        Self {
            status_code: 200,
            headers: None,
            body: None,
        }
    }

    pub fn html(page: impl Into<String>) -> Self {
        Self::with_content_type(200, "text/html", page.into())
    }

    pub fn json(status_code: u16, value: &serde_json::Value) -> Self {
        Self::with_content_type(status_code, "application/json", value.to_string())
    }

    fn with_content_type(status_code: u16, content_type: &str, body: String) -> Self {
        let headers = BTreeMap::from([("Content-Type".to_string(), content_type.to_string())]);
        Self {
            status_code,
            headers: Some(headers),
            body: Some(body),
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|h| h.get("Content-Type"))
            .map(String::as_str)
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut out = Response::new(Body::from(self.body.unwrap_or_default()));
        *out.status_mut() = status;
        for (k, v) in self.headers.unwrap_or_default() {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(&v),
            ) {
                out.headers_mut().insert(name, value);
            }
        }
        out
    }
}
