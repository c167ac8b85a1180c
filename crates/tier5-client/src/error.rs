use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Unauthorized,
    NotFound,
    Client,
    Server,
    /// Connection refused, DNS failure or timeout: the peer was never reached.
    Offline,
    Decode,
}

impl ApiErrorKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            401 => Self::Unauthorized,
            404 => Self::NotFound,
            500..=599 => Self::Server,
            _ => Self::Client,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not found",
            Self::Client => "client error",
            Self::Server => "server error",
            Self::Offline => "offline",
            Self::Decode => "decode error",
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("review api {} ({}): {detail}", .kind.as_str(), status_label(.status))]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: Option<u16>,
    pub detail: String,
}

fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "-".to_string(), |code| code.to_string())
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            detail: detail.into(),
        }
    }

    /// Builds the error for a non-2xx response from its raw body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        Self {
            kind: ApiErrorKind::from_status(status),
            status: Some(status.as_u16()),
            detail: error_detail(body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            }),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }

    pub fn is_offline(&self) -> bool {
        self.kind == ApiErrorKind::Offline
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_decode() {
            ApiErrorKind::Decode
        } else if let Some(status) = err.status() {
            ApiErrorKind::from_status(status)
        } else {
            ApiErrorKind::Offline
        };
        Self {
            kind,
            status: err.status().map(|s| s.as_u16()),
            detail: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ApiErrorKind::Decode, err.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

fn value_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        serde_json::Value::Object(mut map) => map.remove("message").and_then(value_text),
        other => Some(other.to_string()),
    }
}

/// First of `detail`, `message`, `error` carrying text; a non-JSON body is
/// used as-is.
fn error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(parsed) => parsed
            .detail
            .and_then(value_text)
            .or_else(|| parsed.message.and_then(value_text))
            .or_else(|| parsed.error.and_then(value_text)),
        Err(_) => Some(trimmed.to_string()),
    }
}
