use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Conflict,
    RateLimited,
    Transport,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            429 => Self::RateLimited,
            _ => Self::Internal,
        }
    }
}

/// Error body returned by the draw backend. Validation failures from the
/// draw service come back as `detail`, wrapped errors as `code` + `msg`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.detail.as_deref())
            .filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Error)]
#[error("{code:?} ({status}): {message}")]
pub struct ApiException {
    pub code: ErrorCode,
    pub status: u16,
    pub message: String,
}

impl ApiException {
    pub fn new(code: ErrorCode, status: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            status,
            message: message.into(),
        }
    }

    pub fn from_response(status: u16, body: Option<ErrorBody>) -> Self {
        let message = body
            .as_ref()
            .and_then(ErrorBody::message)
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with status {status}"));
        Self::new(ErrorCode::from_status(status), status, message)
    }

    pub fn requires_reauth(&self) -> bool {
        self.code == ErrorCode::Unauthorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_msg_over_detail() {
        let body = ErrorBody {
            code: None,
            msg: Some("prize exhausted".into()),
            detail: Some("ignored".into()),
        };
        let err = ApiException::from_response(400, Some(body));
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.message, "prize exhausted");
    }

    #[test]
    fn falls_back_to_status_text_for_blank_bodies() {
        let body = ErrorBody {
            code: None,
            msg: Some("   ".into()),
            detail: None,
        };
        let err = ApiException::from_response(502, Some(body));
        assert_eq!(err.code, ErrorCode::Internal);
        assert!(err.message.contains("502"));
    }

    #[test]
    fn unauthorized_requires_reauth() {
        assert!(ApiException::from_response(401, None).requires_reauth());
        assert!(!ApiException::from_response(404, None).requires_reauth());
    }
}
