//! API wire messages.
//!
//! The front-end talks to the host with JSON-encoded tagged unions posted to
//! `/api`. Decoding happens in two steps (bytes to UTF-8 text, text to
//! message) and each step has its own failure description so a caller can
//! tell which one went wrong.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An API request decoded from an HTTP request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request_type", rename_all = "snake_case")]
pub enum ApiRequest {
    /// Read the recent diagnostic log.
    ReadLog,

    /// Run an opaque instruction in the volatile worker process.
    RunInVolatileHost {
        /// Instruction forwarded verbatim to the worker.
        payload: String,
    },
}

/// An API response encoded into an HTTP response body.
///
/// `ReadLog` answers with plain text rather than one of these variants; see
/// [`crate::state::DiagnosticLog::render`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response_type", rename_all = "snake_case")]
pub enum ApiResponse {
    /// The worker is not provisioned yet; the operation did not execute.
    ///
    /// Delivered with HTTP 200: the transport transaction succeeded, and the
    /// caller must inspect the body to detect this condition.
    SetupNotComplete { message: String },

    /// A delegated operation completed.
    RunInVolatileHostComplete { result: RunResult },
}

/// Outcome of a delegated operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Result payload returned by the worker, if any.
    pub value: Option<String>,

    /// Failure description, if the instruction itself failed. A present
    /// error still counts as a completed delegation.
    pub error: Option<String>,
}

/// Errors from decoding an API request body.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body was not valid UTF-8.
    #[error("request body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The body text was not a valid API message.
    #[error("request body is not a valid API request: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes an API request from raw body bytes.
pub fn decode_request(body: &[u8]) -> Result<ApiRequest, DecodeError> {
    let text = std::str::from_utf8(body)?;
    let request = serde_json::from_str(text)?;
    Ok(request)
}

/// Encodes an API response into body bytes.
///
/// Serialization of these closed shapes cannot fail; an error here would be
/// a programming bug, so it is surfaced as one.
pub fn encode_response(response: &ApiResponse) -> Vec<u8> {
    serde_json::to_vec(response).expect("ApiResponse serialization is infallible")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_read_log() {
        let body = br#"{"request_type":"read_log"}"#;
        assert_eq!(decode_request(body).unwrap(), ApiRequest::ReadLog);
    }

    #[test]
    fn decodes_run_in_volatile_host() {
        let body = br#"{"request_type":"run_in_volatile_host","payload":"1 + 1"}"#;
        assert_eq!(
            decode_request(body).unwrap(),
            ApiRequest::RunInVolatileHost {
                payload: "1 + 1".to_string()
            }
        );
    }

    #[test]
    fn rejects_invalid_json() {
        let err = decode_request(b"not json").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
        assert!(err.to_string().contains("not a valid API request"));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let err = decode_request(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, DecodeError::Utf8(_)));
    }

    #[test]
    fn rejects_unknown_request_type() {
        let err = decode_request(br#"{"request_type":"frobnicate"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn encodes_setup_not_complete() {
        let response = ApiResponse::SetupNotComplete {
            message: "worker not yet provisioned".to_string(),
        };
        let encoded = encode_response(&response);
        let round_tripped: ApiResponse = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(round_tripped, response);
    }

    #[test]
    fn run_complete_carries_error_description() {
        let response = ApiResponse::RunInVolatileHostComplete {
            result: RunResult {
                value: None,
                error: Some("instruction failed".to_string()),
            },
        };
        let text = String::from_utf8(encode_response(&response)).unwrap();
        assert!(text.contains("run_in_volatile_host_complete"));
        assert!(text.contains("instruction failed"));
    }
}
