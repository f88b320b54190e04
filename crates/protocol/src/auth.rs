//! Login exchange bodies.

use serde::{Deserialize, Serialize};

/// Body of `POST /user/login`.
///
/// ```json
/// { "key": "<64 character access key>" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Access key derived from the account credentials
    pub key: String,
}

/// Successful (`201`) response of `POST /user/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

/// Error body returned by the service alongside non-2xx statuses.
///
/// ```json
/// { "statusCode": 400, "message": "..." }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "statusCode", default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_reads_camel_case_token() {
        let body: LoginResponse = serde_json::from_str(r#"{"accessToken":"tok"}"#).unwrap();
        assert_eq!(body.access_token, "tok");
    }

    #[test]
    fn error_body_tolerates_missing_fields() {
        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body, ErrorBody::default());

        let body: ErrorBody = serde_json::from_str(r#"{"statusCode":409,"message":"busy"}"#).unwrap();
        assert_eq!(body.status_code, Some(409));
        assert_eq!(body.message, "busy");
    }
}
