//! Response classification.
//!
//! - No IO
//! - No panics
//!
//! Turns whatever came back from the transport into either a payload or a
//! [`ClientError`] carrying the message the user should see.

use serde_json::Value;

use crate::envelope::{CODE_OK, CODE_SESSION_EXPIRED, ResponseEnvelope};
use crate::error::{ClientError, TransportCause, TransportFailure};
use crate::transport::{RawResponse, TransportError};

pub const MSG_BAD_REQUEST: &str = "bad request parameters";
pub const MSG_UNAUTHORIZED: &str = "unauthorized, please log in";
pub const MSG_FORBIDDEN: &str = "access denied";
pub const MSG_NOT_FOUND: &str = "requested address does not exist";
pub const MSG_SERVER_ERROR: &str = "internal server error";
pub const MSG_TIMEOUT: &str = "request timed out";
pub const MSG_NETWORK: &str = "network error";
pub const MSG_FALLBACK: &str = "request failed";

/// Parse a structured response body.
pub fn decode_envelope(body: &[u8]) -> Result<ResponseEnvelope, ClientError> {
    serde_json::from_slice(body).map_err(|e| ClientError::decode(e.to_string()))
}

/// Success unwraps `data`; `401` is a session expiry; anything else fails
/// with the server's message.
pub fn classify_envelope(envelope: ResponseEnvelope) -> Result<Value, ClientError> {
    let message = envelope.message_text().unwrap_or(MSG_FALLBACK).to_string();
    match envelope.code {
        CODE_OK => Ok(envelope.data),
        CODE_SESSION_EXPIRED => Err(ClientError::SessionExpired { message }),
        code => Err(ClientError::Remote { code, message }),
    }
}

/// A non-2xx HTTP status.
///
/// Known statuses get fixed messages; others use the body's `message` when it
/// parses as an envelope.
pub fn classify_status(status: u16, body: &[u8]) -> TransportFailure {
    let message = match status {
        400 => MSG_BAD_REQUEST.to_string(),
        401 => MSG_UNAUTHORIZED.to_string(),
        403 => MSG_FORBIDDEN.to_string(),
        404 => MSG_NOT_FOUND.to_string(),
        500 => MSG_SERVER_ERROR.to_string(),
        _ => serde_json::from_slice::<ResponseEnvelope>(body)
            .ok()
            .and_then(|env| env.message_text().map(str::to_string))
            .unwrap_or_else(|| MSG_FALLBACK.to_string()),
    };
    TransportFailure {
        cause: TransportCause::Status(status),
        message,
    }
}

pub fn classify_transport_error(err: &TransportError) -> TransportFailure {
    match err {
        TransportError::Timeout(_) => TransportFailure {
            cause: TransportCause::Timeout,
            message: MSG_TIMEOUT.to_string(),
        },
        TransportError::Network(_) => TransportFailure {
            cause: TransportCause::Network,
            message: MSG_NETWORK.to_string(),
        },
    }
}

/// Classify a structured response end to end.
pub fn classify_response(response: &RawResponse) -> Result<Value, ClientError> {
    if !response.is_success() {
        return Err(classify_status(response.status, &response.body).into());
    }
    classify_envelope(decode_envelope(&response.body)?)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn envelope(value: Value) -> ResponseEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn success_unwraps_data() {
        let data = classify_envelope(envelope(json!({ "code": 200, "data": { "id": 1 } }))).unwrap();
        assert_eq!(data, json!({ "id": 1 }));
    }

    #[test]
    fn failure_carries_server_message() {
        let err = classify_envelope(envelope(json!({ "code": 500, "message": "boom" }))).unwrap_err();
        assert_eq!(
            err,
            ClientError::Remote {
                code: 500,
                message: "boom".to_string()
            }
        );
        assert_eq!(err.user_message(), "boom");
    }

    #[test]
    fn blank_message_falls_back() {
        let err = classify_envelope(envelope(json!({ "code": 1001, "message": "" }))).unwrap_err();
        assert_eq!(err.user_message(), MSG_FALLBACK);
    }

    #[test]
    fn envelope_401_is_session_expiry() {
        let err = classify_envelope(envelope(json!({ "code": 401, "message": "token expired" }))).unwrap_err();
        assert!(err.is_session_expired());
    }

    #[test]
    fn known_statuses_have_fixed_messages() {
        let cases = [
            (400, MSG_BAD_REQUEST),
            (401, MSG_UNAUTHORIZED),
            (403, MSG_FORBIDDEN),
            (404, MSG_NOT_FOUND),
            (500, MSG_SERVER_ERROR),
        ];
        for (status, expected) in cases {
            let failure = classify_status(status, br#"{"code":1,"message":"ignored"}"#);
            assert_eq!(failure.cause, TransportCause::Status(status));
            assert_eq!(failure.message, expected);
        }
    }

    #[test]
    fn other_statuses_use_body_message() {
        assert_eq!(
            classify_status(502, br#"{"code":502,"message":"upstream down"}"#).message,
            "upstream down"
        );
        assert_eq!(classify_status(503, b"<html>").message, MSG_FALLBACK);
    }

    #[test]
    fn http_401_is_not_a_session_expiry() {
        let response = RawResponse {
            status: 401,
            content_type: None,
            body: Vec::new(),
        };
        let err = classify_response(&response).unwrap_err();
        assert!(!err.is_session_expired());
        assert_eq!(err.user_message(), MSG_UNAUTHORIZED);
    }

    #[test]
    fn transport_errors_by_cause() {
        let timeout = classify_transport_error(&TransportError::Timeout("60s".into()));
        assert_eq!(timeout.cause, TransportCause::Timeout);
        assert_eq!(timeout.message, MSG_TIMEOUT);

        let network = classify_transport_error(&TransportError::Network("refused".into()));
        assert_eq!(network.cause, TransportCause::Network);
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let response = RawResponse::json(200, &json!("not an envelope"));
        assert!(matches!(classify_response(&response), Err(ClientError::Decode(_))));
    }

    proptest! {
        /// Property: only code 200 yields data, and only 401 asks for
        /// re-authentication.
        #[test]
        fn envelope_codes_partition(code in -1000i64..1000, message in ".{0,24}") {
            let result = classify_envelope(ResponseEnvelope {
                code,
                message: Some(message),
                data: json!({ "x": 1 }),
            });
            prop_assert_eq!(result.is_ok(), code == CODE_OK);
            prop_assert_eq!(
                result.err().is_some_and(|e| e.is_session_expired()),
                code == CODE_SESSION_EXPIRED
            );
        }
    }
}
