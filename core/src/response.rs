//! Status classification and body decoding.
//!
//! # Design
//! These functions are pure: they take an `HttpResponse` and return a
//! value or one `ApiError`. The status code is always classified before the
//! body is looked at. Side effects of a classification (telling the session
//! observer about a 401) belong to `ApiClient`, not here.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;

use crate::envelope::{Empty, Envelope};
use crate::error::{ApiError, GENERIC_FAILURE_MESSAGE, GENERIC_SERVER_MESSAGE};
use crate::http::HttpResponse;

/// Map the status code to `Ok` (2xx) or the matching `ApiError`.
///
/// 422 and 5xx bodies are read for field errors and a message respectively.
pub fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    match response.status {
        200..=299 => Ok(()),
        401 => Err(ApiError::Unauthorized),
        403 => Err(ApiError::Forbidden),
        404 => Err(ApiError::NotFound),
        422 => match serde_json::from_slice::<Envelope<IgnoredAny>>(&response.body) {
            Ok(Envelope {
                errors: Some(errors),
                ..
            }) => Err(ApiError::Validation(errors)),
            _ => Err(ApiError::InvalidData),
        },
        500..=599 => {
            let message = serde_json::from_slice::<Envelope<IgnoredAny>>(&response.body)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or_else(|| GENERIC_SERVER_MESSAGE.to_string());
            Err(ApiError::Server(message))
        }
        status if !(100..=599).contains(&status) => Err(ApiError::InvalidResponse),
        status => Err(ApiError::UnknownStatus(status)),
    }
}

/// Decode the payload of a successful call.
///
/// The body is first read as an `Envelope<T>` and unwrapped. If it is not
/// envelope-shaped it is read as a bare `T`; if that fails too, the error
/// from the envelope attempt is the one reported.
pub fn parse_data<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    check_status(response)?;

    match serde_json::from_slice::<Envelope<T>>(&response.body) {
        Ok(envelope) => unwrap_envelope(envelope),
        Err(envelope_err) => serde_json::from_slice::<T>(&response.body)
            .map_err(|_| ApiError::Decoding(envelope_err)),
    }
}

/// Decode the raw envelope without unwrapping `data` and without falling
/// back to a bare payload.
pub fn parse_envelope<T: DeserializeOwned>(response: &HttpResponse) -> Result<Envelope<T>, ApiError> {
    check_status(response)?;
    serde_json::from_slice(&response.body).map_err(ApiError::Decoding)
}

/// Accept any successful response. A blank body (e.g. 204) is fine.
pub fn parse_empty(response: &HttpResponse) -> Result<(), ApiError> {
    check_status(response)?;

    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    parse_data::<Empty>(response).map(|_| ())
}

fn unwrap_envelope<T: DeserializeOwned>(envelope: Envelope<T>) -> Result<T, ApiError> {
    if envelope.success {
        return match envelope.data {
            Some(data) => Ok(data),
            // lets `Option<_>` and `Empty` payloads through
            None => T::deserialize(serde_json::Value::Null).map_err(|_| ApiError::InvalidData),
        };
    }

    match envelope.errors {
        Some(errors) => Err(ApiError::Validation(errors)),
        None => Err(ApiError::Server(
            envelope
                .message
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
        )),
    }
}
