//! Inbound grid request payload.
//!
//! Clients send their grid state as a base64-encoded JSON object in the `q`
//! query parameter. Every field is optional; absent fields fall back to the
//! configured state source or to defaults.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::{empty_list_as_default, lenient_int};
use crate::state::{Filters, SearchState, SortBy};
use crate::types::Value;

/// Failure to decode the `q` request parameter.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("grid request is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("grid request is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Grid state as sent by the client (or stored in the session).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRequest {
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "lenient_int"
    )]
    pub page: Option<i64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "lenient_int"
    )]
    pub items_per_page: Option<i64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "empty_list_as_default"
    )]
    pub search: Option<SearchState>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "empty_list_as_default"
    )]
    pub sort_by: Option<SortBy>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "empty_list_as_default"
    )]
    pub filters: Option<Filters>,
    /// Layout reset signal. `1` (number or string) clears the current layout.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rl: Option<Value>,
}

/// Grid state kept in the session store has the same shape as a request.
pub type SessionState = GridRequest;

impl GridRequest {
    /// Decodes the base64 JSON carried in the `q` parameter.
    ///
    /// Both the standard and the URL-safe unpadded alphabets are accepted.
    /// An empty parameter, or one that decodes to JSON `null`, yields an
    /// empty request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] if the input is neither valid base64 nor
    /// decodes to a JSON object of the expected shape.
    pub fn decode(encoded: &str) -> Result<Self, RequestError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Ok(Self::default());
        }
        let bytes = match STANDARD.decode(encoded) {
            Ok(bytes) => bytes,
            Err(_) => URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('='))?,
        };
        // Objects keep insertion order (`preserve_order`), so sortBy priority
        // survives the detour through `Value`.
        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Null => Ok(Self::default()),
            Value::Array(items) if items.is_empty() => Ok(Self::default()),
            other => Ok(serde_json::from_value(other)?),
        }
    }

    /// Like [`GridRequest::decode`] but degrades to an empty request, logging
    /// the failure. A missing parameter is not an error.
    #[must_use]
    pub fn decode_lenient(encoded: Option<&str>) -> Self {
        match encoded.map(Self::decode) {
            None => Self::default(),
            Some(Ok(request)) => request,
            Some(Err(err)) => {
                tracing::warn!(error = %err, "ignoring undecodable grid request");
                Self::default()
            }
        }
    }

    /// Encodes this request the way clients do (standard base64 of the JSON).
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String, RequestError> {
        Ok(STANDARD.encode(serde_json::to_vec(self)?))
    }

    /// Whether the client asked for the active layout to be cleared (`rl=1`).
    #[must_use]
    pub fn wants_layout_reset(&self) -> bool {
        match &self.rl {
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok() == Some(1),
            Some(Value::Bool(b)) => *b,
            _ => false,
        }
    }

    /// Whether the client supplied a non-empty `sortBy`.
    #[must_use]
    pub fn has_user_sort(&self) -> bool {
        self.sort_by.as_ref().is_some_and(|s| !s.is_empty())
    }
}
