//! Extracts the grid context and request state from an HTTP request.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::{FromRequestParts, OriginalUri, Query};
use axum::http::request::Parts;
use gridshape_core::{GridContext, GridRequest, Principal};

/// Name of the query parameter carrying the encoded grid state.
pub const STATE_PARAM: &str = "q";

/// Grid context plus decoded client state for the current request.
///
/// The grid reference is the request path without surrounding slashes; the
/// principal, if any, is read from request extensions where an
/// authentication layer is expected to put it. A missing or undecodable `q`
/// parameter yields an empty request, so extraction never fails.
#[derive(Debug, Clone)]
pub struct GridParams {
    pub context: GridContext,
    pub request: GridRequest,
}

impl<S> FromRequestParts<S> for GridParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |original| &original.0);
        let encoded = Query::<HashMap<String, String>>::try_from_uri(uri)
            .ok()
            .and_then(|Query(mut params)| params.remove(STATE_PARAM));
        let request = GridRequest::decode_lenient(encoded.as_deref());
        let principal = parts.extensions.get::<Principal>().cloned();

        Ok(Self {
            context: GridContext::from_path(uri.path(), principal),
            request,
        })
    }
}

/// Encodes `request` for use as the `q` query parameter, percent-encoded so
/// the base64 `+`, `/` and `=` survive query parsing.
///
/// # Errors
///
/// Returns an error if the request cannot be serialized.
pub fn encode_state(request: &GridRequest) -> Result<String, gridshape_core::RequestError> {
    Ok(urlencoding::encode(&request.encode()?).into_owned())
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use serde_json::json;

    use super::*;

    async fn extract(request: Request<()>) -> GridParams {
        let (mut parts, ()) = request.into_parts();
        GridParams::from_request_parts(&mut parts, &())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn decodes_state_and_principal() {
        let request: GridRequest =
            serde_json::from_value(json!({"page": 2, "sortBy": {"u.name": "desc"}})).unwrap();
        let uri = format!("/admin/users?q={}", encode_state(&request).unwrap());
        let params = extract(
            Request::builder()
                .uri(uri)
                .extension(Principal {
                    id: "42".to_string(),
                    roles: vec!["admin".to_string()],
                })
                .body(())
                .unwrap(),
        )
        .await;
        assert_eq!(params.context.table_ref, "admin/users");
        assert_eq!(params.context.config_key().identity.as_deref(), Some("42"));
        assert_eq!(params.request, request);
        assert!(params.request.has_user_sort());
    }

    #[tokio::test]
    async fn encoded_state_is_query_safe_and_keeps_sort_order() {
        let request: GridRequest = serde_json::from_str(
            r#"{"sortBy": {"u.name": "desc", "u.age": "asc"}, "search": {"term": "??>>~"}}"#,
        )
        .unwrap();
        let encoded = encode_state(&request).unwrap();
        assert!(!encoded.contains(['+', '/', '=']));

        let params = extract(
            Request::builder()
                .uri(format!("/admin/users?q={encoded}"))
                .body(())
                .unwrap(),
        )
        .await;
        let keys: Vec<&str> = params
            .request
            .sort_by
            .as_ref()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["u.name", "u.age"]);
        assert_eq!(params.request.search.unwrap().term, "??>>~");
    }

    #[tokio::test]
    async fn garbage_state_degrades_to_empty_request() {
        let params = extract(
            Request::builder()
                .uri("/reports/?q=not-base64!")
                .body(())
                .unwrap(),
        )
        .await;
        assert_eq!(params.context.table_ref, "reports");
        assert!(params.context.principal.is_none());
        assert_eq!(params.request, GridRequest::default());
    }

    #[tokio::test]
    async fn missing_state_is_empty_request() {
        let params = extract(Request::builder().uri("/users").body(()).unwrap()).await;
        assert_eq!(params.request, GridRequest::default());
    }
}
