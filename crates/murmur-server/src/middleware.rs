use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::{ApiError, ACCESS_CODE_ERROR};
use crate::AppState;

/// Header accepted as an alternative to `Authorization: Bearer`.
pub const ACCESS_CODE_HEADER: &str = "X-Access-Code";

/// Pulls the presented access code from `X-Access-Code` or `Authorization: Bearer`.
fn presented_code(headers: &HeaderMap) -> Option<&str> {
    if let Some(val) = headers.get(ACCESS_CODE_HEADER) {
        return val.to_str().ok();
    }
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.strip_prefix("Bearer "))
}

/// Middleware guarding the speech endpoints with the shared access code.
///
/// A deployment without a configured code lets every request through.
pub async fn access_code_middleware(req: Request<Body>, next: Next) -> Response {
    let Some(state) = req.extensions().get::<Arc<AppState>>().cloned() else {
        return ApiError::InternalServerError("application state missing".to_string())
            .into_response();
    };

    if let Some(expected) = state.access_code.as_deref() {
        if presented_code(req.headers()) != Some(expected) {
            tracing::warn!(path = %req.uri().path(), code = ACCESS_CODE_ERROR, "rejected request");
            return ApiError::AccessDenied.into_response();
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_and_custom_header_are_both_read() {
        let mut headers = HeaderMap::new();
        assert_eq!(presented_code(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        assert_eq!(presented_code(&headers), Some("abc"));

        headers.insert(ACCESS_CODE_HEADER, HeaderValue::from_static("xyz"));
        assert_eq!(presented_code(&headers), Some("xyz"));
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(presented_code(&headers), None);
    }
}
