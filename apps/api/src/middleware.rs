use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use hirely_core::{AppError, AppResult, UserIdentity};

use crate::error::ApiResult;
use crate::state::AppState;

pub const GATEWAY_SECRET_HEADER: &str = "x-gateway-secret";
pub const AUTH_SUBJECT_HEADER: &str = "x-auth-subject";
pub const AUTH_NAME_HEADER: &str = "x-auth-name";
pub const AUTH_EMAIL_HEADER: &str = "x-auth-email";

/// Accepts staff identity asserted by the upstream gateway.
pub async fn require_gateway_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = identity_from_headers(request.headers(), state.gateway_shared_secret.as_str())?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if headers.get("sec-fetch-site") == Some(&HeaderValue::from_static("cross-site")) {
            return Err(AppError::Forbidden("cross-site request blocked".to_owned()).into());
        }

        let origin = header_text(headers, header::ORIGIN.as_str()).unwrap_or_default();
        let referer = header_text(headers, header::REFERER.as_str()).unwrap_or_default();

        let allowed_origin = state.frontend_url.as_str();
        if origin != allowed_origin && !referer.starts_with(allowed_origin) {
            return Err(AppError::Forbidden("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

pub(crate) fn identity_from_headers(
    headers: &HeaderMap,
    expected_secret: &str,
) -> AppResult<UserIdentity> {
    let presented = header_text(headers, GATEWAY_SECRET_HEADER)
        .ok_or_else(|| AppError::Unauthorized("gateway credentials missing".to_owned()))?;
    if !secrets_match(presented, expected_secret) {
        return Err(AppError::Unauthorized(
            "gateway credentials rejected".to_owned(),
        ));
    }

    let subject = header_text(headers, AUTH_SUBJECT_HEADER)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
    let display_name = header_text(headers, AUTH_NAME_HEADER)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(subject);
    let email = header_text(headers, AUTH_EMAIL_HEADER)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    Ok(UserIdentity::new(subject, display_name, email))
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn secrets_match(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0_u8, |difference, (left, right)| difference | (left ^ right))
            == 0
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
