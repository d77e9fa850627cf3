use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::auth::Credentials;
use crate::error::ApiError;
use crate::services::CARDS_PATH;

/// Whether a path falls under `/cashcards/**`, matched or not.
pub fn is_protected(path: &str) -> bool {
    path.strip_prefix(CARDS_PATH)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// HTTP Basic authentication for everything under the card collection.
///
/// Runs ahead of routing, so unmatched card paths are challenged too. Verifies
/// credentials against the identity provider, enforces the configured role,
/// then injects the `Principal` into request extensions for handlers.
pub async fn basic_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if !is_protected(request.uri().path()) {
        return next.run(request).await;
    }

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let credentials = match Credentials::from_basic_header(header_value) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!("Rejecting request to {}: {}", request.uri().path(), e);
            return unauthorized(&state.security.realm, e.to_string());
        }
    };

    let Some(principal) = state.identities.authenticate(&credentials) else {
        tracing::warn!("Authentication failed for user '{}'", credentials.username);
        return unauthorized(&state.security.realm, "Invalid username or password");
    };

    if let Some(role) = state.security.required_role.as_deref() {
        if !state.identities.authorize(&principal, role) {
            tracing::warn!("User '{}' lacks required role '{}'", principal.name, role);
            return ApiError::forbidden(format!("Role '{}' required", role)).into_response();
        }
    }

    tracing::debug!("Authenticated '{}'", principal.name);
    request.extensions_mut().insert(principal);

    next.run(request).await
}

fn unauthorized(realm: &str, message: impl Into<String>) -> Response {
    let mut response = ApiError::unauthorized(message).into_response();
    let challenge = HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm))
        .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
    response.headers_mut().insert(header::WWW_AUTHENTICATE, challenge);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protects_the_whole_card_tree() {
        assert!(is_protected("/cashcards"));
        assert!(is_protected("/cashcards/"));
        assert!(is_protected("/cashcards/99"));
        assert!(is_protected("/cashcards/99/x"));
        assert!(!is_protected("/cashcardsx"));
        assert!(!is_protected("/health"));
        assert!(!is_protected("/"));
    }
}
