/// Bearer authentication middleware for Axum
///
/// Tokens travel in the standard `Authorization: Bearer <token>` header. The
/// middleware validates them with the shared [`TokenService`] and adds the
/// recovered [`ClaimsSet`] to request extensions, where handlers and role
/// guards pick it up.
///
/// Every authentication failure produces the same `401` response; the reason
/// is only logged.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Extension, Router};
/// use quill_shared::auth::claims::ClaimsSet;
/// use quill_shared::auth::jwt::{JwtService, SigningKey, TokenService};
/// use quill_shared::auth::middleware::{bearer_auth, require_role_middleware};
/// use quill_shared::models::user::Role;
///
/// async fn drafts(Extension(claims): Extension<ClaimsSet>) -> String {
///     format!("Drafts for {}", claims.id)
/// }
///
/// let tokens: Arc<dyn TokenService> = Arc::new(JwtService::new(&SigningKey::generate()));
///
/// let app: Router = Router::new()
///     .route("/drafts", get(drafts))
///     .layer(middleware::from_fn(require_role_middleware(Role::Editor)))
///     .layer(middleware::from_fn_with_state(tokens, bearer_auth));
/// ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error};

use super::authorization::{require_role, AuthzError};
use super::claims::ClaimsSet;
use super::jwt::TokenService;
use crate::error::AuthError;
use crate::models::user::Role;

/// Authentication scheme expected in the `Authorization` header
pub const BEARER_SCHEME: &str = "Bearer";

/// Extracts the token from an `Authorization` header value
///
/// The scheme is matched case-insensitively.
///
/// # Errors
///
/// Returns `AuthError::TokenInvalid` if the scheme is not `Bearer` or the
/// token is empty.
///
/// # Example
///
/// ```
/// use quill_shared::auth::middleware::extract_bearer_token;
///
/// assert_eq!(extract_bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
/// assert!(extract_bearer_token("Basic dXNlcjpwYXNz").is_err());
/// ```
pub fn extract_bearer_token(header_value: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header_value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::TokenInvalid)?;

    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(AuthError::TokenInvalid);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::TokenInvalid);
    }

    Ok(token)
}

/// Bearer authentication middleware
///
/// # Errors
///
/// Returns `401 Unauthorized` if the header is missing, malformed, or the
/// token fails validation.
pub async fn bearer_auth(
    State(tokens): State<Arc<dyn TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            debug!("Request without usable authorization header");
            AuthError::TokenInvalid
        })?;

    let token = extract_bearer_token(auth_header)?;
    let claims = tokens.validate_token(token)?;

    debug!(sub = %claims.id, role = %claims.role, "Authenticated request");
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Boxed middleware future returned by [`require_role_middleware`]
pub type MiddlewareFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Creates a role guard to layer inside [`bearer_auth`]
///
/// Requests without claims are rejected as unauthenticated; requests whose
/// role is too low get `403 Forbidden`.
pub fn require_role_middleware(
    required: Role,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone + Send + Sync + 'static {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let Some(claims) = req.extensions().get::<ClaimsSet>() else {
                return AuthError::TokenInvalid.into_response();
            };

            if let Err(e) = require_role(claims, required) {
                debug!(sub = %claims.id, error = %e, "Request denied");
                return e.into_response();
            }

            next.run(req).await
        })
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::AuthenticationFailure | AuthError::TokenInvalid => {
                (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string())
            }
            AuthError::ValidationFailure(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AuthError::ConfigurationFault(_) | AuthError::Internal(_) => {
                // Log internal errors but don't expose details to clients
                error!("Internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let mut response = (status, Json(json!({ "error": code, "message": message }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(BEARER_SCHEME),
            );
        }
        response
    }
}

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "forbidden", "message": "Insufficient permissions" })),
        )
            .into_response()
    }
}
