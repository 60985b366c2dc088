// src/utils/guard.rs

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::user::Role,
    state::AppState,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Capability, bearer_token, verify_jwt},
    },
};

/// Entry point unauthenticated test takers are sent to.
pub const LOGIN_ROUTE: &str = "/login";
/// Entry point for the admin panel login.
pub const ADMIN_LOGIN_ROUTE: &str = "/admin/login";

/// Outcome of a route guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted(Capability),
    /// The check could not be resolved in time; the client should wait and retry.
    Pending,
    Denied {
        status: StatusCode,
        redirect: &'static str,
    },
}

impl IntoResponse for Access {
    fn into_response(self) -> Response {
        match self {
            Access::Granted(_) => StatusCode::NO_CONTENT.into_response(),
            Access::Pending => (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, "1")],
                Json(json!({ "error": "Checking access, please wait", "pending": true })),
            )
                .into_response(),
            Access::Denied { status, redirect } => (
                status,
                Json(json!({ "error": "Access denied", "redirect": redirect })),
            )
                .into_response(),
        }
    }
}

/// Gate for the test-taking flow.
pub fn check_authenticated(capability: Option<Capability>) -> Access {
    match capability {
        Some(cap) => Access::Granted(cap),
        None => Access::Denied {
            status: StatusCode::UNAUTHORIZED,
            redirect: LOGIN_ROUTE,
        },
    }
}

/// Gate for the admin panel. `confirmed` is the backend's answer to "is this
/// capability still an admin?", `None` while it is unresolved.
pub fn check_admin(capability: Option<Capability>, confirmed: Option<bool>) -> Access {
    let denied = Access::Denied {
        status: StatusCode::FORBIDDEN,
        redirect: ADMIN_LOGIN_ROUTE,
    };
    match (capability, confirmed) {
        (None, _) => Access::Denied {
            status: StatusCode::UNAUTHORIZED,
            redirect: ADMIN_LOGIN_ROUTE,
        },
        (Some(cap), _) if !cap.is_admin() => denied,
        (Some(_), None) => Access::Pending,
        (Some(cap), Some(true)) => Access::Granted(cap),
        (Some(_), Some(false)) => denied,
    }
}

fn capability_from_request(req: &Request<Body>, secret: &str) -> Option<Capability> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = bearer_token(header)?;
    verify_jwt(token, secret)
        .and_then(Capability::try_from)
        .ok()
}

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header and injects the
/// `Capability` into the request extensions. Otherwise 401 with a login redirect.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match check_authenticated(capability_from_request(&req, &state.config.jwt_secret)) {
        Access::Granted(capability) => {
            req.extensions_mut().insert(capability);
            next.run(req).await
        }
        rejected => rejected.into_response(),
    }
}

/// Axum Middleware: Admin Authorization.
///
/// Requires an admin capability and re-confirms it with the configured
/// `AdminAuthenticator`. A confirmation that does not finish within
/// `auth_check_timeout_ms` answers 503 instead of serving protected content.
pub async fn admin_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let capability = capability_from_request(&req, &state.config.jwt_secret);

    let confirmed = match &capability {
        Some(cap) if cap.is_admin() => {
            let limit = Duration::from_millis(state.config.auth_check_timeout_ms);
            match tokio::time::timeout(limit, state.admin_auth.confirm(cap)).await {
                Ok(Ok(still_admin)) => Some(still_admin),
                Ok(Err(e)) => {
                    tracing::warn!("Admin confirmation failed: {}", e);
                    None
                }
                Err(_) => {
                    tracing::warn!("Admin confirmation timed out");
                    None
                }
            }
        }
        _ => None,
    };

    match check_admin(capability, confirmed) {
        Access::Granted(capability) => {
            req.extensions_mut().insert(capability);
            next.run(req).await
        }
        rejected => rejected.into_response(),
    }
}

/// Pluggable admin credential backend.
#[async_trait]
pub trait AdminAuthenticator: Send + Sync {
    /// Checks admin credentials and returns the subject id to issue a token for.
    async fn authenticate(&self, username: &str, password: &str) -> Result<i64, AppError>;

    /// Confirms that an issued capability still belongs to an admin.
    async fn confirm(&self, capability: &Capability) -> Result<bool, AppError>;
}

/// Admins are users with role `admin`; the role is re-read on every check.
#[derive(Debug, Clone)]
pub struct DbAdminAuthenticator {
    pool: SqlitePool,
}

impl DbAdminAuthenticator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AdminCandidate {
    id: i64,
    password: String,
    role: Role,
}

#[async_trait]
impl AdminAuthenticator for DbAdminAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> Result<i64, AppError> {
        let candidate = sqlx::query_as::<_, AdminCandidate>(
            "SELECT id, password, role FROM users WHERE email = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

        if !verify_password(password, &candidate.password)? {
            return Err(AppError::AuthError("Invalid credentials".to_string()));
        }
        if candidate.role != Role::Admin {
            return Err(AppError::Forbidden("Access denied: not an admin".to_string()));
        }
        Ok(candidate.id)
    }

    async fn confirm(&self, capability: &Capability) -> Result<bool, AppError> {
        let role: Option<Role> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(capability.user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role == Some(Role::Admin))
    }
}

/// A single admin configured through `ADMIN_USERNAME` / `ADMIN_PASSWORD`.
pub struct StaticAdminAuthenticator {
    username: String,
    password_hash: String,
}

impl StaticAdminAuthenticator {
    /// Subject id carried by tokens issued to the static admin.
    pub const SUBJECT: i64 = 0;

    pub fn new(username: &str, password: &str) -> Result<Self, AppError> {
        Ok(Self {
            username: username.to_string(),
            password_hash: hash_password(password)?,
        })
    }
}

#[async_trait]
impl AdminAuthenticator for StaticAdminAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> Result<i64, AppError> {
        if username == self.username && verify_password(password, &self.password_hash)? {
            Ok(Self::SUBJECT)
        } else {
            Err(AppError::AuthError("Invalid credentials".to_string()))
        }
    }

    async fn confirm(&self, capability: &Capability) -> Result<bool, AppError> {
        Ok(capability.user_id == Self::SUBJECT && capability.is_admin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap(role: Role) -> Capability {
        Capability {
            user_id: 1,
            role,
            expires_at: usize::MAX,
        }
    }

    #[test]
    fn unauthenticated_test_access_redirects_to_login() {
        assert_eq!(
            check_authenticated(None),
            Access::Denied {
                status: StatusCode::UNAUTHORIZED,
                redirect: LOGIN_ROUTE
            }
        );
        assert!(matches!(check_authenticated(Some(cap(Role::User))), Access::Granted(_)));
    }

    #[test]
    fn admin_gate_outcomes() {
        assert!(matches!(
            check_admin(None, None),
            Access::Denied { redirect: ADMIN_LOGIN_ROUTE, .. }
        ));
        assert!(matches!(
            check_admin(Some(cap(Role::User)), Some(true)),
            Access::Denied { status: StatusCode::FORBIDDEN, .. }
        ));
        assert_eq!(check_admin(Some(cap(Role::Admin)), None), Access::Pending);
        assert!(matches!(
            check_admin(Some(cap(Role::Admin)), Some(false)),
            Access::Denied { .. }
        ));
        assert!(matches!(
            check_admin(Some(cap(Role::Admin)), Some(true)),
            Access::Granted(_)
        ));
    }

    #[test]
    fn pending_asks_the_client_to_retry() {
        let response = Access::Pending.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }

    #[tokio::test]
    async fn static_admin_checks_credentials() {
        let auth = StaticAdminAuthenticator::new("root", "hunter22").unwrap();
        assert_eq!(auth.authenticate("root", "hunter22").await.unwrap(), 0);
        assert!(auth.authenticate("root", "wrong").await.is_err());
        assert!(auth.authenticate("admin", "hunter22").await.is_err());

        let mut capability = cap(Role::Admin);
        capability.user_id = StaticAdminAuthenticator::SUBJECT;
        assert!(auth.confirm(&capability).await.unwrap());
        assert!(!auth.confirm(&cap(Role::Admin)).await.unwrap());
    }
}
