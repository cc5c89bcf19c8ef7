//! # Authentication API Handlers
//!
//! Login and the current-user endpoint.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Principal, issue_access_token};
use crate::error::{ApiError, unauthorized};
use crate::features::SidebarFeature;
use crate::handlers::types::{CompanyResponse, SidebarResponse, UserResponse};
use crate::password::PasswordService;
use crate::repositories::{FeatureGrantRepository, UserRepository};
use crate::server::AppState;

const INVALID_CREDENTIALS: &str = "Please enter a correct username and password.";

/// Login credentials
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "owner")]
    pub username: String,
    pub password: String,
}

/// Issued bearer token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Expiry as a Unix timestamp in seconds
    pub expires_at: i64,
}

impl TokenResponse {
    pub fn bearer(access_token: String, expires_at: i64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_at,
        }
    }
}

/// The authenticated caller with their company, permissions and sidebar
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserResponse,
    pub company: Option<CompanyResponse>,
    /// Effective permissions in `app_label.codename` form, sorted
    pub permissions: Vec<String>,
    pub sidebar: Vec<SidebarFeature>,
}

/// Exchange a username and password for an access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Malformed request", body = ApiError),
        (status = 401, description = "Invalid credentials", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(request) = payload?;

    let user = UserRepository::new(&state.db)
        .find_by_username(request.username.trim())
        .await?;

    // One Argon2 verification on every path keeps response time independent
    // of whether the username exists.
    let stored_hash = user.as_ref().map(|user| user.password_hash.clone());
    let verified = PasswordService::verify_blocking(&request.password, stored_hash).await;

    let Some(user) = user.filter(|user| verified && user.is_active) else {
        counter!("login_attempts_total", "outcome" => "failure").increment(1);
        tracing::info!(username = %request.username, "Login rejected");
        return Err(unauthorized(Some(INVALID_CREDENTIALS)));
    };

    let (token, expires_at) = issue_access_token(&state.config, user.id).map_err(|e| {
        tracing::error!(error = %e, "Failed to issue access token");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "Failed to issue access token",
        )
    })?;

    counter!("login_attempts_total", "outcome" => "success").increment(1);
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(TokenResponse::bearer(token, expires_at)))
}

/// Describe the authenticated caller
#[utoipa::path(
    get,
    path = "/api/v1/me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<MeResponse>, ApiError> {
    let sidebar = match &principal.company {
        Some(company) => {
            FeatureGrantRepository::new(&state.db)
                .sidebar_features(company.id)
                .await?
        }
        None => Vec::new(),
    };

    Ok(Json(MeResponse {
        permissions: principal.permissions.codes(),
        company: principal.company.map(CompanyResponse::from),
        user: principal.user.into(),
        sidebar,
    }))
}

/// Sidebar entries for the authenticated caller
#[utoipa::path(
    get,
    path = "/api/v1/sidebar",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Enabled, routed features of the caller's company", body = SidebarResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn sidebar(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<SidebarResponse>, ApiError> {
    let data = match &principal.company {
        Some(company) => {
            FeatureGrantRepository::new(&state.db)
                .sidebar_features(company.id)
                .await?
        }
        None => Vec::new(),
    };
    Ok(Json(SidebarResponse { data }))
}
