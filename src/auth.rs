//! # Authentication and Authorization
//!
//! Bearer JWT authentication for the API. The middleware resolves the token
//! to a [`Principal`] (user, company and effective permissions) stored in the
//! request extensions; handlers pull it out with the [`Principal`] or
//! [`TenantScope`] extractors and check permissions with
//! [`Principal::require`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::access::{Permission, PermissionSet};
use crate::config::AppConfig;
use crate::error::{ApiError, feature_disabled, forbidden, unauthorized};
use crate::features::WAREHOUSE_FEATURE;
use crate::models::{company, user};
use crate::repositories::{FeatureGrantRepository, PermissionRepository, UserRepository};
use crate::server::AppState;
use crate::tenancy::resolve_company;

pub const NO_COMPANY_MESSAGE: &str = "User is not associated with a company.";

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret is not configured")]
    MissingSecret,
    #[error("Token creation failed: {0}")]
    Creation(String),
    #[error("Token has expired")]
    Expired,
    #[error("Token is invalid: {0}")]
    Invalid(String),
}

fn secret(config: &AppConfig) -> Result<&[u8], TokenError> {
    config
        .jwt_secret
        .as_deref()
        .map(str::as_bytes)
        .ok_or(TokenError::MissingSecret)
}

/// Issue an HS256 access token for `user_id`. Returns the token and its expiry.
pub fn issue_access_token(config: &AppConfig, user_id: Uuid) -> Result<(String, i64), TokenError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + config.access_token_ttl_seconds as i64,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret(config)?),
    )
    .map_err(|e| TokenError::Creation(e.to_string()))?;
    Ok((token, claims.exp))
}

/// Verify signature and expiry of an access token
pub fn decode_access_token(config: &AppConfig, token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, &DecodingKey::from_secret(secret(config)?), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })
}

/// The authenticated caller of one request
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: user::Model,
    /// Active company of the user's employee record
    pub company: Option<company::Model>,
    pub permissions: PermissionSet,
}

impl Principal {
    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.has(permission)
    }

    /// 403 naming the action unless the caller holds `permission`.
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if self.has(permission) {
            return Ok(());
        }

        tracing::info!(
            user_id = %self.user.id,
            company_id = ?self.company.as_ref().map(|c| c.id),
            permission = %permission,
            "Permission denied"
        );
        counter!("authz_denied_total", "reason" => "permission").increment(1);
        Err(forbidden(Some(&permission.denial_message())))
    }

    pub fn require_all(&self, permissions: &[Permission]) -> Result<(), ApiError> {
        permissions.iter().try_for_each(|p| self.require(*p))
    }

    /// Catalog and grant administration is reserved to active superusers.
    pub fn require_superuser(&self) -> Result<(), ApiError> {
        if self.user.is_active && self.user.is_superuser {
            return Ok(());
        }

        tracing::info!(user_id = %self.user.id, "Superuser access denied");
        counter!("authz_denied_total", "reason" => "superuser").increment(1);
        Err(forbidden(Some("Superuser access required.")))
    }

    /// The caller's company or 403
    pub fn company(&self) -> Result<&company::Model, ApiError> {
        self.company.as_ref().ok_or_else(|| {
            counter!("authz_denied_total", "reason" => "no_company").increment(1);
            forbidden(Some(NO_COMPANY_MESSAGE))
        })
    }
}

/// A principal that belongs to an active company
#[derive(Debug, Clone)]
pub struct TenantScope {
    pub principal: Principal,
    pub company: company::Model,
}

impl TenantScope {
    pub fn company_id(&self) -> Uuid {
        self.company.id
    }

    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        self.principal.require(permission)
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

fn reject(reason: &'static str, message: &str) -> ApiError {
    counter!("auth_rejected_total", "reason" => reason).increment(1);
    unauthorized(Some(message))
}

/// Load the principal named by a verified token.
pub async fn load_principal(state: &AppState, user_id: Uuid) -> Result<Option<Principal>, ApiError> {
    let Some(user) = UserRepository::new(&state.db).find_by_id(user_id).await? else {
        return Ok(None);
    };
    if !user.is_active {
        return Ok(None);
    }

    let company = resolve_company(&state.db, user.id).await?;
    let permissions = PermissionRepository::new(&state.db)
        .effective_permissions(&user)
        .await?;

    Ok(Some(Principal {
        user,
        company,
        permissions,
    }))
}

/// Authentication middleware validating the bearer JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let claims = decode_access_token(&state.config, token).map_err(|e| match e {
        TokenError::Expired => reject("expired", "Token has expired"),
        TokenError::MissingSecret => {
            tracing::error!("JWT secret missing; rejecting authenticated request");
            reject("misconfigured", "Authentication is not available")
        }
        _ => reject("invalid", "Invalid bearer token"),
    })?;

    let user_id = claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| reject("invalid", "Invalid bearer token"))?;
    let principal = load_principal(&state, user_id)
        .await?
        .ok_or_else(|| reject("inactive", "User account is disabled or no longer exists"))?;

    tracing::debug!(
        user_id = %principal.user.id,
        company_id = ?principal.company.as_ref().map(|c| c.id),
        "Authenticated request"
    );

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Gate for the warehouse routes: the caller's company must have the
/// `warehouse` feature.
pub async fn require_warehouse_feature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| unauthorized(None))?;
    let company = principal.company()?;

    let enabled = FeatureGrantRepository::new(&state.db)
        .company_has_feature(company.id, WAREHOUSE_FEATURE)
        .await?;
    if !enabled {
        tracing::info!(
            company_id = %company.id,
            feature = WAREHOUSE_FEATURE,
            "Feature disabled for company"
        );
        counter!("authz_denied_total", "reason" => "feature").increment(1);
        return Err(feature_disabled(WAREHOUSE_FEATURE));
    }

    Ok(next.run(request).await)
}

impl<S: Sync> FromRequestParts<S> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| unauthorized(None))
    }
}

impl<S: Sync> FromRequestParts<S> for TenantScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        let company = principal.company()?.clone();
        Ok(TenantScope { principal, company })
    }
}
