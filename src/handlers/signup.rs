//! # Signup API Handler
//!
//! Public company signup. Creates the company, its owner and the owner's
//! employee record, then logs the owner in.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::issue_access_token;
use crate::error::ApiError;
use crate::handlers::auth::TokenResponse;
use crate::handlers::types::{CompanyResponse, UserResponse};
use crate::server::AppState;
use crate::tenancy::{self, SignupRequest};

/// Company signup form
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignupRequestDto {
    #[schema(example = "Acme Ltda")]
    pub company_name: String,
    /// Punctuation is ignored; fourteen digits are required
    #[schema(example = "12.345.678/0001-99")]
    pub tax_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    pub company: CompanyResponse,
    pub user: UserResponse,
    pub token: TokenResponse,
}

/// Sign up a new company and its owner
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignupRequestDto,
    responses(
        (status = 201, description = "Company and owner created", body = SignupResponse),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "signup"
)]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequestDto>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let Json(request) = payload?;

    let outcome = tenancy::signup(
        &state.db,
        SignupRequest {
            company_name: request.company_name,
            tax_id: request.tax_id,
            first_name: request.first_name,
            last_name: request.last_name,
            username: request.username,
            email: request.email,
            password: request.password,
            password2: request.password2,
        },
    )
    .await?;

    let (access_token, expires_at) =
        issue_access_token(&state.config, outcome.owner.id).map_err(|e| {
            tracing::error!(error = %e, "Failed to issue access token after signup");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "Failed to issue access token",
            )
        })?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            company: outcome.company.into(),
            user: outcome.owner.into(),
            token: TokenResponse::bearer(access_token, expires_at),
        }),
    ))
}
