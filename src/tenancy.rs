//! # Tenant Directory
//!
//! Resolves users to their company and runs the multi-step tenant
//! workflows (company creation with default grants, signup, deletion)
//! inside a single transaction.

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use crate::access::{COMPANY_ADMIN_GROUP, company_owner_permissions};
use crate::error::RepositoryError;
use crate::features::COMPANIES_FEATURE;
use crate::models::{company, user};
use crate::repositories::company::CreateCompanyRequest;
use crate::repositories::user::{NewUser, hash_password};
use crate::repositories::{
    CompanyRepository, EmployeeRepository, FeatureGrantRepository, FeatureRepository,
    GroupRepository, PermissionRepository, UserRepository,
};
use crate::validation::normalize_tax_id;

/// Display name of the default `companies` feature
pub const COMPANIES_FEATURE_NAME: &str = "Companies";

/// Company signup form
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub company_name: String,
    pub tax_id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

/// Result of a successful signup
#[derive(Debug, Clone)]
pub struct SignupOutcome {
    pub company: company::Model,
    pub owner: user::Model,
}

/// Company of the user's employee record, if it is active.
pub async fn resolve_company<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Option<company::Model>, RepositoryError> {
    let Some(employee) = EmployeeRepository::new(db).find_by_user(user_id).await? else {
        return Ok(None);
    };

    let company = CompanyRepository::new(db)
        .find_by_id(employee.company_id)
        .await?
        .filter(|company| company.is_active);
    Ok(company)
}

/// Create a company holding an enabled grant for the `companies` feature.
///
/// Runs on the caller's connection; wrap it in a transaction for atomicity.
pub async fn create_company_with_defaults<C: ConnectionTrait>(
    db: &C,
    request: CreateCompanyRequest,
) -> Result<company::Model, RepositoryError> {
    let company = CompanyRepository::new(db).create(request).await?;
    let feature = FeatureRepository::new(db)
        .get_or_create(COMPANIES_FEATURE, COMPANIES_FEATURE_NAME)
        .await?;
    FeatureGrantRepository::new(db)
        .ensure_grant(company.id, feature.id, true)
        .await?;

    tracing::info!(company_id = %company.id, "Created company with default features");
    Ok(company)
}

/// [`create_company_with_defaults`] in its own transaction
pub async fn create_company(
    db: &DatabaseConnection,
    request: CreateCompanyRequest,
) -> Result<company::Model, RepositoryError> {
    let txn = db.begin().await.map_err(RepositoryError::database_error)?;
    let company = create_company_with_defaults(&txn, request).await?;
    txn.commit().await.map_err(RepositoryError::database_error)?;
    Ok(company)
}

/// Create a company, its owner and the owner's employee record atomically.
///
/// The owner joins `company_admin` when that group exists and receives
/// every warehouse permission plus `companies.manage_company_features`.
pub async fn signup(
    db: &DatabaseConnection,
    request: SignupRequest,
) -> Result<SignupOutcome, RepositoryError> {
    let tax_id = normalize_tax_id(&request.tax_id)?;
    if request.password != request.password2 {
        return Err(RepositoryError::validation_error("Passwords must be equal"));
    }
    let password_hash = hash_password(&request.password).await?;

    let txn = db.begin().await.map_err(RepositoryError::database_error)?;

    let company = create_company_with_defaults(
        &txn,
        CreateCompanyRequest {
            name: request.company_name,
            tax_id: Some(tax_id),
        },
    )
    .await?;

    let owner = UserRepository::new(&txn)
        .create(NewUser {
            username: request.username,
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            password_hash,
            is_superuser: false,
        })
        .await?;
    EmployeeRepository::new(&txn)
        .create(owner.id, company.id)
        .await?;

    let groups = GroupRepository::new(&txn);
    if let Some(admin_group) = groups.find_by_name(COMPANY_ADMIN_GROUP).await? {
        groups.add_user(admin_group.id, owner.id).await?;
    }
    PermissionRepository::new(&txn)
        .grant_user_permissions(owner.id, &company_owner_permissions())
        .await?;

    txn.commit().await.map_err(RepositoryError::database_error)?;

    tracing::info!(
        company_id = %company.id,
        user_id = %owner.id,
        "Company signup completed"
    );
    Ok(SignupOutcome { company, owner })
}

/// Delete a company and its tenant-scoped records in one transaction.
pub async fn delete_company(db: &DatabaseConnection, id: Uuid) -> Result<(), RepositoryError> {
    let txn = db.begin().await.map_err(RepositoryError::database_error)?;
    CompanyRepository::new(&txn).delete(id).await?;
    txn.commit().await.map_err(RepositoryError::database_error)?;

    tracing::info!(company_id = %id, "Deleted company");
    Ok(())
}
