use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use coverage_service::{Insurer, InsurerUpdate, NewInsurer, Policy};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_success, api_success_with_meta, ApiError, ApiResponse};
use crate::server::CoverageServer;
use crate::types::pagination::PaginationParams;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_length, validate_required};

/// Create Insurer Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInsurerRequest {
    pub name: String,
    pub code: String,
}

impl RequestValidation for CreateInsurerRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.name, "Insurer name is required");
        validate_required!(self.code, "Insurer code is required");
        validate_length!(
            self.name,
            1,
            200,
            "Name must be between 1 and 200 characters"
        );
        validate_length!(self.code, 1, 50, "Code must be between 1 and 50 characters");
        Ok(())
    }
}

/// Update Insurer Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateInsurerRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub is_active: Option<bool>,
}

impl RequestValidation for UpdateInsurerRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref name) = self.name {
            validate_length!(name, 1, 200, "Name must be between 1 and 200 characters");
        }
        if let Some(ref code) = self.code {
            validate_length!(code, 1, 50, "Code must be between 1 and 50 characters");
        }
        Ok(())
    }
}

/// List all active insurers
#[utoipa::path(
    get,
    path = "/api/insurers",
    params(PaginationParams),
    responses(
        (status = 200, description = "Insurers retrieved successfully", body = Vec<Insurer>),
        (status = 500, description = "Internal server error")
    ),
    tag = "insurers"
)]
pub async fn list_insurers(
    State(server): State<CoverageServer>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<Vec<Insurer>>>, ApiError> {
    let store = server.store();
    let insurers = store
        .list_insurers(pagination.limit(), pagination.offset())
        .await?;
    let total_count = store.count_insurers().await?;
    Ok(Json(api_success_with_meta(
        insurers,
        pagination.to_metadata(total_count),
    )))
}

/// Get a single insurer by ID
#[utoipa::path(
    get,
    path = "/api/insurers/{id}",
    params(("id" = Uuid, Path, description = "Insurer ID")),
    responses(
        (status = 200, description = "Insurer retrieved successfully", body = Insurer),
        (status = 404, description = "Insurer not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "insurers"
)]
pub async fn get_insurer(
    State(server): State<CoverageServer>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Insurer>>, ApiError> {
    match server.store().get_insurer(id).await? {
        Some(insurer) => Ok(Json(api_success(insurer))),
        None => Err(ApiError::not_found("insurer")),
    }
}

/// Register a new insurer
#[utoipa::path(
    post,
    path = "/api/insurers",
    request_body = CreateInsurerRequest,
    responses(
        (status = 201, description = "Insurer created successfully", body = Insurer),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Insurer code already registered"),
        (status = 500, description = "Internal server error")
    ),
    tag = "insurers"
)]
pub async fn create_insurer(
    State(server): State<CoverageServer>,
    Json(request): Json<CreateInsurerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Insurer>>), ApiError> {
    request.validate()?;

    let insurer = server
        .store()
        .create_insurer(NewInsurer {
            name: request.name,
            code: request.code,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(insurer))))
}

/// Update an insurer
#[utoipa::path(
    put,
    path = "/api/insurers/{id}",
    params(("id" = Uuid, Path, description = "Insurer ID")),
    request_body = UpdateInsurerRequest,
    responses(
        (status = 200, description = "Insurer updated successfully", body = Insurer),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Insurer not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "insurers"
)]
pub async fn update_insurer(
    State(server): State<CoverageServer>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateInsurerRequest>,
) -> Result<Json<ApiResponse<Insurer>>, ApiError> {
    request.validate()?;

    let updated = server
        .store()
        .update_insurer(
            id,
            InsurerUpdate {
                name: request.name,
                code: request.code,
                is_active: request.is_active,
            },
        )
        .await?;

    match updated {
        Some(insurer) => Ok(Json(api_success(insurer))),
        None => Err(ApiError::not_found("insurer")),
    }
}

/// Deactivate an insurer (soft delete)
#[utoipa::path(
    delete,
    path = "/api/insurers/{id}",
    params(("id" = Uuid, Path, description = "Insurer ID")),
    responses(
        (status = 204, description = "Insurer deactivated"),
        (status = 404, description = "Insurer not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "insurers"
)]
pub async fn delete_insurer(
    State(server): State<CoverageServer>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if server.store().deactivate_insurer(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("insurer"))
    }
}

/// List active policies offered by an insurer
#[utoipa::path(
    get,
    path = "/api/insurers/{id}/policies",
    params(("id" = Uuid, Path, description = "Insurer ID")),
    responses(
        (status = 200, description = "Policies retrieved successfully", body = Vec<Policy>),
        (status = 500, description = "Internal server error")
    ),
    tag = "insurers"
)]
pub async fn list_insurer_policies(
    State(server): State<CoverageServer>,
    Path(insurer_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Policy>>>, ApiError> {
    let policies = server.store().list_policies_by_insurer(insurer_id).await?;
    Ok(Json(api_success(policies)))
}
