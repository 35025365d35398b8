use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use coverage_service::{
    CoverageMapping, NewCoverageMapping, NewPolicyExclusion, PolicyExclusion,
    COVERAGE_TYPE_COVERED, COVERAGE_TYPE_EXCLUDED, COVERAGE_TYPE_PREAUTH_REQUIRED,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::server::CoverageServer;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_required};

/// Create Policy Exclusion Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateExclusionRequest {
    pub policy_id: Uuid,
    pub exclusion_type: String,
    pub description: String,
}

impl RequestValidation for CreateExclusionRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.exclusion_type, "Exclusion type is required");
        validate_required!(self.description, "Description is required");
        Ok(())
    }
}

/// Create Coverage Mapping Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCoverageMappingRequest {
    pub scheme_id: Uuid,
    pub code_type: String,
    pub code: String,
    pub coverage_type: String,
}

impl RequestValidation for CreateCoverageMappingRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.code_type, "Code type is required");
        validate_required!(self.code, "Code is required");
        validate_field!(
            self.coverage_type,
            matches!(
                self.coverage_type.as_str(),
                COVERAGE_TYPE_COVERED | COVERAGE_TYPE_PREAUTH_REQUIRED | COVERAGE_TYPE_EXCLUDED
            ),
            "Coverage type must be one of: covered, preauth_required, excluded"
        );
        Ok(())
    }
}

/// Exclusion list query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListExclusionsParams {
    pub policy_id: Option<Uuid>,
}

/// List active exclusions, optionally narrowed to one policy
#[utoipa::path(
    get,
    path = "/api/exclusions",
    params(ListExclusionsParams),
    responses(
        (status = 200, description = "Exclusions retrieved successfully", body = Vec<PolicyExclusion>),
        (status = 500, description = "Internal server error")
    ),
    tag = "coverage"
)]
pub async fn list_exclusions(
    State(server): State<CoverageServer>,
    Query(params): Query<ListExclusionsParams>,
) -> Result<Json<ApiResponse<Vec<PolicyExclusion>>>, ApiError> {
    let exclusions = server.store().list_exclusions(params.policy_id).await?;
    Ok(Json(api_success(exclusions)))
}

/// Record a policy exclusion
#[utoipa::path(
    post,
    path = "/api/exclusions",
    request_body = CreateExclusionRequest,
    responses(
        (status = 201, description = "Exclusion recorded", body = PolicyExclusion),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Policy not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "coverage"
)]
pub async fn create_exclusion(
    State(server): State<CoverageServer>,
    Json(request): Json<CreateExclusionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PolicyExclusion>>), ApiError> {
    request.validate()?;

    let exclusion = server
        .store()
        .create_policy_exclusion(NewPolicyExclusion {
            policy_id: request.policy_id,
            exclusion_type: request.exclusion_type,
            description: request.description,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(exclusion))))
}

/// Look up the coverage mapping for a procedure/diagnosis code
#[utoipa::path(
    get,
    path = "/api/coverage/{scheme_id}/{code_type}/{code}",
    params(
        ("scheme_id" = Uuid, Path, description = "Scheme ID"),
        ("code_type" = String, Path, description = "Code system, e.g. CPT"),
        ("code" = String, Path, description = "Procedure or diagnosis code")
    ),
    responses(
        (status = 200, description = "Coverage mapping found", body = CoverageMapping),
        (status = 404, description = "No active mapping for this code"),
        (status = 500, description = "Internal server error")
    ),
    tag = "coverage"
)]
pub async fn get_coverage_mapping(
    State(server): State<CoverageServer>,
    Path((scheme_id, code_type, code)): Path<(Uuid, String, String)>,
) -> Result<Json<ApiResponse<CoverageMapping>>, ApiError> {
    match server
        .store()
        .get_coverage_mapping(scheme_id, &code_type, &code)
        .await?
    {
        Some(mapping) => Ok(Json(api_success(mapping))),
        None => Err(ApiError::not_found("coverage mapping")),
    }
}

/// Create a coverage mapping
///
/// At most one active mapping may exist per (scheme, code type, code);
/// duplicates are rejected with a conflict.
#[utoipa::path(
    post,
    path = "/api/coverage",
    request_body = CreateCoverageMappingRequest,
    responses(
        (status = 201, description = "Coverage mapping created", body = CoverageMapping),
        (status = 400, description = "Validation error"),
        (status = 409, description = "An active mapping already exists"),
        (status = 500, description = "Internal server error")
    ),
    tag = "coverage"
)]
pub async fn create_coverage_mapping(
    State(server): State<CoverageServer>,
    Json(request): Json<CreateCoverageMappingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CoverageMapping>>), ApiError> {
    request.validate()?;

    let mapping = server
        .store()
        .create_coverage_mapping(NewCoverageMapping {
            scheme_id: request.scheme_id,
            code_type: request.code_type,
            code: request.code,
            coverage_type: request.coverage_type,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(mapping))))
}
