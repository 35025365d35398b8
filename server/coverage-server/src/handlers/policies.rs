use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use coverage_service::{
    history, ClaimFormTemplate, NewPolicy, NewPolicyChange, Policy, PolicyChangeType,
    PolicyExclusion, PolicyHistoryEntry, PolicySnapshot, PolicyUpdate,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::server::CoverageServer;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_length, validate_required};

/// Create Policy Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePolicyRequest {
    pub insurer_id: Uuid,
    pub policy_number: String,
    pub name: String,
    pub effective_date: NaiveDate,
}

impl RequestValidation for CreatePolicyRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.policy_number, "Policy number is required");
        validate_required!(self.name, "Policy name is required");
        validate_length!(
            self.policy_number,
            1,
            50,
            "Policy number must be between 1 and 50 characters"
        );
        validate_length!(
            self.name,
            1,
            200,
            "Name must be between 1 and 200 characters"
        );
        Ok(())
    }
}

/// Update Policy Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePolicyRequest {
    pub policy_number: Option<String>,
    pub name: Option<String>,
    pub effective_date: Option<NaiveDate>,
}

impl RequestValidation for UpdatePolicyRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref policy_number) = self.policy_number {
            validate_length!(
                policy_number,
                1,
                50,
                "Policy number must be between 1 and 50 characters"
            );
        }
        if let Some(ref name) = self.name {
            validate_length!(name, 1, 200, "Name must be between 1 and 200 characters");
        }
        Ok(())
    }
}

/// Deactivate Policy Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeactivatePolicyRequest {
    pub reason: String,
}

impl RequestValidation for DeactivatePolicyRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.reason, "Deactivation reason is required");
        Ok(())
    }
}

/// Record Policy Change Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordPolicyChangeRequest {
    pub policy_id: Uuid,
    pub change_type: PolicyChangeType,
    pub change_description: Option<String>,
    pub previous_values: Option<PolicySnapshot>,
    pub new_values: Option<PolicySnapshot>,
    pub effective_date: NaiveDate,
}

/// Get a single policy by ID
#[utoipa::path(
    get,
    path = "/api/policies/{id}",
    params(("id" = Uuid, Path, description = "Policy ID")),
    responses(
        (status = 200, description = "Policy retrieved successfully", body = Policy),
        (status = 404, description = "Policy not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "policies"
)]
pub async fn get_policy(
    State(server): State<CoverageServer>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Policy>>, ApiError> {
    match server.store().get_policy(id).await? {
        Some(policy) => Ok(Json(api_success(policy))),
        None => Err(ApiError::not_found("policy")),
    }
}

/// Create a new policy
///
/// Writes the policy and its "created" history row in one transaction.
#[utoipa::path(
    post,
    path = "/api/policies",
    request_body = CreatePolicyRequest,
    responses(
        (status = 201, description = "Policy created successfully", body = Policy),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Insurer not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "policies"
)]
pub async fn create_policy(
    State(server): State<CoverageServer>,
    Json(request): Json<CreatePolicyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Policy>>), ApiError> {
    request.validate()?;

    let policy = server
        .store()
        .create_policy(NewPolicy {
            insurer_id: request.insurer_id,
            policy_number: request.policy_number,
            name: request.name,
            effective_date: request.effective_date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(policy))))
}

/// Update a policy
#[utoipa::path(
    put,
    path = "/api/policies/{id}",
    params(("id" = Uuid, Path, description = "Policy ID")),
    request_body = UpdatePolicyRequest,
    responses(
        (status = 200, description = "Policy updated successfully", body = Policy),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Policy not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "policies"
)]
pub async fn update_policy(
    State(server): State<CoverageServer>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePolicyRequest>,
) -> Result<Json<ApiResponse<Policy>>, ApiError> {
    request.validate()?;

    let updated = server
        .store()
        .update_policy(
            id,
            PolicyUpdate {
                policy_number: request.policy_number,
                name: request.name,
                effective_date: request.effective_date,
            },
        )
        .await?;

    match updated {
        Some(policy) => Ok(Json(api_success(policy))),
        None => Err(ApiError::not_found("policy")),
    }
}

/// Deactivate a policy, recording the reason in its history
#[utoipa::path(
    patch,
    path = "/api/policies/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Policy ID")),
    request_body = DeactivatePolicyRequest,
    responses(
        (status = 200, description = "Policy deactivated", body = Policy),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Policy not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "policies"
)]
pub async fn deactivate_policy(
    State(server): State<CoverageServer>,
    Path(id): Path<Uuid>,
    Json(request): Json<DeactivatePolicyRequest>,
) -> Result<Json<ApiResponse<Policy>>, ApiError> {
    request.validate()?;

    match server.store().deactivate_policy(id, &request.reason).await? {
        Some(policy) => Ok(Json(api_success(policy))),
        None => Err(ApiError::not_found("policy")),
    }
}

/// Get the change history of a policy, newest first
#[utoipa::path(
    get,
    path = "/api/policies/{id}/history",
    params(("id" = Uuid, Path, description = "Policy ID")),
    responses(
        (status = 200, description = "History retrieved successfully", body = Vec<PolicyHistoryEntry>),
        (status = 500, description = "Internal server error")
    ),
    tag = "policies"
)]
pub async fn get_policy_history(
    State(server): State<CoverageServer>,
    Path(policy_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PolicyHistoryEntry>>>, ApiError> {
    let entries = history::history_for_policy(&server.db_pool, policy_id).await?;
    Ok(Json(api_success(entries)))
}

/// Record a policy change row directly
///
/// Store mutations write their own history; this endpoint exists for
/// migrations and administrative corrections of the audit trail.
#[utoipa::path(
    post,
    path = "/api/policies/history",
    request_body = RecordPolicyChangeRequest,
    responses(
        (status = 201, description = "History row recorded", body = PolicyHistoryEntry),
        (status = 404, description = "Policy not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "policies"
)]
pub async fn record_policy_change(
    State(server): State<CoverageServer>,
    Json(request): Json<RecordPolicyChangeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PolicyHistoryEntry>>), ApiError> {
    if server.store().get_policy(request.policy_id).await?.is_none() {
        return Err(ApiError::not_found("policy"));
    }

    let entry = history::insert_change(
        &server.db_pool,
        NewPolicyChange {
            policy_id: request.policy_id,
            change_type: request.change_type,
            change_description: request.change_description,
            previous_values: request.previous_values,
            new_values: request.new_values,
            effective_date: request.effective_date,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(api_success(entry))))
}

/// List active exclusions of a policy
#[utoipa::path(
    get,
    path = "/api/policies/{id}/exclusions",
    params(("id" = Uuid, Path, description = "Policy ID")),
    responses(
        (status = 200, description = "Exclusions retrieved successfully", body = Vec<PolicyExclusion>),
        (status = 500, description = "Internal server error")
    ),
    tag = "policies"
)]
pub async fn list_policy_exclusions(
    State(server): State<CoverageServer>,
    Path(policy_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PolicyExclusion>>>, ApiError> {
    let exclusions = server.store().list_policy_exclusions(policy_id).await?;
    Ok(Json(api_success(exclusions)))
}

/// Assemble claim-form metadata for a policy
#[utoipa::path(
    get,
    path = "/api/policies/{id}/claim-template",
    params(("id" = Uuid, Path, description = "Policy ID")),
    responses(
        (status = 200, description = "Claim template assembled", body = ClaimFormTemplate),
        (status = 404, description = "Policy not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "policies"
)]
pub async fn get_claim_template(
    State(server): State<CoverageServer>,
    Path(policy_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ClaimFormTemplate>>, ApiError> {
    match server.composer().claim_form_template(policy_id).await? {
        Some(template) => Ok(Json(api_success(template))),
        None => Err(ApiError::not_found("policy")),
    }
}
