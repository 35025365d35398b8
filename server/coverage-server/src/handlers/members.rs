use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use coverage_service::{
    ledger, BenefitProfile, BenefitSummary, BenefitUtilization, MemberPolicy,
    MemberPolicyOverview, MemberScheme, NewMemberPolicy, NewMemberScheme,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::server::CoverageServer;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_length, validate_required};

/// Enroll Member Policy Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct EnrollMemberPolicyRequest {
    pub patient_id: Uuid,
    pub policy_id: Uuid,
    pub member_number: String,
    pub member_type: String,
}

impl RequestValidation for EnrollMemberPolicyRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.member_number, "Member number is required");
        validate_required!(self.member_type, "Member type is required");
        validate_length!(
            self.member_number,
            1,
            50,
            "Member number must be between 1 and 50 characters"
        );
        Ok(())
    }
}

/// Assign Member Scheme Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignMemberSchemeRequest {
    pub member_policy_id: Uuid,
    pub scheme_id: Uuid,
}

/// Benefit summary query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct BenefitSummaryParams {
    #[serde(rename = "financialYear")]
    pub financial_year: Option<String>,
}

/// Utilization history query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct UtilizationHistoryParams {
    #[serde(rename = "financialYear")]
    pub financial_year: Option<String>,
    #[serde(rename = "schemeId")]
    pub scheme_id: Option<Uuid>,
}

/// Enroll a patient into a policy
#[utoipa::path(
    post,
    path = "/api/members/policies",
    request_body = EnrollMemberPolicyRequest,
    responses(
        (status = 201, description = "Member enrolled successfully", body = MemberPolicy),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Policy not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "members"
)]
pub async fn enroll_member_policy(
    State(server): State<CoverageServer>,
    Json(request): Json<EnrollMemberPolicyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MemberPolicy>>), ApiError> {
    request.validate()?;

    let member_policy = server
        .store()
        .enroll_member_policy(NewMemberPolicy {
            patient_id: request.patient_id,
            policy_id: request.policy_id,
            member_number: request.member_number,
            member_type: request.member_type,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(member_policy))))
}

/// Assign a scheme to a member policy
#[utoipa::path(
    post,
    path = "/api/members/schemes",
    request_body = AssignMemberSchemeRequest,
    responses(
        (status = 201, description = "Scheme assigned successfully", body = MemberScheme),
        (status = 404, description = "Member policy or scheme not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "members"
)]
pub async fn assign_member_scheme(
    State(server): State<CoverageServer>,
    Json(request): Json<AssignMemberSchemeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MemberScheme>>), ApiError> {
    let member_scheme = server
        .store()
        .assign_scheme_to_member(NewMemberScheme {
            member_policy_id: request.member_policy_id,
            scheme_id: request.scheme_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(member_scheme))))
}

/// List a patient's active policies with their schemes
#[utoipa::path(
    get,
    path = "/api/members/{patient_id}/policies",
    params(("patient_id" = Uuid, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Member policies retrieved", body = Vec<MemberPolicyOverview>),
        (status = 500, description = "Internal server error")
    ),
    tag = "members"
)]
pub async fn list_member_policies(
    State(server): State<CoverageServer>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<MemberPolicyOverview>>>, ApiError> {
    let overviews = server.benefits().member_policies(patient_id).await?;
    Ok(Json(api_success(overviews)))
}

/// Year-scoped benefit summary for a patient
#[utoipa::path(
    get,
    path = "/api/members/{patient_id}/benefits",
    params(
        ("patient_id" = Uuid, Path, description = "Patient ID"),
        BenefitSummaryParams
    ),
    responses(
        (status = 200, description = "Benefit summary assembled", body = BenefitSummary),
        (status = 500, description = "Internal server error")
    ),
    tag = "members"
)]
pub async fn get_member_benefits(
    State(server): State<CoverageServer>,
    Path(patient_id): Path<Uuid>,
    Query(params): Query<BenefitSummaryParams>,
) -> Result<Json<ApiResponse<BenefitSummary>>, ApiError> {
    let financial_year = params
        .financial_year
        .unwrap_or_else(ledger::current_financial_year);
    let summary = server
        .benefits()
        .benefit_summary(patient_id, financial_year)
        .await?;
    Ok(Json(api_success(summary)))
}

/// A patient's utilization rows, newest first
#[utoipa::path(
    get,
    path = "/api/members/{patient_id}/utilization",
    params(
        ("patient_id" = Uuid, Path, description = "Patient ID"),
        UtilizationHistoryParams
    ),
    responses(
        (status = 200, description = "Utilization history retrieved", body = Vec<BenefitUtilization>),
        (status = 500, description = "Internal server error")
    ),
    tag = "members"
)]
pub async fn get_member_utilization(
    State(server): State<CoverageServer>,
    Path(patient_id): Path<Uuid>,
    Query(params): Query<UtilizationHistoryParams>,
) -> Result<Json<ApiResponse<Vec<BenefitUtilization>>>, ApiError> {
    let history = server
        .ledger()
        .member_history(
            patient_id,
            params.financial_year.as_deref(),
            params.scheme_id,
        )
        .await?;
    Ok(Json(api_success(history)))
}

/// Real-time benefit profile for patient verification
#[utoipa::path(
    get,
    path = "/api/members/{patient_id}/benefit-profile",
    params(("patient_id" = Uuid, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Benefit profile assembled", body = BenefitProfile),
        (status = 404, description = "Patient has no active coverage"),
        (status = 500, description = "Internal server error")
    ),
    tag = "members"
)]
pub async fn get_benefit_profile(
    State(server): State<CoverageServer>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<ApiResponse<BenefitProfile>>, ApiError> {
    match server.benefits().benefit_profile(patient_id).await? {
        Some(profile) => Ok(Json(api_success(profile))),
        None => Err(ApiError::not_found("member coverage")),
    }
}
