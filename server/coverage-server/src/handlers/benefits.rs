use axum::{extract::State, Json};
use coverage_service::{DeductionOutcome, PreauthAssessment, ServiceCoverage};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::server::CoverageServer;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_positive_amount, validate_required};

/// Preauthorization Lookup Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct PreauthLookupRequest {
    pub patient_id: Uuid,
    pub procedure_code: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub urgency: String,
}

impl RequestValidation for PreauthLookupRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.procedure_code, "Procedure code is required");
        validate_required!(self.urgency, "Urgency is required");
        validate_positive_amount!(self.amount, "Amount must be positive");
        Ok(())
    }
}

/// Benefit Deduction Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeductBenefitRequest {
    pub claim_id: Uuid,
    pub patient_id: Uuid,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub benefit_category: String,
    pub financial_year: Option<String>,
}

impl RequestValidation for DeductBenefitRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.benefit_category, "Benefit category is required");
        validate_positive_amount!(self.amount, "Deduction amount must be positive");
        Ok(())
    }
}

/// Service Coverage Check Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ServiceCoverageRequest {
    pub patient_id: Uuid,
    pub service_code: String,
    pub service_category: String,
}

impl RequestValidation for ServiceCoverageRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.service_code, "Service code is required");
        validate_required!(self.service_category, "Service category is required");
        Ok(())
    }
}

/// Preauthorization requirement lookup
///
/// Evaluates the preauthorization rule per member scheme; emergency claims
/// under the configured ceiling are auto-approval eligible.
#[utoipa::path(
    post,
    path = "/api/preauth/lookup",
    request_body = PreauthLookupRequest,
    responses(
        (status = 200, description = "Preauthorization assessed", body = PreauthAssessment),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Internal server error")
    ),
    tag = "benefits"
)]
pub async fn preauth_lookup(
    State(server): State<CoverageServer>,
    Json(request): Json<PreauthLookupRequest>,
) -> Result<Json<ApiResponse<PreauthAssessment>>, ApiError> {
    request.validate()?;

    let assessment = server
        .composer()
        .check_preauthorization(
            request.patient_id,
            &request.procedure_code,
            request.amount,
            &request.urgency,
        )
        .await?;

    Ok(Json(api_success(assessment)))
}

/// Automatic benefit deduction for an approved claim
///
/// Resolves the paying scheme by benefit category and posts the deduction
/// under a per-scheme lock; a deduction that would exceed the annual limit
/// is refused with a capacity conflict.
#[utoipa::path(
    post,
    path = "/api/benefits/deduct",
    request_body = DeductBenefitRequest,
    responses(
        (status = 200, description = "Deduction posted", body = DeductionOutcome),
        (status = 400, description = "Validation error"),
        (status = 404, description = "No scheme matches the benefit category"),
        (status = 409, description = "Deduction would exceed the scheme's annual limit"),
        (status = 500, description = "Internal server error")
    ),
    tag = "benefits"
)]
pub async fn deduct_benefit(
    State(server): State<CoverageServer>,
    Json(request): Json<DeductBenefitRequest>,
) -> Result<Json<ApiResponse<DeductionOutcome>>, ApiError> {
    request.validate()?;

    let outcome = server
        .ledger()
        .process_deduction(
            request.claim_id,
            request.patient_id,
            request.amount,
            &request.benefit_category,
            request.financial_year,
        )
        .await?;

    info!(
        claim_id = %outcome.claim_id,
        scheme_id = %outcome.scheme.id,
        amount = %outcome.deducted_amount,
        "benefit deduction completed"
    );

    Ok(Json(api_success(outcome)))
}

/// Check whether a service is covered for a patient
#[utoipa::path(
    post,
    path = "/api/benefits/coverage-check",
    request_body = ServiceCoverageRequest,
    responses(
        (status = 200, description = "Service coverage evaluated", body = ServiceCoverage),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Internal server error")
    ),
    tag = "benefits"
)]
pub async fn check_service_coverage(
    State(server): State<CoverageServer>,
    Json(request): Json<ServiceCoverageRequest>,
) -> Result<Json<ApiResponse<ServiceCoverage>>, ApiError> {
    request.validate()?;

    let coverage = server
        .benefits()
        .service_coverage(
            request.patient_id,
            &request.service_code,
            &request.service_category,
        )
        .await?;

    Ok(Json(api_success(coverage)))
}
