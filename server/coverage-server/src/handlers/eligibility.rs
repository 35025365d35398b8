use axum::{extract::State, Json};
use coverage_service::EligibilityResponse;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::server::CoverageServer;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_positive_amount, validate_required};

/// Eligibility Check Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct EligibilityCheckRequest {
    pub patient_id: Uuid,
    pub procedure_code: String,
    #[schema(value_type = String)]
    pub amount_requested: Decimal,
    pub financial_year: Option<String>,
}

impl RequestValidation for EligibilityCheckRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.procedure_code, "Procedure code is required");
        validate_positive_amount!(self.amount_requested, "Requested amount must be positive");
        Ok(())
    }
}

/// Real-time eligibility check
///
/// Evaluates every admissible scheme for the patient and ranks them. A
/// patient with no active coverage yields an empty result set with
/// `is_eligible = false`, not an error.
#[utoipa::path(
    post,
    path = "/api/eligibility/check",
    request_body = EligibilityCheckRequest,
    responses(
        (status = 200, description = "Eligibility evaluated", body = EligibilityResponse),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Internal server error")
    ),
    tag = "eligibility"
)]
pub async fn check_eligibility(
    State(server): State<CoverageServer>,
    Json(request): Json<EligibilityCheckRequest>,
) -> Result<Json<ApiResponse<EligibilityResponse>>, ApiError> {
    request.validate()?;

    let response = server
        .evaluator()
        .check(
            request.patient_id,
            &request.procedure_code,
            request.amount_requested,
            request.financial_year,
        )
        .await?;

    info!(
        patient_id = %request.patient_id,
        procedure_code = %request.procedure_code,
        is_eligible = response.is_eligible,
        candidates = response.eligibility_results.len(),
        "eligibility check completed"
    );

    Ok(Json(api_success(response)))
}
