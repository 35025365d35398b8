use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use coverage_service::{BenefitUtilization, NewBenefitUtilization};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::server::CoverageServer;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_positive_amount, validate_required};

/// Record Utilization Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordUtilizationRequest {
    pub member_policy_id: Uuid,
    pub scheme_id: Uuid,
    pub claim_id: Uuid,
    pub utilization_date: NaiveDate,
    #[schema(value_type = String)]
    pub amount_utilized: Decimal,
    pub financial_year: String,
}

impl RequestValidation for RecordUtilizationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_positive_amount!(self.amount_utilized, "Utilized amount must be positive");
        validate_required!(self.financial_year, "Financial year is required");
        Ok(())
    }
}

/// Record a benefit utilization row
///
/// Pure append: the ledger never rejects on limit here. Limit enforcement
/// belongs to the deduction path, which consults the eligibility check
/// before posting.
#[utoipa::path(
    post,
    path = "/api/utilization",
    request_body = RecordUtilizationRequest,
    responses(
        (status = 201, description = "Utilization recorded", body = BenefitUtilization),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Internal server error")
    ),
    tag = "utilization"
)]
pub async fn record_utilization(
    State(server): State<CoverageServer>,
    Json(request): Json<RecordUtilizationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BenefitUtilization>>), ApiError> {
    request.validate()?;

    let row = server
        .ledger()
        .record(NewBenefitUtilization {
            member_policy_id: request.member_policy_id,
            scheme_id: request.scheme_id,
            claim_id: request.claim_id,
            utilization_date: request.utilization_date,
            amount_utilized: request.amount_utilized,
            financial_year: request.financial_year,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(row))))
}
