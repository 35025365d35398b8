use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use coverage_service::{NewScheme, NewSchemeBenefit, Scheme, SchemeBenefit, SchemeUpdate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::server::CoverageServer;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_length, validate_positive_amount, validate_required};

/// Create Scheme Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSchemeRequest {
    pub policy_id: Uuid,
    pub scheme_name: String,
    pub scheme_code: String,
    pub benefit_category: Option<String>,
    #[schema(value_type = String)]
    pub annual_limit: Decimal,
    #[schema(value_type = String)]
    pub per_visit_limit: Decimal,
    #[serde(default)]
    pub preauthorization_required: bool,
}

impl RequestValidation for CreateSchemeRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.scheme_name, "Scheme name is required");
        validate_required!(self.scheme_code, "Scheme code is required");
        validate_length!(
            self.scheme_name,
            1,
            200,
            "Scheme name must be between 1 and 200 characters"
        );
        validate_length!(
            self.scheme_code,
            1,
            50,
            "Scheme code must be between 1 and 50 characters"
        );
        validate_positive_amount!(self.annual_limit, "Annual limit must be positive");
        validate_positive_amount!(self.per_visit_limit, "Per-visit limit must be positive");
        Ok(())
    }
}

/// Update Scheme Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSchemeRequest {
    pub scheme_name: Option<String>,
    pub scheme_code: Option<String>,
    pub benefit_category: Option<String>,
    #[schema(value_type = Option<String>)]
    pub annual_limit: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub per_visit_limit: Option<Decimal>,
    pub preauthorization_required: Option<bool>,
    pub is_active: Option<bool>,
}

impl RequestValidation for UpdateSchemeRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref name) = self.scheme_name {
            validate_length!(
                name,
                1,
                200,
                "Scheme name must be between 1 and 200 characters"
            );
        }
        if let Some(ref code) = self.scheme_code {
            validate_length!(
                code,
                1,
                50,
                "Scheme code must be between 1 and 50 characters"
            );
        }
        if let Some(limit) = self.annual_limit {
            validate_positive_amount!(limit, "Annual limit must be positive");
        }
        if let Some(limit) = self.per_visit_limit {
            validate_positive_amount!(limit, "Per-visit limit must be positive");
        }
        Ok(())
    }
}

/// Scheme Benefit Request (batch element)
#[derive(Debug, Deserialize, ToSchema)]
pub struct SchemeBenefitRequest {
    pub benefit_category: String,
    pub benefit_name: String,
    pub benefit_code: String,
    #[schema(value_type = String)]
    pub coverage_amount: Decimal,
    #[schema(value_type = String)]
    pub coverage_percentage: Decimal,
    pub session_limit: Option<i32>,
    pub frequency_limit: Option<String>,
    #[serde(default)]
    pub is_preauthorized: bool,
}

impl RequestValidation for SchemeBenefitRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.benefit_category, "Benefit category is required");
        validate_required!(self.benefit_name, "Benefit name is required");
        validate_required!(self.benefit_code, "Benefit code is required");
        validate_field!(
            self.coverage_amount,
            self.coverage_amount >= Decimal::ZERO,
            "Coverage amount must not be negative"
        );
        validate_field!(
            self.coverage_percentage,
            self.coverage_percentage >= Decimal::ZERO
                && self.coverage_percentage <= Decimal::from(100),
            "Coverage percentage must be between 0 and 100"
        );
        Ok(())
    }
}

/// Scheme together with its active benefits
#[derive(Debug, Serialize, ToSchema)]
pub struct SchemeWithBenefits {
    #[serde(flatten)]
    pub scheme: Scheme,
    pub benefits: Vec<SchemeBenefit>,
}

/// List active schemes under a policy
#[utoipa::path(
    get,
    path = "/api/policies/{id}/schemes",
    params(("id" = Uuid, Path, description = "Policy ID")),
    responses(
        (status = 200, description = "Schemes retrieved successfully", body = Vec<Scheme>),
        (status = 500, description = "Internal server error")
    ),
    tag = "schemes"
)]
pub async fn list_policy_schemes(
    State(server): State<CoverageServer>,
    Path(policy_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Scheme>>>, ApiError> {
    let schemes = server.store().list_schemes_by_policy(policy_id).await?;
    Ok(Json(api_success(schemes)))
}

/// Get a scheme with its active benefits
#[utoipa::path(
    get,
    path = "/api/schemes/{id}",
    params(("id" = Uuid, Path, description = "Scheme ID")),
    responses(
        (status = 200, description = "Scheme retrieved successfully", body = SchemeWithBenefits),
        (status = 404, description = "Scheme not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "schemes"
)]
pub async fn get_scheme(
    State(server): State<CoverageServer>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SchemeWithBenefits>>, ApiError> {
    match server.store().get_scheme_with_benefits(id).await? {
        Some((scheme, benefits)) => Ok(Json(api_success(SchemeWithBenefits { scheme, benefits }))),
        None => Err(ApiError::not_found("scheme")),
    }
}

/// Create a new scheme
#[utoipa::path(
    post,
    path = "/api/schemes",
    request_body = CreateSchemeRequest,
    responses(
        (status = 201, description = "Scheme created successfully", body = Scheme),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Policy not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "schemes"
)]
pub async fn create_scheme(
    State(server): State<CoverageServer>,
    Json(request): Json<CreateSchemeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Scheme>>), ApiError> {
    request.validate()?;

    let scheme = server
        .store()
        .create_scheme(NewScheme {
            policy_id: request.policy_id,
            scheme_name: request.scheme_name,
            scheme_code: request.scheme_code,
            benefit_category: request.benefit_category,
            annual_limit: request.annual_limit,
            per_visit_limit: request.per_visit_limit,
            preauthorization_required: request.preauthorization_required,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(scheme))))
}

/// Update a scheme
#[utoipa::path(
    put,
    path = "/api/schemes/{id}",
    params(("id" = Uuid, Path, description = "Scheme ID")),
    request_body = UpdateSchemeRequest,
    responses(
        (status = 200, description = "Scheme updated successfully", body = Scheme),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Scheme not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "schemes"
)]
pub async fn update_scheme(
    State(server): State<CoverageServer>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSchemeRequest>,
) -> Result<Json<ApiResponse<Scheme>>, ApiError> {
    request.validate()?;

    let updated = server
        .store()
        .update_scheme(
            id,
            SchemeUpdate {
                scheme_name: request.scheme_name,
                scheme_code: request.scheme_code,
                benefit_category: request.benefit_category,
                annual_limit: request.annual_limit,
                per_visit_limit: request.per_visit_limit,
                preauthorization_required: request.preauthorization_required,
                is_active: request.is_active,
            },
        )
        .await?;

    match updated {
        Some(scheme) => Ok(Json(api_success(scheme))),
        None => Err(ApiError::not_found("scheme")),
    }
}

/// Attach a batch of benefits to a scheme
#[utoipa::path(
    post,
    path = "/api/schemes/{id}/benefits",
    params(("id" = Uuid, Path, description = "Scheme ID")),
    request_body = Vec<SchemeBenefitRequest>,
    responses(
        (status = 201, description = "Benefits attached successfully", body = Vec<SchemeBenefit>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Scheme not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "schemes"
)]
pub async fn add_scheme_benefits(
    State(server): State<CoverageServer>,
    Path(scheme_id): Path<Uuid>,
    Json(requests): Json<Vec<SchemeBenefitRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<SchemeBenefit>>>), ApiError> {
    if requests.is_empty() {
        return Err(ApiError::validation("Benefits batch must not be empty"));
    }
    for request in &requests {
        request.validate()?;
    }

    let benefits = requests
        .into_iter()
        .map(|r| NewSchemeBenefit {
            benefit_category: r.benefit_category,
            benefit_name: r.benefit_name,
            benefit_code: r.benefit_code,
            coverage_amount: r.coverage_amount,
            coverage_percentage: r.coverage_percentage,
            session_limit: r.session_limit,
            frequency_limit: r.frequency_limit,
            is_preauthorized: r.is_preauthorized,
        })
        .collect();

    let inserted = server
        .store()
        .add_scheme_benefits(scheme_id, benefits)
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(inserted))))
}
