use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::server::CoverageServer;

/// Main OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::handlers::health::health_check,

        // Insurer endpoints
        crate::handlers::insurers::list_insurers,
        crate::handlers::insurers::get_insurer,
        crate::handlers::insurers::create_insurer,
        crate::handlers::insurers::update_insurer,
        crate::handlers::insurers::delete_insurer,
        crate::handlers::insurers::list_insurer_policies,

        // Policy endpoints
        crate::handlers::policies::get_policy,
        crate::handlers::policies::create_policy,
        crate::handlers::policies::update_policy,
        crate::handlers::policies::deactivate_policy,
        crate::handlers::policies::get_policy_history,
        crate::handlers::policies::record_policy_change,
        crate::handlers::policies::list_policy_exclusions,
        crate::handlers::policies::get_claim_template,

        // Scheme endpoints
        crate::handlers::schemes::list_policy_schemes,
        crate::handlers::schemes::get_scheme,
        crate::handlers::schemes::create_scheme,
        crate::handlers::schemes::update_scheme,
        crate::handlers::schemes::add_scheme_benefits,

        // Member endpoints
        crate::handlers::members::enroll_member_policy,
        crate::handlers::members::assign_member_scheme,
        crate::handlers::members::list_member_policies,
        crate::handlers::members::get_member_benefits,
        crate::handlers::members::get_member_utilization,
        crate::handlers::members::get_benefit_profile,

        // Eligibility, coverage and benefit endpoints
        crate::handlers::eligibility::check_eligibility,
        crate::handlers::coverage::list_exclusions,
        crate::handlers::coverage::create_exclusion,
        crate::handlers::coverage::get_coverage_mapping,
        crate::handlers::coverage::create_coverage_mapping,
        crate::handlers::utilization::record_utilization,
        crate::handlers::benefits::preauth_lookup,
        crate::handlers::benefits::deduct_benefit,
        crate::handlers::benefits::check_service_coverage,
    ),
    components(
        schemas(
            crate::handlers::health::HealthStatus,
            crate::handlers::insurers::CreateInsurerRequest,
            crate::handlers::insurers::UpdateInsurerRequest,
            crate::handlers::policies::CreatePolicyRequest,
            crate::handlers::policies::UpdatePolicyRequest,
            crate::handlers::policies::DeactivatePolicyRequest,
            crate::handlers::policies::RecordPolicyChangeRequest,
            crate::handlers::schemes::CreateSchemeRequest,
            crate::handlers::schemes::UpdateSchemeRequest,
            crate::handlers::schemes::SchemeBenefitRequest,
            crate::handlers::schemes::SchemeWithBenefits,
            crate::handlers::members::EnrollMemberPolicyRequest,
            crate::handlers::members::AssignMemberSchemeRequest,
            crate::handlers::eligibility::EligibilityCheckRequest,
            crate::handlers::coverage::CreateExclusionRequest,
            crate::handlers::coverage::CreateCoverageMappingRequest,
            crate::handlers::utilization::RecordUtilizationRequest,
            crate::handlers::benefits::PreauthLookupRequest,
            crate::handlers::benefits::DeductBenefitRequest,
            crate::handlers::benefits::ServiceCoverageRequest,
        )
    ),
    tags(
        (name = "health", description = "System health endpoints"),
        (name = "insurers", description = "Insurer management"),
        (name = "policies", description = "Policy management and audit history"),
        (name = "schemes", description = "Scheme and benefit configuration"),
        (name = "members", description = "Member enrollment and coverage lookups"),
        (name = "eligibility", description = "Real-time eligibility evaluation"),
        (name = "coverage", description = "Exclusions and coverage mappings"),
        (name = "utilization", description = "Benefit utilization ledger"),
        (name = "benefits", description = "Preauthorization and automatic deductions"),
    ),
    info(
        title = "Coverage Engine API",
        version = "0.1.0",
        description = "Insurance eligibility, benefit utilization and policy coverage API for healthcare claims processing.",
        contact(
            name = "Coverage Engine Team",
            email = "api@coverage-engine.dev",
            url = "https://coverage-engine.dev"
        ),
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
)]
pub struct ApiDoc;

/// Create the API documentation routes
pub fn create_docs_routes() -> Router<CoverageServer> {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
