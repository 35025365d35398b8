pub mod paths;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::{
    handlers::{benefits, coverage, eligibility, health, insurers, members, policies, schemes},
    server::CoverageServer,
};

/// Create health check routes
pub fn health_routes() -> Router<CoverageServer> {
    Router::new().route(paths::HEALTH, get(health::health_check))
}

/// Create insurer management routes
pub fn insurer_routes() -> Router<CoverageServer> {
    Router::new()
        .route(paths::insurers::INSURERS, get(insurers::list_insurers))
        .route(paths::insurers::INSURERS, post(insurers::create_insurer))
        .route(paths::insurers::INSURER_BY_ID, get(insurers::get_insurer))
        .route(paths::insurers::INSURER_BY_ID, put(insurers::update_insurer))
        .route(paths::insurers::INSURER_BY_ID, delete(insurers::delete_insurer))
        .route(paths::insurers::INSURER_POLICIES, get(insurers::list_insurer_policies))
}

/// Create policy management routes
///
/// Every mutation writes a history row in the same transaction; the history
/// itself is exposed read-only plus an administrative append endpoint.
pub fn policy_routes() -> Router<CoverageServer> {
    Router::new()
        .route(paths::policies::POLICIES, post(policies::create_policy))
        .route(paths::policies::HISTORY, post(policies::record_policy_change))
        .route(paths::policies::POLICY_BY_ID, get(policies::get_policy))
        .route(paths::policies::POLICY_BY_ID, put(policies::update_policy))
        .route(paths::policies::DEACTIVATE, patch(policies::deactivate_policy))
        .route(paths::policies::POLICY_HISTORY, get(policies::get_policy_history))
        .route(paths::policies::POLICY_EXCLUSIONS, get(policies::list_policy_exclusions))
        .route(paths::policies::CLAIM_TEMPLATE, get(policies::get_claim_template))
}

/// Create scheme management routes
pub fn scheme_routes() -> Router<CoverageServer> {
    Router::new()
        .route(paths::policies::POLICY_SCHEMES, get(schemes::list_policy_schemes))
        .route(paths::schemes::SCHEMES, post(schemes::create_scheme))
        .route(paths::schemes::SCHEME_BY_ID, get(schemes::get_scheme))
        .route(paths::schemes::SCHEME_BY_ID, put(schemes::update_scheme))
        .route(paths::schemes::SCHEME_BENEFITS, post(schemes::add_scheme_benefits))
}

/// Create member enrollment and lookup routes
pub fn member_routes() -> Router<CoverageServer> {
    Router::new()
        .route(paths::members::MEMBER_POLICIES, post(members::enroll_member_policy))
        .route(paths::members::MEMBER_SCHEMES, post(members::assign_member_scheme))
        .route(paths::members::PATIENT_POLICIES, get(members::list_member_policies))
        .route(paths::members::PATIENT_BENEFITS, get(members::get_member_benefits))
        .route(paths::members::PATIENT_UTILIZATION, get(members::get_member_utilization))
        .route(paths::members::PATIENT_BENEFIT_PROFILE, get(members::get_benefit_profile))
}

/// Create eligibility routes
pub fn eligibility_routes() -> Router<CoverageServer> {
    Router::new().route(paths::eligibility::CHECK, post(eligibility::check_eligibility))
}

/// Create exclusion and coverage mapping routes
pub fn coverage_routes() -> Router<CoverageServer> {
    Router::new()
        .route(paths::coverage::EXCLUSIONS, get(coverage::list_exclusions))
        .route(paths::coverage::EXCLUSIONS, post(coverage::create_exclusion))
        .route(paths::coverage::COVERAGE, post(coverage::create_coverage_mapping))
        .route(paths::coverage::COVERAGE_LOOKUP, get(coverage::get_coverage_mapping))
}

/// Create utilization, preauthorization and deduction routes
pub fn benefit_routes() -> Router<CoverageServer> {
    Router::new()
        .route(paths::benefits::UTILIZATION, post(crate::handlers::utilization::record_utilization))
        .route(paths::benefits::PREAUTH_LOOKUP, post(benefits::preauth_lookup))
        .route(paths::benefits::DEDUCT, post(benefits::deduct_benefit))
        .route(paths::benefits::COVERAGE_CHECK, post(benefits::check_service_coverage))
}

/// Create API routes
pub fn api_routes() -> Router<CoverageServer> {
    Router::new()
        .merge(insurer_routes())
        .merge(policy_routes())
        .merge(scheme_routes())
        .merge(member_routes())
        .merge(eligibility_routes())
        .merge(coverage_routes())
        .merge(benefit_routes())
}

/// Create all application routes
pub fn create_routes() -> Router<CoverageServer> {
    Router::new()
        // Health check routes (no authentication required)
        .merge(health_routes())
        // API documentation routes
        .merge(crate::openapi::create_docs_routes())
        // API routes
        .nest(paths::API, api_routes())
}
