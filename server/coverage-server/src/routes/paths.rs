//! Centralized API route path constants
//!
//! Constants for all API routes so runtime route definitions and OpenAPI
//! documentation stay consistent. utoipa `#[path(...)]` attributes require
//! string literals; the paths used there must match these constants.

/// API base path
pub const API: &str = "/api";

/// Health check endpoint (unauthenticated, outside /api)
pub const HEALTH: &str = "/health";

/// Insurer endpoints
///
/// Route parameter names are shared per segment (axum's router requires a
/// single name per position).
pub mod insurers {
    pub const INSURERS: &str = "/insurers";
    pub const INSURER_BY_ID: &str = "/insurers/:id";
    pub const INSURER_POLICIES: &str = "/insurers/:id/policies";
}

/// Policy endpoints
pub mod policies {
    pub const POLICIES: &str = "/policies";
    pub const POLICY_BY_ID: &str = "/policies/:id";
    pub const DEACTIVATE: &str = "/policies/:id/deactivate";
    pub const POLICY_SCHEMES: &str = "/policies/:id/schemes";
    pub const POLICY_EXCLUSIONS: &str = "/policies/:id/exclusions";
    pub const POLICY_HISTORY: &str = "/policies/:id/history";
    pub const HISTORY: &str = "/policies/history";
    pub const CLAIM_TEMPLATE: &str = "/policies/:id/claim-template";
}

/// Scheme endpoints
pub mod schemes {
    pub const SCHEMES: &str = "/schemes";
    pub const SCHEME_BY_ID: &str = "/schemes/:id";
    pub const SCHEME_BENEFITS: &str = "/schemes/:id/benefits";
}

/// Member enrollment and lookup endpoints
pub mod members {
    pub const MEMBER_POLICIES: &str = "/members/policies";
    pub const MEMBER_SCHEMES: &str = "/members/schemes";
    pub const PATIENT_POLICIES: &str = "/members/:patient_id/policies";
    pub const PATIENT_BENEFITS: &str = "/members/:patient_id/benefits";
    pub const PATIENT_UTILIZATION: &str = "/members/:patient_id/utilization";
    pub const PATIENT_BENEFIT_PROFILE: &str = "/members/:patient_id/benefit-profile";
}

/// Eligibility endpoints
pub mod eligibility {
    pub const CHECK: &str = "/eligibility/check";
}

/// Exclusion and coverage mapping endpoints
pub mod coverage {
    pub const EXCLUSIONS: &str = "/exclusions";
    pub const COVERAGE: &str = "/coverage";
    pub const COVERAGE_LOOKUP: &str = "/coverage/:scheme_id/:code_type/:code";
}

/// Utilization, preauthorization and deduction endpoints
pub mod benefits {
    pub const UTILIZATION: &str = "/utilization";
    pub const PREAUTH_LOOKUP: &str = "/preauth/lookup";
    pub const DEDUCT: &str = "/benefits/deduct";
    pub const COVERAGE_CHECK: &str = "/benefits/coverage-check";
}
