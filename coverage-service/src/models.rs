use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Coverage rule marker: the mapped code needs preauthorization.
pub const COVERAGE_TYPE_PREAUTH_REQUIRED: &str = "preauth_required";
/// Coverage rule marker: the mapped code is covered without conditions.
pub const COVERAGE_TYPE_COVERED: &str = "covered";
/// Coverage rule marker: the mapped code is excluded from the scheme.
pub const COVERAGE_TYPE_EXCLUDED: &str = "excluded";

/// Underwriting organization at the root of the coverage hierarchy
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Insurer {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for registering an insurer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewInsurer {
    pub name: String,
    pub code: String,
}

/// Partial update of an insurer
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct InsurerUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub is_active: Option<bool>,
}

/// Insurance contract owned by an insurer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Policy {
    pub id: Uuid,
    pub insurer_id: Uuid,
    pub policy_number: String,
    pub name: String,
    pub effective_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a policy
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewPolicy {
    pub insurer_id: Uuid,
    pub policy_number: String,
    pub name: String,
    pub effective_date: NaiveDate,
}

/// Partial update of a policy
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PolicyUpdate {
    pub policy_number: Option<String>,
    pub name: Option<String>,
    pub effective_date: Option<NaiveDate>,
}

/// Spending envelope under a policy with its own limits
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Scheme {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub scheme_name: String,
    pub scheme_code: String,
    /// Administratively maintained service-category tag used to route
    /// automatic deductions. Schemes without a tag never match a deduction.
    pub benefit_category: Option<String>,
    #[schema(value_type = String)]
    pub annual_limit: Decimal,
    #[schema(value_type = String)]
    pub per_visit_limit: Decimal,
    pub preauthorization_required: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a scheme
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewScheme {
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

/// Partial update of a scheme
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SchemeUpdate {
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

/// Covered service category under a scheme
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct SchemeBenefit {
    pub id: Uuid,
    pub scheme_id: Uuid,
    pub benefit_category: String,
    pub benefit_name: String,
    pub benefit_code: String,
    #[schema(value_type = String)]
    pub coverage_amount: Decimal,
    #[schema(value_type = String)]
    pub coverage_percentage: Decimal,
    pub session_limit: Option<i32>,
    pub frequency_limit: Option<String>,
    pub is_preauthorized: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for attaching a benefit to a scheme
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewSchemeBenefit {
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

/// Enrollment link between a patient and a policy
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct MemberPolicy {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub policy_id: Uuid,
    pub member_number: String,
    pub member_type: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for enrolling a patient into a policy
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewMemberPolicy {
    pub patient_id: Uuid,
    pub policy_id: Uuid,
    pub member_number: String,
    pub member_type: String,
}

/// Enrollment link between a member policy and a scheme
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct MemberScheme {
    pub id: Uuid,
    pub member_policy_id: Uuid,
    pub scheme_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for assigning a scheme to a member policy
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewMemberScheme {
    pub member_policy_id: Uuid,
    pub scheme_id: Uuid,
}

/// Excluded condition or service scoped to a policy
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct PolicyExclusion {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub exclusion_type: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for recording a policy exclusion
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewPolicyExclusion {
    pub policy_id: Uuid,
    pub exclusion_type: String,
    pub description: String,
}

/// Rule translating an external procedure/diagnosis code into scheme coverage
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct CoverageMapping {
    pub id: Uuid,
    pub scheme_id: Uuid,
    pub code_type: String,
    pub code: String,
    pub coverage_type: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CoverageMapping {
    /// Whether this mapping forces preauthorization for the mapped code.
    pub fn requires_preauthorization(&self) -> bool {
        self.coverage_type == COVERAGE_TYPE_PREAUTH_REQUIRED
    }

    /// Whether this mapping excludes the mapped code from the scheme.
    pub fn is_excluded(&self) -> bool {
        self.coverage_type == COVERAGE_TYPE_EXCLUDED
    }
}

/// Payload for creating a coverage mapping
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewCoverageMapping {
    pub scheme_id: Uuid,
    pub code_type: String,
    pub code: String,
    pub coverage_type: String,
}

/// Append-only record of benefit consumption against a scheme
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct BenefitUtilization {
    pub id: Uuid,
    pub member_policy_id: Uuid,
    pub scheme_id: Uuid,
    pub claim_id: Uuid,
    pub utilization_date: NaiveDate,
    #[schema(value_type = String)]
    pub amount_utilized: Decimal,
    pub financial_year: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for recording a utilization row
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewBenefitUtilization {
    pub member_policy_id: Uuid,
    pub scheme_id: Uuid,
    pub claim_id: Uuid,
    pub utilization_date: NaiveDate,
    #[schema(value_type = String)]
    pub amount_utilized: Decimal,
    pub financial_year: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn mapping(coverage_type: &str) -> CoverageMapping {
        CoverageMapping {
            id: Uuid::new_v4(),
            scheme_id: Uuid::new_v4(),
            code_type: "CPT".to_string(),
            code: "99213".to_string(),
            coverage_type: coverage_type.to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn preauth_marker_is_recognized() {
        assert!(mapping(COVERAGE_TYPE_PREAUTH_REQUIRED).requires_preauthorization());
        assert!(!mapping(COVERAGE_TYPE_COVERED).requires_preauthorization());
    }

    #[test]
    fn exclusion_marker_is_recognized() {
        assert!(mapping(COVERAGE_TYPE_EXCLUDED).is_excluded());
        assert!(!mapping(COVERAGE_TYPE_COVERED).is_excluded());
    }
}
