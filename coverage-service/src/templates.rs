//! Insurer-specific claim form metadata and preauthorization lookups.
//!
//! The template projection feeds the external document renderer; the
//! preauthorization check decides, per member scheme, whether approval must
//! precede a service. The rule itself is a pure function.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::CoverageConfig;
use crate::eligibility::PROCEDURE_CODE_TYPE;
use crate::error::CoverageResult;
use crate::models::{CoverageMapping, Insurer, Policy, Scheme};
use crate::store::CoverageStore;

/// Urgency marker that can bypass preauthorization for low-cost claims.
pub const URGENCY_EMERGENCY: &str = "emergency";

/// Scheme option offered on a claim form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SchemeOption {
    pub id: Uuid,
    pub name: String,
    pub code: String,
}

/// Pre-filled fields handed to the document renderer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FormFields {
    pub insurer_name: Option<String>,
    pub policy_number: String,
    pub available_schemes: Vec<SchemeOption>,
}

/// Read-only projection of a policy for claim-form rendering.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClaimFormTemplate {
    pub policy: Policy,
    pub insurer: Option<Insurer>,
    pub schemes: Vec<Scheme>,
    pub form_fields: FormFields,
}

/// Preauthorization verdict for one member scheme.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreauthRequirement {
    pub scheme: Scheme,
    pub policy: Policy,
    pub coverage: Option<CoverageMapping>,
    pub requires_preauth: bool,
    pub auto_approval_eligible: bool,
}

/// Aggregated preauthorization assessment across a patient's schemes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreauthAssessment {
    pub patient_id: Uuid,
    pub procedure_code: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub urgency: String,
    pub preauth_requirements: Vec<PreauthRequirement>,
    pub overall_requires_preauth: bool,
}

#[derive(FromRow)]
struct MemberSchemeKeys {
    scheme_id: Uuid,
    policy_id: Uuid,
}

/// Assembles claim templates and preauthorization assessments.
#[derive(Clone)]
pub struct ClaimTemplateComposer {
    store: CoverageStore,
    config: CoverageConfig,
}

impl ClaimTemplateComposer {
    pub fn new(store: CoverageStore, config: CoverageConfig) -> Self {
        Self { store, config }
    }

    /// Claim-form metadata for a policy; `None` when the policy is unknown.
    pub async fn claim_form_template(
        &self,
        policy_id: Uuid,
    ) -> CoverageResult<Option<ClaimFormTemplate>> {
        let Some(policy) = self.store.get_policy(policy_id).await? else {
            return Ok(None);
        };

        let insurer = self.store.get_insurer(policy.insurer_id).await?;
        let schemes = self.store.list_schemes_by_policy(policy_id).await?;

        let form_fields = FormFields {
            insurer_name: insurer.as_ref().map(|i| i.name.clone()),
            policy_number: policy.policy_number.clone(),
            available_schemes: schemes
                .iter()
                .map(|s| SchemeOption {
                    id: s.id,
                    name: s.scheme_name.clone(),
                    code: s.scheme_code.clone(),
                })
                .collect(),
        };

        Ok(Some(ClaimFormTemplate {
            policy,
            insurer,
            schemes,
            form_fields,
        }))
    }

    /// Evaluate the preauthorization rule against each of the patient's
    /// active member schemes.
    pub async fn check_preauthorization(
        &self,
        patient_id: Uuid,
        procedure_code: &str,
        amount: Decimal,
        urgency: &str,
    ) -> CoverageResult<PreauthAssessment> {
        let keys = sqlx::query_as::<_, MemberSchemeKeys>(
            r#"
            SELECT msch.scheme_id, mp.policy_id
            FROM member_schemes msch
            JOIN member_policies mp ON msch.member_policy_id = mp.id
            JOIN schemes s ON msch.scheme_id = s.id
            JOIN policies p ON mp.policy_id = p.id
            WHERE mp.patient_id = $1
              AND msch.is_active = true
              AND mp.is_active = true
              AND s.is_active = true
              AND p.is_active = true
            ORDER BY msch.scheme_id
            "#,
        )
        .bind(patient_id)
        .fetch_all(self.store.pool())
        .await?;

        let auto_approval_limit = self.config.emergency_auto_approval_limit;
        let mut preauth_requirements = Vec::with_capacity(keys.len());

        for key in keys {
            let Some(scheme) = self.store.get_scheme(key.scheme_id).await? else {
                continue;
            };
            let Some(policy) = self.store.get_policy(key.policy_id).await? else {
                continue;
            };
            let coverage = self
                .store
                .get_coverage_mapping(key.scheme_id, PROCEDURE_CODE_TYPE, procedure_code)
                .await?;

            let requires_preauth = preauth_required(&scheme, coverage.as_ref(), amount);
            let auto_approval_eligible =
                auto_approval_eligible(urgency, amount, auto_approval_limit);

            preauth_requirements.push(PreauthRequirement {
                scheme,
                policy,
                coverage,
                requires_preauth,
                auto_approval_eligible,
            });
        }

        let overall_requires_preauth = preauth_requirements
            .iter()
            .any(|r| r.requires_preauth && !r.auto_approval_eligible);

        Ok(PreauthAssessment {
            patient_id,
            procedure_code: procedure_code.to_string(),
            amount,
            urgency: urgency.to_string(),
            preauth_requirements,
            overall_requires_preauth,
        })
    }
}

/// Preauthorization is needed when the scheme demands it globally, the
/// coverage mapping flags the code, or the amount exceeds the per-visit
/// limit.
pub fn preauth_required(scheme: &Scheme, coverage: Option<&CoverageMapping>, amount: Decimal) -> bool {
    scheme.preauthorization_required
        || coverage.is_some_and(CoverageMapping::requires_preauthorization)
        || amount > scheme.per_visit_limit
}

/// Emergency claims under the configured ceiling skip preauthorization.
pub fn auto_approval_eligible(urgency: &str, amount: Decimal, limit: Decimal) -> bool {
    urgency == URGENCY_EMERGENCY && amount < limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::COVERAGE_TYPE_PREAUTH_REQUIRED;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn scheme(preauth: bool, per_visit_limit: Decimal) -> Scheme {
        Scheme {
            id: Uuid::new_v4(),
            policy_id: Uuid::new_v4(),
            scheme_name: "Outpatient".to_string(),
            scheme_code: "OP-1".to_string(),
            benefit_category: None,
            annual_limit: dec!(100000),
            per_visit_limit,
            preauthorization_required: preauth,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn preauth_mapping(scheme_id: Uuid) -> CoverageMapping {
        CoverageMapping {
            id: Uuid::new_v4(),
            scheme_id,
            code_type: "CPT".to_string(),
            code: "99213".to_string(),
            coverage_type: COVERAGE_TYPE_PREAUTH_REQUIRED.to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn scheme_flag_forces_preauth() {
        assert!(preauth_required(&scheme(true, dec!(2000)), None, dec!(100)));
    }

    #[test]
    fn coverage_mapping_forces_preauth() {
        let s = scheme(false, dec!(2000));
        let mapping = preauth_mapping(s.id);
        assert!(preauth_required(&s, Some(&mapping), dec!(100)));
    }

    #[test]
    fn amount_over_per_visit_limit_forces_preauth() {
        assert!(preauth_required(&scheme(false, dec!(2000)), None, dec!(2001)));
    }

    #[test]
    fn cheap_routine_visit_needs_no_preauth() {
        assert!(!preauth_required(&scheme(false, dec!(2000)), None, dec!(500)));
    }

    #[test]
    fn emergency_below_ceiling_is_auto_approved() {
        // Emergency at 5000 with preauth-required scheme: the emergency
        // exception overrides the requirement.
        let s = scheme(true, dec!(2000));
        let requires = preauth_required(&s, None, dec!(5000));
        let auto = auto_approval_eligible(URGENCY_EMERGENCY, dec!(5000), dec!(10000));
        assert!(requires);
        assert!(auto);
        assert!(!(requires && !auto));
    }

    #[test]
    fn emergency_at_or_above_ceiling_still_requires_preauth() {
        assert!(!auto_approval_eligible(URGENCY_EMERGENCY, dec!(10000), dec!(10000)));
        assert!(!auto_approval_eligible(URGENCY_EMERGENCY, dec!(12000), dec!(10000)));
    }

    #[test]
    fn routine_urgency_never_auto_approves() {
        assert!(!auto_approval_eligible("routine", dec!(100), dec!(10000)));
    }
}
