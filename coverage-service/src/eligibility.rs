//! Eligibility evaluation: which of a patient's schemes can pay for a
//! procedure, and how much headroom each has left this financial year.
//!
//! The storage walk mirrors the enrollment chain (member scheme → member
//! policy → policy → scheme), admitting a scheme only when every link is
//! active. The arithmetic and ranking are pure functions so the decision
//! core is testable without a database.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::CoverageResult;
use crate::ledger;
use crate::models::{CoverageMapping, Policy, Scheme};
use crate::store::CoverageStore;

/// Code system used for procedure lookups against coverage mappings.
pub const PROCEDURE_CODE_TYPE: &str = "CPT";

/// Derived consumption figures for one scheme and financial year.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UtilizationStatus {
    #[schema(value_type = String)]
    pub utilized: Decimal,
    #[schema(value_type = String)]
    pub limit: Decimal,
    #[schema(value_type = String)]
    pub remaining: Decimal,
}

/// Per-scheme eligibility verdict.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SchemeEligibility {
    pub scheme: Scheme,
    pub policy: Policy,
    pub member_policy_id: Uuid,
    /// Coverage evidence for the procedure under this scheme, when a mapping
    /// exists. Absence means no evidence either way.
    pub coverage: Option<CoverageMapping>,
    #[schema(value_type = String)]
    pub eligible_amount: Decimal,
    /// May be negative when concurrent deductions landed after the sum was
    /// read; callers must treat negative remaining as zero eligible.
    #[schema(value_type = String)]
    pub remaining_limit: Decimal,
    pub utilization_status: UtilizationStatus,
}

/// Full response for one eligibility check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EligibilityResponse {
    pub patient_id: Uuid,
    pub procedure_code: String,
    #[schema(value_type = String)]
    pub amount_requested: Decimal,
    pub financial_year: String,
    pub eligibility_results: Vec<SchemeEligibility>,
    pub is_eligible: bool,
    pub recommended_scheme: Option<SchemeEligibility>,
}

/// One admissible scheme with everything the arithmetic needs.
#[derive(Debug, Clone)]
pub struct SchemeCandidate {
    pub scheme: Scheme,
    pub policy: Policy,
    pub member_policy_id: Uuid,
    pub coverage: Option<CoverageMapping>,
    pub total_utilized: Decimal,
}

#[derive(FromRow)]
struct CandidateKeys {
    member_policy_id: Uuid,
    scheme_id: Uuid,
    policy_id: Uuid,
}

/// Stateless evaluator over a coverage store.
#[derive(Clone)]
pub struct EligibilityEvaluator {
    store: CoverageStore,
}

impl EligibilityEvaluator {
    pub fn new(store: CoverageStore) -> Self {
        Self { store }
    }

    /// Evaluate every admissible scheme for the patient and rank them.
    ///
    /// An unknown patient, or one with no active enrollment chain, yields an
    /// empty result set with `is_eligible = false`; that is a normal
    /// "no coverage" outcome, not an error.
    pub async fn check(
        &self,
        patient_id: Uuid,
        procedure_code: &str,
        amount_requested: Decimal,
        financial_year: Option<String>,
    ) -> CoverageResult<EligibilityResponse> {
        let financial_year = financial_year.unwrap_or_else(ledger::current_financial_year);
        let candidates = self
            .load_candidates(patient_id, procedure_code, &financial_year)
            .await?;

        debug!(
            %patient_id,
            procedure_code,
            candidate_count = candidates.len(),
            "evaluating eligibility"
        );

        let eligibility_results = evaluate_candidates(candidates, amount_requested);
        let recommended_scheme =
            recommend(&eligibility_results).map(|i| eligibility_results[i].clone());
        let is_eligible = eligibility_results
            .iter()
            .any(|r| r.eligible_amount > Decimal::ZERO);

        Ok(EligibilityResponse {
            patient_id,
            procedure_code: procedure_code.to_string(),
            amount_requested,
            financial_year,
            eligibility_results,
            is_eligible,
            recommended_scheme,
        })
    }

    /// Load the patient's admissible schemes: every link of the enrollment
    /// chain must be active for a scheme to qualify.
    async fn load_candidates(
        &self,
        patient_id: Uuid,
        procedure_code: &str,
        financial_year: &str,
    ) -> CoverageResult<Vec<SchemeCandidate>> {
        let keys = sqlx::query_as::<_, CandidateKeys>(
            r#"
            SELECT msch.member_policy_id, msch.scheme_id, mp.policy_id
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

        let mut candidates = Vec::with_capacity(keys.len());
        for key in keys {
            // The joined query guarantees both rows exist; a vanished row
            // between queries just drops the candidate.
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

            let total_utilized = ledger::total_utilized(
                self.store.pool(),
                key.member_policy_id,
                key.scheme_id,
                financial_year,
            )
            .await?;

            candidates.push(SchemeCandidate {
                scheme,
                policy,
                member_policy_id: key.member_policy_id,
                coverage,
                total_utilized,
            });
        }

        Ok(candidates)
    }
}

/// Turn candidates into per-scheme verdicts.
///
/// `remaining_limit` may go negative after a concurrent deduction race; the
/// eligible amount clamps it to zero so a scheme can never lend headroom it
/// does not have.
pub fn evaluate_candidates(
    candidates: Vec<SchemeCandidate>,
    amount_requested: Decimal,
) -> Vec<SchemeEligibility> {
    candidates
        .into_iter()
        .map(|c| {
            let remaining_limit = c.scheme.annual_limit - c.total_utilized;
            let eligible_amount = amount_requested.min(remaining_limit.max(Decimal::ZERO));

            SchemeEligibility {
                utilization_status: UtilizationStatus {
                    utilized: c.total_utilized,
                    limit: c.scheme.annual_limit,
                    remaining: remaining_limit,
                },
                scheme: c.scheme,
                policy: c.policy,
                member_policy_id: c.member_policy_id,
                coverage: c.coverage,
                eligible_amount,
                remaining_limit,
            }
        })
        .collect()
}

/// Index of the recommended scheme: maximum eligible amount, ties broken by
/// lowest scheme id so repeated checks always charge the same envelope.
pub fn recommend(results: &[SchemeEligibility]) -> Option<usize> {
    results
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            b.eligible_amount
                .cmp(&a.eligible_amount)
                .then(a.scheme.id.cmp(&b.scheme.id))
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn scheme(id: Uuid, annual_limit: Decimal) -> Scheme {
        Scheme {
            id,
            policy_id: Uuid::new_v4(),
            scheme_name: "Outpatient".to_string(),
            scheme_code: "OP-1".to_string(),
            benefit_category: Some("outpatient".to_string()),
            annual_limit,
            per_visit_limit: dec!(2000),
            preauthorization_required: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn policy() -> Policy {
        Policy {
            id: Uuid::new_v4(),
            insurer_id: Uuid::new_v4(),
            policy_number: "POL-1".to_string(),
            name: "Corporate".to_string(),
            effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn candidate(scheme_id: Uuid, limit: Decimal, utilized: Decimal) -> SchemeCandidate {
        SchemeCandidate {
            scheme: scheme(scheme_id, limit),
            policy: policy(),
            member_policy_id: Uuid::new_v4(),
            coverage: None,
            total_utilized: utilized,
        }
    }

    #[test]
    fn partial_headroom_caps_eligible_amount() {
        // annualLimit=10000 with 4000 already utilized: an 8000 request is
        // eligible only up to the remaining 6000.
        let results = evaluate_candidates(
            vec![candidate(Uuid::new_v4(), dec!(10000), dec!(4000))],
            dec!(8000),
        );
        assert_eq!(results[0].remaining_limit, dec!(6000));
        assert_eq!(results[0].eligible_amount, dec!(6000));
        assert_eq!(results[0].utilization_status.utilized, dec!(4000));
    }

    #[test]
    fn request_below_headroom_is_fully_eligible() {
        let results = evaluate_candidates(
            vec![candidate(Uuid::new_v4(), dec!(10000), dec!(4000))],
            dec!(5000),
        );
        assert_eq!(results[0].eligible_amount, dec!(5000));
    }

    #[test]
    fn negative_remaining_clamps_to_zero_eligible() {
        // Over-utilized scheme (race aftermath): remaining goes negative but
        // the eligible amount must clamp to zero.
        let results = evaluate_candidates(
            vec![candidate(Uuid::new_v4(), dec!(10000), dec!(12000))],
            dec!(500),
        );
        assert_eq!(results[0].remaining_limit, dec!(-2000));
        assert_eq!(results[0].eligible_amount, Decimal::ZERO);
    }

    #[test]
    fn evaluation_is_idempotent_without_new_utilization() {
        let id = Uuid::new_v4();
        let first = evaluate_candidates(vec![candidate(id, dec!(10000), dec!(4000))], dec!(8000));
        let second = evaluate_candidates(vec![candidate(id, dec!(10000), dec!(4000))], dec!(8000));
        assert_eq!(first[0].eligible_amount, second[0].eligible_amount);
        assert_eq!(first[0].remaining_limit, second[0].remaining_limit);
    }

    #[test]
    fn recommendation_picks_highest_eligible_amount() {
        let results = evaluate_candidates(
            vec![
                candidate(Uuid::new_v4(), dec!(10000), dec!(9000)),
                candidate(Uuid::new_v4(), dec!(10000), dec!(2000)),
            ],
            dec!(5000),
        );
        let best = recommend(&results).unwrap();
        assert_eq!(results[best].eligible_amount, dec!(5000));
        for r in &results {
            assert!(results[best].eligible_amount >= r.eligible_amount);
        }
    }

    #[test]
    fn recommendation_tie_breaks_on_lowest_scheme_id() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        // Same headroom in both schemes; the lower id must win regardless of
        // candidate order.
        let results = evaluate_candidates(
            vec![
                candidate(high, dec!(10000), dec!(0)),
                candidate(low, dec!(10000), dec!(0)),
            ],
            dec!(3000),
        );
        let best = recommend(&results).unwrap();
        assert_eq!(results[best].scheme.id, low);
    }

    #[test]
    fn no_candidates_means_no_recommendation() {
        let results = evaluate_candidates(vec![], dec!(3000));
        assert!(results.is_empty());
        assert!(recommend(&results).is_none());
    }

    #[test]
    fn exhausted_schemes_are_listed_but_not_eligible() {
        let results = evaluate_candidates(
            vec![candidate(Uuid::new_v4(), dec!(5000), dec!(5000))],
            dec!(100),
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].eligible_amount, Decimal::ZERO);
        assert!(!results.iter().any(|r| r.eligible_amount > Decimal::ZERO));
    }
}
