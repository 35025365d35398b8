//! Member-facing coverage projections: what a patient is enrolled in, what
//! those schemes pay for, and how much of the year's envelopes is spent.
//!
//! These are read-only assemblies consumed during patient verification and
//! by downstream claim tooling.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::CoverageResult;
use crate::ledger::UtilizationLedger;
use crate::models::{BenefitUtilization, Insurer, MemberPolicy, Policy, Scheme};
use crate::store::CoverageStore;

/// One member-policy enrollment with its surrounding hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberPolicyOverview {
    pub member_policy: MemberPolicy,
    pub policy: Policy,
    pub insurer: Insurer,
    pub schemes: Vec<Scheme>,
}

/// Year-scoped benefit summary for a member.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BenefitSummary {
    pub patient_id: Uuid,
    pub financial_year: String,
    pub member_policies: Vec<MemberPolicyOverview>,
    pub utilization: Vec<BenefitUtilization>,
    #[schema(value_type = String)]
    pub total_utilized: Decimal,
    pub last_updated: DateTime<Utc>,
}

/// Benefit line inside a scheme of the member's profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BenefitSnapshot {
    pub category: String,
    pub name: String,
    pub code: String,
    #[schema(value_type = String)]
    pub coverage_amount: Decimal,
    #[schema(value_type = String)]
    pub coverage_percentage: Decimal,
    pub session_limit: Option<i32>,
    pub frequency_limit: Option<String>,
    pub requires_preauth: bool,
}

/// Scheme entry inside the member's profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SchemeCoverage {
    pub scheme_name: String,
    pub scheme_code: String,
    #[schema(value_type = String)]
    pub annual_limit: Decimal,
    #[schema(value_type = String)]
    pub per_visit_limit: Decimal,
    pub benefits: Vec<BenefitSnapshot>,
}

/// Policy entry inside the member's profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PolicyCoverage {
    pub insurer_name: String,
    pub insurer_code: String,
    pub policy_name: String,
    pub member_number: String,
    pub member_type: String,
    pub schemes: Vec<SchemeCoverage>,
}

/// Aggregate counts across the member's active coverage.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CoverageSummary {
    pub total_active_policies: usize,
    pub total_active_schemes: usize,
    pub total_available_benefits: usize,
    #[schema(value_type = String)]
    pub total_annual_coverage: Decimal,
    pub insurers: Vec<String>,
}

/// Full real-time benefit profile assembled during patient verification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BenefitProfile {
    pub patient_id: Uuid,
    pub active_policies: Vec<PolicyCoverage>,
    pub coverage_summary: CoverageSummary,
}

/// Coverage evidence for one service under one scheme benefit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct ServiceCoverageDetail {
    pub insurer_name: String,
    pub scheme_name: String,
    pub benefit_name: String,
    #[schema(value_type = String)]
    pub coverage_amount: Decimal,
    #[schema(value_type = String)]
    pub coverage_percentage: Decimal,
    pub session_limit: Option<i32>,
    pub is_preauthorized: bool,
}

/// Whether (and how) a specific service is covered for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceCoverage {
    pub is_covered: bool,
    pub coverage_details: Vec<ServiceCoverageDetail>,
    pub preauthorization_required: bool,
}

#[derive(FromRow)]
struct ProfileRow {
    insurer_name: String,
    insurer_code: String,
    policy_name: String,
    member_number: String,
    member_type: String,
    scheme_name: String,
    scheme_code: String,
    annual_limit: Decimal,
    per_visit_limit: Decimal,
    benefit_category: Option<String>,
    benefit_name: Option<String>,
    benefit_code: Option<String>,
    coverage_amount: Option<Decimal>,
    coverage_percentage: Option<Decimal>,
    session_limit: Option<i32>,
    frequency_limit: Option<String>,
    is_preauthorized: Option<bool>,
}

/// Read-only directory over a member's coverage.
#[derive(Clone)]
pub struct BenefitDirectory {
    store: CoverageStore,
}

impl BenefitDirectory {
    pub fn new(store: CoverageStore) -> Self {
        Self { store }
    }

    /// A patient's active member policies with their policy, insurer and
    /// scheme context. Empty for unknown patients.
    pub async fn member_policies(
        &self,
        patient_id: Uuid,
    ) -> CoverageResult<Vec<MemberPolicyOverview>> {
        let enrollments = sqlx::query_as::<_, MemberPolicy>(
            "SELECT * FROM member_policies WHERE patient_id = $1 AND is_active = true ORDER BY created_at",
        )
        .bind(patient_id)
        .fetch_all(self.store.pool())
        .await?;

        let mut overviews = Vec::with_capacity(enrollments.len());
        for member_policy in enrollments {
            let Some(policy) = self.store.get_policy(member_policy.policy_id).await? else {
                continue;
            };
            let Some(insurer) = self.store.get_insurer(policy.insurer_id).await? else {
                continue;
            };
            let schemes = sqlx::query_as::<_, Scheme>(
                r#"
                SELECT s.* FROM schemes s
                JOIN member_schemes msch ON msch.scheme_id = s.id
                WHERE msch.member_policy_id = $1
                  AND msch.is_active = true
                  AND s.is_active = true
                ORDER BY s.scheme_name
                "#,
            )
            .bind(member_policy.id)
            .fetch_all(self.store.pool())
            .await?;

            overviews.push(MemberPolicyOverview {
                member_policy,
                policy,
                insurer,
                schemes,
            });
        }

        Ok(overviews)
    }

    /// Year-scoped benefit summary: enrollments plus the year's utilization
    /// rows and their derived total.
    pub async fn benefit_summary(
        &self,
        patient_id: Uuid,
        financial_year: String,
    ) -> CoverageResult<BenefitSummary> {
        let member_policies = self.member_policies(patient_id).await?;
        let ledger = UtilizationLedger::new(self.store.clone());
        let utilization = ledger
            .member_history(patient_id, Some(&financial_year), None)
            .await?;
        let total_utilized = utilization
            .iter()
            .map(|u| u.amount_utilized)
            .sum::<Decimal>();

        Ok(BenefitSummary {
            patient_id,
            financial_year,
            member_policies,
            utilization,
            total_utilized,
            last_updated: Utc::now(),
        })
    }

    /// Comprehensive coverage profile assembled in one pass over the
    /// enrollment chain. `None` when the patient has no active enrollment.
    pub async fn benefit_profile(&self, patient_id: Uuid) -> CoverageResult<Option<BenefitProfile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT
                i.name AS insurer_name,
                i.code AS insurer_code,
                p.name AS policy_name,
                mp.member_number,
                mp.member_type,
                s.scheme_name,
                s.scheme_code,
                s.annual_limit,
                s.per_visit_limit,
                sb.benefit_category,
                sb.benefit_name,
                sb.benefit_code,
                sb.coverage_amount,
                sb.coverage_percentage,
                sb.session_limit,
                sb.frequency_limit,
                sb.is_preauthorized
            FROM member_policies mp
            JOIN policies p ON mp.policy_id = p.id
            JOIN insurers i ON p.insurer_id = i.id
            JOIN member_schemes msch ON msch.member_policy_id = mp.id
            JOIN schemes s ON msch.scheme_id = s.id
            LEFT JOIN scheme_benefits sb ON sb.scheme_id = s.id AND sb.is_active = true
            WHERE mp.patient_id = $1
              AND mp.is_active = true
              AND msch.is_active = true
              AND p.is_active = true
              AND s.is_active = true
            ORDER BY i.name, s.scheme_name, sb.benefit_category, sb.benefit_name
            "#,
        )
        .bind(patient_id)
        .fetch_all(self.store.pool())
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let active_policies = structure_policies(rows);
        let coverage_summary = summarize(&active_policies);

        Ok(Some(BenefitProfile {
            patient_id,
            active_policies,
            coverage_summary,
        }))
    }

    /// Whether any of the patient's active scheme benefits covers the given
    /// service code or category, best coverage first.
    pub async fn service_coverage(
        &self,
        patient_id: Uuid,
        service_code: &str,
        service_category: &str,
    ) -> CoverageResult<ServiceCoverage> {
        let coverage_details = sqlx::query_as::<_, ServiceCoverageDetail>(
            r#"
            SELECT
                i.name AS insurer_name,
                s.scheme_name,
                sb.benefit_name,
                sb.coverage_amount,
                sb.coverage_percentage,
                sb.session_limit,
                sb.is_preauthorized
            FROM member_policies mp
            JOIN policies p ON mp.policy_id = p.id
            JOIN insurers i ON p.insurer_id = i.id
            JOIN member_schemes msch ON msch.member_policy_id = mp.id
            JOIN schemes s ON msch.scheme_id = s.id
            JOIN scheme_benefits sb ON sb.scheme_id = s.id
            WHERE mp.patient_id = $1
              AND mp.is_active = true
              AND msch.is_active = true
              AND p.is_active = true
              AND s.is_active = true
              AND sb.is_active = true
              AND (sb.benefit_code = $2 OR sb.benefit_category = $3)
            ORDER BY sb.coverage_percentage DESC, sb.coverage_amount DESC
            "#,
        )
        .bind(patient_id)
        .bind(service_code)
        .bind(service_category)
        .fetch_all(self.store.pool())
        .await?;

        let is_covered = !coverage_details.is_empty();
        let preauthorization_required = coverage_details.iter().any(|c| c.is_preauthorized);

        Ok(ServiceCoverage {
            is_covered,
            coverage_details,
            preauthorization_required,
        })
    }
}

/// Regroup the flat join rows into the nested policy → scheme → benefit
/// shape. Rows arrive ordered, so grouping is a linear scan.
fn structure_policies(rows: Vec<ProfileRow>) -> Vec<PolicyCoverage> {
    let mut policies: Vec<PolicyCoverage> = Vec::new();

    for row in rows {
        let policy_pos = policies
            .iter()
            .position(|p| p.insurer_code == row.insurer_code && p.member_number == row.member_number);
        let policy = match policy_pos {
            Some(pos) => &mut policies[pos],
            None => {
                policies.push(PolicyCoverage {
                    insurer_name: row.insurer_name.clone(),
                    insurer_code: row.insurer_code.clone(),
                    policy_name: row.policy_name.clone(),
                    member_number: row.member_number.clone(),
                    member_type: row.member_type.clone(),
                    schemes: Vec::new(),
                });
                let last = policies.len() - 1;
                &mut policies[last]
            }
        };

        let scheme_pos = policy
            .schemes
            .iter()
            .position(|s| s.scheme_code == row.scheme_code);
        let scheme = match scheme_pos {
            Some(pos) => &mut policy.schemes[pos],
            None => {
                policy.schemes.push(SchemeCoverage {
                    scheme_name: row.scheme_name.clone(),
                    scheme_code: row.scheme_code.clone(),
                    annual_limit: row.annual_limit,
                    per_visit_limit: row.per_visit_limit,
                    benefits: Vec::new(),
                });
                let last = policy.schemes.len() - 1;
                &mut policy.schemes[last]
            }
        };

        // LEFT JOIN: schemes without benefits produce a single all-NULL
        // benefit row that carries no benefit line.
        if let (Some(category), Some(name), Some(code)) =
            (row.benefit_category, row.benefit_name, row.benefit_code)
        {
            scheme.benefits.push(BenefitSnapshot {
                category,
                name,
                code,
                coverage_amount: row.coverage_amount.unwrap_or(Decimal::ZERO),
                coverage_percentage: row.coverage_percentage.unwrap_or(Decimal::ZERO),
                session_limit: row.session_limit,
                frequency_limit: row.frequency_limit,
                requires_preauth: row.is_preauthorized.unwrap_or(false),
            });
        }
    }

    policies
}

fn summarize(policies: &[PolicyCoverage]) -> CoverageSummary {
    let total_active_schemes = policies.iter().map(|p| p.schemes.len()).sum();
    let total_available_benefits = policies
        .iter()
        .flat_map(|p| p.schemes.iter())
        .map(|s| s.benefits.len())
        .sum();
    let total_annual_coverage = policies
        .iter()
        .flat_map(|p| p.schemes.iter())
        .map(|s| s.annual_limit)
        .sum();

    let mut insurers: Vec<String> = policies.iter().map(|p| p.insurer_name.clone()).collect();
    insurers.sort();
    insurers.dedup();

    CoverageSummary {
        total_active_policies: policies.len(),
        total_active_schemes,
        total_available_benefits,
        total_annual_coverage,
        insurers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(
        insurer: &str,
        member_number: &str,
        scheme_code: &str,
        benefit_code: Option<&str>,
    ) -> ProfileRow {
        ProfileRow {
            insurer_name: insurer.to_string(),
            insurer_code: insurer.to_string(),
            policy_name: "Corporate".to_string(),
            member_number: member_number.to_string(),
            member_type: "principal".to_string(),
            scheme_name: scheme_code.to_string(),
            scheme_code: scheme_code.to_string(),
            annual_limit: dec!(10000),
            per_visit_limit: dec!(2000),
            benefit_category: benefit_code.map(|_| "outpatient".to_string()),
            benefit_name: benefit_code.map(|c| format!("Benefit {c}")),
            benefit_code: benefit_code.map(str::to_string),
            coverage_amount: benefit_code.map(|_| dec!(500)),
            coverage_percentage: benefit_code.map(|_| dec!(80)),
            session_limit: None,
            frequency_limit: None,
            is_preauthorized: benefit_code.map(|_| false),
        }
    }

    #[test]
    fn grouping_collapses_rows_into_nested_shape() {
        let rows = vec![
            row("ACME", "M-1", "OP", Some("B1")),
            row("ACME", "M-1", "OP", Some("B2")),
            row("ACME", "M-1", "DENT", Some("B3")),
            row("ZEN", "M-2", "OP", Some("B1")),
        ];

        let policies = structure_policies(rows);
        assert_eq!(policies.len(), 2);
        assert_eq!(policies[0].schemes.len(), 2);
        assert_eq!(policies[0].schemes[0].benefits.len(), 2);
        assert_eq!(policies[1].schemes.len(), 1);
    }

    #[test]
    fn scheme_without_benefits_keeps_empty_benefit_list() {
        let policies = structure_policies(vec![row("ACME", "M-1", "OP", None)]);
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].schemes.len(), 1);
        assert!(policies[0].schemes[0].benefits.is_empty());
    }

    #[test]
    fn summary_counts_and_dedupes_insurers() {
        let rows = vec![
            row("ACME", "M-1", "OP", Some("B1")),
            row("ACME", "M-1", "DENT", None),
            row("ACME", "M-2", "OP", Some("B1")),
        ];
        let policies = structure_policies(rows);
        let summary = summarize(&policies);

        assert_eq!(summary.total_active_policies, 2);
        assert_eq!(summary.total_active_schemes, 3);
        assert_eq!(summary.total_available_benefits, 2);
        assert_eq!(summary.total_annual_coverage, dec!(30000));
        assert_eq!(summary.insurers, vec!["ACME".to_string()]);
    }
}
