//! Benefit utilization ledger.
//!
//! Consumption is recorded as append-only rows; balances are always derived
//! sums, never stored totals. The automatic-deduction path serializes per
//! scheme with a row lock and re-derives the utilized sum inside the lock,
//! so concurrent deductions cannot push a member's scheme past its annual
//! limit.

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{CoverageError, CoverageResult};
use crate::models::{BenefitUtilization, NewBenefitUtilization, Scheme};
use crate::store::CoverageStore;

/// The financial-year bucket for "now": the current UTC calendar year.
pub fn current_financial_year() -> String {
    Utc::now().year().to_string()
}

/// Derived utilization total for one member scheme and financial year.
pub async fn total_utilized(
    pool: &PgPool,
    member_policy_id: Uuid,
    scheme_id: Uuid,
    financial_year: &str,
) -> CoverageResult<Decimal> {
    let total: Decimal = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(amount_utilized), 0)
        FROM benefit_utilization
        WHERE member_policy_id = $1 AND scheme_id = $2 AND financial_year = $3
        "#,
    )
    .bind(member_policy_id)
    .bind(scheme_id)
    .bind(financial_year)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

/// Outcome of an automatic deduction against an approved claim.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeductionOutcome {
    pub claim_id: Uuid,
    pub utilization: BenefitUtilization,
    #[schema(value_type = String)]
    pub deducted_amount: Decimal,
    pub scheme: Scheme,
}

#[derive(FromRow)]
struct DeductionCandidate {
    member_policy_id: Uuid,
    scheme_id: Uuid,
}

/// Append-only recording of benefit consumption.
#[derive(Clone)]
pub struct UtilizationLedger {
    store: CoverageStore,
}

impl UtilizationLedger {
    pub fn new(store: CoverageStore) -> Self {
        Self { store }
    }

    /// Record a utilization row as-is.
    ///
    /// This is a pure insert: the ledger never rejects on limit here, since
    /// limit enforcement belongs to the deduction path and the eligibility
    /// check that precedes claims approval.
    pub async fn record(&self, data: NewBenefitUtilization) -> CoverageResult<BenefitUtilization> {
        if data.amount_utilized <= Decimal::ZERO {
            return Err(CoverageError::validation("amount_utilized must be positive"));
        }

        let row = sqlx::query_as::<_, BenefitUtilization>(
            r#"
            INSERT INTO benefit_utilization (
                member_policy_id, scheme_id, claim_id,
                utilization_date, amount_utilized, financial_year
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(data.member_policy_id)
        .bind(data.scheme_id)
        .bind(data.claim_id)
        .bind(data.utilization_date)
        .bind(data.amount_utilized)
        .bind(&data.financial_year)
        .fetch_one(self.store.pool())
        .await?;

        info!(
            utilization_id = %row.id,
            scheme_id = %row.scheme_id,
            amount = %row.amount_utilized,
            "benefit utilization recorded"
        );
        Ok(row)
    }

    /// A member's utilization rows, newest first, optionally narrowed by
    /// financial year and scheme.
    pub async fn member_history(
        &self,
        patient_id: Uuid,
        financial_year: Option<&str>,
        scheme_id: Option<Uuid>,
    ) -> CoverageResult<Vec<BenefitUtilization>> {
        let rows = sqlx::query_as::<_, BenefitUtilization>(
            r#"
            SELECT bu.*
            FROM benefit_utilization bu
            JOIN member_policies mp ON bu.member_policy_id = mp.id
            WHERE mp.patient_id = $1
              AND ($2::text IS NULL OR bu.financial_year = $2)
              AND ($3::uuid IS NULL OR bu.scheme_id = $3)
            ORDER BY bu.created_at DESC
            "#,
        )
        .bind(patient_id)
        .bind(financial_year)
        .bind(scheme_id)
        .fetch_all(self.store.pool())
        .await?;
        Ok(rows)
    }

    /// Resolve the paying scheme for an approved claim and post the
    /// deduction.
    ///
    /// Scheme resolution matches the member's active schemes on their
    /// administratively maintained `benefit_category` tag (case-insensitive
    /// equality). Among several matches the scheme with the greatest
    /// remaining balance wins, ties on lowest scheme id.
    ///
    /// The insert itself runs under a `FOR UPDATE` lock on the scheme row:
    /// the utilized sum is re-derived inside the lock and the row is only
    /// written when it still fits the annual limit, otherwise the whole
    /// transaction rolls back with `CapacityExceeded`.
    pub async fn process_deduction(
        &self,
        claim_id: Uuid,
        patient_id: Uuid,
        amount: Decimal,
        benefit_category: &str,
        financial_year: Option<String>,
    ) -> CoverageResult<DeductionOutcome> {
        if amount <= Decimal::ZERO {
            return Err(CoverageError::validation("deduction amount must be positive"));
        }
        let financial_year = financial_year.unwrap_or_else(current_financial_year);

        let candidates = sqlx::query_as::<_, DeductionCandidate>(
            r#"
            SELECT msch.member_policy_id, msch.scheme_id
            FROM member_schemes msch
            JOIN member_policies mp ON msch.member_policy_id = mp.id
            JOIN schemes s ON msch.scheme_id = s.id
            JOIN policies p ON mp.policy_id = p.id
            WHERE mp.patient_id = $1
              AND LOWER(s.benefit_category) = LOWER($2)
              AND msch.is_active = true
              AND mp.is_active = true
              AND s.is_active = true
              AND p.is_active = true
            ORDER BY msch.scheme_id
            "#,
        )
        .bind(patient_id)
        .bind(benefit_category)
        .fetch_all(self.store.pool())
        .await?;

        if candidates.is_empty() {
            warn!(%patient_id, benefit_category, "no scheme matches benefit category");
            return Err(CoverageError::not_found("scheme for benefit category"));
        }

        // Pick the envelope with the most headroom. This read is advisory;
        // the authoritative check happens under the lock below.
        let mut best: Option<(DeductionCandidate, Decimal)> = None;
        for candidate in candidates {
            let utilized = total_utilized(
                self.store.pool(),
                candidate.member_policy_id,
                candidate.scheme_id,
                &financial_year,
            )
            .await?;
            let scheme = self
                .store
                .get_scheme(candidate.scheme_id)
                .await?
                .ok_or(CoverageError::not_found("scheme"))?;
            let remaining = scheme.annual_limit - utilized;

            let better = match &best {
                None => true,
                Some((current, current_remaining)) => {
                    remaining > *current_remaining
                        || (remaining == *current_remaining
                            && candidate.scheme_id < current.scheme_id)
                }
            };
            if better {
                best = Some((candidate, remaining));
            }
        }

        let (target, _) = best.ok_or(CoverageError::not_found("scheme for benefit category"))?;
        let utilization = self
            .deduct_guarded(&target, claim_id, amount, &financial_year)
            .await?;

        let scheme = self
            .store
            .get_scheme(target.scheme_id)
            .await?
            .ok_or(CoverageError::not_found("scheme"))?;

        info!(
            %claim_id,
            scheme_id = %scheme.id,
            amount = %amount,
            %financial_year,
            "automatic deduction posted"
        );

        Ok(DeductionOutcome {
            claim_id,
            utilization,
            deducted_amount: amount,
            scheme,
        })
    }

    /// The conditional insert at the heart of the deduction flow: lock the
    /// scheme row, re-derive the utilized sum, insert only if the result
    /// still fits the annual limit.
    async fn deduct_guarded(
        &self,
        target: &DeductionCandidate,
        claim_id: Uuid,
        amount: Decimal,
        financial_year: &str,
    ) -> CoverageResult<BenefitUtilization> {
        let mut tx = self.store.pool().begin().await?;

        let annual_limit: Decimal =
            sqlx::query_scalar("SELECT annual_limit FROM schemes WHERE id = $1 FOR UPDATE")
                .bind(target.scheme_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(CoverageError::not_found("scheme"))?;

        let utilized: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_utilized), 0)
            FROM benefit_utilization
            WHERE member_policy_id = $1 AND scheme_id = $2 AND financial_year = $3
            "#,
        )
        .bind(target.member_policy_id)
        .bind(target.scheme_id)
        .bind(financial_year)
        .fetch_one(&mut *tx)
        .await?;

        let remaining = annual_limit - utilized;
        if amount > remaining {
            warn!(
                scheme_id = %target.scheme_id,
                requested = %amount,
                remaining = %remaining,
                "deduction refused: annual limit would be exceeded"
            );
            return Err(CoverageError::CapacityExceeded {
                scheme_id: target.scheme_id,
                requested: amount,
                remaining,
            });
        }

        let row = sqlx::query_as::<_, BenefitUtilization>(
            r#"
            INSERT INTO benefit_utilization (
                member_policy_id, scheme_id, claim_id,
                utilization_date, amount_utilized, financial_year
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(target.member_policy_id)
        .bind(target.scheme_id)
        .bind(claim_id)
        .bind(Utc::now().date_naive())
        .bind(amount)
        .bind(financial_year)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn financial_year_is_the_calendar_year() {
        let year = current_financial_year();
        assert_eq!(year.len(), 4);
        assert!(year.parse::<i32>().is_ok());
    }
}
