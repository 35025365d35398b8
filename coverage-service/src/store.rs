//! Durable CRUD over the coverage hierarchy.
//!
//! Every entity is soft-deleted by flipping `is_active`; no row is ever
//! removed. Policy mutations are transactionally coupled to their history
//! rows: the data change and the audit row commit together or not at all.

use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CoverageError, CoverageResult};
use crate::history::{self, NewPolicyChange, PolicyChangeType, PolicySnapshot};
use crate::models::*;

/// Stateless handle over the coverage schema. Cheap to clone; all state
/// lives in the pool.
#[derive(Clone)]
pub struct CoverageStore {
    pool: PgPool,
}

impl CoverageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === INSURERS ===

    /// Active insurers, one page at a time.
    pub async fn list_insurers(&self, limit: i64, offset: i64) -> CoverageResult<Vec<Insurer>> {
        let insurers = sqlx::query_as::<_, Insurer>(
            "SELECT * FROM insurers WHERE is_active = true ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(insurers)
    }

    /// Number of active insurers.
    pub async fn count_insurers(&self) -> CoverageResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM insurers WHERE is_active = true")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn get_insurer(&self, id: Uuid) -> CoverageResult<Option<Insurer>> {
        let insurer = sqlx::query_as::<_, Insurer>("SELECT * FROM insurers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(insurer)
    }

    pub async fn create_insurer(&self, data: NewInsurer) -> CoverageResult<Insurer> {
        let insurer = sqlx::query_as::<_, Insurer>(
            "INSERT INTO insurers (name, code) VALUES ($1, $2) RETURNING *",
        )
        .bind(&data.name)
        .bind(&data.code)
        .fetch_one(&self.pool)
        .await
        .map_err(unique_violation("insurer code already registered"))?;

        info!(insurer_id = %insurer.id, code = %insurer.code, "insurer created");
        Ok(insurer)
    }

    pub async fn update_insurer(
        &self,
        id: Uuid,
        data: InsurerUpdate,
    ) -> CoverageResult<Option<Insurer>> {
        let insurer = sqlx::query_as::<_, Insurer>(
            r#"
            UPDATE insurers SET
                name = COALESCE($1, name),
                code = COALESCE($2, code),
                is_active = COALESCE($3, is_active),
                updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.code)
        .bind(data.is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(insurer)
    }

    /// Soft-delete: flips `is_active`, never removes the row.
    pub async fn deactivate_insurer(&self, id: Uuid) -> CoverageResult<bool> {
        let rows = sqlx::query(
            "UPDATE insurers SET is_active = false, updated_at = NOW() WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows > 0)
    }

    // === POLICIES ===

    /// Active policies offered by an insurer.
    pub async fn list_policies_by_insurer(&self, insurer_id: Uuid) -> CoverageResult<Vec<Policy>> {
        let policies = sqlx::query_as::<_, Policy>(
            "SELECT * FROM policies WHERE insurer_id = $1 AND is_active = true ORDER BY created_at DESC",
        )
        .bind(insurer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(policies)
    }

    pub async fn get_policy(&self, id: Uuid) -> CoverageResult<Option<Policy>> {
        let policy = sqlx::query_as::<_, Policy>("SELECT * FROM policies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(policy)
    }

    /// Insert a policy and its "created" history row in one transaction.
    pub async fn create_policy(&self, data: NewPolicy) -> CoverageResult<Policy> {
        let mut tx = self.pool.begin().await?;

        let policy = sqlx::query_as::<_, Policy>(
            r#"
            INSERT INTO policies (insurer_id, policy_number, name, effective_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.insurer_id)
        .bind(&data.policy_number)
        .bind(&data.name)
        .bind(data.effective_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(foreign_key_violation("insurer"))?;

        history::insert_change(
            &mut *tx,
            NewPolicyChange {
                policy_id: policy.id,
                change_type: PolicyChangeType::Created,
                change_description: Some("Policy created".to_string()),
                previous_values: None,
                new_values: Some(PolicySnapshot::from(&policy)),
                effective_date: policy.effective_date,
            },
        )
        .await
        .map_err(|e| CoverageError::Integrity(format!("history write failed: {e}")))?;

        tx.commit().await?;
        info!(policy_id = %policy.id, policy_number = %policy.policy_number, "policy created");
        Ok(policy)
    }

    /// Apply a partial update and its "updated" history row in one
    /// transaction. The current row is read under `FOR UPDATE` so the
    /// previous-values snapshot cannot race a concurrent mutation.
    pub async fn update_policy(
        &self,
        id: Uuid,
        data: PolicyUpdate,
    ) -> CoverageResult<Option<Policy>> {
        let mut tx = self.pool.begin().await?;

        let Some(current) =
            sqlx::query_as::<_, Policy>("SELECT * FROM policies WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(None);
        };

        let updated = sqlx::query_as::<_, Policy>(
            r#"
            UPDATE policies SET
                policy_number = COALESCE($1, policy_number),
                name = COALESCE($2, name),
                effective_date = COALESCE($3, effective_date),
                updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&data.policy_number)
        .bind(&data.name)
        .bind(data.effective_date)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        history::insert_change(
            &mut *tx,
            NewPolicyChange {
                policy_id: id,
                change_type: PolicyChangeType::Updated,
                change_description: Some("Policy updated".to_string()),
                previous_values: Some(PolicySnapshot::from(&current)),
                new_values: Some(PolicySnapshot::from(&updated)),
                effective_date: data.effective_date.unwrap_or(current.effective_date),
            },
        )
        .await
        .map_err(|e| CoverageError::Integrity(format!("history write failed: {e}")))?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Deactivate a policy, recording the reason as a "cancelled" history row.
    pub async fn deactivate_policy(
        &self,
        id: Uuid,
        reason: &str,
    ) -> CoverageResult<Option<Policy>> {
        let mut tx = self.pool.begin().await?;

        let Some(current) =
            sqlx::query_as::<_, Policy>("SELECT * FROM policies WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(None);
        };

        let cancelled = sqlx::query_as::<_, Policy>(
            "UPDATE policies SET is_active = false, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        history::insert_change(
            &mut *tx,
            NewPolicyChange {
                policy_id: id,
                change_type: PolicyChangeType::Cancelled,
                change_description: Some(reason.to_string()),
                previous_values: Some(PolicySnapshot::from(&current)),
                new_values: Some(PolicySnapshot::from(&cancelled)),
                effective_date: chrono::Utc::now().date_naive(),
            },
        )
        .await
        .map_err(|e| CoverageError::Integrity(format!("history write failed: {e}")))?;

        tx.commit().await?;
        info!(policy_id = %id, reason, "policy deactivated");
        Ok(Some(cancelled))
    }

    // === SCHEMES ===

    /// Active schemes under a policy.
    pub async fn list_schemes_by_policy(&self, policy_id: Uuid) -> CoverageResult<Vec<Scheme>> {
        let schemes = sqlx::query_as::<_, Scheme>(
            "SELECT * FROM schemes WHERE policy_id = $1 AND is_active = true ORDER BY scheme_name",
        )
        .bind(policy_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(schemes)
    }

    pub async fn get_scheme(&self, id: Uuid) -> CoverageResult<Option<Scheme>> {
        let scheme = sqlx::query_as::<_, Scheme>("SELECT * FROM schemes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(scheme)
    }

    /// Scheme together with its active benefits; `None` for unknown scheme.
    pub async fn get_scheme_with_benefits(
        &self,
        id: Uuid,
    ) -> CoverageResult<Option<(Scheme, Vec<SchemeBenefit>)>> {
        let Some(scheme) = self.get_scheme(id).await? else {
            return Ok(None);
        };

        let benefits = sqlx::query_as::<_, SchemeBenefit>(
            "SELECT * FROM scheme_benefits WHERE scheme_id = $1 AND is_active = true ORDER BY benefit_category, benefit_name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some((scheme, benefits)))
    }

    pub async fn create_scheme(&self, data: NewScheme) -> CoverageResult<Scheme> {
        let scheme = sqlx::query_as::<_, Scheme>(
            r#"
            INSERT INTO schemes (
                policy_id, scheme_name, scheme_code, benefit_category,
                annual_limit, per_visit_limit, preauthorization_required
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(data.policy_id)
        .bind(&data.scheme_name)
        .bind(&data.scheme_code)
        .bind(&data.benefit_category)
        .bind(data.annual_limit)
        .bind(data.per_visit_limit)
        .bind(data.preauthorization_required)
        .fetch_one(&self.pool)
        .await
        .map_err(foreign_key_violation("policy"))?;

        debug!(scheme_id = %scheme.id, code = %scheme.scheme_code, "scheme created");
        Ok(scheme)
    }

    pub async fn update_scheme(
        &self,
        id: Uuid,
        data: SchemeUpdate,
    ) -> CoverageResult<Option<Scheme>> {
        let scheme = sqlx::query_as::<_, Scheme>(
            r#"
            UPDATE schemes SET
                scheme_name = COALESCE($1, scheme_name),
                scheme_code = COALESCE($2, scheme_code),
                benefit_category = COALESCE($3, benefit_category),
                annual_limit = COALESCE($4, annual_limit),
                per_visit_limit = COALESCE($5, per_visit_limit),
                preauthorization_required = COALESCE($6, preauthorization_required),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(&data.scheme_name)
        .bind(&data.scheme_code)
        .bind(&data.benefit_category)
        .bind(data.annual_limit)
        .bind(data.per_visit_limit)
        .bind(data.preauthorization_required)
        .bind(data.is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(scheme)
    }

    /// Attach a batch of benefits to a scheme. The whole batch inserts in one
    /// transaction; a bad row fails the batch.
    pub async fn add_scheme_benefits(
        &self,
        scheme_id: Uuid,
        benefits: Vec<NewSchemeBenefit>,
    ) -> CoverageResult<Vec<SchemeBenefit>> {
        if benefits.is_empty() {
            return Err(CoverageError::validation("benefits batch is empty"));
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(benefits.len());

        for benefit in &benefits {
            let row = sqlx::query_as::<_, SchemeBenefit>(
                r#"
                INSERT INTO scheme_benefits (
                    scheme_id, benefit_category, benefit_name, benefit_code,
                    coverage_amount, coverage_percentage, session_limit,
                    frequency_limit, is_preauthorized
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
                "#,
            )
            .bind(scheme_id)
            .bind(&benefit.benefit_category)
            .bind(&benefit.benefit_name)
            .bind(&benefit.benefit_code)
            .bind(benefit.coverage_amount)
            .bind(benefit.coverage_percentage)
            .bind(benefit.session_limit)
            .bind(&benefit.frequency_limit)
            .bind(benefit.is_preauthorized)
            .fetch_one(&mut *tx)
            .await
            .map_err(foreign_key_violation("scheme"))?;
            inserted.push(row);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    // === MEMBER ENROLLMENT ===

    pub async fn enroll_member_policy(&self, data: NewMemberPolicy) -> CoverageResult<MemberPolicy> {
        let member_policy = sqlx::query_as::<_, MemberPolicy>(
            r#"
            INSERT INTO member_policies (patient_id, policy_id, member_number, member_type)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.patient_id)
        .bind(data.policy_id)
        .bind(&data.member_number)
        .bind(&data.member_type)
        .fetch_one(&self.pool)
        .await
        .map_err(foreign_key_violation("policy"))?;

        info!(
            member_policy_id = %member_policy.id,
            patient_id = %member_policy.patient_id,
            "member enrolled into policy"
        );
        Ok(member_policy)
    }

    pub async fn assign_scheme_to_member(
        &self,
        data: NewMemberScheme,
    ) -> CoverageResult<MemberScheme> {
        let member_scheme = sqlx::query_as::<_, MemberScheme>(
            "INSERT INTO member_schemes (member_policy_id, scheme_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(data.member_policy_id)
        .bind(data.scheme_id)
        .fetch_one(&self.pool)
        .await
        .map_err(foreign_key_violation("member policy or scheme"))?;
        Ok(member_scheme)
    }

    // === EXCLUSIONS ===

    pub async fn list_policy_exclusions(
        &self,
        policy_id: Uuid,
    ) -> CoverageResult<Vec<PolicyExclusion>> {
        let exclusions = sqlx::query_as::<_, PolicyExclusion>(
            "SELECT * FROM policy_exclusions WHERE policy_id = $1 AND is_active = true ORDER BY created_at DESC",
        )
        .bind(policy_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(exclusions)
    }

    /// Active exclusions across policies, optionally narrowed to one policy.
    pub async fn list_exclusions(
        &self,
        policy_id: Option<Uuid>,
    ) -> CoverageResult<Vec<PolicyExclusion>> {
        let exclusions = sqlx::query_as::<_, PolicyExclusion>(
            r#"
            SELECT * FROM policy_exclusions
            WHERE is_active = true
              AND ($1::uuid IS NULL OR policy_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(policy_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(exclusions)
    }

    pub async fn create_policy_exclusion(
        &self,
        data: NewPolicyExclusion,
    ) -> CoverageResult<PolicyExclusion> {
        let exclusion = sqlx::query_as::<_, PolicyExclusion>(
            r#"
            INSERT INTO policy_exclusions (policy_id, exclusion_type, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(data.policy_id)
        .bind(&data.exclusion_type)
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await
        .map_err(foreign_key_violation("policy"))?;
        Ok(exclusion)
    }

    // === COVERAGE MAPPINGS ===

    /// The single active mapping for (scheme, code type, code), if any.
    /// Uniqueness is enforced at insert time, so at most one row can match.
    pub async fn get_coverage_mapping(
        &self,
        scheme_id: Uuid,
        code_type: &str,
        code: &str,
    ) -> CoverageResult<Option<CoverageMapping>> {
        let mapping = sqlx::query_as::<_, CoverageMapping>(
            r#"
            SELECT * FROM coverage_mappings
            WHERE scheme_id = $1 AND code_type = $2 AND code = $3 AND is_active = true
            "#,
        )
        .bind(scheme_id)
        .bind(code_type)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(mapping)
    }

    /// Insert a coverage mapping. A second active mapping for the same
    /// (scheme, code type, code) violates the partial unique index and is
    /// rejected as a conflict.
    pub async fn create_coverage_mapping(
        &self,
        data: NewCoverageMapping,
    ) -> CoverageResult<CoverageMapping> {
        let mapping = sqlx::query_as::<_, CoverageMapping>(
            r#"
            INSERT INTO coverage_mappings (scheme_id, code_type, code, coverage_type)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.scheme_id)
        .bind(&data.code_type)
        .bind(&data.code)
        .bind(&data.coverage_type)
        .fetch_one(&self.pool)
        .await
        .map_err(unique_violation(
            "an active coverage mapping already exists for this scheme and code",
        ))?;
        Ok(mapping)
    }
}

/// Translate a Postgres unique violation into a domain conflict; everything
/// else passes through as a database error.
fn unique_violation(message: &'static str) -> impl Fn(sqlx::Error) -> CoverageError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            CoverageError::conflict(message)
        }
        _ => CoverageError::Database(e),
    }
}

/// Translate a Postgres foreign-key violation into a typed not-found for the
/// referenced parent.
fn foreign_key_violation(resource: &'static str) -> impl Fn(sqlx::Error) -> CoverageError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            CoverageError::NotFound { resource }
        }
        _ => CoverageError::Database(e),
    }
}
