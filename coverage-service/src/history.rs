//! Append-only audit trail for policy mutations.
//!
//! Every create/update/deactivate of a policy writes exactly one row here, in
//! the same transaction as the data change. Rows are never updated or
//! deleted; the trail is queried newest-first.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgExecutor, PgPool};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::CoverageResult;
use crate::models::Policy;

/// Kind of policy mutation being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PolicyChangeType {
    Created,
    Updated,
    Cancelled,
}

impl PolicyChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Typed snapshot of a policy's mutable state, stored as JSONB on each
/// history row. Kept structural so snapshots survive schema drift reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PolicySnapshot {
    pub insurer_id: Uuid,
    pub policy_number: String,
    pub name: String,
    pub effective_date: NaiveDate,
    pub is_active: bool,
}

impl From<&Policy> for PolicySnapshot {
    fn from(policy: &Policy) -> Self {
        Self {
            insurer_id: policy.insurer_id,
            policy_number: policy.policy_number.clone(),
            name: policy.name.clone(),
            effective_date: policy.effective_date,
            is_active: policy.is_active,
        }
    }
}

/// Immutable history row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct PolicyHistoryEntry {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub change_type: String,
    pub change_description: Option<String>,
    #[schema(value_type = Option<PolicySnapshot>)]
    pub previous_values: Option<Json<PolicySnapshot>>,
    #[schema(value_type = Option<PolicySnapshot>)]
    pub new_values: Option<Json<PolicySnapshot>>,
    pub effective_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Payload for one history row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewPolicyChange {
    pub policy_id: Uuid,
    pub change_type: PolicyChangeType,
    pub change_description: Option<String>,
    pub previous_values: Option<PolicySnapshot>,
    pub new_values: Option<PolicySnapshot>,
    pub effective_date: NaiveDate,
}

/// Insert a history row on the given executor.
///
/// Called with a transaction handle by the store's policy mutations so the
/// audit row commits or rolls back together with the data row.
pub async fn insert_change<'e, E>(
    executor: E,
    change: NewPolicyChange,
) -> CoverageResult<PolicyHistoryEntry>
where
    E: PgExecutor<'e>,
{
    let entry = sqlx::query_as::<_, PolicyHistoryEntry>(
        r#"
        INSERT INTO policy_history (
            policy_id, change_type, change_description,
            previous_values, new_values, effective_date
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(change.policy_id)
    .bind(change.change_type.as_str())
    .bind(&change.change_description)
    .bind(change.previous_values.map(Json))
    .bind(change.new_values.map(Json))
    .bind(change.effective_date)
    .fetch_one(executor)
    .await?;

    Ok(entry)
}

/// Full change history for a policy, newest first.
pub async fn history_for_policy(
    pool: &PgPool,
    policy_id: Uuid,
) -> CoverageResult<Vec<PolicyHistoryEntry>> {
    let entries = sqlx::query_as::<_, PolicyHistoryEntry>(
        "SELECT * FROM policy_history WHERE policy_id = $1 ORDER BY created_at DESC",
    )
    .bind(policy_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_type_round_trips_through_str() {
        assert_eq!(PolicyChangeType::Created.as_str(), "created");
        assert_eq!(PolicyChangeType::Updated.as_str(), "updated");
        assert_eq!(PolicyChangeType::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn snapshot_captures_every_mutable_field() {
        let policy = Policy {
            id: Uuid::new_v4(),
            insurer_id: Uuid::new_v4(),
            policy_number: "POL-2024-001".to_string(),
            name: "Corporate Gold".to_string(),
            effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let snapshot = PolicySnapshot::from(&policy);
        assert_eq!(snapshot.insurer_id, policy.insurer_id);
        assert_eq!(snapshot.policy_number, policy.policy_number);
        assert_eq!(snapshot.name, policy.name);
        assert_eq!(snapshot.effective_date, policy.effective_date);
        assert!(snapshot.is_active);
    }
}
