use anyhow::Result;
use coverage_service::{
    BenefitDirectory, ClaimTemplateComposer, CoverageConfig, CoverageStore, EligibilityEvaluator,
    UtilizationLedger,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

/// Main coverage server state. Cloned per request by axum; all fields are
/// cheap handles.
#[derive(Clone)]
pub struct CoverageServer {
    /// Database connection pool
    pub db_pool: PgPool,
    /// Engine configuration
    pub config: CoverageConfig,
}

impl CoverageServer {
    /// Connect to the database and build the server state.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(50)
            .min_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");
        Ok(Self::new_with_pool(db_pool))
    }

    /// Build the server state from an existing pool (used by tests).
    pub fn new_with_pool(db_pool: PgPool) -> Self {
        Self {
            db_pool,
            config: CoverageConfig::from_env(),
        }
    }

    /// Coverage store handle.
    pub fn store(&self) -> CoverageStore {
        CoverageStore::new(self.db_pool.clone())
    }

    /// Eligibility evaluator over the store.
    pub fn evaluator(&self) -> EligibilityEvaluator {
        EligibilityEvaluator::new(self.store())
    }

    /// Utilization ledger over the store.
    pub fn ledger(&self) -> UtilizationLedger {
        UtilizationLedger::new(self.store())
    }

    /// Claim template composer over the store.
    pub fn composer(&self) -> ClaimTemplateComposer {
        ClaimTemplateComposer::new(self.store(), self.config.clone())
    }

    /// Member benefit directory over the store.
    pub fn benefits(&self) -> BenefitDirectory {
        BenefitDirectory::new(self.store())
    }

    /// Check if the database is reachable.
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.db_pool).await.is_ok()
    }
}
