use rust_decimal::Decimal;
use std::env;
use tracing::warn;

/// Default ceiling under which emergency procedures skip preauthorization.
const DEFAULT_EMERGENCY_AUTO_APPROVAL_LIMIT: u32 = 10_000;

/// Runtime configuration for the coverage engine.
#[derive(Debug, Clone)]
pub struct CoverageConfig {
    /// Emergency claims below this amount are auto-approved even when the
    /// scheme or coverage mapping would otherwise require preauthorization.
    pub emergency_auto_approval_limit: Decimal,
}

impl CoverageConfig {
    /// Load configuration from the environment.
    ///
    /// `COVERAGE_EMERGENCY_AUTO_APPROVAL_LIMIT` overrides the auto-approval
    /// ceiling; an unparseable value falls back to the default with a warning.
    pub fn from_env() -> Self {
        let emergency_auto_approval_limit = match env::var("COVERAGE_EMERGENCY_AUTO_APPROVAL_LIMIT")
        {
            Ok(raw) => match raw.parse::<Decimal>() {
                Ok(limit) if limit.is_sign_positive() => limit,
                _ => {
                    warn!(
                        value = %raw,
                        "invalid COVERAGE_EMERGENCY_AUTO_APPROVAL_LIMIT, using default"
                    );
                    Decimal::from(DEFAULT_EMERGENCY_AUTO_APPROVAL_LIMIT)
                }
            },
            Err(_) => Decimal::from(DEFAULT_EMERGENCY_AUTO_APPROVAL_LIMIT),
        };

        Self {
            emergency_auto_approval_limit,
        }
    }
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            emergency_auto_approval_limit: Decimal::from(DEFAULT_EMERGENCY_AUTO_APPROVAL_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold_matches_documented_value() {
        let config = CoverageConfig::default();
        assert_eq!(config.emergency_auto_approval_limit, Decimal::from(10_000));
    }
}
