use cnet_core::{IgnorePolicy, Real};
use serde::{Deserialize, Serialize};

use crate::{AuditError, DEFAULT_CACHE_CAPACITY};

/// Options for one audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Skip ignored points and measures.
    pub honor_ignore: bool,
    /// Minimum acceptable hull coverage ratio in `[0, 1]`.
    pub tolerance: Real,
    /// Run the pixel → ground reprojection check.
    pub check_reprojection: bool,
    /// Run the convex hull coverage check.
    pub check_coverage: bool,
    /// Maximum number of backing images held open at once.
    pub cache_capacity: usize,
    /// Treat network images missing from the catalog as fatal input errors.
    pub require_cataloged_images: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            honor_ignore: true,
            tolerance: 0.0,
            check_reprojection: true,
            check_coverage: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            require_cataloged_images: false,
        }
    }
}

impl AuditConfig {
    pub fn ignore_policy(&self) -> IgnorePolicy {
        IgnorePolicy::from_honor_flag(self.honor_ignore)
    }

    pub fn validate(&self) -> Result<(), AuditError> {
        if !self.tolerance.is_finite() || !(0.0..=1.0).contains(&self.tolerance) {
            return Err(AuditError::InvalidConfig(format!(
                "tolerance must lie in [0, 1], got {}",
                self.tolerance
            )));
        }
        if self.cache_capacity == 0 {
            return Err(AuditError::InvalidConfig(
                "cache capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: AuditConfig = serde_json::from_str(r#"{"tolerance": 0.25}"#).unwrap();
        assert_eq!(cfg.tolerance, 0.25);
        assert!(cfg.honor_ignore);
        assert_eq!(cfg.cache_capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut cfg = AuditConfig {
            tolerance: 1.5,
            ..AuditConfig::default()
        };
        assert!(cfg.validate().is_err());
        cfg.tolerance = 0.5;
        cfg.cache_capacity = 0;
        assert!(cfg.validate().is_err());
        cfg.cache_capacity = 1;
        assert!(cfg.validate().is_ok());
    }
}
