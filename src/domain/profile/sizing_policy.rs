// ============================================================
// SIZING POLICY
// ============================================================
// Thresholds used when turning a column profile into a schema decision

use serde::{Deserialize, Serialize};

/// Largest width PostgreSQL accepts for `varchar(n)`
pub const MAX_VARCHAR_LENGTH: usize = 10_485_760;

/// Policy applied to column profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingPolicy {
    /// Largest distinct-value count still treated as a closed enumeration (default: 10)
    pub enum_cardinality_threshold: usize,

    /// Multiplier applied to the observed maximum length when sizing
    /// a bounded text column (default: 2)
    pub text_headroom_factor: usize,
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self {
            enum_cardinality_threshold: 10,
            text_headroom_factor: 2,
        }
    }
}

impl SizingPolicy {
    /// Validate policy values
    pub fn validate(&self) -> Result<(), String> {
        if self.enum_cardinality_threshold == 0 {
            return Err("enum_cardinality_threshold must be > 0".to_string());
        }
        if self.text_headroom_factor == 0 {
            return Err("text_headroom_factor must be > 0".to_string());
        }
        if self.text_headroom_factor > MAX_VARCHAR_LENGTH {
            return Err(format!(
                "text_headroom_factor must be <= {}",
                MAX_VARCHAR_LENGTH
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = SizingPolicy::default();
        assert_eq!(policy.enum_cardinality_threshold, 10);
        assert_eq!(policy.text_headroom_factor, 2);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        let policy = SizingPolicy {
            enum_cardinality_threshold: 0,
            ..Default::default()
        };
        assert!(policy.validate().is_err());

        let policy = SizingPolicy {
            text_headroom_factor: 0,
            ..Default::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_oversized_headroom_rejected() {
        let policy = SizingPolicy {
            text_headroom_factor: usize::MAX,
            ..Default::default()
        };
        assert!(policy.validate().is_err());

        let policy = SizingPolicy {
            text_headroom_factor: MAX_VARCHAR_LENGTH,
            ..Default::default()
        };
        assert!(policy.validate().is_ok());
    }
}
