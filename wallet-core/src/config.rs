//! Domain configuration types

use crate::{Amount, ConfigError, InvestmentPlan, WalletError, WalletResult};
use serde::{Deserialize, Serialize};

/// Default settlement cap applied to newly added identifiers.
pub const DEFAULT_MAX_PAYMENTS_PER_CYCLE: i32 = 10;

/// Rotation settings for the payment identifier pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RotationConfig {
    pub default_max_payments_per_cycle: i32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            default_max_payments_per_cycle: DEFAULT_MAX_PAYMENTS_PER_CYCLE,
        }
    }
}

/// Daily check-in bonus range, inclusive, in paise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CheckinConfig {
    pub min_bonus: Amount,
    pub max_bonus: Amount,
}

impl Default for CheckinConfig {
    fn default() -> Self {
        // ₹10 to ₹60
        Self {
            min_bonus: 1_000,
            max_bonus: 6_000,
        }
    }
}

/// Per-request amount bounds, in paise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LimitsConfig {
    pub min_withdrawal: Amount,
    pub max_recharge: Amount,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        // ₹300 minimum withdrawal, ₹10,00,000 maximum single recharge
        Self {
            min_withdrawal: 30_000,
            max_recharge: 100_000_000,
        }
    }
}

/// Master domain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct WalletConfig {
    pub rotation: RotationConfig,
    pub checkin: CheckinConfig,
    pub limits: LimitsConfig,
    pub plans: Vec<InvestmentPlan>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rotation: RotationConfig::default(),
            checkin: CheckinConfig::default(),
            limits: LimitsConfig::default(),
            plans: default_plans(),
        }
    }
}

/// Built-in plan catalogue.
pub fn default_plans() -> Vec<InvestmentPlan> {
    [
        ("Starter", 50_000, 2_500, 30),
        ("Silver", 200_000, 11_000, 30),
        ("Gold", 500_000, 30_000, 45),
        ("Platinum", 1_000_000, 65_000, 60),
    ]
    .into_iter()
    .map(|(name, price, daily_profit, days)| InvestmentPlan {
        name: name.to_string(),
        price,
        daily_profit,
        days,
    })
    .collect()
}

impl WalletConfig {
    /// Look up a plan by name, case-insensitively.
    pub fn plan(&self, name: &str) -> Option<&InvestmentPlan> {
        self.plans
            .iter()
            .find(|plan| plan.name.eq_ignore_ascii_case(name))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> WalletResult<()> {
        if self.rotation.default_max_payments_per_cycle <= 0 {
            return Err(WalletError::Config(ConfigError::InvalidValue {
                field: "default_max_payments_per_cycle".to_string(),
                value: self.rotation.default_max_payments_per_cycle.to_string(),
                reason: "cap must be greater than 0".to_string(),
            }));
        }

        if self.checkin.min_bonus < 0 || self.checkin.min_bonus > self.checkin.max_bonus {
            return Err(WalletError::Config(ConfigError::InvalidValue {
                field: "checkin".to_string(),
                value: format!("{}..={}", self.checkin.min_bonus, self.checkin.max_bonus),
                reason: "bonus range must be non-negative and ordered".to_string(),
            }));
        }

        if self.limits.min_withdrawal <= 0 {
            return Err(WalletError::Config(ConfigError::InvalidValue {
                field: "min_withdrawal".to_string(),
                value: self.limits.min_withdrawal.to_string(),
                reason: "minimum withdrawal must be greater than 0".to_string(),
            }));
        }

        if self.limits.max_recharge <= 0 {
            return Err(WalletError::Config(ConfigError::InvalidValue {
                field: "max_recharge".to_string(),
                value: self.limits.max_recharge.to_string(),
                reason: "maximum recharge must be greater than 0".to_string(),
            }));
        }

        for plan in &self.plans {
            if plan.price <= 0 || plan.daily_profit < 0 || plan.days <= 0 {
                return Err(WalletError::Config(ConfigError::InvalidValue {
                    field: "plans".to_string(),
                    value: plan.name.clone(),
                    reason: "price and days must be positive, profit non-negative".to_string(),
                }));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(WalletConfig::default().validate().is_ok());
        assert_eq!(
            WalletConfig::default().rotation.default_max_payments_per_cycle,
            10
        );
    }

    #[test]
    fn test_zero_cap_is_rejected() {
        let mut config = WalletConfig::default();
        config.rotation.default_max_payments_per_cycle = 0;
        assert!(matches!(
            config.validate(),
            Err(WalletError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_inverted_bonus_range_is_rejected() {
        let mut config = WalletConfig::default();
        config.checkin = CheckinConfig {
            min_bonus: 500,
            max_bonus: 100,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_limits() {
        let limits = WalletConfig::default().limits;
        assert_eq!(limits.min_withdrawal, 30_000);
        assert!(limits.max_recharge > limits.min_withdrawal);
    }

    #[test]
    fn test_non_positive_limits_are_rejected() {
        let mut config = WalletConfig::default();
        config.limits.min_withdrawal = 0;
        assert!(config.validate().is_err());

        let mut config = WalletConfig::default();
        config.limits.max_recharge = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_plan_lookup_ignores_case() {
        let config = WalletConfig::default();
        assert!(config.plan("starter").is_some());
        assert!(config.plan("Diamond").is_none());
    }
}
