//! Economy tuning tables.
//!
//! Every field carries a serde default so partial JSON overrides are valid.
//! Call [`EconomyConfig::validate`] (or load through
//! [`EconomyConfig::from_json`]) before handing a config to a session.
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::ConfigError;

/// Session-initial maxima for the four resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default = "ResourceLimits::default_max_stamina")]
    pub max_stamina: f64,
    #[serde(default = "ResourceLimits::default_base_max_weight")]
    pub base_max_weight: f64,
    #[serde(default = "ResourceLimits::default_max_durability")]
    pub max_durability: f64,
    #[serde(default = "ResourceLimits::default_max_hygiene")]
    pub max_hygiene: f64,
}

impl ResourceLimits {
    const fn default_max_stamina() -> f64 {
        constants::MAX_STAMINA
    }

    const fn default_base_max_weight() -> f64 {
        constants::BASE_MAX_WEIGHT
    }

    const fn default_max_durability() -> f64 {
        constants::MAX_DURABILITY
    }

    const fn default_max_hygiene() -> f64 {
        constants::MAX_HYGIENE
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_stamina: Self::default_max_stamina(),
            base_max_weight: Self::default_base_max_weight(),
            max_durability: Self::default_max_durability(),
            max_hygiene: Self::default_max_hygiene(),
        }
    }
}

/// Ratios of max below which a resource marks the player as impaired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningThresholds {
    #[serde(default = "WarningThresholds::default_stamina_ratio")]
    pub stamina_ratio: f64,
    #[serde(default = "WarningThresholds::default_hygiene_ratio")]
    pub hygiene_ratio: f64,
}

impl WarningThresholds {
    const fn default_stamina_ratio() -> f64 {
        constants::STAMINA_WARNING_RATIO
    }

    const fn default_hygiene_ratio() -> f64 {
        constants::HYGIENE_WARNING_RATIO
    }
}

impl Default for WarningThresholds {
    fn default() -> Self {
        Self {
            stamina_ratio: Self::default_stamina_ratio(),
            hygiene_ratio: Self::default_hygiene_ratio(),
        }
    }
}

/// Stamina pricing for manually carrying cargo to a drop point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnloadCfg {
    /// Flat stamina charged for any non-empty unload.
    #[serde(default = "UnloadCfg::default_base_cost")]
    pub base_cost: f64,
    #[serde(default = "UnloadCfg::default_stamina_per_kg")]
    pub stamina_per_kg: f64,
    /// Weight past which each kilogram costs `heavy_multiplier` times more.
    #[serde(default = "UnloadCfg::default_soft_threshold_kg")]
    pub soft_threshold_kg: f64,
    #[serde(default = "UnloadCfg::default_heavy_multiplier")]
    pub heavy_multiplier: f64,
}

impl UnloadCfg {
    const fn default_base_cost() -> f64 {
        constants::UNLOAD_BASE_COST
    }

    const fn default_stamina_per_kg() -> f64 {
        constants::UNLOAD_STAMINA_PER_KG
    }

    const fn default_soft_threshold_kg() -> f64 {
        constants::UNLOAD_SOFT_THRESHOLD_KG
    }

    const fn default_heavy_multiplier() -> f64 {
        constants::UNLOAD_HEAVY_MULTIPLIER
    }
}

impl Default for UnloadCfg {
    fn default() -> Self {
        Self {
            base_cost: Self::default_base_cost(),
            stamina_per_kg: Self::default_stamina_per_kg(),
            soft_threshold_kg: Self::default_soft_threshold_kg(),
            heavy_multiplier: Self::default_heavy_multiplier(),
        }
    }
}

/// Coin pricing for cleaning and repairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceCfg {
    #[serde(default = "MaintenanceCfg::default_clean_cost_per_point")]
    pub clean_cost_per_point: f64,
    #[serde(default = "MaintenanceCfg::default_repair_cost_per_point")]
    pub repair_cost_per_point: f64,
    /// Capacity at which the heavy-duty repair multiplier is exactly 1.
    #[serde(default = "MaintenanceCfg::default_repair_reference_capacity")]
    pub repair_reference_capacity: f64,
    /// Extra capacity that adds one more multiple of the base repair price.
    #[serde(default = "MaintenanceCfg::default_repair_reference_step")]
    pub repair_reference_step: f64,
    #[serde(default = "MaintenanceCfg::default_repair_minimum_charge")]
    pub repair_minimum_charge: u64,
}

impl MaintenanceCfg {
    const fn default_clean_cost_per_point() -> f64 {
        constants::CLEAN_COST_PER_POINT
    }

    const fn default_repair_cost_per_point() -> f64 {
        constants::REPAIR_COST_PER_POINT
    }

    const fn default_repair_reference_capacity() -> f64 {
        constants::REPAIR_REFERENCE_CAPACITY
    }

    const fn default_repair_reference_step() -> f64 {
        constants::REPAIR_REFERENCE_STEP
    }

    const fn default_repair_minimum_charge() -> u64 {
        constants::REPAIR_MINIMUM_CHARGE
    }
}

impl Default for MaintenanceCfg {
    fn default() -> Self {
        Self {
            clean_cost_per_point: Self::default_clean_cost_per_point(),
            repair_cost_per_point: Self::default_repair_cost_per_point(),
            repair_reference_capacity: Self::default_repair_reference_capacity(),
            repair_reference_step: Self::default_repair_reference_step(),
            repair_minimum_charge: Self::default_repair_minimum_charge(),
        }
    }
}

/// One band of the permanent expansion price ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpansionTier {
    /// Permanent capacity (kg) from which this band applies.
    pub min_capacity: f64,
    /// Price of one expansion step inside this band.
    pub price_per_unit: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionCfg {
    /// Kilograms added by one expansion step.
    #[serde(default = "ExpansionCfg::default_unit_kg")]
    pub unit_kg: f64,
    /// Price growth per previously purchased step.
    #[serde(default = "ExpansionCfg::default_escalation")]
    pub escalation: f64,
    /// Largest number of steps a single purchase may request.
    #[serde(default = "ExpansionCfg::default_max_units_per_purchase")]
    pub max_units_per_purchase: u32,
    #[serde(default = "ExpansionCfg::default_tiers")]
    pub tiers: Vec<ExpansionTier>,
}

impl ExpansionCfg {
    const fn default_unit_kg() -> f64 {
        constants::EXPANSION_UNIT_KG
    }

    const fn default_escalation() -> f64 {
        constants::EXPANSION_ESCALATION
    }

    const fn default_max_units_per_purchase() -> u32 {
        constants::EXPANSION_MAX_UNITS_PER_PURCHASE
    }

    fn default_tiers() -> Vec<ExpansionTier> {
        vec![
            ExpansionTier {
                min_capacity: 0.0,
                price_per_unit: constants::EXPANSION_TIER_BEGINNER_PRICE,
            },
            ExpansionTier {
                min_capacity: constants::EXPANSION_TIER_GROWTH_MIN_KG,
                price_per_unit: constants::EXPANSION_TIER_GROWTH_PRICE,
            },
            ExpansionTier {
                min_capacity: constants::EXPANSION_TIER_MASTER_MIN_KG,
                price_per_unit: constants::EXPANSION_TIER_MASTER_PRICE,
            },
        ]
    }

    /// Price of one step taken from `capacity`.
    #[must_use]
    pub fn tier_price(&self, capacity: f64) -> u64 {
        self.tiers
            .iter()
            .rev()
            .find(|tier| capacity >= tier.min_capacity)
            .or_else(|| self.tiers.first())
            .map_or(0, |tier| tier.price_per_unit)
    }
}

impl Default for ExpansionCfg {
    fn default() -> Self {
        Self {
            unit_kg: Self::default_unit_kg(),
            escalation: Self::default_escalation(),
            max_units_per_purchase: Self::default_max_units_per_purchase(),
            tiers: Self::default_tiers(),
        }
    }
}

/// Floors applied by an emergency repair so the player can resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryCfg {
    #[serde(default = "RecoveryCfg::default_viable_stamina")]
    pub viable_stamina: f64,
    #[serde(default = "RecoveryCfg::default_viable_durability")]
    pub viable_durability: f64,
    #[serde(default = "RecoveryCfg::default_viable_hygiene")]
    pub viable_hygiene: f64,
}

impl RecoveryCfg {
    const fn default_viable_stamina() -> f64 {
        constants::VIABLE_STAMINA
    }

    const fn default_viable_durability() -> f64 {
        constants::VIABLE_DURABILITY
    }

    const fn default_viable_hygiene() -> f64 {
        constants::VIABLE_HYGIENE
    }
}

impl Default for RecoveryCfg {
    fn default() -> Self {
        Self {
            viable_stamina: Self::default_viable_stamina(),
            viable_durability: Self::default_viable_durability(),
            viable_hygiene: Self::default_viable_hygiene(),
        }
    }
}

/// Ad rescue payouts and daily caps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescueCfg {
    #[serde(default = "RescueCfg::default_adrenaline_restore")]
    pub adrenaline_restore: f64,
    /// Temporary bonus as a fraction of the base max weight.
    #[serde(default = "RescueCfg::default_temp_expansion_ratio")]
    pub temp_expansion_ratio: f64,
    #[serde(default = "RescueCfg::default_adrenaline_daily_cap")]
    pub adrenaline_daily_cap: u32,
    #[serde(default = "RescueCfg::default_temp_expansion_daily_cap")]
    pub temp_expansion_daily_cap: u32,
    #[serde(default = "RescueCfg::default_ghost_revival_daily_cap")]
    pub ghost_revival_daily_cap: u32,
}

impl RescueCfg {
    const fn default_adrenaline_restore() -> f64 {
        constants::ADRENALINE_RESTORE
    }

    const fn default_temp_expansion_ratio() -> f64 {
        constants::TEMP_EXPANSION_RATIO
    }

    const fn default_adrenaline_daily_cap() -> u32 {
        constants::ADRENALINE_DAILY_CAP
    }

    const fn default_temp_expansion_daily_cap() -> u32 {
        constants::TEMP_EXPANSION_DAILY_CAP
    }

    const fn default_ghost_revival_daily_cap() -> u32 {
        constants::GHOST_REVIVAL_DAILY_CAP
    }
}

impl Default for RescueCfg {
    fn default() -> Self {
        Self {
            adrenaline_restore: Self::default_adrenaline_restore(),
            temp_expansion_ratio: Self::default_temp_expansion_ratio(),
            adrenaline_daily_cap: Self::default_adrenaline_daily_cap(),
            temp_expansion_daily_cap: Self::default_temp_expansion_daily_cap(),
            ghost_revival_daily_cap: Self::default_ghost_revival_daily_cap(),
        }
    }
}

/// Complete tuning set for one economy session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EconomyConfig {
    #[serde(default)]
    pub limits: ResourceLimits,
    #[serde(default)]
    pub warnings: WarningThresholds,
    #[serde(default)]
    pub unload: UnloadCfg,
    #[serde(default)]
    pub maintenance: MaintenanceCfg,
    #[serde(default)]
    pub expansion: ExpansionCfg,
    #[serde(default)]
    pub recovery: RecoveryCfg,
    #[serde(default)]
    pub rescue: RescueCfg,
}

impl EconomyConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any validation
    /// error from [`EconomyConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the invariants the economy formulas rely on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        positive("limits.max_stamina", limits.max_stamina)?;
        positive("limits.base_max_weight", limits.base_max_weight)?;
        positive("limits.max_durability", limits.max_durability)?;
        positive("limits.max_hygiene", limits.max_hygiene)?;

        within("warnings.stamina_ratio", self.warnings.stamina_ratio, 0.0, 1.0)?;
        within("warnings.hygiene_ratio", self.warnings.hygiene_ratio, 0.0, 1.0)?;

        within("unload.base_cost", self.unload.base_cost, 0.0, f64::MAX)?;
        positive("unload.stamina_per_kg", self.unload.stamina_per_kg)?;
        within(
            "unload.soft_threshold_kg",
            self.unload.soft_threshold_kg,
            0.0,
            f64::MAX,
        )?;
        within(
            "unload.heavy_multiplier",
            self.unload.heavy_multiplier,
            1.0,
            f64::MAX,
        )?;

        within(
            "maintenance.clean_cost_per_point",
            self.maintenance.clean_cost_per_point,
            0.0,
            f64::MAX,
        )?;
        within(
            "maintenance.repair_cost_per_point",
            self.maintenance.repair_cost_per_point,
            0.0,
            f64::MAX,
        )?;
        positive(
            "maintenance.repair_reference_step",
            self.maintenance.repair_reference_step,
        )?;

        positive("expansion.unit_kg", self.expansion.unit_kg)?;
        within(
            "expansion.escalation",
            self.expansion.escalation,
            0.0,
            f64::MAX,
        )?;
        if self.expansion.max_units_per_purchase == 0 {
            return Err(ConfigError::NonPositive {
                field: "expansion.max_units_per_purchase",
                value: 0.0,
            });
        }
        self.validate_tiers()?;

        within(
            "recovery.viable_stamina",
            self.recovery.viable_stamina,
            f64::MIN_POSITIVE,
            limits.max_stamina,
        )?;
        within(
            "recovery.viable_durability",
            self.recovery.viable_durability,
            f64::MIN_POSITIVE,
            limits.max_durability,
        )?;
        within(
            "recovery.viable_hygiene",
            self.recovery.viable_hygiene,
            f64::MIN_POSITIVE,
            limits.max_hygiene,
        )?;

        positive("rescue.adrenaline_restore", self.rescue.adrenaline_restore)?;
        positive("rescue.temp_expansion_ratio", self.rescue.temp_expansion_ratio)?;
        Ok(())
    }

    fn validate_tiers(&self) -> Result<(), ConfigError> {
        if self.expansion.tiers.is_empty() {
            return Err(ConfigError::TierOrder { index: 0 });
        }
        for (index, pair) in self.expansion.tiers.windows(2).enumerate() {
            let (prev, next) = (pair[0], pair[1]);
            if next.min_capacity <= prev.min_capacity || next.price_per_unit < prev.price_per_unit
            {
                return Err(ConfigError::TierOrder { index: index + 1 });
            }
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn within(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}
