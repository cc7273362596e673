//! Centralized balance and tuning constants for the Solefood economy.
//!
//! These values seed `EconomyConfig::default()`. Overrides arrive through a
//! JSON config, but every field falls back to the numbers below.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_STATE_ACTIVE: &str = "log.state.active";
pub(crate) const LOG_STATE_IMPAIRED: &str = "log.state.impaired";
pub(crate) const LOG_COLLAPSE_GHOST: &str = "log.collapse.ghost";
pub(crate) const LOG_COLLAPSE_DURABILITY: &str = "log.collapse.durability";
pub(crate) const LOG_COLLAPSE_HYGIENE: &str = "log.collapse.hygiene";
pub(crate) const LOG_RECOVERED: &str = "log.recovery.cleared";
pub(crate) const LOG_EMERGENCY_REPAIR: &str = "log.recovery.emergency-repair";
pub(crate) const LOG_UNLOADED: &str = "log.cargo.unloaded";
pub(crate) const LOG_EXPANSION_PURCHASED: &str = "log.capacity.expanded";
pub(crate) const LOG_TEMP_EXPANSION_GRANTED: &str = "log.capacity.temp-granted";
pub(crate) const LOG_TEMP_EXPANSION_REVOKED: &str = "log.capacity.temp-revoked";
pub(crate) const LOG_RESCUE_PREFIX: &str = "log.rescue.";
pub(crate) const LOG_PLAYER_RESET: &str = "log.player.reset";

// Session maxima -----------------------------------------------------------
pub(crate) const MAX_STAMINA: f64 = 100.0;
pub(crate) const BASE_MAX_WEIGHT: f64 = 10.0;
pub(crate) const MAX_DURABILITY: f64 = 100.0;
pub(crate) const MAX_HYGIENE: f64 = 100.0;

// Warning thresholds (fraction of max) -------------------------------------
pub(crate) const STAMINA_WARNING_RATIO: f64 = 0.2;
pub(crate) const HYGIENE_WARNING_RATIO: f64 = 0.3;

// Unloading ----------------------------------------------------------------
pub(crate) const UNLOAD_BASE_COST: f64 = 1.0;
pub(crate) const UNLOAD_STAMINA_PER_KG: f64 = 2.0;
pub(crate) const UNLOAD_SOFT_THRESHOLD_KG: f64 = 5.0;
pub(crate) const UNLOAD_HEAVY_MULTIPLIER: f64 = 1.5;

// Maintenance --------------------------------------------------------------
pub(crate) const CLEAN_COST_PER_POINT: f64 = 2.0;
pub(crate) const REPAIR_COST_PER_POINT: f64 = 5.0;
pub(crate) const REPAIR_REFERENCE_CAPACITY: f64 = 10.0;
pub(crate) const REPAIR_REFERENCE_STEP: f64 = 10.0;
pub(crate) const REPAIR_MINIMUM_CHARGE: u64 = 10;

// Expansion ----------------------------------------------------------------
pub(crate) const EXPANSION_UNIT_KG: f64 = 2.0;
pub(crate) const EXPANSION_ESCALATION: f64 = 0.1;
pub(crate) const EXPANSION_MAX_UNITS_PER_PURCHASE: u32 = 50;
pub(crate) const EXPANSION_TIER_BEGINNER_PRICE: u64 = 100;
pub(crate) const EXPANSION_TIER_GROWTH_MIN_KG: f64 = 20.0;
pub(crate) const EXPANSION_TIER_GROWTH_PRICE: u64 = 500;
pub(crate) const EXPANSION_TIER_MASTER_MIN_KG: f64 = 30.0;
pub(crate) const EXPANSION_TIER_MASTER_PRICE: u64 = 1_000;

// Recovery -----------------------------------------------------------------
pub(crate) const VIABLE_STAMINA: f64 = 30.0;
pub(crate) const VIABLE_DURABILITY: f64 = 30.0;
pub(crate) const VIABLE_HYGIENE: f64 = 30.0;

// Rescue ads ---------------------------------------------------------------
pub(crate) const ADRENALINE_RESTORE: f64 = 30.0;
pub(crate) const TEMP_EXPANSION_RATIO: f64 = 0.5;
pub(crate) const ADRENALINE_DAILY_CAP: u32 = 5;
pub(crate) const TEMP_EXPANSION_DAILY_CAP: u32 = 3;
pub(crate) const GHOST_REVIVAL_DAILY_CAP: u32 = 1;

// Wear tiers ---------------------------------------------------------------
pub(crate) const WEAR_PERFECT_PCT: f64 = 90.0;
pub(crate) const WEAR_MIN_MULTIPLIER: f64 = 0.1;
