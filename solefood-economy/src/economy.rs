//! Pure cost functions over ledger state.
//!
//! Nothing here mutates. The UI previews prices with [`CapacityEconomy`],
//! then commits through the matching ledger operation.
use serde::{Deserialize, Serialize};

use crate::collapse::VitalState;
use crate::config::{EconomyConfig, UnloadCfg};
use crate::constants::{WEAR_MIN_MULTIPLIER, WEAR_PERFECT_PCT};
use crate::error::EconomyError;
use crate::ledger::PlayerState;
use crate::numbers::{ceil_f64_to_coins, coins_to_f64, count_to_f64, non_negative};

/// Price and resulting capacity of a prospective permanent expansion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpansionQuote {
    pub units: u32,
    pub cost: u64,
    /// `max_weight` after the purchase, including any active temporary bonus.
    pub new_capacity: f64,
}

/// Durability decile used to scale usable carry capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WearTier {
    Perfect,
    Good,
    Fair,
    Worn,
    NeedsRepair,
    SeverelyWorn,
    Critical,
    NearRuined,
    RuinedEdge,
    Ruined,
}

impl WearTier {
    /// Bucket a durability value by its percentage of max.
    #[must_use]
    pub fn from_durability(durability: f64, max_durability: f64) -> Self {
        let pct = if max_durability > 0.0 {
            (durability / max_durability * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        match pct {
            p if p >= WEAR_PERFECT_PCT => Self::Perfect,
            p if p >= 80.0 => Self::Good,
            p if p >= 70.0 => Self::Fair,
            p if p >= 60.0 => Self::Worn,
            p if p >= 50.0 => Self::NeedsRepair,
            p if p >= 40.0 => Self::SeverelyWorn,
            p if p >= 30.0 => Self::Critical,
            p if p >= 20.0 => Self::NearRuined,
            p if p >= 10.0 => Self::RuinedEdge,
            _ => Self::Ruined,
        }
    }

    /// Fraction of `max_weight` usable at this wear level.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Perfect => 1.0,
            Self::Good => 0.9,
            Self::Fair => 0.8,
            Self::Worn => 0.7,
            Self::NeedsRepair => 0.6,
            Self::SeverelyWorn => 0.5,
            Self::Critical => 0.4,
            Self::NearRuined => 0.3,
            Self::RuinedEdge => 0.2,
            Self::Ruined => WEAR_MIN_MULTIPLIER,
        }
    }

    /// Translation key for the HUD label.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Perfect => "wear.perfect",
            Self::Good => "wear.good",
            Self::Fair => "wear.fair",
            Self::Worn => "wear.worn",
            Self::NeedsRepair => "wear.needs-repair",
            Self::SeverelyWorn => "wear.severely-worn",
            Self::Critical => "wear.critical",
            Self::NearRuined => "wear.near-ruined",
            Self::RuinedEdge => "wear.ruined-edge",
            Self::Ruined => "wear.ruined",
        }
    }
}

/// Stamina needed to carry `weight` kilograms to a drop point.
///
/// Zero for an empty load; otherwise a flat base plus a per-kilogram rate
/// that steps up by `heavy_multiplier` past the soft threshold.
#[must_use]
pub fn unload_cost(cfg: &UnloadCfg, weight: f64) -> f64 {
    if weight <= 0.0 {
        return 0.0;
    }
    let light = weight.min(cfg.soft_threshold_kg);
    let heavy = (weight - cfg.soft_threshold_kg).max(0.0);
    cfg.base_cost
        + light * cfg.stamina_per_kg
        + heavy * cfg.stamina_per_kg * cfg.heavy_multiplier
}

/// Read-only pricing view over one ledger.
#[derive(Debug, Clone, Copy)]
pub struct CapacityEconomy<'a> {
    config: &'a EconomyConfig,
    player: &'a PlayerState,
    state: VitalState,
    expansions: u32,
    permanent_capacity: f64,
}

impl<'a> CapacityEconomy<'a> {
    #[must_use]
    pub const fn new(
        config: &'a EconomyConfig,
        player: &'a PlayerState,
        state: VitalState,
        expansions: u32,
        permanent_capacity: f64,
    ) -> Self {
        Self {
            config,
            player,
            state,
            expansions,
            permanent_capacity,
        }
    }

    /// Stamina cost to manually unload `weight`.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidAmount`] for negative or non-finite weight.
    pub fn calculate_unload_cost(&self, weight: f64) -> Result<f64, EconomyError> {
        let weight = non_negative("weight", weight)?;
        Ok(unload_cost(&self.config.unload, weight))
    }

    /// Part of a requested unload that is actually carried.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidAmount`] for negative or non-finite weight.
    pub fn deliverable_weight(&self, weight: f64) -> Result<f64, EconomyError> {
        let weight = non_negative("weight", weight)?;
        Ok(weight.min(self.player.current_weight))
    }

    /// True when unloading `weight` would be accepted: the player is not
    /// collapsed and stamina covers the cost of the deliverable part.
    #[must_use]
    pub fn can_unload(&self, weight: f64) -> bool {
        if self.state.is_collapsed() {
            return false;
        }
        self.deliverable_weight(weight)
            .and_then(|weight| self.calculate_unload_cost(weight))
            .is_ok_and(|cost| cost <= self.player.stamina)
    }

    /// Coins to restore hygiene to max.
    #[must_use]
    pub fn calculate_clean_cost(&self) -> u64 {
        let deficit = (self.player.max_hygiene - self.player.hygiene).max(0.0);
        ceil_f64_to_coins(deficit * self.config.maintenance.clean_cost_per_point)
    }

    /// Coins to repair `points` of durability, scaled by the heavy-duty tax.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidAmount`] for negative or non-finite points.
    pub fn calculate_repair_cost(&self, points: f64) -> Result<u64, EconomyError> {
        let points = non_negative("points", points)?;
        if points <= 0.0 {
            return Ok(0);
        }
        let cfg = &self.config.maintenance;
        let heavy_duty = (1.0
            + (self.permanent_capacity - cfg.repair_reference_capacity)
                / cfg.repair_reference_step)
            .max(1.0);
        let raw = ceil_f64_to_coins(points * cfg.repair_cost_per_point * heavy_duty);
        Ok(raw.max(cfg.repair_minimum_charge))
    }

    /// Price `units` permanent expansion steps from the current capacity.
    ///
    /// Each step pays the band price for the capacity it starts from, scaled
    /// by `1 + escalation * steps_already_owned`.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidAmount`] when `units` is zero or above
    /// the per-purchase limit.
    pub fn quote_expansion(&self, units: u32) -> Result<ExpansionQuote, EconomyError> {
        let cfg = &self.config.expansion;
        if units == 0 || units > cfg.max_units_per_purchase {
            return Err(EconomyError::InvalidAmount {
                field: "units",
                value: count_to_f64(units),
            });
        }
        let mut capacity = self.permanent_capacity;
        let mut cost = 0u64;
        for step in 0..units {
            let owned = count_to_f64(self.expansions.saturating_add(step));
            let factor = 1.0 + cfg.escalation * owned;
            let price = ceil_f64_to_coins(coins_to_f64(cfg.tier_price(capacity)) * factor);
            cost = cost.saturating_add(price);
            capacity += cfg.unit_kg;
        }
        Ok(ExpansionQuote {
            units,
            cost,
            new_capacity: self.player.max_weight + count_to_f64(units) * cfg.unit_kg,
        })
    }

    /// Cargo payout after the hygiene penalty.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidAmount`] for negative or non-finite value.
    pub fn calculate_payout(&self, cargo_value: f64) -> Result<f64, EconomyError> {
        let cargo_value = non_negative("cargo_value", cargo_value)?;
        let ratio = (self.player.hygiene / self.player.max_hygiene).clamp(0.0, 1.0);
        Ok(cargo_value * ratio)
    }

    #[must_use]
    pub fn wear_tier(&self) -> WearTier {
        WearTier::from_durability(self.player.durability, self.player.max_durability)
    }

    /// Usable carry capacity after wear. Zero once durability hits zero.
    #[must_use]
    pub fn effective_capacity(&self) -> f64 {
        if self.player.durability <= 0.0 {
            return 0.0;
        }
        self.player.max_weight * self.wear_tier().multiplier()
    }

    #[must_use]
    pub fn is_overloaded(&self) -> bool {
        self.player.current_weight > self.effective_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceLimits;

    fn player(limits: &ResourceLimits) -> PlayerState {
        PlayerState::initial(limits)
    }

    fn economy<'a>(cfg: &'a EconomyConfig, player: &'a PlayerState) -> CapacityEconomy<'a> {
        CapacityEconomy::new(cfg, player, VitalState::Active, 0, player.base_max_weight)
    }

    #[test]
    fn unload_cost_steps_up_past_soft_threshold() {
        let cfg = UnloadCfg::default();
        assert!(unload_cost(&cfg, 0.0).abs() < f64::EPSILON);
        // 1 + 2 * 2
        assert!((unload_cost(&cfg, 2.0) - 5.0).abs() < 1e-9);
        // 1 + 5 * 2
        assert!((unload_cost(&cfg, 5.0) - 11.0).abs() < 1e-9);
        // 1 + 5 * 2 + 2 * 3
        assert!((unload_cost(&cfg, 7.0) - 17.0).abs() < 1e-9);
    }

    #[test]
    fn can_unload_checks_stamina_and_state() {
        let cfg = EconomyConfig::default();
        let mut state = player(&cfg.limits);
        state.stamina = 11.0;
        state.current_weight = 10.0;
        let econ = economy(&cfg, &state);
        assert!(econ.can_unload(5.0));
        assert!(!econ.can_unload(5.5));
        assert!(!econ.can_unload(-1.0));

        let ghost = CapacityEconomy::new(&cfg, &state, VitalState::Ghost, 0, 10.0);
        assert!(!ghost.can_unload(0.0));
    }

    #[test]
    fn can_unload_prices_only_the_carried_weight() {
        let cfg = EconomyConfig::default();
        let mut state = player(&cfg.limits);
        state.current_weight = 1.0;
        state.stamina = 5.0;
        let econ = economy(&cfg, &state);
        assert_eq!(econ.deliverable_weight(8.0), Ok(1.0));
        assert!(econ.can_unload(8.0));

        state.stamina = 2.5;
        assert!(!economy(&cfg, &state).can_unload(8.0));
    }

    #[test]
    fn clean_cost_tracks_deficit() {
        let cfg = EconomyConfig::default();
        let mut state = player(&cfg.limits);
        assert_eq!(economy(&cfg, &state).calculate_clean_cost(), 0);
        state.hygiene = 62.5;
        assert_eq!(economy(&cfg, &state).calculate_clean_cost(), 75);
    }

    #[test]
    fn repair_cost_applies_minimum_and_heavy_duty_tax() {
        let cfg = EconomyConfig::default();
        let state = player(&cfg.limits);
        let econ = economy(&cfg, &state);
        assert_eq!(econ.calculate_repair_cost(0.0), Ok(0));
        assert_eq!(econ.calculate_repair_cost(1.0), Ok(10));
        assert_eq!(econ.calculate_repair_cost(4.0), Ok(20));

        let heavy = CapacityEconomy::new(&cfg, &state, VitalState::Active, 5, 20.0);
        assert_eq!(heavy.calculate_repair_cost(4.0), Ok(40));
        assert!(heavy.calculate_repair_cost(-3.0).is_err());
    }

    #[test]
    fn expansion_quote_crosses_bands_and_escalates() {
        let cfg = EconomyConfig::default();
        let state = player(&cfg.limits);
        let econ = economy(&cfg, &state);
        let quote = econ.quote_expansion(1).expect("quote");
        assert_eq!(quote.cost, 100);
        assert!((quote.new_capacity - 12.0).abs() < 1e-9);

        // 10 -> 20 kg is five beginner steps: 100, 110, 120, 130, 140.
        let quote = econ.quote_expansion(5).expect("quote");
        assert_eq!(quote.cost, 600);

        // The sixth step starts at 20 kg and pays the growth band: 500 * 1.5.
        let quote = econ.quote_expansion(6).expect("quote");
        assert_eq!(quote.cost, 600 + 750);
    }

    #[test]
    fn expansion_quote_rejects_empty_and_oversized_orders() {
        let cfg = EconomyConfig::default();
        let state = player(&cfg.limits);
        let econ = economy(&cfg, &state);
        assert!(econ.quote_expansion(0).is_err());
        assert!(econ.quote_expansion(cfg.expansion.max_units_per_purchase + 1).is_err());
    }

    #[test]
    fn payout_scales_with_hygiene() {
        let cfg = EconomyConfig::default();
        let mut state = player(&cfg.limits);
        state.hygiene = 40.0;
        let payout = economy(&cfg, &state).calculate_payout(500.0).expect("payout");
        assert!((payout - 200.0).abs() < 1e-9);
    }

    #[test]
    fn wear_tiers_follow_deciles() {
        assert_eq!(WearTier::from_durability(100.0, 100.0), WearTier::Perfect);
        assert_eq!(WearTier::from_durability(90.0, 100.0), WearTier::Perfect);
        assert_eq!(WearTier::from_durability(89.9, 100.0), WearTier::Good);
        assert_eq!(WearTier::from_durability(55.0, 100.0), WearTier::NeedsRepair);
        assert_eq!(WearTier::from_durability(5.0, 100.0), WearTier::Ruined);
        assert!((WearTier::Worn.multiplier() - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn effective_capacity_hits_zero_with_durability() {
        let cfg = EconomyConfig::default();
        let mut state = player(&cfg.limits);
        state.durability = 75.0;
        state.current_weight = 9.0;
        let econ = economy(&cfg, &state);
        assert!((econ.effective_capacity() - 8.0).abs() < 1e-9);
        assert!(econ.is_overloaded());

        state.durability = 0.0;
        assert!(economy(&cfg, &state).effective_capacity().abs() < f64::EPSILON);
    }
}
