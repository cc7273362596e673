//! Player resource ledger.
//!
//! The ledger is the only writer of [`PlayerState`]. Every stamina, durability
//! and hygiene mutation is followed by a synchronous collapse reevaluation;
//! flags are written by the state machine alone.
use serde::{Deserialize, Serialize};

use crate::collapse::{CollapseStateMachine, Transition, VitalState};
use crate::config::{EconomyConfig, ResourceLimits};
use crate::constants::{
    LOG_EMERGENCY_REPAIR, LOG_EXPANSION_PURCHASED, LOG_PLAYER_RESET, LOG_RECOVERED,
    LOG_TEMP_EXPANSION_GRANTED, LOG_TEMP_EXPANSION_REVOKED, LOG_UNLOADED,
};
use crate::economy::{CapacityEconomy, WearTier};
use crate::error::EconomyError;
use crate::numbers::{count_to_f64, non_negative};

/// Resource values and status flags surfaced to the HUD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub stamina: f64,
    pub max_stamina: f64,
    pub current_weight: f64,
    /// Base plus permanent expansions plus any active temporary bonus.
    pub max_weight: f64,
    pub base_max_weight: f64,
    pub durability: f64,
    pub max_durability: f64,
    pub hygiene: f64,
    pub max_hygiene: f64,
    pub is_ghost: bool,
    pub is_immobilized: bool,
}

impl PlayerState {
    /// Session-initial values: every resource full, pack empty, no flags.
    #[must_use]
    pub const fn initial(limits: &ResourceLimits) -> Self {
        Self {
            stamina: limits.max_stamina,
            max_stamina: limits.max_stamina,
            current_weight: 0.0,
            max_weight: limits.base_max_weight,
            base_max_weight: limits.base_max_weight,
            durability: limits.max_durability,
            max_durability: limits.max_durability,
            hygiene: limits.max_hygiene,
            max_hygiene: limits.max_hygiene,
            is_ghost: false,
            is_immobilized: false,
        }
    }

    fn clamp_all(&mut self) {
        self.stamina = clamp_resource(self.stamina, self.max_stamina);
        self.durability = clamp_resource(self.durability, self.max_durability);
        self.hygiene = clamp_resource(self.hygiene, self.max_hygiene);
        self.current_weight = clamp_resource(self.current_weight, self.max_weight);
    }
}

/// Clamp into `[0, max]`. NaN values and non-positive or NaN maxima yield 0.
fn clamp_resource(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max.max(0.0))
}

/// Finite, non-negative value or zero.
fn sanitized(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Result of a committed unload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnloadReceipt {
    pub weight_delivered: f64,
    pub stamina_spent: f64,
    pub transition: Option<Transition>,
}

/// Result of a permanent expansion attempt.
///
/// `success == false` means the funds offered did not cover `cost`; nothing
/// was committed and the caller has to source the difference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpansionOutcome {
    pub success: bool,
    pub cost: u64,
    pub new_capacity: f64,
}

/// Persistable ledger contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub player: PlayerState,
    pub vital_state: VitalState,
    #[serde(default)]
    pub expansions: u32,
    #[serde(default)]
    pub expansion_weight: f64,
    #[serde(default)]
    pub temp_bonus: f64,
}

#[derive(Debug, Clone)]
pub struct ResourceLedger {
    config: EconomyConfig,
    player: PlayerState,
    machine: CollapseStateMachine,
    expansions: u32,
    expansion_weight: f64,
    temp_bonus: f64,
    logs: Vec<String>,
}

impl ResourceLedger {
    /// Start a session with full resources.
    #[must_use]
    pub fn new(config: EconomyConfig) -> Self {
        let player = PlayerState::initial(&config.limits);
        let machine = CollapseStateMachine::new(config.warnings.clone());
        Self {
            config,
            player,
            machine,
            expansions: 0,
            expansion_weight: 0.0,
            temp_bonus: 0.0,
            logs: Vec::new(),
        }
    }

    /// Rebuild a ledger from a snapshot.
    ///
    /// Maxima come from `config.limits` and the expansion count, never from
    /// the snapshot; only current values are carried over and re-clamped.
    #[must_use]
    pub fn from_snapshot(config: EconomyConfig, snapshot: LedgerSnapshot) -> Self {
        let mut ledger = Self::new(config);
        let saved = snapshot.player;
        ledger.expansions = snapshot.expansions;
        ledger.expansion_weight =
            count_to_f64(snapshot.expansions) * ledger.config.expansion.unit_kg;
        ledger.temp_bonus = sanitized(snapshot.temp_bonus);
        if saved.max_stamina != ledger.player.max_stamina
            || saved.base_max_weight != ledger.player.base_max_weight
            || saved.max_durability != ledger.player.max_durability
            || saved.max_hygiene != ledger.player.max_hygiene
        {
            log::warn!("snapshot maxima differ from config limits; using config limits");
        }
        let mut player = PlayerState {
            stamina: saved.stamina,
            current_weight: saved.current_weight,
            durability: saved.durability,
            hygiene: saved.hygiene,
            ..PlayerState::initial(&ledger.config.limits)
        };
        player.max_weight =
            player.base_max_weight + ledger.expansion_weight + ledger.temp_bonus;
        player.clamp_all();
        ledger.player = player;
        ledger
            .machine
            .restore(snapshot.vital_state, &mut ledger.player);
        ledger.reevaluate();
        ledger
    }

    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            player: self.player.clone(),
            vital_state: self.machine.state(),
            expansions: self.expansions,
            expansion_weight: self.expansion_weight,
            temp_bonus: self.temp_bonus,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &EconomyConfig {
        &self.config
    }

    #[must_use]
    pub const fn player(&self) -> &PlayerState {
        &self.player
    }

    #[must_use]
    pub const fn vital_state(&self) -> VitalState {
        self.machine.state()
    }

    #[must_use]
    pub const fn expansions(&self) -> u32 {
        self.expansions
    }

    #[must_use]
    pub const fn temp_bonus(&self) -> f64 {
        self.temp_bonus
    }

    /// Base max weight plus purchased expansions, excluding temporary bonuses.
    #[must_use]
    pub fn permanent_capacity(&self) -> f64 {
        self.player.base_max_weight + self.expansion_weight
    }

    /// Ordered event keys recorded since the last reset or drain.
    #[must_use]
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn drain_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.logs)
    }

    /// Pricing view over the current state.
    #[must_use]
    pub fn economy(&self) -> CapacityEconomy<'_> {
        CapacityEconomy::new(
            &self.config,
            &self.player,
            self.machine.state(),
            self.expansions,
            self.permanent_capacity(),
        )
    }

    #[must_use]
    pub fn wear_tier(&self) -> WearTier {
        self.economy().wear_tier()
    }

    #[must_use]
    pub fn effective_capacity(&self) -> f64 {
        self.economy().effective_capacity()
    }

    // Resource mutators ------------------------------------------------------

    /// Spend stamina, clamping at zero.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidAmount`] for negative or non-finite input.
    pub fn consume_stamina(&mut self, amount: f64) -> Result<Option<Transition>, EconomyError> {
        self.mutate("stamina", amount, |player, amount| {
            player.stamina = clamp_resource(player.stamina - amount, player.max_stamina);
        })
    }

    /// Regain stamina, clamping at max. Does not clear Ghost.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidAmount`] for negative or non-finite input.
    pub fn restore_stamina(&mut self, amount: f64) -> Result<Option<Transition>, EconomyError> {
        self.mutate("stamina", amount, |player, amount| {
            player.stamina = clamp_resource(player.stamina + amount, player.max_stamina);
        })
    }

    /// Set the carried weight, clamped to `max_weight`. Returns the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidAmount`] for negative or non-finite input.
    pub fn update_weight(&mut self, new_weight: f64) -> Result<f64, EconomyError> {
        let new_weight = self.validated("weight", new_weight)?;
        self.player.current_weight = clamp_resource(new_weight, self.player.max_weight);
        log::debug!(
            "weight set to {:.2}/{:.2}",
            self.player.current_weight,
            self.player.max_weight
        );
        Ok(self.player.current_weight)
    }

    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidAmount`] for negative or non-finite input.
    pub fn decay_durability(&mut self, amount: f64) -> Result<Option<Transition>, EconomyError> {
        self.mutate("durability", amount, |player, amount| {
            player.durability =
                clamp_resource(player.durability - amount, player.max_durability);
        })
    }

    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidAmount`] for negative or non-finite input.
    pub fn restore_durability(
        &mut self,
        amount: f64,
    ) -> Result<Option<Transition>, EconomyError> {
        self.mutate("durability", amount, |player, amount| {
            player.durability =
                clamp_resource(player.durability + amount, player.max_durability);
        })
    }

    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidAmount`] for negative or non-finite input.
    pub fn decay_hygiene(&mut self, amount: f64) -> Result<Option<Transition>, EconomyError> {
        self.mutate("hygiene", amount, |player, amount| {
            player.hygiene = clamp_resource(player.hygiene - amount, player.max_hygiene);
        })
    }

    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidAmount`] for negative or non-finite input.
    pub fn restore_hygiene(&mut self, amount: f64) -> Result<Option<Transition>, EconomyError> {
        self.mutate("hygiene", amount, |player, amount| {
            player.hygiene = clamp_resource(player.hygiene + amount, player.max_hygiene);
        })
    }

    /// Return to session-initial values and clear expansions, bonuses and logs.
    pub fn reset_player(&mut self) {
        self.player = PlayerState::initial(&self.config.limits);
        self.machine.reset(&mut self.player);
        self.expansions = 0;
        self.expansion_weight = 0.0;
        self.temp_bonus = 0.0;
        self.logs.clear();
        self.logs.push(String::from(LOG_PLAYER_RESET));
        log::info!("player reset to session-initial state");
    }

    // Committed actions ------------------------------------------------------

    /// Carry cargo to a drop point, paying the unload stamina cost.
    ///
    /// Requests above the carried weight deliver what is carried.
    ///
    /// # Errors
    ///
    /// [`EconomyError::AlreadyCollapsed`] while Collapsed/Ghost,
    /// [`EconomyError::InvalidAmount`] for bad weight, and
    /// [`EconomyError::InsufficientResource`] when stamina does not cover the cost.
    pub fn unload(&mut self, weight: f64) -> Result<UnloadReceipt, EconomyError> {
        self.ensure_not_collapsed()?;
        let weight = self.validated("weight", weight)?;
        let weight = self.economy().deliverable_weight(weight)?;
        let cost = self.economy().calculate_unload_cost(weight)?;
        if cost > self.player.stamina {
            log::warn!(
                "unload of {weight:.2}kg needs {cost:.2} stamina, have {:.2}",
                self.player.stamina
            );
            return Err(EconomyError::InsufficientResource {
                required: cost,
                available: self.player.stamina,
            });
        }
        self.player.stamina = clamp_resource(self.player.stamina - cost, self.player.max_stamina);
        self.player.current_weight =
            clamp_resource(self.player.current_weight - weight, self.player.max_weight);
        self.logs.push(String::from(LOG_UNLOADED));
        log::info!("unloaded {weight:.2}kg for {cost:.2} stamina");
        let transition = self.reevaluate();
        Ok(UnloadReceipt {
            weight_delivered: weight,
            stamina_spent: cost,
            transition,
        })
    }

    /// Buy `units` permanent expansion steps if `available_funds` covers the price.
    ///
    /// Never debits currency: on success the caller deducts `cost` itself.
    ///
    /// # Errors
    ///
    /// [`EconomyError::AlreadyCollapsed`] while Collapsed/Ghost and
    /// [`EconomyError::InvalidAmount`] for an empty or oversized order.
    pub fn expand_capacity(
        &mut self,
        units: u32,
        available_funds: u64,
    ) -> Result<ExpansionOutcome, EconomyError> {
        self.ensure_not_collapsed()?;
        let quote = self.economy().quote_expansion(units)?;
        if available_funds < quote.cost {
            log::debug!(
                "expansion of {units} unit(s) costs {}, only {available_funds} offered",
                quote.cost
            );
            return Ok(ExpansionOutcome {
                success: false,
                cost: quote.cost,
                new_capacity: quote.new_capacity,
            });
        }
        self.expansions = self.expansions.saturating_add(units);
        self.expansion_weight += count_to_f64(units) * self.config.expansion.unit_kg;
        self.sync_max_weight();
        self.logs.push(String::from(LOG_EXPANSION_PURCHASED));
        log::info!(
            "capacity expanded by {units} unit(s) for {} -> {:.2}kg",
            quote.cost,
            self.player.max_weight
        );
        Ok(ExpansionOutcome {
            success: true,
            cost: quote.cost,
            new_capacity: self.player.max_weight,
        })
    }

    /// Fold a temporary capacity bonus into `max_weight`, replacing any
    /// previous one. Returns the new `max_weight`.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidAmount`] for negative or non-finite input.
    pub fn grant_temp_expansion(&mut self, bonus: f64) -> Result<f64, EconomyError> {
        let bonus = self.validated("temp_bonus", bonus)?;
        self.temp_bonus = bonus;
        self.sync_max_weight();
        self.logs.push(String::from(LOG_TEMP_EXPANSION_GRANTED));
        log::info!(
            "temporary capacity bonus {bonus:.2}kg -> {:.2}kg",
            self.player.max_weight
        );
        Ok(self.player.max_weight)
    }

    /// Drop the temporary bonus, re-clamping carried weight. Returns the
    /// bonus that was removed.
    pub fn revoke_temp_expansion(&mut self) -> f64 {
        let revoked = std::mem::take(&mut self.temp_bonus);
        if revoked > 0.0 {
            self.sync_max_weight();
            self.logs.push(String::from(LOG_TEMP_EXPANSION_REVOKED));
            log::info!("temporary capacity bonus {revoked:.2}kg revoked");
        }
        revoked
    }

    /// Atomic recovery from Collapsed/Ghost.
    ///
    /// Lifts every zero-tolerance resource to at least its viable floor and
    /// clears the flags. The caller must already have verified and debited
    /// `cost`. Returns false and changes nothing when the player is not
    /// collapsed or `cost` is negative or non-finite.
    pub fn emergency_repair(&mut self, cost: f64) -> bool {
        if !self.machine.state().is_collapsed() {
            log::debug!("emergency repair skipped: player is {}", self.machine.state());
            return false;
        }
        if !cost.is_finite() || cost < 0.0 {
            log::warn!("emergency repair rejected: invalid cost {cost}");
            return false;
        }
        let floors = &self.config.recovery;
        let mut candidate = self.player.clone();
        candidate.stamina = candidate
            .stamina
            .max(floors.viable_stamina.min(candidate.max_stamina));
        candidate.durability = candidate
            .durability
            .max(floors.viable_durability.min(candidate.max_durability));
        candidate.hygiene = candidate
            .hygiene
            .max(floors.viable_hygiene.min(candidate.max_hygiene));
        if !self.machine.can_recover(&candidate) {
            return false;
        }
        self.player = candidate;
        if let Some(transition) = self.machine.recover(&mut self.player) {
            self.logs.push(String::from(transition.to.log_key()));
        }
        self.logs.push(String::from(LOG_EMERGENCY_REPAIR));
        log::info!("emergency repair applied (cost {cost:.2})");
        true
    }

    /// Leave Collapsed/Ghost without touching resources, if every
    /// zero-tolerance resource is already above zero.
    pub(crate) fn clear_collapse(&mut self) -> Option<Transition> {
        if !self.machine.state().is_collapsed() {
            return None;
        }
        let transition = self.machine.recover(&mut self.player)?;
        self.logs.push(String::from(LOG_RECOVERED));
        self.logs.push(String::from(transition.to.log_key()));
        Some(transition)
    }

    pub(crate) fn push_log(&mut self, key: String) {
        self.logs.push(key);
    }

    // Internals --------------------------------------------------------------

    fn mutate(
        &mut self,
        field: &'static str,
        amount: f64,
        apply: impl FnOnce(&mut PlayerState, f64),
    ) -> Result<Option<Transition>, EconomyError> {
        let amount = self.validated(field, amount)?;
        apply(&mut self.player, amount);
        log::debug!(
            "{field} adjusted by {amount:.2}: stamina {:.2} durability {:.2} hygiene {:.2}",
            self.player.stamina,
            self.player.durability,
            self.player.hygiene
        );
        Ok(self.reevaluate())
    }

    fn validated(&self, field: &'static str, amount: f64) -> Result<f64, EconomyError> {
        non_negative(field, amount).inspect_err(|err| log::warn!("rejected input: {err}"))
    }

    fn ensure_not_collapsed(&self) -> Result<(), EconomyError> {
        let state = self.machine.state();
        if state.is_collapsed() {
            return Err(EconomyError::AlreadyCollapsed { state });
        }
        Ok(())
    }

    fn reevaluate(&mut self) -> Option<Transition> {
        let transition = self.machine.reevaluate(&mut self.player);
        if let Some(transition) = transition {
            self.logs.push(String::from(transition.to.log_key()));
        }
        transition
    }

    fn sync_max_weight(&mut self) {
        self.player.max_weight =
            self.player.base_max_weight + self.expansion_weight + self.temp_bonus;
        self.player.current_weight =
            clamp_resource(self.player.current_weight, self.player.max_weight);
    }
}
