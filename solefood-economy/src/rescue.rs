//! Ad-gated rescues.
//!
//! The gateway never talks to an ad network. Callers request a ticket, show
//! whatever they show, then report the outcome against the ticket token.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::collapse::Transition;
use crate::config::RescueCfg;
use crate::constants::LOG_RESCUE_PREFIX;
use crate::error::EconomyError;
use crate::ledger::ResourceLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RescueKind {
    /// Free stamina top-up.
    Adrenaline,
    /// Temporary carry bonus on top of base capacity.
    TempExpansion,
    /// Lift a collapsed player back to viable resources.
    GhostRevival,
}

impl RescueKind {
    pub const ALL: [Self; 3] = [Self::Adrenaline, Self::TempExpansion, Self::GhostRevival];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Adrenaline => "adrenaline",
            Self::TempExpansion => "temp-expansion",
            Self::GhostRevival => "ghost-revival",
        }
    }

    fn log_key(self) -> String {
        format!("{LOG_RESCUE_PREFIX}{}", self.as_str())
    }
}

impl fmt::Display for RescueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the ad layer reported for a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdOutcome {
    Watched,
    Cancelled,
}

/// Handle for one pending rescue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescueTicket {
    pub token: u64,
    pub kind: RescueKind,
}

/// Effect of a committed rescue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RescueEffect {
    StaminaRestored {
        amount: f64,
        transition: Option<Transition>,
    },
    CapacityBonus {
        bonus: f64,
        max_weight: f64,
    },
    Revived,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RescueResolution {
    /// The ad was cancelled. Nothing changed and the cap is untouched.
    Declined,
    Applied(RescueEffect),
    /// The ledger moved on since the ticket was issued and the rescue no
    /// longer applies.
    Stale,
}

/// Committed rescues per kind since the last daily reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescueUsage {
    #[serde(default)]
    pub adrenaline: u32,
    #[serde(default)]
    pub temp_expansion: u32,
    #[serde(default)]
    pub ghost_revival: u32,
}

impl RescueUsage {
    #[must_use]
    pub const fn get(&self, kind: RescueKind) -> u32 {
        match kind {
            RescueKind::Adrenaline => self.adrenaline,
            RescueKind::TempExpansion => self.temp_expansion,
            RescueKind::GhostRevival => self.ghost_revival,
        }
    }

    fn bump(&mut self, kind: RescueKind) {
        let slot = match kind {
            RescueKind::Adrenaline => &mut self.adrenaline,
            RescueKind::TempExpansion => &mut self.temp_expansion,
            RescueKind::GhostRevival => &mut self.ghost_revival,
        };
        *slot = slot.saturating_add(1);
    }
}

#[derive(Debug, Clone)]
pub struct RescueGateway {
    config: RescueCfg,
    pending: BTreeMap<u64, RescueKind>,
    next_token: u64,
    usage: RescueUsage,
}

impl RescueGateway {
    #[must_use]
    pub const fn new(config: RescueCfg) -> Self {
        Self {
            config,
            pending: BTreeMap::new(),
            next_token: 1,
            usage: RescueUsage {
                adrenaline: 0,
                temp_expansion: 0,
                ghost_revival: 0,
            },
        }
    }

    /// Rebuild a gateway with persisted usage and no pending tickets.
    #[must_use]
    pub const fn with_usage(config: RescueCfg, usage: RescueUsage) -> Self {
        Self {
            config,
            pending: BTreeMap::new(),
            next_token: 1,
            usage,
        }
    }

    #[must_use]
    pub const fn usage(&self) -> &RescueUsage {
        &self.usage
    }

    #[must_use]
    pub const fn cap(&self, kind: RescueKind) -> u32 {
        match kind {
            RescueKind::Adrenaline => self.config.adrenaline_daily_cap,
            RescueKind::TempExpansion => self.config.temp_expansion_daily_cap,
            RescueKind::GhostRevival => self.config.ghost_revival_daily_cap,
        }
    }

    #[must_use]
    pub const fn remaining(&self, kind: RescueKind) -> u32 {
        self.cap(kind).saturating_sub(self.usage.get(kind))
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether `kind` would do anything for the ledger right now.
    #[must_use]
    pub fn is_applicable(&self, kind: RescueKind, ledger: &ResourceLedger) -> bool {
        let player = ledger.player();
        let state = ledger.vital_state();
        match kind {
            RescueKind::Adrenaline => player.stamina < player.max_stamina,
            RescueKind::TempExpansion => {
                !state.is_collapsed()
                    && ledger.temp_bonus() <= 0.0
                    && self.temp_bonus_for(ledger) > 0.0
            }
            RescueKind::GhostRevival => state.is_collapsed(),
        }
    }

    /// Issue a ticket for `kind`. Nothing is consumed until it resolves.
    ///
    /// At most one ticket per kind is outstanding: a new request supersedes
    /// the previous ticket of the same kind, whose token becomes unknown.
    ///
    /// # Errors
    ///
    /// [`EconomyError::RescueCapReached`] once the daily cap is used up and
    /// [`EconomyError::RescueNotApplicable`] when the rescue would do nothing.
    pub fn request_rescue(
        &mut self,
        kind: RescueKind,
        ledger: &ResourceLedger,
    ) -> Result<RescueTicket, EconomyError> {
        if self.remaining(kind) == 0 {
            log::warn!("{kind} rescue refused: daily cap {} reached", self.cap(kind));
            return Err(EconomyError::RescueCapReached {
                kind,
                cap: self.cap(kind),
            });
        }
        if !self.is_applicable(kind, ledger) {
            log::warn!("{kind} rescue refused: not applicable while {}", ledger.vital_state());
            return Err(EconomyError::RescueNotApplicable { kind });
        }
        self.pending.retain(|&token, &mut pending| {
            let superseded = pending == kind;
            if superseded {
                log::debug!("{kind} rescue ticket {token} superseded");
            }
            !superseded
        });
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        self.pending.insert(token, kind);
        log::debug!("{kind} rescue ticket {token} issued");
        Ok(RescueTicket { token, kind })
    }

    /// Settle a ticket with the ad outcome.
    ///
    /// The token is consumed whatever the outcome.
    ///
    /// # Errors
    ///
    /// [`EconomyError::UnknownRescueToken`] for tokens that were never
    /// issued or were already resolved.
    pub fn resolve_rescue(
        &mut self,
        token: u64,
        outcome: AdOutcome,
        ledger: &mut ResourceLedger,
    ) -> Result<RescueResolution, EconomyError> {
        let kind = self
            .pending
            .remove(&token)
            .ok_or(EconomyError::UnknownRescueToken { token })?;
        if outcome == AdOutcome::Cancelled {
            log::info!("{kind} rescue {token} declined");
            return Ok(RescueResolution::Declined);
        }
        if self.remaining(kind) == 0 || !self.is_applicable(kind, ledger) {
            log::info!("{kind} rescue {token} is stale");
            return Ok(RescueResolution::Stale);
        }
        let Some(effect) = self.apply(kind, ledger)? else {
            log::info!("{kind} rescue {token} is stale");
            return Ok(RescueResolution::Stale);
        };
        self.usage.bump(kind);
        ledger.push_log(kind.log_key());
        log::info!(
            "{kind} rescue {token} applied ({} of {} used today)",
            self.usage.get(kind),
            self.cap(kind)
        );
        Ok(RescueResolution::Applied(effect))
    }

    /// Start a new day: usage counters go back to zero.
    pub fn reset_daily(&mut self) {
        self.usage = RescueUsage::default();
        log::debug!("rescue usage reset");
    }

    fn apply(
        &self,
        kind: RescueKind,
        ledger: &mut ResourceLedger,
    ) -> Result<Option<RescueEffect>, EconomyError> {
        match kind {
            RescueKind::Adrenaline => {
                let amount = self.config.adrenaline_restore;
                let mut transition = ledger.restore_stamina(amount)?;
                let player = ledger.player();
                if player.stamina > 0.0 && player.durability > 0.0 && player.hygiene > 0.0 {
                    transition = ledger.clear_collapse().or(transition);
                }
                Ok(Some(RescueEffect::StaminaRestored { amount, transition }))
            }
            RescueKind::TempExpansion => {
                let bonus = self.temp_bonus_for(ledger);
                let max_weight = ledger.grant_temp_expansion(bonus)?;
                Ok(Some(RescueEffect::CapacityBonus { bonus, max_weight }))
            }
            RescueKind::GhostRevival => Ok(ledger
                .emergency_repair(0.0)
                .then_some(RescueEffect::Revived)),
        }
    }

    fn temp_bonus_for(&self, ledger: &ResourceLedger) -> f64 {
        ledger.player().base_max_weight * self.config.temp_expansion_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collapse::VitalState;
    use crate::config::EconomyConfig;

    fn setup() -> (RescueGateway, ResourceLedger) {
        let cfg = EconomyConfig::default();
        (RescueGateway::new(cfg.rescue.clone()), ResourceLedger::new(cfg))
    }

    #[test]
    fn cancelled_ad_changes_nothing() {
        let (mut gateway, mut ledger) = setup();
        ledger.consume_stamina(100.0).unwrap();
        let before = ledger.snapshot();

        let ticket = gateway
            .request_rescue(RescueKind::GhostRevival, &ledger)
            .unwrap();
        let resolution = gateway
            .resolve_rescue(ticket.token, AdOutcome::Cancelled, &mut ledger)
            .unwrap();
        assert_eq!(resolution, RescueResolution::Declined);
        assert_eq!(ledger.snapshot(), before);
        assert_eq!(gateway.remaining(RescueKind::GhostRevival), 1);
        assert_eq!(gateway.pending_count(), 0);
    }

    #[test]
    fn adrenaline_clears_ghost_when_other_resources_hold() {
        let (mut gateway, mut ledger) = setup();
        ledger.consume_stamina(100.0).unwrap();
        let ticket = gateway
            .request_rescue(RescueKind::Adrenaline, &ledger)
            .unwrap();
        let resolution = gateway
            .resolve_rescue(ticket.token, AdOutcome::Watched, &mut ledger)
            .unwrap();
        let RescueResolution::Applied(RescueEffect::StaminaRestored { transition, .. }) =
            resolution
        else {
            panic!("unexpected resolution {resolution:?}");
        };
        assert_eq!(transition.map(|t| t.from), Some(VitalState::Ghost));
        assert!((ledger.player().stamina - 30.0).abs() < f64::EPSILON);
        assert!(!ledger.player().is_ghost);
        assert!(ledger.logs().iter().any(|l| l == "log.rescue.adrenaline"));
        assert_eq!(gateway.usage().adrenaline, 1);
    }

    #[test]
    fn adrenaline_leaves_durability_collapse_in_place() {
        let (mut gateway, mut ledger) = setup();
        ledger.decay_durability(100.0).unwrap();
        ledger.consume_stamina(50.0).unwrap();
        let ticket = gateway
            .request_rescue(RescueKind::Adrenaline, &ledger)
            .unwrap();
        gateway
            .resolve_rescue(ticket.token, AdOutcome::Watched, &mut ledger)
            .unwrap();
        assert!((ledger.player().stamina - 80.0).abs() < f64::EPSILON);
        assert!(ledger.player().is_immobilized);
    }

    #[test]
    fn temp_expansion_uses_half_base_capacity() {
        let (mut gateway, mut ledger) = setup();
        let ticket = gateway
            .request_rescue(RescueKind::TempExpansion, &ledger)
            .unwrap();
        let resolution = gateway
            .resolve_rescue(ticket.token, AdOutcome::Watched, &mut ledger)
            .unwrap();
        assert_eq!(
            resolution,
            RescueResolution::Applied(RescueEffect::CapacityBonus {
                bonus: 5.0,
                max_weight: 15.0
            })
        );
        assert!(matches!(
            gateway.request_rescue(RescueKind::TempExpansion, &ledger),
            Err(EconomyError::RescueNotApplicable { .. })
        ));
    }

    #[test]
    fn revival_requires_collapse() {
        let (mut gateway, ledger) = setup();
        assert!(matches!(
            gateway.request_rescue(RescueKind::GhostRevival, &ledger),
            Err(EconomyError::RescueNotApplicable {
                kind: RescueKind::GhostRevival
            })
        ));
    }

    #[test]
    fn revival_cap_is_consumed_only_on_success() {
        let (mut gateway, mut ledger) = setup();
        ledger.consume_stamina(100.0).unwrap();
        let ticket = gateway
            .request_rescue(RescueKind::GhostRevival, &ledger)
            .unwrap();
        assert_eq!(
            gateway
                .resolve_rescue(ticket.token, AdOutcome::Watched, &mut ledger)
                .unwrap(),
            RescueResolution::Applied(RescueEffect::Revived)
        );
        assert_eq!(ledger.vital_state(), VitalState::Active);

        ledger.consume_stamina(100.0).unwrap();
        assert!(matches!(
            gateway.request_rescue(RescueKind::GhostRevival, &ledger),
            Err(EconomyError::RescueCapReached { cap: 1, .. })
        ));
        gateway.reset_daily();
        assert!(gateway
            .request_rescue(RescueKind::GhostRevival, &ledger)
            .is_ok());
    }

    #[test]
    fn stale_ticket_commits_nothing() {
        let (mut gateway, mut ledger) = setup();
        ledger.consume_stamina(100.0).unwrap();
        let ticket = gateway
            .request_rescue(RescueKind::GhostRevival, &ledger)
            .unwrap();
        assert!(ledger.emergency_repair(25.0));
        let before = ledger.snapshot();

        let resolution = gateway
            .resolve_rescue(ticket.token, AdOutcome::Watched, &mut ledger)
            .unwrap();
        assert_eq!(resolution, RescueResolution::Stale);
        assert_eq!(ledger.snapshot(), before);
        assert_eq!(gateway.usage().ghost_revival, 0);
    }

    #[test]
    fn repeated_requests_keep_one_ticket_per_kind() {
        let (mut gateway, mut ledger) = setup();
        ledger.consume_stamina(100.0).unwrap();
        let first = gateway
            .request_rescue(RescueKind::GhostRevival, &ledger)
            .unwrap();
        let mut latest = first;
        for _ in 0..10_000 {
            latest = gateway
                .request_rescue(RescueKind::GhostRevival, &ledger)
                .unwrap();
        }
        let adrenaline = gateway
            .request_rescue(RescueKind::Adrenaline, &ledger)
            .unwrap();
        assert_eq!(gateway.pending_count(), 2);

        assert_eq!(
            gateway.resolve_rescue(first.token, AdOutcome::Watched, &mut ledger),
            Err(EconomyError::UnknownRescueToken { token: first.token })
        );
        assert_eq!(
            gateway
                .resolve_rescue(latest.token, AdOutcome::Watched, &mut ledger)
                .unwrap(),
            RescueResolution::Applied(RescueEffect::Revived)
        );
        assert_eq!(gateway.usage().ghost_revival, 1);
        assert_eq!(gateway.pending_count(), 1);
        assert!(gateway
            .resolve_rescue(adrenaline.token, AdOutcome::Cancelled, &mut ledger)
            .is_ok());
        assert_eq!(gateway.pending_count(), 0);
    }

    #[test]
    fn zero_sized_temp_bonus_is_not_offered() {
        let mut cfg = EconomyConfig::default();
        cfg.rescue.temp_expansion_ratio = 0.0;
        let mut gateway = RescueGateway::new(cfg.rescue.clone());
        let ledger = ResourceLedger::new(cfg);
        assert!(!gateway.is_applicable(RescueKind::TempExpansion, &ledger));
        assert!(matches!(
            gateway.request_rescue(RescueKind::TempExpansion, &ledger),
            Err(EconomyError::RescueNotApplicable {
                kind: RescueKind::TempExpansion
            })
        ));
        assert_eq!(gateway.usage().temp_expansion, 0);
    }

    #[test]
    fn tokens_resolve_once() {
        let (mut gateway, mut ledger) = setup();
        ledger.consume_stamina(10.0).unwrap();
        let ticket = gateway
            .request_rescue(RescueKind::Adrenaline, &ledger)
            .unwrap();
        gateway
            .resolve_rescue(ticket.token, AdOutcome::Watched, &mut ledger)
            .unwrap();
        assert_eq!(
            gateway.resolve_rescue(ticket.token, AdOutcome::Watched, &mut ledger),
            Err(EconomyError::UnknownRescueToken {
                token: ticket.token
            })
        );
        assert!(gateway
            .resolve_rescue(999, AdOutcome::Cancelled, &mut ledger)
            .is_err());
    }
}
