//! Seeded random walks over a full economy session.
//!
//! Each step draws one gameplay event from a `ChaCha20Rng`, applies it through
//! the public API, then checks the ledger invariants. A seed always replays the
//! same walk.
use anyhow::{Result, bail, ensure};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

use solefood_economy::numbers::{ceil_f64_to_coins, coins_to_f64};
use solefood_economy::{
    AdOutcome, EconomyConfig, EconomyError, EconomySession, RescueKind, RescueResolution,
    VitalState, unload_cost,
};

const STARTING_COINS: u64 = 1_500;
const EMERGENCY_REPAIR_FEE: u64 = 50;
const CARGO_VALUE_PER_KG: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum WalkEvent {
    Forage { weight: f64, stamina: f64, grime: f64 },
    Rest(f64),
    Wear(f64),
    Repair(f64),
    Clean,
    Unload(f64),
    Expand(u32),
    Rescue(RescueKind, AdOutcome),
    EmergencyRepair,
    RevokeTemp,
    NewDay,
}

impl WalkEvent {
    fn draw(rng: &mut ChaCha20Rng) -> Self {
        match rng.gen_range(0..100) {
            0..=29 => Self::Forage {
                weight: rng.gen_range(0.0..4.0),
                stamina: rng.gen_range(0.0..18.0),
                grime: rng.gen_range(0.0..9.0),
            },
            30..=39 => Self::Rest(rng.gen_range(0.0..25.0)),
            40..=49 => Self::Wear(rng.gen_range(0.0..30.0)),
            50..=54 => Self::Repair(rng.gen_range(1.0..40.0)),
            55..=59 => Self::Clean,
            60..=71 => Self::Unload(rng.gen_range(0.0..12.0)),
            72..=77 => Self::Expand(rng.gen_range(1..=3)),
            78..=89 => {
                let kind = RescueKind::ALL[rng.gen_range(0..RescueKind::ALL.len())];
                let outcome = if rng.gen_bool(0.75) {
                    AdOutcome::Watched
                } else {
                    AdOutcome::Cancelled
                };
                Self::Rescue(kind, outcome)
            }
            90..=94 => Self::EmergencyRepair,
            95..=97 => Self::RevokeTemp,
            _ => Self::NewDay,
        }
    }

    /// Events allowed to move the player out of Collapsed/Ghost.
    const fn may_recover(self) -> bool {
        matches!(
            self,
            Self::EmergencyRepair
                | Self::Rescue(
                    RescueKind::Adrenaline | RescueKind::GhostRevival,
                    AdOutcome::Watched
                )
        )
    }
}

/// Aggregate counters for one walk.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WalkSummary {
    pub seed: u64,
    pub steps: usize,
    pub transitions: usize,
    pub collapses: usize,
    pub blocked_actions: usize,
    pub rescues_applied: usize,
    pub rescues_declined: usize,
    pub expansions: u32,
    pub coins_spent: u64,
    pub coins_left: u64,
    pub final_state: VitalState,
}

struct Walker {
    session: EconomySession,
    coins: u64,
    summary: WalkSummary,
    last_unit_quote: u64,
}

/// Run `steps` random events against a fresh session.
///
/// # Errors
///
/// Returns the first invariant violation, tagged with the step and event.
pub fn run_walk(config: &EconomyConfig, seed: u64, steps: usize) -> Result<WalkSummary> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let session = EconomySession::new(config.clone());
    let last_unit_quote = unit_quote(&session)?;
    let mut walker = Walker {
        session,
        coins: STARTING_COINS,
        summary: WalkSummary {
            seed,
            ..WalkSummary::default()
        },
        last_unit_quote,
    };

    for step in 0..steps {
        let event = WalkEvent::draw(&mut rng);
        let before = walker.session.ledger().vital_state();
        walker
            .apply(event)
            .and_then(|()| walker.check(before, event))
            .map_err(|err| err.context(format!("step {step} ({event:?}) seed {seed}")))?;
        walker.summary.steps = step + 1;
    }

    walker.summary.coins_left = walker.coins;
    walker.summary.final_state = walker.session.ledger().vital_state();
    log::debug!("walk {seed} finished: {:?}", walker.summary);
    Ok(walker.summary)
}

fn unit_quote(session: &EconomySession) -> Result<u64> {
    Ok(session.ledger().economy().quote_expansion(1)?.cost)
}

impl Walker {
    fn apply(&mut self, event: WalkEvent) -> Result<()> {
        match event {
            WalkEvent::Forage {
                weight,
                stamina,
                grime,
            } => {
                let ledger = self.session.ledger_mut();
                let carried = ledger.player().current_weight;
                ledger.update_weight(carried + weight)?;
                ledger.consume_stamina(stamina)?;
                ledger.decay_hygiene(grime)?;
            }
            WalkEvent::Rest(amount) => {
                self.session.ledger_mut().restore_stamina(amount)?;
            }
            WalkEvent::Wear(amount) => {
                self.session.ledger_mut().decay_durability(amount)?;
            }
            WalkEvent::Repair(points) => {
                let cost = self.session.ledger().economy().calculate_repair_cost(points)?;
                if self.spend(cost) {
                    self.session.ledger_mut().restore_durability(points)?;
                }
            }
            WalkEvent::Clean => {
                let cost = self.session.ledger().economy().calculate_clean_cost();
                if self.spend(cost) {
                    let max = self.session.ledger().player().max_hygiene;
                    self.session.ledger_mut().restore_hygiene(max)?;
                }
            }
            WalkEvent::Unload(weight) => self.unload(weight)?,
            WalkEvent::Expand(units) => self.expand(units)?,
            WalkEvent::Rescue(kind, outcome) => self.rescue(kind, outcome)?,
            WalkEvent::EmergencyRepair => {
                let collapsed = self.session.ledger().vital_state().is_collapsed();
                if collapsed && self.coins >= EMERGENCY_REPAIR_FEE {
                    let applied = self
                        .session
                        .ledger_mut()
                        .emergency_repair(coins_to_f64(EMERGENCY_REPAIR_FEE));
                    ensure!(applied, "emergency repair refused for a collapsed player");
                    self.spend(EMERGENCY_REPAIR_FEE);
                }
            }
            WalkEvent::RevokeTemp => {
                self.session.ledger_mut().revoke_temp_expansion();
            }
            WalkEvent::NewDay => self.session.reset_daily(),
        }
        Ok(())
    }

    fn unload(&mut self, weight: f64) -> Result<()> {
        let preview = self.session.ledger().economy().can_unload(weight);
        let committed = self.session.ledger_mut().unload(weight);
        ensure!(
            preview == committed.is_ok(),
            "can_unload({weight}) said {preview} but unload returned {committed:?}"
        );
        match committed {
            Ok(receipt) => {
                let expected = unload_cost(
                    &self.session.ledger().config().unload,
                    receipt.weight_delivered,
                );
                ensure!(
                    (receipt.stamina_spent - expected).abs() < 1e-9,
                    "unload charged {} stamina, formula says {expected}",
                    receipt.stamina_spent
                );
                let payout = self
                    .session
                    .ledger()
                    .economy()
                    .calculate_payout(receipt.weight_delivered * CARGO_VALUE_PER_KG)?;
                self.coins = self.coins.saturating_add(ceil_f64_to_coins(payout));
                Ok(())
            }
            Err(err) => self.expected_refusal(err),
        }
    }

    fn expand(&mut self, units: u32) -> Result<()> {
        match self.session.ledger_mut().expand_capacity(units, self.coins) {
            Ok(outcome) if outcome.success => {
                self.spend(outcome.cost);
                self.summary.expansions += units;
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(err) => self.expected_refusal(err),
        }
    }

    fn rescue(&mut self, kind: RescueKind, outcome: AdOutcome) -> Result<()> {
        let ticket = match self.session.request_rescue(kind) {
            Ok(ticket) => ticket,
            Err(err) => return self.expected_refusal(err),
        };
        let before = self.session.snapshot();
        match self.session.resolve_rescue(ticket.token, outcome)? {
            RescueResolution::Declined => {
                ensure!(
                    self.session.snapshot() == before,
                    "declined {kind} rescue changed the session"
                );
                self.summary.rescues_declined += 1;
            }
            RescueResolution::Applied(_) => self.summary.rescues_applied += 1,
            RescueResolution::Stale => bail!("{kind} rescue went stale without any intervening event"),
        }
        Ok(())
    }

    fn expected_refusal(&mut self, err: EconomyError) -> Result<()> {
        match err {
            EconomyError::AlreadyCollapsed { .. }
            | EconomyError::InsufficientResource { .. }
            | EconomyError::RescueCapReached { .. }
            | EconomyError::RescueNotApplicable { .. } => {
                self.summary.blocked_actions += 1;
                Ok(())
            }
            other => Err(other.into()),
        }
    }

    fn spend(&mut self, cost: u64) -> bool {
        if self.coins < cost {
            return false;
        }
        self.coins -= cost;
        self.summary.coins_spent = self.summary.coins_spent.saturating_add(cost);
        true
    }

    fn check(&mut self, before: VitalState, event: WalkEvent) -> Result<()> {
        let ledger = self.session.ledger();
        let player = ledger.player();
        let state = ledger.vital_state();

        ensure!(
            (0.0..=player.max_stamina).contains(&player.stamina),
            "stamina {} out of bounds",
            player.stamina
        );
        ensure!(
            (0.0..=player.max_durability).contains(&player.durability),
            "durability {} out of bounds",
            player.durability
        );
        ensure!(
            (0.0..=player.max_hygiene).contains(&player.hygiene),
            "hygiene {} out of bounds",
            player.hygiene
        );
        ensure!(
            (0.0..=player.max_weight).contains(&player.current_weight),
            "weight {} exceeds capacity {}",
            player.current_weight,
            player.max_weight
        );
        ensure!(
            player.is_ghost == (state == VitalState::Ghost)
                && player.is_immobilized == state.is_collapsed(),
            "flags ghost={} immobilized={} disagree with state {state}",
            player.is_ghost,
            player.is_immobilized
        );
        if player.stamina <= 0.0 {
            ensure!(state == VitalState::Ghost, "zero stamina but state is {state}");
        }
        if before.is_collapsed() && !event.may_recover() {
            ensure!(state.is_collapsed(), "{before} cleared to {state} without recovery");
        }
        if before == VitalState::Ghost && state.is_collapsed() {
            ensure!(state == VitalState::Ghost, "ghost de-escalated to {state}");
        }
        if player.durability <= 0.0 {
            ensure!(
                ledger.effective_capacity() <= 0.0,
                "broken gear still carries {}",
                ledger.effective_capacity()
            );
        }
        for kind in RescueKind::ALL {
            let gateway = self.session.gateway();
            ensure!(
                gateway.usage().get(kind) <= gateway.cap(kind),
                "{kind} used beyond its daily cap"
            );
        }

        let quote = unit_quote(&self.session)?;
        ensure!(
            quote >= self.last_unit_quote,
            "next expansion step got cheaper: {} -> {quote}",
            self.last_unit_quote
        );
        self.last_unit_quote = quote;

        if state != before {
            self.summary.transitions += 1;
            if state.is_collapsed() && !before.is_collapsed() {
                self.summary.collapses += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_replays_the_same_walk() {
        let cfg = EconomyConfig::default();
        let a = run_walk(&cfg, 42, 300).unwrap();
        let b = run_walk(&cfg, 42, 300).unwrap();
        assert_eq!(a.steps, 300);
        assert_eq!(a.transitions, b.transitions);
        assert_eq!(a.coins_spent, b.coins_spent);
        assert_eq!(a.final_state, b.final_state);
    }

    #[test]
    fn walks_hold_invariants_across_seeds() {
        let cfg = EconomyConfig::default();
        for seed in 0..20 {
            let summary = run_walk(&cfg, seed, 400).unwrap();
            assert_eq!(summary.steps, 400);
            assert!(summary.rescues_applied + summary.blocked_actions > 0);
        }
    }

    #[test]
    fn heavy_walks_eventually_collapse() {
        let cfg = EconomyConfig::default();
        let collapses: usize = (0..10)
            .map(|seed| run_walk(&cfg, seed, 500).unwrap().collapses)
            .sum();
        assert!(collapses > 0);
    }

    #[test]
    fn recovery_events_are_classified() {
        assert!(WalkEvent::EmergencyRepair.may_recover());
        assert!(WalkEvent::Rescue(RescueKind::GhostRevival, AdOutcome::Watched).may_recover());
        assert!(!WalkEvent::Rescue(RescueKind::GhostRevival, AdOutcome::Cancelled).may_recover());
        assert!(!WalkEvent::Rescue(RescueKind::TempExpansion, AdOutcome::Watched).may_recover());
        assert!(!WalkEvent::Rest(10.0).may_recover());
    }
}
