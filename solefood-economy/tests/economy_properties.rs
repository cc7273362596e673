//! Property tests for the ledger and pricing laws.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use solefood_economy::{
    EconomyConfig, PlayerState, ResourceLedger, ResourceLimits, UnloadCfg, VitalState, unload_cost,
};

#[derive(Debug, Clone, Copy)]
enum Op {
    ConsumeStamina(f64),
    RestoreStamina(f64),
    DecayDurability(f64),
    RestoreDurability(f64),
    DecayHygiene(f64),
    RestoreHygiene(f64),
    UpdateWeight(f64),
}

fn op() -> impl Strategy<Value = Op> {
    let amount = prop_oneof![0.0..150.0f64, 0.0..1.0e12f64, Just(0.0)];
    (0u8..7, amount).prop_map(|(kind, amount)| match kind {
        0 => Op::ConsumeStamina(amount),
        1 => Op::RestoreStamina(amount),
        2 => Op::DecayDurability(amount),
        3 => Op::RestoreDurability(amount),
        4 => Op::DecayHygiene(amount),
        5 => Op::RestoreHygiene(amount),
        _ => Op::UpdateWeight(amount),
    })
}

fn apply(ledger: &mut ResourceLedger, op: Op) {
    match op {
        Op::ConsumeStamina(v) => {
            ledger.consume_stamina(v).unwrap();
        }
        Op::RestoreStamina(v) => {
            ledger.restore_stamina(v).unwrap();
        }
        Op::DecayDurability(v) => {
            ledger.decay_durability(v).unwrap();
        }
        Op::RestoreDurability(v) => {
            ledger.restore_durability(v).unwrap();
        }
        Op::DecayHygiene(v) => {
            ledger.decay_hygiene(v).unwrap();
        }
        Op::RestoreHygiene(v) => {
            ledger.restore_hygiene(v).unwrap();
        }
        Op::UpdateWeight(v) => {
            ledger.update_weight(v).unwrap();
        }
    }
}

fn assert_bounded(player: &PlayerState) -> Result<(), TestCaseError> {
    prop_assert!((0.0..=player.max_stamina).contains(&player.stamina));
    prop_assert!((0.0..=player.max_durability).contains(&player.durability));
    prop_assert!((0.0..=player.max_hygiene).contains(&player.hygiene));
    prop_assert!((0.0..=player.max_weight).contains(&player.current_weight));
    prop_assert!(!player.is_ghost || player.is_immobilized);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn mutators_keep_resources_in_bounds(ops in prop::collection::vec(op(), 1..64)) {
        let mut ledger = ResourceLedger::new(EconomyConfig::default());
        for op in ops {
            apply(&mut ledger, op);
            assert_bounded(ledger.player())?;
        }
    }

    #[test]
    fn reset_restores_session_initial_state(ops in prop::collection::vec(op(), 0..32)) {
        let config = EconomyConfig::default();
        let mut ledger = ResourceLedger::new(config.clone());
        for op in ops {
            apply(&mut ledger, op);
        }
        ledger.reset_player();
        prop_assert_eq!(ledger.player(), &PlayerState::initial(&config.limits));
        prop_assert_eq!(ledger.vital_state(), VitalState::Active);
        prop_assert_eq!(ledger.expansions(), 0);
    }

    #[test]
    fn ghost_survives_unrelated_mutations(ops in prop::collection::vec(op(), 0..32)) {
        let mut ledger = ResourceLedger::new(EconomyConfig::default());
        ledger.consume_stamina(1_000.0).unwrap();
        for op in ops {
            apply(&mut ledger, op);
            prop_assert_eq!(ledger.vital_state(), VitalState::Ghost);
            prop_assert!(ledger.player().is_ghost);
        }
    }

    #[test]
    fn unload_cost_never_decreases_with_weight(a in 0.0..500.0f64, b in 0.0..500.0f64) {
        let cfg = UnloadCfg::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(unload_cost(&cfg, lo) <= unload_cost(&cfg, hi));
    }

    #[test]
    fn repeated_expansions_never_get_cheaper(base in 5.0..40.0f64, units in 1u32..=10) {
        let config = EconomyConfig {
            limits: ResourceLimits {
                base_max_weight: base,
                ..ResourceLimits::default()
            },
            ..EconomyConfig::default()
        };
        let mut ledger = ResourceLedger::new(config);
        let first = ledger.expand_capacity(units, u64::MAX).unwrap();
        let second = ledger.expand_capacity(units, u64::MAX).unwrap();
        prop_assert!(first.success && second.success);
        prop_assert!(second.cost >= first.cost);
        prop_assert!(second.new_capacity > first.new_capacity);
    }

    #[test]
    fn failed_emergency_repair_is_a_no_op(cost in prop_oneof![-1.0e6..-0.001f64, Just(f64::NAN)]) {
        let mut ledger = ResourceLedger::new(EconomyConfig::default());
        ledger.consume_stamina(100.0).unwrap();
        let before = ledger.snapshot();
        prop_assert!(!ledger.emergency_repair(cost));
        prop_assert_eq!(ledger.snapshot(), before);
    }
}
