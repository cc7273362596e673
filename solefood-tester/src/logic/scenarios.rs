//! Named scenarios runnable from the CLI.
use anyhow::{Context, Result, bail, ensure};
use std::path::PathBuf;

use solefood_economy::{
    AdOutcome, EconomyConfig, EconomyEngine, EconomyError, EconomySession, RescueKind,
    RescueResolution, ResourceLedger, VitalState,
};

use super::walker::run_walk;
use crate::storage::{DirStorage, JsonConfigLoader};

const WALK_STEPS: usize = 400;

/// Inputs shared by every scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioCtx<'a> {
    pub config: &'a EconomyConfig,
    pub loader: &'a JsonConfigLoader,
    pub seed: u64,
    pub verbose: bool,
}

pub struct Scenario {
    pub key: &'static str,
    pub description: &'static str,
    pub run: fn(&ScenarioCtx<'_>) -> Result<()>,
}

const CATALOG: &[Scenario] = &[
    Scenario {
        key: "smoke",
        description: "Fresh session, price queries, one unload",
        run: smoke,
    },
    Scenario {
        key: "ghost-revival",
        description: "Exhaust stamina, stay ghost through rest, revive via rescue",
        run: ghost_revival,
    },
    Scenario {
        key: "unload-ladder",
        description: "Unload cost is monotone and gated by stamina",
        run: unload_ladder,
    },
    Scenario {
        key: "expansion-ladder",
        description: "Repeated capacity purchases never get cheaper",
        run: expansion_ladder,
    },
    Scenario {
        key: "rescue-caps",
        description: "Daily rescue caps hold and reset",
        run: rescue_caps,
    },
    Scenario {
        key: "session-persistence",
        description: "Sessions survive a save/load through disk storage",
        run: session_persistence,
    },
    Scenario {
        key: "random-walk",
        description: "Seeded random events with invariant checks after every step",
        run: random_walk,
    },
];

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    CATALOG.iter().map(|s| (s.key, s.description))
}

pub fn get_scenario(name: &str) -> Option<&'static Scenario> {
    let name = name.to_lowercase();
    CATALOG.iter().find(|s| s.key == name)
}

fn smoke(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let mut session = EconomySession::new(ctx.config.clone());
    let ledger = session.ledger();
    ensure!(ledger.vital_state() == VitalState::Active, "fresh session not active");
    ensure!(ledger.economy().calculate_clean_cost() == 0, "clean cost on a clean player");
    ensure!(
        ledger.economy().calculate_repair_cost(0.0)? == 0,
        "repairing nothing should be free"
    );

    let ledger = session.ledger_mut();
    let carried = ledger.update_weight(ledger.player().max_weight / 2.0)?;
    let expected = ledger.economy().calculate_unload_cost(carried)?;
    let receipt = ledger.unload(carried)?;
    ensure!(
        (receipt.stamina_spent - expected).abs() < 1e-9,
        "unload charged {} but quoted {expected}",
        receipt.stamina_spent
    );
    ensure!(ledger.player().current_weight <= 0.0, "cargo left after unload");
    Ok(())
}

fn ghost_revival(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let mut session = EconomySession::new(ctx.config.clone());
    let max = session.ledger().player().max_stamina;
    let ledger = session.ledger_mut();

    ledger.consume_stamina(max * 0.3)?;
    ensure!(!ledger.player().is_ghost, "ghost after a partial spend");
    ledger.consume_stamina(max)?;
    ensure!(ledger.vital_state() == VitalState::Ghost, "no ghost at zero stamina");
    let rested = max * 0.5;
    ledger.restore_stamina(rested)?;
    ensure!(ledger.vital_state() == VitalState::Ghost, "rest cleared ghost");

    let ticket = session.request_rescue(RescueKind::GhostRevival)?;
    let declined = session.resolve_rescue(ticket.token, AdOutcome::Cancelled)?;
    ensure!(declined == RescueResolution::Declined, "cancel was not a decline");
    ensure!(
        session.ledger().vital_state() == VitalState::Ghost,
        "cancelled rescue changed the player"
    );

    let ticket = session.request_rescue(RescueKind::GhostRevival)?;
    let applied = session.resolve_rescue(ticket.token, AdOutcome::Watched)?;
    ensure!(
        matches!(applied, RescueResolution::Applied(_)),
        "revival not applied: {applied:?}"
    );
    let player = session.ledger().player();
    let expected = rested.max(ctx.config.recovery.viable_stamina);
    ensure!(
        (player.stamina - expected).abs() < 1e-9,
        "revived stamina {} expected {expected}",
        player.stamina
    );
    ensure!(!player.is_ghost && !player.is_immobilized, "flags survived revival");
    Ok(())
}

fn unload_ladder(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let mut ledger = ResourceLedger::new(ctx.config.clone());
    let max_weight = ledger.player().max_weight;
    ledger.update_weight(max_weight)?;

    let mut previous = 0.0;
    let mut weight = 0.0;
    while weight <= max_weight {
        let cost = ledger.economy().calculate_unload_cost(weight)?;
        ensure!(cost >= previous, "unload cost fell from {previous} to {cost} at {weight}kg");
        let affordable = cost <= ledger.player().stamina;
        ensure!(
            ledger.economy().can_unload(weight) == affordable,
            "can_unload disagrees with stamina at {weight}kg"
        );
        previous = cost;
        weight += 0.5;
    }

    let full_cost = ledger.economy().calculate_unload_cost(max_weight)?;
    let spare = ledger.player().stamina - full_cost;
    if spare < 0.0 {
        return Ok(());
    }
    ledger.consume_stamina(spare + 0.5)?;
    match ledger.unload(max_weight) {
        Err(EconomyError::InsufficientResource { .. } | EconomyError::AlreadyCollapsed { .. }) => {
            Ok(())
        }
        other => bail!("unload with too little stamina returned {other:?}"),
    }
}

fn expansion_ladder(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let mut ledger = ResourceLedger::new(ctx.config.clone());
    let mut previous = 0;
    for _ in 0..20 {
        let capacity = ledger.player().max_weight;
        let quote = ledger.economy().quote_expansion(1)?;
        let short = ledger.expand_capacity(1, quote.cost.saturating_sub(1))?;
        ensure!(
            !short.success && (ledger.player().max_weight - capacity).abs() < f64::EPSILON,
            "underfunded purchase changed capacity"
        );
        let outcome = ledger.expand_capacity(1, quote.cost)?;
        ensure!(outcome.success, "funded purchase failed");
        ensure!(outcome.cost >= previous, "step cost fell from {previous} to {}", outcome.cost);
        ensure!(outcome.new_capacity > capacity, "capacity did not grow");
        previous = outcome.cost;
    }
    Ok(())
}

fn rescue_caps(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let mut session = EconomySession::new(ctx.config.clone());
    let cap = session.gateway().cap(RescueKind::Adrenaline);
    let drain = ctx.config.rescue.adrenaline_restore;

    for day in 0..2 {
        for _ in 0..cap {
            session.ledger_mut().consume_stamina(drain)?;
            let ticket = session.request_rescue(RescueKind::Adrenaline)?;
            session.resolve_rescue(ticket.token, AdOutcome::Watched)?;
        }
        session.ledger_mut().consume_stamina(drain)?;
        match session.request_rescue(RescueKind::Adrenaline) {
            Err(EconomyError::RescueCapReached { cap: reported, .. }) if reported == cap => {}
            other => bail!("day {day}: expected cap of {cap}, got {other:?}"),
        }
        session.reset_daily();
    }
    ensure!(
        session.gateway().usage().adrenaline == 0,
        "usage survived the daily reset"
    );
    Ok(())
}

fn session_persistence(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let root: PathBuf = std::env::temp_dir().join(format!(
        "solefood-tester-{}-{}",
        std::process::id(),
        ctx.seed
    ));
    let engine = EconomyEngine::new(ctx.loader.clone(), DirStorage::new(&root));
    let result = persistence_roundtrip(&engine, ctx.seed);
    let _ = std::fs::remove_dir_all(&root);
    result
}

fn persistence_roundtrip(
    engine: &EconomyEngine<JsonConfigLoader, DirStorage>,
    seed: u64,
) -> Result<()> {
    let mut session = engine.create_session()?;
    let spent = f64::from(u32::try_from(seed % 50).unwrap_or(0));
    session.with_ledger_mut(|ledger| -> Result<()> {
        ledger.update_weight(4.0)?;
        ledger.consume_stamina(spent)?;
        ledger.decay_hygiene(100.0)?;
        Ok(())
    })?;
    let slot = format!("seed-{seed}");
    engine.save_session(&slot, &session)?;

    let loaded = engine
        .load_session(&slot)?
        .with_context(|| format!("slot {slot} vanished"))?;
    ensure!(
        loaded.snapshot() == session.snapshot(),
        "snapshot changed across save/load"
    );
    ensure!(loaded.ledger().player().is_immobilized, "collapse lost on load");

    engine.delete_session(&slot)?;
    ensure!(engine.load_session(&slot)?.is_none(), "deleted slot still loads");
    Ok(())
}

fn random_walk(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let summary = run_walk(ctx.config, ctx.seed, WALK_STEPS)?;
    if ctx.verbose {
        println!(
            "     ↳ seed {} transitions {} collapses {} rescues {} coins spent {} final {}",
            summary.seed,
            summary.transitions,
            summary.collapses,
            summary.rescues_applied,
            summary.coins_spent,
            summary.final_state
        );
    }
    Ok(())
}
