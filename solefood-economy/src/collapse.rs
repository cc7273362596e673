//! Vital state machine: Active, Impaired, Collapsed, Ghost.
//!
//! Collapsed and Ghost are sticky. `reevaluate` may enter or escalate them
//! but never leaves them; only [`CollapseStateMachine::recover`] does, and
//! the ledger calls it exclusively from recovery paths.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::WarningThresholds;
use crate::constants::{
    LOG_COLLAPSE_DURABILITY, LOG_COLLAPSE_GHOST, LOG_COLLAPSE_HYGIENE, LOG_STATE_ACTIVE,
    LOG_STATE_IMPAIRED,
};
use crate::ledger::PlayerState;

/// Zero-tolerance resource that caused a non-ghost collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollapseCause {
    Durability,
    Hygiene,
}

impl CollapseCause {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Durability => "durability",
            Self::Hygiene => "hygiene",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", tag = "state", content = "cause")]
pub enum VitalState {
    #[default]
    Active,
    /// Stamina or hygiene is below its warning threshold.
    Impaired,
    Collapsed(CollapseCause),
    /// Stamina exhaustion.
    Ghost,
}

impl VitalState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Impaired => "impaired",
            Self::Collapsed(_) => "collapsed",
            Self::Ghost => "ghost",
        }
    }

    /// True for Collapsed and Ghost, the states that block player actions.
    #[must_use]
    pub const fn is_collapsed(self) -> bool {
        matches!(self, Self::Collapsed(_) | Self::Ghost)
    }

    /// Log key recorded when the machine enters this state.
    #[must_use]
    pub const fn log_key(self) -> &'static str {
        match self {
            Self::Active => LOG_STATE_ACTIVE,
            Self::Impaired => LOG_STATE_IMPAIRED,
            Self::Collapsed(CollapseCause::Durability) => LOG_COLLAPSE_DURABILITY,
            Self::Collapsed(CollapseCause::Hygiene) => LOG_COLLAPSE_HYGIENE,
            Self::Ghost => LOG_COLLAPSE_GHOST,
        }
    }
}

impl fmt::Display for VitalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state change emitted by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: VitalState,
    pub to: VitalState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollapseStateMachine {
    state: VitalState,
    warnings: WarningThresholds,
}

impl CollapseStateMachine {
    #[must_use]
    pub const fn new(warnings: WarningThresholds) -> Self {
        Self {
            state: VitalState::Active,
            warnings,
        }
    }

    #[must_use]
    pub const fn state(&self) -> VitalState {
        self.state
    }

    /// State implied by resource values alone, ignoring stickiness.
    #[must_use]
    pub fn classify(&self, player: &PlayerState) -> VitalState {
        if player.stamina <= 0.0 {
            VitalState::Ghost
        } else if player.durability <= 0.0 {
            VitalState::Collapsed(CollapseCause::Durability)
        } else if player.hygiene <= 0.0 {
            VitalState::Collapsed(CollapseCause::Hygiene)
        } else if player.stamina < player.max_stamina * self.warnings.stamina_ratio
            || player.hygiene < player.max_hygiene * self.warnings.hygiene_ratio
        {
            VitalState::Impaired
        } else {
            VitalState::Active
        }
    }

    /// Re-derive the state after a mutation and sync the player flags.
    pub fn reevaluate(&mut self, player: &mut PlayerState) -> Option<Transition> {
        let candidate = self.classify(player);
        let next = match (self.state, candidate) {
            (VitalState::Ghost, _) => VitalState::Ghost,
            (VitalState::Collapsed(_), VitalState::Ghost) => VitalState::Ghost,
            (VitalState::Collapsed(cause), _) => VitalState::Collapsed(cause),
            (_, candidate) => candidate,
        };
        self.commit(player, next)
    }

    /// Leave Collapsed/Ghost. Refuses while any zero-tolerance resource is
    /// still at zero, leaving state and flags untouched.
    pub fn recover(&mut self, player: &mut PlayerState) -> Option<Transition> {
        let candidate = self.classify(player);
        if candidate.is_collapsed() {
            return None;
        }
        self.commit(player, candidate)
    }

    /// Whether `recover` would succeed for the given resource values.
    #[must_use]
    pub fn can_recover(&self, player: &PlayerState) -> bool {
        !self.classify(player).is_collapsed()
    }

    pub fn reset(&mut self, player: &mut PlayerState) {
        self.state = VitalState::Active;
        apply_flags(player, self.state);
    }

    /// Reinstate a persisted state without running transition rules.
    pub(crate) fn restore(&mut self, state: VitalState, player: &mut PlayerState) {
        self.state = state;
        apply_flags(player, state);
    }

    fn commit(&mut self, player: &mut PlayerState, next: VitalState) -> Option<Transition> {
        apply_flags(player, next);
        if next == self.state {
            return None;
        }
        let transition = Transition {
            from: self.state,
            to: next,
        };
        self.state = next;
        log::info!("vital state {} -> {}", transition.from, transition.to);
        Some(transition)
    }
}

fn apply_flags(player: &mut PlayerState, state: VitalState) {
    player.is_ghost = matches!(state, VitalState::Ghost);
    player.is_immobilized = state.is_collapsed();
}
