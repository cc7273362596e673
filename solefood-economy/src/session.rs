use serde::{Deserialize, Serialize};

use crate::config::EconomyConfig;
use crate::error::EconomyError;
use crate::ledger::{LedgerSnapshot, ResourceLedger};
use crate::rescue::{AdOutcome, RescueGateway, RescueKind, RescueResolution, RescueTicket, RescueUsage};

/// Persisted form of a session. Pending rescue tickets are not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub ledger: LedgerSnapshot,
    #[serde(default)]
    pub rescue_usage: RescueUsage,
}

/// High-level session wrapper binding the rescue gateway to one player ledger.
#[derive(Debug, Clone)]
pub struct EconomySession {
    ledger: ResourceLedger,
    gateway: RescueGateway,
}

impl EconomySession {
    /// Fresh session with full resources and unused rescue caps.
    #[must_use]
    pub fn new(config: EconomyConfig) -> Self {
        let gateway = RescueGateway::new(config.rescue.clone());
        Self {
            ledger: ResourceLedger::new(config),
            gateway,
        }
    }

    /// Rebuild a session from a snapshot.
    #[must_use]
    pub fn from_snapshot(config: EconomyConfig, snapshot: SessionSnapshot) -> Self {
        let gateway = RescueGateway::with_usage(config.rescue.clone(), snapshot.rescue_usage);
        Self {
            ledger: ResourceLedger::from_snapshot(config, snapshot.ledger),
            gateway,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            ledger: self.ledger.snapshot(),
            rescue_usage: self.gateway.usage().clone(),
        }
    }

    #[must_use]
    pub fn into_snapshot(self) -> SessionSnapshot {
        self.snapshot()
    }

    #[must_use]
    pub const fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub const fn ledger_mut(&mut self) -> &mut ResourceLedger {
        &mut self.ledger
    }

    #[must_use]
    pub const fn gateway(&self) -> &RescueGateway {
        &self.gateway
    }

    /// Run a closure with mutable access to the ledger.
    pub fn with_ledger_mut<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut ResourceLedger) -> R,
    {
        f(&mut self.ledger)
    }

    /// # Errors
    ///
    /// See [`RescueGateway::request_rescue`].
    pub fn request_rescue(&mut self, kind: RescueKind) -> Result<RescueTicket, EconomyError> {
        self.gateway.request_rescue(kind, &self.ledger)
    }

    /// # Errors
    ///
    /// See [`RescueGateway::resolve_rescue`].
    pub fn resolve_rescue(
        &mut self,
        token: u64,
        outcome: AdOutcome,
    ) -> Result<RescueResolution, EconomyError> {
        self.gateway.resolve_rescue(token, outcome, &mut self.ledger)
    }

    pub fn reset_daily(&mut self) {
        self.gateway.reset_daily();
    }
}
