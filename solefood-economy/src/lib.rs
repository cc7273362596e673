//! Solefood Economy Engine
//!
//! Platform-agnostic player resource economy for the Solefood foraging game:
//! the resource ledger, pricing, the collapse state machine, and ad-gated
//! rescues. No UI, GPS or ad-network dependencies live here.

pub mod collapse;
pub mod config;
pub mod constants;
pub mod economy;
pub mod error;
pub mod ledger;
pub mod numbers;
pub mod rescue;
pub mod session;

// Re-export commonly used types
pub use collapse::{CollapseCause, CollapseStateMachine, Transition, VitalState};
pub use config::{
    EconomyConfig, ExpansionCfg, ExpansionTier, MaintenanceCfg, RecoveryCfg, RescueCfg,
    ResourceLimits, UnloadCfg, WarningThresholds,
};
pub use economy::{CapacityEconomy, ExpansionQuote, WearTier, unload_cost};
pub use error::{ConfigError, EconomyError};
pub use ledger::{ExpansionOutcome, LedgerSnapshot, PlayerState, ResourceLedger, UnloadReceipt};
pub use rescue::{
    AdOutcome, RescueEffect, RescueGateway, RescueKind, RescueResolution, RescueTicket,
    RescueUsage,
};
pub use session::{EconomySession, SessionSnapshot};

/// Trait for abstracting where economy tuning comes from.
/// Platform-specific implementations should provide this
pub trait ConfigLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the economy configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read, parsed or validated.
    fn load_config(&self) -> Result<EconomyConfig, Self::Error>;
}

/// Trait for abstracting save/load operations
/// Platform-specific implementations should provide this
pub trait SessionStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    fn save_session(&self, slot: &str, snapshot: &SessionSnapshot) -> Result<(), Self::Error>;

    /// Load a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    fn load_session(&self, slot: &str) -> Result<Option<SessionSnapshot>, Self::Error>;

    /// Delete a saved session
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_session(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Main engine for creating and persisting economy sessions
pub struct EconomyEngine<L, S>
where
    L: ConfigLoader,
    S: SessionStorage,
{
    config_loader: L,
    storage: S,
}

impl<L, S> EconomyEngine<L, S>
where
    L: ConfigLoader,
    S: SessionStorage,
{
    /// Create a new engine with the provided config loader and storage
    pub const fn new(config_loader: L, storage: S) -> Self {
        Self {
            config_loader,
            storage,
        }
    }

    /// Start a fresh session from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn create_session(&self) -> Result<EconomySession, L::Error> {
        let config = self.config_loader.load_config()?;
        Ok(EconomySession::new(config))
    }

    /// Save a session
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub fn save_session(&self, slot: &str, session: &EconomySession) -> Result<(), S::Error> {
        self.storage.save_session(slot, &session.snapshot())
    }

    /// Load a session, rebuilt against the current configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot or the configuration cannot be loaded.
    pub fn load_session(&self, slot: &str) -> Result<Option<EconomySession>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        let Some(snapshot) = self.storage.load_session(slot).map_err(Into::into)? else {
            return Ok(None);
        };
        let config = self.config_loader.load_config().map_err(Into::into)?;
        Ok(Some(EconomySession::from_snapshot(config, snapshot)))
    }

    /// Delete a saved session
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_session(&self, slot: &str) -> Result<(), S::Error> {
        self.storage.delete_session(slot)
    }
}
