use std::sync::Arc;

use super::{Config, regent::Regent};
use crate::{
    events::Bus,
    ops::{ShellVerifier, Verifier, VersionControl},
    state::StateStore,
};

/// Builder for constructing a [`Regent`] with optional collaborators.
pub struct RegentBuilder {
    cfg: Config,
    vcs: Arc<dyn VersionControl>,
    verifier: Arc<dyn Verifier>,
    bus: Bus,
    store: Option<StateStore>,
}

impl RegentBuilder {
    /// Creates a new builder with the given configuration and version control.
    pub fn new(cfg: Config, vcs: Arc<dyn VersionControl>) -> Self {
        Self {
            cfg,
            vcs,
            verifier: Arc::new(ShellVerifier),
            bus: Bus::disabled(),
            store: None,
        }
    }

    /// Sets the event bus status events are published to.
    ///
    /// Without one, events are discarded.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = bus;
        self
    }

    /// Replaces the default [`ShellVerifier`].
    pub fn with_verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Overrides where the state file is written (default: [`Config::state_path`]).
    pub fn with_state_store(mut self, store: StateStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Regent {
        let store = self
            .store
            .unwrap_or_else(|| StateStore::new(self.cfg.state_path()));
        Regent::new_internal(self.cfg, self.bus, store, self.vcs, self.verifier)
    }
}
