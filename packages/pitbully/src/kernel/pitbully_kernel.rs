// Pitbully - the assembled core handed to the command and listener layers
//
// Built once at startup by PitbullyBuilder. Construction order is the
// "initialize before use" contract: there is no way to obtain a Pitbully
// without a store and host services.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{BaseActors, BaseWorlds};
use crate::common::{ActorId, Coordinate};
use crate::config::{Config, RequestConfig};
use crate::domains::locations::{open_store, LocationError, LocationFacade, LocationStore};
use crate::domains::placement::SafePlacementResolver;
use crate::domains::teleport_requests::{RequestError, TeleportRequestCoordinator};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("configuration error: {0} was never supplied")]
    Missing(&'static str),

    #[error(transparent)]
    Requests(#[from] RequestError),

    #[error("failed to open location store: {0}")]
    Store(#[from] LocationError),
}

/// Host events the core reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// `from` is where the actor stood before the teleport
    Teleported { actor: ActorId, from: Coordinate },
    Died { actor: ActorId, at: Coordinate },
    Disconnected { actor: ActorId },
}

pub struct Pitbully {
    pub locations: LocationFacade,
    pub requests: TeleportRequestCoordinator,
    pub resolver: SafePlacementResolver,
    autosave: Mutex<Option<JoinHandle<()>>>,
}

impl Pitbully {
    pub fn builder() -> PitbullyBuilder {
        PitbullyBuilder::default()
    }

    /// Open the configured store, load it and assemble the core.
    pub async fn start(
        config: &Config,
        worlds: Arc<dyn BaseWorlds>,
        actors: Arc<dyn BaseActors>,
    ) -> Result<Self, BuildError> {
        let store = open_store(&config.storage).await?;
        Self::builder()
            .config(config)
            .store(store)
            .worlds(worlds)
            .actors(actors)
            .build()
    }

    /// Route a host event to the location records or the request index.
    pub async fn handle_event(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Teleported { actor, from } => {
                self.locations.record_teleport(actor, &from).await;
            }
            LifecycleEvent::Died { actor, at } => {
                self.locations.record_death(actor, &at).await;
            }
            LifecycleEvent::Disconnected { actor } => {
                let cleared = self.requests.clear_for(actor);
                if cleared > 0 {
                    debug!(%actor, cleared, "cleared teleport requests on disconnect");
                }
            }
        }
    }

    pub fn autosave_running(&self) -> bool {
        self.autosave
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Stop autosave, drop pending requests, flush and close the store.
    pub async fn shutdown(&self) {
        if let Some(task) = self
            .autosave
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
        self.requests.shutdown();
        self.locations.close().await;
        info!("pitbully shut down");
    }
}

/// Collects the pieces of a `Pitbully`. `build` fails if any is missing.
#[derive(Default)]
pub struct PitbullyBuilder {
    store: Option<Arc<dyn LocationStore>>,
    worlds: Option<Arc<dyn BaseWorlds>>,
    actors: Option<Arc<dyn BaseActors>>,
    requests: RequestConfig,
    autosave: Option<Duration>,
}

impl PitbullyBuilder {
    /// Take request settings and the autosave interval from `config`.
    pub fn config(mut self, config: &Config) -> Self {
        self.requests = config.requests.clone();
        self.autosave = config.autosave_interval();
        self
    }

    pub fn store(mut self, store: Arc<dyn LocationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn worlds(mut self, worlds: Arc<dyn BaseWorlds>) -> Self {
        self.worlds = Some(worlds);
        self
    }

    pub fn actors(mut self, actors: Arc<dyn BaseActors>) -> Self {
        self.actors = Some(actors);
        self
    }

    pub fn requests(mut self, requests: RequestConfig) -> Self {
        self.requests = requests;
        self
    }

    /// A zero interval disables autosave, like `None`.
    pub fn autosave(mut self, every: Option<Duration>) -> Self {
        self.autosave = every.filter(|d| !d.is_zero());
        self
    }

    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Pitbully, BuildError> {
        let store = self.store.ok_or(BuildError::Missing("location store"))?;
        let worlds = self.worlds.ok_or(BuildError::Missing("worlds"))?;
        let actors = self.actors.ok_or(BuildError::Missing("actors"))?;

        let resolver = SafePlacementResolver::new(worlds.clone());
        let requests = TeleportRequestCoordinator::new(actors, resolver.clone(), &self.requests)?;
        let autosave = self
            .autosave
            .map(|every| spawn_autosave(store.clone(), every));

        info!(
            backend = %store.backend(),
            request_timeout_secs = self.requests.timeout_secs,
            autosave_secs = self.autosave.map(|d| d.as_secs()),
            "pitbully ready"
        );

        Ok(Pitbully {
            locations: LocationFacade::new(store, worlds),
            requests,
            resolver,
            autosave: Mutex::new(autosave),
        })
    }
}

fn spawn_autosave(store: Arc<dyn LocationStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.save_all().await {
                Ok(()) => debug!(backend = %store.backend(), "autosave complete"),
                Err(error) => warn!(backend = %store.backend(), %error, "autosave failed"),
            }
        }
    })
}
