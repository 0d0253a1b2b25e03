use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::error::RequestError;
use super::models::request::{AcceptOutcome, CreateOutcome, TeleportRequest};
use super::notice::Notice;
use crate::common::{ActorId, RequestId};
use crate::config::RequestConfig;
use crate::domains::placement::SafePlacementResolver;
use crate::kernel::BaseActors;

/// Cancellable one-shot callback that lapses a request.
struct ExpiryTimer(JoinHandle<()>);

impl ExpiryTimer {
    fn cancel(&self) {
        self.0.abort();
    }
}

struct PendingRequest {
    request: TeleportRequest,
    expiry: ExpiryTimer,
}

/// Both indices point at the same pending entry and are only ever mutated
/// together, under one lock.
#[derive(Default)]
struct RequestIndex {
    outgoing: HashMap<ActorId, Arc<PendingRequest>>,
    incoming: HashMap<ActorId, Arc<PendingRequest>>,
}

impl RequestIndex {
    /// Remove the request from both indices if it is still the one indexed
    /// for its requester. Returns `None` if some other path already did.
    fn take(&mut self, id: RequestId, requester: ActorId) -> Option<Arc<PendingRequest>> {
        if self.outgoing.get(&requester)?.request.id != id {
            return None;
        }
        let pending = self.outgoing.remove(&requester)?;
        self.incoming.remove(&pending.request.target);
        Some(pending)
    }

    fn take_outgoing(&mut self, requester: ActorId) -> Option<Arc<PendingRequest>> {
        let pending = self.outgoing.remove(&requester)?;
        self.incoming.remove(&pending.request.target);
        Some(pending)
    }

    fn take_incoming(&mut self, target: ActorId) -> Option<Arc<PendingRequest>> {
        let pending = self.incoming.remove(&target)?;
        self.outgoing.remove(&pending.request.requester);
        Some(pending)
    }
}

struct CoordinatorInner {
    index: Mutex<RequestIndex>,
    actors: Arc<dyn BaseActors>,
    resolver: SafePlacementResolver,
    timeout: Duration,
    scan_height: u32,
    runtime: Handle,
}

/// Coordinates teleport handshakes between pairs of actors.
///
/// Cheap to clone; clones share the same indices.
#[derive(Clone)]
pub struct TeleportRequestCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl TeleportRequestCoordinator {
    /// Must be called from within a tokio runtime; expiry timers are spawned
    /// onto it.
    pub fn new(
        actors: Arc<dyn BaseActors>,
        resolver: SafePlacementResolver,
        config: &RequestConfig,
    ) -> Result<Self, RequestError> {
        let runtime = Handle::try_current()?;
        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                index: Mutex::new(RequestIndex::default()),
                actors,
                resolver,
                timeout: config.timeout(),
                scan_height: config.safe_scan_height,
                runtime,
            }),
        })
    }

    fn index(&self) -> MutexGuard<'_, RequestIndex> {
        self.inner.index.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, actor: ActorId, notice: Notice) {
        self.inner.actors.notify(actor, notice);
    }

    fn notify_if_online(&self, actor: ActorId, notice: Notice) {
        if self.inner.actors.is_online(actor) {
            self.notify(actor, notice);
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn outgoing(&self, requester: ActorId) -> Option<TeleportRequest> {
        self.index()
            .outgoing
            .get(&requester)
            .map(|pending| pending.request.clone())
    }

    pub fn incoming(&self, target: ActorId) -> Option<TeleportRequest> {
        self.index()
            .incoming
            .get(&target)
            .map(|pending| pending.request.clone())
    }

    pub fn has_outgoing(&self, requester: ActorId) -> bool {
        self.index().outgoing.contains_key(&requester)
    }

    pub fn has_incoming(&self, target: ActorId) -> bool {
        self.index().incoming.contains_key(&target)
    }

    pub fn pending_count(&self) -> usize {
        self.index().outgoing.len()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Open a request from `requester` to `target`.
    ///
    /// Rejected without any state change if the requester already has an
    /// outgoing request or the target already has an incoming one; the
    /// requester is told why. On success only the target is notified.
    pub fn create(&self, requester: ActorId, target: ActorId) -> CreateOutcome {
        if requester == target {
            self.notify(requester, Notice::CannotRequestSelf);
            return CreateOutcome::SelfRequest;
        }

        let mut index = self.index();
        if index.outgoing.contains_key(&requester) {
            drop(index);
            debug!(%requester, "teleport request rejected: requester busy");
            self.notify(requester, Notice::OutgoingAlreadyPending);
            return CreateOutcome::RequesterBusy;
        }
        if index.incoming.contains_key(&target) {
            drop(index);
            debug!(%requester, %target, "teleport request rejected: target busy");
            self.notify(requester, Notice::TargetAlreadyHasRequest { target });
            return CreateOutcome::TargetBusy;
        }

        let request = TeleportRequest::new(requester, target, self.inner.timeout);
        let expiry = self.arm_expiry(request.id, requester);
        let pending = Arc::new(PendingRequest {
            request: request.clone(),
            expiry,
        });
        index.outgoing.insert(requester, Arc::clone(&pending));
        index.incoming.insert(target, pending);
        drop(index);

        info!(request_id = %request.id, %requester, %target, "teleport request created");
        self.notify(
            target,
            Notice::IncomingRequest {
                from: requester,
                expires_in_secs: self.inner.timeout.as_secs(),
            },
        );

        CreateOutcome::Created(request.id)
    }

    fn arm_expiry(&self, id: RequestId, requester: ActorId) -> ExpiryTimer {
        let inner: Weak<CoordinatorInner> = Arc::downgrade(&self.inner);
        let timeout = self.inner.timeout;
        ExpiryTimer(self.inner.runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = inner.upgrade() {
                TeleportRequestCoordinator { inner }.expire(id, requester);
            }
        }))
    }

    /// Timer callback. Only lapses the exact request it was armed for.
    fn expire(&self, id: RequestId, requester: ActorId) {
        let Some(pending) = self.index().take(id, requester) else {
            debug!(request_id = %id, "expiry fired for a request that already ended");
            return;
        };

        let request = &pending.request;
        info!(request_id = %request.id, requester = %request.requester, target = %request.target, "teleport request expired");

        let notice = Notice::RequestExpired {
            requester: request.requester,
            target: request.target,
        };
        self.notify_if_online(request.requester, notice.clone());
        self.notify_if_online(request.target, notice);
    }

    /// Accept a request: move the requester next to the target.
    ///
    /// The request is removed before anything else happens, so it ends here
    /// whether or not the move succeeds.
    pub fn accept(&self, request: &TeleportRequest) -> AcceptOutcome {
        let Some(pending) = self.index().take(request.id, request.requester) else {
            return AcceptOutcome::NotPending;
        };
        pending.expiry.cancel();

        let (id, requester, target) = (
            pending.request.id,
            pending.request.requester,
            pending.request.target,
        );

        if !self.inner.actors.is_online(requester) {
            info!(request_id = %id, %requester, "accepted request whose requester left");
            self.notify(target, Notice::RequesterUnavailable { requester });
            return AcceptOutcome::RequesterUnavailable;
        }

        let Some(destination) = self.inner.actors.location_of(target) else {
            info!(request_id = %id, %target, "accepted request whose target is unreachable");
            self.notify(requester, Notice::TargetUnavailable { target });
            return AcceptOutcome::TargetUnavailable;
        };

        let Some(landing) = self
            .inner
            .resolver
            .find_safe_landing(&destination, self.inner.scan_height)
        else {
            info!(request_id = %id, %target, destination = %destination, "no safe landing near target");
            self.notify(requester, Notice::NoSafeLanding { target });
            return AcceptOutcome::NoSafeLanding;
        };

        if !self.inner.actors.teleport(requester, &landing) {
            info!(request_id = %id, %requester, "host refused teleport");
            self.notify(requester, Notice::TeleportFailed);
            return AcceptOutcome::TeleportRefused;
        }

        info!(request_id = %id, %requester, %target, landing = %landing, "teleport request accepted");
        self.notify(requester, Notice::RequestAccepted { by: target });
        AcceptOutcome::Teleported(landing)
    }

    /// Accept whatever request is waiting for `target`.
    pub fn accept_incoming(&self, target: ActorId) -> AcceptOutcome {
        match self.incoming(target) {
            Some(request) => self.accept(&request),
            None => {
                self.notify(target, Notice::NoPendingRequest);
                AcceptOutcome::NotPending
            }
        }
    }

    /// Decline a request. Returns false if it had already ended.
    pub fn deny(&self, request: &TeleportRequest) -> bool {
        let Some(pending) = self.index().take(request.id, request.requester) else {
            return false;
        };
        pending.expiry.cancel();

        info!(request_id = %pending.request.id, requester = %pending.request.requester, "teleport request denied");
        self.notify_if_online(
            pending.request.requester,
            Notice::RequestDenied {
                by: pending.request.target,
            },
        );
        true
    }

    /// Decline whatever request is waiting for `target`.
    pub fn deny_incoming(&self, target: ActorId) -> bool {
        match self.incoming(target) {
            Some(request) => self.deny(&request),
            None => {
                self.notify(target, Notice::NoPendingRequest);
                false
            }
        }
    }

    /// Drop every request `actor` takes part in, on either side. Called when
    /// the actor disconnects. The other party is told the request is gone.
    ///
    /// Returns how many requests were removed.
    pub fn clear_for(&self, actor: ActorId) -> usize {
        let removed: Vec<Arc<PendingRequest>> = {
            let mut index = self.index();
            index
                .take_outgoing(actor)
                .into_iter()
                .chain(index.take_incoming(actor))
                .collect()
        };

        for pending in &removed {
            pending.expiry.cancel();
            let request = &pending.request;
            let counterpart = if request.requester == actor {
                request.target
            } else {
                request.requester
            };
            debug!(request_id = %request.id, %actor, "teleport request cleared on disconnect");
            self.notify_if_online(counterpart, Notice::RequestCancelled { by: actor });
        }

        removed.len()
    }

    /// Cancel every timer and forget every request. Nobody is notified.
    pub fn shutdown(&self) {
        let mut index = self.index();
        for pending in index.outgoing.values() {
            pending.expiry.cancel();
        }
        let cleared = index.outgoing.len();
        index.outgoing.clear();
        index.incoming.clear();
        drop(index);

        if cleared > 0 {
            info!(cleared, "teleport requests dropped on shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Coordinate;
    use crate::kernel::test_dependencies::{MockActors, MockWorlds};

    struct Fixture {
        actors: Arc<MockActors>,
        coordinator: TeleportRequestCoordinator,
    }

    fn fixture(timeout_secs: u64) -> Fixture {
        let worlds = Arc::new(MockWorlds::new().with_world("world", 320));
        worlds.fill_solid("world", 0, 0, 0..=63);
        let actors = Arc::new(MockActors::new());
        let config = RequestConfig {
            timeout_secs,
            safe_scan_height: 64,
        };
        let coordinator = TeleportRequestCoordinator::new(
            actors.clone(),
            SafePlacementResolver::new(worlds),
            &config,
        )
        .unwrap();
        Fixture {
            actors,
            coordinator,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_does_not_expire_newer_request() {
        let f = fixture(30);
        let (r, t) = (ActorId::new(), ActorId::new());
        f.actors.connect(r, Coordinate::new("world", 5.0, 64.0, 5.0, 0.0, 0.0));
        f.actors.connect(t, Coordinate::new("world", 0.0, 64.0, 0.0, 0.0, 0.0));

        f.coordinator.create(r, t);
        let first = f.coordinator.outgoing(r).unwrap();
        assert!(f.coordinator.deny(&first));

        tokio::time::advance(Duration::from_secs(20)).await;
        f.coordinator.create(r, t);
        let second = f.coordinator.outgoing(r).unwrap();

        // First request's original deadline passes; its timer was cancelled
        // and in any case must not touch the second request.
        f.coordinator.expire(first.id, r);
        tokio::time::advance(Duration::from_secs(15)).await;
        tokio::task::yield_now().await;

        assert_eq!(f.coordinator.outgoing(r), Some(second));
    }

    #[tokio::test]
    async fn index_take_keeps_both_sides_consistent() {
        let f = fixture(60);
        let (a, b, c) = (ActorId::new(), ActorId::new(), ActorId::new());

        assert!(f.coordinator.create(a, b).is_created());
        assert!(f.coordinator.create(b, c).is_created());
        assert_eq!(f.coordinator.pending_count(), 2);

        // b is target of one request and requester of another.
        assert_eq!(f.coordinator.clear_for(b), 2);
        assert!(!f.coordinator.has_outgoing(a));
        assert!(!f.coordinator.has_incoming(c));
        assert_eq!(f.coordinator.pending_count(), 0);
    }

    #[tokio::test]
    async fn shutdown_forgets_everything_silently() {
        let f = fixture(60);
        let (a, b) = (ActorId::new(), ActorId::new());
        f.actors.connect(a, Coordinate::new("world", 0.0, 64.0, 0.0, 0.0, 0.0));
        f.coordinator.create(a, b);
        let before = f.actors.notices_for(a).len();

        f.coordinator.shutdown();

        assert!(!f.coordinator.has_outgoing(a));
        assert!(!f.coordinator.has_incoming(b));
        assert_eq!(f.actors.notices_for(a).len(), before);
    }
}
