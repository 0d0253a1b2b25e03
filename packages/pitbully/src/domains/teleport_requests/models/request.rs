use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::common::{ActorId, Coordinate, RequestId};

/// Snapshot of a pending teleport handshake.
///
/// The requester asks to be moved to the target; the target answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeleportRequest {
    pub id: RequestId,
    pub requester: ActorId,
    pub target: ActorId,
    pub created_at: DateTime<Utc>,
    pub timeout: Duration,
}

impl TeleportRequest {
    pub fn new(requester: ActorId, target: ActorId, timeout: Duration) -> Self {
        Self {
            id: RequestId::new(),
            requester,
            target,
            created_at: Utc::now(),
            timeout,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        let timeout = chrono::Duration::from_std(self.timeout).unwrap_or(chrono::Duration::MAX);
        self.created_at
            .checked_add_signed(timeout)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether `actor` takes part in this request on either side
    pub fn involves(&self, actor: ActorId) -> bool {
        self.requester == actor || self.target == actor
    }
}

/// Result of `create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(RequestId),
    /// The requester already has an outgoing request
    RequesterBusy,
    /// The target already has an incoming request
    TargetBusy,
    SelfRequest,
}

impl CreateOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

/// Result of `accept`. Every variant except `NotPending` is terminal for the
/// request; nothing is retried.
#[derive(Debug, Clone, PartialEq)]
pub enum AcceptOutcome {
    /// The requester was moved to this landing coordinate
    Teleported(Coordinate),
    RequesterUnavailable,
    TargetUnavailable,
    NoSafeLanding,
    /// The host refused the move
    TeleportRefused,
    /// Already accepted, denied, expired or cleared
    NotPending,
}
