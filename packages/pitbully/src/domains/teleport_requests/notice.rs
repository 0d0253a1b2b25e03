use crate::common::ActorId;

/// User-visible messages emitted by the request coordinator.
///
/// The host turns these into chat text; the core never formats prose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Sent to a requester who already has a request pending
    OutgoingAlreadyPending,
    /// Sent to a requester whose target is already being asked by someone else
    TargetAlreadyHasRequest { target: ActorId },
    /// Sent to an actor who tried to request themselves
    CannotRequestSelf,
    /// Sent to an actor who tried to answer a request that does not exist
    NoPendingRequest,
    /// Sent to the target when a request arrives
    IncomingRequest { from: ActorId, expires_in_secs: u64 },
    /// Sent to the requester once the target accepted and they were moved
    RequestAccepted { by: ActorId },
    /// Sent to the requester when the target declined
    RequestDenied { by: ActorId },
    /// Sent to both parties when nobody answered in time
    RequestExpired { requester: ActorId, target: ActorId },
    /// Sent to the remaining party when the other one disconnected
    RequestCancelled { by: ActorId },
    /// Sent to the requester when the target's position cannot be read
    TargetUnavailable { target: ActorId },
    /// Sent to the target when the requester is gone by the time they accept
    RequesterUnavailable { requester: ActorId },
    /// Sent to the requester when nowhere safe exists near the target
    NoSafeLanding { target: ActorId },
    /// Sent to the requester when the host refused to move them
    TeleportFailed,
}
