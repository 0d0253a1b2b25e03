//! End-to-end tests through the assembled core: host events in, location
//! records and request state out.

mod common;

use crate::common::{actors, coord, facing, StoreHarness};
use pitbully_core::config::{Config, StorageBackend, StorageConfig};
use pitbully_core::domains::teleport_requests::{AcceptOutcome, Notice};
use pitbully_core::kernel::{LifecycleEvent, MockActors, MockWorlds, Pitbully};
use std::sync::Arc;
use test_context::test_context;

struct Server {
    pitbully: Pitbully,
    worlds: Arc<MockWorlds>,
    actors: Arc<MockActors>,
}

async fn start(ctx: &StoreHarness) -> Server {
    let config = Config {
        storage: StorageConfig {
            backend: StorageBackend::File,
            data_file: ctx.yaml_path(),
            ..StorageConfig::default()
        },
        ..Config::default()
    };
    let worlds = Arc::new(
        MockWorlds::new()
            .with_world("world", 320)
            .with_world("world1", 320),
    );
    worlds.fill_solid("world", 0, 0, 0..=63);
    let actors = Arc::new(MockActors::new());

    let pitbully = Pitbully::start(&config, worlds.clone(), actors.clone())
        .await
        .expect("Failed to start pitbully");
    Server {
        pitbully,
        worlds,
        actors,
    }
}

#[test_context(StoreHarness)]
#[tokio::test]
async fn death_then_teleport_moves_back_location(ctx: &StoreHarness) {
    let server = start(ctx).await;
    let [actor] = actors();
    let died_at = coord("world", 12.0, 30.0, -4.0);
    let left_from = coord("world", 100.0, 70.0, 100.0);

    assert_eq!(server.pitbully.locations.back_location(actor).await, None);

    server
        .pitbully
        .handle_event(LifecycleEvent::Died {
            actor,
            at: died_at.clone(),
        })
        .await;
    assert_eq!(
        server.pitbully.locations.back_location(actor).await,
        Some(died_at.clone())
    );

    server
        .pitbully
        .handle_event(LifecycleEvent::Teleported {
            actor,
            from: left_from.clone(),
        })
        .await;
    assert_eq!(
        server.pitbully.locations.back_location(actor).await,
        Some(left_from)
    );
    assert_eq!(
        server.pitbully.locations.last_death(actor).await,
        Some(died_at)
    );
}

#[test_context(StoreHarness)]
#[tokio::test]
async fn home_is_absent_until_set(ctx: &StoreHarness) {
    let server = start(ctx).await;
    let [actor] = actors();
    let home = facing("world1", 10.0, 64.0, 10.0, 0.0, 0.0);

    assert_eq!(server.pitbully.locations.home(actor).await, None);

    server.pitbully.locations.set_home(actor, &home).await;
    assert_eq!(server.pitbully.locations.home(actor).await, Some(home));
}

#[test_context(StoreHarness)]
#[tokio::test]
async fn disconnect_clears_pending_requests(ctx: &StoreHarness) {
    let server = start(ctx).await;
    let [requester, target] = actors();
    server
        .actors
        .connect(requester, coord("world", 5.0, 64.0, 5.0));

    assert!(server.pitbully.requests.create(requester, target).is_created());
    server
        .pitbully
        .handle_event(LifecycleEvent::Disconnected { actor: target })
        .await;

    assert!(!server.pitbully.requests.has_outgoing(requester));
    assert_eq!(
        server.actors.notices_for(requester),
        vec![Notice::RequestCancelled { by: target }]
    );
}

#[test_context(StoreHarness)]
#[tokio::test]
async fn accepted_request_lands_next_to_target(ctx: &StoreHarness) {
    let server = start(ctx).await;
    let [requester, target] = actors();
    server
        .actors
        .connect(requester, coord("world", 50.0, 64.0, 50.0));
    server
        .actors
        .connect(target, facing("world", 0.5, 64.0, 0.5, 90.0, 0.0));

    server.pitbully.requests.create(requester, target);
    let outcome = server.pitbully.requests.accept_incoming(target);

    assert_eq!(
        outcome,
        AcceptOutcome::Teleported(facing("world", 0.5, 64.0, 0.5, 90.0, 0.0))
    );
    assert_eq!(server.actors.teleports().len(), 1);
}

#[test_context(StoreHarness)]
#[tokio::test]
async fn shutdown_flushes_records_to_disk(ctx: &StoreHarness) {
    let server = start(ctx).await;
    let [actor] = actors();

    server
        .pitbully
        .locations
        .set_warp("Market", &coord("world", 1.0, 65.0, 1.0))
        .await;
    server
        .pitbully
        .locations
        .set_home(actor, &coord("world1", 10.0, 64.0, 10.0))
        .await;
    assert!(
        server
            .pitbully
            .locations
            .set_world_spawn(&coord("world", 0.0, 70.0, 0.0))
            .await
    );
    assert_eq!(server.worlds.spawns(), vec![coord("world", 0.0, 70.0, 0.0)]);
    server.pitbully.shutdown().await;

    let restarted = start(ctx).await;
    assert_eq!(
        restarted.pitbully.locations.warp("Market").await,
        Some(coord("world", 1.0, 65.0, 1.0))
    );
    assert_eq!(restarted.pitbully.locations.warp("market").await, None);
    assert_eq!(
        restarted.pitbully.locations.home(actor).await,
        Some(coord("world1", 10.0, 64.0, 10.0))
    );
    assert_eq!(
        restarted.pitbully.locations.world_spawn().await,
        Some(coord("world", 0.0, 70.0, 0.0))
    );
    assert!(restarted.pitbully.locations.keep_xp(actor).await);
}
