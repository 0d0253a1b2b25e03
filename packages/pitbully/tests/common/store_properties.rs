//! Behaviour every `LocationStore` backend must share.
//!
//! Each check uses fresh actor ids and warp names so it can run against a
//! database shared with other tests.

#![allow(dead_code)]

use pitbully_core::common::ActorId;
use pitbully_core::domains::locations::{LocationKind, LocationStore, PlayerLocations};
use uuid::Uuid;

use super::fixtures::{coord, facing};

pub async fn unknown_actor_reads_absent(store: &dyn LocationStore) {
    let actor = ActorId::new();

    assert_eq!(store.get_home(actor).await.unwrap(), None);
    assert_eq!(store.get_death(actor).await.unwrap(), None);
    assert_eq!(store.get_teleport(actor).await.unwrap(), None);
    assert_eq!(store.get_last(actor).await.unwrap(), None);
    assert!(!store.has_home(actor).await.unwrap());
    assert!(store.get_keep_xp(actor).await.unwrap());
    assert_eq!(store.get_player_data(actor).await.unwrap(), None);
}

pub async fn warp_round_trip(store: &dyn LocationStore) {
    let name = format!("market-{}", Uuid::new_v4().simple());
    let location = facing("world", 12.5, 70.0, -8.25, 180.0, -15.5);

    store.save_warp(&name, &location).await.unwrap();
    assert_eq!(store.get_warp(&name).await.unwrap(), Some(location.clone()));
    assert!(store.has_warp(&name).await.unwrap());
    assert_eq!(store.get_all_warps().await.unwrap().get(&name), Some(&location));

    let moved = coord("nether", 1.0, 2.0, 3.0);
    store.save_warp(&name, &moved).await.unwrap();
    assert_eq!(store.get_warp(&name).await.unwrap(), Some(moved));

    assert!(store.delete_warp(&name).await.unwrap());
    assert!(!store.has_warp(&name).await.unwrap());
    assert!(!store.delete_warp(&name).await.unwrap());
}

pub async fn warp_names_are_case_sensitive(store: &dyn LocationStore) {
    let suffix = Uuid::new_v4().simple().to_string();
    let lower = format!("shop-{suffix}");
    let upper = format!("SHOP-{suffix}");

    store.save_warp(&lower, &coord("world", 1.0, 64.0, 1.0)).await.unwrap();
    store.save_warp(&upper, &coord("world", 2.0, 64.0, 2.0)).await.unwrap();

    assert_eq!(store.get_warp(&lower).await.unwrap().unwrap().x, 1.0);
    assert_eq!(store.get_warp(&upper).await.unwrap().unwrap().x, 2.0);
}

pub async fn death_and_teleport_write_through_to_last(store: &dyn LocationStore) {
    let actor = ActorId::new();
    let died_at = coord("world", 100.0, 12.0, -40.0);
    let left_from = facing("world_nether", -3.0, 80.0, 9.0, 90.0, 0.0);

    store.save_death(actor, &died_at).await.unwrap();
    assert_eq!(store.get_last(actor).await.unwrap(), Some(died_at.clone()));

    store.save_teleport(actor, &left_from).await.unwrap();
    assert_eq!(store.get_last(actor).await.unwrap(), Some(left_from.clone()));
    assert_eq!(store.get_death(actor).await.unwrap(), Some(died_at));
    assert_eq!(store.get_teleport(actor).await.unwrap(), Some(left_from));

    assert!(store
        .get_all_lasts()
        .await
        .unwrap()
        .contains_key(&actor));
}

pub async fn home_set_get_delete(store: &dyn LocationStore) {
    let actor = ActorId::new();
    let home = coord("world1", 10.0, 64.0, 10.0);

    assert!(!store.has_home(actor).await.unwrap());
    store.save_home(actor, &home).await.unwrap();
    assert_eq!(store.get_home(actor).await.unwrap(), Some(home));
    assert!(store.has_home(actor).await.unwrap());

    // Setting a home leaves the back location alone.
    assert_eq!(store.get_last(actor).await.unwrap(), None);

    assert!(store.delete_home(actor).await.unwrap());
    assert!(!store.has_home(actor).await.unwrap());
    assert!(!store.delete_home(actor).await.unwrap());
}

pub async fn keep_xp_defaults_then_persists(store: &dyn LocationStore) {
    let actor = ActorId::new();
    assert!(store.get_keep_xp(actor).await.unwrap());

    store.set_keep_xp(actor, false).await.unwrap();
    assert!(!store.get_keep_xp(actor).await.unwrap());

    store.set_keep_xp(actor, true).await.unwrap();
    assert!(store.get_keep_xp(actor).await.unwrap());
}

pub async fn player_data_replaces_whole_record(store: &dyn LocationStore) {
    let actor = ActorId::new();
    store
        .save_death(actor, &coord("world", 1.0, 1.0, 1.0))
        .await
        .unwrap();

    let mut data = PlayerLocations::default();
    data.set(LocationKind::Home, Some(coord("world", 5.0, 65.0, 5.0)));
    data.set(LocationKind::Teleport, Some(coord("end", 0.0, 50.0, 0.0)));
    data.keep_xp = false;

    store.save_player_data(actor, &data).await.unwrap();

    // Death and last were removed; teleport did not write through.
    assert_eq!(store.get_player_data(actor).await.unwrap(), Some(data));
    assert_eq!(store.get_death(actor).await.unwrap(), None);
    assert_eq!(store.get_last(actor).await.unwrap(), None);
    assert!(store.get_all_player_data().await.unwrap().contains_key(&actor));
}

pub async fn world_spawn_is_single(store: &dyn LocationStore) {
    assert_eq!(store.get_world_spawn().await.unwrap(), None);

    let first = coord("world", 0.0, 70.0, 0.0);
    store.save_world_spawn(&first).await.unwrap();
    assert_eq!(store.get_world_spawn().await.unwrap(), Some(first));

    let second = facing("lobby", 8.5, 100.0, 8.5, 45.0, 0.0);
    store.save_world_spawn(&second).await.unwrap();
    assert_eq!(store.get_world_spawn().await.unwrap(), Some(second));
}
