//! End-to-end tests for a cleaning session driven through the event bus.
//!
//! Each test wires a plugin to a scripted client, a manual clock and a
//! notification log, then posts host events the way a game client would.

use chrono::{DateTime, Duration, TimeZone, Utc};
use specimen_tracker::{
    ActorPosition, ContainerId, EventBus, GameState, GameTick, HostEvent, ItemContainerChanged,
    ItemId, ItemStack, ManualClock, Notification, NotificationLog, ScriptedClient, SessionConfig,
    SessionState, SpecimenCleaningPlugin,
};

// =============================================================================
// Test Helpers
// =============================================================================

/// A tile inside the museum cleaning area.
const IN_AREA: (i32, i32) = (3260, 3444);

/// The museum basement, outside the cleaning benches.
const OUTSIDE_AREA: (i32, i32) = (3255, 3450);

struct Host {
    client: ScriptedClient,
    clock: ManualClock,
    log: NotificationLog,
    bus: EventBus,
    plugin: SpecimenCleaningPlugin,
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
}

fn host(config: SessionConfig) -> Host {
    let client = ScriptedClient::new();
    client.set_game_state(GameState::LoggedIn);
    client.set_position(Some(ActorPosition::from_world(IN_AREA.0, IN_AREA.1)));

    let clock = ManualClock::new(t0());
    let log = NotificationLog::new();
    let mut bus = EventBus::new();
    let mut plugin =
        SpecimenCleaningPlugin::new(client.clone(), clock.clone(), log.clone(), config);
    plugin.start(&mut bus);

    Host {
        client,
        clock,
        log,
        bus,
        plugin,
    }
}

impl Host {
    fn inventory(&mut self, items: &[(ItemId, u32)]) {
        self.bus
            .post(&HostEvent::ItemContainerChanged(ItemContainerChanged {
                container_id: ContainerId::INVENTORY,
                items: items
                    .iter()
                    .map(|&(id, quantity)| ItemStack::new(id, quantity))
                    .collect(),
            }));
    }

    fn tick(&mut self) {
        self.bus.post(&HostEvent::GameTick(GameTick));
    }

    fn move_to(&self, (x, y): (i32, i32)) {
        self.client
            .set_position(Some(ActorPosition::from_world(x, y)));
    }
}

fn config(timeout_minutes: u32, never_reset_lamps: bool) -> SessionConfig {
    SessionConfig {
        timeout_minutes,
        show_notifications: true,
        never_reset_lamps,
    }
}

// =============================================================================
// Counting
// =============================================================================

#[test]
fn first_snapshot_never_counts() {
    let mut h = host(SessionConfig::default());
    h.inventory(&[(ItemId::UNCLEANED_FIND, 20), (ItemId::POTTERY, 3)]);

    let stats = h.plugin.stats();
    assert_eq!(stats.uncleaned_find_count, 0);
    assert_eq!(stats.artefact_count, 0);
    assert_eq!(stats.state, SessionState::Idle);
}

#[test]
fn gains_are_counted_per_unit() {
    let mut h = host(SessionConfig::default());
    h.inventory(&[(ItemId::UNCLEANED_FIND, 2)]);
    h.inventory(&[(ItemId::UNCLEANED_FIND, 5)]);

    assert_eq!(h.plugin.stats().uncleaned_find_count, 3);
}

#[test]
fn losses_are_not_counted() {
    let mut h = host(SessionConfig::default());
    h.inventory(&[(ItemId::UNCLEANED_FIND, 5)]);
    h.inventory(&[(ItemId::UNCLEANED_FIND, 2)]);

    let stats = h.plugin.stats();
    assert_eq!(stats.uncleaned_find_count, 0);
    assert_eq!(stats.last_action_time, None);
}

#[test]
fn cleaning_a_find_into_a_lamp() {
    let mut h = host(SessionConfig::default());
    h.inventory(&[(ItemId::UNCLEANED_FIND, 4)]);

    let lamp = ItemId::ANTIQUE_LAMP_11187;
    h.clock.advance(Duration::seconds(3));
    h.inventory(&[(ItemId::UNCLEANED_FIND, 5), (lamp, 1)]);

    let stats = h.plugin.stats();
    assert_eq!(stats.uncleaned_find_count, 1);
    assert_eq!(stats.antique_lamp_count, 1);
    assert_eq!(stats.last_action_time, Some(t0() + Duration::seconds(3)));
    assert_eq!(h.log.entries(), vec![Notification::AntiqueLampFound]);
}

#[test]
fn untracked_items_do_not_stamp_activity() {
    let mut h = host(SessionConfig::default());
    h.inventory(&[]);
    h.inventory(&[(ItemId(995), 1000)]);

    assert_eq!(h.plugin.stats().state, SessionState::Idle);
}

// =============================================================================
// Zone gating
// =============================================================================

#[test]
fn out_of_zone_sequences_never_count() {
    let mut h = host(SessionConfig::default());
    h.move_to(OUTSIDE_AREA);

    for n in 0..5 {
        h.inventory(&[(ItemId::ARROWHEADS, n), (ItemId::UNCLEANED_FIND, n * 2)]);
    }

    let stats = h.plugin.stats();
    assert_eq!(stats.artefact_count, 0);
    assert_eq!(stats.uncleaned_find_count, 0);
    assert!(!h.plugin.is_player_in_area());
}

#[test]
fn loading_keeps_tracking_but_hopping_does_not() {
    let mut h = host(SessionConfig::default());
    h.inventory(&[]);

    h.client.set_game_state(GameState::Loading);
    h.inventory(&[(ItemId::JEWELLERY, 1)]);
    assert_eq!(h.plugin.stats().artefact_count, 1);

    h.client.set_game_state(GameState::Hopping);
    h.inventory(&[(ItemId::JEWELLERY, 3)]);
    assert_eq!(h.plugin.stats().artefact_count, 1);
}

#[test]
fn first_snapshot_after_reconnect_never_counts() {
    let mut h = host(SessionConfig::default());
    h.inventory(&[(ItemId::UNCLEANED_FIND, 0)]);

    h.client.set_game_state(GameState::ConnectionLost);
    h.tick();
    h.client.set_game_state(GameState::LoginScreen);
    h.tick();
    h.client.set_game_state(GameState::LoggedIn);

    // Items picked up elsewhere while logged out are not credited
    h.inventory(&[(ItemId::UNCLEANED_FIND, 20)]);
    assert_eq!(h.plugin.stats().uncleaned_find_count, 0);

    h.inventory(&[(ItemId::UNCLEANED_FIND, 21)]);
    assert_eq!(h.plugin.stats().uncleaned_find_count, 1);
}

#[test]
fn inventory_event_while_disconnected_drops_baseline() {
    let mut h = host(SessionConfig::default());
    h.inventory(&[(ItemId::ARROWHEADS, 1)]);

    h.client.set_game_state(GameState::LoginScreen);
    h.inventory(&[]);
    h.client.set_game_state(GameState::LoggedIn);

    h.inventory(&[(ItemId::ARROWHEADS, 9)]);
    assert_eq!(h.plugin.stats().artefact_count, 0);
}

#[test]
fn missing_position_is_not_in_zone() {
    let mut h = host(SessionConfig::default());
    h.inventory(&[]);

    h.client.set_position(None);
    h.inventory(&[(ItemId::OLD_CHIPPED_VASE, 1)]);

    assert_eq!(h.plugin.stats().artefact_count, 0);
}

// =============================================================================
// Idle timeout and reset
// =============================================================================

#[test]
fn timeout_boundary_is_inclusive() {
    let mut h = host(config(10, false));
    h.inventory(&[]);
    h.inventory(&[(ItemId::UNCLEANED_FIND, 1), (ItemId::POTTERY, 1)]);

    h.clock
        .advance(Duration::minutes(9) + Duration::seconds(59));
    h.tick();
    assert_eq!(h.plugin.stats().state, SessionState::Active);
    assert_eq!(h.plugin.stats().uncleaned_find_count, 1);

    h.clock.advance(Duration::seconds(1));
    h.tick();

    let stats = h.plugin.stats();
    assert_eq!(stats.state, SessionState::Idle);
    assert_eq!(stats.uncleaned_find_count, 0);
    assert_eq!(stats.artefact_count, 0);
    assert_eq!(h.log.entries(), vec![Notification::TrackerReset]);
}

#[test]
fn lamps_survive_reset_when_configured() {
    let mut h = host(config(1, true));
    h.inventory(&[]);
    h.inventory(&[(ItemId::ANTIQUE_LAMP_11189, 2), (ItemId::ARROWHEADS, 1)]);

    h.clock.advance(Duration::minutes(1));
    h.tick();

    let stats = h.plugin.stats();
    assert_eq!(stats.antique_lamp_count, 2);
    assert_eq!(stats.artefact_count, 0);
    assert_eq!(stats.state, SessionState::Idle);
}

#[test]
fn zero_timeout_never_resets() {
    let mut h = host(config(0, false));
    h.inventory(&[]);
    h.inventory(&[(ItemId::UNCLEANED_FIND, 1)]);

    h.clock.advance(Duration::days(30));
    h.tick();

    assert_eq!(h.plugin.stats().uncleaned_find_count, 1);
    assert!(h.log.is_empty());
}

#[test]
fn ticks_while_idle_do_nothing() {
    let mut h = host(config(1, false));
    for _ in 0..10 {
        h.clock.advance(Duration::minutes(5));
        h.tick();
    }
    assert!(h.log.is_empty());
}

#[test]
fn activity_after_reset_starts_a_new_session() {
    let mut h = host(config(5, false));
    h.inventory(&[]);
    h.inventory(&[(ItemId::UNCLEANED_FIND, 3)]);

    h.clock.advance(Duration::minutes(6));
    h.tick();
    assert_eq!(h.plugin.stats().uncleaned_find_count, 0);

    // The detector baseline survives the reset
    h.inventory(&[(ItemId::UNCLEANED_FIND, 4)]);
    let stats = h.plugin.stats();
    assert_eq!(stats.uncleaned_find_count, 1);
    assert_eq!(stats.state, SessionState::Active);
}

// =============================================================================
// Subscription lifecycle
// =============================================================================

#[test]
fn stopped_plugin_receives_nothing() {
    let mut h = host(SessionConfig::default());
    h.inventory(&[]);
    h.plugin.stop(&mut h.bus);

    h.inventory(&[(ItemId::ANTIQUE_LAMP_11185, 1)]);
    h.clock.advance(Duration::hours(1));
    h.tick();

    assert_eq!(h.plugin.stats().antique_lamp_count, 0);
    assert!(h.log.is_empty());
}

#[test]
fn other_subscribers_still_see_events() {
    use std::cell::Cell;
    use std::rc::Rc;

    let mut h = host(SessionConfig::default());
    let ticks = Rc::new(Cell::new(0));
    let seen = Rc::clone(&ticks);
    h.bus
        .subscribe(specimen_tracker::EventKind::GameTick, move |_| {
            seen.set(seen.get() + 1);
        });

    h.tick();
    h.tick();
    h.plugin.stop(&mut h.bus);
    h.tick();

    assert_eq!(ticks.get(), 3);
}
