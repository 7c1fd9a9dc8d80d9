//! Top-level controller wiring the detector and the session to host events.
//!
//! A single [`SpecimenCleaningPlugin`] owns all tracker state. On
//! [`start`](SpecimenCleaningPlugin::start) it subscribes one handler for
//! container changes and one for game ticks on the host's [`EventBus`]; on
//! [`stop`](SpecimenCleaningPlugin::stop) it removes them again.
//!
//! Handlers and the plugin share state through `Rc<RefCell<_>>`. Events are
//! delivered serially, so a borrow is never held across two handlers.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use specimen_tracker::clock::ManualClock;
//! use specimen_tracker::events::{EventBus, HostEvent, ItemContainerChanged};
//! use specimen_tracker::feed::ScriptedClient;
//! use specimen_tracker::notification::NotificationLog;
//! use specimen_tracker::plugin::SpecimenCleaningPlugin;
//! use specimen_tracker::session::SessionConfig;
//! use specimen_tracker::types::{ActorPosition, ContainerId, GameState, ItemId, ItemStack};
//!
//! let client = ScriptedClient::new();
//! client.set_game_state(GameState::LoggedIn);
//! client.set_position(Some(ActorPosition::from_world(3260, 3444)));
//!
//! let mut plugin = SpecimenCleaningPlugin::new(
//!     client.clone(),
//!     ManualClock::new(Utc::now()),
//!     NotificationLog::new(),
//!     SessionConfig::default(),
//! );
//! let mut bus = EventBus::new();
//! plugin.start(&mut bus);
//!
//! let inventory = |quantity| {
//!     HostEvent::ItemContainerChanged(ItemContainerChanged {
//!         container_id: ContainerId::INVENTORY,
//!         items: vec![ItemStack::new(ItemId::UNCLEANED_FIND, quantity)],
//!     })
//! };
//! bus.post(&inventory(1));
//! bus.post(&inventory(4));
//!
//! assert_eq!(plugin.stats().uncleaned_find_count, 3);
//! plugin.stop(&mut bus);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, trace, warn};

use crate::client::Client;
use crate::clock::Clock;
use crate::detector::InventoryDetector;
use crate::events::{EventBus, EventKind, HostEvent, ItemContainerChanged, SubscriptionId};
use crate::notification::Notifier;
use crate::session::{Session, SessionConfig, SessionStats};
use crate::types::ContainerId;
use crate::zone::{is_in_zone, Zone, MUSEUM_CLEANING_AREA};

/// State reached from the event handlers.
struct PluginState {
    client: Box<dyn Client>,
    clock: Box<dyn Clock>,
    notifier: Box<dyn Notifier>,
    zone: Zone,
    detector: InventoryDetector,
    session: Session,
}

impl PluginState {
    fn is_player_in_area(&self) -> bool {
        is_in_zone(
            &self.zone,
            self.client.game_state(),
            self.client.local_player_position(),
        )
    }

    fn on_item_container_changed(&mut self, event: &ItemContainerChanged) {
        if event.container_id != ContainerId::INVENTORY {
            trace!(
                container = event.container_id.0,
                "Ignoring non-inventory container"
            );
            return;
        }

        self.forget_baseline_if_disconnected();

        if !self.is_player_in_area() {
            trace!("Ignoring inventory change outside the cleaning area");
            return;
        }

        let delta = self.detector.observe(&event.items);
        if delta.is_empty() {
            return;
        }

        let now = self.clock.now();
        self.session
            .record_delta(&delta, now, self.notifier.as_mut());
    }

    fn on_game_tick(&mut self) {
        self.forget_baseline_if_disconnected();

        let now = self.clock.now();
        self.session.check_idle(now, self.notifier.as_mut());
    }

    /// The first snapshot after a reconnect is a new baseline.
    fn forget_baseline_if_disconnected(&mut self) {
        let game_state = self.client.game_state();
        if !game_state.has_position() && self.detector.has_baseline() {
            debug!(?game_state, "Disconnected, clearing inventory baseline");
            self.detector.clear_baseline();
        }
    }

    fn reset(&mut self) {
        self.session.reset(self.notifier.as_mut());
    }
}

/// The specimen cleaning tracker as seen by the host.
pub struct SpecimenCleaningPlugin {
    state: Rc<RefCell<PluginState>>,
    subscriptions: Vec<SubscriptionId>,
}

impl SpecimenCleaningPlugin {
    /// Creates a stopped plugin tracking the museum cleaning area.
    pub fn new<C, K, N>(client: C, clock: K, notifier: N, config: SessionConfig) -> Self
    where
        C: Client + 'static,
        K: Clock + 'static,
        N: Notifier + 'static,
    {
        let state = PluginState {
            client: Box::new(client),
            clock: Box::new(clock),
            notifier: Box::new(notifier),
            zone: MUSEUM_CLEANING_AREA,
            detector: InventoryDetector::new(),
            session: Session::new(config),
        };

        Self {
            state: Rc::new(RefCell::new(state)),
            subscriptions: Vec::new(),
        }
    }

    /// Tracks a different zone instead of the museum cleaning area.
    #[must_use]
    pub fn with_zone(self, zone: Zone) -> Self {
        self.state.borrow_mut().zone = zone;
        self
    }

    /// Subscribes the plugin's handlers on `bus`.
    ///
    /// The inventory baseline is cleared, so the first observation after
    /// starting never changes counters.
    pub fn start(&mut self, bus: &mut EventBus) {
        if self.is_running() {
            warn!("Specimen cleaning plugin already started");
            return;
        }

        self.state.borrow_mut().detector.clear_baseline();

        let state = Rc::clone(&self.state);
        let container_id = bus.subscribe(EventKind::ItemContainerChanged, move |event| {
            if let HostEvent::ItemContainerChanged(changed) = event {
                state.borrow_mut().on_item_container_changed(changed);
            }
        });

        let state = Rc::clone(&self.state);
        let tick_id = bus.subscribe(EventKind::GameTick, move |event| {
            if let HostEvent::GameTick(_) = event {
                state.borrow_mut().on_game_tick();
            }
        });

        self.subscriptions = vec![container_id, tick_id];
        info!("Specimen cleaning plugin started");
    }

    /// Unsubscribes the plugin's handlers from `bus`.
    ///
    /// Session counters are kept; only the inventory baseline is dropped.
    pub fn stop(&mut self, bus: &mut EventBus) {
        for id in self.subscriptions.drain(..) {
            if !bus.unsubscribe(id) {
                debug!(?id, "Subscription was already removed");
            }
        }

        self.state.borrow_mut().detector.clear_baseline();
        info!("Specimen cleaning plugin stopped");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Handles a container change directly, bypassing the bus.
    pub fn on_item_container_changed(&self, event: &ItemContainerChanged) {
        self.state.borrow_mut().on_item_container_changed(event);
    }

    /// Handles a game tick directly, bypassing the bus.
    pub fn on_game_tick(&self) {
        self.state.borrow_mut().on_game_tick();
    }

    /// Manually resets the session.
    pub fn reset_session(&self) {
        self.state.borrow_mut().reset();
    }

    #[must_use]
    pub fn is_player_in_area(&self) -> bool {
        self.state.borrow().is_player_in_area()
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.state.borrow().session.stats()
    }

    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.state.borrow().session.config()
    }

    pub fn set_config(&self, config: SessionConfig) {
        debug!(?config, "Session config updated");
        self.state.borrow_mut().session.set_config(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::clock::ManualClock;
    use crate::events::GameTick;
    use crate::feed::ScriptedClient;
    use crate::notification::{Notification, NotificationLog};
    use crate::session::SessionState;
    use crate::types::{ActorPosition, GameState, ItemId, ItemStack};

    struct Harness {
        client: ScriptedClient,
        clock: ManualClock,
        log: NotificationLog,
        plugin: SpecimenCleaningPlugin,
        bus: EventBus,
    }

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 18, 30, 0).unwrap()
    }

    fn harness(config: SessionConfig) -> Harness {
        let client = ScriptedClient::new();
        client.set_game_state(GameState::LoggedIn);
        client.set_position(Some(ActorPosition::from_world(3260, 3444)));

        let clock = ManualClock::new(start_time());
        let log = NotificationLog::new();
        let mut plugin =
            SpecimenCleaningPlugin::new(client.clone(), clock.clone(), log.clone(), config);
        let mut bus = EventBus::new();
        plugin.start(&mut bus);

        Harness {
            client,
            clock,
            log,
            plugin,
            bus,
        }
    }

    fn inventory(items: &[(ItemId, u32)]) -> HostEvent {
        container(ContainerId::INVENTORY, items)
    }

    fn container(container_id: ContainerId, items: &[(ItemId, u32)]) -> HostEvent {
        HostEvent::ItemContainerChanged(ItemContainerChanged {
            container_id,
            items: items
                .iter()
                .map(|(id, quantity)| ItemStack::new(*id, *quantity))
                .collect(),
        })
    }

    #[test]
    fn start_subscribes_both_handlers() {
        let h = harness(SessionConfig::default());
        assert!(h.plugin.is_running());
        assert_eq!(h.bus.subscriber_count(EventKind::ItemContainerChanged), 1);
        assert_eq!(h.bus.subscriber_count(EventKind::GameTick), 1);
    }

    #[test]
    fn stop_unsubscribes_and_events_are_ignored() {
        let mut h = harness(SessionConfig::default());
        h.bus.post(&inventory(&[]));
        h.plugin.stop(&mut h.bus);

        assert!(h.bus.is_empty());
        assert!(!h.plugin.is_running());

        h.bus.post(&inventory(&[(ItemId::UNCLEANED_FIND, 5)]));
        assert_eq!(h.plugin.stats().uncleaned_find_count, 0);
    }

    #[test]
    fn restart_requires_new_baseline() {
        let mut h = harness(SessionConfig::default());
        h.bus.post(&inventory(&[]));
        h.bus.post(&inventory(&[(ItemId::UNCLEANED_FIND, 1)]));
        assert_eq!(h.plugin.stats().uncleaned_find_count, 1);

        h.plugin.stop(&mut h.bus);
        h.plugin.start(&mut h.bus);

        // First observation after restart only sets the baseline
        h.bus.post(&inventory(&[(ItemId::UNCLEANED_FIND, 8)]));
        assert_eq!(h.plugin.stats().uncleaned_find_count, 1);
    }

    #[test]
    fn double_start_keeps_one_subscription_per_kind() {
        let mut h = harness(SessionConfig::default());
        h.plugin.start(&mut h.bus);
        assert_eq!(h.bus.subscriber_count(EventKind::GameTick), 1);
    }

    #[test]
    fn non_inventory_containers_are_ignored() {
        let mut h = harness(SessionConfig::default());
        h.bus.post(&inventory(&[]));
        let bank = container(ContainerId::BANK, &[(ItemId::UNCLEANED_FIND, 50)]);
        let equipment = container(ContainerId::EQUIPMENT, &[(ItemId::POTTERY, 1)]);
        h.bus.post(&bank);
        h.bus.post(&equipment);

        assert_eq!(h.plugin.stats().uncleaned_find_count, 0);
        assert_eq!(h.plugin.stats().artefact_count, 0);

        // Neither event disturbed the inventory baseline
        h.bus.post(&inventory(&[(ItemId::UNCLEANED_FIND, 1)]));
        assert_eq!(h.plugin.stats().uncleaned_find_count, 1);
    }

    #[test]
    fn out_of_zone_changes_do_not_touch_baseline() {
        let mut h = harness(SessionConfig::default());
        h.bus.post(&inventory(&[(ItemId::UNCLEANED_FIND, 1)]));

        h.client
            .set_position(Some(ActorPosition::from_world(3200, 3400)));
        h.bus.post(&inventory(&[(ItemId::UNCLEANED_FIND, 10)]));
        assert_eq!(h.plugin.stats().uncleaned_find_count, 0);

        // Back in zone: the diff is against the last in-zone snapshot
        h.client
            .set_position(Some(ActorPosition::from_world(3260, 3444)));
        h.bus.post(&inventory(&[(ItemId::UNCLEANED_FIND, 12)]));
        assert_eq!(h.plugin.stats().uncleaned_find_count, 11);
    }

    #[test]
    fn logged_out_changes_are_ignored() {
        let mut h = harness(SessionConfig::default());
        h.client.set_game_state(GameState::LoginScreen);

        h.bus.post(&inventory(&[]));
        h.bus.post(&inventory(&[(ItemId::POTTERY, 1)]));

        assert_eq!(h.plugin.stats().artefact_count, 0);
        assert!(!h.plugin.is_player_in_area());
    }

    #[test]
    fn tick_while_disconnected_drops_baseline() {
        let mut h = harness(SessionConfig::default());
        h.bus.post(&inventory(&[(ItemId::POTTERY, 1)]));

        h.client.set_game_state(GameState::ConnectionLost);
        h.bus.post(&HostEvent::GameTick(GameTick));
        h.client.set_game_state(GameState::LoggedIn);

        h.bus.post(&inventory(&[(ItemId::POTTERY, 6)]));
        assert_eq!(h.plugin.stats().artefact_count, 0);

        h.bus.post(&inventory(&[(ItemId::POTTERY, 7)]));
        assert_eq!(h.plugin.stats().artefact_count, 1);
    }

    #[test]
    fn tick_while_connected_keeps_baseline() {
        let mut h = harness(SessionConfig::default());
        h.bus.post(&inventory(&[(ItemId::POTTERY, 1)]));
        h.bus.post(&HostEvent::GameTick(GameTick));

        h.bus.post(&inventory(&[(ItemId::POTTERY, 2)]));
        assert_eq!(h.plugin.stats().artefact_count, 1);
    }

    #[test]
    fn lamp_notification_is_sent() {
        let mut h = harness(SessionConfig::default());
        h.bus.post(&inventory(&[]));
        h.bus.post(&inventory(&[(ItemId::ANTIQUE_LAMP_11185, 1)]));

        assert_eq!(h.log.entries(), vec![Notification::AntiqueLampFound]);
        assert_eq!(h.plugin.stats().last_action_time, Some(start_time()));
    }

    #[test]
    fn tick_after_timeout_resets() {
        let mut h = harness(SessionConfig {
            timeout_minutes: 10,
            ..SessionConfig::default()
        });
        h.bus.post(&inventory(&[]));
        h.bus.post(&inventory(&[(ItemId::UNCLEANED_FIND, 2)]));

        h.clock.advance(Duration::minutes(10));
        h.bus.post(&HostEvent::GameTick(GameTick));

        let stats = h.plugin.stats();
        assert_eq!(stats.state, SessionState::Idle);
        assert_eq!(stats.uncleaned_find_count, 0);
        assert_eq!(h.log.entries(), vec![Notification::TrackerReset]);
    }

    #[test]
    fn manual_reset() {
        let mut h = harness(SessionConfig::default());
        h.bus.post(&inventory(&[]));
        h.bus.post(&inventory(&[(ItemId::ARROWHEADS, 1)]));

        h.plugin.reset_session();

        assert_eq!(h.plugin.stats().artefact_count, 0);
        assert_eq!(h.plugin.stats().state, SessionState::Idle);
    }

    #[test]
    fn config_updates_apply_to_next_event() {
        let mut h = harness(SessionConfig::default());
        h.plugin.set_config(SessionConfig {
            show_notifications: false,
            ..h.plugin.config()
        });

        h.bus.post(&inventory(&[]));
        h.bus.post(&inventory(&[(ItemId::ANTIQUE_LAMP_11186, 1)]));

        assert!(h.log.is_empty());
        assert_eq!(h.plugin.stats().antique_lamp_count, 1);
    }

    #[test]
    fn direct_handlers_work_without_bus() {
        let h = harness(SessionConfig::default());
        let changed = |quantity| ItemContainerChanged {
            container_id: ContainerId::INVENTORY,
            items: vec![ItemStack::new(ItemId::JEWELLERY, quantity)],
        };

        h.plugin.on_item_container_changed(&changed(0));
        h.plugin.on_item_container_changed(&changed(2));
        h.plugin.on_game_tick();

        assert_eq!(h.plugin.stats().artefact_count, 2);
    }

    #[test]
    fn custom_zone() {
        let client = ScriptedClient::new();
        client.set_game_state(GameState::LoggedIn);
        client.set_position(Some(ActorPosition::new(1, 5, 5)));

        let plugin = SpecimenCleaningPlugin::new(
            client,
            ManualClock::new(start_time()),
            NotificationLog::new(),
            SessionConfig::default(),
        )
        .with_zone(Zone::new(&[1], 0..=10, 0..=10));

        assert!(plugin.is_player_in_area());
    }
}
