use std::time::Instant;

use libwifi::frame::components::MacAddress;

use crate::attack::{AttackConfig, AttackMode, AttackSession, TickOutcome};
use crate::devices::{StationTracker, TrackedAccessPoint, TrackedStation, TrackerConfig};
use crate::radio::{RadioDriver, ScanRecord, TimerSlot};
use crate::status::{report, MessageType, SharedLog};

/// Owns the radio and every session that may use it.
///
/// Passive tracking and attacks both need the radio to themselves, so starting one stops the
/// other first.
pub struct MarauderRuntime<R: RadioDriver> {
    radio: R,
    tracker: StationTracker,
    attack: AttackSession,
    log: SharedLog,
}

impl<R: RadioDriver> MarauderRuntime<R> {
    pub fn new(
        radio: R,
        attack_config: AttackConfig,
        tracker_config: TrackerConfig,
        log: SharedLog,
    ) -> Self {
        MarauderRuntime {
            radio,
            tracker: StationTracker::new(tracker_config, log.clone()),
            attack: AttackSession::new(attack_config, log.clone()),
            log,
        }
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn into_radio(self) -> R {
        self.radio
    }

    pub fn tracker(&self) -> &StationTracker {
        &self.tracker
    }

    pub fn attack(&self) -> &AttackSession {
        &self.attack
    }

    pub fn log(&self) -> SharedLog {
        self.log.clone()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracker.is_running()
    }

    pub fn is_attacking(&self) -> bool {
        self.attack.is_running()
    }

    pub fn current_attack(&self) -> AttackMode {
        self.attack.current_attack()
    }

    pub fn start_tracking(&mut self) {
        if self.attack.is_running() {
            self.attack.stop(&mut self.radio);
        }
        self.tracker.start(&mut self.radio);
    }

    pub fn stop_tracking(&mut self) {
        self.tracker.stop(&mut self.radio);
    }

    pub fn start_attack(&mut self, mode: AttackMode) -> bool {
        self.tracker.stop(&mut self.radio);
        self.attack.start(&mut self.radio, mode)
    }

    pub fn start_attack_at(&mut self, mode: AttackMode, now: Instant) -> bool {
        self.tracker.stop(&mut self.radio);
        self.attack.start_at(&mut self.radio, mode, now)
    }

    pub fn toggle_attack(&mut self, mode: AttackMode) -> bool {
        self.tracker.stop(&mut self.radio);
        self.attack.toggle(&mut self.radio, mode)
    }

    pub fn stop_attack(&mut self) {
        self.attack.stop(&mut self.radio);
    }

    /// Stop whatever holds the radio.
    pub fn stop_all(&mut self) {
        self.attack.stop(&mut self.radio);
        self.tracker.stop(&mut self.radio);
    }

    pub fn set_preferred_target(&mut self, bssid: MacAddress, channel: u8) {
        self.attack.set_preferred_target(bssid, channel);
    }

    pub fn set_preferred_station(&mut self, bssid: MacAddress, station: MacAddress, channel: u8) {
        self.attack.set_preferred_station(bssid, station, channel);
    }

    pub fn select_station(&mut self, index: usize) -> bool {
        self.tracker.select_station(index)
    }

    /// Point the station-targeted attacks at the station selected in the tracker.
    pub fn target_selected_station(&mut self) -> bool {
        match self.tracker.selected_station() {
            Some(station) => {
                self.attack
                    .set_preferred_station(station.ap_bssid, station.mac, station.channel);
                true
            }
            None => {
                report(
                    &self.log,
                    MessageType::Warning,
                    "No tracked station selected".to_string(),
                );
                false
            }
        }
    }

    pub fn tracked_access_points(&self) -> Vec<TrackedAccessPoint> {
        self.tracker.access_points()
    }

    pub fn tracked_stations(&self) -> Vec<TrackedStation> {
        self.tracker.stations()
    }

    pub fn attack_access_points(&self) -> &[ScanRecord] {
        self.attack.access_points()
    }

    pub fn on_timer(&mut self, slot: TimerSlot) -> Option<TickOutcome> {
        self.on_timer_at(slot, Instant::now())
    }

    /// Route a timer firing. Attack ticks report their outcome.
    pub fn on_timer_at(&mut self, slot: TimerSlot, now: Instant) -> Option<TickOutcome> {
        match slot {
            TimerSlot::ChannelHop => {
                self.tracker.hop(&mut self.radio);
                None
            }
            TimerSlot::AttackTick => Some(self.attack.run_once_at(&mut self.radio, now)),
        }
    }
}
