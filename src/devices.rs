use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use derive_setters::Setters;
use libwifi::frame::components::MacAddress;

use crate::environment::RadioEnvironment;
use crate::hopper::{ChannelHopper, DEFAULT_HOP_INTERVAL};
use crate::radio::{AuthMode, CaptureCallback, CapturedFrame, PacketKind, RadioDriver, RadioMode};
use crate::status::{report, MessageType, SharedLog};
use crate::util::{safe_channel, FIRST_CHANNEL};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedStation {
    pub mac: MacAddress,
    /// Network the station was seen talking on. May be broadcast when unknown.
    pub ap_bssid: MacAddress,
    pub rssi: i32,
    pub channel: u8,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedAccessPoint {
    pub bssid: MacAddress,
    /// Empty until a beacon or probe response names the network, or for hidden networks.
    pub ssid: String,
    pub channel: u8,
    pub auth_mode: AuthMode,
    pub selected: bool,
    /// Indices into the station list of the owning registry.
    pub station_indices: Vec<usize>,
}

impl TrackedAccessPoint {
    fn new(bssid: MacAddress, channel: u8) -> Self {
        TrackedAccessPoint {
            bssid,
            ssid: String::new(),
            channel,
            auth_mode: AuthMode::default(),
            selected: false,
            station_indices: Vec::new(),
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.ssid.is_empty()
    }
}

/// One captured frame reduced to what the registry keeps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub source: MacAddress,
    pub destination: MacAddress,
    pub bssid: MacAddress,
    pub channel: u8,
    pub rssi: i32,
    pub kind: PacketKind,
    /// SSID announced by a beacon or probe response.
    pub ssid: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    Ignored,
    Recorded {
        access_point: usize,
        station: Option<usize>,
        new_access_point: bool,
        new_station: bool,
    },
}

/// Insertion-ordered access points and stations, deduplicated by MAC.
///
/// Stations live in one arena and access points refer to them by index. Entries are never
/// removed one at a time, only cleared together, so the indices stay valid.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    access_points: Vec<TrackedAccessPoint>,
    stations: Vec<TrackedStation>,
    ap_lookup: HashMap<MacAddress, usize>,
    station_lookup: HashMap<(MacAddress, MacAddress), usize>,
    selected: Option<usize>,
    malformed_frames: u64,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        DeviceRegistry::default()
    }

    pub fn ingest(&mut self, observation: &Observation) -> IngestOutcome {
        if !matches!(observation.kind, PacketKind::Management | PacketKind::Data) {
            return IngestOutcome::Ignored;
        }
        let channel = safe_channel(observation.channel);

        let (ap_index, new_access_point) = match self.ap_lookup.get(&observation.bssid) {
            Some(index) => (*index, false),
            None => {
                let index = self.access_points.len();
                self.access_points
                    .push(TrackedAccessPoint::new(observation.bssid, channel));
                self.ap_lookup.insert(observation.bssid, index);
                (index, true)
            }
        };

        if let Some(ssid) = &observation.ssid {
            let ap = &mut self.access_points[ap_index];
            if ap.ssid.is_empty() && !ssid.is_empty() {
                ap.ssid = ssid.clone();
            }
        }

        // An access point sending its own frames is not one of its stations.
        if observation.source == observation.bssid {
            return IngestOutcome::Recorded {
                access_point: ap_index,
                station: None,
                new_access_point,
                new_station: false,
            };
        }

        let key = (observation.source, observation.bssid);
        let (station_index, new_station) = match self.station_lookup.get(&key) {
            Some(index) => {
                let station = &mut self.stations[*index];
                station.rssi = observation.rssi;
                station.channel = channel;
                (*index, false)
            }
            None => {
                let index = self.stations.len();
                self.stations.push(TrackedStation {
                    mac: observation.source,
                    ap_bssid: observation.bssid,
                    rssi: observation.rssi,
                    channel,
                    selected: false,
                });
                self.station_lookup.insert(key, index);
                self.access_points[ap_index].station_indices.push(index);
                (index, true)
            }
        };

        IngestOutcome::Recorded {
            access_point: ap_index,
            station: Some(station_index),
            new_access_point,
            new_station,
        }
    }

    /// Parse a raw capture and ingest it. Frames that fail to parse are counted and dropped.
    pub fn ingest_capture(&mut self, frame: &CapturedFrame<'_>) -> IngestOutcome {
        if !matches!(frame.kind, PacketKind::Management | PacketKind::Data) {
            return IngestOutcome::Ignored;
        }
        let summary = match libwifi::parse_frame(frame.payload, frame.fcs_included) {
            Ok(summary) => summary,
            Err(_) => {
                self.malformed_frames += 1;
                return IngestOutcome::Ignored;
            }
        };

        let channel = match (frame.channel, summary.channel) {
            (0, Some(announced)) => announced,
            (received, _) => received,
        };

        self.ingest(&Observation {
            source: *summary.header.transmitter(),
            destination: *summary.header.receiver(),
            bssid: *summary.header.bssid(),
            channel,
            rssi: frame.rssi,
            kind: frame.kind,
            ssid: summary.ssid,
        })
    }

    pub fn clear(&mut self) {
        self.access_points.clear();
        self.stations.clear();
        self.ap_lookup.clear();
        self.station_lookup.clear();
        self.selected = None;
    }

    /// Select a station by index. An out-of-range index clears the selection.
    pub fn select_station(&mut self, index: usize) -> bool {
        if let Some(previous) = self.selected.take() {
            if let Some(station) = self.stations.get_mut(previous) {
                station.selected = false;
            }
        }
        match self.stations.get_mut(index) {
            Some(station) => {
                station.selected = true;
                self.selected = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn has_selection(&self) -> bool {
        self.selected_station().is_some()
    }

    pub fn selected_station_index(&self) -> Option<usize> {
        self.selected.filter(|index| *index < self.stations.len())
    }

    pub fn selected_station(&self) -> Option<&TrackedStation> {
        self.selected_station_index()
            .and_then(|index| self.stations.get(index))
    }

    pub fn access_points(&self) -> &[TrackedAccessPoint] {
        &self.access_points
    }

    pub fn stations(&self) -> &[TrackedStation] {
        &self.stations
    }

    pub fn access_point(&self, bssid: &MacAddress) -> Option<&TrackedAccessPoint> {
        self.ap_lookup
            .get(bssid)
            .and_then(|index| self.access_points.get(*index))
    }

    /// Stations recorded against `bssid`, in discovery order.
    pub fn stations_of(&self, bssid: &MacAddress) -> Vec<&TrackedStation> {
        self.access_point(bssid)
            .map(|ap| {
                ap.station_indices
                    .iter()
                    .filter_map(|index| self.stations.get(*index))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn malformed_frames(&self) -> u64 {
        self.malformed_frames
    }
}

#[derive(Clone, Debug, Setters)]
pub struct TrackerConfig {
    pub hop_interval: Duration,
    /// Reconnect the client connection on stop instead of restoring the previous mode.
    pub restore_client: bool,
    /// Hand the radio back on stop at all.
    pub restore_radio: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            hop_interval: DEFAULT_HOP_INTERVAL,
            restore_client: false,
            restore_radio: true,
        }
    }
}

/// Passive discovery of access points and their stations.
///
/// The registry sits behind a mutex because the capture callback feeds it from the driver's
/// context while readers take snapshots from the host loop.
pub struct StationTracker {
    registry: Arc<Mutex<DeviceRegistry>>,
    hopper: ChannelHopper,
    environment: RadioEnvironment,
    running: bool,
    config: TrackerConfig,
    log: SharedLog,
}

impl StationTracker {
    pub fn new(config: TrackerConfig, log: SharedLog) -> Self {
        StationTracker {
            registry: Arc::new(Mutex::new(DeviceRegistry::new())),
            hopper: ChannelHopper::new(),
            environment: RadioEnvironment::new(),
            running: false,
            config,
            log,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeviceRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn registry(&self) -> Arc<Mutex<DeviceRegistry>> {
        Arc::clone(&self.registry)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_channel(&self) -> u8 {
        self.hopper.current_channel()
    }

    pub fn start<R: RadioDriver + ?Sized>(&mut self, radio: &mut R) {
        if self.running {
            return;
        }

        let previous = self.environment.capture(radio, self.config.restore_client);
        if previous != RadioMode::Null {
            if let Err(e) = radio.disconnect() {
                report(&self.log, MessageType::Warning, format!("Station tracker disconnect failed: {e}"));
            }
        }
        if let Err(e) = radio.set_mode(RadioMode::Null) {
            report(&self.log, MessageType::Warning, format!("Station tracker WiFi start failed: {e}"));
        }

        self.lock().clear();

        self.hopper.reset(FIRST_CHANNEL);
        if let Err(e) = radio.set_channel(FIRST_CHANNEL) {
            report(&self.log, MessageType::Warning, format!("Station tracker channel reset failed: {e}"));
        }

        let registry = Arc::clone(&self.registry);
        let callback: CaptureCallback = Box::new(move |frame: &CapturedFrame<'_>| {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .ingest_capture(frame);
        });
        if let Err(e) = radio.set_promiscuous_capture(Some(callback)) {
            report(
                &self.log,
                MessageType::Warning,
                format!("Station tracker failed to start promiscuous mode: {e}"),
            );
        }

        if let Err(e) = self.hopper.start(radio, self.config.hop_interval) {
            report(&self.log, MessageType::Warning, format!("Station tracker failed to create hop timer: {e}"));
        }

        self.running = true;
        report(&self.log, MessageType::Info, "Station tracker started".to_string());
    }

    pub fn stop<R: RadioDriver + ?Sized>(&mut self, radio: &mut R) {
        if !self.running {
            return;
        }

        if let Err(e) = self.hopper.stop(radio) {
            report(&self.log, MessageType::Warning, format!("Station tracker hop timer stop failed: {e}"));
        }
        if let Err(e) = radio.set_promiscuous_capture(None) {
            report(&self.log, MessageType::Warning, format!("Station tracker capture stop failed: {e}"));
        }
        self.running = false;

        if self.config.restore_radio {
            if let Err(e) = self.environment.restore(radio) {
                report(&self.log, MessageType::Error, format!("Station tracker failed to restore radio: {e}"));
            }
        } else {
            self.environment.discard();
        }
        report(&self.log, MessageType::Info, "Station tracker stopped".to_string());
    }

    /// Timer entry point for `TimerSlot::ChannelHop`.
    pub fn hop<R: RadioDriver + ?Sized>(&mut self, radio: &mut R) -> Option<u8> {
        match self.hopper.hop(radio, self.running) {
            Ok(channel) => channel,
            Err(e) => {
                report(&self.log, MessageType::Warning, format!("Channel hop failed: {e}"));
                None
            }
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn select_station(&self, index: usize) -> bool {
        let selected = self.lock().select_station(index);
        if selected {
            report(&self.log, MessageType::Info, format!("Selected station index {index}"));
        }
        selected
    }

    pub fn has_selection(&self) -> bool {
        self.lock().has_selection()
    }

    pub fn selected_station_index(&self) -> Option<usize> {
        self.lock().selected_station_index()
    }

    pub fn selected_station(&self) -> Option<TrackedStation> {
        self.lock().selected_station().cloned()
    }

    pub fn access_points(&self) -> Vec<TrackedAccessPoint> {
        self.lock().access_points().to_vec()
    }

    pub fn stations(&self) -> Vec<TrackedStation> {
        self.lock().stations().to_vec()
    }

    pub fn stations_of(&self, bssid: &MacAddress) -> Vec<TrackedStation> {
        self.lock().stations_of(bssid).into_iter().cloned().collect()
    }

    pub fn malformed_frames(&self) -> u64 {
        self.lock().malformed_frames()
    }
}
