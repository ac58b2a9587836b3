//! The radio driver contract this engine is written against.
//!
//! Promiscuous capture, channel switching, raw transmission, scanning and periodic timers all
//! live behind [`RadioDriver`]. The engine never owns the hardware, it only borrows the driver
//! for the duration of a call.

use std::time::Duration;

use libwifi::frame::components::MacAddress;
use strum_macros::Display;

#[derive(thiserror::Error, Debug)]
pub enum RadioError {
    #[error("Failed to change radio mode to {0}: {1}")]
    ModeChange(RadioMode, String),
    #[error("Network scan failed: {0}")]
    Scan(String),
    #[error("Raw transmit failed: {0}")]
    Transmit(String),
    #[error("Failed to set channel {0}: {1}")]
    Channel(u8, String),
    #[error("Timer {0:?} failed: {1}")]
    Timer(TimerSlot, String),
    #[error("Promiscuous capture failed: {0}")]
    Capture(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Pcap(#[from] pcap_file::PcapError),
}

/// Operating mode of the radio.
/// `AccessPoint` is the exclusive mode used for raw injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Default)]
pub enum RadioMode {
    #[default]
    Null,
    Station,
    AccessPoint,
    StationAccessPoint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Default)]
pub enum AuthMode {
    #[default]
    Open,
    Wep,
    WpaPsk,
    Wpa2Psk,
    WpaWpa2Psk,
    Wpa2Enterprise,
    Wpa3Psk,
    Unknown,
}

/// One access point reported by a network scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanRecord {
    pub bssid: MacAddress,
    pub ssid: String,
    pub channel: u8,
    pub auth_mode: AuthMode,
}

/// Coarse packet class reported by the driver alongside a captured frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PacketKind {
    Management,
    Control,
    Data,
    Misc,
}

/// A frame handed to the promiscuous-capture callback.
#[derive(Clone, Copy, Debug)]
pub struct CapturedFrame<'a> {
    /// The 802.11 frame, starting at the frame control field.
    pub payload: &'a [u8],
    pub channel: u8,
    pub rssi: i32,
    pub kind: PacketKind,
    pub fcs_included: bool,
}

pub type CaptureCallback = Box<dyn FnMut(&CapturedFrame<'_>) + Send>;

/// Periodic timers the engine asks the host to arm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerSlot {
    ChannelHop,
    AttackTick,
}

pub trait RadioDriver {
    fn set_mode(&mut self, mode: RadioMode) -> Result<(), RadioError>;

    fn mode(&self) -> Result<RadioMode, RadioError>;

    /// Drop any client association.
    fn disconnect(&mut self) -> Result<(), RadioError>;

    /// Bring the configured client connection back up.
    fn reconnect(&mut self) -> Result<(), RadioError>;

    /// Blocking scan of all channels. An empty list is a valid answer.
    fn scan_networks(&mut self) -> Result<Vec<ScanRecord>, RadioError>;

    /// Install or remove the promiscuous-capture callback. `None` disables capture.
    fn set_promiscuous_capture(
        &mut self,
        callback: Option<CaptureCallback>,
    ) -> Result<(), RadioError>;

    fn set_channel(&mut self, channel: u8) -> Result<(), RadioError>;

    /// Transmit exactly `frame`, which starts at the frame control field.
    fn transmit_raw(&mut self, frame: &[u8]) -> Result<(), RadioError>;

    fn start_periodic_timer(&mut self, slot: TimerSlot, interval: Duration)
        -> Result<(), RadioError>;

    fn stop_periodic_timer(&mut self, slot: TimerSlot) -> Result<(), RadioError>;
}
