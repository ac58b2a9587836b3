#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use libwifi::frame::components::MacAddress;
use oxide_marauder::radio::{
    AuthMode, CaptureCallback, CapturedFrame, PacketKind, RadioDriver, RadioError, RadioMode,
    ScanRecord, TimerSlot,
};
use oxide_marauder::status::{MessageLog, SharedLog};

/// A radio that records everything asked of it.
pub struct MockRadio {
    pub mode: RadioMode,
    pub channel: u8,
    pub mode_history: Vec<RadioMode>,
    pub channel_history: Vec<u8>,
    /// Every transmitted frame with the channel it went out on.
    pub transmitted: Vec<(u8, Vec<u8>)>,
    pub networks: Vec<ScanRecord>,
    pub scans: usize,
    pub disconnects: usize,
    pub reconnects: usize,
    pub timers: HashMap<TimerSlot, Duration>,
    pub capture: Option<CaptureCallback>,
    pub fail_scan: bool,
    pub fail_transmit: bool,
    pub fail_mode_query: bool,
}

impl MockRadio {
    pub fn new(mode: RadioMode) -> Self {
        MockRadio {
            mode,
            channel: 1,
            mode_history: Vec::new(),
            channel_history: Vec::new(),
            transmitted: Vec::new(),
            networks: Vec::new(),
            scans: 0,
            disconnects: 0,
            reconnects: 0,
            timers: HashMap::new(),
            capture: None,
            fail_scan: false,
            fail_transmit: false,
            fail_mode_query: false,
        }
    }

    pub fn with_networks(mode: RadioMode, networks: Vec<ScanRecord>) -> Self {
        let mut radio = MockRadio::new(mode);
        radio.networks = networks;
        radio
    }

    pub fn is_armed(&self, slot: TimerSlot) -> bool {
        self.timers.contains_key(&slot)
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    /// Hand a frame to the installed capture callback, as the driver would on receive.
    pub fn deliver(&mut self, payload: &[u8], channel: u8, rssi: i32) -> bool {
        let Some(callback) = self.capture.as_mut() else {
            return false;
        };
        let kind = match (payload[0] >> 2) & 0b11 {
            0 => PacketKind::Management,
            1 => PacketKind::Control,
            2 => PacketKind::Data,
            _ => PacketKind::Misc,
        };
        callback(&CapturedFrame {
            payload,
            channel,
            rssi,
            kind,
            fcs_included: false,
        });
        true
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.transmitted.iter().map(|(_, frame)| frame.clone()).collect()
    }

    pub fn take_transmitted(&mut self) -> Vec<(u8, Vec<u8>)> {
        std::mem::take(&mut self.transmitted)
    }
}

impl RadioDriver for MockRadio {
    fn set_mode(&mut self, mode: RadioMode) -> Result<(), RadioError> {
        self.mode = mode;
        self.mode_history.push(mode);
        Ok(())
    }

    fn mode(&self) -> Result<RadioMode, RadioError> {
        if self.fail_mode_query {
            return Err(RadioError::ModeChange(self.mode, "query failed".to_string()));
        }
        Ok(self.mode)
    }

    fn disconnect(&mut self) -> Result<(), RadioError> {
        self.disconnects += 1;
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), RadioError> {
        self.reconnects += 1;
        self.mode = RadioMode::Station;
        self.mode_history.push(RadioMode::Station);
        Ok(())
    }

    fn scan_networks(&mut self) -> Result<Vec<ScanRecord>, RadioError> {
        self.scans += 1;
        if self.fail_scan {
            return Err(RadioError::Scan("radio busy".to_string()));
        }
        Ok(self.networks.clone())
    }

    fn set_promiscuous_capture(
        &mut self,
        callback: Option<CaptureCallback>,
    ) -> Result<(), RadioError> {
        self.capture = callback;
        Ok(())
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), RadioError> {
        self.channel = channel;
        self.channel_history.push(channel);
        Ok(())
    }

    fn transmit_raw(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        if self.fail_transmit {
            return Err(RadioError::Transmit("queue full".to_string()));
        }
        self.transmitted.push((self.channel, frame.to_vec()));
        Ok(())
    }

    fn start_periodic_timer(
        &mut self,
        slot: TimerSlot,
        interval: Duration,
    ) -> Result<(), RadioError> {
        self.timers.insert(slot, interval);
        Ok(())
    }

    fn stop_periodic_timer(&mut self, slot: TimerSlot) -> Result<(), RadioError> {
        self.timers.remove(&slot);
        Ok(())
    }
}

pub fn mac(byte: u8) -> MacAddress {
    MacAddress([byte; 6])
}

pub fn network(byte: u8, ssid: &str, channel: u8) -> ScanRecord {
    ScanRecord {
        bssid: mac(byte),
        ssid: ssid.to_string(),
        channel,
        auth_mode: AuthMode::Wpa2Psk,
    }
}

pub fn networks(count: u8) -> Vec<ScanRecord> {
    (1..=count)
        .map(|i| network(i, &format!("Net{i}"), (i % 13) + 1))
        .collect()
}

pub fn quiet_log() -> SharedLog {
    MessageLog::shared(false, Some(2048))
}

pub fn log_contains(log: &SharedLog, needle: &str) -> bool {
    log.lock().unwrap().contains(needle)
}

pub fn log_count(log: &SharedLog, needle: &str) -> usize {
    log.lock()
        .unwrap()
        .get_all_messages()
        .iter()
        .filter(|m| m.content.contains(needle))
        .count()
}

/// A frame with no DS bits set: address 1 destination, 2 source, 3 BSSID.
pub fn data_frame(source: MacAddress, bssid: MacAddress) -> Vec<u8> {
    let mut frame = vec![0x08, 0x00, 0x00, 0x00];
    frame.extend_from_slice(&MacAddress::broadcast().0);
    frame.extend_from_slice(&source.0);
    frame.extend_from_slice(&bssid.0);
    frame.extend_from_slice(&[0x10, 0x00]);
    frame.extend_from_slice(&[0xaa, 0xaa, 0x03, 0x00, 0x00, 0x00, 0x08, 0x00]);
    frame
}
