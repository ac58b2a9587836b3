//! A [`RadioDriver`] backed by pcapng files.
//!
//! Captured traffic is replayed from a radiotap (or bare 802.11) pcapng file and every
//! transmitted frame is written to an output pcapng with a radiotap header describing the
//! channel it would have gone out on. Timers are not fired by the driver; the host loop asks
//! for [`PcapRadio::due_timers`] and routes them.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use byteorder::{ByteOrder, LE};
use libwifi::frame::components::MacAddress;
use libwifi::FrameType;
use pcap_file::pcapng::blocks::enhanced_packet::EnhancedPacketBlock;
use pcap_file::pcapng::blocks::interface_description::InterfaceDescriptionBlock;
use pcap_file::pcapng::{Block, PcapNgReader, PcapNgWriter};
use pcap_file::DataLink;
use radiotap::Radiotap;

use crate::radio::{
    AuthMode, CaptureCallback, CapturedFrame, PacketKind, RadioDriver, RadioError, RadioMode,
    ScanRecord, TimerSlot,
};
use crate::util::{channel_to_frequency, frequency_to_channel, DEFAULT_CHANNEL};

const TX_RADIOTAP_LEN: usize = 14;
/// Channel (bit 3) and TX flags (bit 15).
const TX_RADIOTAP_PRESENT: u32 = 0x0000_8008;
/// 2GHz spectrum, CCK.
const TX_CHANNEL_FLAGS: u16 = 0x00a0;
/// No ACK expected.
const TX_FLAGS: u16 = 0x0008;

fn tx_radiotap_header(channel: u8) -> [u8; TX_RADIOTAP_LEN] {
    let mut header = [0u8; TX_RADIOTAP_LEN];
    LE::write_u16(&mut header[2..4], TX_RADIOTAP_LEN as u16);
    LE::write_u32(&mut header[4..8], TX_RADIOTAP_PRESENT);
    LE::write_u16(&mut header[8..10], channel_to_frequency(channel));
    LE::write_u16(&mut header[10..12], TX_CHANNEL_FLAGS);
    LE::write_u16(&mut header[12..14], TX_FLAGS);
    header
}

fn packet_kind(payload: &[u8]) -> PacketKind {
    match payload.first().map(|fc| FrameType::from_bits(fc >> 2)) {
        Some(FrameType::Management) => PacketKind::Management,
        Some(FrameType::Control) => PacketKind::Control,
        Some(FrameType::Data) => PacketKind::Data,
        _ => PacketKind::Misc,
    }
}

#[derive(Clone, Copy, Debug)]
struct PeriodicTimer {
    interval: Duration,
    next: Instant,
}

/// Counters describing what a [`PcapRadio`] has done so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PcapRadioStats {
    pub frames_replayed: u64,
    pub frames_delivered: u64,
    pub frames_undecodable: u64,
    pub frames_written: u64,
}

pub struct PcapRadio<R: Read, W: Write> {
    source: Option<PcapNgReader<R>>,
    interfaces: Vec<DataLink>,
    exhausted: bool,
    sink: Option<PcapNgWriter<W>>,
    mode: RadioMode,
    channel: u8,
    connected: bool,
    callback: Option<CaptureCallback>,
    networks: Vec<ScanRecord>,
    network_lookup: HashMap<MacAddress, usize>,
    timers: Vec<(TimerSlot, PeriodicTimer)>,
    stats: PcapRadioStats,
}

impl PcapRadio<BufReader<File>, BufWriter<File>> {
    /// Open the replay source and transmit sink. Either may be absent.
    pub fn open(replay: Option<&Path>, output: Option<&Path>) -> Result<Self, RadioError> {
        let source = match replay {
            Some(path) => Some(BufReader::new(File::open(path)?)),
            None => None,
        };
        let sink = match output {
            Some(path) => Some(BufWriter::new(File::create(path)?)),
            None => None,
        };
        PcapRadio::new(source, sink)
    }
}

impl<R: Read, W: Write> PcapRadio<R, W> {
    pub fn new(source: Option<R>, sink: Option<W>) -> Result<Self, RadioError> {
        let source = source.map(PcapNgReader::new).transpose()?;
        let sink = match sink {
            Some(sink) => {
                let mut writer = PcapNgWriter::new(sink)?;
                writer.write_pcapng_block(InterfaceDescriptionBlock {
                    linktype: DataLink::IEEE802_11_RADIOTAP,
                    snaplen: 0x0000,
                    options: vec![],
                })?;
                Some(writer)
            }
            None => None,
        };

        Ok(PcapRadio {
            exhausted: source.is_none(),
            source,
            interfaces: Vec::new(),
            sink,
            mode: RadioMode::Station,
            channel: DEFAULT_CHANNEL,
            connected: false,
            callback: None,
            networks: Vec::new(),
            network_lookup: HashMap::new(),
            timers: Vec::new(),
            stats: PcapRadioStats::default(),
        })
    }

    pub fn stats(&self) -> PcapRadioStats {
        self.stats
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_capturing(&self) -> bool {
        self.callback.is_some()
    }

    /// Whether the replay source has nothing left.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Networks announced in the replayed traffic so far.
    pub fn known_networks(&self) -> &[ScanRecord] {
        &self.networks
    }

    /// Replay up to `max` packets. Returns how many packets were read.
    pub fn pump(&mut self, max: usize) -> Result<usize, RadioError> {
        let mut read = 0;
        while read < max {
            match self.next_packet()? {
                Some(Some((linktype, data))) => {
                    read += 1;
                    self.handle_packet(linktype, &data);
                }
                Some(None) => {}
                None => break,
            }
        }
        Ok(read)
    }

    /// Next packet with its link type. `Some(None)` is a block that carries no packet.
    #[allow(clippy::type_complexity)]
    fn next_packet(&mut self) -> Result<Option<Option<(DataLink, Vec<u8>)>>, RadioError> {
        if self.exhausted {
            return Ok(None);
        }
        let Some(reader) = self.source.as_mut() else {
            self.exhausted = true;
            return Ok(None);
        };

        let block = match reader.next_block() {
            Some(Ok(block)) => block,
            Some(Err(e)) => {
                self.exhausted = true;
                return Err(e.into());
            }
            None => {
                self.exhausted = true;
                return Ok(None);
            }
        };

        let packet = match block {
            Block::InterfaceDescription(interface) => {
                self.interfaces.push(interface.linktype);
                None
            }
            Block::EnhancedPacket(packet) => self
                .interfaces
                .get(packet.interface_id as usize)
                .map(|linktype| (*linktype, packet.data.to_vec())),
            Block::SimplePacket(packet) => self
                .interfaces
                .first()
                .map(|linktype| (*linktype, packet.data.to_vec())),
            _ => None,
        };
        Ok(Some(packet))
    }

    fn handle_packet(&mut self, linktype: DataLink, data: &[u8]) {
        self.stats.frames_replayed += 1;

        let (payload, channel, rssi, fcs_included) = match linktype {
            DataLink::IEEE802_11_RADIOTAP => {
                let Ok(radiotap) = Radiotap::from_bytes(data) else {
                    self.stats.frames_undecodable += 1;
                    return;
                };
                let Some(payload) = data.get(radiotap.header.length..) else {
                    self.stats.frames_undecodable += 1;
                    return;
                };
                let channel = radiotap
                    .channel
                    .map(|channel| frequency_to_channel(channel.freq))
                    .unwrap_or(self.channel);
                let rssi = radiotap
                    .antenna_signal
                    .map(|signal| i32::from(signal.value))
                    .unwrap_or(0);
                let fcs = radiotap.flags.map(|flags| flags.fcs).unwrap_or(false);
                (payload, channel, rssi, fcs)
            }
            DataLink::IEEE802_11 => (data, self.channel, 0, false),
            _ => {
                self.stats.frames_undecodable += 1;
                return;
            }
        };

        self.learn_network(payload, channel, fcs_included);

        if let Some(callback) = self.callback.as_mut() {
            let frame = CapturedFrame {
                payload,
                channel,
                rssi,
                kind: packet_kind(payload),
                fcs_included,
            };
            callback(&frame);
            self.stats.frames_delivered += 1;
        }
    }

    fn learn_network(&mut self, payload: &[u8], channel: u8, fcs_included: bool) {
        let Ok(summary) = libwifi::parse_frame(payload, fcs_included) else {
            return;
        };
        if !summary.header.frame_control.frame_subtype.announces_network() {
            return;
        }
        let bssid = *summary.header.bssid();
        if !bssid.is_real_device() {
            return;
        }

        let ssid = summary.ssid.unwrap_or_default();
        let channel = summary.channel.unwrap_or(channel);
        match self.network_lookup.get(&bssid) {
            Some(index) => {
                let network = &mut self.networks[*index];
                if network.ssid.is_empty() {
                    network.ssid = ssid;
                }
                network.channel = channel;
            }
            None => {
                self.network_lookup.insert(bssid, self.networks.len());
                self.networks.push(ScanRecord {
                    bssid,
                    ssid,
                    channel,
                    auth_mode: AuthMode::Unknown,
                });
            }
        }
    }

    /// Timers whose deadline has passed, in the order they were armed. Each fired timer is
    /// rescheduled one interval from `now` when it has fallen behind.
    pub fn due_timers(&mut self, now: Instant) -> Vec<TimerSlot> {
        let mut due = Vec::new();
        for (slot, timer) in self.timers.iter_mut() {
            if timer.next <= now {
                due.push(*slot);
                timer.next += timer.interval;
                if timer.next <= now {
                    timer.next = now + timer.interval;
                }
            }
        }
        due
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|(_, timer)| timer.next).min()
    }

    pub fn flush(&mut self) -> Result<(), RadioError> {
        if let Some(sink) = self.sink.as_mut() {
            sink.get_mut().flush()?;
        }
        Ok(())
    }

    /// Flush and hand back the sink.
    pub fn into_sink(self) -> Result<Option<W>, RadioError> {
        match self.sink {
            Some(sink) => {
                let mut inner = sink.into_inner();
                inner.flush()?;
                Ok(Some(inner))
            }
            None => Ok(None),
        }
    }
}

impl<R: Read, W: Write> RadioDriver for PcapRadio<R, W> {
    fn set_mode(&mut self, mode: RadioMode) -> Result<(), RadioError> {
        self.mode = mode;
        if mode == RadioMode::Null {
            self.connected = false;
        }
        Ok(())
    }

    fn mode(&self) -> Result<RadioMode, RadioError> {
        Ok(self.mode)
    }

    fn disconnect(&mut self) -> Result<(), RadioError> {
        self.connected = false;
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), RadioError> {
        self.mode = RadioMode::Station;
        self.connected = true;
        Ok(())
    }

    /// Replays whatever is left of the source, then reports every network announced in it.
    fn scan_networks(&mut self) -> Result<Vec<ScanRecord>, RadioError> {
        if !matches!(self.mode, RadioMode::Station | RadioMode::StationAccessPoint) {
            return Err(RadioError::Scan(format!("radio is in {} mode", self.mode)));
        }
        while self.pump(usize::MAX)? > 0 {}
        Ok(self.networks.clone())
    }

    fn set_promiscuous_capture(
        &mut self,
        callback: Option<CaptureCallback>,
    ) -> Result<(), RadioError> {
        self.callback = callback;
        Ok(())
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), RadioError> {
        if !(1..=14).contains(&channel) {
            return Err(RadioError::Channel(
                channel,
                "outside the 2.4GHz band".to_string(),
            ));
        }
        self.channel = channel;
        Ok(())
    }

    fn transmit_raw(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        if self.mode != RadioMode::AccessPoint {
            return Err(RadioError::Transmit(format!(
                "radio is in {} mode",
                self.mode
            )));
        }
        if let Some(sink) = self.sink.as_mut() {
            let mut data = Vec::with_capacity(TX_RADIOTAP_LEN + frame.len());
            data.extend_from_slice(&tx_radiotap_header(self.channel));
            data.extend_from_slice(frame);

            let packet = EnhancedPacketBlock {
                interface_id: 0,
                timestamp: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default(),
                original_len: data.len() as u32,
                data: Cow::from(data),
                options: vec![],
            };
            sink.write_pcapng_block(packet)?;
        }
        self.stats.frames_written += 1;
        Ok(())
    }

    fn start_periodic_timer(&mut self, slot: TimerSlot, interval: Duration) -> Result<(), RadioError> {
        if interval.is_zero() {
            return Err(RadioError::Timer(slot, "zero interval".to_string()));
        }
        let timer = PeriodicTimer {
            interval,
            next: Instant::now() + interval,
        };
        match self.timers.iter_mut().find(|(armed, _)| *armed == slot) {
            Some((_, existing)) => *existing = timer,
            None => self.timers.push((slot, timer)),
        }
        Ok(())
    }

    fn stop_periodic_timer(&mut self, slot: TimerSlot) -> Result<(), RadioError> {
        self.timers.retain(|(armed, _)| *armed != slot);
        Ok(())
    }
}
