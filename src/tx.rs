use libwifi::frame::components::MacAddress;

use crate::util::safe_channel;

/// Longest SSID any template accepts. Longer input is truncated.
pub const MAX_SSID_LEN: usize = 31;

const SUPPORTED_RATES: [u8; 10] = [
    0x01, 0x08, /* supported rates, length */
    0x82, 0x84, 0x8b, 0x96, 0x24, 0x30, 0x48, 0x6c, /* 1, 2, 5.5, 11, 18, 24, 36, 54 */
];

const DS_PARAMETER_SET: [u8; 3] = [
    0x03, 0x01, /* ds parameter set, length */
    0x01, /* current channel */
];

const BEACON_HEADER: [u8; 38] = [
    0x80, 0x00, /* frame control: beacon */
    0x00, 0x00, /* duration */
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, /* destination */
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, /* source */
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, /* bssid */
    0xc0, 0x6c, /* sequence control */
    0x83, 0x51, 0xf7, 0x8f, 0x0f, 0x00, 0x00, 0x00, /* timestamp */
    0x64, 0x00, /* beacon interval */
    0x01, 0x04, /* capability info */
    0x00, 0x00, /* ssid tag, length */
];

const PROBE_REQUEST_HEADER: [u8; 26] = [
    0x40, 0x00, /* frame control: probe request */
    0x00, 0x00, /* duration */
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, /* destination */
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, /* source */
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, /* bssid */
    0x01, 0x00, /* sequence control */
    0x00, 0x00, /* ssid tag, length */
];

const DEAUTH_TEMPLATE: [u8; 26] = [
    0xc0, 0x00, /* frame control: deauthentication */
    0x3a, 0x01, /* duration */
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, /* receiver */
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, /* transmitter */
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, /* bssid */
    0xf0, 0xff, /* sequence control */
    0x02, 0x00, /* reason: previous authentication no longer valid */
];

const ADDR1_OFFSET: usize = 4;
const ADDR2_OFFSET: usize = 10;
const ADDR3_OFFSET: usize = 16;

const BEACON_SSID_LEN_OFFSET: usize = 37;
const BEACON_SSID_OFFSET: usize = BEACON_HEADER.len();
const BEACON_TRAILER_LEN: usize = SUPPORTED_RATES.len() + DS_PARAMETER_SET.len();
/// Distance from the end of the SSID to the DS channel byte.
const BEACON_CHANNEL_FROM_SSID_END: usize = BEACON_TRAILER_LEN - 1;

pub const BEACON_MAX_LEN: usize = BEACON_SSID_OFFSET + MAX_SSID_LEN + BEACON_TRAILER_LEN;

const PROBE_SSID_LEN_OFFSET: usize = 25;
const PROBE_SSID_OFFSET: usize = PROBE_REQUEST_HEADER.len();

pub const PROBE_REQUEST_MAX_LEN: usize = PROBE_SSID_OFFSET + MAX_SSID_LEN + SUPPORTED_RATES.len();

pub const DEAUTH_LEN: usize = DEAUTH_TEMPLATE.len();

// The channel offset below assumes this exact trailer. Changing the rate set means
// revisiting build_beacon.
const _: () = assert!(BEACON_CHANNEL_FROM_SSID_END == 12);
const _: () = assert!(BEACON_MAX_LEN == 82);
const _: () = assert!(PROBE_REQUEST_MAX_LEN == 67);
const _: () = assert!(DEAUTH_LEN == 26);

/// Where a builder takes an address from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressSource {
    Explicit(MacAddress),
    /// A fresh locally administered unicast address per use.
    Randomized,
}

impl AddressSource {
    pub fn resolve(self) -> MacAddress {
        match self {
            AddressSource::Explicit(mac) => mac,
            AddressSource::Randomized => MacAddress::random(),
        }
    }
}

impl From<MacAddress> for AddressSource {
    fn from(mac: MacAddress) -> Self {
        AddressSource::Explicit(mac)
    }
}

/// A frame built in a fixed-capacity buffer.
///
/// Only the first `len()` bytes are part of the frame; anything past them is never exposed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemplateFrame<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> TemplateFrame<N> {
    fn from_template(template: &[u8]) -> Self {
        let mut frame = TemplateFrame {
            bytes: [0u8; N],
            len: 0,
        };
        frame.put(0, template);
        frame
    }

    /// Copy `data` to `offset`, dropping whatever would land past the buffer.
    /// Returns the number of bytes written.
    fn put(&mut self, offset: usize, data: &[u8]) -> usize {
        if offset >= N {
            return 0;
        }
        let end = (offset + data.len()).min(N);
        let written = end - offset;
        self.bytes[offset..end].copy_from_slice(&data[..written]);
        self.len = self.len.max(end);
        written
    }

    fn put_mac(&mut self, offset: usize, mac: &MacAddress) {
        self.put(offset, &mac.encode());
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl<const N: usize> AsRef<[u8]> for TemplateFrame<N> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

fn clamp_ssid(ssid: &[u8]) -> &[u8] {
    &ssid[..ssid.len().min(MAX_SSID_LEN)]
}

/// Beacon for `ssid` announced on `channel`.
///
/// Transmitter and BSSID are resolved independently, so two `Randomized` sources yield two
/// different addresses. The channel is clamped into the band.
pub fn build_beacon(
    transmitter: AddressSource,
    bssid: AddressSource,
    ssid: &[u8],
    channel: u8,
) -> TemplateFrame<BEACON_MAX_LEN> {
    let ssid = clamp_ssid(ssid);
    let mut frame = TemplateFrame::from_template(&BEACON_HEADER);

    frame.put_mac(ADDR2_OFFSET, &transmitter.resolve());
    frame.put_mac(ADDR3_OFFSET, &bssid.resolve());
    frame.put(BEACON_SSID_LEN_OFFSET, &[ssid.len() as u8]);

    let mut offset = BEACON_SSID_OFFSET;
    offset += frame.put(offset, ssid);
    offset += frame.put(offset, &SUPPORTED_RATES);
    frame.put(offset, &DS_PARAMETER_SET);

    let channel_offset = BEACON_SSID_OFFSET + ssid.len() + BEACON_CHANNEL_FROM_SSID_END;
    frame.put(channel_offset, &[safe_channel(channel)]);
    frame
}

/// Undirected probe request carrying `ssid`.
pub fn build_probe_request(source: AddressSource, ssid: &[u8]) -> TemplateFrame<PROBE_REQUEST_MAX_LEN> {
    let ssid = clamp_ssid(ssid);
    let mut frame = TemplateFrame::from_template(&PROBE_REQUEST_HEADER);

    frame.put_mac(ADDR2_OFFSET, &source.resolve());
    frame.put(PROBE_SSID_LEN_OFFSET, &[ssid.len() as u8]);

    let mut offset = PROBE_SSID_OFFSET;
    offset += frame.put(offset, ssid);
    frame.put(offset, &SUPPORTED_RATES);
    frame
}

/// Deauthentication addressed to `station`, sent in the name of `bssid`.
pub fn build_deauth(station: AddressSource, bssid: &MacAddress) -> TemplateFrame<DEAUTH_LEN> {
    let mut frame = TemplateFrame::from_template(&DEAUTH_TEMPLATE);
    frame.put_mac(ADDR1_OFFSET, &station.resolve());
    frame.put_mac(ADDR2_OFFSET, bssid);
    frame.put_mac(ADDR3_OFFSET, bssid);
    frame
}
