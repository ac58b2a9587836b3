/// Libwifi's own [Error](error::Error) implementation
pub mod error;
/// The [FrameSummary](frame::FrameSummary) struct and its components.
pub mod frame;
/// Enums representing frame types and frame subtypes.
mod frame_types;
/// [nom] parsers for internal usage.
pub mod parsers;

use crate::error::Error;
use crate::frame::FrameSummary;
use crate::parsers::*;

// Re-exports for user convenience
pub use crate::frame_types::*;

use crc::{Crc, CRC_32_ISO_HDLC};

// CRC algorithm for FCS calculation
const CRC_32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Parse the header of a captured IEEE 802.11 management or data frame.
///
/// Beacons and probe responses additionally yield their SSID and DS channel.
/// Control and extension frames are rejected with [Error::UnhandledFrameType].
pub fn parse_frame(input: &[u8], fcs_included: bool) -> Result<FrameSummary, Error> {
    let input = if fcs_included {
        strip_fcs(input)?
    } else {
        input
    };

    let (remaining, frame_control) = parse_frame_control(input)?;
    if !frame_control.has_address_header() {
        return Err(Error::UnhandledFrameType(
            frame_control.frame_type,
            input.to_vec(),
        ));
    }

    let (body, header) = parse_address_header(frame_control, remaining)?;

    let (ssid, channel) = if frame_control.frame_subtype.announces_network() {
        let elements = parse_announcement_elements(body);
        (
            ssid_from_elements(&elements),
            channel_from_elements(&elements),
        )
    } else {
        (None, None)
    };

    Ok(FrameSummary {
        header,
        ssid,
        channel,
    })
}

/// Verify and remove the trailing frame check sequence.
pub fn strip_fcs(input: &[u8]) -> Result<&[u8], Error> {
    if input.len() < 4 {
        return Err(Error::Incomplete("Incomplete".to_string()));
    }

    let (frame_data, fcs_bytes) = input.split_at(input.len() - 4);
    let crc = CRC_32.checksum(frame_data);
    let fcs = u32::from_le_bytes([fcs_bytes[0], fcs_bytes[1], fcs_bytes[2], fcs_bytes[3]]);

    if crc != fcs {
        return Err(Error::FcsMismatch(crc, fcs));
    }
    Ok(frame_data)
}

/// Append the frame check sequence to an outgoing frame.
pub fn append_fcs(frame: &mut Vec<u8>) {
    let fcs = CRC_32.checksum(frame);
    frame.extend_from_slice(&fcs.to_le_bytes());
}
