use nom::bytes::complete::take;
use nom::combinator::cond;
use nom::number::complete::le_u16;
use nom::sequence::tuple;

use super::{clone_slice, parse_mac};
use crate::error::Error;
use crate::frame::components::{AddressHeader, FrameControl};
use crate::frame_types::{FrameSubType, FrameType};

/// Parse the three-address header of a management or data frame.
///
/// The optional fourth address and the QoS control field are consumed as well, so the
/// returned slice always starts at the frame body.
pub fn parse_address_header(
    frame_control: FrameControl,
    input: &[u8],
) -> Result<(&[u8], AddressHeader), Error> {
    let (remaining, (duration, address_1, address_2, address_3, sequence_control)) =
        tuple((take(2usize), parse_mac, parse_mac, parse_mac, le_u16))(input)?;

    let is_data = frame_control.frame_type == FrameType::Data;
    let (remaining, address_4) = cond(
        is_data && frame_control.to_ds() && frame_control.from_ds(),
        parse_mac,
    )(remaining)?;

    let is_qos = matches!(
        frame_control.frame_subtype,
        FrameSubType::QosData | FrameSubType::QosNull
    );
    let (remaining, _qos) = cond(
        is_data && is_qos,
        take::<_, _, nom::error::Error<&[u8]>>(2usize),
    )(remaining)?;

    Ok((
        remaining,
        AddressHeader {
            frame_control,
            duration: clone_slice::<2>(duration),
            address_1,
            address_2,
            address_3,
            sequence_control,
            address_4,
        },
    ))
}
