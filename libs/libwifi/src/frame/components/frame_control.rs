use crate::frame_types::*;

#[inline]
/// Mini helper to check, whether a bit is set or not.
fn flag_is_set(data: u8, bit: u8) -> bool {
    data & (1 << bit) != 0
}

/// The very first two bytes of every frame contain the FrameControl header.
///
/// First byte:
///
/// - **bit_0-1**: Protocol version.
/// - **bit_2-3**: [FrameType]
/// - **bit_4-7**: [FrameSubType]
///
/// Second byte (Flags):
/// - **bit_0** `to_ds`
/// - **bit_1** `from_ds`
/// - **bit_3** `retry`
/// - **bit_6** `protected`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameControl {
    pub protocol_version: u8,
    pub frame_type: FrameType,
    pub frame_subtype: FrameSubType,
    pub flags: u8,
}

impl FrameControl {
    pub fn to_ds(&self) -> bool {
        flag_is_set(self.flags, 0)
    }

    pub fn from_ds(&self) -> bool {
        flag_is_set(self.flags, 1)
    }

    pub fn retry(&self) -> bool {
        flag_is_set(self.flags, 3)
    }

    pub fn protected(&self) -> bool {
        flag_is_set(self.flags, 6)
    }

    /// Management and data frames both use the three-address layout.
    pub fn has_address_header(&self) -> bool {
        matches!(self.frame_type, FrameType::Management | FrameType::Data)
    }
}
