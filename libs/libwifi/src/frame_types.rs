use strum_macros::Display;

/// The two-bit type field of the frame control.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
pub enum FrameType {
    Management,
    Control,
    Data,
    Extension,
}

impl FrameType {
    pub fn from_bits(bits: u8) -> FrameType {
        match bits & 0b11 {
            0 => FrameType::Management,
            1 => FrameType::Control,
            2 => FrameType::Data,
            _ => FrameType::Extension,
        }
    }
}

/// Subtypes we care about during discovery.
/// Everything else is kept as its raw 4-bit value.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
pub enum FrameSubType {
    // Management subtypes
    AssociationRequest,
    AssociationResponse,
    ReassociationRequest,
    ReassociationResponse,
    ProbeRequest,
    ProbeResponse,
    Beacon,
    Disassociation,
    Authentication,
    Deauthentication,
    Action,

    // Data subtypes
    Data,
    NullData,
    QosData,
    QosNull,

    Other(u8),
}

impl FrameSubType {
    pub fn from_bits(frame_type: FrameType, bits: u8) -> FrameSubType {
        let bits = bits & 0b1111;
        match frame_type {
            FrameType::Management => match bits {
                0 => FrameSubType::AssociationRequest,
                1 => FrameSubType::AssociationResponse,
                2 => FrameSubType::ReassociationRequest,
                3 => FrameSubType::ReassociationResponse,
                4 => FrameSubType::ProbeRequest,
                5 => FrameSubType::ProbeResponse,
                8 => FrameSubType::Beacon,
                10 => FrameSubType::Disassociation,
                11 => FrameSubType::Authentication,
                12 => FrameSubType::Deauthentication,
                13 => FrameSubType::Action,
                other => FrameSubType::Other(other),
            },
            FrameType::Data => match bits {
                0 => FrameSubType::Data,
                4 => FrameSubType::NullData,
                8 => FrameSubType::QosData,
                12 => FrameSubType::QosNull,
                other => FrameSubType::Other(other),
            },
            _ => FrameSubType::Other(bits),
        }
    }

    /// Beacons and probe responses carry the same fixed fields followed by tagged elements.
    pub fn announces_network(&self) -> bool {
        matches!(self, FrameSubType::Beacon | FrameSubType::ProbeResponse)
    }
}
