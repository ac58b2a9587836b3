use super::{FrameControl, MacAddress};

/// The 24-byte header shared by management and data frames.
///
/// `address_4` is only present on data frames with both DS bits set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressHeader {
    pub frame_control: FrameControl,
    pub duration: [u8; 2],
    pub address_1: MacAddress,
    pub address_2: MacAddress,
    pub address_3: MacAddress,
    pub sequence_control: u16,
    pub address_4: Option<MacAddress>,
}

impl AddressHeader {
    pub fn receiver(&self) -> &MacAddress {
        &self.address_1
    }

    pub fn transmitter(&self) -> &MacAddress {
        &self.address_2
    }

    /// Address 3 is read as the network identifier regardless of the DS bits.
    pub fn bssid(&self) -> &MacAddress {
        &self.address_3
    }

    pub fn sequence_number(&self) -> u16 {
        self.sequence_control >> 4
    }
}
