use std::fmt;

use rand::{thread_rng, RngCore};

/// This is our representation of a MAC-address
///
/// ```
/// use libwifi::frame::components::MacAddress;
///
/// let address = MacAddress([255, 255, 255, 255, 255, 255]);
/// println!("{}", address.is_broadcast());
/// // -> true
/// ```
///
#[derive(Clone, Debug, Eq, PartialEq, Hash, Copy, Ord, PartialOrd, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Generate string with delimitters.
    pub fn to_long_string(&self) -> String {
        format!(
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5],
        )
    }

    /// Random unicast, locally administered address.
    pub fn random() -> Self {
        let mut bytes = [0u8; 6];
        thread_rng().fill_bytes(&mut bytes);
        MacAddress(bytes).into_local_unicast()
    }

    /// Clear the multicast bit and set the locally-administered bit of the first octet.
    pub fn into_local_unicast(mut self) -> Self {
        self.0[0] &= 0xFE;
        self.0[0] |= 0x02;
        self
    }

    pub fn broadcast() -> Self {
        MacAddress([255, 255, 255, 255, 255, 255])
    }

    pub fn zeroed() -> Self {
        MacAddress([0, 0, 0, 0, 0, 0])
    }

    /// Encode mac address for network.
    pub fn encode(&self) -> [u8; 6] {
        self.0
    }

    /// Check if this is a private address (locally set bit)
    pub fn is_private(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Check if this is a multicast address
    pub fn is_mcast(&self) -> bool {
        self.0[0] & 0x01 == 1
    }

    /// Check whether this MAC addresses the whole network.
    pub fn is_broadcast(&self) -> bool {
        self.0 == [255, 255, 255, 255, 255, 255]
    }

    pub fn is_zeroed(&self) -> bool {
        self.0 == [0, 0, 0, 0, 0, 0]
    }

    /// Neither broadcast, multicast nor all-zero.
    pub fn is_real_device(&self) -> bool {
        !(self.is_broadcast() || self.is_mcast() || self.is_zeroed())
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5],
        )
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MacParseError {
    InvalidDigit,
    InvalidLength,
}

impl fmt::Display for MacParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacParseError::InvalidDigit => write!(f, "Invalid hex digit in mac address"),
            MacParseError::InvalidLength => write!(f, "Mac address must be six octets"),
        }
    }
}

impl std::error::Error for MacParseError {}

impl std::str::FromStr for MacAddress {
    type Err = MacParseError;

    /// Accepts `aa:bb:cc:dd:ee:ff`, `aa-bb-cc-dd-ee-ff` and `aabbccddeeff`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim().to_lowercase();
        let octets: Vec<&str> = if input.contains(':') {
            input.split(':').collect()
        } else if input.contains('-') {
            input.split('-').collect()
        } else if input.len() == 12 && input.is_ascii() {
            (0..12).step_by(2).map(|i| &input[i..i + 2]).collect()
        } else {
            return Err(MacParseError::InvalidLength);
        };

        if octets.len() != 6 {
            return Err(MacParseError::InvalidLength);
        }

        let mut array = [0u8; 6];
        for (slot, octet) in array.iter_mut().zip(octets) {
            if octet.len() != 2 {
                return Err(MacParseError::InvalidDigit);
            }
            *slot = u8::from_str_radix(octet, 16).map_err(|_| MacParseError::InvalidDigit)?;
        }

        Ok(MacAddress(array))
    }
}
