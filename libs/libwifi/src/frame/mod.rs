/// Contains structs representing recurring sets of structured data.
/// For instance, MAC-Addresses, the address header, etc.
pub mod components;

use components::AddressHeader;

/// What discovery needs to know about one captured management or data frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSummary {
    pub header: AddressHeader,
    /// SSID element of a beacon or probe response. Empty for hidden networks.
    pub ssid: Option<String>,
    /// DS parameter set channel of a beacon or probe response.
    pub channel: Option<u8>,
}
