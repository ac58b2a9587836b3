mod frame_control;
mod header;
mod mac_address;

pub use frame_control::FrameControl;
pub use header::AddressHeader;
pub use mac_address::*;
