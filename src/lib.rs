//! Passive 2.4GHz access point and station discovery, and an 802.11 management frame
//! injection engine.
//!
//! The engine never touches hardware directly. Everything goes through a
//! [`radio::RadioDriver`]; [`capture::PcapRadio`] is a file-backed driver for dry runs.

pub mod attack;
pub mod capture;
pub mod devices;
pub mod environment;
pub mod hopper;
pub mod radio;
pub mod runtime;
pub mod status;
pub mod tx;
pub mod util;
