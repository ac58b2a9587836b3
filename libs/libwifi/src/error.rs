use nom::Needed;

use crate::frame_types::FrameType;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Only management and data frames carry the three-address header we extract.
    /// Control and extension frames end up here together with their raw bytes.
    #[error("This frame type isn't handled: {:?}", .0)]
    UnhandledFrameType(FrameType, Vec<u8>),
    #[error("A parsing failure occurred: \n{}\ndata: {:?}", .0, .1)]
    Failure(String, Vec<u8>),
    #[error("There wasn't enough data. {}", .0)]
    Incomplete(String),
    #[error("(FCS) mismatch {:08x} {:08x}", .0, .1)]
    FcsMismatch(u32, u32),
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for Error {
    /// Convert nom's borrowed error into an owned one so callers don't inherit the input lifetime.
    fn from(error: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        match error {
            nom::Err::Incomplete(needed) => match needed {
                Needed::Size(size) => {
                    Error::Incomplete(format!("At least {size} bytes are missing"))
                }
                Needed::Unknown => Error::Incomplete(String::new()),
            },
            nom::Err::Failure(error) | nom::Err::Error(error) => Error::Failure(
                format!(
                    "An error occured while parsing the data: nom::ErrorKind is {:?}",
                    error.code
                ),
                error.input.to_vec(),
            ),
        }
    }
}
