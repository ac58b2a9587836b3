use nom::bytes::complete::take;
use nom::multi::many0;
use nom::number::complete::u8 as byte;
use nom::IResult;

/// Element id of the SSID element.
pub const ELEMENT_SSID: u8 = 0;
/// Element id of the DS parameter set (current channel).
pub const ELEMENT_DS_PARAMETER: u8 = 3;

/// Timestamp, beacon interval and capability info in front of the elements.
const FIXED_PARAMETERS_LEN: usize = 12;

/// One tagged information element.
pub fn parse_element(input: &[u8]) -> IResult<&[u8], (u8, &[u8])> {
    let (input, id) = byte(input)?;
    let (input, length) = byte(input)?;
    let (input, data) = take(length)(input)?;
    Ok((input, (id, data)))
}

/// All complete elements of a beacon or probe response body.
/// A truncated trailing element is dropped.
pub fn parse_announcement_elements(body: &[u8]) -> Vec<(u8, &[u8])> {
    let Ok((elements, _fixed)) = take::<_, _, nom::error::Error<&[u8]>>(FIXED_PARAMETERS_LEN)(body)
    else {
        return Vec::new();
    };
    many0(parse_element)(elements)
        .map(|(_, parsed)| parsed)
        .unwrap_or_default()
}

pub fn ssid_from_elements(elements: &[(u8, &[u8])]) -> Option<String> {
    elements
        .iter()
        .find(|(id, _)| *id == ELEMENT_SSID)
        .map(|(_, data)| String::from_utf8_lossy(data).replace('\0', ""))
}

pub fn channel_from_elements(elements: &[(u8, &[u8])]) -> Option<u8> {
    elements
        .iter()
        .find(|(id, data)| *id == ELEMENT_DS_PARAMETER && data.len() == 1)
        .map(|(_, data)| data[0])
}
