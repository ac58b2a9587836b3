use libwifi::frame::components::MacAddress;
use libwifi::{append_fcs, parse_frame, FrameSubType, FrameType};

fn beacon_payload() -> Vec<u8> {
    let mut payload = vec![
        0x80, 0x00, // FrameControl
        0x00, 0x00, // Duration
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // First Address
        0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, // Second Address
        0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, // Third Address
        0x10, 0x00, // Sequence Control
    ];
    payload.extend_from_slice(&[0; 8]); // Timestamp
    payload.extend_from_slice(&[0x64, 0x00]); // Beacon interval
    payload.extend_from_slice(&[0x11, 0x04]); // Capability info
    payload.extend_from_slice(&[0x00, 0x04, b'N', b'e', b't', b'1']);
    payload.extend_from_slice(&[0x01, 0x04, 0x82, 0x84, 0x8b, 0x96]);
    payload.extend_from_slice(&[0x03, 0x01, 0x06]);
    payload
}

#[test]
fn test_beacon_summary() {
    let summary = parse_frame(&beacon_payload(), false).expect("Payload should be valid");

    let fc = summary.header.frame_control;
    assert_eq!(fc.frame_type, FrameType::Management);
    assert_eq!(fc.frame_subtype, FrameSubType::Beacon);
    assert_eq!(*summary.header.bssid(), MacAddress([0xaa; 6]));
    assert!(summary.header.receiver().is_broadcast());
    assert_eq!(summary.header.sequence_number(), 1);
    assert_eq!(summary.ssid.as_deref(), Some("Net1"));
    assert_eq!(summary.channel, Some(6));
}

#[test]
fn test_beacon_with_fcs() {
    let mut payload = beacon_payload();
    append_fcs(&mut payload);

    let summary = parse_frame(&payload, true).expect("FCS should verify");
    assert_eq!(summary.ssid.as_deref(), Some("Net1"));

    let last = payload.len() - 1;
    payload[last] ^= 0xff;
    assert!(parse_frame(&payload, true).is_err());
}

#[test]
fn test_probe_request_has_no_announcement() {
    let payload = [
        0x40, 0x00, // FrameControl
        0x00, 0x00, // Duration
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // First Address
        0x02, 0x11, 0x22, 0x33, 0x44, 0x55, // Second Address
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // Third Address
        0x00, 0x00, // Sequence Control
        0x00, 0x00, // Wildcard SSID
    ];

    let summary = parse_frame(&payload, false).expect("Payload should be valid");
    assert_eq!(
        summary.header.frame_control.frame_subtype,
        FrameSubType::ProbeRequest
    );
    assert_eq!(
        *summary.header.transmitter(),
        MacAddress([0x02, 0x11, 0x22, 0x33, 0x44, 0x55])
    );
    assert_eq!(summary.ssid, None);
}

#[test]
fn test_truncated_header() {
    let payload = [0x80, 0x00, 0x00, 0x00, 0xff, 0xff];
    assert!(parse_frame(&payload, false).is_err());
}
