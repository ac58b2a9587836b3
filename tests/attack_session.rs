mod common;

use std::time::{Duration, Instant};

use common::{log_contains, log_count, mac, network, networks, quiet_log, MockRadio};
use oxide_marauder::attack::{AttackConfig, AttackMode, AttackSession, TickOutcome};
use oxide_marauder::radio::{RadioMode, TimerSlot};

fn session() -> (AttackSession, oxide_marauder::status::SharedLog) {
    let log = quiet_log();
    (AttackSession::new(AttackConfig::default(), log.clone()), log)
}

fn ssid_of_beacon(frame: &[u8]) -> &[u8] {
    let len = frame[37] as usize;
    &frame[38..38 + len]
}

fn ssid_of_probe(frame: &[u8]) -> &[u8] {
    let len = frame[25] as usize;
    &frame[26..26 + len]
}

#[test]
fn unimplemented_mode_is_rejected_and_radio_restored() {
    let (mut attack, log) = session();
    let mut radio = MockRadio::with_networks(RadioMode::Station, networks(3));

    for mode in [AttackMode::BadMsgBroadcast, AttackMode::AssocSleepBroadcast] {
        assert!(!attack.start(&mut radio, mode));
        assert!(!attack.is_running());
        assert_eq!(radio.mode, RadioMode::Station);
        assert!(!radio.is_armed(TimerSlot::AttackTick));
    }
    assert_eq!(radio.scans, 0);
    assert!(log_contains(&log, "WiFi attack \"Bad Msg\" not implemented yet"));
}

#[test]
fn scan_failure_aborts_modes_needing_access_points() {
    let (mut attack, log) = session();
    let mut radio = MockRadio::new(RadioMode::AccessPoint);
    radio.fail_scan = true;

    assert!(!attack.start(&mut radio, AttackMode::DeauthFlood));
    assert!(!attack.is_running());
    assert_eq!(radio.mode, RadioMode::AccessPoint);
    assert!(log_contains(&log, "unavailable (env init failed)"));

    // empty scans are failures too
    radio.fail_scan = false;
    assert!(!attack.start(&mut radio, AttackMode::BeaconList));
    assert!(log_contains(&log, "scan returned zero access points"));
}

#[test]
fn standalone_beacons_run_without_networks() {
    let (mut attack, _log) = session();
    let mut radio = MockRadio::new(RadioMode::Null);
    radio.fail_scan = true;

    for mode in [
        AttackMode::BeaconRandom,
        AttackMode::FunnyBeacon,
        AttackMode::RickRollBeacon,
    ] {
        assert!(attack.start(&mut radio, mode));
        assert_eq!(attack.current_attack(), mode);
        assert_eq!(radio.mode, RadioMode::AccessPoint);
        assert!(radio.is_armed(TimerSlot::AttackTick));
        assert_eq!(
            radio.timers[&TimerSlot::AttackTick],
            Duration::from_millis(5)
        );
    }
    assert_eq!(radio.scans, 0);
}

#[test]
fn double_stop_is_a_no_op() {
    let (mut attack, log) = session();
    let mut radio = MockRadio::new(RadioMode::Station);

    assert!(attack.start(&mut radio, AttackMode::BeaconRandom));
    attack.stop(&mut radio);
    assert!(!attack.is_running());
    assert_eq!(radio.mode, RadioMode::Station);
    assert!(!radio.is_armed(TimerSlot::AttackTick));

    let history = radio.mode_history.len();
    attack.stop(&mut radio);
    assert_eq!(radio.mode_history.len(), history);
    assert_eq!(log_count(&log, "WiFi attack controller idle"), 1);
}

#[test]
fn stop_reconnects_client_when_configured() {
    let log = quiet_log();
    let mut attack = AttackSession::new(AttackConfig::default().restore_client(true), log);
    let mut radio = MockRadio::new(RadioMode::Station);

    assert!(attack.start(&mut radio, AttackMode::FunnyBeacon));
    attack.stop(&mut radio);
    assert_eq!(radio.reconnects, 1);
    assert_eq!(radio.mode, RadioMode::Station);
}

#[test]
fn unknown_mode_query_restores_to_null() {
    let (mut attack, _log) = session();
    let mut radio = MockRadio::new(RadioMode::Station);
    radio.fail_mode_query = true;

    assert!(attack.start(&mut radio, AttackMode::BeaconRandom));
    attack.stop(&mut radio);
    assert_eq!(radio.mode, RadioMode::Null);
}

#[test]
fn toggle_starts_and_stops() {
    let (mut attack, _log) = session();
    let mut radio = MockRadio::new(RadioMode::Station);

    assert!(attack.toggle(&mut radio, AttackMode::RickRollBeacon));
    assert!(attack.is_running());
    assert!(attack.toggle(&mut radio, AttackMode::FunnyBeacon));
    assert_eq!(attack.current_attack(), AttackMode::FunnyBeacon);
    assert!(!attack.toggle(&mut radio, AttackMode::FunnyBeacon));
    assert!(!attack.is_running());
    assert_eq!(radio.mode, RadioMode::Station);
}

#[test]
fn idle_session_ticks_do_nothing() {
    let (mut attack, _log) = session();
    let mut radio = MockRadio::new(RadioMode::Station);
    assert_eq!(attack.run_once(&mut radio), TickOutcome::Idle);
    assert!(radio.transmitted.is_empty());
}

#[test]
fn ap_clone_round_robin_keeps_real_addresses() {
    let (mut attack, _log) = session();
    let mut radio = MockRadio::with_networks(RadioMode::Station, networks(12));
    let now = Instant::now();

    assert!(attack.start_at(&mut radio, AttackMode::ApCloneSpam, now));
    for _ in 0..4 {
        assert_eq!(attack.run_once_at(&mut radio, now), TickOutcome::Continue);
    }

    let sent = radio.take_transmitted();
    assert_eq!(sent.len(), 24);
    for (i, (channel, frame)) in sent.iter().enumerate() {
        let expected = &attack.access_points()[i % 12];
        assert_eq!(&frame[10..16], &expected.bssid.0);
        assert_eq!(&frame[16..22], &expected.bssid.0);
        assert_eq!(ssid_of_beacon(frame), expected.ssid.as_bytes());
        assert_eq!(*channel, expected.channel);
        assert_eq!(*frame.last().unwrap(), expected.channel);
    }
}

#[test]
fn beacon_list_round_robin_randomizes_addresses() {
    let (mut attack, _log) = session();
    let mut radio = MockRadio::with_networks(RadioMode::Station, networks(4));
    let now = Instant::now();

    assert!(attack.start_at(&mut radio, AttackMode::BeaconList, now));
    attack.run_once_at(&mut radio, now);
    attack.run_once_at(&mut radio, now);

    let sent = radio.frames();
    assert_eq!(sent.len(), 12);
    for (i, frame) in sent.iter().enumerate() {
        let expected = &attack.access_points()[i % 4];
        assert_eq!(ssid_of_beacon(frame), expected.ssid.as_bytes());
        assert_ne!(&frame[10..16], &expected.bssid.0);
        assert_eq!(frame[10] & 0x03, 0x02);
        assert_eq!(frame[16] & 0x03, 0x02);
    }
}

#[test]
fn probe_flood_cycles_through_snapshot() {
    let (mut attack, _log) = session();
    let mut radio = MockRadio::with_networks(RadioMode::Station, networks(5));
    let now = Instant::now();

    assert!(attack.start_at(&mut radio, AttackMode::ProbeFlood, now));
    attack.run_once_at(&mut radio, now);

    let sent = radio.take_transmitted();
    assert_eq!(sent.len(), 20);
    for (i, (channel, frame)) in sent.iter().enumerate() {
        let expected = &attack.access_points()[i % 5];
        assert_eq!(frame[0], 0x40);
        assert_eq!(ssid_of_probe(frame), expected.ssid.as_bytes());
        assert_eq!(*channel, expected.channel);
        assert_eq!(frame[10] & 0x03, 0x02);
    }
}

#[test]
fn deauth_flood_hits_scanned_networks() {
    let (mut attack, _log) = session();
    let list = networks(3);
    let mut radio = MockRadio::with_networks(RadioMode::Station, list.clone());

    assert!(attack.start(&mut radio, AttackMode::DeauthFlood));
    attack.run_once(&mut radio);

    let sent = radio.take_transmitted();
    assert_eq!(sent.len(), 25);
    for (channel, frame) in &sent {
        assert_eq!(frame.len(), 26);
        assert_eq!(frame[0], 0xc0);
        assert_eq!(frame[4] & 0x03, 0x02);
        let target = list
            .iter()
            .find(|ap| frame[10..16] == ap.bssid.0)
            .expect("deauth for an unknown network");
        assert_eq!(&frame[16..22], &target.bssid.0);
        assert_eq!(*channel, target.channel);
    }
}

#[test]
fn novelty_beacons_cycle_one_per_tick() {
    let (mut attack, _log) = session();
    let mut radio = MockRadio::new(RadioMode::Null);

    assert!(attack.start(&mut radio, AttackMode::RickRollBeacon));
    for _ in 0..9 {
        attack.run_once(&mut radio);
    }
    let sent = radio.frames();
    assert_eq!(sent.len(), 9);
    assert_eq!(ssid_of_beacon(&sent[0]), b"01 Never gonna give you up");
    assert_eq!(ssid_of_beacon(&sent[7]), b"08 and hurt you");
    assert_eq!(ssid_of_beacon(&sent[8]), ssid_of_beacon(&sent[0]));
    for frame in &sent {
        let channel = *frame.last().unwrap();
        assert!((1..=11).contains(&channel));
    }
}

#[test]
fn random_beacons_use_six_character_names() {
    let (mut attack, _log) = session();
    let mut radio = MockRadio::new(RadioMode::Null);

    assert!(attack.start(&mut radio, AttackMode::BeaconRandom));
    attack.run_once(&mut radio);
    let sent = radio.frames();
    assert_eq!(sent.len(), 6);
    for frame in &sent {
        assert_eq!(frame[37], 6);
        assert_eq!(frame.len(), 38 + 6 + 13);
    }
}

#[test]
fn preferred_target_moves_to_head_of_snapshot() {
    let (mut attack, log) = session();
    let list = networks(4);
    let mut radio = MockRadio::with_networks(RadioMode::Station, list.clone());
    let now = Instant::now();

    attack.set_preferred_target(list[2].bssid, list[2].channel);
    assert!(attack.start_at(&mut radio, AttackMode::ApCloneSpam, now));

    let order: Vec<_> = attack.access_points().iter().map(|ap| ap.bssid).collect();
    assert_eq!(
        order,
        vec![list[2].bssid, list[1].bssid, list[0].bssid, list[3].bssid]
    );
    assert!(log_contains(&log, "WiFi attack prioritizing selected target"));

    attack.run_once_at(&mut radio, now);
    assert_eq!(&radio.frames()[0][16..22], &list[2].bssid.0);

    attack.set_preferred_target(list[3].bssid, list[3].channel);
    assert_eq!(attack.access_points()[0].bssid, list[3].bssid);
    assert_eq!(attack.access_points()[3].bssid, list[2].bssid);
}

#[test]
fn missing_preferred_target_leaves_order_alone() {
    let (mut attack, log) = session();
    let list = networks(3);
    let mut radio = MockRadio::with_networks(RadioMode::Station, list.clone());

    assert!(attack.start(&mut radio, AttackMode::BeaconList));
    attack.set_preferred_target(mac(0xee), 6);

    let order: Vec<_> = attack.access_points().iter().map(|ap| ap.bssid).collect();
    let expected: Vec<_> = list.iter().map(|ap| ap.bssid).collect();
    assert_eq!(order, expected);
    assert!(log_contains(&log, "Preferred WiFi target not found in scan results"));
}

#[test]
fn targeted_mode_without_station_skips_ticks() {
    let (mut attack, log) = session();
    let mut radio = MockRadio::with_networks(RadioMode::Station, networks(2));

    attack.set_preferred_target(mac(1), 2);
    assert!(attack.start(&mut radio, AttackMode::DeauthTargeted));
    for _ in 0..3 {
        assert_eq!(attack.run_once(&mut radio), TickOutcome::Continue);
    }
    assert!(attack.is_running());
    assert!(radio.transmitted.is_empty());
    assert_eq!(log_count(&log, "No station selected for Deauth Targeted"), 1);
}

#[test]
fn retargeting_same_access_point_keeps_station() {
    let bssid = mac(0x0a);
    let station = mac(0x5c);
    let (mut attack, log) = session();
    let mut radio = MockRadio::with_networks(
        RadioMode::Station,
        vec![network(0x0a, "Target", 11), network(0x0b, "Other", 3)],
    );

    attack.set_preferred_station(bssid, station, 11);
    assert!(attack.start(&mut radio, AttackMode::DeauthTargeted));

    attack.set_preferred_target(bssid, 6);
    let preferred = attack.preferred().unwrap();
    assert_eq!(preferred.station, Some(station));
    assert_eq!(preferred.channel, 6);

    attack.run_once(&mut radio);
    let sent = radio.take_transmitted();
    assert_eq!(sent.len(), 25);
    assert!(sent.iter().all(|(channel, frame)| *channel == 6 && frame[4..10] == station.0));
    assert_eq!(log_count(&log, "No station selected"), 0);

    attack.set_preferred_target(mac(0x0b), 3);
    assert_eq!(attack.preferred().unwrap().station, None);
}

#[test]
fn targeted_modes_deauth_the_preferred_station() {
    let bssid = mac(0x0a);
    let station = mac(0x5c);
    for mode in [
        AttackMode::DeauthTargeted,
        AttackMode::BadMsgTargeted,
        AttackMode::AssocSleepTargeted,
    ] {
        let (mut attack, _log) = session();
        let mut radio = MockRadio::with_networks(
            RadioMode::Station,
            vec![network(0x0a, "Target", 11), network(0x0b, "Other", 3)],
        );

        attack.set_preferred_station(bssid, station, 11);
        assert!(attack.start(&mut radio, mode));
        let preferred = attack.preferred().unwrap();
        assert_eq!(preferred.station, Some(station));

        attack.run_once(&mut radio);
        let sent = radio.take_transmitted();
        assert_eq!(sent.len(), 25);
        for (channel, frame) in &sent {
            assert_eq!(*channel, 11);
            assert_eq!(&frame[4..10], &station.0);
            assert_eq!(&frame[10..16], &bssid.0);
            assert_eq!(&frame[16..22], &bssid.0);
        }

        attack.stop(&mut radio);
        assert!(attack.preferred().is_none());
    }
}

#[test]
fn transmit_failures_are_counted_not_fatal() {
    let (mut attack, log) = session();
    let mut radio = MockRadio::new(RadioMode::Null);

    assert!(attack.start(&mut radio, AttackMode::BeaconRandom));
    radio.fail_transmit = true;
    assert_eq!(attack.run_once(&mut radio), TickOutcome::Continue);
    assert!(attack.is_running());
    assert_eq!(attack.transmit_failures(), 6);
    assert_eq!(attack.frames_sent_total(), 0);
    assert!(log_contains(&log, "WiFi attack transmit failed"));

    radio.fail_transmit = false;
    attack.run_once(&mut radio);
    assert_eq!(attack.frames_sent_total(), 6);
}

#[test]
fn rate_is_reported_once_per_interval() {
    let (mut attack, log) = session();
    let mut radio = MockRadio::new(RadioMode::Null);
    let start = Instant::now();

    assert!(attack.start_at(&mut radio, AttackMode::BeaconRandom, start));
    attack.run_once_at(&mut radio, start);
    attack.run_once_at(&mut radio, start + Duration::from_millis(500));
    assert!(!log_contains(&log, "frames/s"));

    attack.run_once_at(&mut radio, start + Duration::from_millis(1000));
    assert!(log_contains(&log, "WiFi attack Beacon Spam Random: 18 frames/s"));

    attack.run_once_at(&mut radio, start + Duration::from_millis(2000));
    assert!(log_contains(&log, "WiFi attack Beacon Spam Random: 6 frames/s"));
    assert_eq!(attack.frames_sent_total(), 24);
}

#[test]
fn restart_while_running_keeps_preferred_target() {
    let (mut attack, _log) = session();
    let list = networks(3);
    let mut radio = MockRadio::with_networks(RadioMode::Station, list.clone());

    attack.set_preferred_target(list[1].bssid, list[1].channel);
    assert!(attack.start(&mut radio, AttackMode::BeaconList));
    assert!(attack.start(&mut radio, AttackMode::ApCloneSpam));
    assert_eq!(radio.scans, 2);
    assert_eq!(attack.preferred().map(|p| p.bssid), Some(list[1].bssid));
    assert_eq!(attack.access_points()[0].bssid, list[1].bssid);
}
