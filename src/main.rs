use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use itertools::Itertools;
use libwifi::frame::components::MacAddress;
use strum::IntoEnumIterator;

use oxide_marauder::attack::{AttackConfig, AttackMode, TickOutcome};
use oxide_marauder::capture::PcapRadio;
use oxide_marauder::devices::TrackerConfig;
use oxide_marauder::runtime::MarauderRuntime;
use oxide_marauder::status::{report, MessageLog, MessageType};
use oxide_marauder::util::DEFAULT_CHANNEL;

/// Packets replayed per loop iteration while tracking.
const PUMP_BATCH: usize = 64;
const IDLE_SLEEP: Duration = Duration::from_millis(1);

#[derive(Parser)]
#[command(name = "oxide-marauder")]
#[command(author = "Ryan Butler (Ragnt)")]
#[command(about = "Finds access points and stations, and floods them with management frames.", long_about = None)]
#[command(version)]
struct Arguments {
    #[arg(short, long)]
    /// Radiotap pcapng capture to replay as received traffic.
    replay: Option<PathBuf>,

    #[arg(short, long)]
    /// Optional - pcapng file receiving every transmitted frame.
    output: Option<PathBuf>,

    #[arg(short, long)]
    /// Attack to run, by name (deauth-flood) or label ("Deauth Flood").
    attack: Option<String>,

    #[arg(short, long)]
    /// BSSID to favour.
    target: Option<String>,

    #[arg(short, long)]
    /// Station of the target network, enables the targeted attacks.
    station: Option<String>,

    #[arg(short, long, default_value_t = DEFAULT_CHANNEL)]
    /// Channel of the target.
    channel: u8,

    #[arg(short, long)]
    /// Seconds to run before stopping. Runs until Ctrl-C otherwise.
    duration: Option<u64>,

    #[arg(long)]
    /// Passive discovery only.
    track: bool,

    #[arg(long)]
    /// Print the attack catalogue and exit.
    list_attacks: bool,

    #[arg(long)]
    /// Stream the status log to stdout.
    headless: bool,

    #[arg(long, default_value_t = 400)]
    /// Channel hop interval in milliseconds.
    hop_interval: u64,

    #[arg(long, default_value_t = 5)]
    /// Attack tick interval in milliseconds.
    tick: u64,
}

fn print_attacks() {
    for mode in AttackMode::iter() {
        println!(
            "{:>2}  {:<22}{}",
            mode.index(),
            mode.label(),
            if mode.is_implemented() {
                ""
            } else {
                "(not implemented)"
            }
        );
    }
}

fn parse_mac(input: &str, what: &str) -> Result<MacAddress> {
    MacAddress::from_str(input).map_err(|e| anyhow!("Invalid {what} \"{input}\": {e}"))
}

fn main() -> Result<()> {
    let args = Arguments::parse();

    if args.list_attacks {
        print_attacks();
        return Ok(());
    }

    let log = MessageLog::shared(args.headless, None);
    let radio = PcapRadio::open(args.replay.as_deref(), args.output.as_deref())
        .context("Opening capture files")?;

    let attack_config = AttackConfig::default().tick_interval(Duration::from_millis(args.tick));
    let tracker_config =
        TrackerConfig::default().hop_interval(Duration::from_millis(args.hop_interval));
    let mut runtime = MarauderRuntime::new(radio, attack_config, tracker_config, log.clone());

    if args.track {
        runtime.start_tracking();
    } else {
        let Some(name) = args.attack.as_deref() else {
            bail!("Nothing to do: pass --attack <mode>, --track or --list-attacks");
        };
        let mode = AttackMode::from_str(name).map_err(|_| {
            anyhow!(
                "Unknown attack \"{name}\", expected one of: {}",
                AttackMode::ALL.iter().map(|mode| mode.label()).join(", ")
            )
        })?;

        match (args.target.as_deref(), args.station.as_deref()) {
            (Some(target), Some(station)) => runtime.set_preferred_station(
                parse_mac(target, "target")?,
                parse_mac(station, "station")?,
                args.channel,
            ),
            (Some(target), None) => {
                runtime.set_preferred_target(parse_mac(target, "target")?, args.channel)
            }
            (None, Some(_)) => bail!("--station needs --target"),
            (None, None) => {}
        }

        if !runtime.start_attack(mode) {
            runtime.stop_all();
            bail!("Attack \"{mode}\" could not be started");
        }
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let deadline = args
        .duration
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if deadline.is_some_and(|deadline| now >= deadline) {
            break;
        }

        if runtime.is_tracking() {
            let read = runtime.radio_mut().pump(PUMP_BATCH)?;
            if read == 0 && runtime.radio().is_exhausted() && deadline.is_none() {
                break;
            }
        }

        let due = runtime.radio_mut().due_timers(now);
        for slot in due {
            if runtime.on_timer_at(slot, now) == Some(TickOutcome::Stopped) {
                running.store(false, Ordering::SeqCst);
            }
        }

        if !runtime.is_tracking() && !runtime.is_attacking() {
            break;
        }

        let pause = runtime
            .radio()
            .next_deadline()
            .map(|next| next.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_SLEEP)
            .min(IDLE_SLEEP);
        thread::sleep(pause);
    }

    let frames_sent = runtime.attack().frames_sent_total();
    let failures = runtime.attack().transmit_failures();
    let malformed = runtime.tracker().malformed_frames();
    runtime.stop_all();

    let access_points = runtime.tracked_access_points();
    let stations = runtime.tracked_stations();
    report(
        &log,
        MessageType::Priority,
        format!(
            "Done: {} access points, {} stations, {} malformed frames, {} frames sent, {} transmit failures",
            access_points.len(),
            stations.len(),
            malformed,
            frames_sent,
            failures
        ),
    );

    let mut radio = runtime.into_radio();
    radio.flush()?;

    if !args.headless {
        for ap in &access_points {
            println!(
                "{}  ch{:<2}  {:<32}  {} stations",
                ap.bssid.to_long_string(),
                ap.channel,
                if ap.is_hidden() { "<hidden>" } else { ap.ssid.as_str() },
                ap.station_indices.len()
            );
            for index in &ap.station_indices {
                if let Some(station) = stations.get(*index) {
                    println!(
                        "    {}  ch{:<2}  {} dBm",
                        station.mac.to_long_string(),
                        station.channel,
                        station.rssi
                    );
                }
            }
        }
        let messages = log
            .lock()
            .map(|log| log.get_all_messages())
            .unwrap_or_default();
        for message in messages {
            println!(
                "{} | {:^8} | {}",
                message.timestamp.format("%H:%M:%S"),
                message.message_type,
                message.content
            );
        }
    }

    Ok(())
}
