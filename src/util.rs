use rand::{thread_rng, Rng};

pub const FIRST_CHANNEL: u8 = 1;
pub const LAST_CHANNEL: u8 = 13;
pub const DEFAULT_CHANNEL: u8 = 1;

/// Random channels are drawn from the channels usable everywhere.
const RANDOM_CHANNEL_MAX: u8 = 11;

const SSID_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ 0123456789-=[];',./`\\_+{}:\"<>?~|!@#$%^&*()";

/// Clamp a channel into the 2.4GHz band, zero and out-of-range values become the default.
pub fn safe_channel(channel: u8) -> u8 {
    if (FIRST_CHANNEL..=LAST_CHANNEL).contains(&channel) {
        channel
    } else {
        DEFAULT_CHANNEL
    }
}

/// Cyclic successor of `channel` within 1..=13.
pub fn next_channel(channel: u8) -> u8 {
    if channel >= LAST_CHANNEL {
        FIRST_CHANNEL
    } else {
        safe_channel(channel + 1)
    }
}

pub fn random_channel() -> u8 {
    safe_channel(thread_rng().gen_range(FIRST_CHANNEL..=RANDOM_CHANNEL_MAX))
}

pub fn random_ssid(len: usize) -> String {
    let mut rng = thread_rng();
    (0..len)
        .map(|_| SSID_ALPHABET[rng.gen_range(0..SSID_ALPHABET.len())] as char)
        .collect()
}

pub fn channel_to_frequency(channel: u8) -> u16 {
    match channel {
        14 => 2484,
        1..=13 => 2407 + 5 * u16::from(channel),
        _ => 0,
    }
}

pub fn frequency_to_channel(frequency: u16) -> u8 {
    match frequency {
        2484 => 14,
        2412..=2472 => ((frequency - 2407) / 5) as u8,
        5160..=5885 => ((frequency - 5000) / 5) as u8,
        _ => 0,
    }
}
