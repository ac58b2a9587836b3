use std::time::Duration;

use crate::radio::{RadioDriver, RadioError, TimerSlot};
use crate::util::{next_channel, safe_channel, DEFAULT_CHANNEL};

pub const DEFAULT_HOP_INTERVAL: Duration = Duration::from_millis(400);

/// Cycles the radio through channels 1..=13 on the `ChannelHop` timer.
#[derive(Debug)]
pub struct ChannelHopper {
    current: u8,
    armed: bool,
    interval: Duration,
}

impl Default for ChannelHopper {
    fn default() -> Self {
        ChannelHopper {
            current: DEFAULT_CHANNEL,
            armed: false,
            interval: DEFAULT_HOP_INTERVAL,
        }
    }
}

impl ChannelHopper {
    pub fn new() -> Self {
        ChannelHopper::default()
    }

    pub fn current_channel(&self) -> u8 {
        self.current
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm the hop timer. Calling this while armed re-arms with the new interval, so the
    /// driver never holds two hop timers.
    pub fn start<R: RadioDriver + ?Sized>(
        &mut self,
        radio: &mut R,
        interval: Duration,
    ) -> Result<(), RadioError> {
        if self.armed {
            self.stop(radio)?;
        }
        radio.start_periodic_timer(TimerSlot::ChannelHop, interval)?;
        self.interval = interval;
        self.armed = true;
        Ok(())
    }

    pub fn stop<R: RadioDriver + ?Sized>(&mut self, radio: &mut R) -> Result<(), RadioError> {
        if !self.armed {
            return Ok(());
        }
        self.armed = false;
        radio.stop_periodic_timer(TimerSlot::ChannelHop)
    }

    pub fn reset(&mut self, channel: u8) {
        self.current = safe_channel(channel);
    }

    /// Advance to the next channel and tune the radio. Nothing happens unless the hopper is
    /// armed and its owner is running.
    pub fn hop<R: RadioDriver + ?Sized>(
        &mut self,
        radio: &mut R,
        owner_running: bool,
    ) -> Result<Option<u8>, RadioError> {
        if !owner_running || !self.armed {
            return Ok(None);
        }
        let channel = next_channel(self.current);
        radio.set_channel(channel)?;
        self.current = channel;
        Ok(Some(channel))
    }
}
