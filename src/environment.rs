use crate::radio::{RadioDriver, RadioError, RadioMode};

/// The radio state captured when a session takes the radio over.
#[derive(Debug, Default)]
pub struct RadioEnvironment {
    previous_mode: Option<RadioMode>,
    restore_client: bool,
}

impl RadioEnvironment {
    pub fn new() -> Self {
        RadioEnvironment::default()
    }

    /// Record the current mode. A driver that cannot report its mode is treated as `Null`.
    pub fn capture<R: RadioDriver + ?Sized>(&mut self, radio: &R, restore_client: bool) -> RadioMode {
        let mode = radio.mode().unwrap_or(RadioMode::Null);
        self.previous_mode = Some(mode);
        self.restore_client = restore_client;
        mode
    }

    pub fn is_captured(&self) -> bool {
        self.previous_mode.is_some()
    }

    /// Hand the radio back. The captured state is consumed, so a second call is a no-op
    /// returning `Ok(None)`.
    ///
    /// The radio passes through `Null` first; then either the client connection is brought
    /// back or the previous mode is set again.
    pub fn restore<R: RadioDriver + ?Sized>(
        &mut self,
        radio: &mut R,
    ) -> Result<Option<RadioMode>, RadioError> {
        let Some(previous) = self.previous_mode.take() else {
            return Ok(None);
        };
        let restore_client = std::mem::take(&mut self.restore_client);

        radio.set_mode(RadioMode::Null)?;
        if restore_client {
            radio.reconnect()?;
        } else if previous != RadioMode::Null {
            radio.set_mode(previous)?;
        }
        Ok(Some(previous))
    }

    /// Forget the captured state without touching the radio.
    pub fn discard(&mut self) {
        self.previous_mode = None;
        self.restore_client = false;
    }
}
