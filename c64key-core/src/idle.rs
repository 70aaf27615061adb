//! HID idle rate: re-send the current report periodically while the host
//! asks for it (SET_IDLE with a non-zero duration).

/// Counts idle-timer periods down against the host's idle rate.
/// Both values are in the 4 ms units SET_IDLE uses.
#[derive(Debug, Default)]
pub struct IdleRepeater {
    countdown: u8,
}

impl IdleRepeater {
    pub const fn new() -> Self {
        Self { countdown: 0 }
    }

    /// Account for one idle-timer period of `elapsed` units. Returns true
    /// when the report is due again.
    pub fn period_elapsed(&mut self, rate: u8, elapsed: u8) -> bool {
        if rate == 0 {
            return false;
        }
        if self.countdown > elapsed {
            self.countdown -= elapsed;
            false
        } else {
            self.countdown = rate;
            true
        }
    }
}
