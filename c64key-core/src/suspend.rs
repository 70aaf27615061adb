//! Bus-idle tracking and remote wakeup.
//!
//! The host stops sending start-of-frame markers when it suspends the bus.
//! A suspended host drops reports, so the first keypress after that has to
//! signal remote wakeup before its report is worth sending. This is power
//! management only: an extra wakeup pulse is harmless, a missing one loses
//! the keypress.
//!
//! Shared between the main loop and the timer interrupt only through the
//! tick count handed to [`SuspendMonitor::elapse`]; the monitor itself is
//! owned by the main loop.

/// Timer periods without bus activity after which the bus counts as
/// suspended (the check is strictly greater-than).
pub const SUSPEND_AFTER_TICKS: u8 = 5;

/// Drives the remote-wakeup signalling on the bus lines.
///
/// Implementations must keep interrupts masked for the whole pulse.
pub trait RemoteWakeup {
    fn remote_wakeup(&mut self);
}

#[derive(Debug, Default)]
pub struct SuspendMonitor {
    suspended: bool,
    quiet_ticks: u8,
}

impl SuspendMonitor {
    pub const fn new() -> Self {
        Self {
            suspended: false,
            quiet_ticks: 0,
        }
    }

    /// Several timer periods passed since the last call.
    pub fn elapse(&mut self, ticks: u8) {
        self.quiet_ticks = self.quiet_ticks.saturating_add(ticks);
    }

    /// Evaluate once per main-loop iteration.
    pub fn update(&mut self, frame_seen: bool) {
        if frame_seen {
            if self.suspended {
                log::info!("bus activity, resumed");
            }
            self.quiet_ticks = 0;
            self.suspended = false;
        } else if !self.suspended && self.quiet_ticks > SUSPEND_AFTER_TICKS {
            log::info!("no bus activity for {} ticks, suspended", self.quiet_ticks);
            self.suspended = true;
        }
    }

    /// Called for a keypress. Sends one wakeup pulse if suspended and
    /// returns whether it did.
    pub fn wake_for_keypress<W: RemoteWakeup + ?Sized>(&mut self, wakeup: &mut W) -> bool {
        if !self.suspended {
            return false;
        }
        log::info!("keypress while suspended, signalling remote wakeup");
        wakeup.remote_wakeup();
        self.suspended = false;
        self.quiet_ticks = 0;
        true
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn quiet_ticks(&self) -> u8 {
        self.quiet_ticks
    }
}
