//! Watchdog: resets the MCU when the main loop stops coming round, e.g. a
//! control transfer the host abandoned halfway through a status-stage wait.

use avr_device::atmega32u4::Peripherals;

const WDRF: u8 = 0x08; // MCUSR
const WDCE: u8 = 0x10; // WDTCSR
const WDE: u8 = 0x08;
/// WDP2..0 = 111: about 2s.
const WDP_2S: u8 = 0x07;

/// Start the watchdog with a 2s timeout.
pub fn enable(dp: &Peripherals) {
    avr_device::interrupt::free(|_| {
        feed();
        // A pending watchdog reset flag forces WDE on; clear it first.
        dp.CPU.mcusr.modify(|r, w| unsafe { w.bits(r.bits() & !WDRF) });
        // Timed sequence: the prescaler write has to follow within 4 cycles.
        dp.WDT.wdtcsr.write(|w| unsafe { w.bits(WDCE | WDE) });
        dp.WDT.wdtcsr.write(|w| unsafe { w.bits(WDE | WDP_2S) });
    });
}

/// Restart the timeout. Call once per main-loop pass.
#[inline(always)]
pub fn feed() {
    avr_device::asm::wdr();
}
