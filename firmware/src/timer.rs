//! Timers: Timer1 paces the suspend monitor from an interrupt, Timer0 runs
//! free and its overflow flag paces the HID idle rate.
//!
//! The interrupt only bumps a tick count. The main loop drains it each
//! iteration, so the suspend monitor itself is never touched from
//! interrupt context.

use core::cell::Cell;

use avr_device::atmega32u4::Peripherals;
use avr_device::interrupt::Mutex;

/// 16MHz / 256 / (6249 + 1) = 10Hz.
const SUSPEND_TICK_COMPARE: u16 = 6249;

/// Timer0 overflows every 16.4ms at 16MHz / 1024 / 256, about four of the
/// 4ms units SET_IDLE counts in.
const IDLE_UNITS_PER_OVERFLOW: u8 = 4;

/// Suspend-timer periods not yet handed to the main loop.
static PENDING_TICKS: Mutex<Cell<u8>> = Mutex::new(Cell::new(0));

pub fn init(dp: &Peripherals) {
    // Timer0: normal mode, prescaler 1024
    dp.TC0.tccr0a.write(|w| unsafe { w.bits(0x00) });
    dp.TC0.tccr0b.write(|w| unsafe { w.bits(0x05) });

    // Timer1: CTC on OCR1A (WGM12), prescaler 256 (CS12)
    dp.TC1.tccr1a.write(|w| unsafe { w.bits(0x00) });
    dp.TC1.tcnt1.write(|w| unsafe { w.bits(0) });
    dp.TC1.ocr1a.write(|w| unsafe { w.bits(SUSPEND_TICK_COMPARE) });
    dp.TC1.tccr1b.write(|w| unsafe { w.bits(0x0C) });
    // OCIE1A
    dp.TC1.timsk1.write(|w| unsafe { w.bits(0x02) });
}

/// Take the suspend-timer periods that elapsed since the last call.
pub fn take_ticks() -> u8 {
    avr_device::interrupt::free(|cs| PENDING_TICKS.borrow(cs).replace(0))
}

/// Idle-rate units elapsed since the last call: one overflow or nothing.
pub fn take_idle_units(dp: &Peripherals) -> u8 {
    if dp.TC0.tifr0.read().bits() & 0x01 == 0 {
        return 0;
    }
    // TOV0 clears by writing a one.
    dp.TC0.tifr0.write(|w| unsafe { w.bits(0x01) });
    IDLE_UNITS_PER_OVERFLOW
}

#[avr_device::interrupt(atmega32u4)]
fn TIMER1_COMPA() {
    avr_device::interrupt::free(|cs| {
        let ticks = PENDING_TICKS.borrow(cs);
        ticks.set(ticks.get().saturating_add(1));
    });
    // Activity LED is lit by a keypress and goes out on the next tick.
    let dp = unsafe { Peripherals::steal() };
    crate::led_off(&dp);
}
