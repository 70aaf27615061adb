//! c64key firmware for ATmega32U4 (Teensy 2.0).
//!
//! Turns a Commodore 64 / 16 / Plus/4 keyboard into a USB boot keyboard:
//! - 8×8 matrix plus RESTORE scanned on GPIO
//! - Whole-matrix debouncing
//! - Shift-dependent translation of the Commodore-only keys
//! - Remote wakeup of a suspended host on keypress

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]
#![feature(asm_experimental_arch)]

mod matrix;
mod timer;
mod usb;
mod watchdog;

use avr_device::atmega32u4::Peripherals;
use c64key_core::{layouts, Controller, Elapsed, Layout, LayoutDef};

use matrix::GpioMatrix;
use usb::UsbKeyboard;

#[cfg(all(feature = "layout-c16", feature = "layout-plus4"))]
compile_error!("select at most one layout feature");

#[cfg(feature = "layout-c16")]
const LAYOUT: LayoutDef<'static> = layouts::C16_US;
#[cfg(feature = "layout-plus4")]
const LAYOUT: LayoutDef<'static> = layouts::PLUS4_DE;
#[cfg(not(any(feature = "layout-c16", feature = "layout-plus4")))]
const LAYOUT: LayoutDef<'static> = layouts::C64_US;

const LED: u8 = 0x40; // PD6, Teensy on-board LED

/// Panic handler: nothing to report to, so just loop.
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

/// The timer interrupt also writes PORTD, so keep it out of the
/// read-modify-write.
pub(crate) fn led_on(dp: &Peripherals) {
    avr_device::interrupt::free(|_| {
        dp.PORTD
            .portd
            .modify(|r, w| unsafe { w.bits(r.bits() | LED) });
    });
}

/// Called from the timer interrupt, where interrupts are already masked.
pub(crate) fn led_off(dp: &Peripherals) {
    dp.PORTD
        .portd
        .modify(|r, w| unsafe { w.bits(r.bits() & !LED) });
}

/// Bad layout tables: nothing sane to do but sit with the LED lit.
fn halt(dp: &Peripherals) -> ! {
    avr_device::interrupt::disable();
    led_on(dp);
    loop {}
}

#[avr_device::entry]
fn main() -> ! {
    let dp = unsafe { Peripherals::steal() };

    // Disable clock prescaler (CLKPR), run at the full 16MHz
    dp.CPU.clkpr.write(|w| w.clkpce().set_bit());
    dp.CPU.clkpr.write(|w| unsafe { w.bits(0) });

    dp.PORTD
        .ddrd
        .modify(|r, w| unsafe { w.bits(r.bits() | LED) });

    let layout = match Layout::new(LAYOUT) {
        Ok(layout) => layout,
        Err(_) => halt(&dp),
    };

    watchdog::enable(&dp);

    let sampler = GpioMatrix::new(&dp);
    let mut usb = UsbKeyboard::new(&dp);
    usb.init();
    timer::init(&dp);

    let mut controller = Controller::new(sampler, &layout);

    unsafe { avr_device::interrupt::enable() };

    loop {
        watchdog::feed();

        let elapsed = Elapsed {
            suspend_ticks: timer::take_ticks(),
            idle_units: timer::take_idle_units(&dp),
        };

        if let Some(outcome) = controller.step(&mut usb, elapsed) {
            if outcome.any_pressed {
                led_on(&dp);
            }
        }
    }
}
