//! Commodore key matrix on Teensy 2.0 GPIO.
//!
//! Pin mapping on Teensy 2.0 (ATmega32U4):
//!   Row drives (active-low, one at a time): PB0..PB7 (keyboard pins 12..5)
//!   Column reads (inputs w/ pull-up):      PF0, PF1, PF4..PF7, PC6, PC7
//!   RESTORE (input w/ pull-up):            PD2
//!
//! Rows that are not being sampled are left as pulled-up inputs so two held
//! keys in one column cannot short two driven lines together.

use avr_device::atmega32u4::Peripherals;
use c64key_core::matrix::{restore_mask, MatrixSampler, RESTORE_ROW};

const COLS_F: u8 = 0xF3; // PF0, PF1, PF4-PF7
const COLS_C: u8 = 0xC0; // PC6, PC7
const RESTORE_PIN: u8 = 0x04; // PD2

pub fn init_gpio(dp: &Peripherals) {
    release_rows(dp);

    dp.PORTF
        .ddrf
        .modify(|r, w| unsafe { w.bits(r.bits() & !COLS_F) });
    dp.PORTF
        .portf
        .modify(|r, w| unsafe { w.bits(r.bits() | COLS_F) });

    dp.PORTC
        .ddrc
        .modify(|r, w| unsafe { w.bits(r.bits() & !COLS_C) });
    dp.PORTC
        .portc
        .modify(|r, w| unsafe { w.bits(r.bits() | COLS_C) });

    dp.PORTD
        .ddrd
        .modify(|r, w| unsafe { w.bits(r.bits() & !RESTORE_PIN) });
    dp.PORTD
        .portd
        .modify(|r, w| unsafe { w.bits(r.bits() | RESTORE_PIN) });
}

/// All row lines back to pulled-up inputs.
fn release_rows(dp: &Peripherals) {
    dp.PORTB.ddrb.write(|w| unsafe { w.bits(0x00) });
    dp.PORTB.portb.write(|w| unsafe { w.bits(0xFF) });
}

/// Read the 8 column lines. Returns 8 bits (active low).
fn read_columns(dp: &Peripherals) -> u8 {
    let pinf = dp.PORTF.pinf.read().bits();
    let pinc = dp.PORTC.pinc.read().bits();

    // PF0, PF1 -> bits 0, 1; PF4..PF7 -> bits 2..5; PC6, PC7 stay put.
    (pinf & 0x03) | ((pinf >> 2) & 0x3C) | (pinc & COLS_C)
}

/// Busy-wait for the column pull-ups to recharge after switching rows.
/// ~30us at 16MHz; the matrix plus cable needs well over 10us.
#[inline(always)]
fn settle_delay() {
    for _ in 0..120u8 {
        unsafe { core::arch::asm!("nop") };
    }
}

pub struct GpioMatrix<'a> {
    dp: &'a Peripherals,
}

impl<'a> GpioMatrix<'a> {
    pub fn new(dp: &'a Peripherals) -> Self {
        init_gpio(dp);
        Self { dp }
    }
}

impl MatrixSampler for GpioMatrix<'_> {
    fn sample(&mut self, row: usize) -> u8 {
        if row == RESTORE_ROW {
            release_rows(self.dp);
            settle_delay();
            let low = self.dp.PORTD.pind.read().bits() & RESTORE_PIN == 0;
            return restore_mask(low);
        }

        let line = 1u8 << row;
        self.dp.PORTB.ddrb.write(|w| unsafe { w.bits(line) });
        self.dp.PORTB.portb.write(|w| unsafe { w.bits(!line) });
        settle_delay();
        read_columns(self.dp)
    }
}
