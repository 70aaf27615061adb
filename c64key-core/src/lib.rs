//! Scan, debounce and decode logic for the c64key USB adapter.
//!
//! This crate is `no_std`-compatible so it can be used by both the AVR
//! firmware and the native CLI tool. Hardware sits behind two traits:
//! [`MatrixSampler`] for the key matrix and [`HidTransport`] for the USB
//! side. Everything else is plain state that can be driven from tests.

#![cfg_attr(not(test), no_std)]

pub mod controller;
pub mod debounce;
pub mod decode;
pub mod idle;
pub mod keycode;
pub mod layout;
pub mod layouts;
pub mod matrix;
pub mod report;
pub mod suspend;

pub use controller::{Controller, Elapsed, HidTransport, ScanOutcome};
pub use debounce::Debouncer;
pub use decode::{Decoded, Decoder};
pub use keycode::{KeyCode, Modifier};
pub use layout::{Cell, Key, Layout, LayoutDef, LayoutError, ModDelta, ShiftRule, SpecialKey};
pub use matrix::{MatrixSampler, MatrixSnapshot, COLS, ROWS};
pub use report::{Built, Report};
pub use suspend::{RemoteWakeup, SuspendMonitor};

/// USB vendor ID the adapter enumerates with (shared V-USB keyboard ID).
pub const USB_VID: u16 = 0x16C0;
/// USB product ID the adapter enumerates with.
pub const USB_PID: u16 = 0x27DB;
