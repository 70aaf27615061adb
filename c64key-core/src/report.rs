//! Boot-protocol keyboard report.

use crate::keycode::KeyCode;

/// Key slots in a boot report.
pub const KEY_SLOTS: usize = 6;
/// Size of the report on the wire.
pub const REPORT_LEN: usize = 8;

/// Standard USB HID keyboard report (8 bytes).
/// Byte 0: modifier keys bitmask
/// Byte 1: reserved (0x00)
/// Bytes 2-7: up to 6 simultaneous keycodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Report {
    pub modifiers: u8,
    pub reserved: u8,
    pub keys: [u8; KEY_SLOTS],
}

/// Result of [`Report::build`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Built {
    pub report: Report,
    /// More keys were held than fit; every slot carries `ErrorRollOver`.
    pub rolled_over: bool,
}

impl Report {
    pub const fn empty() -> Self {
        Self {
            modifiers: 0,
            reserved: 0,
            keys: [0; KEY_SLOTS],
        }
    }

    /// Assemble a report from the modifier byte and the keys in decode order.
    pub fn build(modifiers: u8, keys: &[KeyCode]) -> Built {
        let mut report = Report::empty();
        report.modifiers = modifiers;

        let rolled_over = keys.len() > KEY_SLOTS;
        if rolled_over {
            report.keys = [KeyCode::ErrorRollOver.usage(); KEY_SLOTS];
            log::debug!("roll-over: {} keys held", keys.len());
        } else {
            for (slot, key) in report.keys.iter_mut().zip(keys) {
                *slot = key.usage();
            }
        }

        Built {
            report,
            rolled_over,
        }
    }

    pub fn to_bytes(&self) -> [u8; REPORT_LEN] {
        let mut bytes = [0u8; REPORT_LEN];
        bytes[0] = self.modifiers;
        bytes[1] = self.reserved;
        bytes[2..].copy_from_slice(&self.keys);
        bytes
    }

    pub fn from_bytes(bytes: &[u8; REPORT_LEN]) -> Self {
        let mut keys = [0u8; KEY_SLOTS];
        keys.copy_from_slice(&bytes[2..]);
        Self {
            modifiers: bytes[0],
            reserved: bytes[1],
            keys,
        }
    }

    pub fn is_rollover(&self) -> bool {
        self.keys
            .iter()
            .all(|&k| k == KeyCode::ErrorRollOver.usage())
    }

    /// Occupied key slots.
    pub fn pressed(&self) -> impl Iterator<Item = u8> + '_ {
        self.keys.iter().copied().filter(|&k| k != 0)
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::empty()
    }
}
