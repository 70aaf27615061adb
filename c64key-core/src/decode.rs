//! Turns a settled matrix image into a modifier byte and an ordered list of
//! keycodes.

use heapless::Vec;

use crate::keycode::{KeyCode, Modifier};
use crate::layout::{Key, Layout, ModDelta};
use crate::matrix::{MatrixSnapshot, COLS, ROWS};
use crate::report::{Built, Report};
use crate::suspend::{RemoteWakeup, SuspendMonitor};

/// Upper bound on keys one pass can produce: one per cell.
pub const MAX_DECODED: usize = ROWS * COLS;

/// Output of one decode pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    pub modifiers: u8,
    /// Non-modifier keys in scan order.
    pub keys: Vec<KeyCode, MAX_DECODED>,
    /// A remote-wakeup pulse was sent during this pass.
    pub woke_host: bool,
}

impl Decoded {
    pub fn build(&self) -> Built {
        Report::build(self.modifiers, &self.keys)
    }
}

pub struct Decoder<'a> {
    layout: &'a Layout<'a>,
}

impl<'a> Decoder<'a> {
    pub fn new(layout: &'a Layout<'a>) -> Self {
        Self { layout }
    }

    /// Decode `snapshot`. The first closed contact wakes a suspended host
    /// before anything else happens.
    pub fn decode<W: RemoteWakeup + ?Sized>(
        &self,
        snapshot: &MatrixSnapshot,
        monitor: &mut SuspendMonitor,
        wakeup: &mut W,
    ) -> Decoded {
        let mut modifiers = 0u8;
        let mut keys = Vec::new();
        let mut deltas = ModDelta::NONE;
        let mut clear = 0u8;
        let mut woke_host = false;
        let mut first = true;

        for (row, col) in snapshot.pressed_cells() {
            if first {
                woke_host = monitor.wake_for_keypress(wakeup);
                first = false;
            }

            let key = match self.layout.key(row, col) {
                Key::Special(index) => {
                    let (key, delta) = self.layout.resolve_special(index, snapshot);
                    if delta.clears_right_shift() {
                        clear |= Modifier::RShift.bit();
                    }
                    if delta.clears_left_shift() {
                        clear |= Modifier::LShift.bit();
                    }
                    deltas = ModDelta(deltas.0 | delta.set_bits());
                    key
                }
                key => key,
            };

            match key {
                Key::Mod(modifier) => modifiers |= modifier.bit(),
                Key::Code(code) => {
                    // One entry per cell at most, so capacity cannot run out.
                    let _ = keys.push(code);
                }
                Key::None | Key::Special(_) => {}
            }
        }

        modifiers &= !clear;
        modifiers |= deltas.0;

        log::debug!(
            "decoded {} keys, modifiers {:#04x}",
            keys.len(),
            modifiers
        );

        Decoded {
            modifiers,
            keys,
            woke_host,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Cell, LayoutDef, ShiftRule, SpecialKey};
    use crate::layouts;

    #[derive(Default)]
    struct Pulses(u32);

    impl RemoteWakeup for Pulses {
        fn remote_wakeup(&mut self) {
            self.0 += 1;
        }
    }

    fn decode(layout: &Layout, snapshot: &MatrixSnapshot) -> Decoded {
        let mut monitor = SuspendMonitor::new();
        Decoder::new(layout).decode(snapshot, &mut monitor, &mut Pulses::default())
    }

    fn snapshot(cells: &[(usize, usize)]) -> MatrixSnapshot {
        let mut snap = MatrixSnapshot::released();
        for &(row, col) in cells {
            snap.press(row, col);
        }
        snap
    }

    fn c64() -> Layout<'static> {
        Layout::new(layouts::C64_US).unwrap()
    }

    const C64_LSHIFT: (usize, usize) = (7, 1);
    const C64_RSHIFT: (usize, usize) = (4, 6);

    #[test]
    fn plain_keys_in_scan_order() {
        let layout = c64();
        // W (1,1), A (2,1), Z (4,1) pressed in reverse order of rows.
        let decoded = decode(&layout, &snapshot(&[(4, 1), (1, 1), (2, 1)]));
        assert_eq!(&decoded.keys[..], &[KeyCode::W, KeyCode::A, KeyCode::Z]);
        assert_eq!(decoded.modifiers, 0);
        assert!(!decoded.build().rolled_over);
    }

    #[test]
    fn modifiers_accumulate_and_stay_out_of_slots() {
        let layout = c64();
        let decoded = decode(&layout, &snapshot(&[C64_LSHIFT, (5, 7), (1, 2)]));
        assert_eq!(&decoded.keys[..], &[KeyCode::R]);
        assert_eq!(
            decoded.modifiers,
            Modifier::LShift.bit() | Modifier::LCtrl.bit()
        );
    }

    #[test]
    fn seven_keys_roll_over_but_keep_modifiers() {
        let layout = c64();
        let cells = [
            (1, 1),
            (1, 2),
            (1, 3),
            (1, 4),
            (1, 5),
            (2, 1),
            (2, 2),
            C64_RSHIFT,
        ];
        let built = decode(&layout, &snapshot(&cells)).build();
        assert!(built.rolled_over);
        assert!(built.report.is_rollover());
        assert_eq!(built.report.modifiers, Modifier::RShift.bit());
    }

    #[test]
    fn redecoding_is_stable() {
        let layout = c64();
        let snap = snapshot(&[(0, 1), C64_LSHIFT, (2, 0), (6, 3)]);
        let first = decode(&layout, &snap);
        let second = decode(&layout, &snap);
        assert_eq!(first, second);
        assert_eq!(first.build(), second.build());
    }

    #[test]
    fn null_cells_are_skipped() {
        let layout = c64();
        let decoded = decode(&layout, &snapshot(&[(8, 0), (8, 7)]));
        assert!(decoded.keys.is_empty());
        assert_eq!(decoded.modifiers, 0);
    }

    #[test]
    fn shifted_special_clears_shift() {
        let layout = c64();
        // INST/DEL shifted: Delete with both shifts forced off.
        let decoded = decode(&layout, &snapshot(&[(1, 7), C64_LSHIFT]));
        assert_eq!(&decoded.keys[..], &[KeyCode::Delete]);
        assert_eq!(decoded.modifiers, 0);

        let decoded = decode(&layout, &snapshot(&[(1, 7)]));
        assert_eq!(&decoded.keys[..], &[KeyCode::Backspace]);
    }

    #[test]
    fn right_shift_alone_selects_shifted_branch_on_c64() {
        let layout = c64();
        // CRSR up/down: right shift drops but the arrow still flips.
        let decoded = decode(&layout, &snapshot(&[(2, 0), C64_RSHIFT]));
        assert_eq!(&decoded.keys[..], &[KeyCode::Up]);
        assert_eq!(decoded.modifiers, 0);
    }

    #[test]
    fn deltas_from_every_special_apply() {
        static SPECIALS: [SpecialKey; 2] = [
            SpecialKey::new(
                (Key::Code(KeyCode::A), ModDelta::CLEAR_LSHIFT),
                (Key::Code(KeyCode::A), ModDelta::CLEAR_LSHIFT),
            ),
            SpecialKey::new(
                (Key::Code(KeyCode::B), ModDelta(0x04)),
                (Key::Code(KeyCode::B), ModDelta(0x04)),
            ),
        ];
        let mut keys = [[Key::None; COLS]; ROWS];
        keys[0][0] = Key::Special(0);
        keys[0][1] = Key::Special(1);
        keys[7][1] = Key::Mod(Modifier::LShift);
        let layout = Layout::new(LayoutDef {
            name: "deltas",
            keys,
            specials: &SPECIALS,
            shift: ShiftRule::LeftOnly {
                left: Cell::new(7, 1),
            },
        })
        .unwrap();

        let decoded = decode(&layout, &snapshot(&[(0, 0), (0, 1), (7, 1)]));
        assert_eq!(&decoded.keys[..], &[KeyCode::A, KeyCode::B]);
        assert_eq!(decoded.modifiers, Modifier::LAlt.bit());
    }

    #[test]
    fn special_may_resolve_to_modifier() {
        static SPECIALS: [SpecialKey; 1] = [SpecialKey::new(
            (Key::Mod(Modifier::RAlt), ModDelta::NONE),
            (Key::None, ModDelta::NONE),
        )];
        let mut keys = [[Key::None; COLS]; ROWS];
        keys[3][3] = Key::Special(0);
        let layout = Layout::new(LayoutDef {
            name: "altgr",
            keys,
            specials: &SPECIALS,
            shift: ShiftRule::LeftOnly {
                left: Cell::new(7, 1),
            },
        })
        .unwrap();

        let decoded = decode(&layout, &snapshot(&[(3, 3)]));
        assert!(decoded.keys.is_empty());
        assert_eq!(decoded.modifiers, Modifier::RAlt.bit());
    }

    /// Cell (4, 5) holds a special whose unshifted branch is M and whose
    /// shifted branch is the grave accent, under the both-shifts rule.
    #[test]
    fn both_shift_rule_selects_branch_for_cell_4_5() {
        static SPECIALS: [SpecialKey; 1] = [SpecialKey::new(
            (Key::Code(KeyCode::M), ModDelta::NONE),
            (Key::Code(KeyCode::Grave), ModDelta::NONE),
        )];
        let mut keys = [[Key::None; COLS]; ROWS];
        keys[4][5] = Key::Special(0);
        keys[7][1] = Key::Mod(Modifier::LShift);
        keys[4][6] = Key::Mod(Modifier::RShift);
        let layout = Layout::new(LayoutDef {
            name: "scenario",
            keys,
            specials: &SPECIALS,
            shift: ShiftRule::BothReleased {
                left: Cell::new(7, 1),
                right: Cell::new(4, 6),
            },
        })
        .unwrap();

        // Both shift cells read high: the unshifted branch, no delta.
        let decoded = decode(&layout, &snapshot(&[(4, 5)]));
        assert_eq!(&decoded.keys[..], &[KeyCode::M]);
        assert_eq!(decoded.modifiers, 0);

        // Either shift held pulls it to the shifted branch.
        let decoded = decode(&layout, &snapshot(&[(4, 5), (7, 1)]));
        assert_eq!(&decoded.keys[..], &[KeyCode::Grave]);
        let decoded = decode(&layout, &snapshot(&[(4, 5), (4, 6)]));
        assert_eq!(&decoded.keys[..], &[KeyCode::Grave]);
        assert_eq!(decoded.modifiers, Modifier::RShift.bit());
    }

    /// Every special key of every bundled layout yields exactly its
    /// unshifted pair with shifts released and its shifted pair with the
    /// left shift held.
    #[test]
    fn every_special_has_two_branches() {
        for def in layouts::ALL {
            let layout = Layout::new(def.clone()).unwrap();
            let left = match *layout.shift_rule() {
                ShiftRule::BothReleased { left, .. }
                | ShiftRule::LeftOnly { left }
                | ShiftRule::RightIgnoredFrom { left, .. } => left,
            };
            for (row, keys) in layout.keys().iter().enumerate() {
                for (col, key) in keys.iter().enumerate() {
                    let Key::Special(index) = *key else { continue };
                    let special = layout.specials()[index as usize];

                    let released = snapshot(&[(row, col)]);
                    assert_eq!(layout.resolve_special(index, &released), special.unshifted);

                    let shifted = snapshot(&[(row, col), (left.row as usize, left.col as usize)]);
                    assert_eq!(layout.resolve_special(index, &shifted), special.shifted);
                }
            }
        }
    }

    #[test]
    fn suspended_host_woken_once_per_pass() {
        let layout = c64();
        let mut monitor = SuspendMonitor::new();
        monitor.elapse(10);
        monitor.update(false);
        assert!(monitor.is_suspended());

        let mut pulses = Pulses::default();
        let decoded = Decoder::new(&layout).decode(
            &snapshot(&[(1, 1), (1, 2), (1, 3)]),
            &mut monitor,
            &mut pulses,
        );
        assert!(decoded.woke_host);
        assert_eq!(pulses.0, 1);
        assert!(!monitor.is_suspended());
        assert_eq!(monitor.quiet_ticks(), 0);
    }

    #[test]
    fn empty_matrix_never_wakes() {
        let layout = c64();
        let mut monitor = SuspendMonitor::new();
        monitor.elapse(10);
        monitor.update(false);

        let mut pulses = Pulses::default();
        let decoded =
            Decoder::new(&layout).decode(&MatrixSnapshot::released(), &mut monitor, &mut pulses);
        assert!(!decoded.woke_host);
        assert_eq!(pulses.0, 0);
        assert!(monitor.is_suspended());
    }
}
