//! Layout tables: what each matrix cell means, how shift-dependent keys
//! resolve, and which raw cells carry the shift keys.
//!
//! A [`LayoutDef`] is plain data and can live in a `static`. It becomes a
//! [`Layout`] only after [`Layout::new`] has checked it, so the decoder never
//! sees a dangling special index or a shift cell outside the matrix.

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::keycode::{KeyCode, Modifier};
use crate::matrix::{MatrixSnapshot, COLS, ROWS};

/// One matrix cell of a layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Key {
    /// Unused cell.
    None,
    /// A plain HID usage.
    Code(KeyCode),
    /// Goes into the modifier byte instead of a key slot.
    Mod(Modifier),
    /// Index into the layout's special-key table.
    Special(u8),
}

/// Modifier adjustment applied after all cells of a pass are decoded.
///
/// Uses the GUI bit positions as "clear shift" flags since no source
/// keyboard has GUI keys: bit 7 clears right shift, bit 3 clears left
/// shift, every other bit is OR-ed into the modifier byte.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModDelta(pub u8);

impl ModDelta {
    pub const NONE: ModDelta = ModDelta(0x00);
    pub const CLEAR_RSHIFT: ModDelta = ModDelta(0x80);
    pub const CLEAR_LSHIFT: ModDelta = ModDelta(0x08);
    pub const CLEAR_SHIFTS: ModDelta = ModDelta(0x88);

    const SET_MASK: u8 = 0x77;

    pub const fn with(self, modifier: Modifier) -> ModDelta {
        ModDelta(self.0 | modifier.bit())
    }

    pub const fn clears_right_shift(self) -> bool {
        self.0 & 0x80 != 0
    }

    pub const fn clears_left_shift(self) -> bool {
        self.0 & 0x08 != 0
    }

    pub const fn set_bits(self) -> u8 {
        self.0 & Self::SET_MASK
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A key whose output depends on the shift keys held alongside it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpecialKey {
    pub unshifted: (Key, ModDelta),
    pub shifted: (Key, ModDelta),
}

impl SpecialKey {
    pub const fn new(unshifted: (Key, ModDelta), shifted: (Key, ModDelta)) -> Self {
        Self { unshifted, shifted }
    }
}

/// A matrix position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    pub row: u8,
    pub col: u8,
}

impl Cell {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    fn in_matrix(self) -> bool {
        (self.row as usize) < ROWS && (self.col as usize) < COLS
    }
}

/// Which raw cells decide between the unshifted and shifted branch of a
/// special key. Read straight from the snapshot, since the modifier cells
/// may not have been decoded yet when a special key is reached.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShiftRule {
    /// Unshifted only while both shift cells read released.
    BothReleased { left: Cell, right: Cell },
    /// Only the left shift cell counts.
    LeftOnly { left: Cell },
    /// `BothReleased` for specials below `from`; from there on the right
    /// shift is ignored.
    RightIgnoredFrom { left: Cell, right: Cell, from: u8 },
}

impl ShiftRule {
    /// True when special key `index` should take its unshifted branch.
    pub fn unshifted(&self, snapshot: &MatrixSnapshot, index: u8) -> bool {
        let released = |cell: Cell| !snapshot.is_pressed(cell.row as usize, cell.col as usize);
        match *self {
            ShiftRule::BothReleased { left, right } => released(left) && released(right),
            ShiftRule::LeftOnly { left } => released(left),
            ShiftRule::RightIgnoredFrom { left, right, from } => {
                (index >= from || released(right)) && released(left)
            }
        }
    }

    fn cells(&self) -> [Option<Cell>; 2] {
        match *self {
            ShiftRule::BothReleased { left, right } => [Some(left), Some(right)],
            ShiftRule::LeftOnly { left } => [Some(left), None],
            ShiftRule::RightIgnoredFrom { left, right, .. } => [Some(left), Some(right)],
        }
    }
}

/// The key grid of a layout: 8 physical rows plus the restore row.
pub type KeyTable = [[Key; COLS]; ROWS];

/// Unchecked layout data for one keyboard / host-language pairing.
#[derive(Clone, Debug)]
pub struct LayoutDef<'a> {
    pub name: &'a str,
    pub keys: KeyTable,
    pub specials: &'a [SpecialKey],
    pub shift: ShiftRule,
}

/// Inconsistent layout data. Fatal: there is no sane way to decode with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("cell ({row}, {col}) refers to special key {index}, which is not defined")]
    UnknownSpecial { row: u8, col: u8, index: u8 },

    #[error("special key {index} resolves to another special key")]
    NestedSpecial { index: u8 },

    #[error("shift cell ({row}, {col}) is outside the matrix")]
    ShiftCellOutOfRange { row: u8, col: u8 },

    #[error("shift rule splits at special {from}, but only {len} are defined")]
    RuleSplitOutOfRange { from: u8, len: usize },

    #[error("expected {} rows, found {found}", ROWS)]
    RowCount { found: usize },

    #[error("row {row} has {found} columns, expected {}", COLS)]
    ColumnCount { row: usize, found: usize },
}

/// A layout that passed validation.
#[derive(Clone, Debug)]
pub struct Layout<'a> {
    def: LayoutDef<'a>,
}

impl<'a> Layout<'a> {
    pub fn new(def: LayoutDef<'a>) -> Result<Self, LayoutError> {
        for cell in def.shift.cells().into_iter().flatten() {
            if !cell.in_matrix() {
                return Err(LayoutError::ShiftCellOutOfRange {
                    row: cell.row,
                    col: cell.col,
                });
            }
        }

        if let ShiftRule::RightIgnoredFrom { from, .. } = def.shift {
            if from as usize > def.specials.len() {
                return Err(LayoutError::RuleSplitOutOfRange {
                    from,
                    len: def.specials.len(),
                });
            }
        }

        for (index, special) in def.specials.iter().enumerate() {
            let nested = |branch: &(Key, ModDelta)| matches!(branch.0, Key::Special(_));
            if nested(&special.unshifted) || nested(&special.shifted) {
                return Err(LayoutError::NestedSpecial { index: index as u8 });
            }
        }

        for (row, keys) in def.keys.iter().enumerate() {
            for (col, key) in keys.iter().enumerate() {
                if let Key::Special(index) = *key {
                    if index as usize >= def.specials.len() {
                        return Err(LayoutError::UnknownSpecial {
                            row: row as u8,
                            col: col as u8,
                            index,
                        });
                    }
                }
            }
        }

        log::debug!(
            "layout {} accepted: {} special keys",
            def.name,
            def.specials.len()
        );
        Ok(Self { def })
    }

    pub fn name(&self) -> &str {
        self.def.name
    }

    pub fn key(&self, row: usize, col: usize) -> Key {
        self.def.keys[row][col]
    }

    pub fn keys(&self) -> &KeyTable {
        &self.def.keys
    }

    pub fn specials(&self) -> &[SpecialKey] {
        self.def.specials
    }

    pub fn shift_rule(&self) -> &ShiftRule {
        &self.def.shift
    }

    /// Pick the branch of special key `index` for the given raw matrix.
    pub fn resolve_special(&self, index: u8, snapshot: &MatrixSnapshot) -> (Key, ModDelta) {
        // Index bounds were checked in `new`.
        let special = &self.def.specials[index as usize];
        if self.def.shift.unshifted(snapshot, index) {
            special.unshifted
        } else {
            special.shifted
        }
    }
}

/// Build a key table from loosely shaped rows (e.g. a deserialized file),
/// checking the row and column counts.
pub fn keys_from_rows<R: AsRef<[Key]>>(rows: &[R]) -> Result<KeyTable, LayoutError> {
    if rows.len() != ROWS {
        return Err(LayoutError::RowCount { found: rows.len() });
    }
    let mut table = [[Key::None; COLS]; ROWS];
    for (row, src) in rows.iter().enumerate() {
        let src = src.as_ref();
        if src.len() != COLS {
            return Err(LayoutError::ColumnCount {
                row,
                found: src.len(),
            });
        }
        table[row].copy_from_slice(src);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSHIFT: Cell = Cell::new(7, 1);
    const RSHIFT: Cell = Cell::new(4, 6);

    static SPECIALS: [SpecialKey; 1] = [SpecialKey::new(
        (Key::Code(KeyCode::N2), ModDelta::NONE),
        (Key::Code(KeyCode::Quote), ModDelta::NONE),
    )];

    fn def(keys: KeyTable, shift: ShiftRule) -> LayoutDef<'static> {
        LayoutDef {
            name: "test",
            keys,
            specials: &SPECIALS,
            shift,
        }
    }

    fn both() -> ShiftRule {
        ShiftRule::BothReleased {
            left: LSHIFT,
            right: RSHIFT,
        }
    }

    #[test]
    fn accepts_consistent_layout() {
        let mut keys = [[Key::None; COLS]; ROWS];
        keys[3][7] = Key::Special(0);
        assert!(Layout::new(def(keys, both())).is_ok());
    }

    #[test]
    fn rejects_unknown_special() {
        let mut keys = [[Key::None; COLS]; ROWS];
        keys[2][5] = Key::Special(1);
        let err = Layout::new(def(keys, both())).unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnknownSpecial {
                row: 2,
                col: 5,
                index: 1
            }
        );
    }

    #[test]
    fn rejects_nested_special() {
        static NESTED: [SpecialKey; 1] = [SpecialKey::new(
            (Key::Special(0), ModDelta::NONE),
            (Key::None, ModDelta::NONE),
        )];
        let layout = LayoutDef {
            name: "nested",
            keys: [[Key::None; COLS]; ROWS],
            specials: &NESTED,
            shift: both(),
        };
        assert_eq!(
            Layout::new(layout).unwrap_err(),
            LayoutError::NestedSpecial { index: 0 }
        );
    }

    #[test]
    fn rejects_shift_cell_outside_matrix() {
        let rule = ShiftRule::LeftOnly {
            left: Cell::new(9, 0),
        };
        let err = Layout::new(def([[Key::None; COLS]; ROWS], rule)).unwrap_err();
        assert_eq!(err, LayoutError::ShiftCellOutOfRange { row: 9, col: 0 });
    }

    #[test]
    fn rejects_split_past_table() {
        let rule = ShiftRule::RightIgnoredFrom {
            left: LSHIFT,
            right: RSHIFT,
            from: 2,
        };
        let err = Layout::new(def([[Key::None; COLS]; ROWS], rule)).unwrap_err();
        assert_eq!(err, LayoutError::RuleSplitOutOfRange { from: 2, len: 1 });
    }

    #[test]
    fn keys_from_rows_checks_shape() {
        let short = [[Key::None; COLS]; 8];
        assert_eq!(
            keys_from_rows(&short).unwrap_err(),
            LayoutError::RowCount { found: 8 }
        );

        let mut rows: [&[Key]; ROWS] = [&[Key::None; COLS]; ROWS];
        rows[4] = &[Key::None; 7];
        assert_eq!(
            keys_from_rows(&rows).unwrap_err(),
            LayoutError::ColumnCount { row: 4, found: 7 }
        );

        rows[4] = &[Key::Code(KeyCode::A); COLS];
        let table = keys_from_rows(&rows).unwrap();
        assert_eq!(table[4][3], Key::Code(KeyCode::A));
    }

    #[test]
    fn both_released_rule() {
        let rule = both();
        let mut snap = MatrixSnapshot::released();
        assert!(rule.unshifted(&snap, 0));
        snap.press(RSHIFT.row as usize, RSHIFT.col as usize);
        assert!(!rule.unshifted(&snap, 0));
    }

    #[test]
    fn right_ignored_from_rule() {
        let rule = ShiftRule::RightIgnoredFrom {
            left: LSHIFT,
            right: RSHIFT,
            from: 1,
        };
        let mut snap = MatrixSnapshot::released();
        snap.press(RSHIFT.row as usize, RSHIFT.col as usize);
        assert!(!rule.unshifted(&snap, 0));
        assert!(rule.unshifted(&snap, 1));
        snap.press(LSHIFT.row as usize, LSHIFT.col as usize);
        assert!(!rule.unshifted(&snap, 1));
    }

    #[test]
    fn mod_delta_flags() {
        let delta = ModDelta::CLEAR_SHIFTS.with(Modifier::LAlt);
        assert_eq!(delta, ModDelta(0x8C));
        assert!(delta.clears_left_shift());
        assert!(delta.clears_right_shift());
        assert_eq!(delta.set_bits(), 0x04);
    }
}
