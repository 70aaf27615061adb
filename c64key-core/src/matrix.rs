//! Key matrix geometry, the sampler seam, and the stored matrix image.
//!
//! The Commodore keyboards are an 8×8 matrix. RESTORE sits outside it on a
//! line of its own and is folded in as a ninth, virtual row.

/// Number of rows, including the virtual restore row.
pub const ROWS: usize = 9;
/// Columns per row.
pub const COLS: usize = 8;
/// Index of the virtual restore row.
pub const RESTORE_ROW: usize = 8;
/// The only meaningful bit of the restore row.
pub const RESTORE_BIT: u8 = 0x08;

/// Column mask of a row with nothing pressed (lines are active-low).
pub const RELEASED: u8 = 0xFF;

/// Reads one row of the matrix.
///
/// Implementations select exactly one drive line, wait for the pull-ups to
/// settle, then read the columns. A set bit means the contact is open.
pub trait MatrixSampler {
    fn sample(&mut self, row: usize) -> u8;
}

/// Column mask for the restore row given the level of its input line.
pub const fn restore_mask(line_low: bool) -> u8 {
    if line_low {
        !RESTORE_BIT
    } else {
        RELEASED
    }
}

/// Last sampled column mask of every row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MatrixSnapshot {
    rows: [u8; ROWS],
}

impl MatrixSnapshot {
    pub const fn released() -> Self {
        Self {
            rows: [RELEASED; ROWS],
        }
    }

    pub const fn from_rows(rows: [u8; ROWS]) -> Self {
        Self { rows }
    }

    pub fn row(&self, row: usize) -> u8 {
        self.rows[row]
    }

    pub(crate) fn set_row(&mut self, row: usize, mask: u8) {
        self.rows[row] = mask;
    }

    /// Close the contact at (row, col).
    pub fn press(&mut self, row: usize, col: usize) {
        self.rows[row] &= !(1 << col);
    }

    pub fn is_pressed(&self, row: usize, col: usize) -> bool {
        self.rows[row] & (1 << col) == 0
    }

    /// Closed contacts in row-major, column-ascending order.
    pub fn pressed_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, &mask)| mask != RELEASED)
            .flat_map(|(row, &mask)| {
                (0..COLS)
                    .filter(move |col| mask & (1 << col) == 0)
                    .map(move |col| (row, col))
            })
    }
}

impl Default for MatrixSnapshot {
    fn default() -> Self {
        Self::released()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_row_uses_bit_three() {
        assert_eq!(restore_mask(true), 0xF7);
        assert_eq!(restore_mask(false), 0xFF);

        let mut rows = [RELEASED; ROWS];
        rows[RESTORE_ROW] = restore_mask(true);
        let snap = MatrixSnapshot::from_rows(rows);
        assert!(snap.is_pressed(RESTORE_ROW, 3));
        assert_eq!(snap.pressed_cells().count(), 1);
    }

    #[test]
    fn pressed_cells_in_scan_order() {
        let mut snap = MatrixSnapshot::released();
        snap.press(5, 2);
        snap.press(0, 7);
        snap.press(5, 0);
        let cells: heapless::Vec<(usize, usize), 8> = snap.pressed_cells().collect();
        assert_eq!(&cells[..], &[(0, 7), (5, 0), (5, 2)]);
    }
}
