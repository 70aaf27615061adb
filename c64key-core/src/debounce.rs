//! Whole-matrix debouncing.
//!
//! One countdown covers the entire matrix: any change on any row restarts
//! it, and the stored image is decoded once the matrix has been quiet for
//! [`DEBOUNCE_CYCLES`] scans. A bouncing key therefore also delays keys
//! that settled elsewhere.

use crate::matrix::{MatrixSampler, MatrixSnapshot, ROWS};

/// Scan cycles the matrix must stay unchanged before it is decoded.
pub const DEBOUNCE_CYCLES: u8 = 20;

/// Countdown at power-up, so the host gets an empty report early on.
const STARTUP_CYCLES: u8 = 5;

pub struct Debouncer {
    snapshot: MatrixSnapshot,
    countdown: u8,
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            snapshot: MatrixSnapshot::released(),
            countdown: STARTUP_CYCLES,
        }
    }

    /// Record the freshly sampled mask of one row.
    pub fn observe(&mut self, row: usize, mask: u8) {
        if mask != self.snapshot.row(row) {
            self.countdown = DEBOUNCE_CYCLES;
        }
        self.snapshot.set_row(row, mask);
    }

    /// True on the one cycle where the countdown is about to expire.
    pub fn should_decode(&self) -> bool {
        self.countdown == 1
    }

    /// Close a scan cycle.
    pub fn end_cycle(&mut self) {
        self.countdown = self.countdown.saturating_sub(1);
    }

    /// Sample every row, then report whether the stored image is ready
    /// to be decoded.
    pub fn cycle<S: MatrixSampler>(&mut self, sampler: &mut S) -> bool {
        for row in 0..ROWS {
            let mask = sampler.sample(row);
            self.observe(row, mask);
        }
        let decode = self.should_decode();
        self.end_cycle();
        decode
    }

    pub fn snapshot(&self) -> &MatrixSnapshot {
        &self.snapshot
    }

    pub fn countdown(&self) -> u8 {
        self.countdown
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::RELEASED;

    /// Replays fixed row masks.
    struct Replay {
        rows: [u8; ROWS],
    }

    impl MatrixSampler for Replay {
        fn sample(&mut self, row: usize) -> u8 {
            self.rows[row]
        }
    }

    fn settled(debouncer: &mut Debouncer) -> Replay {
        let mut idle = Replay {
            rows: [RELEASED; ROWS],
        };
        while debouncer.countdown() > 0 {
            debouncer.cycle(&mut idle);
        }
        idle
    }

    #[test]
    fn startup_decodes_once() {
        let mut debouncer = Debouncer::new();
        let mut idle = Replay {
            rows: [RELEASED; ROWS],
        };
        let decodes = (0..50).filter(|_| debouncer.cycle(&mut idle)).count();
        assert_eq!(decodes, 1);
    }

    #[test]
    fn stable_change_decodes_exactly_once() {
        let mut debouncer = Debouncer::new();
        let mut matrix = settled(&mut debouncer);
        matrix.rows[3] = 0xFB;

        let mut decoded_at = None;
        for cycle in 0..(DEBOUNCE_CYCLES as usize * 3) {
            if debouncer.cycle(&mut matrix) {
                assert!(decoded_at.is_none(), "second decode at cycle {cycle}");
                decoded_at = Some(cycle);
            }
        }
        // Counter is 20 after the change cycle and is 1 on cycle 19.
        assert_eq!(decoded_at, Some(DEBOUNCE_CYCLES as usize - 1));
        assert_eq!(debouncer.snapshot().row(3), 0xFB);
    }

    #[test]
    fn bounce_restarts_countdown() {
        let mut debouncer = Debouncer::new();
        let mut matrix = settled(&mut debouncer);

        matrix.rows[2] = 0xEF;
        assert!(!debouncer.cycle(&mut matrix));
        matrix.rows[2] = RELEASED;
        assert!(!debouncer.cycle(&mut matrix));
        assert_eq!(debouncer.countdown(), DEBOUNCE_CYCLES - 1);

        for _ in 0..(DEBOUNCE_CYCLES - 3) {
            matrix.rows[2] ^= 0x10;
            assert!(!debouncer.cycle(&mut matrix));
        }
    }

    #[test]
    fn change_on_any_row_delays_all() {
        let mut debouncer = Debouncer::new();
        let mut matrix = settled(&mut debouncer);

        matrix.rows[0] = 0xFE;
        for _ in 0..10 {
            assert!(!debouncer.cycle(&mut matrix));
        }
        // Unrelated row changes: the settled row 0 waits again.
        matrix.rows[6] = 0x7F;
        for _ in 0..(DEBOUNCE_CYCLES - 1) {
            assert!(!debouncer.cycle(&mut matrix));
        }
        assert!(debouncer.cycle(&mut matrix));
    }

    #[test]
    fn snapshot_always_takes_latest_sample() {
        let mut debouncer = Debouncer::new();
        debouncer.observe(1, 0x00);
        debouncer.observe(1, 0x0F);
        assert_eq!(debouncer.snapshot().row(1), 0x0F);
        assert_eq!(debouncer.countdown(), DEBOUNCE_CYCLES);
    }
}
