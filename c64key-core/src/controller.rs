//! One iteration of the firmware main loop, independent of the hardware.

use crate::debounce::Debouncer;
use crate::decode::Decoder;
use crate::idle::IdleRepeater;
use crate::layout::Layout;
use crate::matrix::MatrixSampler;
use crate::report::Report;
use crate::suspend::{RemoteWakeup, SuspendMonitor};

/// The USB side as seen by the scan loop.
pub trait HidTransport: RemoteWakeup {
    /// Service pending bus events (enumeration, control requests).
    fn poll(&mut self);

    /// True if a start-of-frame was seen since the last call; clears it.
    fn take_frame_activity(&mut self) -> bool;

    /// Host-requested idle rate in 4 ms units, 0 for "only on change".
    fn idle_rate(&self) -> u8;

    /// Queue a report. Returns false if the endpoint is busy.
    fn try_send(&mut self, report: &Report) -> bool;
}

/// Time that passed since the previous step, as seen by the timers.
#[derive(Clone, Copy, Debug, Default)]
pub struct Elapsed {
    /// Suspend-timer periods.
    pub suspend_ticks: u8,
    /// Idle-timer periods, in 4 ms units; 0 if the idle timer has not
    /// overflowed.
    pub idle_units: u8,
}

/// A decode pass happened this step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanOutcome {
    pub report: Report,
    pub rolled_over: bool,
    pub woke_host: bool,
    pub any_pressed: bool,
}

pub struct Controller<'a, S> {
    sampler: S,
    debouncer: Debouncer,
    decoder: Decoder<'a>,
    monitor: SuspendMonitor,
    idle: IdleRepeater,
    report: Report,
    pending: bool,
}

impl<'a, S: MatrixSampler> Controller<'a, S> {
    pub fn new(sampler: S, layout: &'a Layout<'a>) -> Self {
        Self {
            sampler,
            debouncer: Debouncer::new(),
            decoder: Decoder::new(layout),
            monitor: SuspendMonitor::new(),
            idle: IdleRepeater::new(),
            report: Report::empty(),
            pending: false,
        }
    }

    /// Run one main-loop iteration.
    pub fn step<T: HidTransport>(&mut self, transport: &mut T, elapsed: Elapsed) -> Option<ScanOutcome> {
        transport.poll();

        let outcome = if self.debouncer.cycle(&mut self.sampler) {
            let snapshot = self.debouncer.snapshot();
            let decoded = self.decoder.decode(snapshot, &mut self.monitor, transport);
            let built = decoded.build();
            self.report = built.report;
            self.pending = true;
            Some(ScanOutcome {
                report: built.report,
                rolled_over: built.rolled_over,
                woke_host: decoded.woke_host,
                any_pressed: snapshot.pressed_cells().next().is_some(),
            })
        } else {
            None
        };

        if elapsed.idle_units > 0
            && self
                .idle
                .period_elapsed(transport.idle_rate(), elapsed.idle_units)
        {
            self.pending = true;
        }

        if self.pending && transport.try_send(&self.report) {
            self.pending = false;
        }

        self.monitor.elapse(elapsed.suspend_ticks);
        self.monitor.update(transport.take_frame_activity());

        outcome
    }

    /// The most recently built report (answers GET_REPORT).
    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn is_suspended(&self) -> bool {
        self.monitor.is_suspended()
    }

    pub fn has_pending_report(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keycode::KeyCode;
    use crate::layouts;
    use crate::matrix::{RELEASED, ROWS};
    use heapless::Vec;

    struct Keys {
        rows: [u8; ROWS],
    }

    impl MatrixSampler for Keys {
        fn sample(&mut self, row: usize) -> u8 {
            self.rows[row]
        }
    }

    #[derive(Default)]
    struct FakeBus {
        sent: Vec<Report, 16>,
        busy: bool,
        frames: bool,
        idle_rate: u8,
        wakeups: u32,
        polls: u32,
    }

    impl RemoteWakeup for FakeBus {
        fn remote_wakeup(&mut self) {
            self.wakeups += 1;
        }
    }

    impl HidTransport for FakeBus {
        fn poll(&mut self) {
            self.polls += 1;
        }

        fn take_frame_activity(&mut self) -> bool {
            self.frames
        }

        fn idle_rate(&self) -> u8 {
            self.idle_rate
        }

        fn try_send(&mut self, report: &Report) -> bool {
            if self.busy {
                return false;
            }
            self.sent.push(*report).unwrap();
            true
        }
    }

    fn run(controller: &mut Controller<Keys>, bus: &mut FakeBus, steps: usize) -> usize {
        (0..steps)
            .filter_map(|_| controller.step(bus, Elapsed::default()))
            .count()
    }

    fn layout() -> Layout<'static> {
        Layout::new(layouts::C64_US).unwrap()
    }

    fn bus() -> FakeBus {
        FakeBus {
            frames: true,
            ..Default::default()
        }
    }

    #[test]
    fn sends_startup_report_then_keypress() {
        let layout = layout();
        let mut controller = Controller::new(Keys { rows: [RELEASED; ROWS] }, &layout);
        let mut bus = bus();

        assert_eq!(run(&mut controller, &mut bus, 10), 1);
        assert_eq!(bus.sent[0], Report::empty());
        assert_eq!(bus.polls, 10);

        // Press A at (2, 1).
        controller.sampler.rows[2] = 0xFD;
        assert_eq!(run(&mut controller, &mut bus, 30), 1);
        assert_eq!(bus.sent.len(), 2);
        assert_eq!(bus.sent[1].keys[0], KeyCode::A.usage());
        assert_eq!(controller.report(), &bus.sent[1]);
    }

    #[test]
    fn busy_endpoint_keeps_report_pending() {
        let layout = layout();
        let mut controller = Controller::new(Keys { rows: [RELEASED; ROWS] }, &layout);
        let mut bus = bus();
        bus.busy = true;

        run(&mut controller, &mut bus, 10);
        assert!(controller.has_pending_report());
        assert!(bus.sent.is_empty());

        bus.busy = false;
        controller.step(&mut bus, Elapsed::default());
        assert!(!controller.has_pending_report());
        assert_eq!(bus.sent.len(), 1);
    }

    #[test]
    fn idle_rate_resends_current_report() {
        let layout = layout();
        let mut controller = Controller::new(Keys { rows: [RELEASED; ROWS] }, &layout);
        let mut bus = bus();
        run(&mut controller, &mut bus, 10);
        assert_eq!(bus.sent.len(), 1);

        bus.idle_rate = 4;
        let tick = Elapsed {
            suspend_ticks: 0,
            idle_units: 4,
        };
        for _ in 0..3 {
            controller.step(&mut bus, tick);
        }
        assert_eq!(bus.sent.len(), 4);
        assert!(bus.sent.iter().all(|r| *r == Report::empty()));
    }

    #[test]
    fn keypress_after_bus_goes_quiet_wakes_host_once() {
        let layout = layout();
        let mut controller = Controller::new(Keys { rows: [RELEASED; ROWS] }, &layout);
        let mut bus = bus();
        run(&mut controller, &mut bus, 10);

        bus.frames = false;
        controller.step(
            &mut bus,
            Elapsed {
                suspend_ticks: 6,
                idle_units: 0,
            },
        );
        assert!(controller.is_suspended());

        controller.sampler.rows[1] = 0xFD; // W
        let outcomes: Vec<ScanOutcome, 4> = (0..30)
            .filter_map(|_| controller.step(&mut bus, Elapsed::default()))
            .collect();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].woke_host);
        assert!(outcomes[0].any_pressed);
        assert_eq!(bus.wakeups, 1);
        assert!(!controller.is_suspended());
        assert_eq!(bus.sent.last().unwrap().keys[0], KeyCode::W.usage());
    }

    #[test]
    fn seven_keys_report_rollover() {
        let layout = layout();
        let mut controller = Controller::new(Keys { rows: [RELEASED; ROWS] }, &layout);
        let mut bus = bus();
        run(&mut controller, &mut bus, 10);

        // Enter W R Y I P on row 1, A on row 2.
        controller.sampler.rows[1] = 0xC0;
        controller.sampler.rows[2] = 0xFD;
        let outcomes: Vec<ScanOutcome, 4> = (0..30)
            .filter_map(|_| controller.step(&mut bus, Elapsed::default()))
            .collect();

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].rolled_over);
        assert!(outcomes[0].report.is_rollover());
        let sent = bus.sent.last().unwrap();
        assert_eq!(sent.modifiers, 0);
        assert_eq!(sent.keys, [KeyCode::ErrorRollOver.usage(); 6]);
    }
}
