// PulseWatch - Measurement State Machine
//
//   Idle --arm--> Wait --finger--> Measure --window--> End | Error | Exercise
//   End / Error --pause--> Wait          Exercise --timeout--> Wait
//
// Driven by a 10 ms tick, an arming event and the samples handed over by the
// sensor task.  Every call is O(1) and never blocks; side effects go through
// `MachineIo`.

use std::sync::Arc;

use crate::aggregate::Aggregate;
use crate::biometric::{BioSample, FingerStatus};
use crate::breath::BreathWave;
use crate::config::*;
use crate::events::{MachineState, Screen, StateCell, Verdict, WindowReport};

/// Everything the machine can do to the outside world.
pub trait MachineIo {
    fn show(&mut self, screen: Screen);
    fn set_error_indicator(&mut self, on: bool);
    fn start_breathing(&mut self);
    fn set_breathing_level(&mut self, level: u16);
    fn stop_breathing(&mut self);
    fn report(&mut self, report: WindowReport);
}

const fn seconds(s: u32) -> u32 {
    s * TICKS_PER_SECOND
}

pub struct Machine {
    state: Arc<StateCell>,
    aggregate: Aggregate,
    ticks: u32,
    wave: BreathWave,
}

impl Machine {
    pub fn new(state: Arc<StateCell>) -> Self {
        state.store(MachineState::Idle);
        Self {
            state,
            aggregate: Aggregate::new(),
            ticks: 0,
            wave: BreathWave::new(),
        }
    }

    pub fn state(&self) -> MachineState {
        self.state.load()
    }

    /// Ticks spent in the current timed state.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    fn enter(&mut self, next: MachineState) {
        log::debug!("{:?} -> {:?}", self.state(), next);
        self.ticks = 0;
        self.state.store(next);
    }

    /// Button edge.  Only effective from Idle.
    pub fn arm(&mut self, io: &mut impl MachineIo) -> bool {
        if self.state() != MachineState::Idle {
            return false;
        }
        log::info!("Device is on");
        io.set_error_indicator(false);
        io.show(Screen::PlaceFinger);
        self.enter(MachineState::Wait);
        true
    }

    /// Hand over one sample from the sensor task.
    pub fn offer_sample(&mut self, sample: &BioSample, io: &mut impl MachineIo) {
        match self.state() {
            MachineState::Wait if sample.finger() == FingerStatus::Finger => {
                self.aggregate.reset();
                io.show(Screen::Measuring);
                self.enter(MachineState::Measure);
            }
            MachineState::Measure => {
                self.aggregate.offer(sample);
            }
            _ => {}
        }
    }

    /// One 10 ms period.
    pub fn tick(&mut self, io: &mut impl MachineIo) {
        match self.state() {
            MachineState::Measure => {
                if self.ticks >= seconds(MAX_MEASURE_TIME) {
                    self.close_window(io);
                } else {
                    self.ticks += 1;
                }
            }
            MachineState::Exercise => {
                if self.ticks >= seconds(EXERCISE_TIME) {
                    io.stop_breathing();
                    io.show(Screen::PlaceFinger);
                    self.enter(MachineState::Wait);
                } else {
                    io.set_breathing_level(self.wave.step());
                    self.ticks += 1;
                }
            }
            MachineState::End | MachineState::Error => {
                if self.ticks >= seconds(PAUSE_TIME) {
                    io.set_error_indicator(false);
                    io.show(Screen::PlaceFinger);
                    self.enter(MachineState::Wait);
                } else {
                    self.ticks += 1;
                }
            }
            MachineState::Idle | MachineState::Wait => {}
        }
    }

    fn close_window(&mut self, io: &mut impl MachineIo) {
        let accepted = self.aggregate.count();
        let averages = self.aggregate.averages();
        let uncertainty = self.aggregate.uncertainty();

        let verdict = match (averages, uncertainty) {
            _ if accepted < OPT_MEASURES => Verdict::Discard,
            (Some(_), Some((hr, ox))) if hr <= MIN_UNCERT_THRES || ox <= MIN_UNCERT_THRES => {
                Verdict::Unreliable
            }
            (Some(avg), _) if avg.heart_rate > HIGH_HR_THRES => Verdict::Exercise,
            (Some(_), _) => Verdict::Accept,
            (None, _) => Verdict::Discard,
        };

        io.report(WindowReport {
            accepted,
            target: OPT_MEASURES,
            averages: averages.filter(|_| verdict != Verdict::Discard),
            uncertainty: uncertainty.filter(|_| verdict != Verdict::Discard),
            verdict,
        });

        match (verdict, averages) {
            (Verdict::Exercise, _) => {
                io.show(Screen::Exercise);
                self.wave.reset();
                io.start_breathing();
                self.enter(MachineState::Exercise);
            }
            (Verdict::Accept, Some(avg)) => {
                io.show(Screen::Result(avg));
                self.enter(MachineState::End);
            }
            _ => {
                io.set_error_indicator(true);
                io.show(Screen::InvalidMeasure);
                self.enter(MachineState::Error);
            }
        }
    }
}
