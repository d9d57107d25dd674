// PulseWatch - System Events & Data Types

use std::sync::atomic::{AtomicU8, Ordering};

use crate::aggregate::Averages;

// ---------------------------------------------------------------------------
// Measurement state (published atomically, one writer)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MachineState {
    Idle = 0,
    Wait = 1,
    Measure = 2,
    End = 3,
    Error = 4,
    Exercise = 5,
}

impl MachineState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Wait,
            2 => Self::Measure,
            3 => Self::End,
            4 => Self::Error,
            5 => Self::Exercise,
            _ => Self::Idle,
        }
    }

    /// States in which the sensor task should be pulling samples.
    pub fn wants_samples(self) -> bool {
        matches!(self, Self::Wait | Self::Measure)
    }
}

/// Process-wide machine state.  Only the state machine stores; any task loads.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new(state: MachineState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn load(&self) -> MachineState {
        MachineState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: MachineState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new(MachineState::Idle)
    }
}

// ---------------------------------------------------------------------------
// Screens
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// "Put finger / on sensors"
    PlaceFinger,
    Measuring,
    /// "Invalid measure / Repeat"
    InvalidMeasure,
    Exercise,
    Result(Averages),
}

// ---------------------------------------------------------------------------
// Window report (logged at every window close)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Too few accepted samples.
    Discard,
    /// Spread too small relative to the average.
    Unreliable,
    Exercise,
    Accept,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowReport {
    pub accepted: u32,
    pub target: u32,
    /// `None` when the window was discarded before averaging.
    pub averages: Option<Averages>,
    pub uncertainty: Option<(f32, f32)>,
    pub verdict: Verdict,
}

// ---------------------------------------------------------------------------
// UI Events - sent to the UI task via channel
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiEvent {
    Show(Screen),
    Report(WindowReport),
}
