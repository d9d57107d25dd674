// PulseWatch - Breathing pacer waveform
//
// Triangle wave stepped once per tick.  The level climbs by `BREATH_STEP`
// until it reaches `BREATH_TOP`, then falls back to zero and repeats.

use crate::config::{BREATH_STEP, BREATH_TOP};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreathWave {
    level: u16,
    falling: bool,
}

impl BreathWave {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn level(&self) -> u16 {
        self.level
    }

    /// Advance one tick and return the new level.
    pub fn step(&mut self) -> u16 {
        self.level = if self.falling {
            self.level.saturating_sub(BREATH_STEP)
        } else {
            self.level + BREATH_STEP
        };
        if self.level == 0 || self.level >= BREATH_TOP {
            self.falling = !self.falling;
        }
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rises_to_top_then_falls_to_zero() {
        let mut wave = BreathWave::new();
        let levels: Vec<u16> = (0..500).map(|_| wave.step()).collect();

        assert_eq!(&levels[..3], &[4, 8, 12]);
        assert_eq!(levels[249], 1000);
        assert_eq!(levels[250], 996);
        assert_eq!(levels[499], 0);
        assert!(levels.windows(2).all(|w| w[0].abs_diff(w[1]) == BREATH_STEP));
    }

    #[test]
    fn period_repeats() {
        let mut wave = BreathWave::new();
        let first: Vec<u16> = (0..500).map(|_| wave.step()).collect();
        let second: Vec<u16> = (0..500).map(|_| wave.step()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn reset_restarts_the_climb() {
        let mut wave = BreathWave::new();
        for _ in 0..300 {
            wave.step();
        }
        wave.reset();
        assert_eq!(wave.level(), 0);
        assert_eq!(wave.step(), 4);
    }
}
