// PulseWatch - Measurement window aggregate
//
// Running sum / max / min of the samples accepted during one window.

use crate::biometric::BioSample;
use crate::config::{MIN_MEASURABLE_HR, MIN_MEASURABLE_OXY};

/// One heart-rate / oxygen / confidence triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triple {
    pub heart_rate: u32,
    pub oxygen: u32,
    pub confidence: u32,
}

impl Triple {
    const MAX: Self = Self {
        heart_rate: u32::MAX,
        oxygen: u32::MAX,
        confidence: u32::MAX,
    };

    fn of(sample: &BioSample) -> Self {
        Self {
            heart_rate: u32::from(sample.heart_rate),
            oxygen: u32::from(sample.oxygen),
            confidence: u32::from(sample.confidence),
        }
    }
}

/// Window averages (integer division of the sums).
pub type Averages = Triple;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    sum: Triple,
    max: Triple,
    min: Triple,
    count: u32,
}

impl Default for Aggregate {
    fn default() -> Self {
        Self {
            sum: Triple::default(),
            max: Triple::default(),
            min: Triple::MAX,
            count: 0,
        }
    }
}

/// Plausibility gate applied to every sample in Measure.
pub fn is_measurable(sample: &BioSample) -> bool {
    sample.heart_rate >= MIN_MEASURABLE_HR && sample.oxygen >= MIN_MEASURABLE_OXY
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn max(&self) -> Triple {
        self.max
    }

    pub fn min(&self) -> Triple {
        self.min
    }

    /// Fold `sample` in if it passes the gate.  Returns whether it was taken.
    pub fn offer(&mut self, sample: &BioSample) -> bool {
        if !is_measurable(sample) {
            return false;
        }
        let t = Triple::of(sample);

        self.sum.heart_rate += t.heart_rate;
        self.sum.oxygen += t.oxygen;
        self.sum.confidence += t.confidence;

        self.max.heart_rate = self.max.heart_rate.max(t.heart_rate);
        self.max.oxygen = self.max.oxygen.max(t.oxygen);
        self.max.confidence = self.max.confidence.max(t.confidence);

        self.min.heart_rate = self.min.heart_rate.min(t.heart_rate);
        self.min.oxygen = self.min.oxygen.min(t.oxygen);
        self.min.confidence = self.min.confidence.min(t.confidence);

        self.count += 1;
        true
    }

    /// Per-field sum / count; `None` for an empty window.
    pub fn averages(&self) -> Option<Averages> {
        if self.count == 0 {
            return None;
        }
        Some(Triple {
            heart_rate: self.sum.heart_rate / self.count,
            oxygen: self.sum.oxygen / self.count,
            confidence: self.sum.confidence / self.count,
        })
    }

    /// Half-range of heart rate and of oxygen, each over its window average.
    pub fn uncertainty(&self) -> Option<(f32, f32)> {
        let avg = self.averages()?;
        let norm = |max: u32, min: u32, avg: u32| {
            if avg == 0 {
                0.0
            } else {
                (max - min) as f32 / 2.0 / avg as f32
            }
        };
        Some((
            norm(self.max.heart_rate, self.min.heart_rate, avg.heart_rate),
            norm(self.max.oxygen, self.min.oxygen, avg.oxygen),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(hr: u16, ox: u16, conf: u8) -> BioSample {
        BioSample {
            heart_rate: hr,
            oxygen: ox,
            confidence: conf,
            status: 3,
            ..BioSample::default()
        }
    }

    #[test]
    fn fresh_window_has_sentinel_extremes() {
        let agg = Aggregate::new();
        assert_eq!(agg.count(), 0);
        assert_eq!(agg.max(), Triple::default());
        assert_eq!(agg.min(), Triple::MAX);
        assert_eq!(agg.averages(), None);
    }

    #[test]
    fn average_truncates() {
        let mut agg = Aggregate::new();
        for (hr, ox) in [(700, 980), (701, 981), (701, 981)] {
            assert!(agg.offer(&sample(hr, ox, 90)));
        }
        let avg = agg.averages().unwrap();
        assert_eq!(avg.heart_rate, 700);
        assert_eq!(avg.oxygen, 980);
        assert_eq!(avg.confidence, 90);
    }

    #[test]
    fn rejected_samples_change_nothing() {
        let mut agg = Aggregate::new();
        agg.offer(&sample(700, 980, 90));
        let before = agg.clone();

        assert!(!agg.offer(&sample(MIN_MEASURABLE_HR - 1, 980, 99)));
        assert!(!agg.offer(&sample(700, MIN_MEASURABLE_OXY - 1, 99)));
        assert!(!agg.offer(&BioSample::default()));
        assert_eq!(agg, before);
    }

    #[test]
    fn gate_boundaries_are_inclusive() {
        let mut agg = Aggregate::new();
        assert!(agg.offer(&sample(MIN_MEASURABLE_HR, MIN_MEASURABLE_OXY, 0)));
    }

    #[test]
    fn average_lies_between_extremes() {
        let mut agg = Aggregate::new();
        let data = [(650, 950, 80), (900, 990, 99), (720, 970, 85), (810, 960, 90), (101, 11, 0)];
        for &(hr, ox, c) in &data {
            agg.offer(&sample(hr, ox, c));
        }
        let (avg, min, max) = (agg.averages().unwrap(), agg.min(), agg.max());
        for (lo, mid, hi) in [
            (min.heart_rate, avg.heart_rate, max.heart_rate),
            (min.oxygen, avg.oxygen, max.oxygen),
            (min.confidence, avg.confidence, max.confidence),
        ] {
            assert!(lo <= mid && mid <= hi, "{lo} <= {mid} <= {hi}");
        }
        assert_eq!(min.heart_rate, 101);
        assert_eq!(max.heart_rate, 900);
    }

    #[test]
    fn identical_samples_have_zero_uncertainty() {
        let mut agg = Aggregate::new();
        for _ in 0..100 {
            agg.offer(&sample(700, 980, 90));
        }
        assert_eq!(agg.uncertainty(), Some((0.0, 0.0)));
    }

    #[test]
    fn uncertainty_is_half_range_over_average() {
        let mut agg = Aggregate::new();
        agg.offer(&sample(600, 800, 90));
        agg.offer(&sample(1000, 1200, 90));
        let (hr, ox) = agg.uncertainty().unwrap();
        assert!((hr - 0.25).abs() < 1e-6);
        assert!((ox - 0.2).abs() < 1e-6);
    }
}
