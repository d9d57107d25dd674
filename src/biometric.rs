// PulseWatch - Biometric FIFO decoding
//
// Turns one raw output-FIFO record into a `BioSample`.  The record layout is
// fixed by the hub's output mode and the MaximFast report variant.

use crate::drivers::max32664::commands::AlgoMode;

/// Heart rate / SpO2 / confidence / finger status block.
pub const MAXFAST_ARRAY_SIZE: usize = 6;
/// Extra bytes appended in report mode two (R-value, extended status, reserved).
pub const MAXFAST_EXTENDED_DATA: usize = 5;
/// Four 24-bit LED channels.
pub const MAX30101_LED_ARRAY: usize = 12;

/// Largest record any layout produces.
pub const MAX_RECORD: usize = MAX30101_LED_ARRAY + MAXFAST_ARRAY_SIZE + MAXFAST_EXTENDED_DATA;

/// Finger detection reported in the status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerStatus {
    NoObject,
    Object,
    NonFinger,
    Finger,
    Other(u8),
}

impl From<u8> for FingerStatus {
    fn from(byte: u8) -> Self {
        match byte {
            0 => Self::NoObject,
            1 => Self::Object,
            2 => Self::NonFinger,
            3 => Self::Finger,
            other => Self::Other(other),
        }
    }
}

/// One decoded FIFO record.  Heart rate is in bpm and oxygen in percent
/// (the hub's 0.1-unit fields divided by ten).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BioSample {
    pub heart_rate: u16,
    pub confidence: u8,
    pub oxygen: u16,
    pub status: u8,
    pub r_value: f32,
    pub ext_status: i8,
    pub ir_led: u32,
    pub red_led: u32,
}

impl BioSample {
    pub fn finger(&self) -> FingerStatus {
        FingerStatus::from(self.status)
    }

    /// Samples with every biometric field zero carry no data.
    pub fn is_empty(&self) -> bool {
        self.heart_rate == 0 && self.oxygen == 0 && self.confidence == 0
    }
}

/// Which fields a FIFO record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// LED counts only.
    Sensor,
    /// Algorithm block only.
    Algorithm(AlgoMode),
    /// LED counts followed by the algorithm block.
    SensorAndAlgorithm(AlgoMode),
}

impl RecordLayout {
    pub fn record_len(self) -> usize {
        let algo = |mode: AlgoMode| match mode {
            AlgoMode::ModeOne => MAXFAST_ARRAY_SIZE,
            AlgoMode::ModeTwo => MAXFAST_ARRAY_SIZE + MAXFAST_EXTENDED_DATA,
        };
        match self {
            Self::Sensor => MAX30101_LED_ARRAY,
            Self::Algorithm(mode) => algo(mode),
            Self::SensorAndAlgorithm(mode) => MAX30101_LED_ARRAY + algo(mode),
        }
    }
}

/// Decode `raw` according to `layout`.  A missing layout or a record shorter
/// than the layout requires yields an all-zero sample.
pub fn decode(layout: Option<RecordLayout>, raw: &[u8]) -> BioSample {
    let Some(layout) = layout else {
        return BioSample::default();
    };
    if raw.len() < layout.record_len() {
        return BioSample::default();
    }

    let mut sample = BioSample::default();
    match layout {
        RecordLayout::Sensor => decode_leds(raw, &mut sample),
        RecordLayout::Algorithm(mode) => decode_algorithm(mode, raw, &mut sample),
        RecordLayout::SensorAndAlgorithm(mode) => {
            decode_leds(raw, &mut sample);
            decode_algorithm(mode, &raw[MAX30101_LED_ARRAY..], &mut sample);
        }
    }
    sample
}

fn decode_leds(raw: &[u8], sample: &mut BioSample) {
    sample.ir_led = be24(&raw[0..3]);
    sample.red_led = be24(&raw[3..6]);
}

fn decode_algorithm(mode: AlgoMode, block: &[u8], sample: &mut BioSample) {
    sample.heart_rate = be16(&block[0..2]) / 10;
    sample.confidence = block[2];
    sample.oxygen = be16(&block[3..5]) / 10;
    sample.status = block[5];

    if mode == AlgoMode::ModeTwo {
        sample.r_value = f32::from(be16(&block[6..8])) / 10.0;
        sample.ext_status = block[8] as i8;
    }
}

fn be16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

fn be24(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
}
