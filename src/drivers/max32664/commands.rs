// PulseWatch - MAX32664 command vocabulary
//
// Family bytes select an operation category, index bytes the operation within
// it, and write bytes a parameter or sub-selector.

// ---------------------------------------------------------------------------
// Family bytes
// ---------------------------------------------------------------------------
pub const HUB_STATUS: u8 = 0x00;
pub const SET_DEVICE_MODE: u8 = 0x01;
pub const READ_DEVICE_MODE: u8 = 0x02;
pub const OUTPUT_MODE: u8 = 0x10;
pub const READ_OUTPUT_MODE: u8 = 0x11;
pub const READ_DATA_OUTPUT: u8 = 0x12;
pub const READ_DATA_INPUT: u8 = 0x13;
pub const WRITE_REGISTER: u8 = 0x40;
pub const READ_REGISTER: u8 = 0x41;
pub const READ_ATTRIBUTES_AFE: u8 = 0x42;
pub const DUMP_REGISTERS: u8 = 0x43;
pub const ENABLE_SENSOR: u8 = 0x44;
pub const READ_SENSOR_MODE: u8 = 0x45;
pub const CHANGE_ALGORITHM_CONFIG: u8 = 0x50;
pub const READ_ALGORITHM_CONFIG: u8 = 0x51;
pub const ENABLE_ALGORITHM: u8 = 0x52;
pub const BOOTLOADER_FLASH: u8 = 0x80;
pub const BOOTLOADER_INFO: u8 = 0x81;
pub const IDENTITY: u8 = 0xFF;

// ---------------------------------------------------------------------------
// Index bytes
// ---------------------------------------------------------------------------

// OUTPUT_MODE
pub const SET_FORMAT: u8 = 0x00;
pub const WRITE_SET_THRESHOLD: u8 = 0x01;

// READ_DATA_OUTPUT
pub const NUM_SAMPLES: u8 = 0x00;
pub const READ_DATA: u8 = 0x01;

// READ_DATA_INPUT
pub const SAMPLE_SIZE: u8 = 0x00;

// Downstream device selectors shared by WRITE_REGISTER, READ_REGISTER,
// READ_ATTRIBUTES_AFE, DUMP_REGISTERS, ENABLE_SENSOR and READ_SENSOR_MODE.
pub const DEVICE_MAX30101: u8 = 0x03;
pub const DEVICE_ACCELEROMETER: u8 = 0x04;

// CHANGE_ALGORITHM_CONFIG / READ_ALGORITHM_CONFIG
pub const AGC_CONFIG: u8 = 0x00;
pub const PULSE_OX_COEF: u8 = 0x02;
pub const BPT_CONFIG: u8 = 0x04;

// ENABLE_ALGORITHM
pub const ENABLE_AGC_ALGO: u8 = 0x00;
pub const ENABLE_WHRM_ALGO: u8 = 0x02;

// BOOTLOADER_FLASH
pub const SET_NUM_PAGES: u8 = 0x02;
pub const ERASE_FLASH: u8 = 0x03;

// BOOTLOADER_INFO
pub const BOOTLOADER_VERS: u8 = 0x00;

// IDENTITY
pub const READ_MCU_TYPE: u8 = 0x00;
pub const READ_SENSOR_HUB_VERS: u8 = 0x03;
pub const READ_ALGO_VERS: u8 = 0x07;

// ---------------------------------------------------------------------------
// Write bytes
// ---------------------------------------------------------------------------

// AGC parameter ids (CHANGE/READ_ALGORITHM_CONFIG, index AGC_CONFIG)
pub const AGC_GAIN_ID: u8 = 0x00;
pub const AGC_STEP_SIZE_ID: u8 = 0x01;
pub const AGC_SENSITIVITY_ID: u8 = 0x02;
pub const AGC_NUM_SAMP_ID: u8 = 0x03;
pub const MAXIMFAST_COEF_ID: u8 = 0x0B;

// BPT_CONFIG parameter ids
pub const BPT_MEDICATION: u8 = 0x00;
pub const SYSTOLIC_VALUE: u8 = 0x01;
pub const DIASTOLIC_VALUE: u8 = 0x02;
pub const BPT_CALIB_DATA: u8 = 0x03;
pub const PATIENT_RESTING: u8 = 0x05;
pub const AGC_SP02_COEFS: u8 = 0x0B;

pub const NO_WRITE: u8 = 0x00;

// ---------------------------------------------------------------------------
// Status byte
// ---------------------------------------------------------------------------

/// Code reported for parameters rejected before any bus traffic.
pub const INCORRECT_PARAM: u8 = 0xEE;

/// First byte of every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    UnavailableCommand,
    UnavailableFunction,
    DataFormat,
    InputValue,
    TryAgain,
    BootloaderGeneral,
    BootloaderChecksum,
    BootloaderAuth,
    BootloaderInvalidApp,
    Unknown(u8),
}

impl Status {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::Success,
            0x01 => Self::UnavailableCommand,
            0x02 => Self::UnavailableFunction,
            0x03 => Self::DataFormat,
            0x04 => Self::InputValue,
            0x05 => Self::TryAgain,
            0x80 => Self::BootloaderGeneral,
            0x81 => Self::BootloaderChecksum,
            0x82 => Self::BootloaderAuth,
            0x83 => Self::BootloaderInvalidApp,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0x00,
            Self::UnavailableCommand => 0x01,
            Self::UnavailableFunction => 0x02,
            Self::DataFormat => 0x03,
            Self::InputValue => 0x04,
            Self::TryAgain => 0x05,
            Self::BootloaderGeneral => 0x80,
            Self::BootloaderChecksum => 0x81,
            Self::BootloaderAuth => 0x82,
            Self::BootloaderInvalidApp => 0x83,
            Self::Unknown(code) => code,
        }
    }
}

// ---------------------------------------------------------------------------
// Typed parameters
// ---------------------------------------------------------------------------

/// FIFO output format (OUTPUT_MODE / SET_FORMAT write byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputMode {
    Pause = 0x00,
    SensorData = 0x01,
    AlgoData = 0x02,
    SensorAndAlgorithm = 0x03,
    PauseTwo = 0x04,
    SensorCounterByte = 0x05,
    AlgoCounterByte = 0x06,
    SensorAlgoCounter = 0x07,
}

impl OutputMode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x00 => Self::Pause,
            0x01 => Self::SensorData,
            0x02 => Self::AlgoData,
            0x03 => Self::SensorAndAlgorithm,
            0x04 => Self::PauseTwo,
            0x05 => Self::SensorCounterByte,
            0x06 => Self::AlgoCounterByte,
            0x07 => Self::SensorAlgoCounter,
            _ => return None,
        })
    }
}

/// MaximFast algorithm report variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlgoMode {
    /// Heart rate, confidence, SpO2, finger status.
    ModeOne = 0x01,
    /// Mode one plus R-value and extended status.
    ModeTwo = 0x02,
}

/// Operating-mode selector written to SET_DEVICE_MODE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperatingMode {
    ExitBootloader = 0x00,
    Reset = 0x02,
    EnterBootloader = 0x08,
}

/// Value of the READ_DEVICE_MODE register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    Application,
    Bootloader,
    Other(u8),
}

impl DeviceMode {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::Application,
            0x08 => Self::Bootloader,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McuType {
    Max32625,
    Max32660,
    Other(u8),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub revision: u8,
}

impl core::fmt::Display for Version {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

/// Word size and register count of a downstream analog front end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AfeAttributes {
    pub byte_word: u8,
    pub available_registers: u8,
}
