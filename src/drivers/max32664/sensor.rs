// PulseWatch - MAX32664 downstream AFE control
//
// Register access to the MAX30101 and the optional accelerometer through the
// hub, FIFO bookkeeping, and the read-modify-write setters for the MAX30101
// SpO2 configuration register.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;

use super::commands::*;
use super::{HubError, HubResult, Max32664};

/// MAX30101 SpO2 configuration register.
const CONFIGURATION_REGISTER: u8 = 0x0A;

const PULSE_MASK: u8 = 0xFC;
const READ_PULSE_MASK: u8 = 0x03;
const SAMP_MASK: u8 = 0xE3;
const READ_SAMP_MASK: u8 = 0x1C;
const ADC_MASK: u8 = 0x9F;
const READ_ADC_MASK: u8 = 0x60;

/// MAX30101 register dump: 36 registers, address/value pairs.
pub const MAX30101_DUMP_LEN: usize = 36 * 2;

/// LED pulse width in microseconds, bits [1:0].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseWidth {
    Us69,
    Us118,
    Us215,
    Us411,
}

impl PulseWidth {
    pub fn from_micros(us: u16) -> Option<Self> {
        Some(match us {
            69 => Self::Us69,
            118 => Self::Us118,
            215 => Self::Us215,
            411 => Self::Us411,
            _ => return None,
        })
    }

    pub fn micros(self) -> u16 {
        match self {
            Self::Us69 => 69,
            Self::Us118 => 118,
            Self::Us215 => 215,
            Self::Us411 => 411,
        }
    }

    fn bits(self) -> u8 {
        self as u8
    }

    fn from_bits(bits: u8) -> Self {
        match bits & READ_PULSE_MASK {
            0 => Self::Us69,
            1 => Self::Us118,
            2 => Self::Us215,
            _ => Self::Us411,
        }
    }
}

/// Samples per second, bits [4:2].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRate(u8);

impl SampleRate {
    const TABLE: [u16; 8] = [50, 100, 200, 400, 800, 1000, 1600, 3200];

    pub fn from_hz(hz: u16) -> Option<Self> {
        Self::TABLE.iter().position(|&r| r == hz).map(|i| Self(i as u8))
    }

    pub fn hz(self) -> u16 {
        Self::TABLE[self.0 as usize & 0x07]
    }
}

/// ADC full-scale range in nA, bits [6:5].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcRange {
    Na2048,
    Na4096,
    Na8192,
    Na16384,
}

impl AdcRange {
    /// Exact full-scale value only; no rounding to a neighbouring range.
    pub fn from_nanoamps(na: u16) -> Option<Self> {
        Some(match na {
            2048 => Self::Na2048,
            4096 => Self::Na4096,
            8192 => Self::Na8192,
            16384 => Self::Na16384,
            _ => return None,
        })
    }

    pub fn nanoamps(self) -> u16 {
        match self {
            Self::Na2048 => 2048,
            Self::Na4096 => 4096,
            Self::Na8192 => 8192,
            Self::Na16384 => 16384,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Na2048,
            1 => Self::Na4096,
            2 => Self::Na8192,
            _ => Self::Na16384,
        }
    }
}

impl<I2C, E, RST, MFIO, D> Max32664<I2C, RST, MFIO, D>
where
    I2C: I2c<Error = E>,
    RST: OutputPin,
    MFIO: InputPin + OutputPin,
    D: DelayNs,
{
    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    /// Hub status register; bit 0 flags a lost link to the AFE.
    pub fn read_sensor_hub_status(&mut self) -> HubResult<u8, E> {
        self.read_byte(HUB_STATUS, 0x00)
    }

    pub fn read_mcu_type(&mut self) -> HubResult<McuType, E> {
        Ok(match self.read_byte(IDENTITY, READ_MCU_TYPE)? {
            0x00 => McuType::Max32625,
            0x01 => McuType::Max32660,
            other => McuType::Other(other),
        })
    }

    pub fn read_sensor_hub_version(&mut self) -> HubResult<Version, E> {
        self.read_version(IDENTITY, READ_SENSOR_HUB_VERS)
    }

    pub fn read_algorithm_version(&mut self) -> HubResult<Version, E> {
        self.read_version(IDENTITY, READ_ALGO_VERS)
    }

    pub(crate) fn read_version(&mut self, family: u8, index: u8) -> HubResult<Version, E> {
        let mut raw = [0u8; 3];
        self.read_array(family, index, &mut raw)?;
        Ok(Version {
            major: raw[0],
            minor: raw[1],
            revision: raw[2],
        })
    }

    // -----------------------------------------------------------------------
    // Sensor enables
    // -----------------------------------------------------------------------

    pub fn max30101_control(&mut self, enable: bool) -> HubResult<(), E> {
        self.enable_write(ENABLE_SENSOR, DEVICE_MAX30101, enable as u8)
    }

    pub fn read_max30101_state(&mut self) -> HubResult<bool, E> {
        Ok(self.read_byte(READ_SENSOR_MODE, DEVICE_MAX30101)? != 0)
    }

    pub fn accel_control(&mut self, enable: bool) -> HubResult<(), E> {
        self.enable_write(ENABLE_SENSOR, DEVICE_ACCELEROMETER, enable as u8)
    }

    // -----------------------------------------------------------------------
    // Output / FIFO
    // -----------------------------------------------------------------------

    pub fn set_output_mode(&mut self, mode: OutputMode) -> HubResult<(), E> {
        self.write_byte(OUTPUT_MODE, SET_FORMAT, mode as u8)
    }

    /// FIFO fill level (1..=255 samples) at which MFIO is asserted.
    pub fn set_fifo_threshold(&mut self, threshold: u8) -> HubResult<(), E> {
        if threshold == 0 {
            return Err(HubError::InvalidParam);
        }
        self.write_byte(OUTPUT_MODE, WRITE_SET_THRESHOLD, threshold)
    }

    pub fn num_samples_out_fifo(&mut self) -> HubResult<u8, E> {
        self.read_byte(READ_DATA_OUTPUT, NUM_SAMPLES)
    }

    /// Input FIFO sample size for the given downstream device.
    pub fn num_samples_external_sensor(&mut self) -> HubResult<u8, E> {
        self.read_byte_with_param(READ_DATA_INPUT, SAMPLE_SIZE, DEVICE_ACCELEROMETER)
    }

    /// Raw output FIFO contents; zero-filled on failure.
    pub fn read_fifo(&mut self, out: &mut [u8]) -> HubResult<(), E> {
        self.read_array(READ_DATA_OUTPUT, READ_DATA, out)
    }

    // -----------------------------------------------------------------------
    // Downstream registers
    // -----------------------------------------------------------------------

    pub fn write_register_max30101(&mut self, reg: u8, value: u8) -> HubResult<(), E> {
        self.write_byte_with_register(WRITE_REGISTER, DEVICE_MAX30101, reg, value)
    }

    pub fn write_register_accel(&mut self, reg: u8, value: u8) -> HubResult<(), E> {
        self.write_byte_with_register(WRITE_REGISTER, DEVICE_ACCELEROMETER, reg, value)
    }

    pub fn read_register_max30101(&mut self, reg: u8) -> HubResult<u8, E> {
        self.read_byte_with_param(READ_REGISTER, DEVICE_MAX30101, reg)
    }

    pub fn read_register_accel(&mut self, reg: u8) -> HubResult<u8, E> {
        self.read_byte_with_param(READ_REGISTER, DEVICE_ACCELEROMETER, reg)
    }

    pub fn read_max30101_attributes(&mut self) -> HubResult<AfeAttributes, E> {
        self.read_attributes(DEVICE_MAX30101)
    }

    pub fn read_accel_attributes(&mut self) -> HubResult<AfeAttributes, E> {
        self.read_attributes(DEVICE_ACCELEROMETER)
    }

    fn read_attributes(&mut self, device: u8) -> HubResult<AfeAttributes, E> {
        let mut raw = [0u8; 2];
        self.read_array_with_param(READ_ATTRIBUTES_AFE, device, NO_WRITE, &mut raw)?;
        Ok(AfeAttributes {
            byte_word: raw[0],
            available_registers: raw[1],
        })
    }

    /// Address/value pairs of every MAX30101 register.
    pub fn dump_max30101_registers(&mut self, out: &mut [u8; MAX30101_DUMP_LEN]) -> HubResult<(), E> {
        self.read_array_with_param(DUMP_REGISTERS, DEVICE_MAX30101, NO_WRITE, out)
    }

    /// Address/value pairs of the accelerometer registers; `out.len()` from
    /// [`Self::read_accel_attributes`].
    pub fn dump_accel_registers(&mut self, out: &mut [u8]) -> HubResult<(), E> {
        self.read_array_with_param(DUMP_REGISTERS, DEVICE_ACCELEROMETER, NO_WRITE, out)
    }

    // -----------------------------------------------------------------------
    // MAX30101 SpO2 configuration (read-modify-write)
    // -----------------------------------------------------------------------

    fn modify_configuration(&mut self, keep_mask: u8, bits: u8) -> HubResult<(), E> {
        let current = self.read_register_max30101(CONFIGURATION_REGISTER)?;
        let updated = (current & keep_mask) | (bits & !keep_mask);
        self.write_register_max30101(CONFIGURATION_REGISTER, updated)
    }

    /// Pulse width in µs; anything outside {69, 118, 215, 411} is refused.
    pub fn set_pulse_width(&mut self, width_us: u16) -> HubResult<(), E> {
        let width = PulseWidth::from_micros(width_us).ok_or(HubError::InvalidParam)?;
        self.modify_configuration(PULSE_MASK, width.bits())
    }

    pub fn read_pulse_width(&mut self) -> HubResult<PulseWidth, E> {
        let reg = self.read_register_max30101(CONFIGURATION_REGISTER)?;
        Ok(PulseWidth::from_bits(reg & READ_PULSE_MASK))
    }

    /// Sample rate in Hz; anything outside 50..3200 steps is refused.
    pub fn set_sample_rate(&mut self, hz: u16) -> HubResult<(), E> {
        let rate = SampleRate::from_hz(hz).ok_or(HubError::InvalidParam)?;
        self.modify_configuration(SAMP_MASK, rate.0 << 2)
    }

    pub fn read_sample_rate(&mut self) -> HubResult<SampleRate, E> {
        let reg = self.read_register_max30101(CONFIGURATION_REGISTER)?;
        Ok(SampleRate((reg & READ_SAMP_MASK) >> 2))
    }

    /// ADC range in nA; anything outside {2048, 4096, 8192, 16384} is refused.
    pub fn set_adc_range(&mut self, na: u16) -> HubResult<(), E> {
        let range = AdcRange::from_nanoamps(na).ok_or(HubError::InvalidParam)?;
        self.modify_configuration(ADC_MASK, (range as u8) << 5)
    }

    pub fn read_adc_range(&mut self) -> HubResult<AdcRange, E> {
        let reg = self.read_register_max30101(CONFIGURATION_REGISTER)?;
        Ok(AdcRange::from_bits((reg & READ_ADC_MASK) >> 5))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{exchange, finish, hub};
    use super::*;

    fn rmw(current: u8, written: u8) -> Vec<embedded_hal_mock::eh1::i2c::Transaction> {
        let mut t = Vec::new();
        t.extend(exchange(&[0x41, 0x03, 0x0A], &[0x00, current]));
        t.extend(exchange(&[0x40, 0x03, 0x0A, written], &[0x00]));
        t
    }

    #[test]
    fn pulse_width_preserves_other_bits() {
        let mut hub = hub(&rmw(0b1010_1100, 0b1010_1110));
        hub.set_pulse_width(215).unwrap();
        finish(hub);
    }

    #[test]
    fn sample_rate_touches_bits_4_to_2_only() {
        // 400 Hz -> code 3
        let mut hub = hub(&rmw(0xFF, 0b1110_1111));
        hub.set_sample_rate(400).unwrap();
        finish(hub);

        let mut hub = super::super::tests::hub(&rmw(0x00, 0b0000_1100));
        hub.set_sample_rate(400).unwrap();
        finish(hub);
    }

    #[test]
    fn adc_range_accepts_exact_table_values_only() {
        let mut hub = hub(&rmw(0b1001_1111, 0b1101_1111));
        hub.set_adc_range(8192).unwrap();
        finish(hub);

        let mut hub = super::super::tests::hub(&[]);
        for na in [0u16, 2047, 5000, 8191, 16385] {
            assert!(matches!(hub.set_adc_range(na), Err(HubError::InvalidParam)));
        }
        finish(hub);
    }

    #[test]
    fn every_field_write_leaves_foreign_bits() {
        for current in [0x00u8, 0x5A, 0xA5, 0xFF] {
            for (us, code) in [(69u16, 0u8), (118, 1), (215, 2), (411, 3)] {
                let expected = (current & PULSE_MASK) | code;
                let mut h = hub(&rmw(current, expected));
                h.set_pulse_width(us).unwrap();
                finish(h);
                assert_eq!(expected & !READ_PULSE_MASK, current & !READ_PULSE_MASK);
            }

            for (code, &hz) in SampleRate::TABLE.iter().enumerate() {
                let expected = (current & SAMP_MASK) | ((code as u8) << 2);
                let mut h = hub(&rmw(current, expected));
                h.set_sample_rate(hz).unwrap();
                finish(h);
                assert_eq!(expected & !READ_SAMP_MASK, current & !READ_SAMP_MASK);
            }

            for (na, code) in [(2048u16, 0u8), (4096, 1), (8192, 2), (16384, 3)] {
                let expected = (current & ADC_MASK) | (code << 5);
                let mut h = hub(&rmw(current, expected));
                h.set_adc_range(na).unwrap();
                finish(h);
                assert_eq!(expected & !READ_ADC_MASK, current & !READ_ADC_MASK);
            }
        }
    }

    #[test]
    fn unlisted_values_rejected_without_traffic() {
        let mut hub = hub(&[]);
        assert!(matches!(hub.set_pulse_width(100), Err(HubError::InvalidParam)));
        assert!(matches!(hub.set_sample_rate(250), Err(HubError::InvalidParam)));
        assert!(matches!(hub.set_adc_range(16385), Err(HubError::InvalidParam)));
        assert!(matches!(hub.set_fifo_threshold(0), Err(HubError::InvalidParam)));
        assert_eq!(HubError::<()>::InvalidParam.code(), 0xEE);
        finish(hub);
    }

    #[test]
    fn field_getters_decode_masked_bits() {
        let mut t = Vec::new();
        t.extend(exchange(&[0x41, 0x03, 0x0A], &[0x00, 0b0101_0110]));
        t.extend(exchange(&[0x41, 0x03, 0x0A], &[0x00, 0b0101_0110]));
        t.extend(exchange(&[0x41, 0x03, 0x0A], &[0x00, 0b0101_0110]));
        let mut hub = hub(&t);
        assert_eq!(hub.read_pulse_width().unwrap(), PulseWidth::Us215);
        assert_eq!(hub.read_sample_rate().unwrap().hz(), 1000);
        assert_eq!(hub.read_adc_range().unwrap(), AdcRange::Na8192);
        finish(hub);
    }

    #[test]
    fn failed_register_read_aborts_write() {
        let mut hub = hub(&exchange(&[0x41, 0x03, 0x0A], &[0x01, 0x00]));
        assert!(matches!(
            hub.set_pulse_width(411),
            Err(HubError::Status(Status::UnavailableCommand))
        ));
        finish(hub);
    }

    #[test]
    fn accelerometer_commands_address_device_four() {
        let mut t = Vec::new();
        t.extend(exchange(&[0x44, 0x04, 0x01], &[0x00]));
        t.extend(exchange(&[0x13, 0x00, 0x04], &[0x00, 6]));
        t.extend(exchange(&[0x43, 0x04, 0x00], &[0x00, 0x0F, 0x33, 0x20, 0x47]));
        let mut hub = hub(&t);
        hub.accel_control(true).unwrap();
        assert_eq!(hub.num_samples_external_sensor().unwrap(), 6);
        let mut dump = [0u8; 4];
        hub.dump_accel_registers(&mut dump).unwrap();
        assert_eq!(dump, [0x0F, 0x33, 0x20, 0x47]);
        finish(hub);
    }

    #[test]
    fn versions_and_attributes_decode() {
        let mut t = Vec::new();
        t.extend(exchange(&[0xFF, 0x07], &[0x00, 10, 2, 3]));
        t.extend(exchange(&[0x42, 0x03, 0x00], &[0x00, 1, 36]));
        t.extend(exchange(&[0xFF, 0x00], &[0x00, 0x01]));
        let mut hub = hub(&t);
        assert_eq!(hub.read_algorithm_version().unwrap().to_string(), "10.2.3");
        assert_eq!(
            hub.read_max30101_attributes().unwrap(),
            AfeAttributes { byte_word: 1, available_registers: 36 }
        );
        assert_eq!(hub.read_mcu_type().unwrap(), McuType::Max32660);
        finish(hub);
    }
}
