// PulseWatch - MAX32664 blood-pressure trending calibration
//
// Version D hubs only.  Reference readings and the calibration blob are
// written and read back through CHANGE_ALGORITHM_CONFIG / BPT_CONFIG.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;

use super::commands::*;
use super::{HubResult, Max32664};

/// Size of the calibration blob exchanged with the BPT algorithm.
pub const BPT_CALIB_LEN: usize = 824;

impl<I2C, E, RST, MFIO, D> Max32664<I2C, RST, MFIO, D>
where
    I2C: I2c<Error = E>,
    RST: OutputPin,
    MFIO: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn set_bp_medication(&mut self, on_medication: bool) -> HubResult<(), E> {
        self.write_byte_with_register(
            CHANGE_ALGORITHM_CONFIG,
            BPT_CONFIG,
            BPT_MEDICATION,
            on_medication as u8,
        )
    }

    pub fn bp_medication(&mut self) -> HubResult<bool, E> {
        Ok(self.read_byte_with_param(CHANGE_ALGORITHM_CONFIG, BPT_CONFIG, BPT_MEDICATION)? != 0)
    }

    /// Three systolic reference readings.
    pub fn write_systolic_vals(&mut self, vals: [u8; 3]) -> HubResult<(), E> {
        self.write_bytes(CHANGE_ALGORITHM_CONFIG, BPT_CONFIG, SYSTOLIC_VALUE, &vals)
    }

    pub fn read_systolic_vals(&mut self) -> HubResult<[u8; 3], E> {
        let mut vals = [0u8; 3];
        self.read_array_with_param(CHANGE_ALGORITHM_CONFIG, BPT_CONFIG, SYSTOLIC_VALUE, &mut vals)?;
        Ok(vals)
    }

    /// Three diastolic reference readings.
    pub fn write_diastolic_vals(&mut self, vals: [u8; 3]) -> HubResult<(), E> {
        self.write_bytes(CHANGE_ALGORITHM_CONFIG, BPT_CONFIG, DIASTOLIC_VALUE, &vals)
    }

    pub fn read_diastolic_vals(&mut self) -> HubResult<[u8; 3], E> {
        let mut vals = [0u8; 3];
        self.read_array_with_param(CHANGE_ALGORITHM_CONFIG, BPT_CONFIG, DIASTOLIC_VALUE, &mut vals)?;
        Ok(vals)
    }

    pub fn write_bpt_algo_data(&mut self, calib: &[u8; BPT_CALIB_LEN]) -> HubResult<(), E> {
        self.write_bytes(CHANGE_ALGORITHM_CONFIG, BPT_CONFIG, BPT_CALIB_DATA, calib)
    }

    /// `out` is zero-filled when the hub rejects the read.
    pub fn read_bpt_algo_data(&mut self, out: &mut [u8; BPT_CALIB_LEN]) -> HubResult<(), E> {
        self.read_array_with_param(CHANGE_ALGORITHM_CONFIG, BPT_CONFIG, BPT_CALIB_DATA, out)
    }

    pub fn set_patient_resting(&mut self, resting: bool) -> HubResult<(), E> {
        self.write_byte_with_register(CHANGE_ALGORITHM_CONFIG, BPT_CONFIG, PATIENT_RESTING, resting as u8)
    }

    pub fn patient_resting(&mut self) -> HubResult<bool, E> {
        Ok(self.read_byte_with_param(CHANGE_ALGORITHM_CONFIG, BPT_CONFIG, PATIENT_RESTING)? != 0)
    }

    pub fn write_spo2_algo_coef(&mut self, coefs: [i32; 3]) -> HubResult<(), E> {
        self.write_multi_i32(CHANGE_ALGORITHM_CONFIG, BPT_CONFIG, AGC_SP02_COEFS, &coefs)
    }

    pub fn read_spo2_algo_coef(&mut self) -> HubResult<[i32; 3], E> {
        let mut coefs = [0i32; 3];
        self.read_multi_i32(CHANGE_ALGORITHM_CONFIG, BPT_CONFIG, AGC_SP02_COEFS, &mut coefs)?;
        Ok(coefs)
    }
}
