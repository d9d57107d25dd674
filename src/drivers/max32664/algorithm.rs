// PulseWatch - MAX32664 algorithm control and biometric reads

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;

use super::commands::*;
use super::{HubError, HubResult, Max32664};
use crate::biometric::{self, BioSample, RecordLayout, MAX_RECORD};

/// Algorithm output lags a fresh configuration by about a second.
const CONFIG_SETTLE_MS: u32 = 1000;

/// Hub status bit raised when the AFE stops answering the hub.
const SENSOR_COMM_ERR: u8 = 0x01;

fn percent<E>(value: u8) -> HubResult<u8, E> {
    if value > 100 {
        Err(HubError::InvalidParam)
    } else {
        Ok(value)
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
    // AGC parameters
    // -----------------------------------------------------------------------

    /// Target percentage of the ADC full-scale range (0..=100).
    pub fn set_algo_range(&mut self, perc: u8) -> HubResult<(), E> {
        let perc = percent(perc)?;
        self.write_byte_with_register(CHANGE_ALGORITHM_CONFIG, AGC_CONFIG, AGC_GAIN_ID, perc)
    }

    /// Step size toward the AGC target (0..=100 %).
    pub fn set_algo_step_size(&mut self, step: u8) -> HubResult<(), E> {
        let step = percent(step)?;
        self.write_byte_with_register(CHANGE_ALGORITHM_CONFIG, AGC_CONFIG, AGC_STEP_SIZE_ID, step)
    }

    /// AGC sensitivity (0..=100 %).
    pub fn set_algo_sensitivity(&mut self, sense: u8) -> HubResult<(), E> {
        let sense = percent(sense)?;
        self.write_byte_with_register(CHANGE_ALGORITHM_CONFIG, AGC_CONFIG, AGC_SENSITIVITY_ID, sense)
    }

    /// Number of samples the algorithm averages.
    pub fn set_algo_samples(&mut self, avg: u8) -> HubResult<(), E> {
        self.write_byte_with_register(CHANGE_ALGORITHM_CONFIG, AGC_CONFIG, AGC_NUM_SAMP_ID, avg)
    }

    pub fn read_algo_range(&mut self) -> HubResult<u8, E> {
        self.read_byte_with_param(READ_ALGORITHM_CONFIG, AGC_CONFIG, AGC_GAIN_ID)
    }

    pub fn read_algo_step_size(&mut self) -> HubResult<u8, E> {
        self.read_byte_with_param(READ_ALGORITHM_CONFIG, AGC_CONFIG, AGC_STEP_SIZE_ID)
    }

    pub fn read_algo_sensitivity(&mut self) -> HubResult<u8, E> {
        self.read_byte_with_param(READ_ALGORITHM_CONFIG, AGC_CONFIG, AGC_SENSITIVITY_ID)
    }

    pub fn read_algo_samples(&mut self) -> HubResult<u8, E> {
        self.read_byte_with_param(READ_ALGORITHM_CONFIG, AGC_CONFIG, AGC_NUM_SAMP_ID)
    }

    /// SpO2 calibration coefficients, each scaled by 100 000 by the caller.
    pub fn set_maxim_fast_coef(&mut self, coefs: [i32; 3]) -> HubResult<(), E> {
        self.write_multi_i32(CHANGE_ALGORITHM_CONFIG, PULSE_OX_COEF, MAXIMFAST_COEF_ID, &coefs)
    }

    /// Raw coefficients as stored on the hub (scaled by 100 000).
    pub fn read_maxim_fast_coef(&mut self) -> HubResult<[i32; 3], E> {
        let mut coefs = [0i32; 3];
        self.read_multi_i32(READ_ALGORITHM_CONFIG, PULSE_OX_COEF, MAXIMFAST_COEF_ID, &mut coefs)?;
        Ok(coefs)
    }

    // -----------------------------------------------------------------------
    // Algorithm enables
    // -----------------------------------------------------------------------

    pub fn agc_algo_control(&mut self, enable: bool) -> HubResult<(), E> {
        self.enable_write(ENABLE_ALGORITHM, ENABLE_AGC_ALGO, enable as u8)
    }

    /// Start the MaximFast algorithm in `mode`, or stop it with `None`.
    pub fn maxim_fast_algo_control(&mut self, mode: Option<AlgoMode>) -> HubResult<(), E> {
        let selector = mode.map_or(0x00, |m| m as u8);
        self.enable_write(ENABLE_ALGORITHM, ENABLE_WHRM_ALGO, selector)
    }

    // -----------------------------------------------------------------------
    // Configuration sequences
    // -----------------------------------------------------------------------

    /// Algorithm-only output: heart rate, confidence, SpO2, finger status.
    pub fn config_bpm(&mut self, mode: AlgoMode) -> HubResult<(), E> {
        self.set_output_mode(OutputMode::AlgoData)?;
        self.set_fifo_threshold(0x01)?;
        self.agc_algo_control(true)?;
        self.max30101_control(true)?;
        self.maxim_fast_algo_control(Some(mode))?;
        self.finish_config(RecordLayout::Algorithm(mode))
    }

    /// Raw LED counts only.
    pub fn config_sensor(&mut self) -> HubResult<(), E> {
        self.set_output_mode(OutputMode::SensorData)?;
        self.set_fifo_threshold(0x01)?;
        self.max30101_control(true)?;
        self.maxim_fast_algo_control(Some(AlgoMode::ModeOne))?;
        self.layout = Some(RecordLayout::Sensor);
        self.delay.delay_ms(CONFIG_SETTLE_MS);
        Ok(())
    }

    /// LED counts followed by the biometric block.
    pub fn config_sensor_bpm(&mut self, mode: AlgoMode) -> HubResult<(), E> {
        self.set_output_mode(OutputMode::SensorAndAlgorithm)?;
        self.set_fifo_threshold(0x01)?;
        self.max30101_control(true)?;
        self.maxim_fast_algo_control(Some(mode))?;
        self.finish_config(RecordLayout::SensorAndAlgorithm(mode))
    }

    fn finish_config(&mut self, layout: RecordLayout) -> HubResult<(), E> {
        self.layout = Some(layout);
        self.sample_rate = self.read_algo_samples()?;
        self.delay.delay_ms(CONFIG_SETTLE_MS);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// One algorithm record.  An unconfigured handle yields a zero sample.
    pub fn read_bpm(&mut self) -> HubResult<BioSample, E> {
        let layout = self.algo_mode().map(RecordLayout::Algorithm);
        self.read_record(layout)
    }

    /// One record of LED counts.
    pub fn read_sensor(&mut self) -> HubResult<BioSample, E> {
        self.read_record(Some(RecordLayout::Sensor))
    }

    /// One record of LED counts plus the biometric block.
    pub fn read_sensor_bpm(&mut self) -> HubResult<BioSample, E> {
        let layout = self.algo_mode().map(RecordLayout::SensorAndAlgorithm);
        self.read_record(layout)
    }

    fn read_record(&mut self, layout: Option<RecordLayout>) -> HubResult<BioSample, E> {
        if self.read_sensor_hub_status()? == SENSOR_COMM_ERR {
            return Err(HubError::SensorCommunication);
        }
        self.num_samples_out_fifo()?;

        let Some(layout) = layout else {
            return Ok(BioSample::default());
        };
        let mut raw = [0u8; MAX_RECORD];
        let raw = &mut raw[..layout.record_len()];
        self.read_fifo(raw)?;
        Ok(biometric::decode(Some(layout), raw))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{exchange, finish, hub, TestHub};
    use super::*;
    use embedded_hal_mock::eh1::i2c::Transaction;

    fn config_bpm_traffic(mode: u8) -> Vec<Transaction> {
        let mut t = Vec::new();
        t.extend(exchange(&[0x10, 0x00, 0x02], &[0x00]));
        t.extend(exchange(&[0x10, 0x01, 0x01], &[0x00]));
        t.extend(exchange(&[0x52, 0x00, 0x01], &[0x00]));
        t.extend(exchange(&[0x44, 0x03, 0x01], &[0x00]));
        t.extend(exchange(&[0x52, 0x02, mode], &[0x00]));
        t.extend(exchange(&[0x51, 0x00, 0x03], &[0x00, 0x04]));
        t
    }

    fn configured(mode: AlgoMode, then: &[Transaction]) -> TestHub {
        let mut t = config_bpm_traffic(mode as u8);
        t.extend_from_slice(then);
        let mut hub = hub(&t);
        hub.config_bpm(mode).unwrap();
        hub
    }

    #[test]
    fn config_bpm_runs_the_full_sequence() {
        let hub = configured(AlgoMode::ModeOne, &[]);
        assert_eq!(hub.algo_mode(), Some(AlgoMode::ModeOne));
        assert_eq!(hub.sample_rate(), 4);
        finish(hub);
    }

    #[test]
    fn config_aborts_on_first_failure() {
        let mut t = Vec::new();
        t.extend(exchange(&[0x10, 0x00, 0x02], &[0x00]));
        t.extend(exchange(&[0x10, 0x01, 0x01], &[0x03]));
        let mut hub = hub(&t);
        let err = hub.config_bpm(AlgoMode::ModeTwo).unwrap_err();
        assert_eq!(err.code(), 0x03);
        assert_eq!(hub.algo_mode(), None);
        finish(hub);
    }

    #[test]
    fn read_bpm_decodes_mode_one_record() {
        let mut then = Vec::new();
        then.extend(exchange(&[0x00, 0x00], &[0x00, 0x00]));
        then.extend(exchange(&[0x12, 0x00], &[0x00, 0x01]));
        then.extend(exchange(&[0x12, 0x01], &[0x00, 0x02, 0xBC, 0x5F, 0x03, 0xD4, 0x03]));
        let mut hub = configured(AlgoMode::ModeOne, &then);
        let sample = hub.read_bpm().unwrap();
        assert_eq!((sample.heart_rate, sample.oxygen, sample.confidence), (70, 98, 95));
        finish(hub);
    }

    #[test]
    fn read_bpm_reports_lost_afe() {
        let mut then = Vec::new();
        then.extend(exchange(&[0x00, 0x00], &[0x00, 0x01]));
        let mut hub = configured(AlgoMode::ModeOne, &then);
        assert!(matches!(hub.read_bpm(), Err(HubError::SensorCommunication)));
        finish(hub);
    }

    #[test]
    fn read_bpm_unconfigured_is_zero_sample() {
        let mut t = Vec::new();
        t.extend(exchange(&[0x00, 0x00], &[0x00, 0x00]));
        t.extend(exchange(&[0x12, 0x00], &[0x00, 0x00]));
        let mut hub = hub(&t);
        assert!(hub.read_bpm().unwrap().is_empty());
        finish(hub);
    }

    #[test]
    fn failed_fifo_read_is_an_error_not_a_sample() {
        let mut then = Vec::new();
        then.extend(exchange(&[0x00, 0x00], &[0x00, 0x00]));
        then.extend(exchange(&[0x12, 0x00], &[0x00, 0x01]));
        then.extend(exchange(&[0x12, 0x01], &[0x05, 0x02, 0xBC, 0x5F, 0x03, 0xD4, 0x03]));
        let mut hub = configured(AlgoMode::ModeOne, &then);
        assert!(matches!(hub.read_bpm(), Err(HubError::Status(Status::TryAgain))));
        finish(hub);
    }

    #[test]
    fn agc_percentages_are_bounded() {
        let mut hub = hub(&exchange(&[0x50, 0x00, 0x02, 100], &[0x00]));
        assert!(matches!(hub.set_algo_range(101), Err(HubError::InvalidParam)));
        assert!(matches!(hub.set_algo_step_size(200), Err(HubError::InvalidParam)));
        hub.set_algo_sensitivity(100).unwrap();
        finish(hub);
    }

    #[test]
    fn maxim_fast_disable_writes_zero() {
        let mut hub = hub(&exchange(&[0x52, 0x02, 0x00], &[0x00]));
        hub.maxim_fast_algo_control(None).unwrap();
        finish(hub);
    }
}
