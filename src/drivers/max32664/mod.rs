// PulseWatch - MAX32664 Biometric Sensor Hub Driver
//
// Register-level driver for the sensor hub sitting in front of the MAX30101
// optical AFE.  Every request is a family/index(/write) frame, followed by a
// fixed turnaround delay and a read whose first byte is the hub's status.
//
// All framing goes through `transact`; the typed helpers below only differ in
// header length and reply shape.

mod algorithm;
mod bootloader;
mod bpt;
pub mod commands;
mod sensor;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;
use thiserror::Error;

use self::commands::*;
use crate::biometric::RecordLayout;

pub use self::bpt::BPT_CALIB_LEN;
pub use self::sensor::{AdcRange, PulseWidth, SampleRate, MAX30101_DUMP_LEN};

/// Device processing time between a request and its response.
pub const CMD_DELAY_MS: u32 = 6;
/// Turnaround for sensor / algorithm enable commands.
pub const ENABLE_CMD_DELAY_MS: u32 = 45;

const RESET_HOLD_MS: u32 = 10;
const BOOTLOADER_SETTLE_MS: u32 = 50;
const APPLICATION_SETTLE_MS: u32 = 1000;

/// Largest payload any command moves (BPT calibration blob).
pub const MAX_PAYLOAD: usize = 824;
const MAX_HEADER: usize = 4;

#[derive(Debug, Error)]
pub enum HubError<E> {
    #[error("I2C transfer failed: {0:?}")]
    Bus(E),
    #[error("sensor hub replied with status {0:?}")]
    Status(Status),
    #[error("parameter outside the supported set")]
    InvalidParam,
    #[error("payload of {0} bytes exceeds the scratch buffer")]
    Oversize(usize),
    #[error("sensor hub lost contact with the optical front end")]
    SensorCommunication,
}

impl<E> HubError<E> {
    /// Status-byte vocabulary for logging.
    pub fn code(&self) -> u8 {
        match self {
            Self::Status(status) => status.code(),
            Self::InvalidParam => INCORRECT_PARAM,
            Self::SensorCommunication => Status::UnavailableCommand.code(),
            Self::Bus(_) | Self::Oversize(_) => 0xFF,
        }
    }
}

pub type HubResult<T, E> = Result<T, HubError<E>>;

pub struct Max32664<I2C, RST, MFIO, D> {
    i2c: I2C,
    address: u8,
    reset: RST,
    mfio: MFIO,
    delay: D,
    layout: Option<RecordLayout>,
    sample_rate: u8,
    tx: [u8; MAX_HEADER + MAX_PAYLOAD],
    rx: [u8; 1 + MAX_PAYLOAD],
}

impl<I2C, E, RST, MFIO, D> Max32664<I2C, RST, MFIO, D>
where
    I2C: I2c<Error = E>,
    RST: OutputPin,
    MFIO: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(i2c: I2C, reset: RST, mfio: MFIO, delay: D, address: u8) -> Self {
        Self {
            i2c,
            address,
            reset,
            mfio,
            delay,
            layout: None,
            sample_rate: 0,
            tx: [0; MAX_HEADER + MAX_PAYLOAD],
            rx: [0; 1 + MAX_PAYLOAD],
        }
    }

    /// Hand back the bus, lines and delay.
    pub fn release(self) -> (I2C, RST, MFIO, D) {
        (self.i2c, self.reset, self.mfio, self.delay)
    }

    /// Report variant selected by the last biometric configuration.
    pub fn algo_mode(&self) -> Option<AlgoMode> {
        match self.layout? {
            RecordLayout::Algorithm(mode) | RecordLayout::SensorAndAlgorithm(mode) => Some(mode),
            RecordLayout::Sensor => None,
        }
    }

    /// FIFO record layout selected by the last configuration sequence.
    pub fn record_layout(&self) -> Option<RecordLayout> {
        self.layout
    }

    /// Averaged-sample setting captured by the last biometric configuration.
    pub fn sample_rate(&self) -> u8 {
        self.sample_rate
    }

    // -----------------------------------------------------------------------
    // Mode entry
    // -----------------------------------------------------------------------

    /// Boot the hub into application mode and report the mode it settled in.
    pub fn begin(&mut self) -> HubResult<DeviceMode, E> {
        self.reset_into(true, APPLICATION_SETTLE_MS)?;
        let mode = DeviceMode::from_byte(self.read_byte(READ_DEVICE_MODE, 0x00)?);
        log::info!("Sensor hub started in {:?} mode", mode);
        Ok(mode)
    }

    /// Boot the hub into its bootloader.
    pub fn begin_bootloader(&mut self) -> HubResult<DeviceMode, E> {
        self.reset_into(false, BOOTLOADER_SETTLE_MS)?;
        let mode = DeviceMode::from_byte(self.read_byte(READ_DEVICE_MODE, 0x00)?);
        log::info!("Sensor hub bootloader entry -> {:?}", mode);
        Ok(mode)
    }

    /// Switch modes over the bus instead of the reset line.
    pub fn set_operating_mode(&mut self, selection: OperatingMode) -> HubResult<DeviceMode, E> {
        self.write_byte(SET_DEVICE_MODE, 0x00, selection as u8)?;
        Ok(DeviceMode::from_byte(self.read_byte(READ_DEVICE_MODE, 0x00)?))
    }

    // MFIO level during reset selects the boot target; afterwards the line is
    // released (open drain, pulled up) so the hub can use it as an interrupt.
    fn reset_into(&mut self, application: bool, settle_ms: u32) -> HubResult<(), E> {
        let boot_select = if application {
            self.mfio.set_high()
        } else {
            self.mfio.set_low()
        };
        line_result("MFIO", boot_select);
        line_result("RSTN", self.reset.set_low());
        self.delay.delay_ms(RESET_HOLD_MS);
        line_result("RSTN", self.reset.set_high());
        self.delay.delay_ms(settle_ms);
        line_result("MFIO", self.mfio.set_high());
        Ok(())
    }

    /// Level of the MFIO line (low while the hub signals FIFO data).
    pub fn mfio_asserted(&mut self) -> bool {
        self.mfio.is_low().unwrap_or(false)
    }

    // -----------------------------------------------------------------------
    // Frame codec
    // -----------------------------------------------------------------------

    /// Send `header ++ payload`, wait, read status plus `reply_len` bytes.
    ///
    /// On a non-success status the reply bytes in the scratch buffer are
    /// zeroed before the error is returned.
    fn transact(
        &mut self,
        header: &[u8],
        payload: &[u8],
        reply_len: usize,
        turnaround_ms: u32,
    ) -> HubResult<&[u8], E> {
        let frame_len = header.len() + payload.len();
        if frame_len > self.tx.len() {
            return Err(HubError::Oversize(frame_len));
        }
        if reply_len > MAX_PAYLOAD {
            return Err(HubError::Oversize(reply_len));
        }

        self.tx[..header.len()].copy_from_slice(header);
        self.tx[header.len()..frame_len].copy_from_slice(payload);
        self.i2c
            .write(self.address, &self.tx[..frame_len])
            .map_err(HubError::Bus)?;

        self.delay.delay_ms(turnaround_ms);

        let response = &mut self.rx[..1 + reply_len];
        self.i2c
            .read(self.address, response)
            .map_err(HubError::Bus)?;

        let status = Status::from_byte(response[0]);
        if status != Status::Success {
            response[1..].fill(0);
            log::debug!(
                "hub {:02X}/{:02X} -> status 0x{:02X}",
                header[0],
                header.get(1).copied().unwrap_or(0),
                status.code()
            );
            return Err(HubError::Status(status));
        }
        Ok(&self.rx[1..1 + reply_len])
    }

    /// Family + index, single-byte reply.
    pub fn read_byte(&mut self, family: u8, index: u8) -> HubResult<u8, E> {
        let reply = self.transact(&[family, index], &[], 1, CMD_DELAY_MS)?;
        Ok(reply[0])
    }

    /// Family + index + write byte, single-byte reply.
    pub fn read_byte_with_param(&mut self, family: u8, index: u8, write: u8) -> HubResult<u8, E> {
        let reply = self.transact(&[family, index, write], &[], 1, CMD_DELAY_MS)?;
        Ok(reply[0])
    }

    pub fn write_byte(&mut self, family: u8, index: u8, write: u8) -> HubResult<(), E> {
        self.transact(&[family, index, write], &[], 0, CMD_DELAY_MS)?;
        Ok(())
    }

    /// Same frame as `write_byte` with the longer turnaround enable commands need.
    pub(crate) fn enable_write(&mut self, family: u8, index: u8, enable: u8) -> HubResult<(), E> {
        self.transact(&[family, index, enable], &[], 0, ENABLE_CMD_DELAY_MS)?;
        Ok(())
    }

    /// Four-byte frame used for downstream register writes and id/value pairs.
    pub fn write_byte_with_register(
        &mut self,
        family: u8,
        index: u8,
        reg_addr: u8,
        reg_val: u8,
    ) -> HubResult<(), E> {
        self.transact(&[family, index, reg_addr, reg_val], &[], 0, CMD_DELAY_MS)?;
        Ok(())
    }

    pub fn write_bytes(&mut self, family: u8, index: u8, write: u8, values: &[u8]) -> HubResult<(), E> {
        self.transact(&[family, index, write], values, 0, CMD_DELAY_MS)?;
        Ok(())
    }

    /// Bulk read into `out`; `out` is zero-filled when the hub reports failure.
    pub fn read_array(&mut self, family: u8, index: u8, out: &mut [u8]) -> HubResult<(), E> {
        self.read_into(&[family, index], out)
    }

    /// Bulk read with a write byte; `out` is zero-filled on failure.
    pub fn read_array_with_param(
        &mut self,
        family: u8,
        index: u8,
        write: u8,
        out: &mut [u8],
    ) -> HubResult<(), E> {
        self.read_into(&[family, index, write], out)
    }

    fn read_into(&mut self, header: &[u8], out: &mut [u8]) -> HubResult<(), E> {
        match self.transact(header, &[], out.len(), CMD_DELAY_MS) {
            Ok(reply) => {
                out.copy_from_slice(reply);
                Ok(())
            }
            Err(err) => {
                out.fill(0);
                Err(err)
            }
        }
    }

    /// Read `out.len()` big-endian signed 32-bit values.
    pub fn read_multi_i32(
        &mut self,
        family: u8,
        index: u8,
        write: u8,
        out: &mut [i32],
    ) -> HubResult<(), E> {
        let len = out.len() * 4;
        match self.transact(&[family, index, write], &[], len, CMD_DELAY_MS) {
            Ok(reply) => {
                unpack_i32_be(reply, out);
                Ok(())
            }
            Err(err) => {
                out.fill(0);
                Err(err)
            }
        }
    }

    /// Write `values` as big-endian signed 32-bit words after the header.
    pub fn write_multi_i32(&mut self, family: u8, index: u8, write: u8, values: &[i32]) -> HubResult<(), E> {
        let len = values.len() * 4;
        if len > MAX_PAYLOAD {
            return Err(HubError::Oversize(len));
        }
        let mut packed = [0u8; MAX_PAYLOAD];
        pack_i32_be(values, &mut packed[..len]);
        self.transact(&[family, index, write], &packed[..len], 0, CMD_DELAY_MS)?;
        Ok(())
    }
}

fn line_result<T, PE: core::fmt::Debug>(line: &str, result: Result<T, PE>) {
    if let Err(e) = result {
        log::warn!("Sensor hub {} write failed: {:?}", line, e);
    }
}

/// Serialize each value high byte first into `out` (`out.len() == 4 * values.len()`).
pub fn pack_i32_be(values: &[i32], out: &mut [u8]) {
    for (value, chunk) in values.iter().zip(out.chunks_exact_mut(4)) {
        chunk.copy_from_slice(&value.to_be_bytes());
    }
}

/// Inverse of [`pack_i32_be`].
pub fn unpack_i32_be(bytes: &[u8], out: &mut [i32]) {
    for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(4)) {
        *slot = i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    pub(crate) const ADDR: u8 = 0x55;

    pub(crate) type TestHub = Max32664<I2cMock, PinMock, PinMock, NoopDelay>;

    pub(crate) fn hub(expect: &[I2cTransaction]) -> TestHub {
        Max32664::new(
            I2cMock::new(expect),
            PinMock::new(&[]),
            PinMock::new(&[]),
            NoopDelay::new(),
            ADDR,
        )
    }

    pub(crate) fn finish(hub: TestHub) {
        let (mut i2c, mut reset, mut mfio, _) = hub.release();
        i2c.done();
        reset.done();
        mfio.done();
    }

    /// One request/response exchange.
    pub(crate) fn exchange(request: &[u8], response: &[u8]) -> [I2cTransaction; 2] {
        [
            I2cTransaction::write(ADDR, request.to_vec()),
            I2cTransaction::read(ADDR, response.to_vec()),
        ]
    }

    #[test]
    fn read_byte_returns_payload_on_success() {
        let mut hub = hub(&exchange(&[0x02, 0x00], &[0x00, 0x08]));
        assert_eq!(hub.read_byte(0x02, 0x00).unwrap(), 0x08);
        finish(hub);
    }

    #[test]
    fn status_failure_is_reported_not_decoded() {
        let mut hub = hub(&exchange(&[0x11, 0x00, 0x01], &[0x05, 0x7F]));
        let err = hub.read_byte_with_param(0x11, 0x00, 0x01).unwrap_err();
        assert!(matches!(err, HubError::Status(Status::TryAgain)));
        assert_eq!(err.code(), 0x05);
        finish(hub);
    }

    #[test]
    fn read_array_zero_fills_on_failure() {
        let mut hub = hub(&exchange(&[0x12, 0x01], &[0x02, 0xAA, 0xBB, 0xCC]));
        let mut out = [0xFFu8; 3];
        assert!(hub.read_array(0x12, 0x01, &mut out).is_err());
        assert_eq!(out, [0, 0, 0]);
        finish(hub);
    }

    #[test]
    fn read_array_copies_payload_on_success() {
        let mut hub = hub(&exchange(&[0x12, 0x01], &[0x00, 0xAA, 0xBB, 0xCC]));
        let mut out = [0u8; 3];
        hub.read_array(0x12, 0x01, &mut out).unwrap();
        assert_eq!(out, [0xAA, 0xBB, 0xCC]);
        finish(hub);
    }

    #[test]
    fn write_byte_with_register_sends_four_byte_frame() {
        let mut hub = hub(&exchange(&[0x40, 0x03, 0x0A, 0x27], &[0x00]));
        hub.write_byte_with_register(0x40, 0x03, 0x0A, 0x27).unwrap();
        finish(hub);
    }

    #[test]
    fn bus_error_surfaces_as_bus_variant() {
        let mut hub = hub(&[I2cTransaction::write(ADDR, vec![0x00, 0x00]).with_error(ErrorKind::Other)]);
        let err = hub.read_byte(0x00, 0x00).unwrap_err();
        assert!(matches!(err, HubError::Bus(ErrorKind::Other)));
        assert_eq!(err.code(), 0xFF);
        finish(hub);
    }

    #[test]
    fn multi_i32_written_high_byte_first() {
        let mut hub = hub(&exchange(
            &[0x50, 0x02, 0x0B, 0x00, 0x02, 0x6F, 0x60, 0xFF, 0xCB, 0x1D, 0x12],
            &[0x00],
        ));
        hub.write_multi_i32(0x50, 0x02, 0x0B, &[159_584, -3_465_966]).unwrap();
        finish(hub);
    }

    #[test]
    fn multi_i32_read_decodes_signed_words() {
        let mut hub = hub(&exchange(
            &[0x51, 0x02, 0x0B],
            &[0x00, 0x00, 0x02, 0x6F, 0x60, 0xFF, 0xCB, 0x1D, 0x12, 0x00, 0xAB, 0xF2, 0x7B],
        ));
        let mut coefs = [0i32; 3];
        hub.read_multi_i32(0x51, 0x02, 0x0B, &mut coefs).unwrap();
        assert_eq!(coefs, [159_584, -3_465_966, 11_268_731]);
        finish(hub);
    }

    #[test]
    fn oversize_payload_is_refused_without_traffic() {
        let mut hub = hub(&[]);
        let values = [0i32; MAX_PAYLOAD / 4 + 1];
        assert!(matches!(
            hub.write_multi_i32(0x50, 0x04, 0x0B, &values),
            Err(HubError::Oversize(_))
        ));
        finish(hub);
    }

    #[test]
    fn coefficient_packing_round_trips() {
        let values = [0, 1, -1, 159_584, -3_465_966, 11_268_987, i32::MAX, i32::MIN];
        let mut bytes = [0u8; 32];
        pack_i32_be(&values, &mut bytes);
        let mut back = [0i32; 8];
        unpack_i32_be(&bytes, &mut back);
        assert_eq!(back, values);
        assert_eq!(&bytes[8..12], &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn begin_holds_reset_with_mfio_high() {
        let i2c = I2cMock::new(&exchange(&[0x02, 0x00], &[0x00, 0x00]));
        let reset = PinMock::new(&[
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ]);
        let mfio = PinMock::new(&[
            PinTransaction::set(State::High),
            PinTransaction::set(State::High),
        ]);
        let mut hub = Max32664::new(i2c, reset, mfio, NoopDelay::new(), ADDR);
        assert_eq!(hub.begin().unwrap(), DeviceMode::Application);
        finish(hub);
    }

    #[test]
    fn begin_bootloader_drives_mfio_low_then_releases() {
        let i2c = I2cMock::new(&exchange(&[0x02, 0x00], &[0x00, 0x08]));
        let reset = PinMock::new(&[
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ]);
        let mfio = PinMock::new(&[
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ]);
        let mut hub = Max32664::new(i2c, reset, mfio, NoopDelay::new(), ADDR);
        assert_eq!(hub.begin_bootloader().unwrap(), DeviceMode::Bootloader);
        finish(hub);
    }

    #[test]
    fn mfio_level_reads_low_as_asserted() {
        let mut hub = Max32664::new(
            I2cMock::new(&[]),
            PinMock::new(&[]),
            PinMock::new(&[PinTransaction::get(State::Low), PinTransaction::get(State::High)]),
            NoopDelay::new(),
            ADDR,
        );
        assert!(hub.mfio_asserted());
        assert!(!hub.mfio_asserted());
        finish(hub);
    }

    #[test]
    fn operating_mode_write_then_confirm() {
        let mut expect = Vec::new();
        expect.extend(exchange(&[0x01, 0x00, 0x08], &[0x00]));
        expect.extend(exchange(&[0x02, 0x00], &[0x00, 0x08]));
        let mut hub = hub(&expect);
        assert_eq!(
            hub.set_operating_mode(OperatingMode::EnterBootloader).unwrap(),
            DeviceMode::Bootloader
        );
        finish(hub);
    }
}
