// PulseWatch - MAX32664 bootloader commands
//
// Only valid after `begin_bootloader` / `set_operating_mode(EnterBootloader)`.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;

use super::commands::*;
use super::{HubResult, Max32664, CMD_DELAY_MS};

impl<I2C, E, RST, MFIO, D> Max32664<I2C, RST, MFIO, D>
where
    I2C: I2c<Error = E>,
    RST: OutputPin,
    MFIO: InputPin + OutputPin,
    D: DelayNs,
{
    /// Page count taken from byte 0x44 of the .msbl image.
    pub fn set_num_pages(&mut self, total_pages: u8) -> HubResult<(), E> {
        self.write_byte_with_register(BOOTLOADER_FLASH, SET_NUM_PAGES, 0x00, total_pages)
    }

    /// Erase the application flash. The frame has no write byte.
    pub fn erase_flash(&mut self) -> HubResult<(), E> {
        self.transact(&[BOOTLOADER_FLASH, ERASE_FLASH], &[], 0, CMD_DELAY_MS)?;
        Ok(())
    }

    pub fn read_bootloader_version(&mut self) -> HubResult<Version, E> {
        self.read_version(BOOTLOADER_INFO, BOOTLOADER_VERS)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{exchange, finish, hub};
    use super::super::HubError;
    use super::*;

    #[test]
    fn erase_is_a_two_byte_frame() {
        let mut hub = hub(&exchange(&[0x80, 0x03], &[0x00]));
        hub.erase_flash().unwrap();
        finish(hub);
    }

    #[test]
    fn erase_failure_keeps_bootloader_code() {
        let mut hub = hub(&exchange(&[0x80, 0x03], &[0x80]));
        let err = hub.erase_flash().unwrap_err();
        assert!(matches!(err, HubError::Status(Status::BootloaderGeneral)));
        assert_eq!(err.code(), 0x80);
        finish(hub);
    }

    #[test]
    fn page_count_and_version() {
        let mut t = Vec::new();
        t.extend(exchange(&[0x80, 0x02, 0x00, 0x1C], &[0x00]));
        t.extend(exchange(&[0x81, 0x00], &[0x00, 3, 4, 1]));
        let mut hub = hub(&t);
        hub.set_num_pages(0x1C).unwrap();
        assert_eq!(
            hub.read_bootloader_version().unwrap(),
            Version { major: 3, minor: 4, revision: 1 }
        );
        finish(hub);
    }
}
