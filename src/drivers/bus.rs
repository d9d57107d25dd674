// PulseWatch - Shared I2C bus
//
// The sensor hub, OLED and RTC sit on one I2C controller.  Each device owns a
// `SharedI2c` handle; every transfer locks the bus for its duration.

use std::sync::{Mutex, MutexGuard};

use embedded_hal::i2c::{ErrorType, I2c, Operation};

/// Give `bus` a process-lifetime home behind a mutex.
pub fn leak<I: Send + 'static>(bus: I) -> &'static Mutex<I> {
    Box::leak(Box::new(Mutex::new(bus)))
}

pub struct SharedI2c<I: 'static> {
    bus: &'static Mutex<I>,
}

impl<I> SharedI2c<I> {
    pub fn new(bus: &'static Mutex<I>) -> Self {
        Self { bus }
    }

    // The controller keeps no state between transfers, so a poisoned lock is
    // still usable.
    fn lock(&self) -> MutexGuard<'static, I> {
        self.bus.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<I> Clone for SharedI2c<I> {
    fn clone(&self) -> Self {
        Self { bus: self.bus }
    }
}

impl<I: ErrorType> ErrorType for SharedI2c<I> {
    type Error = I::Error;
}

impl<I: I2c> I2c for SharedI2c<I> {
    fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        self.lock().read(address, read)
    }

    fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        self.lock().write(address, write)
    }

    fn write_read(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> Result<(), Self::Error> {
        self.lock().write_read(address, write, read)
    }

    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        self.lock().transaction(address, operations)
    }
}
