// PulseWatch - DS1307 Real-Time Clock Driver
//
// Register-level driver; time is kept in BCD, 24-hour mode.

use core::fmt;

use embedded_hal::i2c::I2c;

// DS1307 register map
const REG_SECONDS: u8 = 0x00;
const CLOCK_HALT: u8 = 0x80;
const HOUR_12H: u8 = 0x40;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTime {
    pub year: u8, // 0..=99, years since 2000
    pub month: u8,
    pub date: u8,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl DateTime {
    /// `None` when any field is out of calendar range.
    pub fn new(year: u8, month: u8, date: u8, hours: u8, minutes: u8, seconds: u8) -> Option<Self> {
        let valid = year <= 99
            && (1..=12).contains(&month)
            && (1..=31).contains(&date)
            && hours <= 23
            && minutes <= 59
            && seconds <= 59;
        valid.then_some(Self {
            year,
            month,
            date,
            hours,
            minutes,
            seconds,
        })
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{:02}/{:02} {:02}:{:02}:{:02}",
            self.date, self.month, self.year, self.hours, self.minutes, self.seconds
        )
    }
}

fn to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

fn from_bcd(value: u8) -> u8 {
    (value >> 4) * 10 + (value & 0x0F)
}

pub struct Ds1307<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Ds1307<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Start the oscillator if it is halted, keeping the stored seconds.
    pub fn init(&mut self) -> Result<(), I2C::Error> {
        let mut sec = [0u8; 1];
        self.i2c.write_read(self.address, &[REG_SECONDS], &mut sec)?;
        if sec[0] & CLOCK_HALT != 0 {
            self.i2c
                .write(self.address, &[REG_SECONDS, sec[0] & !CLOCK_HALT])?;
            log::info!("RTC oscillator started");
        }
        Ok(())
    }

    pub fn set_datetime(&mut self, dt: &DateTime) -> Result<(), I2C::Error> {
        let frame = [
            REG_SECONDS,
            to_bcd(dt.seconds),
            to_bcd(dt.minutes),
            to_bcd(dt.hours),
            0x01, // day of week, unused
            to_bcd(dt.date),
            to_bcd(dt.month),
            to_bcd(dt.year),
        ];
        self.i2c.write(self.address, &frame)
    }

    pub fn datetime(&mut self) -> Result<DateTime, I2C::Error> {
        let mut raw = [0u8; 7];
        self.i2c.write_read(self.address, &[REG_SECONDS], &mut raw)?;

        let hours = if raw[2] & HOUR_12H != 0 {
            let pm = raw[2] & 0x20 != 0;
            let h12 = from_bcd(raw[2] & 0x1F) % 12;
            if pm { h12 + 12 } else { h12 }
        } else {
            from_bcd(raw[2] & 0x3F)
        };

        Ok(DateTime {
            seconds: from_bcd(raw[0] & !CLOCK_HALT),
            minutes: from_bcd(raw[1] & 0x7F),
            hours,
            date: from_bcd(raw[4] & 0x3F),
            month: from_bcd(raw[5] & 0x1F),
            year: from_bcd(raw[6]),
        })
    }
}
