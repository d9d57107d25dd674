// PulseWatch - SSD1306 OLED Display Driver
//
// 128x64 monochrome panel driven over the shared I2C bus.  Drawing goes into
// a local framebuffer through embedded-graphics; `present` pushes the whole
// buffer in horizontal addressing mode.

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use embedded_hal::i2c::I2c;

use crate::config::{DISPLAY_BUFFER_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Text-oriented view of a display: the only surface the UI needs.
pub trait TextDisplay {
    type Error;

    fn clear(&mut self);
    fn set_cursor(&mut self, x: i32, y: i32);
    /// Draw `text` at the cursor and advance the cursor past it.
    fn write_text(&mut self, text: &str, font: &MonoFont<'static>, color: BinaryColor);
    fn present(&mut self) -> Result<(), Self::Error>;
}

// SSD1306 control bytes
const CONTROL_CMD: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;

// SSD1306 commands
const DISPLAY_OFF: u8 = 0xAE;
const DISPLAY_ON: u8 = 0xAF;
const SET_CLOCK_DIV: u8 = 0xD5;
const SET_MULTIPLEX: u8 = 0xA8;
const SET_DISPLAY_OFFSET: u8 = 0xD3;
const SET_START_LINE: u8 = 0x40;
const CHARGE_PUMP: u8 = 0x8D;
const MEMORY_MODE: u8 = 0x20;
const SEG_REMAP: u8 = 0xA1;
const COM_SCAN_DEC: u8 = 0xC8;
const SET_COM_PINS: u8 = 0xDA;
const SET_CONTRAST: u8 = 0x81;
const SET_PRECHARGE: u8 = 0xD9;
const SET_VCOM_DETECT: u8 = 0xDB;
const RESUME_RAM: u8 = 0xA4;
const NORMAL_DISPLAY: u8 = 0xA6;
const COLUMN_ADDR: u8 = 0x21;
const PAGE_ADDR: u8 = 0x22;

const INIT_SEQUENCE: &[u8] = &[
    DISPLAY_OFF,
    SET_CLOCK_DIV, 0x80,
    SET_MULTIPLEX, (SCREEN_HEIGHT - 1) as u8,
    SET_DISPLAY_OFFSET, 0x00,
    SET_START_LINE,
    CHARGE_PUMP, 0x14,      // internal VCC
    MEMORY_MODE, 0x00,      // horizontal addressing
    SEG_REMAP,
    COM_SCAN_DEC,
    SET_COM_PINS, 0x12,
    SET_CONTRAST, 0xCF,
    SET_PRECHARGE, 0xF1,
    SET_VCOM_DETECT, 0x40,
    RESUME_RAM,
    NORMAL_DISPLAY,
    DISPLAY_ON,
];

// Bytes of pixel data per I2C write during a flush.
const FLUSH_CHUNK: usize = 128;

pub struct OledDisplay<I2C> {
    i2c: I2C,
    address: u8,
    buffer: [u8; DISPLAY_BUFFER_SIZE],
    cursor: Point,
}

impl<I2C: I2c> OledDisplay<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            buffer: [0; DISPLAY_BUFFER_SIZE],
            cursor: Point::zero(),
        }
    }

    pub fn init(&mut self) -> Result<(), I2C::Error> {
        for &cmd in INIT_SEQUENCE {
            self.command(cmd)?;
        }
        self.buffer.fill(0);
        self.flush()?;
        log::info!("SSD1306 initialised ({}x{})", SCREEN_WIDTH, SCREEN_HEIGHT);
        Ok(())
    }

    fn command(&mut self, cmd: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[CONTROL_CMD, cmd])
    }

    /// Push the whole framebuffer to panel RAM.
    pub fn flush(&mut self) -> Result<(), I2C::Error> {
        for cmd in [
            COLUMN_ADDR, 0, (SCREEN_WIDTH - 1) as u8,
            PAGE_ADDR, 0, (SCREEN_HEIGHT / 8 - 1) as u8,
        ] {
            self.command(cmd)?;
        }

        let mut packet = [0u8; FLUSH_CHUNK + 1];
        packet[0] = CONTROL_DATA;
        for chunk in self.buffer.chunks(FLUSH_CHUNK) {
            packet[1..=chunk.len()].copy_from_slice(chunk);
            self.i2c.write(self.address, &packet[..=chunk.len()])?;
        }
        Ok(())
    }

    #[cfg(test)]
    fn pixel(&self, x: u32, y: u32) -> bool {
        let idx = (y / 8 * SCREEN_WIDTH + x) as usize;
        self.buffer[idx] & (1 << (y % 8)) != 0
    }
}

impl<I2C> OriginDimensions for OledDisplay<I2C> {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl<I2C> DrawTarget for OledDisplay<I2C> {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<P>(&mut self, pixels: P) -> Result<(), Self::Error>
    where
        P: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0
                || point.y < 0
                || point.x >= SCREEN_WIDTH as i32
                || point.y >= SCREEN_HEIGHT as i32
            {
                continue;
            }
            let (x, y) = (point.x as usize, point.y as usize);
            let idx = (y / 8) * SCREEN_WIDTH as usize + x;
            let bit = 1u8 << (y % 8);
            match color {
                BinaryColor::On => self.buffer[idx] |= bit,
                BinaryColor::Off => self.buffer[idx] &= !bit,
            }
        }
        Ok(())
    }
}

impl<I2C: I2c> TextDisplay for OledDisplay<I2C> {
    type Error = I2C::Error;

    fn clear(&mut self) {
        self.buffer.fill(0);
        self.cursor = Point::zero();
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = Point::new(x, y);
    }

    fn write_text(&mut self, text: &str, font: &MonoFont<'static>, color: BinaryColor) {
        let style = MonoTextStyle::new(font, color);
        if let Ok(next) = Text::with_baseline(text, self.cursor, style, Baseline::Top).draw(self) {
            self.cursor = next;
        }
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.flush()
    }
}
