// This library is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This library is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this library.  If not, see <http://www.gnu.org/licenses/>.
//! HD44780 character LCD behind a PCF8574 I2C backpack.
//!
//! Expander wiring is the common "LiquidCrystal_I2C" one: P0 RS, P1 RW,
//! P2 E, P3 backlight, P4..P7 on D4..D7.  The controller runs in 4-bit mode
//! and is never read back, so every command is followed by a fixed delay.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::glyphs::Glyph;

/// 7-bit address of the LCD backpack.
pub const LCD_ADDRESS: u8 = 0x20;
pub const LCD_COLS: u8 = 16;
pub const LCD_ROWS: u8 = 2;

const RS: u8 = 0b0000_0001;
const EN: u8 = 0b0000_0100;
const BACKLIGHT: u8 = 0b0000_1000;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x04;
const CMD_DISPLAY_CONTROL: u8 = 0x08;
const CMD_FUNCTION_SET: u8 = 0x20;
const CMD_SET_CGRAM: u8 = 0x40;
const CMD_SET_DDRAM: u8 = 0x80;

const ENTRY_LEFT: u8 = 0x02;
const DISPLAY_ON: u8 = 0x04;
const TWO_LINES: u8 = 0x08;

const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

/// What the bargraph and the clock face need from a character display.
pub trait CharDisplay {
    type Error;

    /// Move the write position to `col`, `row`.
    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error>;

    /// Write character codes at the current position, advancing it.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Program character-generator slot `slot` (0..=7).  Leaves the write
    /// position undefined: callers must `set_cursor` before writing text.
    fn create_char(&mut self, slot: u8, glyph: &Glyph) -> Result<(), Self::Error>;
}

pub struct Lcd<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    backlight: u8,
}

impl<I2C: I2c, D: DelayNs> Lcd<I2C, D> {
    /// Wrap the backpack at `address`.  Call [`Lcd::init`] before use.
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            backlight: BACKLIGHT,
        }
    }

    /// Run the HD44780 4-bit initialisation-by-instruction sequence and
    /// clear the screen.
    pub fn init(&mut self) -> Result<(), I2C::Error> {
        // Power-on: wait for Vcc to settle.
        self.delay.delay_ms(50);
        self.i2c.write(self.address, &[self.backlight])?;

        // Three times 8-bit mode, then switch to 4-bit.
        self.write_nibble(0x30)?;
        self.delay.delay_us(4500);
        self.write_nibble(0x30)?;
        self.delay.delay_us(4500);
        self.write_nibble(0x30)?;
        self.delay.delay_us(150);
        self.write_nibble(0x20)?;

        self.command(CMD_FUNCTION_SET | TWO_LINES)?;
        self.command(CMD_DISPLAY_CONTROL | DISPLAY_ON)?;
        self.clear()?;
        self.command(CMD_ENTRY_MODE | ENTRY_LEFT)
    }

    pub fn clear(&mut self) -> Result<(), I2C::Error> {
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    pub fn set_backlight(&mut self, on: bool) -> Result<(), I2C::Error> {
        self.backlight = if on { BACKLIGHT } else { 0 };
        self.i2c.write(self.address, &[self.backlight])
    }

    fn command(&mut self, value: u8) -> Result<(), I2C::Error> {
        self.send(value, 0)
    }

    fn data(&mut self, value: u8) -> Result<(), I2C::Error> {
        self.send(value, RS)
    }

    // Both nibbles go out in one bus transaction, each latched by an E pulse.
    fn send(&mut self, value: u8, mode: u8) -> Result<(), I2C::Error> {
        let flags = mode | self.backlight;
        let hi = (value & 0xF0) | flags;
        let lo = ((value << 4) & 0xF0) | flags;
        self.i2c.write(self.address, &[hi | EN, hi, lo | EN, lo])?;
        self.delay.delay_us(50);
        Ok(())
    }

    fn write_nibble(&mut self, nibble: u8) -> Result<(), I2C::Error> {
        let b = (nibble & 0xF0) | self.backlight;
        self.i2c.write(self.address, &[b | EN, b])
    }
}

impl<I2C: I2c, D: DelayNs> CharDisplay for Lcd<I2C, D> {
    type Error = I2C::Error;

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error> {
        let row = usize::from(row.min(LCD_ROWS - 1));
        self.command(CMD_SET_DDRAM | (col.min(LCD_COLS - 1) + ROW_OFFSETS[row]))
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for &b in bytes {
            self.data(b)?;
        }
        Ok(())
    }

    fn create_char(&mut self, slot: u8, glyph: &Glyph) -> Result<(), Self::Error> {
        self.command(CMD_SET_CGRAM | ((slot & 0x07) << 3))?;
        for &row in glyph {
            self.data(row)?;
        }
        Ok(())
    }
}

/// In-memory display used by the unit tests of the modules drawing on it.
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use core::convert::Infallible;

    pub struct FakeDisplay {
        pub cgram: [Glyph; 8],
        pub ddram: [[u8; LCD_COLS as usize]; LCD_ROWS as usize],
        pub glyph_writes: usize,
        col: usize,
        row: usize,
    }

    impl FakeDisplay {
        pub fn new() -> Self {
            Self {
                cgram: [[0; 8]; 8],
                ddram: [[b' '; LCD_COLS as usize]; LCD_ROWS as usize],
                glyph_writes: 0,
                col: 0,
                row: 0,
            }
        }

        pub fn line(&self, row: usize) -> &[u8] {
            &self.ddram[row]
        }
    }

    impl CharDisplay for FakeDisplay {
        type Error = Infallible;

        fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Infallible> {
            self.col = usize::from(col);
            self.row = usize::from(row);
            Ok(())
        }

        fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Infallible> {
            for &b in bytes {
                if self.col < LCD_COLS as usize {
                    self.ddram[self.row][self.col] = b;
                }
                self.col += 1;
            }
            Ok(())
        }

        fn create_char(&mut self, slot: u8, glyph: &Glyph) -> Result<(), Infallible> {
            self.cgram[usize::from(slot & 0x07)] = *glyph;
            self.glyph_writes += 1;
            Ok(())
        }
    }
}
