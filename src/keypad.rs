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
//! 4x4 matrix keypad on a PCF8574 expander.
//!
//! Rows hang off P0..P3 and are pulled low one at a time; columns on P4..P7
//! read low where a key joins them to the active row.

use embedded_hal::i2c::I2c;

/// 7-bit address of the keypad expander.
pub const KEYPAD_ADDRESS: u8 = 0x21;

pub const ROWS: usize = 4;
pub const COLS: usize = 4;

pub const KEYMAP: [[u8; COLS]; ROWS] = [
    [b'1', b'2', b'3', b'+'],
    [b'4', b'5', b'6', b'-'],
    [b'7', b'8', b'9', b'*'],
    [b'c', b'0', b'.', b'='],
];

// All lines high: rows idle, columns usable as inputs.
const RELEASE: u8 = 0xFF;

/// How long a reading has to hold before it counts, in milliseconds.
pub const DEBOUNCE_MS: u16 = 10;

pub struct Keypad<I2C> {
    i2c: I2C,
    address: u8,
    // Debounced state of the keypad.
    held: Option<u8>,
    // Latest raw reading and when it first appeared.
    reading: Option<u8>,
    since: u16,
}

impl<I2C: I2c> Keypad<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            held: None,
            reading: None,
            since: 0,
        }
    }

    /// The key currently down, if any.  With several keys down the first in
    /// row-major order wins.
    pub fn scan(&mut self) -> Result<Option<u8>, I2C::Error> {
        let mut found = None;
        for (row, keys) in KEYMAP.iter().enumerate() {
            self.i2c.write(self.address, &[!(1u8 << row)])?;
            let mut port = [0u8; 1];
            self.i2c.read(self.address, &mut port)?;
            let cols = !port[0] >> 4;
            if cols != 0 {
                found = Some(keys[cols.trailing_zeros() as usize]);
                break;
            }
        }
        self.i2c.write(self.address, &[RELEASE])?;
        Ok(found)
    }

    /// A key that has just gone down, `now_ms` being the millisecond clock.
    ///
    /// A reading only counts once it has held for [`DEBOUNCE_MS`], so contact
    /// bounce on press or release is not seen.  Holding a key returns nothing
    /// more until it is released or another key is pressed.
    pub fn get_key(&mut self, now_ms: u16) -> Result<Option<u8>, I2C::Error> {
        let reading = self.scan()?;
        if reading != self.reading {
            self.reading = reading;
            self.since = now_ms;
            return Ok(None);
        }
        if reading == self.held || now_ms.wrapping_sub(self.since) < DEBOUNCE_MS {
            return Ok(None);
        }
        self.held = reading;
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    const A: u8 = KEYPAD_ADDRESS;

    // Expander readback with the given row driven low and `col` pulled low.
    fn port(row: u8, col: Option<u8>) -> Vec<u8> {
        let mut v = !(1u8 << row);
        if let Some(c) = col {
            v &= !(1 << (4 + c));
        }
        vec![v]
    }

    fn idle_scan() -> Vec<I2cTransaction> {
        let mut t = vec![];
        for row in 0..4 {
            t.push(I2cTransaction::write(A, vec![!(1u8 << row)]));
            t.push(I2cTransaction::read(A, port(row, None)));
        }
        t.push(I2cTransaction::write(A, vec![0xFF]));
        t
    }

    fn press_scan(row: u8, col: u8) -> Vec<I2cTransaction> {
        let mut t = vec![];
        for r in 0..row {
            t.push(I2cTransaction::write(A, vec![!(1u8 << r)]));
            t.push(I2cTransaction::read(A, port(r, None)));
        }
        t.push(I2cTransaction::write(A, vec![!(1u8 << row)]));
        t.push(I2cTransaction::read(A, port(row, Some(col))));
        t.push(I2cTransaction::write(A, vec![0xFF]));
        t
    }

    #[test]
    fn scan_finds_key() {
        let mut i2c = I2cMock::new(&press_scan(1, 1));
        let mut kp = Keypad::new(i2c.clone(), A);
        assert_eq!(kp.scan(), Ok(Some(b'5')));
        i2c.done();
    }

    #[test]
    fn scan_with_nothing_down() {
        let mut i2c = I2cMock::new(&idle_scan());
        let mut kp = Keypad::new(i2c.clone(), A);
        assert_eq!(kp.scan(), Ok(None));
        i2c.done();
    }

    fn scans(t: &mut Vec<I2cTransaction>, key: Option<(u8, u8)>, n: usize) {
        for _ in 0..n {
            match key {
                Some((row, col)) => t.extend(press_scan(row, col)),
                None => t.extend(idle_scan()),
            }
        }
    }

    #[test]
    fn held_key_reported_once() {
        let mut t = vec![];
        scans(&mut t, Some((3, 3)), 3);
        scans(&mut t, None, 2);
        scans(&mut t, Some((3, 3)), 2);
        scans(&mut t, Some((0, 2)), 2);
        let mut i2c = I2cMock::new(&t);
        let mut kp = Keypad::new(i2c.clone(), A);

        assert_eq!(kp.get_key(0), Ok(None));
        assert_eq!(kp.get_key(20), Ok(Some(b'=')));
        assert_eq!(kp.get_key(40), Ok(None));
        assert_eq!(kp.get_key(60), Ok(None));
        assert_eq!(kp.get_key(80), Ok(None));
        assert_eq!(kp.get_key(100), Ok(None));
        assert_eq!(kp.get_key(120), Ok(Some(b'=')));
        assert_eq!(kp.get_key(140), Ok(None));
        assert_eq!(kp.get_key(160), Ok(Some(b'3')));
        i2c.done();
    }

    #[test]
    fn bouncing_press_reported_once() {
        // Contacts chatter for a few ms on press and again on release.
        let mut t = vec![];
        let mut times = vec![];
        for (ms, down) in [
            (0, true),
            (2, false),
            (4, true),
            (5, false),
            (7, true),
            (12, true),
            (18, true),
            (30, true),
            (40, false),
            (42, true),
            (44, false),
            (60, false),
            (70, false),
        ] {
            scans(&mut t, down.then_some((1, 0)), 1);
            times.push(ms);
        }
        let mut i2c = I2cMock::new(&t);
        let mut kp = Keypad::new(i2c.clone(), A);

        let keys: Vec<u8> = times
            .into_iter()
            .filter_map(|ms| kp.get_key(ms).unwrap())
            .collect();
        assert_eq!(keys, vec![b'4']);
        i2c.done();
    }

    #[test]
    fn debounce_survives_clock_wrap() {
        let mut t = vec![];
        scans(&mut t, Some((2, 1)), 2);
        let mut i2c = I2cMock::new(&t);
        let mut kp = Keypad::new(i2c.clone(), A);
        assert_eq!(kp.get_key(u16::MAX - 3), Ok(None));
        assert_eq!(kp.get_key(8), Ok(Some(b'8')));
        i2c.done();
    }
}
