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
//! PCF8563 RTC interface

use embedded_hal::i2c::I2c;
use ufmt::{derive::uDebug, uDisplay, uWrite, Formatter};

/// 7-bit address of the PCF8563.
pub const RTC_ADDRESS: u8 = 0x51;

mod reg {
    pub const CONTROL_STATUS_1: u8 = 0x00;
    pub const CONTROL_STATUS_2: u8 = 0x01;
    pub const VL_SECONDS: u8 = 0x02;
    pub const MINUTE_ALARM: u8 = 0x09;
    pub const CLKOUT_CONTROL: u8 = 0x0D;
}

/// Bits of control/status register 2.
pub mod flags {
    /// Alarm flag, set by the chip when the alarm matches.
    pub const AF: u8 = 0x08;
    /// Timer flag.
    pub const TF: u8 = 0x04;
    /// Alarm interrupt enable.
    pub const AIE: u8 = 0x02;
    /// Timer interrupt enable.
    pub const TIE: u8 = 0x01;
}

// Alarm register bit 7: set means "ignore this field".
const ALARM_DISABLE: u8 = 0x80;
const CENTURY: u8 = 0x80;
const LOW_VOLTAGE: u8 = 0x80;

/// Length of the time and alarm burst starting at VL_seconds.
pub const TIME_BLOCK_LEN: usize = 11;

#[derive(Debug, PartialEq, Eq, uDebug)]
pub enum Error<E> {
    /// Control/status registers could not be read in full.
    StatusReadFailed(E),
    /// Time block could not be read in full.
    TimeReadFailed(E),
    /// A register write was not acknowledged.
    Bus(E),
}

impl<E> uDisplay for Error<E> {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(match self {
            Error::StatusReadFailed(_) => "RTC status read failed",
            Error::TimeReadFailed(_) => "RTC time read failed",
            Error::Bus(_) => "RTC write failed",
        })
    }
}

/// CLKOUT pin frequency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, uDebug)]
pub enum ClockOut {
    Hz32768,
    Hz1024,
    Hz32,
    Hz1,
    Disabled,
}

impl ClockOut {
    fn bits(self) -> u8 {
        const FE: u8 = 0x80;
        match self {
            ClockOut::Hz32768 => FE,
            ClockOut::Hz1024 => FE | 0b01,
            ClockOut::Hz32 => FE | 0b10,
            ClockOut::Hz1 => FE | 0b11,
            ClockOut::Disabled => 0,
        }
    }
}

pub fn bcd_decode(v: u8) -> u8 {
    (v >> 4) * 10 + (v & 0x0F)
}

pub fn bcd_encode(v: u8) -> u8 {
    ((v / 10) << 4) | (v % 10)
}

/// Calendar time as held by the RTC.  `weekday` counts from Sunday = 0,
/// `year` is within the century.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, uDebug)]
pub struct DateTime {
    pub second: u8,
    pub minute: u8,
    pub hour: u8,
    pub weekday: u8,
    pub day: u8,
    pub month: u8,
    pub year: u8,
    pub century: bool,
    /// The oscillator stopped at some point; the time cannot be trusted.
    pub low_voltage: bool,
}

impl DateTime {
    pub fn is_valid(&self) -> bool {
        self.second < 60
            && self.minute < 60
            && self.hour < 24
            && self.weekday < 7
            && (1..=31).contains(&self.day)
            && (1..=12).contains(&self.month)
            && self.year < 100
    }
}

/// Daily alarm at `hour`:`minute`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, uDebug)]
pub struct Alarm {
    pub hour: u8,
    pub minute: u8,
    pub enabled: bool,
}

/// The 11 raw registers from VL_seconds to weekday_alarm, as read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawTime(pub [u8; TIME_BLOCK_LEN]);

impl RawTime {
    pub fn decode(&self) -> DateTime {
        let b = &self.0;
        DateTime {
            second: bcd_decode(b[0] & 0x7F),
            minute: bcd_decode(b[1] & 0x7F),
            hour: bcd_decode(b[2] & 0x3F),
            day: bcd_decode(b[3] & 0x3F),
            weekday: b[4] & 0x07,
            month: bcd_decode(b[5] & 0x1F),
            year: bcd_decode(b[6]),
            century: b[5] & CENTURY != 0,
            low_voltage: b[0] & LOW_VOLTAGE != 0,
        }
    }

    pub fn alarm(&self) -> Alarm {
        let (m, h) = (self.0[7], self.0[8]);
        Alarm {
            minute: bcd_decode(m & 0x7F),
            hour: bcd_decode(h & 0x3F),
            enabled: m & ALARM_DISABLE == 0 && h & ALARM_DISABLE == 0,
        }
    }
}

/// Driver for the PCF8563.  Keeps a mirror of the two control/status
/// registers so flags can be cleared without another read.
pub struct Pcf8563<I2C> {
    i2c: I2C,
    status: [u8; 2],
}

impl<I2C: I2c> Pcf8563<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c, status: [0; 2] }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Clear STOP so the clock runs.
    pub fn start(&mut self) -> Result<(), Error<I2C::Error>> {
        self.status[0] = 0;
        self.i2c
            .write(RTC_ADDRESS, &[reg::CONTROL_STATUS_1, 0])
            .map_err(Error::Bus)
    }

    /// Read both control/status registers and refresh the mirror.
    pub fn read_status(&mut self) -> Result<[u8; 2], Error<I2C::Error>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(RTC_ADDRESS, &[reg::CONTROL_STATUS_1], &mut buf)
            .map_err(Error::StatusReadFailed)?;
        self.status = buf;
        Ok(buf)
    }

    /// Status registers as last read or written.
    pub fn status(&self) -> [u8; 2] {
        self.status
    }

    /// Clear `flag` in control/status 2.  The mirror changes before the
    /// write goes out, so it reflects the new state even if the bus fails.
    pub fn clear_status_flag(&mut self, flag: u8) -> Result<(), Error<I2C::Error>> {
        self.status[1] &= !flag;
        self.write_status_2()
    }

    /// Turn the alarm interrupt output on or off.
    pub fn enable_alarm_interrupt(&mut self, on: bool) -> Result<(), Error<I2C::Error>> {
        if on {
            self.status[1] |= flags::AIE;
        } else {
            self.status[1] &= !flags::AIE;
        }
        self.write_status_2()
    }

    fn write_status_2(&mut self) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(RTC_ADDRESS, &[reg::CONTROL_STATUS_2, self.status[1]])
            .map_err(Error::Bus)
    }

    /// Burst-read the time and alarm registers.
    pub fn read_time(&mut self) -> Result<RawTime, Error<I2C::Error>> {
        let mut raw = RawTime::default();
        self.i2c
            .write_read(RTC_ADDRESS, &[reg::VL_SECONDS], &mut raw.0)
            .map_err(Error::TimeReadFailed)?;
        Ok(raw)
    }

    /// Write the time registers.  Also clears the low-voltage flag.
    pub fn set_time(&mut self, t: &DateTime) -> Result<(), Error<I2C::Error>> {
        let month = bcd_encode(t.month) | if t.century { CENTURY } else { 0 };
        let buf = [
            reg::VL_SECONDS,
            bcd_encode(t.second),
            bcd_encode(t.minute),
            bcd_encode(t.hour),
            bcd_encode(t.day),
            t.weekday & 0x07,
            month,
            bcd_encode(t.year),
        ];
        self.i2c.write(RTC_ADDRESS, &buf).map_err(Error::Bus)
    }

    /// Program a daily alarm.  Day and weekday matching are always off.
    pub fn set_alarm(&mut self, alarm: &Alarm) -> Result<(), Error<I2C::Error>> {
        let enable = if alarm.enabled { 0 } else { ALARM_DISABLE };
        let buf = [
            reg::MINUTE_ALARM,
            bcd_encode(alarm.minute) | enable,
            bcd_encode(alarm.hour) | enable,
            ALARM_DISABLE,
            ALARM_DISABLE,
        ];
        self.i2c.write(RTC_ADDRESS, &buf).map_err(Error::Bus)
    }

    pub fn set_clock_output(&mut self, mode: ClockOut) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(RTC_ADDRESS, &[reg::CLKOUT_CONTROL, mode.bits()])
            .map_err(Error::Bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    /// A device that only ever has `available` bytes to give.
    struct ShortBus {
        available: usize,
    }

    impl ErrorType for ShortBus {
        type Error = ErrorKind;
    }

    impl I2c for ShortBus {
        fn transaction(
            &mut self,
            _address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            for op in operations {
                if let Operation::Read(buf) = op {
                    if buf.len() != self.available {
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
                    }
                    for (i, b) in buf.iter_mut().enumerate() {
                        *b = i as u8 + 1;
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn short_status_read_fails() {
        let mut rtc = Pcf8563::new(ShortBus { available: 1 });
        assert_eq!(
            rtc.read_status(),
            Err(Error::StatusReadFailed(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Data
            )))
        );
        assert_eq!(rtc.status(), [0, 0]);
    }

    #[test]
    fn short_time_read_fails() {
        let mut rtc = Pcf8563::new(ShortBus { available: 7 });
        assert!(matches!(rtc.read_time(), Err(Error::TimeReadFailed(_))));
    }

    #[test]
    fn full_time_read_keeps_order() {
        let mut rtc = Pcf8563::new(ShortBus { available: 11 });
        let raw = rtc.read_time().unwrap();
        assert_eq!(raw.0, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn read_status_addresses_register_zero() {
        let expectations = [I2cTransaction::write_read(
            RTC_ADDRESS,
            vec![0x00],
            vec![0x00, 0x1A],
        )];
        let mut i2c = I2cMock::new(&expectations);
        let mut rtc = Pcf8563::new(i2c.clone());
        assert_eq!(rtc.read_status(), Ok([0x00, 0x1A]));
        assert_eq!(rtc.status(), [0x00, 0x1A]);
        i2c.done();
    }

    #[test]
    fn clear_flag_updates_mirror_then_writes() {
        let expectations = [
            I2cTransaction::write_read(RTC_ADDRESS, vec![0x00], vec![0x00, 0x0A]),
            I2cTransaction::write(RTC_ADDRESS, vec![0x01, 0x02]),
            I2cTransaction::write(RTC_ADDRESS, vec![0x01, 0x00]).with_error(ErrorKind::Other),
        ];
        let mut i2c = I2cMock::new(&expectations);
        let mut rtc = Pcf8563::new(i2c.clone());
        rtc.read_status().unwrap();
        rtc.clear_status_flag(flags::AF).unwrap();
        assert_eq!(rtc.status(), [0x00, 0x02]);

        assert_eq!(
            rtc.clear_status_flag(flags::AIE),
            Err(Error::Bus(ErrorKind::Other))
        );
        assert_eq!(rtc.status()[1], 0x00);
        i2c.done();
    }

    #[test]
    fn time_read_starts_at_vl_seconds() {
        let block = vec![0x45, 0x59, 0x23, 0x31, 0x06, 0x92, 0x99, 0x30, 0x07, 0x80, 0x80];
        let expectations = [I2cTransaction::write_read(RTC_ADDRESS, vec![0x02], block.clone())];
        let mut i2c = I2cMock::new(&expectations);
        let mut rtc = Pcf8563::new(i2c.clone());
        let raw = rtc.read_time().unwrap();
        assert_eq!(raw.0.to_vec(), block);

        let t = raw.decode();
        assert_eq!(
            t,
            DateTime {
                second: 45,
                minute: 59,
                hour: 23,
                weekday: 6,
                day: 31,
                month: 12,
                year: 99,
                century: true,
                low_voltage: false,
            }
        );
        assert!(t.is_valid());
        assert_eq!(
            raw.alarm(),
            Alarm {
                hour: 7,
                minute: 30,
                enabled: true
            }
        );
        i2c.done();
    }

    #[test]
    fn low_voltage_flag_decoded() {
        let mut raw = RawTime::default();
        raw.0[0] = 0x80 | 0x12;
        raw.0[7] = 0x80;
        let t = raw.decode();
        assert!(t.low_voltage);
        assert_eq!(t.second, 12);
        assert!(!raw.alarm().enabled);
    }

    #[test]
    fn set_time_writes_bcd() {
        let t = DateTime {
            second: 7,
            minute: 42,
            hour: 19,
            weekday: 5,
            day: 17,
            month: 10,
            year: 26,
            century: false,
            low_voltage: true,
        };
        let expectations = [I2cTransaction::write(
            RTC_ADDRESS,
            vec![0x02, 0x07, 0x42, 0x19, 0x17, 0x05, 0x10, 0x26],
        )];
        let mut i2c = I2cMock::new(&expectations);
        let mut rtc = Pcf8563::new(i2c.clone());
        rtc.set_time(&t).unwrap();
        i2c.done();
    }

    #[test]
    fn set_alarm_and_clock_out() {
        let expectations = [
            I2cTransaction::write(RTC_ADDRESS, vec![0x09, 0x15, 0x06, 0x80, 0x80]),
            I2cTransaction::write(RTC_ADDRESS, vec![0x09, 0x80, 0x80, 0x80, 0x80]),
            I2cTransaction::write(RTC_ADDRESS, vec![0x0D, 0x83]),
            I2cTransaction::write(RTC_ADDRESS, vec![0x0D, 0x00]),
        ];
        let mut i2c = I2cMock::new(&expectations);
        let mut rtc = Pcf8563::new(i2c.clone());
        rtc.set_alarm(&Alarm {
            hour: 6,
            minute: 15,
            enabled: true,
        })
        .unwrap();
        rtc.set_alarm(&Alarm::default()).unwrap();
        rtc.set_clock_output(ClockOut::Hz1).unwrap();
        rtc.set_clock_output(ClockOut::Disabled).unwrap();
        i2c.done();
    }

    #[test]
    fn errors_display_their_kind() {
        let mut s: heapless::String<32> = heapless::String::new();
        ufmt::uwrite!(s, "{}", Error::TimeReadFailed(ErrorKind::Other)).unwrap();
        assert_eq!(s.as_str(), "RTC time read failed");
    }

    #[test]
    fn bcd_round_trip_on_clock_values() {
        assert_eq!(bcd_encode(59), 0x59);
        assert_eq!(bcd_decode(0x59), 59);
        assert_eq!(bcd_encode(0), 0);
        assert_eq!(bcd_decode(bcd_encode(23)), 23);
    }
}
