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
//! Clock face: the state the main loop keeps between RTC reads, and the two
//! text lines drawn from it.

use heapless::String;
use ufmt::{uDisplay, uWrite, uwrite, Formatter};

use crate::pcf8563::{Alarm, DateTime, RawTime};

pub const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One LCD line of text.
pub type Line = String<16>;

/// A value below 100 with a leading zero.
struct TwoDigits(u8);

impl uDisplay for TwoDigits {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        let v = self.0 % 100;
        f.write_char(char::from(b'0' + v / 10))?;
        f.write_char(char::from(b'0' + v % 10))
    }
}

fn name<'a>(table: &[&'a str], index: usize) -> &'a str {
    table.get(index).copied().unwrap_or("???")
}

/// `HH:MM:SS`, with a trailing `!` when the RTC lost power.
pub fn format_time(t: &DateTime) -> Line {
    let mut line = Line::new();
    let _ = uwrite!(
        line,
        "{}:{}:{}",
        TwoDigits(t.hour),
        TwoDigits(t.minute),
        TwoDigits(t.second)
    );
    if t.low_voltage {
        let _ = line.push('!');
    }
    line
}

/// `Www DD Mmm YY`.
pub fn format_date(t: &DateTime) -> Line {
    let mut line = Line::new();
    let _ = uwrite!(
        line,
        "{} {} {} {}",
        name(&DAYS, usize::from(t.weekday)),
        TwoDigits(t.day),
        name(&MONTHS, usize::from(t.month).wrapping_sub(1)),
        TwoDigits(t.year)
    );
    line
}

/// `AL HH:MM on` / `AL HH:MM off`.
pub fn format_alarm(a: &Alarm) -> Line {
    let mut line = Line::new();
    let _ = uwrite!(
        line,
        "AL {}:{} {}",
        TwoDigits(a.hour),
        TwoDigits(a.minute),
        if a.enabled { "on" } else { "off" }
    );
    line
}

/// Everything the main loop needs to remember from one pass to the next.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClockState {
    pub now: DateTime,
    /// Alarm as programmed in the RTC at the last read.
    pub alarm: Alarm,
    /// The RTC raised its alarm flag and nobody has acknowledged it.
    pub alarm_ringing: bool,
    /// Last RTC access failed.
    pub rtc_error: bool,
    last_second: Option<u8>,
}

impl ClockState {
    /// Take in a fresh RTC read.  Returns true when the second has moved
    /// on since the previous one and the display needs redrawing.
    pub fn update(&mut self, raw: &RawTime) -> bool {
        self.now = raw.decode();
        self.alarm = raw.alarm();
        self.rtc_error = false;
        let changed = self.last_second != Some(self.now.second);
        self.last_second = Some(self.now.second);
        changed
    }

    /// Make the next `update` report a change, e.g. after the screen was
    /// cleared.
    pub fn invalidate(&mut self) {
        self.last_second = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DateTime {
        DateTime {
            second: 5,
            minute: 7,
            hour: 9,
            weekday: 6,
            day: 17,
            month: 10,
            year: 26,
            century: false,
            low_voltage: false,
        }
    }

    #[test]
    fn time_line_is_zero_padded() {
        assert_eq!(format_time(&sample()).as_str(), "09:07:05");
        let mut t = sample();
        t.low_voltage = true;
        assert_eq!(format_time(&t).as_str(), "09:07:05!");
    }

    #[test]
    fn date_line_uses_names() {
        assert_eq!(format_date(&sample()).as_str(), "Sat 17 Oct 26");
        let mut t = sample();
        t.month = 0;
        t.weekday = 7;
        assert_eq!(format_date(&t).as_str(), "??? 17 ??? 26");
    }

    #[test]
    fn alarm_line() {
        let a = Alarm {
            hour: 6,
            minute: 30,
            enabled: true,
        };
        assert_eq!(format_alarm(&a).as_str(), "AL 06:30 on");
        assert_eq!(format_alarm(&Alarm::default()).as_str(), "AL 00:00 off");
    }

    #[test]
    fn update_reports_new_seconds_only() {
        let mut state = ClockState::default();
        let mut raw = RawTime::default();
        raw.0[0] = 0x12;
        assert!(state.update(&raw));
        assert!(!state.update(&raw));
        raw.0[0] = 0x13;
        assert!(state.update(&raw));
        assert_eq!(state.now.second, 13);
        state.invalidate();
        assert!(state.update(&raw));
    }

    #[test]
    fn update_reads_back_the_rtc_alarm() {
        let mut state = ClockState::default();
        let mut raw = RawTime::default();
        raw.0[7] = 0x45;
        raw.0[8] = 0x06;
        state.update(&raw);
        let armed = Alarm {
            hour: 6,
            minute: 45,
            enabled: true,
        };
        assert_eq!(state.alarm, armed);

        // Alarm registers back at their power-on value.
        raw.0[7] = 0x80;
        raw.0[8] = 0x80;
        state.update(&raw);
        assert_ne!(state.alarm, armed);
        assert!(!state.alarm.enabled);
    }
}
