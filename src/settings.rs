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
//! EEPROM settings.
//!
//! The alarm, the alarm tune and the bargraph scale are stored to the
//! onboard EEPROM when an edit is committed, and read back at startup.

use crate::bargraph::Scale;
use crate::melody::TUNE_COUNT;
use crate::pcf8563::Alarm;

/// Byte-addressed non-volatile storage.
pub trait SettingsStore {
    type Error;

    fn read(&self, offset: u16, buf: &mut [u8]) -> Result<(), Self::Error>;
    fn write_byte(&mut self, offset: u16, value: u8);
}

// EEPROM variables that are saved:  5
const LEN: usize = 5;

/// Saved clock settings state, restored at boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Alarm hour (range: 0-23)        Default: 7
    pub alarm_hour: u8,

    /// Alarm minute (range: 0-59)      Default: 0
    pub alarm_minute: u8,

    /// Alarm armed (Range: 0,1)        Default: 0
    pub alarm_enabled: bool,

    /// Tune played by the alarm (range: 0-2)   Default: 0
    pub tune: u8,

    /// Bargraph scale (0, 2, 5, 8)     Default: 0
    pub scale: Scale,
}

// "Factory" default configuration can be configured here:
const ALARM_HOUR_DEFAULT: u8 = 7;
const ALARM_MINUTE_DEFAULT: u8 = 0;
const ALARM_ENABLED_DEFAULT: bool = false;
const TUNE_DEFAULT: u8 = 0;
const SCALE_DEFAULT: Scale = Scale::Zero;

impl Default for Settings {
    fn default() -> Self {
        Self {
            alarm_hour: ALARM_HOUR_DEFAULT,
            alarm_minute: ALARM_MINUTE_DEFAULT,
            alarm_enabled: ALARM_ENABLED_DEFAULT,
            tune: TUNE_DEFAULT,
            scale: SCALE_DEFAULT,
        }
    }
}

impl Settings {
    /// Constructs a new Settings from the values stored in `store`, or
    /// defaults if an error occurs during a read.  Each out-of-range byte
    /// (a blank EEPROM reads 255) falls back to its own default.
    #[must_use]
    pub fn load<S: SettingsStore>(store: &S) -> Self {
        let mut vals: [u8; LEN] = [255; LEN];
        if store.read(0, &mut vals).is_err() {
            return Settings::default();
        }
        Settings {
            alarm_hour: match vals[0] {
                v @ 0..=23 => v,
                _ => ALARM_HOUR_DEFAULT,
            },
            alarm_minute: match vals[1] {
                v @ 0..=59 => v,
                _ => ALARM_MINUTE_DEFAULT,
            },
            alarm_enabled: match vals[2] {
                v @ 0..=1 => v == 1,
                _ => ALARM_ENABLED_DEFAULT,
            },
            tune: match vals[3] {
                v if v < TUNE_COUNT => v,
                _ => TUNE_DEFAULT,
            },
            scale: Scale::try_from(vals[4]).unwrap_or(SCALE_DEFAULT),
        }
    }

    /// Save the settings to `store`.
    ///
    /// EEPROM has a limited number of write cycles in its life.  Use this function
    /// sparingly -- good for human operated buttons, not so good for automation.
    pub fn save<S: SettingsStore>(&self, store: &mut S) {
        store.write_byte(0, self.alarm_hour);
        store.write_byte(1, self.alarm_minute);
        store.write_byte(2, u8::from(self.alarm_enabled));
        store.write_byte(3, self.tune);
        store.write_byte(4, self.scale.factor());
    }

    pub fn alarm(&self) -> Alarm {
        Alarm {
            hour: self.alarm_hour,
            minute: self.alarm_minute,
            enabled: self.alarm_enabled,
        }
    }

    pub fn set_alarm(&mut self, alarm: &Alarm) {
        self.alarm_hour = alarm.hour;
        self.alarm_minute = alarm.minute;
        self.alarm_enabled = alarm.enabled;
    }
}
