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
//! Keypad editing of the time and the alarm.
//!
//! `*` starts time entry (six digits, HHMMSS), `+` starts alarm entry (four
//! digits, HHMM).  `=` commits a complete entry, `c` abandons it.  Outside an
//! entry `-` steps the bargraph scale, `=` arms or disarms the alarm and `.`
//! silences a ringing alarm.

use heapless::Vec;
use ufmt::derive::uDebug;

use crate::clock::Line;
use crate::pcf8563::Alarm;

const TIME_DIGITS: usize = 6;
const ALARM_DIGITS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, uDebug)]
pub enum Mode {
    Idle,
    SettingTime,
    SettingAlarm,
}

/// What the caller has to do after a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Key meant nothing here.
    Ignored,
    /// An entry began, or a digit was taken; redraw the prompt.
    Prompt,
    SetTime { hour: u8, minute: u8, second: u8 },
    SetAlarm(Alarm),
    /// Entry abandoned; back to the clock face.
    Cancelled,
    /// Entry incomplete or out of range; back to the clock face.
    Rejected,
    CycleScale,
    ToggleAlarm,
    AcknowledgeAlarm,
}

#[derive(Debug)]
pub struct Editor {
    mode: Mode,
    input: Vec<u8, TIME_DIGITS>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            mode: Mode::Idle,
            input: Vec::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn input(&self) -> &[u8] {
        &self.input
    }

    pub fn key(&mut self, key: u8) -> Action {
        match (self.mode, key) {
            (Mode::Idle, b'*') => self.begin(Mode::SettingTime),
            (Mode::Idle, b'+') => self.begin(Mode::SettingAlarm),
            (Mode::Idle, b'-') => Action::CycleScale,
            (Mode::Idle, b'=') => Action::ToggleAlarm,
            (Mode::Idle, b'.') => Action::AcknowledgeAlarm,
            (Mode::Idle, _) => Action::Ignored,
            (_, b'c') => {
                self.reset();
                Action::Cancelled
            }
            (_, b'=') => self.commit(),
            (_, d @ b'0'..=b'9') => {
                if self.input.len() < self.wanted() && self.input.push(d - b'0').is_ok() {
                    Action::Prompt
                } else {
                    Action::Ignored
                }
            }
            _ => Action::Ignored,
        }
    }

    /// Entry line for the current mode, unfilled digits shown as `_`.
    pub fn prompt(&self) -> Line {
        let mut line = Line::new();
        let (label, groups) = match self.mode {
            Mode::Idle => return line,
            Mode::SettingTime => ("Time ", 3),
            Mode::SettingAlarm => ("Alarm ", 2),
        };
        let _ = line.push_str(label);
        for i in 0..groups * 2 {
            if i > 0 && i % 2 == 0 {
                let _ = line.push(':');
            }
            let c = self.input.get(i).map_or('_', |d| char::from(b'0' + d));
            let _ = line.push(c);
        }
        line
    }

    fn begin(&mut self, mode: Mode) -> Action {
        self.input.clear();
        self.mode = mode;
        Action::Prompt
    }

    fn reset(&mut self) {
        self.input.clear();
        self.mode = Mode::Idle;
    }

    fn wanted(&self) -> usize {
        match self.mode {
            Mode::SettingTime => TIME_DIGITS,
            Mode::SettingAlarm => ALARM_DIGITS,
            Mode::Idle => 0,
        }
    }

    fn pair(&self, i: usize) -> u8 {
        self.input[i] * 10 + self.input[i + 1]
    }

    fn commit(&mut self) -> Action {
        if self.input.len() != self.wanted() {
            self.reset();
            return Action::Rejected;
        }
        let (hour, minute) = (self.pair(0), self.pair(2));
        let action = match self.mode {
            Mode::SettingTime => {
                let second = self.pair(4);
                if hour < 24 && minute < 60 && second < 60 {
                    Action::SetTime {
                        hour,
                        minute,
                        second,
                    }
                } else {
                    Action::Rejected
                }
            }
            Mode::SettingAlarm if hour < 24 && minute < 60 => Action::SetAlarm(Alarm {
                hour,
                minute,
                enabled: true,
            }),
            _ => Action::Rejected,
        };
        self.reset();
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(ed: &mut Editor, keys: &[u8]) -> Action {
        let mut last = Action::Ignored;
        for &k in keys {
            last = ed.key(k);
        }
        last
    }

    #[test]
    fn time_entry_commits() {
        let mut ed = Editor::new();
        assert_eq!(ed.key(b'*'), Action::Prompt);
        assert_eq!(ed.mode(), Mode::SettingTime);
        assert_eq!(
            feed(&mut ed, b"235907="),
            Action::SetTime {
                hour: 23,
                minute: 59,
                second: 7
            }
        );
        assert_eq!(ed.mode(), Mode::Idle);
    }

    #[test]
    fn alarm_entry_commits_armed() {
        let mut ed = Editor::new();
        assert_eq!(
            feed(&mut ed, b"+0630="),
            Action::SetAlarm(Alarm {
                hour: 6,
                minute: 30,
                enabled: true
            })
        );
    }

    #[test]
    fn extra_digits_ignored() {
        let mut ed = Editor::new();
        feed(&mut ed, b"+1234");
        assert_eq!(ed.key(b'5'), Action::Ignored);
        assert_eq!(ed.input(), &[1, 2, 3, 4]);
    }

    #[test]
    fn short_or_bad_entry_rejected() {
        let mut ed = Editor::new();
        assert_eq!(feed(&mut ed, b"*1230="), Action::Rejected);
        assert_eq!(ed.mode(), Mode::Idle);
        assert_eq!(feed(&mut ed, b"*246000="), Action::Rejected);
        assert_eq!(feed(&mut ed, b"+1260="), Action::Rejected);
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut ed = Editor::new();
        feed(&mut ed, b"*12");
        assert_eq!(ed.key(b'c'), Action::Cancelled);
        assert_eq!(ed.mode(), Mode::Idle);
        assert!(ed.input().is_empty());
    }

    #[test]
    fn idle_keys() {
        let mut ed = Editor::new();
        assert_eq!(ed.key(b'-'), Action::CycleScale);
        assert_eq!(ed.key(b'='), Action::ToggleAlarm);
        assert_eq!(ed.key(b'.'), Action::AcknowledgeAlarm);
        assert_eq!(ed.key(b'7'), Action::Ignored);
        assert_eq!(ed.key(b'c'), Action::Ignored);
    }

    #[test]
    fn prompt_shows_progress() {
        let mut ed = Editor::new();
        assert_eq!(ed.prompt().as_str(), "");
        feed(&mut ed, b"*123");
        assert_eq!(ed.prompt().as_str(), "Time 12:3_:__");
        ed.key(b'c');
        feed(&mut ed, b"+9");
        assert_eq!(ed.prompt().as_str(), "Alarm 9_:__");
    }
}
