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
//! Alarm tunes and key clicks on the piezo buzzer.
//!
//! The buzzer sits behind an external divide-by-8, so every frequency is
//! multiplied by [`EXTMULT`] before it reaches the timer.  Tunes are plain
//! slices; there is no terminating entry.

use embedded_hal::delay::DelayNs;

pub const EXTMULT: u16 = 8;

// Pitches in Hz, equal temperament, A4 = 440.
pub const NOTE_B1: u16 = 62;
pub const NOTE_G3: u16 = 196;
pub const NOTE_A3: u16 = 220;
pub const NOTE_B3: u16 = 247;
pub const NOTE_C4: u16 = 262;
pub const NOTE_D4: u16 = 294;
pub const NOTE_E4: u16 = 330;
pub const NOTE_F4: u16 = 349;
pub const NOTE_G4: u16 = 392;
pub const NOTE_A4: u16 = 440;
pub const NOTE_C5: u16 = 523;

/// Anything below the audible floor once multiplied plays as silence.
pub const REST: u16 = 2;

/// Output below this frequency is a rest.
pub const MIN_TONE_HZ: u16 = NOTE_B1;

/// Whole note, ms.
const WN: u16 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Note {
    pub freq: u16,
    pub duration_ms: u16,
}

const fn n(freq: u16, division: u16) -> Note {
    Note {
        freq,
        duration_ms: WN / division,
    }
}

pub static TUNE_0: [Note; 8] = [
    n(NOTE_C4, 4),
    n(NOTE_G3, 8),
    n(NOTE_G3, 8),
    n(NOTE_A3, 4),
    n(NOTE_G3, 4),
    n(REST, 4),
    n(NOTE_B3, 4),
    n(NOTE_C4, 4),
];

pub static TUNE_1: [Note; 6] = [
    n(NOTE_G3, 8),
    n(NOTE_G3, 8),
    n(NOTE_G3, 8),
    n(NOTE_G4, 4),
    n(NOTE_B3, 8),
    n(NOTE_G4, 1),
];

// Twinkle twinkle, six phrases of seven notes.
#[rustfmt::skip]
pub static TUNE_2: [Note; 42] = [
    n(NOTE_C4, 4), n(NOTE_C4, 4), n(NOTE_G4, 4), n(NOTE_G4, 4), n(NOTE_A4, 4), n(NOTE_A4, 4), n(NOTE_G4, 2),
    n(NOTE_F4, 4), n(NOTE_F4, 4), n(NOTE_E4, 4), n(NOTE_E4, 4), n(NOTE_D4, 4), n(NOTE_D4, 4), n(NOTE_C4, 2),
    n(NOTE_G4, 4), n(NOTE_G4, 4), n(NOTE_F4, 4), n(NOTE_F4, 4), n(NOTE_E4, 4), n(NOTE_E4, 4), n(NOTE_D4, 2),
    n(NOTE_G4, 4), n(NOTE_G4, 4), n(NOTE_F4, 4), n(NOTE_F4, 4), n(NOTE_E4, 4), n(NOTE_E4, 4), n(NOTE_D4, 2),
    n(NOTE_C4, 4), n(NOTE_C4, 4), n(NOTE_G4, 4), n(NOTE_G4, 4), n(NOTE_A4, 4), n(NOTE_A4, 4), n(NOTE_G4, 2),
    n(NOTE_F4, 4), n(NOTE_F4, 4), n(NOTE_E4, 4), n(NOTE_E4, 4), n(NOTE_D4, 4), n(NOTE_D4, 4), n(NOTE_C4, 2),
];

pub const TUNE_COUNT: u8 = 3;

/// Tune number `index`; unknown numbers play tune 0.
pub fn tune(index: u8) -> &'static [Note] {
    match index {
        1 => &TUNE_1,
        2 => &TUNE_2,
        _ => &TUNE_0,
    }
}

/// Square-wave output on the buzzer pin.
pub trait Buzzer {
    /// Start (or retune) a tone of `hz` at the pin.
    fn start(&mut self, hz: u16);
    fn stop(&mut self);
}

/// Frequency at the pin for a note, or `None` for a rest.
pub fn output_hz(freq: u16) -> Option<u16> {
    let hz = freq.saturating_mul(EXTMULT);
    (hz >= MIN_TONE_HZ).then_some(hz)
}

// Running key-click: started at `since`, lasting `duration_ms`.
struct Beep {
    since: u16,
    duration_ms: u16,
}

pub struct MelodyPlayer<B, D> {
    buzzer: B,
    delay: D,
    beep: Option<Beep>,
}

impl<B: Buzzer, D: DelayNs> MelodyPlayer<B, D> {
    pub fn new(buzzer: B, delay: D) -> Self {
        Self {
            buzzer,
            delay,
            beep: None,
        }
    }

    /// Play tune `index` to the end.  Blocks for the whole tune.
    pub fn play(&mut self, index: u8) {
        self.beep = None;
        for note in tune(index) {
            self.play_note(note);
        }
        self.buzzer.stop();
    }

    /// Sound `note` for its duration, then leave 30% of it silent so
    /// repeated notes stay distinct.
    pub fn play_note(&mut self, note: &Note) {
        match output_hz(note.freq) {
            Some(hz) => self.buzzer.start(hz),
            None => self.buzzer.stop(),
        }
        self.delay.delay_ms(u32::from(note.duration_ms));
        self.buzzer.stop();
        self.delay.delay_ms(u32::from(note.duration_ms) * 3 / 10);
    }

    /// Start a short tone without waiting for it.  [`MelodyPlayer::service`]
    /// ends it.
    pub fn beep(&mut self, note: u16, duration_ms: u16, now_ms: u16) {
        match output_hz(note) {
            Some(hz) => {
                self.buzzer.start(hz);
                self.beep = Some(Beep {
                    since: now_ms,
                    duration_ms,
                });
            }
            None => {
                self.buzzer.stop();
                self.beep = None;
            }
        }
    }

    /// Stop a running beep once its time is up.  Call from the main loop.
    pub fn service(&mut self, now_ms: u16) {
        if let Some(b) = &self.beep {
            if now_ms.wrapping_sub(b.since) >= b.duration_ms {
                self.buzzer.stop();
                self.beep = None;
            }
        }
    }

    pub fn is_beeping(&self) -> bool {
        self.beep.is_some()
    }
}

/// Timer2 clock select for tone generation, CS22..CS20.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tc2Prescaler {
    Direct,
    Div8,
    Div32,
    Div64,
    Div128,
    Div256,
    Div1024,
}

impl Tc2Prescaler {
    const ALL: [(Tc2Prescaler, u32); 7] = [
        (Tc2Prescaler::Direct, 1),
        (Tc2Prescaler::Div8, 8),
        (Tc2Prescaler::Div32, 32),
        (Tc2Prescaler::Div64, 64),
        (Tc2Prescaler::Div128, 128),
        (Tc2Prescaler::Div256, 256),
        (Tc2Prescaler::Div1024, 1024),
    ];
}

const F_CPU: u32 = 16_000_000;

/// Timer2 setting toggling OC2A at `hz` in CTC mode: the smallest divisor
/// whose compare value fits in 8 bits.
pub fn tc2_setting(hz: u16) -> Option<(Tc2Prescaler, u8)> {
    if hz == 0 {
        return None;
    }
    Tc2Prescaler::ALL.iter().find_map(|&(p, div)| {
        let top = F_CPU / (2 * div * u32::from(hz));
        match top {
            1..=256 => Some((p, (top - 1) as u8)),
            _ => None,
        }
    })
}
