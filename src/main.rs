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
//! clock05: PCF8563 clock with keypad, LCD bargraph and alarm tunes.
//!
//! Target: ATmega328P (Arduino Uno), clock at 16 MHz.
//!
//! Wiring:
//!  * I2C (A4/A5): RTC at 0x51, LCD backpack at 0x20, keypad expander at 0x21
//!  * D8 (ICP1): pulse-per-second reference
//!  * D11 (OC2A): piezo, through the external divide-by-8

#![no_std]
#![no_main]

#[cfg(feature = "panic-serial")]
mod panic;
#[cfg(not(feature = "panic-serial"))]
use panic_halt as _;

use core::cell::RefCell;

use embedded_hal_bus::i2c::RefCellDevice;
use ufmt::uwriteln;

use clock05::bargraph::{BarLayout, Bargraph, MAX_BARS};
use clock05::board::{MeasureTimer, Piezo};
use clock05::capture::{PhaseMeter, PPS_CAPTURE};
use clock05::clock::{self, ClockState};
use clock05::editor::{Action, Editor, Mode};
use clock05::keypad::{Keypad, KEYPAD_ADDRESS};
use clock05::lcd::{CharDisplay, Lcd, LCD_ADDRESS, LCD_COLS};
use clock05::melody::{MelodyPlayer, NOTE_C5};
use clock05::millis;
use clock05::pcf8563::{flags, ClockOut, Pcf8563};
use clock05::settings::Settings;

const CLICK_MS: u16 = 30;
// Bottom line: time, date or the entry prompt.
const TEXT_LINE: u8 = 1;
// The date replaces the time for the first seconds of each minute.
const DATE_SECONDS: u8 = 3;

/// Write `text` on `row`, blank-padded to the full width.
fn show_line<D: CharDisplay>(lcd: &mut D, row: u8, text: &str) -> Result<(), D::Error> {
    lcd.set_cursor(0, row)?;
    lcd.write_bytes(text.as_bytes())?;
    for _ in text.len()..usize::from(LCD_COLS) {
        lcd.write_bytes(b" ")?;
    }
    Ok(())
}

#[arduino_hal::entry]
fn main() -> ! {
    let dp = arduino_hal::Peripherals::take().unwrap();
    let pins = arduino_hal::pins!(dp);
    let mut serial = arduino_hal::default_serial!(dp, pins, 19200);
    uwriteln!(&mut serial, "clock05 starting\r").ok();

    millis::init(dp.TC0);

    let i2c = arduino_hal::I2c::new(
        dp.TWI,
        pins.a4.into_pull_up_input(),
        pins.a5.into_pull_up_input(),
        100_000,
    );
    let bus = RefCell::new(i2c);

    let mut lcd = Lcd::new(RefCellDevice::new(&bus), arduino_hal::Delay::new(), LCD_ADDRESS);
    if lcd.init().is_err() {
        uwriteln!(&mut serial, "LCD not responding\r").ok();
    }
    let mut keypad = Keypad::new(RefCellDevice::new(&bus), KEYPAD_ADDRESS);
    let mut rtc = Pcf8563::new(RefCellDevice::new(&bus));

    let mut eeprom = arduino_hal::Eeprom::new(dp.EEPROM);
    let mut settings = Settings::load(&eeprom);

    // ICP1 is an input whatever the pin mode, but keep the pull-up off.
    let _pps = pins.d8.into_floating_input();
    let mut bar = Bargraph::new(MeasureTimer::new(dp.TC1), BarLayout::default());
    if bar.select(&mut lcd, settings.scale).is_err() {
        uwriteln!(&mut serial, "LCD glyph load failed\r").ok();
    }
    let mut meter = PhaseMeter::new(&PPS_CAPTURE, settings.scale);
    let mut bar_value: i16 = 0;
    bar.render(&mut lcd, bar_value, MAX_BARS).ok();

    let mut player = MelodyPlayer::new(
        Piezo::new(dp.TC2, pins.d11.into_output()),
        arduino_hal::Delay::new(),
    );

    let rtc_setup = rtc
        .start()
        .and_then(|_| rtc.set_clock_output(ClockOut::Disabled))
        .and_then(|_| rtc.set_alarm(&settings.alarm()))
        .and_then(|_| rtc.read_status().map(|_| ()))
        .and_then(|_| rtc.enable_alarm_interrupt(settings.alarm_enabled));
    if let Err(e) = rtc_setup {
        uwriteln!(&mut serial, "{}\r", e).ok();
    }

    // SAFETY: all interrupt-shared state is behind critical sections.
    unsafe { avr_device::interrupt::enable() };

    let mut state = ClockState::default();
    let mut editor = Editor::new();

    loop {
        player.service(millis::millis());

        match keypad.get_key(millis::millis()) {
            Ok(Some(key)) => {
                let action = editor.key(key);
                if action != Action::Ignored {
                    player.beep(NOTE_C5, CLICK_MS, millis::millis());
                }
                match action {
                    Action::Ignored => {}
                    Action::Prompt => {
                        show_line(&mut lcd, TEXT_LINE, &editor.prompt()).ok();
                    }
                    Action::SetTime {
                        hour,
                        minute,
                        second,
                    } => {
                        let mut t = state.now;
                        t.hour = hour;
                        t.minute = minute;
                        t.second = second;
                        t.low_voltage = false;
                        if let Err(e) = rtc.set_time(&t) {
                            uwriteln!(&mut serial, "{}\r", e).ok();
                        }
                        uwriteln!(&mut serial, "time set {}:{}:{}\r", hour, minute, second).ok();
                    }
                    Action::SetAlarm(alarm) => {
                        settings.set_alarm(&alarm);
                        settings.save(&mut eeprom);
                        let r = rtc
                            .set_alarm(&alarm)
                            .and_then(|_| rtc.enable_alarm_interrupt(true));
                        if let Err(e) = r {
                            uwriteln!(&mut serial, "{}\r", e).ok();
                        }
                        show_line(&mut lcd, TEXT_LINE, &clock::format_alarm(&alarm)).ok();
                    }
                    Action::ToggleAlarm => {
                        settings.alarm_enabled = !settings.alarm_enabled;
                        settings.save(&mut eeprom);
                        let r = rtc
                            .set_alarm(&settings.alarm())
                            .and_then(|_| rtc.enable_alarm_interrupt(settings.alarm_enabled));
                        if let Err(e) = r {
                            uwriteln!(&mut serial, "{}\r", e).ok();
                        }
                        show_line(&mut lcd, TEXT_LINE, &clock::format_alarm(&settings.alarm())).ok();
                    }
                    Action::CycleScale => {
                        let scale = bar.scale().unwrap_or(settings.scale).next();
                        if bar.select(&mut lcd, scale).is_ok() {
                            meter.set_scale(scale);
                            settings.scale = scale;
                            settings.save(&mut eeprom);
                            bar_value = 0;
                            uwriteln!(&mut serial, "scale {}\r", scale).ok();
                        }
                        bar.render(&mut lcd, bar_value, MAX_BARS).ok();
                    }
                    Action::AcknowledgeAlarm => state.alarm_ringing = false,
                    Action::Cancelled | Action::Rejected => state.invalidate(),
                }
                if matches!(action, Action::SetTime { .. }) {
                    state.invalidate();
                }
            }
            Ok(None) => {}
            Err(_) => {
                uwriteln!(&mut serial, "keypad not responding\r").ok();
            }
        }

        match rtc.read_status() {
            Ok(status) if status[1] & flags::AF != 0 => {
                state.alarm_ringing = true;
                if let Err(e) = rtc.clear_status_flag(flags::AF) {
                    uwriteln!(&mut serial, "{}\r", e).ok();
                }
            }
            Ok(_) => {}
            Err(e) => {
                if !state.rtc_error {
                    uwriteln!(&mut serial, "{}\r", e).ok();
                    show_line(&mut lcd, TEXT_LINE, "RTC error").ok();
                }
                state.rtc_error = true;
            }
        }

        match rtc.read_time() {
            Ok(raw) => {
                let tick = state.update(&raw);
                // The RTC alarm is lost on power failure or a failed write.
                if tick && state.alarm != settings.alarm() {
                    let r = rtc
                        .set_alarm(&settings.alarm())
                        .and_then(|_| rtc.enable_alarm_interrupt(settings.alarm_enabled));
                    match r {
                        Ok(()) => uwriteln!(&mut serial, "alarm reloaded\r").ok(),
                        Err(e) => uwriteln!(&mut serial, "{}\r", e).ok(),
                    };
                }
                if tick && editor.mode() == Mode::Idle {
                    let line = if state.now.second < DATE_SECONDS {
                        clock::format_date(&state.now)
                    } else {
                        clock::format_time(&state.now)
                    };
                    show_line(&mut lcd, TEXT_LINE, &line).ok();
                }
            }
            Err(e) => {
                if !state.rtc_error {
                    uwriteln!(&mut serial, "{}\r", e).ok();
                    show_line(&mut lcd, TEXT_LINE, "RTC error").ok();
                }
                state.rtc_error = true;
            }
        }

        if let Ok(v) = meter.sample() {
            bar_value = v;
            bar.render(&mut lcd, bar_value, MAX_BARS).ok();
        }

        if state.alarm_ringing && editor.mode() == Mode::Idle {
            player.play(settings.tune);
        }
    }
}
