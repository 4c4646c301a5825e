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
//! Precision clock firmware: PCF8563 time keeping, a keypad, a character LCD
//! with a centre-zero bargraph fed by Timer1 input capture, and a piezo
//! buzzer for alarm tunes.
//!
//! Everything except `board` and `millis` is independent of the AVR and is
//! unit-tested on the host.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

pub mod bargraph;
pub mod capture;
pub mod clock;
pub mod editor;
pub mod glyphs;
pub mod keypad;
pub mod lcd;
pub mod melody;
pub mod pcf8563;
pub mod settings;

#[cfg(target_arch = "avr")]
pub mod board;
#[cfg(target_arch = "avr")]
pub mod millis;
