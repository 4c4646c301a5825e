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
//! Arduino Uno bindings for the hardware-independent modules.
//!
//! Timer1 measures (prescaler per bargraph scale, input capture on D8),
//! Timer2 makes tones on OC2A (D11), the EEPROM holds the settings.

use arduino_hal::hal::port::PB3;
use arduino_hal::pac::{TC1, TC2};
use arduino_hal::port::{mode::Output, Pin};

use crate::bargraph::{CounterClock, Prescaler};
use crate::capture::PPS_CAPTURE;
use crate::melody::{tc2_setting, Buzzer, Tc2Prescaler};
use crate::settings::SettingsStore;

/// Timer1 free-running with input capture of the PPS reference.
pub struct MeasureTimer {
    tc1: TC1,
}

impl MeasureTimer {
    /// Take Timer1, stopped, in normal mode with the capture interrupt on.
    pub fn new(tc1: TC1) -> Self {
        tc1.tccr1a.reset();
        tc1.tccr1b.write(|w| w.icnc1().set_bit().ices1().set_bit().cs1().no_clock());
        tc1.timsk1.write(|w| w.icie1().set_bit());
        Self { tc1 }
    }
}

impl CounterClock for MeasureTimer {
    fn set_prescaler(&mut self, prescaler: Prescaler) {
        // Whole-register write; the capture edge and noise canceller go
        // back in with the clock select.
        self.tc1.tccr1b.write(|w| {
            let w = w.icnc1().set_bit().ices1().set_bit();
            match prescaler {
                Prescaler::Direct => w.cs1().direct(),
                Prescaler::Div8 => w.cs1().prescale_8(),
            }
        });
    }
}

/// Timer/Counter 1 input capture: latch the PPS edge.
#[avr_device::interrupt(atmega328p)]
fn TIMER1_CAPT() {
    // SAFETY: ICR1 is only read here, and reading it has no side effects.
    let icr1 = unsafe { (*TC1::ptr()).icr1.read().bits() };
    PPS_CAPTURE.record(icr1);
}

/// Piezo on OC2A.  Timer2 toggles the pin in CTC mode, so tones need no
/// interrupt.
pub struct Piezo {
    tc2: TC2,
    pin: Pin<Output, PB3>,
}

impl Piezo {
    pub fn new(tc2: TC2, pin: Pin<Output, PB3>) -> Self {
        let mut piezo = Self { tc2, pin };
        piezo.stop();
        piezo
    }
}

impl Buzzer for Piezo {
    fn start(&mut self, hz: u16) {
        let Some((prescaler, top)) = tc2_setting(hz) else {
            self.stop();
            return;
        };
        self.tc2
            .tccr2a
            .write(|w| w.com2a().match_toggle().wgm2().ctc());
        self.tc2.ocr2a.write(|w| w.bits(top));
        self.tc2.tcnt2.write(|w| w.bits(0));
        self.tc2.tccr2b.write(|w| match prescaler {
            Tc2Prescaler::Direct => w.cs2().direct(),
            Tc2Prescaler::Div8 => w.cs2().prescale_8(),
            Tc2Prescaler::Div32 => w.cs2().prescale_32(),
            Tc2Prescaler::Div64 => w.cs2().prescale_64(),
            Tc2Prescaler::Div128 => w.cs2().prescale_128(),
            Tc2Prescaler::Div256 => w.cs2().prescale_256(),
            Tc2Prescaler::Div1024 => w.cs2().prescale_1024(),
        });
    }

    fn stop(&mut self) {
        self.tc2.tccr2b.write(|w| w.cs2().no_clock());
        self.tc2.tccr2a.write(|w| w.com2a().disconnected());
        self.pin.set_low();
    }
}

impl SettingsStore for arduino_hal::Eeprom {
    type Error = arduino_hal::eeprom::OutOfBoundError;

    fn read(&self, offset: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        arduino_hal::Eeprom::read(self, offset, buf)
    }

    fn write_byte(&mut self, offset: u16, value: u8) {
        arduino_hal::Eeprom::write_byte(self, offset, value)
    }
}
