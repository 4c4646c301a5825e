//! Millisecond counter on Timer/Counter 0, used to time key clicks.
//!
//! Based on https://blog.rahix.de/005-avr-hal-millis/
//!
//! License assumed to be MIT based on https://github.com/Rahix/avr-hal/blob/main/examples/arduino-uno/src/bin/uno-millis.rs
use avr_device::interrupt::Mutex;
use core::cell;

// ╔═══════════╦══════════════╦═══════════════════╗
// ║ PRESCALER ║ TIMER_COUNTS ║ Overflow Interval ║
// ╠═══════════╬══════════════╬═══════════════════╣
// ║        64 ║          250 ║              1 ms ║
// ║       256 ║          125 ║              2 ms ║
// ╚═══════════╩══════════════╩═══════════════════╝
// Key clicks are tens of ms long, so 1 ms resolution.
const PRESCALER: u32 = 64;
const TIMER_COUNTS: u32 = 250;

const MILLIS_INCREMENT: u16 = (PRESCALER * TIMER_COUNTS / 16000) as _;

static MILLIS_COUNTER: Mutex<cell::Cell<u16>> = Mutex::new(cell::Cell::new(0));

/// Timer/Counter 0 Compare Match A interrupt service routine.
#[avr_device::interrupt(atmega328p)]
fn TIMER0_COMPA() {
    avr_device::interrupt::free(|cs| {
        let counter_cell = MILLIS_COUNTER.borrow(cs);
        counter_cell.set(counter_cell.get().wrapping_add(MILLIS_INCREMENT));
    })
}

/// Milliseconds since [`init`], wrapping every 65.5 s.
pub fn millis() -> u16 {
    avr_device::interrupt::free(|cs| MILLIS_COUNTER.borrow(cs).get())
}

/// Start TC0 in CTC mode with a compare-match interrupt every millisecond.
pub fn init(tc0: arduino_hal::pac::TC0) {
    tc0.tccr0a.write(|w| w.wgm0().ctc());
    tc0.ocr0a.write(|w| w.bits((TIMER_COUNTS - 1) as u8));
    tc0.tccr0b.write(|w| w.cs0().prescale_64());
    tc0.timsk0.write(|w| w.ocie0a().set_bit());

    avr_device::interrupt::free(|cs| {
        MILLIS_COUNTER.borrow(cs).set(0);
    });
}
