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
//! Pulse-per-second capture and the phase meter feeding the bargraph.
//!
//! Timer1 runs free and its input-capture unit latches the count on every
//! PPS edge.  The capture interrupt stores that count here; the main loop
//! turns the interval between consecutive edges into a deviation from the
//! nominal count per second.

use core::cell::Cell;
use core::convert::Infallible;

use critical_section::Mutex;

use crate::bargraph::{Prescaler, Scale};

/// One latched Timer1 count and the number of the edge that produced it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capture {
    pub count: u16,
    pub seq: u16,
}

/// Capture shared between the interrupt handler and the main loop.  The
/// handler is the only writer.
pub struct CaptureCell {
    latest: Mutex<Cell<Option<Capture>>>,
}

impl CaptureCell {
    pub const fn new() -> Self {
        Self {
            latest: Mutex::new(Cell::new(None)),
        }
    }

    /// Store a newly latched count.  Called from the capture interrupt.
    pub fn record(&self, count: u16) {
        critical_section::with(|cs| {
            let cell = self.latest.borrow(cs);
            let seq = cell.get().map_or(0, |c| c.seq.wrapping_add(1));
            cell.set(Some(Capture { count, seq }));
        })
    }

    /// The most recent capture, read in one piece.
    pub fn latest(&self) -> Option<Capture> {
        critical_section::with(|cs| self.latest.borrow(cs).get())
    }

    pub fn clear(&self) {
        critical_section::with(|cs| self.latest.borrow(cs).set(None))
    }
}

impl Default for CaptureCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Written by the TIMER1_CAPT handler.
pub static PPS_CAPTURE: CaptureCell = CaptureCell::new();

/// Counts the 16-bit timer advances by in one second, modulo 2^16.
pub fn nominal_interval(prescaler: Prescaler) -> u16 {
    (prescaler.counter_hz() % 0x1_0000) as u16
}

pub struct PhaseMeter<'a> {
    source: &'a CaptureCell,
    last: Option<Capture>,
    nominal: u16,
    counts_per_bar: i32,
}

impl<'a> PhaseMeter<'a> {
    pub fn new(source: &'a CaptureCell, scale: Scale) -> Self {
        Self {
            source,
            last: None,
            nominal: nominal_interval(scale.prescaler()),
            counts_per_bar: scale.counts_per_bar(),
        }
    }

    /// Follow a scale change.  Intervals measured at the old rate are
    /// meaningless, so measurement restarts at the next edge.
    pub fn set_scale(&mut self, scale: Scale) {
        self.nominal = nominal_interval(scale.prescaler());
        self.counts_per_bar = scale.counts_per_bar();
        self.last = None;
        self.source.clear();
    }

    /// Deviation of the last second, in bar units.
    ///
    /// Returns `WouldBlock` until two consecutive edges have been seen.  If
    /// edges were missed in between, the interval spans more than a second
    /// and is thrown away.
    pub fn sample(&mut self) -> nb::Result<i16, Infallible> {
        let Some(now) = self.source.latest() else {
            return Err(nb::Error::WouldBlock);
        };
        let Some(prev) = self.last.replace(now) else {
            return Err(nb::Error::WouldBlock);
        };
        if now.seq == prev.seq || now.seq != prev.seq.wrapping_add(1) {
            return Err(nb::Error::WouldBlock);
        }
        let counts = now.count.wrapping_sub(prev.count).wrapping_sub(self.nominal) as i16;
        Ok(self.to_bars(counts))
    }

    fn to_bars(&self, counts: i16) -> i16 {
        let bars = i32::from(counts) / self.counts_per_bar;
        bars.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
    }
}
