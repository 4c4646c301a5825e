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
//! Centre-zero bargraph driven by the Timer1 measurement.
//!
//! A scale picks two things that have to stay in step: the Timer1 clock
//! select (how many counts a deviation is worth) and the glyph triple whose
//! marker shows the scale on screen.  [`Bargraph`] keeps the loaded scale as
//! state so the two can never drift apart.

use ufmt::{derive::uDebug, uDisplay, uWrite, Formatter};

use crate::glyphs::{self, GlyphTriple, BLANK};
use crate::lcd::{CharDisplay, LCD_COLS};

/// Default half-width of the bar, in bar units.
pub const MAX_BARS: u8 = 10;
/// First column of the bar region.
pub const BAR_COLUMN: u8 = 3;
/// LCD line the bar is drawn on.
pub const BAR_LINE: u8 = 0;

// Widest bar the display can hold from column 0: 7 cells either side of
// centre.
const MAX_SPAN: u8 = LCD_COLS - 1;
const MAX_WIDTH: usize = MAX_SPAN as usize;

/// Timer1 clock select, TCCR1B bits CS12..CS10.
#[derive(Clone, Copy, Debug, PartialEq, Eq, uDebug)]
#[repr(u8)]
pub enum Prescaler {
    /// clk/1, 16 MHz.
    Direct = 0b001,
    /// clk/8, 2 MHz.
    Div8 = 0b010,
}

impl Prescaler {
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Counter rate with the 16 MHz system clock.
    pub fn counter_hz(self) -> u32 {
        match self {
            Prescaler::Direct => 16_000_000,
            Prescaler::Div8 => 2_000_000,
        }
    }
}

/// Something that can set the measurement counter's clock.
pub trait CounterClock {
    fn set_prescaler(&mut self, prescaler: Prescaler);
}

/// Selectable bargraph sensitivity.  Factor 4 has no glyphs or divisor and
/// is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, uDebug)]
pub enum Scale {
    Zero,
    Two,
    Five,
    Eight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uDebug)]
pub struct UnsupportedScale(pub u8);

impl TryFrom<u8> for Scale {
    type Error = UnsupportedScale;

    fn try_from(factor: u8) -> Result<Self, Self::Error> {
        match factor {
            0 => Ok(Scale::Zero),
            2 => Ok(Scale::Two),
            5 => Ok(Scale::Five),
            8 => Ok(Scale::Eight),
            other => Err(UnsupportedScale(other)),
        }
    }
}

impl Scale {
    pub const ALL: [Scale; 4] = [Scale::Zero, Scale::Two, Scale::Five, Scale::Eight];

    pub fn factor(self) -> u8 {
        match self {
            Scale::Zero => 0,
            Scale::Two => 2,
            Scale::Five => 5,
            Scale::Eight => 8,
        }
    }

    pub fn prescaler(self) -> Prescaler {
        match self {
            Scale::Zero => Prescaler::Direct,
            Scale::Two | Scale::Five | Scale::Eight => Prescaler::Div8,
        }
    }

    pub fn glyphs(self) -> &'static GlyphTriple {
        match self {
            Scale::Zero => &glyphs::CARAT,
            Scale::Two => &glyphs::TWO,
            Scale::Five => &glyphs::FIVE,
            Scale::Eight => &glyphs::EIGHT,
        }
    }

    /// Timer counts represented by one bar unit.
    pub fn counts_per_bar(self) -> i32 {
        match self {
            Scale::Zero => 1,
            other => i32::from(other.factor()),
        }
    }

    /// The scale after this one, wrapping around.
    pub fn next(self) -> Scale {
        match self {
            Scale::Zero => Scale::Two,
            Scale::Two => Scale::Five,
            Scale::Five => Scale::Eight,
            Scale::Eight => Scale::Zero,
        }
    }
}

impl uDisplay for Scale {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        uDisplay::fmt(&self.factor(), f)
    }
}

/// Bargraph failures: a scale that does not exist, or the display itself.
#[derive(Debug, PartialEq, Eq, uDebug)]
pub enum Error<E> {
    UnsupportedScale(u8),
    Display(E),
}

impl<E> From<UnsupportedScale> for Error<E> {
    fn from(e: UnsupportedScale) -> Self {
        Error::UnsupportedScale(e.0)
    }
}

/// The character codes of one rendered bar, left to right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarFrame {
    cells: [u8; MAX_WIDTH],
    len: usize,
}

impl BarFrame {
    /// Lay out `value` on a bar `max_bars` units either side of centre.
    ///
    /// The centre cell holds the centre tick and one unit either side, every
    /// other cell holds two units.  A value past the ends is pinned to the
    /// end.
    pub fn new(value: i16, max_bars: u8) -> Self {
        let max_bars = max_bars.min(MAX_SPAN);
        let limit = i16::from(max_bars);
        let value = value.clamp(-limit, limit);

        let side = Self::cells_per_side(max_bars);
        let mut cells = [BLANK; MAX_WIDTH];
        let len = 2 * side + 1;

        cells[side] = match value.signum() {
            0 => glyphs::SLOT_CENTRE,
            1 => glyphs::SLOT_CENTRE_RIGHT,
            _ => glyphs::SLOT_CENTRE_LEFT,
        };

        let rest = usize::from(value.unsigned_abs()).saturating_sub(1);
        let full = rest / 2;
        let right = value > 0;
        let at = |i: usize| if right { side + i } else { side - i };

        for i in 1..=full {
            cells[at(i)] = glyphs::SLOT_FULL;
        }
        if rest % 2 == 1 {
            cells[at(full + 1)] = if right {
                glyphs::SLOT_HALF_RIGHT
            } else {
                glyphs::SLOT_HALF_LEFT
            };
        }

        Self { cells, len }
    }

    pub fn cells_per_side(max_bars: u8) -> usize {
        usize::from(max_bars.min(MAX_SPAN).saturating_sub(1)).div_ceil(2)
    }

    /// Index of the centre cell within [`BarFrame::as_bytes`].
    pub fn centre(&self) -> usize {
        self.len / 2
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.cells[..self.len]
    }
}

/// Where on the display the bar lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarLayout {
    pub column: u8,
    pub row: u8,
}

impl Default for BarLayout {
    fn default() -> Self {
        Self {
            column: BAR_COLUMN,
            row: BAR_LINE,
        }
    }
}

impl BarLayout {
    /// The largest bar no wider than `max_bars` that fits between the start
    /// column and the right edge of the display.
    pub fn fit(&self, max_bars: u8) -> u8 {
        let side = LCD_COLS.saturating_sub(self.column).saturating_sub(1) / 2;
        max_bars.min(2 * side + 1)
    }

    /// Display column of the centre cell for a bar of `max_bars`.
    pub fn centre_column(&self, max_bars: u8) -> u8 {
        let side = BarFrame::cells_per_side(self.fit(max_bars)) as u8;
        self.column.saturating_add(side)
    }

    fn on_display(&self) -> bool {
        self.column < LCD_COLS
    }
}

pub struct Bargraph<C> {
    counter: C,
    layout: BarLayout,
    scale: Option<Scale>,
}

impl<C: CounterClock> Bargraph<C> {
    pub fn new(counter: C, layout: BarLayout) -> Self {
        Self {
            counter,
            layout,
            scale: None,
        }
    }

    /// The scale whose glyphs are resident, if any.
    pub fn scale(&self) -> Option<Scale> {
        self.scale
    }

    pub fn layout(&self) -> BarLayout {
        self.layout
    }

    /// Switch to the scale with factor `factor` (0, 2, 5 or 8).  Nothing is
    /// touched when the factor is not supported.
    pub fn configure<D: CharDisplay>(
        &mut self,
        display: &mut D,
        factor: u8,
    ) -> Result<Scale, Error<D::Error>> {
        let scale = Scale::try_from(factor)?;
        self.select(display, scale)?;
        Ok(scale)
    }

    /// Load the glyphs of `scale` into slots 1-3, along with the outer-cell
    /// glyphs, then set the counter clock for it.  The clock is left alone
    /// when a glyph write fails.  Whatever is on screen must be redrawn
    /// afterwards.
    pub fn select<D: CharDisplay>(
        &mut self,
        display: &mut D,
        scale: Scale,
    ) -> Result<(), Error<D::Error>> {
        // Until the triple is fully written the screen shows a mix.
        self.scale = None;
        load_base_glyphs(display).map_err(Error::Display)?;
        let triple = scale.glyphs();
        display
            .create_char(glyphs::SLOT_CENTRE, &triple.centre)
            .map_err(Error::Display)?;
        display
            .create_char(glyphs::SLOT_CENTRE_RIGHT, &triple.centre_right)
            .map_err(Error::Display)?;
        display
            .create_char(glyphs::SLOT_CENTRE_LEFT, &triple.centre_left)
            .map_err(Error::Display)?;
        self.counter.set_prescaler(scale.prescaler());
        self.scale = Some(scale);
        Ok(())
    }

    /// Draw `value` as a bar `max_bars` units either side of centre, cut
    /// down to what fits on the display.  The whole bar region is rewritten
    /// every time.
    pub fn render<D: CharDisplay>(
        &self,
        display: &mut D,
        value: i16,
        max_bars: u8,
    ) -> Result<BarFrame, D::Error> {
        let frame = BarFrame::new(value, self.layout.fit(max_bars));
        if self.layout.on_display() {
            display.set_cursor(self.layout.column, self.layout.row)?;
            display.write_bytes(frame.as_bytes())?;
        }
        Ok(frame)
    }
}

/// Load the outer-cell glyphs into slots 4-6.
pub fn load_base_glyphs<D: CharDisplay>(display: &mut D) -> Result<(), D::Error> {
    for (slot, glyph) in glyphs::BASE.iter() {
        display.create_char(*slot, glyph)?;
    }
    Ok(())
}
