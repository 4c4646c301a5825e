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
//! Custom character bitmaps for the centre-zero bargraph.
//!
//! Every glyph is 8 rows of 5 pixels, low five bits of each byte, top row
//! first.  The centre cell of the bar carries a scale marker in the upper
//! rows and up to one tick either side of the centre tick in the lower rows.

/// One HD44780 character-generator pattern.
pub type Glyph = [u8; 8];

/// The three patterns a scale puts into slots 1, 2 and 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphTriple {
    pub centre: Glyph,
    pub centre_right: Glyph,
    pub centre_left: Glyph,
}

/// CGRAM slot of the bare centre marker.
pub const SLOT_CENTRE: u8 = 1;
/// CGRAM slot of the centre marker with one tick to the right.
pub const SLOT_CENTRE_RIGHT: u8 = 2;
/// CGRAM slot of the centre marker with one tick to the left.
pub const SLOT_CENTRE_LEFT: u8 = 3;
/// Outer cell on the right of centre, inner tick only.
pub const SLOT_HALF_RIGHT: u8 = 4;
/// Outer cell on the left of centre, inner tick only.
pub const SLOT_HALF_LEFT: u8 = 5;
/// Outer cell with both ticks.
pub const SLOT_FULL: u8 = 6;

/// HD44780 ROM blank.
pub const BLANK: u8 = b' ';

// Scale 0: caret over the centre tick.
pub const CARAT: GlyphTriple = GlyphTriple {
    centre: [
        0b00000, 0b00000, 0b01010, 0b00100, 0b00000, 0b00100, 0b00100, 0b00100,
    ],
    centre_right: [
        0b00000, 0b00000, 0b01010, 0b00100, 0b00001, 0b00101, 0b00101, 0b00101,
    ],
    centre_left: [
        0b00000, 0b00000, 0b01010, 0b00100, 0b10000, 0b10100, 0b10100, 0b10100,
    ],
};

// Scale 2: small "2" over the centre tick.
pub const TWO: GlyphTriple = GlyphTriple {
    centre: [
        0b00110, 0b01010, 0b00100, 0b01110, 0b00000, 0b00100, 0b00100, 0b00100,
    ],
    centre_right: [
        0b00110, 0b01010, 0b00100, 0b01110, 0b00001, 0b00101, 0b00101, 0b00101,
    ],
    centre_left: [
        0b00110, 0b01010, 0b00100, 0b01110, 0b10000, 0b10100, 0b10100, 0b10100,
    ],
};

// Scale 5.
pub const FIVE: GlyphTriple = GlyphTriple {
    centre: [
        0b01110, 0b01100, 0b00010, 0b01100, 0b00000, 0b00100, 0b00100, 0b00100,
    ],
    centre_right: [
        0b01110, 0b01100, 0b00010, 0b01100, 0b00001, 0b00101, 0b00101, 0b00101,
    ],
    centre_left: [
        0b01110, 0b01100, 0b00010, 0b01100, 0b10000, 0b10100, 0b10100, 0b10100,
    ],
};

// Scale 8.  The digit runs one row deeper, so the side tick starts on row 4
// and the centre tick is broken on row 5.
pub const EIGHT: GlyphTriple = GlyphTriple {
    centre: [
        0b00100, 0b01010, 0b00100, 0b01010, 0b00100, 0b00000, 0b00100, 0b00100,
    ],
    centre_right: [
        0b00100, 0b01010, 0b00100, 0b01010, 0b00101, 0b00001, 0b00101, 0b00101,
    ],
    centre_left: [
        0b00100, 0b01010, 0b00100, 0b01010, 0b10100, 0b10000, 0b10100, 0b10100,
    ],
};

/// Outer cells, shared by every scale.  Ticks sit on columns 1 and 3 so the
/// spacing carries on from the centre cell's columns 0, 2 and 4.
pub const HALF_RIGHT: Glyph = [0, 0, 0, 0, 0b01000, 0b01000, 0b01000, 0b01000];
pub const HALF_LEFT: Glyph = [0, 0, 0, 0, 0b00010, 0b00010, 0b00010, 0b00010];
pub const FULL: Glyph = [0, 0, 0, 0, 0b01010, 0b01010, 0b01010, 0b01010];

/// The outer-cell glyphs with the slot each one is loaded into.
pub const BASE: [(u8, Glyph); 3] = [
    (SLOT_HALF_RIGHT, HALF_RIGHT),
    (SLOT_HALF_LEFT, HALF_LEFT),
    (SLOT_FULL, FULL),
];
