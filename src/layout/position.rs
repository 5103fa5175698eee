//! Row/slot position grammar.
//!
//! Buffer memory is viewed as 16-byte rows, each split into four 4-byte slots.
//! Every value occupies an inclusive [`Span`] of positions inside that grid.

/// Bytes in one row of the grid.
pub const BYTES_PER_ROW: usize = 16;

/// Bytes in one slot of a row.
pub const BYTES_PER_SLOT: usize = 4;

/// Rounds `value` up to the next multiple of `alignment`.
#[inline]
#[must_use]
pub const fn align_to(value: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}

/// A byte position expressed as `{row, byte_in_row}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    /// 16-byte row index.
    pub row: usize,
    /// Byte inside the row, in `0..16`.
    pub byte: usize,
}

impl Position {
    #[inline]
    #[must_use]
    pub const fn new(row: usize, byte: usize) -> Self {
        Self { row, byte }
    }

    /// Converts an absolute byte offset into a row position.
    #[inline]
    #[must_use]
    pub const fn from_offset(offset: usize) -> Self {
        Self {
            row: offset / BYTES_PER_ROW,
            byte: offset % BYTES_PER_ROW,
        }
    }

    /// Absolute byte offset of this position.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.row * BYTES_PER_ROW + self.byte
    }

    /// Carries a byte index that ran past the end of the row into the row count.
    #[inline]
    #[must_use]
    pub const fn carried(self) -> Self {
        if self.byte < BYTES_PER_ROW {
            return self;
        }
        Self {
            row: self.row + self.byte / BYTES_PER_ROW,
            byte: self.byte % BYTES_PER_ROW,
        }
    }

    #[inline]
    const fn next_row(self) -> Self {
        Self {
            row: self.row + 1,
            byte: 0,
        }
    }
}

/// Inclusive start/end positions of one value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Places a value of `size` bytes requiring `alignment` at the first legal
    /// position at or after `offset`.
    ///
    /// - the start is padded forward to a multiple of `alignment`
    /// - a value that fits in one row (`size <= 16`) never straddles two rows
    /// - the end position is carried into the next rows when it overflows
    #[must_use]
    pub fn place(offset: usize, size: usize, alignment: usize) -> Self {
        debug_assert!(size > 0, "cannot place a zero-sized value");

        let mut start = Position::from_offset(offset);

        let misalignment = start.byte % alignment.max(1);
        if misalignment != 0 {
            start.byte += alignment - misalignment;
            start = start.carried();
        }

        if size <= BYTES_PER_ROW && start.byte + size > BYTES_PER_ROW {
            start = start.next_row();
        }

        let tail = size % BYTES_PER_ROW;
        let end = Position {
            row: start.row + size.div_ceil(BYTES_PER_ROW) - 1,
            byte: start.byte + if tail == 0 { BYTES_PER_ROW - 1 } else { tail - 1 },
        }
        .carried();

        Self { start, end }
    }

    /// Span starting at `start_offset` and ending at `end_offset` (inclusive).
    #[inline]
    #[must_use]
    pub const fn from_offsets(start_offset: usize, end_offset: usize) -> Self {
        Self {
            start: Position::from_offset(start_offset),
            end: Position::from_offset(end_offset),
        }
    }

    #[inline]
    #[must_use]
    pub const fn start_offset(&self) -> usize {
        self.start.offset()
    }

    #[inline]
    #[must_use]
    pub const fn end_offset(&self) -> usize {
        self.end.offset()
    }

    /// Number of rows touched by the span.
    #[inline]
    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    /// Number of bytes between start and end, both included.
    #[inline]
    #[must_use]
    pub const fn byte_count(&self) -> usize {
        self.end_offset().abs_diff(self.start_offset()) + 1
    }

    /// Bytes from offset 0 up to the end of the last touched row.
    #[inline]
    #[must_use]
    pub const fn padded_byte_count(&self) -> usize {
        (self.end.row + 1) * BYTES_PER_ROW
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_round_trip() {
        for offset in [0, 3, 15, 16, 17, 255] {
            assert_eq!(Position::from_offset(offset).offset(), offset);
        }
        assert_eq!(Position::new(1, 20).carried(), Position::new(2, 4));
    }

    #[test]
    fn scalar_after_scalar_shares_row() {
        let span = Span::place(4, 4, 4);
        assert_eq!(span.start_offset(), 4);
        assert_eq!(span.end_offset(), 7);
        assert_eq!(span.row_count(), 1);
    }

    #[test]
    fn vec3_never_straddles_rows() {
        let span = Span::place(4, 12, 16);
        assert_eq!(span.start, Position::new(1, 0));
        assert_eq!(span.end, Position::new(1, 11));
        assert_eq!(span.byte_count(), 12);
        assert_eq!(span.padded_byte_count(), 32);
    }

    #[test]
    fn vec2_breaks_to_next_row_when_it_cannot_fit() {
        let span = Span::place(12, 8, 8);
        assert_eq!(span.start_offset(), 16);
        assert_eq!(span.end_offset(), 23);
    }

    #[test]
    fn multi_row_values_carry_their_end() {
        // mat4x2f: 32 bytes aligned to 8, starting mid-row
        let span = Span::place(8, 32, 8);
        assert_eq!(span.start_offset(), 8);
        assert_eq!(span.end_offset(), 39);
        assert_eq!(span.row_count(), 3);

        // mat3x3f: 48 bytes aligned to 16
        let span = Span::place(20, 48, 16);
        assert_eq!(span.start_offset(), 32);
        assert_eq!(span.end_offset(), 79);
    }

    #[test]
    fn align_to_rounds_up() {
        assert_eq!(align_to(0, 16), 0);
        assert_eq!(align_to(28, 16), 32);
        assert_eq!(align_to(28, 4), 28);
        assert_eq!(align_to(5, 1), 5);
    }
}
