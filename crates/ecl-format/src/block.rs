//! Block arithmetic for partial reads.
//!
//! Binary payloads are split into blocks of at most `elements_per_block`
//! elements, each block bracketed by a 4-byte head and tail length marker:
//!
//! ```text
//! [head][e0 e1 ... e999][tail][head][e1000 ...][tail] ...
//! ```
//!
//! Formatted payloads are written in fixed-width columns with a line break
//! after every full line and at the end of every block.
//!
//! These helpers translate a logical element offset into a physical position
//! relative to the start of the payload, so callers can seek straight to the
//! data they need without decoding the whole array.

use crate::types::SIZE_OF_MARKER;

/// Binary block layout of one array type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub elements_per_block: usize,
    pub element_size: usize,
}

/// A contiguous run of elements inside a single payload block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRun {
    /// Logical index of the first element of the run
    pub first_element: u64,
    /// Byte offset of the first element, relative to the payload start
    pub byte_offset: u64,
    /// Number of elements in the run
    pub len: u64,
}

impl BlockLayout {
    pub fn new(elements_per_block: usize, element_size: usize) -> Self {
        Self {
            elements_per_block: elements_per_block.max(1),
            element_size,
        }
    }

    /// Byte offset of logical element `n`, relative to the first head marker.
    ///
    /// All blocks before the one holding `n` are full, so each contributes a
    /// head and a tail marker; the block holding `n` contributes its head.
    pub fn physical_offset(&self, n: u64) -> u64 {
        let full_blocks = n / self.elements_per_block as u64;
        (2 * full_blocks + 1) * SIZE_OF_MARKER as u64 + n * self.element_size as u64
    }

    /// Length of the contiguous run starting at `n`, capped at `remaining`.
    pub fn run_length(&self, n: u64, remaining: u64) -> u64 {
        let per_block = self.elements_per_block as u64;
        (per_block - n % per_block).min(remaining)
    }

    /// Split the logical range `[start, start + count)` into per-block runs.
    pub fn runs(&self, start: u64, count: u64) -> Vec<BlockRun> {
        let mut runs = Vec::new();
        let end = start + count;
        let mut n = start;

        while n < end {
            let len = self.run_length(n, end - n);
            runs.push(BlockRun {
                first_element: n,
                byte_offset: self.physical_offset(n),
                len,
            });
            n += len;
        }

        runs
    }

    /// Number of payload bytes for `count` elements, markers included.
    pub fn size_on_disk(&self, count: u64) -> u64 {
        if count == 0 {
            return 0;
        }
        let per_block = self.elements_per_block as u64;
        let blocks = count.div_ceil(per_block);
        count * self.element_size as u64 + blocks * 2 * SIZE_OF_MARKER as u64
    }
}

/// Formatted column layout of one array type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattedLayout {
    pub elements_per_block: usize,
    pub columns: usize,
    pub width: usize,
}

impl FormattedLayout {
    pub fn new(elements_per_block: usize, columns: usize, width: usize) -> Self {
        Self {
            elements_per_block: elements_per_block.max(1),
            columns: columns.max(1),
            width,
        }
    }

    /// Characters occupied by one full block, line breaks included.
    pub fn block_size_on_disk(&self) -> u64 {
        let per_block = self.elements_per_block as u64;
        let lines = per_block.div_ceil(self.columns as u64);
        per_block * self.width as u64 + lines
    }

    /// Character offset of logical element `n`, relative to the payload start.
    pub fn char_offset(&self, n: u64) -> u64 {
        let per_block = self.elements_per_block as u64;
        let full_blocks = n / per_block;
        let rest = n % per_block;
        full_blocks * self.block_size_on_disk() + rest * self.width as u64 + rest / self.columns as u64
    }

    /// Number of payload characters for `count` elements.
    pub fn size_on_disk(&self, count: u64) -> u64 {
        let per_block = self.elements_per_block as u64;
        let full_blocks = count / per_block;
        let rest = count % per_block;
        full_blocks * self.block_size_on_disk()
            + rest * self.width as u64
            + rest.div_ceil(self.columns as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArrayType;

    #[test]
    fn test_physical_offset_first_block() {
        let layout = ArrayType::Real.block_layout();
        assert_eq!(layout.physical_offset(0), 4);
        assert_eq!(layout.physical_offset(1), 8);
        assert_eq!(layout.physical_offset(999), 4 + 999 * 4);
    }

    #[test]
    fn test_physical_offset_skips_markers() {
        let layout = ArrayType::Real.block_layout();
        // element 1000 is the first of block 1: head0 + 1000 values + tail0 + head1
        assert_eq!(layout.physical_offset(1000), 4 + 4000 + 4 + 4);
        assert_eq!(layout.physical_offset(2500), 5 * 4 + 2500 * 4);
    }

    #[test]
    fn test_runs_split_at_block_boundary() {
        let layout = BlockLayout::new(10, 4);
        let runs = layout.runs(7, 15);
        assert_eq!(runs.len(), 3);
        assert_eq!((runs[0].first_element, runs[0].len), (7, 3));
        assert_eq!((runs[1].first_element, runs[1].len), (10, 10));
        assert_eq!((runs[2].first_element, runs[2].len), (20, 2));
        assert_eq!(runs[1].byte_offset, 3 * 4 + 10 * 4);
    }

    #[test]
    fn test_size_on_disk_binary() {
        let layout = ArrayType::Inte.block_layout();
        assert_eq!(layout.size_on_disk(0), 0);
        assert_eq!(layout.size_on_disk(1), 12);
        assert_eq!(layout.size_on_disk(1000), 4008);
        assert_eq!(layout.size_on_disk(1001), 4008 + 12);
    }

    #[test]
    fn test_formatted_offsets() {
        let layout = ArrayType::Real.formatted_layout();
        assert_eq!(layout.block_size_on_disk(), 1000 * 17 + 250);
        assert_eq!(layout.char_offset(0), 0);
        assert_eq!(layout.char_offset(3), 51);
        // second line starts after four values and one line break
        assert_eq!(layout.char_offset(4), 69);
        assert_eq!(layout.char_offset(1001), 17250 + 17);
    }

    #[test]
    fn test_formatted_size_partial_line() {
        let layout = ArrayType::Inte.formatted_layout();
        assert_eq!(layout.size_on_disk(1), 13);
        assert_eq!(layout.size_on_disk(6), 73);
        assert_eq!(layout.size_on_disk(7), 73 + 13);
    }
}
