//! Precomputed powers for fixed-window exponentiation, in scrambled layout.
//!
//! Entry `j` (of `2^w`) has its limb `i` stored at `i·2^w + j`, so one row of
//! the table holds the same limb of every entry. A lookup reads every slot of
//! every row and keeps the wanted one by masking: the memory access pattern
//! does not depend on the (secret) index.

use core::mem::size_of;

use subtle::ConstantTimeEq;

use crate::Digit;
use crate::ct::mask;

/// Assumed cache line size of the target.
pub const CACHE_LINE_BYTES: usize = 64;

/// Widest window whose rows (`2^w` digits) fit into one cache line, at least 1.
pub const fn max_cache_safe_width() -> usize {
    let entries = CACHE_LINE_BYTES / size_of::<Digit>();
    let mut width = 1;
    while (2 << width) <= entries {
        width += 1;
    }
    width
}

pub(crate) struct Table<'a> {
    slots: &'a mut [Digit],
    limbs: usize,
    width: usize,
}

impl<'a> Table<'a> {
    /// `slots` must hold `limbs << width` digits.
    pub fn new(slots: &'a mut [Digit], limbs: usize, width: usize) -> Self {
        debug_assert_eq!(slots.len(), limbs << width);
        Self { slots, limbs, width }
    }

    pub fn entries(&self) -> usize {
        1 << self.width
    }

    /// Store `entry` at public position `j`.
    pub fn scatter(&mut self, j: usize, entry: &[Digit]) {
        debug_assert!(j < self.entries());
        debug_assert_eq!(entry.len(), self.limbs);
        for (i, &digit) in entry.iter().enumerate() {
            self.slots[(i << self.width) + j] = digit;
        }
    }

    /// Load the entry at secret position `index`, touching every slot.
    pub fn gather(&self, out: &mut [Digit], index: usize) {
        debug_assert_eq!(out.len(), self.limbs);
        crate::ct::count_selection();
        for (row, digit) in self.slots.chunks_exact(self.entries()).zip(out.iter_mut()) {
            *digit = row.iter().enumerate().fold(0, |acc, (j, &slot)| {
                acc | (slot & mask(j.ct_eq(&index)))
            });
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cache_safe_width() {
        match size_of::<Digit>() {
            8 => assert_eq!(max_cache_safe_width(), 3),
            4 => assert_eq!(max_cache_safe_width(), 4),
            _ => unreachable!(),
        }
    }

    #[test]
    fn scrambled_layout() {
        let mut slots = [0; 3 << 2];
        let mut table = Table::new(&mut slots, 3, 2);
        for j in 0..4 {
            let entry = [10 * j as Digit, 10 * j as Digit + 1, 10 * j as Digit + 2];
            table.scatter(j, &entry);
        }

        let mut out = [0; 3];
        for j in 0..4 {
            table.gather(&mut out, j);
            assert_eq!(out, [10 * j as Digit, 10 * j as Digit + 1, 10 * j as Digit + 2]);
        }

        // row i holds limb i of all entries
        assert_eq!(&slots[4..8], &[1, 11, 21, 31]);
    }
}
