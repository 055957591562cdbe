//! Ready-priority bitmap
//!
//! One bit per priority level, most significant bit of word 0 is priority 0.
//! `leading_zeros` (CLZ on Cortex-M) finds the highest ready level in a
//! couple of instructions per word.

use crate::config::CFG_PRIO_MAX;
use crate::types::Prio;

const WORDS: usize = CFG_PRIO_MAX.div_ceil(32);

/// Bitmap of priority levels that have at least one ready task
#[derive(Debug, Clone, Copy)]
pub struct PrioBitmap {
    words: [u32; WORDS],
}

impl PrioBitmap {
    pub const fn new() -> Self {
        PrioBitmap { words: [0; WORDS] }
    }

    #[inline]
    fn locate(prio: Prio) -> (usize, u32) {
        debug_assert!((prio as usize) < CFG_PRIO_MAX);
        ((prio / 32) as usize, 1 << (31 - (prio % 32)))
    }

    #[inline]
    pub fn set(&mut self, prio: Prio) {
        let (word, mask) = Self::locate(prio);
        self.words[word] |= mask;
    }

    #[inline]
    pub fn clear(&mut self, prio: Prio) {
        let (word, mask) = Self::locate(prio);
        self.words[word] &= !mask;
    }

    #[inline]
    pub fn is_set(&self, prio: Prio) -> bool {
        let (word, mask) = Self::locate(prio);
        self.words[word] & mask != 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Highest (numerically lowest) ready priority.
    ///
    /// An empty bitmap reports the lowest level, where the idle task lives.
    #[inline]
    pub fn highest(&self) -> Prio {
        match self.words.iter().position(|&w| w != 0) {
            Some(i) => (i * 32) as Prio + self.words[i].leading_zeros() as Prio,
            None => (CFG_PRIO_MAX - 1) as Prio,
        }
    }
}

impl Default for PrioBitmap {
    fn default() -> Self {
        Self::new()
    }
}
