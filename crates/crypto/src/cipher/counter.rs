// Copyright (C) Microsoft Corporation. All rights reserved.

//! 128-bit CTR block counter.

use zeroize::Zeroize;
use zeroize::ZeroizeOnDrop;

/// Width of a counter block in bytes.
pub const COUNTER_SIZE: usize = 16;

/// Wraparound state of a [`Counter128`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i8)]
pub enum Rolled {
    Underflow = -1,
    #[default]
    None = 0,
    Overflow = 1,
}

/// Number of blocks a CTR stream has consumed, tracked as two 64-bit words.
///
/// The IV passed to [`Counter128::init`] is the fixed prefix of the counter
/// block; the remaining `16 - iv_len` bytes are the part OpenSSL increments.
/// The counter is valid while the consumed block count fits in those bytes:
///
/// | IV length | Limit |
/// |-----------|-------|
/// | `< 8`     | never valid |
/// | 8         | high word stays zero |
/// | 9..=15    | high word zero and low word `< 2^(8 * (16 - iv_len))` |
/// | 16        | none |
///
/// [`rolled`](Self::rolled) reports whether the most recent `add` or `sub`
/// wrapped; each of them clears it before doing its arithmetic.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct Counter128 {
    high: u64,
    low: u64,
    original: [u8; COUNTER_SIZE],
    iv_len: usize,
    #[zeroize(skip)]
    rolled: Rolled,
    limit: u64,
}

impl Counter128 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the counter for a fresh stream. `iv` longer than 16 bytes is
    /// truncated.
    pub fn init(&mut self, iv: &[u8]) {
        let iv_len = iv.len().min(COUNTER_SIZE);

        self.original.zeroize();
        self.original[..iv_len].copy_from_slice(&iv[..iv_len]);
        self.iv_len = iv_len;
        self.high = 0;
        self.low = 0;
        self.rolled = Rolled::None;
        self.limit = if iv_len > 8 && iv_len < COUNTER_SIZE {
            1u64 << (8 * (COUNTER_SIZE - iv_len))
        } else {
            0
        };
    }

    /// Adds `(high, low)` to the magnitude with carry from the low word.
    ///
    /// Sets [`Rolled::Overflow`] if the 128-bit value wraps.
    pub fn add(&mut self, high: u64, low: u64) {
        self.rolled = Rolled::None;
        let (new_low, carry) = self.low.overflowing_add(low);
        let (partial, wrap_a) = self.high.overflowing_add(high);
        let (new_high, wrap_b) = partial.overflowing_add(u64::from(carry));

        self.low = new_low;
        self.high = new_high;
        if wrap_a || wrap_b {
            self.rolled = Rolled::Overflow;
        }
    }

    /// Subtracts `(high, low)` from the magnitude with borrow from the low word.
    ///
    /// Sets [`Rolled::Underflow`] if the 128-bit value wraps below zero.
    pub fn sub(&mut self, high: u64, low: u64) {
        self.rolled = Rolled::None;
        let (new_low, borrow) = self.low.overflowing_sub(low);
        let (partial, wrap_a) = self.high.overflowing_sub(high);
        let (new_high, wrap_b) = partial.overflowing_sub(u64::from(borrow));

        self.low = new_low;
        self.high = new_high;
        if wrap_a || wrap_b {
            self.rolled = Rolled::Underflow;
        }
    }

    pub fn valid(&self) -> bool {
        if self.iv_len < 8 || self.rolled != Rolled::None {
            return false;
        }
        match self.iv_len {
            COUNTER_SIZE => true,
            8 => self.high == 0,
            _ => self.high == 0 && self.low < self.limit,
        }
    }

    /// Sets the magnitude directly and clears the rolled flag. No validation.
    pub fn seek(&mut self, high: u64, low: u64) {
        self.high = high;
        self.low = low;
        self.rolled = Rolled::None;
    }

    /// Returns the magnitude to zero and clears the rolled flag.
    pub fn reset(&mut self) {
        self.seek(0, 0);
    }

    /// Consumed blocks as `(high, low)`.
    pub fn magnitude(&self) -> (u64, u64) {
        (self.high, self.low)
    }

    pub fn rolled(&self) -> Rolled {
        self.rolled
    }

    pub fn iv_len(&self) -> usize {
        self.iv_len
    }

    /// Block-count limit for IV lengths 9..=15, zero otherwise.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// The IV zero-extended to a full counter block; this is the initial
    /// counter block handed to the backend.
    pub fn initial_block(&self) -> &[u8; COUNTER_SIZE] {
        &self.original
    }
}

impl std::fmt::Debug for Counter128 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counter128")
            .field("high", &self.high)
            .field("low", &self.low)
            .field("iv_len", &self.iv_len)
            .field("rolled", &self.rolled)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}
