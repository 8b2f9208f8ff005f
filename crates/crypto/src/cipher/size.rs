// Copyright (C) Microsoft Corporation. All rights reserved.

//! Output sizing for update and final calls.

use super::*;

/// Pure output-size arithmetic for one configured context.
///
/// Every result is bounded by [`EngineConfig::max_boundary_len`]; larger
/// values are reported as [`CryptoError::OutputSizeIntOverflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeCalculator {
    mode: CipherMode,
    block_size: usize,
    padding: Padding,
    direction: Direction,
    tag_len: usize,
    max_len: usize,
}

impl SizeCalculator {
    pub fn new(
        config: &CipherConfig,
        direction: Direction,
        tag_len: usize,
        engine: &EngineConfig,
    ) -> Self {
        Self {
            mode: config.mode(),
            block_size: config.block_size(),
            padding: config.padding(),
            direction,
            tag_len,
            max_len: engine.max_boundary_len,
        }
    }

    /// Upper bound on the bytes `update` writes for `len` input bytes after
    /// `processed` bytes have gone through the context.
    pub fn update_size(&self, processed: u64, len: usize) -> Result<usize, CryptoError> {
        let size = if self.mode.is_streaming() {
            len
        } else {
            let pending = if self.padding.is_padded() {
                self.pending(processed)
            } else {
                0
            };
            let total = len
                .checked_add(pending)
                .ok_or(CryptoError::OutputSizeIntOverflow)?;
            let whole = self.block_size * (total / self.block_size);
            // An aligned padded decryption withholds its last block again.
            if self.withholds() && whole > 0 && whole == total {
                whole - self.block_size
            } else {
                whole
            }
        };
        self.bounded(size)
    }

    /// Output size of an `update` of `len` bytes followed by `final`.
    pub fn final_size(&self, processed: u64, len: usize) -> Result<usize, CryptoError> {
        let len = if self.mode.is_streaming() {
            if !self.mode.is_aead() {
                return self.bounded(len);
            }
            match self.direction {
                Direction::Encrypt => len
                    .checked_add(self.tag_len)
                    .ok_or(CryptoError::OutputSizeIntOverflow)?,
                Direction::Decrypt => len.saturating_sub(self.tag_len),
            }
        } else {
            len
        };

        if !self.padding.is_padded() {
            return self.bounded(len);
        }

        let total = len
            .checked_add(self.pending(processed))
            .ok_or(CryptoError::OutputSizeIntOverflow)?;
        let left_over = total % self.block_size;
        let size = if left_over == 0 {
            match self.direction {
                Direction::Encrypt => total.checked_add(self.block_size),
                Direction::Decrypt => Some(total),
            }
        } else {
            (total - left_over).checked_add(self.block_size)
        };
        self.bounded(size.ok_or(CryptoError::OutputSizeIntOverflow)?)
    }

    /// Smallest output buffer `final` accepts.
    pub fn final_minimum(&self, processed: u64) -> Result<usize, CryptoError> {
        match (self.mode.is_aead(), self.direction) {
            (true, Direction::Encrypt) => Ok(self.tag_len),
            (true, Direction::Decrypt) => Ok(0),
            (false, _) if self.mode.is_streaming() => Ok(0),
            (false, _) => self.final_size(processed, 0),
        }
    }

    /// Bytes held by the backend that a later call may still emit.
    ///
    /// Padded decryption keeps the last complete block back until it knows
    /// whether that block carries the padding, so an aligned non-zero
    /// offset counts as one whole pending block.
    fn pending(&self, processed: u64) -> usize {
        let partial = (processed % self.block_size as u64) as usize;
        if self.withholds() && partial == 0 && processed > 0 {
            self.block_size
        } else {
            partial
        }
    }

    fn withholds(&self) -> bool {
        self.direction == Direction::Decrypt && self.padding.is_padded()
    }

    fn bounded(&self, size: usize) -> Result<usize, CryptoError> {
        if size > self.max_len {
            Err(CryptoError::OutputSizeIntOverflow)
        } else {
            Ok(size)
        }
    }
}
