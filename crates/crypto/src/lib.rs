// Copyright (C) Microsoft Corporation. All rights reserved.

//! Streaming authenticated block-cipher engine.
//!
//! The crate is organised leaves first:
//!
//! - **Selector**: maps a cipher family, mode and key length to a validated
//!   [`CipherConfig`].
//! - **Counter**: [`Counter128`], the 128-bit block counter guarding CTR mode
//!   against keystream reuse.
//! - **Size**: [`SizeCalculator`], output sizing for update and final calls.
//! - **Context**: [`StreamCipherContext`], the init/update/final state machine,
//!   including tag staging for chunked GCM decryption.
//!
//! The actual cipher transforms are supplied by a [`CipherProvider`]. With the
//! default `use-openssl` feature the provider is backed by the `openssl` crate.

mod backend;
mod cipher;
mod config;
mod traits;

pub use backend::*;
pub use cipher::*;
pub use config::*;
use thiserror::Error;
pub use traits::*;

/// Errors reported by the engine.
///
/// Every variant carries a stable negative discriminant that is also the
/// result code used at the native boundary (see [`CryptoError::code`]).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum CryptoError {
    /// Unspecified failure.
    #[error("operation failed")]
    Fail = -1,
    /// The cipher backend reported an error.
    #[error("cipher backend error")]
    OpensslError = -2,
    /// Direction is neither encrypt nor decrypt.
    #[error("invalid operation mode")]
    InvalidOpMode = -5,
    /// Unknown or unsupported cipher family.
    #[error("invalid cipher")]
    InvalidCipher = -6,
    /// Mode not supported by the cipher family.
    #[error("invalid mode")]
    InvalidMode = -7,
    /// Key length does not match the cipher family.
    #[error("invalid key length")]
    InvalidKeyLen = -8,
    /// IV length is not legal for the mode.
    #[error("invalid IV length")]
    InvalidIvLen = -9,
    #[error("key is null")]
    KeyIsNull = -12,
    /// The mode requires an IV and none was supplied.
    #[error("IV is null")]
    IvIsNull = -13,
    /// An IV was supplied to a mode that takes none (ECB).
    #[error("mode takes no IV")]
    ModeTakesNoIv = -14,
    #[error("input is null")]
    InputIsNull = -16,
    #[error("output is null")]
    OutputIsNull = -17,
    /// The output buffer cannot hold the bytes the call will write.
    #[error("output too small")]
    OutputTooSmall = -18,
    #[error("input length exceeds 32-bit range")]
    InputTooLongInt32 = -19,
    #[error("output length exceeds 32-bit range")]
    OutputTooLongInt32 = -20,
    /// Final block of a non-AEAD decryption was malformed (usually bad padding).
    #[error("invalid cipher text")]
    InvalidCipherText = -21,
    #[error("input length is negative")]
    InputLenIsNegative = -24,
    #[error("output length is negative")]
    OutputLenIsNegative = -25,
    #[error("input offset is negative")]
    InputOffsetIsNegative = -26,
    #[error("output offset is negative")]
    OutputOffsetIsNegative = -27,
    #[error("input out of range")]
    InputOutOfRange = -28,
    #[error("output out of range")]
    OutputOutOfRange = -29,
    /// The context has no successful init behind it.
    #[error("context not initialized")]
    NotInitialized = -30,
    #[error("size query length is negative")]
    FinalSizeLenIsNegative = -31,
    /// Unpadded block modes only accept whole blocks.
    #[error("input not block aligned")]
    NotBlockAligned = -32,
    /// The CTR counter would leave the range its IV length allows.
    #[error("CTR counter overflow")]
    CtrModeOverflow = -33,
    /// A computed output size exceeds the 32-bit range.
    #[error("output size exceeds 32-bit range")]
    OutputSizeIntOverflow = -34,
    #[error("unexpected state")]
    UnexpectedState = -40,
    /// Tag length outside `0..=16`.
    #[error("invalid tag length")]
    InvalidTagLen = -71,
    #[error("tag is null")]
    TagIsNull = -72,
    /// AEAD authentication failed.
    #[error("tag invalid")]
    TagInvalid = -73,
    /// Unknown native handle.
    #[error("invalid handle")]
    InvalidHandle = -85,
    /// A panic was caught at the native boundary.
    #[error("panic")]
    Panic = i32::MIN,
}

impl CryptoError {
    /// Result code reported across the native boundary.
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<CryptoError> for i32 {
    fn from(err: CryptoError) -> Self {
        err.code()
    }
}
