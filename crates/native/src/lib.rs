// Copyright (C) Microsoft Corporation. All rights reserved.

//! Native C API for the streaming block-cipher engine.
//!
//! Contexts live in a global handle table and are addressed by opaque 32-bit
//! handles. Every exported function returns either a non-negative byte count
//! or a negative [`CbError`] code, and never unwinds across the boundary.
//!
//! # Architecture
//!
//! - [`handle_table`] owns the contexts
//! - [`utils`] validates raw pointers, offsets and ranges
//! - the `cb_block_cipher_*` functions map boundary arguments onto
//!   [`StreamCipherContext`] calls

mod block_cipher;
mod handle_table;
mod utils;

use std::ops::Deref;
use std::panic::*;
use std::sync::*;

pub use block_cipher::*;
use cipherbridge_crypto::*;
use handle_table::*;
use utils::*;

/// Opaque handle to a cipher context.
///
/// Zero is never issued.
#[repr(transparent)]
#[derive(Debug, Eq, Hash, PartialEq, Copy, Clone, Default)]
pub struct CbHandle(u32);

impl Deref for CbHandle {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Error type returned across the boundary.
type CbError = CryptoError;

/// The context type held behind each handle.
type NativeCipher = StreamCipherContext<DefaultCipherProvider>;

/// Global handle table.
///
/// Handles stay valid until freed or the process exits.
static HANDLE_TABLE: LazyLock<HandleTable<NativeCipher>> = LazyLock::new(HandleTable::default);

/// Runs `f` at the ABI boundary.
///
/// Panics are caught and reported as [`CbError::Panic`]. Errors become their
/// negative code; success returns the closure's value.
pub(crate) fn abi_boundary<F: FnOnce() -> Result<i32, CbError> + UnwindSafe>(f: F) -> i32 {
    match catch_unwind(f) {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            tracing::debug!(?err, code = err.code(), "native call failed");
            err.code()
        }
        Err(_) => {
            tracing::error!("panic caught at the native boundary");
            CbError::Panic.code()
        }
    }
}

/// Copies the backend library's version string into `out`.
///
/// @param[out] out Buffer receiving the version bytes (not NUL terminated)
/// @param[in] out_len Capacity of `out`
///
/// @return the number of bytes written, or a negative error code.
///
/// @internal
/// # Safety
/// `out` must be valid for `out_len` bytes of writes.
#[unsafe(no_mangle)]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_openssl_version(out: *mut u8, out_len: usize) -> i32 {
    abi_boundary(|| {
        let provider = DefaultCipherProvider::default();
        let version = provider.version().as_bytes();

        // SAFETY: the caller guarantees `out` spans `out_len` bytes.
        let out = unsafe { mut_slice(out, out_len, CbError::OutputIsNull)? };
        let out = out.get_mut(..version.len()).ok_or(CbError::OutputTooSmall)?;
        out.copy_from_slice(version);

        boundary_len(version.len())
    })
}
