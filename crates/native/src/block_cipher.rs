// Copyright (C) Microsoft Corporation. All rights reserved.

use zeroize::Zeroizing;

use super::*;

/// Runs `f` on the context behind `handle` while holding its lock.
fn with_cipher<R>(
    handle: CbHandle,
    f: impl FnOnce(&mut NativeCipher) -> Result<R, CbError>,
) -> Result<R, CbError> {
    let cipher = HANDLE_TABLE.get(handle)?;
    let mut cipher = cipher.lock();
    f(&mut cipher)
}

/// Allocates an unconfigured cipher context.
///
/// @param[in] cipher_id Cipher family identifier
/// @param[in] mode_id Mode identifier
/// @param[in] padding Greater than zero selects PKCS#7 padding (ECB and CBC only)
/// @param[out] handle Receives the new context handle
///
/// @return 0 on success, or a negative error code on failure.
///
/// @internal
/// # Safety
/// `handle` must be null or valid for a write.
#[unsafe(no_mangle)]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_block_cipher_new(
    cipher_id: i32,
    mode_id: i32,
    padding: i32,
    handle: *mut CbHandle,
) -> i32 {
    abi_boundary(|| {
        let family = CipherFamily::try_from(cipher_id)?;
        let mode = CipherMode::try_from(mode_id)?;
        validate_ptr(handle, CbError::OutputIsNull)?;

        let cipher = NativeCipher::allocate(family, mode, Padding::from_flag(padding));
        let new_handle = HANDLE_TABLE.alloc_handle(cipher)?;
        assign_ptr(handle, new_handle)?;

        tracing::debug!(handle = *new_handle, ?family, ?mode, "cipher context allocated");
        Ok(0)
    })
}

/// Keys a context for one direction.
///
/// @param[in] handle Context handle
/// @param[in] direction 1 to encrypt, 2 to decrypt
/// @param[in] key Key bytes
/// @param[in] key_len Key length in bytes
/// @param[in] iv IV bytes, or null for none
/// @param[in] iv_len IV length in bytes (ignored when `iv` is null)
/// @param[in] tag_len GCM tag length in bytes (0 to 16, ignored by other modes)
///
/// @return 0 on success, or a negative error code on failure. On failure the
/// context is left unconfigured.
///
/// @internal
/// # Safety
/// `key` must be valid for `key_len` bytes and a non-null `iv` for `iv_len`.
#[unsafe(no_mangle)]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_block_cipher_init(
    handle: CbHandle,
    direction: i32,
    key: *const u8,
    key_len: usize,
    iv: *const u8,
    iv_len: usize,
    tag_len: i32,
) -> i32 {
    abi_boundary(|| {
        // SAFETY: the caller guarantees the key extent.
        let key = unsafe { const_slice(key, key_len, CbError::KeyIsNull)? };
        let tag_len = non_negative(tag_len, CbError::InvalidTagLen)?;
        let direction = Direction::try_from(direction)?;
        let iv = if iv.is_null() {
            None
        } else {
            // SAFETY: non-null and the caller guarantees the extent.
            Some(unsafe { const_slice(iv, iv_len, CbError::IvIsNull)? })
        };

        with_cipher(handle, |cipher| cipher.init(direction, key, iv, tag_len))?;
        Ok(0)
    })
}

/// Returns the block size of a configured context.
///
/// @return the block size in bytes, or a negative error code on failure.
#[unsafe(no_mangle)]
#[allow(unsafe_code)]
pub extern "C" fn cb_block_cipher_block_size(handle: CbHandle) -> i32 {
    abi_boundary(|| {
        let block_size = with_cipher(handle, |cipher| cipher.block_size())?;
        boundary_len(block_size)
    })
}

/// Supplies additional authenticated data (GCM).
///
/// @param[in] handle Context handle
/// @param[in] input AAD buffer
/// @param[in] input_size Size of `input`
/// @param[in] in_off Offset of the AAD within `input`
/// @param[in] in_len Length of the AAD
///
/// @return 0 on success, or a negative error code on failure.
///
/// @internal
/// # Safety
/// `input` must be valid for `input_size` bytes.
#[unsafe(no_mangle)]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_block_cipher_update_aad(
    handle: CbHandle,
    input: *const u8,
    input_size: usize,
    in_off: i32,
    in_len: i32,
) -> i32 {
    abi_boundary(|| {
        validate_ptr(input, CbError::InputIsNull)?;
        let in_off = non_negative(in_off, CbError::InputOffsetIsNegative)?;
        let in_len = non_negative(in_len, CbError::InputLenIsNegative)?;
        if !range_check(input_size, in_off, in_len) {
            Err(CbError::InputOutOfRange)?;
        }

        // SAFETY: the range lies within the caller's `input_size` bytes.
        let aad = unsafe { const_slice(input.add(in_off), in_len, CbError::InputIsNull)? };
        let written = with_cipher(handle, |cipher| cipher.update_aad(aad))?;
        boundary_len(written)
    })
}

/// Transforms a chunk of input.
///
/// The output capacity is everything from `out_off` to the end of `output`.
/// Input and output may overlap.
///
/// @param[in] handle Context handle
/// @param[out] output Output buffer
/// @param[in] output_size Size of `output`
/// @param[in] out_off Offset at which output is written
/// @param[in] input Input buffer
/// @param[in] input_size Size of `input`
/// @param[in] in_off Offset of the chunk within `input`
/// @param[in] in_len Length of the chunk
///
/// @return the number of bytes written, or a negative error code on failure.
///
/// @internal
/// # Safety
/// `input` must be valid for `input_size` bytes and `output` for
/// `output_size` bytes.
#[unsafe(no_mangle)]
#[allow(unsafe_code)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn cb_block_cipher_update(
    handle: CbHandle,
    output: *mut u8,
    output_size: usize,
    out_off: i32,
    input: *const u8,
    input_size: usize,
    in_off: i32,
    in_len: i32,
) -> i32 {
    abi_boundary(|| {
        validate_ptr(input, CbError::InputIsNull)?;
        validate_ptr(output, CbError::OutputIsNull)?;
        let out_off = non_negative(out_off, CbError::OutputOffsetIsNegative)?;
        let in_off = non_negative(in_off, CbError::InputOffsetIsNegative)?;
        let in_len = non_negative(in_len, CbError::InputLenIsNegative)?;
        if !range_check(input_size, in_off, in_len) {
            Err(CbError::InputOutOfRange)?;
        }
        if out_off > output_size {
            Err(CbError::OutputOutOfRange)?;
        }
        let out_len = output_size - out_off;

        // SAFETY: both offsets were range checked against the caller's sizes.
        let (input, output) = unsafe { (input.add(in_off), output.add(out_off)) };

        // An aliased chunk is copied out before the output is borrowed mutably.
        let staged = if overlaps(input, in_len, output, out_len) {
            // SAFETY: in range, and dropped before `output` is borrowed.
            let chunk = unsafe { const_slice(input, in_len, CbError::InputIsNull)? };
            Some(Zeroizing::new(chunk.to_vec()))
        } else {
            None
        };
        let input = match &staged {
            Some(staged) => staged.as_slice(),
            // SAFETY: in range and disjoint from the output.
            None => unsafe { const_slice(input, in_len, CbError::InputIsNull)? },
        };
        // SAFETY: in range and no other reference covers these bytes.
        let output = unsafe { mut_slice(output, out_len, CbError::OutputIsNull)? };

        let written = with_cipher(handle, |cipher| cipher.update(input, output))?;
        boundary_len(written)
    })
}

/// Finishes the current message and re-arms the context with the same key
/// and IV.
///
/// @param[in] handle Context handle
/// @param[out] output Output buffer
/// @param[in] output_size Size of `output`
/// @param[in] out_off Offset at which output is written
///
/// @return the number of bytes written, or a negative error code on failure.
/// A bad GCM tag is reported as the tag-invalid code.
///
/// @internal
/// # Safety
/// `output` must be valid for `output_size` bytes.
#[unsafe(no_mangle)]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_block_cipher_final(
    handle: CbHandle,
    output: *mut u8,
    output_size: usize,
    out_off: i32,
) -> i32 {
    abi_boundary(|| {
        validate_ptr(output, CbError::OutputIsNull)?;
        let out_off = non_negative(out_off, CbError::OutputOffsetIsNegative)?;
        if out_off > output_size {
            Err(CbError::OutputOutOfRange)?;
        }

        // SAFETY: the offset was range checked against the caller's size.
        let output = unsafe {
            mut_slice(output.add(out_off), output_size - out_off, CbError::OutputIsNull)?
        };
        let written = with_cipher(handle, |cipher| cipher.finalize(output))?;
        boundary_len(written)
    })
}

/// Supplies the expected GCM tag ahead of a decrypting final.
///
/// @param[in] handle Context handle
/// @param[in] tag Tag bytes
/// @param[in] tag_len Tag length in bytes
///
/// @return 0 on success, or a negative error code on failure.
///
/// @internal
/// # Safety
/// `tag` must be valid for `tag_len` bytes.
#[unsafe(no_mangle)]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_block_cipher_set_tag(
    handle: CbHandle,
    tag: *const u8,
    tag_len: usize,
) -> i32 {
    abi_boundary(|| {
        // SAFETY: the caller guarantees the tag extent.
        let tag = unsafe { const_slice(tag, tag_len, CbError::TagIsNull)? };
        with_cipher(handle, |cipher| cipher.set_tag(tag))?;
        Ok(0)
    })
}

/// Upper bound on the bytes the next update of `len` input bytes may write.
///
/// @return the bound, or a negative error code on failure.
#[unsafe(no_mangle)]
#[allow(unsafe_code)]
pub extern "C" fn cb_block_cipher_update_size(handle: CbHandle, len: i32) -> i32 {
    abi_boundary(|| {
        let len = non_negative(len, CbError::FinalSizeLenIsNegative)?;
        let size = with_cipher(handle, |cipher| cipher.update_size(len))?;
        boundary_len(size)
    })
}

/// Upper bound on the bytes an update of `len` bytes followed by final may
/// write.
///
/// @return the bound, or a negative error code on failure.
#[unsafe(no_mangle)]
#[allow(unsafe_code)]
pub extern "C" fn cb_block_cipher_final_size(handle: CbHandle, len: i32) -> i32 {
    abi_boundary(|| {
        let len = non_negative(len, CbError::FinalSizeLenIsNegative)?;
        let size = with_cipher(handle, |cipher| cipher.final_size(len))?;
        boundary_len(size)
    })
}

/// Disposes of a context. Unknown handles are ignored.
#[unsafe(no_mangle)]
#[allow(unsafe_code)]
pub extern "C" fn cb_block_cipher_free(handle: CbHandle) {
    abi_boundary(|| {
        if HANDLE_TABLE.free_handle(handle).is_some() {
            tracing::debug!(handle = *handle, "cipher context freed");
        }
        Ok(0)
    });
}
