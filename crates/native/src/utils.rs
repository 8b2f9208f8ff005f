// Copyright (C) Microsoft Corporation. All rights reserved.

use crate::CbError;

pub(crate) fn validate_ptr<T>(ptr: *const T, err: CbError) -> Result<(), CbError> {
    if ptr.is_null() { Err(err) } else { Ok(()) }
}

/// Safely assign a value to a pointer
///
/// The pointer is checked for null before writing.
#[allow(unsafe_code)]
pub(crate) fn assign_ptr<T>(ptr: *mut T, value: T) -> Result<(), CbError> {
    validate_ptr(ptr, CbError::OutputIsNull)?;

    // SAFETY: Pointer has been validated as non-null above
    unsafe {
        *ptr = value;
    }
    Ok(())
}

/// Borrows `len` bytes at `ptr`, failing with `null` if `ptr` is null.
///
/// # Safety
///
/// A non-null `ptr` must be valid for reads of `len` bytes for `'a`, and the
/// bytes must not be mutated while the slice lives.
#[allow(unsafe_code)]
pub(crate) unsafe fn const_slice<'a>(
    ptr: *const u8,
    len: usize,
    null: CbError,
) -> Result<&'a [u8], CbError> {
    validate_ptr(ptr, null)?;
    if len > isize::MAX as usize {
        Err(CbError::InputTooLongInt32)?;
    }

    // SAFETY: non-null, and the caller vouches for the extent.
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

/// Mutably borrows `len` bytes at `ptr`, failing with `null` if `ptr` is null.
///
/// # Safety
///
/// A non-null `ptr` must be valid for reads and writes of `len` bytes for
/// `'a`, with no other live reference to the same bytes.
#[allow(unsafe_code)]
pub(crate) unsafe fn mut_slice<'a>(
    ptr: *mut u8,
    len: usize,
    null: CbError,
) -> Result<&'a mut [u8], CbError> {
    validate_ptr(ptr, null)?;
    if len > isize::MAX as usize {
        Err(CbError::OutputTooLongInt32)?;
    }

    // SAFETY: non-null, and the caller vouches for the extent and exclusivity.
    Ok(unsafe { std::slice::from_raw_parts_mut(ptr, len) })
}

/// Converts a signed boundary offset or length, rejecting negatives with `err`.
pub(crate) fn non_negative(value: i32, err: CbError) -> Result<usize, CbError> {
    usize::try_from(value).map_err(|_| err)
}

/// Whether `[off, off + len)` lies within a buffer of `size` bytes.
pub(crate) fn range_check(size: usize, off: usize, len: usize) -> bool {
    len <= size && off <= size - len
}

/// Whether two byte ranges share at least one byte.
pub(crate) fn overlaps(a: *const u8, a_len: usize, b: *const u8, b_len: usize) -> bool {
    if a_len == 0 || b_len == 0 {
        return false;
    }
    let (a, b) = (a as usize, b as usize);
    a < b.saturating_add(b_len) && b < a.saturating_add(a_len)
}

/// Narrows a byte count to the boundary's signed return type.
pub(crate) fn boundary_len(len: usize) -> Result<i32, CbError> {
    i32::try_from(len).map_err(|_| CbError::OutputSizeIntOverflow)
}
