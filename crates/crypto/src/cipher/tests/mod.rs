// Copyright (C) Microsoft Corporation. All rights reserved.

mod fault_tests;
mod size_tests;

use super::*;

/// Deterministic key material; the two halves of an XTS key never match.
pub fn test_key(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(29).wrapping_add(3))
        .collect()
}

pub fn test_iv(rule: IvRule, counter_iv_len: usize) -> Option<Vec<u8>> {
    let len = match rule {
        IvRule::Absent => return None,
        IvRule::Exact(len) => len,
        IvRule::Counter => counter_iv_len,
    };
    Some((0..len).map(|i| 0xA0 ^ i as u8).collect())
}

pub fn test_plaintext(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 251) as u8).collect()
}

pub fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).expect("valid hex"))
        .collect()
}

pub fn context_for(entry: &CipherEntry, padding: Padding) -> StreamCipherContext {
    StreamCipherContext::allocate(entry.family, entry.mode, padding)
}

/// Pushes `input` through an initialized context in `chunk`-sized pieces and
/// finalizes, sizing every output buffer from the context's own size queries.
pub fn drive<P: CipherProvider>(
    ctx: &mut StreamCipherContext<P>,
    aad: &[u8],
    input: &[u8],
    chunk: usize,
) -> Result<Vec<u8>, CryptoError> {
    let mut result = Vec::new();

    ctx.update_aad(aad)?;
    for piece in input.chunks(chunk.max(1)) {
        let bound = ctx.update_size(piece.len())?;
        let mut out = vec![0u8; bound.max(piece.len())];
        let written = ctx.update(piece, &mut out)?;
        assert!(
            written <= bound,
            "update wrote {written} bytes, size query promised at most {bound}"
        );
        result.extend_from_slice(&out[..written]);
    }

    let bound = ctx.final_size(0)?;
    let mut out = vec![0u8; bound];
    let written = ctx.finalize(&mut out)?;
    assert!(
        written <= bound,
        "final wrote {written} bytes, size query promised at most {bound}"
    );
    result.extend_from_slice(&out[..written]);
    Ok(result)
}

/// Initializes and drives a context, or returns `None` when the local OpenSSL
/// build does not provide the algorithm.
#[allow(clippy::too_many_arguments)]
pub fn try_run(
    entry: &CipherEntry,
    padding: Padding,
    direction: Direction,
    iv: Option<&[u8]>,
    tag_len: usize,
    aad: &[u8],
    input: &[u8],
    chunk: usize,
) -> Option<Result<Vec<u8>, CryptoError>> {
    let mut ctx = context_for(entry, padding);
    match ctx.init(direction, &test_key(entry.key_len), iv, tag_len) {
        Ok(()) => {}
        Err(CryptoError::InvalidCipher) => {
            tracing::warn!(algorithm = entry.algorithm, "not offered by this OpenSSL build");
            return None;
        }
        Err(err) => return Some(Err(err)),
    }
    Some(drive(&mut ctx, aad, input, chunk))
}
