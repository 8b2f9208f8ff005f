// Copyright (C) Microsoft Corporation. All rights reserved.

use test_with_tracing::test;

use super::*;

fn calc(mode: CipherMode, padding: Padding, direction: Direction, tag_len: usize) -> SizeCalculator {
    calc_bounded(mode, padding, direction, tag_len, EngineConfig::default())
}

fn calc_bounded(
    mode: CipherMode,
    padding: Padding,
    direction: Direction,
    tag_len: usize,
    engine: EngineConfig,
) -> SizeCalculator {
    let entry = CipherSelector::entry(CipherFamily::Aes128, mode).expect("AES-128 row");
    let iv_len = test_iv(entry.iv_rule, 16).map_or(0, |iv| iv.len());
    let config = CipherSelector::select(entry.family, mode, entry.key_len, iv_len, padding)
        .expect("valid configuration");
    SizeCalculator::new(&config, direction, tag_len, &engine)
}

#[test]
fn streaming_modes_pass_length_through() {
    for mode in [CipherMode::Ctr, CipherMode::Cfb1, CipherMode::Cfb8, CipherMode::Ofb] {
        let sizes = calc(mode, Padding::Pkcs7, Direction::Encrypt, 0);
        for len in [0, 1, 15, 16, 17, 1000] {
            assert_eq!(sizes.update_size(3, len), Ok(len));
            assert_eq!(sizes.final_size(3, len), Ok(len));
        }
        assert_eq!(sizes.final_minimum(3), Ok(0));
    }
}

#[test]
fn gcm_adds_or_removes_tag() {
    let enc = calc(CipherMode::Gcm, Padding::None, Direction::Encrypt, 16);
    assert_eq!(enc.final_size(0, 11), Ok(27));
    assert_eq!(enc.update_size(0, 11), Ok(11));
    assert_eq!(enc.final_minimum(11), Ok(16));

    let dec = calc(CipherMode::Gcm, Padding::None, Direction::Decrypt, 16);
    assert_eq!(dec.final_size(0, 27), Ok(11));
    assert_eq!(dec.final_size(0, 5), Ok(0));
    assert_eq!(dec.final_minimum(27), Ok(0));

    let short_tag = calc(CipherMode::Gcm, Padding::None, Direction::Encrypt, 12);
    assert_eq!(short_tag.final_size(0, 4), Ok(16));
}

#[test]
fn padded_encryption() {
    let sizes = calc(CipherMode::Cbc, Padding::Pkcs7, Direction::Encrypt, 0);

    assert_eq!(sizes.update_size(0, 0), Ok(0));
    assert_eq!(sizes.update_size(0, 15), Ok(0));
    assert_eq!(sizes.update_size(0, 16), Ok(16));
    assert_eq!(sizes.update_size(0, 31), Ok(16));
    assert_eq!(sizes.update_size(4, 12), Ok(16));

    // An empty message still produces a full padding block.
    assert_eq!(sizes.final_size(0, 0), Ok(16));
    assert_eq!(sizes.final_size(0, 5), Ok(16));
    assert_eq!(sizes.final_size(0, 16), Ok(32));
    assert_eq!(sizes.final_size(4, 11), Ok(16));
    assert_eq!(sizes.final_size(4, 12), Ok(32));
    assert_eq!(sizes.final_minimum(32), Ok(16));
    assert_eq!(sizes.final_minimum(37), Ok(16));
}

#[test]
fn padded_decryption_counts_withheld_block() {
    let sizes = calc(CipherMode::Ecb, Padding::Pkcs7, Direction::Decrypt, 0);

    assert_eq!(sizes.final_size(0, 32), Ok(32));
    assert_eq!(sizes.final_size(0, 0), Ok(0));

    // After whole blocks the backend still holds the last one.
    assert_eq!(sizes.update_size(16, 4), Ok(16));
    assert_eq!(sizes.final_size(16, 0), Ok(16));
    assert_eq!(sizes.final_minimum(48), Ok(16));

    // The 16 aligned bytes are decrypted but held back again.
    assert_eq!(sizes.update_size(20, 12), Ok(0));
    assert_eq!(sizes.final_size(20, 12), Ok(16));
}

#[test]
fn aligned_padded_decryption_releases_one_block() {
    let sizes = calc(CipherMode::Cbc, Padding::Pkcs7, Direction::Decrypt, 0);

    assert_eq!(sizes.update_size(0, 16), Ok(0));
    assert_eq!(sizes.update_size(0, 48), Ok(32));
    assert_eq!(sizes.update_size(16, 16), Ok(16));
    assert_eq!(sizes.update_size(16, 1), Ok(16));
    assert_eq!(sizes.update_size(17, 31), Ok(16));
    assert_eq!(sizes.update_size(16, 0), Ok(0));
}

#[test]
fn unpadded_block_modes() {
    for mode in [CipherMode::Ecb, CipherMode::Cbc, CipherMode::Xts] {
        let sizes = calc(mode, Padding::None, Direction::Decrypt, 0);
        assert_eq!(sizes.update_size(16, 32), Ok(32));
        assert_eq!(sizes.final_size(16, 32), Ok(32));
        assert_eq!(sizes.final_minimum(48), Ok(0));
    }
}

#[test]
fn width_limit() {
    let engine = EngineConfig::default().with_max_boundary_len(64);

    let gcm = calc_bounded(CipherMode::Gcm, Padding::None, Direction::Encrypt, 16, engine);
    assert_eq!(gcm.final_size(0, 48), Ok(64));
    assert_eq!(gcm.final_size(0, 49), Err(CryptoError::OutputSizeIntOverflow));

    let ctr = calc_bounded(CipherMode::Ctr, Padding::None, Direction::Encrypt, 0, engine);
    assert_eq!(ctr.update_size(0, 65), Err(CryptoError::OutputSizeIntOverflow));

    let cbc = calc(CipherMode::Cbc, Padding::Pkcs7, Direction::Encrypt, 0);
    assert_eq!(
        cbc.final_size(0, usize::MAX - 15),
        Err(CryptoError::OutputSizeIntOverflow)
    );
    assert_eq!(
        cbc.final_size(0, EngineConfig::BOUNDARY_MAX),
        Err(CryptoError::OutputSizeIntOverflow)
    );
}
