// Copyright (C) Microsoft Corporation. All rights reserved.

//! Static table of supported cipher/mode combinations.

use super::*;

/// Block size shared by every family in the table.
pub const BLOCK_SIZE_128: usize = 16;

/// How a mode constrains the IV supplied at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IvRule {
    /// The mode takes no IV.
    Absent,
    /// The IV must be exactly this many bytes.
    Exact(usize),
    /// CTR: the IV is the fixed prefix of a counter block and must leave room
    /// for at most `min(8, block_size / 2)` counter bytes.
    Counter,
}

impl IvRule {
    fn check(self, iv_len: usize, block_size: usize) -> Result<(), CryptoError> {
        let ok = match self {
            IvRule::Absent => iv_len == 0,
            IvRule::Exact(len) => iv_len == len,
            IvRule::Counter => {
                let max_counter = (block_size / 2).min(8);
                iv_len <= block_size && block_size - iv_len <= max_counter
            }
        };
        if ok {
            Ok(())
        } else {
            Err(CryptoError::InvalidIvLen)
        }
    }
}

/// One row of the selector table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherEntry {
    pub family: CipherFamily,
    pub mode: CipherMode,
    pub key_len: usize,
    pub block_size: usize,
    pub iv_rule: IvRule,
    /// Backend algorithm name.
    pub algorithm: &'static str,
}

/// A validated cipher configuration.
///
/// Produced only by [`CipherSelector::select`] and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherConfig {
    entry: &'static CipherEntry,
    padding: Padding,
}

impl CipherConfig {
    pub fn family(&self) -> CipherFamily {
        self.entry.family
    }

    pub fn mode(&self) -> CipherMode {
        self.entry.mode
    }

    pub fn key_len(&self) -> usize {
        self.entry.key_len
    }

    pub fn block_size(&self) -> usize {
        self.entry.block_size
    }

    pub fn iv_rule(&self) -> IvRule {
        self.entry.iv_rule
    }

    pub fn algorithm(&self) -> &'static str {
        self.entry.algorithm
    }

    /// Effective padding; always [`Padding::None`] outside ECB and CBC.
    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn is_padded(&self) -> bool {
        self.padding.is_padded()
    }

    pub fn is_streaming(&self) -> bool {
        self.entry.mode.is_streaming()
    }
}

macro_rules! cipher_table {
    ($($family:ident($key_len:expr, $prefix:literal) {
        $($mode:ident => $suffix:literal, $iv:expr;)+
    })+) => {
        &[$($(
            CipherEntry {
                family: CipherFamily::$family,
                mode: CipherMode::$mode,
                key_len: $key_len,
                block_size: BLOCK_SIZE_128,
                iv_rule: $iv,
                algorithm: concat!($prefix, $suffix),
            },
        )+)+]
    };
}

const IV_NONE: IvRule = IvRule::Absent;
const IV_BLOCK: IvRule = IvRule::Exact(BLOCK_SIZE_128);
const IV_CTR: IvRule = IvRule::Counter;
const IV_GCM: IvRule = IvRule::Exact(12);

static TABLE: &[CipherEntry] = cipher_table! {
    Aes128(16, "AES-128") {
        Ecb => "-ECB", IV_NONE;
        Cbc => "-CBC", IV_BLOCK;
        Cfb1 => "-CFB1", IV_BLOCK;
        Cfb8 => "-CFB8", IV_BLOCK;
        Cfb128 => "-CFB", IV_BLOCK;
        Ofb => "-OFB", IV_BLOCK;
        Ctr => "-CTR", IV_CTR;
        Gcm => "-GCM", IV_GCM;
    }
    // XTS keys are two concatenated cipher keys.
    Aes128(32, "AES-128") {
        Xts => "-XTS", IV_BLOCK;
    }
    Aes192(24, "AES-192") {
        Ecb => "-ECB", IV_NONE;
        Cbc => "-CBC", IV_BLOCK;
        Cfb1 => "-CFB1", IV_BLOCK;
        Cfb8 => "-CFB8", IV_BLOCK;
        Cfb128 => "-CFB", IV_BLOCK;
        Ofb => "-OFB", IV_BLOCK;
        Ctr => "-CTR", IV_CTR;
        Gcm => "-GCM", IV_GCM;
    }
    Aes256(32, "AES-256") {
        Ecb => "-ECB", IV_NONE;
        Cbc => "-CBC", IV_BLOCK;
        Cfb1 => "-CFB1", IV_BLOCK;
        Cfb8 => "-CFB8", IV_BLOCK;
        Cfb128 => "-CFB", IV_BLOCK;
        Ofb => "-OFB", IV_BLOCK;
        Ctr => "-CTR", IV_CTR;
        Gcm => "-GCM", IV_GCM;
    }
    Aes256(64, "AES-256") {
        Xts => "-XTS", IV_BLOCK;
    }
    Aria128(16, "ARIA-128") {
        Ecb => "-ECB", IV_NONE;
        Cbc => "-CBC", IV_BLOCK;
        Cfb1 => "-CFB1", IV_BLOCK;
        Cfb8 => "-CFB8", IV_BLOCK;
        Cfb128 => "-CFB", IV_BLOCK;
        Ofb => "-OFB", IV_BLOCK;
        Ctr => "-CTR", IV_CTR;
    }
    Aria192(24, "ARIA-192") {
        Ecb => "-ECB", IV_NONE;
        Cbc => "-CBC", IV_BLOCK;
        Cfb1 => "-CFB1", IV_BLOCK;
        Cfb8 => "-CFB8", IV_BLOCK;
        Cfb128 => "-CFB", IV_BLOCK;
        Ofb => "-OFB", IV_BLOCK;
        Ctr => "-CTR", IV_CTR;
    }
    Aria256(32, "ARIA-256") {
        Ecb => "-ECB", IV_NONE;
        Cbc => "-CBC", IV_BLOCK;
        Cfb1 => "-CFB1", IV_BLOCK;
        Cfb8 => "-CFB8", IV_BLOCK;
        Cfb128 => "-CFB", IV_BLOCK;
        Ofb => "-OFB", IV_BLOCK;
        Ctr => "-CTR", IV_CTR;
    }
    Camellia128(16, "CAMELLIA-128") {
        Ecb => "-ECB", IV_NONE;
        Cbc => "-CBC", IV_BLOCK;
        Cfb1 => "-CFB1", IV_BLOCK;
        Cfb8 => "-CFB8", IV_BLOCK;
        Cfb128 => "-CFB", IV_BLOCK;
        Ofb => "-OFB", IV_BLOCK;
        Ctr => "-CTR", IV_CTR;
    }
    Camellia192(24, "CAMELLIA-192") {
        Ecb => "-ECB", IV_NONE;
        Cbc => "-CBC", IV_BLOCK;
        Cfb1 => "-CFB1", IV_BLOCK;
        Cfb8 => "-CFB8", IV_BLOCK;
        Cfb128 => "-CFB", IV_BLOCK;
        Ofb => "-OFB", IV_BLOCK;
        Ctr => "-CTR", IV_CTR;
    }
    Camellia256(32, "CAMELLIA-256") {
        Ecb => "-ECB", IV_NONE;
        Cbc => "-CBC", IV_BLOCK;
        Cfb1 => "-CFB1", IV_BLOCK;
        Cfb8 => "-CFB8", IV_BLOCK;
        Cfb128 => "-CFB", IV_BLOCK;
        Ofb => "-OFB", IV_BLOCK;
        Ctr => "-CTR", IV_CTR;
    }
    Sm4(16, "SM4") {
        Ecb => "-ECB", IV_NONE;
        Cbc => "-CBC", IV_BLOCK;
        Cfb128 => "-CFB", IV_BLOCK;
        Ofb => "-OFB", IV_BLOCK;
        Ctr => "-CTR", IV_CTR;
    }
};

/// Maps (family, mode, key length, IV length, padding) to a [`CipherConfig`].
pub struct CipherSelector;

impl CipherSelector {
    /// Every supported combination.
    pub fn entries() -> &'static [CipherEntry] {
        TABLE
    }

    /// Base key length of a family, `None` when the family has no rows.
    pub fn family_key_len(family: CipherFamily) -> Option<usize> {
        TABLE
            .iter()
            .find(|e| e.family == family && e.mode != CipherMode::Xts)
            .map(|e| e.key_len)
    }

    /// Looks up the row for `(family, mode)` without validating lengths.
    pub fn entry(family: CipherFamily, mode: CipherMode) -> Option<&'static CipherEntry> {
        TABLE.iter().find(|e| e.family == family && e.mode == mode)
    }

    /// Validates a configuration.
    ///
    /// Checks run in a fixed order so callers see a stable error for inputs
    /// that are wrong in more than one way: IV presence, family, key length,
    /// mode, then IV length.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::ModeTakesNoIv`] when an IV is given to ECB
    /// - [`CryptoError::IvIsNull`] when any other mode gets an empty IV
    /// - [`CryptoError::InvalidCipher`] when the family has no table rows
    /// - [`CryptoError::InvalidKeyLen`] when the key does not fit the family
    /// - [`CryptoError::InvalidMode`] when the family does not offer the mode
    /// - [`CryptoError::InvalidIvLen`] when the IV length breaks the mode's rule
    pub fn select(
        family: CipherFamily,
        mode: CipherMode,
        key_len: usize,
        iv_len: usize,
        padding: Padding,
    ) -> Result<CipherConfig, CryptoError> {
        match (mode, iv_len) {
            (CipherMode::Ecb, 0) => {}
            (CipherMode::Ecb, _) => Err(CryptoError::ModeTakesNoIv)?,
            (_, 0) => Err(CryptoError::IvIsNull)?,
            _ => {}
        }

        let family_key_len = Self::family_key_len(family).ok_or(CryptoError::InvalidCipher)?;
        let entry = Self::entry(family, mode);
        let expected_key_len = entry.map_or(family_key_len, |e| e.key_len);
        if key_len != expected_key_len {
            Err(CryptoError::InvalidKeyLen)?;
        }
        let entry = entry.ok_or(CryptoError::InvalidMode)?;

        entry.iv_rule.check(iv_len, entry.block_size)?;

        let padding = if mode.is_paddable() {
            padding
        } else {
            Padding::None
        };

        Ok(CipherConfig { entry, padding })
    }
}
