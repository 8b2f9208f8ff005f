// Copyright (C) Microsoft Corporation. All rights reserved.

//! Cipher identifiers and the streaming engine built on them.

mod context;
mod counter;
mod selector;
mod size;

#[cfg(test)]
mod tests;

pub use context::*;
pub use counter::*;
pub use selector::*;
pub use size::*;

use super::*;

/// Cipher family identifiers.
///
/// The integer values are shared with callers on the far side of the native
/// boundary and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum CipherFamily {
    Rc4 = 0,
    Rc4_40 = 1,
    Idea = 2,
    Rc2 = 3,
    Rc2_40 = 4,
    Rc2_64 = 5,
    Blowfish = 6,
    Cast5 = 7,
    Aes128 = 8,
    Aes192 = 9,
    Aes256 = 10,
    Aria128 = 11,
    Aria192 = 12,
    Aria256 = 13,
    Camellia128 = 14,
    Camellia192 = 15,
    Camellia256 = 16,
    ChaCha20 = 17,
    ChaCha20Poly1305 = 18,
    Seed = 19,
    Sm4 = 20,
}

impl TryFrom<i32> for CipherFamily {
    type Error = CryptoError;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        use CipherFamily::*;
        let family = match id {
            0 => Rc4,
            1 => Rc4_40,
            2 => Idea,
            3 => Rc2,
            4 => Rc2_40,
            5 => Rc2_64,
            6 => Blowfish,
            7 => Cast5,
            8 => Aes128,
            9 => Aes192,
            10 => Aes256,
            11 => Aria128,
            12 => Aria192,
            13 => Aria256,
            14 => Camellia128,
            15 => Camellia192,
            16 => Camellia256,
            17 => ChaCha20,
            18 => ChaCha20Poly1305,
            19 => Seed,
            20 => Sm4,
            _ => return Err(CryptoError::InvalidCipher),
        };
        Ok(family)
    }
}

/// Chaining and streaming modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum CipherMode {
    Ecb = 0,
    Cbc = 1,
    Cfb1 = 2,
    Cfb8 = 3,
    Cfb64 = 4,
    Cfb128 = 5,
    Ctr = 6,
    Ccm = 7,
    Gcm = 8,
    Ofb = 9,
    Ocb = 10,
    Xts = 11,
    Wrap = 12,
    WrapPad = 13,
}

impl CipherMode {
    /// Whether the mode accepts input that is not block aligned.
    pub fn is_streaming(self) -> bool {
        matches!(
            self,
            CipherMode::Cfb1
                | CipherMode::Cfb8
                | CipherMode::Cfb64
                | CipherMode::Cfb128
                | CipherMode::Ctr
                | CipherMode::Ofb
                | CipherMode::Gcm
        )
    }

    /// Whether backend padding applies to this mode.
    pub fn is_paddable(self) -> bool {
        matches!(self, CipherMode::Ecb | CipherMode::Cbc)
    }

    pub fn is_aead(self) -> bool {
        self == CipherMode::Gcm
    }
}

impl TryFrom<i32> for CipherMode {
    type Error = CryptoError;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        use CipherMode::*;
        let mode = match id {
            0 => Ecb,
            1 => Cbc,
            2 => Cfb1,
            3 => Cfb8,
            4 => Cfb64,
            5 => Cfb128,
            6 => Ctr,
            7 => Ccm,
            8 => Gcm,
            9 => Ofb,
            10 => Ocb,
            11 => Xts,
            12 => Wrap,
            13 => WrapPad,
            _ => return Err(CryptoError::InvalidMode),
        };
        Ok(mode)
    }
}

/// Operation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Direction {
    Encrypt = 1,
    Decrypt = 2,
}

impl TryFrom<i32> for Direction {
    type Error = CryptoError;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(Direction::Encrypt),
            2 => Ok(Direction::Decrypt),
            _ => Err(CryptoError::InvalidOpMode),
        }
    }
}

/// Block padding applied by ECB and CBC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Padding {
    #[default]
    None,
    Pkcs7,
}

impl Padding {
    /// Maps the boundary flag: zero or negative is unpadded, anything else padded.
    pub fn from_flag(flag: i32) -> Self {
        if flag > 0 { Padding::Pkcs7 } else { Padding::None }
    }

    pub fn is_padded(self) -> bool {
        self == Padding::Pkcs7
    }
}
