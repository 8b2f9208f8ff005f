// Copyright (C) Microsoft Corporation. All rights reserved.

//! OpenSSL cipher backend.

use openssl::cipher::*;
use openssl::cipher_ctx::*;
use openssl::error::ErrorStack;
use zeroize::Zeroizing;

use super::*;

/// Largest block any OpenSSL cipher reports (`EVP_MAX_BLOCK_LENGTH`).
const MAX_BLOCK_LENGTH: usize = 32;

/// Cipher provider backed by the `openssl` crate.
///
/// Algorithms are fetched by name from the default library context, so any
/// algorithm the loaded providers offer can back a selector row.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsslCipherProvider;

/// A fetched OpenSSL cipher.
pub struct OsslCipher {
    cipher: Cipher,
    aead: bool,
}

impl std::fmt::Debug for OsslCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsslCipher")
            .field("key_length", &self.cipher.key_length())
            .field("iv_length", &self.cipher.iv_length())
            .field("aead", &self.aead)
            .finish()
    }
}

impl CipherProvider for OsslCipherProvider {
    type Primitive = OsslCipher;
    type Transform = OsslCipherTransform;

    fn select(&self, config: &CipherConfig) -> Result<OsslCipher, CryptoError> {
        let cipher = Cipher::fetch(None, config.algorithm(), None).map_err(|openssl_error_stack| {
            tracing::error!(algorithm = config.algorithm(), ?openssl_error_stack);
            CryptoError::InvalidCipher
        })?;

        if cipher.key_length() != config.key_len() {
            tracing::error!(
                algorithm = config.algorithm(),
                backend_key_len = cipher.key_length(),
                key_len = config.key_len(),
                "backend key length mismatch"
            );
            Err(CryptoError::InvalidKeyLen)?;
        }

        Ok(OsslCipher {
            cipher,
            aead: config.mode().is_aead(),
        })
    }

    fn transform_init(
        &self,
        primitive: &OsslCipher,
        direction: Direction,
        key: &[u8],
        iv: Option<&[u8]>,
    ) -> Result<OsslCipherTransform, CryptoError> {
        let cipher: &CipherRef = &primitive.cipher;

        // The openssl crate asserts on these; reject them first.
        if key.len() != cipher.key_length() {
            Err(CryptoError::InvalidKeyLen)?;
        }
        let iv = match (cipher.iv_length(), iv) {
            (0, _) => None,
            (len, Some(iv)) if iv.len() == len => Some(iv),
            (_, Some(_)) => Err(CryptoError::InvalidIvLen)?,
            (_, None) => Err(CryptoError::IvIsNull)?,
        };

        let mut ctx = CipherCtx::new().map_err(|openssl_error_stack| {
            tracing::error!(?openssl_error_stack);
            CryptoError::OpensslError
        })?;
        let init = match direction {
            Direction::Encrypt => ctx.encrypt_init(Some(cipher), Some(key), iv),
            Direction::Decrypt => ctx.decrypt_init(Some(cipher), Some(key), iv),
        };
        init.map_err(|openssl_error_stack| {
            tracing::error!(?direction, ?openssl_error_stack);
            CryptoError::OpensslError
        })?;

        Ok(OsslCipherTransform {
            ctx,
            direction,
            aead: primitive.aead,
        })
    }

    fn version(&self) -> &str {
        openssl::version::version()
    }
}

/// A keyed OpenSSL cipher context.
pub struct OsslCipherTransform {
    ctx: CipherCtx,
    direction: Direction,
    aead: bool,
}

impl OsslCipherTransform {
    /// OpenSSL wants room for one extra block on every update of a block
    /// cipher, even when no block is pending.
    fn update_headroom(&self, input_len: usize) -> usize {
        match self.ctx.block_size() {
            1 => input_len,
            block => input_len + block,
        }
    }
}

impl CipherTransform for OsslCipherTransform {
    fn set_padding(&mut self, padded: bool) {
        self.ctx.set_padding(padded);
    }

    fn update(&mut self, input: &[u8], output: Option<&mut [u8]>) -> Result<usize, CryptoError> {
        let map_err = |openssl_error_stack: ErrorStack| {
            tracing::error!(?openssl_error_stack);
            CryptoError::OpensslError
        };

        let Some(output) = output else {
            // OpenSSL only accepts a missing output buffer for AEAD ciphers.
            if !self.aead {
                tracing::error!("AAD passed to a cipher without authentication");
                Err(CryptoError::InvalidMode)?;
            }
            self.ctx.cipher_update(input, None).map_err(map_err)?;
            return Ok(0);
        };

        if input.is_empty() {
            return Ok(0);
        }

        let needed = self.update_headroom(input.len());
        if output.len() >= needed {
            return self.ctx.cipher_update(input, Some(output)).map_err(map_err);
        }

        let mut scratch = Zeroizing::new(vec![0u8; needed]);
        let count = self
            .ctx
            .cipher_update(input, Some(&mut scratch[..]))
            .map_err(map_err)?;
        let dest = output
            .get_mut(..count)
            .ok_or(CryptoError::OutputTooSmall)?;
        dest.copy_from_slice(&scratch[..count]);
        Ok(count)
    }

    fn finalize(&mut self, output: &mut [u8]) -> Result<usize, CryptoError> {
        let mut scratch = Zeroizing::new([0u8; MAX_BLOCK_LENGTH]);
        let count = self
            .ctx
            .cipher_final(&mut scratch[..])
            .map_err(|openssl_error_stack| match (self.direction, self.aead) {
                (Direction::Decrypt, true) => {
                    tracing::debug!(?openssl_error_stack, "authentication failed");
                    CryptoError::TagInvalid
                }
                (Direction::Decrypt, false) => {
                    tracing::debug!(?openssl_error_stack, "bad final block");
                    CryptoError::InvalidCipherText
                }
                (Direction::Encrypt, _) => {
                    tracing::error!(?openssl_error_stack);
                    CryptoError::OpensslError
                }
            })?;
        let dest = output
            .get_mut(..count)
            .ok_or(CryptoError::OutputTooSmall)?;
        dest.copy_from_slice(&scratch[..count]);
        Ok(count)
    }

    fn tag(&self, tag: &mut [u8]) -> Result<(), CryptoError> {
        self.ctx.tag(tag).map_err(|openssl_error_stack| {
            tracing::error!(?openssl_error_stack);
            CryptoError::OpensslError
        })
    }

    fn set_tag(&mut self, tag: &[u8]) -> Result<(), CryptoError> {
        self.ctx.set_tag(tag).map_err(|openssl_error_stack| {
            tracing::error!(?openssl_error_stack);
            CryptoError::OpensslError
        })
    }
}
