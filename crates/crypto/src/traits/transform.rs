// Copyright (C) Microsoft Corporation. All rights reserved.

use super::*;

/// A cipher backend.
pub trait CipherProvider {
    /// Backend handle for one algorithm, reusable across transforms.
    type Primitive;

    /// Keyed transform produced by [`transform_init`](Self::transform_init).
    type Transform: CipherTransform;

    /// Resolves a configuration to a backend primitive.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::InvalidCipher`] if the backend does not offer the algorithm
    /// - [`CryptoError::InvalidKeyLen`] if the backend disagrees on the key length
    fn select(&self, config: &CipherConfig) -> Result<Self::Primitive, CryptoError>;

    /// Creates a keyed transform.
    ///
    /// `iv` is `None` for modes that take no IV. For CTR it is the full
    /// initial counter block.
    fn transform_init(
        &self,
        primitive: &Self::Primitive,
        direction: Direction,
        key: &[u8],
        iv: Option<&[u8]>,
    ) -> Result<Self::Transform, CryptoError>;

    /// Human-readable backend version.
    fn version(&self) -> &str;
}

/// An initialized, keyed cipher transform.
///
/// # Thread Safety
///
/// Transforms are driven by a single context on a single thread.
pub trait CipherTransform {
    /// Enables or disables PKCS#7 padding. Only meaningful for ECB and CBC.
    fn set_padding(&mut self, padded: bool);

    /// Transforms a chunk of input.
    ///
    /// With `output` set to `None` the input is authenticated as additional
    /// data and nothing is written.
    ///
    /// # Returns
    ///
    /// The number of bytes written to `output`.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::OutputTooSmall`] if the transform produced more than `output` holds
    /// - [`CryptoError::InvalidMode`] if `output` is `None` on a non-AEAD cipher
    /// - [`CryptoError::OpensslError`] if the backend rejects the call
    fn update(&mut self, input: &[u8], output: Option<&mut [u8]>) -> Result<usize, CryptoError>;

    /// Flushes the transform.
    ///
    /// # Errors
    ///
    /// Decryption failures are split by cause:
    /// - [`CryptoError::TagInvalid`] when AEAD authentication fails
    /// - [`CryptoError::InvalidCipherText`] when the final block is malformed
    fn finalize(&mut self, output: &mut [u8]) -> Result<usize, CryptoError>;

    /// Copies the computed authentication tag into `tag`. Valid after an
    /// encrypting [`finalize`](Self::finalize).
    fn tag(&self, tag: &mut [u8]) -> Result<(), CryptoError>;

    /// Sets the expected authentication tag before a decrypting `finalize`.
    fn set_tag(&mut self, tag: &[u8]) -> Result<(), CryptoError>;
}
