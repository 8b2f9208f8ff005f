// Copyright (C) Microsoft Corporation. All rights reserved.

//! Stateful init/update/final driver over a [`CipherProvider`].

use zeroize::Zeroizing;

use super::*;

/// Largest authentication tag a context stages or emits.
pub const MAX_TAG_LEN: usize = 16;

/// Trailing bytes of a GCM decryption stream that may still be the tag.
#[derive(Clone)]
struct TagStage {
    buf: Zeroizing<[u8; MAX_TAG_LEN]>,
    index: usize,
}

impl TagStage {
    fn new() -> Self {
        Self {
            buf: Zeroizing::new([0u8; MAX_TAG_LEN]),
            index: 0,
        }
    }

    fn staged(&self) -> &[u8] {
        &self.buf[..self.index]
    }
}

/// State that exists between a successful `init` and the next `init`.
struct ActiveCipher<T> {
    config: CipherConfig,
    sizes: SizeCalculator,
    transform: T,
    direction: Direction,
    processed: u64,
    tag_len: usize,
    tag: TagStage,
    counter: Option<Counter128>,
    key: Zeroizing<Vec<u8>>,
    iv: Zeroizing<Vec<u8>>,
}

impl<T: CipherTransform> ActiveCipher<T> {
    fn check_alignment(&self, len: usize) -> Result<(), CryptoError> {
        if !self.config.is_streaming()
            && !self.config.is_padded()
            && len % self.config.block_size() != 0
        {
            Err(CryptoError::NotBlockAligned)?;
        }
        Ok(())
    }

    /// The CTR counter advanced by the blocks `len` more bytes will start.
    ///
    /// Nothing is committed; see [`commit`](Self::commit).
    fn advanced_counter(&self, len: usize) -> Result<Option<Counter128>, CryptoError> {
        let Some(counter) = self.counter.as_ref() else {
            return Ok(None);
        };

        let block_size = self.config.block_size() as u64;
        let len = len as u64;
        let offset = self.processed % block_size;
        let excess = if offset == 0 {
            len
        } else {
            len.saturating_sub(block_size - offset)
        };
        if excess == 0 {
            return Ok(None);
        }

        let blocks = excess.div_ceil(block_size);
        let mut next = counter.clone();
        next.add(0, blocks);
        if !next.valid() {
            tracing::warn!(
                iv_len = counter.iv_len(),
                magnitude = ?counter.magnitude(),
                blocks,
                "CTR counter exhausted"
            );
            Err(CryptoError::CtrModeOverflow)?;
        }
        Ok(Some(next))
    }

    /// Records `len` bytes accepted by the backend.
    fn commit(&mut self, len: usize, counter: Option<Counter128>) {
        self.processed += len as u64;
        if counter.is_some() {
            self.counter = counter;
        }
    }

    /// Bytes of a decryption update that are provably not part of the
    /// trailing tag.
    fn releasable(&self, len: usize) -> usize {
        (self.tag.index + len).saturating_sub(self.tag_len)
    }

    fn stages_tag(&self) -> bool {
        self.direction == Direction::Decrypt && self.config.mode().is_aead() && self.tag_len > 0
    }

    /// GCM decryption update that withholds the last `tag_len` bytes seen.
    ///
    /// The stage is rebuilt in a copy and only stored once the backend has
    /// taken every released byte.
    fn update_staged(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        let tag_len = self.tag_len;
        let mut stage = self.tag.clone();
        let mut input = input;
        let mut written = 0;

        if stage.index < tag_len {
            let take = (tag_len - stage.index).min(input.len());
            stage.buf[stage.index..stage.index + take].copy_from_slice(&input[..take]);
            stage.index += take;
            input = &input[take..];
        }

        if input.len() >= tag_len {
            // Everything staged is followed by at least a full tag's worth of
            // bytes, so none of it is the tag.
            let out = output.get_mut(written..).ok_or(CryptoError::OutputTooSmall)?;
            written += self.transform.update(&stage.buf[..tag_len], Some(out))?;

            let body = input.len() - tag_len;
            let out = output.get_mut(written..).ok_or(CryptoError::OutputTooSmall)?;
            written += self.transform.update(&input[..body], Some(out))?;

            stage.buf[..tag_len].copy_from_slice(&input[body..]);
            stage.index = tag_len;
            tracing::trace!(released = written, "tag stage replaced");
        } else if !input.is_empty() {
            let shift = input.len();
            let out = output.get_mut(written..).ok_or(CryptoError::OutputTooSmall)?;
            written += self.transform.update(&stage.buf[..shift], Some(out))?;

            stage.buf.copy_within(shift..stage.index, 0);
            stage.index -= shift;
            stage.buf[stage.index..stage.index + shift].copy_from_slice(input);
            stage.index += shift;
            tracing::trace!(released = written, staged = stage.index, "tag stage shifted");
        }

        self.tag = stage;
        Ok(written)
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<usize, CryptoError> {
        let aead = self.config.mode().is_aead();
        match self.direction {
            Direction::Encrypt => {
                let mut written = self.transform.finalize(output)?;
                if aead && self.tag_len > 0 {
                    let tag = output
                        .get_mut(written..written + self.tag_len)
                        .ok_or(CryptoError::OutputTooSmall)?;
                    self.transform.tag(tag)?;
                    written += self.tag_len;
                }
                Ok(written)
            }
            Direction::Decrypt => {
                if self.stages_tag() {
                    if self.tag.index < self.tag_len {
                        tracing::debug!(
                            staged = self.tag.index,
                            tag_len = self.tag_len,
                            "stream shorter than its tag"
                        );
                        Err(CryptoError::TagInvalid)?;
                    }
                    self.transform.set_tag(self.tag.staged())?;
                }
                self.transform.finalize(output).map_err(|_| {
                    if aead {
                        CryptoError::TagInvalid
                    } else {
                        CryptoError::InvalidCipherText
                    }
                })
            }
        }
    }
}

/// Streaming block-cipher context.
///
/// A context is bound to one cipher family, mode and padding choice when it is
/// allocated. [`init`](Self::init) keys it for a direction; any number of
/// [`update_aad`](Self::update_aad) and [`update`](Self::update) calls follow;
/// [`finalize`](Self::finalize) flushes the stream and re-arms the context
/// with the same key, IV, direction and tag length so a new stream can start
/// without another `init`.
///
/// # GCM decryption
///
/// Ciphertext and tag arrive as one stream. The last `tag_len` bytes seen are
/// held back from the backend until more input proves they are ciphertext,
/// so chunk boundaries never affect the plaintext produced, and bytes that
/// turn out to be the tag are never decrypted.
///
/// # Thread Safety
///
/// A context is not synchronized. Distinct contexts share no state.
pub struct StreamCipherContext<P: CipherProvider = DefaultCipherProvider> {
    provider: P,
    family: CipherFamily,
    mode: CipherMode,
    padding: Padding,
    engine: EngineConfig,
    active: Option<ActiveCipher<P::Transform>>,
}

impl<P: CipherProvider + Default> StreamCipherContext<P> {
    /// Allocates an unconfigured context on the provider's default instance.
    pub fn allocate(family: CipherFamily, mode: CipherMode, padding: Padding) -> Self {
        Self::new(P::default(), family, mode, padding)
    }
}

impl<P: CipherProvider> StreamCipherContext<P> {
    pub fn new(provider: P, family: CipherFamily, mode: CipherMode, padding: Padding) -> Self {
        Self {
            provider,
            family,
            mode,
            padding,
            engine: EngineConfig::default(),
            active: None,
        }
    }

    /// Replaces the engine settings. Takes effect at the next `init`.
    pub fn with_engine_config(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Keys the context.
    ///
    /// Any previous state, including retained key and IV copies, is wiped
    /// first. On error the context is left unconfigured.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::InvalidTagLen`] if `tag_len > 16`
    /// - any error of [`CipherSelector::select`]
    /// - backend selection or initialization errors
    pub fn init(
        &mut self,
        direction: Direction,
        key: &[u8],
        iv: Option<&[u8]>,
        tag_len: usize,
    ) -> Result<(), CryptoError> {
        self.active = None;

        if tag_len > MAX_TAG_LEN {
            Err(CryptoError::InvalidTagLen)?;
        }

        let iv = iv.unwrap_or_default();
        let config = CipherSelector::select(self.family, self.mode, key.len(), iv.len(), self.padding)?;
        // Only GCM has a tag; other modes ignore the requested length.
        let tag_len = if config.mode().is_aead() { tag_len } else { 0 };

        let counter = (config.mode() == CipherMode::Ctr).then(|| {
            let mut counter = Counter128::new();
            counter.init(iv);
            counter
        });
        let backend_iv = match (&counter, iv.is_empty()) {
            (Some(counter), _) => Some(&counter.initial_block()[..]),
            (None, true) => None,
            (None, false) => Some(iv),
        };

        let primitive = self.provider.select(&config)?;
        let mut transform = self
            .provider
            .transform_init(&primitive, direction, key, backend_iv)?;
        if config.mode().is_paddable() {
            transform.set_padding(config.is_padded());
        }

        tracing::debug!(
            family = ?config.family(),
            mode = ?config.mode(),
            ?direction,
            padded = config.is_padded(),
            tag_len,
            "block cipher initialized"
        );

        self.active = Some(ActiveCipher {
            sizes: SizeCalculator::new(&config, direction, tag_len, &self.engine),
            config,
            transform,
            direction,
            processed: 0,
            tag_len,
            tag: TagStage::new(),
            counter,
            key: Zeroizing::new(key.to_vec()),
            iv: Zeroizing::new(iv.to_vec()),
        });
        Ok(())
    }

    fn active(&self) -> Result<&ActiveCipher<P::Transform>, CryptoError> {
        self.active.as_ref().ok_or(CryptoError::NotInitialized)
    }

    fn active_mut(&mut self) -> Result<&mut ActiveCipher<P::Transform>, CryptoError> {
        self.active.as_mut().ok_or(CryptoError::NotInitialized)
    }

    /// Authenticates additional data. Returns the bytes the backend reports
    /// written, which is zero.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::NotBlockAligned`] for partial blocks in unpadded ECB, CBC or XTS
    /// - [`CryptoError::CtrModeOverflow`] if the CTR counter would be exhausted
    /// - [`CryptoError::InvalidMode`] for any mode other than GCM; the counter
    ///   and byte count are left untouched
    pub fn update_aad(&mut self, input: &[u8]) -> Result<usize, CryptoError> {
        let max_len = self.engine.max_boundary_len;
        let active = self.active_mut()?;
        if input.is_empty() {
            return Ok(0);
        }
        if input.len() > max_len {
            Err(CryptoError::InputTooLongInt32)?;
        }

        active.check_alignment(input.len())?;
        let counter = active.advanced_counter(input.len())?;
        if !active.config.mode().is_aead() {
            tracing::debug!(mode = ?active.config.mode(), "AAD on a mode without authentication");
            Err(CryptoError::InvalidMode)?;
        }

        let written = active.transform.update(input, None)?;
        active.commit(input.len(), counter);
        Ok(written)
    }

    /// Transforms `input` into `output`, returning the bytes written.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::OutputTooSmall`] if `output` cannot take what this
    ///   call may write (see [`update_size`](Self::update_size))
    /// - [`CryptoError::NotBlockAligned`] for partial blocks in unpadded ECB, CBC or XTS
    /// - [`CryptoError::CtrModeOverflow`] if the CTR counter would be exhausted
    pub fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        let max_len = self.engine.max_boundary_len;
        let active = self.active_mut()?;
        if input.is_empty() {
            return Ok(0);
        }
        if input.len() > max_len {
            Err(CryptoError::InputTooLongInt32)?;
        }
        if output.len() > max_len {
            Err(CryptoError::OutputTooLongInt32)?;
        }

        let required = if active.stages_tag() {
            active.releasable(input.len())
        } else if active.config.is_streaming() {
            input.len()
        } else {
            input
                .len()
                .max(active.sizes.update_size(active.processed, input.len())?)
        };
        if output.len() < required {
            Err(CryptoError::OutputTooSmall)?;
        }

        active.check_alignment(input.len())?;
        let counter = active.advanced_counter(input.len())?;

        let written = if active.stages_tag() {
            active.update_staged(input, output)?
        } else {
            active.transform.update(input, Some(output))?
        };
        active.commit(input.len(), counter);
        Ok(written)
    }

    /// Flushes the stream and re-arms the context.
    ///
    /// Encryption appends the GCM tag after the last ciphertext bytes.
    /// Decryption verifies the staged GCM tag.
    ///
    /// Argument errors ([`CryptoError::OutputTooLongInt32`],
    /// [`CryptoError::OutputTooSmall`]) leave the stream untouched. Once the
    /// backend has been asked to finish, the context is re-armed whether or
    /// not finishing succeeded.
    pub fn finalize(&mut self, output: &mut [u8]) -> Result<usize, CryptoError> {
        let max_len = self.engine.max_boundary_len;
        let active = self.active_mut()?;
        if output.len() > max_len {
            Err(CryptoError::OutputTooLongInt32)?;
        }
        if output.len() < active.sizes.final_minimum(active.processed)? {
            Err(CryptoError::OutputTooSmall)?;
        }

        let result = active.finish(output);
        self.rearm();
        result
    }

    /// Re-runs `init` with the retained direction, key, IV and tag length.
    fn rearm(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        let iv = (!active.iv.is_empty()).then_some(&active.iv[..]);
        if let Err(err) = self.init(active.direction, &active.key, iv, active.tag_len) {
            tracing::warn!(?err, "re-arming after final failed; context is unconfigured");
        }
    }

    /// Upper bound on the bytes the next `update` of `len` bytes writes.
    pub fn update_size(&self, len: usize) -> Result<usize, CryptoError> {
        let active = self.active()?;
        active.sizes.update_size(active.processed, len)
    }

    /// Output size of an `update` of `len` bytes followed by `finalize`.
    pub fn final_size(&self, len: usize) -> Result<usize, CryptoError> {
        let active = self.active()?;
        active.sizes.final_size(active.processed, len)
    }

    pub fn block_size(&self) -> Result<usize, CryptoError> {
        Ok(self.active()?.config.block_size())
    }

    /// Hands an expected authentication tag straight to the backend.
    pub fn set_tag(&mut self, tag: &[u8]) -> Result<(), CryptoError> {
        let active = self.active_mut()?;
        if tag.len() > MAX_TAG_LEN {
            Err(CryptoError::InvalidTagLen)?;
        }
        active.transform.set_tag(tag)
    }

    pub fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    pub fn family(&self) -> CipherFamily {
        self.family
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn config(&self) -> Option<&CipherConfig> {
        self.active.as_ref().map(|a| &a.config)
    }

    pub fn direction(&self) -> Option<Direction> {
        self.active.as_ref().map(|a| a.direction)
    }

    /// Bytes accepted since the last (re)initialization.
    pub fn processed(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.processed)
    }

    pub fn tag_len(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.tag_len)
    }

    pub fn counter(&self) -> Option<&Counter128> {
        self.active.as_ref().and_then(|a| a.counter.as_ref())
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: CipherProvider> std::fmt::Debug for StreamCipherContext<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCipherContext")
            .field("family", &self.family)
            .field("mode", &self.mode)
            .field("padding", &self.padding)
            .field("direction", &self.direction())
            .field("processed", &self.processed())
            .finish_non_exhaustive()
    }
}
