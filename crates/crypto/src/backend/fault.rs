// Copyright (C) Microsoft Corporation. All rights reserved.

//! Provider decorator that fails chosen backend calls on demand.

use std::sync::Arc;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use super::*;

/// Backend call sites a [`FaultPlan`] can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FaultPoint {
    Select = 1 << 0,
    Init = 1 << 1,
    Update = 1 << 2,
    Aad = 1 << 3,
    Final = 1 << 4,
    GetTag = 1 << 5,
    SetTag = 1 << 6,
}

/// Set of armed fault points shared between a test and its provider.
#[derive(Debug, Default)]
pub struct FaultPlan {
    armed: AtomicU32,
}

impl FaultPlan {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn arm(&self, point: FaultPoint) {
        self.armed.fetch_or(point as u32, Ordering::SeqCst);
    }

    pub fn disarm(&self, point: FaultPoint) {
        self.armed.fetch_and(!(point as u32), Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.armed.store(0, Ordering::SeqCst);
    }

    fn check(&self, point: FaultPoint) -> Result<(), CryptoError> {
        if self.armed.load(Ordering::SeqCst) & point as u32 != 0 {
            tracing::debug!(?point, "injected backend failure");
            Err(CryptoError::OpensslError)
        } else {
            Ok(())
        }
    }
}

/// Wraps a provider and fails the call sites armed in its [`FaultPlan`].
pub struct FaultInjectingProvider<P> {
    inner: P,
    plan: Arc<FaultPlan>,
}

impl<P: CipherProvider> FaultInjectingProvider<P> {
    pub fn new(inner: P, plan: Arc<FaultPlan>) -> Self {
        Self { inner, plan }
    }
}

impl<P: CipherProvider> CipherProvider for FaultInjectingProvider<P> {
    type Primitive = P::Primitive;
    type Transform = FaultInjectingTransform<P::Transform>;

    fn select(&self, config: &CipherConfig) -> Result<Self::Primitive, CryptoError> {
        self.plan.check(FaultPoint::Select)?;
        self.inner.select(config)
    }

    fn transform_init(
        &self,
        primitive: &Self::Primitive,
        direction: Direction,
        key: &[u8],
        iv: Option<&[u8]>,
    ) -> Result<Self::Transform, CryptoError> {
        self.plan.check(FaultPoint::Init)?;
        let inner = self.inner.transform_init(primitive, direction, key, iv)?;
        Ok(FaultInjectingTransform {
            inner,
            plan: Arc::clone(&self.plan),
        })
    }

    fn version(&self) -> &str {
        self.inner.version()
    }
}

pub struct FaultInjectingTransform<T> {
    inner: T,
    plan: Arc<FaultPlan>,
}

impl<T: CipherTransform> CipherTransform for FaultInjectingTransform<T> {
    fn set_padding(&mut self, padded: bool) {
        self.inner.set_padding(padded);
    }

    fn update(&mut self, input: &[u8], output: Option<&mut [u8]>) -> Result<usize, CryptoError> {
        let point = if output.is_some() {
            FaultPoint::Update
        } else {
            FaultPoint::Aad
        };
        self.plan.check(point)?;
        self.inner.update(input, output)
    }

    fn finalize(&mut self, output: &mut [u8]) -> Result<usize, CryptoError> {
        self.plan.check(FaultPoint::Final)?;
        self.inner.finalize(output)
    }

    fn tag(&self, tag: &mut [u8]) -> Result<(), CryptoError> {
        self.plan.check(FaultPoint::GetTag)?;
        self.inner.tag(tag)
    }

    fn set_tag(&mut self, tag: &[u8]) -> Result<(), CryptoError> {
        self.plan.check(FaultPoint::SetTag)?;
        self.inner.set_tag(tag)
    }
}
