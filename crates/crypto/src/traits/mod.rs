// Copyright (C) Microsoft Corporation. All rights reserved.

//! Contract between the streaming engine and a cipher backend.
//!
//! The engine never performs a block transform itself. It validates
//! configuration, sizes buffers, stages GCM tags and guards CTR counters, then
//! hands the actual work to a [`CipherProvider`] and the [`CipherTransform`]
//! values it creates.
//!
//! # Lifecycle
//!
//! 1. [`CipherProvider::select`] turns a validated [`CipherConfig`] into a
//!    backend primitive.
//! 2. [`CipherProvider::transform_init`] keys a transform for one direction.
//! 3. [`CipherTransform::update`] runs any number of times.
//! 4. [`CipherTransform::finalize`] flushes buffered state; the transform is
//!    not used again afterwards.

mod transform;

pub use transform::*;

use super::*;
