// Copyright (C) Microsoft Corporation. All rights reserved.

//! Run-time engine settings.

/// Settings carried by every [`StreamCipherContext`](crate::StreamCipherContext).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Largest length that may cross the native boundary.
    ///
    /// Input lengths, output capacities and computed sizes above this value
    /// are rejected with the matching width error. Defaults to `i32::MAX`.
    pub max_boundary_len: usize,
}

impl EngineConfig {
    /// Width limit of the 32-bit signed boundary.
    pub const BOUNDARY_MAX: usize = i32::MAX as usize;

    pub fn with_max_boundary_len(mut self, max_boundary_len: usize) -> Self {
        self.max_boundary_len = max_boundary_len;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_boundary_len: Self::BOUNDARY_MAX,
        }
    }
}
