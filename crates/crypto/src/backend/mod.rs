// Copyright (C) Microsoft Corporation. All rights reserved.

//! Cipher backends.

#[cfg(test)]
mod fault;

#[cfg(test)]
pub use fault::*;

use super::*;

cfg_if::cfg_if! {
    if #[cfg(feature = "use-openssl")] {
        mod ossl;
        pub use ossl::*;

        /// Provider used when a caller does not pick one.
        pub type DefaultCipherProvider = OsslCipherProvider;
    } else {
        compile_error!("no cipher backend enabled; build with the `use-openssl` feature");
    }
}
