// Copyright (C) Microsoft Corporation. All rights reserved.

//! Test attribute that routes `tracing` and `log` output of a test into the
//! libtest capture buffer.
//!
//! ```ignore
//! use test_with_tracing::test;
//!
//! #[test]
//! fn gcm_round_trip() {
//!     tracing::debug!("visible with --nocapture or on failure");
//! }
//! ```

// Test support only; `expect` is tolerated here, `unwrap` is not.
#![allow(clippy::expect_used)]

#[cfg(test)]
extern crate self as test_with_tracing;

pub use test_with_tracing_macro::test;
#[doc(hidden)]
pub use tracing;
use tracing::metadata::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

/// Level used when `RUST_LOG` is not set.
const DEFAULT_LEVEL: LevelFilter = LevelFilter::DEBUG;

fn targets() -> Targets {
    match std::env::var("RUST_LOG") {
        Ok(var) => var
            .parse()
            .expect("RUST_LOG is not a valid target filter"),
        Err(_) => Targets::new().with_default(DEFAULT_LEVEL),
    }
}

#[doc(hidden)]
/// Installs the global subscriber once per test binary.
pub fn init() {
    static ONCE: std::sync::Once = std::sync::Once::new();

    ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .pretty()
            .with_ansi(false)
            .with_test_writer()
            .with_max_level(LevelFilter::TRACE)
            .with_thread_ids(true)
            .with_target(true)
            .finish()
            .with(targets())
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::test;

    #[test]
    fn tracing_and_log_are_captured() {
        tracing::info!(answer = 42, "tracing event");
        log::info!("log record");
    }

    #[test]
    fn span_carries_test_name() {
        let span = tracing::Span::current();
        assert_eq!(
            span.metadata().map(|m| m.name()),
            Some("span_carries_test_name")
        );
    }

    #[test]
    fn result_returning_test() -> Result<(), std::num::ParseIntError> {
        let n: u8 = "16".parse()?;
        assert_eq!(n, 16);
        Ok(())
    }
}
