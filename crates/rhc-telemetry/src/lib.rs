//! Logging setup and invocation context shared by the rhc binaries.
//!
//! Layout: `init.rs` (subscriber installation, level and format parsing),
//! `context.rs` (per-invocation command span), `error.rs` (telemetry errors).
#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

pub mod context;
pub mod error;
pub mod init;

pub use context::CommandContextGuard;
pub use error::{Result, TelemetryError};
pub use init::{LogFormat, LogLevel, LoggingConfig, build_sha, init_logging};
