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
#![allow(clippy::redundant_pub_crate)]

//! Command-line interface for connecting a host to Red Hat.
//!
//! Layout:
//! - `cli.rs`: argument parsing and command dispatch
//! - `commands/`: connect, disconnect, status and canonical-facts handlers
//! - `client.rs`: errors, tool configuration and per-invocation context
//! - `output.rs`: theme, live step rendering and report formatting
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod output;

pub use cli::run;
