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

//! Shared test helpers used across the rhc suites.
//! Layout: fakes.rs (recording subsystem clients), prompt.rs (scripted prompter).

pub mod fakes;
pub mod prompt;
