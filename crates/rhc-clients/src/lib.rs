//! Subsystem clients that drive the host's management tools.
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

//! Layout: `command.rs` (process runner seam), `subscription.rs`
//! (`subscription-manager`), `insights.rs` (`insights-client`),
//! `daemon.rs` (`systemctl` unit control), `facts.rs` (canonical facts).

pub mod command;
pub mod daemon;
pub mod facts;
pub mod insights;
pub mod subscription;

#[cfg(test)]
pub(crate) mod scripted;

pub use command::{CommandOutput, CommandRunner, TokioCommandRunner};
pub use daemon::{DEFAULT_UNIT, SystemdUnit};
pub use facts::{CanonicalFacts, FactCollector};
pub use insights::InsightsClient;
pub use subscription::SubscriptionManager;
