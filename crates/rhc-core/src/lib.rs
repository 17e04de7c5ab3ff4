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

//! Connection orchestration and status aggregation for a host's
//! subscription, Insights and daemon subsystems.
//!
//! Layout: `model.rs` (value types), `error.rs` (client/connector errors),
//! `client.rs` (subsystem traits), `credentials.rs` (flag/prompt resolution),
//! `orchestrator.rs` (connect/disconnect runs), `status.rs` (status snapshot).

pub mod client;
pub mod credentials;
pub mod error;
pub mod host;
pub mod model;
pub mod orchestrator;
pub mod status;

pub use client::{Clients, DaemonClient, SubscriptionClient, TelemetryClient};
pub use credentials::{CredentialFlags, CredentialResolver, Prompter, TerminalPrompter};
pub use error::{
    ClientError, ClientResult, ConnectorError, ConnectorResult, SubsystemError,
};
pub use model::{
    ConnectOutcome, Credentials, DisconnectOutcome, StatusSnapshot, StepAction, StepNote,
    StepResult, Subsystem, TelemetryState,
};
pub use orchestrator::{
    BestEffort, FailFast, Flow, NoopObserver, Orchestrator, StepObserver, StepPolicy, StepRunner,
};
pub use status::{StatusAggregator, StatusObserver};
