//! Theme, live step rendering and report formatting for CLI commands.

use std::error::Error;
use std::io::{IsTerminal, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::anyhow;
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rhc_core::{
    DisconnectOutcome, StatusObserver, StatusSnapshot, StepAction, StepNote, StepObserver,
    StepResult, Subsystem, TelemetryState,
};
use serde::Serialize;
use tracing::debug;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) const FOOTER: &str = "\nManage your Red Hat connector systems: https://red.ht/connector\n";
const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Kind of marker printed in front of a result line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker {
    Success,
    Fail,
    Error,
}

/// Display state chosen once per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Theme {
    colorful: bool,
}

impl Theme {
    pub(crate) const fn plain() -> Self {
        Self { colorful: false }
    }

    pub(crate) const fn colorful() -> Self {
        Self { colorful: true }
    }

    /// Colour and animation only for text output on a terminal without `--no-color`.
    pub(crate) fn detect(no_color: bool, format: OutputFormat) -> Self {
        if no_color || matches!(format, OutputFormat::Json) || !std::io::stdout().is_terminal() {
            Self::plain()
        } else {
            Self::colorful()
        }
    }

    pub(crate) const fn is_colorful(self) -> bool {
        self.colorful
    }

    pub(crate) fn marker(self, marker: Marker) -> String {
        if self.colorful {
            let styled = match marker {
                Marker::Success => style("●").green(),
                Marker::Fail => style("●").red(),
                Marker::Error => style("!").red(),
            };
            styled.force_styling(true).to_string()
        } else {
            match marker {
                Marker::Success => "✓",
                Marker::Fail => "𐄂",
                Marker::Error => "!",
            }
            .to_string()
        }
    }
}

/// Writes command output and renders steps as they finish.
pub(crate) struct Printer<'w> {
    out: Mutex<&'w mut (dyn Write + Send)>,
    theme: Theme,
    spinner: Mutex<Option<ProgressBar>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<'w> Printer<'w> {
    pub(crate) fn new(out: &'w mut (dyn Write + Send), theme: Theme) -> Self {
        Self {
            out: Mutex::new(out),
            theme,
            spinner: Mutex::new(None),
        }
    }

    pub(crate) fn write(&self, text: &str) {
        let mut out = lock(&self.out);
        if let Err(err) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            debug!(error = %err, "stdout write failed");
        }
    }

    pub(crate) fn marked(&self, marker: Marker, message: &str) {
        self.write(&format!("{} {message}\n", self.theme.marker(marker)));
    }

    pub(crate) fn start_spinner(&self, message: &str) {
        if !self.theme.is_colorful() {
            return;
        }
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stdout());
        if let Ok(spinner_style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            bar.set_style(spinner_style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(SPINNER_TICK);
        if let Some(previous) = lock(&self.spinner).replace(bar) {
            previous.finish_and_clear();
        }
    }

    pub(crate) fn stop_spinner(&self) {
        if let Some(bar) = lock(&self.spinner).take() {
            bar.finish_and_clear();
        }
    }
}

impl StepObserver for Printer<'_> {
    fn step_started(&self, subsystem: Subsystem, action: StepAction) {
        self.start_spinner(progress_message(subsystem, action));
    }

    fn step_finished(&self, result: &StepResult, action: StepAction) {
        self.stop_spinner();
        let (marker, message) = step_line(result, action);
        self.marked(marker, &message);
    }
}

impl StatusObserver for Printer<'_> {
    fn query_started(&self, subsystem: Subsystem) {
        if subsystem == Subsystem::Telemetry {
            self.start_spinner("Checking Red Hat Insights...");
        }
    }

    fn subscription_resolved(&self, connected: bool) {
        let (marker, message) = subscription_line(connected);
        self.marked(marker, &message);
    }

    fn telemetry_resolved(&self, state: &TelemetryState) {
        self.stop_spinner();
        let (marker, message) = telemetry_line(state);
        self.marked(marker, &message);
    }

    fn daemon_resolved(&self, active: bool, _state: &str) {
        let (marker, message) = daemon_line(active);
        self.marked(marker, &message);
    }
}

const fn progress_message(subsystem: Subsystem, action: StepAction) -> &'static str {
    match (action, subsystem) {
        (StepAction::Connect, Subsystem::Subscription) => {
            "Connecting to Red Hat Subscription Management..."
        }
        (StepAction::Connect, Subsystem::Telemetry) => "Connecting to Red Hat Insights...",
        (StepAction::Connect, Subsystem::Daemon) => "Activating the rhc daemon",
        (StepAction::Disconnect, Subsystem::Daemon) => "Deactivating the rhc daemon",
        (StepAction::Disconnect, Subsystem::Telemetry) => "Disconnecting from Red Hat Insights...",
        (StepAction::Disconnect, Subsystem::Subscription) => {
            "Disconnecting from Red Hat Subscription Management..."
        }
    }
}

/// Marker and message for a finished step.
pub(crate) fn step_line(result: &StepResult, action: StepAction) -> (Marker, String) {
    if let Some(error) = result.error() {
        return (Marker::Error, capitalize(&error.to_string()));
    }
    let subsystem = result.subsystem();
    let name = subsystem.display_name();
    match (action, subsystem, result.note()) {
        (StepAction::Connect, Subsystem::Subscription, Some(StepNote::AlreadyConnected)) => (
            Marker::Success,
            format!("This system is already connected to {name}"),
        ),
        (StepAction::Connect, Subsystem::Daemon, _) => {
            (Marker::Success, format!("Activated {name}"))
        }
        (StepAction::Connect, _, _) => (Marker::Success, format!("Connected to {name}")),
        (StepAction::Disconnect, Subsystem::Daemon, _) => {
            (Marker::Fail, format!("Deactivated {name}"))
        }
        (StepAction::Disconnect, _, _) => (Marker::Fail, format!("Disconnected from {name}")),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Error message with every cause appended, `outer: inner: ...`.
pub(crate) fn error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Two-column table with columns padded like `tabwriter` (minimum gap of two).
pub(crate) fn table(header: [&str; 2], rows: &[(String, String)]) -> String {
    let width = rows
        .iter()
        .map(|(first, _)| first.chars().count())
        .chain(std::iter::once(header[0].len()))
        .max()
        .unwrap_or_default()
        + 2;
    let mut text = format!("{:<width$}{}\n", header[0], header[1]);
    for (first, second) in rows {
        text.push_str(&format!("{first:<width$}{second}\n"));
    }
    text
}

/// Per-step durations in step order.
pub(crate) fn timing_table(steps: &[StepResult]) -> String {
    let rows: Vec<(String, String)> = steps
        .iter()
        .map(|step| {
            let millis = u64::try_from(step.duration().as_millis()).unwrap_or(u64::MAX);
            (
                step.subsystem().label().to_string(),
                format!("{:?}", Duration::from_millis(millis)),
            )
        })
        .collect();
    format!("\n{}", table(["STEP", "DURATION"], &rows))
}

/// Errors collected during a disconnect, in step order.
pub(crate) fn disconnect_error_table(outcome: &DisconnectOutcome) -> String {
    let rows: Vec<(String, String)> = outcome
        .errors()
        .map(|(subsystem, error)| (subsystem.label().to_string(), error_chain(error)))
        .collect();
    format!(
        "\nThe following errors were encountered during disconnect:\n\n{}",
        table(["STEP", "ERROR"], &rows)
    )
}

/// Result line for the subscription registration state.
pub(crate) fn subscription_line(connected: bool) -> (Marker, String) {
    if connected {
        (
            Marker::Success,
            "Connected to Red Hat Subscription Management".to_string(),
        )
    } else {
        (
            Marker::Fail,
            "Not connected to Red Hat Subscription Management".to_string(),
        )
    }
}

/// Result line for the Insights registration state.
pub(crate) fn telemetry_line(state: &TelemetryState) -> (Marker, String) {
    match state {
        TelemetryState::Connected => (Marker::Success, "Connected to Red Hat Insights".to_string()),
        TelemetryState::Disconnected => {
            (Marker::Fail, "Not connected to Red Hat Insights".to_string())
        }
        TelemetryState::Unknown(err) => (
            Marker::Error,
            format!("Cannot execute insights-client: {}", error_chain(err)),
        ),
    }
}

/// Result line for the daemon state.
pub(crate) fn daemon_line(active: bool) -> (Marker, String) {
    if active {
        (Marker::Success, "The rhc daemon is active".to_string())
    } else {
        (Marker::Fail, "The rhc daemon is inactive".to_string())
    }
}

/// One step in a machine-readable report.
#[derive(Debug, Serialize)]
pub(crate) struct StepReport {
    step: &'static str,
    succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<StepNote>,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&StepResult> for StepReport {
    fn from(step: &StepResult) -> Self {
        Self {
            step: step.subsystem().label(),
            succeeded: step.succeeded(),
            note: step.note(),
            duration_ms: u64::try_from(step.duration().as_millis()).unwrap_or(u64::MAX),
            error: step.error().map(|error| error_chain(error)),
        }
    }
}

/// `connect --format json` document.
#[derive(Debug, Serialize)]
pub(crate) struct ConnectReport<'a> {
    pub(crate) hostname: &'a str,
    pub(crate) connected: bool,
    pub(crate) aborted: bool,
    pub(crate) steps: Vec<StepReport>,
}

/// `disconnect --format json` document.
#[derive(Debug, Serialize)]
pub(crate) struct DisconnectReport<'a> {
    pub(crate) hostname: &'a str,
    pub(crate) disconnected: bool,
    pub(crate) steps: Vec<StepReport>,
}

/// `status --format json` document.
#[derive(Debug, Serialize)]
pub(crate) struct StatusReport<'a> {
    pub(crate) hostname: &'a str,
    pub(crate) rhsm_connected: bool,
    pub(crate) insights_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) insights_error: Option<String>,
    pub(crate) rhcd_running: bool,
    pub(crate) rhcd_state: &'a str,
}

impl<'a> StatusReport<'a> {
    pub(crate) fn new(hostname: &'a str, snapshot: &'a StatusSnapshot) -> Self {
        Self {
            hostname,
            rhsm_connected: snapshot.subscription_connected,
            insights_connected: snapshot.telemetry.is_connected(),
            insights_error: match &snapshot.telemetry {
                TelemetryState::Unknown(err) => Some(error_chain(err)),
                TelemetryState::Connected | TelemetryState::Disconnected => None,
            },
            rhcd_running: snapshot.daemon_active,
            rhcd_state: &snapshot.daemon_state,
        }
    }
}

/// Serialize `value` as one line of JSON.
pub(crate) fn to_json_line<T: Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string(value)
        .map(|text| format!("{text}\n"))
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}
