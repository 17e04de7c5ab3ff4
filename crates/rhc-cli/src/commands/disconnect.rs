use std::io::Write;

use rhc_core::{Clients, NoopObserver, Orchestrator, StepObserver};
use tracing::warn;

use crate::client::{AppContext, CliError, CliResult};
use crate::output::{
    DisconnectReport, FOOTER, Printer, StepReport, disconnect_error_table, timing_table,
    to_json_line,
};

pub(crate) async fn handle_disconnect(
    ctx: &AppContext,
    clients: Clients<'_>,
    hostname: &str,
    out: &mut (dyn Write + Send),
) -> CliResult<()> {
    let printer = Printer::new(out, ctx.theme);
    if !ctx.is_json() {
        printer.write(&format!(
            "Disconnecting {hostname} from Red Hat.\nThis might take a few seconds.\n\n"
        ));
    }

    let observer: &dyn StepObserver = if ctx.is_json() {
        &NoopObserver
    } else {
        &printer
    };
    let outcome = Orchestrator::new(clients).disconnect(observer).await;
    let failures = outcome.errors().count();
    if failures > 0 {
        warn!(failures, "disconnect finished with errors");
    }

    if ctx.is_json() {
        let report = DisconnectReport {
            hostname,
            disconnected: outcome.is_success(),
            steps: outcome.steps.iter().map(StepReport::from).collect(),
        };
        printer.write(&to_json_line(&report)?);
    } else {
        printer.write(FOOTER);
        if ctx.show_timings() {
            printer.write(&timing_table(&outcome.steps));
        }
        if !outcome.is_success() {
            printer.write(&disconnect_error_table(&outcome));
        }
    }

    if outcome.is_success() {
        Ok(())
    } else {
        Err(CliError::Reported)
    }
}
