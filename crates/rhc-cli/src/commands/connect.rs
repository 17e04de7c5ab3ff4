use std::io::Write;

use rhc_core::{
    Clients, CredentialFlags, CredentialResolver, NoopObserver, Orchestrator, Prompter,
    StepObserver,
};

use crate::client::{AppContext, CliError, CliResult};
use crate::output::{ConnectReport, FOOTER, Printer, StepReport, timing_table, to_json_line};

pub(crate) async fn handle_connect<P: Prompter>(
    ctx: &AppContext,
    clients: Clients<'_>,
    hostname: &str,
    flags: CredentialFlags,
    prompter: P,
    out: &mut (dyn Write + Send),
) -> CliResult<()> {
    let printer = Printer::new(out, ctx.theme);
    if !ctx.is_json() {
        printer.write(&format!(
            "Connecting {hostname} to Red Hat.\nThis might take a few seconds.\n\n"
        ));
    }

    let credentials = CredentialResolver::new(prompter)
        .resolve(flags)
        .map_err(CliError::failure)?;

    let observer: &dyn StepObserver = if ctx.is_json() {
        &NoopObserver
    } else {
        &printer
    };
    let outcome = Orchestrator::new(clients)
        .connect(&credentials, observer)
        .await;

    if ctx.is_json() {
        let report = ConnectReport {
            hostname,
            connected: outcome.is_success(),
            aborted: outcome.aborted,
            steps: outcome.steps.iter().map(StepReport::from).collect(),
        };
        printer.write(&to_json_line(&report)?);
    } else if outcome.is_success() {
        printer.write("\nSuccessfully connected to Red Hat!\n");
        printer.write(FOOTER);
        if ctx.show_timings() {
            printer.write(&timing_table(&outcome.steps));
        }
    }

    match outcome.into_failure() {
        Some(failure) => Err(CliError::failure(failure)),
        None => Ok(()),
    }
}
