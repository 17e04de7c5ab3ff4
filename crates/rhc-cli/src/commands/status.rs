use std::io::Write;

use rhc_core::{Clients, NoopObserver, StatusAggregator, StatusObserver};

use crate::client::{AppContext, CliError, CliResult};
use crate::output::{FOOTER, Printer, StatusReport, to_json_line};

pub(crate) async fn handle_status(
    ctx: &AppContext,
    clients: Clients<'_>,
    hostname: &str,
    out: &mut (dyn Write + Send),
) -> CliResult<()> {
    let printer = Printer::new(out, ctx.theme);
    if !ctx.is_json() {
        printer.write(&format!("Connection status for {hostname}:\n\n"));
    }

    let observer: &dyn StatusObserver = if ctx.is_json() {
        &NoopObserver
    } else {
        &printer
    };
    let snapshot = StatusAggregator::new(clients).observe(observer).await;
    printer.stop_spinner();
    let snapshot = snapshot.map_err(CliError::failure)?;

    if ctx.is_json() {
        printer.write(&to_json_line(&StatusReport::new(hostname, &snapshot))?);
    } else {
        printer.write(FOOTER);
    }
    Ok(())
}
