use std::io::Write;

use rhc_clients::FactCollector;
use rhc_core::SubscriptionClient;

use crate::client::{CliError, CliResult};
use crate::output::to_json_line;

/// Print the canonical facts as one compact JSON object.
pub(crate) async fn handle_canonical_facts(
    collector: &FactCollector,
    subscription: &dyn SubscriptionClient,
    out: &mut (dyn Write + Send),
) -> CliResult<()> {
    let facts = collector
        .collect(subscription)
        .await
        .map_err(CliError::failure)?;
    let line = to_json_line(&facts)?;
    out.write_all(line.as_bytes())
        .and_then(|()| out.flush())
        .map_err(CliError::failure)
}
