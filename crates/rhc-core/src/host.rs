//! Host identity helpers.

use crate::error::{ConnectorError, ConnectorResult};

/// The host's name as reported by the operating system.
///
/// # Errors
///
/// Returns [`ConnectorError::Io`] when the hostname cannot be read.
pub fn hostname() -> ConnectorResult<String> {
    let name = ::hostname::get().map_err(|err| ConnectorError::io("hostname lookup", err))?;
    Ok(name.to_string_lossy().into_owned())
}
