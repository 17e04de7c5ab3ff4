//! Command handlers grouped by concern.

pub(crate) mod connect;
pub(crate) mod disconnect;
pub(crate) mod facts;
pub(crate) mod status;
