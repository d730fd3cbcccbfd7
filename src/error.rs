//! Probe error taxonomy
//!
//! Every probe failure is recovered locally: the error is logged and the
//! probe's slots receive a fallback display string instead.

use std::time::Duration;
use thiserror::Error;

use crate::report::{NOT_SUPPORTED, UNAVAILABLE};

/// Errors produced while running a single probe
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Service error: HTTP {status}")]
    Status { status: u16 },

    #[error("Service rejected the lookup: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Deadline of {0:?} exceeded")]
    Timeout(Duration),

    #[error("Capability not supported: {0}")]
    Unsupported(String),

    #[error("Capability query failed: {0}")]
    Query(String),
}

impl ProbeError {
    /// Display string written to a slot when its probe fails with this error
    pub fn display_fallback(&self) -> &'static str {
        match self {
            ProbeError::Unsupported(_) => NOT_SUPPORTED,
            _ => UNAVAILABLE,
        }
    }

    /// Map a reqwest failure, folding its own timeout into [`ProbeError::Timeout`]
    pub(crate) fn from_request(err: reqwest::Error, deadline: Duration) -> Self {
        if err.is_timeout() {
            ProbeError::Timeout(deadline)
        } else {
            ProbeError::Network(err)
        }
    }
}
