//! Public-address and location probes

use tracing::error;

use super::{ProbeContext, ProbeKind, ProbeOutput};
use crate::report::Slot;

pub(super) async fn public_address(ctx: &ProbeContext) -> ProbeOutput {
    let mut output = ProbeOutput::new(ProbeKind::PublicAddress);
    match ctx.services.public_ip().await {
        Ok(ip) => output.set(Slot::IpWan, ip),
        Err(err) => {
            error!("Error fetching public IP: {err}");
            output.set(Slot::IpWan, err.display_fallback());
        }
    }
    output
}

pub(super) async fn location(ctx: &ProbeContext) -> ProbeOutput {
    let mut output = ProbeOutput::new(ProbeKind::Location);
    match ctx.services.location().await {
        Ok(location) => output.set(Slot::Location, location.to_string()),
        Err(err) => {
            error!("Error fetching location: {err}");
            output.set(Slot::Location, err.display_fallback());
        }
    }
    output
}
