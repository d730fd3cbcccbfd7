//! Battery level and charging probe

use tracing::error;

use super::{yes_no, ProbeContext, ProbeKind, ProbeOutput};
use crate::error::ProbeError;
use crate::report::Slot;

pub(super) fn battery(ctx: &ProbeContext) -> ProbeOutput {
    let mut output = ProbeOutput::new(ProbeKind::Battery);
    match ctx.host.battery() {
        Ok(status) => {
            output.set(Slot::BatteryLevel, format_level(status.level));
            output.set(Slot::BatteryCharging, yes_no(status.charging));
        }
        Err(err @ ProbeError::Unsupported(_)) => {
            output.fill(err.display_fallback());
        }
        Err(err) => {
            error!("Error fetching battery info: {err}");
            output.fill(err.display_fallback());
        }
    }
    output
}

/// Charge level as a rounded percentage
fn format_level(level: f64) -> String {
    format!("{}%", (level.clamp(0.0, 1.0) * 100.0).round() as u32)
}
