//! Display-info probe

use super::{enabled, yes_no, ProbeContext, ProbeKind, ProbeOutput};
use crate::report::{Slot, UNKNOWN};

pub(super) fn display_info(ctx: &ProbeContext) -> ProbeOutput {
    let mut output = ProbeOutput::new(ProbeKind::DisplayInfo);
    let info = ctx.host.display();

    let resolution = match (info.width, info.height) {
        (Some(width), Some(height)) => format!("{width}x{height}"),
        _ => UNKNOWN.to_string(),
    };
    output.set(Slot::Resolution, resolution);
    output.set(
        Slot::Orientation,
        info.orientation.unwrap_or_else(|| UNKNOWN.to_string()),
    );
    output.set(
        Slot::ColorDepth,
        info.color_depth
            .map(|bits| format!("{bits} bits"))
            .unwrap_or_else(|| UNKNOWN.to_string()),
    );
    output.set(
        Slot::PixelRatio,
        info.pixel_ratio
            .map(|ratio| ratio.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string()),
    );
    output.set(Slot::DarkMode, enabled(info.dark_mode));
    output.set(Slot::Touch, yes_no(info.touch));
    output
}
