//! Concurrency-count, graphics-renderer and hardware-acceleration probes

use super::{enabled, ProbeContext, ProbeKind, ProbeOutput};
use crate::host::GraphicsContext;
use crate::report::{Slot, UNKNOWN};

pub(super) fn concurrency_count(ctx: &ProbeContext) -> ProbeOutput {
    let mut output = ProbeOutput::new(ProbeKind::ConcurrencyCount);
    let cores = ctx
        .host
        .logical_processors()
        .filter(|count| *count > 0)
        .map(|count| count.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());
    output.set(Slot::CpuCores, cores);
    output
}

pub(super) fn graphics_renderer(ctx: &ProbeContext) -> ProbeOutput {
    let mut output = ProbeOutput::new(ProbeKind::GraphicsRenderer);
    let renderer = match ctx.host.graphics_context() {
        GraphicsContext::Renderer(name) => name,
        GraphicsContext::Masked => "Unavailable (no renderer info)".to_string(),
        GraphicsContext::Unavailable => "Unavailable (no graphics context)".to_string(),
    };
    output.set(Slot::Gpu, renderer);
    output
}

pub(super) fn hardware_acceleration(ctx: &ProbeContext) -> ProbeOutput {
    let mut output = ProbeOutput::new(ProbeKind::HardwareAcceleration);
    output.set(
        Slot::HardwareAccel,
        enabled(ctx.host.graphics_context().is_available()),
    );
    output
}
