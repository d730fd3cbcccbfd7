//! Ad-block probe
//!
//! Best-effort heuristic: insert a decoy, give blocking rules time to act,
//! then check whether the decoy collapsed to zero height.

use std::sync::Arc;
use tracing::{debug, error};

use super::{ProbeContext, ProbeKind, ProbeOutput};
use crate::host::{DecoyId, Host};
use crate::report::{Slot, UNAVAILABLE};

/// Removes the decoy when dropped, whatever happened in between
struct DecoyGuard {
    host: Arc<dyn Host>,
    decoy: DecoyId,
}

impl Drop for DecoyGuard {
    fn drop(&mut self) {
        self.host.remove_decoy(self.decoy);
    }
}

pub(super) async fn detect(ctx: Arc<ProbeContext>) -> ProbeOutput {
    let mut output = ProbeOutput::new(ProbeKind::AdBlock);

    let guard = DecoyGuard {
        decoy: ctx.host.insert_decoy(),
        host: Arc::clone(&ctx.host),
    };
    tokio::time::sleep(ctx.settings.adblock_delay).await;

    let measured = tokio::task::spawn_blocking(move || {
        let height = guard.host.decoy_height(guard.decoy);
        drop(guard);
        height
    })
    .await;

    match measured {
        Ok(height) => {
            debug!(height, "decoy measured");
            output.set(
                Slot::Adblock,
                if height == 0 { "Detected" } else { "Not Detected" },
            );
        }
        Err(err) => {
            error!("Error measuring ad-block decoy: {err}");
            output.set(Slot::Adblock, UNAVAILABLE);
        }
    }

    output
}
