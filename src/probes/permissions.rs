//! Permissions probe
//!
//! Queries run in order and stop at the first failure. Slots resolved before
//! the failure keep their state; the rest stay unset unless the fallback is
//! enabled.

use tracing::error;

use super::{ProbeContext, ProbeKind, ProbeOutput};
use crate::host::Permission;
use crate::report::{Slot, UNAVAILABLE};

const QUERIES: [(Permission, Slot); 3] = [
    (Permission::Microphone, Slot::MicPermission),
    (Permission::Camera, Slot::CameraPermission),
    (Permission::Notifications, Slot::NotificationsPermission),
];

pub(super) fn permissions(ctx: &ProbeContext) -> ProbeOutput {
    let mut output = ProbeOutput::new(ProbeKind::Permissions);

    for (index, (permission, slot)) in QUERIES.iter().enumerate() {
        match ctx.host.permission_state(*permission) {
            Ok(state) => output.set(*slot, state.to_string()),
            Err(err) => {
                error!("Error checking permissions: {err}");
                if ctx.settings.permission_fallback {
                    for (_, unresolved) in &QUERIES[index..] {
                        output.set(*unresolved, UNAVAILABLE);
                    }
                }
                break;
            }
        }
    }

    output
}
