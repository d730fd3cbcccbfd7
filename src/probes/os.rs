//! Operating-system classification from the user agent

use super::{ProbeContext, ProbeKind, ProbeOutput};
use crate::report::{Slot, UNKNOWN};

/// Checked in order; the first contained marker wins
const OS_MARKERS: [(&str, &str); 5] = [
    ("Windows", "Windows"),
    ("Mac", "macOS"),
    ("Linux", "Linux"),
    ("Android", "Android"),
    ("iOS", "iOS"),
];

/// Classify a user agent into Windows, macOS, Linux, Android, iOS or Unknown
pub fn classify_os(user_agent: &str) -> &'static str {
    OS_MARKERS
        .iter()
        .find(|(marker, _)| user_agent.contains(marker))
        .map(|(_, os)| *os)
        .unwrap_or(UNKNOWN)
}

pub(super) fn os_classification(ctx: &ProbeContext) -> ProbeOutput {
    let mut output = ProbeOutput::new(ProbeKind::OsClassification);
    output.set(Slot::OsVersion, classify_os(&ctx.host.user_agent()));
    output
}
