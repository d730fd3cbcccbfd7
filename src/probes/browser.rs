//! Browser-info probe: agent, platform, locale and connectivity capabilities

use regex::Regex;
use std::sync::OnceLock;

use super::{enabled, ProbeContext, ProbeKind, ProbeOutput};
use crate::report::Slot;

fn mobile_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)Mobi|Android").expect("valid mobile pattern"))
}

/// "Mobile" when the agent mentions Mobi or Android, in any case
pub(crate) fn device_type(user_agent: &str) -> &'static str {
    if mobile_pattern().is_match(user_agent) {
        "Mobile"
    } else {
        "Desktop"
    }
}

pub(super) fn browser_info(ctx: &ProbeContext) -> ProbeOutput {
    let mut output = ProbeOutput::new(ProbeKind::BrowserInfo);
    let host = &ctx.host;
    let user_agent = host.user_agent();

    output.set(Slot::DeviceType, device_type(&user_agent));
    output.set(Slot::UserAgent, user_agent);
    output.set(Slot::Platform, host.platform());
    output.set(Slot::Language, host.language());
    output.set(Slot::Timezone, host.timezone());
    output.set(Slot::Cookies, enabled(host.cookies_enabled()));
    output.set(
        Slot::WebrtcSupport,
        if host.peer_connection_supported() {
            "Supported"
        } else {
            "Not Supported"
        },
    );
    output
}
