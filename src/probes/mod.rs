//! Diagnostic probes
//!
//! Each probe is a single-shot unit: it queries one environmental fact and
//! returns display strings for the slots it owns. Probes never fail outward;
//! errors are logged and mapped to fallback strings.

mod adblock;
mod battery;
mod browser;
mod display;
mod hardware;
mod network;
mod os;
mod permissions;

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use crate::host::Host;
use crate::report::Slot;
use crate::services::ServiceClient;

/// Tuning shared by all probes
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Time the ad-block decoy stays in place before it is measured
    pub adblock_delay: Duration,
    /// Write "Unavailable" to permission slots a failed query left unresolved
    pub permission_fallback: bool,
    /// Longest a full collection waits before reporting what it has
    pub collection_deadline: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            adblock_delay: Duration::from_millis(100),
            permission_fallback: false,
            collection_deadline: Duration::from_secs(30),
        }
    }
}

/// Everything a probe may consult
pub struct ProbeContext {
    pub host: Arc<dyn Host>,
    pub services: ServiceClient,
    pub settings: ProbeSettings,
}

/// Identifier of a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeKind {
    PublicAddress,
    Location,
    ConcurrencyCount,
    GraphicsRenderer,
    HardwareAcceleration,
    OsClassification,
    Battery,
    DisplayInfo,
    BrowserInfo,
    AdBlock,
    Permissions,
}

impl ProbeKind {
    pub const ALL: [ProbeKind; 11] = [
        ProbeKind::PublicAddress,
        ProbeKind::Location,
        ProbeKind::ConcurrencyCount,
        ProbeKind::GraphicsRenderer,
        ProbeKind::HardwareAcceleration,
        ProbeKind::OsClassification,
        ProbeKind::Battery,
        ProbeKind::DisplayInfo,
        ProbeKind::BrowserInfo,
        ProbeKind::AdBlock,
        ProbeKind::Permissions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProbeKind::PublicAddress => "public-address",
            ProbeKind::Location => "location",
            ProbeKind::ConcurrencyCount => "concurrency-count",
            ProbeKind::GraphicsRenderer => "graphics-renderer",
            ProbeKind::HardwareAcceleration => "hardware-acceleration",
            ProbeKind::OsClassification => "os-classification",
            ProbeKind::Battery => "battery",
            ProbeKind::DisplayInfo => "display-info",
            ProbeKind::BrowserInfo => "browser-info",
            ProbeKind::AdBlock => "ad-block",
            ProbeKind::Permissions => "permissions",
        }
    }

    /// Slots this probe exclusively writes
    pub fn slots(self) -> &'static [Slot] {
        match self {
            ProbeKind::PublicAddress => &[Slot::IpWan],
            ProbeKind::Location => &[Slot::Location],
            ProbeKind::ConcurrencyCount => &[Slot::CpuCores],
            ProbeKind::GraphicsRenderer => &[Slot::Gpu],
            ProbeKind::HardwareAcceleration => &[Slot::HardwareAccel],
            ProbeKind::OsClassification => &[Slot::OsVersion],
            ProbeKind::Battery => &[Slot::BatteryLevel, Slot::BatteryCharging],
            ProbeKind::DisplayInfo => &[
                Slot::Resolution,
                Slot::Orientation,
                Slot::ColorDepth,
                Slot::PixelRatio,
                Slot::DarkMode,
                Slot::Touch,
            ],
            ProbeKind::BrowserInfo => &[
                Slot::UserAgent,
                Slot::Platform,
                Slot::Language,
                Slot::Timezone,
                Slot::Cookies,
                Slot::WebrtcSupport,
                Slot::DeviceType,
            ],
            ProbeKind::AdBlock => &[Slot::Adblock],
            ProbeKind::Permissions => &[
                Slot::MicPermission,
                Slot::CameraPermission,
                Slot::NotificationsPermission,
            ],
        }
    }

    /// Run the probe to completion
    pub async fn run(self, ctx: Arc<ProbeContext>) -> ProbeOutput {
        debug!(probe = self.name(), "probe started");

        let output = match self {
            ProbeKind::PublicAddress => network::public_address(&ctx).await,
            ProbeKind::Location => network::location(&ctx).await,
            ProbeKind::AdBlock => adblock::detect(ctx).await,
            ProbeKind::ConcurrencyCount => {
                run_blocking(self, ctx, hardware::concurrency_count).await
            }
            ProbeKind::GraphicsRenderer => {
                run_blocking(self, ctx, hardware::graphics_renderer).await
            }
            ProbeKind::HardwareAcceleration => {
                run_blocking(self, ctx, hardware::hardware_acceleration).await
            }
            ProbeKind::OsClassification => run_blocking(self, ctx, os::os_classification).await,
            ProbeKind::Battery => run_blocking(self, ctx, battery::battery).await,
            ProbeKind::DisplayInfo => run_blocking(self, ctx, display::display_info).await,
            ProbeKind::BrowserInfo => run_blocking(self, ctx, browser::browser_info).await,
            ProbeKind::Permissions => run_blocking(self, ctx, permissions::permissions).await,
        };

        debug!(
            probe = self.name(),
            slots = output.values.len(),
            "probe finished"
        );
        output
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Host queries may block, so synchronous probes run on the blocking pool
async fn run_blocking(
    kind: ProbeKind,
    ctx: Arc<ProbeContext>,
    probe: fn(&ProbeContext) -> ProbeOutput,
) -> ProbeOutput {
    match tokio::task::spawn_blocking(move || probe(&ctx)).await {
        Ok(output) => output,
        Err(err) => {
            error!(probe = kind.name(), "probe task failed: {err}");
            ProbeOutput::new(kind)
        }
    }
}

/// Display strings produced by one probe run
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutput {
    pub probe: ProbeKind,
    pub values: Vec<(Slot, String)>,
}

impl ProbeOutput {
    pub fn new(probe: ProbeKind) -> Self {
        ProbeOutput {
            probe,
            values: Vec::new(),
        }
    }

    /// Write a slot owned by this probe
    pub fn set(&mut self, slot: Slot, value: impl Into<String>) {
        debug_assert!(
            self.probe.slots().contains(&slot),
            "{} does not own slot {}",
            self.probe,
            slot
        );
        self.values.push((slot, value.into()));
    }

    /// Write the same value to every slot this probe owns
    pub(crate) fn fill(&mut self, value: &str) {
        for slot in self.probe.slots() {
            self.set(*slot, value);
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.values
            .iter()
            .rev()
            .find(|(s, _)| *s == slot)
            .map(|(_, value)| value.as_str())
    }
}

/// "Enabled"/"Disabled"
pub(crate) fn enabled(flag: bool) -> &'static str {
    if flag {
        "Enabled"
    } else {
        "Disabled"
    }
}

/// "Yes"/"No"
pub(crate) fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_output_get_returns_latest_write() {
        let mut output = ProbeOutput::new(ProbeKind::Battery);
        output.set(Slot::BatteryLevel, "10%");
        output.set(Slot::BatteryLevel, "20%");
        assert_eq!(output.get(Slot::BatteryLevel), Some("20%"));
        assert_eq!(output.get(Slot::BatteryCharging), None);
    }

    #[test]
    fn test_fill_covers_owned_slots() {
        let mut output = ProbeOutput::new(ProbeKind::Battery);
        output.fill("Not supported");
        assert_eq!(output.get(Slot::BatteryLevel), Some("Not supported"));
        assert_eq!(output.get(Slot::BatteryCharging), Some("Not supported"));
    }

    #[test]
    #[should_panic(expected = "does not own slot")]
    fn test_set_rejects_foreign_slot() {
        let mut output = ProbeOutput::new(ProbeKind::Battery);
        output.set(Slot::IpWan, "1.2.3.4");
    }

    #[test]
    fn test_probe_names_are_unique() {
        let mut names: Vec<_> = ProbeKind::ALL.iter().map(|p| p.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ProbeKind::ALL.len());
    }
}
