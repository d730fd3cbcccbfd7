//! Output slots and the aggregated diagnostics report

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::probes::{ProbeKind, ProbeOutput};

/// Written when a probe failed or its service could not be reached
pub const UNAVAILABLE: &str = "Unavailable";
/// Written when the host does not expose the queried capability
pub const NOT_SUPPORTED: &str = "Not supported";
/// Written when a value cannot be determined
pub const UNKNOWN: &str = "Unknown";

/// Named output slot. The serialized key matches the element id on the
/// diagnostics page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Slot {
    IpWan,
    Location,
    CpuCores,
    Gpu,
    HardwareAccel,
    OsVersion,
    BatteryLevel,
    BatteryCharging,
    Resolution,
    Orientation,
    ColorDepth,
    PixelRatio,
    DarkMode,
    Touch,
    UserAgent,
    Platform,
    Language,
    Timezone,
    Cookies,
    WebrtcSupport,
    DeviceType,
    Adblock,
    MicPermission,
    CameraPermission,
    NotificationsPermission,
}

impl Slot {
    pub const ALL: [Slot; 25] = [
        Slot::IpWan,
        Slot::Location,
        Slot::CpuCores,
        Slot::Gpu,
        Slot::HardwareAccel,
        Slot::OsVersion,
        Slot::BatteryLevel,
        Slot::BatteryCharging,
        Slot::Resolution,
        Slot::Orientation,
        Slot::ColorDepth,
        Slot::PixelRatio,
        Slot::DarkMode,
        Slot::Touch,
        Slot::UserAgent,
        Slot::Platform,
        Slot::Language,
        Slot::Timezone,
        Slot::Cookies,
        Slot::WebrtcSupport,
        Slot::DeviceType,
        Slot::Adblock,
        Slot::MicPermission,
        Slot::CameraPermission,
        Slot::NotificationsPermission,
    ];

    /// Page element id for this slot
    pub fn key(self) -> &'static str {
        match self {
            Slot::IpWan => "ip-wan",
            Slot::Location => "location",
            Slot::CpuCores => "cpu-cores",
            Slot::Gpu => "gpu",
            Slot::HardwareAccel => "hardware-accel",
            Slot::OsVersion => "os-version",
            Slot::BatteryLevel => "battery-level",
            Slot::BatteryCharging => "battery-charging",
            Slot::Resolution => "resolution",
            Slot::Orientation => "orientation",
            Slot::ColorDepth => "color-depth",
            Slot::PixelRatio => "pixel-ratio",
            Slot::DarkMode => "dark-mode",
            Slot::Touch => "touch",
            Slot::UserAgent => "user-agent",
            Slot::Platform => "platform",
            Slot::Language => "language",
            Slot::Timezone => "timezone",
            Slot::Cookies => "cookies",
            Slot::WebrtcSupport => "webrtc-support",
            Slot::DeviceType => "device-type",
            Slot::Adblock => "adblock",
            Slot::MicPermission => "mic-permission",
            Slot::CameraPermission => "camera-permission",
            Slot::NotificationsPermission => "notifications-permission",
        }
    }

    /// Human-readable label used by the text report
    pub fn label(self) -> &'static str {
        match self {
            Slot::IpWan => "Public IP",
            Slot::Location => "Location",
            Slot::CpuCores => "CPU Cores",
            Slot::Gpu => "GPU",
            Slot::HardwareAccel => "HW Acceleration",
            Slot::OsVersion => "Operating System",
            Slot::BatteryLevel => "Battery Level",
            Slot::BatteryCharging => "Charging",
            Slot::Resolution => "Resolution",
            Slot::Orientation => "Orientation",
            Slot::ColorDepth => "Color Depth",
            Slot::PixelRatio => "Pixel Ratio",
            Slot::DarkMode => "Dark Mode",
            Slot::Touch => "Touch Screen",
            Slot::UserAgent => "User Agent",
            Slot::Platform => "Platform",
            Slot::Language => "Language",
            Slot::Timezone => "Timezone",
            Slot::Cookies => "Cookies",
            Slot::WebrtcSupport => "WebRTC",
            Slot::DeviceType => "Device Type",
            Slot::Adblock => "Ad Blocker",
            Slot::MicPermission => "Microphone",
            Slot::CameraPermission => "Camera",
            Slot::NotificationsPermission => "Notifications",
        }
    }

    /// The probe that exclusively writes this slot
    pub fn owner(self) -> ProbeKind {
        match self {
            Slot::IpWan => ProbeKind::PublicAddress,
            Slot::Location => ProbeKind::Location,
            Slot::CpuCores => ProbeKind::ConcurrencyCount,
            Slot::Gpu => ProbeKind::GraphicsRenderer,
            Slot::HardwareAccel => ProbeKind::HardwareAcceleration,
            Slot::OsVersion => ProbeKind::OsClassification,
            Slot::BatteryLevel | Slot::BatteryCharging => ProbeKind::Battery,
            Slot::Resolution
            | Slot::Orientation
            | Slot::ColorDepth
            | Slot::PixelRatio
            | Slot::DarkMode
            | Slot::Touch => ProbeKind::DisplayInfo,
            Slot::UserAgent
            | Slot::Platform
            | Slot::Language
            | Slot::Timezone
            | Slot::Cookies
            | Slot::WebrtcSupport
            | Slot::DeviceType => ProbeKind::BrowserInfo,
            Slot::Adblock => ProbeKind::AdBlock,
            Slot::MicPermission | Slot::CameraPermission | Slot::NotificationsPermission => {
                ProbeKind::Permissions
            }
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Aggregated result of one collection run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// When the collection started (UTC)
    pub collected_at: DateTime<Utc>,
    /// Slot key to display string
    pub slots: BTreeMap<Slot, String>,
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

impl Report {
    pub fn new() -> Self {
        Report {
            collected_at: Utc::now(),
            slots: BTreeMap::new(),
        }
    }

    /// Merge a probe's output. Later writes to the same slot win.
    pub fn record(&mut self, output: ProbeOutput) {
        for (slot, value) in output.values {
            self.slots.insert(slot, value);
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }

    /// Slots no probe has written
    pub fn unset_slots(&self) -> Vec<Slot> {
        Slot::ALL
            .into_iter()
            .filter(|slot| !self.slots.contains_key(slot))
            .collect()
    }

    /// Display the report as a boxed text table grouped by probe
    pub fn display(&self) -> String {
        const WIDTH: usize = 72;
        const LABEL_WIDTH: usize = 18;
        let mut output = String::new();

        output.push_str(&format!("╔{}╗\n", "═".repeat(WIDTH)));
        output.push_str(&format!("║{:^WIDTH$}║\n", "SYSTEM DIAGNOSTICS"));

        let format_line = |label: &str, content: &str| -> String {
            let content_width = WIDTH.saturating_sub(LABEL_WIDTH + 2);
            let content: String = if content.chars().count() > content_width {
                let mut cut: String = content.chars().take(content_width - 3).collect();
                cut.push_str("...");
                cut
            } else {
                content.to_string()
            };
            format!("║ {label:<LABEL_WIDTH$}{content:<content_width$} ║\n")
        };

        for probe in ProbeKind::ALL {
            output.push_str(&format!("╠{}╣\n", "═".repeat(WIDTH)));
            for slot in probe.slots() {
                let value = self.get(*slot).unwrap_or("(not set)");
                output.push_str(&format_line(&format!("{}:", slot.label()), value));
            }
        }

        output.push_str(&format!("╚{}╝", "═".repeat(WIDTH)));

        output
    }
}
