//! Host capability provider
//!
//! Probes never touch the machine directly. They ask a [`Host`] for each
//! capability, so the same probes run against the local machine
//! ([`NativeHost`]) or a scripted environment in tests.
//!
//! Native detection uses sysinfo plus platform-specific sources:
//! - Linux: sysfs (DRM, power_supply, framebuffer), /dev nodes, lspci
//! - macOS: system_profiler, pmset, defaults
//! - Windows: WMI via wmic

mod battery;
mod decoy;
mod display;
mod gpu;
mod locale;
#[cfg(test)]
pub mod mock;
mod permissions;

use std::net::UdpSocket;
use sysinfo::System;

use crate::error::ProbeError;

pub use decoy::DecoyId;
pub use permissions::{Permission, PermissionState};

/// Outcome of trying to create a hardware-accelerated graphics context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsContext {
    /// No accelerated context could be created
    Unavailable,
    /// A context exists but the renderer identifier cannot be unmasked
    Masked,
    /// A context exists and reports this renderer
    Renderer(String),
}

impl GraphicsContext {
    pub fn is_available(&self) -> bool {
        !matches!(self, GraphicsContext::Unavailable)
    }
}

/// Battery charge snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryStatus {
    /// Charge level between 0.0 and 1.0
    pub level: f64,
    /// Whether the battery is on external power
    pub charging: bool,
}

/// Screen and display properties
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayInfo {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Orientation type, e.g. "landscape-primary"
    pub orientation: Option<String>,
    pub color_depth: Option<u32>,
    pub pixel_ratio: Option<f64>,
    pub dark_mode: bool,
    pub touch: bool,
}

/// Read-only capability queries against the environment being diagnosed.
///
/// All methods may block; the collector calls them off the async workers.
pub trait Host: Send + Sync {
    /// Logical processor count, if the host reports one
    fn logical_processors(&self) -> Option<usize>;

    fn graphics_context(&self) -> GraphicsContext;

    fn user_agent(&self) -> String;

    fn platform(&self) -> String;

    /// BCP 47 language tag
    fn language(&self) -> String;

    /// IANA timezone name
    fn timezone(&self) -> String;

    fn cookies_enabled(&self) -> bool;

    /// Whether peer-to-peer connections can be established
    fn peer_connection_supported(&self) -> bool;

    fn display(&self) -> DisplayInfo;

    /// Battery status. [`ProbeError::Unsupported`] when no battery capability exists.
    fn battery(&self) -> Result<BatteryStatus, ProbeError>;

    fn permission_state(&self, permission: Permission) -> Result<PermissionState, ProbeError>;

    /// Insert a decoy styled like an advertisement container
    fn insert_decoy(&self) -> DecoyId;

    /// Rendered height of a decoy; zero when a blocking rule hid it
    fn decoy_height(&self, decoy: DecoyId) -> u32;

    fn remove_decoy(&self, decoy: DecoyId);
}

/// Settings the native host takes from configuration
#[derive(Debug, Clone)]
pub struct HostSettings {
    /// Replaces the synthesized user agent when set
    pub user_agent: Option<String>,
    /// Ad-serving hostname used as the decoy
    pub decoy_host: String,
    /// Hostname that must resolve before a missing decoy counts as blocked
    pub control_host: String,
    /// Whether the HTTP client keeps a cookie store
    pub cookie_store: bool,
}

/// The machine this process runs on
pub struct NativeHost {
    settings: HostSettings,
    decoys: decoy::DecoyBoard,
}

impl NativeHost {
    pub fn new(settings: HostSettings) -> Self {
        NativeHost {
            decoys: decoy::DecoyBoard::new(&settings.control_host),
            settings,
        }
    }
}

impl Host for NativeHost {
    fn logical_processors(&self) -> Option<usize> {
        let mut sys = System::new();
        sys.refresh_cpu_all();

        match sys.cpus().len() {
            0 => std::thread::available_parallelism()
                .ok()
                .map(|count| count.get()),
            count => Some(count),
        }
    }

    fn graphics_context(&self) -> GraphicsContext {
        gpu::detect_graphics_context()
    }

    fn user_agent(&self) -> String {
        match self.settings.user_agent.as_deref().map(str::trim) {
            Some(custom) if !custom.is_empty() => custom.to_string(),
            _ => native_user_agent(),
        }
    }

    fn platform(&self) -> String {
        let os = match std::env::consts::OS {
            "linux" => "Linux",
            "windows" => "Windows",
            "macos" => "macOS",
            "android" => "Android",
            "ios" => "iOS",
            other => other,
        };
        format!("{} {}", os, std::env::consts::ARCH)
    }

    fn language(&self) -> String {
        locale::detect_language()
    }

    fn timezone(&self) -> String {
        locale::detect_timezone()
    }

    fn cookies_enabled(&self) -> bool {
        self.settings.cookie_store
    }

    fn peer_connection_supported(&self) -> bool {
        UdpSocket::bind(("0.0.0.0", 0)).is_ok()
    }

    fn display(&self) -> DisplayInfo {
        display::detect_display()
    }

    fn battery(&self) -> Result<BatteryStatus, ProbeError> {
        battery::detect_battery()
    }

    fn permission_state(&self, permission: Permission) -> Result<PermissionState, ProbeError> {
        permissions::query(permission)
    }

    fn insert_decoy(&self) -> DecoyId {
        self.decoys.insert(&self.settings.decoy_host)
    }

    fn decoy_height(&self, decoy: DecoyId) -> u32 {
        self.decoys.rendered_height(decoy)
    }

    fn remove_decoy(&self, decoy: DecoyId) {
        self.decoys.remove(decoy);
    }
}

/// Synthesize a user agent in the familiar `product/version (system)` shape
fn native_user_agent() -> String {
    let version = System::os_version().unwrap_or_default();
    let arch = std::env::consts::ARCH;

    let system = match std::env::consts::OS {
        "windows" => format!("Windows NT {}; {}", version, arch),
        "macos" => format!("Macintosh; Mac OS X {}", version),
        "android" => format!("Linux; Android {}", version),
        "ios" => format!("iPhone; iOS {}", version),
        "linux" => format!("X11; Linux {}", arch),
        other => format!("{}; {}", other, arch),
    };

    format!(
        "{}/{} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        system
    )
}
