//! Battery status detection
//!
//! - Linux: /sys/class/power_supply/*/{type,capacity,status}
//! - macOS: pmset -g batt
//! - Windows: WMI Win32_Battery

#[cfg(target_os = "linux")]
use std::fs;
#[cfg(target_os = "linux")]
use std::path::Path;
#[cfg(any(target_os = "macos", target_os = "windows"))]
use std::process::Command;

use super::BatteryStatus;
use crate::error::ProbeError;

#[cfg(target_os = "linux")]
pub(super) fn detect_battery() -> Result<BatteryStatus, ProbeError> {
    read_power_supply(Path::new("/sys/class/power_supply"))
}

#[cfg(target_os = "macos")]
pub(super) fn detect_battery() -> Result<BatteryStatus, ProbeError> {
    let output = Command::new("pmset")
        .args(["-g", "batt"])
        .output()
        .map_err(|err| ProbeError::Unsupported(format!("pmset unavailable: {err}")))?;
    if !output.status.success() {
        return Err(ProbeError::Query("pmset failed".to_string()));
    }
    parse_pmset(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(target_os = "windows")]
pub(super) fn detect_battery() -> Result<BatteryStatus, ProbeError> {
    let output = Command::new("wmic")
        .args([
            "path",
            "Win32_Battery",
            "get",
            "BatteryStatus,EstimatedChargeRemaining",
            "/format:csv",
        ])
        .output()
        .map_err(|err| ProbeError::Unsupported(format!("wmic unavailable: {err}")))?;
    if !output.status.success() {
        return Err(ProbeError::Query("wmic failed".to_string()));
    }
    parse_wmic_battery(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub(super) fn detect_battery() -> Result<BatteryStatus, ProbeError> {
    Err(ProbeError::Unsupported(
        "no battery interface on this platform".to_string(),
    ))
}

/// Find the first supply of type "Battery" under the power_supply class
#[cfg(target_os = "linux")]
fn read_power_supply(class_dir: &Path) -> Result<BatteryStatus, ProbeError> {
    let entries = fs::read_dir(class_dir)
        .map_err(|_| ProbeError::Unsupported("no power_supply class".to_string()))?;

    for entry in entries.flatten() {
        let path = entry.path();
        let kind = fs::read_to_string(path.join("type")).unwrap_or_default();
        if kind.trim() != "Battery" {
            continue;
        }

        let capacity = fs::read_to_string(path.join("capacity"))
            .map_err(|err| ProbeError::Query(format!("{}: {err}", path.display())))?;
        let status = fs::read_to_string(path.join("status")).unwrap_or_default();
        return parse_sysfs_battery(&capacity, &status);
    }

    Err(ProbeError::Unsupported("no battery present".to_string()))
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_sysfs_battery(capacity: &str, status: &str) -> Result<BatteryStatus, ProbeError> {
    let percent: u32 = capacity
        .trim()
        .parse()
        .map_err(|_| ProbeError::Query(format!("invalid capacity: {:?}", capacity.trim())))?;

    Ok(BatteryStatus {
        level: f64::from(percent.min(100)) / 100.0,
        charging: matches!(status.trim(), "Charging" | "Full"),
    })
}

/// Parse: " -InternalBattery-0 (id=4653155)\t85%; charging; 1:02 remaining present: true"
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn parse_pmset(output: &str) -> Result<BatteryStatus, ProbeError> {
    let line = output
        .lines()
        .find(|line| line.contains("InternalBattery"))
        .ok_or_else(|| ProbeError::Unsupported("no internal battery".to_string()))?;

    let details = line.split('\t').nth(1).unwrap_or(line);
    let mut fields = details.split(';').map(str::trim);

    let percent: u32 = fields
        .next()
        .and_then(|field| field.trim_end_matches('%').parse().ok())
        .ok_or_else(|| ProbeError::Query(format!("unparseable pmset line: {line}")))?;
    let state = fields.next().unwrap_or_default();

    Ok(BatteryStatus {
        level: f64::from(percent.min(100)) / 100.0,
        charging: matches!(state, "charging" | "charged" | "finishing charge" | "AC attached"),
    })
}

/// Parse CSV rows: Node,BatteryStatus,EstimatedChargeRemaining
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn parse_wmic_battery(output: &str) -> Result<BatteryStatus, ProbeError> {
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < 3 || parts[1] == "BatteryStatus" {
            continue;
        }

        let status_code: u32 = parts[1]
            .trim()
            .parse()
            .map_err(|_| ProbeError::Query(format!("invalid BatteryStatus: {}", parts[1])))?;
        let percent: u32 = parts[2]
            .trim()
            .parse()
            .map_err(|_| ProbeError::Query(format!("invalid charge: {}", parts[2])))?;

        // BatteryStatus codes: 1=discharging, 2=on AC, 6-9=charging variants
        return Ok(BatteryStatus {
            level: f64::from(percent.min(100)) / 100.0,
            charging: matches!(status_code, 2 | 6 | 7 | 8 | 9),
        });
    }

    Err(ProbeError::Unsupported("no battery reported".to_string()))
}
