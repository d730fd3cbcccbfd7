//! Display property detection
//!
//! - Linux: DRM connector modes, framebuffer bits_per_pixel, input devices
//! - macOS: system_profiler, defaults
//! - Windows: WMI Win32_VideoController
//!
//! Pixel ratio and dark mode fall back to toolkit environment variables.

#[cfg(target_os = "linux")]
use std::fs;
#[cfg(target_os = "linux")]
use std::path::Path;
#[cfg(any(target_os = "macos", target_os = "windows"))]
use std::process::Command;

use super::DisplayInfo;

pub(super) fn detect_display() -> DisplayInfo {
    let mut info = DisplayInfo {
        pixel_ratio: pixel_ratio_from_env(),
        dark_mode: dark_mode_from_env(),
        ..DisplayInfo::default()
    };

    #[cfg(target_os = "linux")]
    {
        if let Some((width, height)) = drm_resolution(Path::new("/sys/class/drm")) {
            info.width = Some(width);
            info.height = Some(height);
        }
        info.color_depth = fs::read_to_string("/sys/class/graphics/fb0/bits_per_pixel")
            .ok()
            .and_then(|bits| bits.trim().parse().ok());
        info.touch = fs::read_to_string("/proc/bus/input/devices")
            .map(|devices| has_touchscreen(&devices))
            .unwrap_or(false);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(output) = Command::new("system_profiler")
            .arg("SPDisplaysDataType")
            .output()
        {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if let Some((width, height)) = parse_profiler_resolution(&stdout) {
                info.width = Some(width);
                info.height = Some(height);
            }
            info.color_depth = parse_profiler_depth(&stdout);
            if stdout.contains("Retina") && info.pixel_ratio.is_none() {
                info.pixel_ratio = Some(2.0);
            }
        }
        if let Ok(output) = Command::new("defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
        {
            info.dark_mode |= String::from_utf8_lossy(&output.stdout).trim() == "Dark";
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(output) = Command::new("wmic")
            .args([
                "path",
                "Win32_VideoController",
                "get",
                "CurrentBitsPerPixel,CurrentHorizontalResolution,CurrentVerticalResolution",
                "/format:csv",
            ])
            .output()
        {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if let Some((bits, width, height)) = parse_wmic_video(&stdout) {
                info.color_depth = Some(bits);
                info.width = Some(width);
                info.height = Some(height);
            }
        }
    }

    if let (Some(width), Some(height)) = (info.width, info.height) {
        info.orientation = Some(orientation_for(width, height).to_string());
    }

    info
}

/// Orientation type for the given dimensions
pub(super) fn orientation_for(width: u32, height: u32) -> &'static str {
    if width >= height {
        "landscape-primary"
    } else {
        "portrait-primary"
    }
}

fn pixel_ratio_from_env() -> Option<f64> {
    ["GDK_SCALE", "QT_SCALE_FACTOR"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find_map(|value| value.trim().parse::<f64>().ok())
        .filter(|ratio| *ratio > 0.0)
}

fn dark_mode_from_env() -> bool {
    std::env::var("GTK_THEME")
        .map(|theme| theme_is_dark(&theme))
        .unwrap_or(false)
}

/// "Adwaita:dark", "Yaru-dark" and friends
fn theme_is_dark(theme: &str) -> bool {
    theme.to_ascii_lowercase().contains("dark")
}

/// First mode of the first connected DRM connector, e.g. "1920x1080"
#[cfg(target_os = "linux")]
fn drm_resolution(drm_path: &Path) -> Option<(u32, u32)> {
    let mut connectors: Vec<_> = fs::read_dir(drm_path)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().contains('-'))
                .unwrap_or(false)
        })
        .collect();
    connectors.sort();

    connectors.into_iter().find_map(|connector| {
        let status = fs::read_to_string(connector.join("status")).ok()?;
        if status.trim() != "connected" {
            return None;
        }
        let modes = fs::read_to_string(connector.join("modes")).ok()?;
        parse_mode(modes.lines().next()?)
    })
}

/// Parse a mode string like "2560x1440" or "1920x1080i"
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_mode(mode: &str) -> Option<(u32, u32)> {
    let (width, height) = mode.trim().split_once('x')?;
    let height: String = height.chars().take_while(|c| c.is_ascii_digit()).collect();
    Some((width.parse().ok()?, height.parse().ok()?))
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn has_touchscreen(devices: &str) -> bool {
    devices
        .lines()
        .filter(|line| line.starts_with("N: Name="))
        .any(|line| line.to_ascii_lowercase().contains("touchscreen"))
}

/// Parse "Resolution: 2560 x 1600 Retina"
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn parse_profiler_resolution(output: &str) -> Option<(u32, u32)> {
    output.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("Resolution:")?;
        let mut numbers = rest
            .split(|c: char| !c.is_ascii_digit())
            .filter(|part| !part.is_empty());
        Some((numbers.next()?.parse().ok()?, numbers.next()?.parse().ok()?))
    })
}

/// Parse "Framebuffer Depth: 30-Bit Color (ARGB2101010)" or "Pixel Depth: 32-Bit Color"
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn parse_profiler_depth(output: &str) -> Option<u32> {
    output.lines().find_map(|line| {
        let line = line.trim();
        let rest = line
            .strip_prefix("Framebuffer Depth:")
            .or_else(|| line.strip_prefix("Pixel Depth:"))?;
        let digits: String = rest
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    })
}

/// Parse CSV rows: Node,CurrentBitsPerPixel,CurrentHorizontalResolution,CurrentVerticalResolution
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn parse_wmic_video(output: &str) -> Option<(u32, u32, u32)> {
    output.lines().skip(1).find_map(|line| {
        let parts: Vec<&str> = line.trim().split(',').collect();
        if parts.len() < 4 {
            return None;
        }
        Some((
            parts[1].trim().parse().ok()?,
            parts[2].trim().parse().ok()?,
            parts[3].trim().parse().ok()?,
        ))
    })
}
