//! Graphics context detection
//!
//! Resolves the renderer string of the primary GPU:
//! - NVIDIA: nvidia-smi if available (cross-platform)
//! - Linux: lspci output, then /sys/class/drm
//! - macOS: system_profiler
//! - Windows: WMI
//!
//! A device that is present but only identifiable by PCI id counts as a
//! context without renderer info.

#[cfg(target_os = "linux")]
use std::fs;
#[cfg(target_os = "linux")]
use std::path::Path;
use std::process::Command;

use super::GraphicsContext;

/// Try each detection method in order of reliability
pub(super) fn detect_graphics_context() -> GraphicsContext {
    if let Some(name) = detect_nvidia_smi() {
        return GraphicsContext::Renderer(name);
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(name) = detect_lspci() {
            return GraphicsContext::Renderer(name);
        }
        if drm_card_present(Path::new("/sys/class/drm")) {
            return GraphicsContext::Masked;
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(context) = detect_system_profiler() {
            return context;
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(context) = detect_wmi() {
            return context;
        }
    }

    GraphicsContext::Unavailable
}

fn detect_nvidia_smi() -> Option<String> {
    let output = Command::new("nvidia-smi")
        .args(["--query-gpu=name", "--format=csv,noheader,nounits"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let raw_name = stdout.lines().next()?.trim();
    if raw_name.is_empty() {
        return None;
    }

    Some(if raw_name.starts_with("NVIDIA") {
        raw_name.to_string()
    } else {
        format!("NVIDIA {}", raw_name)
    })
}

#[cfg(target_os = "linux")]
fn detect_lspci() -> Option<String> {
    let output = Command::new("lspci").output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .find(|line| line.contains("VGA") || line.contains("3D controller"))
        .map(parse_lspci_line)
}

/// Extract the device name from a single lspci line
///
/// Format: "01:00.0 VGA compatible controller: NVIDIA Corporation GA104 [GeForce RTX 3070] (rev a1)"
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_lspci_line(line: &str) -> String {
    let Some(idx) = line.find(": ") else {
        return line.trim().to_string();
    };

    let after_colon = &line[idx + 2..];
    match after_colon.rfind(" (rev") {
        Some(rev_idx) => after_colon[..rev_idx].to_string(),
        None => after_colon.to_string(),
    }
}

/// True when sysfs lists a DRM card with a readable vendor id
#[cfg(target_os = "linux")]
fn drm_card_present(drm_path: &Path) -> bool {
    let Ok(entries) = fs::read_dir(drm_path) else {
        return false;
    };

    entries.flatten().any(|entry| {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        name.starts_with("card")
            && !name.contains('-')
            && fs::read_to_string(entry.path().join("device").join("vendor")).is_ok()
    })
}

#[cfg(target_os = "macos")]
fn detect_system_profiler() -> Option<GraphicsContext> {
    let output = Command::new("system_profiler")
        .arg("SPDisplaysDataType")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Some(parse_system_profiler(&stdout))
}

/// Pick the first "Chipset Model:" entry; a graphics section without one is masked
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn parse_system_profiler(output: &str) -> GraphicsContext {
    for line in output.lines() {
        if let Some(model) = line.trim().strip_prefix("Chipset Model:") {
            let model = model.trim();
            if !model.is_empty() {
                return GraphicsContext::Renderer(model.to_string());
            }
        }
    }

    if output.contains("Graphics/Displays") {
        GraphicsContext::Masked
    } else {
        GraphicsContext::Unavailable
    }
}

#[cfg(target_os = "windows")]
fn detect_wmi() -> Option<GraphicsContext> {
    let output = Command::new("wmic")
        .args(["path", "win32_VideoController", "get", "Name", "/format:csv"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);

    // Parse CSV output: Node,Name
    for line in stdout.lines().skip(1) {
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() >= 2 {
            let name = parts[1].trim();
            if !name.is_empty() && name != "Name" {
                return Some(GraphicsContext::Renderer(name.to_string()));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lspci_line_strips_revision() {
        let line =
            "01:00.0 VGA compatible controller: NVIDIA Corporation GA104 [GeForce RTX 3070] (rev a1)";
        assert_eq!(
            parse_lspci_line(line),
            "NVIDIA Corporation GA104 [GeForce RTX 3070]"
        );
    }

    #[test]
    fn test_parse_lspci_line_without_revision() {
        let line = "00:02.0 VGA compatible controller: Intel Corporation UHD Graphics 620";
        assert_eq!(parse_lspci_line(line), "Intel Corporation UHD Graphics 620");
    }

    #[test]
    fn test_parse_system_profiler() {
        let output = "Graphics/Displays:\n\n    Apple M1:\n\n      Chipset Model: Apple M1\n      Type: GPU\n";
        assert_eq!(
            parse_system_profiler(output),
            GraphicsContext::Renderer("Apple M1".to_string())
        );
        assert_eq!(
            parse_system_profiler("Graphics/Displays:\n"),
            GraphicsContext::Masked
        );
        assert_eq!(parse_system_profiler(""), GraphicsContext::Unavailable);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_drm_card_present_reads_vendor() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        assert!(!drm_card_present(temp_dir.path()));

        let connector = temp_dir.path().join("card0-HDMI-A-1");
        fs::create_dir_all(&connector).unwrap();
        assert!(!drm_card_present(temp_dir.path()));

        let device = temp_dir.path().join("card0").join("device");
        fs::create_dir_all(&device).unwrap();
        fs::write(device.join("vendor"), "0x8086\n").unwrap();
        assert!(drm_card_present(temp_dir.path()));
    }
}
