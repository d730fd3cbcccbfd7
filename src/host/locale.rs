//! Language and timezone resolution

use std::fs;
use std::path::Path;
#[cfg(target_os = "macos")]
use std::process::Command;

const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_TIMEZONE: &str = "UTC";

/// BCP 47 tag from the POSIX locale variables
pub(super) fn detect_language() -> String {
    for key in ["LC_ALL", "LC_MESSAGES", "LANG"] {
        if let Ok(value) = std::env::var(key) {
            if !value.trim().is_empty() {
                return normalize_language(&value);
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(output) = Command::new("defaults")
            .args(["read", "-g", "AppleLocale"])
            .output()
        {
            let locale = String::from_utf8_lossy(&output.stdout);
            if !locale.trim().is_empty() {
                return normalize_language(&locale);
            }
        }
    }

    DEFAULT_LANGUAGE.to_string()
}

/// "en_US.UTF-8" -> "en-US", "de_DE@euro" -> "de-DE", "C" -> "en-US"
pub(super) fn normalize_language(locale: &str) -> String {
    let base = locale
        .trim()
        .split(['.', '@'])
        .next()
        .unwrap_or_default();

    match base {
        "" | "C" | "POSIX" => DEFAULT_LANGUAGE.to_string(),
        tag => tag.replace('_', "-"),
    }
}

/// IANA zone name from TZ, /etc/timezone or the /etc/localtime symlink
pub(super) fn detect_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        let tz = tz.trim().trim_start_matches(':');
        if let Some(zone) = zone_from_tz_value(tz) {
            return zone;
        }
    }

    if let Ok(content) = fs::read_to_string("/etc/timezone") {
        let zone = content.trim();
        if !zone.is_empty() {
            return zone.to_string();
        }
    }

    if let Ok(target) = fs::read_link("/etc/localtime") {
        if let Some(zone) = zone_from_localtime_target(&target) {
            return zone;
        }
    }

    DEFAULT_TIMEZONE.to_string()
}

/// TZ may hold a zone name or a path into the zoneinfo database
fn zone_from_tz_value(tz: &str) -> Option<String> {
    if tz.is_empty() {
        return None;
    }
    if tz.starts_with('/') {
        return zone_from_localtime_target(Path::new(tz));
    }
    Some(tz.to_string())
}

/// "/usr/share/zoneinfo/Europe/Paris" -> "Europe/Paris"
fn zone_from_localtime_target(target: &Path) -> Option<String> {
    let target = target.to_string_lossy();
    let (_, zone) = target.split_once("zoneinfo/")?;
    let zone = zone.trim_start_matches("posix/").trim_start_matches("right/");
    (!zone.is_empty()).then(|| zone.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language("en_US.UTF-8"), "en-US");
        assert_eq!(normalize_language("de_DE@euro"), "de-DE");
        assert_eq!(normalize_language("fr"), "fr");
        assert_eq!(normalize_language("C"), "en-US");
        assert_eq!(normalize_language("POSIX"), "en-US");
        assert_eq!(normalize_language("C.UTF-8"), "en-US");
    }

    #[test]
    fn test_zone_from_localtime_target() {
        assert_eq!(
            zone_from_localtime_target(Path::new("/usr/share/zoneinfo/Europe/Paris")),
            Some("Europe/Paris".to_string())
        );
        assert_eq!(
            zone_from_localtime_target(Path::new("../usr/share/zoneinfo/posix/Asia/Tokyo")),
            Some("Asia/Tokyo".to_string())
        );
        assert_eq!(zone_from_localtime_target(Path::new("/etc/localtime")), None);
    }

    #[test]
    fn test_zone_from_tz_value() {
        assert_eq!(
            zone_from_tz_value("America/New_York"),
            Some("America/New_York".to_string())
        );
        assert_eq!(
            zone_from_tz_value("/usr/share/zoneinfo/UTC"),
            Some("UTC".to_string())
        );
        assert_eq!(zone_from_tz_value(""), None);
    }
}
