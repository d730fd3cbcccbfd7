//! Device permission states
//!
//! Microphone and camera map to the capture device nodes under /dev; a node
//! we can open is granted, one we are refused is denied, and no node at all
//! leaves the decision open. Notifications follow the desktop session bus.

use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::path::Path;

use crate::error::ProbeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Microphone,
    Camera,
    Notifications,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Microphone => write!(f, "microphone"),
            Permission::Camera => write!(f, "camera"),
            Permission::Notifications => write!(f, "notifications"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionState::Granted => write!(f, "granted"),
            PermissionState::Denied => write!(f, "denied"),
            PermissionState::Prompt => write!(f, "prompt"),
        }
    }
}

pub(super) fn query(permission: Permission) -> Result<PermissionState, ProbeError> {
    if !cfg!(target_os = "linux") {
        return Ok(PermissionState::Prompt);
    }

    match permission {
        Permission::Microphone => capture_device_state(Path::new("/dev/snd"), is_capture_pcm),
        Permission::Camera => capture_device_state(Path::new("/dev"), is_video_node),
        Permission::Notifications => Ok(
            if std::env::var_os("DBUS_SESSION_BUS_ADDRESS").is_some() {
                PermissionState::Granted
            } else {
                PermissionState::Prompt
            },
        ),
    }
}

/// ALSA capture PCM nodes look like "pcmC0D0c"
fn is_capture_pcm(name: &str) -> bool {
    name.starts_with("pcmC") && name.ends_with('c')
}

fn is_video_node(name: &str) -> bool {
    name.strip_prefix("video")
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// Capture nodes block in open() while another client holds the substream,
/// so they are opened with O_NONBLOCK
#[cfg(unix)]
fn open_device(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

#[cfg(not(unix))]
fn open_device(path: &Path) -> io::Result<File> {
    File::open(path)
}

/// Device exists and is ours to use, but someone else is using it right now
#[cfg(unix)]
fn is_busy(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EBUSY)
}

#[cfg(not(unix))]
fn is_busy(_err: &io::Error) -> bool {
    false
}

/// Granted if any matching node opens (or is busy), denied if every open is refused
fn capture_device_state(
    dir: &Path,
    matches: fn(&str) -> bool,
) -> Result<PermissionState, ProbeError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(PermissionState::Prompt),
        Err(err) => {
            return Err(ProbeError::Query(format!(
                "cannot list {}: {err}",
                dir.display()
            )))
        }
    };

    let mut state = PermissionState::Prompt;
    for entry in entries.flatten() {
        if !matches(&entry.file_name().to_string_lossy()) {
            continue;
        }

        match open_device(&entry.path()) {
            Ok(_) => return Ok(PermissionState::Granted),
            Err(err) if is_busy(&err) => return Ok(PermissionState::Granted),
            Err(err) if err.kind() == ErrorKind::PermissionDenied => {
                state = PermissionState::Denied;
            }
            Err(_) => {}
        }
    }

    Ok(state)
}
