//! Scripted host for probe and collector tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{
    BatteryStatus, DecoyId, DisplayInfo, GraphicsContext, Host, Permission, PermissionState,
};
use crate::error::ProbeError;

pub enum BatteryScript {
    Unsupported,
    Fails,
    Reports(BatteryStatus),
}

pub struct ScriptedHost {
    pub processors: Option<usize>,
    pub graphics: GraphicsContext,
    pub user_agent: String,
    pub platform: String,
    pub language: String,
    pub timezone: String,
    pub cookies: bool,
    pub peer_connection: bool,
    pub display: DisplayInfo,
    pub battery: BatteryScript,
    pub permissions: HashMap<Permission, PermissionState>,
    pub failing_permission: Option<Permission>,
    /// Each permission query blocks this long before answering
    pub permission_delay: Duration,
    pub decoy_height: AtomicU32,
    /// Measuring a decoy panics
    pub decoy_crash: bool,
    pub decoys_inserted: AtomicUsize,
    pub live_decoys: Mutex<HashSet<DecoyId>>,
    pub next_decoy: AtomicU64,
}

impl Default for ScriptedHost {
    fn default() -> Self {
        ScriptedHost {
            processors: Some(8),
            graphics: GraphicsContext::Renderer("ANGLE (Intel, Mesa Intel(R) UHD Graphics 620)".to_string()),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string(),
            platform: "Linux x86_64".to_string(),
            language: "en-US".to_string(),
            timezone: "Europe/Paris".to_string(),
            cookies: true,
            peer_connection: true,
            display: DisplayInfo {
                width: Some(1920),
                height: Some(1080),
                orientation: Some("landscape-primary".to_string()),
                color_depth: Some(24),
                pixel_ratio: Some(1.0),
                dark_mode: false,
                touch: false,
            },
            battery: BatteryScript::Reports(BatteryStatus {
                level: 0.5,
                charging: true,
            }),
            permissions: HashMap::new(),
            failing_permission: None,
            permission_delay: Duration::ZERO,
            decoy_height: AtomicU32::new(1),
            decoy_crash: false,
            decoys_inserted: AtomicUsize::new(0),
            live_decoys: Mutex::new(HashSet::new()),
            next_decoy: AtomicU64::new(0),
        }
    }
}

impl ScriptedHost {
    pub fn live_decoys(&self) -> usize {
        self.live_decoys.lock().unwrap().len()
    }
}

impl Host for ScriptedHost {
    fn logical_processors(&self) -> Option<usize> {
        self.processors
    }

    fn graphics_context(&self) -> GraphicsContext {
        self.graphics.clone()
    }

    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn platform(&self) -> String {
        self.platform.clone()
    }

    fn language(&self) -> String {
        self.language.clone()
    }

    fn timezone(&self) -> String {
        self.timezone.clone()
    }

    fn cookies_enabled(&self) -> bool {
        self.cookies
    }

    fn peer_connection_supported(&self) -> bool {
        self.peer_connection
    }

    fn display(&self) -> DisplayInfo {
        self.display.clone()
    }

    fn battery(&self) -> Result<BatteryStatus, ProbeError> {
        match &self.battery {
            BatteryScript::Unsupported => Err(ProbeError::Unsupported("no battery".to_string())),
            BatteryScript::Fails => Err(ProbeError::Query("battery query rejected".to_string())),
            BatteryScript::Reports(status) => Ok(*status),
        }
    }

    fn permission_state(&self, permission: Permission) -> Result<PermissionState, ProbeError> {
        if !self.permission_delay.is_zero() {
            std::thread::sleep(self.permission_delay);
        }
        if self.failing_permission == Some(permission) {
            return Err(ProbeError::Query(format!("{permission} query threw")));
        }
        Ok(self
            .permissions
            .get(&permission)
            .copied()
            .unwrap_or(PermissionState::Prompt))
    }

    fn insert_decoy(&self) -> DecoyId {
        let id = DecoyId(self.next_decoy.fetch_add(1, Ordering::SeqCst));
        self.decoys_inserted.fetch_add(1, Ordering::SeqCst);
        self.live_decoys.lock().unwrap().insert(id);
        id
    }

    fn decoy_height(&self, decoy: DecoyId) -> u32 {
        if self.decoy_crash {
            panic!("renderer crashed while measuring decoy");
        }
        assert!(
            self.live_decoys.lock().unwrap().contains(&decoy),
            "decoy measured after removal"
        );
        self.decoy_height.load(Ordering::SeqCst)
    }

    fn remove_decoy(&self, decoy: DecoyId) {
        self.live_decoys.lock().unwrap().remove(&decoy);
    }
}
