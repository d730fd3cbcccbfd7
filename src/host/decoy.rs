//! Ad-block decoy surface
//!
//! A native decoy is a well-known ad-serving hostname. Content blockers that
//! work at the resolver (hosts files, Pi-hole, DNS filters) answer it with an
//! unspecified or loopback address, or not at all: the decoy "renders" with
//! zero height. A decoy that does not resolve only counts as blocked when a
//! control hostname still does; with no working resolver nothing is hidden.

use std::collections::HashMap;
use std::net::{IpAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Handle to an inserted decoy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoyId(pub u64);

pub(super) struct DecoyBoard {
    control_host: String,
    next_id: AtomicU64,
    decoys: Mutex<HashMap<DecoyId, String>>,
}

impl DecoyBoard {
    pub(super) fn new(control_host: &str) -> Self {
        DecoyBoard {
            control_host: control_host.to_string(),
            next_id: AtomicU64::new(0),
            decoys: Mutex::new(HashMap::new()),
        }
    }

    pub(super) fn insert(&self, hostname: &str) -> DecoyId {
        let id = DecoyId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.decoys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, hostname.to_string());
        id
    }

    pub(super) fn rendered_height(&self, id: DecoyId) -> u32 {
        let hostname = self
            .decoys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
            .cloned();

        let Some(hostname) = hostname else {
            return 0;
        };

        match resolve(&hostname) {
            Some(addrs) if !addrs.is_empty() => {
                if resolves_to_sinkhole(&addrs) {
                    0
                } else {
                    1
                }
            }
            _ => {
                if resolve(&self.control_host).is_some_and(|addrs| !addrs.is_empty()) {
                    0
                } else {
                    debug!(
                        control = %self.control_host,
                        "resolver unavailable, decoy left as rendered"
                    );
                    1
                }
            }
        }
    }

    pub(super) fn remove(&self, id: DecoyId) {
        self.decoys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&id);
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.decoys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

fn resolve(hostname: &str) -> Option<Vec<IpAddr>> {
    (hostname, 80)
        .to_socket_addrs()
        .ok()
        .map(|addrs| addrs.map(|addr| addr.ip()).collect())
}

/// No addresses, or only 0.0.0.0 / :: / loopback
fn resolves_to_sinkhole(addrs: &[IpAddr]) -> bool {
    addrs
        .iter()
        .all(|addr| addr.is_unspecified() || addr.is_loopback())
}
