use std::fs;

use crate::config::{SyncConfig, read_json_field};
use crate::paths::{Layout, slot_dir_name};
use crate::{SAVE_PREFIX, SLOT_COUNT, TRACING_TARGET};

/// Which slots exist on disk. Index `i` holds `i + 1` when slot `i + 1` is present, 0 otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotIndicator(pub [u8; SLOT_COUNT]);

impl SlotIndicator {
    /// `number` is 1-based.
    pub fn is_present(&self, number: u8) -> bool {
        slot_index(number).is_some_and(|i| self.0[i] != 0)
    }

    /// 1-based numbers of the present slots, ascending.
    pub fn present(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied().filter(|n| *n != 0)
    }

    fn mark(&mut self, number: u8) {
        if let Some(i) = slot_index(number) {
            self.0[i] = number;
        }
    }
}

fn slot_index(number: u8) -> Option<usize> {
    let n = usize::from(number);
    (1..=SLOT_COUNT).contains(&n).then(|| n - 1)
}

/// Parses `SaveGame_<n>` into `n`, rejecting anything outside the game's slot range.
///
/// Only the exact name the resolver produces is accepted, so `SaveGame_01` or
/// `SaveGame_+3` are not slots.
pub fn parse_slot_dir(name: &str) -> Option<u8> {
    let n: u8 = name.strip_prefix(SAVE_PREFIX)?.parse().ok()?;
    slot_index(n)?;
    (slot_dir_name(n) == name).then_some(n)
}

/// Scans the player's saves root. A missing root means no saves yet, not an error.
pub fn list_slots(layout: &Layout, cfg: &SyncConfig) -> SlotIndicator {
    let mut slots = SlotIndicator::default();
    let root = layout.saves_root(cfg);
    let Ok(rd) = fs::read_dir(&root) else {
        return slots;
    };
    for entry in rd.flatten() {
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        match name.to_str().and_then(parse_slot_dir) {
            Some(n) => slots.mark(n),
            None => {
                if name.to_string_lossy().starts_with(SAVE_PREFIX) {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        name = %name.to_string_lossy(),
                        "Ignoring slot directory outside the supported range"
                    );
                }
            }
        }
    }
    slots
}

/// Organisation name stored in a slot's `Game.json`, or empty when unavailable.
pub fn organisation_name(layout: &Layout, cfg: &SyncConfig, number: u8) -> String {
    let path = layout.saves_root(cfg).join(slot_dir_name(number)).join("Game.json");
    match read_json_field(&path, "OrganisationName") {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}
