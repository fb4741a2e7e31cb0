//! Consumables and other buffs outside the equipment (`misc_buffs.json`).

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MiscBuffId(pub(crate) u16);

impl MiscBuffId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MiscBuff {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub added_raw: u32,
    #[serde(default = "unit_multiplier")]
    pub base_raw_multiplier: f64,
    /// Buffs sharing a group do not stack (e.g. the demondrug family).
    #[serde(default)]
    pub exclusive_group: Option<String>,
}

fn unit_multiplier() -> f64 {
    1.0
}

/// Raw shape of `misc_buffs.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct MiscBuffsFile {
    pub misc_buffs: Vec<MiscBuff>,
}
