//! The game catalogue, loaded once at startup and shared read-only by every component.
//! Entities are addressed by integer handles into arena tables; string ids are only
//! used at the edges (request documents, reports).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::data::armour::{resolve_armour, ArmourFile, ArmourPiece, ArmourPieceId, ArmourSlot, ArmourVariant};
use crate::data::charm::{resolve_charms, Charm, CharmId, CharmsFile};
use crate::data::decoration::{resolve_decorations, Decoration, DecorationId, DecorationsFile};
use crate::data::misc_buff::{MiscBuff, MiscBuffId, MiscBuffsFile};
use crate::data::skills::{SkillCatalogue, SkillsFile};
use crate::data::weapon::{resolve_weapons, Weapon, WeaponId, WeaponsFile};
use crate::error::DataError;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DATA_DIR_ENV: &str = "SMITHY_DATA_DIR";

pub const SKILLS_FILE: &str = "skills.json";
pub const DECORATIONS_FILE: &str = "decorations.json";
pub const ARMOUR_FILE: &str = "armour.json";
pub const CHARMS_FILE: &str = "charms.json";
pub const WEAPONS_FILE: &str = "weapons.json";
pub const MISC_BUFFS_FILE: &str = "misc_buffs.json";

/// Catalogue directory: explicit flag, then `SMITHY_DATA_DIR`, then `data/`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

type ArmourKey = (String, ArmourVariant, ArmourSlot);

/// Parsed catalogue files, before cross-reference resolution.
#[derive(Debug, Clone)]
pub struct CatalogueFiles {
    pub skills: SkillsFile,
    pub decorations: DecorationsFile,
    pub armour: ArmourFile,
    pub charms: CharmsFile,
    pub weapons: WeaponsFile,
    pub misc_buffs: MiscBuffsFile,
}

impl CatalogueFiles {
    pub fn read_dir(dir: &Path) -> Result<Self, DataError> {
        Ok(Self {
            skills: read_json(&dir.join(SKILLS_FILE))?,
            decorations: read_json(&dir.join(DECORATIONS_FILE))?,
            armour: read_json(&dir.join(ARMOUR_FILE))?,
            charms: read_json(&dir.join(CHARMS_FILE))?,
            weapons: read_json(&dir.join(WEAPONS_FILE))?,
            misc_buffs: read_json(&dir.join(MISC_BUFFS_FILE))?,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DataError::Json {
        path: display,
        source,
    })
}

fn index_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, usize>, DataError> {
    let mut index = HashMap::new();
    for (position, id) in ids.enumerate() {
        if index.insert(id.to_string(), position).is_some() {
            return Err(DataError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(index)
}

#[derive(Debug)]
pub struct Database {
    skills: SkillCatalogue,
    decorations: Vec<Decoration>,
    armour: Vec<ArmourPiece>,
    charms: Vec<Charm>,
    weapons: Vec<Weapon>,
    misc_buffs: Vec<MiscBuff>,
    decoration_index: HashMap<String, usize>,
    armour_index: HashMap<ArmourKey, usize>,
    charm_index: HashMap<String, usize>,
    weapon_index: HashMap<String, usize>,
    misc_buff_index: HashMap<String, usize>,
}

impl Database {
    /// Load and cross-validate every catalogue file in `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Arc<Database>, DataError> {
        let files = CatalogueFiles::read_dir(dir)?;
        let db = Self::from_files(files)?;
        info!(
            dir = %dir.display(),
            skills = db.skills.skill_count(),
            set_bonuses = db.skills.set_bonus_count(),
            decorations = db.decorations.len(),
            armour = db.armour.len(),
            charms = db.charms.len(),
            weapons = db.weapons.len(),
            misc_buffs = db.misc_buffs.len(),
            "catalogue loaded"
        );
        Ok(Arc::new(db))
    }

    pub fn from_files(files: CatalogueFiles) -> Result<Self, DataError> {
        let skills = SkillCatalogue::from_file(files.skills)?;
        let decorations = resolve_decorations(files.decorations, &skills)?;
        let armour = resolve_armour(files.armour, &skills)?;
        let charms = resolve_charms(files.charms, &skills)?;
        let weapons = resolve_weapons(files.weapons, &skills)?;
        let misc_buffs = files.misc_buffs.misc_buffs;

        let decoration_index = index_unique("decoration", decorations.iter().map(|d| d.id.as_str()))?;
        let charm_index = index_unique("charm", charms.iter().map(|c| c.id.as_str()))?;
        let weapon_index = index_unique("weapon", weapons.iter().map(|w| w.id.as_str()))?;
        let misc_buff_index = index_unique("misc buff", misc_buffs.iter().map(|b| b.id.as_str()))?;

        let mut armour_index = HashMap::new();
        for (position, piece) in armour.iter().enumerate() {
            let key = (piece.set_name.clone(), piece.variant, piece.slot);
            if armour_index.insert(key, position).is_some() {
                return Err(DataError::DuplicateId {
                    kind: "armour piece",
                    id: piece.display_name(),
                });
            }
        }
        debug!(pieces = armour_index.len(), "armour index built");

        Ok(Self {
            skills,
            decorations,
            armour,
            charms,
            weapons,
            misc_buffs,
            decoration_index,
            armour_index,
            charm_index,
            weapon_index,
            misc_buff_index,
        })
    }

    pub fn skills(&self) -> &SkillCatalogue {
        &self.skills
    }

    pub fn decoration(&self, id: DecorationId) -> &Decoration {
        &self.decorations[id.index()]
    }

    pub fn decorations(&self) -> impl Iterator<Item = (DecorationId, &Decoration)> + '_ {
        self.decorations
            .iter()
            .enumerate()
            .map(|(index, deco)| (DecorationId(index as u16), deco))
    }

    pub fn armour_piece(&self, id: ArmourPieceId) -> &ArmourPiece {
        &self.armour[id.index()]
    }

    pub fn armour_pieces(&self) -> impl Iterator<Item = (ArmourPieceId, &ArmourPiece)> + '_ {
        self.armour
            .iter()
            .enumerate()
            .map(|(index, piece)| (ArmourPieceId(index as u32), piece))
    }

    pub fn charm(&self, id: CharmId) -> &Charm {
        &self.charms[id.index()]
    }

    pub fn charms(&self) -> impl Iterator<Item = (CharmId, &Charm)> + '_ {
        self.charms
            .iter()
            .enumerate()
            .map(|(index, charm)| (CharmId(index as u16), charm))
    }

    pub fn weapon(&self, id: WeaponId) -> &Weapon {
        &self.weapons[id.index()]
    }

    pub fn weapons(&self) -> impl Iterator<Item = (WeaponId, &Weapon)> + '_ {
        self.weapons
            .iter()
            .enumerate()
            .map(|(index, weapon)| (WeaponId(index as u32), weapon))
    }

    pub fn misc_buff(&self, id: MiscBuffId) -> &MiscBuff {
        &self.misc_buffs[id.index()]
    }

    pub fn misc_buffs(&self) -> impl Iterator<Item = (MiscBuffId, &MiscBuff)> + '_ {
        self.misc_buffs
            .iter()
            .enumerate()
            .map(|(index, buff)| (MiscBuffId(index as u16), buff))
    }

    pub fn find_decoration(&self, id: &str) -> Option<DecorationId> {
        self.decoration_index
            .get(id)
            .map(|index| DecorationId(*index as u16))
    }

    pub fn find_armour_piece(
        &self,
        set_name: &str,
        variant: ArmourVariant,
        slot: ArmourSlot,
    ) -> Option<ArmourPieceId> {
        self.armour_index
            .get(&(set_name.to_string(), variant, slot))
            .map(|index| ArmourPieceId(*index as u32))
    }

    pub fn find_charm(&self, id: &str) -> Option<CharmId> {
        self.charm_index.get(id).map(|index| CharmId(*index as u16))
    }

    pub fn find_weapon(&self, id: &str) -> Option<WeaponId> {
        self.weapon_index.get(id).map(|index| WeaponId(*index as u32))
    }

    pub fn find_misc_buff(&self, id: &str) -> Option<MiscBuffId> {
        self.misc_buff_index
            .get(id)
            .map(|index| MiscBuffId(*index as u16))
    }
}

/// The shipped catalogue, for unit tests.
#[cfg(test)]
pub(crate) fn shipped_database() -> Arc<Database> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_DATA_DIR);
    Database::load_from_dir(&dir).expect("shipped catalogue should load")
}
