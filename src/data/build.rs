//! Concrete build documents for the `evaluate` command: one weapon configuration, the
//! armour worn, a charm and the decorations slotted in.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::data::armour::{ArmourSlot, ArmourVariant};
use crate::data::database::Database;
use crate::error::ConfigError;
use crate::model::damage::DamageModel;
use crate::model::equips::{ArmourEquips, DecoEquips, MiscBuffsEquips};
use crate::model::skills::SkillSpec;
use crate::model::weapon_instance::{WeaponAugment, WeaponInstance, WeaponUpgrade};

const SET_BONUS_AWAKENING_PREFIX: &str = "SAFI_SET_BONUS:";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct WeaponDocument {
    id: String,
    #[serde(default)]
    augment_level: u8,
    #[serde(default)]
    augments: BTreeMap<WeaponAugment, u8>,
    #[serde(default)]
    upgrades: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct PieceDocument {
    set: String,
    variant: ArmourVariant,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildDocument {
    weapon: WeaponDocument,
    #[serde(default)]
    armour: BTreeMap<ArmourSlot, PieceDocument>,
    #[serde(default)]
    charm: Option<String>,
    #[serde(default)]
    decorations: Vec<String>,
    #[serde(default)]
    misc_buffs: Vec<String>,
    #[serde(default)]
    selected_skills: BTreeMap<String, u8>,
    #[serde(default)]
    forced_skill_states: BTreeMap<String, u8>,
    #[serde(default)]
    force_remove_skills: Vec<String>,
    #[serde(default)]
    damage_model: Option<DamageModel>,
}

/// A build resolved against the catalogue and checked for fit.
#[derive(Debug, Clone)]
pub struct BuildEvaluation<'db> {
    pub weapon: WeaponInstance<'db>,
    pub armour: ArmourEquips,
    pub decorations: DecoEquips,
    pub misc_buffs: MiscBuffsEquips,
    pub skill_spec: SkillSpec,
    pub damage_model: Option<DamageModel>,
}

pub fn read_file<'db>(db: &'db Database, path: &Path) -> Result<BuildEvaluation<'db>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    from_json_str(db, &raw)
}

pub fn from_json_str<'db>(db: &'db Database, raw: &str) -> Result<BuildEvaluation<'db>, ConfigError> {
    let document: BuildDocument =
        serde_json::from_str(raw).map_err(|err| ConfigError::Malformed(err.to_string()))?;
    resolve(db, document)
}

fn unknown(kind: &'static str, id: impl Into<String>) -> ConfigError {
    ConfigError::UnknownId {
        kind,
        id: id.into(),
    }
}

/// Upgrade labels as written in build documents, e.g. `SAFI_ATTACK_6` or
/// `SAFI_SET_BONUS:TEOSTRA_ESSENCE`.
pub fn parse_upgrade(db: &Database, label: &str) -> Result<WeaponUpgrade, ConfigError> {
    if let Some(set_bonus) = label.strip_prefix(SET_BONUS_AWAKENING_PREFIX) {
        return db
            .skills()
            .find_set_bonus(set_bonus)
            .map(WeaponUpgrade::AwakenedSetBonus)
            .ok_or_else(|| unknown("set bonus", set_bonus));
    }
    let upgrade = match label {
        "CUSTOM_ATTACK" => WeaponUpgrade::CustomAttack,
        "CUSTOM_AFFINITY" => WeaponUpgrade::CustomAffinity,
        "CUSTOM_SLOT" => WeaponUpgrade::CustomSlot,
        "SAFI_ATTACK_5" => WeaponUpgrade::AwakenedAttack5,
        "SAFI_ATTACK_6" => WeaponUpgrade::AwakenedAttack6,
        "SAFI_AFFINITY_5" => WeaponUpgrade::AwakenedAffinity5,
        "SAFI_AFFINITY_6" => WeaponUpgrade::AwakenedAffinity6,
        "SAFI_SHARPNESS_5" => WeaponUpgrade::AwakenedSharpness5,
        "SAFI_SHARPNESS_6" => WeaponUpgrade::AwakenedSharpness6,
        "SAFI_SLOT" => WeaponUpgrade::AwakenedSlot,
        other => return Err(unknown("weapon upgrade", other)),
    };
    Ok(upgrade)
}

fn resolve(db: &Database, document: BuildDocument) -> Result<BuildEvaluation<'_>, ConfigError> {
    let weapon_id = db
        .find_weapon(&document.weapon.id)
        .ok_or_else(|| unknown("weapon", document.weapon.id.as_str()))?;
    let mut weapon = WeaponInstance::new(weapon_id, db.weapon(weapon_id));
    weapon.set_augment_level(document.weapon.augment_level)?;
    for (augment, count) in &document.weapon.augments {
        weapon.set_augment(*augment, *count)?;
    }
    for label in &document.weapon.upgrades {
        weapon.add_upgrade(parse_upgrade(db, label)?)?;
    }

    let mut armour = ArmourEquips::new();
    for (slot, piece) in &document.armour {
        let id = db
            .find_armour_piece(&piece.set, piece.variant, *slot)
            .ok_or_else(|| unknown("armour piece", format!("{} {}{}", piece.set, slot, piece.variant.suffix())))?;
        armour.add(db, id);
    }
    if let Some(charm) = &document.charm {
        let id = db.find_charm(charm).ok_or_else(|| unknown("charm", charm.as_str()))?;
        armour.set_charm(Some(id));
    }

    let decorations = DecoEquips::new(
        document
            .decorations
            .iter()
            .map(|id| db.find_decoration(id).ok_or_else(|| unknown("decoration", id.as_str())))
            .collect::<Result<Vec<_>, ConfigError>>()?,
    );
    if !decorations.fits_in(db, &armour, &weapon.calculate_contribution()) {
        return Err(ConfigError::DecorationsDoNotFit);
    }

    let buffs = document
        .misc_buffs
        .iter()
        .map(|id| db.find_misc_buff(id).ok_or_else(|| unknown("misc buff", id.as_str())))
        .collect::<Result<Vec<_>, ConfigError>>()?;
    let misc_buffs = MiscBuffsEquips::new(db, buffs)?;

    let catalogue = db.skills();
    let skill = |id: &str| catalogue.find_skill(id).ok_or_else(|| unknown("skill", id));
    let min_levels = document
        .selected_skills
        .iter()
        .map(|(id, level)| Ok((skill(id)?, *level)))
        .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;
    let forced_states = document
        .forced_skill_states
        .iter()
        .map(|(id, state)| Ok((skill(id)?, *state)))
        .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;
    let force_remove = document
        .force_remove_skills
        .iter()
        .map(|id| skill(id))
        .collect::<Result<BTreeSet<_>, ConfigError>>()?;
    let skill_spec = SkillSpec::new(min_levels, forced_states, force_remove, BTreeMap::new(), catalogue)?;

    Ok(BuildEvaluation {
        weapon,
        armour,
        decorations,
        misc_buffs,
        skill_spec,
        damage_model: document.damage_model,
    })
}
