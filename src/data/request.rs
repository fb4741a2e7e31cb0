//! Search request documents. JSON by default; `.yaml`/`.yml` files are read as YAML.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::data::armour::Tier;
use crate::data::database::Database;
use crate::data::weapon::{EleStatType, Weapon, WeaponClass};
use crate::error::ConfigError;
use crate::model::damage::DamageModel;
use crate::model::equips::MiscBuffsEquips;
use crate::model::skills::SkillSpec;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct WeaponSelectionDocument {
    class: WeaponClass,
    allow_fire: bool,
    allow_water: bool,
    allow_thunder: bool,
    allow_ice: bool,
    allow_dragon: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchRequestDocument {
    allow_low_rank: bool,
    allow_high_rank: bool,
    allow_master_rank: bool,
    health_regen_required: bool,
    weapon_selection: WeaponSelectionDocument,
    damage_model: DamageModel,
    selected_skills: BTreeMap<String, u8>,
    forced_skill_states: BTreeMap<String, u8>,
    force_remove_skills: Vec<String>,
    misc_buffs: Vec<String>,
    /// Exclusive ceilings on set-bonus piece counts.
    #[serde(default)]
    set_bonus_cutoffs: BTreeMap<String, u8>,
}

/// A validated search request with every id resolved against the catalogue.
#[derive(Debug, Clone)]
pub struct SearchParameters {
    pub allow_low_rank: bool,
    pub allow_high_rank: bool,
    pub allow_master_rank: bool,
    pub health_regen_required: bool,
    pub weapon_class: WeaponClass,
    pub allowed_elements: BTreeSet<EleStatType>,
    pub damage_model: DamageModel,
    pub skill_spec: SkillSpec,
    pub misc_buffs: MiscBuffsEquips,
}

impl SearchParameters {
    pub fn allows_tier(&self, tier: Tier) -> bool {
        match tier {
            Tier::LowRank => self.allow_low_rank,
            Tier::HighRank => self.allow_high_rank,
            Tier::MasterRank => self.allow_master_rank,
        }
    }

    /// Class, rank and element filters. Statuses and raw weapons pass the element filter.
    pub fn allows_weapon(&self, weapon: &Weapon) -> bool {
        weapon.class == self.weapon_class
            && self.allows_tier(weapon.tier())
            && (!weapon.elestat.kind.is_element() || self.allowed_elements.contains(&weapon.elestat.kind))
    }
}

pub fn read_file(db: &Database, path: &Path) -> Result<SearchParameters, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        from_yaml_str(db, &raw)
    } else {
        from_json_str(db, &raw)
    }
}

pub fn from_json_str(db: &Database, raw: &str) -> Result<SearchParameters, ConfigError> {
    let document: SearchRequestDocument =
        serde_json::from_str(raw).map_err(|err| ConfigError::Malformed(err.to_string()))?;
    resolve(db, document)
}

pub fn from_yaml_str(db: &Database, raw: &str) -> Result<SearchParameters, ConfigError> {
    let document: SearchRequestDocument =
        serde_yaml::from_str(raw).map_err(|err| ConfigError::Malformed(err.to_string()))?;
    resolve(db, document)
}

fn unknown(kind: &'static str, id: &str) -> ConfigError {
    ConfigError::UnknownId {
        kind,
        id: id.to_string(),
    }
}

fn resolve(db: &Database, document: SearchRequestDocument) -> Result<SearchParameters, ConfigError> {
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
    let set_bonus_cutoffs = document
        .set_bonus_cutoffs
        .iter()
        .map(|(id, cutoff)| {
            let set_bonus = catalogue
                .find_set_bonus(id)
                .ok_or_else(|| unknown("set bonus", id))?;
            Ok((set_bonus, *cutoff))
        })
        .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

    let skill_spec = SkillSpec::new(min_levels, forced_states, force_remove, set_bonus_cutoffs, catalogue)?;

    let buffs = document
        .misc_buffs
        .iter()
        .map(|id| db.find_misc_buff(id).ok_or_else(|| unknown("misc buff", id)))
        .collect::<Result<Vec<_>, ConfigError>>()?;
    let misc_buffs = MiscBuffsEquips::new(db, buffs)?;

    let selection = &document.weapon_selection;
    let allowed_elements = [
        (selection.allow_fire, EleStatType::Fire),
        (selection.allow_water, EleStatType::Water),
        (selection.allow_thunder, EleStatType::Thunder),
        (selection.allow_ice, EleStatType::Ice),
        (selection.allow_dragon, EleStatType::Dragon),
    ]
    .into_iter()
    .filter_map(|(allowed, kind)| allowed.then_some(kind))
    .collect();

    Ok(SearchParameters {
        allow_low_rank: document.allow_low_rank,
        allow_high_rank: document.allow_high_rank,
        allow_master_rank: document.allow_master_rank,
        health_regen_required: document.health_regen_required,
        weapon_class: selection.class,
        allowed_elements,
        damage_model: document.damage_model,
        skill_spec,
        misc_buffs,
    })
}
