//! The objective function: effective raw (EFR), effective element/status (EFES), and the
//! per-hit damage they produce against a target model.
//!
//! Everything here is pure. The two `calculate_edv_from_*` entry points must agree for
//! equivalent inputs; the gear variant only derives a skill map and delegates.

use serde::{Deserialize, Serialize};

use crate::data::database::Database;
use crate::data::skills::SkillCatalogue;
use crate::data::weapon::{EleStat, EleStatType, EleStatVisibility, WeaponClass};
use crate::model::equips::{ArmourEquips, DecoEquips, MiscBuffsEquips};
use crate::model::sharpness::SharpnessGauge;
use crate::model::skill_contribution::SkillContribution;
use crate::model::skills::{SkillMap, SkillSpec};
use crate::model::weapon_instance::{WeaponContribution, WeaponInstance};

/// Raw cap as a multiple of the weapon's true raw.
const RAW_CAP_MULTIPLE: u32 = 2;
const RAW_BLUNDER_MULTIPLIER: f64 = 0.75;

/// Target and attack the damage figures are computed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageModel {
    pub raw_mv: u32,
    pub elemod_fire: f64,
    pub elemod_water: f64,
    pub elemod_thunder: f64,
    pub elemod_ice: f64,
    pub elemod_dragon: f64,
    pub hzv_raw: u32,
    pub hzv_fire: u32,
    pub hzv_water: u32,
    pub hzv_thunder: u32,
    pub hzv_ice: u32,
    pub hzv_dragon: u32,
}

impl DamageModel {
    /// (elemental modifier, hitzone) for a true element; statuses have neither.
    fn elemental_terms(&self, kind: EleStatType) -> Option<(f64, u32)> {
        match kind {
            EleStatType::Fire => Some((self.elemod_fire, self.hzv_fire)),
            EleStatType::Water => Some((self.elemod_water, self.hzv_water)),
            EleStatType::Thunder => Some((self.elemod_thunder, self.hzv_thunder)),
            EleStatType::Ice => Some((self.elemod_ice, self.hzv_ice)),
            EleStatType::Dragon => Some((self.elemod_dragon, self.hzv_dragon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveDamageValues {
    pub affinity: i32,
    pub final_sharpness_gauge: Option<SharpnessGauge>,
    /// Multiplied raw before the cap, as a fraction of the cap.
    pub pre_raw_cap_ratio: f64,
    pub efr: f64,
    pub efes: f64,
    pub elestat_type: EleStatType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelCalculatedValues {
    pub unrounded_raw_damage: f64,
    pub unrounded_elestat_damage: f64,
    pub unrounded_total_damage: f64,
    /// Raw and elemental components rounded separately, then summed.
    pub actual_total_damage: u32,
}

/// Fully resolved numeric inputs to [`calculate_edv`].
#[derive(Debug, Clone, PartialEq)]
pub struct EdvInputs {
    pub weapon_raw: u32,
    pub weapon_aff: i32,
    pub elestat: EleStat,
    pub base_raw_multiplier: f64,
    pub frostcraft_raw_multiplier: f64,
    pub bludgeoner_added_raw: u32,
    pub added_raw: u32,
    pub added_aff: i32,
    pub raw_crit_dmg_multiplier: f64,
    pub final_sharpness_gauge: Option<SharpnessGauge>,
    pub free_element_active_percentage: u32,
}

fn affinity_modifier(affinity: i32, crit_multiplier: f64) -> f64 {
    let chance = f64::from(affinity) / 100.0;
    if chance < 0.0 {
        let blunder = (-chance).clamp(0.0, 1.0);
        RAW_BLUNDER_MULTIPLIER * blunder + (1.0 - blunder)
    } else {
        let crit = chance.clamp(0.0, 1.0);
        crit_multiplier * crit + (1.0 - crit)
    }
}

pub fn calculate_edv(inputs: &EdvInputs) -> EffectiveDamageValues {
    let affinity = inputs.weapon_aff + inputs.added_aff;
    let crit_modifier = affinity_modifier(affinity, inputs.raw_crit_dmg_multiplier);

    let raw_sharpness_modifier = inputs
        .final_sharpness_gauge
        .map_or(1.0, |gauge| gauge.raw_modifier());
    let raw_cap = inputs.weapon_raw * RAW_CAP_MULTIPLE;
    let multiplied_raw =
        f64::from(inputs.weapon_raw + inputs.bludgeoner_added_raw) * inputs.base_raw_multiplier;
    let precap_raw = multiplied_raw.round() as u32 + inputs.added_raw;
    let postcap_raw = precap_raw.min(raw_cap);
    let efr = f64::from(postcap_raw)
        * crit_modifier
        * raw_sharpness_modifier
        * inputs.frostcraft_raw_multiplier;

    let elestat = inputs.elestat;
    let elemental_sharpness_modifier =
        match (elestat.visibility, elestat.kind.is_element(), inputs.final_sharpness_gauge) {
            (EleStatVisibility::None, _, _) | (_, false, _) | (_, _, None) => 1.0,
            (_, true, Some(gauge)) => gauge.elemental_modifier(),
        };
    let base_elestat = match elestat.visibility {
        EleStatVisibility::Hidden => elestat.value * inputs.free_element_active_percentage / 100,
        _ => elestat.value,
    };
    let efes = f64::from(base_elestat) * elemental_sharpness_modifier;

    EffectiveDamageValues {
        affinity,
        final_sharpness_gauge: inputs.final_sharpness_gauge,
        pre_raw_cap_ratio: f64::from(precap_raw) / f64::from(raw_cap),
        efr,
        efes,
        elestat_type: elestat.kind,
    }
}

pub fn calculate_damage(model: &DamageModel, edv: &EffectiveDamageValues) -> ModelCalculatedValues {
    let unrounded_raw_damage =
        (edv.efr / 100.0) * f64::from(model.raw_mv) * (f64::from(model.hzv_raw) / 100.0);
    let unrounded_elestat_damage = if edv.efes == 0.0 {
        0.0
    } else {
        model
            .elemental_terms(edv.elestat_type)
            .map_or(0.0, |(elemod, hzv)| elemod * edv.efes * (f64::from(hzv) / 100.0))
    };
    ModelCalculatedValues {
        unrounded_raw_damage,
        unrounded_elestat_damage,
        unrounded_total_damage: unrounded_raw_damage + unrounded_elestat_damage,
        actual_total_damage: unrounded_raw_damage.round() as u32
            + unrounded_elestat_damage.round() as u32,
    }
}

pub fn calculate_edv_from_skills_lookup(
    class: WeaponClass,
    contribution: &WeaponContribution,
    skills: &SkillMap,
    misc_buffs: &MiscBuffsEquips,
    spec: &SkillSpec,
    catalogue: &SkillCatalogue,
) -> EffectiveDamageValues {
    let resolved = SkillContribution::new(skills, spec, class, contribution, catalogue);
    calculate_edv(&EdvInputs {
        weapon_raw: contribution.weapon_raw,
        weapon_aff: contribution.weapon_aff,
        elestat: contribution.elestat,
        base_raw_multiplier: resolved.base_raw_multiplier * misc_buffs.base_raw_multiplier(),
        frostcraft_raw_multiplier: resolved.frostcraft_raw_multiplier,
        bludgeoner_added_raw: resolved.bludgeoner_added_raw,
        added_raw: resolved.added_raw + misc_buffs.added_raw(),
        added_aff: resolved.added_aff,
        raw_crit_dmg_multiplier: resolved.raw_crit_dmg_multiplier,
        final_sharpness_gauge: resolved.final_sharpness_gauge,
        free_element_active_percentage: resolved.free_element_active_percentage,
    })
}

/// Skill map for a concrete build: armour and charm skills, decorations, the weapon's
/// innate skill, then whatever the combined set-bonus counts unlock.
pub fn gear_skill_map(
    db: &Database,
    contribution: &WeaponContribution,
    armour: &ArmourEquips,
    decos: &DecoEquips,
) -> SkillMap {
    let catalogue = db.skills();
    let mut skills = armour.skills_without_set_bonuses(db);
    skills.merge_in(&decos.skills(db), catalogue);
    if let Some(skill) = contribution.skill {
        skills.increment(skill, 1, catalogue);
    }
    let mut set_bonuses = armour.set_bonuses(db);
    if let Some(set_bonus) = contribution.set_bonus {
        set_bonuses.increment(set_bonus, 1);
    }
    skills.add_set_bonuses(&set_bonuses, catalogue);
    skills
}

pub fn calculate_edv_from_gear_lookup(
    db: &Database,
    weapon: &WeaponInstance<'_>,
    armour: &ArmourEquips,
    decos: &DecoEquips,
    misc_buffs: &MiscBuffsEquips,
    spec: &SkillSpec,
) -> EffectiveDamageValues {
    let contribution = weapon.calculate_contribution();
    debug_assert!(decos.fits_in(db, armour, &contribution));
    let skills = gear_skill_map(db, &contribution, armour, decos);
    calculate_edv_from_skills_lookup(
        weapon.weapon.class,
        &contribution,
        &skills,
        misc_buffs,
        spec,
        db.skills(),
    )
}
