use serde::Serialize;

use crate::data::armour::ArmourSlot;
use crate::data::database::Database;
use crate::model::damage::{calculate_damage, DamageModel, EffectiveDamageValues, ModelCalculatedValues};
use crate::model::equips::{ArmourEquips, DecoEquips, MiscBuffsEquips};
use crate::model::skills::SkillMap;
use crate::model::weapon_instance::WeaponInstance;
use crate::optimizer::search::BestBuild;
use crate::optimizer::SearchStats;

#[derive(Debug, Clone, Serialize)]
pub struct WeaponReport {
    pub id: String,
    pub name: String,
    pub class: String,
    pub configuration: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArmourReportEntry {
    pub slot: ArmourSlot,
    pub piece: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillReportEntry {
    pub id: String,
    pub name: String,
    pub level: u8,
}

/// Machine-readable summary of one build, printed as JSON on stdout.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub generated_at: String,
    pub efr: f64,
    pub efes: f64,
    pub affinity: i32,
    pub sharpness: Option<String>,
    pub pre_raw_cap_ratio: f64,
    pub damage: Option<ModelCalculatedValues>,
    pub weapon: WeaponReport,
    pub armour: Vec<ArmourReportEntry>,
    pub charm: Option<String>,
    pub decorations: Vec<String>,
    pub misc_buffs: Vec<String>,
    pub skills: Vec<SkillReportEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SearchStats>,
}

/// Everything a report needs from a build, however it was obtained.
pub struct ReportInputs<'a, 'db> {
    pub weapon: &'a WeaponInstance<'db>,
    pub armour: &'a ArmourEquips,
    pub decorations: &'a DecoEquips,
    pub misc_buffs: &'a MiscBuffsEquips,
    pub skills: &'a SkillMap,
    pub edv: &'a EffectiveDamageValues,
    pub damage_model: Option<&'a DamageModel>,
}

pub fn build_report(db: &Database, inputs: ReportInputs<'_, '_>) -> BuildReport {
    let catalogue = db.skills();
    let weapon = inputs.weapon.weapon;
    BuildReport {
        generated_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        efr: inputs.edv.efr,
        efes: inputs.edv.efes,
        affinity: inputs.edv.affinity,
        sharpness: inputs.edv.final_sharpness_gauge.map(|gauge| gauge.to_string()),
        pre_raw_cap_ratio: inputs.edv.pre_raw_cap_ratio,
        damage: inputs
            .damage_model
            .map(|model| calculate_damage(model, inputs.edv)),
        weapon: WeaponReport {
            id: weapon.id.clone(),
            name: weapon.name.clone(),
            class: weapon.class.to_string(),
            configuration: inputs.weapon.describe(),
        },
        armour: ArmourSlot::ALL
            .iter()
            .filter_map(|slot| {
                inputs.armour.piece(*slot).map(|piece| ArmourReportEntry {
                    slot: *slot,
                    piece: db.armour_piece(piece).display_name(),
                })
            })
            .collect(),
        charm: inputs.armour.charm().map(|charm| db.charm(charm).name.clone()),
        decorations: inputs
            .decorations
            .iter()
            .map(|deco| db.decoration(deco).name.clone())
            .collect(),
        misc_buffs: inputs
            .misc_buffs
            .buffs()
            .iter()
            .map(|buff| db.misc_buff(*buff).name.clone())
            .collect(),
        skills: inputs
            .skills
            .iter()
            .map(|(skill, level)| {
                let info = catalogue.skill(skill);
                SkillReportEntry {
                    id: info.id.clone(),
                    name: info.name.clone(),
                    level,
                }
            })
            .collect(),
        stats: None,
    }
}

pub fn search_report(
    db: &Database,
    best: &BestBuild<'_>,
    misc_buffs: &MiscBuffsEquips,
    damage_model: &DamageModel,
    stats: SearchStats,
) -> BuildReport {
    let mut report = build_report(
        db,
        ReportInputs {
            weapon: &best.weapon,
            armour: &best.armour,
            decorations: &best.decorations,
            misc_buffs,
            skills: &best.skills,
            edv: &best.edv,
            damage_model: Some(damage_model),
        },
    );
    report.stats = Some(stats);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::database::shipped_database;
    use crate::model::damage::calculate_edv_from_gear_lookup;
    use crate::model::skills::SkillSpec;

    #[test]
    fn report_names_every_worn_piece() {
        let db = shipped_database();
        let weapon_id = db.find_weapon("SAFI_SHATTERSPLITTER").unwrap();
        let weapon = WeaponInstance::new(weapon_id, db.weapon(weapon_id));
        let mut armour = ArmourEquips::new();
        let head = db
            .armour_pieces()
            .find(|(_, piece)| piece.slot == ArmourSlot::Head)
            .map(|(id, _)| id)
            .unwrap();
        armour.add(&db, head);
        let decorations = DecoEquips::default();
        let misc_buffs = MiscBuffsEquips::default();
        let spec = SkillSpec::default();
        let edv = calculate_edv_from_gear_lookup(&db, &weapon, &armour, &decorations, &misc_buffs, &spec);
        let skills = crate::model::damage::gear_skill_map(&db, &weapon.calculate_contribution(), &armour, &decorations);

        let report = build_report(
            &db,
            ReportInputs {
                weapon: &weapon,
                armour: &armour,
                decorations: &decorations,
                misc_buffs: &misc_buffs,
                skills: &skills,
                edv: &edv,
                damage_model: None,
            },
        );
        assert_eq!(report.armour.len(), 1);
        assert_eq!(report.armour[0].slot, ArmourSlot::Head);
        assert!(report.damage.is_none());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["weapon"]["id"], "SAFI_SHATTERSPLITTER");
        assert!(json.get("stats").is_none());
    }
}
