//! Resolves accumulated skill levels into the numeric modifiers consumed by the damage model.

use crate::data::skills::{SkillCatalogue, SkillId};
use crate::data::weapon::WeaponClass;
use crate::model::sharpness::SharpnessGauge;
use crate::model::skills::{SkillMap, SkillSpec};
use crate::model::weapon_instance::WeaponContribution;

const ATTACK_BOOST_RAW: [u32; 7] = [3, 6, 9, 12, 15, 18, 21];
const ATTACK_BOOST_AFFINITY: [i32; 7] = [0, 0, 0, 5, 5, 5, 5];
const CRITICAL_EYE_AFFINITY: [i32; 7] = [5, 10, 15, 20, 25, 30, 40];
const CRITICAL_BOOST_MULTIPLIER: [f64; 4] = [1.25, 1.30, 1.35, 1.40];
const WEAKNESS_EXPLOIT_WEAK_POINT: [i32; 3] = [15, 30, 50];
const WEAKNESS_EXPLOIT_WOUND: [i32; 3] = [30, 45, 80];
const AGITATOR_RAW: [u32; 7] = [4, 8, 12, 16, 20, 24, 28];
const AGITATOR_AFFINITY: [i32; 7] = [5, 5, 7, 7, 10, 15, 20];
const PEAK_PERFORMANCE_RAW: [u32; 3] = [5, 10, 20];
const LATENT_POWER_AFFINITY: [i32; 5] = [10, 20, 30, 40, 50];
const MAXIMUM_MIGHT_AFFINITY: [i32; 3] = [10, 20, 30];
const OFFENSIVE_GUARD_MULTIPLIER: [f64; 3] = [1.05, 1.10, 1.15];
const NON_ELEMENTAL_BOOST_MULTIPLIER: f64 = 1.05;
const FREE_ELEMENT_PERCENTAGE: [u32; 3] = [33, 66, 100];

/// Skill-derived modifiers for one weapon contribution.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillContribution {
    pub added_raw: u32,
    pub added_aff: i32,
    pub base_raw_multiplier: f64,
    pub frostcraft_raw_multiplier: f64,
    pub bludgeoner_added_raw: u32,
    pub raw_crit_dmg_multiplier: f64,
    /// `None` for weapons without a sharpness gauge.
    pub final_sharpness_gauge: Option<SharpnessGauge>,
    pub free_element_active_percentage: u32,
}

struct Resolver<'a> {
    skills: &'a SkillMap,
    spec: &'a SkillSpec,
    catalogue: &'a SkillCatalogue,
}

impl Resolver<'_> {
    fn present(&self, skill: SkillId) -> bool {
        !self.spec.is_removed(skill) && self.skills.contains(skill)
    }

    /// Usable level: zero when removed or switched off, capped at the normal limit
    /// unless the skill's secret skill is present.
    fn level(&self, skill: Option<SkillId>) -> usize {
        let Some(skill) = skill else {
            return 0;
        };
        if !self.present(skill) || self.spec.get_state(skill, self.catalogue) == 0 {
            return 0;
        }
        let info = self.catalogue.skill(skill);
        let cap = match info.secret_skill {
            Some(secret) if self.present(secret) => info.secret_limit,
            _ => info.normal_limit,
        };
        usize::from(self.skills.get(skill).min(cap))
    }

    fn state(&self, skill: Option<SkillId>) -> u8 {
        skill.map_or(0, |skill| self.spec.get_state(skill, self.catalogue))
    }
}

fn lookup<T: Copy + Default>(table: &[T], level: usize) -> T {
    if level == 0 {
        T::default()
    } else {
        table[(level - 1).min(table.len() - 1)]
    }
}

fn frostcraft_multiplier(class: WeaponClass) -> f64 {
    match class {
        WeaponClass::Greatsword
        | WeaponClass::Hammer
        | WeaponClass::HuntingHorn
        | WeaponClass::Lance
        | WeaponClass::Gunlance
        | WeaponClass::SwitchAxe
        | WeaponClass::ChargeBlade => 1.15,
        WeaponClass::Longsword
        | WeaponClass::SwordAndShield
        | WeaponClass::DualBlades
        | WeaponClass::InsectGlaive => 1.10,
        WeaponClass::Bow | WeaponClass::LightBowgun | WeaponClass::HeavyBowgun => 1.0,
    }
}

fn bludgeoner_percentage(gauge: &SharpnessGauge) -> u32 {
    match gauge.top_tier() {
        0 | 1 => 30,
        2 => 25,
        3 => 10,
        _ => 0,
    }
}

impl SkillContribution {
    pub fn new(
        skills: &SkillMap,
        spec: &SkillSpec,
        class: WeaponClass,
        contribution: &WeaponContribution,
        catalogue: &SkillCatalogue,
    ) -> Self {
        let known = catalogue.known();
        let resolver = Resolver {
            skills,
            spec,
            catalogue,
        };

        let mut added_raw = 0u32;
        let mut added_aff = 0i32;
        let mut base_raw_multiplier = 1.0;

        let attack_boost = resolver.level(known.attack_boost);
        added_raw += lookup(&ATTACK_BOOST_RAW, attack_boost);
        added_aff += lookup(&ATTACK_BOOST_AFFINITY, attack_boost);

        added_aff += lookup(&CRITICAL_EYE_AFFINITY, resolver.level(known.critical_eye));

        let weakness_exploit = resolver.level(known.weakness_exploit);
        added_aff += match resolver.state(known.weakness_exploit) {
            1 => lookup(&WEAKNESS_EXPLOIT_WEAK_POINT, weakness_exploit),
            _ => lookup(&WEAKNESS_EXPLOIT_WOUND, weakness_exploit),
        };

        let agitator = resolver.level(known.agitator);
        added_raw += lookup(&AGITATOR_RAW, agitator);
        added_aff += lookup(&AGITATOR_AFFINITY, agitator);

        added_raw += lookup(&PEAK_PERFORMANCE_RAW, resolver.level(known.peak_performance));
        added_aff += lookup(&LATENT_POWER_AFFINITY, resolver.level(known.latent_power));
        added_aff += lookup(&MAXIMUM_MIGHT_AFFINITY, resolver.level(known.maximum_might));

        let offensive_guard = resolver.level(known.offensive_guard);
        if offensive_guard > 0 {
            base_raw_multiplier *= lookup(&OFFENSIVE_GUARD_MULTIPLIER, offensive_guard);
        }
        if resolver.level(known.non_elemental_boost) > 0 && contribution.elestat.is_raw() {
            base_raw_multiplier *= NON_ELEMENTAL_BOOST_MULTIPLIER;
        }

        let raw_crit_dmg_multiplier =
            CRITICAL_BOOST_MULTIPLIER[resolver.level(known.critical_boost).min(3)];

        let frostcraft_raw_multiplier = if resolver.level(known.frostcraft) > 0 {
            frostcraft_multiplier(class)
        } else {
            1.0
        };

        let final_sharpness_gauge = contribution.maximum_sharpness.map(|gauge| {
            if contribution.is_constant_sharpness {
                gauge
            } else {
                gauge.with_handicraft(resolver.level(known.handicraft) as u8)
            }
        });

        let bludgeoner_added_raw = match (&final_sharpness_gauge, resolver.level(known.bludgeoner)) {
            (Some(gauge), level) if level > 0 => {
                contribution.weapon_raw * bludgeoner_percentage(gauge) / 100
            }
            _ => 0,
        };

        let free_element_active_percentage =
            lookup(&FREE_ELEMENT_PERCENTAGE, resolver.level(known.free_element));

        Self {
            added_raw,
            added_aff,
            base_raw_multiplier,
            frostcraft_raw_multiplier,
            bludgeoner_added_raw,
            raw_crit_dmg_multiplier,
            final_sharpness_gauge,
            free_element_active_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use serde_json::json;

    use super::*;
    use crate::data::skills::SkillsFile;
    use crate::data::weapon::EleStat;

    fn catalogue() -> SkillCatalogue {
        let file: SkillsFile = serde_json::from_value(json!({
            "skills": {
                "AGITATOR": { "name": "Agitator", "limit": 5, "secret_limit": 7, "secret_skill": "AGITATOR_SECRET" },
                "AGITATOR_SECRET": { "name": "Agitator Secret", "limit": 1 },
                "CRITICAL_BOOST": { "name": "Critical Boost", "limit": 3 },
                "HANDICRAFT": { "name": "Handicraft", "limit": 5 },
                "WEAKNESS_EXPLOIT": { "name": "Weakness Exploit", "limit": 3, "states": 3 }
            }
        }))
        .unwrap();
        SkillCatalogue::from_file(file).unwrap()
    }

    fn contribution() -> WeaponContribution {
        WeaponContribution {
            weapon_raw: 320,
            weapon_aff: 0,
            skill: None,
            set_bonus: None,
            deco_slots: Vec::new(),
            maximum_sharpness: Some(SharpnessGauge::from_hits([50, 50, 60, 60, 80, 60, 40])),
            is_constant_sharpness: false,
            health_regen_active: false,
            elestat: EleStat::default(),
        }
    }

    fn skill_map(catalogue: &SkillCatalogue, levels: &[(&str, u8)]) -> SkillMap {
        levels
            .iter()
            .map(|(id, level)| (catalogue.find_skill(id).unwrap(), *level))
            .collect()
    }

    #[test]
    fn agitator_is_capped_without_its_secret_skill() {
        let skills = catalogue();
        let spec = SkillSpec::default();
        let capped = SkillContribution::new(
            &skill_map(&skills, &[("AGITATOR", 7)]),
            &spec,
            WeaponClass::Greatsword,
            &contribution(),
            &skills,
        );
        assert_eq!(capped.added_raw, 20);
        assert_eq!(capped.added_aff, 10);

        let unlocked = SkillContribution::new(
            &skill_map(&skills, &[("AGITATOR", 7), ("AGITATOR_SECRET", 1)]),
            &spec,
            WeaponClass::Greatsword,
            &contribution(),
            &skills,
        );
        assert_eq!(unlocked.added_raw, 28);
        assert_eq!(unlocked.added_aff, 20);
    }

    #[test]
    fn weakness_exploit_follows_the_forced_state() {
        let skills = catalogue();
        let wex = skills.find_skill("WEAKNESS_EXPLOIT").unwrap();
        let levels = skill_map(&skills, &[("WEAKNESS_EXPLOIT", 3)]);

        let wound = SkillContribution::new(&levels, &SkillSpec::default(), WeaponClass::Greatsword, &contribution(), &skills);
        assert_eq!(wound.added_aff, 80);

        let weak_point_spec = SkillSpec::new(
            BTreeMap::new(),
            [(wex, 1)].into_iter().collect(),
            BTreeSet::new(),
            BTreeMap::new(),
            &skills,
        )
        .unwrap();
        let weak_point = SkillContribution::new(&levels, &weak_point_spec, WeaponClass::Greatsword, &contribution(), &skills);
        assert_eq!(weak_point.added_aff, 50);

        let off_spec = SkillSpec::new(
            BTreeMap::new(),
            [(wex, 0)].into_iter().collect(),
            BTreeSet::new(),
            BTreeMap::new(),
            &skills,
        )
        .unwrap();
        let off = SkillContribution::new(&levels, &off_spec, WeaponClass::Greatsword, &contribution(), &skills);
        assert_eq!(off.added_aff, 0);
    }

    #[test]
    fn handicraft_restores_the_top_of_the_gauge() {
        let skills = catalogue();
        let none = SkillContribution::new(&SkillMap::new(), &SkillSpec::default(), WeaponClass::Greatsword, &contribution(), &skills);
        assert_eq!(none.final_sharpness_gauge.map(|g| g.top_tier()), Some(5));

        let maxed = SkillContribution::new(
            &skill_map(&skills, &[("HANDICRAFT", 5)]),
            &SkillSpec::default(),
            WeaponClass::Greatsword,
            &contribution(),
            &skills,
        );
        assert_eq!(maxed.final_sharpness_gauge.map(|g| g.top_tier()), Some(6));
    }

    #[test]
    fn removed_skills_contribute_nothing() {
        let skills = catalogue();
        let boost = skills.find_skill("CRITICAL_BOOST").unwrap();
        let spec = SkillSpec::new(
            BTreeMap::new(),
            BTreeMap::new(),
            [boost].into_iter().collect(),
            BTreeMap::new(),
            &skills,
        )
        .unwrap();
        let resolved = SkillContribution::new(
            &skill_map(&skills, &[("CRITICAL_BOOST", 3)]),
            &spec,
            WeaponClass::Greatsword,
            &contribution(),
            &skills,
        );
        assert!((resolved.raw_crit_dmg_multiplier - 1.25).abs() < 1e-12);
    }
}
