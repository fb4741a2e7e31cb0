//! Skill and set-bonus catalogue (`skills.json`).
//! Every skill reference in the other catalogue files is resolved against this table at load time.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::error::DataError;

/// Every skill has at least an "off" and an "on" state.
pub const MINIMUM_SKILL_STATES: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkillId(pub(crate) u16);

impl SkillId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetBonusId(pub(crate) u16);

impl SetBonusId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub normal_limit: u8,
    /// Hard cap on accumulated levels. Levels above `normal_limit` only count while
    /// `secret_skill` is active.
    pub secret_limit: u8,
    pub states: u8,
    pub secret_skill: Option<SkillId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetBonusStage {
    pub parts: u8,
    pub skill: SkillId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetBonus {
    pub id: String,
    pub name: String,
    /// Sorted by ascending `parts`.
    pub stages: Vec<SetBonusStage>,
}

#[derive(Debug, Clone, Deserialize)]
struct SkillRecord {
    name: String,
    limit: u8,
    #[serde(default)]
    secret_limit: Option<u8>,
    #[serde(default)]
    states: Option<u8>,
    #[serde(default)]
    secret_skill: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SetBonusStageRecord {
    parts: u8,
    skill: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SetBonusRecord {
    name: String,
    stages: Vec<SetBonusStageRecord>,
}

/// Raw shape of `skills.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillsFile {
    skills: BTreeMap<String, SkillRecord>,
    #[serde(default)]
    set_bonuses: BTreeMap<String, SetBonusRecord>,
}

/// Handles for the skills whose effects the damage model knows how to resolve.
/// A catalogue without one of these simply never applies that effect.
#[derive(Debug, Clone, Default)]
pub struct KnownSkills {
    pub agitator: Option<SkillId>,
    pub attack_boost: Option<SkillId>,
    pub bludgeoner: Option<SkillId>,
    pub critical_boost: Option<SkillId>,
    pub critical_eye: Option<SkillId>,
    pub free_element: Option<SkillId>,
    pub frostcraft: Option<SkillId>,
    pub handicraft: Option<SkillId>,
    pub latent_power: Option<SkillId>,
    pub maximum_might: Option<SkillId>,
    pub non_elemental_boost: Option<SkillId>,
    pub offensive_guard: Option<SkillId>,
    pub peak_performance: Option<SkillId>,
    pub weakness_exploit: Option<SkillId>,
}

#[derive(Debug, Clone)]
pub struct SkillCatalogue {
    skills: Vec<Skill>,
    set_bonuses: Vec<SetBonus>,
    skill_index: HashMap<String, SkillId>,
    set_bonus_index: HashMap<String, SetBonusId>,
    known: KnownSkills,
}

impl SkillCatalogue {
    pub fn from_file(file: SkillsFile) -> Result<Self, DataError> {
        let skill_index: HashMap<String, SkillId> = file
            .skills
            .keys()
            .enumerate()
            .map(|(index, id)| (id.clone(), SkillId(index as u16)))
            .collect();

        let mut skills = Vec::with_capacity(file.skills.len());
        for (id, record) in &file.skills {
            let secret_limit = record.secret_limit.unwrap_or(record.limit);
            if record.limit == 0 || secret_limit < record.limit {
                return Err(DataError::Invalid {
                    context: format!("skill '{id}'"),
                    message: format!(
                        "limit {} and secret limit {} are inconsistent",
                        record.limit, secret_limit
                    ),
                });
            }
            let secret_skill = match &record.secret_skill {
                Some(secret_id) => Some(*skill_index.get(secret_id).ok_or_else(|| {
                    DataError::UnresolvedReference {
                        context: format!("skill '{id}'"),
                        kind: "skill",
                        id: secret_id.clone(),
                    }
                })?),
                None => None,
            };
            skills.push(Skill {
                id: id.clone(),
                name: record.name.clone(),
                normal_limit: record.limit,
                secret_limit,
                states: record.states.unwrap_or(MINIMUM_SKILL_STATES).max(MINIMUM_SKILL_STATES),
                secret_skill,
            });
        }

        let mut set_bonuses = Vec::with_capacity(file.set_bonuses.len());
        let mut set_bonus_index = HashMap::new();
        for (index, (id, record)) in file.set_bonuses.iter().enumerate() {
            let mut stages = Vec::with_capacity(record.stages.len());
            for stage in &record.stages {
                let skill = *skill_index.get(&stage.skill).ok_or_else(|| {
                    DataError::UnresolvedReference {
                        context: format!("set bonus '{id}'"),
                        kind: "skill",
                        id: stage.skill.clone(),
                    }
                })?;
                if stage.parts == 0 || stage.parts > crate::model::skills::MAX_SET_BONUS_PIECES {
                    return Err(DataError::Invalid {
                        context: format!("set bonus '{id}'"),
                        message: format!("stage threshold {} is out of range", stage.parts),
                    });
                }
                stages.push(SetBonusStage {
                    parts: stage.parts,
                    skill,
                });
            }
            stages.sort_by_key(|stage| stage.parts);
            set_bonus_index.insert(id.clone(), SetBonusId(index as u16));
            set_bonuses.push(SetBonus {
                id: id.clone(),
                name: record.name.clone(),
                stages,
            });
        }

        let lookup = |id: &str| skill_index.get(id).copied();
        let known = KnownSkills {
            agitator: lookup("AGITATOR"),
            attack_boost: lookup("ATTACK_BOOST"),
            bludgeoner: lookup("BLUDGEONER"),
            critical_boost: lookup("CRITICAL_BOOST"),
            critical_eye: lookup("CRITICAL_EYE"),
            free_element: lookup("FREE_ELEMENT"),
            frostcraft: lookup("FROSTCRAFT"),
            handicraft: lookup("HANDICRAFT"),
            latent_power: lookup("LATENT_POWER"),
            maximum_might: lookup("MAXIMUM_MIGHT"),
            non_elemental_boost: lookup("NON_ELEMENTAL_BOOST"),
            offensive_guard: lookup("OFFENSIVE_GUARD"),
            peak_performance: lookup("PEAK_PERFORMANCE"),
            weakness_exploit: lookup("WEAKNESS_EXPLOIT"),
        };

        Ok(Self {
            skills,
            set_bonuses,
            skill_index,
            set_bonus_index,
            known,
        })
    }

    pub fn skill(&self, id: SkillId) -> &Skill {
        &self.skills[id.index()]
    }

    pub fn set_bonus(&self, id: SetBonusId) -> &SetBonus {
        &self.set_bonuses[id.index()]
    }

    pub fn find_skill(&self, id: &str) -> Option<SkillId> {
        self.skill_index.get(id).copied()
    }

    pub fn find_set_bonus(&self, id: &str) -> Option<SetBonusId> {
        self.set_bonus_index.get(id).copied()
    }

    /// Resolve a skill id string, failing with the given context when it is unknown.
    pub fn resolve_skill(&self, context: &str, id: &str) -> Result<SkillId, DataError> {
        self.find_skill(id).ok_or_else(|| DataError::UnresolvedReference {
            context: context.to_string(),
            kind: "skill",
            id: id.to_string(),
        })
    }

    pub fn resolve_set_bonus(&self, context: &str, id: &str) -> Result<SetBonusId, DataError> {
        self.find_set_bonus(id)
            .ok_or_else(|| DataError::UnresolvedReference {
                context: context.to_string(),
                kind: "set bonus",
                id: id.to_string(),
            })
    }

    pub fn skill_ids(&self) -> impl Iterator<Item = SkillId> + '_ {
        (0..self.skills.len()).map(|index| SkillId(index as u16))
    }

    pub fn set_bonus_ids(&self) -> impl Iterator<Item = SetBonusId> + '_ {
        (0..self.set_bonuses.len()).map(|index| SetBonusId(index as u16))
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }

    pub fn set_bonus_count(&self) -> usize {
        self.set_bonuses.len()
    }

    pub fn known(&self) -> &KnownSkills {
        &self.known
    }
}
