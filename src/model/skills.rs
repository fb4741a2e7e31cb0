//! Skill accumulation and the search constraints built on top of it.

use std::collections::{BTreeMap, BTreeSet};

use crate::data::skills::{SetBonusId, SkillCatalogue, SkillId};
use crate::error::ConfigError;

/// Set-bonus piece counts saturate here (five armour pieces; a weapon may add one
/// more, which is absorbed by the cap).
pub const MAX_SET_BONUS_PIECES: u8 = 5;

/// Skill levels accumulated from gear. Levels never exceed the skill's secret limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkillMap(BTreeMap<SkillId, u8>);

impl SkillMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, skill: SkillId) -> u8 {
        self.0.get(&skill).copied().unwrap_or(0)
    }

    pub fn contains(&self, skill: SkillId) -> bool {
        self.get(skill) > 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkillId, u8)> + '_ {
        self.0.iter().map(|(skill, level)| (*skill, *level))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn increment(&mut self, skill: SkillId, levels: u8, catalogue: &SkillCatalogue) {
        if levels == 0 {
            return;
        }
        let limit = catalogue.skill(skill).secret_limit;
        let entry = self.0.entry(skill).or_insert(0);
        *entry = entry.saturating_add(levels).min(limit);
    }

    /// Lower a skill by one level, dropping the key at zero.
    pub fn decrement(&mut self, skill: SkillId) {
        if let Some(level) = self.0.get_mut(&skill) {
            *level -= 1;
            if *level == 0 {
                self.0.remove(&skill);
            }
        }
    }

    pub fn merge_in(&mut self, other: &SkillMap, catalogue: &SkillCatalogue) {
        for (skill, level) in other.iter() {
            self.increment(skill, level, catalogue);
        }
    }

    /// Grant one level of every stage skill unlocked by the given piece counts.
    pub fn add_set_bonuses(&mut self, set_bonuses: &SetBonusMap, catalogue: &SkillCatalogue) {
        for (set_bonus, pieces) in set_bonuses.iter() {
            for stage in &catalogue.set_bonus(set_bonus).stages {
                if stage.parts <= pieces {
                    self.increment(stage.skill, 1, catalogue);
                }
            }
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(SkillId) -> bool) {
        self.0.retain(|skill, _| keep(*skill));
    }
}

impl FromIterator<(SkillId, u8)> for SkillMap {
    fn from_iter<I: IntoIterator<Item = (SkillId, u8)>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|(_, level)| *level > 0).collect())
    }
}

/// Equipped piece counts per set bonus, capped at [`MAX_SET_BONUS_PIECES`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetBonusMap(BTreeMap<SetBonusId, u8>);

impl SetBonusMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, set_bonus: SetBonusId) -> u8 {
        self.0.get(&set_bonus).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SetBonusId, u8)> + '_ {
        self.0.iter().map(|(id, pieces)| (*id, *pieces))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn increment(&mut self, set_bonus: SetBonusId, pieces: u8) {
        if pieces == 0 {
            return;
        }
        let entry = self.0.entry(set_bonus).or_insert(0);
        *entry = entry.saturating_add(pieces).min(MAX_SET_BONUS_PIECES);
    }

    pub fn decrement(&mut self, set_bonus: SetBonusId) {
        if let Some(pieces) = self.0.get_mut(&set_bonus) {
            *pieces -= 1;
            if *pieces == 0 {
                self.0.remove(&set_bonus);
            }
        }
    }

    pub fn merge_in(&mut self, other: &SetBonusMap) {
        for (set_bonus, pieces) in other.iter() {
            self.increment(set_bonus, pieces);
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(SetBonusId) -> bool) {
        self.0.retain(|set_bonus, _| keep(*set_bonus));
    }
}

impl FromIterator<(SetBonusId, u8)> for SetBonusMap {
    fn from_iter<I: IntoIterator<Item = (SetBonusId, u8)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (set_bonus, pieces) in iter {
            map.increment(set_bonus, pieces);
        }
        map
    }
}

/// Search constraints.
///
/// The keys of `min_levels` form the relevant skill subset: every other skill is
/// stripped from accumulated maps before deduplication. A set bonus is relevant when
/// one of its stages grants a relevant skill or when it carries a cutoff.
#[derive(Debug, Clone, Default)]
pub struct SkillSpec {
    min_levels: BTreeMap<SkillId, u8>,
    forced_states: BTreeMap<SkillId, u8>,
    force_remove: BTreeSet<SkillId>,
    set_bonus_cutoffs: BTreeMap<SetBonusId, u8>,
    set_bonus_subset: BTreeSet<SetBonusId>,
}

impl SkillSpec {
    pub fn new(
        min_levels: BTreeMap<SkillId, u8>,
        forced_states: BTreeMap<SkillId, u8>,
        force_remove: BTreeSet<SkillId>,
        set_bonus_cutoffs: BTreeMap<SetBonusId, u8>,
        catalogue: &SkillCatalogue,
    ) -> Result<Self, ConfigError> {
        for (skill, level) in &min_levels {
            let info = catalogue.skill(*skill);
            if *level > info.secret_limit {
                return Err(ConfigError::ContradictorySkillSpec(format!(
                    "{} requires level {} but cannot exceed {}",
                    info.id, level, info.secret_limit
                )));
            }
            if *level > 0 && force_remove.contains(skill) {
                return Err(ConfigError::ContradictorySkillSpec(format!(
                    "{} is both required and removed",
                    info.id
                )));
            }
        }
        for (skill, state) in &forced_states {
            let info = catalogue.skill(*skill);
            if *state >= info.states {
                return Err(ConfigError::ContradictorySkillSpec(format!(
                    "{} has {} states; state {} is out of range",
                    info.id, info.states, state
                )));
            }
            if *state > 0 && force_remove.contains(skill) {
                return Err(ConfigError::ContradictorySkillSpec(format!(
                    "{} is forced active but removed",
                    info.id
                )));
            }
        }
        for (set_bonus, cutoff) in &set_bonus_cutoffs {
            if *cutoff == 0 || *cutoff > MAX_SET_BONUS_PIECES + 1 {
                return Err(ConfigError::ContradictorySkillSpec(format!(
                    "set bonus cutoff {} for {} is out of range",
                    cutoff,
                    catalogue.set_bonus(*set_bonus).id
                )));
            }
        }

        // A relevant skill's secret skill is relevant too, or its upper levels are unreachable.
        let mut min_levels = min_levels;
        let secrets: Vec<SkillId> = min_levels
            .keys()
            .filter_map(|skill| catalogue.skill(*skill).secret_skill)
            .filter(|secret| !force_remove.contains(secret))
            .collect();
        for secret in secrets {
            min_levels.entry(secret).or_insert(0);
        }

        let set_bonus_subset = catalogue
            .set_bonus_ids()
            .filter(|id| {
                set_bonus_cutoffs.contains_key(id)
                    || catalogue
                        .set_bonus(*id)
                        .stages
                        .iter()
                        .any(|stage| min_levels.contains_key(&stage.skill))
            })
            .collect();

        Ok(Self {
            min_levels,
            forced_states,
            force_remove,
            set_bonus_cutoffs,
            set_bonus_subset,
        })
    }

    pub fn is_in_subset(&self, skill: SkillId) -> bool {
        self.min_levels.contains_key(&skill)
    }

    pub fn is_set_bonus_in_subset(&self, set_bonus: SetBonusId) -> bool {
        self.set_bonus_subset.contains(&set_bonus)
    }

    pub fn is_removed(&self, skill: SkillId) -> bool {
        self.force_remove.contains(&skill)
    }

    pub fn min_level(&self, skill: SkillId) -> u8 {
        self.min_levels.get(&skill).copied().unwrap_or(0)
    }

    pub fn subset(&self) -> impl Iterator<Item = SkillId> + '_ {
        self.min_levels.keys().copied()
    }

    pub fn set_bonus_subset(&self) -> impl Iterator<Item = SetBonusId> + '_ {
        self.set_bonus_subset.iter().copied()
    }

    pub fn set_bonus_cutoffs(&self) -> impl Iterator<Item = (SetBonusId, u8)> + '_ {
        self.set_bonus_cutoffs.iter().map(|(id, cutoff)| (*id, *cutoff))
    }

    /// Forced state if one was given, otherwise the highest state.
    pub fn get_state(&self, skill: SkillId, catalogue: &SkillCatalogue) -> u8 {
        self.forced_states
            .get(&skill)
            .copied()
            .unwrap_or_else(|| catalogue.skill(skill).states - 1)
    }

    pub fn is_satisfied(&self, skills: &SkillMap) -> bool {
        self.min_levels
            .iter()
            .all(|(skill, level)| skills.get(*skill) >= *level)
    }

    /// Cutoffs are exclusive ceilings: reaching a cutoff exactly is a violation.
    pub fn within_cutoffs(&self, set_bonuses: &SetBonusMap) -> bool {
        self.set_bonus_cutoffs
            .iter()
            .all(|(set_bonus, cutoff)| set_bonuses.get(*set_bonus) < *cutoff)
    }

    pub fn normalize_skills(&self, skills: &mut SkillMap) {
        skills.retain(|skill| self.is_in_subset(skill));
    }

    pub fn normalize_set_bonuses(&self, set_bonuses: &mut SetBonusMap) {
        set_bonuses.retain(|set_bonus| self.is_set_bonus_in_subset(set_bonus));
    }

    /// Every relevant skill at its secret limit. Used for optimistic ceilings.
    pub fn maximum_skill_map(&self, catalogue: &SkillCatalogue) -> SkillMap {
        self.min_levels
            .keys()
            .filter(|skill| !self.is_removed(**skill))
            .map(|skill| (*skill, catalogue.skill(*skill).secret_limit))
            .collect()
    }
}
