//! Weapon candidates for a search: maximized configurations of every allowed weapon,
//! pruned by dominance and annotated with an optimistic EFR ceiling.

use tracing::{debug, info};

use crate::data::database::Database;
use crate::data::request::SearchParameters;
use crate::data::weapon::WeaponClass;
use crate::error::SearchError;
use crate::model::damage::calculate_edv_from_skills_lookup;
use crate::model::skills::SkillMap;
use crate::model::weapon_instance::{generate_maximized_instances, WeaponContribution, WeaponInstance};

#[derive(Debug, Clone)]
pub struct PreparedWeapon<'db> {
    pub instance: WeaponInstance<'db>,
    /// Skill and set bonus outside the relevant subset are already cleared.
    pub contribution: WeaponContribution,
    /// Best EFR this weapon could reach with every relevant skill maxed.
    pub ceiling_efr: f64,
}

/// Members never dominate one another. Insertion keeps the earlier of two equals.
#[derive(Debug, Clone)]
pub struct PrunedSet<T> {
    members: Vec<T>,
}

impl<T> Default for PrunedSet<T> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
        }
    }
}

impl<T> PrunedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if an existing member already dominates `candidate`.
    pub fn insert(&mut self, candidate: T, dominates: impl Fn(&T, &T) -> bool) -> bool {
        if self.members.iter().any(|member| dominates(member, &candidate)) {
            return false;
        }
        self.members.retain(|member| !dominates(&candidate, member));
        self.members.push(candidate);
        true
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.members.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.members
    }
}

fn slots_dominate(left: &[u8], right: &[u8]) -> bool {
    left.len() >= right.len() && left.iter().zip(right).all(|(l, r)| l >= r)
}

fn absent_or_equal<T: PartialEq>(left: &Option<T>, right: &Option<T>) -> bool {
    right.is_none() || left == right
}

/// Whether `left` is never worse than `right` in any build.
pub fn weapon_dominates(left: &WeaponContribution, right: &WeaponContribution) -> bool {
    if left.weapon_raw < right.weapon_raw || left.weapon_aff < right.weapon_aff {
        return false;
    }
    if !slots_dominate(&left.deco_slots, &right.deco_slots) {
        return false;
    }
    if !absent_or_equal(&left.skill, &right.skill) || !absent_or_equal(&left.set_bonus, &right.set_bonus) {
        return false;
    }
    if right.health_regen_active && !left.health_regen_active {
        return false;
    }
    // Non-elemental boost only applies to raw weapons.
    if right.elestat.is_raw() && !left.elestat.is_raw() {
        return false;
    }
    if right.is_constant_sharpness && !left.is_constant_sharpness {
        return false;
    }
    match (&left.maximum_sharpness, &right.maximum_sharpness) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(l), Some(r)) => l.dominates(r),
    }
}

fn normalize(contribution: &mut WeaponContribution, params: &SearchParameters) {
    let spec = &params.skill_spec;
    if contribution.skill.is_some_and(|skill| !spec.is_in_subset(skill)) {
        contribution.skill = None;
    }
    if contribution
        .set_bonus
        .is_some_and(|set_bonus| !spec.is_set_bonus_in_subset(set_bonus))
    {
        contribution.set_bonus = None;
    }
}

/// EFR with every relevant skill at its secret limit.
///
/// Handicraft is not monotone with bludgeoner in play, so each handicraft level is tried.
fn ceiling_efr(
    db: &Database,
    params: &SearchParameters,
    prepared: &WeaponContribution,
    class: WeaponClass,
) -> f64 {
    let catalogue = db.skills();
    let spec = &params.skill_spec;
    let maximum = spec.maximum_skill_map(catalogue);
    let handicraft = catalogue.known().handicraft.filter(|skill| maximum.contains(*skill));

    let evaluate = |skills: &SkillMap| {
        calculate_edv_from_skills_lookup(class, prepared, skills, &params.misc_buffs, spec, catalogue).efr
    };
    match handicraft {
        None => evaluate(&maximum),
        Some(skill) => (0..=maximum.get(skill))
            .map(|level| {
                let mut skills = maximum.clone();
                skills.retain(|other| other != skill);
                skills.increment(skill, level, catalogue);
                evaluate(&skills)
            })
            .fold(f64::MIN, f64::max),
    }
}

pub fn prepare_weapons<'db>(
    db: &'db Database,
    params: &SearchParameters,
) -> Result<Vec<PreparedWeapon<'db>>, SearchError> {
    let spec = &params.skill_spec;
    let mut generated = 0usize;
    let mut pruned: PrunedSet<(WeaponInstance<'db>, WeaponContribution)> = PrunedSet::new();

    for (id, weapon) in db.weapons().filter(|(_, weapon)| params.allows_weapon(weapon)) {
        if weapon.skill.is_some_and(|skill| spec.is_removed(skill)) {
            debug!(weapon = %weapon.id, "innate skill is removed");
            continue;
        }
        for instance in generate_maximized_instances(id, weapon) {
            generated += 1;
            let mut contribution = instance.calculate_contribution();
            if params.health_regen_required && !contribution.health_regen_active {
                continue;
            }
            normalize(&mut contribution, params);
            pruned.insert((instance, contribution), |left, right| {
                weapon_dominates(&left.1, &right.1)
            });
        }
    }

    if pruned.is_empty() {
        return Err(SearchError::NoWeaponCandidates {
            class: params.weapon_class.to_string(),
        });
    }
    info!(generated, kept = pruned.len(), "weapon configurations pruned");

    let mut prepared: Vec<PreparedWeapon<'db>> = pruned
        .into_vec()
        .into_iter()
        .map(|(instance, contribution)| {
            let ceiling_efr = ceiling_efr(db, params, &contribution, instance.weapon.class);
            PreparedWeapon {
                instance,
                contribution,
                ceiling_efr,
            }
        })
        .collect();
    // Most promising first, so improvements come early and the bound bites sooner.
    prepared.sort_by(|a, b| b.ceiling_efr.total_cmp(&a.ceiling_efr));
    Ok(prepared)
}

/// Drop every weapon that cannot beat `best_efr`.
pub fn retain_above(weapons: &mut Vec<PreparedWeapon<'_>>, best_efr: f64) {
    let before = weapons.len();
    weapons.retain(|weapon| weapon.ceiling_efr > best_efr);
    if weapons.len() != before {
        debug!(before, after = weapons.len(), best_efr, "weapon list re-filtered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::weapon::EleStat;
    use crate::model::sharpness::SharpnessGauge;

    fn contribution(raw: u32, aff: i32, slots: Vec<u8>) -> WeaponContribution {
        WeaponContribution {
            weapon_raw: raw,
            weapon_aff: aff,
            skill: None,
            set_bonus: None,
            deco_slots: slots,
            maximum_sharpness: Some(SharpnessGauge::from_hits([50, 50, 50, 50, 50, 50, 0])),
            is_constant_sharpness: false,
            health_regen_active: false,
            elestat: EleStat::default(),
        }
    }

    #[test]
    fn stronger_weapon_dominates() {
        let strong = contribution(330, 10, vec![3, 1]);
        let weak = contribution(320, 10, vec![2]);
        assert!(weapon_dominates(&strong, &weak));
        assert!(!weapon_dominates(&weak, &strong));
    }

    #[test]
    fn slot_sizes_compare_pairwise() {
        let wide = contribution(320, 0, vec![1, 1, 1]);
        let deep = contribution(320, 0, vec![4]);
        assert!(!weapon_dominates(&wide, &deep));
        assert!(!weapon_dominates(&deep, &wide));
    }

    #[test]
    fn constant_sharpness_blocks_domination() {
        let mut right = contribution(300, 0, vec![]);
        right.is_constant_sharpness = true;
        let left = contribution(320, 10, vec![]);
        assert!(!weapon_dominates(&left, &right));
    }

    #[test]
    fn health_regen_blocks_domination() {
        let mut left = contribution(330, 10, vec![]);
        let mut right = contribution(320, 0, vec![]);
        right.health_regen_active = true;
        assert!(!weapon_dominates(&left, &right));
        left.health_regen_active = true;
        assert!(weapon_dominates(&left, &right));
    }

    #[test]
    fn pruned_set_keeps_one_of_each_related_pair() {
        let mut set = PrunedSet::new();
        let dominates = |l: &WeaponContribution, r: &WeaponContribution| weapon_dominates(l, r);
        assert!(set.insert(contribution(320, 0, vec![1]), dominates));
        assert!(set.insert(contribution(310, 20, vec![1]), dominates));
        assert!(set.insert(contribution(330, 20, vec![2]), dominates));
        assert_eq!(set.len(), 1);
        assert!(!set.insert(contribution(300, 0, vec![]), dominates));
        assert!(!set.insert(contribution(330, 20, vec![2]), dominates));
        let members: Vec<_> = set.iter().collect();
        for a in &members {
            for b in &members {
                if !std::ptr::eq(*a, *b) {
                    assert!(!weapon_dominates(a, b));
                }
            }
        }
    }
}
