//! Whole-set assembly and the weapon × armour-set search.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::data::armour::ArmourSlot;
use crate::data::database::Database;
use crate::data::request::SearchParameters;
use crate::model::damage::{calculate_edv_from_skills_lookup, EffectiveDamageValues};
use crate::model::equips::{ArmourEquips, DecoEquips};
use crate::model::skills::{SetBonusMap, SkillMap};
use crate::model::weapon_instance::WeaponInstance;
use crate::optimizer::armour_combos::{CharmSeed, SlotCombo};
use crate::optimizer::deco_combos::{generate_deco_combos, DecoCatalogue};
use crate::optimizer::seen_map::{MergeSeenMap, Signature, SignatureLayout, SubsetSeenMap};
use crate::optimizer::weapon_prep::{retain_above, PreparedWeapon};
use crate::parallel::{batch_ranges, WorkerPool};

/// A partial or complete armour set with its charm and armour decorations.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmourSetCombo {
    pub armour: ArmourEquips,
    pub decorations: DecoEquips,
    pub skills: SkillMap,
    pub set_bonuses: SetBonusMap,
}

impl ArmourSetCombo {
    pub fn from_charm(seed: &CharmSeed) -> Self {
        Self {
            armour: ArmourEquips::with_charm(seed.charm),
            decorations: DecoEquips::default(),
            skills: seed.skills.clone(),
            set_bonuses: SetBonusMap::new(),
        }
    }
}

/// Best build found so far.
#[derive(Debug, Clone)]
pub struct BestBuild<'db> {
    pub weapon: WeaponInstance<'db>,
    pub armour: ArmourEquips,
    /// Armour decorations followed by weapon decorations.
    pub decorations: DecoEquips,
    /// Relevant skills including set-bonus unlocks.
    pub skills: SkillMap,
    pub set_bonuses: SetBonusMap,
    pub edv: EffectiveDamageValues,
}

impl BestBuild<'_> {
    pub fn efr(&self) -> f64 {
        self.edv.efr
    }
}

/// Read-only inputs shared by every pairing evaluation.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a, 'db> {
    pub db: &'db Database,
    pub params: &'a SearchParameters,
    pub decorations: &'a DecoCatalogue,
}

/// Cross every accumulated set with every combination of the next slot.
///
/// A merge that brings any set bonus up to its cutoff is rejected. Without a layout the
/// merge deduplicates on hashed signatures.
pub fn merge_in_armour_list(
    db: &Database,
    params: &SearchParameters,
    layout: Option<&SignatureLayout>,
    current: &[ArmourSetCombo],
    slot: &[SlotCombo],
) -> Vec<ArmourSetCombo> {
    let catalogue = db.skills();
    let spec = &params.skill_spec;
    let mut seen = MergeSeenMap::new(layout);
    let mut rejected = 0usize;
    for accumulated in current {
        for combo in slot {
            let mut set_bonuses = accumulated.set_bonuses.clone();
            set_bonuses.merge_in(&combo.set_bonuses);
            if !spec.within_cutoffs(&set_bonuses) {
                rejected += 1;
                continue;
            }
            let mut skills = accumulated.skills.clone();
            skills.merge_in(&combo.skills, catalogue);
            let mut armour = accumulated.armour;
            armour.add(db, combo.piece);
            let mut decorations = accumulated.decorations.clone();
            decorations.extend(&combo.decorations);

            let signature = Signature::new(skills, set_bonuses);
            let merged = ArmourSetCombo {
                armour,
                decorations,
                skills: signature.skills.clone(),
                set_bonuses: signature.set_bonuses.clone(),
            };
            seen.add(&signature, merged);
        }
    }
    debug!(rejected, kept = seen.size(), seen = seen.seen_count(), "merged armour slot");
    seen.into_data()
}

/// Fold every slot into the charm seeds, head to legs.
pub fn assemble_armour_sets(
    db: &Database,
    params: &SearchParameters,
    layout: Option<&SignatureLayout>,
    seeds: &[CharmSeed],
    slots: &[Vec<SlotCombo>; 5],
) -> Vec<ArmourSetCombo> {
    let mut sets: Vec<ArmourSetCombo> = seeds.iter().map(ArmourSetCombo::from_charm).collect();
    for slot in ArmourSlot::ALL {
        sets = merge_in_armour_list(db, params, layout, &sets, &slots[slot.index()]);
        info!(%slot, sets = sets.len(), "armour sets after merge");
    }
    sets
}

/// Outcome of pairing one armour set with one weapon.
#[derive(Debug, Clone, Default)]
pub struct PairingResult<'db> {
    pub best: Option<BestBuild<'db>>,
    pub evaluated: usize,
}

/// Best build of this pairing whose EFR strictly exceeds `threshold`.
pub fn evaluate_pairing<'db>(
    ctx: &SearchContext<'_, 'db>,
    set: &ArmourSetCombo,
    weapon: &PreparedWeapon<'db>,
    threshold: f64,
) -> PairingResult<'db> {
    let catalogue = ctx.db.skills();
    let spec = &ctx.params.skill_spec;
    let contribution = &weapon.contribution;

    let mut set_bonuses = set.set_bonuses.clone();
    if let Some(set_bonus) = contribution.set_bonus {
        set_bonuses.increment(set_bonus, 1);
    }
    if !spec.within_cutoffs(&set_bonuses) {
        return PairingResult::default();
    }
    let mut baseline = set.skills.clone();
    if let Some(skill) = contribution.skill {
        baseline.increment(skill, 1, catalogue);
    }

    let mut result = PairingResult::default();
    let mut bar = threshold;
    for combo in generate_deco_combos(&contribution.deco_slots, ctx.decorations, catalogue, &baseline) {
        let mut skills = combo.skills;
        skills.add_set_bonuses(&set_bonuses, catalogue);
        spec.normalize_skills(&mut skills);
        if !spec.is_satisfied(&skills) {
            continue;
        }
        result.evaluated += 1;
        let edv = calculate_edv_from_skills_lookup(
            weapon.instance.weapon.class,
            contribution,
            &skills,
            &ctx.params.misc_buffs,
            spec,
            catalogue,
        );
        if edv.efr > bar {
            bar = edv.efr;
            let mut decorations = set.decorations.clone();
            decorations.extend(&combo.decorations);
            result.best = Some(BestBuild {
                weapon: weapon.instance.clone(),
                armour: set.armour,
                decorations,
                skills,
                set_bonuses: set_bonuses.clone(),
                edv,
            });
        }
    }
    result
}

#[derive(Debug, Clone, Default)]
pub struct DriverResult<'db> {
    pub best: Option<BestBuild<'db>>,
    pub evaluated: usize,
}

/// Reference driver. The weapon list is cut back the moment the best EFR improves.
pub fn search_sequential<'db>(
    ctx: &SearchContext<'_, 'db>,
    sets: &[ArmourSetCombo],
    weapons: &mut Vec<PreparedWeapon<'db>>,
) -> DriverResult<'db> {
    let mut best: Option<BestBuild<'db>> = None;
    let mut best_efr = f64::NEG_INFINITY;
    let mut evaluated = 0usize;

    for set in sets {
        // Weapons are sorted by descending ceiling, so re-filtering only ever
        // truncates and `index` stays valid.
        let mut index = 0;
        while index < weapons.len() {
            let pairing = evaluate_pairing(ctx, set, &weapons[index], best_efr);
            evaluated += pairing.evaluated;
            if let Some(found) = pairing.best {
                best_efr = found.efr();
                info!(efr = best_efr, weapon = %found.weapon.weapon.name, "improved");
                best = Some(found);
                retain_above(weapons, best_efr);
            }
            index += 1;
        }
        if weapons.is_empty() {
            break;
        }
    }
    DriverResult { best, evaluated }
}

/// Parallel driver. Armour sets are split into batches evaluated on the pool; the best
/// EFR is shared through an atomic and the weapon list is re-filtered between batches.
pub fn search_parallel<'db>(
    ctx: &SearchContext<'_, 'db>,
    sets: &[ArmourSetCombo],
    weapons: &mut Vec<PreparedWeapon<'db>>,
    batches: usize,
    pool: &WorkerPool,
) -> DriverResult<'db> {
    // Any real build has positive EFR, and non-negative floats order like their bits.
    let best_bits = AtomicU64::new(0f64.to_bits());
    let best: Mutex<Option<BestBuild<'db>>> = Mutex::new(None);
    let evaluated = AtomicUsize::new(0);

    for (start, end) in batch_ranges(sets.len(), batches.max(1)) {
        let current: &[PreparedWeapon<'db>] = weapons;
        pool.install(|| {
            sets[start..end].par_iter().for_each(|set| {
                for weapon in current {
                    let threshold = f64::from_bits(best_bits.load(Ordering::Acquire));
                    if weapon.ceiling_efr <= threshold {
                        continue;
                    }
                    let pairing = evaluate_pairing(ctx, set, weapon, threshold);
                    evaluated.fetch_add(pairing.evaluated, Ordering::Relaxed);
                    let Some(found) = pairing.best else {
                        continue;
                    };
                    let mut slot = best.lock().unwrap_or_else(PoisonError::into_inner);
                    let improves = slot.as_ref().map_or(true, |held| found.efr() > held.efr());
                    if improves {
                        best_bits.fetch_max(found.efr().to_bits(), Ordering::AcqRel);
                        *slot = Some(found);
                    }
                }
            });
        });
        let best_efr = f64::from_bits(best_bits.load(Ordering::Acquire));
        debug!(start, end, best_efr, "batch finished");
        retain_above(weapons, best_efr);
        if weapons.is_empty() {
            break;
        }
    }

    DriverResult {
        best: best.into_inner().unwrap_or_else(PoisonError::into_inner),
        evaluated: evaluated.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::database::shipped_database;
    use crate::data::request;
    use crate::optimizer::armour_combos::{charm_seeds, generate_all_slot_combos};

    fn params(db: &Database, extra: &str) -> SearchParameters {
        let raw = format!(
            r#"{{
                "allow_low_rank": false,
                "allow_high_rank": false,
                "allow_master_rank": true,
                "health_regen_required": false,
                "weapon_selection": {{ "class": "GREATSWORD", "allow_fire": true, "allow_water": true,
                    "allow_thunder": true, "allow_ice": true, "allow_dragon": true }},
                "damage_model": {{ "raw_mv": 100, "elemod_fire": 1.0, "elemod_water": 1.0,
                    "elemod_thunder": 1.0, "elemod_ice": 1.0, "elemod_dragon": 1.0, "hzv_raw": 80,
                    "hzv_fire": 20, "hzv_water": 20, "hzv_thunder": 20, "hzv_ice": 20, "hzv_dragon": 20 }},
                "selected_skills": {{ "AGITATOR": 0, "CRITICAL_EYE": 0 }},
                "forced_skill_states": {{}},
                "force_remove_skills": [],
                "misc_buffs": []
                {extra}
            }}"#
        );
        request::from_json_str(db, &raw).unwrap()
    }

    fn assembled(db: &Database, params: &SearchParameters) -> Vec<ArmourSetCombo> {
        let decorations = DecoCatalogue::prepare(db, &params.skill_spec).unwrap();
        let slots = generate_all_slot_combos(db, params, &decorations, &WorkerPool::default()).unwrap();
        let layout = SignatureLayout::for_spec(&params.skill_spec, db.skills());
        assert!(layout.is_some());
        assemble_armour_sets(db, params, layout.as_ref(), &charm_seeds(db, params), &slots.slots)
    }

    #[test]
    fn assembled_sets_wear_every_slot() {
        let db = shipped_database();
        let params = params(&db, "");
        let sets = assembled(&db, &params);
        assert!(!sets.is_empty());
        for set in &sets {
            assert_eq!(set.armour.pieces().count(), 5);
        }
    }

    #[test]
    fn hashed_merge_keeps_the_same_sets_as_the_indexed_merge() {
        let db = shipped_database();
        let params = params(&db, "");
        let decorations = DecoCatalogue::prepare(&db, &params.skill_spec).unwrap();
        let slots = generate_all_slot_combos(&db, &params, &decorations, &WorkerPool::default()).unwrap();
        let seeds = charm_seeds(&db, &params);
        let hashed = assemble_armour_sets(&db, &params, None, &seeds, &slots.slots);
        assert!(!hashed.is_empty());
        assert_eq!(hashed, assembled(&db, &params));
    }

    #[test]
    fn cutoff_equal_to_the_count_is_rejected() {
        let db = shipped_database();
        let params = params(&db, r#", "set_bonus_cutoffs": { "BRACHYDIOS_WILL": 3 }"#);
        let brachy = db.skills().find_set_bonus("BRACHYDIOS_WILL").unwrap();
        let sets = assembled(&db, &params);
        assert!(!sets.is_empty());
        assert!(sets.iter().all(|set| set.set_bonuses.get(brachy) < 3));
        assert!(sets.iter().any(|set| set.set_bonuses.get(brachy) == 2));
    }

    #[test]
    fn merge_rejects_at_the_cutoff_exactly() {
        let db = shipped_database();
        let params = params(&db, r#", "set_bonus_cutoffs": { "BRACHYDIOS_WILL": 2 }"#);
        let brachy = db.skills().find_set_bonus("BRACHYDIOS_WILL").unwrap();
        let layout = SignatureLayout::for_spec(&params.skill_spec, db.skills()).unwrap();
        let one: SetBonusMap = [(brachy, 1)].into_iter().collect();
        let current = vec![ArmourSetCombo {
            armour: ArmourEquips::new(),
            decorations: DecoEquips::default(),
            skills: SkillMap::new(),
            set_bonuses: one.clone(),
        }];
        let chest = db
            .armour_pieces()
            .find(|(_, piece)| piece.slot == ArmourSlot::Chest && piece.set_bonus == Some(brachy))
            .map(|(id, _)| id)
            .unwrap();
        let slot = vec![SlotCombo {
            piece: chest,
            decorations: DecoEquips::default(),
            skills: SkillMap::new(),
            set_bonuses: one,
        }];
        assert!(merge_in_armour_list(&db, &params, Some(&layout), &current, &slot).is_empty());
    }
}
